//! sortwise - sort files into destinations chosen by ordered rules
//!
//! A sort run classifies each candidate file against an ordered rule set
//! (first match wins, with an optional default destination), moves it to
//! the expanded destination template, and records every move in a cancel
//! ledger that can later be replayed to put the files back. Dry runs compute
//! the same moves without touching the filesystem.

pub mod batch;
pub mod category;
pub mod cli;
pub mod config;
pub mod entity;
pub mod error;
pub mod ledger;
pub mod output;
pub mod predicate;
pub mod relocate;
pub mod rules;
pub mod scan;
pub mod template;

pub use batch::{BatchReport, FileReport, RelocationOutcome, SortBatch};
pub use category::Category;
pub use config::SortConfig;
pub use entity::{Entity, EntityBuilder};
pub use error::{ConfigError, EntityError, LedgerError, RelocationError, RuleError, SortError};
pub use ledger::{CancelLedger, ReplayReport};
pub use relocate::{Relocation, Relocator, Reservations};
pub use rules::{Classified, Destination, RuleSet, resolve};
pub use template::DestinationTemplate;

pub use cli::{SortOptions, run_cancel, run_sort};
