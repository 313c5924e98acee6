//! Command-line actions.
//!
//! Each subcommand of the binary maps to one function here, so the whole
//! command line can be driven from tests without spawning a process:
//! - [`run_sort`] loads the configuration, enumerates candidates, runs a
//!   batch and writes the cancel file
//! - [`run_list`] renders the available operation sets
//! - [`run_cancel`] replays a cancel file

use crate::batch::{BatchReport, SortBatch};
use crate::config::SortConfig;
use crate::error::{ConfigError, LedgerError, SortError};
use crate::ledger::{CancelLedger, ReplayReport};
use crate::output::OutputFormatter;
use crate::relocate::Relocator;
use crate::scan::{CandidateFilter, Scanner, format_size, total_size};
use log::LevelFilter;
use std::path::{Path, PathBuf};

/// Result type for command-line actions.
pub type SortResult<T> = Result<T, SortError>;

/// Maps `-v` occurrences and `--silent` to a log level.
///
/// ```
/// use log::LevelFilter;
/// use sortwise::cli::level_filter;
///
/// assert_eq!(level_filter(0, false), LevelFilter::Error);
/// assert_eq!(level_filter(2, false), LevelFilter::Info);
/// assert_eq!(level_filter(3, true), LevelFilter::Off);
/// ```
pub fn level_filter(verbose: u8, silent: bool) -> LevelFilter {
    if silent {
        return LevelFilter::Off;
    }
    match verbose {
        0 => LevelFilter::Error,
        1 => LevelFilter::Warn,
        2 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    }
}

/// Arguments of `sortwise sort`.
#[derive(Debug, Clone, Default)]
pub struct SortOptions {
    /// Directory whose files are sorted.
    pub folder: PathBuf,
    /// Destination root; the source folder when `None`.
    pub output: Option<PathBuf>,
    /// Operation set name; the configured default when `None`.
    pub operations: Option<String>,
    pub dry_run: bool,
    /// Configuration file; the lookup chain of [`SortConfig::load`] when `None`.
    pub config: Option<PathBuf>,
    /// Cancel file name, joined to the destination root.
    pub cancel_file: Option<String>,
    /// Whether to draw the progress bar.
    pub progress: bool,
}

/// What `sortwise sort` did.
#[derive(Debug)]
pub struct SortOutcome {
    pub report: BatchReport,
    /// Where the cancel file was written, if it was.
    pub cancel_file: Option<PathBuf>,
    /// Why the cancel file could not be written. The moves still happened;
    /// `report.ledger` holds them.
    pub cancel_error: Option<LedgerError>,
    /// Total size of the candidate files, in bytes.
    pub total_bytes: u64,
}

/// Sorts the files of `options.folder`.
///
/// Only configuration and source-directory problems are errors; per-file
/// failures are reported in [`SortOutcome::report`]. The cancel file is
/// written when the run is real and at least one file moved; failing to
/// write it is reported in [`SortOutcome::cancel_error`], since the files
/// have already moved by then.
///
/// # Examples
///
/// ```no_run
/// use sortwise::cli::{SortOptions, run_sort};
///
/// let options = SortOptions {
///     folder: "/path/to/inbox".into(),
///     dry_run: true,
///     ..Default::default()
/// };
/// match run_sort(&options) {
///     Ok(outcome) => println!("{} files would move", outcome.report.simulated()),
///     Err(e) => eprintln!("Error: {}", e),
/// }
/// ```
pub fn run_sort(options: &SortOptions) -> SortResult<SortOutcome> {
    let config = SortConfig::load(options.config.as_deref())?;
    let filter = CandidateFilter::compile(&config.filters)?;
    let rule_set = config.rule_set(options.operations.as_deref())?;
    let builder = config.entity_builder()?;

    let destination_root = options
        .output
        .clone()
        .unwrap_or_else(|| options.folder.clone());

    if options.dry_run {
        OutputFormatter::dry_run_notice(&format!(
            "Analyzing contents of: {}",
            options.folder.display()
        ));
    } else {
        OutputFormatter::info(&format!("Sorting contents of: {}", options.folder.display()));
    }

    let candidates = Scanner::new(filter, config.general.recursive).candidates(&options.folder)?;
    let total_bytes = total_size(&candidates);
    OutputFormatter::plain(&format!(
        "Found {} candidate files ({})",
        candidates.len(),
        format_size(total_bytes)
    ));

    let relocator = Relocator::new(&destination_root, options.dry_run);
    let progress = OutputFormatter::create_progress_bar(candidates.len() as u64, options.progress);
    let report = SortBatch::new(&builder, &rule_set, relocator).run_with_progress(
        &candidates,
        |file| {
            progress.set_message(
                file.path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default(),
            );
            progress.inc(1);
        },
    );
    progress.finish_and_clear();

    OutputFormatter::batch_summary(&report, &destination_root);

    let mut cancel_error = None;
    let cancel_file = if options.dry_run {
        if !report.ledger.is_empty() {
            log::info!(
                "[cancel] [dry] Cancel file would contain:\n{}",
                report.ledger.serialize()
            );
        }
        OutputFormatter::dry_run_notice("Dry run complete. No files were modified.");
        None
    } else if report.ledger.is_empty() {
        OutputFormatter::plain("No files were moved.");
        None
    } else {
        let name = options
            .cancel_file
            .clone()
            .unwrap_or_else(CancelLedger::default_file_name);
        let path = destination_root.join(name);
        match report.ledger.save(&path) {
            Ok(()) => {
                OutputFormatter::success(&format!(
                    "Sorted {} files. Use 'sortwise --cancel-file {} cancel' to revert.",
                    report.moved(),
                    path.display()
                ));
                Some(path)
            }
            Err(e) => {
                OutputFormatter::error(&e.to_string());
                OutputFormatter::warning(
                    "Save the following lines to a file to be able to cancel this run:",
                );
                OutputFormatter::plain(report.ledger.serialize().trim_end());
                cancel_error = Some(e);
                None
            }
        }
    };

    if !report.is_complete_success() {
        OutputFormatter::warning("Some files could not be sorted. Please review errors above.");
    }

    Ok(SortOutcome {
        report,
        cancel_file,
        cancel_error,
        total_bytes,
    })
}

/// Renders the operation sets of a configuration.
///
/// Plain mode lists one name per line; verbose mode renders every set with
/// its rules as pretty-printed JSON.
pub fn render_operations(config: &SortConfig, verbose: bool) -> Result<String, ConfigError> {
    if verbose {
        serde_json::to_string_pretty(&config.operations)
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    } else {
        Ok(config
            .operations
            .keys()
            .map(|name| {
                if config.general.default_operations.as_deref() == Some(name.as_str()) {
                    format!("{} (default)\n", name)
                } else {
                    format!("{}\n", name)
                }
            })
            .collect())
    }
}

/// Prints the operation sets of the loaded configuration.
pub fn run_list(config_path: Option<&Path>, verbose: bool) -> SortResult<String> {
    let config = SortConfig::load(config_path)?;
    let rendered = render_operations(&config, verbose)?;
    OutputFormatter::header("Operation sets");
    OutputFormatter::plain(rendered.trim_end());
    Ok(rendered)
}

/// Replays a cancel file.
///
/// The file is kept afterwards so a partial cancel can be inspected.
pub fn run_cancel(cancel_file: &Path) -> SortResult<ReplayReport> {
    OutputFormatter::info(&format!("Cancelling moves from {}", cancel_file.display()));
    let report = CancelLedger::replay_file(cancel_file)?;

    OutputFormatter::replay_summary(&report);
    if report.is_complete_success() {
        OutputFormatter::success("Cancel complete!");
    } else {
        OutputFormatter::warning("Some moves could not be cancelled.");
    }
    Ok(report)
}
