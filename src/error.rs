//! Error types for every stage of a sort run.
//!
//! Failures are scoped to the smallest unit they concern: a rule, a file,
//! or one line of a cancel file. Only [`ConfigError`] and the variants of
//! [`SortError`] stop a whole run.

use std::path::PathBuf;
use thiserror::Error;

/// A rule could not be evaluated or its destination could not be expanded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    /// The rule entry itself is malformed (missing conditions, missing destination, undefined rule).
    #[error("rule '{rule}' is malformed: {reason}")]
    ConfigurationDefect { rule: String, reason: String },

    /// The predicate name is not part of the registry, or does not apply to this kind of file.
    #[error("unknown predicate '{name}'")]
    UnknownPredicate { name: String },

    /// A predicate argument is missing, superfluous or not an integer.
    #[error("predicate '{name}' has a malformed argument: {reason}")]
    MalformedPredicateArgument { name: String, reason: String },

    /// The destination template names a placeholder that does not exist.
    #[error("unknown placeholder '{{{placeholder}}}' in destination '{template}'")]
    UnknownPlaceholder {
        template: String,
        placeholder: String,
    },

    /// The destination template names an attribute this file does not have.
    #[error("destination '{template}' needs '{attribute}', which {name} does not have")]
    MissingAttribute {
        template: String,
        attribute: String,
        name: String,
    },

    /// An unbalanced `{` or `}` in a destination template.
    #[error("unbalanced brace in destination '{template}'")]
    UnbalancedBrace { template: String },
}

/// A candidate path could not be turned into an entity.
#[derive(Debug, Error)]
pub enum EntityError {
    #[error("cannot read {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is not a regular file", path.display())]
    NotAFile { path: PathBuf },

    #[error("{} has no file name component", path.display())]
    NoFileName { path: PathBuf },
}

/// A single file could not be relocated.
#[derive(Debug, Error)]
pub enum RelocationError {
    #[error("cannot expand destination for {}: {source}", path.display())]
    Destination {
        path: PathBuf,
        #[source]
        source: RuleError,
    },

    #[error("failed to create directory {}: {source}", path.display())]
    DirectoryCreationFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("refusing to overwrite existing file {}", path.display())]
    DestinationExists { path: PathBuf },

    #[error("failed to move {} to {}: {source}", from.display(), to.display())]
    MoveFailed {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised while writing, reading or replaying a cancel ledger.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("line {line_number} is not '<original> : <destination>': {line:?}")]
    MalformedLine { line_number: usize, line: String },

    #[error("file not found at expected location {}", path.display())]
    MissingDestination { path: PathBuf },

    #[error("could not back up conflicting file {}: {source}", path.display())]
    BackupFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to restore {} to {}: {source}", from.display(), to.display())]
    RestoreFailed {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The restore failed and the conflicting file could not be put back.
    #[error(
        "failed to restore {} to {}: {source}; the file that was there is now at {}",
        from.display(),
        to.display(),
        backup.display()
    )]
    BackupStranded {
        from: PathBuf,
        to: PathBuf,
        backup: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write cancel file {}: {source}", path.display())]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read cancel file {}: {source}", path.display())]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// The configuration could not be loaded, so no rule set exists.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("IO error reading configuration {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("invalid glob pattern '{pattern}': {reason}")]
    InvalidGlobPattern { pattern: String, reason: String },

    #[error("invalid regex pattern '{pattern}': {reason}")]
    InvalidRegexPattern { pattern: String, reason: String },

    #[error("artist pattern '{0}' must define the named groups 'artist' and 'file_name'")]
    IncompleteArtistPattern(String),

    #[error("unknown handler '{0}' (expected 'file' or 'artist')")]
    UnknownHandler(String),

    #[error("no operation set named '{0}'")]
    UnknownOperations(String),
}

/// Fatal errors surfaced to the command line.
#[derive(Debug, Error)]
pub enum SortError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("cannot enumerate {}: {source}", path.display())]
    Source {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}
