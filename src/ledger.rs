//! The cancel ledger: a record of relocations that can be replayed backwards.
//!
//! A ledger is persisted as UTF-8 text, one relocation per line:
//!
//! ```text
//! <original-path> : <final-path>
//! ```
//!
//! Replaying moves every final path back to its original path. Replay is
//! best-effort: a malformed line or a failed move is reported and skipped,
//! and moves already undone stay undone.

use crate::error::LedgerError;
use crate::relocate::Relocation;
use std::fs;
use std::path::{Path, PathBuf};

/// Separator between the original and final path of a ledger line.
pub const SEPARATOR: &str = " : ";

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// One recorded relocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    pub original: PathBuf,
    pub destination: PathBuf,
}

impl From<Relocation> for LedgerEntry {
    fn from(relocation: Relocation) -> Self {
        Self {
            original: relocation.original,
            destination: relocation.destination,
        }
    }
}

/// The relocations of one batch, in the order they happened.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CancelLedger {
    entries: Vec<LedgerEntry>,
}

impl CancelLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one relocation.
    pub fn record(&mut self, relocation: impl Into<LedgerEntry>) {
        self.entries.push(relocation.into());
    }

    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Renders the ledger in its on-disk form.
    ///
    /// ```
    /// use sortwise::ledger::{CancelLedger, LedgerEntry};
    ///
    /// let mut ledger = CancelLedger::new();
    /// ledger.record(LedgerEntry { original: "in/a.jpg".into(), destination: "out/image/a.jpg".into() });
    /// assert_eq!(ledger.serialize(), "in/a.jpg : out/image/a.jpg\n");
    /// ```
    pub fn serialize(&self) -> String {
        self.entries
            .iter()
            .map(|entry| {
                format!(
                    "{}{}{}\n",
                    entry.original.display(),
                    SEPARATOR,
                    entry.destination.display()
                )
            })
            .collect()
    }

    /// Writes the ledger to `path`.
    pub fn save(&self, path: &Path) -> LedgerResult<()> {
        fs::write(path, self.serialize()).map_err(|e| LedgerError::WriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;
        log::info!("[cancel] Written {}", path.display());
        Ok(())
    }

    /// The default cancel file name, `cancel_<unix-timestamp>.txt`.
    pub fn default_file_name() -> String {
        format!("cancel_{}.txt", chrono::Utc::now().timestamp())
    }

    /// Parses serialized ledger content.
    ///
    /// Returns the well-formed entries with their 1-based line numbers, and
    /// one error per malformed line. Blank lines are ignored.
    pub fn parse(content: &str) -> (Vec<(usize, LedgerEntry)>, Vec<LedgerError>) {
        let mut entries = Vec::new();
        let mut errors = Vec::new();

        for (index, line) in content.lines().enumerate() {
            let line_number = index + 1;
            if line.trim().is_empty() {
                continue;
            }
            let parts: Vec<&str> = line.split(SEPARATOR).collect();
            match parts.as_slice() {
                [original, destination] if !original.is_empty() && !destination.is_empty() => {
                    entries.push((
                        line_number,
                        LedgerEntry {
                            original: PathBuf::from(original),
                            destination: PathBuf::from(destination),
                        },
                    ));
                }
                _ => errors.push(LedgerError::MalformedLine {
                    line_number,
                    line: line.to_string(),
                }),
            }
        }

        (entries, errors)
    }

    /// Replays serialized ledger content, moving every final path back.
    ///
    /// Entries are undone last-first, so a file relocated twice within one
    /// ledger ends up back at its first location.
    pub fn replay(content: &str) -> ReplayReport {
        let (entries, parse_errors) = Self::parse(content);
        let mut report = ReplayReport::default();

        for error in parse_errors {
            log::error!("[cancel] Could not cancel: {}", error);
            report.failures.push(error);
        }

        for (line_number, entry) in entries.iter().rev() {
            match Self::restore(entry) {
                Ok(backup) => {
                    log::info!(
                        "[cancel] Restored {} to {}",
                        entry.destination.display(),
                        entry.original.display()
                    );
                    report.restored += 1;
                    report.backups.extend(backup);
                }
                Err(error) => {
                    log::error!("[cancel] Could not cancel line {}: {}", line_number, error);
                    report.failures.push(error);
                }
            }
        }

        report
    }

    /// Reads and replays a cancel file.
    pub fn replay_file(path: &Path) -> LedgerResult<ReplayReport> {
        let content = fs::read_to_string(path).map_err(|e| LedgerError::ReadFailed {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(Self::replay(&content))
    }

    /// Moves one file back, backing up whatever occupies its original path.
    ///
    /// Returns the backup path if a backup was made.
    fn restore(entry: &LedgerEntry) -> LedgerResult<Option<PathBuf>> {
        if !entry.destination.exists() {
            return Err(LedgerError::MissingDestination {
                path: entry.destination.clone(),
            });
        }

        let mut backup = None;
        if entry.original.exists() {
            let backup_path = Self::generate_backup_path(&entry.original);
            fs::rename(&entry.original, &backup_path).map_err(|e| LedgerError::BackupFailed {
                path: entry.original.clone(),
                source: e,
            })?;
            log::warn!(
                "[cancel] Backed up conflicting file {} to {}",
                entry.original.display(),
                backup_path.display()
            );
            backup = Some(backup_path);
        }

        if let Err(e) = Self::move_back(entry) {
            return Err(match backup {
                Some(backup_path) => Self::roll_back_backup(entry, backup_path, e),
                None => LedgerError::RestoreFailed {
                    from: entry.destination.clone(),
                    to: entry.original.clone(),
                    source: e,
                },
            });
        }

        Ok(backup)
    }

    fn move_back(entry: &LedgerEntry) -> std::io::Result<()> {
        if let Some(parent) = entry.original.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent)?;
        }
        fs::rename(&entry.destination, &entry.original)
    }

    /// Puts a backed-up file back at the original location after a failed restore.
    fn roll_back_backup(
        entry: &LedgerEntry,
        backup: PathBuf,
        source: std::io::Error,
    ) -> LedgerError {
        match fs::rename(&backup, &entry.original) {
            Ok(()) => {
                log::info!(
                    "[cancel] Put {} back after failed restore",
                    entry.original.display()
                );
                LedgerError::RestoreFailed {
                    from: entry.destination.clone(),
                    to: entry.original.clone(),
                    source,
                }
            }
            Err(e) => {
                log::error!(
                    "[cancel] Could not put back {} from {}: {}",
                    entry.original.display(),
                    backup.display(),
                    e
                );
                LedgerError::BackupStranded {
                    from: entry.destination.clone(),
                    to: entry.original.clone(),
                    backup,
                    source,
                }
            }
        }
    }

    /// Generates a backup path for a file by appending a timestamp.
    ///
    /// Example: `file.txt` becomes `file.txt.bak.20251109-143052`, or
    /// `file.txt.bak.20251109-143052.1` when that name is taken.
    fn generate_backup_path(original_path: &Path) -> PathBuf {
        let timestamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
        let filename = original_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "file".to_string());

        let backup_name = format!("{}.bak.{}", filename, timestamp);
        let in_parent = |name: String| match original_path.parent() {
            Some(parent) => parent.join(name),
            None => PathBuf::from(name),
        };

        let mut candidate = in_parent(backup_name.clone());
        let mut counter = 1;
        while candidate.exists() {
            candidate = in_parent(format!("{}.{}", backup_name, counter));
            counter += 1;
        }
        candidate
    }
}

/// The outcome of replaying a cancel ledger.
#[derive(Debug, Default)]
pub struct ReplayReport {
    /// Number of files moved back to their original location.
    pub restored: usize,
    /// Files that occupied an original location and were renamed aside.
    pub backups: Vec<PathBuf>,
    /// Malformed lines and moves that could not be undone.
    pub failures: Vec<LedgerError>,
}

impl ReplayReport {
    /// Returns true if every line was well-formed and undone.
    pub fn is_complete_success(&self) -> bool {
        self.failures.is_empty()
    }
}
