//! Candidate file enumeration.
//!
//! This module lists the files of a source directory that a sort run should
//! consider, applying the `[filters]` rules of the configuration, and
//! reports how much data they hold.

use crate::config::FilterRules;
use crate::error::{ConfigError, SortError};
use glob::Pattern;
use regex::Regex;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Cancel files written by earlier runs are never candidates.
const CANCEL_FILE_PATTERN: &str = r"^cancel_\d+\.txt$";

/// Compiled candidate filters.
pub struct CandidateFilter {
    enable_hidden_files: bool,
    exclude_filenames: HashSet<String>,
    exclude_patterns: Vec<Pattern>,
    exclude_regexes: Vec<Regex>,
}

impl CandidateFilter {
    /// Compiles filter rules.
    ///
    /// # Errors
    ///
    /// Returns an error if any glob or regex pattern is invalid.
    pub fn compile(rules: &FilterRules) -> Result<Self, ConfigError> {
        let exclude_patterns = rules
            .exclude_patterns
            .iter()
            .map(|pattern| {
                Pattern::new(pattern).map_err(|e| ConfigError::InvalidGlobPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let exclude_regexes = rules
            .exclude_regex
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(CANCEL_FILE_PATTERN))
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| ConfigError::InvalidRegexPattern {
                    pattern: pattern.to_string(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            enable_hidden_files: rules.enable_hidden_files,
            exclude_filenames: rules.exclude_filenames.iter().cloned().collect(),
            exclude_patterns,
            exclude_regexes,
        })
    }

    /// Check if a file should be sorted.
    ///
    /// `relative_path` is the file's path relative to the scanned directory;
    /// glob patterns match against it, everything else against the file name.
    pub fn should_include(&self, relative_path: &Path) -> bool {
        let file_name = relative_path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();

        if !self.enable_hidden_files && file_name.starts_with('.') {
            return false;
        }

        if self.exclude_filenames.contains(file_name.as_ref()) {
            return false;
        }

        if self
            .exclude_patterns
            .iter()
            .any(|pattern| pattern.matches_path(relative_path))
        {
            return false;
        }

        !self
            .exclude_regexes
            .iter()
            .any(|regex| regex.is_match(&file_name))
    }

    fn allows_directory(&self, name: &str) -> bool {
        self.enable_hidden_files || !name.starts_with('.')
    }
}

/// Lists candidate files of a directory.
pub struct Scanner {
    filter: CandidateFilter,
    recursive: bool,
}

impl Scanner {
    pub fn new(filter: CandidateFilter, recursive: bool) -> Self {
        Self { filter, recursive }
    }

    /// Returns the candidate files under `dir`, sorted by path.
    ///
    /// Unreadable nested entries are logged and skipped; only an unreadable
    /// `dir` itself is an error.
    pub fn candidates(&self, dir: &Path) -> Result<Vec<PathBuf>, SortError> {
        let source_error = |e: std::io::Error| SortError::Source {
            path: dir.to_path_buf(),
            source: e,
        };
        if !fs::metadata(dir).map_err(source_error)?.is_dir() {
            return Err(source_error(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "not a directory",
            )));
        }

        let max_depth = if self.recursive { usize::MAX } else { 1 };
        let walker = WalkDir::new(dir)
            .min_depth(1)
            .max_depth(max_depth)
            .into_iter()
            .filter_entry(|entry| {
                entry.depth() == 0
                    || !entry.file_type().is_dir()
                    || self
                        .filter
                        .allows_directory(&entry.file_name().to_string_lossy())
            });

        let mut files = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    log::warn!("[scan] Skipping unreadable entry: {}", e);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.into_path();
            let relative = path.strip_prefix(dir).unwrap_or(&path);
            if self.filter.should_include(relative) {
                files.push(path);
            } else {
                log::debug!("[scan] Excluded {}", path.display());
            }
        }

        files.sort();
        Ok(files)
    }
}

/// Total size in bytes of the given files; unreadable files count as zero.
pub fn total_size(paths: &[PathBuf]) -> u64 {
    paths
        .iter()
        .filter_map(|path| fs::metadata(path).ok())
        .map(|metadata| metadata.len())
        .sum()
}

/// Formats a byte count for display.
///
/// ```
/// use sortwise::scan::format_size;
///
/// assert_eq!(format_size(512), "512 B");
/// assert_eq!(format_size(3 * 1024 * 1024), "3.00 MB");
/// ```
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
