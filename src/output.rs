//! Terminal output.
//!
//! All user-facing printing of the command line goes through
//! [`OutputFormatter`]: colored status lines, the relocation progress bar,
//! and the summary tables printed after a sort or cancel run. Library
//! diagnostics go through `log` instead.

use crate::batch::{BatchReport, RelocationOutcome};
use crate::ledger::ReplayReport;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeMap;
use std::path::Path;

/// Styled CLI output.
///
/// - Success messages (green with ✓)
/// - Error messages (red with ✗)
/// - Warning messages (yellow with ⚠)
/// - Info messages (cyan)
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    ///
    /// ```no_run
    /// use sortwise::output::OutputFormatter;
    /// OutputFormatter::success("Files sorted");
    /// ```
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red on stderr.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    pub fn plain(message: &str) {
        println!("{}", message);
    }

    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }

    /// Creates the progress bar shown while files are relocated.
    ///
    /// A hidden bar is returned when `visible` is false, so callers can tick
    /// it unconditionally.
    pub fn create_progress_bar(total: u64, visible: bool) -> ProgressBar {
        if !visible {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(total);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░");
        pb.set_style(style);
        pb
    }

    /// Prints a two-column count table, sorted by key.
    ///
    /// ```no_run
    /// use sortwise::output::OutputFormatter;
    /// use std::collections::BTreeMap;
    ///
    /// let mut counts = BTreeMap::new();
    /// counts.insert("images".to_string(), 8);
    /// counts.insert("documents".to_string(), 15);
    /// OutputFormatter::summary_table("Destination", &counts);
    /// ```
    pub fn summary_table(label: &str, counts: &BTreeMap<String, usize>) {
        Self::header("SUMMARY");

        let total: usize = counts.values().sum();
        let width = counts
            .keys()
            .map(String::len)
            .max()
            .unwrap_or(0)
            .max(label.len());

        println!("{:<width$} | {}", label.bold(), "Files".bold(), width = width);
        println!("{}", "-".repeat(width + 10));
        for (key, count) in counts {
            println!(
                "{:<width$} | {} {}",
                key,
                count.to_string().green(),
                file_word(*count),
                width = width
            );
        }
        println!("{}", "-".repeat(width + 10));
        println!(
            "{:<width$} | {} {}",
            "Total".bold(),
            total.to_string().green().bold(),
            file_word(total),
            width = width
        );
    }

    /// Prints the outcome of a sort batch.
    ///
    /// Relocated files are counted per destination directory, relative to
    /// `destination_root`; everything else per outcome.
    pub fn batch_summary(report: &BatchReport, destination_root: &Path) {
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for file in &report.files {
            let key = match &file.outcome {
                RelocationOutcome::Moved(relocation) | RelocationOutcome::Simulated(relocation) => {
                    let parent = relocation.destination.parent().unwrap_or(destination_root);
                    let relative = parent.strip_prefix(destination_root).unwrap_or(parent);
                    format!("{}/", relative.display())
                }
                RelocationOutcome::Skipped => "(left in place)".to_string(),
                RelocationOutcome::Failed(_) => "(failed)".to_string(),
            };
            *counts.entry(key).or_insert(0) += 1;
        }
        if !report.rejected.is_empty() {
            counts.insert("(unreadable)".to_string(), report.rejected.len());
        }
        Self::summary_table("Destination", &counts);

        for file in &report.files {
            if let RelocationOutcome::Failed(e) = &file.outcome {
                Self::error(&e.to_string());
            }
        }
        for error in &report.rejected {
            Self::error(&error.to_string());
        }
        for (path, diagnostic) in report.diagnostics() {
            Self::warning(&format!("{}: {}", path.display(), diagnostic));
        }
    }

    /// Prints the outcome of a cancel run.
    pub fn replay_summary(report: &ReplayReport) {
        Self::plain(&format!("  Restored: {}", report.restored));
        if !report.backups.is_empty() {
            Self::plain(&format!("  Backed up: {}", report.backups.len()));
            for backup in &report.backups {
                Self::plain(&format!("    - {}", backup.display()));
            }
        }
        if !report.failures.is_empty() {
            Self::plain(&format!("  Failed: {}", report.failures.len()));
            for failure in &report.failures {
                Self::error(&format!("    {}", failure));
            }
        }
    }
}

fn file_word(count: usize) -> &'static str {
    if count == 1 { "file" } else { "files" }
}
