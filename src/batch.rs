//! Sort batches.
//!
//! A batch takes candidate paths through three phases, each over the whole
//! list: build an entity per path, resolve each entity against the rule
//! set, relocate each classified entity. Failures stay attached to the file
//! (or rule) they concern and the batch always runs to completion.

use crate::entity::EntityBuilder;
use crate::error::{EntityError, RelocationError};
use crate::ledger::CancelLedger;
use crate::relocate::{Relocation, Relocator, Reservations};
use crate::rules::{Destination, RuleDiagnostic, RuleSet, resolve};
use std::path::PathBuf;

/// What happened to one file during relocation.
#[derive(Debug)]
pub enum RelocationOutcome {
    /// The file was moved.
    Moved(Relocation),
    /// Dry run: the file would have been moved.
    Simulated(Relocation),
    /// The file stays where it is.
    Skipped,
    /// The move was attempted and failed; the file was not recorded.
    Failed(RelocationError),
}

impl RelocationOutcome {
    /// The relocation that happened or was simulated.
    pub fn relocation(&self) -> Option<&Relocation> {
        match self {
            RelocationOutcome::Moved(relocation) | RelocationOutcome::Simulated(relocation) => {
                Some(relocation)
            }
            RelocationOutcome::Skipped | RelocationOutcome::Failed(_) => None,
        }
    }
}

/// Classification and relocation result of one file.
#[derive(Debug)]
pub struct FileReport {
    pub path: PathBuf,
    pub destination: Destination,
    /// Rules that could not be evaluated for this file.
    pub diagnostics: Vec<RuleDiagnostic>,
    pub outcome: RelocationOutcome,
}

/// Everything a batch did.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// One report per file that could be turned into an entity, in input order.
    pub files: Vec<FileReport>,
    /// Candidates excluded because they could not be read.
    pub rejected: Vec<EntityError>,
    /// Relocations (or simulated ones) in the order they happened.
    pub ledger: CancelLedger,
    pub dry_run: bool,
}

impl BatchReport {
    fn count(&self, predicate: impl Fn(&RelocationOutcome) -> bool) -> usize {
        self.files.iter().filter(|f| predicate(&f.outcome)).count()
    }

    pub fn moved(&self) -> usize {
        self.count(|o| matches!(o, RelocationOutcome::Moved(_)))
    }

    pub fn simulated(&self) -> usize {
        self.count(|o| matches!(o, RelocationOutcome::Simulated(_)))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, RelocationOutcome::Skipped))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, RelocationOutcome::Failed(_)))
    }

    /// All rule diagnostics of the batch.
    pub fn diagnostics(&self) -> impl Iterator<Item = (&PathBuf, &RuleDiagnostic)> {
        self.files
            .iter()
            .flat_map(|f| f.diagnostics.iter().map(move |d| (&f.path, d)))
    }

    /// True when no file was rejected or failed and no rule reported a problem.
    pub fn is_complete_success(&self) -> bool {
        self.rejected.is_empty() && self.failed() == 0 && self.diagnostics().next().is_none()
    }
}

/// One sort run over a list of candidate files.
pub struct SortBatch<'a> {
    builder: &'a EntityBuilder,
    rule_set: &'a RuleSet,
    relocator: Relocator,
}

impl<'a> SortBatch<'a> {
    pub fn new(builder: &'a EntityBuilder, rule_set: &'a RuleSet, relocator: Relocator) -> Self {
        Self {
            builder,
            rule_set,
            relocator,
        }
    }

    /// Runs the batch.
    pub fn run(&self, paths: &[PathBuf]) -> BatchReport {
        self.run_with_progress(paths, |_| {})
    }

    /// Runs the batch, calling `on_file` after each file has been relocated (or not).
    pub fn run_with_progress(
        &self,
        paths: &[PathBuf],
        mut on_file: impl FnMut(&FileReport),
    ) -> BatchReport {
        let mut report = BatchReport {
            dry_run: self.relocator.is_dry_run(),
            ..Default::default()
        };

        let mut entities = Vec::with_capacity(paths.len());
        for path in paths {
            log::debug!("[entities] Processing {}", path.display());
            match self.builder.build(path) {
                Ok(entity) => entities.push(entity),
                Err(e) => {
                    log::error!("[entities] Could not load file: {}", e);
                    report.rejected.push(e);
                }
            }
        }

        let resolutions: Vec<_> = entities
            .into_iter()
            .map(|entity| {
                let resolution = resolve(entity, self.rule_set);
                log::info!(
                    "[classify] {} -> {}",
                    resolution.classified.entity().name(),
                    resolution.classified.destination()
                );
                resolution
            })
            .collect();

        let mut reservations = Reservations::default();
        for resolution in resolutions {
            let classified = resolution.classified;
            let outcome = match self.relocator.relocate_reserving(&classified, &mut reservations) {
                Ok(Some(relocation)) => {
                    report.ledger.record(relocation.clone());
                    if self.relocator.is_dry_run() {
                        RelocationOutcome::Simulated(relocation)
                    } else {
                        RelocationOutcome::Moved(relocation)
                    }
                }
                Ok(None) => RelocationOutcome::Skipped,
                Err(e) => {
                    log::error!("[relocate] Could not move {}: {}", classified.entity().name(), e);
                    RelocationOutcome::Failed(e)
                }
            };

            let file_report = FileReport {
                path: classified.entity().path().to_path_buf(),
                destination: classified.destination().clone(),
                diagnostics: resolution.diagnostics,
                outcome,
            };
            on_file(&file_report);
            report.files.push(file_report);
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{ArtistPatterns, EntityKind};
    use crate::predicate::PredicateInvocation;
    use crate::rules::Rule;
    use crate::template::DestinationTemplate;
    use std::fs;
    use tempfile::TempDir;

    fn rules() -> RuleSet {
        RuleSet::new(
            vec![
                Rule::new(
                    "images",
                    vec![PredicateInvocation::parse("is-image")],
                    "images/{name}",
                ),
                Rule::new(
                    "broken",
                    vec![PredicateInvocation::parse("is-shiny")],
                    "shiny/{name}",
                ),
                Rule::new(
                    "music",
                    vec![PredicateInvocation::parse("is-music")],
                    "music/{artist}/{name}",
                ),
            ],
            None,
        )
    }

    fn setup(names: &[&str]) -> (TempDir, Vec<PathBuf>) {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let paths = names
            .iter()
            .map(|name| {
                let path = temp_dir.path().join(name);
                fs::write(&path, name).expect("Failed to write test file");
                path
            })
            .collect();
        (temp_dir, paths)
    }

    #[test]
    fn test_batch_isolates_failures() {
        let (temp_dir, mut paths) = setup(&["a.jpg", "b.mp3", "c.bin"]);
        paths.insert(1, temp_dir.path().join("vanished.jpg"));

        let builder = EntityBuilder::default();
        let rule_set = rules();
        let batch = SortBatch::new(&builder, &rule_set, Relocator::new(temp_dir.path(), false));
        let report = batch.run(&paths);

        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.files.len(), 3);
        assert_eq!(report.moved(), 1);
        // {artist} on a plain file fails at relocation time.
        assert_eq!(report.failed(), 1);
        assert_eq!(report.skipped(), 1);
        assert_eq!(report.ledger.len(), 1);
        // Every file that reached the broken rule reports it.
        assert_eq!(report.diagnostics().count(), 2);
        assert!(!report.is_complete_success());
        assert!(temp_dir.path().join("images/a.jpg").exists());
        assert!(temp_dir.path().join("b.mp3").exists());
    }

    #[test]
    fn test_dry_run_batch_records_ledger() {
        let (temp_dir, paths) = setup(&["Band - Song.mp3", "x.png"]);
        let builder = EntityBuilder::new(EntityKind::Artist, ArtistPatterns::default());
        let rule_set = rules();
        let batch = SortBatch::new(&builder, &rule_set, Relocator::new(temp_dir.path(), true));

        let mut seen = 0;
        let report = batch.run_with_progress(&paths, |_| seen += 1);

        assert_eq!(seen, 2);
        assert!(report.dry_run);
        assert_eq!(report.simulated(), 2);
        assert_eq!(report.moved(), 0);
        assert_eq!(
            report.ledger.entries()[0].destination,
            temp_dir.path().join("music/Band/Band - Song.mp3")
        );
        assert!(paths.iter().all(|p| p.exists()));
    }

    #[test]
    fn test_default_destination_applies() {
        let (temp_dir, paths) = setup(&["notes.xyz"]);
        let builder = EntityBuilder::default();
        let rule_set = RuleSet::new(Vec::new(), Some(DestinationTemplate::new("misc/{name}")));
        let report = SortBatch::new(&builder, &rule_set, Relocator::new(temp_dir.path(), false))
            .run(&paths);

        assert!(report.is_complete_success());
        assert!(matches!(report.files[0].destination, Destination::Default(_)));
        assert!(temp_dir.path().join("misc/notes.xyz").exists());
    }

    #[test]
    fn test_dry_run_sees_targets_claimed_earlier_in_batch() {
        let builder = EntityBuilder::default();
        let rule_set = RuleSet::new(Vec::new(), Some(DestinationTemplate::new("pics/{base_name}")));

        let mut ledgers = Vec::new();
        for dry_run in [true, false] {
            let (temp_dir, paths) = setup(&["a.jpg", "a.png"]);
            let relocator = Relocator::new(temp_dir.path(), dry_run);
            let report = SortBatch::new(&builder, &rule_set, relocator).run(&paths);

            assert_eq!(report.failed(), 1);
            assert!(matches!(
                report.files[1].outcome,
                RelocationOutcome::Failed(RelocationError::DestinationExists { .. })
            ));
            let entries: Vec<_> = report
                .ledger
                .entries()
                .iter()
                .map(|e| {
                    let relative =
                        |p: &PathBuf| p.strip_prefix(temp_dir.path()).unwrap().to_path_buf();
                    (relative(&e.original), relative(&e.destination))
                })
                .collect();
            ledgers.push(entries);
        }
        assert_eq!(ledgers[0], ledgers[1]);
        assert_eq!(ledgers[0], vec![(PathBuf::from("a.jpg"), PathBuf::from("pics/a"))]);
    }
}
