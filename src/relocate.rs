//! Relocation of classified files.
//!
//! This module moves each classified file to its expanded destination under
//! a destination root, creating directories as needed, and reports the
//! `(original, destination)` pair so the move can be cancelled later. In a
//! dry run the same pair is computed and the same checks run, but nothing
//! on disk changes.

use crate::error::RelocationError;
use crate::rules::Classified;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Result type for relocation operations.
pub type RelocationResult<T> = Result<T, RelocationError>;

/// One file movement, real or simulated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relocation {
    /// Where the file was before relocation.
    pub original: PathBuf,
    /// Where the file is (or would be) after relocation.
    pub destination: PathBuf,
}

/// Paths claimed and vacated by the relocations of one batch.
///
/// A dry run does not touch the disk, so without this record it would
/// neither see a target filled by an earlier file of the same batch nor a
/// path emptied by one.
#[derive(Debug, Default)]
pub struct Reservations {
    claimed: HashSet<PathBuf>,
    vacated: HashSet<PathBuf>,
}

impl Reservations {
    /// Whether `path` holds a file at this point of the batch.
    fn is_occupied(&self, path: &Path) -> bool {
        self.claimed.contains(path) || (path.exists() && !self.vacated.contains(path))
    }

    fn record(&mut self, relocation: &Relocation) {
        self.vacated.insert(relocation.original.clone());
        self.vacated.remove(&relocation.destination);
        self.claimed.remove(&relocation.original);
        self.claimed.insert(relocation.destination.clone());
    }
}

/// Moves classified files under a destination root.
#[derive(Debug, Clone)]
pub struct Relocator {
    destination_root: PathBuf,
    dry_run: bool,
}

impl Relocator {
    pub fn new(destination_root: impl Into<PathBuf>, dry_run: bool) -> Self {
        Self {
            destination_root: destination_root.into(),
            dry_run,
        }
    }

    pub fn destination_root(&self) -> &Path {
        &self.destination_root
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Computes where `classified` would land, without any filesystem access.
    ///
    /// Returns `Ok(None)` when the file is not meant to move.
    pub fn target_path(&self, classified: &Classified) -> RelocationResult<Option<PathBuf>> {
        let Some(template) = classified.destination().template() else {
            return Ok(None);
        };
        let entity = classified.entity();
        let relative = template
            .expand(entity)
            .map_err(|e| RelocationError::Destination {
                path: entity.path().to_path_buf(),
                source: e,
            })?;
        Ok(Some(self.destination_root.join(relative)))
    }

    /// Relocates one classified file.
    ///
    /// Returns `Ok(None)` when the file stays where it is, either because no
    /// destination was resolved or because it already sits at its target.
    /// Otherwise returns the relocation, in dry-run mode as well.
    ///
    /// A file already present at the target is never overwritten; this is
    /// checked in dry-run mode too, so a dry run reports exactly what a real
    /// run would do.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use sortwise::entity::Entity;
    /// use sortwise::relocate::Relocator;
    /// use sortwise::rules::{resolve, RuleSet};
    /// use sortwise::template::DestinationTemplate;
    ///
    /// let entity = Entity::new("/path/to/inbox/report.pdf").unwrap();
    /// let rule_set = RuleSet::new(Vec::new(), Some(DestinationTemplate::new("{category}/{name}")));
    /// let classified = resolve(entity, &rule_set).classified;
    ///
    /// match Relocator::new("/path/to/sorted", false).relocate(&classified) {
    ///     Ok(Some(moved)) => println!("{} -> {}", moved.original.display(), moved.destination.display()),
    ///     Ok(None) => println!("left in place"),
    ///     Err(e) => eprintln!("Relocation failed: {}", e),
    /// }
    /// ```
    pub fn relocate(&self, classified: &Classified) -> RelocationResult<Option<Relocation>> {
        self.relocate_reserving(classified, &mut Reservations::default())
    }

    /// Relocates one file of a batch.
    ///
    /// A target claimed by an earlier relocation in `reservations` counts
    /// as existing, and a path vacated by one counts as free, in dry-run
    /// mode as in a real run.
    pub fn relocate_reserving(
        &self,
        classified: &Classified,
        reservations: &mut Reservations,
    ) -> RelocationResult<Option<Relocation>> {
        let entity = classified.entity();
        let dry = if self.dry_run { "[dry] " } else { "" };

        let Some(destination) = self.target_path(classified)? else {
            log::debug!("[relocate] no destination for {}, leaving it", entity.name());
            return Ok(None);
        };

        if destination == entity.path() {
            log::debug!("[relocate] {} is already in place", entity.name());
            return Ok(None);
        }

        if reservations.is_occupied(&destination) {
            return Err(RelocationError::DestinationExists { path: destination });
        }

        if let Some(parent) = destination.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            log::info!("{}Creating directory: {}", dry, parent.display());
            if !self.dry_run {
                fs::create_dir_all(parent).map_err(|e| {
                    RelocationError::DirectoryCreationFailed {
                        path: parent.to_path_buf(),
                        source: e,
                    }
                })?;
            }
        }

        log::info!(
            "{}Moving file: {} to {}",
            dry,
            entity.path().display(),
            destination.display()
        );
        if !self.dry_run {
            fs::rename(entity.path(), &destination).map_err(|e| RelocationError::MoveFailed {
                from: entity.path().to_path_buf(),
                to: destination.clone(),
                source: e,
            })?;
        }

        let relocation = Relocation {
            original: entity.path().to_path_buf(),
            destination,
        };
        reservations.record(&relocation);
        Ok(Some(relocation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Entity;
    use crate::predicate::PredicateInvocation;
    use crate::rules::{Rule, RuleSet, resolve};
    use crate::template::DestinationTemplate;
    use tempfile::TempDir;

    fn classify(path: &Path, rule_set: &RuleSet) -> Classified {
        let entity = Entity::new(path).expect("Failed to build entity");
        resolve(entity, rule_set).classified
    }

    fn by_category() -> RuleSet {
        RuleSet::new(
            Vec::new(),
            Some(DestinationTemplate::new("{category}/nested/{name}")),
        )
    }

    #[test]
    fn test_relocate_creates_directories_and_moves() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base_path = temp_dir.path();
        let file_path = base_path.join("test.txt");
        fs::write(&file_path, "test content").expect("Failed to write test file");

        let classified = classify(&file_path, &by_category());
        let relocation = Relocator::new(base_path, false)
            .relocate(&classified)
            .expect("Failed to relocate")
            .expect("File should move");

        let expected = base_path.join("document").join("nested").join("test.txt");
        assert_eq!(relocation.original, file_path);
        assert_eq!(relocation.destination, expected);
        assert!(!file_path.exists());
        assert!(expected.exists());
    }

    #[test]
    fn test_dry_run_returns_same_pair_without_mutation() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base_path = temp_dir.path();
        let file_path = base_path.join("song.mp3");
        fs::write(&file_path, "la la").expect("Failed to write test file");

        let classified = classify(&file_path, &by_category());
        let dry = Relocator::new(base_path, true)
            .relocate(&classified)
            .expect("Dry run failed")
            .expect("Dry run should report a relocation");

        assert!(file_path.exists());
        assert!(!base_path.join("music").exists());

        let real = Relocator::new(base_path, false)
            .relocate(&classified)
            .expect("Real run failed")
            .expect("Real run should relocate");
        assert_eq!(dry, real);
    }

    #[test]
    fn test_unmatched_is_noop() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base_path = temp_dir.path();
        let file_path = base_path.join("clip.mp4");
        fs::write(&file_path, "frames").expect("Failed to write test file");

        let rule_set = RuleSet::new(
            vec![Rule::new(
                "images",
                vec![PredicateInvocation::parse("is-image")],
                "images/{name}",
            )],
            None,
        );
        let classified = classify(&file_path, &rule_set);
        let result = Relocator::new(base_path, false)
            .relocate(&classified)
            .expect("No-op should not fail");

        assert!(result.is_none());
        assert!(file_path.exists());
        assert_eq!(
            fs::read_dir(base_path).expect("Failed to read dir").count(),
            1
        );
    }

    #[test]
    fn test_refuses_to_overwrite() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base_path = temp_dir.path();
        let file_path = base_path.join("a.txt");
        fs::write(&file_path, "new").expect("Failed to write test file");
        fs::create_dir_all(base_path.join("document/nested")).expect("Failed to create dir");
        fs::write(base_path.join("document/nested/a.txt"), "old").expect("Failed to write");

        let classified = classify(&file_path, &by_category());
        for dry_run in [true, false] {
            let result = Relocator::new(base_path, dry_run).relocate(&classified);
            assert!(matches!(
                result,
                Err(RelocationError::DestinationExists { .. })
            ));
        }
        assert_eq!(
            fs::read_to_string(base_path.join("document/nested/a.txt")).unwrap(),
            "old"
        );
        assert!(file_path.exists());
    }

    #[test]
    fn test_claimed_target_counts_as_existing() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base_path = temp_dir.path();
        let first = base_path.join("a.jpg");
        let second = base_path.join("a.png");
        fs::write(&first, "jpg").expect("Failed to write test file");
        fs::write(&second, "png").expect("Failed to write test file");

        let rule_set = RuleSet::new(Vec::new(), Some(DestinationTemplate::new("pics/{base_name}")));
        for dry_run in [true, false] {
            let relocator = Relocator::new(base_path, dry_run);
            let mut reservations = Reservations::default();

            let moved = relocator
                .relocate_reserving(&classify(&first, &rule_set), &mut reservations)
                .expect("First file should relocate");
            assert_eq!(moved.map(|r| r.destination), Some(base_path.join("pics/a")));

            let result =
                relocator.relocate_reserving(&classify(&second, &rule_set), &mut reservations);
            assert!(matches!(
                result,
                Err(RelocationError::DestinationExists { path }) if path == base_path.join("pics/a")
            ));
        }
        assert_eq!(fs::read_to_string(base_path.join("pics/a")).unwrap(), "jpg");
        assert!(second.exists());
    }

    #[test]
    fn test_vacated_path_is_free() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base_path = temp_dir.path();
        fs::create_dir_all(base_path.join("in")).expect("Failed to create dir");
        let first = base_path.join("a.txt");
        let second = base_path.join("in/a.txt");
        fs::write(&first, "outer").expect("Failed to write test file");
        fs::write(&second, "inner").expect("Failed to write test file");

        // a.txt -> moved/a.txt, then in/a.txt -> a.txt, freed by the first move.
        let outer = RuleSet::new(Vec::new(), Some(DestinationTemplate::new("moved/{name}")));
        let inner = RuleSet::new(Vec::new(), Some(DestinationTemplate::new("{name}")));
        let relocator = Relocator::new(base_path, true);
        let mut reservations = Reservations::default();

        relocator
            .relocate_reserving(&classify(&first, &outer), &mut reservations)
            .expect("First file should relocate");
        let second_move = relocator
            .relocate_reserving(&classify(&second, &inner), &mut reservations)
            .expect("Vacated path should be free")
            .expect("Second file should relocate");
        assert_eq!(second_move.destination, first);
        assert!(first.exists());
    }

    #[test]
    fn test_expansion_failure_is_relocation_error() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let file_path = temp_dir.path().join("a.txt");
        fs::write(&file_path, "x").expect("Failed to write test file");

        let rule_set = RuleSet::new(Vec::new(), Some(DestinationTemplate::new("{artist}/{name}")));
        let classified = classify(&file_path, &rule_set);
        let result = Relocator::new(temp_dir.path(), false).relocate(&classified);
        assert!(matches!(result, Err(RelocationError::Destination { .. })));
        assert!(file_path.exists());
    }

    #[test]
    fn test_file_already_in_place() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let file_path = temp_dir.path().join("a.txt");
        fs::write(&file_path, "x").expect("Failed to write test file");

        let rule_set = RuleSet::new(Vec::new(), Some(DestinationTemplate::new("{name}")));
        let classified = classify(&file_path, &rule_set);
        let result = Relocator::new(temp_dir.path(), false)
            .relocate(&classified)
            .expect("Should not fail");
        assert!(result.is_none());
    }
}
