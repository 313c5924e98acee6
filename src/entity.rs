//! Classifiable files.
//!
//! An [`Entity`] wraps one candidate path together with everything rule
//! predicates and destination templates read from it: name parts, category
//! and size. Attributed entities additionally carry an [`Attribution`], the
//! artist (if any) guessed from the file name.

use crate::category::Category;
use crate::error::{ConfigError, EntityError};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

/// Default artist extraction patterns, tried in order against the full file name.
pub const DEFAULT_ARTIST_PATTERNS: &[&str] = &[
    r"^(?P<file_name>.+)\s+by\s+(?P<artist>[^.]+)\s*\..*$",
    r"^(?P<artist>[^-]+)\s*-\s*(?P<file_name>[^.]+)\s*\..*",
];

/// Which kind of entity a batch builds for each candidate file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EntityKind {
    /// Plain files: name, extension, category and size.
    #[default]
    File,
    /// Files whose name may carry an artist, e.g. `Artist - Title.jpg`.
    Artist,
}

impl EntityKind {
    /// Parses a handler name from the configuration.
    pub fn from_handler_name(name: &str) -> Result<Self, ConfigError> {
        match name.to_lowercase().as_str() {
            "file" | "filehandler" => Ok(EntityKind::File),
            "artist" | "artisthandler" => Ok(EntityKind::Artist),
            _ => Err(ConfigError::UnknownHandler(name.to_string())),
        }
    }
}

/// Ordered, compiled artist extraction patterns.
///
/// Every pattern must define the named groups `artist` and `file_name`.
#[derive(Debug, Clone)]
pub struct ArtistPatterns {
    patterns: Vec<Regex>,
}

impl ArtistPatterns {
    /// Compiles the given patterns, keeping their order.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, ConfigError> {
        let patterns = patterns
            .iter()
            .map(|pattern| {
                let pattern = pattern.as_ref();
                let regex = Regex::new(pattern).map_err(|e| ConfigError::InvalidRegexPattern {
                    pattern: pattern.to_string(),
                    reason: e.to_string(),
                })?;
                let names: Vec<_> = regex.capture_names().flatten().collect();
                if !names.contains(&"artist") || !names.contains(&"file_name") {
                    return Err(ConfigError::IncompleteArtistPattern(pattern.to_string()));
                }
                Ok(regex)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { patterns })
    }

    /// Returns `(artist, title)` from the first pattern matching `file_name`.
    fn extract(&self, file_name: &str) -> Option<(String, String)> {
        self.patterns.iter().find_map(|regex| {
            let captures = regex.captures(file_name)?;
            let artist = captures.name("artist")?.as_str().trim();
            let title = captures.name("file_name")?.as_str().trim();
            Some((artist.to_string(), title.to_string()))
        })
    }
}

impl Default for ArtistPatterns {
    fn default() -> Self {
        let patterns = DEFAULT_ARTIST_PATTERNS
            .iter()
            .filter_map(|pattern| Regex::new(pattern).ok())
            .collect();
        Self { patterns }
    }
}

/// The secondary attribute of an attributed entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribution {
    /// The artist guessed from the file name, if any pattern matched.
    pub artist: Option<String>,
    /// The file name without the artist part; the base name when no pattern matched.
    pub display_name: String,
}

impl Attribution {
    /// Returns `"<artist> - <display name>"`, or just the display name without an artist.
    pub fn name_with_artist(&self) -> String {
        match &self.artist {
            Some(artist) => format!("{} - {}", artist, self.display_name),
            None => self.display_name.clone(),
        }
    }
}

/// One file being classified and relocated.
///
/// All fields are derived once, at construction, and never change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    path: PathBuf,
    name: String,
    base_name: String,
    extension: String,
    category: Category,
    size: u64,
    attribution: Option<Attribution>,
}

impl Entity {
    /// Builds a plain entity from a file on disk.
    ///
    /// # Errors
    ///
    /// Fails when the path cannot be stat'ed or is not a regular file.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, EntityError> {
        let path = path.into();
        let metadata = fs::metadata(&path).map_err(|e| EntityError::Unreadable {
            path: path.clone(),
            source: e,
        })?;
        if !metadata.is_file() {
            return Err(EntityError::NotAFile { path });
        }
        Self::with_size(path, metadata.len())
    }

    /// Builds a plain entity for a file of known size without touching the filesystem.
    pub fn with_size(path: impl Into<PathBuf>, size: u64) -> Result<Self, EntityError> {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| EntityError::NoFileName { path: path.clone() })?;

        // Leading-dot names such as ".bashrc" have no extension.
        let file_name = Path::new(&name);
        let base_name = file_name
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| name.clone());
        let extension = file_name
            .extension()
            .map(|e| e.to_string_lossy().to_string())
            .unwrap_or_default();
        let category = Category::from_extension(&extension);

        Ok(Self {
            path,
            name,
            base_name,
            extension,
            category,
            size,
            attribution: None,
        })
    }

    /// Turns this entity into an attributed one by matching its name against `patterns`.
    pub fn attributed(mut self, patterns: &ArtistPatterns) -> Self {
        let attribution = match patterns.extract(&self.name) {
            Some((artist, display_name)) => Attribution {
                artist: Some(artist),
                display_name,
            },
            None => Attribution {
                artist: None,
                display_name: self.base_name.clone(),
            },
        };
        self.attribution = Some(attribution);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The final path segment.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The name without its extension.
    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    /// The extension without its leading dot, empty when there is none.
    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn category(&self) -> Category {
        self.category
    }

    /// Size in bytes, as observed at construction.
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn size_in_mb(&self) -> f64 {
        self.size as f64 / (1024.0 * 1024.0)
    }

    /// The attribution, present only on attributed entities.
    pub fn attribution(&self) -> Option<&Attribution> {
        self.attribution.as_ref()
    }

    /// The artist, if this is an attributed entity and a pattern matched.
    pub fn artist(&self) -> Option<&str> {
        self.attribution.as_ref()?.artist.as_deref()
    }
}

/// Builds the entities of a batch, all of the same [`EntityKind`].
#[derive(Debug, Clone, Default)]
pub struct EntityBuilder {
    kind: EntityKind,
    patterns: ArtistPatterns,
}

impl EntityBuilder {
    pub fn new(kind: EntityKind, patterns: ArtistPatterns) -> Self {
        Self { kind, patterns }
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Builds the entity for `path`.
    pub fn build(&self, path: &Path) -> Result<Entity, EntityError> {
        let entity = Entity::new(path)?;
        Ok(match self.kind {
            EntityKind::File => entity,
            EntityKind::Artist => entity.attributed(&self.patterns),
        })
    }
}
