//! Sorting configuration.
//!
//! This module loads the rules that drive a sort run from TOML files. A
//! configuration holds:
//! - General settings: the handler (plain or artist-aware files), the
//!   default operation set, recursion, artist extraction patterns
//! - Candidate filters: hidden files, exact names, glob and regex exclusions
//! - Named operation sets: an ordered list of rules plus an optional default
//!   destination
//!
//! # Configuration File Format
//!
//! ```toml
//! [general]
//! handler = "artist"
//! default_operations = "gallery"
//! recursive = false
//!
//! [filters]
//! exclude_patterns = ["*.part"]
//!
//! [operations.gallery]
//! operation_order = ["signed", "pictures"]
//! default_destination = "misc/{name}"
//!
//! [operations.gallery.rules.signed]
//! conditions = ["is-image", "has-artist"]
//! destination = "art/{artist}/{display_name}.{extension}"
//!
//! [operations.gallery.rules.pictures]
//! conditions = ["is-picture"]
//! destination = "art/unknown/{name}"
//! ```
//!
//! Individual rules are checked lazily: a malformed rule entry does not
//! prevent the configuration from loading, it becomes a rule that never
//! matches and reports its defect when evaluated.

use crate::entity::{ArtistPatterns, DEFAULT_ARTIST_PATTERNS, EntityBuilder, EntityKind};
use crate::error::ConfigError;
use crate::predicate::PredicateInvocation;
use crate::rules::{Rule, RuleSet};
use crate::template::DestinationTemplate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// File name looked up in the current directory.
pub const LOCAL_CONFIG_NAME: &str = "sortwise.toml";

/// Configuration used when no file is found: sort by category, leave the rest.
const BUILTIN_CONFIG: &str = r#"
[general]
handler = "file"
default_operations = "by_type"

[operations.by_type]
operation_order = ["images", "videos", "music", "documents"]

[operations.by_type.rules.images]
conditions = ["is-image"]
destination = "{category}/{name}"

[operations.by_type.rules.videos]
conditions = ["is-video"]
destination = "{category}/{name}"

[operations.by_type.rules.music]
conditions = ["is-music"]
destination = "{category}/{name}"

[operations.by_type.rules.documents]
conditions = ["is-document"]
destination = "{category}/{name}"
"#;

/// The complete configuration of a sort run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SortConfig {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub filters: FilterRules,

    /// Operation sets by name.
    #[serde(default)]
    pub operations: BTreeMap<String, OperationSet>,
}

/// The `[general]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// `"file"` for plain entities, `"artist"` for attributed ones.
    #[serde(default = "default_handler")]
    pub handler: String,

    /// Operation set used when none is requested explicitly.
    #[serde(default)]
    pub default_operations: Option<String>,

    /// Whether to sort files in nested directories too.
    #[serde(default)]
    pub recursive: bool,

    /// Artist extraction patterns; empty means the built-in ones.
    #[serde(default)]
    pub artist_patterns: Vec<String>,
}

fn default_handler() -> String {
    "file".to_string()
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            handler: default_handler(),
            default_operations: None,
            recursive: false,
            artist_patterns: Vec::new(),
        }
    }
}

/// Rules deciding which files of the source directory are candidates at all.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterRules {
    /// Whether to include hidden files (starting with "."). Defaults to false.
    #[serde(default)]
    pub enable_hidden_files: bool,

    /// Exact filenames to skip (e.g., "Thumbs.db").
    #[serde(default)]
    pub exclude_filenames: Vec<String>,

    /// Glob patterns to skip (e.g., "*.part").
    #[serde(default)]
    pub exclude_patterns: Vec<String>,

    /// Regex patterns to skip, matched against the file name.
    #[serde(default)]
    pub exclude_regex: Vec<String>,
}

/// One named operation set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OperationSet {
    /// Rule names in evaluation order.
    #[serde(default)]
    pub operation_order: Vec<String>,

    /// Destination for files no rule matches; unset leaves them in place.
    #[serde(default)]
    pub default_destination: Option<String>,

    /// Rule definitions by name, validated one by one when building a [`RuleSet`].
    #[serde(default)]
    pub rules: BTreeMap<String, toml::Value>,
}

impl OperationSet {
    /// Builds the ordered rule set, turning malformed entries into defective rules.
    pub fn rule_set(&self) -> RuleSet {
        let rules = self
            .operation_order
            .iter()
            .map(|name| match self.rules.get(name) {
                Some(value) => Self::rule_from_value(name, value),
                None => Rule::defective(name, "not defined in this operation set"),
            })
            .collect();

        RuleSet::new(
            rules,
            self.default_destination
                .as_deref()
                .map(DestinationTemplate::new),
        )
    }

    fn rule_from_value(name: &str, value: &toml::Value) -> Rule {
        let Some(table) = value.as_table() else {
            return Rule::defective(name, "expected a table with 'conditions' and 'destination'");
        };

        // Conditions may be an array or a newline-separated string.
        let conditions: Option<Vec<PredicateInvocation>> = match table.get("conditions") {
            Some(toml::Value::Array(items)) => items
                .iter()
                .map(|item| item.as_str().map(PredicateInvocation::parse))
                .collect(),
            Some(toml::Value::String(text)) => Some(
                text.lines()
                    .filter(|line| !line.trim().is_empty())
                    .map(PredicateInvocation::parse)
                    .collect(),
            ),
            _ => {
                return Rule::defective(name, "missing 'conditions'");
            }
        };
        let Some(conditions) = conditions else {
            return Rule::defective(name, "every condition must be a string");
        };

        match table.get("destination").and_then(toml::Value::as_str) {
            Some(destination) => {
                let template = DestinationTemplate::new(destination);
                if let Err(e) = template.validate() {
                    log::warn!("Rule '{}' will fail to relocate: {}", name, e);
                }
                Rule::new(name, conditions, template)
            }
            None => Rule::defective(name, "missing 'destination'"),
        }
    }
}

impl SortConfig {
    /// Load configuration from a file, with fallback to the built-in rules.
    ///
    /// Attempts to load configuration in the following order:
    /// 1. If `config_path` is provided, load from that file
    /// 2. Look for `sortwise.toml` in the current directory
    /// 3. Look for `~/.config/sortwise/config.toml` in home directory
    /// 4. Fall back to the built-in configuration
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration file is explicitly provided but cannot be read,
    /// or if any file found is not valid TOML.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(LOCAL_CONFIG_NAME);
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Ok(home) = std::env::var("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("sortwise")
                .join("config.toml");
            if home_config.exists() {
                return Self::load_from_file(&home_config);
            }
        }

        log::debug!("No configuration file found, using built-in rules");
        Self::builtin()
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        log::info!("Loaded configuration from {}", path.display());
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// The configuration used when no file is found.
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_toml_str(BUILTIN_CONFIG)
    }

    /// Looks up an operation set by name, or the default one when `name` is `None`.
    pub fn operation_set(&self, name: Option<&str>) -> Result<(&str, &OperationSet), ConfigError> {
        let name = name
            .or(self.general.default_operations.as_deref())
            .ok_or_else(|| ConfigError::UnknownOperations("<default>".to_string()))?;

        self.operations
            .get_key_value(name)
            .map(|(key, set)| (key.as_str(), set))
            .ok_or_else(|| ConfigError::UnknownOperations(name.to_string()))
    }

    /// Builds the rule set of an operation set.
    pub fn rule_set(&self, name: Option<&str>) -> Result<RuleSet, ConfigError> {
        let (name, operations) = self.operation_set(name)?;
        log::info!("Loading operations '{}'", name);
        Ok(operations.rule_set())
    }

    /// Builds the entity builder for the configured handler.
    pub fn entity_builder(&self) -> Result<EntityBuilder, ConfigError> {
        let kind = EntityKind::from_handler_name(&self.general.handler)?;
        let patterns = if self.general.artist_patterns.is_empty() {
            ArtistPatterns::new(DEFAULT_ARTIST_PATTERNS)?
        } else {
            ArtistPatterns::new(&self.general.artist_patterns)?
        };
        Ok(EntityBuilder::new(kind, patterns))
    }
}
