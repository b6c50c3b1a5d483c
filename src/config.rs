//! Category scheme and exclusion configuration.
//!
//! A configuration file lets the user change which folder each extension is
//! sorted into, and keep some files out of the sort altogether. It is read
//! only when passed explicitly with `--config`; without one the built-in
//! scheme is used and nothing is excluded.
//!
//! # Configuration File Format
//!
//! ```toml
//! [categories]
//! use_builtin = true
//! default = "Other"
//!
//! [categories.folders]
//! Ebooks = ["epub", "mobi"]
//!
//! [filters.exclude]
//! filenames = ["desktop.ini"]
//! extensions = ["crdownload", "part"]
//! patterns = ["~$*"]
//! regex = []
//! ```

use crate::file_category::{CategoryMap, DEFAULT_CATEGORY};
use glob::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while loading or compiling configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),

    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),

    #[error("IO error reading configuration: {0}")]
    IoError(String),

    #[error("Invalid category folder name '{0}': must be a single, non-empty path component")]
    InvalidCategoryName(String),

    #[error("Empty extension listed under category '{0}'")]
    EmptyExtension(String),

    #[error("Extension '{extension}' is listed under both '{first}' and '{second}'")]
    DuplicateExtension {
        extension: String,
        first: String,
        second: String,
    },

    #[error("Invalid glob pattern '{0}'")]
    InvalidGlobPattern(String),

    #[error("Invalid regex pattern '{pattern}': {reason}")]
    InvalidRegexPattern { pattern: String, reason: String },
}

/// Top-level configuration document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrganizerConfig {
    #[serde(default)]
    pub categories: CategoryRules,

    #[serde(default)]
    pub filters: FilterRules,
}

/// How extensions map to category folders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryRules {
    /// Start from the built-in scheme. Defaults to true.
    #[serde(default = "default_use_builtin")]
    pub use_builtin: bool,

    /// Folder for unknown or missing extensions.
    #[serde(default = "default_category")]
    pub default: String,

    /// Folder name to extensions, applied on top of the built-in scheme.
    #[serde(default)]
    pub folders: BTreeMap<String, Vec<String>>,
}

fn default_use_builtin() -> bool {
    true
}

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

impl Default for CategoryRules {
    fn default() -> Self {
        Self {
            use_builtin: default_use_builtin(),
            default: default_category(),
            folders: BTreeMap::new(),
        }
    }
}

/// Exclusion rules. Hidden entries are always skipped regardless.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterRules {
    #[serde(default)]
    pub exclude: ExcludeRules,
}

/// Rules for leaving files where they are.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExcludeRules {
    /// Exact filenames (e.g. "desktop.ini").
    #[serde(default)]
    pub filenames: Vec<String>,

    /// Glob patterns matched against the file name (e.g. "*.part").
    #[serde(default)]
    pub patterns: Vec<String>,

    /// Extensions, compared case-insensitively (e.g. "crdownload").
    #[serde(default)]
    pub extensions: Vec<String>,

    /// Regular expressions matched against the file name.
    #[serde(default)]
    pub regex: Vec<String>,
}

/// Configuration validated and ready to hand to the organizer.
#[derive(Debug, Clone)]
pub struct CompiledConfig {
    pub categories: CategoryMap,
    pub filters: CompiledFilters,
}

impl OrganizerConfig {
    /// Loads configuration from `config_path`, or returns the defaults when
    /// no path is given.
    ///
    /// # Errors
    ///
    /// Returns an error if the given file is missing, unreadable or not valid TOML.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        match config_path {
            Some(path) => Self::load_from_file(path),
            None => Ok(Self::default()),
        }
    }

    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))
    }

    /// Validates the configuration and builds the category map and filters.
    ///
    /// # Errors
    ///
    /// Returns an error for bad folder names, empty or duplicated extensions,
    /// and invalid glob or regex patterns.
    pub fn compile(self) -> Result<CompiledConfig, ConfigError> {
        Ok(CompiledConfig {
            categories: self.categories.build()?,
            filters: CompiledFilters::new(self.filters)?,
        })
    }
}

impl CategoryRules {
    /// Builds the [`CategoryMap`] these rules describe.
    pub fn build(&self) -> Result<CategoryMap, ConfigError> {
        validate_category_name(&self.default)?;

        let mut map = if self.use_builtin {
            let mut map = CategoryMap::new();
            map.set_default_category(&self.default);
            map
        } else {
            CategoryMap::empty(&self.default)
        };

        let mut seen: HashMap<String, &str> = HashMap::new();
        for (folder, extensions) in &self.folders {
            validate_category_name(folder)?;
            for ext in extensions {
                let key = ext.trim().trim_start_matches('.').to_lowercase();
                if key.is_empty() {
                    return Err(ConfigError::EmptyExtension(folder.clone()));
                }
                if let Some(first) = seen.get(&key)
                    && *first != folder.as_str()
                {
                    return Err(ConfigError::DuplicateExtension {
                        extension: key,
                        first: first.to_string(),
                        second: folder.clone(),
                    });
                }
                map.add_extension_mapping(&key, folder);
                seen.insert(key, folder);
            }
        }

        Ok(map)
    }
}

/// A category becomes a folder directly under the organized directory, so it
/// has to be exactly one normal path component.
fn validate_category_name(name: &str) -> Result<(), ConfigError> {
    let invalid = name.trim().is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\');
    if invalid {
        return Err(ConfigError::InvalidCategoryName(name.to_string()));
    }
    Ok(())
}

/// Pre-compiled exclusion rules.
#[derive(Debug, Clone, Default)]
pub struct CompiledFilters {
    exclude_filenames: HashSet<String>,
    exclude_extensions: HashSet<String>,
    exclude_patterns: Vec<Pattern>,
    exclude_regexes: Vec<Regex>,
}

impl CompiledFilters {
    fn new(rules: FilterRules) -> Result<Self, ConfigError> {
        let exclude_patterns = rules
            .exclude
            .patterns
            .iter()
            .map(|pattern| {
                Pattern::new(pattern).map_err(|_| ConfigError::InvalidGlobPattern(pattern.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let exclude_regexes = rules
            .exclude
            .regex
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| ConfigError::InvalidRegexPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            exclude_filenames: rules.exclude.filenames.into_iter().collect(),
            exclude_extensions: rules
                .exclude
                .extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_lowercase())
                .collect(),
            exclude_patterns,
            exclude_regexes,
        })
    }

    /// Whether no rule is configured.
    pub fn is_empty(&self) -> bool {
        self.exclude_filenames.is_empty()
            && self.exclude_extensions.is_empty()
            && self.exclude_patterns.is_empty()
            && self.exclude_regexes.is_empty()
    }

    /// Whether a file with this name and (lowercased) extension is excluded.
    ///
    /// Checked in order: exact filename, extension, glob, regex.
    pub fn is_excluded(&self, file_name: &str, extension: &str) -> bool {
        if self.exclude_filenames.contains(file_name) {
            return true;
        }

        if !extension.is_empty() && self.exclude_extensions.contains(extension) {
            return true;
        }

        if self
            .exclude_patterns
            .iter()
            .any(|pattern| pattern.matches(file_name))
        {
            return true;
        }

        self.exclude_regexes
            .iter()
            .any(|regex| regex.is_match(file_name))
    }
}
