//! downtidy - sort a downloads folder into category subfolders
//!
//! This library classifies files by extension, moves them into per-category
//! folders under the target directory, renames on collision instead of
//! overwriting, and can simulate a run without touching the filesystem.
//! Category schemes and exclusion rules can be loaded from a TOML file.

pub mod cli;
pub mod config;
pub mod file_category;
pub mod file_organizer;
pub mod fs;
pub mod output;

pub use config::{CompiledConfig, CompiledFilters, ConfigError, OrganizerConfig};
pub use file_category::{CategoryMap, DEFAULT_CATEGORY};
pub use file_organizer::{
    OrganizeError, OrganizeResult, Organizer, Reporter, RunReport, SilentReporter, unique_target,
};
pub use fs::{FileSystem, MemoryFileSystem, RealFileSystem};
pub use output::{ConsoleReporter, OutputFormatter};

pub use cli::{Cli, organize, run_cli};
