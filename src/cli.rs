//! Command-line interface for downtidy.
//!
//! This module handles:
//! - Argument parsing
//! - Resolving the target directory (defaulting to the user's downloads folder)
//! - Loading the optional configuration file
//! - Running the organizer and choosing the process exit status

use crate::config::{CompiledConfig, OrganizerConfig};
use crate::file_category::CategoryMap;
use crate::file_organizer::{Organizer, OrganizeError, Reporter, RunReport, SilentReporter};
use crate::fs::RealFileSystem;
use crate::output::{ConsoleReporter, OutputFormatter};
use clap::Parser;
use std::path::{Path, PathBuf};

/// Normal completion, including dry runs and empty directories.
pub const EXIT_OK: i32 = 0;
/// The target is missing, not a directory, or cannot be listed.
pub const EXIT_INVALID_ROOT: i32 = 1;
/// The configuration is invalid or no default directory could be found.
pub const EXIT_USAGE: i32 = 2;
/// The run finished but at least one file could not be organized.
pub const EXIT_PARTIAL_FAILURE: i32 = 3;

/// Sort a downloads folder into category subfolders by file extension.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "downtidy")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory to organize (default: your downloads folder)
    #[arg(short, long)]
    pub path: Option<PathBuf>,

    /// Print what would happen without creating folders or moving files
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// TOML file with a custom category scheme and exclusion rules
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Print the run report as JSON instead of progress lines
    #[arg(long)]
    pub json: bool,

    /// Show debug diagnostics on stderr
    #[arg(short, long)]
    pub verbose: bool,
}

/// The platform downloads folder, or `~/Downloads` when the platform has none.
pub fn default_downloads_dir() -> Option<PathBuf> {
    dirs::download_dir().or_else(|| dirs::home_dir().map(|home| home.join("Downloads")))
}

/// Turns a user-supplied path into an absolute one, expanding a leading `~`.
pub fn resolve_path(raw: &Path) -> PathBuf {
    let expanded = match raw.to_str() {
        Some(text) => PathBuf::from(shellexpand::tilde(text).as_ref()),
        None => raw.to_path_buf(),
    };
    std::path::absolute(&expanded).unwrap_or(expanded)
}

/// Organizes `root` with the built-in category scheme.
///
/// Progress goes to stdout and errors to stderr. Returns the process exit
/// status: [`EXIT_OK`] on success, [`EXIT_INVALID_ROOT`] if `root` is not a
/// usable directory (nothing is touched in that case) and
/// [`EXIT_PARTIAL_FAILURE`] if some files could not be moved.
///
/// # Examples
///
/// ```no_run
/// use downtidy::cli::organize;
/// use std::path::Path;
///
/// let status = organize(Path::new("/home/me/Downloads"), true);
/// std::process::exit(status);
/// ```
pub fn organize(root: &Path, simulate: bool) -> i32 {
    let config = CompiledConfig {
        categories: CategoryMap::default(),
        filters: Default::default(),
    };
    run_organize(root, simulate, &config, &mut ConsoleReporter::new(true))
}

/// Runs the organizer with an explicit configuration and reporter.
pub fn run_organize(
    root: &Path,
    simulate: bool,
    config: &CompiledConfig,
    reporter: &mut dyn Reporter,
) -> i32 {
    match execute(root, simulate, config, reporter) {
        Ok(report) => exit_status(&report),
        Err(e) => {
            OutputFormatter::error(&e.to_string());
            EXIT_INVALID_ROOT
        }
    }
}

fn execute(
    root: &Path,
    simulate: bool,
    config: &CompiledConfig,
    reporter: &mut dyn Reporter,
) -> Result<RunReport, OrganizeError> {
    Organizer::new(&RealFileSystem, &config.categories)
        .with_filters(&config.filters)
        .run(root, simulate, reporter)
}

fn exit_status(report: &RunReport) -> i32 {
    if report.is_success() {
        EXIT_OK
    } else {
        EXIT_PARTIAL_FAILURE
    }
}

/// Runs the command described by `cli` and returns the process exit status.
pub fn run_cli(cli: &Cli) -> i32 {
    let root = match &cli.path {
        Some(path) => resolve_path(path),
        None => match default_downloads_dir() {
            Some(dir) => dir,
            None => {
                OutputFormatter::error("could not determine the downloads folder; pass --path");
                return EXIT_USAGE;
            }
        },
    };

    let loaded = OrganizerConfig::load(cli.config.as_deref()).and_then(OrganizerConfig::compile);
    let config = match loaded {
        Ok(config) => config,
        Err(e) => {
            OutputFormatter::error(&e.to_string());
            return EXIT_USAGE;
        }
    };

    if !cli.json {
        return run_organize(&root, cli.dry_run, &config, &mut ConsoleReporter::new(true));
    }

    match execute(&root, cli.dry_run, &config, &mut SilentReporter) {
        Ok(report) => match serde_json::to_string_pretty(&report) {
            Ok(json) => {
                println!("{json}");
                exit_status(&report)
            }
            Err(e) => {
                OutputFormatter::error(&format!("could not serialize report: {e}"));
                EXIT_USAGE
            }
        },
        Err(e) => {
            OutputFormatter::error(&e.to_string());
            EXIT_INVALID_ROOT
        }
    }
}
