//! Scanning a directory and moving its files into category folders.
//!
//! The [`Organizer`] walks the immediate children of a directory, skips
//! subdirectories and hidden entries, classifies each remaining file by
//! extension and moves it into `<root>/<category>/`. Name collisions in the
//! destination folder are resolved by [`unique_target`], which appends
//! ` (1)`, ` (2)`, ... before the extension.

use crate::config::CompiledFilters;
use crate::file_category::CategoryMap;
use crate::fs::{DirEntry, FileSystem};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Upper bound on ` (n)` candidates tried before giving up on a name.
pub const MAX_NAME_PROBES: u32 = 10_000;

/// Errors that can occur while organizing a directory.
#[derive(Debug, Error)]
pub enum OrganizeError {
    /// The target path is missing or is not a directory.
    #[error("not a directory: {}", path.display())]
    InvalidRoot { path: PathBuf },

    /// The target directory could not be listed.
    #[error("failed to read directory {}: {source}", path.display())]
    ScanFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A category folder could not be created.
    #[error("failed to create directory {}: {source}", path.display())]
    DirectoryCreationFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The category path exists but is something other than a directory.
    #[error("{} exists and is not a directory", path.display())]
    DestinationNotDirectory { path: PathBuf },

    /// A file could not be moved.
    #[error("failed to move {} to {}: {source}", from.display(), to.display())]
    FileMoveFailure {
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },

    /// No free ` (n)` name was found within [`MAX_NAME_PROBES`] attempts.
    #[error("no free name for {name} in {} after {attempts} attempts", dir.display())]
    NameResolutionExhausted {
        dir: PathBuf,
        name: String,
        attempts: u32,
    },
}

/// Result type for organize operations.
pub type OrganizeResult<T> = Result<T, OrganizeError>;

/// Splits a file name into stem and extension, the extension without its dot.
///
/// Only the last extension counts. A leading dot does not start one and a
/// trailing dot leaves none, so `".bashrc"` and `"notes."` have no extension.
///
/// # Examples
///
/// ```
/// use downtidy::file_organizer::split_name;
/// use std::ffi::OsStr;
///
/// let name = OsStr::new;
/// assert_eq!(split_name(name("report.pdf")), (name("report"), Some(name("pdf"))));
/// assert_eq!(split_name(name("backup.tar.gz")), (name("backup.tar"), Some(name("gz"))));
/// assert_eq!(split_name(name("README")), (name("README"), None));
/// ```
pub fn split_name(name: &OsStr) -> (&OsStr, Option<&OsStr>) {
    let path = Path::new(name);
    match (path.file_stem(), path.extension()) {
        (Some(stem), Some(ext)) if !ext.is_empty() => (stem, Some(ext)),
        _ => (name, None),
    }
}

fn numbered_name(stem: &OsStr, ext: Option<&OsStr>, n: u32) -> OsString {
    let mut name = stem.to_os_string();
    name.push(format!(" ({n})"));
    if let Some(ext) = ext {
        name.push(".");
        name.push(ext);
    }
    name
}

/// Returns a path in `dest_dir` for `name` that nothing currently occupies.
///
/// `dest_dir/name` is returned unchanged when it is free, otherwise the first
/// free `stem (n).ext` for n = 1, 2, ... This only checks; it reserves
/// nothing, so another process creating the same name in between is not
/// guarded against.
pub fn unique_target<F: FileSystem + ?Sized>(
    fs: &F,
    dest_dir: &Path,
    name: impl AsRef<OsStr>,
) -> OrganizeResult<PathBuf> {
    unique_target_by(dest_dir, name, |candidate| fs.exists(candidate))
}

/// [`unique_target`] with a caller-supplied occupancy check.
pub fn unique_target_by(
    dest_dir: &Path,
    name: impl AsRef<OsStr>,
    is_taken: impl Fn(&Path) -> bool,
) -> OrganizeResult<PathBuf> {
    let name = name.as_ref();
    let dest = dest_dir.join(name);
    if !is_taken(&dest) {
        return Ok(dest);
    }

    let (stem, ext) = split_name(name);
    for i in 1..=MAX_NAME_PROBES {
        let candidate = dest_dir.join(numbered_name(stem, ext, i));
        if !is_taken(&candidate) {
            return Ok(candidate);
        }
    }

    Err(OrganizeError::NameResolutionExhausted {
        dir: dest_dir.to_path_buf(),
        name: name.to_string_lossy().into_owned(),
        attempts: MAX_NAME_PROBES,
    })
}

/// One file moved (or, in simulate mode, planned to be moved).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoveRecord {
    /// Original file name.
    pub name: String,
    pub category: String,
    /// Destination relative to the organized directory.
    pub destination: PathBuf,
    /// Whether a collision forced a new name.
    pub renamed: bool,
}

/// A file that could not be organized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureRecord {
    pub name: String,
    pub error: String,
}

/// Why entries were left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SkipCounts {
    pub directories: usize,
    pub hidden: usize,
    pub excluded: usize,
}

/// Outcome of one organize run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub root: PathBuf,
    pub simulate: bool,
    /// RFC 3339 time the run started.
    pub started_at: String,
    /// Category folders created (or that would be created).
    pub created_folders: Vec<PathBuf>,
    pub moves: Vec<MoveRecord>,
    pub skipped: SkipCounts,
    pub failures: Vec<FailureRecord>,
}

impl RunReport {
    fn new(root: &Path, simulate: bool) -> Self {
        Self {
            root: root.to_path_buf(),
            simulate,
            started_at: chrono::Utc::now().to_rfc3339(),
            created_folders: Vec::new(),
            moves: Vec::new(),
            skipped: SkipCounts::default(),
            failures: Vec::new(),
        }
    }

    pub fn moved_count(&self) -> usize {
        self.moves.len()
    }

    /// Files per category.
    pub fn category_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for record in &self.moves {
            *counts.entry(record.category.clone()).or_insert(0) += 1;
        }
        counts
    }

    /// True when no entry failed.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Receives progress events while a run is in flight.
///
/// Paths passed to `folder_created` are absolute; `file_moved` gets the
/// destination relative to the organized directory.
pub trait Reporter {
    fn started(&mut self, _root: &Path, _simulate: bool) {}
    fn folder_created(&mut self, folder: &Path, simulate: bool);
    fn file_moved(&mut self, name: &str, destination: &Path, simulate: bool);
    fn entry_failed(&mut self, name: &str, error: &OrganizeError);
    fn finished(&mut self, _report: &RunReport) {}
}

/// A [`Reporter`] that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentReporter;

impl Reporter for SilentReporter {
    fn folder_created(&mut self, _folder: &Path, _simulate: bool) {}
    fn file_moved(&mut self, _name: &str, _destination: &Path, _simulate: bool) {}
    fn entry_failed(&mut self, _name: &str, _error: &OrganizeError) {}
}

/// Moves the files of one directory into category subfolders.
pub struct Organizer<'a, F: FileSystem + ?Sized> {
    fs: &'a F,
    categories: &'a CategoryMap,
    filters: Option<&'a CompiledFilters>,
}

/// Per-run bookkeeping for simulate mode, where nothing touches the disk.
#[derive(Default)]
struct Plan {
    folders: HashSet<PathBuf>,
    targets: HashSet<PathBuf>,
    /// Sources already planned to move away.
    vacated: HashSet<PathBuf>,
}

impl Plan {
    /// Whether `path` would be occupied at this point of a live run.
    fn occupied<F: FileSystem + ?Sized>(&self, fs: &F, path: &Path) -> bool {
        self.targets.contains(path) || (fs.exists(path) && !self.vacated.contains(path))
    }
}

impl<'a, F: FileSystem + ?Sized> Organizer<'a, F> {
    pub fn new(fs: &'a F, categories: &'a CategoryMap) -> Self {
        Self {
            fs,
            categories,
            filters: None,
        }
    }

    /// Leaves files matched by `filters` in place.
    pub fn with_filters(mut self, filters: &'a CompiledFilters) -> Self {
        self.filters = Some(filters);
        self
    }

    /// Category folder name for a directory entry.
    pub fn category_of(&self, entry: &DirEntry) -> &'a str {
        let ext = entry.extension();
        if ext.is_empty() {
            self.categories.default_category()
        } else {
            self.categories.category_for(&ext)
        }
    }

    /// Organizes `root`.
    ///
    /// With `simulate` set nothing is created or moved; the report and the
    /// reporter events describe what a live run would do.
    ///
    /// # Errors
    ///
    /// Fails without touching anything if `root` is not a directory or cannot
    /// be listed. Failures on individual files do not abort the run; they are
    /// reported and collected in [`RunReport::failures`].
    pub fn run(
        &self,
        root: &Path,
        simulate: bool,
        reporter: &mut dyn Reporter,
    ) -> OrganizeResult<RunReport> {
        if !self.fs.is_dir(root) {
            return Err(OrganizeError::InvalidRoot {
                path: root.to_path_buf(),
            });
        }

        let mut entries = self
            .fs
            .read_dir(root)
            .map_err(|e| OrganizeError::ScanFailed {
                path: root.to_path_buf(),
                source: e,
            })?;
        entries.sort_by(|a, b| a.path.cmp(&b.path));

        tracing::info!(
            "organizing {} ({} entries, simulate={})",
            root.display(),
            entries.len(),
            simulate
        );

        let mut report = RunReport::new(root, simulate);
        let mut plan = Plan::default();
        reporter.started(root, simulate);

        for entry in &entries {
            let name = entry.display_name();

            if entry.is_dir {
                tracing::debug!("skipping directory {name}");
                report.skipped.directories += 1;
                continue;
            }
            if entry.is_hidden() {
                tracing::debug!("skipping hidden entry {name}");
                report.skipped.hidden += 1;
                continue;
            }
            if let Some(filters) = self.filters
                && filters.is_excluded(&name, &entry.extension())
            {
                tracing::debug!("skipping excluded file {name}");
                report.skipped.excluded += 1;
                continue;
            }

            let outcome =
                self.process_entry(root, entry, &name, simulate, &mut plan, &mut report, reporter);
            if let Err(e) = outcome {
                tracing::warn!("{name}: {e}");
                reporter.entry_failed(&name, &e);
                report.failures.push(FailureRecord {
                    name,
                    error: e.to_string(),
                });
            }
        }

        reporter.finished(&report);
        Ok(report)
    }

    #[allow(clippy::too_many_arguments)]
    fn process_entry(
        &self,
        root: &Path,
        entry: &DirEntry,
        name: &str,
        simulate: bool,
        plan: &mut Plan,
        report: &mut RunReport,
        reporter: &mut dyn Reporter,
    ) -> OrganizeResult<()> {
        let category = self.category_of(entry);
        let target_dir = root.join(category);

        self.ensure_folder(&target_dir, simulate, plan, report, reporter)?;

        let target = if simulate {
            unique_target_by(&target_dir, &entry.name, |p| plan.occupied(self.fs, p))?
        } else {
            unique_target(self.fs, &target_dir, &entry.name)?
        };

        if !simulate {
            self.fs
                .rename(&entry.path, &target)
                .map_err(|e| OrganizeError::FileMoveFailure {
                    from: entry.path.clone(),
                    to: target.clone(),
                    source: e,
                })?;
        }

        let relative = target.strip_prefix(root).unwrap_or(&target).to_path_buf();
        let renamed = target.file_name() != Some(entry.name.as_os_str());
        reporter.file_moved(name, &relative, simulate);
        if simulate {
            plan.targets.insert(target);
            plan.vacated.insert(entry.path.clone());
        }
        report.moves.push(MoveRecord {
            name: name.to_string(),
            category: category.to_string(),
            destination: relative,
            renamed,
        });
        Ok(())
    }

    fn ensure_folder(
        &self,
        target_dir: &Path,
        simulate: bool,
        plan: &mut Plan,
        report: &mut RunReport,
        reporter: &mut dyn Reporter,
    ) -> OrganizeResult<()> {
        if self.fs.is_dir(target_dir) {
            return Ok(());
        }
        if self.fs.exists(target_dir) && !plan.vacated.contains(target_dir) {
            return Err(OrganizeError::DestinationNotDirectory {
                path: target_dir.to_path_buf(),
            });
        }

        if simulate {
            // Report the folder once, the first time a category needs it.
            if plan.folders.insert(target_dir.to_path_buf()) {
                reporter.folder_created(target_dir, true);
                report.created_folders.push(target_dir.to_path_buf());
            }
            return Ok(());
        }

        self.fs
            .create_dir_all(target_dir)
            .map_err(|e| OrganizeError::DirectoryCreationFailed {
                path: target_dir.to_path_buf(),
                source: e,
            })?;
        reporter.folder_created(target_dir, false);
        report.created_folders.push(target_dir.to_path_buf());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ExcludeRules, FilterRules, OrganizerConfig};
    use crate::fs::MemoryFileSystem;

    /// Records reporter events as plain strings.
    #[derive(Default)]
    struct RecordingReporter {
        events: Vec<String>,
    }

    impl Reporter for RecordingReporter {
        fn folder_created(&mut self, folder: &Path, simulate: bool) {
            self.events
                .push(format!("folder {} {simulate}", folder.display()));
        }

        fn file_moved(&mut self, name: &str, destination: &Path, simulate: bool) {
            self.events
                .push(format!("move {name} -> {} {simulate}", destination.display()));
        }

        fn entry_failed(&mut self, name: &str, _error: &OrganizeError) {
            self.events.push(format!("failed {name}"));
        }
    }

    fn run(fs: &MemoryFileSystem, simulate: bool) -> (RunReport, Vec<String>) {
        let categories = CategoryMap::default();
        let mut reporter = RecordingReporter::default();
        let report = Organizer::new(fs, &categories)
            .run(Path::new("/dl"), simulate, &mut reporter)
            .expect("run failed");
        (report, reporter.events)
    }

    #[test]
    fn test_split_name() {
        let os = OsStr::new;
        assert_eq!(split_name(os("report.pdf")), (os("report"), Some(os("pdf"))));
        assert_eq!(split_name(os("a.tar.gz")), (os("a.tar"), Some(os("gz"))));
        assert_eq!(split_name(os("README")), (os("README"), None));
        assert_eq!(split_name(os(".bashrc")), (os(".bashrc"), None));
        assert_eq!(split_name(os("trailing.")), (os("trailing."), None));
    }

    #[cfg(unix)]
    #[test]
    fn test_unique_target_non_utf8_name() {
        use std::os::unix::ffi::OsStrExt;

        let fs = MemoryFileSystem::new();
        let name = OsStr::from_bytes(b"caf\xe9.pdf");
        fs.add_file(Path::new("/dl/PDFs").join(name), b"");

        let target = unique_target(&fs, Path::new("/dl/PDFs"), name).unwrap();
        assert_eq!(
            target,
            Path::new("/dl/PDFs").join(OsStr::from_bytes(b"caf\xe9 (1).pdf"))
        );
    }

    #[test]
    fn test_unique_target_free_name_unchanged() {
        let fs = MemoryFileSystem::new();
        fs.add_dir("/dl/PDFs");

        let target = unique_target(&fs, Path::new("/dl/PDFs"), "report.pdf").unwrap();
        assert_eq!(target, PathBuf::from("/dl/PDFs/report.pdf"));
    }

    #[test]
    fn test_unique_target_tries_numbers_in_order() {
        let fs = MemoryFileSystem::new();
        fs.add_file("/dl/PDFs/report.pdf", b"");
        fs.add_file("/dl/PDFs/report (1).pdf", b"");
        fs.add_file("/dl/PDFs/report (3).pdf", b"");

        let target = unique_target(&fs, Path::new("/dl/PDFs"), "report.pdf").unwrap();
        assert_eq!(target, PathBuf::from("/dl/PDFs/report (2).pdf"));
    }

    #[test]
    fn test_unique_target_without_extension() {
        let fs = MemoryFileSystem::new();
        fs.add_file("/dl/Other/LICENSE", b"");

        let target = unique_target(&fs, Path::new("/dl/Other"), "LICENSE").unwrap();
        assert_eq!(target, PathBuf::from("/dl/Other/LICENSE (1)"));
    }

    #[test]
    fn test_unique_target_is_stable_and_free() {
        let fs = MemoryFileSystem::new();
        fs.add_file("/dl/Images/a.jpg", b"");
        fs.add_dir("/dl/Images/a (1).jpg");

        let first = unique_target(&fs, Path::new("/dl/Images"), "a.jpg").unwrap();
        let second = unique_target(&fs, Path::new("/dl/Images"), "a.jpg").unwrap();
        assert_eq!(first, second);
        assert!(!fs.exists(&first));
        assert_eq!(first, PathBuf::from("/dl/Images/a (2).jpg"));
    }

    #[test]
    fn test_unique_target_exhausted() {
        let err = unique_target_by(Path::new("/dl/Other"), "x.bin", |_| true).unwrap_err();
        assert!(matches!(
            err,
            OrganizeError::NameResolutionExhausted {
                attempts: MAX_NAME_PROBES,
                ..
            }
        ));
    }

    #[test]
    fn test_moves_files_and_skips_dirs_and_hidden() {
        let fs = MemoryFileSystem::new();
        fs.add_file("/dl/a.txt", b"a");
        fs.add_file("/dl/b.jpg", b"b");
        fs.add_file("/dl/.hidden", b"h");
        fs.add_file("/dl/sub/inner.txt", b"i");

        let (report, events) = run(&fs, false);

        assert!(fs.is_file("/dl/Documents/a.txt"));
        assert!(fs.is_file("/dl/Images/b.jpg"));
        assert!(fs.is_file("/dl/.hidden"));
        assert!(fs.is_file("/dl/sub/inner.txt"));
        assert!(!fs.exists(Path::new("/dl/a.txt")));

        assert_eq!(report.moved_count(), 2);
        assert_eq!(report.skipped.directories, 1);
        assert_eq!(report.skipped.hidden, 1);
        assert!(report.is_success());
        assert_eq!(
            events,
            vec![
                "folder /dl/Documents false",
                "move a.txt -> Documents/a.txt false",
                "folder /dl/Images false",
                "move b.jpg -> Images/b.jpg false",
            ]
        );
    }

    #[test]
    fn test_collision_renames_and_keeps_original() {
        let fs = MemoryFileSystem::new();
        fs.add_file("/dl/report.pdf", b"new");
        fs.add_file("/dl/PDFs/report.pdf", b"old");

        let (report, events) = run(&fs, false);

        assert_eq!(fs.read("/dl/PDFs/report.pdf"), Some(b"old".to_vec()));
        assert_eq!(fs.read("/dl/PDFs/report (1).pdf"), Some(b"new".to_vec()));
        assert!(report.moves[0].renamed);
        assert!(report.created_folders.is_empty());
        assert_eq!(events, vec!["move report.pdf -> PDFs/report (1).pdf false"]);
    }

    #[test]
    fn test_no_extension_goes_to_default() {
        let fs = MemoryFileSystem::new();
        fs.add_file("/dl/Makefile", b"");
        fs.add_file("/dl/notes.weird", b"");
        fs.add_file("/dl/trailing.", b"");

        let (report, _) = run(&fs, false);

        assert!(fs.is_file("/dl/Other/Makefile"));
        assert!(fs.is_file("/dl/Other/notes.weird"));
        assert!(fs.is_file("/dl/Other/trailing."));
        assert_eq!(report.category_counts().get("Other"), Some(&3));
        assert_eq!(report.created_folders, vec![PathBuf::from("/dl/Other")]);
    }

    #[test]
    fn test_extension_case_is_ignored() {
        let fs = MemoryFileSystem::new();
        fs.add_file("/dl/Photo.JPG", b"");
        fs.add_file("/dl/Song.Mp3", b"");

        run(&fs, false);

        assert!(fs.is_file("/dl/Images/Photo.JPG"));
        assert!(fs.is_file("/dl/Audio/Song.Mp3"));
    }

    #[test]
    fn test_simulate_makes_no_changes() {
        let fs = MemoryFileSystem::new();
        fs.add_file("/dl/a.txt", b"a");
        fs.add_file("/dl/b.txt", b"b");
        fs.add_file("/dl/c.zip", b"c");
        fs.add_file("/dl/PDFs/x.pdf", b"x");
        fs.add_file("/dl/x.pdf", b"x2");
        let before = fs.paths();

        let (report, events) = run(&fs, true);

        assert_eq!(fs.paths(), before);
        assert_eq!(fs.mutations(), 0);
        assert!(report.simulate);
        assert_eq!(report.moved_count(), 4);
        assert_eq!(
            events,
            vec![
                "folder /dl/Documents true",
                "move a.txt -> Documents/a.txt true",
                "move b.txt -> Documents/b.txt true",
                "folder /dl/Archives true",
                "move c.zip -> Archives/c.zip true",
                "move x.pdf -> PDFs/x (1).pdf true",
            ]
        );
    }

    #[test]
    fn test_simulate_accounts_for_planned_targets() {
        // "a (1).txt" sorts first and takes Documents/a (1).txt, so a.txt must
        // skip past it even though only Documents/a.txt exists on disk.
        let fs = MemoryFileSystem::new();
        fs.add_file("/dl/a.txt", b"");
        fs.add_file("/dl/a (1).txt", b"");
        fs.add_file("/dl/Documents/a.txt", b"");

        let (planned, _) = run(&fs, true);
        let (live, _) = run(&fs, false);

        let planned: Vec<_> = planned.moves.iter().map(|m| &m.destination).collect();
        let live: Vec<_> = live.moves.iter().map(|m| &m.destination).collect();
        assert_eq!(planned, live);
        assert_eq!(
            live,
            vec![
                &PathBuf::from("Documents/a (1).txt"),
                &PathBuf::from("Documents/a (2).txt"),
            ]
        );
        assert!(fs.is_file("/dl/Documents/a (2).txt"));
    }

    #[test]
    fn test_simulate_sees_blocking_file_move_away() {
        // The extensionless "Documents" goes to Other first, freeing the
        // name for the Documents folder that a.txt needs.
        let fs = MemoryFileSystem::new();
        fs.add_file("/dl/Documents", b"");
        fs.add_file("/dl/a.txt", b"");

        let (planned, planned_events) = run(&fs, true);
        assert_eq!(fs.mutations(), 0);
        let (live, _) = run(&fs, false);

        assert!(planned.is_success());
        assert!(live.is_success());
        assert_eq!(planned.moves, live.moves);
        assert_eq!(planned.created_folders, live.created_folders);
        assert_eq!(
            planned_events,
            vec![
                "folder /dl/Other true",
                "move Documents -> Other/Documents true",
                "folder /dl/Documents true",
                "move a.txt -> Documents/a.txt true",
            ]
        );
        assert!(fs.is_file("/dl/Other/Documents"));
        assert!(fs.is_file("/dl/Documents/a.txt"));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_name_is_moved() {
        use std::os::unix::ffi::OsStrExt;

        let fs = MemoryFileSystem::new();
        let name = OsStr::from_bytes(b"caf\xe9.PDF");
        fs.add_file(Path::new("/dl").join(name), b"x");

        let (report, _) = run(&fs, false);

        assert!(report.is_success());
        assert!(fs.is_file(Path::new("/dl/PDFs").join(name)));
        assert_eq!(report.moves[0].name, "caf\u{FFFD}.PDF");
        assert!(!report.moves[0].renamed);
    }

    #[test]
    fn test_invalid_root_fails_without_mutation() {
        let fs = MemoryFileSystem::new();
        fs.add_file("/dl.txt", b"");
        let categories = CategoryMap::default();
        let organizer = Organizer::new(&fs, &categories);

        let err = organizer
            .run(Path::new("/missing"), false, &mut SilentReporter)
            .unwrap_err();
        assert!(matches!(err, OrganizeError::InvalidRoot { .. }));

        let err = organizer
            .run(Path::new("/dl.txt"), false, &mut SilentReporter)
            .unwrap_err();
        assert!(matches!(err, OrganizeError::InvalidRoot { .. }));
        assert_eq!(fs.mutations(), 0);
    }

    #[test]
    fn test_failed_move_does_not_stop_the_run() {
        let fs = MemoryFileSystem::new();
        fs.add_file("/dl/a.txt", b"");
        fs.add_file("/dl/b.txt", b"");
        fs.deny_rename("/dl/a.txt");

        let (report, events) = run(&fs, false);

        assert!(fs.is_file("/dl/a.txt"));
        assert!(fs.is_file("/dl/Documents/b.txt"));
        assert!(!report.is_success());
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].name, "a.txt");
        assert!(events.contains(&"failed a.txt".to_string()));
    }

    #[test]
    fn test_category_path_occupied_by_file() {
        // "Other" has no extension, so it would go into a folder named after itself.
        let fs = MemoryFileSystem::new();
        fs.add_file("/dl/Other", b"");
        fs.add_file("/dl/README", b"");

        let (report, _) = run(&fs, false);

        assert!(fs.is_file("/dl/Other"));
        assert!(fs.is_file("/dl/README"));
        assert_eq!(report.failures.len(), 2);
        assert_eq!(report.moved_count(), 0);
    }

    #[test]
    fn test_filters_exclude_files() {
        let fs = MemoryFileSystem::new();
        fs.add_file("/dl/movie.mkv.part", b"");
        fs.add_file("/dl/movie.mkv", b"");
        let compiled = OrganizerConfig {
            filters: FilterRules {
                exclude: ExcludeRules {
                    extensions: vec!["part".to_string()],
                    ..Default::default()
                },
            },
            ..Default::default()
        }
        .compile()
        .unwrap();

        let report = Organizer::new(&fs, &compiled.categories)
            .with_filters(&compiled.filters)
            .run(Path::new("/dl"), false, &mut SilentReporter)
            .unwrap();

        assert!(fs.is_file("/dl/movie.mkv.part"));
        assert!(fs.is_file("/dl/Videos/movie.mkv"));
        assert_eq!(report.skipped.excluded, 1);
    }

    #[test]
    fn test_custom_category_scheme() {
        let fs = MemoryFileSystem::new();
        fs.add_file("/dl/book.epub", b"");
        fs.add_file("/dl/photo.png", b"");
        let mut categories = CategoryMap::empty("Inbox");
        categories.add_extension_mapping("epub", "Books");

        Organizer::new(&fs, &categories)
            .run(Path::new("/dl"), false, &mut SilentReporter)
            .unwrap();

        assert!(fs.is_file("/dl/Books/book.epub"));
        assert!(fs.is_file("/dl/Inbox/photo.png"));
    }

    #[test]
    fn test_second_run_only_moves_new_files() {
        let fs = MemoryFileSystem::new();
        fs.add_file("/dl/a.txt", b"");
        run(&fs, false);
        fs.add_file("/dl/b.txt", b"");

        let (report, _) = run(&fs, false);

        assert_eq!(report.moved_count(), 1);
        assert_eq!(report.skipped.directories, 1);
        assert!(fs.is_file("/dl/Documents/a.txt"));
        assert!(fs.is_file("/dl/Documents/b.txt"));
    }

    #[test]
    fn test_empty_directory() {
        let fs = MemoryFileSystem::new();
        fs.add_dir("/dl");

        let (report, events) = run(&fs, false);

        assert_eq!(report.moved_count(), 0);
        assert!(report.is_success());
        assert!(events.is_empty());
        assert_eq!(fs.mutations(), 0);
    }
}
