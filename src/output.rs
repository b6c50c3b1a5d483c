//! Terminal output.
//!
//! All user-facing lines go through [`OutputFormatter`], so colours and
//! wording live in one place. [`ConsoleReporter`] plugs it into the
//! organizer's progress events.

use crate::file_organizer::{OrganizeError, Reporter, RunReport};
use colored::*;
use std::collections::BTreeMap;
use std::path::Path;

/// Prefix for every line describing an action that was only simulated.
pub const DRY_RUN_PREFIX: &str = "[DRY RUN]";

/// Manages all CLI output with consistent styling.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints an error message to stderr in red.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use downtidy::output::OutputFormatter;
    /// OutputFormatter::error("not a directory: /nowhere");
    /// ```
    pub fn error(message: &str) {
        eprintln!("{} {}", "Error:".red().bold(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an info message in cyan.
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    /// Prints a regular message without styling.
    pub fn plain(message: &str) {
        println!("{}", message);
    }

    /// Prints a section header.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Prints a line describing a simulated action in yellow.
    pub fn simulated(line: &str) {
        println!("{}", line.yellow());
    }

    /// Prints a table of files per category.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use downtidy::output::OutputFormatter;
    /// use std::collections::BTreeMap;
    ///
    /// let mut counts = BTreeMap::new();
    /// counts.insert("Documents".to_string(), 15);
    /// counts.insert("Images".to_string(), 8);
    /// OutputFormatter::summary_table(&counts, 23);
    /// ```
    pub fn summary_table(category_counts: &BTreeMap<String, usize>, total_files: usize) {
        Self::header("SUMMARY");

        let width = category_counts
            .keys()
            .map(String::len)
            .max()
            .unwrap_or(0)
            .max("Category".len());

        println!(
            "{:<width$} | {}",
            "Category".bold(),
            "Files".bold(),
            width = width
        );
        println!("{}", "-".repeat(width + 10));

        for (category, count) in category_counts {
            println!(
                "{:<width$} | {} {}",
                category,
                count.to_string().green(),
                plural(*count),
                width = width
            );
        }

        println!("{}", "-".repeat(width + 10));
        println!(
            "{:<width$} | {} {}",
            "Total".bold(),
            total_files.to_string().green().bold(),
            plural(total_files),
            width = width
        );
    }
}

fn plural(count: usize) -> &'static str {
    if count == 1 { "file" } else { "files" }
}

/// Line for a folder that was, or would be, created.
pub fn folder_line(folder: &Path, simulate: bool) -> String {
    if simulate {
        format!("{DRY_RUN_PREFIX} Would create folder: {}", folder.display())
    } else {
        format!("Created folder: {}", folder.display())
    }
}

/// Line for a file that was, or would be, moved.
pub fn move_line(name: &str, destination: &Path, simulate: bool) -> String {
    if simulate {
        format!("{DRY_RUN_PREFIX} Would move: {name} -> {}", destination.display())
    } else {
        format!("Moved: {name} -> {}", destination.display())
    }
}

/// Banner printed before the first entry is processed.
pub fn start_line(root: &Path, simulate: bool) -> String {
    let prefix = if simulate { "DRY RUN: " } else { "" };
    format!("{prefix}Organizing: {}", root.display())
}

/// [`Reporter`] that prints progress lines to the terminal.
#[derive(Debug, Default)]
pub struct ConsoleReporter {
    /// Print the per-category table when the run finishes.
    pub show_summary: bool,
}

impl ConsoleReporter {
    pub fn new(show_summary: bool) -> Self {
        Self { show_summary }
    }
}

impl Reporter for ConsoleReporter {
    fn started(&mut self, root: &Path, simulate: bool) {
        OutputFormatter::info(&start_line(root, simulate));
    }

    fn folder_created(&mut self, folder: &Path, simulate: bool) {
        let line = folder_line(folder, simulate);
        if simulate {
            OutputFormatter::simulated(&line);
        } else {
            OutputFormatter::plain(&line);
        }
    }

    fn file_moved(&mut self, name: &str, destination: &Path, simulate: bool) {
        let line = move_line(name, destination, simulate);
        if simulate {
            OutputFormatter::simulated(&line);
        } else {
            OutputFormatter::plain(&line);
        }
    }

    fn entry_failed(&mut self, name: &str, error: &OrganizeError) {
        OutputFormatter::error(&format!("{name}: {error}"));
    }

    fn finished(&mut self, report: &RunReport) {
        if self.show_summary && report.moved_count() > 0 {
            OutputFormatter::summary_table(&report.category_counts(), report.moved_count());
        }
        if !report.is_success() {
            OutputFormatter::warning(&format!(
                "{} {} could not be organized",
                report.failures.len(),
                plural(report.failures.len())
            ));
        }
        OutputFormatter::plain("Done.");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_move_line() {
        let dest = PathBuf::from("PDFs").join("report (1).pdf");
        assert_eq!(
            move_line("report.pdf", &dest, false),
            format!("Moved: report.pdf -> {}", dest.display())
        );
        assert_eq!(
            move_line("report.pdf", &dest, true),
            format!("[DRY RUN] Would move: report.pdf -> {}", dest.display())
        );
    }

    #[test]
    fn test_folder_line() {
        let folder = Path::new("/dl/Images");
        assert_eq!(folder_line(folder, false), "Created folder: /dl/Images");
        assert_eq!(
            folder_line(folder, true),
            "[DRY RUN] Would create folder: /dl/Images"
        );
    }

    #[test]
    fn test_start_line() {
        let root = Path::new("/dl");
        assert_eq!(start_line(root, false), "Organizing: /dl");
        assert_eq!(start_line(root, true), "DRY RUN: Organizing: /dl");
    }

    #[test]
    fn test_plural() {
        assert_eq!(plural(0), "files");
        assert_eq!(plural(1), "file");
        assert_eq!(plural(2), "files");
    }
}
