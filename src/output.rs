//! Terminal output for the CLI.
//!
//! Everything the binary shows the user goes through [`OutputFormatter`], so
//! styling stays consistent across commands. Diagnostics go through
//! `tracing` instead.

use crate::file_organizer::SortReport;
use crate::rules::RuleSet;
use crate::scanner::{FileRecord, format_size, total_size};
use crate::watcher::ChangeSet;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeMap;

/// Rows shown by [`OutputFormatter::records_table`] before truncating.
pub const PREVIEW_LIMIT: usize = 50;

/// Manages all CLI output with consistent styling and formatting.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    ///
    /// ```no_run
    /// use smartsort::output::OutputFormatter;
    /// OutputFormatter::success("Sorted 12 files");
    /// ```
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message to stderr in red.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Creates a progress bar for a sort of `total` files.
    ///
    /// ```no_run
    /// use smartsort::output::OutputFormatter;
    /// let pb = OutputFormatter::create_progress_bar(100);
    /// pb.inc(1);
    /// pb.finish_with_message("done");
    /// ```
    pub fn create_progress_bar(total: u64) -> ProgressBar {
        let pb = ProgressBar::new(total);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .map(|style| style.progress_chars("█▓░"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        pb.set_style(style);
        pb
    }

    /// Prints scanned records as a table, at most [`PREVIEW_LIMIT`] rows.
    pub fn records_table(records: &[FileRecord]) {
        Self::header("FILES");

        let shown = &records[..records.len().min(PREVIEW_LIMIT)];
        let name_width = column_width(shown.iter().map(|r| r.name.len()), 4);
        let category_width = column_width(shown.iter().map(|r| r.category.len()), 8);

        println!(
            "{:<nw$}  {:<12}  {:>10}  {:<cw$}  {}",
            "Name".bold(),
            "Type".bold(),
            "Size".bold(),
            "Category".bold(),
            "Modified".bold(),
            nw = name_width,
            cw = category_width
        );
        for record in shown {
            println!(
                "{:<nw$}  {:<12}  {:>10}  {:<cw$}  {}",
                record.name,
                record.type_label(),
                record.size,
                record.category.green(),
                record.modified_display(),
                nw = name_width,
                cw = category_width
            );
        }

        if records.len() > shown.len() {
            println!("... and {} more", records.len() - shown.len());
        }
        println!(
            "\n{} file(s), {}",
            records.len().to_string().bold(),
            format_size(total_size(records))
        );
    }

    /// Prints a summary table with file counts by category.
    ///
    /// # Arguments
    ///
    /// * `category_counts` - Category names mapped to file counts
    /// * `total_files` - Total number of files moved
    pub fn summary_table(category_counts: &BTreeMap<String, usize>, total_files: usize) {
        Self::header("SUMMARY");

        let width = column_width(category_counts.keys().map(String::len), 8);

        println!("{:<width$} | {}", "Category".bold(), "Files".bold());
        println!("{}", "-".repeat(width + 10));

        for (category, count) in category_counts {
            println!(
                "{:<width$} | {} {}",
                category,
                count.to_string().green(),
                plural(*count)
            );
        }

        println!("{}", "-".repeat(width + 10));
        println!(
            "{:<width$} | {} {}",
            "Total".bold(),
            total_files.to_string().green().bold(),
            plural(total_files)
        );
    }

    /// Summary table followed by the failures of a sort pass.
    pub fn sort_report(report: &SortReport) {
        Self::summary_table(&report.category_counts(), report.moved.len());

        if !report.failures.is_empty() {
            Self::header("FAILURES");
            for (path, reason) in &report.failures {
                Self::error(&format!("{}: {}", path.display(), reason));
            }
        }
    }

    pub fn rules_table(rules: &RuleSet) {
        if rules.is_empty() {
            Self::info("No custom rules defined.");
            return;
        }

        let width = column_width(rules.iter().map(|r| r.pattern.len()), 7);
        println!("{:<width$}  {}", "Pattern".bold(), "Category".bold());
        for rule in rules {
            println!("{:<width$}  {}", rule.pattern, rule.category.green());
        }
    }

    /// One line per change set, followed by the affected paths.
    pub fn change_set(changes: &ChangeSet) {
        println!(
            "{} added, {} modified, {} deleted",
            changes.added.len().to_string().green(),
            changes.modified.len().to_string().yellow(),
            changes.deleted.len().to_string().red()
        );
        for path in &changes.added {
            println!("  {} {}", "+".green(), path.display());
        }
        for path in &changes.modified {
            println!("  {} {}", "~".yellow(), path.display());
        }
        for path in &changes.deleted {
            println!("  {} {}", "-".red(), path.display());
        }
    }
}

fn column_width(lengths: impl Iterator<Item = usize>, minimum: usize) -> usize {
    lengths.max().unwrap_or(0).max(minimum)
}

fn plural(count: usize) -> &'static str {
    if count == 1 { "file" } else { "files" }
}
