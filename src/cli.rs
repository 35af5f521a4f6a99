//! Command-line interface for smartsort.
//!
//! Parses the command tree with clap and drives the library for each
//! command. Settings are loaded once per invocation; command-line flags
//! override them.

use crate::config::{ConfigError, Settings, config_dir};
use crate::file_organizer::FileOrganizer;
use crate::filter::{FilterSpec, parse_cutoff, parse_size};
use crate::output::OutputFormatter;
use crate::report::{ReportFormat, default_report_path, export_report};
use crate::rules::RuleSet;
use crate::scanner::{FileRecord, scan};
use crate::smart::apply_smart_categories;
use crate::undo::UndoJournal;
use crate::watcher::DirectoryWatcher;
use anyhow::{Context, Result, bail};
use chrono::{DateTime, Local};
use clap::{ArgAction, Args, Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::Level;

#[derive(Parser, Debug)]
#[command(
    name = "smartsort",
    version,
    about = "Sort files into category folders, with undo and directory watching"
)]
pub struct Cli {
    /// Path to a settings file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Undo journal location (overrides the settings file)
    #[arg(long, global = true, value_name = "FILE")]
    pub journal: Option<PathBuf>,

    /// Increase log output (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Maximum tracing level selected by `-v` / `-q`.
    pub fn log_level(&self) -> Level {
        if self.quiet {
            return Level::ERROR;
        }
        match self.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            _ => Level::DEBUG,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Preview how files would be categorized
    Scan {
        /// Folder to scan
        source: PathBuf,

        #[command(flatten)]
        filters: FilterArgs,

        /// Apply filename and size heuristics
        #[arg(long)]
        smart: bool,

        /// Write the preview to a report file (a timestamped name when no FILE is given)
        #[arg(long, value_name = "FILE", num_args = 0..=1, default_missing_value = "")]
        export: Option<String>,

        /// Report format; inferred from the file extension when omitted
        #[arg(long, value_enum)]
        format: Option<ReportFormat>,
    },

    /// Move files into category folders under a destination
    Sort {
        /// Folder to sort
        source: PathBuf,

        /// Destination root; defaults to `default_destination` from the settings
        destination: Option<PathBuf>,

        #[command(flatten)]
        filters: FilterArgs,

        /// Apply filename and size heuristics
        #[arg(long)]
        smart: bool,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Revert the most recent sort
    Undo,

    /// Report files added, modified or deleted in a folder
    Watch {
        /// Folder to watch
        directory: PathBuf,

        /// Stop after this many seconds; runs until interrupted otherwise
        #[arg(long, value_name = "SECS")]
        duration: Option<u64>,
    },

    /// Manage custom categorization rules
    Rules {
        /// Rules file (overrides the settings file)
        #[arg(long, value_name = "FILE")]
        rules: Option<PathBuf>,

        #[command(subcommand)]
        action: RulesAction,
    },

    /// Inspect or create the settings file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum RulesAction {
    /// List rules in precedence order
    List,
    /// Add a rule or change the category of an existing pattern
    Add { pattern: String, category: String },
    /// Remove the rule for a pattern
    Remove { pattern: String },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective settings as TOML
    Show,
    /// Write a settings file with the default values
    Init {
        /// Target file; defaults to the user config directory
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Scan filter flags shared by `scan` and `sort`.
#[derive(Args, Debug, Default)]
pub struct FilterArgs {
    /// Descend into subfolders
    #[arg(long, overrides_with = "no_recursive")]
    pub recursive: bool,

    /// Only consider files directly inside the source folder
    #[arg(long, overrides_with = "recursive")]
    pub no_recursive: bool,

    /// Extension to skip, e.g. `.tmp` (repeatable, replaces the configured list)
    #[arg(long = "exclude", value_name = "EXT")]
    pub exclude: Vec<String>,

    /// Glob pattern of paths to skip (repeatable, added to the configured list)
    #[arg(long = "exclude-pattern", value_name = "GLOB")]
    pub exclude_patterns: Vec<String>,

    /// Skip files smaller than this, e.g. `10KB`
    #[arg(long, value_name = "SIZE", value_parser = parse_size)]
    pub min_size: Option<u64>,

    /// Skip files larger than this, e.g. `2GB`
    #[arg(long, value_name = "SIZE", value_parser = parse_size)]
    pub max_size: Option<u64>,

    /// Skip files modified after the start of this date
    #[arg(long, value_name = "YYYY-MM-DD", value_parser = parse_cutoff)]
    pub before: Option<DateTime<Local>>,

    /// Custom rules file (overrides the settings file)
    #[arg(long, value_name = "FILE")]
    pub rules: Option<PathBuf>,
}

impl FilterArgs {
    fn recursive(&self, default: bool) -> bool {
        if self.recursive {
            true
        } else if self.no_recursive {
            false
        } else {
            default
        }
    }

    /// Builds the scan filters: settings first, flags on top.
    fn to_filter_spec(&self, settings: &Settings) -> Result<FilterSpec, ConfigError> {
        let rules_path = self.rules.clone().unwrap_or_else(|| settings.rules_path());
        let mut spec = settings.filter_spec(RuleSet::load_or_init(&rules_path))?;

        if !self.exclude.is_empty() {
            spec = spec.with_excluded_extensions(&self.exclude);
        }
        if !self.exclude_patterns.is_empty() {
            let mut patterns = settings.filters.exclude_patterns.clone();
            patterns.extend(self.exclude_patterns.iter().cloned());
            spec = spec.with_exclude_patterns(&patterns)?;
        }
        if let Some(min_size) = self.min_size {
            spec = spec.with_min_size(min_size);
        }
        if let Some(max_size) = self.max_size {
            spec = spec.with_max_size(max_size);
        }
        Ok(spec.with_cutoff(self.before))
    }
}

/// Runs one parsed command.
///
/// # Errors
///
/// Returns an error for unusable input (missing folders, unreadable
/// settings, invalid patterns) and when a sort or undo leaves files behind.
///
/// # Examples
///
/// ```no_run
/// use clap::Parser;
/// use smartsort::cli::{Cli, run};
///
/// let cli = Cli::parse_from(["smartsort", "scan", "/home/me/Downloads", "--smart"]);
/// run(cli).expect("scan failed");
/// ```
pub fn run(cli: Cli) -> Result<()> {
    let settings = Settings::load(cli.config.as_deref()).context("Error loading configuration")?;
    let journal = UndoJournal::new(cli.journal.clone().unwrap_or_else(|| settings.journal_path()));

    match cli.command {
        Commands::Scan {
            source,
            filters,
            smart,
            export,
            format,
        } => scan_command(&settings, &source, &filters, smart, export, format),
        Commands::Sort {
            source,
            destination,
            filters,
            smart,
            yes,
        } => sort_command(&settings, &journal, &source, destination, &filters, smart, yes),
        Commands::Undo => undo_command(&journal),
        Commands::Watch {
            directory,
            duration,
        } => watch_command(&settings, &directory, duration.map(Duration::from_secs)),
        Commands::Rules { rules, action } => {
            rules_command(&rules.unwrap_or_else(|| settings.rules_path()), action)
        }
        Commands::Config { action } => config_command(&settings, action),
    }
}

fn collect_records(
    settings: &Settings,
    source: &Path,
    filters: &FilterArgs,
    smart: bool,
) -> Result<Vec<FileRecord>> {
    if !source.is_dir() {
        bail!("Source folder does not exist: {}", source.display());
    }

    let spec = filters
        .to_filter_spec(settings)
        .context("Error compiling filters")?;
    let mut records = scan(source, filters.recursive(settings.sorting.recursive), &spec);

    if smart || settings.sorting.smart_sorting {
        let changed = apply_smart_categories(&mut records);
        OutputFormatter::info(&format!("Smart sorting re-categorized {} file(s)", changed));
    }
    Ok(records)
}

fn scan_command(
    settings: &Settings,
    source: &Path,
    filters: &FilterArgs,
    smart: bool,
    export: Option<String>,
    format: Option<ReportFormat>,
) -> Result<()> {
    let records = collect_records(settings, source, filters, smart)?;

    if records.is_empty() {
        OutputFormatter::warning("No files matched the current filters.");
    } else {
        OutputFormatter::records_table(&records);
    }

    if let Some(export) = export {
        let path = PathBuf::from(&export);
        let format = format.unwrap_or_else(|| infer_format(&path));
        let path = if export.is_empty() {
            default_report_path(format)
        } else {
            path
        };
        let written = export_report(&records, format, &path).context("Error exporting report")?;
        OutputFormatter::success(&format!("Report saved to {}", written.display()));
    }
    Ok(())
}

fn infer_format(path: &Path) -> ReportFormat {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("json") => ReportFormat::Json,
        _ => ReportFormat::Csv,
    }
}

fn sort_command(
    settings: &Settings,
    journal: &UndoJournal,
    source: &Path,
    destination: Option<PathBuf>,
    filters: &FilterArgs,
    smart: bool,
    yes: bool,
) -> Result<()> {
    let Some(destination) = destination.or_else(|| settings.sorting.default_destination.clone())
    else {
        bail!("No destination given and no default_destination configured");
    };

    let records = collect_records(settings, source, filters, smart)?;
    if records.is_empty() {
        OutputFormatter::warning("No files to sort.");
        return Ok(());
    }

    OutputFormatter::info(&format!(
        "Sorting {} file(s) from {} into {}",
        records.len(),
        source.display(),
        destination.display()
    ));
    if !yes && !confirm(&format!("Move {} file(s)?", records.len()))? {
        OutputFormatter::warning("Sort cancelled.");
        return Ok(());
    }

    let pb = OutputFormatter::create_progress_bar(records.len() as u64);
    let report = FileOrganizer::execute_with_progress(&records, &destination, |record, _| {
        pb.set_message(record.name.clone());
        pb.inc(1);
    });
    pb.finish_and_clear();

    match journal.append(report.moved.clone()) {
        Ok(true) => {}
        Ok(false) => OutputFormatter::warning("No files were moved."),
        Err(e) => OutputFormatter::warning(&format!("Could not record operation for undo: {}", e)),
    }

    OutputFormatter::sort_report(&report);

    if !report.is_complete_success() {
        bail!("{} file(s) could not be moved", report.failures.len());
    }
    OutputFormatter::success(&format!("Sorted {} file(s)", report.moved.len()));
    Ok(())
}

fn confirm(question: &str) -> Result<bool> {
    print!("{} [y/N] ", question);
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

fn undo_command(journal: &UndoJournal) -> Result<()> {
    let (success, message) = journal.undo_last_summary();
    if !success {
        bail!(message);
    }
    OutputFormatter::success(&message);
    Ok(())
}

fn watch_command(settings: &Settings, directory: &Path, duration: Option<Duration>) -> Result<()> {
    let mut watcher = DirectoryWatcher::new(settings.watch_config());
    let changes = watcher.changes();

    if !watcher.start(directory) {
        bail!("Failed to start watching {}", directory.display());
    }
    OutputFormatter::info(&format!("Watching {}", directory.display()));

    let deadline = duration.map(|d| Instant::now() + d);
    loop {
        let received = match deadline {
            Some(deadline) => {
                let Some(remaining) = deadline.checked_duration_since(Instant::now()) else {
                    break;
                };
                match changes.recv_timeout(remaining) {
                    Ok(set) => set,
                    Err(_) => break,
                }
            }
            None => match changes.recv() {
                Ok(set) => set,
                Err(_) => break,
            },
        };
        OutputFormatter::change_set(&received);
    }

    watcher.stop();
    OutputFormatter::info("Stopped watching");
    Ok(())
}

fn rules_command(path: &Path, action: RulesAction) -> Result<()> {
    let mut rules = RuleSet::load_or_init(path);

    match action {
        RulesAction::List => {
            OutputFormatter::header(&format!("RULES ({})", path.display()));
            OutputFormatter::rules_table(&rules);
        }
        RulesAction::Add { pattern, category } => {
            rules.add(pattern.as_str(), category.as_str());
            rules.save(path)?;
            OutputFormatter::success(&format!("Rule added: {} -> {}", pattern, category));
        }
        RulesAction::Remove { pattern } => {
            if !rules.remove(&pattern) {
                bail!("No rule for pattern '{}'", pattern);
            }
            rules.save(path)?;
            OutputFormatter::success(&format!("Rule removed: {}", pattern));
        }
    }
    Ok(())
}

fn config_command(settings: &Settings, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            print!("{}", settings.to_toml_string()?);
        }
        ConfigAction::Init { path, force } => {
            let path = path.unwrap_or_else(|| config_dir().join("config.toml"));
            if path.exists() && !force {
                bail!("{} already exists (use --force to overwrite)", path.display());
            }
            Settings::default()
                .save(&path)
                .with_context(|| format!("Error writing {}", path.display()))?;
            OutputFormatter::success(&format!("Wrote default settings to {}", path.display()));
        }
    }
    Ok(())
}
