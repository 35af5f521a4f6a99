//! smartsort - sort files into category folders
//!
//! This library scans a source tree, assigns each file a category from
//! custom rules, a builtin extension table or filename heuristics, moves the
//! files into `<destination>/<category>/`, and records every sort in a
//! bounded journal so the latest one can be undone. A polling watcher
//! reports files added, modified or deleted in a directory.
//!
//! ```no_run
//! use smartsort::{FileOrganizer, FilterSpec, UndoJournal, scan};
//! use std::path::Path;
//!
//! let filters = FilterSpec::new().with_excluded_extensions([".tmp"]);
//! let records = scan(Path::new("/home/me/Downloads"), true, &filters);
//! let report = FileOrganizer::execute(&records, Path::new("/home/me/Sorted"));
//!
//! let journal = UndoJournal::new("/home/me/.config/smartsort/undo_log.json");
//! journal.append(report.moved).expect("journal write failed");
//! ```

pub mod cli;
pub mod config;
pub mod file_category;
pub mod file_organizer;
pub mod filter;
pub mod output;
pub mod report;
pub mod rules;
pub mod scanner;
pub mod smart;
pub mod undo;
pub mod watcher;

pub use config::{ConfigError, Settings};
pub use file_category::{Category, FileMapper, categorize};
pub use file_organizer::{FileOrganizer, MoveRecord, OrganizeError, SortReport};
pub use filter::FilterSpec;
pub use report::{ReportFormat, export_report};
pub use rules::{Rule, RuleSet};
pub use scanner::{FileRecord, scan};
pub use smart::smart_categorize;
pub use undo::{UndoError, UndoJournal, UndoReport};
pub use watcher::{ChangeSet, DirectoryWatcher, WatchConfig};
