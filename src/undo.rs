//! Undo journal for reverting sort operations.
//!
//! The journal is a JSON array of the most recent sort passes:
//!
//! ```json
//! [
//!   {
//!     "timestamp": "2024-05-01 14:30:52",
//!     "files": [
//!       {"original_path": "...", "new_path": "...", "category": "Images"}
//!     ]
//!   }
//! ]
//! ```
//!
//! At most [`MAX_UNDO_HISTORY`] operations are kept. The file is rewritten
//! in full on every append and undo.
//!
//! Undoing removes the newest operation from the journal *before* any file
//! is moved back, so an undo that fails partway cannot be retried from the
//! journal.

use crate::file_organizer::{MoveRecord, OrganizeError, OrganizeResult, move_file};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Number of sort operations retained in the journal.
pub const MAX_UNDO_HISTORY: usize = 5;

/// One sort pass that can be undone as a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    /// Local time of the sort, `YYYY-MM-DD HH:MM:SS`.
    #[serde(default)]
    pub timestamp: String,
    /// Moved files in the order they were moved.
    #[serde(default)]
    pub files: Vec<MoveRecord>,
}

/// Reasons an undo could not start.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UndoError {
    #[error("No previous sort operations to undo.")]
    NothingToUndo,
    #[error("The last operation record was empty.")]
    EmptyOperation,
}

/// Represents the result of an undo operation.
#[derive(Debug, Default)]
pub struct UndoReport {
    /// Number of files moved back to their original location.
    pub restored: usize,
    /// One message per file that could not be restored.
    pub failures: Vec<String>,
}

impl UndoReport {
    /// Returns true if every file of the operation was restored.
    pub fn is_complete_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Human-readable summary, listing failures on separate lines.
    pub fn message(&self) -> String {
        let mut message = format!("Successfully undid {} file(s).", self.restored);
        if !self.failures.is_empty() {
            message.push_str("\nFailures:\n");
            message.push_str(&self.failures.join("\n"));
        }
        message
    }
}

/// Bounded history of sort operations stored at an explicit path.
#[derive(Debug, Clone)]
pub struct UndoJournal {
    path: PathBuf,
}

impl UndoJournal {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the persisted operations, oldest first.
    ///
    /// A missing, unreadable or malformed journal is treated as empty.
    pub fn operations(&self) -> Vec<Operation> {
        if !self.path.exists() {
            return Vec::new();
        }

        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                warn!("Could not read undo journal {}: {}", self.path.display(), e);
                return Vec::new();
            }
        };

        serde_json::from_str(&content).unwrap_or_else(|e| {
            warn!("Invalid undo journal {}: {}", self.path.display(), e);
            Vec::new()
        })
    }

    fn save(&self, operations: &[Operation]) -> OrganizeResult<()> {
        let json = serde_json::to_string_pretty(operations).map_err(|e| {
            OrganizeError::HistoryWriteFailed {
                source: std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    format!("JSON serialization failed: {}", e),
                ),
            }
        })?;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .map_err(|e| OrganizeError::HistoryWriteFailed { source: e })?;
        }

        fs::write(&self.path, json).map_err(|e| OrganizeError::HistoryWriteFailed { source: e })
    }

    /// Records a completed sort pass.
    ///
    /// Returns `Ok(false)` without touching the journal when `moved_files`
    /// is empty. Older operations beyond [`MAX_UNDO_HISTORY`] are dropped.
    pub fn append(&self, moved_files: Vec<MoveRecord>) -> OrganizeResult<bool> {
        if moved_files.is_empty() {
            return Ok(false);
        }

        let count = moved_files.len();
        let mut operations = self.operations();
        operations.push(Operation {
            timestamp: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            files: moved_files,
        });

        if operations.len() > MAX_UNDO_HISTORY {
            let excess = operations.len() - MAX_UNDO_HISTORY;
            operations.drain(..excess);
        }

        self.save(&operations)?;
        info!("Logged sort operation with {} files for undo", count);
        Ok(true)
    }

    /// Reverts the most recent operation.
    ///
    /// Files are moved back newest first. Each file that cannot be restored
    /// is listed in the report and the rest continue. Category directories
    /// left empty are removed.
    ///
    /// # Errors
    ///
    /// `UndoError::NothingToUndo` when the journal is empty,
    /// `UndoError::EmptyOperation` when the newest entry has no files.
    pub fn undo_last(&self) -> Result<UndoReport, UndoError> {
        let mut operations = self.operations();
        let last = operations.pop().ok_or(UndoError::NothingToUndo)?;

        if let Err(e) = self.save(&operations) {
            warn!("Could not update undo journal: {}", e);
        }

        if last.files.is_empty() {
            return Err(UndoError::EmptyOperation);
        }

        debug!(
            "Undoing operation from {} ({} files)",
            last.timestamp,
            last.files.len()
        );

        let mut report = UndoReport::default();
        for record in last.files.iter().rev() {
            match restore_file(record) {
                Ok(()) => report.restored += 1,
                Err(reason) => {
                    warn!("{}", reason);
                    report.failures.push(reason);
                }
            }
        }

        info!(
            "Undo finished: {} restored, {} failed",
            report.restored,
            report.failures.len()
        );
        Ok(report)
    }

    /// [`UndoJournal::undo_last`] reduced to a success flag and a message.
    pub fn undo_last_summary(&self) -> (bool, String) {
        match self.undo_last() {
            Ok(report) => (report.is_complete_success(), report.message()),
            Err(e) => (false, e.to_string()),
        }
    }
}

/// Moves one file back to its original location.
fn restore_file(record: &MoveRecord) -> Result<(), String> {
    if record.original_path.as_os_str().is_empty() || record.new_path.as_os_str().is_empty() {
        let name = if record.new_path.as_os_str().is_empty() {
            "unknown file".to_string()
        } else {
            record.new_path.display().to_string()
        };
        return Err(format!("Invalid record for {}", name));
    }

    if !record.new_path.exists() {
        return Err(format!(
            "File not found at new path: {}",
            record.new_path.display()
        ));
    }

    if record.original_path.exists() {
        let backup_path = generate_backup_path(&record.original_path);
        fs::rename(&record.original_path, &backup_path).map_err(|e| {
            format!(
                "Could not backup conflicting file {}: {}",
                record.original_path.display(),
                e
            )
        })?;
        info!(
            "Backed up {} to {}",
            record.original_path.display(),
            backup_path.display()
        );
    }

    if let Some(parent) = record.original_path.parent()
        && !parent.exists()
    {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Could not recreate {}: {}", parent.display(), e))?;
    }

    move_file(&record.new_path, &record.original_path).map_err(|e| {
        format!(
            "Failed to move '{}' back to '{}': {}",
            record.new_path.display(),
            record.original_path.display(),
            e
        )
    })?;

    if let Some(category_dir) = record.new_path.parent() {
        remove_if_empty(category_dir);
    }

    Ok(())
}

fn remove_if_empty(dir: &Path) {
    let is_empty = fs::read_dir(dir)
        .map(|mut entries| entries.next().is_none())
        .unwrap_or(false);
    if !is_empty {
        return;
    }

    match fs::remove_dir(dir) {
        Ok(()) => info!("Removed empty category folder: {}", dir.display()),
        Err(e) => warn!("Could not remove empty directory {}: {}", dir.display(), e),
    }
}

/// Generates a backup path for a file by appending a timestamp.
///
/// Example: `file.txt` becomes `file.txt.bak.20251109-143052`
fn generate_backup_path(original_path: &Path) -> PathBuf {
    let timestamp = Local::now().format("%Y%m%d-%H%M%S");
    let filename = original_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "file".to_string());

    original_path.with_file_name(format!("{}.bak.{}", filename, timestamp))
}
