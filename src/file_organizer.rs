//! Moving scanned files into category directories.
//!
//! Each record is moved to `<destination>/<category>/<name>`. Moves are
//! independent: a failure is logged and recorded, and the remaining records
//! are still processed.

use crate::scanner::FileRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// A file that was moved successfully.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRecord {
    /// The path of the file before sorting.
    #[serde(default)]
    pub original_path: PathBuf,
    /// The path of the file after sorting.
    #[serde(default)]
    pub new_path: PathBuf,
    /// The category directory the file was moved into.
    #[serde(default)]
    pub category: String,
}

/// Errors that can occur during file organization operations.
#[derive(Debug, Error)]
pub enum OrganizeError {
    /// Failed to create a category directory.
    #[error("Failed to create directory {}: {source}", .path.display())]
    DirectoryCreationFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// A file already exists at the destination.
    #[error("Destination already exists: {}", .destination.display())]
    DestinationExists { destination: PathBuf },
    /// Failed to move a file to its category directory.
    #[error("Failed to move {} to {}: {error}", .from.display(), .to.display())]
    FileMoveFailure {
        from: PathBuf,
        to: PathBuf,
        #[source]
        error: io::Error,
    },
    /// The file path has no name component.
    #[error("Invalid file path: {}", .path.display())]
    InvalidFilePath { path: PathBuf },
    /// Failed to write the undo journal.
    #[error("Failed to write history file: {source}")]
    HistoryWriteFailed {
        #[source]
        source: io::Error,
    },
}

/// Result type for file organization operations.
pub type OrganizeResult<T> = Result<T, OrganizeError>;

/// Outcome of one sort pass.
#[derive(Debug, Default)]
pub struct SortReport {
    /// Files that were moved, in input order.
    pub moved: Vec<MoveRecord>,
    /// Files that could not be moved, with the reason.
    pub failures: Vec<(PathBuf, String)>,
}

impl SortReport {
    pub fn is_complete_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Number of moved files per category, ordered by category name.
    pub fn category_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for record in &self.moved {
            *counts.entry(record.category.clone()).or_insert(0) += 1;
        }
        counts
    }
}

/// Moves files into category subdirectories of a destination root.
pub struct FileOrganizer;

impl FileOrganizer {
    /// Moves every record into `destination/<category>/<name>`, in order.
    ///
    /// Failures are collected in the report; they never stop later records.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use smartsort::file_organizer::FileOrganizer;
    /// use smartsort::filter::FilterSpec;
    /// use smartsort::scanner::scan;
    /// use std::path::Path;
    ///
    /// let records = scan(Path::new("/home/me/Downloads"), true, &FilterSpec::default());
    /// let report = FileOrganizer::execute(&records, Path::new("/home/me/Sorted"));
    /// println!("moved {}, failed {}", report.moved.len(), report.failures.len());
    /// ```
    pub fn execute(records: &[FileRecord], destination: &Path) -> SortReport {
        Self::execute_with_progress(records, destination, |_, _| {})
    }

    /// Like [`FileOrganizer::execute`], calling `on_progress` after each record.
    pub fn execute_with_progress<F>(
        records: &[FileRecord],
        destination: &Path,
        mut on_progress: F,
    ) -> SortReport
    where
        F: FnMut(&FileRecord, Result<&MoveRecord, &OrganizeError>),
    {
        let mut report = SortReport::default();

        for record in records {
            match Self::move_to_category(destination, &record.path, &record.category) {
                Ok(moved) => {
                    debug!("Moved {} -> {}", record.name, record.category);
                    on_progress(record, Ok(&moved));
                    report.moved.push(moved);
                }
                Err(e) => {
                    warn!("Failed to move {}: {}", record.name, e);
                    on_progress(record, Err(&e));
                    report.failures.push((record.path.clone(), e.to_string()));
                }
            }
        }

        info!(
            "Sort finished: {} moved, {} failed",
            report.moved.len(),
            report.failures.len()
        );
        report
    }

    /// Moves one file into its category directory and returns the record.
    ///
    /// The category directory is created if needed. An existing file at the
    /// destination is never overwritten.
    pub fn move_to_category(
        destination: &Path,
        file_path: &Path,
        category: &str,
    ) -> OrganizeResult<MoveRecord> {
        let category_path = destination.join(category);
        fs::create_dir_all(&category_path).map_err(|e| OrganizeError::DirectoryCreationFailed {
            path: category_path.clone(),
            source: e,
        })?;

        let file_name = file_path
            .file_name()
            .ok_or_else(|| OrganizeError::InvalidFilePath {
                path: file_path.to_path_buf(),
            })?;
        let destination_path = category_path.join(file_name);

        if destination_path.exists() {
            return Err(OrganizeError::DestinationExists {
                destination: destination_path,
            });
        }

        move_file(file_path, &destination_path).map_err(|e| OrganizeError::FileMoveFailure {
            from: file_path.to_path_buf(),
            to: destination_path.clone(),
            error: e,
        })?;

        Ok(MoveRecord {
            original_path: file_path.to_path_buf(),
            new_path: destination_path,
            category: category.to_string(),
        })
    }
}

/// Renames `from` to `to`, copying and deleting when they are on different filesystems.
pub(crate) fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            fs::copy(from, to)?;
            fs::remove_file(from)
        }
        Err(e) => Err(e),
    }
}
