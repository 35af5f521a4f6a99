//! Directory scanning.
//!
//! Walks a source tree, applies a [`FilterSpec`], categorizes the surviving
//! files and returns one [`FileRecord`] per file in traversal order.
//! Per-file errors are logged and the file is skipped; they never abort the
//! rest of the scan.

use crate::file_category::categorize;
use crate::filter::FilterSpec;
use chrono::{DateTime, Local};
use serde::{Serialize, Serializer};
use std::fs::{self, Metadata};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Display format for modification times.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Metadata and assigned category of one scanned file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRecord {
    /// File name including extension.
    pub name: String,
    /// Lower-cased extension with its leading dot, or empty.
    #[serde(rename = "type", serialize_with = "serialize_extension")]
    pub extension: String,
    /// Human-readable size, e.g. `1.5 MB`.
    pub size: String,
    pub size_bytes: u64,
    /// Destination category; the heuristic layer may overwrite it.
    pub category: String,
    /// Absolute path of the file at scan time.
    pub path: PathBuf,
    #[serde(serialize_with = "serialize_timestamp")]
    pub modified: DateTime<Local>,
}

impl FileRecord {
    /// Extension for display, `No Extension` when empty.
    pub fn type_label(&self) -> &str {
        if self.extension.is_empty() {
            "No Extension"
        } else {
            &self.extension
        }
    }

    /// Modification time as `YYYY-MM-DD HH:MM:SS`.
    pub fn modified_display(&self) -> String {
        self.modified.format(TIMESTAMP_FORMAT).to_string()
    }
}

fn serialize_extension<S: Serializer>(extension: &str, serializer: S) -> Result<S::Ok, S::Error> {
    if extension.is_empty() {
        serializer.serialize_str("No Extension")
    } else {
        serializer.serialize_str(extension)
    }
}

fn serialize_timestamp<S: Serializer>(
    modified: &DateTime<Local>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&modified.format(TIMESTAMP_FORMAT))
}

/// Lower-cased extension of `path` including the dot, or an empty string.
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
        .unwrap_or_default()
}

/// Scans `source` and returns the files that pass `filters`.
///
/// With `recursive` false only the immediate files of `source` are
/// considered. Symlinks to files are followed; symlinked directories are not
/// descended into. Traversal errors are logged; whatever was collected is
/// returned.
pub fn scan(source: &Path, recursive: bool, filters: &FilterSpec) -> Vec<FileRecord> {
    let root = std::path::absolute(source).unwrap_or_else(|_| source.to_path_buf());
    let max_depth = if recursive { usize::MAX } else { 1 };

    info!("Scanning {} (recursive: {})", root.display(), recursive);

    let mut records = Vec::new();
    for entry in WalkDir::new(&root).min_depth(1).max_depth(max_depth) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Error scanning {}: {}", root.display(), e);
                continue;
            }
        };

        if entry.file_type().is_dir() {
            continue;
        }

        let metadata = match fs::metadata(entry.path()) {
            Ok(metadata) if metadata.is_file() => metadata,
            Ok(_) => continue,
            Err(e) => {
                warn!("Error processing {}: {}", entry.path().display(), e);
                continue;
            }
        };

        match build_record(entry.path(), &metadata, filters) {
            Ok(Some(record)) => records.push(record),
            Ok(None) => debug!("Filtered out {}", entry.path().display()),
            Err(e) => warn!("Error processing {}: {}", entry.path().display(), e),
        }
    }

    info!("Scan found {} file(s)", records.len());
    records
}

fn build_record(
    path: &Path,
    metadata: &Metadata,
    filters: &FilterSpec,
) -> std::io::Result<Option<FileRecord>> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let size_bytes = metadata.len();
    let modified: DateTime<Local> = metadata.modified()?.into();

    if !filters.should_include(path, &name, size_bytes, &modified) {
        return Ok(None);
    }

    let extension = extension_of(path);
    let category = categorize(&name, &extension, &filters.rules);

    Ok(Some(FileRecord {
        name,
        extension,
        size: format_size(size_bytes),
        size_bytes,
        category,
        path: path.to_path_buf(),
        modified,
    }))
}

/// Formats a byte count with 1024-based units and one decimal place.
///
/// # Examples
///
/// ```
/// use smartsort::scanner::format_size;
///
/// assert_eq!(format_size(0), "0 B");
/// assert_eq!(format_size(1536), "1.5 KB");
/// ```
pub fn format_size(size_bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

    if size_bytes == 0 {
        return "0 B".to_string();
    }

    let mut size = size_bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", size, UNITS[unit])
}

/// Sum of `size_bytes` over all records.
pub fn total_size(records: &[FileRecord]) -> u64 {
    records.iter().map(|record| record.size_bytes).sum()
}
