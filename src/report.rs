//! Export scan results as CSV or JSON.

use crate::scanner::FileRecord;
use chrono::Local;
use clap::ValueEnum;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Supported export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Csv,
    Json,
}

impl ReportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ReportFormat::Csv => "csv",
            ReportFormat::Json => "json",
        }
    }
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to write report {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("CSV export failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON export failed: {0}")]
    Json(#[from] serde_json::Error),
}

const CSV_HEADER: [&str; 6] = ["File Name", "Type", "Size", "Category", "Path", "Modified"];

/// `sort_report_<YYYYmmdd_HHMMSS>.<ext>` in the current directory.
pub fn default_report_path(format: ReportFormat) -> PathBuf {
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    PathBuf::from(format!("sort_report_{}.{}", timestamp, format.extension()))
}

/// Writes `records` to `path` and returns the path written.
///
/// Parent directories are created as needed.
///
/// # Errors
///
/// Returns an error if the file cannot be created or a record cannot be
/// encoded.
pub fn export_report(
    records: &[FileRecord],
    format: ReportFormat,
    path: &Path,
) -> Result<PathBuf, ReportError> {
    let io_error = |source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(io_error)?;
    }

    match format {
        ReportFormat::Json => {
            let json = serde_json::to_string_pretty(records)?;
            fs::write(path, json).map_err(io_error)?;
        }
        ReportFormat::Csv => {
            let mut writer = csv::Writer::from_path(path)?;
            writer.write_record(CSV_HEADER)?;
            for record in records {
                writer.write_record([
                    record.name.clone(),
                    record.type_label().to_string(),
                    record.size.clone(),
                    record.category.clone(),
                    record.path.display().to_string(),
                    record.modified_display(),
                ])?;
            }
            writer.flush().map_err(io_error)?;
        }
    }

    info!("Exported {} records to {}", records.len(), path.display());
    Ok(path.to_path_buf())
}
