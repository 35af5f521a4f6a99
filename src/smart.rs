//! Heuristic categorization from filename patterns and file size.
//!
//! This layer runs after a scan and can reclassify records into
//! purpose-oriented folders such as `Screenshots` or `Work Documents`.
//! Checks run in a fixed order and the first match wins:
//!
//! 1. project / academic tokens → `Projects`
//! 2. screenshot tokens → `Screenshots`
//! 3. download / temp tokens → `Downloads`
//! 4. work-document tokens → `Work Documents`
//! 5. personal / travel tokens → `Personal`
//! 6. a `YYYY-MM-DD` or `YYYY_MM_DD` date → `Dated Files`
//! 7. large images → `High Quality Images`, large videos → `HD Videos`
//! 8. coarse extension group (`Images`, `Code`, ..., `Other`)

use crate::scanner::{FileRecord, extension_of};
use regex::Regex;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;
use tracing::debug;

/// Prefix marking a category assigned by the heuristic layer.
pub const SMART_PREFIX: &str = "Smart - ";

const HIGH_QUALITY_IMAGE_BYTES: u64 = 5 * 1024 * 1024;
const HD_VIDEO_BYTES: u64 = 100 * 1024 * 1024;

const TOKEN_GROUPS: [(&[&str], &str); 5] = [
    (&["project", "assignment", "homework", "thesis"], "Projects"),
    (&["screenshot", "screen shot", "capture"], "Screenshots"),
    (&["download", "temp", "tmp"], "Downloads"),
    (
        &["resume", "cv", "invoice", "contract", "report"],
        "Work Documents",
    ),
    (&["personal", "family", "vacation", "trip"], "Personal"),
];

const SIZE_SENSITIVE_IMAGES: [&str; 3] = [".jpg", ".png", ".gif"];
const SIZE_SENSITIVE_VIDEOS: [&str; 3] = [".mp4", ".avi", ".mkv"];

const EXTENSION_GROUPS: [(&str, &[&str]); 6] = [
    (
        "Images",
        &[".jpg", ".jpeg", ".png", ".gif", ".bmp", ".tiff", ".svg", ".webp"],
    ),
    (
        "Videos",
        &[".mp4", ".avi", ".mkv", ".mov", ".wmv", ".flv", ".webm", ".m4v"],
    ),
    (
        "Audio",
        &[".mp3", ".wav", ".flac", ".aac", ".ogg", ".wma", ".m4a"],
    ),
    (
        "Documents",
        &[
            ".pdf", ".doc", ".docx", ".txt", ".rtf", ".odt", ".xls", ".xlsx", ".ppt", ".pptx",
        ],
    ),
    ("Archives", &[".zip", ".rar", ".7z", ".tar", ".gz", ".bz2"]),
    (
        "Code",
        &[
            ".py", ".js", ".html", ".css", ".cpp", ".java", ".c", ".h", ".json", ".xml",
        ],
    ),
];

static DATE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d{4}-\d{2}-\d{2}|\d{4}_\d{2}_\d{2}").expect("date pattern is valid")
});

/// Categorizes the file at `path` using name and size heuristics.
///
/// The size checks are skipped if the file can no longer be read.
pub fn smart_categorize(path: &Path) -> &'static str {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let size = match fs::metadata(path) {
        Ok(metadata) => Some(metadata.len()),
        Err(e) => {
            debug!("Skipping size heuristics for {}: {}", path.display(), e);
            None
        }
    };
    classify(&file_name, &extension_of(path), size)
}

/// Pure form of [`smart_categorize`].
///
/// # Examples
///
/// ```
/// use smartsort::smart::classify;
///
/// assert_eq!(classify("Screenshot 1.png", ".png", None), "Screenshots");
/// assert_eq!(classify("IMG_2024-07-01.jpg", ".jpg", None), "Dated Files");
/// assert_eq!(classify("photo.jpg", ".jpg", Some(6 * 1024 * 1024)), "High Quality Images");
/// assert_eq!(classify("song.mp3", ".mp3", None), "Audio");
/// ```
pub fn classify(file_name: &str, extension: &str, size: Option<u64>) -> &'static str {
    let lower = file_name.to_lowercase();

    for (tokens, category) in TOKEN_GROUPS {
        if tokens.iter().any(|token| lower.contains(token)) {
            return category;
        }
    }

    if DATE_PATTERN.is_match(file_name) {
        return "Dated Files";
    }

    let extension = extension.to_lowercase();
    if let Some(size) = size {
        if SIZE_SENSITIVE_IMAGES.contains(&extension.as_str()) && size > HIGH_QUALITY_IMAGE_BYTES {
            return "High Quality Images";
        }
        if SIZE_SENSITIVE_VIDEOS.contains(&extension.as_str()) && size > HD_VIDEO_BYTES {
            return "HD Videos";
        }
    }

    categorize_by_extension(&extension)
}

/// Coarse extension grouping used as the heuristic fallback.
pub fn categorize_by_extension(extension: &str) -> &'static str {
    let extension = extension.to_lowercase();
    EXTENSION_GROUPS
        .iter()
        .find(|(_, extensions)| extensions.contains(&extension.as_str()))
        .map(|(category, _)| *category)
        .unwrap_or("Other")
}

/// Re-categorizes records in place.
///
/// Each record whose heuristic category differs from its current one gets
/// `Smart - <category>`. Returns how many records changed.
pub fn apply_smart_categories(records: &mut [FileRecord]) -> usize {
    let mut changed = 0;
    for record in records.iter_mut() {
        let smart = smart_categorize(&record.path);
        if smart != record.category {
            debug!("{}: {} -> {}", record.name, record.category, smart);
            record.category = format!("{SMART_PREFIX}{smart}");
            changed += 1;
        }
    }
    changed
}
