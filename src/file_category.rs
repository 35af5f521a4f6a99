//! Extension-based file categorization.
//!
//! This module maps a filename and its extension to a category label. User
//! rules from a [`RuleSet`] are consulted first, in insertion order; when none
//! match, a built-in extension table decides, and anything unknown lands in
//! `Other`.
//!
//! # Examples
//!
//! ```
//! use smartsort::file_category::{categorize, Category, FileMapper};
//! use smartsort::rules::RuleSet;
//!
//! let mapper = FileMapper::default();
//! assert_eq!(mapper.extension_to_category(".png"), Some(Category::Images));
//!
//! let rules = RuleSet::default();
//! assert_eq!(categorize("notes.txt", ".txt", &rules), "Documents");
//! assert_eq!(categorize("blob.xyz", ".xyz", &rules), "Other");
//! ```

use crate::rules::RuleSet;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Built-in category used when no user rule matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Image files (JPG, PNG, GIF, etc.)
    Images,
    /// Video files (MP4, MKV, AVI, etc.)
    Videos,
    /// Audio files (MP3, WAV, FLAC, etc.)
    Audio,
    /// Document files (PDF, DOCX, TXT, spreadsheets, slides)
    Documents,
    /// Archive files (ZIP, RAR, 7Z, etc.)
    Archives,
    /// Source code files
    CodeFiles,
    /// Unknown or uncategorized files
    Other,
}

impl Category {
    /// Returns the label used as the destination folder name.
    ///
    /// # Examples
    ///
    /// ```
    /// use smartsort::file_category::Category;
    ///
    /// assert_eq!(Category::Images.label(), "Images");
    /// assert_eq!(Category::CodeFiles.label(), "Code Files");
    /// ```
    pub fn label(&self) -> &'static str {
        match self {
            Category::Images => "Images",
            Category::Videos => "Videos",
            Category::Audio => "Audio",
            Category::Documents => "Documents",
            Category::Archives => "Archives",
            Category::CodeFiles => "Code Files",
            Category::Other => "Other",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Maps file extensions (with the leading dot) to built-in categories.
#[derive(Debug, Clone)]
pub struct FileMapper {
    extension_map: HashMap<String, Category>,
}

static DEFAULT_MAPPER: LazyLock<FileMapper> = LazyLock::new(FileMapper::new);

impl FileMapper {
    /// Creates a new `FileMapper` with the standard extension table.
    pub fn new() -> Self {
        let mut mapper = Self {
            extension_map: HashMap::new(),
        };
        mapper.populate_standard_mappings();
        mapper
    }

    fn populate_standard_mappings(&mut self) {
        let table: [(Category, &[&str]); 6] = [
            (
                Category::Images,
                &[".jpg", ".jpeg", ".png", ".gif", ".bmp", ".tiff", ".svg", ".webp"],
            ),
            (
                Category::Videos,
                &[".mp4", ".avi", ".mkv", ".mov", ".wmv", ".flv", ".webm", ".m4v"],
            ),
            (
                Category::Audio,
                &[".mp3", ".wav", ".flac", ".aac", ".ogg", ".wma", ".m4a"],
            ),
            (
                Category::Documents,
                &[
                    ".pdf", ".doc", ".docx", ".txt", ".rtf", ".odt", ".xls", ".xlsx", ".ppt",
                    ".pptx",
                ],
            ),
            (
                Category::Archives,
                &[".zip", ".rar", ".7z", ".tar", ".gz", ".bz2"],
            ),
            (
                Category::CodeFiles,
                &[".py", ".js", ".html", ".css", ".cpp", ".java", ".c", ".h"],
            ),
        ];

        for (category, extensions) in table {
            for ext in extensions {
                self.add_extension_mapping(ext, category);
            }
        }
    }

    /// Adds a file extension to category mapping.
    ///
    /// A missing leading dot is added so `"png"` and `".png"` are equivalent.
    pub fn add_extension_mapping(&mut self, ext: &str, category: Category) {
        self.extension_map.insert(normalize_extension(ext), category);
    }

    /// Maps a file extension to a category, case-insensitively.
    ///
    /// # Examples
    ///
    /// ```
    /// use smartsort::file_category::{Category, FileMapper};
    ///
    /// let mapper = FileMapper::default();
    /// assert_eq!(mapper.extension_to_category(".PDF"), Some(Category::Documents));
    /// assert_eq!(mapper.extension_to_category(".unknown"), None);
    /// ```
    pub fn extension_to_category(&self, ext: &str) -> Option<Category> {
        if ext.is_empty() {
            return None;
        }
        self.extension_map.get(&normalize_extension(ext)).copied()
    }

    /// Determines the category label for a file.
    ///
    /// Rules are tried in insertion order and the first match wins. A rule
    /// matches when the lower-cased filename ends with its pattern, or when
    /// the extension equals the pattern ignoring case. Otherwise the built-in
    /// table is used, defaulting to `Other`.
    pub fn categorize(&self, filename: &str, extension: &str, rules: &RuleSet) -> String {
        if let Some(rule) = rules.find_match(filename, extension) {
            return rule.category.clone();
        }

        self.extension_to_category(extension)
            .unwrap_or(Category::Other)
            .label()
            .to_string()
    }
}

impl Default for FileMapper {
    fn default() -> Self {
        Self::new()
    }
}

/// Categorizes a file with the standard extension table.
pub fn categorize(filename: &str, extension: &str, rules: &RuleSet) -> String {
    DEFAULT_MAPPER.categorize(filename, extension, rules)
}

fn normalize_extension(ext: &str) -> String {
    let lower = ext.to_lowercase();
    if lower.starts_with('.') {
        lower
    } else {
        format!(".{lower}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::Rule;

    #[test]
    fn test_category_labels() {
        assert_eq!(Category::Images.label(), "Images");
        assert_eq!(Category::Videos.label(), "Videos");
        assert_eq!(Category::Audio.label(), "Audio");
        assert_eq!(Category::Documents.label(), "Documents");
        assert_eq!(Category::Archives.label(), "Archives");
        assert_eq!(Category::CodeFiles.label(), "Code Files");
        assert_eq!(Category::Other.label(), "Other");
    }

    #[test]
    fn test_builtin_table_for_every_category() {
        let rules = RuleSet::default();
        let cases = [
            ("a.jpeg", ".jpeg", "Images"),
            ("a.webm", ".webm", "Videos"),
            ("a.flac", ".flac", "Audio"),
            ("a.xlsx", ".xlsx", "Documents"),
            ("a.7z", ".7z", "Archives"),
            ("a.java", ".java", "Code Files"),
        ];
        for (name, ext, expected) in cases {
            assert_eq!(categorize(name, ext, &rules), expected, "{name}");
        }
    }

    #[test]
    fn test_unknown_extension_is_other() {
        let rules = RuleSet::default();
        assert_eq!(categorize("data.xyz", ".xyz", &rules), "Other");
        assert_eq!(categorize("Makefile", "", &rules), "Other");
        // json is only known to the heuristic layer
        assert_eq!(categorize("data.json", ".json", &rules), "Other");
    }

    #[test]
    fn test_extension_lookup_case_insensitive() {
        let mapper = FileMapper::default();
        assert_eq!(mapper.extension_to_category(".JPG"), Some(Category::Images));
        assert_eq!(mapper.extension_to_category("Mp3"), Some(Category::Audio));
    }

    #[test]
    fn test_rule_overrides_builtin_table() {
        let rules = RuleSet::from_rules(vec![Rule::new(".pdf", "Papers")]);
        assert_eq!(categorize("thesis.PDF", ".pdf", &rules), "Papers");
    }

    #[test]
    fn test_first_matching_rule_wins() {
        let rules = RuleSet::from_rules(vec![
            Rule::new("_final.docx", "Finals"),
            Rule::new(".docx", "Word"),
        ]);
        assert_eq!(categorize("essay_FINAL.docx", ".docx", &rules), "Finals");
        assert_eq!(categorize("essay.docx", ".docx", &rules), "Word");

        let reversed = RuleSet::from_rules(vec![
            Rule::new(".docx", "Word"),
            Rule::new("_final.docx", "Finals"),
        ]);
        assert_eq!(categorize("essay_final.docx", ".docx", &reversed), "Word");
    }

    #[test]
    fn test_categorize_is_deterministic() {
        let rules = RuleSet::from_rules(vec![Rule::new(".log", "Logs")]);
        let first = categorize("server.log", ".log", &rules);
        let second = categorize("server.log", ".log", &rules);
        assert_eq!(first, second);
    }

    #[test]
    fn test_custom_mapping() {
        let mut mapper = FileMapper::default();
        mapper.add_extension_mapping("rs", Category::CodeFiles);
        assert_eq!(mapper.extension_to_category(".rs"), Some(Category::CodeFiles));
    }
}
