//! Scan filters.
//!
//! A [`FilterSpec`] is built by the caller for each scan. A file is skipped
//! when any of the following holds:
//! - its name ends with an excluded extension (case-insensitive)
//! - its path matches an exclude glob pattern
//! - its size lies outside `[min_size, max_size]`
//! - a cutoff is set and the file was modified after it

use crate::config::ConfigError;
use crate::rules::RuleSet;
use chrono::{DateTime, Local, NaiveDate, TimeZone};
use glob::Pattern;
use std::collections::BTreeSet;
use std::path::Path;

/// Filters and rules applied by the scanner.
#[derive(Debug, Clone)]
pub struct FilterSpec {
    /// Lower-cased extensions, each with a leading dot.
    pub excluded_extensions: BTreeSet<String>,
    /// Glob patterns matched against the full file path.
    pub exclude_patterns: Vec<Pattern>,
    /// Smallest accepted size in bytes, inclusive.
    pub min_size: u64,
    /// Largest accepted size in bytes, inclusive.
    pub max_size: u64,
    /// Files modified after this instant are skipped.
    pub cutoff: Option<DateTime<Local>>,
    /// Custom categorization rules, in precedence order.
    pub rules: RuleSet,
}

impl Default for FilterSpec {
    fn default() -> Self {
        Self {
            excluded_extensions: BTreeSet::new(),
            exclude_patterns: Vec::new(),
            min_size: 0,
            max_size: u64::MAX,
            cutoff: None,
            rules: RuleSet::default(),
        }
    }
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_excluded_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.excluded_extensions = extensions
            .into_iter()
            .map(|ext| normalize_excluded_extension(ext.as_ref()))
            .filter(|ext| ext.len() > 1)
            .collect();
        self
    }

    /// Compiles glob patterns that exclude matching paths.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidGlobPattern` for the first invalid pattern.
    pub fn with_exclude_patterns<S: AsRef<str>>(mut self, patterns: &[S]) -> Result<Self, ConfigError> {
        self.exclude_patterns = patterns
            .iter()
            .map(|pattern| {
                let pattern = pattern.as_ref();
                Pattern::new(pattern).map_err(|_| ConfigError::InvalidGlobPattern(pattern.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self)
    }

    pub fn with_min_size(mut self, min_size: u64) -> Self {
        self.min_size = min_size;
        self
    }

    pub fn with_max_size(mut self, max_size: u64) -> Self {
        self.max_size = max_size;
        self
    }

    pub fn with_cutoff(mut self, cutoff: Option<DateTime<Local>>) -> Self {
        self.cutoff = cutoff;
        self
    }

    pub fn with_rules(mut self, rules: RuleSet) -> Self {
        self.rules = rules;
        self
    }

    /// True if the filename ends with one of the excluded extensions.
    pub fn is_excluded_name(&self, file_name: &str) -> bool {
        let lower = file_name.to_lowercase();
        self.excluded_extensions
            .iter()
            .any(|ext| lower.ends_with(ext.as_str()))
    }

    /// True if the path matches any exclude glob pattern.
    pub fn matches_exclude_pattern(&self, path: &Path) -> bool {
        self.exclude_patterns
            .iter()
            .any(|pattern| pattern.matches_path(path))
    }

    pub fn size_in_range(&self, size: u64) -> bool {
        self.min_size <= size && size <= self.max_size
    }

    /// True if a cutoff is set and `modified` lies after it.
    pub fn is_after_cutoff(&self, modified: &DateTime<Local>) -> bool {
        self.cutoff.is_some_and(|cutoff| *modified > cutoff)
    }

    /// Applies every filter to one file.
    pub fn should_include(
        &self,
        path: &Path,
        file_name: &str,
        size: u64,
        modified: &DateTime<Local>,
    ) -> bool {
        !self.is_excluded_name(file_name)
            && !self.matches_exclude_pattern(path)
            && self.size_in_range(size)
            && !self.is_after_cutoff(modified)
    }
}

fn normalize_excluded_extension(ext: &str) -> String {
    let lower = ext.trim().to_lowercase();
    if lower.starts_with('.') {
        lower
    } else {
        format!(".{lower}")
    }
}

/// Parses a size such as `512`, `10MB` or `1.5 GB` into bytes.
///
/// Units are binary (1 KB = 1024 bytes) and case-insensitive.
///
/// # Examples
///
/// ```
/// use smartsort::filter::parse_size;
///
/// assert_eq!(parse_size("10MB"), Ok(10 * 1024 * 1024));
/// assert_eq!(parse_size("2048"), Ok(2048));
/// assert!(parse_size("ten").is_err());
/// ```
pub fn parse_size(input: &str) -> Result<u64, String> {
    let trimmed = input.trim();
    let split = trimmed
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(trimmed.len());
    let (number, unit) = trimmed.split_at(split);

    let multiplier: u64 = match unit.trim().to_uppercase().as_str() {
        "" | "B" => 1,
        "K" | "KB" => 1024,
        "M" | "MB" => 1024 * 1024,
        "G" | "GB" => 1024 * 1024 * 1024,
        "T" | "TB" => 1024 * 1024 * 1024 * 1024,
        other => return Err(format!("unknown size unit '{other}' in '{input}'")),
    };

    if number.is_empty() {
        return Err(format!("missing number in size '{input}'"));
    }

    if let Ok(whole) = number.parse::<u64>() {
        return whole
            .checked_mul(multiplier)
            .ok_or_else(|| format!("size '{input}' is too large"));
    }

    let value: f64 = number
        .parse()
        .map_err(|_| format!("invalid size '{input}'"))?;
    Ok((value * multiplier as f64).round() as u64)
}

/// Parses a `YYYY-MM-DD` date into local midnight at the start of that day.
pub fn parse_cutoff(input: &str) -> Result<DateTime<Local>, String> {
    let date = NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .map_err(|e| format!("invalid date '{input}' (expected YYYY-MM-DD): {e}"))?;
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| format!("invalid date '{input}'"))?;
    Local
        .from_local_datetime(&midnight)
        .earliest()
        .ok_or_else(|| format!("date '{input}' does not exist in the local timezone"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_default_accepts_everything() {
        let filters = FilterSpec::default();
        let now = Local::now();
        assert!(filters.should_include(Path::new("/a/b.tmp"), "b.tmp", 0, &now));
        assert!(filters.should_include(Path::new("/a/c"), "c", u64::MAX, &now));
    }

    #[test]
    fn test_excluded_extensions_suffix_case_insensitive() {
        let filters = FilterSpec::new().with_excluded_extensions([".tmp", "LOG"]);
        assert!(filters.is_excluded_name("b.tmp"));
        assert!(filters.is_excluded_name("B.TMP"));
        assert!(filters.is_excluded_name("server.log"));
        assert!(!filters.is_excluded_name("a.jpg"));
        assert!(!filters.is_excluded_name("catalog"));
    }

    #[test]
    fn test_size_range_is_inclusive() {
        let filters = FilterSpec::new().with_min_size(10).with_max_size(20);
        assert!(!filters.size_in_range(9));
        assert!(filters.size_in_range(10));
        assert!(filters.size_in_range(20));
        assert!(!filters.size_in_range(21));
    }

    #[test]
    fn test_cutoff() {
        let now = Local::now();
        let filters = FilterSpec::new().with_cutoff(Some(now));
        assert!(filters.is_after_cutoff(&(now + Duration::seconds(1))));
        assert!(!filters.is_after_cutoff(&now));
        assert!(!FilterSpec::new().is_after_cutoff(&now));
    }

    #[test]
    fn test_exclude_patterns() {
        let filters = FilterSpec::new()
            .with_exclude_patterns(&["**/node_modules/**"])
            .unwrap();
        assert!(filters.matches_exclude_pattern(Path::new("src/node_modules/pkg/index.js")));
        assert!(!filters.matches_exclude_pattern(Path::new("src/my_node_modules/index.js")));
    }

    #[test]
    fn test_invalid_glob_pattern_returns_error() {
        let result = FilterSpec::new().with_exclude_patterns(&["[invalid"]);
        assert!(matches!(result, Err(ConfigError::InvalidGlobPattern(_))));
    }

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("0"), Ok(0));
        assert_eq!(parse_size("1kb"), Ok(1024));
        assert_eq!(parse_size("1.5 KB"), Ok(1536));
        assert_eq!(parse_size("100MB"), Ok(100 * 1024 * 1024));
        assert_eq!(parse_size("2G"), Ok(2 * 1024 * 1024 * 1024));
        assert!(parse_size("MB").is_err());
        assert!(parse_size("5 parsecs").is_err());
    }

    #[test]
    fn test_parse_cutoff() {
        let cutoff = parse_cutoff("2024-03-15").unwrap();
        assert_eq!(cutoff.format("%Y-%m-%d %H:%M:%S").to_string(), "2024-03-15 00:00:00");
        assert!(parse_cutoff("15/03/2024").is_err());
    }
}
