//! User-defined categorization rules.
//!
//! Rules map a pattern (a bare extension such as `.pdf`, or any filename
//! suffix such as `_invoice.pdf`) to a category. They form a precedence list:
//! the first rule that matches a file wins, and any match takes priority over
//! the built-in extension table.
//!
//! # Rule File Format
//!
//! Rules are persisted as a JSON object whose key order is the rule order:
//!
//! ```json
//! {
//!     ".pdf": "Documents",
//!     "_final.docx": "Finals"
//! }
//! ```

use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors that can occur while persisting rules.
#[derive(Debug, Error)]
pub enum RuleError {
    /// The rule file could not be written.
    #[error("Failed to write rules to {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The rules could not be serialized.
    #[error("Failed to serialize rules: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// A single pattern to category mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    /// Extension (`.pdf`) or filename suffix (`_draft.txt`).
    pub pattern: String,
    /// Category assigned to matching files.
    pub category: String,
}

impl Rule {
    /// Creates a rule mapping `pattern` to `category`.
    pub fn new(pattern: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            category: category.into(),
        }
    }

    /// Returns true if this rule applies to the given file.
    ///
    /// Matching is case-insensitive: either the filename ends with the
    /// pattern, or the extension equals it.
    pub fn matches(&self, filename: &str, extension: &str) -> bool {
        let pattern = self.pattern.to_lowercase();
        filename.to_lowercase().ends_with(&pattern) || extension.to_lowercase() == pattern
    }
}

/// Ordered list of rules, evaluated first match wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    /// Creates an empty rule set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps `rules`, keeping their order as match priority.
    pub fn from_rules(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// The starter rule set written when no rule file exists yet.
    pub fn builtin_defaults() -> Self {
        Self::from_rules(vec![
            Rule::new(".pdf", "Documents"),
            Rule::new(".jpg", "Images"),
            Rule::new(".mp4", "Videos"),
            Rule::new(".mp3", "Audio"),
            Rule::new(".zip", "Archives"),
            Rule::new(".py", "Code Files"),
        ])
    }

    /// Returns the first rule that matches the file, if any.
    pub fn find_match(&self, filename: &str, extension: &str) -> Option<&Rule> {
        self.rules
            .iter()
            .find(|rule| rule.matches(filename, extension))
    }

    /// Adds a rule, or replaces the category of an existing pattern in place.
    pub fn add(&mut self, pattern: impl Into<String>, category: impl Into<String>) {
        let pattern = pattern.into();
        let category = category.into();
        match self.rules.iter_mut().find(|rule| rule.pattern == pattern) {
            Some(existing) => existing.category = category,
            None => self.rules.push(Rule { pattern, category }),
        }
    }

    /// Removes the rule with exactly this pattern. Returns true if one was removed.
    pub fn remove(&mut self, pattern: &str) -> bool {
        let before = self.rules.len();
        self.rules.retain(|rule| rule.pattern != pattern);
        self.rules.len() != before
    }

    /// Iterates the rules in match order.
    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns true if there are no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Loads rules from `path`, creating the file with the default set if it
    /// does not exist yet.
    ///
    /// An unreadable or malformed file yields an empty rule set; failing to
    /// write the default file is logged and the defaults are still returned.
    pub fn load_or_init(path: &Path) -> Self {
        if !path.exists() {
            let defaults = Self::builtin_defaults();
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
                && let Err(e) = fs::create_dir_all(parent)
            {
                warn!("Could not create rules directory {}: {}", parent.display(), e);
            }
            match defaults.save(path) {
                Ok(()) => debug!("Wrote default rules to {}", path.display()),
                Err(e) => warn!("{}", e),
            }
            return defaults;
        }

        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                warn!("Error loading rules from {}: {}", path.display(), e);
                return Self::new();
            }
        };

        match Self::from_json(&content) {
            Ok(rules) => rules,
            Err(e) => {
                warn!("Error loading rules from {}: {}", path.display(), e);
                Self::new()
            }
        }
    }

    /// Parses a JSON object of `pattern: category` pairs, keeping key order.
    ///
    /// Entries whose value is not a string are skipped.
    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        let map: Map<String, Value> = serde_json::from_str(content)?;
        let mut rules = Self::new();
        for (pattern, value) in map {
            match value {
                Value::String(category) => rules.rules.push(Rule { pattern, category }),
                other => warn!("Skipping rule '{}': category {} is not a string", pattern, other),
            }
        }
        Ok(rules)
    }

    /// Serializes the rules as a pretty JSON object in rule order.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let map: Map<String, Value> = self
            .rules
            .iter()
            .map(|rule| (rule.pattern.clone(), Value::String(rule.category.clone())))
            .collect();
        serde_json::to_string_pretty(&Value::Object(map))
    }

    /// Writes the rules to `path`, replacing any previous content.
    pub fn save(&self, path: &Path) -> Result<(), RuleError> {
        let json = self.to_json()?;
        fs::write(path, json).map_err(|source| RuleError::WriteFailed {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl<'a> IntoIterator for &'a RuleSet {
    type Item = &'a Rule;
    type IntoIter = std::slice::Iter<'a, Rule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}
