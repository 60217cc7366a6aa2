//! Header discovery.
//!
//! Sheets are not required to carry an exact header set, so the pipeline
//! finds its columns by name heuristics. Every lookup goes through
//! [`find_column`]; swap the [`ColumnRules`] to change the rule.

use serde::{Deserialize, Serialize};

/// Case-insensitive header matcher.
///
/// A header matches when its trimmed, lowercased text equals the needles
/// joined by single spaces. Failing any exact match, the first header that
/// contains every needle is used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct ColumnMatcher {
    needles: Vec<String>,
}

impl ColumnMatcher {
    pub fn new<S: AsRef<str>>(needles: &[S]) -> Self {
        Self {
            needles: needles
                .iter()
                .map(|n| n.as_ref().trim().to_lowercase())
                .filter(|n| !n.is_empty())
                .collect(),
        }
    }

    /// Human-readable form used in error messages.
    #[must_use]
    pub fn describe(&self) -> String {
        self.needles.join(" ")
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.needles.is_empty()
    }

    fn exact(&self, header: &str) -> bool {
        header == self.describe()
    }

    fn contains_all(&self, header: &str) -> bool {
        self.needles.iter().all(|needle| header.contains(needle.as_str()))
    }
}

impl From<Vec<String>> for ColumnMatcher {
    fn from(needles: Vec<String>) -> Self {
        Self::new(&needles)
    }
}

impl From<ColumnMatcher> for Vec<String> {
    fn from(matcher: ColumnMatcher) -> Self {
        matcher.needles
    }
}

/// Locate a column by header name. Returns the 0-based column index.
pub fn find_column<S: AsRef<str>>(headers: &[S], matcher: &ColumnMatcher) -> Option<usize> {
    if matcher.is_empty() {
        return None;
    }
    let normalized: Vec<String> = headers
        .iter()
        .map(|h| h.as_ref().trim().to_lowercase())
        .collect();

    normalized
        .iter()
        .position(|h| matcher.exact(h))
        .or_else(|| normalized.iter().position(|h| matcher.contains_all(h)))
}

/// The columns the pipeline needs to find.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnRules {
    pub date: ColumnMatcher,
    pub status: ColumnMatcher,
    pub order_id: ColumnMatcher,
    pub tracking_id: ColumnMatcher,
}

impl Default for ColumnRules {
    fn default() -> Self {
        Self {
            date: ColumnMatcher::new(&["date"]),
            status: ColumnMatcher::new(&["status"]),
            order_id: ColumnMatcher::new(&["order", "id"]),
            tracking_id: ColumnMatcher::new(&["tracking", "id"]),
        }
    }
}
