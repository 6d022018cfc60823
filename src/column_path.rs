//! Dotted path from the schema root to a leaf column.

use std::fmt::{Display, Formatter};
use std::ops::Deref;

/// Identifies a leaf column by the ordered field names from the schema root,
/// e.g. `names.languages.country`.
///
/// Paths are fixed by the schema and computed once when the schema is built.
/// They are the key under which a [`ColumnStore`](crate::store::ColumnStore)
/// keeps the rows of a column.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColumnPath(Vec<String>);

impl ColumnPath {
    pub fn new(parts: Vec<String>) -> Self {
        Self(parts)
    }

    /// Checks if path represents the root (is empty)
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the count of components(depth) in a path
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    /// Creates a new `ColumnPath` by appending a path component.
    pub fn append_name(&self, name: impl Into<String>) -> Self {
        let mut parts = self.0.clone();
        parts.push(name.into());
        Self(parts)
    }

    /// Creates a new `ColumnPath` containing the first `len` components.
    pub fn prefix(&self, len: usize) -> ColumnPath {
        ColumnPath(self.0.iter().take(len).cloned().collect())
    }

    /// Name of the leaf field, `None` for the root.
    pub fn leaf_name(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    pub fn parts(&self) -> &[String] {
        &self.0
    }
}

impl Deref for ColumnPath {
    type Target = [String];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<&[&str]> for ColumnPath {
    fn from(slice: &[&str]) -> Self {
        ColumnPath(slice.iter().map(|s| s.to_string()).collect())
    }
}

impl From<&[String]> for ColumnPath {
    fn from(slice: &[String]) -> Self {
        ColumnPath(slice.to_vec())
    }
}

impl From<Vec<String>> for ColumnPath {
    fn from(vec: Vec<String>) -> Self {
        ColumnPath(vec)
    }
}

/// Parses a dot separated path. Field names never contain a `.`, which the
/// schema builder enforces.
impl From<&str> for ColumnPath {
    fn from(dotted: &str) -> Self {
        if dotted.is_empty() {
            return ColumnPath::default();
        }
        ColumnPath(dotted.split('.').map(String::from).collect())
    }
}

impl Display for ColumnPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.is_root() {
            write!(f, "<root>")
        } else {
            write!(f, "{}", self.0.join("."))
        }
    }
}
