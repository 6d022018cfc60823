//! The column store contract and an in-memory implementation.
//!
//! A store keeps one append-only sequence of [`StripeRow`]s per
//! [`ColumnPath`]. Insertion order is the document order of occurrences
//! across all records written so far; the assembler depends on it to recover
//! record boundaries and nesting.

use crate::column_path::ColumnPath;
use crate::common::RepetitionLevel;
use crate::striper::StripeRow;
use std::collections::HashMap;

/// Path-keyed, append-only storage of striped rows.
///
/// Implementations must preserve insertion order exactly. Reads hand out
/// shared slices, so any number of independent cursors may read the same
/// column at once.
pub trait ColumnStore {
    fn append_row(&mut self, path: &ColumnPath, row: StripeRow);

    /// All rows of a column in insertion order. A column which was never
    /// written reads as empty.
    fn read_sequence(&self, path: &ColumnPath) -> &[StripeRow];
}

#[derive(Debug, Default, Clone)]
pub struct InMemoryColumnStore {
    columns: HashMap<ColumnPath, Vec<StripeRow>>,
}

impl InMemoryColumnStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Row count of a column.
    pub fn len(&self, path: &ColumnPath) -> usize {
        self.read_sequence(path).len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.values().all(Vec::is_empty)
    }

    /// Paths of every column written so far, sorted.
    pub fn paths(&self) -> Vec<&ColumnPath> {
        let mut paths = self.columns.keys().collect::<Vec<_>>();
        paths.sort();
        paths
    }

    /// Shortens a column to its first `len` rows.
    pub fn truncate(&mut self, path: &ColumnPath, len: usize) {
        if let Some(rows) = self.columns.get_mut(path) {
            rows.truncate(len);
        }
    }
}

impl ColumnStore for InMemoryColumnStore {
    fn append_row(&mut self, path: &ColumnPath, row: StripeRow) {
        match self.columns.get_mut(path) {
            Some(rows) => rows.push(row),
            None => {
                self.columns.insert(path.clone(), vec![row]);
            }
        }
    }

    fn read_sequence(&self, path: &ColumnPath) -> &[StripeRow] {
        self.columns
            .get(path)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// A read cursor over one column's rows.
#[derive(Debug, Clone)]
pub struct ColumnCursor<'a> {
    rows: &'a [StripeRow],
    position: usize,
}

impl<'a> ColumnCursor<'a> {
    pub fn new(rows: &'a [StripeRow]) -> Self {
        Self { rows, position: 0 }
    }

    /// Index of the next row to be read.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn peek(&self) -> Option<&'a StripeRow> {
        self.rows.get(self.position)
    }

    /// Repetition level of the next row, `0` once the column is exhausted:
    /// the end of a column is always a record boundary.
    pub fn peek_repetition_level(&self) -> RepetitionLevel {
        self.peek().map_or(0, StripeRow::repetition_level)
    }

    /// Returns the next row and moves past it.
    pub fn advance(&mut self) -> Option<&'a StripeRow> {
        let row = self.rows.get(self.position)?;
        self.position += 1;
        Some(row)
    }

    pub fn is_exhausted(&self) -> bool {
        self.position >= self.rows.len()
    }

    /// Rewinds to the first row.
    pub fn reset(&mut self) {
        self.position = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Scalar;

    #[test]
    fn test_append_preserves_order() {
        let mut store = InMemoryColumnStore::new();
        let path = ColumnPath::from("links.forward");

        store.append_row(&path, StripeRow::new(Some(Scalar::Integer(20)), 0, 2));
        store.append_row(&path, StripeRow::new(Some(Scalar::Integer(40)), 1, 2));
        store.append_row(&path, StripeRow::null(0, 1));

        let rows = store.read_sequence(&path);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].value(), Some(&Scalar::Integer(20)));
        assert_eq!(rows[1].value(), Some(&Scalar::Integer(40)));
        assert_eq!(rows[2].value(), None);
    }

    #[test]
    fn test_unknown_column_reads_empty() {
        let store = InMemoryColumnStore::new();
        assert!(store.read_sequence(&ColumnPath::from("nope")).is_empty());
        assert!(store.is_empty());
    }

    #[test]
    fn test_truncate() {
        let mut store = InMemoryColumnStore::new();
        let path = ColumnPath::from("x");
        store.append_row(&path, StripeRow::null(0, 0));
        store.append_row(&path, StripeRow::null(0, 0));

        store.truncate(&path, 1);
        assert_eq!(store.len(&path), 1);
        assert_eq!(store.paths(), vec![&path]);
    }

    #[test]
    fn test_cursor() {
        let rows = vec![
            StripeRow::new(Some(Scalar::Integer(1)), 0, 1),
            StripeRow::new(Some(Scalar::Integer(2)), 1, 1),
        ];
        let mut cursor = ColumnCursor::new(&rows);

        assert_eq!(cursor.position(), 0);
        assert_eq!(cursor.peek_repetition_level(), 0);
        assert_eq!(cursor.advance(), Some(&rows[0]));
        assert_eq!(cursor.peek_repetition_level(), 1);
        assert_eq!(cursor.advance(), Some(&rows[1]));

        assert!(cursor.is_exhausted());
        assert_eq!(cursor.peek(), None);
        assert_eq!(cursor.advance(), None);
        assert_eq!(cursor.peek_repetition_level(), 0);
        assert_eq!(cursor.position(), 2);

        cursor.reset();
        assert!(!cursor.is_exhausted());
        assert_eq!(cursor.peek(), Some(&rows[0]));
    }

    #[test]
    fn test_independent_cursors() {
        let rows = vec![StripeRow::null(0, 0), StripeRow::null(0, 0)];
        let mut a = ColumnCursor::new(&rows);
        let b = ColumnCursor::new(&rows);

        a.advance();
        assert_eq!(a.position(), 1);
        assert_eq!(b.position(), 0);
    }
}
