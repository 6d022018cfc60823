//! The assembly state machine.
//!
//! After a row of leaf `L` is read, the repetition level of the *next* row in
//! `L` decides which column to read from next. Levels up to the barrier (the
//! repetition depth shared with the following leaf) move forward in document
//! order. Higher levels start a new element of the repeated ancestor at that
//! depth and jump back to its first leaf.

use crate::common::RepetitionLevel;
use crate::schema::{ColumnId, NodeId, Schema};
use std::fmt;
use std::fmt::Formatter;

/// Where the assembler goes after reading a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Column {
        id: ColumnId,
        /// The repeated ancestor which gets a new element, `None` for a
        /// forward move.
        back_edge: Option<NodeId>,
    },
    /// The record is complete.
    End,
}

impl Transition {
    pub fn is_back_edge(&self) -> bool {
        matches!(
            self,
            Transition::Column {
                back_edge: Some(_),
                ..
            }
        )
    }
}

/// Precomputed `next(column, level)` for every column and every level up to
/// the column's maximum repetition level.
#[derive(Debug, Clone)]
pub struct TransitionTable {
    /// `states[c][r]` is the transition from column `c` at level `r`
    states: Vec<Vec<Transition>>,
}

impl TransitionTable {
    pub fn new(schema: &Schema) -> Self {
        let columns = schema.columns();
        let states = columns
            .iter()
            .enumerate()
            .map(|(i, column)| {
                let id = column.id();
                let (forward, barrier_level) = match columns.get(i + 1) {
                    Some(next) => (
                        Transition::Column {
                            id: next.id(),
                            back_edge: None,
                        },
                        schema.common_repetition_level(id, next.id()),
                    ),
                    None => (Transition::End, 0),
                };

                (0..=column.max_repetition_level())
                    .map(|level| {
                        if level <= barrier_level {
                            return forward;
                        }
                        match schema.repeated_ancestor(id, level) {
                            Some(ancestor) => Transition::Column {
                                id: schema.node(ancestor).first_column(),
                                back_edge: Some(ancestor),
                            },
                            // every level up to the maximum has a repeated field
                            None => forward,
                        }
                    })
                    .collect()
            })
            .collect();

        Self { states }
    }

    /// The transition taken from `column` when the next row of `column` has
    /// repetition `level`. Levels beyond the column's maximum are clamped to
    /// it; the assembler rejects such rows before they are used.
    pub fn next(&self, column: ColumnId, level: RepetitionLevel) -> Transition {
        let state = &self.states[column.index()];
        let level = usize::from(level).min(state.len() - 1);
        state[level]
    }

    pub fn column_count(&self) -> usize {
        self.states.len()
    }
}

/// One line per column, e.g. `3: 0 -> 5, 1 -> 3*, 2 -> 3*`. A `*` marks a
/// back edge.
impl fmt::Display for TransitionTable {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (column, state) in self.states.iter().enumerate() {
            write!(f, "{column}:")?;
            for (level, transition) in state.iter().enumerate() {
                let sep = if level == 0 { " " } else { ", " };
                match transition {
                    Transition::Column { id, back_edge } => write!(
                        f,
                        "{sep}{level} -> {}{}",
                        id.index(),
                        if back_edge.is_some() { "*" } else { "" }
                    )?,
                    Transition::End => write!(f, "{sep}{level} -> end")?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column_path::ColumnPath;
    use crate::schema::{integer, repeated_group, repeated_integer, SchemaBuilder};
    use crate::test_utils::document_schema;

    fn forward(id: ColumnId) -> Transition {
        Transition::Column {
            id,
            back_edge: None,
        }
    }

    #[test]
    fn test_document_transitions() {
        let schema = document_schema();
        let table = TransitionTable::new(&schema);
        let id = |path: &str| {
            schema
                .column_by_path(&ColumnPath::from(path))
                .unwrap()
                .id()
        };

        let doc_id = id("doc_id");
        let backward = id("links.backward");
        let forward_ = id("links.forward");
        let code = id("names.languages.code");
        let country = id("names.languages.country");
        let url = id("names.url");

        let names = schema.repeated_ancestor(url, 1).unwrap();
        let languages = schema.repeated_ancestor(code, 2).unwrap();

        assert_eq!(table.column_count(), 6);
        assert_eq!(table.next(doc_id, 0), forward(backward));

        assert_eq!(table.next(backward, 0), forward(forward_));
        assert_eq!(
            table.next(backward, 1),
            Transition::Column {
                id: backward,
                back_edge: Some(schema.repeated_ancestor(backward, 1).unwrap())
            }
        );

        assert_eq!(table.next(forward_, 0), forward(code));
        assert!(table.next(forward_, 1).is_back_edge());

        assert_eq!(table.next(code, 0), forward(country));
        assert_eq!(table.next(code, 1), forward(country));
        assert_eq!(table.next(code, 2), forward(country));

        assert_eq!(table.next(country, 0), forward(url));
        assert_eq!(table.next(country, 1), forward(url));
        assert_eq!(
            table.next(country, 2),
            Transition::Column {
                id: code,
                back_edge: Some(languages)
            }
        );

        assert_eq!(table.next(url, 0), Transition::End);
        assert_eq!(
            table.next(url, 1),
            Transition::Column {
                id: code,
                back_edge: Some(names)
            }
        );
    }

    #[test]
    fn test_back_edge_to_first_leaf_of_outer_group() {
        let schema = SchemaBuilder::new("test")
            .field(repeated_group(
                "a",
                vec![
                    integer("x"),
                    repeated_group("b", vec![integer("y"), integer("z")]),
                ],
            ))
            .build()
            .unwrap();
        let table = TransitionTable::new(&schema);
        let z = schema.column_by_path(&ColumnPath::from("a.b.z")).unwrap().id();
        let y = schema.column_by_path(&ColumnPath::from("a.b.y")).unwrap().id();
        let x = schema.column_by_path(&ColumnPath::from("a.x")).unwrap().id();

        assert_eq!(table.next(z, 0), Transition::End);
        assert_eq!(
            table.next(z, 1),
            Transition::Column {
                id: x,
                back_edge: schema.repeated_ancestor(z, 1)
            }
        );
        assert_eq!(
            table.next(z, 2),
            Transition::Column {
                id: y,
                back_edge: schema.repeated_ancestor(z, 2)
            }
        );
    }

    #[test]
    fn test_level_is_clamped() {
        let schema = SchemaBuilder::new("test")
            .field(repeated_integer("xs"))
            .build()
            .unwrap();
        let table = TransitionTable::new(&schema);
        let xs = schema.columns()[0].id();

        assert_eq!(table.next(xs, 0), Transition::End);
        assert!(table.next(xs, 1).is_back_edge());
        assert!(table.next(xs, 9).is_back_edge());
    }

    #[test]
    fn test_display() {
        let schema = SchemaBuilder::new("test")
            .field(integer("id"))
            .field(repeated_integer("xs"))
            .build()
            .unwrap();
        let table = TransitionTable::new(&schema);

        assert_eq!(table.to_string(), "0: 0 -> 1\n1: 0 -> end, 1 -> 1*\n");
    }
}
