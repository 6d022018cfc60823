//! Reassembles nested records from striped columns.
//!
//! The assembler keeps one [`ColumnCursor`] per leaf column and walks the
//! [`TransitionTable`]: read a row, peek the repetition level of the next row
//! in the same column, and move to the column the table names for it. The
//! containers opened so far are kept on a stack indexed by depth, so a
//! forward move keeps every container it shares with the next leaf and a back
//! edge appends a new element to the repeated ancestor it re-enters.
//!
//! Fields which are absent in the columns (an optional field with a null
//! placeholder row, or a repeated field without elements) are omitted from the
//! assembled [`Value`].

use crate::common::{DefinitionLevel, RepetitionLevel};
use crate::error::{Corruption, DataCorruptionError, Error, ExhaustionMismatchError, Result};
use crate::schema::{ColumnId, NodeId, Schema};
use crate::store::{ColumnCursor, ColumnStore};
use crate::striper::StripeRow;
use crate::transition::{Transition, TransitionTable};
use crate::value::{Scalar, Value};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// A field of a record under construction.
#[derive(Debug)]
enum Slot {
    Value(Scalar),
    List(Vec<Slot>),
    /// Index of a nested record in the assembler's arena.
    Record(usize),
}

type PartialRecord = BTreeMap<String, Slot>;

/// An open container on the assembly stack.
#[derive(Debug, Clone, Copy)]
struct Frame {
    record: usize,
    /// Repetition level of the row which opened the container. The first row
    /// of every leaf beneath it carries the same level.
    repetition_level: RepetitionLevel,
}

const ROOT: Frame = Frame {
    record: 0,
    repetition_level: 0,
};

/// How the assembler arrived at the column it reads next.
#[derive(Debug, Clone, Copy)]
enum Entry {
    /// Stays inside the containers shared with the previous leaf, the first
    /// `shared` nodes of both chains.
    Forward { shared: usize },
    /// Starts a new element of a repeated ancestor.
    BackEdge(NodeId),
}

/// Assembles records from the columns of a [`ColumnStore`] in the order they
/// were written.
///
/// ```
/// use nestripe::schema::{integer, repeated_string};
/// use nestripe::{InMemoryColumnStore, RecordAssembler, RecordWriter, SchemaBuilder, ValueBuilder};
///
/// let schema = SchemaBuilder::new("post")
///     .field(integer("id"))
///     .field(repeated_string("tags"))
///     .build()
///     .unwrap();
/// let post = ValueBuilder::new()
///     .field("id", 7)
///     .repeated("tags", vec!["rust", "dremel"])
///     .build();
///
/// let mut store = InMemoryColumnStore::new();
/// RecordWriter::new(&schema, &mut store).write(&post).unwrap();
///
/// let assembled = RecordAssembler::new(&schema, &store)
///     .collect::<Result<Vec<_>, _>>()
///     .unwrap();
/// assert_eq!(assembled, vec![post]);
/// ```
#[derive(Debug)]
pub struct RecordAssembler<'a> {
    schema: &'a Schema,
    transitions: TransitionTable,
    cursors: Vec<ColumnCursor<'a>>,
    stack: Vec<Frame>,
    records: Vec<PartialRecord>,
    assembled: usize,
    fused: bool,
}

impl<'a> RecordAssembler<'a> {
    pub fn new<S: ColumnStore + ?Sized>(schema: &'a Schema, store: &'a S) -> Self {
        let cursors = schema
            .columns()
            .iter()
            .map(|column| ColumnCursor::new(store.read_sequence(column.path())))
            .collect();

        Self {
            schema,
            transitions: TransitionTable::new(schema),
            cursors,
            stack: Vec::new(),
            records: Vec::new(),
            assembled: 0,
            fused: false,
        }
    }

    pub fn transitions(&self) -> &TransitionTable {
        &self.transitions
    }

    /// Count of records returned so far.
    pub fn records_assembled(&self) -> usize {
        self.assembled
    }

    /// Rewinds every column to its first row. Reading again yields the same
    /// records.
    pub fn reset(&mut self) {
        self.cursors.iter_mut().for_each(ColumnCursor::reset);
        self.stack.clear();
        self.records.clear();
        self.assembled = 0;
        self.fused = false;
    }

    /// Assembles the next record, `None` once every column is exhausted.
    ///
    /// After an error the assembler yields `None` until [`reset`](Self::reset).
    pub fn assemble_next(&mut self) -> Result<Option<Value>> {
        if self.fused {
            return Ok(None);
        }

        match self.assemble_record() {
            Ok(Some(value)) => {
                debug!(record = self.assembled, "assembled record");
                self.assembled += 1;
                Ok(Some(value))
            }
            Ok(None) => Ok(None),
            Err(err) => {
                warn!(record = self.assembled, error = %err, "failed to assemble record");
                self.fused = true;
                Err(err)
            }
        }
    }

    fn assemble_record(&mut self) -> Result<Option<Value>> {
        let schema = self.schema;
        let Some(first) = schema.columns().first().map(|column| column.id()) else {
            return Ok(None);
        };

        if self.cursors[first.index()].is_exhausted() {
            return match self.cursors.iter().position(|cursor| !cursor.is_exhausted()) {
                None => Ok(None),
                Some(pending) => Err(ExhaustionMismatchError {
                    exhausted: schema.column(first).path().clone(),
                    pending: schema.columns()[pending].path().clone(),
                    position: self.cursors[pending].position(),
                    record: self.assembled,
                }
                .into()),
            };
        }

        self.records.clear();
        self.records.push(PartialRecord::new());
        self.stack.clear();
        self.stack.push(ROOT);

        let mut column = first;
        let mut expected: RepetitionLevel = 0;
        let mut entry = Entry::Forward { shared: 0 };

        loop {
            self.read_row(column, expected, entry)?;

            let descriptor = schema.column(column);
            let cursor = &self.cursors[column.index()];
            let level = cursor.peek_repetition_level();
            if level > descriptor.max_repetition_level() {
                return Err(self.corruption(
                    column,
                    cursor.position(),
                    Corruption::RepetitionLevelOutOfBounds {
                        found: level,
                        max: descriptor.max_repetition_level(),
                    },
                ));
            }

            match self.transitions.next(column, level) {
                Transition::End => break,
                Transition::Column { id, back_edge: None } => {
                    let shared = schema.common_depth(column, id);
                    self.stack.truncate(shared + 1);
                    expected = self.top().repetition_level;
                    entry = Entry::Forward { shared };
                    column = id;
                }
                Transition::Column {
                    id,
                    back_edge: Some(ancestor),
                } => {
                    expected = level;
                    entry = Entry::BackEdge(ancestor);
                    column = id;
                }
            }
        }

        // every column must stop at the same record boundary
        if let Some(index) = self
            .cursors
            .iter()
            .position(|cursor| cursor.peek_repetition_level() != 0)
        {
            let cursor = &self.cursors[index];
            return Err(self.corruption(
                schema.columns()[index].id(),
                cursor.position(),
                Corruption::RunsPastRecordEnd {
                    found: cursor.peek_repetition_level(),
                },
            ));
        }

        Ok(Some(self.materialise(0)))
    }

    /// Reads one row of `column` and places it in the record under
    /// construction, opening the containers its definition level implies.
    fn read_row(
        &mut self,
        column: ColumnId,
        expected: RepetitionLevel,
        entry: Entry,
    ) -> Result<()> {
        let schema = self.schema;
        let descriptor = schema.column(column);
        let cursor = &mut self.cursors[column.index()];
        let position = cursor.position();
        let Some(row) = cursor.advance() else {
            return Err(self.corruption(column, position, Corruption::Exhausted));
        };

        let max_repetition_level = descriptor.max_repetition_level();
        let max_definition_level = descriptor.max_definition_level();
        let (repetition_level, definition_level) = (row.repetition_level(), row.definition_level());

        if repetition_level > max_repetition_level {
            return Err(self.corruption(
                column,
                position,
                Corruption::RepetitionLevelOutOfBounds {
                    found: repetition_level,
                    max: max_repetition_level,
                },
            ));
        }
        if definition_level > max_definition_level {
            return Err(self.corruption(
                column,
                position,
                Corruption::DefinitionLevelOutOfBounds {
                    found: definition_level,
                    max: max_definition_level,
                },
            ));
        }
        if repetition_level != expected {
            return Err(self.corruption(
                column,
                position,
                Corruption::UnexpectedRepetitionLevel {
                    expected,
                    found: repetition_level,
                },
            ));
        }
        if row.value().is_some() != (definition_level == max_definition_level) {
            return Err(self.corruption(
                column,
                position,
                Corruption::ValueDefinitionMismatch {
                    found: definition_level,
                    max: max_definition_level,
                },
            ));
        }

        match entry {
            Entry::Forward { shared } => {
                if let Some(defined) =
                    self.enclosing_presence_mismatch(column, shared, definition_level)
                {
                    return Err(self.corruption(
                        column,
                        position,
                        Corruption::EnclosingFieldPresence {
                            found: definition_level,
                            defined,
                        },
                    ));
                }
            }
            Entry::BackEdge(ancestor) => {
                if !self.reopen(ancestor, definition_level) {
                    return Err(self.corruption(
                        column,
                        position,
                        Corruption::RepeatsAbsentField {
                            level: repetition_level,
                        },
                    ));
                }
            }
        }

        self.descend(column, row);
        Ok(())
    }

    /// After a forward move the containers still open are exactly the shared
    /// fields the previous leaf found present. The row must agree: it defines
    /// the innermost open one and leaves the next shared field undefined.
    /// Returns the defined depth of the field it disagrees about.
    fn enclosing_presence_mismatch(
        &self,
        column: ColumnId,
        shared: usize,
        definition_level: DefinitionLevel,
    ) -> Option<DefinitionLevel> {
        let chain = self.schema.column(column).chain();
        let open = self.stack.len() - 1;

        if let Some(id) = open.checked_sub(1).map(|last| chain[last]) {
            let defined = self.schema.node(id).defined_depth();
            if definition_level < defined {
                return Some(defined);
            }
        }
        if open < shared {
            let defined = self.schema.node(chain[open]).defined_depth();
            if definition_level >= defined {
                return Some(defined);
            }
        }
        None
    }

    /// Closes the current element of a repeated ancestor so that the next
    /// descent appends a new one. Returns `false` if the ancestor has no
    /// element to repeat.
    fn reopen(&mut self, ancestor: NodeId, definition_level: DefinitionLevel) -> bool {
        let node = self.schema.node(ancestor);
        if self.stack.len() < node.depth() || definition_level < node.defined_depth() {
            return false;
        }
        self.stack.truncate(node.depth());

        matches!(
            self.records[self.top().record].get(node.name()),
            Some(Slot::List(_))
        )
    }

    /// Walks the column's chain below the open containers. Present records
    /// are opened (repeated ones get a new element) until the first absent
    /// field; a present leaf receives the row's value.
    fn descend(&mut self, column: ColumnId, row: &StripeRow) {
        let schema = self.schema;
        let chain = schema.column(column).chain();
        let definition_level = row.definition_level();

        for id in &chain[self.stack.len() - 1..] {
            let node = schema.node(*id);
            if node.defined_depth() > definition_level {
                break;
            }

            let parent = self.top().record;
            let slot = match (node.column(), row.value()) {
                (Some(_), Some(value)) => Slot::Value(value.clone()),
                // a present leaf always carries a value
                (Some(_), None) => break,
                (None, _) => {
                    if !node.is_repeated() {
                        if let Some(Slot::Record(existing)) = self.records[parent].get(node.name())
                        {
                            let existing = *existing;
                            self.stack.push(Frame {
                                record: existing,
                                repetition_level: row.repetition_level(),
                            });
                            continue;
                        }
                    }
                    let record = self.records.len();
                    self.records.push(PartialRecord::new());
                    self.stack.push(Frame {
                        record,
                        repetition_level: row.repetition_level(),
                    });
                    Slot::Record(record)
                }
            };

            let fields = &mut self.records[parent];
            if node.is_repeated() {
                match fields
                    .entry(node.name().to_string())
                    .or_insert_with(|| Slot::List(Vec::new()))
                {
                    Slot::List(items) => items.push(slot),
                    other => *other = Slot::List(vec![slot]),
                }
            } else {
                fields.insert(node.name().to_string(), slot);
            }
        }
    }

    fn top(&self) -> Frame {
        self.stack.last().copied().unwrap_or(ROOT)
    }

    fn corruption(&self, column: ColumnId, position: usize, kind: Corruption) -> Error {
        DataCorruptionError {
            path: self.schema.column(column).path().clone(),
            position,
            record: self.assembled,
            kind,
        }
        .into()
    }

    fn materialise(&mut self, record: usize) -> Value {
        let fields = std::mem::take(&mut self.records[record]);
        Value::Record(
            fields
                .into_iter()
                .map(|(name, slot)| (name, self.materialise_slot(slot)))
                .collect(),
        )
    }

    fn materialise_slot(&mut self, slot: Slot) -> Value {
        match slot {
            Slot::Value(scalar) => Value::Scalar(scalar),
            Slot::List(items) => Value::List(
                items
                    .into_iter()
                    .map(|item| self.materialise_slot(item))
                    .collect(),
            ),
            Slot::Record(record) => self.materialise(record),
        }
    }
}

impl Iterator for RecordAssembler<'_> {
    type Item = Result<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        self.assemble_next().transpose()
    }
}
