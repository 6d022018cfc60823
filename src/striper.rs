//! Implements the core logic for striping nested values according to a schema
//! into a flattened representation suitable for columnar storage.
//!
//! The traversal is driven by the schema, not the value, so every leaf column
//! receives at least one row per record: a field which is absent or null, or a
//! repeated field with no elements, still emits a single null row at the levels
//! computed for it. This is what allows the assembler to tell that a branch
//! was absent without any other bookkeeping.

use crate::column_path::ColumnPath;
use crate::common::{DefinitionLevel, RepetitionLevel};
use crate::error::RecordMismatchError;
use crate::schema::{ColumnId, NodeId, Schema, SchemaNode};
use crate::value::{Scalar, Value};
use std::collections::BTreeMap;
use std::iter::Enumerate;
use std::slice::Iter;

type StripeResult<T> = Result<T, RecordMismatchError>;

/// A single flattened column value, with its repetition and definition
/// levels described in the Dremel paper.
#[derive(Debug, PartialEq, Clone)]
pub struct StripeRow {
    value: Option<Scalar>,
    repetition_level: RepetitionLevel,
    definition_level: DefinitionLevel,
}

impl StripeRow {
    pub fn new(
        value: Option<Scalar>,
        repetition_level: RepetitionLevel,
        definition_level: DefinitionLevel,
    ) -> Self {
        Self {
            value,
            repetition_level,
            definition_level,
        }
    }

    /// A placeholder row for an absent or null occurrence.
    pub fn null(repetition_level: RepetitionLevel, definition_level: DefinitionLevel) -> Self {
        Self::new(None, repetition_level, definition_level)
    }

    /// The leaf value, `None` for a null or absent occurrence.
    pub fn value(&self) -> Option<&Scalar> {
        self.value.as_ref()
    }

    pub fn repetition_level(&self) -> RepetitionLevel {
        self.repetition_level
    }

    pub fn definition_level(&self) -> DefinitionLevel {
        self.definition_level
    }
}

/// Receives rows from the striper in document order.
pub trait RowSink {
    fn emit(&mut self, column: ColumnId, row: StripeRow);
}

/// The rows of one striped record, grouped by column.
///
/// Rows are buffered here so that a record which fails validation half way
/// through never reaches a column store. See
/// [`RecordWriter`](crate::writer::RecordWriter) for the atomic commit.
#[derive(Debug, Clone, PartialEq)]
pub struct StripedRecord {
    columns: Vec<Vec<StripeRow>>,
}

impl StripedRecord {
    /// An empty buffer with one column per leaf of `schema`.
    pub fn new(schema: &Schema) -> Self {
        Self {
            columns: vec![Vec::new(); schema.columns().len()],
        }
    }

    pub fn column(&self, id: ColumnId) -> &[StripeRow] {
        self.columns
            .get(id.index())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Total rows across all columns.
    pub fn row_count(&self) -> usize {
        self.columns.iter().map(Vec::len).sum()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Consumes the record, yielding each column's rows in document order.
    pub fn into_columns(self) -> impl Iterator<Item = Vec<StripeRow>> {
        self.columns.into_iter()
    }
}

impl RowSink for StripedRecord {
    fn emit(&mut self, column: ColumnId, row: StripeRow) {
        self.columns[column.index()].push(row);
    }
}

/// Stripes one top-level record into per-column rows.
///
/// The value must be a [`Value::Record`]. On error no rows are returned.
pub fn stripe(schema: &Schema, value: &Value) -> StripeResult<StripedRecord> {
    let fields = match value {
        Value::Record(fields) => fields,
        Value::Null | Value::Scalar(_) | Value::List(_) => {
            return Err(RecordMismatchError::ExpectedRecord {
                path: ColumnPath::default(),
                found: value.type_label(),
            })
        }
    };

    let mut record = StripedRecord::new(schema);
    stripe_node(schema, None, Some(fields), &mut record, 0, 0)?;
    Ok(record)
}

/// Recursive descent over the children of `node` (the top-level fields for
/// `None`), emitting rows for every leaf beneath it.
///
/// `record` is the resolved value of `node`, `None` when it is absent or
/// null. `parent_repetition_level` is the level of the occurrence of `node`
/// being striped; the first occurrence of every child continues it.
/// `parent_definition_level` counts the optional and repeated ancestors of
/// the children which are present. A [`StripedRecord`] sink must be created
/// for the same schema.
pub fn stripe_node(
    schema: &Schema,
    node: Option<NodeId>,
    record: Option<&BTreeMap<String, Value>>,
    sink: &mut impl RowSink,
    parent_repetition_level: RepetitionLevel,
    parent_definition_level: DefinitionLevel,
) -> StripeResult<()> {
    if let Some(fields) = record {
        check_declared(schema, node, fields)?;
    }

    for occurrence in FieldOccurrences::new(schema, node, record) {
        let Occurrence { node, value, index } = occurrence?;

        let repetition_level = if index == 0 {
            parent_repetition_level
        } else {
            node.repeated_depth()
        };

        if node.is_required() && value.is_none() && record.is_some() {
            return Err(RecordMismatchError::RequiredFieldMissing {
                path: node.path().clone(),
            });
        }

        let definition_level =
            parent_definition_level + DefinitionLevel::from(value.is_some() && node.is_defined_level());

        match node.column() {
            Some(column) => {
                let scalar = resolve_scalar(schema, node, column, value)?;
                sink.emit(
                    column,
                    StripeRow::new(scalar, repetition_level, definition_level),
                );
            }
            None => {
                let fields = match value {
                    None => None,
                    Some(Value::Record(fields)) => Some(fields),
                    Some(other) => {
                        return Err(RecordMismatchError::ExpectedRecord {
                            path: node.path().clone(),
                            found: other.type_label(),
                        })
                    }
                };
                stripe_node(
                    schema,
                    Some(node.id()),
                    fields,
                    sink,
                    repetition_level,
                    definition_level,
                )?;
            }
        }
    }

    Ok(())
}

fn resolve_scalar(
    schema: &Schema,
    node: &SchemaNode,
    column: ColumnId,
    value: Option<&Value>,
) -> StripeResult<Option<Scalar>> {
    let primitive = schema.column(column).primitive();
    match value {
        None => Ok(None),
        Some(Value::Scalar(scalar)) if scalar.conforms_to(primitive) => {
            Ok(Some(scalar.coerce(primitive)))
        }
        Some(other) => Err(RecordMismatchError::ScalarTypeMismatch {
            path: node.path().clone(),
            expected: primitive,
            found: other.type_label(),
        }),
    }
}

/// Every property of a record value must be declared by the schema.
fn check_declared(
    schema: &Schema,
    node: Option<NodeId>,
    fields: &BTreeMap<String, Value>,
) -> StripeResult<()> {
    let children = schema.children_of(node);
    for name in fields.keys() {
        if !children
            .iter()
            .any(|child| schema.node(*child).name() == name)
        {
            let parent = node
                .map(|id| schema.node(id).path().clone())
                .unwrap_or_default();
            return Err(RecordMismatchError::UndeclaredField {
                path: parent.append_name(name.as_str()),
            });
        }
    }
    Ok(())
}

/// One occurrence of a child field within a record value.
#[derive(Debug)]
pub struct Occurrence<'s, 'v> {
    pub node: &'s SchemaNode,
    /// The resolved value, `None` when absent or null.
    pub value: Option<&'v Value>,
    /// Position within a repeated field's list, `0` for the first (or only)
    /// occurrence.
    pub index: usize,
}

/// Yields the occurrences of a record's child fields in declaration order,
/// expanding the elements of repeated fields inline.
///
/// Single pass and finite: one item per declared child, except a repeated
/// field with a non-empty list which yields one item per element. A repeated
/// field with an empty or missing list yields a single `None` occurrence.
#[derive(Debug)]
pub struct FieldOccurrences<'s, 'v> {
    schema: &'s Schema,
    children: Iter<'s, NodeId>,
    record: Option<&'v BTreeMap<String, Value>>,
    pending: Option<(&'s SchemaNode, Enumerate<Iter<'v, Value>>)>,
}

impl<'s, 'v> FieldOccurrences<'s, 'v> {
    pub fn new(
        schema: &'s Schema,
        node: Option<NodeId>,
        record: Option<&'v BTreeMap<String, Value>>,
    ) -> Self {
        Self {
            schema,
            children: schema.children_of(node).iter(),
            record,
            pending: None,
        }
    }

    fn next_element(&mut self) -> Option<StripeResult<Occurrence<'s, 'v>>> {
        let (node, elements) = self.pending.as_mut()?;
        let node: &'s SchemaNode = *node;
        match elements.next() {
            Some((index, Value::Null)) => Some(Err(RecordMismatchError::NullListElement {
                path: node.path().clone(),
                index,
            })),
            Some((index, value)) => Some(Ok(Occurrence {
                node,
                value: Some(value),
                index,
            })),
            None => {
                self.pending = None;
                None
            }
        }
    }
}

impl<'s, 'v> Iterator for FieldOccurrences<'s, 'v> {
    type Item = StripeResult<Occurrence<'s, 'v>>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(element) = self.next_element() {
            return Some(element);
        }

        let node = self.schema.node(*self.children.next()?);
        let value = self
            .record
            .and_then(|fields| fields.get(node.name()))
            .filter(|value| !value.is_null());

        if !node.is_repeated() {
            return Some(Ok(Occurrence {
                node,
                value,
                index: 0,
            }));
        }

        match value {
            Some(Value::List(items)) if !items.is_empty() => {
                self.pending = Some((node, items.iter().enumerate()));
                self.next_element()
            }
            Some(Value::List(_)) | None => Some(Ok(Occurrence {
                node,
                value: None,
                index: 0,
            })),
            Some(other) => Some(Err(RecordMismatchError::ExpectedList {
                path: node.path().clone(),
                found: other.type_label(),
            })),
        }
    }
}
