//! The schema tree shared by the striper and the assembler.
//!
//! A [`Schema`] is built once from declared [`Field`]s and compiled into an
//! arena of [`SchemaNode`]s. Nodes are addressed by [`NodeId`] and refer to
//! their parent by index, so walking up or down the tree never needs a
//! back-pointer. Every leaf field becomes a [`ColumnDescriptor`] carrying
//! its [`ColumnPath`], its root-to-leaf chain and its maximum levels.

use crate::column_path::ColumnPath;
use crate::common::{DefinitionLevel, RepetitionDepth, RepetitionLevel};
use crate::error::SchemaError;
use crate::field::{Field, Kind, Mode, PrimitiveType};
use crate::schema_iter::DepthFirstFieldIterator;
use std::collections::HashMap;
use std::fmt;
use std::fmt::Formatter;
use tracing::debug;

/// Index of a node in the schema arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Index of a leaf column in document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColumnId(usize);

impl ColumnId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A compiled schema field with its precomputed level accounting.
#[derive(Debug)]
pub struct SchemaNode {
    id: NodeId,
    name: String,
    kind: NodeKind,
    mode: Mode,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    path: ColumnPath,
    repeated_depth: RepetitionDepth,
    defined_depth: DefinitionLevel,
    column: Option<ColumnId>,
    first_column: ColumnId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Scalar(PrimitiveType),
    Record,
}

impl SchemaNode {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// `None` for top-level fields.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn path(&self) -> &ColumnPath {
        &self.path
    }

    /// Depth of the field in the tree, `1` for top-level fields.
    pub fn depth(&self) -> usize {
        self.path.depth()
    }

    pub fn is_required(&self) -> bool {
        self.mode == Mode::Required
    }

    pub fn is_repeated(&self) -> bool {
        self.mode == Mode::Repeated
    }

    /// Whether this field's own mode contributes a definition level.
    pub fn is_defined_level(&self) -> bool {
        self.mode.is_defined_level()
    }

    /// Count of repeated fields from the root down to and including this
    /// field.
    pub fn repeated_depth(&self) -> RepetitionDepth {
        self.repeated_depth
    }

    /// Count of optional or repeated fields from the root down to and
    /// including this field.
    pub fn defined_depth(&self) -> DefinitionLevel {
        self.defined_depth
    }

    /// The column stored for this field if it is a leaf.
    pub fn column(&self) -> Option<ColumnId> {
        self.column
    }

    /// The first leaf column beneath this field in document order, the
    /// field's own column for a leaf.
    pub fn first_column(&self) -> ColumnId {
        self.first_column
    }
}

/// Static description of one leaf column.
#[derive(Debug)]
pub struct ColumnDescriptor {
    id: ColumnId,
    path: ColumnPath,
    primitive: PrimitiveType,
    chain: Vec<NodeId>,
    max_repetition_level: RepetitionLevel,
    max_definition_level: DefinitionLevel,
}

impl ColumnDescriptor {
    pub fn id(&self) -> ColumnId {
        self.id
    }

    pub fn path(&self) -> &ColumnPath {
        &self.path
    }

    pub fn primitive(&self) -> PrimitiveType {
        self.primitive
    }

    /// Nodes from the top-level field down to the leaf, inclusive.
    pub fn chain(&self) -> &[NodeId] {
        &self.chain
    }

    pub fn leaf(&self) -> NodeId {
        // the chain always ends with the leaf itself
        self.chain[self.chain.len() - 1]
    }

    pub fn max_repetition_level(&self) -> RepetitionLevel {
        self.max_repetition_level
    }

    pub fn max_definition_level(&self) -> DefinitionLevel {
        self.max_definition_level
    }
}

/// An immutable, validated schema.
///
/// Safe to share across threads: nothing in it is mutated after
/// [`Schema::new`] returns.
#[derive(Debug)]
pub struct Schema {
    name: String,
    fields: Vec<Field>,
    nodes: Vec<SchemaNode>,
    top_level: Vec<NodeId>,
    columns: Vec<ColumnDescriptor>,
    column_index: HashMap<ColumnPath, ColumnId>,
}

impl Schema {
    /// Validates and compiles the declared fields.
    pub fn new(name: impl Into<String>, fields: Vec<Field>) -> Result<Self, SchemaError> {
        let name = name.into();

        let mut nodes: Vec<SchemaNode> = Vec::new();
        let mut top_level: Vec<NodeId> = Vec::new();
        let mut columns: Vec<ColumnDescriptor> = Vec::new();
        let mut first_columns: Vec<Option<ColumnId>> = Vec::new();
        let mut ancestors: Vec<NodeId> = Vec::new();

        for (field, path) in DepthFirstFieldIterator::new(&fields) {
            ancestors.truncate(path.depth() - 1);
            let parent = ancestors.last().copied();
            let parent_path = path.prefix(path.depth() - 1);

            if field.name().is_empty() || field.name().contains('.') {
                return Err(SchemaError::InvalidFieldName {
                    name: field.name().to_string(),
                    parent: parent_path,
                });
            }

            let siblings = match parent {
                Some(p) => &nodes[p.index()].children,
                None => &top_level,
            };
            if siblings
                .iter()
                .any(|sibling| nodes[sibling.index()].name == field.name())
            {
                return Err(SchemaError::DuplicateFieldName {
                    name: field.name().to_string(),
                    parent: parent_path,
                });
            }

            let (parent_rep, parent_def) = parent
                .map(|p| {
                    let node = &nodes[p.index()];
                    (node.repeated_depth, node.defined_depth)
                })
                .unwrap_or((0, 0));
            let repeated_depth = parent_rep
                .checked_add(RepetitionDepth::from(field.is_repeated()))
                .ok_or_else(|| SchemaError::LevelOverflow { path: path.clone() })?;
            let defined_depth = parent_def
                .checked_add(DefinitionLevel::from(field.is_optional()))
                .ok_or_else(|| SchemaError::LevelOverflow { path: path.clone() })?;

            let id = NodeId(nodes.len());
            let (kind, column) = match field.kind() {
                Kind::Record(children) => {
                    if children.is_empty() {
                        return Err(SchemaError::EmptyRecord { path });
                    }
                    (NodeKind::Record, None)
                }
                Kind::Scalar(primitive) => {
                    let column = ColumnId(columns.len());
                    let mut chain = ancestors.clone();
                    chain.push(id);
                    columns.push(ColumnDescriptor {
                        id: column,
                        path: path.clone(),
                        primitive: *primitive,
                        chain,
                        max_repetition_level: repeated_depth,
                        max_definition_level: defined_depth,
                    });
                    (NodeKind::Scalar(*primitive), Some(column))
                }
            };

            // the first leaf visited after a node is the first leaf beneath it
            first_columns.push(column);
            if let Some(column) = column {
                for ancestor in &ancestors {
                    first_columns[ancestor.index()].get_or_insert(column);
                }
            }

            nodes.push(SchemaNode {
                id,
                name: field.name().to_string(),
                kind,
                mode: field.mode(),
                parent,
                children: vec![],
                path,
                repeated_depth,
                defined_depth,
                column,
                // patched below once every leaf is known
                first_column: ColumnId(0),
            });
            match parent {
                Some(p) => nodes[p.index()].children.push(id),
                None => top_level.push(id),
            }
            if kind == NodeKind::Record {
                ancestors.push(id);
            }
        }

        if columns.is_empty() {
            return Err(SchemaError::EmptySchema { schema: name });
        }

        for (node, first_column) in nodes.iter_mut().zip(first_columns) {
            node.first_column = first_column.ok_or_else(|| SchemaError::EmptyRecord {
                path: node.path.clone(),
            })?;
        }

        let column_index = columns
            .iter()
            .map(|column| (column.path.clone(), column.id))
            .collect();

        debug!(
            schema = %name,
            nodes = nodes.len(),
            columns = columns.len(),
            "compiled schema"
        );

        Ok(Self {
            name,
            fields,
            nodes,
            top_level,
            columns,
            column_index,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declared fields the schema was built from.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn node(&self, id: NodeId) -> &SchemaNode {
        &self.nodes[id.index()]
    }

    pub fn nodes(&self) -> &[SchemaNode] {
        &self.nodes
    }

    pub fn top_level(&self) -> &[NodeId] {
        &self.top_level
    }

    /// Leaf columns in document order.
    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    pub fn column(&self, id: ColumnId) -> &ColumnDescriptor {
        &self.columns[id.index()]
    }

    pub fn column_by_path(&self, path: &ColumnPath) -> Option<&ColumnDescriptor> {
        self.column_index.get(path).map(|id| self.column(*id))
    }

    /// Returns the chain of nodes from the top-level field down to the leaf
    /// of a column, or `None` if the path is not a leaf column.
    pub fn chain(&self, path: &ColumnPath) -> Option<Vec<&SchemaNode>> {
        self.column_by_path(path)
            .map(|column| column.chain.iter().map(|id| self.node(*id)).collect())
    }

    pub fn parent(&self, id: NodeId) -> Option<&SchemaNode> {
        self.node(id).parent.map(|p| self.node(p))
    }

    /// Child nodes of a record node, or the top-level nodes for `None`.
    pub fn children_of(&self, id: Option<NodeId>) -> &[NodeId] {
        match id {
            Some(id) => &self.node(id).children,
            None => &self.top_level,
        }
    }

    /// Finds the repeated field on a column's chain which introduces
    /// repetition `level`. Level `0` has no such field.
    pub fn repeated_ancestor(&self, column: ColumnId, level: RepetitionLevel) -> Option<NodeId> {
        self.column(column).chain.iter().copied().find(|id| {
            let node = self.node(*id);
            node.is_repeated() && node.repeated_depth == level
        })
    }

    /// Count of leading nodes two columns share on their chains.
    pub fn common_depth(&self, a: ColumnId, b: ColumnId) -> usize {
        self.column(a)
            .chain
            .iter()
            .zip(self.column(b).chain.iter())
            .take_while(|(x, y)| x == y)
            .count()
    }

    /// Repetition depth of the deepest field two columns share, `0` if they
    /// share no repeated field.
    pub fn common_repetition_level(&self, a: ColumnId, b: ColumnId) -> RepetitionLevel {
        match self.common_depth(a, b) {
            0 => 0,
            depth => self.node(self.column(a).chain[depth - 1]).repeated_depth,
        }
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "message {} {{", self.name)?;
        for field in &self.fields {
            field.fmt_with_indent(f, 2)?;
            writeln!(f)?;
        }
        write!(f, "}}")
    }
}

#[derive(Debug)]
pub struct SchemaBuilder {
    name: String,
    fields: Vec<Field>,
}

impl SchemaBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: vec![],
        }
    }

    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn build(self) -> Result<Schema, SchemaError> {
        Schema::new(self.name, self.fields)
    }
}

fn scalar(name: &str, primitive: PrimitiveType, mode: Mode) -> Field {
    Field::new(name, Kind::Scalar(primitive), mode)
}

pub fn bool(name: &str) -> Field {
    scalar(name, PrimitiveType::Boolean, Mode::Required)
}

pub fn integer(name: &str) -> Field {
    scalar(name, PrimitiveType::Integer, Mode::Required)
}

pub fn float(name: &str) -> Field {
    scalar(name, PrimitiveType::Float, Mode::Required)
}

pub fn string(name: &str) -> Field {
    scalar(name, PrimitiveType::String, Mode::Required)
}

pub fn optional_bool(name: &str) -> Field {
    scalar(name, PrimitiveType::Boolean, Mode::Optional)
}

pub fn optional_integer(name: &str) -> Field {
    scalar(name, PrimitiveType::Integer, Mode::Optional)
}

pub fn optional_float(name: &str) -> Field {
    scalar(name, PrimitiveType::Float, Mode::Optional)
}

pub fn optional_string(name: &str) -> Field {
    scalar(name, PrimitiveType::String, Mode::Optional)
}

pub fn repeated_bool(name: &str) -> Field {
    scalar(name, PrimitiveType::Boolean, Mode::Repeated)
}

pub fn repeated_integer(name: &str) -> Field {
    scalar(name, PrimitiveType::Integer, Mode::Repeated)
}

pub fn repeated_float(name: &str) -> Field {
    scalar(name, PrimitiveType::Float, Mode::Repeated)
}

pub fn repeated_string(name: &str) -> Field {
    scalar(name, PrimitiveType::String, Mode::Repeated)
}

pub fn required_group(name: &str, fields: Vec<Field>) -> Field {
    Field::new(name, Kind::Record(fields), Mode::Required)
}

pub fn optional_group(name: &str, fields: Vec<Field>) -> Field {
    Field::new(name, Kind::Record(fields), Mode::Optional)
}

pub fn repeated_group(name: &str, fields: Vec<Field>) -> Field {
    Field::new(name, Kind::Record(fields), Mode::Repeated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::document_schema;

    #[test]
    fn test_empty_schema() {
        let err = SchemaBuilder::new("empty").build().unwrap_err();
        assert_eq!(
            err,
            SchemaError::EmptySchema {
                schema: "empty".to_string()
            }
        );
    }

    #[test]
    fn test_flat_schema() {
        let schema = SchemaBuilder::new("account")
            .field(integer("userid"))
            .field(bool("active"))
            .field(optional_string("email"))
            .build()
            .unwrap();

        assert_eq!(schema.name(), "account");
        assert_eq!(schema.fields().len(), 3);
        assert_eq!(schema.columns().len(), 3);

        let email = schema.column_by_path(&ColumnPath::from("email")).unwrap();
        assert_eq!(email.id().index(), 2);
        assert_eq!(email.max_definition_level(), 1);
        assert_eq!(email.max_repetition_level(), 0);
    }

    #[test]
    fn test_duplicate_sibling_names() {
        let err = SchemaBuilder::new("dup")
            .field(required_group("a", vec![integer("x"), string("x")]))
            .build()
            .unwrap_err();

        assert_eq!(
            err,
            SchemaError::DuplicateFieldName {
                name: "x".to_string(),
                parent: ColumnPath::from("a"),
            }
        );
    }

    #[test]
    fn test_same_name_in_different_records() {
        let schema = SchemaBuilder::new("ok")
            .field(required_group("a", vec![integer("x")]))
            .field(required_group("b", vec![integer("x")]))
            .build()
            .unwrap();

        assert_eq!(schema.columns().len(), 2);
    }

    #[test]
    fn test_record_without_children() {
        let err = SchemaBuilder::new("bad")
            .field(integer("id"))
            .field(optional_group("links", vec![]))
            .build()
            .unwrap_err();

        assert_eq!(
            err,
            SchemaError::EmptyRecord {
                path: ColumnPath::from("links")
            }
        );
    }

    #[test]
    fn test_invalid_field_name() {
        let err = SchemaBuilder::new("bad")
            .field(integer("a.b"))
            .build()
            .unwrap_err();

        assert!(matches!(err, SchemaError::InvalidFieldName { .. }));
    }

    #[test]
    fn test_document_levels() {
        let schema = document_schema();

        let levels = schema
            .columns()
            .iter()
            .map(|c| {
                (
                    c.path().to_string(),
                    c.max_repetition_level(),
                    c.max_definition_level(),
                )
            })
            .collect::<Vec<_>>();

        assert_eq!(
            levels,
            vec![
                ("doc_id".to_string(), 0, 0),
                ("links.backward".to_string(), 1, 2),
                ("links.forward".to_string(), 1, 2),
                ("names.languages.code".to_string(), 2, 2),
                ("names.languages.country".to_string(), 2, 3),
                ("names.url".to_string(), 1, 2),
            ]
        );
    }

    #[test]
    fn test_chain() {
        let schema = document_schema();
        let chain = schema
            .chain(&ColumnPath::from("names.languages.country"))
            .unwrap();

        let names = chain.iter().map(|n| n.name()).collect::<Vec<_>>();
        assert_eq!(names, vec!["names", "languages", "country"]);

        let depths = chain
            .iter()
            .map(|n| (n.repeated_depth(), n.defined_depth(), n.is_defined_level()))
            .collect::<Vec<_>>();
        assert_eq!(depths, vec![(1, 1, true), (2, 2, true), (2, 3, true)]);

        assert!(chain[0].parent().is_none());
        assert_eq!(chain[2].parent(), Some(chain[1].id()));
        assert!(schema.chain(&ColumnPath::from("names.languages")).is_none());
    }

    #[test]
    fn test_first_column_and_ancestors() {
        let schema = document_schema();
        let country = schema
            .column_by_path(&ColumnPath::from("names.languages.country"))
            .unwrap()
            .id();
        let code = schema
            .column_by_path(&ColumnPath::from("names.languages.code"))
            .unwrap()
            .id();

        let languages = schema.repeated_ancestor(country, 2).unwrap();
        assert_eq!(schema.node(languages).name(), "languages");
        assert_eq!(schema.node(languages).first_column(), code);

        let names = schema.repeated_ancestor(country, 1).unwrap();
        assert_eq!(schema.node(names).first_column(), code);
        assert_eq!(schema.repeated_ancestor(country, 0), None);
    }

    #[test]
    fn test_common_repetition_level() {
        let schema = document_schema();
        let id = |path: &str| {
            schema
                .column_by_path(&ColumnPath::from(path))
                .unwrap()
                .id()
        };

        assert_eq!(
            schema.common_repetition_level(id("links.backward"), id("links.forward")),
            0
        );
        assert_eq!(
            schema.common_repetition_level(id("names.languages.code"), id("names.languages.country")),
            2
        );
        assert_eq!(
            schema.common_repetition_level(id("names.languages.country"), id("names.url")),
            1
        );
        assert_eq!(schema.common_depth(id("doc_id"), id("names.url")), 0);
    }

    #[test]
    fn test_display() {
        let schema = SchemaBuilder::new("Document")
            .field(integer("doc_id"))
            .field(optional_group("links", vec![repeated_integer("forward")]))
            .build()
            .unwrap();

        assert_eq!(
            schema.to_string(),
            "message Document {\n  required int64 doc_id;\n  optional group links {\n    repeated int64 forward;\n  }\n}"
        );
    }
}
