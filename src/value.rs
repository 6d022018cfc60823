//! Defines the representation of nested data structure values.

use crate::field::PrimitiveType;
use std::collections::BTreeMap;
use std::fmt;
use std::fmt::Formatter;

/// A primitive leaf value.
#[derive(Debug, PartialEq, Clone)]
pub enum Scalar {
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

impl Scalar {
    pub fn type_label(&self) -> &'static str {
        match self {
            Scalar::Boolean(_) => "bool",
            Scalar::Integer(_) => "int64",
            Scalar::Float(_) => "double",
            Scalar::String(_) => "string",
        }
    }

    /// Checks if this scalar can be stored in a column of `primitive` type.
    ///
    /// Integers are accepted by float columns and are widened on the way in
    /// by [`Scalar::coerce`].
    pub fn conforms_to(&self, primitive: PrimitiveType) -> bool {
        matches!(
            (self, primitive),
            (Scalar::Boolean(_), PrimitiveType::Boolean)
                | (Scalar::Integer(_), PrimitiveType::Integer)
                | (Scalar::Integer(_), PrimitiveType::Float)
                | (Scalar::Float(_), PrimitiveType::Float)
                | (Scalar::String(_), PrimitiveType::String)
        )
    }

    /// Converts a conforming scalar to the physical representation of
    /// `primitive`.
    pub(crate) fn coerce(&self, primitive: PrimitiveType) -> Scalar {
        match (self, primitive) {
            (Scalar::Integer(i), PrimitiveType::Float) => Scalar::Float(*i as f64),
            _ => self.clone(),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Boolean(b) => write!(f, "{b}"),
            Scalar::Integer(i) => write!(f, "{i}"),
            Scalar::Float(x) => write!(f, "{x}"),
            Scalar::String(s) => write!(f, "{s:?}"),
        }
    }
}

/// Represents one instance of a nested record.
///
/// All field resolution is an explicit match over the four variants. A
/// field which is absent from a [`Value::Record`] and a field mapped to
/// [`Value::Null`] are treated alike by the striper.
#[derive(Debug, PartialEq, Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Scalar(Scalar),
    /// Occurrences of a repeated field, in order.
    List(Vec<Value>),
    /// A nested structure (group/record) mapping field names to values.
    Record(BTreeMap<String, Value>),
}

impl Value {
    /// An empty record.
    pub fn record() -> Self {
        Value::Record(BTreeMap::new())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns a string label representing the variant of this [`Value`].
    pub fn type_label(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Scalar(scalar) => scalar.type_label(),
            Value::List(_) => "list",
            Value::Record(_) => "record",
        }
    }

    /// Looks up a field of a record value. Returns `None` for absent fields
    /// and for non-record values.
    pub fn get(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Record(fields) => fields.get(name),
            Value::Null | Value::Scalar(_) | Value::List(_) => None,
        }
    }

    fn fmt_with_indent(&self, f: &mut Formatter<'_>, indent: usize) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Scalar(scalar) => write!(f, "{scalar}"),
            Value::List(values) => {
                write!(f, "[")?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?
                    }
                    value.fmt_with_indent(f, indent)?;
                }
                write!(f, "]")
            }
            Value::Record(fields) if fields.is_empty() => write!(f, "{{}}"),
            Value::Record(fields) => {
                writeln!(f, "{{")?;
                for (k, v) in fields {
                    write!(f, "{:indent$}{}: ", "", k, indent = indent + 2)?;
                    v.fmt_with_indent(f, indent + 2)?;
                    writeln!(f, ",")?;
                }
                write!(f, "{:indent$}}}", "", indent = indent)
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.fmt_with_indent(f, 0)
    }
}

impl From<Scalar> for Value {
    fn from(value: Scalar) -> Self {
        Self::Scalar(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Scalar(Scalar::Boolean(value))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Scalar(Scalar::Integer(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Scalar(Scalar::Float(value))
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Scalar(Scalar::String(value.to_string()))
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Scalar(Scalar::String(value))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(values: Vec<T>) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(fields: BTreeMap<String, Value>) -> Self {
        Self::Record(fields)
    }
}

/// Ergonomic builder pattern API for creating a concrete nested value.
#[derive(Debug, Default, Clone)]
pub struct ValueBuilder {
    fields: BTreeMap<String, Value>,
}

impl ValueBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a name, value pair to the value being built. A later call with
    /// the same name replaces the earlier value.
    pub fn field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Add a name, repeated value to the value being built.
    pub fn repeated(
        mut self,
        key: impl Into<String>,
        values: impl IntoIterator<Item = impl Into<Value>>,
    ) -> Self {
        self.fields.insert(
            key.into(),
            Value::List(values.into_iter().map(Into::into).collect()),
        );
        self
    }

    /// Add an explicit null for a field.
    pub fn null(mut self, key: impl Into<String>) -> Self {
        self.fields.insert(key.into(), Value::Null);
        self
    }

    /// Consumes the builder and returns the constructed [`Value`]
    pub fn build(self) -> Value {
        Value::Record(self.fields)
    }
}
