//! JSON adapters: a schema descriptor format and the conversion between JSON
//! documents and [`Value`]s.
//!
//! A schema is a JSON array of field descriptors:
//!
//! ```json
//! [
//!   { "name": "doc_id", "kind": "int", "mode": "required" },
//!   { "name": "links", "kind": "record", "mode": "optional", "fields": [
//!     { "name": "forward", "kind": "int", "mode": "repeated" }
//!   ]}
//! ]
//! ```

use crate::column_path::ColumnPath;
use crate::error::{Result, SchemaError};
use crate::field::{Field, Kind, Mode, PrimitiveType};
use crate::schema::Schema;
use crate::value::{Scalar, Value};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number};

/// One field in the JSON schema format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub kind: String,
    pub mode: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<FieldDescriptor>>,
}

impl FieldDescriptor {
    /// Converts the descriptor into a [`Field`]. `parent` is used for error
    /// context only.
    pub fn to_field(&self, parent: &ColumnPath) -> Result<Field, SchemaError> {
        let path = parent.append_name(self.name.as_str());

        let mode = match self.mode.as_str() {
            "required" => Mode::Required,
            "optional" => Mode::Optional,
            "repeated" => Mode::Repeated,
            other => {
                return Err(SchemaError::UnknownMode {
                    mode: other.to_string(),
                    path,
                })
            }
        };

        let primitive = match self.kind.as_str() {
            "bool" | "boolean" => Some(PrimitiveType::Boolean),
            "int" | "integer" | "int64" => Some(PrimitiveType::Integer),
            "float" | "double" => Some(PrimitiveType::Float),
            "string" => Some(PrimitiveType::String),
            "record" => None,
            other => {
                return Err(SchemaError::UnknownKind {
                    kind: other.to_string(),
                    path,
                })
            }
        };

        let kind = match (primitive, &self.fields) {
            (Some(_), Some(_)) => return Err(SchemaError::UnexpectedChildren { path }),
            (Some(primitive), None) => Kind::Scalar(primitive),
            (None, None) => return Err(SchemaError::EmptyRecord { path }),
            (None, Some(children)) => Kind::Record(
                children
                    .iter()
                    .map(|child| child.to_field(&path))
                    .collect::<Result<Vec<_>, _>>()?,
            ),
        };

        Ok(Field::new(self.name.as_str(), kind, mode))
    }
}

impl From<&Field> for FieldDescriptor {
    fn from(field: &Field) -> Self {
        let (kind, fields) = match field.kind() {
            Kind::Scalar(primitive) => (primitive.type_label().to_string(), None),
            Kind::Record(children) => (
                "record".to_string(),
                Some(children.iter().map(FieldDescriptor::from).collect()),
            ),
        };
        Self {
            name: field.name().to_string(),
            kind,
            mode: field.mode().label().to_string(),
            fields,
        }
    }
}

/// Parses and compiles a schema from its JSON descriptor.
pub fn schema_from_json(name: &str, json: &str) -> Result<Schema> {
    let descriptors: Vec<FieldDescriptor> = serde_json::from_str(json)?;
    let fields = descriptors
        .iter()
        .map(|descriptor| descriptor.to_field(&ColumnPath::default()))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Schema::new(name, fields)?)
}

/// Renders the declared fields of a schema in the JSON descriptor format.
pub fn schema_to_json(schema: &Schema) -> Result<String> {
    let descriptors = schema
        .fields()
        .iter()
        .map(FieldDescriptor::from)
        .collect::<Vec<_>>();
    Ok(serde_json::to_string_pretty(&descriptors)?)
}

/// Parses one JSON document into a [`Value`].
pub fn parse_value(json: &str) -> Result<Value> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    Ok(value.into())
}

/// Integers which fit in an `i64` stay integers, every other number becomes
/// a float. Arrays map to lists and objects to records.
impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Scalar(Scalar::Boolean(b)),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Scalar(Scalar::Integer(i)),
                None => Value::Scalar(Scalar::Float(n.as_f64().unwrap_or(f64::NAN))),
            },
            serde_json::Value::String(s) => Value::Scalar(Scalar::String(s)),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(fields) => Value::Record(
                fields
                    .into_iter()
                    .map(|(name, value)| (name, Value::from(value)))
                    .collect(),
            ),
        }
    }
}

/// Non-finite floats have no JSON representation and become `null`.
impl From<Value> for serde_json::Value {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => serde_json::Value::Null,
            Value::Scalar(Scalar::Boolean(b)) => serde_json::Value::Bool(b),
            Value::Scalar(Scalar::Integer(i)) => serde_json::Value::Number(i.into()),
            Value::Scalar(Scalar::Float(x)) => Number::from_f64(x)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Scalar(Scalar::String(s)) => serde_json::Value::String(s),
            Value::List(items) => {
                serde_json::Value::Array(items.into_iter().map(serde_json::Value::from).collect())
            }
            Value::Record(fields) => serde_json::Value::Object(
                fields
                    .into_iter()
                    .map(|(name, value)| (name, serde_json::Value::from(value)))
                    .collect::<Map<_, _>>(),
            ),
        }
    }
}
