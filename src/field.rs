//! Defines the building blocks for declaring schemas: [`Field`], [`Kind`],
//! [`Mode`] and [`PrimitiveType`].

use std::fmt::{self, Formatter, Write};

/// Physical type of a leaf field.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum PrimitiveType {
    /// Boolean type (true/false)
    Boolean,
    /// Signed 64-bit integer
    Integer,
    /// 64-bit floating point
    Float,
    /// String type (UTF-8)
    String,
}

impl PrimitiveType {
    /// Returns a string label representing the variant of this [`PrimitiveType`].
    pub fn type_label(&self) -> &'static str {
        match self {
            PrimitiveType::Boolean => "bool",
            PrimitiveType::Integer => "int64",
            PrimitiveType::Float => "double",
            PrimitiveType::String => "string",
        }
    }
}

/// Either a leaf carrying a primitive value, or a nested group of named
/// fields.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Kind {
    Scalar(PrimitiveType),
    /// A nested structure (group/record) containing named fields.
    Record(Vec<Field>),
}

impl Kind {
    pub fn is_record(&self) -> bool {
        matches!(self, Kind::Record(_))
    }

    /// Child fields of a record, empty for a scalar.
    pub fn children(&self) -> &[Field] {
        match self {
            Kind::Record(fields) => fields,
            Kind::Scalar(_) => &[],
        }
    }
}

/// Cardinality of a field within its parent.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum Mode {
    /// Exactly one occurrence.
    Required,
    /// Zero or one occurrence.
    Optional,
    /// Zero or more occurrences, in order.
    Repeated,
}

impl Mode {
    /// Optional and repeated fields each contribute one definition level.
    pub fn is_defined_level(&self) -> bool {
        !matches!(self, Mode::Required)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Mode::Required => "required",
            Mode::Optional => "optional",
            Mode::Repeated => "repeated",
        }
    }
}

/// Represents a named schema element, its kind and its cardinality.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Field {
    name: String,
    kind: Kind,
    mode: Mode,
}

impl Field {
    /// Creates a field definition.
    ///
    /// # Parameters
    /// * `name` - Name of the field, unique among its siblings.
    /// * `kind` - The [`Kind`] of the field.
    /// * `mode` - Whether the field is required, optional or repeated.
    pub fn new(name: impl Into<String>, kind: Kind, mode: Mode) -> Self {
        Field {
            name: name.into(),
            kind,
            mode,
        }
    }

    /// Returns the name of the field.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &Kind {
        &self.kind
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Child fields of a record field, empty for scalars.
    pub fn children(&self) -> &[Field] {
        self.kind.children()
    }

    pub fn is_required(&self) -> bool {
        self.mode == Mode::Required
    }

    /// Checks if a field is either optional or repeated.
    pub fn is_optional(&self) -> bool {
        self.mode.is_defined_level()
    }

    pub fn is_repeated(&self) -> bool {
        self.mode == Mode::Repeated
    }

    pub(crate) fn fmt_with_indent(&self, f: &mut Formatter<'_>, indent: usize) -> fmt::Result {
        write!(f, "{:indent$}{} ", "", self.mode.label(), indent = indent)?;
        match &self.kind {
            Kind::Scalar(primitive) => write!(f, "{} {};", primitive.type_label(), self.name),
            Kind::Record(fields) => {
                writeln!(f, "group {} {{", self.name)?;
                for field in fields {
                    field.fmt_with_indent(f, indent + 2)?;
                    writeln!(f)?;
                }
                write!(f, "{:indent$}}}", "", indent = indent)
            }
        }
    }
}

/// Renders the field in the message syntax of the Dremel paper.
impl fmt::Display for Field {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.fmt_with_indent(f, 0)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Kind::Scalar(primitive) => write!(f, "{}", primitive.type_label()),
            Kind::Record(fields) => {
                let mut buf = String::new();
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        buf.write_str(", ")?;
                    }
                    buf.write_str(field.name())?;
                }
                write!(f, "group {{ {buf} }}")
            }
        }
    }
}
