//! Nestripe error types

use crate::column_path::ColumnPath;
use crate::common::{DefinitionLevel, RepetitionLevel};
use crate::field::PrimitiveType;
use thiserror::Error;

/// Result type for [`Error`]
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Top-level error type. Each variant corresponds to one failure class and
/// carries enough context (column path, record index, field name) to
/// diagnose it.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("record {record} does not match the schema: {source}")]
    RecordMismatch {
        record: usize,
        #[source]
        source: RecordMismatchError,
    },

    #[error(transparent)]
    DataCorruption(#[from] DataCorruptionError),

    #[error(transparent)]
    ExhaustionMismatch(#[from] ExhaustionMismatchError),

    #[error("malformed json input: {0}")]
    Json(#[from] serde_json::Error),
}

/// A malformed schema. Detected when the schema is built, before any
/// record is striped or assembled.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SchemaError {
    #[error("schema `{schema}` declares no leaf columns")]
    EmptySchema { schema: String },

    #[error("duplicate field name `{name}` in {parent}")]
    DuplicateFieldName { name: String, parent: ColumnPath },

    #[error("record field {path} has no child fields")]
    EmptyRecord { path: ColumnPath },

    #[error("invalid field name `{name}` in {parent}")]
    InvalidFieldName { name: String, parent: ColumnPath },

    #[error("field {path} nests deeper than {} levels", u8::MAX)]
    LevelOverflow { path: ColumnPath },

    #[error("unknown kind `{kind}` for field {path}")]
    UnknownKind { kind: String, path: ColumnPath },

    #[error("unknown mode `{mode}` for field {path}")]
    UnknownMode { mode: String, path: ColumnPath },

    #[error("scalar field {path} declares child fields")]
    UnexpectedChildren { path: ColumnPath },
}

/// A value which does not conform to the schema. Only the record being
/// striped fails; rows are buffered per record so nothing is written.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RecordMismatchError {
    #[error("required field {path} is null or missing")]
    RequiredFieldMissing { path: ColumnPath },

    #[error("expected a record at {path}, found {found}")]
    ExpectedRecord { path: ColumnPath, found: &'static str },

    #[error("expected a list at repeated field {path}, found {found}")]
    ExpectedList { path: ColumnPath, found: &'static str },

    #[error("expected a {} scalar at {path}, found {found}", .expected.type_label())]
    ScalarTypeMismatch {
        path: ColumnPath,
        expected: PrimitiveType,
        found: &'static str,
    },

    #[error("list element {index} of repeated field {path} is null")]
    NullListElement { path: ColumnPath, index: usize },

    #[error("field {path} is not declared in the schema")]
    UndeclaredField { path: ColumnPath },
}

/// Column rows which contradict the schema or each other. Fatal for the
/// record being assembled.
#[derive(Error, Debug, PartialEq, Eq)]
#[error("corrupt column {path} at row {position} while assembling record {record}: {kind}")]
pub struct DataCorruptionError {
    pub path: ColumnPath,
    pub position: usize,
    pub record: usize,
    pub kind: Corruption,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum Corruption {
    #[error("repetition level {found} exceeds the column maximum {max}")]
    RepetitionLevelOutOfBounds {
        found: RepetitionLevel,
        max: RepetitionLevel,
    },

    #[error("definition level {found} exceeds the column maximum {max}")]
    DefinitionLevelOutOfBounds {
        found: DefinitionLevel,
        max: DefinitionLevel,
    },

    #[error("expected repetition level {expected}, found {found}")]
    UnexpectedRepetitionLevel {
        expected: RepetitionLevel,
        found: RepetitionLevel,
    },

    #[error("value presence disagrees with definition level {found} (maximum {max})")]
    ValueDefinitionMismatch {
        found: DefinitionLevel,
        max: DefinitionLevel,
    },

    #[error("repetition at level {level} continues a field which is not present")]
    RepeatsAbsentField { level: RepetitionLevel },

    #[error(
        "definition level {found} disagrees with the sibling columns about an enclosing \
         field defined at level {defined}"
    )]
    EnclosingFieldPresence {
        found: DefinitionLevel,
        defined: DefinitionLevel,
    },

    #[error("row continues the record at repetition level {found} after the record ended")]
    RunsPastRecordEnd { found: RepetitionLevel },

    #[error("column ended in the middle of a record")]
    Exhausted,
}

/// Columns which run out at different record boundaries.
#[derive(Error, Debug, PartialEq, Eq)]
#[error(
    "column {exhausted} is exhausted after {record} records but column {pending} \
     still has rows from position {position}"
)]
pub struct ExhaustionMismatchError {
    pub exhausted: ColumnPath,
    pub pending: ColumnPath,
    pub position: usize,
    pub record: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_mismatch_message() {
        let err = Error::RecordMismatch {
            record: 3,
            source: RecordMismatchError::RequiredFieldMissing {
                path: ColumnPath::from("names.languages.code"),
            },
        };

        assert_eq!(
            err.to_string(),
            "record 3 does not match the schema: required field names.languages.code is null or missing"
        );
    }

    #[test]
    fn test_corruption_message() {
        let err = DataCorruptionError {
            path: ColumnPath::from("links.forward"),
            position: 4,
            record: 1,
            kind: Corruption::Exhausted,
        };

        assert_eq!(
            err.to_string(),
            "corrupt column links.forward at row 4 while assembling record 1: \
             column ended in the middle of a record"
        );
    }
}
