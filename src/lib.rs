//! A library which implements column striping of nested records by encoding
//! definition and repetition levels for each value, and the assembly of the
//! original records back from those columns. The definition and repetition
//! levels preserve the structural hierarchy of the encoded records, so no
//! parent or child pointers are stored.
//!
//! # Design
//! The technique for column striping and record assembly is described in the
//! paper:
//! [Dremel: Interactive Analysis of Web-Scale Datasets](https://static.googleusercontent.com/media/research.google.com/en//pubs/archive/36632.pdf).
//!
//! A [`Schema`] is compiled once and shared by reference. [`stripe`] turns
//! one [`Value`] into a [`StripedRecord`], a [`RecordWriter`] commits striped
//! records to a [`ColumnStore`], and a [`RecordAssembler`] reads the columns
//! back into records by walking a [`TransitionTable`].

#![warn(missing_debug_implementations)]

pub mod assembler;
pub mod column_path;
pub mod common;
pub mod error;
pub mod field;
pub mod json;
pub mod schema;
mod schema_iter;
pub mod store;
pub mod striper;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod transition;
pub mod value;
pub mod writer;

pub use self::assembler::RecordAssembler;
pub use self::column_path::ColumnPath;
pub use self::error::{Error, Result};
pub use self::schema::{Schema, SchemaBuilder};
pub use self::store::{ColumnStore, InMemoryColumnStore};
pub use self::striper::{stripe, StripeRow, StripedRecord};
pub use self::transition::TransitionTable;
pub use self::value::{Scalar, Value, ValueBuilder};
pub use self::writer::RecordWriter;
