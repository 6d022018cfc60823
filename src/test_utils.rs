//! Fixtures shared by unit tests, integration tests and benches.
//!
//! The document schema and the two sample records from the paper
//! [Dremel: Interactive Analysis of Web-Scale Datasets](https://static.googleusercontent.com/media/research.google.com/en//pubs/archive/36632.pdf).

use crate::schema::{
    integer, optional_group, optional_string, repeated_group, repeated_integer, string, Schema,
    SchemaBuilder,
};
use crate::value::{Value, ValueBuilder};

/// ```text
/// message Document {
///   required int64 doc_id;
///   optional group links {
///     repeated int64 backward;
///     repeated int64 forward;
///   }
///   repeated group names {
///     repeated group languages {
///       required string code;
///       optional string country;
///     }
///     optional string url;
///   }
/// }
/// ```
pub fn document_schema() -> Schema {
    SchemaBuilder::new("Document")
        .field(integer("doc_id"))
        .field(optional_group(
            "links",
            vec![repeated_integer("backward"), repeated_integer("forward")],
        ))
        .field(repeated_group(
            "names",
            vec![
                repeated_group("languages", vec![string("code"), optional_string("country")]),
                optional_string("url"),
            ],
        ))
        .build()
        .expect("document schema is valid")
}

/// The same schema in the JSON descriptor format.
pub const DOCUMENT_SCHEMA_JSON: &str = r#"[
  { "name": "doc_id", "kind": "int", "mode": "required" },
  { "name": "links", "kind": "record", "mode": "optional", "fields": [
    { "name": "backward", "kind": "int", "mode": "repeated" },
    { "name": "forward", "kind": "int", "mode": "repeated" }
  ]},
  { "name": "names", "kind": "record", "mode": "repeated", "fields": [
    { "name": "languages", "kind": "record", "mode": "repeated", "fields": [
      { "name": "code", "kind": "string", "mode": "required" },
      { "name": "country", "kind": "string", "mode": "optional" }
    ]},
    { "name": "url", "kind": "string", "mode": "optional" }
  ]}
]"#;

fn language(code: &str, country: Option<&str>) -> Value {
    let builder = ValueBuilder::new().field("code", code);
    match country {
        Some(country) => builder.field("country", country),
        None => builder,
    }
    .build()
}

/// Record `r1` of the paper.
pub fn document_r1() -> Value {
    ValueBuilder::new()
        .field("doc_id", 10)
        .field(
            "links",
            ValueBuilder::new()
                .repeated("forward", vec![20, 40, 60])
                .build(),
        )
        .repeated(
            "names",
            vec![
                ValueBuilder::new()
                    .repeated(
                        "languages",
                        vec![language("en-us", Some("us")), language("en", None)],
                    )
                    .field("url", "http://A")
                    .build(),
                ValueBuilder::new().field("url", "http://B").build(),
                ValueBuilder::new()
                    .repeated("languages", vec![language("en-gb", Some("gb"))])
                    .build(),
            ],
        )
        .build()
}

/// Record `r2` of the paper.
pub fn document_r2() -> Value {
    ValueBuilder::new()
        .field("doc_id", 20)
        .field(
            "links",
            ValueBuilder::new()
                .repeated("backward", vec![10, 30])
                .repeated("forward", vec![80])
                .build(),
        )
        .repeated(
            "names",
            vec![ValueBuilder::new().field("url", "http://C").build()],
        )
        .build()
}

pub fn document_records() -> Vec<Value> {
    vec![document_r1(), document_r2()]
}
