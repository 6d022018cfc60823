use nestripe::schema::{
    integer, optional_group, optional_string, repeated_group, repeated_integer, string,
};
use nestripe::{
    ColumnStore, InMemoryColumnStore, RecordAssembler, RecordWriter, SchemaBuilder,
    TransitionTable, ValueBuilder,
};

/// # Schema
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
fn main() {
    let schema = SchemaBuilder::new("Document")
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
        .expect("document schema is valid");

    let language = |code: &str, country: Option<&str>| {
        let builder = ValueBuilder::new().field("code", code);
        match country {
            Some(country) => builder.field("country", country),
            None => builder,
        }
        .build()
    };

    let r1 = ValueBuilder::new()
        .field("doc_id", 10)
        .field(
            "links",
            ValueBuilder::new().repeated("forward", vec![20, 40, 60]).build(),
        )
        .repeated(
            "names",
            vec![
                ValueBuilder::new() // 0
                    .repeated(
                        "languages",
                        vec![language("en-us", Some("us")), language("en", None)],
                    )
                    .field("url", "http://A")
                    .build(),
                ValueBuilder::new().field("url", "http://B").build(), // 1
                ValueBuilder::new() // 2
                    .repeated("languages", vec![language("en-gb", Some("gb"))])
                    .build(),
            ],
        )
        .build();

    let r2 = ValueBuilder::new()
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
        .build();

    println!("{schema}\n");

    let mut store = InMemoryColumnStore::new();
    let mut writer = RecordWriter::new(&schema, &mut store);
    for record in [&r1, &r2] {
        writer.write(record).expect("record matches the schema");
    }

    for column in schema.columns() {
        println!("--- {} ---", column.path());
        for row in store.read_sequence(column.path()) {
            println!("{row:?}");
        }
    }

    println!("\n{}", TransitionTable::new(&schema));

    for record in RecordAssembler::new(&schema, &store) {
        println!("{}", record.expect("columns are consistent"));
    }
}
