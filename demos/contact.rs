use nestripe::schema::{optional_string, repeated_group, string};
use nestripe::{
    ColumnStore, InMemoryColumnStore, RecordAssembler, RecordWriter, SchemaBuilder, Value,
    ValueBuilder,
};

fn main() {
    let schema = SchemaBuilder::new("Contact")
        .field(string("name"))
        .field(repeated_group(
            "phones",
            vec![optional_string("number"), string("phone_type")],
        ))
        .build()
        .expect("contact schema is valid");

    let values: Vec<Value> = vec![
        // Alice: has a name and two phones
        ValueBuilder::default()
            .field("name", "Alice")
            .repeated(
                "phones",
                vec![
                    ValueBuilder::default()
                        .field("number", "555-1234")
                        .field("phone_type", "Home")
                        .build(),
                    ValueBuilder::default()
                        .field("number", "555-5678")
                        .field("phone_type", "Work")
                        .build(),
                ],
            )
            .build(),
        // Bob: has only a name
        ValueBuilder::default().field("name", "Bob").build(),
        // Charlie: has a name and an empty list of phones
        ValueBuilder::default()
            .field("name", "Charlie")
            .repeated("phones", Vec::<Value>::new())
            .build(),
        // Diana: has a name and one phone without a number
        ValueBuilder::default()
            .field("name", "Diana")
            .repeated(
                "phones",
                vec![ValueBuilder::default()
                    .field("phone_type", "Work")
                    .build()],
            )
            .build(),
        // Eve: has phones but no name, which the schema requires
        ValueBuilder::default()
            .repeated(
                "phones",
                vec![ValueBuilder::default()
                    .field("phone_type", "Mobile")
                    .build()],
            )
            .build(),
    ];

    let mut store = InMemoryColumnStore::new();
    let mut writer = RecordWriter::new(&schema, &mut store);
    for value in &values {
        if let Err(err) = writer.write(value) {
            println!("skipped: {err}");
        }
    }

    for column in schema.columns() {
        println!("--- {} ---", column.path());
        for row in store.read_sequence(column.path()) {
            println!("{row:?}");
        }
    }

    // Charlie's empty phone list comes back without a `phones` field
    for record in RecordAssembler::new(&schema, &store) {
        match record {
            Ok(record) => println!("{record}"),
            Err(err) => println!("error: {err}"),
        }
    }
}
