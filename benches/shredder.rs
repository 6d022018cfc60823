use criterion::{black_box, criterion_group, criterion_main, Criterion};
use nestripe::schema::{bool, integer, optional_string, repeated_group, string};
use nestripe::test_utils::{document_records, document_schema};
use nestripe::{
    stripe, InMemoryColumnStore, RecordAssembler, RecordWriter, Schema, SchemaBuilder, Value,
    ValueBuilder,
};

fn setup_flat_schema() -> (Schema, Value) {
    let schema = SchemaBuilder::new("flat")
        .field(string("name"))
        .field(integer("id"))
        .field(bool("active"))
        .build()
        .unwrap();

    let value = ValueBuilder::default()
        .field("name", "User")
        .field("id", 12345)
        .field("active", true)
        .build();

    (schema, value)
}

fn benchmark_flat_schema(c: &mut Criterion) {
    let (schema, value) = setup_flat_schema();

    c.bench_function("flat_schema_stripe", |b| {
        b.iter(|| black_box(stripe(black_box(&schema), black_box(&value))))
    });
}

fn setup_nested_schema() -> (Schema, Vec<Value>) {
    let schema = SchemaBuilder::new("Contact")
        .field(optional_string("name"))
        .field(repeated_group(
            "phones",
            vec![optional_string("number"), optional_string("phone_type")],
        ))
        .build()
        .unwrap();

    let phone = |number: Option<&str>, phone_type: &str| {
        let builder = ValueBuilder::default().field("phone_type", phone_type);
        match number {
            Some(number) => builder.field("number", number),
            None => builder,
        }
        .build()
    };

    let values: Vec<Value> = vec![
        // Alice: has a name and two phones
        ValueBuilder::default()
            .field("name", "Alice")
            .repeated(
                "phones",
                vec![
                    phone(Some("555-1234"), "Home"),
                    phone(Some("555-5678"), "Work"),
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
        // _: has a phone but no name
        ValueBuilder::default()
            .repeated("phones", vec![phone(None, "Mobile")])
            .build(),
    ];

    (schema, values)
}

fn benchmark_nested_schema(c: &mut Criterion) {
    let (schema, values) = setup_nested_schema();

    c.bench_function("nested_schema_stripe", |b| {
        b.iter(|| {
            for value in values.iter() {
                let _ = black_box(stripe(black_box(&schema), black_box(value)));
            }
        })
    });
}

fn striped_document(copies: usize) -> (Schema, InMemoryColumnStore) {
    let schema = document_schema();
    let mut store = InMemoryColumnStore::new();
    let mut writer = RecordWriter::new(&schema, &mut store);
    for _ in 0..copies {
        for record in document_records() {
            writer.write(&record).unwrap();
        }
    }
    (schema, store)
}

fn benchmark_document_write(c: &mut Criterion) {
    let schema = document_schema();
    let records = document_records();

    c.bench_function("document_write", |b| {
        b.iter(|| {
            let mut store = InMemoryColumnStore::new();
            let mut writer = RecordWriter::new(&schema, &mut store);
            for record in records.iter() {
                writer.write(black_box(record)).unwrap();
            }
            black_box(store)
        })
    });
}

fn benchmark_document_assemble(c: &mut Criterion) {
    let (schema, store) = striped_document(100);

    c.bench_function("document_assemble", |b| {
        b.iter(|| {
            for record in RecordAssembler::new(black_box(&schema), black_box(&store)) {
                let _ = black_box(record);
            }
        })
    });
}

criterion_group!(
    benchmark_shredder,
    benchmark_flat_schema,
    benchmark_nested_schema,
    benchmark_document_write,
    benchmark_document_assemble
);
criterion_main!(benchmark_shredder);
