use anyhow::{bail, Context};
use nestripe::json::schema_from_json;
use nestripe::{json, ColumnStore, InMemoryColumnStore, RecordAssembler, RecordWriter};
use std::env;
use std::fs;
use std::path::Path;
use tracing::info;

/// Stripes a JSON-lines record file into columns using a JSON schema, prints
/// the columns, then reassembles and prints the records.
///
/// ```text
/// nestripe <schema.json> <records.jsonl>
/// ```
fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = env::args().skip(1).collect::<Vec<_>>();
    let [schema_path, records_path] = args.as_slice() else {
        bail!("usage: nestripe <schema.json> <records.jsonl>");
    };

    let schema_name = Path::new(schema_path)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("schema");
    let schema_json = fs::read_to_string(schema_path)
        .with_context(|| format!("failed to read schema file {schema_path}"))?;
    let schema = schema_from_json(schema_name, &schema_json)
        .with_context(|| format!("invalid schema in {schema_path}"))?;
    println!("{schema}\n");

    let records = fs::read_to_string(records_path)
        .with_context(|| format!("failed to read records file {records_path}"))?;

    let mut store = InMemoryColumnStore::new();
    let mut writer = RecordWriter::new(&schema, &mut store);
    for (line_no, line) in records.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let value = json::parse_value(line)
            .with_context(|| format!("{records_path}:{}: malformed record", line_no + 1))?;
        writer
            .write(&value)
            .with_context(|| format!("{records_path}:{}", line_no + 1))?;
    }
    info!(records = writer.records_written(), "striped records");

    for column in schema.columns() {
        println!(
            "{} (max repetition {}, max definition {})",
            column.path(),
            column.max_repetition_level(),
            column.max_definition_level()
        );
        for row in store.read_sequence(column.path()) {
            let value = row
                .value()
                .map_or_else(|| "NULL".to_string(), ToString::to_string);
            println!(
                "  {value:<16} r={} d={}",
                row.repetition_level(),
                row.definition_level()
            );
        }
    }
    println!();

    let mut assembler = RecordAssembler::new(&schema, &store);
    for record in assembler.by_ref() {
        let record = serde_json::Value::from(record?);
        println!("{record}");
    }
    info!(records = assembler.records_assembled(), "assembled records");

    Ok(())
}
