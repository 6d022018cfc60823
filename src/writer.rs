//! Commits striped records into a [`ColumnStore`].
//!
//! A record is striped into a [`StripedRecord`] buffer first and only then
//! appended to the store, so a record which does not match the schema leaves
//! no rows behind. Striping needs nothing but a shared [`Schema`], which lets
//! [`RecordWriter::write_parallel`] stripe on worker threads while commits
//! stay in submission order.

use crate::error::{Error, Result};
use crate::schema::Schema;
use crate::store::ColumnStore;
use crate::striper::{stripe, StripedRecord};
use crate::value::Value;
use std::thread;
use tracing::debug;

#[derive(Debug)]
pub struct RecordWriter<'a, S: ColumnStore + ?Sized> {
    schema: &'a Schema,
    store: &'a mut S,
    written: usize,
}

impl<'a, S: ColumnStore + ?Sized> RecordWriter<'a, S> {
    pub fn new(schema: &'a Schema, store: &'a mut S) -> Self {
        Self {
            schema,
            store,
            written: 0,
        }
    }

    /// Count of records committed by this writer.
    pub fn records_written(&self) -> usize {
        self.written
    }

    /// Stripes and commits one record.
    pub fn write(&mut self, value: &Value) -> Result<()> {
        let record = stripe(self.schema, value).map_err(|source| Error::RecordMismatch {
            record: self.written,
            source,
        })?;
        self.commit(record);
        Ok(())
    }

    /// Appends every row of an already striped record, column by column.
    pub fn commit(&mut self, record: StripedRecord) {
        let rows = record.row_count();
        for (column, rows) in self.schema.columns().iter().zip(record.into_columns()) {
            for row in rows {
                self.store.append_row(column.path(), row);
            }
        }

        debug!(record = self.written, rows, "committed record");
        self.written += 1;
    }

    /// Stripes `values` on up to `workers` scoped threads and commits them in
    /// input order.
    ///
    /// Commits stop at the first record which does not match the schema:
    /// every record before it is in the store, none after it.
    pub fn write_parallel(&mut self, values: &[Value], workers: usize) -> Result<()> {
        let schema = self.schema;
        let chunk_size = values.len().div_ceil(workers.max(1)).max(1);

        let striped = thread::scope(|scope| {
            let handles = values
                .chunks(chunk_size)
                .map(|chunk| {
                    scope.spawn(move || {
                        chunk
                            .iter()
                            .map(|value| stripe(schema, value))
                            .collect::<Vec<_>>()
                    })
                })
                .collect::<Vec<_>>();

            handles
                .into_iter()
                .flat_map(|handle| match handle.join() {
                    Ok(records) => records,
                    Err(panic) => std::panic::resume_unwind(panic),
                })
                .collect::<Vec<_>>()
        });

        for record in striped {
            let record = record.map_err(|source| Error::RecordMismatch {
                record: self.written,
                source,
            })?;
            self.commit(record);
        }
        Ok(())
    }
}
