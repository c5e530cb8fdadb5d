//! CRM records to Arrow
//!
//! The CRM sends almost every column as text, so exported columns are
//! nullable `Utf8`. A missing field is null; an empty string stays empty.

use crate::error::{Error, Result};
use crate::types::{value_text, Record};
use arrow::array::{Array, ArrayRef, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;

/// Schema of nullable text columns, in the given order
pub fn string_schema<S: AsRef<str>>(fields: &[S]) -> Schema {
    Schema::new(
        fields
            .iter()
            .map(|name| Field::new(name.as_ref(), DataType::Utf8, true))
            .collect::<Vec<_>>(),
    )
}

/// Field names across `records`, in order of first appearance
pub fn field_names(records: &[Record]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut names = Vec::new();
    for record in records {
        for name in record.keys() {
            if seen.insert(name.as_str()) {
                names.push(name.clone());
            }
        }
    }
    names
}

/// Build a batch of `records` shaped by `schema`
pub fn records_to_batch(schema: &Arc<Schema>, records: &[Record]) -> Result<RecordBatch> {
    if records.is_empty() {
        return Ok(RecordBatch::new_empty(Arc::clone(schema)));
    }

    let columns: Vec<ArrayRef> = schema
        .fields()
        .iter()
        .map(|field| {
            let values: StringArray = records
                .iter()
                .map(|record| match record.get(field.name()) {
                    None | Some(Value::Null) => None,
                    Some(v) => Some(value_text(v)),
                })
                .collect();
            Arc::new(values) as ArrayRef
        })
        .collect();

    RecordBatch::try_new(Arc::clone(schema), columns).map_err(|e| Error::Output {
        message: format!("Failed to create RecordBatch: {e}"),
    })
}

/// Turn a batch back into records. Nulls are left out.
pub fn batch_to_records(batch: &RecordBatch) -> Result<Vec<Record>> {
    let schema = batch.schema();
    let mut columns = Vec::with_capacity(batch.num_columns());
    for (i, field) in schema.fields().iter().enumerate() {
        let column = batch
            .column(i)
            .as_any()
            .downcast_ref::<StringArray>()
            .ok_or_else(|| Error::output(format!("column {} is not text", field.name())))?;
        columns.push((field.name().clone(), column));
    }

    Ok((0..batch.num_rows())
        .map(|row| {
            let mut record = Record::new();
            for (name, column) in &columns {
                if !column.is_null(row) {
                    record.insert(name.clone(), Value::String(column.value(row).to_string()));
                }
            }
            record
        })
        .collect())
}
