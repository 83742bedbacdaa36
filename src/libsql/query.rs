use libsql::{Row, Rows, Value};

use crate::error::SqlCompatError;
use crate::results::ResultSet;
use crate::types::RowValues;

/// Build a result set from a libsql query execution
///
/// Cells keep their storage class, matching what the embedded backend returns.
///
/// # Errors
/// Returns the native libsql error if a row cannot be fetched or read.
pub async fn build_result_set(mut rows: Rows) -> Result<ResultSet, SqlCompatError> {
    let column_count = rows.column_count();
    let width = usize::try_from(column_count)
        .map_err(|e| SqlCompatError::ExecutionError(format!("Invalid column count: {e}")))?;
    let mut column_names = Vec::with_capacity(width);
    for i in 0..column_count {
        match rows.column_name(i) {
            Some(name) => column_names.push(name.to_string()),
            None => column_names.push(format!("column_{i}")),
        }
    }

    let mut result_set = ResultSet::with_columns(column_names);
    while let Some(row) = rows.next().await? {
        let mut row_values = Vec::with_capacity(width);
        for i in 0..column_count {
            row_values.push(libsql_extract_value(&row, i)?);
        }
        result_set.add_row_values(row_values);
    }

    Ok(result_set)
}

/// Extract a `RowValues` from a libsql row at the given index
fn libsql_extract_value(row: &Row, idx: i32) -> Result<RowValues, SqlCompatError> {
    Ok(match row.get_value(idx)? {
        Value::Null => RowValues::Null,
        Value::Integer(i) => RowValues::Int(i),
        Value::Real(f) => RowValues::Float(f),
        Value::Text(s) => RowValues::Text(s),
        Value::Blob(bytes) => RowValues::Blob(bytes),
    })
}
