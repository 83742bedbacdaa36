use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Map, Value as JsonValue};

use crate::types::RowValues;

/// A row from a database query result
///
/// Column names and the name-to-index lookup are shared by every row of a result set.
#[derive(Debug, Clone)]
pub struct CustomDbRow {
    /// The column names for this row (shared across all rows in a result set)
    pub column_names: Arc<Vec<String>>,
    /// The values for this row
    pub rows: Vec<RowValues>,
    column_index_cache: Arc<HashMap<String, usize>>,
}

impl CustomDbRow {
    /// Create a new database row
    #[must_use]
    pub fn new(column_names: Arc<Vec<String>>, rows: Vec<RowValues>) -> Self {
        let cache = Arc::new(index_columns(&column_names));
        Self {
            column_names,
            rows,
            column_index_cache: cache,
        }
    }

    /// Get the index of a column by name
    #[must_use]
    pub fn get_column_index(&self, column_name: &str) -> Option<usize> {
        self.column_index_cache.get(column_name).copied()
    }

    /// Get a value from the row by column name
    #[must_use]
    pub fn get(&self, column_name: &str) -> Option<&RowValues> {
        self.get_column_index(column_name)
            .and_then(|idx| self.rows.get(idx))
    }

    /// Get a value from the row by column index
    #[must_use]
    pub fn get_by_index(&self, index: usize) -> Option<&RowValues> {
        self.rows.get(index)
    }

    #[must_use]
    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    /// The row as a JSON object keyed by column name.
    #[must_use]
    pub fn to_json(&self) -> JsonValue {
        let mut object = Map::with_capacity(self.rows.len());
        for (name, value) in self.column_names.iter().zip(&self.rows) {
            object.insert(name.clone(), value.to_json());
        }
        JsonValue::Object(object)
    }
}

fn index_columns(column_names: &[String]) -> HashMap<String, usize> {
    let mut cache = HashMap::with_capacity(column_names.len());
    for (i, name) in column_names.iter().enumerate() {
        // first occurrence wins for duplicated column names (e.g. joins)
        cache.entry(name.clone()).or_insert(i);
    }
    cache
}

/// Rows materialized by a driver's `all` call.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    /// The rows returned by the query
    pub results: Vec<CustomDbRow>,
    column_names: Option<Arc<Vec<String>>>,
    column_index_cache: Option<Arc<HashMap<String, usize>>>,
}

impl ResultSet {
    /// Create a result set whose rows will share `column_names`.
    #[must_use]
    pub fn with_columns(column_names: Vec<String>) -> ResultSet {
        let column_names = Arc::new(column_names);
        let cache = Arc::new(index_columns(&column_names));
        ResultSet {
            results: Vec::with_capacity(10),
            column_names: Some(column_names),
            column_index_cache: Some(cache),
        }
    }

    /// Get the column names for this result set
    #[must_use]
    pub fn get_column_names(&self) -> Option<&Arc<Vec<String>>> {
        self.column_names.as_ref()
    }

    /// Add a row to the result set
    pub fn add_row_values(&mut self, row_values: Vec<RowValues>) {
        if let (Some(column_names), Some(cache)) = (&self.column_names, &self.column_index_cache)
        {
            self.results.push(CustomDbRow {
                column_names: Arc::clone(column_names),
                rows: row_values,
                column_index_cache: Arc::clone(cache),
            });
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Rename aggregate columns reported as `COUNT(*)` / `count(*)` to `count`.
    ///
    /// Callers read `count` whatever capitalization the engine used for the expression.
    #[must_use]
    pub fn normalize_count_columns(self) -> ResultSet {
        let Some(columns) = &self.column_names else {
            return self;
        };
        if !columns.iter().any(|c| is_count_star(c)) {
            return self;
        }
        let renamed: Vec<String> = columns
            .iter()
            .map(|c| {
                if is_count_star(c) {
                    "count".to_string()
                } else {
                    c.clone()
                }
            })
            .collect();
        let mut normalized = ResultSet::with_columns(renamed);
        for row in self.results {
            normalized.add_row_values(row.rows);
        }
        normalized
    }
}

fn is_count_star(column: &str) -> bool {
    column == "COUNT(*)" || column == "count(*)"
}

/// The only result shape callers see, whatever backend served the statement.
#[derive(Debug, Clone, Default)]
pub struct QueryResult {
    /// Rows read (SELECT) or reported back by an emulated RETURNING clause. Never absent.
    pub rows: Vec<CustomDbRow>,
    /// Rows returned for SELECT, rows affected for writes.
    pub row_count: usize,
    /// Native row identifier of the last insert on the connection; `None` for SELECT.
    pub last_insert_rowid: Option<i64>,
}

impl QueryResult {
    #[must_use]
    pub fn from_select(result_set: ResultSet) -> Self {
        let rows = result_set.results;
        Self {
            row_count: rows.len(),
            rows,
            last_insert_rowid: None,
        }
    }

    #[must_use]
    pub fn from_write(rows: Vec<CustomDbRow>, changes: usize, last_insert_rowid: i64) -> Self {
        Self {
            rows,
            row_count: changes,
            last_insert_rowid: Some(last_insert_rowid),
        }
    }

    #[must_use]
    pub fn first(&self) -> Option<&CustomDbRow> {
        self.rows.first()
    }

    /// The rows as a JSON array of objects.
    #[must_use]
    pub fn to_json(&self) -> JsonValue {
        JsonValue::Array(self.rows.iter().map(CustomDbRow::to_json).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn result_set(columns: &[&str], rows: Vec<Vec<RowValues>>) -> ResultSet {
        let mut rs = ResultSet::with_columns(columns.iter().map(ToString::to_string).collect());
        for row in rows {
            rs.add_row_values(row);
        }
        rs
    }

    #[test]
    fn count_star_is_renamed() {
        let rs = result_set(&["COUNT(*)"], vec![vec![RowValues::Int(4)]]).normalize_count_columns();
        assert_eq!(rs.results[0].get("count"), Some(&RowValues::Int(4)));
        assert!(rs.results[0].get("COUNT(*)").is_none());

        let rs = result_set(
            &["etapa", "count(*)"],
            vec![vec![RowValues::Text("1".into()), RowValues::Int(2)]],
        )
        .normalize_count_columns();
        assert_eq!(rs.get_column_names().unwrap().as_slice(), ["etapa", "count"]);
        assert_eq!(rs.results[0].get("count"), Some(&RowValues::Int(2)));
    }

    #[test]
    fn other_aggregates_untouched() {
        let rs = result_set(&["Count(*)", "total"], vec![]).normalize_count_columns();
        assert_eq!(rs.get_column_names().unwrap().as_slice(), ["Count(*)", "total"]);
    }

    #[test]
    fn rows_render_as_json_objects() {
        let rs = result_set(
            &["id", "nome", "nota"],
            vec![vec![
                RowValues::Text("a1".into()),
                RowValues::Text("Ana".into()),
                RowValues::Float(9.5),
            ]],
        );
        let result = QueryResult::from_select(rs);
        assert_eq!(result.row_count, 1);
        assert_eq!(result.last_insert_rowid, None);
        assert_eq!(result.to_json(), json!([{"id": "a1", "nome": "Ana", "nota": 9.5}]));
    }

    #[test]
    fn write_result_keeps_rows_empty() {
        let result = QueryResult::from_write(Vec::new(), 3, 12);
        assert!(result.rows.is_empty());
        assert_eq!(result.row_count, 3);
        assert_eq!(result.last_insert_rowid, Some(12));
    }
}
