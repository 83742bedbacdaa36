//! RETURNING emulation.
//!
//! The embedded engine is never sent a RETURNING clause. The clause is detected on the caller's
//! original SQL, its column list is taken from the translated statement (so it is `SQLite`
//! dialect too), the clause is stripped, and the affected rows are fetched with a follow-up
//! SELECT instead:
//!
//! - INSERT: by the generated id (or first bound parameter) and the native rowid.
//! - UPDATE: with the statement's own WHERE clause after the write.
//! - DELETE: with the statement's own WHERE clause before the write, since afterwards the rows
//!   are gone. The embedded driver runs the read and the delete under one lock; on the remote
//!   driver they are two calls, and a row inserted in between is deleted but not reported.
//!
//! Follow-up plans are built before the write runs, so a statement that cannot be parsed fails
//! without side effects.

use std::sync::LazyLock;

use regex::Regex;

use crate::backend::{Backend, RunOutcome};
use crate::error::SqlCompatError;
use crate::results::QueryResult;
use crate::types::{RowValues, StatementKind};

static RETURNING_COLUMNS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)\bRETURNING\s+(.+?)\s*;?\s*$").expect("valid RETURNING pattern")
});

static RETURNING_TAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)\s*\bRETURNING\b.*$").expect("valid RETURNING tail"));

static INSERT_TABLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)^\s*INSERT\s+(?:OR\s+\w+\s+)?INTO\s+([\w.`\[\]]+)")
        .expect("valid INSERT table pattern")
});

static UPDATE_TABLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)^\s*UPDATE\s+(?:OR\s+\w+\s+)?([\w.`\[\]]+)")
        .expect("valid UPDATE table pattern")
});

static DELETE_TABLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)^\s*DELETE\s+FROM\s+([\w.`\[\]]+)").expect("valid DELETE table pattern")
});

static SET_CLAUSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)\bSET\s+(.+?)\s+WHERE\b").expect("valid SET pattern"));

static WHERE_CLAUSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)\bWHERE\s+(.+)$").expect("valid WHERE pattern"));

/// Column list of a RETURNING clause (`*` or `id, nome`), if the statement has one.
#[must_use]
pub fn returning_columns(sql: &str) -> Option<String> {
    RETURNING_COLUMNS
        .captures(sql)
        .map(|caps| caps[1].trim().to_string())
        .filter(|columns| !columns.is_empty())
}

/// The statement without its RETURNING clause.
#[must_use]
pub fn strip_returning(sql: &str) -> String {
    RETURNING_TAIL.replace(sql, "").trim().to_string()
}

/// A read that reports the rows a write touched.
#[derive(Debug, Clone, PartialEq)]
pub struct FollowUpQuery {
    pub sql: String,
    pub params: Vec<RowValues>,
}

/// Table targeted by an INSERT.
///
/// # Errors
///
/// Returns [`SqlCompatError::ReturningParse`] when no `INSERT INTO <table>` is found.
pub fn insert_table(sql: &str) -> Result<String, SqlCompatError> {
    capture(&INSERT_TABLE, sql).ok_or_else(|| SqlCompatError::returning_parse("table", sql))
}

/// Follow-up read for an INSERT, run after the write.
///
/// Rows match on `id` or on the native rowid. The `id` candidate is the generated identifier,
/// else the first bound parameter, else the native rowid itself.
#[must_use]
pub fn insert_follow_up(
    table: &str,
    columns: &str,
    generated_id: Option<&str>,
    params: &[RowValues],
    outcome: RunOutcome,
) -> FollowUpQuery {
    let rowid = RowValues::Int(outcome.last_insert_rowid);
    let id = generated_id
        .map(|id| RowValues::Text(id.to_string()))
        .or_else(|| params.first().cloned())
        .unwrap_or_else(|| rowid.clone());
    FollowUpQuery {
        sql: format!("SELECT {columns} FROM {table} WHERE id = ? OR rowid = ?"),
        params: vec![id, rowid],
    }
}

/// Follow-up read for an UPDATE, built from the statement with RETURNING already stripped.
///
/// SET placeholders precede WHERE placeholders, so the WHERE clause binds the trailing slice of
/// `params` whose length is the number of `?` inside it.
///
/// # Errors
///
/// Returns [`SqlCompatError::ReturningParse`] naming the missing table, SET or WHERE clause.
pub fn update_follow_up(
    stripped: &str,
    columns: &str,
    params: &[RowValues],
) -> Result<FollowUpQuery, SqlCompatError> {
    let table = capture(&UPDATE_TABLE, stripped)
        .ok_or_else(|| SqlCompatError::returning_parse("table", stripped))?;
    let set_clause = capture(&SET_CLAUSE, stripped)
        .ok_or_else(|| SqlCompatError::returning_parse("SET", stripped))?;
    let where_clause = where_clause(stripped)?;

    let set_count = count_placeholders(&set_clause);
    let where_count = count_placeholders(&where_clause);
    tracing::debug!(
        table = %table,
        set_placeholders = set_count,
        where_placeholders = where_count,
        "planned UPDATE RETURNING follow-up"
    );

    Ok(FollowUpQuery {
        sql: format!("SELECT {columns} FROM {table} WHERE {where_clause}"),
        params: trailing(params, where_count),
    })
}

/// Follow-up read for a DELETE, built from the statement with RETURNING already stripped.
///
/// Every bound parameter belongs to the WHERE clause.
///
/// # Errors
///
/// Returns [`SqlCompatError::ReturningParse`] naming the missing table or WHERE clause.
pub fn delete_follow_up(
    stripped: &str,
    columns: &str,
    params: &[RowValues],
) -> Result<FollowUpQuery, SqlCompatError> {
    let table = capture(&DELETE_TABLE, stripped)
        .ok_or_else(|| SqlCompatError::returning_parse("table", stripped))?;
    let where_clause = where_clause(stripped)?;
    let where_count = count_placeholders(&where_clause);

    Ok(FollowUpQuery {
        sql: format!("SELECT {columns} FROM {table} WHERE {where_clause}"),
        params: trailing(params, where_count),
    })
}

fn where_clause(stripped: &str) -> Result<String, SqlCompatError> {
    capture(&WHERE_CLAUSE, stripped)
        .map(|clause| clause.trim_end_matches(';').trim_end().to_string())
        .filter(|clause| !clause.is_empty())
        .ok_or_else(|| SqlCompatError::returning_parse("WHERE", stripped))
}

fn capture(pattern: &Regex, sql: &str) -> Option<String> {
    pattern
        .captures(sql)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
}

// Counts every `?`, including one inside a string literal.
fn count_placeholders(clause: &str) -> usize {
    clause.matches('?').count()
}

fn trailing(params: &[RowValues], count: usize) -> Vec<RowValues> {
    params[params.len().saturating_sub(count)..].to_vec()
}

/// A translated write on its way to the backend.
#[derive(Debug, Clone)]
pub struct WriteStatement<'a> {
    pub kind: StatementKind,
    /// The caller's SQL, before translation.
    pub original_sql: &'a str,
    /// Translated SQL, possibly still carrying its RETURNING clause.
    pub sql: &'a str,
    pub params: &'a [RowValues],
    pub generated_id: Option<&'a str>,
}

/// Execute a write and produce the normalized result, emulating RETURNING when present.
///
/// # Errors
///
/// Returns [`SqlCompatError::ReturningParse`] for a RETURNING statement whose clauses cannot be
/// located, or the backend's native error.
pub async fn execute_write(
    backend: &dyn Backend,
    stmt: WriteStatement<'_>,
) -> Result<QueryResult, SqlCompatError> {
    if returning_columns(stmt.original_sql).is_none() {
        let outcome = backend.run(stmt.sql, stmt.params).await?;
        return Ok(QueryResult::from_write(
            Vec::new(),
            outcome.changes,
            outcome.last_insert_rowid,
        ));
    }
    // The column list may call NOW() or TO_CHAR too, so it is read from the translated text.
    let columns = returning_columns(stmt.sql)
        .ok_or_else(|| SqlCompatError::returning_parse("RETURNING", stmt.sql))?;

    let stripped = strip_returning(stmt.sql);
    match stmt.kind {
        StatementKind::Insert => {
            let table = insert_table(&stripped)?;
            let outcome = backend.run(&stripped, stmt.params).await?;
            if outcome.changes == 0 {
                return Ok(QueryResult::from_write(Vec::new(), 0, outcome.last_insert_rowid));
            }
            let follow_up =
                insert_follow_up(&table, &columns, stmt.generated_id, stmt.params, outcome);
            tracing::debug!(sql = %follow_up.sql, "RETURNING follow-up after INSERT");
            let rows = backend.all(&follow_up.sql, &follow_up.params).await?;
            Ok(QueryResult::from_write(
                rows.results,
                outcome.changes,
                outcome.last_insert_rowid,
            ))
        }
        StatementKind::Update => {
            let follow_up = update_follow_up(&stripped, &columns, stmt.params)?;
            let outcome = backend.run(&stripped, stmt.params).await?;
            if outcome.changes == 0 {
                return Ok(QueryResult::from_write(Vec::new(), 0, outcome.last_insert_rowid));
            }
            tracing::debug!(sql = %follow_up.sql, "RETURNING follow-up after UPDATE");
            let rows = backend.all(&follow_up.sql, &follow_up.params).await?;
            Ok(QueryResult::from_write(
                rows.results,
                outcome.changes,
                outcome.last_insert_rowid,
            ))
        }
        StatementKind::Delete => {
            let follow_up = delete_follow_up(&stripped, &columns, stmt.params)?;
            tracing::debug!(sql = %follow_up.sql, "RETURNING read before DELETE");
            let (doomed, outcome) = backend
                .read_then_run(&follow_up.sql, &follow_up.params, &stripped, stmt.params)
                .await?;
            let rows = if outcome.changes == 0 {
                Vec::new()
            } else {
                doomed.results
            };
            Ok(QueryResult::from_write(
                rows,
                outcome.changes,
                outcome.last_insert_rowid,
            ))
        }
        StatementKind::Select | StatementKind::Other => {
            Err(SqlCompatError::returning_parse("INSERT/UPDATE/DELETE", stmt.sql))
        }
    }
}
