//! Primary-key generation for INSERTs that omit an `id` column.
//!
//! Tables key rows by a textual `id` that `SQLite` will not fill in by itself, so the value is
//! generated here and written with the row.

use std::sync::LazyLock;

use regex::Regex;
use uuid::Uuid;

use crate::error::SqlCompatError;
use crate::types::RowValues;

static INSERT_COLUMNS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)^\s*INSERT\s+(?:OR\s+\w+\s+)?INTO\s+[\w.`\[\]]+\s*\(([^)]*)\)")
        .expect("valid INSERT column-list pattern")
});

static VALUES_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bVALUES\s*\(").expect("valid VALUES pattern"));

/// An INSERT after identifier injection.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedInsert {
    pub sql: String,
    pub params: Vec<RowValues>,
    /// The identifier bound as the new first parameter, when one was injected.
    pub generated_id: Option<String>,
}

/// A new random identifier: canonical lower-case UUID v4 text (36 characters).
#[must_use]
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

/// Inject a generated `id` into an INSERT whose column list lacks one.
///
/// `sql` is the already translated statement (`?` placeholders) and `params` its bound values.
/// The identifier is prepended to the column list, to the first `VALUES (...)` tuple and to
/// `params`. A trailing RETURNING clause is left in place. Statements with an `id` column, without
/// a column list, or without a `VALUES (` tuple come back unchanged.
///
/// Only single-row inserts get an id: one identifier cannot key several rows.
///
/// # Errors
///
/// Returns [`SqlCompatError::ParameterError`] for a multi-row `VALUES (...), (...)` insert that
/// omits `id`; such statements must list `id` and bind one per row.
pub fn with_generated_id(
    sql: &str,
    params: Vec<RowValues>,
) -> Result<PreparedInsert, SqlCompatError> {
    let unchanged = |params| {
        Ok(PreparedInsert {
            sql: sql.to_string(),
            params,
            generated_id: None,
        })
    };

    let Some(columns) = INSERT_COLUMNS.captures(sql).and_then(|caps| caps.get(1)) else {
        return unchanged(params);
    };
    if columns.as_str().trim().is_empty() || lists_id_column(columns.as_str()) {
        return unchanged(params);
    }
    let Some(values) = VALUES_OPEN.find_at(sql, columns.end()) else {
        return unchanged(params);
    };

    if has_second_tuple(sql, values.end()) {
        return Err(SqlCompatError::ParameterError(format!(
            "cannot generate an id for a multi-row INSERT; list `id` explicitly: `{sql}`"
        )));
    }

    let id = generate_id();
    let mut rewritten = String::with_capacity(sql.len() + 8);
    rewritten.push_str(&sql[..columns.start()]);
    rewritten.push_str("id, ");
    rewritten.push_str(&sql[columns.start()..values.end()]);
    rewritten.push_str("?, ");
    rewritten.push_str(&sql[values.end()..]);

    let mut with_id = Vec::with_capacity(params.len() + 1);
    with_id.push(RowValues::Text(id.clone()));
    with_id.extend(params);

    Ok(PreparedInsert {
        sql: rewritten,
        params: with_id,
        generated_id: Some(id),
    })
}

// `tuple_start` is just past the `(` of the first tuple. Quoted text inside the tuple is skipped.
fn has_second_tuple(sql: &str, tuple_start: usize) -> bool {
    let bytes = sql.as_bytes();
    let mut depth = 1_u32;
    let mut quoted = false;
    let mut idx = tuple_start;
    while idx < bytes.len() && depth > 0 {
        match bytes[idx] {
            b'\'' => quoted = !quoted,
            b'(' if !quoted => depth += 1,
            b')' if !quoted => depth -= 1,
            _ => {}
        }
        idx += 1;
    }
    sql[idx..].trim_start().starts_with(',')
}

fn lists_id_column(columns: &str) -> bool {
    columns.split(',').any(|column| {
        column
            .trim()
            .trim_matches(|c| matches!(c, '"' | '`' | '[' | ']'))
            .eq_ignore_ascii_case("id")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inject(sql: &str, params: Vec<RowValues>) -> PreparedInsert {
        with_generated_id(sql, params).unwrap()
    }

    fn is_uuid_v4(s: &str) -> bool {
        let re = Regex::new(r"^[0-9a-f]{8}-[0-9a-f]{4}-4[0-9a-f]{3}-[89ab][0-9a-f]{3}-[0-9a-f]{12}$")
            .unwrap();
        re.is_match(s)
    }

    #[test]
    fn injects_id_into_columns_values_and_params() {
        let out = inject(
            "INSERT INTO t (a, b) VALUES (?, ?)",
            vec![RowValues::Int(1), RowValues::Int(2)],
        );
        assert_eq!(out.sql, "INSERT INTO t (id, a, b) VALUES (?, ?, ?)");
        let id = out.generated_id.unwrap();
        assert_eq!(id.len(), 36);
        assert!(is_uuid_v4(&id), "{id}");
        assert_eq!(
            out.params,
            vec![RowValues::Text(id), RowValues::Int(1), RowValues::Int(2)]
        );
    }

    #[test]
    fn leaves_returning_in_place() {
        let out = inject(
            "INSERT INTO disciplinas (nome) VALUES (?) RETURNING *",
            vec![RowValues::from("Física")],
        );
        assert_eq!(
            out.sql,
            "INSERT INTO disciplinas (id, nome) VALUES (?, ?) RETURNING *"
        );
    }

    #[test]
    fn explicit_id_is_a_no_op() {
        let sql = "INSERT INTO t (id, nome) VALUES (?, ?)";
        let params = vec![RowValues::from("x"), RowValues::from("y")];
        let out = inject(sql, params.clone());
        assert_eq!(out.sql, sql);
        assert_eq!(out.params, params);
        assert!(out.generated_id.is_none());

        let out = inject("INSERT INTO t (nome, \"ID\") VALUES (?, ?)", params);
        assert!(out.generated_id.is_none());
    }

    #[test]
    fn column_named_like_id_still_gets_one() {
        let out = inject(
            "INSERT INTO questoes (gabarito_id, numero) VALUES (?, ?)",
            vec![RowValues::from("g"), RowValues::Int(1)],
        );
        assert!(out.generated_id.is_some());
        assert!(out.sql.starts_with("INSERT INTO questoes (id, gabarito_id, numero)"));
    }

    #[test]
    fn statements_without_tuple_are_untouched() {
        for sql in [
            "INSERT INTO t VALUES (?, ?)",
            "INSERT INTO t (a) SELECT a FROM u",
            "INSERT INTO t DEFAULT VALUES",
        ] {
            let out = inject(sql, vec![]);
            assert_eq!(out.sql, sql);
            assert!(out.generated_id.is_none());
        }
    }

    #[test]
    fn handles_conflict_clause_and_multiline() {
        let out = inject(
            "INSERT OR IGNORE INTO respostas\n  (aluno_id, questao_id)\nVALUES\n  (?, ?)",
            vec![RowValues::from("a"), RowValues::from("q")],
        );
        assert_eq!(
            out.sql,
            "INSERT OR IGNORE INTO respostas\n  (id, aluno_id, questao_id)\nVALUES\n  (?, ?, ?)"
        );
    }

    #[test]
    fn ids_are_unique() {
        assert_ne!(generate_id(), generate_id());
    }

    #[test]
    fn multi_row_insert_without_id_is_rejected() {
        let err = with_generated_id(
            "INSERT INTO turmas (nome) VALUES (?), (?)",
            vec![RowValues::from("1A"), RowValues::from("1B")],
        )
        .unwrap_err();
        assert!(matches!(err, SqlCompatError::ParameterError(_)));
        assert!(err.to_string().contains("multi-row"));

        // Parentheses and commas inside the first tuple do not count as a second row.
        let out = inject(
            "INSERT INTO turmas (nome, criado_em) VALUES ('a, (b)', datetime('now'))",
            vec![],
        );
        assert!(out.generated_id.is_some());

        let out = inject(
            "INSERT INTO turmas (id, nome) VALUES (?, ?), (?, ?)",
            vec![
                RowValues::from("t-1"),
                RowValues::from("1A"),
                RowValues::from("t-2"),
                RowValues::from("1B"),
            ],
        );
        assert!(out.generated_id.is_none());
    }
}
