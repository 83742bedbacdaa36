//! Logical grouping of statements.
//!
//! Statements inside a scope are applied as they run; nothing is bracketed with
//! `BEGIN`/`COMMIT`. The scope stops at the first error and hands it back, leaving the
//! statements that already succeeded in place. Callers that need all-or-nothing writes must
//! not rely on it.

use std::fmt;
use std::future::Future;

use crate::database::Database;

/// Run `body` with a handle to `db` and return its result.
///
/// The body's first error is propagated as-is and never retried.
///
/// ```rust,no_run
/// # async fn demo(db: sqlite_pg_compat::Database) -> Result<(), sqlite_pg_compat::SqlCompatError> {
/// use sqlite_pg_compat::{RowValues, with_transaction};
///
/// with_transaction(&db, |db| async move {
///     db.query("DELETE FROM notas WHERE aluno_id = $1", &[RowValues::from("a1")]).await?;
///     db.query("DELETE FROM alunos WHERE id = $1", &[RowValues::from("a1")]).await?;
///     Ok::<_, sqlite_pg_compat::SqlCompatError>(())
/// })
/// .await
/// # }
/// ```
///
/// # Errors
/// Returns the first error `body` produces, unchanged.
pub async fn with_transaction<F, Fut, T, E>(db: &Database, body: F) -> Result<T, E>
where
    F: FnOnce(Database) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: fmt::Display,
{
    match body(db.clone()).await {
        Ok(value) => Ok(value),
        Err(err) => {
            tracing::warn!(error = %err, "transaction scope failed; earlier statements stay applied");
            Err(err)
        }
    }
}
