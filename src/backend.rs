//! Capability set every backend driver provides.

use async_trait::async_trait;

use crate::error::SqlCompatError;
use crate::results::ResultSet;
use crate::types::{DatabaseType, RowValues};

/// Outcome of a write executed through [`Backend::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunOutcome {
    /// Rows changed by the statement.
    pub changes: usize,
    /// Native row identifier of the most recent successful insert on the connection.
    pub last_insert_rowid: i64,
}

/// A low-level executor for SQLite-dialect SQL with `?` placeholders.
///
/// Implementations must be thread-safe (`Send + Sync`) so one handle can serve concurrent
/// callers. Statements reach a backend already translated; drivers do no rewriting of their own.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Which engine this driver talks to.
    fn database_type(&self) -> DatabaseType;

    /// Execute one or more statements without parameters (schema scripts).
    ///
    /// # Errors
    ///
    /// Returns the driver's native error if any statement fails.
    async fn exec(&self, sql: &str) -> Result<(), SqlCompatError>;

    /// Execute a single write statement.
    ///
    /// # Errors
    ///
    /// Returns the driver's native error, including constraint violations and binding failures.
    async fn run(&self, sql: &str, params: &[RowValues]) -> Result<RunOutcome, SqlCompatError>;

    /// Execute a query and materialize every row.
    ///
    /// # Errors
    ///
    /// Returns the driver's native error if preparing or stepping the statement fails.
    async fn all(&self, sql: &str, params: &[RowValues]) -> Result<ResultSet, SqlCompatError>;

    /// Read rows, then execute a write, as one step where the driver can provide it.
    ///
    /// Used to report the rows a DELETE removes. The default issues [`Backend::all`] then
    /// [`Backend::run`]; a concurrent write may land between the two.
    ///
    /// # Errors
    ///
    /// Returns the driver's native error from either statement. The write is not attempted if the
    /// read fails.
    async fn read_then_run(
        &self,
        read_sql: &str,
        read_params: &[RowValues],
        write_sql: &str,
        write_params: &[RowValues],
    ) -> Result<(ResultSet, RunOutcome), SqlCompatError> {
        let rows = self.all(read_sql, read_params).await?;
        let outcome = self.run(write_sql, write_params).await?;
        Ok((rows, outcome))
    }
}
