use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::backend::{Backend, RunOutcome};
use crate::error::SqlCompatError;
use crate::results::ResultSet;
use crate::types::{DatabaseType, ParamConverter, RowValues};

use super::config::{SqliteOptions, open_connection};
use super::params::Params;
use super::query::build_result_set;

type SharedSqliteConnection = Arc<Mutex<rusqlite::Connection>>;

/// Embedded backend: one rusqlite connection, driven from tokio's blocking pool.
///
/// Statements execute one at a time in lock order; each call returns a future so call sites
/// await it exactly like the remote backend.
#[derive(Clone)]
pub struct SqliteDriver {
    conn: SharedSqliteConnection,
    db_path: Arc<str>,
}

impl SqliteDriver {
    /// Open the database described by `opts`.
    ///
    /// # Errors
    /// Returns `SqlCompatError` if the file (or its directory) cannot be created or opened.
    pub async fn open(opts: SqliteOptions) -> Result<Self, SqlCompatError> {
        let db_path: Arc<str> = Arc::from(opts.db_path.as_str());
        let conn = tokio::task::spawn_blocking(move || open_connection(&opts))
            .await
            .map_err(|e| {
                SqlCompatError::ConnectionError(format!("sqlite open join error: {e}"))
            })??;
        tracing::info!(path = %db_path, "opened embedded sqlite database");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            db_path,
        })
    }

    #[must_use]
    pub fn db_path(&self) -> &str {
        &self.db_path
    }

    /// Run synchronous `rusqlite` work on the shared connection, off the async runtime.
    ///
    /// # Errors
    /// Returns whatever `func` returns, or `ExecutionError` if the blocking task panics.
    pub async fn with_connection<F, R>(&self, func: F) -> Result<R, SqlCompatError>
    where
        F: FnOnce(&mut rusqlite::Connection) -> Result<R, SqlCompatError> + Send + 'static,
        R: Send + 'static,
    {
        run_blocking(Arc::clone(&self.conn), func).await
    }
}

impl fmt::Debug for SqliteDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteDriver")
            .field("db_path", &self.db_path)
            .finish_non_exhaustive()
    }
}

async fn run_blocking<F, R>(conn: SharedSqliteConnection, func: F) -> Result<R, SqlCompatError>
where
    F: FnOnce(&mut rusqlite::Connection) -> Result<R, SqlCompatError> + Send + 'static,
    R: Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let mut guard = conn.blocking_lock();
        func(&mut guard)
    })
    .await
    .map_err(|e| SqlCompatError::ExecutionError(format!("sqlite spawn_blocking join error: {e}")))?
}

#[async_trait]
impl Backend for SqliteDriver {
    fn database_type(&self) -> DatabaseType {
        DatabaseType::Sqlite
    }

    async fn exec(&self, sql: &str) -> Result<(), SqlCompatError> {
        let sql_owned = sql.to_owned();
        self.with_connection(move |conn| {
            conn.execute_batch(&sql_owned)?;
            Ok(())
        })
        .await
    }

    async fn run(&self, sql: &str, params: &[RowValues]) -> Result<RunOutcome, SqlCompatError> {
        let sql_owned = sql.to_owned();
        let params_owned = Params::convert_sql_params(params)?;
        self.with_connection(move |conn| {
            let changes = {
                let mut stmt = conn.prepare_cached(&sql_owned)?;
                stmt.execute(rusqlite::params_from_iter(params_owned.as_values().iter()))?
            };
            Ok(RunOutcome {
                changes,
                last_insert_rowid: conn.last_insert_rowid(),
            })
        })
        .await
    }

    async fn all(&self, sql: &str, params: &[RowValues]) -> Result<ResultSet, SqlCompatError> {
        let sql_owned = sql.to_owned();
        let params_owned = Params::convert_sql_params(params)?;
        self.with_connection(move |conn| {
            let mut stmt = conn.prepare_cached(&sql_owned)?;
            build_result_set(&mut stmt, params_owned.as_values())
        })
        .await
    }

    // Both statements run while the connection is held, so no other call interleaves.
    async fn read_then_run(
        &self,
        read_sql: &str,
        read_params: &[RowValues],
        write_sql: &str,
        write_params: &[RowValues],
    ) -> Result<(ResultSet, RunOutcome), SqlCompatError> {
        let read_sql = read_sql.to_owned();
        let read_params = Params::convert_sql_params(read_params)?;
        let write_sql = write_sql.to_owned();
        let write_params = Params::convert_sql_params(write_params)?;
        self.with_connection(move |conn| {
            let rows = {
                let mut stmt = conn.prepare_cached(&read_sql)?;
                build_result_set(&mut stmt, read_params.as_values())?
            };
            let changes = {
                let mut stmt = conn.prepare_cached(&write_sql)?;
                stmt.execute(rusqlite::params_from_iter(write_params.as_values().iter()))?
            };
            Ok((
                rows,
                RunOutcome {
                    changes,
                    last_insert_rowid: conn.last_insert_rowid(),
                },
            ))
        })
        .await
    }
}
