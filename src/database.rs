//! The query façade: one handle, chosen once at startup, that every caller shares.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::backend::Backend;
use crate::config::DatabaseConfig;
use crate::error::SqlCompatError;
use crate::identifier::with_generated_id;
use crate::results::QueryResult;
use crate::returning::{WriteStatement, execute_write};
use crate::translation::translate_statement;
use crate::types::{DatabaseType, RowValues, StatementKind};

#[cfg(feature = "libsql")]
use crate::config::RemoteOptions;
#[cfg(feature = "libsql")]
use crate::libsql::LibsqlDriver;
#[cfg(feature = "sqlite")]
use crate::sqlite::{SqliteDriver, SqliteOptions};

/// Handle to the active backend.
///
/// Cloning is cheap and every clone talks to the same backend. The handle holds no mutable
/// state, so it can be passed to as many concurrent tasks as needed.
#[derive(Clone)]
pub struct Database {
    backend: Arc<dyn Backend>,
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("database_type", &self.backend.database_type())
            .finish_non_exhaustive()
    }
}

impl Database {
    /// Connect to the backend `config` selects: remote when its settings are present,
    /// embedded otherwise.
    ///
    /// # Errors
    /// Returns `ConfigError` if the selected backend was compiled out, or the driver's
    /// connection error.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, SqlCompatError> {
        if let Some(remote) = &config.remote {
            tracing::info!(url = %remote.url, "using remote database");
            #[cfg(feature = "libsql")]
            {
                return Self::new_libsql_remote(remote.clone()).await;
            }
            #[cfg(not(feature = "libsql"))]
            {
                return Err(SqlCompatError::ConfigError(
                    "remote database settings are present but the `libsql` feature is disabled"
                        .to_string(),
                ));
            }
        }

        tracing::info!(path = %config.db_path, "using embedded database");
        #[cfg(feature = "sqlite")]
        {
            Self::new_sqlite(SqliteOptions::new(config.db_path.clone())).await
        }
        #[cfg(not(feature = "sqlite"))]
        {
            Err(SqlCompatError::ConfigError(
                "no remote database configured and the `sqlite` feature is disabled".to_string(),
            ))
        }
    }

    /// Open the embedded backend.
    ///
    /// # Errors
    /// Returns the driver's error if the database cannot be opened.
    #[cfg(feature = "sqlite")]
    pub async fn new_sqlite(opts: SqliteOptions) -> Result<Self, SqlCompatError> {
        let driver = SqliteDriver::open(opts).await?;
        Ok(Self::from_backend(Arc::new(driver)))
    }

    /// Connect to the remote backend.
    ///
    /// # Errors
    /// Returns `ConnectionError` if the client cannot reach the database.
    #[cfg(feature = "libsql")]
    pub async fn new_libsql_remote(opts: RemoteOptions) -> Result<Self, SqlCompatError> {
        let driver = LibsqlDriver::connect_remote(opts).await?;
        Ok(Self::from_backend(Arc::new(driver)))
    }

    /// Wrap an already constructed backend.
    #[must_use]
    pub fn from_backend(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    #[must_use]
    pub fn database_type(&self) -> DatabaseType {
        self.backend.database_type()
    }

    /// Execute one PostgreSQL-dialect statement and return the normalized result.
    ///
    /// `$N` placeholders are translated, an `id` is generated for INSERTs that omit one and a
    /// trailing `RETURNING` clause is emulated.
    ///
    /// # Errors
    /// Returns [`SqlCompatError::ReturningParse`] for a RETURNING statement that cannot be
    /// emulated, [`SqlCompatError::ParameterError`] for a multi-row INSERT that needs a generated
    /// id, or the backend's native error (constraint violations included).
    pub async fn query(
        &self,
        sql: &str,
        params: &[RowValues],
    ) -> Result<QueryResult, SqlCompatError> {
        let kind = StatementKind::classify(sql);
        let translated = translate_statement(sql, params);
        tracing::debug!(?kind, sql = %translated.sql, params = translated.params.len(), "query");

        match kind {
            StatementKind::Select => {
                let result_set = self
                    .backend
                    .all(&translated.sql, &translated.params)
                    .await?;
                Ok(QueryResult::from_select(result_set.normalize_count_columns()))
            }
            StatementKind::Insert => {
                let prepared = with_generated_id(&translated.sql, translated.params)?;
                execute_write(
                    self.backend.as_ref(),
                    WriteStatement {
                        kind,
                        original_sql: sql,
                        sql: &prepared.sql,
                        params: &prepared.params,
                        generated_id: prepared.generated_id.as_deref(),
                    },
                )
                .await
            }
            StatementKind::Update | StatementKind::Delete | StatementKind::Other => {
                execute_write(
                    self.backend.as_ref(),
                    WriteStatement {
                        kind,
                        original_sql: sql,
                        sql: &translated.sql,
                        params: &translated.params,
                        generated_id: None,
                    },
                )
                .await
            }
        }
    }

    /// Run a schema script as-is, without translation.
    ///
    /// # Errors
    /// Returns the backend's native error for the first failing statement.
    pub async fn exec(&self, sql: &str) -> Result<(), SqlCompatError> {
        tracing::debug!(bytes = sql.len(), "exec");
        self.backend.exec(sql).await
    }

    /// Run `body` as a logical unit of statements against this handle.
    ///
    /// See [`crate::transaction::with_transaction`].
    ///
    /// # Errors
    /// Returns the first error `body` produces, unchanged.
    pub async fn with_transaction<F, Fut, T, E>(&self, body: F) -> Result<T, E>
    where
        F: FnOnce(Database) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        crate::transaction::with_transaction(self, body).await
    }
}
