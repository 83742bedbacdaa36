use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use libsql::{Builder, Connection, Database};

use crate::backend::{Backend, RunOutcome};
use crate::config::RemoteOptions;
use crate::error::SqlCompatError;
use crate::results::ResultSet;
use crate::types::{DatabaseType, ParamConverter, RowValues};

use super::params::Params;
use super::query::build_result_set;

/// Remote backend: a libsql client talking to Turso over the network.
///
/// Every call opens its own connection, so the rowid reported by one call is never another
/// call's.
#[derive(Clone)]
pub struct LibsqlDriver {
    db: Arc<Database>,
    url: Arc<str>,
}

impl LibsqlDriver {
    /// Create a client for a remote database and check that a connection can be opened.
    ///
    /// # Errors
    /// Returns `SqlCompatError::ConnectionError` if the client cannot be built or connected.
    pub async fn connect_remote(opts: RemoteOptions) -> Result<Self, SqlCompatError> {
        let RemoteOptions { url, auth_token } = opts;
        let db = Builder::new_remote(url.clone(), auth_token)
            .build()
            .await
            .map_err(|e| {
                SqlCompatError::ConnectionError(format!(
                    "Failed to create remote libsql database: {e}"
                ))
            })?;
        db.connect().map_err(|e| {
            SqlCompatError::ConnectionError(format!("Failed to get libsql connection: {e}"))
        })?;
        tracing::info!(url = %url, "connected to remote libsql database");
        Ok(Self {
            db: Arc::new(db),
            url: Arc::from(url),
        })
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    fn connection(&self) -> Result<Connection, SqlCompatError> {
        Ok(self.db.connect()?)
    }
}

impl fmt::Debug for LibsqlDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LibsqlDriver")
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Backend for LibsqlDriver {
    fn database_type(&self) -> DatabaseType {
        DatabaseType::Libsql
    }

    async fn exec(&self, sql: &str) -> Result<(), SqlCompatError> {
        let conn = self.connection()?;
        conn.execute_batch(sql).await?;
        Ok(())
    }

    async fn run(&self, sql: &str, params: &[RowValues]) -> Result<RunOutcome, SqlCompatError> {
        let params = Params::convert_sql_params(params)?;
        let conn = self.connection()?;
        let affected = conn.execute(sql, params.into_vec()).await?;
        let changes = usize::try_from(affected).map_err(|e| {
            SqlCompatError::ExecutionError(format!("libsql affected rows conversion error: {e}"))
        })?;
        Ok(RunOutcome {
            changes,
            last_insert_rowid: conn.last_insert_rowid(),
        })
    }

    async fn all(&self, sql: &str, params: &[RowValues]) -> Result<ResultSet, SqlCompatError> {
        let params = Params::convert_sql_params(params)?;
        let conn = self.connection()?;
        let rows = conn.query(sql, params.into_vec()).await?;
        build_result_set(rows).await
    }
}
