//! PostgreSQL-dialect data access on top of `SQLite`.
//!
//! Application code keeps writing `$1` placeholders, `ILIKE`, `NOW()` and `RETURNING`; this
//! crate rewrites each statement for `SQLite`, generates text primary keys, emulates
//! `RETURNING` with follow-up reads and runs the result on either an embedded database file
//! or a remote `LibSQL` (Turso) server.
//!
//! ```rust,no_run
//! use sqlite_pg_compat::prelude::*;
//!
//! # async fn demo() -> Result<(), SqlCompatError> {
//! let db = Database::connect(&DatabaseConfig::from_env()).await?;
//! let created = db
//!     .query(
//!         "INSERT INTO alunos (nome_completo) VALUES ($1) RETURNING *",
//!         &[RowValues::from("Ana Souza")],
//!     )
//!     .await?;
//! let id = created.first().and_then(|row| row.get("id")).cloned();
//! # let _ = id;
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod config;
pub mod database;
pub mod error;
pub mod identifier;
pub mod prelude;
pub mod results;
pub mod returning;
pub mod transaction;
pub mod translation;
pub mod types;

#[cfg(feature = "libsql")]
pub mod libsql;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use backend::{Backend, RunOutcome};
pub use config::{DatabaseConfig, RemoteOptions};
pub use database::Database;
pub use error::{ConstraintViolation, SqlCompatError};
pub use results::{CustomDbRow, QueryResult, ResultSet};
pub use transaction::with_transaction;
pub use types::{DatabaseType, ParamConverter, RowValues, StatementKind};
