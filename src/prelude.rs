//! Convenient imports for common functionality.
//!
//! This module re-exports the most commonly used types and functions
//! to make it easier to get started with the library.

pub use crate::backend::{Backend, RunOutcome};
pub use crate::config::{DatabaseConfig, RemoteOptions};
pub use crate::database::Database;
pub use crate::error::{ConstraintViolation, SqlCompatError};
pub use crate::results::{CustomDbRow, QueryResult, ResultSet};
pub use crate::transaction::with_transaction;
pub use crate::translation::{reorder_params, translate, translate_statement};
pub use crate::types::{DatabaseType, RowValues, StatementKind};

#[cfg(feature = "sqlite")]
pub use crate::sqlite::{SqliteDriver, SqliteOptions, SqliteOptionsBuilder};

#[cfg(feature = "libsql")]
pub use crate::libsql::LibsqlDriver;
