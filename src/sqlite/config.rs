use std::path::Path;

use crate::error::SqlCompatError;

/// Options for opening the embedded `SQLite` database.
#[derive(Debug, Clone)]
pub struct SqliteOptions {
    pub db_path: String,
    /// `PRAGMA foreign_keys = ON` for the connection.
    pub foreign_keys: bool,
    /// `PRAGMA journal_mode = WAL` for the connection.
    pub wal: bool,
}

impl SqliteOptions {
    #[must_use]
    pub fn new(db_path: String) -> Self {
        Self {
            db_path,
            foreign_keys: true,
            wal: true,
        }
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(":memory:".to_string())
    }

    fn is_file_backed(&self) -> bool {
        !(self.db_path.is_empty() || self.db_path == ":memory:" || self.db_path.starts_with("file:"))
    }
}

/// Fluent builder for `SQLite` options.
#[derive(Debug, Clone)]
pub struct SqliteOptionsBuilder {
    opts: SqliteOptions,
}

impl SqliteOptionsBuilder {
    #[must_use]
    pub fn new(db_path: String) -> Self {
        Self {
            opts: SqliteOptions::new(db_path),
        }
    }

    #[must_use]
    pub fn foreign_keys(mut self, enabled: bool) -> Self {
        self.opts.foreign_keys = enabled;
        self
    }

    #[must_use]
    pub fn wal(mut self, enabled: bool) -> Self {
        self.opts.wal = enabled;
        self
    }

    #[must_use]
    pub fn finish(self) -> SqliteOptions {
        self.opts
    }
}

/// Open a connection and apply the configured pragmas.
///
/// The parent directory of a database file is created when missing.
///
/// # Errors
/// Returns `SqlCompatError::Io` if the directory cannot be created, or the native `SQLite` error if
/// the file cannot be opened or a pragma fails.
pub(crate) fn open_connection(opts: &SqliteOptions) -> Result<rusqlite::Connection, SqlCompatError> {
    if opts.is_file_backed() {
        if let Some(dir) = Path::new(&opts.db_path).parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                std::fs::create_dir_all(dir)?;
            }
        }
    }

    let conn = rusqlite::Connection::open(&opts.db_path)?;
    if opts.foreign_keys {
        conn.pragma_update(None, "foreign_keys", "ON")?;
    }
    if opts.wal && opts.is_file_backed() {
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        tracing::debug!(journal_mode = %mode, "sqlite journal mode");
    }
    Ok(conn)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults() {
        let opts = SqliteOptionsBuilder::new("db/escola.sqlite".into()).finish();
        assert!(opts.foreign_keys);
        assert!(opts.wal);
        let opts = SqliteOptionsBuilder::new(":memory:".into())
            .foreign_keys(false)
            .wal(false)
            .finish();
        assert!(!opts.foreign_keys);
        assert!(!opts.wal);
    }

    #[test]
    fn memory_databases_are_not_files() {
        assert!(!SqliteOptions::in_memory().is_file_backed());
        assert!(!SqliteOptions::new("file::memory:?cache=shared".into()).is_file_backed());
        assert!(SqliteOptions::new("./database.sqlite".into()).is_file_backed());
    }

    #[test]
    fn creates_missing_parent_directory() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("nested").join("escola.sqlite");
        let opts = SqliteOptions::new(path.to_string_lossy().into_owned());
        let conn = open_connection(&opts)?;
        let fk: i64 = conn.query_row("PRAGMA foreign_keys", [], |row| row.get(0))?;
        assert_eq!(fk, 1);
        assert!(path.exists());
        Ok(())
    }
}
