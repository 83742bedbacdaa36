use thiserror::Error;

#[derive(Debug, Error)]
pub enum SqlCompatError {
    #[cfg(feature = "sqlite")]
    #[error(transparent)]
    SqliteError(#[from] rusqlite::Error),

    #[cfg(feature = "libsql")]
    #[error(transparent)]
    LibsqlError(#[from] libsql::Error),

    /// A RETURNING statement whose table, WHERE or SET clause could not be located.
    #[error("cannot emulate RETURNING: no {clause} clause found in `{sql}`")]
    ReturningParse { clause: &'static str, sql: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Parameter error: {0}")]
    ParameterError(String),

    #[error("SQL execution error: {0}")]
    ExecutionError(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Integrity violations reported by the engine, independent of which backend raised them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintViolation {
    Unique,
    ForeignKey,
    Check,
    NotNull,
}

impl ConstraintViolation {
    /// The PostgreSQL SQLSTATE for this violation, for callers that map errors by code.
    #[must_use]
    pub fn sqlstate(self) -> &'static str {
        match self {
            ConstraintViolation::Unique => "23505",
            ConstraintViolation::ForeignKey => "23503",
            ConstraintViolation::Check => "23514",
            ConstraintViolation::NotNull => "23502",
        }
    }

    /// Classify an engine message such as `UNIQUE constraint failed: alunos.matricula`.
    #[must_use]
    pub fn from_message(message: &str) -> Option<Self> {
        let upper = message.to_ascii_uppercase();
        if upper.contains("UNIQUE CONSTRAINT FAILED") || upper.contains("SQLITE_CONSTRAINT_UNIQUE")
        {
            Some(ConstraintViolation::Unique)
        } else if upper.contains("FOREIGN KEY CONSTRAINT FAILED")
            || upper.contains("SQLITE_CONSTRAINT_FOREIGNKEY")
        {
            Some(ConstraintViolation::ForeignKey)
        } else if upper.contains("CHECK CONSTRAINT FAILED")
            || upper.contains("SQLITE_CONSTRAINT_CHECK")
        {
            Some(ConstraintViolation::Check)
        } else if upper.contains("NOT NULL CONSTRAINT FAILED")
            || upper.contains("SQLITE_CONSTRAINT_NOTNULL")
        {
            Some(ConstraintViolation::NotNull)
        } else {
            None
        }
    }

    #[cfg(feature = "sqlite")]
    fn from_extended_code(code: i32) -> Option<Self> {
        use rusqlite::ffi;
        match code {
            ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                Some(ConstraintViolation::Unique)
            }
            ffi::SQLITE_CONSTRAINT_FOREIGNKEY => Some(ConstraintViolation::ForeignKey),
            ffi::SQLITE_CONSTRAINT_CHECK => Some(ConstraintViolation::Check),
            ffi::SQLITE_CONSTRAINT_NOTNULL => Some(ConstraintViolation::NotNull),
            _ => None,
        }
    }
}

impl SqlCompatError {
    /// Constraint violation carried by a native driver error, if any.
    ///
    /// The native error itself is left untouched; this only inspects it.
    #[must_use]
    pub fn constraint_violation(&self) -> Option<ConstraintViolation> {
        match self {
            #[cfg(feature = "sqlite")]
            SqlCompatError::SqliteError(err) => match err {
                rusqlite::Error::SqliteFailure(ffi_err, msg) => {
                    ConstraintViolation::from_extended_code(ffi_err.extended_code).or_else(|| {
                        msg.as_deref().and_then(ConstraintViolation::from_message)
                    })
                }
                other => ConstraintViolation::from_message(&other.to_string()),
            },
            #[cfg(feature = "libsql")]
            SqlCompatError::LibsqlError(err) => ConstraintViolation::from_message(&err.to_string()),
            _ => None,
        }
    }

    pub(crate) fn returning_parse(clause: &'static str, sql: &str) -> Self {
        SqlCompatError::ReturningParse {
            clause,
            sql: sql.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_engine_messages() {
        assert_eq!(
            ConstraintViolation::from_message("UNIQUE constraint failed: alunos.matricula"),
            Some(ConstraintViolation::Unique)
        );
        assert_eq!(
            ConstraintViolation::from_message("FOREIGN KEY constraint failed"),
            Some(ConstraintViolation::ForeignKey)
        );
        assert_eq!(
            ConstraintViolation::from_message("CHECK constraint failed: perfil IN ('admin')"),
            Some(ConstraintViolation::Check)
        );
        assert_eq!(ConstraintViolation::from_message("no such table: t"), None);
    }

    #[test]
    fn sqlstate_codes() {
        assert_eq!(ConstraintViolation::Unique.sqlstate(), "23505");
        assert_eq!(ConstraintViolation::ForeignKey.sqlstate(), "23503");
        assert_eq!(ConstraintViolation::Check.sqlstate(), "23514");
        assert_eq!(ConstraintViolation::NotNull.sqlstate(), "23502");
    }

    #[test]
    fn returning_parse_names_clause() {
        let err = SqlCompatError::returning_parse("WHERE", "UPDATE t SET a = ? RETURNING *");
        assert_eq!(
            err.to_string(),
            "cannot emulate RETURNING: no WHERE clause found in `UPDATE t SET a = ? RETURNING *`"
        );
    }
}
