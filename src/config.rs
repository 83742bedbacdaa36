//! Startup configuration: which backend to use and how to reach it.
//!
//! Read once from the environment:
//! 1. `TURSO_DATABASE_URL` and `TURSO_AUTH_TOKEN`, both non-empty, select the remote backend
//! 2. otherwise the embedded backend opens `DB_PATH` (default `database.sqlite`)

use std::fmt;

pub const DB_PATH_VAR: &str = "DB_PATH";
pub const REMOTE_URL_VAR: &str = "TURSO_DATABASE_URL";
pub const REMOTE_TOKEN_VAR: &str = "TURSO_AUTH_TOKEN";
pub const DEFAULT_DB_PATH: &str = "database.sqlite";

/// Connection settings for a remote `LibSQL` (Turso) database.
#[derive(Clone, PartialEq, Eq)]
pub struct RemoteOptions {
    /// `libsql://...` or `https://...` endpoint.
    pub url: String,
    pub auth_token: String,
}

impl RemoteOptions {
    #[must_use]
    pub fn new(url: String, auth_token: String) -> Self {
        Self { url, auth_token }
    }
}

// The token stays out of logs.
impl fmt::Debug for RemoteOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteOptions")
            .field("url", &self.url)
            .field("auth_token", &"<redacted>")
            .finish()
    }
}

/// Backend selection plus the settings each backend needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// Embedded database file; ignored when `remote` is set.
    pub db_path: String,
    pub remote: Option<RemoteOptions>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            db_path: DEFAULT_DB_PATH.to_string(),
            remote: None,
        }
    }
}

impl DatabaseConfig {
    /// Embedded backend at `db_path`.
    #[must_use]
    pub fn embedded(db_path: impl Into<String>) -> Self {
        Self {
            db_path: db_path.into(),
            remote: None,
        }
    }

    /// Remote backend at `url`.
    #[must_use]
    pub fn remote(url: impl Into<String>, auth_token: impl Into<String>) -> Self {
        Self {
            remote: Some(RemoteOptions::new(url.into(), auth_token.into())),
            ..Self::default()
        }
    }

    /// Load the configuration from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load the configuration through `lookup`, which maps a variable name to its value.
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let db_path = non_empty(DB_PATH_VAR).unwrap_or_else(|| DEFAULT_DB_PATH.to_string());
        let remote = match (non_empty(REMOTE_URL_VAR), non_empty(REMOTE_TOKEN_VAR)) {
            (Some(url), Some(auth_token)) => Some(RemoteOptions::new(url, auth_token)),
            _ => None,
        };
        Self { db_path, remote }
    }

    #[must_use]
    pub fn is_remote(&self) -> bool {
        self.remote.is_some()
    }
}
