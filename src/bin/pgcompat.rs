use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde_json::{Value as JsonValue, json};
use sqlite_pg_compat::config::DEFAULT_DB_PATH;
use sqlite_pg_compat::prelude::*;

#[derive(Parser, Debug)]
#[command(author, version, about = "Run PostgreSQL-dialect SQL against SQLite or Turso")]
struct Args {
    /// Embedded database file.
    #[arg(long, env = "DB_PATH", default_value = DEFAULT_DB_PATH)]
    db_path: String,
    /// Remote database URL; selects the remote backend together with `--turso-token`.
    #[arg(long, env = "TURSO_DATABASE_URL")]
    turso_url: Option<String>,
    #[arg(long, env = "TURSO_AUTH_TOKEN", hide_env_values = true)]
    turso_token: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a schema script as-is.
    Exec { file: PathBuf },
    /// Run one statement and print the result as JSON.
    Query {
        sql: String,
        /// Values for `$1`, `$2`, ...; JSON scalars, anything else is bound as text.
        params: Vec<String>,
    },
    /// List tables with their row counts.
    Check,
}

impl Args {
    fn database_config(&self) -> DatabaseConfig {
        let remote = match (&self.turso_url, &self.turso_token) {
            (Some(url), Some(token)) if !url.trim().is_empty() && !token.trim().is_empty() => {
                Some(RemoteOptions::new(url.clone(), token.clone()))
            }
            _ => None,
        };
        DatabaseConfig {
            db_path: self.db_path.clone(),
            remote,
        }
    }
}

fn parse_param(raw: &str) -> RowValues {
    match serde_json::from_str::<JsonValue>(raw) {
        Ok(value) if !value.is_object() && !value.is_array() => RowValues::from_json(value),
        _ => RowValues::Text(raw.to_string()),
    }
}

async fn run(args: Args) -> Result<(), SqlCompatError> {
    let db = Database::connect(&args.database_config()).await?;

    match args.command {
        Command::Exec { file } => {
            let script = tokio::fs::read_to_string(&file).await?;
            db.exec(&script).await?;
            tracing::info!(file = %file.display(), "script applied");
        }
        Command::Query { sql, params } => {
            let params: Vec<RowValues> = params.iter().map(|raw| parse_param(raw)).collect();
            let result = db.query(&sql, &params).await?;
            print_json(&result.to_json())?;
        }
        Command::Check => {
            let tables = db
                .query(
                    "SELECT name FROM sqlite_master WHERE type = 'table' \
                     AND name NOT LIKE 'sqlite_%' ORDER BY name",
                    &[],
                )
                .await?;
            let mut report = Vec::with_capacity(tables.rows.len());
            for row in &tables.rows {
                let Some(name) = row.get("name").and_then(RowValues::as_text) else {
                    continue;
                };
                let counted = db
                    .query(
                        &format!("SELECT COUNT(*) FROM \"{}\"", name.replace('"', "\"\"")),
                        &[],
                    )
                    .await?;
                let count = counted
                    .first()
                    .and_then(|r| r.get("count"))
                    .map_or(JsonValue::Null, RowValues::to_json);
                report.push(json!({ "table": name, "rows": count }));
            }
            print_json(&json!({ "backend": db.database_type(), "tables": report }))?;
        }
    }
    Ok(())
}

fn print_json(value: &JsonValue) -> Result<(), SqlCompatError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| SqlCompatError::ExecutionError(format!("failed to render JSON: {e}")))?;
    println!("{text}");
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if let Some(violation) = err.constraint_violation() {
                tracing::error!(sqlstate = violation.sqlstate(), "{err}");
            } else {
                tracing::error!("{err}");
            }
            ExitCode::FAILURE
        }
    }
}
