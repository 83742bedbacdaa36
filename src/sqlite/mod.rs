// SQLite module - the embedded backend
//
// The synchronous rusqlite engine is wrapped so every call is awaitable:
// - config: options, file/parent-directory handling and connection pragmas
// - params: parameter conversion into SQLite values
// - query: result extraction and building
// - executor: the `Backend` implementation

pub mod config;
pub mod executor;
pub mod params;
pub mod query;

// Re-export the public API
pub use config::{SqliteOptions, SqliteOptionsBuilder};
pub use executor::SqliteDriver;
pub use params::Params;
pub use query::build_result_set;
