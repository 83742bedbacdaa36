//! `LibSQL` backend glue for a remote Turso database.
//!
//! Mirrors the `SQLite` module layout:
//! - `params`: parameter conversion into `LibSQL` values
//! - `query`: result extraction and building
//! - `executor`: the `Backend` implementation

pub mod executor;
pub mod params;
pub mod query;

// Re-export the public API
pub use executor::LibsqlDriver;
pub use params::Params;
pub use query::build_result_set;
