//! Core database infrastructure
//!
//! - `DatabaseConn`: SQLite connection wrapper with foreign keys enforced
//! - `SchemaManager`: metadata table (layout version, recorded activations)
//! - `SchemaStatus`: metadata state enumeration

mod connection;
mod schema;

pub use connection::{quote_ident, DatabaseConn};
pub(crate) use connection::{table_count, table_exists};
pub use schema::{SchemaManager, SchemaStatus, SCHEMA_VERSION};
