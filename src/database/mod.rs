//! Database module
//!
//! SQLite is the backing store for every activated namespace. Tables of all
//! namespaces live in one database file (or one in-memory database); their
//! names carry the schema name as a prefix, e.g. `opto_subject__subject`.
//!
//! ```text
//! database/
//! └── core/
//!     ├── connection  # SQLite DatabaseConn wrapper
//!     └── schema      # workflow_meta table management
//! ```

pub mod core;

pub use core::{quote_ident, DatabaseConn, SchemaManager, SchemaStatus, SCHEMA_VERSION};
pub(crate) use core::table_count;

/// Ensure the directory holding the database file exists
pub fn ensure_data_dir(data_dir: &str) -> crate::error::Result<()> {
    std::fs::create_dir_all(data_dir)?;
    Ok(())
}
