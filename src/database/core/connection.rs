//! Database connection management
//!
//! This module provides the SQLite connection wrapper backing every activated
//! namespace.

use crate::error::Result;
use rusqlite::Connection;

/// Core database connection wrapper
///
/// `DatabaseConn` wraps a SQLite connection, file-based or in-memory, and
/// configures it so foreign keys are enforced at insert time.
pub struct DatabaseConn {
    pub conn: Connection,
}

impl DatabaseConn {
    /// Open a database at the specified path
    ///
    /// If the path is `None`, an in-memory database is created.
    pub fn open(path: Option<&str>) -> Result<Self> {
        let conn = match path {
            Some(p) => Connection::open(p)?,
            None => Connection::open_in_memory()?,
        };

        let db = DatabaseConn { conn };
        db.configure()?;
        Ok(db)
    }

    /// Create an in-memory database
    pub fn open_in_memory() -> Result<Self> {
        Self::open(None)
    }

    fn configure(&self) -> Result<()> {
        // "memory" for in-memory databases, "wal" otherwise
        let _: String = self
            .conn
            .query_row("PRAGMA journal_mode=WAL", [], |row| row.get(0))?;

        self.conn.execute("PRAGMA synchronous=NORMAL", [])?;
        self.conn.execute("PRAGMA temp_store=MEMORY", [])?;

        // Referential integrity is checked per statement, never deferred
        self.conn.execute("PRAGMA foreign_keys=ON", [])?;
        self.conn.execute("PRAGMA defer_foreign_keys=OFF", [])?;

        Ok(())
    }

    /// Whether foreign key enforcement is active on this connection
    pub fn foreign_keys_enabled(&self) -> Result<bool> {
        let enabled: i64 = self
            .conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))?;
        Ok(enabled == 1)
    }
}

/// Quote an identifier for use in SQL
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

pub(crate) fn table_exists(conn: &Connection, table_name: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
        [table_name],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

pub(crate) fn table_count(conn: &Connection, table_name: &str) -> Result<u64> {
    let query = format!("SELECT COUNT(*) FROM {}", quote_ident(table_name));
    let count: u64 = conn.query_row(&query, [], |row| row.get(0))?;
    Ok(count)
}
