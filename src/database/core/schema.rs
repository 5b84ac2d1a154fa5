//! Workflow metadata management
//!
//! The `workflow_meta` table is shared by every namespace. It tracks the
//! storage layout version and which schemas have been activated in this
//! database file.

use crate::error::{PipelineError, Result};
use rusqlite::Connection;

/// Current storage layout version
/// Increment this when table naming or column storage changes
pub const SCHEMA_VERSION: u32 = 1;

const META_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS workflow_meta (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL,
        updated_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
    );
"#;

const ACTIVATION_PREFIX: &str = "schema.";

/// Manager for the metadata table
pub struct SchemaManager<'a> {
    conn: &'a Connection,
}

impl<'a> SchemaManager<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Create the metadata table and record the layout version
    pub fn initialize(&self) -> Result<()> {
        self.conn.execute(META_TABLE, [])?;
        self.set_meta("schema_version", &SCHEMA_VERSION.to_string())
    }

    /// Initialize if needed, fail if the file was written by another layout version
    pub fn ensure_current(&self) -> Result<()> {
        match self.check_status()? {
            SchemaStatus::NotInitialized => self.initialize(),
            SchemaStatus::Current => Ok(()),
            SchemaStatus::Incompatible {
                database_version,
                required_version,
            } => Err(PipelineError::IncompatibleStore {
                found: database_version,
                required: required_version,
            }),
        }
    }

    pub fn check_status(&self) -> Result<SchemaStatus> {
        if !super::table_exists(self.conn, "workflow_meta")? {
            return Ok(SchemaStatus::NotInitialized);
        }

        let version = self.get_schema_version()?;
        if version == SCHEMA_VERSION {
            Ok(SchemaStatus::Current)
        } else {
            Ok(SchemaStatus::Incompatible {
                database_version: version,
                required_version: SCHEMA_VERSION,
            })
        }
    }

    fn get_schema_version(&self) -> Result<u32> {
        let version = self.get_meta("schema_version")?.unwrap_or_else(|| "0".to_string());
        Ok(version.parse().unwrap_or(0))
    }

    /// Record that `schema_name` holds the tables of `namespace`
    pub fn record_activation(&self, schema_name: &str, namespace: &str) -> Result<()> {
        self.set_meta(&format!("{}{}", ACTIVATION_PREFIX, schema_name), namespace)
    }

    /// All recorded `(schema name, namespace)` activations, sorted by schema name
    pub fn activations(&self) -> Result<Vec<(String, String)>> {
        let mut stmt = self.conn.prepare(
            "SELECT key, value FROM workflow_meta WHERE key LIKE 'schema.%' ORDER BY key",
        )?;
        let rows = stmt.query_map([], |row| {
            let key: String = row.get(0)?;
            let value: String = row.get(1)?;
            Ok((key, value))
        })?;

        let mut activations = Vec::new();
        for row in rows {
            let (key, namespace) = row?;
            if let Some(schema) = key.strip_prefix(ACTIVATION_PREFIX) {
                activations.push((schema.to_string(), namespace));
            }
        }
        Ok(activations)
    }

    pub fn set_meta(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO workflow_meta (key, value, updated_at) VALUES (?1, ?2, strftime('%s', 'now'))",
            [key, value],
        )?;
        Ok(())
    }

    pub fn get_meta(&self, key: &str) -> Result<Option<String>> {
        let result: rusqlite::Result<String> = self.conn.query_row(
            "SELECT value FROM workflow_meta WHERE key = ?1",
            [key],
            |row| row.get(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// Status of the metadata table
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaStatus {
    /// Fresh database
    NotInitialized,

    /// Layout version matches
    Current,

    /// Database written by another layout version
    Incompatible {
        database_version: u32,
        required_version: u32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::DatabaseConn;

    #[test]
    fn test_schema_not_initialized() {
        let db = DatabaseConn::open_in_memory().unwrap();
        let manager = SchemaManager::new(&db.conn);

        assert_eq!(
            manager.check_status().unwrap(),
            SchemaStatus::NotInitialized
        );
    }

    #[test]
    fn test_ensure_current_initializes() {
        let db = DatabaseConn::open_in_memory().unwrap();
        let manager = SchemaManager::new(&db.conn);

        manager.ensure_current().unwrap();
        assert_eq!(manager.check_status().unwrap(), SchemaStatus::Current);
        assert_eq!(manager.get_schema_version().unwrap(), SCHEMA_VERSION);
    }

    #[test]
    fn test_incompatible_version() {
        let db = DatabaseConn::open_in_memory().unwrap();
        let manager = SchemaManager::new(&db.conn);
        manager.initialize().unwrap();
        manager.set_meta("schema_version", "99").unwrap();

        let err = manager.ensure_current().unwrap_err();
        assert!(matches!(
            err,
            PipelineError::IncompatibleStore { found: 99, .. }
        ));
    }

    #[test]
    fn test_activations() {
        let db = DatabaseConn::open_in_memory().unwrap();
        let manager = SchemaManager::new(&db.conn);
        manager.initialize().unwrap();

        manager.record_activation("test_subject", "subject").unwrap();
        manager.record_activation("test_lab", "lab").unwrap();
        manager.record_activation("test_lab", "lab").unwrap();

        assert_eq!(
            manager.activations().unwrap(),
            vec![
                ("test_lab".to_string(), "lab".to_string()),
                ("test_subject".to_string(), "subject".to_string()),
            ]
        );
        assert_eq!(manager.get_meta("missing").unwrap(), None);
    }
}
