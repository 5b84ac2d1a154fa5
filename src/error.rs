//! Error kinds raised by composition and ingestion
//!
//! Every variant is fatal to the operation that raised it. Nothing is retried
//! or swallowed; callers decide how to recover (fix the row, re-run with
//! `skip_duplicates`, restore a snapshot).

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = PipelineError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// A namespace was activated before one of its declared dependencies
    #[error("cannot activate namespace '{namespace}': dependency '{dependency}' is not active")]
    DependencyNotActive {
        namespace: String,
        dependency: String,
    },

    /// A namespace was re-activated under a different storage prefix
    #[error("namespace '{namespace}' is active with prefix '{active}', cannot re-activate with prefix '{requested}'")]
    PrefixConflict {
        namespace: String,
        active: String,
        requested: String,
    },

    /// A record references a parent key that does not exist yet
    #[error("referential integrity violation inserting into {table}: no parent row for key {key}")]
    ReferentialIntegrity { table: String, key: String },

    /// A natural key collided while duplicates were not allowed
    #[error("duplicate record in {table}: key {key} already exists")]
    DuplicateRecord { table: String, key: String },

    /// A source row is missing an attribute or holds a value outside its domain
    #[error("malformed record for {table} in {origin} (row {}): {reason}", row_label(.row))]
    MalformedRecord {
        table: String,
        /// Source file path, or `<insert>` for records built in code
        origin: String,
        /// 1-based data row number, `None` when the header itself is at fault
        row: Option<usize>,
        reason: String,
    },

    /// Declared namespace dependencies are inconsistent (cycle, unknown entry)
    #[error("invalid namespace dependency graph: {0}")]
    InvalidDependencyGraph(String),

    #[error("unknown namespace '{0}'")]
    UnknownNamespace(String),

    #[error("unknown table '{table}' in namespace '{namespace}'")]
    UnknownTable { namespace: String, table: String },

    /// The database file was written with a different storage layout
    #[error("database layout version {found} is incompatible with required version {required}")]
    IncompatibleStore { found: u32, required: u32 },

    /// Auto-populated tables only accept rows from ingestion with direct insert enabled
    #[error("direct insert into auto-populated table {table} is not allowed")]
    DirectInsertDenied { table: String },

    #[error("failed to read CSV {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

fn row_label(row: &Option<usize>) -> String {
    match row {
        Some(r) => r.to_string(),
        None => "header".to_string(),
    }
}

impl PipelineError {
    pub(crate) fn malformed(
        table: &str,
        origin: impl Into<String>,
        row: Option<usize>,
        reason: impl Into<String>,
    ) -> Self {
        PipelineError::MalformedRecord {
            table: table.to_string(),
            origin: origin.into(),
            row,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_display_header() {
        let err = PipelineError::malformed("x_session__session", "sessions.csv", None, "missing column");
        assert_eq!(
            err.to_string(),
            "malformed record for x_session__session in sessions.csv (row header): missing column"
        );
    }

    #[test]
    fn test_malformed_display_row() {
        let err = PipelineError::malformed("x__subject", "subjects.csv", Some(3), "bad sex");
        assert!(err.to_string().contains("(row 3)"));
    }
}
