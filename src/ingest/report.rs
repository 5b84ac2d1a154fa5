use super::manifest::Stage;
use serde::Serialize;

/// Per-table outcome of one manifest entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "cli", derive(tabled::Tabled))]
pub struct TableReport {
    pub table: String,
    pub source: String,
    pub rows: usize,
    pub inserted: usize,
    pub skipped: usize,
}

/// Outcome of a completed stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageReport {
    pub stage: Stage,
    pub tables: Vec<TableReport>,
}

impl StageReport {
    pub fn new(stage: Stage) -> Self {
        Self {
            stage,
            tables: Vec::new(),
        }
    }

    pub fn inserted(&self) -> usize {
        self.tables.iter().map(|t| t.inserted).sum()
    }

    pub fn skipped(&self) -> usize {
        self.tables.iter().map(|t| t.skipped).sum()
    }

    /// Report of the entry that fed `table` (full table name)
    pub fn table(&self, table: &str) -> Option<&TableReport> {
        self.tables.iter().find(|t| t.table == table)
    }
}
