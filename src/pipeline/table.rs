//! Uniform table handle
//!
//! Every activated table is reached through the [`Table`] trait, whatever its
//! namespace or tier. [`SqliteTable`] implements it on top of the activated
//! table definition.

use super::registry::ResolvedTable;
use crate::database::{quote_ident, table_count};
use crate::error::{PipelineError, Result};
use crate::record::{NaturalKey, Record, Row, Value};
use rusqlite::ffi;
use rusqlite::Connection;

const INSERT_ORIGIN: &str = "<insert>";

/// Outcome of inserting one record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// Natural key already present and duplicates are skipped
    Skipped,
}

/// Capability interface shared by all tables
pub trait Table {
    /// Stored table name, `{schema}__{table}`
    fn full_name(&self) -> &str;

    /// Primary-key values of `record`
    fn natural_key(&self, record: &Record) -> Result<NaturalKey>;

    /// Insert a single record
    fn insert(&self, record: &Record) -> Result<()>;

    /// Whether a row with this natural key exists
    fn exists(&self, key: &NaturalKey) -> Result<bool>;

    /// Insert, skipping or rejecting an existing natural key
    fn insert_or_skip(&self, record: &Record, skip_duplicates: bool) -> Result<InsertOutcome> {
        let key = self.natural_key(record)?;
        if self.exists(&key)? {
            if skip_duplicates {
                return Ok(InsertOutcome::Skipped);
            }
            return Err(PipelineError::DuplicateRecord {
                table: self.full_name().to_string(),
                key: key.to_string(),
            });
        }
        self.insert(record)?;
        Ok(InsertOutcome::Inserted)
    }
}

/// An activated table on a SQLite connection
pub struct SqliteTable<'a> {
    conn: &'a Connection,
    table: &'a ResolvedTable,
    allow_direct_insert: bool,
}

impl<'a> SqliteTable<'a> {
    pub(crate) fn new(conn: &'a Connection, table: &'a ResolvedTable, allow_direct_insert: bool) -> Self {
        Self {
            conn,
            table,
            allow_direct_insert,
        }
    }

    pub fn resolved(&self) -> &ResolvedTable {
        self.table
    }

    pub fn count(&self) -> Result<u64> {
        table_count(self.conn, &self.table.full_name)
    }

    /// All rows, ordered by primary key
    pub fn fetch(&self) -> Result<Vec<Row>> {
        let columns: Vec<String> = self.table.def.columns.iter().map(|c| c.name.to_string()).collect();
        let select: Vec<String> = columns.iter().map(|c| quote_ident(c)).collect();
        let order: Vec<String> = self.table.def.primary_key().map(|c| quote_ident(c.name)).collect();
        let sql = format!(
            "SELECT {} FROM {} ORDER BY {}",
            select.join(", "),
            quote_ident(&self.table.full_name),
            order.join(", ")
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], |row| {
            let mut values = Vec::with_capacity(columns.len());
            for idx in 0..columns.len() {
                values.push(row.get::<_, Value>(idx)?);
            }
            Ok(values)
        })?;

        let mut fetched = Vec::new();
        for values in rows {
            fetched.push(Row {
                columns: columns.clone(),
                values: values?,
            });
        }
        Ok(fetched)
    }

    fn check_attributes(&self, record: &Record) -> Result<()> {
        let def = self.table.def;
        for (name, _) in record.fields() {
            if def.column(name).is_none() {
                return Err(PipelineError::malformed(
                    &self.table.full_name,
                    INSERT_ORIGIN,
                    None,
                    format!("unknown attribute '{}'", name),
                ));
            }
        }
        for column in def.required_columns() {
            if record.get(column.name).map_or(true, Value::is_null) {
                return Err(PipelineError::malformed(
                    &self.table.full_name,
                    INSERT_ORIGIN,
                    None,
                    format!("missing required attribute '{}'", column.name),
                ));
            }
        }
        Ok(())
    }

    fn classify(&self, err: rusqlite::Error, record: &Record) -> PipelineError {
        let key = self
            .natural_key(record)
            .map(|k| k.to_string())
            .unwrap_or_default();
        if let rusqlite::Error::SqliteFailure(ref failure, _) = err {
            match failure.extended_code {
                ffi::SQLITE_CONSTRAINT_FOREIGNKEY => {
                    return PipelineError::ReferentialIntegrity {
                        table: self.table.full_name.clone(),
                        key,
                    }
                }
                ffi::SQLITE_CONSTRAINT_PRIMARYKEY | ffi::SQLITE_CONSTRAINT_UNIQUE => {
                    return PipelineError::DuplicateRecord {
                        table: self.table.full_name.clone(),
                        key,
                    }
                }
                ffi::SQLITE_CONSTRAINT_NOTNULL => {
                    return PipelineError::malformed(
                        &self.table.full_name,
                        INSERT_ORIGIN,
                        None,
                        err.to_string(),
                    )
                }
                _ => {}
            }
        }
        err.into()
    }
}

impl Table for SqliteTable<'_> {
    fn full_name(&self) -> &str {
        &self.table.full_name
    }

    fn natural_key(&self, record: &Record) -> Result<NaturalKey> {
        let mut key = Vec::new();
        for column in self.table.def.primary_key() {
            match record.get(column.name) {
                Some(value) if !value.is_null() => key.push((column.name.to_string(), value.clone())),
                _ => {
                    return Err(PipelineError::malformed(
                        &self.table.full_name,
                        INSERT_ORIGIN,
                        None,
                        format!("missing key attribute '{}'", column.name),
                    ))
                }
            }
        }
        Ok(NaturalKey(key))
    }

    fn insert(&self, record: &Record) -> Result<()> {
        if self.table.auto_populated && !self.allow_direct_insert {
            return Err(PipelineError::DirectInsertDenied {
                table: self.table.full_name.clone(),
            });
        }
        self.check_attributes(record)?;

        let columns: Vec<String> = record.fields().map(|(n, _)| quote_ident(n)).collect();
        let placeholders: Vec<String> = (1..=record.len()).map(|i| format!("?{}", i)).collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_ident(&self.table.full_name),
            columns.join(", "),
            placeholders.join(", ")
        );
        let values: Vec<&Value> = record.fields().map(|(_, v)| v).collect();

        self.conn
            .execute(&sql, rusqlite::params_from_iter(values))
            .map_err(|e| self.classify(e, record))?;
        Ok(())
    }

    fn exists(&self, key: &NaturalKey) -> Result<bool> {
        let conditions: Vec<String> = key
            .0
            .iter()
            .enumerate()
            .map(|(idx, (name, _))| format!("{} = ?{}", quote_ident(name), idx + 1))
            .collect();
        let sql = format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE {})",
            quote_ident(&self.table.full_name),
            conditions.join(" AND ")
        );
        let exists: bool = self
            .conn
            .query_row(&sql, rusqlite::params_from_iter(key.values()), |row| row.get(0))?;
        Ok(exists)
    }
}
