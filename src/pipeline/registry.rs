//! Registry of activated namespaces
//!
//! Activation resolves every table of a namespace against the namespaces that
//! are already active, then creates the tables and seeds lookup contents.
//! Resolution happens before any DDL runs, so a namespace with a missing
//! dependency leaves no trace in the store.

use crate::database::{quote_ident, SchemaManager};
use crate::error::{PipelineError, Result};
use crate::record::{Record, Value};
use crate::schema::{DefaultValue, LinkingContext, NamespaceDescriptor, TableDef, TableRef, Tier};
use rusqlite::Connection;
use tracing::{debug, info};

/// A foreign key whose target has been resolved to a stored table name
#[derive(Debug, Clone)]
pub struct ResolvedForeignKey {
    pub parent: String,
    pub columns: &'static [(&'static str, &'static str)],
}

/// A table bound to its storage name and resolved parents
#[derive(Debug, Clone)]
pub struct ResolvedTable {
    pub def: &'static TableDef,
    pub namespace: &'static str,
    pub full_name: String,
    pub foreign_keys: Vec<ResolvedForeignKey>,
    /// Imported/computed tables and their parts
    pub auto_populated: bool,
}

impl ResolvedTable {
    /// Full names of referenced tables, in declaration order, without repeats
    pub fn parents(&self) -> Vec<String> {
        let mut parents: Vec<String> = Vec::new();
        for fk in &self.foreign_keys {
            if !parents.contains(&fk.parent) {
                parents.push(fk.parent.clone());
            }
        }
        parents
    }

    fn create_sql(&self) -> Result<String> {
        let mut lines = Vec::new();
        for column in self.def.columns {
            let mut line = format!("{} {}", quote_ident(column.name), column.ty.sql_type());
            match column.default {
                DefaultValue::Required => line.push_str(" NOT NULL"),
                DefaultValue::Null => {}
                DefaultValue::Value(literal) => {
                    let value = column.ty.parse(literal).map_err(|reason| {
                        PipelineError::InvalidDependencyGraph(format!(
                            "default of {}.{}: {}",
                            self.def.name, column.name, reason
                        ))
                    })?;
                    line.push_str(&format!(" NOT NULL DEFAULT {}", sql_literal(&value)));
                }
            }
            lines.push(line);
        }

        let key: Vec<String> = self.def.primary_key().map(|c| quote_ident(c.name)).collect();
        lines.push(format!("PRIMARY KEY ({})", key.join(", ")));

        for fk in &self.foreign_keys {
            let local: Vec<String> = fk.columns.iter().map(|(l, _)| quote_ident(l)).collect();
            let parent: Vec<String> = fk.columns.iter().map(|(_, p)| quote_ident(p)).collect();
            lines.push(format!(
                "FOREIGN KEY ({}) REFERENCES {} ({})",
                local.join(", "),
                quote_ident(&fk.parent),
                parent.join(", ")
            ));
        }

        Ok(format!(
            "CREATE TABLE IF NOT EXISTS {} (\n    {}\n)",
            quote_ident(&self.full_name),
            lines.join(",\n    ")
        ))
    }

    fn seed_records(&self) -> Result<Vec<Record>> {
        let mut records = Vec::with_capacity(self.def.contents.len());
        for (idx, row) in self.def.contents.iter().enumerate() {
            let mut record = Record::new();
            for (column, raw) in self.def.columns.iter().zip(row.iter()) {
                let value = column.ty.parse(raw).map_err(|reason| {
                    PipelineError::malformed(&self.full_name, "<contents>", Some(idx + 1), reason)
                })?;
                record.set(column.name, value);
            }
            records.push(record);
        }
        Ok(records)
    }
}

fn sql_literal(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Int(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Text(s) => format!("'{}'", s.replace('\'', "''")),
    }
}

/// An activated namespace
#[derive(Debug, Clone)]
pub struct ActiveNamespace {
    pub descriptor: NamespaceDescriptor,
    pub prefix: String,
    /// `prefix + descriptor.schema`
    pub schema_name: String,
    pub tables: Vec<ResolvedTable>,
}

impl ActiveNamespace {
    pub fn table(&self, name: &str) -> Option<&ResolvedTable> {
        self.tables.iter().find(|t| t.def.name == name)
    }
}

/// Process-wide registry of activated namespaces, in activation order
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    namespaces: Vec<ActiveNamespace>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self, namespace: &str) -> bool {
        self.get(namespace).is_some()
    }

    pub fn get(&self, namespace: &str) -> Option<&ActiveNamespace> {
        self.namespaces
            .iter()
            .find(|ns| ns.descriptor.name == namespace)
    }

    pub fn namespaces(&self) -> impl Iterator<Item = &ActiveNamespace> {
        self.namespaces.iter()
    }

    /// Look up an activated table
    pub fn table(&self, namespace: &str, table: &str) -> Result<&ResolvedTable> {
        let ns = self
            .get(namespace)
            .ok_or_else(|| PipelineError::UnknownNamespace(namespace.to_string()))?;
        ns.table(table).ok_or_else(|| PipelineError::UnknownTable {
            namespace: namespace.to_string(),
            table: table.to_string(),
        })
    }

    /// Activate `descriptor` under `prefix`
    ///
    /// Fails with [`PipelineError::DependencyNotActive`] before creating
    /// anything if a declared dependency is inactive. Re-activation with the
    /// same prefix is a no-op; with a different prefix it is a
    /// [`PipelineError::PrefixConflict`].
    pub fn activate(
        &mut self,
        conn: &Connection,
        descriptor: &NamespaceDescriptor,
        tables: &'static [TableDef],
        linking: &LinkingContext,
        prefix: &str,
    ) -> Result<()> {
        if let Some(active) = self.get(descriptor.name) {
            if active.prefix == prefix {
                debug!("namespace {} already active as {}", descriptor.name, active.schema_name);
                return Ok(());
            }
            return Err(PipelineError::PrefixConflict {
                namespace: descriptor.name.to_string(),
                active: active.prefix.clone(),
                requested: prefix.to_string(),
            });
        }

        for dependency in descriptor.dependencies {
            if !self.is_active(dependency) {
                return Err(PipelineError::DependencyNotActive {
                    namespace: descriptor.name.to_string(),
                    dependency: dependency.to_string(),
                });
            }
        }

        let schema_name = format!("{}{}", prefix, descriptor.schema);
        let resolved = self.resolve_tables(descriptor, &schema_name, tables, linking)?;

        let tx = conn.unchecked_transaction()?;
        for table in &resolved {
            tx.execute(&table.create_sql()?, [])?;
            for record in table.seed_records()? {
                let columns: Vec<String> = record.fields().map(|(n, _)| quote_ident(n)).collect();
                let placeholders: Vec<String> =
                    (1..=record.len()).map(|i| format!("?{}", i)).collect();
                let sql = format!(
                    "INSERT OR IGNORE INTO {} ({}) VALUES ({})",
                    quote_ident(&table.full_name),
                    columns.join(", "),
                    placeholders.join(", ")
                );
                let values: Vec<&Value> = record.fields().map(|(_, v)| v).collect();
                tx.execute(&sql, rusqlite::params_from_iter(values))?;
            }
        }
        SchemaManager::new(&tx).record_activation(&schema_name, descriptor.name)?;
        tx.commit()?;

        info!(
            "activated namespace {} as {} ({} tables)",
            descriptor.name,
            schema_name,
            resolved.len()
        );

        self.namespaces.push(ActiveNamespace {
            descriptor: descriptor.clone(),
            prefix: prefix.to_string(),
            schema_name,
            tables: resolved,
        });
        Ok(())
    }

    fn resolve_tables(
        &self,
        descriptor: &NamespaceDescriptor,
        schema_name: &str,
        tables: &'static [TableDef],
        linking: &LinkingContext,
    ) -> Result<Vec<ResolvedTable>> {
        let mut resolved: Vec<ResolvedTable> = Vec::with_capacity(tables.len());

        for def in tables {
            let full_name = format!("{}__{}", schema_name, def.name);

            let mut foreign_keys = Vec::with_capacity(def.foreign_keys.len());
            for fk in def.foreign_keys {
                let parent = match fk.target {
                    TableRef::Local(name) => resolved
                        .iter()
                        .find(|t| t.def.name == name)
                        .map(|t| t.full_name.clone())
                        .ok_or_else(|| {
                            PipelineError::InvalidDependencyGraph(format!(
                                "{}.{} references {} which is not declared before it",
                                descriptor.name, def.name, name
                            ))
                        })?,
                    TableRef::Linked(alias) => {
                        let (namespace, table) = linking.resolve(alias).ok_or_else(|| {
                            PipelineError::InvalidDependencyGraph(format!(
                                "{}.{} uses unknown alias {}",
                                descriptor.name, def.name, alias
                            ))
                        })?;
                        if !descriptor.dependencies.contains(&namespace) {
                            return Err(PipelineError::InvalidDependencyGraph(format!(
                                "{}.{} links {} in undeclared dependency {}",
                                descriptor.name, def.name, alias, namespace
                            )));
                        }
                        self.table(namespace, table)?.full_name.clone()
                    }
                };
                foreign_keys.push(ResolvedForeignKey {
                    parent,
                    columns: fk.columns,
                });
            }

            let auto_populated = match def.tier {
                Tier::Imported | Tier::Computed => true,
                Tier::Part => def
                    .master()
                    .and_then(|m| resolved.iter().find(|t| t.def.name == m))
                    .map(|t| t.auto_populated)
                    .unwrap_or(false),
                Tier::Manual | Tier::Lookup => false,
            };

            resolved.push(ResolvedTable {
                def,
                namespace: descriptor.name,
                full_name,
                foreign_keys,
                auto_populated,
            });
        }

        Ok(resolved)
    }
}
