//! Namespace and table definitions
//!
//! Every namespace of the workflow is described statically: its tables, their
//! attributes, primary keys and foreign keys. Nothing is discovered at run
//! time; the composer validates these declarations once at startup and
//! creates the tables in dependency order.
//!
//! ```text
//! schema/
//! ├── lab           # labs, users, projects, protocols, sources
//! ├── reference     # Device lookup (local to this workflow)
//! ├── subject       # animals
//! ├── surgery       # brain regions, implantations
//! ├── session       # recording sessions
//! ├── event         # behavior recordings and events
//! ├── trial         # blocks and trials
//! └── optogenetics  # waveforms, stimulation parameters, protocols, events
//! ```
//!
//! Foreign keys either point at a table of the same namespace
//! ([`TableRef::Local`]) or at an alias such as `Subject` or `Experimenter`
//! ([`TableRef::Linked`]) that the [`LinkingContext`] resolves to a table of an
//! upstream namespace.

pub mod event;
pub mod lab;
pub mod optogenetics;
pub mod reference;
pub mod session;
pub mod subject;
pub mod surgery;
pub mod trial;

mod types;

pub use types::{Column, ColumnType, DefaultValue, ForeignKey, TableDef, TableRef, Tier};

use crate::error::Result;
use crate::pipeline::SchemaRegistry;
use rusqlite::Connection;

/// Static description of a namespace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceDescriptor {
    /// Logical name the registry is keyed by
    pub name: &'static str,
    /// Storage schema suffix; the full schema name is `prefix + schema`
    pub schema: &'static str,
    /// Namespaces that must be active before this one
    pub dependencies: &'static [&'static str],
}

/// A namespace module: a descriptor plus its table definitions
pub trait SchemaModule {
    fn describe(&self) -> NamespaceDescriptor;

    fn tables(&self) -> &'static [TableDef];

    /// Activate this namespace in `registry` under `prefix`
    fn register(
        &self,
        registry: &mut SchemaRegistry,
        conn: &Connection,
        linking: &LinkingContext,
        prefix: &str,
    ) -> Result<()> {
        registry.activate(conn, &self.describe(), self.tables(), linking, prefix)
    }
}

/// Every namespace module of the workflow, in activation order
pub fn workflow_modules() -> Vec<&'static dyn SchemaModule> {
    vec![
        &lab::Lab,
        &reference::Reference,
        &subject::Subject,
        &surgery::Surgery,
        &session::Session,
        &event::Event,
        &trial::Trial,
        &optogenetics::Optogenetics,
    ]
}

/// Alias table used to resolve [`TableRef::Linked`] foreign keys
///
/// Maps a public alias (`Subject`, `Experimenter`, ...) to the namespace and
/// table it stands for.
#[derive(Debug, Clone, Default)]
pub struct LinkingContext {
    aliases: Vec<(&'static str, &'static str, &'static str)>,
}

impl LinkingContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `alias` to `namespace.table`
    pub fn link(mut self, alias: &'static str, namespace: &'static str, table: &'static str) -> Self {
        self.aliases.retain(|(a, _, _)| *a != alias);
        self.aliases.push((alias, namespace, table));
        self
    }

    /// The aliases the optogenetics workflow exposes to its elements
    pub fn workflow() -> Self {
        Self::new()
            .link("Lab", lab::NAME, "lab")
            .link("User", lab::NAME, "user")
            .link("Experimenter", lab::NAME, "user")
            .link("Project", lab::NAME, "project")
            .link("Protocol", lab::NAME, "protocol")
            .link("Source", lab::NAME, "source")
            .link("Device", reference::NAME, "device")
            .link("Subject", subject::NAME, "subject")
            .link("Implantation", surgery::NAME, "implantation")
            .link("Session", session::NAME, "session")
            .link("BehaviorRecording", event::NAME, "behavior_recording")
            .link("Event", event::NAME, "event")
    }

    /// Resolve an alias to `(namespace, table)`
    pub fn resolve(&self, alias: &str) -> Option<(&'static str, &'static str)> {
        self.aliases
            .iter()
            .find(|(a, _, _)| *a == alias)
            .map(|(_, ns, table)| (*ns, *table))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_module_names_unique() {
        let names: HashSet<&str> = workflow_modules()
            .iter()
            .map(|m| m.describe().name)
            .collect();
        assert_eq!(names.len(), workflow_modules().len());
    }

    #[test]
    fn test_linked_aliases_resolve() {
        let linking = LinkingContext::workflow();
        for module in workflow_modules() {
            for table in module.tables() {
                for fk in table.foreign_keys {
                    if let TableRef::Linked(alias) = fk.target {
                        assert!(
                            linking.resolve(alias).is_some(),
                            "{}.{} uses unknown alias {}",
                            module.describe().name,
                            table.name,
                            alias
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_foreign_key_columns_declared() {
        for module in workflow_modules() {
            for table in module.tables() {
                for fk in table.foreign_keys {
                    for (local, _) in fk.columns {
                        assert!(
                            table.column(local).is_some(),
                            "{}.{} foreign key column {} is not an attribute",
                            module.describe().name,
                            table.name,
                            local
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_lookup_contents_match_columns() {
        for module in workflow_modules() {
            for table in module.tables() {
                for row in table.contents {
                    assert_eq!(row.len(), table.columns.len(), "{}", table.name);
                }
            }
        }
    }

    #[test]
    fn test_link_rebinds_alias() {
        let linking = LinkingContext::new()
            .link("User", "lab", "user")
            .link("User", "lab", "lab_member");
        assert_eq!(linking.resolve("User"), Some(("lab", "lab_member")));
        assert_eq!(linking.resolve("Missing"), None);
    }
}
