//! Pipeline composition
//!
//! The [`Composer`] validates the declared namespace graph once, then
//! activates every namespace in the fixed workflow order:
//!
//! ```text
//! lab → reference → subject → surgery → session → event → trial → optogenetics
//! ```
//!
//! The resulting [`Pipeline`] owns the database connection and the
//! [`SchemaRegistry`]; ingestion, the CLI and tests all go through it.
//!
//! ```rust,ignore
//! use opto_workflow::{Pipeline, WorkflowConfig};
//!
//! let config = WorkflowConfig::in_memory("test_");
//! let pipeline = Pipeline::compose(&config)?;
//!
//! assert_eq!(pipeline.count("reference", "device")?, 1);
//! println!("{:?}", pipeline.parents("optogenetics", "opto_protocol")?);
//! ```

mod registry;
mod table;

pub use registry::{ActiveNamespace, ResolvedForeignKey, ResolvedTable, SchemaRegistry};
pub use table::{InsertOutcome, SqliteTable, Table};

use crate::config::WorkflowConfig;
use crate::database::{DatabaseConn, SchemaManager};
use crate::error::{PipelineError, Result};
use crate::record::{Record, Row};
use crate::schema::{workflow_modules, LinkingContext, SchemaModule, TableRef};
use rusqlite::Connection;
use serde::Serialize;
use std::collections::{BTreeMap, VecDeque};
use tracing::info;

/// Activated namespaces on one backing store
pub struct Pipeline {
    db: DatabaseConn,
    prefix: String,
    linking: LinkingContext,
    registry: SchemaRegistry,
}

impl Pipeline {
    /// Open the configured store and activate every workflow namespace
    pub fn compose(config: &WorkflowConfig) -> Result<Self> {
        if let Some(dir) = config.database_dir() {
            crate::database::ensure_data_dir(&dir)?;
        }
        let db = DatabaseConn::open(config.database_path.as_deref())?;
        let mut pipeline = Pipeline::open(db, &config.database_prefix, LinkingContext::workflow())?;
        Composer::workflow().compose(&mut pipeline)?;
        Ok(pipeline)
    }

    /// Wrap a connection without activating anything
    pub fn open(db: DatabaseConn, prefix: &str, linking: LinkingContext) -> Result<Self> {
        SchemaManager::new(&db.conn).ensure_current()?;
        Ok(Self {
            db,
            prefix: prefix.to_string(),
            linking,
            registry: SchemaRegistry::new(),
        })
    }

    /// Activate `module` under the pipeline prefix
    pub fn activate(&mut self, module: &dyn SchemaModule) -> Result<()> {
        let prefix = self.prefix.clone();
        self.activate_with_prefix(module, &prefix)
    }

    pub fn activate_with_prefix(&mut self, module: &dyn SchemaModule, prefix: &str) -> Result<()> {
        module.register(&mut self.registry, &self.db.conn, &self.linking, prefix)
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    pub fn linking(&self) -> &LinkingContext {
        &self.linking
    }

    pub fn connection(&self) -> &Connection {
        &self.db.conn
    }

    /// Handle for interactive use; auto-populated tables reject inserts
    pub fn table(&self, namespace: &str, table: &str) -> Result<SqliteTable<'_>> {
        let resolved = self.registry.table(namespace, table)?;
        Ok(SqliteTable::new(&self.db.conn, resolved, false))
    }

    /// Handle for ingestion, optionally allowed to fill auto-populated tables
    pub(crate) fn ingest_table(
        &self,
        namespace: &str,
        table: &str,
        allow_direct_insert: bool,
    ) -> Result<SqliteTable<'_>> {
        let resolved = self.registry.table(namespace, table)?;
        Ok(SqliteTable::new(&self.db.conn, resolved, allow_direct_insert))
    }

    pub fn insert(&self, namespace: &str, table: &str, record: &Record) -> Result<()> {
        self.table(namespace, table)?.insert(record)
    }

    pub fn count(&self, namespace: &str, table: &str) -> Result<u64> {
        self.table(namespace, table)?.count()
    }

    pub fn fetch(&self, namespace: &str, table: &str) -> Result<Vec<Row>> {
        self.table(namespace, table)?.fetch()
    }

    pub fn full_table_name(&self, namespace: &str, table: &str) -> Result<String> {
        Ok(self.registry.table(namespace, table)?.full_name.clone())
    }

    /// Full names of the tables `namespace.table` references
    pub fn parents(&self, namespace: &str, table: &str) -> Result<Vec<String>> {
        Ok(self.registry.table(namespace, table)?.parents())
    }

    /// Row counts of every activated table
    pub fn status(&self) -> Result<Vec<NamespaceStatus>> {
        let mut status = Vec::new();
        for ns in self.registry.namespaces() {
            let mut tables = Vec::with_capacity(ns.tables.len());
            for table in &ns.tables {
                let handle = SqliteTable::new(&self.db.conn, table, false);
                tables.push(TableStatus {
                    table: table.def.name.to_string(),
                    full_name: table.full_name.clone(),
                    rows: handle.count()?,
                });
            }
            status.push(NamespaceStatus {
                namespace: ns.descriptor.name.to_string(),
                schema: ns.schema_name.clone(),
                tables,
            });
        }
        Ok(status)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NamespaceStatus {
    pub namespace: String,
    pub schema: String,
    pub tables: Vec<TableStatus>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TableStatus {
    pub table: String,
    pub full_name: String,
    pub rows: u64,
}

/// Drives namespace activation for a fixed list of modules
pub struct Composer {
    modules: Vec<&'static dyn SchemaModule>,
}

impl Composer {
    pub fn new(modules: Vec<&'static dyn SchemaModule>) -> Self {
        Self { modules }
    }

    /// The optogenetics workflow modules in activation order
    pub fn workflow() -> Self {
        Self::new(workflow_modules())
    }

    /// Check the declared graph and return a topological order of namespaces
    ///
    /// Every dependency must name a known module, every linked alias must
    /// land in a declared dependency, and the graph must be acyclic.
    pub fn validate(&self, linking: &LinkingContext) -> Result<Vec<&'static str>> {
        let mut in_degree: BTreeMap<&'static str, usize> = BTreeMap::new();
        let mut dependents: BTreeMap<&'static str, Vec<&'static str>> = BTreeMap::new();

        for module in &self.modules {
            let descriptor = module.describe();
            if in_degree.insert(descriptor.name, 0).is_some() {
                return Err(PipelineError::InvalidDependencyGraph(format!(
                    "namespace {} declared twice",
                    descriptor.name
                )));
            }
        }

        for module in &self.modules {
            let descriptor = module.describe();
            for dependency in descriptor.dependencies {
                if !in_degree.contains_key(dependency) {
                    return Err(PipelineError::InvalidDependencyGraph(format!(
                        "{} depends on unknown namespace {}",
                        descriptor.name, dependency
                    )));
                }
                dependents.entry(*dependency).or_default().push(descriptor.name);
            }
            if let Some(degree) = in_degree.get_mut(descriptor.name) {
                *degree = descriptor.dependencies.len();
            }

            for table in module.tables() {
                for fk in table.foreign_keys {
                    let TableRef::Linked(alias) = fk.target else {
                        continue;
                    };
                    match linking.resolve(alias) {
                        Some((namespace, _)) if descriptor.dependencies.contains(&namespace) => {}
                        Some((namespace, _)) => {
                            return Err(PipelineError::InvalidDependencyGraph(format!(
                                "{}.{} links {} from {}, which is not a declared dependency",
                                descriptor.name, table.name, alias, namespace
                            )))
                        }
                        None => {
                            return Err(PipelineError::InvalidDependencyGraph(format!(
                                "{}.{} uses unknown alias {}",
                                descriptor.name, table.name, alias
                            )))
                        }
                    }
                }
            }
        }

        let mut ready: VecDeque<&'static str> = in_degree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(name, _)| *name)
            .collect();
        let mut order = Vec::with_capacity(in_degree.len());

        while let Some(name) = ready.pop_front() {
            order.push(name);
            for dependent in dependents.get(name).into_iter().flatten() {
                if let Some(degree) = in_degree.get_mut(dependent) {
                    *degree -= 1;
                    if *degree == 0 {
                        ready.push_back(*dependent);
                    }
                }
            }
        }

        if order.len() != in_degree.len() {
            let cyclic: Vec<&str> = in_degree
                .iter()
                .filter(|(_, degree)| **degree > 0)
                .map(|(name, _)| *name)
                .collect();
            return Err(PipelineError::InvalidDependencyGraph(format!(
                "dependency cycle among {}",
                cyclic.join(", ")
            )));
        }

        Ok(order)
    }

    /// Validate, then activate every module in declared order
    pub fn compose(&self, pipeline: &mut Pipeline) -> Result<()> {
        self.validate(pipeline.linking())?;
        for module in &self.modules {
            pipeline.activate(*module)?;
        }
        info!(
            "pipeline composed with prefix '{}': {} namespaces",
            pipeline.prefix(),
            self.modules.len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{
        event, lab, optogenetics, reference, session, subject, surgery, trial,
        NamespaceDescriptor, TableDef,
    };

    fn empty_pipeline() -> Pipeline {
        let db = DatabaseConn::open_in_memory().unwrap();
        Pipeline::open(db, "test_", LinkingContext::workflow()).unwrap()
    }

    fn composed() -> Pipeline {
        Pipeline::compose(&WorkflowConfig::in_memory("test_")).unwrap()
    }

    #[test]
    fn test_compose_activates_all() {
        let pipeline = composed();
        let names: Vec<&str> = pipeline
            .registry()
            .namespaces()
            .map(|ns| ns.descriptor.name)
            .collect();
        assert_eq!(
            names,
            vec!["lab", "reference", "subject", "surgery", "session", "event", "trial", "optogenetics"]
        );
        assert_eq!(
            pipeline.full_table_name("optogenetics", "opto_event").unwrap(),
            "test_opto__opto_event"
        );
    }

    #[test]
    fn test_validate_order_is_linear_extension() {
        let order = Composer::workflow()
            .validate(&LinkingContext::workflow())
            .unwrap();
        let position = |name: &str| order.iter().position(|n| *n == name).unwrap();

        for module in workflow_modules() {
            let descriptor = module.describe();
            for dependency in descriptor.dependencies {
                assert!(position(dependency) < position(descriptor.name));
            }
        }
    }

    #[test]
    fn test_out_of_order_activation_fails() {
        let modules = workflow_modules();
        // every ordered pair (a, b) where b is a declared dependency of a
        for module in &modules {
            for dependency in module.describe().dependencies {
                let mut pipeline = empty_pipeline();
                let err = pipeline.activate(*module).unwrap_err();
                assert!(
                    matches!(err, PipelineError::DependencyNotActive { .. }),
                    "{} activated before {}",
                    module.describe().name,
                    dependency
                );
                let leaked = pipeline
                    .connection()
                    .query_row(
                        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name LIKE ?1",
                        [format!("test_{}__%", module.describe().schema)],
                        |row| row.get::<_, i64>(0),
                    )
                    .unwrap();
                assert_eq!(leaked, 0);
            }
        }
    }

    #[test]
    fn test_optogenetics_before_session_fails() {
        let mut pipeline = empty_pipeline();
        for module in [&lab::Lab as &dyn SchemaModule, &reference::Reference, &subject::Subject, &surgery::Surgery] {
            pipeline.activate(module).unwrap();
        }

        let err = pipeline.activate(&optogenetics::Optogenetics).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::DependencyNotActive { ref dependency, .. } if dependency == "session"
        ));

        pipeline.activate(&session::Session).unwrap();
        pipeline.activate(&optogenetics::Optogenetics).unwrap();
        assert!(pipeline.registry().is_active("optogenetics"));
        assert!(!pipeline.registry().is_active("event"));
    }

    #[test]
    fn test_trial_requires_event() {
        let mut pipeline = empty_pipeline();
        for module in [&lab::Lab as &dyn SchemaModule, &subject::Subject, &session::Session] {
            pipeline.activate(module).unwrap();
        }
        assert!(pipeline.activate(&trial::Trial).is_err());
        pipeline.activate(&event::Event).unwrap();
        pipeline.activate(&trial::Trial).unwrap();
    }

    #[test]
    fn test_recompose_keeps_device_seed() {
        let mut pipeline = composed();
        Composer::workflow().compose(&mut pipeline).unwrap();
        assert_eq!(pipeline.count("reference", "device").unwrap(), 1);

        let rows = pipeline.fetch("reference", "device").unwrap();
        assert_eq!(rows[0].get("device"), Some(&crate::record::Value::from("OPTG_4")));
    }

    #[test]
    fn test_prefix_conflict_on_reactivation() {
        let mut pipeline = composed();
        let err = pipeline
            .activate_with_prefix(&reference::Reference, "other_")
            .unwrap_err();
        assert!(matches!(err, PipelineError::PrefixConflict { .. }));
    }

    #[test]
    fn test_parents_match_upstream_links() {
        let pipeline = composed();

        let session_parents = pipeline.parents("session", "session").unwrap();
        assert_eq!(session_parents, vec!["test_subject__subject".to_string()]);

        let implantation_parents = pipeline.parents("surgery", "implantation").unwrap();
        assert!(implantation_parents.contains(&"test_subject__subject".to_string()));

        let protocol_parents = pipeline.parents("optogenetics", "opto_protocol").unwrap();
        for parent in [
            "test_session__session",
            "test_opto__opto_stim_params",
            "test_surgery__implantation",
            "test_reference__device",
        ] {
            assert!(
                protocol_parents.contains(&parent.to_string()),
                "opto_protocol parents missing {}",
                parent
            );
        }
    }

    #[test]
    fn test_device_insert_and_lookup_contents() {
        let pipeline = composed();
        pipeline
            .insert(
                "reference",
                "device",
                &Record::new()
                    .with("device", "OPTG_8")
                    .with("modality", "Optogenetics")
                    .with("description", "8 channel pulse sequence device"),
            )
            .unwrap();
        assert_eq!(pipeline.count("reference", "device").unwrap(), 2);
        assert_eq!(pipeline.count("surgery", "hemisphere").unwrap(), 3);
        assert_eq!(pipeline.count("optogenetics", "opto_waveform_type").unwrap(), 3);
    }

    #[test]
    fn test_interactive_insert_into_imported_table_denied() {
        let pipeline = composed();
        let err = pipeline
            .insert(
                "trial",
                "trial_type",
                &Record::new().with("trial_type", "stim"),
            )
            .and_then(|_| {
                pipeline.insert(
                    "trial",
                    "block",
                    &Record::new()
                        .with("subject", "subject3")
                        .with("session_id", 1i64)
                        .with("block_id", 1i64)
                        .with("block_start_time", 0.0)
                        .with("block_stop_time", 10.0),
                )
            })
            .unwrap_err();
        assert!(matches!(err, PipelineError::DirectInsertDenied { .. }));
    }

    #[test]
    fn test_status_lists_namespaces() {
        let pipeline = composed();
        let status = pipeline.status().unwrap();
        assert_eq!(status.len(), 8);
        let reference = status.iter().find(|s| s.namespace == "reference").unwrap();
        assert_eq!(reference.schema, "test_reference");
        assert_eq!(reference.tables[0].rows, 1);
    }

    struct Looping(&'static str, &'static [&'static str]);

    impl SchemaModule for Looping {
        fn describe(&self) -> NamespaceDescriptor {
            NamespaceDescriptor {
                name: self.0,
                schema: self.0,
                dependencies: self.1,
            }
        }

        fn tables(&self) -> &'static [TableDef] {
            &[]
        }
    }

    static LOOP_A: Looping = Looping("a", &["b"]);
    static LOOP_B: Looping = Looping("b", &["a"]);
    static DANGLING: Looping = Looping("c", &["missing"]);

    #[test]
    fn test_validate_rejects_cycle() {
        let composer = Composer::new(vec![&LOOP_A as &dyn SchemaModule, &LOOP_B]);
        let err = composer.validate(&LinkingContext::new()).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidDependencyGraph(ref msg) if msg.contains("cycle")));
    }

    #[test]
    fn test_validate_rejects_unknown_dependency() {
        let composer = Composer::new(vec![&DANGLING as &dyn SchemaModule]);
        let err = composer.validate(&LinkingContext::new()).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidDependencyGraph(ref msg) if msg.contains("missing")));
    }
}
