use super::{print_json, styled};
use anyhow::{anyhow, Result};
use clap::Args;
use opto_workflow::pipeline::ResolvedTable;
use opto_workflow::{OutputFormat, Pipeline, WorkflowConfig};
use serde::Serialize;
use tabled::{Table, Tabled};

/// Arguments for the Schema command
#[derive(Args)]
pub struct SchemaArgs {
    /// Namespace to show, e.g. "surgery"; all namespaces when omitted
    #[clap(value_name = "NAMESPACE")]
    pub namespace: Option<String>,
}

#[derive(Debug, Serialize, Tabled)]
struct TableInfo {
    #[tabled(rename = "Namespace")]
    namespace: String,
    #[tabled(rename = "Table")]
    table: String,
    #[tabled(rename = "Tier")]
    tier: String,
    #[tabled(rename = "Primary Key")]
    primary_key: String,
    #[tabled(rename = "Parents")]
    parents: String,
}

impl From<&ResolvedTable> for TableInfo {
    fn from(table: &ResolvedTable) -> Self {
        let key: Vec<&str> = table.def.primary_key().map(|c| c.name).collect();
        TableInfo {
            namespace: table.namespace.to_string(),
            table: table.full_name.clone(),
            tier: format!("{:?}", table.def.tier).to_lowercase(),
            primary_key: key.join(", "),
            parents: table.parents().join(", "),
        }
    }
}

pub fn run(config: &WorkflowConfig, args: SchemaArgs, output_format: OutputFormat) -> Result<()> {
    let pipeline = Pipeline::compose(config)?;
    let registry = pipeline.registry();

    let infos: Vec<TableInfo> = match args.namespace {
        Some(name) => {
            let ns = registry
                .get(&name)
                .ok_or_else(|| anyhow!("unknown namespace '{}'", name))?;
            ns.tables.iter().map(TableInfo::from).collect()
        }
        None => registry
            .namespaces()
            .flat_map(|ns| ns.tables.iter().map(TableInfo::from))
            .collect(),
    };

    if output_format.is_json() {
        return print_json(&infos, output_format);
    }
    println!("{}", styled(Table::new(infos), output_format));
    Ok(())
}
