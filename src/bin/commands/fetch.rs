use super::{print_json, styled};
use anyhow::Result;
use clap::Args;
use opto_workflow::output::{truncate_value, DEFAULT_VALUE_MAX_LEN};
use opto_workflow::{OutputFormat, Pipeline, Value, WorkflowConfig};
use serde_json::{Map, Value as JsonValue};
use tabled::builder::Builder;

/// Arguments for the Fetch command
#[derive(Args)]
pub struct FetchArgs {
    /// Namespace of the table, e.g. "optogenetics"
    #[clap(value_name = "NAMESPACE")]
    pub namespace: String,

    /// Table name within the namespace, e.g. "opto_event"
    #[clap(value_name = "TABLE")]
    pub table: String,

    /// Show at most this many rows
    #[clap(short, long)]
    pub limit: Option<usize>,
}

pub fn run(config: &WorkflowConfig, args: FetchArgs, output_format: OutputFormat) -> Result<()> {
    let FetchArgs {
        namespace,
        table,
        limit,
    } = args;

    let pipeline = Pipeline::compose(config)?;
    let mut rows = pipeline.fetch(&namespace, &table)?;
    if let Some(limit) = limit {
        rows.truncate(limit);
    }

    if output_format.is_json() {
        let objects: Vec<Map<String, JsonValue>> = rows
            .iter()
            .map(|row| {
                row.columns
                    .iter()
                    .cloned()
                    .zip(row.values.iter().map(|v| serde_json::json!(v)))
                    .collect()
            })
            .collect();
        return print_json(&objects, output_format);
    }

    let columns = match rows.first() {
        Some(row) => row.columns.clone(),
        None => {
            println!("{} is empty", pipeline.full_table_name(&namespace, &table)?);
            return Ok(());
        }
    };

    let mut builder = Builder::default();
    builder.push_record(columns);
    for row in &rows {
        let cells: Vec<String> = row
            .values
            .iter()
            .map(|v| match v {
                Value::Null => String::new(),
                other => truncate_value(&other.to_string(), DEFAULT_VALUE_MAX_LEN),
            })
            .collect();
        builder.push_record(cells);
    }
    println!("{}", styled(builder.build(), output_format));
    Ok(())
}
