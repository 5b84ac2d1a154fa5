use super::{print_json, styled};
use anyhow::Result;
use opto_workflow::{OutputFormat, Pipeline, WorkflowConfig};
use tabled::{Table, Tabled};

#[derive(Tabled)]
struct StatusRow {
    #[tabled(rename = "Namespace")]
    namespace: String,
    #[tabled(rename = "Table")]
    table: String,
    #[tabled(rename = "Stored As")]
    full_name: String,
    #[tabled(rename = "Rows")]
    rows: u64,
}

pub fn run(config: &WorkflowConfig, output_format: OutputFormat) -> Result<()> {
    let pipeline = Pipeline::compose(config)?;
    let status = pipeline.status()?;

    if output_format.is_json() {
        return print_json(&status, output_format);
    }

    let rows: Vec<StatusRow> = status
        .iter()
        .flat_map(|ns| {
            ns.tables.iter().map(move |t| StatusRow {
                namespace: ns.namespace.clone(),
                table: t.table.clone(),
                full_name: t.full_name.clone(),
                rows: t.rows,
            })
        })
        .collect();
    println!("{}", styled(Table::new(rows), output_format));
    Ok(())
}
