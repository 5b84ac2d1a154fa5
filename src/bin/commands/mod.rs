pub mod config;
pub mod fetch;
pub mod ingest;
pub mod schema;
pub mod status;

use anyhow::Result;
use opto_workflow::OutputFormat;
use serde::Serialize;
use tabled::settings::Style;
use tabled::Table;

/// Print `value` as JSON in the layout of `format`
pub(crate) fn print_json<T: Serialize>(value: &T, format: OutputFormat) -> Result<()> {
    println!("{}", format.to_json(value)?);
    Ok(())
}

/// Apply the table style of `format`
pub(crate) fn styled(mut table: Table, format: OutputFormat) -> String {
    match format {
        OutputFormat::Markdown => table.with(Style::markdown()),
        _ => table.with(Style::rounded()),
    };
    table.to_string()
}
