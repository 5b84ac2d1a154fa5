use super::{print_json, styled};
use anyhow::{anyhow, Result};
use clap::Args;
use opto_workflow::ingest::{ingest_all, ingest_stage, IngestOptions, Stage, StageReport, UserDataPaths};
use opto_workflow::{OutputFormat, Pipeline, WorkflowConfig};
use std::path::PathBuf;
use std::str::FromStr;
use tabled::Table;

/// Arguments for the Ingest command
#[derive(Args, Default)]
pub struct IngestArgs {
    /// Stage to run: all, subjects, sessions, events, opto
    #[clap(value_name = "STAGE", default_value = "all")]
    pub stage: String,

    /// Fail on rows whose key already exists instead of skipping them
    #[clap(long)]
    pub no_skip_duplicates: bool,

    /// Only print stage totals, without per-row logs or per-table summaries
    #[clap(short, long)]
    pub quiet: bool,

    /// Directory holding the CSV files, overrides custom.user_data_dir
    #[clap(long, value_name = "DIR")]
    pub user_data: Option<PathBuf>,
}

impl IngestArgs {
    pub fn options(&self) -> IngestOptions {
        IngestOptions {
            skip_duplicates: !self.no_skip_duplicates,
            verbose: !self.quiet,
        }
    }
}

pub fn run(config: &WorkflowConfig, args: IngestArgs, output_format: OutputFormat) -> Result<()> {
    let options = args.options();
    let IngestArgs {
        stage,
        quiet,
        user_data,
        ..
    } = args;

    let stage = match stage.to_lowercase().as_str() {
        "" | "all" => None,
        other => Some(Stage::from_str(other).map_err(|e| anyhow!(e))?),
    };

    let dir = user_data.unwrap_or_else(|| config.user_data_path());
    if !dir.is_dir() {
        return Err(anyhow!("user data directory {} does not exist", dir.display()));
    }
    let paths = UserDataPaths::in_dir(&dir);

    let pipeline = Pipeline::compose(config)?;
    let reports: Vec<StageReport> = match stage {
        Some(stage) => vec![ingest_stage(&pipeline, stage, &paths, &options)?],
        None => ingest_all(&pipeline, &paths, &options)?,
    };

    if output_format.is_json() {
        return print_json(&reports, output_format);
    }

    for report in &reports {
        println!(
            "Stage {}: {} inserted, {} skipped",
            report.stage,
            report.inserted(),
            report.skipped()
        );
        if !quiet && !report.tables.is_empty() {
            println!("{}", styled(Table::new(&report.tables), output_format));
        }
    }
    Ok(())
}
