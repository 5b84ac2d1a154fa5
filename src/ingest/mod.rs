//! Bulk CSV ingestion
//!
//! Each stage reads a fixed set of CSV files and inserts their rows into the
//! activated tables named by its [`Manifest`]:
//!
//! | stage    | files                                                       |
//! |----------|-------------------------------------------------------------|
//! | subjects | `subjects.csv`                                              |
//! | sessions | `sessions.csv`                                              |
//! | events   | `behavior_recordings.csv`, `blocks.csv`, `trials.csv`, `events.csv` |
//! | opto     | `opto_waveforms.csv`, `opto_surgeries.csv`, `opto_sessions.csv`, `opto_events.csv` |
//!
//! Stages stop at the first failing row. Rows inserted before the failure
//! stay in the store; re-running with `skip_duplicates` picks up where the
//! previous run stopped.

mod csv_source;
mod manifest;
mod report;

pub use manifest::{EventCsvPaths, Manifest, ManifestEntry, OptoCsvPaths, Stage, UserDataPaths};
pub use report::{StageReport, TableReport};

use crate::error::Result;
use crate::pipeline::{InsertOutcome, Pipeline, Table};
use csv_source::CsvSource;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Options shared by every stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestOptions {
    /// Skip rows whose natural key already exists instead of failing
    pub skip_duplicates: bool,
    /// Log every row and a per-table summary
    pub verbose: bool,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            skip_duplicates: true,
            verbose: true,
        }
    }
}

/// Ingest every entry of `manifest`, in order
pub fn ingest_manifest(
    pipeline: &Pipeline,
    manifest: &Manifest,
    options: &IngestOptions,
) -> Result<StageReport> {
    info!(
        "ingesting {}: {} tables from {} files",
        manifest.stage,
        manifest.entries.len(),
        manifest.files().len()
    );

    let mut sources: HashMap<PathBuf, CsvSource> = HashMap::new();
    let mut report = StageReport::new(manifest.stage);

    for entry in &manifest.entries {
        let source = match sources.entry(entry.file.clone()) {
            Entry::Occupied(slot) => slot.into_mut(),
            Entry::Vacant(slot) => {
                debug!("reading {}", entry.file.display());
                slot.insert(CsvSource::read(&entry.file)?)
            }
        };

        let table = pipeline.ingest_table(entry.namespace, entry.table, manifest.allow_direct_insert)?;
        let records = source.project(table.resolved())?;

        let mut table_report = TableReport {
            table: table.full_name().to_string(),
            source: source.path().display().to_string(),
            rows: source.len(),
            inserted: 0,
            skipped: 0,
        };

        for record in &records {
            let outcome = table.insert_or_skip(record, options.skip_duplicates)?;
            match outcome {
                InsertOutcome::Inserted => table_report.inserted += 1,
                InsertOutcome::Skipped => table_report.skipped += 1,
            }
            if options.verbose {
                info!("{} {:?}: {:?}", table.full_name(), outcome, record);
            }
        }

        if options.verbose {
            info!(
                "{}: inserted {} of {} rows from {} ({} skipped)",
                table_report.table,
                table_report.inserted,
                table_report.rows,
                table_report.source,
                table_report.skipped
            );
        }
        report.tables.push(table_report);
    }

    info!(
        "stage {} completed: {} inserted, {} skipped",
        report.stage,
        report.inserted(),
        report.skipped()
    );
    Ok(report)
}

/// Subjects from the `subject` column layout of `subjects.csv`
pub fn ingest_subjects(
    pipeline: &Pipeline,
    subjects_csv: impl AsRef<Path>,
    options: &IngestOptions,
) -> Result<StageReport> {
    ingest_manifest(pipeline, &Manifest::subjects(subjects_csv.as_ref()), options)
}

pub fn ingest_sessions(
    pipeline: &Pipeline,
    sessions_csv: impl AsRef<Path>,
    options: &IngestOptions,
) -> Result<StageReport> {
    ingest_manifest(pipeline, &Manifest::sessions(sessions_csv.as_ref()), options)
}

/// Behavior recordings, blocks, trials and events
///
/// Blocks, trials and events are imported tables; this is the only stage
/// that inserts into them directly.
pub fn ingest_events(
    pipeline: &Pipeline,
    paths: &EventCsvPaths,
    options: &IngestOptions,
) -> Result<StageReport> {
    ingest_manifest(pipeline, &Manifest::events(paths), options)
}

pub fn ingest_opto(
    pipeline: &Pipeline,
    paths: &OptoCsvPaths,
    options: &IngestOptions,
) -> Result<StageReport> {
    ingest_manifest(pipeline, &Manifest::opto(paths), options)
}

/// Run one named stage against the files of `paths`
pub fn ingest_stage(
    pipeline: &Pipeline,
    stage: Stage,
    paths: &UserDataPaths,
    options: &IngestOptions,
) -> Result<StageReport> {
    match stage {
        Stage::Subjects => ingest_subjects(pipeline, &paths.subjects, options),
        Stage::Sessions => ingest_sessions(pipeline, &paths.sessions, options),
        Stage::Events => ingest_events(pipeline, &paths.events, options),
        Stage::Opto => ingest_opto(pipeline, &paths.opto, options),
    }
}

/// Subjects, sessions, events, then opto; the first failing stage aborts the run
pub fn ingest_all(
    pipeline: &Pipeline,
    paths: &UserDataPaths,
    options: &IngestOptions,
) -> Result<Vec<StageReport>> {
    let mut reports = Vec::with_capacity(Stage::ALL.len());
    for stage in Stage::ALL {
        reports.push(ingest_stage(pipeline, stage, paths, options)?);
    }
    Ok(reports)
}
