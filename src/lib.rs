#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

//! opto-workflow - optogenetics experiment pipeline
//!
//! opto-workflow composes the namespaces of an optogenetics experiment
//! (lab, subjects, surgeries, sessions, behavior events, trials and
//! stimulation protocols) into one SQLite store, and bulk-loads them from
//! CSV files. It can be used as both a command-line application and a
//! library.
//!
//! # Feature Flags
//!
//! | Feature | Description | Key Dependencies |
//! |---------|-------------|------------------|
//! | (none)  | Composer, ingestion, SQLite store | `rusqlite`, `csv`, `config` |
//! | `cli`   | `opto-workflow` binary, table output | `clap`, `tabled`, `tracing-subscriber` |
//!
//! ```toml
//! # Library only
//! opto-workflow = { version = "0.1", default-features = false }
//! ```
//!
//! # Architecture
//!
//! - **[`schema`]**: static table definitions of every namespace, and the
//!   linking context that binds cross-namespace aliases (`Subject`, `Session`, ...)
//! - **[`pipeline`]**: the composer that activates namespaces in dependency
//!   order, and the uniform [`Table`] handle used for inserts and queries
//! - **[`ingest`]**: CSV manifests and the `ingest_*` stages
//! - **[`database`]**: SQLite connection and workflow metadata
//! - **[`config`]**: configuration management
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use opto_workflow::ingest::{ingest_all, IngestOptions, UserDataPaths};
//! use opto_workflow::{Pipeline, WorkflowConfig};
//!
//! let config = WorkflowConfig::new(&None)?;
//! let pipeline = Pipeline::compose(&config)?;
//!
//! let paths = UserDataPaths::in_dir(config.user_data_path());
//! for report in ingest_all(&pipeline, &paths, &IngestOptions::default())? {
//!     println!("{}: {} rows inserted", report.stage, report.inserted());
//! }
//!
//! for row in pipeline.fetch("optogenetics", "opto_event")? {
//!     println!("{:?}", row.values);
//! }
//! ```

pub mod config;
pub mod database;
pub mod error;
pub mod ingest;
pub mod output;
pub mod pipeline;
pub mod record;
pub mod schema;

// =============================================================================
// Configuration and errors
// =============================================================================

pub use config::WorkflowConfig;
pub use error::{PipelineError, Result};

// =============================================================================
// Composition
// =============================================================================

pub use pipeline::{
    Composer, InsertOutcome, NamespaceStatus, Pipeline, SchemaRegistry, SqliteTable, Table,
    TableStatus,
};
pub use schema::{LinkingContext, SchemaModule};

// =============================================================================
// Records and output
// =============================================================================

pub use output::OutputFormat;
pub use record::{NaturalKey, Record, Row, Value};

// =============================================================================
// Ingestion
// =============================================================================

pub use ingest::{
    ingest_all, ingest_events, ingest_opto, ingest_sessions, ingest_subjects, IngestOptions,
    StageReport, UserDataPaths,
};
