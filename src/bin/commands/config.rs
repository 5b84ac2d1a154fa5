use super::print_json;
use anyhow::Result;
use clap::Args;
use opto_workflow::database::{DatabaseConn, SchemaManager, SchemaStatus};
use opto_workflow::{OutputFormat, WorkflowConfig};
use serde::Serialize;
use std::path::Path;

/// Arguments for the Config command
#[derive(Args)]
pub struct ConfigArgs {
    /// Also list the schemas recorded in the database
    #[clap(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Serialize)]
struct ConfigInfo {
    #[serde(flatten)]
    settings: WorkflowConfig,
    user_data_exists: bool,
    database: DatabaseInfo,
}

#[derive(Debug, Serialize)]
struct DatabaseInfo {
    exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    size_bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    foreign_keys: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    layout_version: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    schemas: Option<Vec<SchemaInfo>>,
}

#[derive(Debug, Serialize)]
struct SchemaInfo {
    schema: String,
    namespace: String,
}

fn database_info(config: &WorkflowConfig, verbose: bool) -> Result<DatabaseInfo> {
    let path = match config.database_path.as_deref() {
        Some(p) if Path::new(p).exists() => p,
        _ => {
            return Ok(DatabaseInfo {
                exists: false,
                size_bytes: None,
                foreign_keys: None,
                layout_version: None,
                schemas: None,
            })
        }
    };

    let db = DatabaseConn::open(Some(path))?;
    let manager = SchemaManager::new(&db.conn);
    let layout_version = match manager.check_status()? {
        SchemaStatus::NotInitialized => None,
        SchemaStatus::Current => Some(opto_workflow::database::SCHEMA_VERSION),
        SchemaStatus::Incompatible {
            database_version, ..
        } => Some(database_version),
    };

    let schemas = if verbose && layout_version.is_some() {
        let activations = manager.activations()?;
        Some(
            activations
                .into_iter()
                .map(|(schema, namespace)| SchemaInfo { schema, namespace })
                .collect(),
        )
    } else {
        None
    };

    Ok(DatabaseInfo {
        exists: true,
        size_bytes: std::fs::metadata(path).ok().map(|m| m.len()),
        foreign_keys: Some(db.foreign_keys_enabled()?),
        layout_version,
        schemas,
    })
}

pub fn run(config: &WorkflowConfig, args: ConfigArgs, output_format: OutputFormat) -> Result<()> {
    let info = ConfigInfo {
        settings: config.clone(),
        user_data_exists: config.user_data_path().is_dir(),
        database: database_info(config, args.verbose)?,
    };

    if output_format.is_json() {
        return print_json(&info, output_format);
    }

    println!("Workflow Configuration");
    println!("======================\n");
    println!("{}", config.summary());
    println!(
        "User data:          {}",
        if info.user_data_exists {
            "found"
        } else {
            "missing"
        }
    );
    println!();

    println!("SQLite Database:");
    println!(
        "  Status:           {}",
        if info.database.exists {
            "exists"
        } else {
            "not created"
        }
    );
    if let Some(size) = info.database.size_bytes {
        println!("  Size:             {} bytes", size);
    }
    if let Some(enabled) = info.database.foreign_keys {
        println!(
            "  Foreign keys:     {}",
            if enabled { "enforced" } else { "off" }
        );
    }
    if let Some(version) = info.database.layout_version {
        println!("  Layout:           v{}", version);
    }
    if let Some(ref schemas) = info.database.schemas {
        println!();
        println!("Activated Schemas:");
        for schema in schemas {
            println!("  {:<28} {}", schema.schema, schema.namespace);
        }
    }
    Ok(())
}
