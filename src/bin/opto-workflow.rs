use clap::{Parser, Subcommand};
use opto_workflow::{OutputFormat, WorkflowConfig};
use tracing::Level;

mod commands;

use commands::config::ConfigArgs;
use commands::fetch::FetchArgs;
use commands::ingest::IngestArgs;
use commands::schema::SchemaArgs;

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
#[clap(propagate_version = true)]
struct Cli {
    /// configuration file path, by default ./workflow.toml is used
    #[clap(short, long, global = true)]
    config: Option<String>,

    /// Print debug information
    #[clap(long, global = true)]
    debug: bool,

    /// Output format: table, markdown, json, json-pretty
    #[clap(short, long, global = true, default_value = "table")]
    format: OutputFormat,

    #[clap(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest CSV files from the user data directory (default command).
    Ingest(IngestArgs),

    /// Show activated namespaces and table row counts.
    Status,

    /// Show table definitions of one or all namespaces.
    Schema(SchemaArgs),

    /// Print the rows of a table.
    Fetch(FetchArgs),

    /// Show the effective configuration.
    Config(ConfigArgs),
}

fn reports_progress(command: &Option<Commands>) -> bool {
    matches!(
        command,
        None | Some(Commands::Ingest(IngestArgs { quiet: false, .. }))
    )
}

fn main() {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // ingestion reports rows and tables at INFO unless `--quiet` is given
    let level = if cli.debug {
        Some(Level::DEBUG)
    } else if reports_progress(&cli.command) {
        Some(Level::INFO)
    } else {
        None
    };
    if let Some(level) = level {
        tracing_subscriber::fmt()
            .with_max_level(level)
            .with_writer(std::io::stderr)
            .init();
    }

    let config = match WorkflowConfig::new(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        None => commands::ingest::run(&config, IngestArgs::default(), cli.format),
        Some(Commands::Ingest(args)) => commands::ingest::run(&config, args, cli.format),
        Some(Commands::Status) => commands::status::run(&config, cli.format),
        Some(Commands::Schema(args)) => commands::schema::run(&config, args, cli.format),
        Some(Commands::Fetch(args)) => commands::fetch::run(&config, args, cli.format),
        Some(Commands::Config(args)) => commands::config::run(&config, args, cli.format),
    };

    if let Err(e) = result {
        eprintln!("ERROR: {:#}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ingest_reports_progress_unless_quiet() {
        assert!(reports_progress(&None));
        assert!(reports_progress(&Some(Commands::Ingest(IngestArgs::default()))));

        let quiet = IngestArgs {
            quiet: true,
            ..Default::default()
        };
        assert!(!reports_progress(&Some(Commands::Ingest(quiet))));
        assert!(!reports_progress(&Some(Commands::Status)));
    }

    #[test]
    fn test_quiet_flag_parses() {
        let cli = Cli::parse_from(["opto-workflow", "ingest", "subjects", "-q"]);
        assert!(!reports_progress(&cli.command));

        let cli = Cli::parse_from(["opto-workflow", "ingest", "subjects"]);
        assert!(reports_progress(&cli.command));
    }
}
