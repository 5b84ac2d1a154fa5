use anyhow::{anyhow, Result};
use config::Config;
use serde::Serialize;
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG_FILE: &str = "workflow.toml";
const DEFAULT_USER_DATA_DIR: &str = "./user_data";
const DEFAULT_DATABASE_FILE: &str = "workflow.sqlite3";
/// `database.path` value selecting a throwaway in-memory store
pub const IN_MEMORY_PATH: &str = ":memory:";

const PREFIX_ENV: &str = "DATABASE_PREFIX";
const ROOT_DATA_DIR_ENV: &str = "OPTO_ROOT_DATA_DIR";

pub const EMPTY_CONFIG: &str = r#"### opto-workflow configuration file

[database]
### SQLite database file, ":memory:" for a throwaway in-memory database
# path = "~/.opto-workflow/workflow.sqlite3"

[custom]
### directory holding the CSV files read by `ingest`
# user_data_dir = "./user_data"

### root directory of raw optogenetics data
# opto_root_data_dir = "/data/opto"

[custom.database]
### prefix prepended to every schema name (env: DATABASE_PREFIX)
# prefix = "neuro_"
"#;

/// Settings shared by the composer, ingestion and the CLI
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowConfig {
    /// SQLite file, `None` for an in-memory database
    pub database_path: Option<String>,

    /// Prefix of every schema name
    pub database_prefix: String,

    /// Directory holding the ingestion CSV files
    pub user_data_dir: String,

    /// Root directory of raw optogenetics data
    pub opto_root_data_dir: Option<String>,
}

fn default_database_path() -> String {
    let home_dir = dirs::home_dir()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|| ".".to_string());
    format!("{}/.opto-workflow/{}", home_dir, DEFAULT_DATABASE_FILE)
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            database_path: Some(default_database_path()),
            database_prefix: String::new(),
            user_data_dir: DEFAULT_USER_DATA_DIR.to_string(),
            opto_root_data_dir: None,
        }
    }
}

impl WorkflowConfig {
    /// Load configuration from `path`, or the default locations, then the environment
    ///
    /// Without an explicit path, `./workflow.toml` is tried first, then
    /// `<config dir>/opto-workflow/workflow.toml`. Missing files are not an error.
    pub fn new(path: &Option<String>) -> Result<WorkflowConfig> {
        let file = match path {
            Some(p) => {
                if !Path::new(p).exists() {
                    return Err(anyhow!("Configuration file {} does not exist", p));
                }
                Some(PathBuf::from(p))
            }
            None => Self::default_config_file(),
        };

        Self::build(
            file.as_deref(),
            std::env::var(PREFIX_ENV).ok(),
            std::env::var(ROOT_DATA_DIR_ENV).ok(),
        )
    }

    /// Assemble settings from an optional TOML file plus explicit overrides
    pub fn build(
        file: Option<&Path>,
        prefix_override: Option<String>,
        root_data_dir_override: Option<String>,
    ) -> Result<WorkflowConfig> {
        let mut builder = Config::builder()
            .set_default("custom.user_data_dir", DEFAULT_USER_DATA_DIR)
            .and_then(|b| b.set_default("database.path", default_database_path()))
            .map_err(|e| anyhow!("Failed to set configuration default: {}", e))?;

        if let Some(file) = file {
            builder = builder.add_source(config::File::from(file).required(true));
        }

        builder = builder
            .set_override_option("custom.database.prefix", prefix_override)
            .and_then(|b| b.set_override_option("custom.opto_root_data_dir", root_data_dir_override))
            .map_err(|e| anyhow!("Failed to apply environment overrides: {}", e))?;

        let settings = builder
            .build()
            .map_err(|e| anyhow!("Failed to build configuration: {}", e))?;

        let database_path = settings
            .get_string("database.path")
            .ok()
            .filter(|p| p != IN_MEMORY_PATH)
            .map(|p| expand_home(&p));
        let database_prefix = settings
            .get_string("custom.database.prefix")
            .unwrap_or_default();
        let user_data_dir = settings
            .get_string("custom.user_data_dir")
            .map(|p| expand_home(&p))
            .map_err(|e| anyhow!("Invalid custom.user_data_dir: {}", e))?;
        let opto_root_data_dir = settings
            .get_string("custom.opto_root_data_dir")
            .ok()
            .filter(|p| !p.is_empty())
            .map(|p| expand_home(&p));

        Ok(WorkflowConfig {
            database_path,
            database_prefix,
            user_data_dir,
            opto_root_data_dir,
        })
    }

    /// In-memory store with the given prefix
    pub fn in_memory(prefix: &str) -> Self {
        Self {
            database_path: None,
            database_prefix: prefix.to_string(),
            ..Default::default()
        }
    }

    fn default_config_file() -> Option<PathBuf> {
        let local = PathBuf::from(DEFAULT_CONFIG_FILE);
        if local.exists() {
            return Some(local);
        }
        dirs::config_dir()
            .map(|d| d.join("opto-workflow").join(DEFAULT_CONFIG_FILE))
            .filter(|p| p.exists())
    }

    /// Directory that must exist before the database file is opened
    pub fn database_dir(&self) -> Option<String> {
        let path = Path::new(self.database_path.as_deref()?);
        path.parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(|p| p.to_string_lossy().to_string())
    }

    pub fn user_data_path(&self) -> PathBuf {
        PathBuf::from(&self.user_data_dir)
    }

    /// Root directory of raw optogenetics data, if configured
    pub fn opto_root_data_dir(&self) -> Option<PathBuf> {
        self.opto_root_data_dir.as_ref().map(PathBuf::from)
    }

    /// Display configuration summary
    pub fn summary(&self) -> String {
        let lines = [
            format!(
                "Database:           {}",
                self.database_path.as_deref().unwrap_or("(in-memory)")
            ),
            format!(
                "Schema Prefix:      {}",
                if self.database_prefix.is_empty() {
                    "(none)"
                } else {
                    self.database_prefix.as_str()
                }
            ),
            format!("User Data Dir:      {}", self.user_data_dir),
            format!(
                "Opto Root Data Dir: {}",
                self.opto_root_data_dir.as_deref().unwrap_or("(not set)")
            ),
        ];
        lines.join("\n")
    }
}

fn expand_home(path: &str) -> String {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest).to_string_lossy().to_string(),
        _ => path.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config() {
        let config = WorkflowConfig::default();
        assert!(config
            .database_path
            .as_deref()
            .is_some_and(|p| p.ends_with(".opto-workflow/workflow.sqlite3")));
        assert_eq!(config.database_prefix, "");
        assert_eq!(config.user_data_dir, "./user_data");
        assert_eq!(config.opto_root_data_dir(), None);
    }

    #[test]
    fn test_build_without_file() {
        let config = WorkflowConfig::build(None, None, None).unwrap();
        assert_eq!(config.user_data_dir, "./user_data");
        assert_eq!(config.database_prefix, "");
        // without a file the store persists between runs
        assert_eq!(config.database_path, Some(default_database_path()));
        assert!(config
            .database_dir()
            .is_some_and(|d| d.ends_with(".opto-workflow")));
    }

    #[test]
    fn test_memory_path_selects_in_memory_store() {
        let file = write_config(
            r#"
[database]
path = ":memory:"
"#,
        );
        let config = WorkflowConfig::build(Some(file.path()), None, None).unwrap();
        assert_eq!(config.database_path, None);
        assert_eq!(config.database_dir(), None);
        assert!(config.summary().contains("(in-memory)"));
    }

    #[test]
    fn test_build_from_file() {
        let file = write_config(
            r#"
[database]
path = "/tmp/opto/workflow.sqlite3"

[custom]
user_data_dir = "/srv/user_data"
opto_root_data_dir = "/data/opto"

[custom.database]
prefix = "neuro_"
"#,
        );

        let config = WorkflowConfig::build(Some(file.path()), None, None).unwrap();
        assert_eq!(config.database_path.as_deref(), Some("/tmp/opto/workflow.sqlite3"));
        assert_eq!(config.database_prefix, "neuro_");
        assert_eq!(config.user_data_dir, "/srv/user_data");
        assert_eq!(config.opto_root_data_dir(), Some(PathBuf::from("/data/opto")));
        assert_eq!(config.database_dir().as_deref(), Some("/tmp/opto"));
    }

    #[test]
    fn test_overrides_win_over_file() {
        let file = write_config(
            r#"
[custom.database]
prefix = "file_"
"#,
        );

        let config = WorkflowConfig::build(
            Some(file.path()),
            Some("env_".to_string()),
            Some("/mnt/raw".to_string()),
        )
        .unwrap();
        assert_eq!(config.database_prefix, "env_");
        assert_eq!(config.opto_root_data_dir.as_deref(), Some("/mnt/raw"));
    }

    #[test]
    fn test_empty_config_template_parses() {
        let file = write_config(EMPTY_CONFIG);
        let config = WorkflowConfig::build(Some(file.path()), None, None).unwrap();
        assert_eq!(config.database_path, Some(default_database_path()));
        assert_eq!(config.user_data_dir, "./user_data");
    }

    #[test]
    fn test_missing_explicit_file() {
        let result = WorkflowConfig::new(&Some("/nonexistent/workflow.toml".to_string()));
        assert!(result.is_err());
    }

    #[test]
    fn test_in_memory_database_dir() {
        let config = WorkflowConfig::in_memory("test_");
        assert_eq!(config.database_dir(), None);
        assert_eq!(config.database_prefix, "test_");
        assert!(config.summary().contains("(in-memory)"));
    }

    #[test]
    fn test_expand_home() {
        assert_eq!(expand_home("/abs/path"), "/abs/path");
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home("~/x.db"), home.join("x.db").to_string_lossy());
        }
    }
}
