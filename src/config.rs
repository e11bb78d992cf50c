//! Task configuration loaded from TOML

use crate::error::{Result, SyncDiffError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Commented template written by `generate-config template`
pub const CONFIG_TEMPLATE: &str = r#"# syncdiff task configuration

[task]
# Directory receiving the comparison summary and patch files
output-dir = "./output_dir"

# Number of tables compared concurrently
threads = 4

# Simulated time spent on one chunk, in milliseconds
chunk-delay-ms = 50

# Interval between two progress repaints, in milliseconds
check-interval-ms = 200

# One entry per table to compare
[[table]]
name = "schema1.table1"
chunks = 50

[[table]]
name = "schema2.table2"
chunks = 80

# A table whose structure differs between upstream and downstream
[[table]]
name = "schema3.table3"
chunks = 10
structure-failure = true

# A table whose data differs; the check fails at the given chunk
[[table]]
name = "schema4.table4"
chunks = 50
fail-at-chunk = 40
"#;

/// Top-level task configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskConfig {
    pub task: TaskSection,
    #[serde(default, rename = "table")]
    pub tables: Vec<TableConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TaskSection {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_threads")]
    pub threads: usize,
    #[serde(default)]
    pub chunk_delay_ms: u64,
    #[serde(default = "default_check_interval_ms")]
    pub check_interval_ms: u64,
}

/// A table to compare
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TableConfig {
    pub name: String,
    pub chunks: u64,
    #[serde(default)]
    pub structure_failure: bool,
    #[serde(default)]
    pub fail_at_chunk: Option<u64>,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./output_dir")
}

fn default_threads() -> usize {
    4
}

fn default_check_interval_ms() -> u64 {
    200
}

impl TaskConfig {
    /// Load and validate a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            SyncDiffError::config(format!("Cannot read config file {}: {}", path.display(), e))
        })?;
        let config = Self::from_toml_str(&content)?;
        log::debug!(
            "Loaded config from {} with {} tables",
            path.display(),
            config.tables.len()
        );
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.tables.is_empty() {
            return Err(SyncDiffError::config("At least one [[table]] is required"));
        }
        if self.task.threads == 0 {
            return Err(SyncDiffError::config("threads must be greater than 0"));
        }
        if self.task.check_interval_ms == 0 {
            return Err(SyncDiffError::config(
                "check-interval-ms must be greater than 0",
            ));
        }

        let mut seen = HashSet::new();
        for table in &self.tables {
            if table.name.trim().is_empty() {
                return Err(SyncDiffError::config("Table names must not be empty"));
            }
            if !seen.insert(table.name.as_str()) {
                return Err(SyncDiffError::config(format!(
                    "Duplicate table name: {}",
                    table.name
                )));
            }
            if table.chunks == 0 {
                return Err(SyncDiffError::config(format!(
                    "Table {} must have at least one chunk",
                    table.name
                )));
            }
            if let Some(at) = table.fail_at_chunk {
                if at >= table.chunks {
                    return Err(SyncDiffError::config(format!(
                        "fail-at-chunk {} is out of range for table {} with {} chunks",
                        at, table.name, table.chunks
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn chunk_delay(&self) -> Duration {
        Duration::from_millis(self.task.chunk_delay_ms)
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_millis(self.task.check_interval_ms)
    }

    /// Log file referenced when the run aborts
    pub fn log_path(&self) -> PathBuf {
        self.task.output_dir.join("sync_diff_inspector.log")
    }
}
