//! Subcommands of the `invex` binary.

pub mod config;
pub mod evaluate;
pub mod normalize;
pub mod process;

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use invex_core::{ExtractionRecord, InvexConfig};

/// Location of the user configuration file.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("invex")
        .join("config.json")
}

/// Load configuration from `--config`, else the default file, else defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<InvexConfig> {
    if let Some(path) = config_path {
        debug!("Loading config from {}", path);
        return Ok(InvexConfig::from_file(Path::new(path))?);
    }

    let path = default_config_path();
    if path.exists() {
        debug!("Loading config from {}", path.display());
        Ok(InvexConfig::from_file(&path)?)
    } else {
        Ok(InvexConfig::default())
    }
}

/// Read one record or an array of records from a JSON file.
pub fn read_records(path: &Path) -> anyhow::Result<Vec<ExtractionRecord>> {
    let content = fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&content)?;

    let records: Vec<ExtractionRecord> = match value {
        Value::Array(items) => items
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<_, _>>()?,
        Value::Object(_) => vec![serde_json::from_value(value)?],
        _ => anyhow::bail!("Expected a record object or an array of records"),
    };

    debug!("Read {} records from {}", records.len(), path.display());
    Ok(records)
}
