//! Persistence layer.
//!
//! Loads the host's database snapshot from a JSON file and writes the
//! tweaked snapshot and host config blocks back out as pretty JSON.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::{debug, info};

use crate::host::HostConfigs;
use crate::types::Database;

/// Default snapshot file path.
const DEFAULT_DATABASE_FILE: &str = "database.json";

/// Default host config file path.
const DEFAULT_CONFIGS_FILE: &str = "host_configs.json";

/// Load the database snapshot.
pub fn load_database(path: Option<&str>) -> Result<Database> {
    let path = path.unwrap_or(DEFAULT_DATABASE_FILE);
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read database from {path}"))?;
    let db: Database = serde_json::from_str(&json)
        .with_context(|| format!("Failed to parse database from {path}"))?;

    info!(
        path,
        items = db.items.len(),
        locations = db.locations.len(),
        bots = db.bots.len(),
        traders = db.traders.len(),
        "Database loaded"
    );
    Ok(db)
}

/// Save the database snapshot.
pub fn save_database(db: &Database, path: Option<&str>) -> Result<()> {
    let path = path.unwrap_or(DEFAULT_DATABASE_FILE);
    let json = serde_json::to_string_pretty(db).context("Failed to serialise database")?;
    std::fs::write(path, &json).with_context(|| format!("Failed to write database to {path}"))?;
    debug!(path, bytes = json.len(), "Database saved");
    Ok(())
}

/// Load host config blocks. Returns defaults if the file doesn't exist.
pub fn load_host_configs(path: Option<&str>) -> Result<HostConfigs> {
    let path = path.unwrap_or(DEFAULT_CONFIGS_FILE);
    if !Path::new(path).exists() {
        info!(path, "No host configs found, using defaults");
        return Ok(HostConfigs::default());
    }
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read host configs from {path}"))?;
    serde_json::from_str(&json).with_context(|| format!("Failed to parse host configs from {path}"))
}

/// Save host config blocks.
pub fn save_host_configs(configs: &HostConfigs, path: Option<&str>) -> Result<()> {
    let path = path.unwrap_or(DEFAULT_CONFIGS_FILE);
    let json = serde_json::to_string_pretty(configs).context("Failed to serialise host configs")?;
    std::fs::write(path, &json).with_context(|| format!("Failed to write host configs to {path}"))?;
    debug!(path, "Host configs saved");
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
