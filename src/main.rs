//! SPT Tweaks: host behavior overrides for an SPT server
//!
//! Entry point. Loads the tweak config and the database snapshot,
//! initialises structured logging, starts the reference host with the
//! tweak engine loaded, and writes the tweaked snapshot and host configs
//! back out.

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::{error, info};

use spt_tweaks::config::TweakConfig;
use spt_tweaks::engine::TweaksEngine;
use spt_tweaks::host::{Server, ServerOptions};
use spt_tweaks::storage;

const BANNER: &str = r#"
 ____  ____ _____   _____                    _
/ ___||  _ \_   _| |_   _|_      _____  __ _| | _____
\___ \| |_) || |     | | \ \ /\ / / _ \/ _` | |/ / __|
 ___) |  __/ | |     | |  \ V  V /  __/ (_| |   <\__ \
|____/|_|    |_|     |_|   \_/\_/ \___|\__,_|_|\_\___/

  Host behavior overrides & deterministic loot regeneration
  v0.1.0
"#;

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let config_path = env_or("TWEAKS_CONFIG", "tweaks.toml");
    let database_path = env_or("TWEAKS_DATABASE", "database.json");
    let host_configs_path = env_or("TWEAKS_HOST_CONFIGS", "host_configs.json");
    let output_dir = PathBuf::from(env_or("TWEAKS_OUTPUT", "out"));

    let cfg = TweakConfig::load_or_create(&config_path)?;

    init_logging(&cfg);

    println!("{BANNER}");
    info!(
        config = %config_path,
        database = %database_path,
        output = %output_dir.display(),
        verbose = cfg.verbose_logging,
        "SPT Tweaks starting up"
    );

    // -- Load host data ---------------------------------------------------

    let database = storage::load_database(Some(&database_path))?;
    let host_configs = storage::load_host_configs(Some(&host_configs_path))?;

    let options = ServerOptions {
        expose_profile_health_hook: std::env::var("TWEAKS_EXPOSE_PROFILE_HOOK").is_ok(),
        seed: std::env::var("TWEAKS_SEED").ok().and_then(|s| s.parse().ok()),
        ..Default::default()
    };

    // -- Start the host with the engine loaded ---------------------------

    let engine = TweaksEngine::new(cfg);
    let mut server = Server::new(database, host_configs, options);
    if let Err(e) = server.start(&[&engine]) {
        error!(error = %e, fatal = e.is_fatal(), "Host startup aborted");
        return Err(e).context("Host startup aborted");
    }

    // -- Write results ------------------------------------------------------

    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create output dir {}", output_dir.display()))?;
    let db_out = output_dir.join("database.json");
    let configs_out = output_dir.join("host_configs.json");
    storage::save_database(server.database(), db_out.to_str())?;
    storage::save_host_configs(server.configs(), configs_out.to_str())?;

    info!(
        handlers = server.hooks().len(),
        database = %db_out.display(),
        configs = %configs_out.display(),
        "Tweaks applied"
    );
    Ok(())
}

/// Initialise the tracing subscriber with env-filter and optional JSON output.
fn init_logging(cfg: &TweakConfig) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_level = if cfg.verbose_logging {
        "spt_tweaks=debug"
    } else {
        "spt_tweaks=info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let json_logging = std::env::var("TWEAKS_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
