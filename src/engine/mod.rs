//! The tweak engine: a host mod that installs every enabled tweak.
//!
//! Before the host listens it installs the operation overrides and the chat
//! command. Once the database is loaded it edits the snapshot and config
//! blocks, then hooks the profile health sync in.

pub mod database;
pub mod overrides;
pub mod profile;

use std::sync::Arc;

use tracing::info;

use crate::config::TweakConfig;
use crate::error::Result;
use crate::host::{BeforeListenContext, DatabaseContext, HostMod};
use crate::types::ItemNames;

use self::profile::ProfileHealthUpdater;

pub struct TweaksEngine {
    config: Arc<TweakConfig>,
}

impl TweaksEngine {
    pub fn new(config: TweakConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &TweakConfig {
        &self.config
    }
}

impl HostMod for TweaksEngine {
    fn name(&self) -> &str {
        "spt-tweaks"
    }

    fn before_listen(&self, ctx: &mut BeforeListenContext<'_>) -> Result<()> {
        info!("Installing overrides");
        overrides::before_listen(ctx, &self.config)?;
        info!(handlers = ctx.hooks.len(), "Overrides installed");
        Ok(())
    }

    fn after_database_load(&self, ctx: &mut DatabaseContext<'_>) -> Result<()> {
        let names = ItemNames::from_database(ctx.database);
        info!(items = names.len(), "Item names loaded");

        database::apply(ctx.database, ctx.configs, &self.config, &names);

        if self.config.profile.enable {
            let updater = ProfileHealthUpdater::new(ctx.database.profile_templates.clone());
            profile::install(ctx, Arc::new(updater))?;
        }
        Ok(())
    }
}
