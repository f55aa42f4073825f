//! The host boundary.
//!
//! Defines the traits a host server exposes to mods and a reference
//! [`server::Server`] that implements them:
//! - [`HostMod`]: lifecycle callbacks for the two startup phases.
//! - [`ItemFactory`]: the host's item construction primitive.
//! - [`ChatCommand`]: commands players can send through the chat.

pub mod configs;
pub mod factory;
pub mod operations;
pub mod routine;
pub mod season;
pub mod server;

use std::fmt;

use crate::error::{HostError, Result};
use crate::hooks::splice::PatchableRoutines;
use crate::hooks::HookRegistry;
use crate::types::{Database, Item, SpawnTemplate};

pub use configs::HostConfigs;
pub use factory::HostItemFactory;
pub use server::{Server, ServerOptions};

/// Builds concrete item instances from a spawn template.
#[cfg_attr(test, mockall::automock)]
pub trait ItemFactory: Send + Sync {
    /// Instantiate the candidate `item_key` of `template` together with its
    /// children. The root comes first; every returned item has a fresh id.
    fn create_item(&self, item_key: &str, template: &SpawnTemplate)
        -> std::result::Result<Vec<Item>, HostError>;
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Before the host binds its network listener. The database is not
    /// loaded yet.
    BeforeListen,
    /// After the database snapshot is loaded, before serving.
    AfterDatabaseLoad,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::BeforeListen => write!(f, "before-listen"),
            Phase::AfterDatabaseLoad => write!(f, "after-database-load"),
        }
    }
}

/// What a mod can touch before the host listens.
pub struct BeforeListenContext<'a> {
    pub hooks: &'a mut HookRegistry,
    pub configs: &'a mut HostConfigs,
    pub commands: &'a mut ChatCommands,
}

/// What a mod can touch once the database is loaded.
pub struct DatabaseContext<'a> {
    pub database: &'a mut Database,
    pub configs: &'a mut HostConfigs,
    pub hooks: &'a mut HookRegistry,
    pub routines: &'a mut dyn PatchableRoutines,
}

/// A mod loaded by the host. Both callbacks run exactly once, in phase
/// order; any error aborts host startup.
pub trait HostMod: Send + Sync {
    fn name(&self) -> &str;

    fn before_listen(&self, _ctx: &mut BeforeListenContext<'_>) -> Result<()> {
        Ok(())
    }

    fn after_database_load(&self, _ctx: &mut DatabaseContext<'_>) -> Result<()> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Chat commands
// ---------------------------------------------------------------------------

/// A chat command family, e.g. `tweaks get ...` / `tweaks set ...`.
pub trait ChatCommand: Send + Sync {
    /// First token of the message.
    fn prefix(&self) -> &str;

    fn commands(&self) -> &[&'static str];

    fn help(&self, command: &str) -> String;

    /// Handle the full message text, returning the reply.
    fn handle(&self, text: &str, configs: &mut HostConfigs) -> String;
}

/// Registered chat commands, keyed by prefix.
#[derive(Default)]
pub struct ChatCommands {
    commands: Vec<Box<dyn ChatCommand>>,
}

impl ChatCommands {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, command: Box<dyn ChatCommand>) {
        tracing::info!(prefix = command.prefix(), "Chat command registered");
        self.commands.retain(|c| c.prefix() != command.prefix());
        self.commands.push(command);
    }

    pub fn find(&self, prefix: &str) -> Option<&dyn ChatCommand> {
        self.commands
            .iter()
            .find(|c| c.prefix() == prefix)
            .map(|c| c.as_ref())
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
