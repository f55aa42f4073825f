//! The `tweaks` chat command.
//!
//! `tweaks get <option> [args]` reads a live host setting and
//! `tweaks set <option> [args] <value>` changes it until the server
//! restarts. Options are looked up by name.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use tracing::debug;

use crate::host::{ChatCommand, HostConfigs};
use crate::types::MinMax;

/// One setting reachable through the chat command.
pub trait TweakOption: Send + Sync {
    /// Option name as typed by the player.
    fn name(&self) -> &'static str;

    fn get(&self, args: &[&str], configs: &HostConfigs) -> Result<String>;

    fn set(&self, args: &[&str], configs: &mut HostConfigs) -> Result<String>;
}

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Chance that a bot of a given type spawns as a PMC.
pub struct PmcConversionOption;

impl TweakOption for PmcConversionOption {
    fn name(&self) -> &'static str {
        "pmcConv"
    }

    fn get(&self, args: &[&str], configs: &HostConfigs) -> Result<String> {
        let chances = &configs.pmc.convert_into_pmc_chance;
        match args {
            [] => serde_json::to_string_pretty(chances)
                .context("Failed to serialise PMC conversion chances"),
            [bot_type] => Ok(match chances.get(*bot_type) {
                Some(range) => format!("[{}% - {}%]", range.min, range.max),
                None => "Impossible".to_string(),
            }),
            _ => Ok("Too many arguments".to_string()),
        }
    }

    fn set(&self, args: &[&str], configs: &mut HostConfigs) -> Result<String> {
        if args.len() > 3 {
            return Ok("Too many arguments".to_string());
        }
        let [bot_type, value, ..] = args else {
            return Ok("Not enough arguments".to_string());
        };
        let rate = match value.parse::<f64>() {
            Ok(rate) if !rate.is_nan() => rate,
            _ => return Ok("Not a number".to_string()),
        };

        configs
            .pmc
            .convert_into_pmc_chance
            .insert(bot_type.to_string(), MinMax::fixed(rate));
        debug!(bot_type, rate, "PMC conversion chance set");
        Ok("Success".to_string())
    }
}

// ---------------------------------------------------------------------------
// Command
// ---------------------------------------------------------------------------

pub struct TweaksCommand {
    options: BTreeMap<&'static str, Box<dyn TweakOption>>,
}

impl Default for TweaksCommand {
    fn default() -> Self {
        Self::new()
    }
}

impl TweaksCommand {
    pub fn new() -> Self {
        let mut command = Self {
            options: BTreeMap::new(),
        };
        command.add_option(Box::new(PmcConversionOption));
        command
    }

    pub fn add_option(&mut self, option: Box<dyn TweakOption>) {
        self.options.insert(option.name(), option);
    }
}

impl ChatCommand for TweaksCommand {
    fn prefix(&self) -> &str {
        "tweaks"
    }

    fn commands(&self) -> &[&'static str] {
        &["get", "set"]
    }

    fn help(&self, command: &str) -> String {
        match command {
            "get" => "get usage: tweaks get <option> [args]",
            "set" => "set usage: tweaks set <option> [args] <value>",
            _ => "Get and Set tweak values, still WIP",
        }
        .to_string()
    }

    fn handle(&self, text: &str, configs: &mut HostConfigs) -> String {
        debug!(text, "Tweaks command received");
        let tokens: Vec<&str> = text.split(' ').collect();
        if tokens.len() < 3 {
            return "Not enough arguments".to_string();
        }

        let is_get = match tokens[1] {
            "get" => true,
            "set" => false,
            _ => return "Invalid Option".to_string(),
        };
        let Some(option) = self.options.get(tokens[2]) else {
            return format!("Unsupported tweak option: {}", tokens[2]);
        };

        let args = &tokens[3..];
        debug!(is_get, ?args, option = option.name(), "Dispatching tweak option");
        let reply = if is_get {
            option.get(args, configs)
        } else {
            option.set(args, configs)
        };
        reply.unwrap_or_else(|e| format!("Failed to process command: {e:#}"))
    }
}
