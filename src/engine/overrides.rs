//! Overrides installed before the host listens.
//!
//! Each installer captures only the settings it needs, so a handler never
//! reads the tweak config again after startup.

use tracing::{info, warn};

use crate::commands::TweaksCommand;
use crate::config::{NetworkConfig, RagfairTweaks, RepairTweaks, TweakConfig};
use crate::error::Result;
use crate::host::operations::{
    CalculateSellChance, GenerateLooseLoot, RepairItem, RepairRequest, SellChanceQuery,
};
use crate::host::{BeforeListenContext, HostConfigs};
use crate::hooks::HookRegistry;
use crate::loot::enumerator::ExhaustiveLootEnumerator;
use crate::loot::SpawnPopulationStrategy;
use crate::types::Repairable;

// ---------------------------------------------------------------------------
// Network
// ---------------------------------------------------------------------------

pub fn apply_network(configs: &mut HostConfigs, network: &NetworkConfig) {
    if !network.enable {
        return;
    }
    configs.http.ip = network.listen_ip.clone();
    configs.http.backend_ip = network.backend_ip.clone();
    info!(
        backend = %configs.http.backend_ip,
        listen = %configs.http.ip,
        "Network addresses overridden"
    );
}

// ---------------------------------------------------------------------------
// Ragfair
// ---------------------------------------------------------------------------

/// Sell chance that only punishes overpricing.
///
/// Offers at or under the average sell at the full base chance; every
/// multiple of the average above it multiplies the chance by `coef`.
/// Bounds are the host's live min/max settings.
pub fn better_sell_chance(query: &SellChanceQuery, coef: f64) -> f64 {
    let chances = query.chances;
    let base = chances.base * query.quality_multiplier;
    let overprice = query.player_listed_price / query.average_offer_price - 1.0;
    let raw = base * coef.powf(overprice).min(1.0);
    let rounded = if raw.is_finite() { raw.round() } else { chances.min_sell_chance_percent };
    rounded
        .min(chances.max_sell_chance_percent)
        .max(chances.min_sell_chance_percent)
}

pub fn install_ragfair(hooks: &mut HookRegistry, ragfair: &RagfairTweaks) -> Result<()> {
    if !ragfair.better_ragfair_sell_chance {
        return Ok(());
    }
    let coef = ragfair.overprice_sell_chance_coef;
    hooks.replace::<CalculateSellChance, _>(move |query| {
        let chance = better_sell_chance(query, coef);
        info!(
            listed = query.player_listed_price,
            average = query.average_offer_price,
            chance,
            "Ragfair offer priced"
        );
        chance
    })?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Repair
// ---------------------------------------------------------------------------

/// Repair without losing max durability, optionally back to factory max.
pub fn lossless_repair(request: &RepairRequest, reset_durability: bool) -> Repairable {
    let mut max = request.repairable.max_durability;
    if reset_durability {
        match request.template_max_durability {
            Some(factory) => max = factory,
            None => warn!(item = %request.item_id, tpl = %request.tpl, "No factory durability, keeping current max"),
        }
    }
    Repairable {
        durability: max,
        max_durability: max,
    }
}

pub fn install_repair(hooks: &mut HookRegistry, repair: &RepairTweaks) -> Result<()> {
    if !repair.enable || !(repair.no_repair_damage || repair.reset_durability) {
        return Ok(());
    }
    let reset = repair.reset_durability;
    hooks.replace::<RepairItem, _>(move |request| lossless_repair(request, reset))?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Loose loot
// ---------------------------------------------------------------------------

pub fn install_force_all_loot(hooks: &mut HookRegistry, enabled: bool) -> Result<()> {
    if !enabled {
        return Ok(());
    }
    let strategy = ExhaustiveLootEnumerator::new();
    warn!(strategy = strategy.name(), "Every loose loot candidate will spawn");
    hooks.replace::<GenerateLooseLoot, _>(move |request| strategy.populate(request))?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Phase entry point
// ---------------------------------------------------------------------------

pub fn before_listen(ctx: &mut BeforeListenContext<'_>, config: &TweakConfig) -> Result<()> {
    apply_network(ctx.configs, &config.network);
    install_ragfair(ctx.hooks, &config.ragfair)?;
    install_repair(ctx.hooks, &config.repair)?;
    install_force_all_loot(ctx.hooks, config.loot.force_all_loose_loot)?;
    ctx.commands.register(Box::new(TweaksCommand::new()));
    Ok(())
}
