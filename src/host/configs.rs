//! Per-domain host configuration blocks.
//!
//! The host reads these on every request, so mutations made during startup
//! (or later, through chat commands) take effect immediately.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::MinMax;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfigs {
    pub http: HttpConfig,
    pub ragfair: RagfairConfig,
    pub location: LocationConfig,
    pub trader: TraderConfig,
    pub pmc: PmcConfig,
    pub repair: RepairConfig,
    pub insurance: InsuranceConfig,
    pub bot: BotConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HttpConfig {
    pub ip: String,
    pub port: u16,
    pub backend_ip: String,
    pub backend_port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            ip: "127.0.0.1".into(),
            port: 6969,
            backend_ip: "127.0.0.1".into(),
            backend_port: 6969,
        }
    }
}

// ---------------------------------------------------------------------------
// Ragfair
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RagfairConfig {
    pub sell: RagfairSell,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RagfairSell {
    pub chance: SellChance,
    /// Seconds before a cancelled offer is returned.
    pub expire_seconds: f64,
}

impl Default for RagfairSell {
    fn default() -> Self {
        Self {
            chance: SellChance::default(),
            expire_seconds: 71.0,
        }
    }
}

/// Sell chance settings, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SellChance {
    pub base: f64,
    pub sell_multiplier: f64,
    pub min_sell_chance_percent: f64,
    pub max_sell_chance_percent: f64,
}

impl Default for SellChance {
    fn default() -> Self {
        Self {
            base: 50.0,
            sell_multiplier: 1.24,
            min_sell_chance_percent: 0.0,
            max_sell_chance_percent: 100.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Locations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LocationConfig {
    /// Location id → multiplier on the loose spawn point count.
    pub loose_loot_multiplier: BTreeMap<String, f64>,
    /// Location id → multiplier on static container item counts.
    pub static_loot_multiplier: BTreeMap<String, f64>,
    pub container_randomisation_enabled: bool,
    /// Location id → spawn point or template ids that never spawn.
    pub loose_loot_blacklist: BTreeMap<String, Vec<String>>,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            loose_loot_multiplier: BTreeMap::new(),
            static_loot_multiplier: BTreeMap::new(),
            container_randomisation_enabled: true,
            loose_loot_blacklist: BTreeMap::new(),
        }
    }
}

impl LocationConfig {
    pub fn loose_multiplier(&self, location: &str) -> f64 {
        self.loose_loot_multiplier.get(location).copied().unwrap_or(1.0)
    }
}

// ---------------------------------------------------------------------------
// Traders
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TraderConfig {
    pub purchases_are_found_in_raid: bool,
    pub trader_price_multipler: f64,
    pub fence: FenceConfig,
}

impl Default for TraderConfig {
    fn default() -> Self {
        Self {
            purchases_are_found_in_raid: false,
            trader_price_multipler: 1.0,
            fence: FenceConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FenceConfig {
    pub assort_size: f64,
    pub weapon_preset_min_max: MinMax,
    pub equipment_preset_min_max: MinMax,
    /// Item category → listing count.
    pub item_type_limits: BTreeMap<String, f64>,
    pub item_price_mult: f64,
    pub preset_price_mult: f64,
    pub regenerate_assorts_on_refresh: bool,
    pub chance_plate_exists_in_armor_percent: f64,
    pub armor_max_durability_percent_min_max: MinMax,
    pub preset_max_durability_percent_min_max: MinMax,
    /// Item category → rouble price ceiling.
    pub item_category_rouble_price_limit: BTreeMap<String, f64>,
    pub blacklist: Vec<String>,
}

impl Default for FenceConfig {
    fn default() -> Self {
        Self {
            assort_size: 140.0,
            weapon_preset_min_max: MinMax::new(12.0, 19.0),
            equipment_preset_min_max: MinMax::new(10.0, 14.0),
            item_type_limits: BTreeMap::new(),
            item_price_mult: 1.4,
            preset_price_mult: 2.7,
            regenerate_assorts_on_refresh: true,
            chance_plate_exists_in_armor_percent: 50.0,
            armor_max_durability_percent_min_max: MinMax::new(40.0, 100.0),
            preset_max_durability_percent_min_max: MinMax::new(40.0, 100.0),
            item_category_rouble_price_limit: BTreeMap::new(),
            blacklist: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Bots, PMCs, insurance, repair
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PmcConfig {
    /// Bot type → chance range (percent) of being converted into a PMC.
    pub convert_into_pmc_chance: BTreeMap<String, MinMax>,
    /// Item templates PMCs never carry as loot.
    pub loot_blacklist: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InsuranceConfig {
    /// Trader id → price multiplier.
    pub insurance_multiplier: BTreeMap<String, f64>,
    /// Trader id → percent of insured items returned.
    pub return_chance_percent: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RepairConfig {
    /// Roll the max durability loss within the template range instead of
    /// always taking the maximum.
    pub apply_randomize_durability_loss: bool,
}

impl Default for RepairConfig {
    fn default() -> Self {
        Self {
            apply_randomize_durability_loss: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BotConfig {
    /// Bot type → item template id → maximum count carried.
    pub item_spawn_limits: BTreeMap<String, BTreeMap<String, u32>>,
}
