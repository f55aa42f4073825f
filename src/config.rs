//! Tweak configuration loaded from TOML.
//!
//! Every field has a default, so a partial file is filled in rather than
//! rejected. [`TweakConfig::load_or_create`] keeps the file on disk in step
//! with the current layout: it backs the old file up and writes back the
//! normalised one.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::types::ids;

/// Top-level tweak configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TweakConfig {
    /// Per-item debug lines while tweaking.
    pub verbose_logging: bool,
    pub network: NetworkConfig,
    pub priscilu: PrisciluConfig,
    pub boss_spawn: BossSpawnConfig,
    pub bot_equipments: BotEquipmentsConfig,
    pub pmc: PmcTweaks,
    pub ragfair: RagfairTweaks,
    pub loot: LootTweaks,
    pub trader: TraderTweaks,
    pub insurance: InsuranceTweaks,
    pub raid: RaidTweaks,
    pub quest: QuestTweaks,
    pub item: ItemTweaks,
    pub repair: RepairTweaks,
    pub experience: ExperienceTweaks,
    pub profile: ProfileTweaks,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub enable: bool,
    pub listen_ip: String,
    pub backend_ip: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            enable: false,
            listen_ip: "127.0.0.1".into(),
            backend_ip: "127.0.0.1".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrisciluConfig {
    pub filter_priscilu: bool,
    /// Templates kept in the assort even when sellable on the flea market.
    pub exceptions: Vec<String>,
}

impl Default for PrisciluConfig {
    fn default() -> Self {
        Self {
            filter_priscilu: false,
            exceptions: strings(&["591094e086f7747caa7bb2ef", "5910968f86f77425cf569c32"]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BossSpawnConfig {
    pub enable: bool,
    /// One chance for every boss on every location.
    pub unified: bool,
    pub unified_chance: f64,
    /// Boss name (case-insensitive) → per-boss setting.
    pub per_boss_spawn: BTreeMap<String, BossSpawn>,
}

impl Default for BossSpawnConfig {
    fn default() -> Self {
        Self {
            enable: false,
            unified: false,
            unified_chance: 50.0,
            per_boss_spawn: BTreeMap::from([("bossKolontay".to_string(), BossSpawn::default())]),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BossSpawn {
    pub unified: bool,
    pub unified_chance: f64,
}

impl Default for BossSpawn {
    fn default() -> Self {
        Self {
            unified: true,
            unified_chance: 100.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BotEquipmentsConfig {
    pub enable: bool,
    /// Bot type → equipment slot → item template id.
    pub equipment_locks: BTreeMap<String, BTreeMap<String, String>>,
    pub remove_inventory_limits: bool,
    /// Item spawn limits left in place when limits are removed.
    pub inventory_limit_to_keep: Vec<String>,
}

impl Default for BotEquipmentsConfig {
    fn default() -> Self {
        Self {
            enable: false,
            equipment_locks: BTreeMap::from([(
                "bossbully".to_string(),
                BTreeMap::from([("Holster".to_string(), "5b3b713c5acfc4330140bd8d".to_string())]),
            )]),
            remove_inventory_limits: true,
            inventory_limit_to_keep: strings(&[ids::MONEY, ids::AMMO_BOX]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PmcTweaks {
    pub enable: bool,
    pub filter_loot_blacklist: bool,
    pub blacklist_exception: Vec<String>,
    /// Bot type → percent chance to become a PMC.
    pub pmc_conversion: BTreeMap<String, f64>,
}

impl Default for PmcTweaks {
    fn default() -> Self {
        Self {
            enable: false,
            filter_loot_blacklist: true,
            blacklist_exception: strings(&[
                "59f32bb586f774757e1e8442",
                "59f32c3b86f77472a31742f0",
                "6087e570b998180e9f76dc24",
                "614451b71e5874611e2c7ae5",
            ]),
            pmc_conversion: BTreeMap::from([("pmcbot".to_string(), 40.0), ("assault".to_string(), 30.0)]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RagfairTweaks {
    pub better_ragfair_sell_chance: bool,
    pub base_sell_chance: f64,
    /// Base of the overprice penalty; `coef^(listed/average - 1)`.
    pub overprice_sell_chance_coef: f64,
    pub min_sell_chance: f64,
    pub max_sell_chance: f64,
    /// Seconds before an unsold offer may be cancelled.
    pub cancel_wait_time: f64,
}

impl Default for RagfairTweaks {
    fn default() -> Self {
        Self {
            better_ragfair_sell_chance: true,
            base_sell_chance: 100.0,
            overprice_sell_chance_coef: 0.5,
            min_sell_chance: 20.0,
            max_sell_chance: 100.0,
            cancel_wait_time: 5.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LootTweaks {
    pub enable: bool,
    pub use_global_multiplier: bool,
    pub global_multiplier: f64,
    pub per_location_multiplier: BTreeMap<String, f64>,
    pub disable_container_randomization: bool,
    /// Give every loose spawn point probability 1.
    pub force_all_spawn_points: bool,
    /// Spawn every candidate of every loose spawn point.
    pub force_all_loose_loot: bool,
    /// Make rare loot common and common loot rare.
    pub invert_weights: bool,
}

impl Default for LootTweaks {
    fn default() -> Self {
        Self {
            enable: false,
            use_global_multiplier: false,
            global_multiplier: 10.0,
            per_location_multiplier: BTreeMap::from([
                ("laboratory".to_string(), 2.5),
                ("rezervbase".to_string(), 2.5),
            ]),
            disable_container_randomization: true,
            force_all_spawn_points: false,
            force_all_loose_loot: false,
            invert_weights: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraderTweaks {
    pub enable: bool,
    pub purchase_fir: bool,
    pub price_multiplier: f64,
    pub fence: FenceTweaks,
}

impl Default for TraderTweaks {
    fn default() -> Self {
        Self {
            enable: false,
            purchase_fir: false,
            price_multiplier: 1.0,
            fence: FenceTweaks::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FenceTweaks {
    pub assort_size_multi: f64,
    pub price_multi: f64,
    pub regenerate_on_refresh: bool,
    pub armor_with_plates_chance: f64,
    pub max_durability: f64,
    pub min_curr_durability: f64,
    pub price_limit_multi: f64,
    pub filter_blacklist: bool,
    pub blacklist_exception: Vec<String>,
}

impl Default for FenceTweaks {
    fn default() -> Self {
        Self {
            assort_size_multi: 3.0,
            price_multi: 1.0,
            regenerate_on_refresh: false,
            armor_with_plates_chance: 100.0,
            max_durability: 100.0,
            min_curr_durability: 90.0,
            price_limit_multi: 100.0,
            filter_blacklist: true,
            blacklist_exception: strings(&[
                "5d52cc5ba4b9367408500062",
                "5d52d479a4b936793d58c76b",
                "65649eb40bf0ed77b8044453",
                "5448e54d4bdc2dcc718b4568",
                "5a341c4086f77401f2541505",
            ]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InsuranceTweaks {
    /// Cheap, guaranteed, fast insurance from Prapor and Therapist.
    pub enable: bool,
}

impl Default for InsuranceTweaks {
    fn default() -> Self {
        Self { enable: true }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RaidTweaks {
    pub enable: bool,
    /// Minutes added to every raid.
    pub extra_time: f64,
    pub chance_extracts_always_available: bool,
}

impl Default for RaidTweaks {
    fn default() -> Self {
        Self {
            enable: false,
            extra_time: 60.0,
            chance_extracts_always_available: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuestTweaks {
    pub enable: bool,
    pub remove_quest_wait_time: bool,
}

impl Default for QuestTweaks {
    fn default() -> Self {
        Self {
            enable: false,
            remove_quest_wait_time: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemTweaks {
    pub enable: bool,
    pub infinite_key_usage: bool,
    pub no_repair_degradation: bool,
    pub all_gun_fullauto: bool,
}

impl Default for ItemTweaks {
    fn default() -> Self {
        Self {
            enable: true,
            infinite_key_usage: true,
            no_repair_degradation: true,
            all_gun_fullauto: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepairTweaks {
    pub enable: bool,
    /// Repairs never lower max durability.
    pub no_repair_damage: bool,
    /// Repairs restore max durability to the factory value.
    pub reset_durability: bool,
}

impl Default for RepairTweaks {
    fn default() -> Self {
        Self {
            enable: false,
            no_repair_damage: true,
            reset_durability: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperienceTweaks {
    pub enable: bool,
    /// Multiplier on every bot's kill experience reward range.
    pub reward_multiplier: f64,
}

impl Default for ExperienceTweaks {
    fn default() -> Self {
        Self {
            enable: false,
            reward_multiplier: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileTweaks {
    pub enable: bool,
    pub health: ProfileHealthTweaks,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileHealthTweaks {
    pub health_multiplier: f64,
    pub energy_multiplier: f64,
    pub hydration_multiplier: f64,
    pub immortal: bool,
    /// Use `exact_values` instead of the multipliers.
    pub use_exact_values: bool,
    pub exact_values: ExactHealthValues,
}

impl Default for ProfileHealthTweaks {
    fn default() -> Self {
        Self {
            health_multiplier: 1.0,
            energy_multiplier: 1.0,
            hydration_multiplier: 1.0,
            immortal: false,
            use_exact_values: false,
            exact_values: ExactHealthValues::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExactHealthValues {
    /// Body part name → maximum health.
    pub body_parts: BTreeMap<String, f64>,
    pub energy: f64,
    pub hydration: f64,
}

impl Default for ExactHealthValues {
    fn default() -> Self {
        let body_parts = [
            ("Head", 35.0),
            ("Chest", 85.0),
            ("Stomach", 70.0),
            ("LeftArm", 60.0),
            ("RightArm", 60.0),
            ("LeftLeg", 65.0),
            ("RightLeg", 65.0),
        ]
        .into_iter()
        .map(|(part, hp)| (part.to_string(), hp))
        .collect();
        Self {
            body_parts,
            energy: 100.0,
            hydration: 100.0,
        }
    }
}

fn strings(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|s| s.to_string()).collect()
}

impl TweakConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config: TweakConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        Ok(config)
    }

    /// Load `path`, falling back to defaults, and write the result back.
    ///
    /// A missing file is created with defaults. A malformed one is logged
    /// and replaced by defaults. Any existing file is first copied to
    /// [`backup_path`].
    pub fn load_or_create(path: &str) -> Result<Self> {
        let config = if Path::new(path).exists() {
            let backup = backup_path(path);
            fs::copy(path, &backup)
                .with_context(|| format!("Failed to back up config to {}", backup.display()))?;
            match Self::load(path) {
                Ok(config) => {
                    info!(path, "Tweak config loaded");
                    config
                }
                Err(e) => {
                    warn!(path, error = %format!("{e:#}"), "Malformed tweak config, using defaults");
                    Self::default()
                }
            }
        } else {
            info!(path, "No tweak config found, writing defaults");
            Self::default()
        };

        config.save(path)?;
        Ok(config)
    }

    /// Write configuration as TOML.
    pub fn save(&self, path: &str) -> Result<()> {
        let contents = toml::to_string_pretty(self).context("Failed to serialise tweak config")?;
        fs::write(path, contents).with_context(|| format!("Failed to write config file: {path}"))?;
        Ok(())
    }
}

/// `tweaks.toml` → `tweaks.bak.toml`.
pub fn backup_path(path: &str) -> PathBuf {
    let path = Path::new(path);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| "toml".to_string());
    path.with_file_name(format!("{stem}.bak.{ext}"))
}
