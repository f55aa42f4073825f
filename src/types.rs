//! Shared types for the tweak engine.
//!
//! These mirror the slices of the host's database snapshot the engine reads
//! and writes. Field names follow the host's JSON layout so a snapshot can be
//! loaded and written back without translation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Well-known template and trader ids used by the tweaks.
pub mod ids {
    pub const PRAPOR: &str = "54cb50c76803fa8b248b4571";
    pub const THERAPIST: &str = "54cb57776803fa99248b456e";
    pub const PRISCILU: &str = "Priscilu";

    pub const MECHANICAL_KEY: &str = "5c99f98d86f7745c314214b3";
    pub const KEYCARD: &str = "5c164d2286f774194c5e69fa";

    /// Default PMC inventory; its third slot is the holster.
    pub const DEFAULT_INVENTORY: &str = "55d7217a4bdc2d86028b456d";
    pub const HOLSTER_SLOT: usize = 2;
    pub const GRENADE_LAUNCHER: &str = "5447bedf4bdc2d87278b4568";
    pub const SMG: &str = "5447b5e04bdc2d62278b4567";

    pub const MONEY: &str = "543be5dd4bdc2deb348b4569";
    pub const AMMO_BOX: &str = "543be5cb4bdc2deb348b4568";
}

// ---------------------------------------------------------------------------
// Numeric pairs
// ---------------------------------------------------------------------------

/// Inclusive numeric range.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MinMax {
    pub min: f64,
    pub max: f64,
}

impl MinMax {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// A degenerate range where both bounds equal `value`.
    pub fn fixed(value: f64) -> Self {
        Self { min: value, max: value }
    }

    /// Both bounds multiplied by `multiplier`, rounded to integers.
    pub fn scaled(self, multiplier: f64) -> Self {
        Self {
            min: (self.min * multiplier).round(),
            max: (self.max * multiplier).round(),
        }
    }
}

impl fmt::Display for MinMax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}

/// A paired current/maximum attribute: health, durability, resource charge.
///
/// Either side may be absent in host data; consumers must tolerate that.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CurrentMaxPair {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
}

impl CurrentMaxPair {
    pub fn new(current: f64, maximum: f64) -> Self {
        Self {
            current: Some(current),
            maximum: Some(maximum),
        }
    }

    /// `current / maximum`, when both are present and maximum is non-zero.
    pub fn ratio(&self) -> Option<f64> {
        match (self.current, self.maximum) {
            (Some(c), Some(m)) if m != 0.0 => Some(c / m),
            _ => None,
        }
    }
}

impl fmt::Display for CurrentMaxPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.current, self.maximum) {
            (Some(c), Some(m)) => write!(f, "{c}/{m}"),
            (Some(c), None) => write!(f, "{c}/?"),
            (None, Some(m)) => write!(f, "?/{m}"),
            (None, None) => write!(f, "?/?"),
        }
    }
}

// ---------------------------------------------------------------------------
// Items
// ---------------------------------------------------------------------------

/// A concrete item instance.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Item {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_tpl")]
    pub tpl: String,
    #[serde(rename = "parentId", default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(rename = "slotId", default, skip_serializing_if = "Option::is_none")]
    pub slot_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upd: Option<Upd>,
}

impl Item {
    pub fn new(id: impl Into<String>, tpl: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tpl: tpl.into(),
            ..Default::default()
        }
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>, slot_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self.slot_id = Some(slot_id.into());
        self
    }
}

/// Per-instance item state.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Upd {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack_objects_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spawned_in_session: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repairable: Option<Repairable>,
}

/// Durability state of a repairable item.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Repairable {
    pub durability: f64,
    pub max_durability: f64,
}

impl Repairable {
    pub fn as_pair(&self) -> CurrentMaxPair {
        CurrentMaxPair::new(self.durability, self.max_durability)
    }
}

/// Item template from the database.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ItemTemplate {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_name", default)]
    pub name: String,
    #[serde(rename = "_parent", default)]
    pub parent: String,
    #[serde(rename = "_props", default)]
    pub props: ItemProps,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ItemProps {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum_number_of_usage: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_repair_degradation: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_repair_degradation: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_repair_kit_degradation: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_repair_kit_degradation: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_durability: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub can_sell_on_ragfair: Option<bool>,
    #[serde(rename = "weapFireType", skip_serializing_if = "Option::is_none")]
    pub weap_fire_type: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slots: Option<Vec<Slot>>,
}

impl ItemProps {
    pub fn has_repair_degradation(&self) -> bool {
        self.max_repair_degradation.is_some() && self.max_repair_kit_degradation.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Slot {
    #[serde(rename = "_name", default)]
    pub name: String,
    #[serde(rename = "_props", default)]
    pub props: SlotProps,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SlotProps {
    pub filters: Vec<SlotFilter>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SlotFilter {
    #[serde(rename = "Filter")]
    pub filter: Vec<String>,
}

// ---------------------------------------------------------------------------
// Locations & loot tables
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Location {
    pub base: LocationBase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loose_loot: Option<LooseLoot>,
    /// Container template id → static loot table.
    pub static_loot: BTreeMap<String, StaticContainerLoot>,
    /// Ammo caliber → ammo distribution.
    pub static_ammo: BTreeMap<String, Vec<AmmoDistribution>>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct LocationBase {
    pub id: String,
    pub name: String,
    pub boss_location_spawn: Vec<BossLocationSpawn>,
    /// Raid length in minutes.
    pub escape_time_limit: f64,
    pub exits: Vec<Exit>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct BossLocationSpawn {
    pub boss_name: String,
    pub boss_chance: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Exit {
    pub name: String,
    pub chance: f64,
    pub passage_requirement: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LooseLoot {
    pub spawnpoint_count: MinMax,
    pub spawnpoints: Vec<SpawnPoint>,
}

/// A world location where loot may appear.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SpawnPoint {
    #[serde(rename = "locationId")]
    pub id: String,
    pub probability: f64,
    /// Forced points always spawn their template, bypassing weighting.
    #[serde(rename = "isForced")]
    pub forced: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<SpawnTemplate>,
    pub item_distribution: Vec<ItemDistributionEntry>,
}

/// The payload placed into the world when a spawn point fires.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnTemplate {
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(rename = "IsAlwaysSpawn")]
    pub is_always_spawn: bool,
    #[serde(rename = "useGravity")]
    pub use_gravity: bool,
    #[serde(rename = "randomRotation")]
    pub random_rotation: bool,
    #[serde(rename = "Root")]
    pub root: String,
    /// Candidate items and their children. Each candidate's `_id` is the
    /// composed key referenced by the distribution.
    #[serde(rename = "Items")]
    pub items: Vec<Item>,
}

impl SpawnTemplate {
    /// Template id of the item with the given composed key.
    pub fn tpl_of(&self, item_key: &str) -> Option<&str> {
        self.items
            .iter()
            .find(|i| i.id == item_key)
            .map(|i| i.tpl.as_str())
    }
}

/// One candidate item/weight pair at a spawn point.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ItemDistributionEntry {
    #[serde(rename = "composedKey")]
    pub item_key: String,
    pub relative_probability: f64,
}

impl ItemDistributionEntry {
    pub fn new(item_key: impl Into<String>, relative_probability: f64) -> Self {
        Self {
            item_key: item_key.into(),
            relative_probability,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StaticContainerLoot {
    pub item_distribution: Vec<StaticItemWeight>,
    pub item_count_distribution: Vec<ItemCountWeight>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StaticItemWeight {
    pub tpl: String,
    pub relative_probability: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ItemCountWeight {
    pub count: u32,
    pub relative_probability: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AmmoDistribution {
    pub tpl: String,
    pub relative_probability: f64,
}

// ---------------------------------------------------------------------------
// Bots, traders, quests, globals
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BotType {
    pub inventory: BotInventory,
    pub chances: BotChances,
    pub experience: BotExperience,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BotInventory {
    /// Equipment slot → item template id → weight.
    pub equipment: BTreeMap<String, BTreeMap<String, f64>>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BotChances {
    /// Equipment slot → spawn chance percent.
    pub equipment: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BotExperience {
    /// Difficulty → experience reward range.
    pub reward: BTreeMap<String, MinMax>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Trader {
    pub base: TraderBase,
    pub assort: TraderAssort,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TraderBase {
    #[serde(rename = "_id")]
    pub id: String,
    pub nickname: String,
    pub insurance: TraderInsurance,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TraderInsurance {
    pub availability: bool,
    pub min_return_hour: f64,
    pub max_return_hour: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TraderAssort {
    pub items: Vec<Item>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Quest {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "QuestName")]
    pub name: String,
    pub conditions: QuestConditions,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QuestConditions {
    #[serde(rename = "AvailableForStart")]
    pub available_for_start: Vec<QuestCondition>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QuestCondition {
    pub condition_type: String,
    /// Seconds to wait after the prerequisite completes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_after: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Globals {
    pub config: GlobalsConfig,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct GlobalsConfig {
    pub armor_materials: BTreeMap<String, ArmorMaterial>,
    pub insurance: GlobalInsurance,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ArmorMaterial {
    pub min_repair_degradation: f64,
    pub max_repair_degradation: f64,
    pub min_repair_kit_degradation: f64,
    pub max_repair_kit_degradation: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct GlobalInsurance {
    pub max_storage_time_in_hour: f64,
}

// ---------------------------------------------------------------------------
// Profiles & health
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Health {
    pub body_parts: BTreeMap<String, BodyPartHealth>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub energy: Option<CurrentMaxPair>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hydration: Option<CurrentMaxPair>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub immortal: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct BodyPartHealth {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health: Option<CurrentMaxPair>,
}

/// Player faction. Profile templates carry one character per side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Side {
    #[default]
    Bear,
    Usec,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Bear => write!(f, "Bear"),
            Side::Usec => write!(f, "Usec"),
        }
    }
}

/// Starting characters for one game edition.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileSides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bear: Option<ProfileSide>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usec: Option<ProfileSide>,
}

impl ProfileSides {
    pub fn health(&self, side: Side) -> Option<&Health> {
        let profile = match side {
            Side::Bear => self.bear.as_ref(),
            Side::Usec => self.usec.as_ref(),
        };
        profile?.character.as_ref()?.health.as_ref()
    }

    pub fn health_mut(&mut self, side: Side) -> Option<&mut Health> {
        let profile = match side {
            Side::Bear => self.bear.as_mut(),
            Side::Usec => self.usec.as_mut(),
        };
        profile?.character.as_mut()?.health.as_mut()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileSide {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub character: Option<TemplateCharacter>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct TemplateCharacter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health: Option<Health>,
}

/// A player's account-level profile.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SptProfile {
    pub info: ProfileInfo,
    pub characters: Characters,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileInfo {
    pub id: String,
    pub username: String,
    pub edition: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Characters {
    pub pmc: PmcData,
}

/// The player's in-raid character.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct PmcData {
    #[serde(rename = "_id")]
    pub id: String,
    pub info: PmcInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health: Option<Health>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct PmcInfo {
    pub nickname: String,
    pub side: Side,
}

// ---------------------------------------------------------------------------
// Database snapshot
// ---------------------------------------------------------------------------

/// The host's in-memory database, populated before the post-database-load
/// phase runs.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Database {
    pub items: BTreeMap<String, ItemTemplate>,
    /// Game edition → starting characters.
    pub profile_templates: BTreeMap<String, ProfileSides>,
    pub locations: BTreeMap<String, Location>,
    pub bots: BTreeMap<String, BotType>,
    pub traders: BTreeMap<String, Trader>,
    pub quests: BTreeMap<String, Quest>,
    pub globals: Globals,
    /// Language → key → text.
    pub locales: BTreeMap<String, BTreeMap<String, String>>,
}

/// Display names for item templates, for diagnostics only.
#[derive(Debug, Clone, Default)]
pub struct ItemNames {
    names: BTreeMap<String, String>,
}

impl ItemNames {
    /// Resolve names from the `en` locale, falling back to template names.
    pub fn from_database(db: &Database) -> Self {
        let locale = db.locales.get("en");
        let names = db
            .items
            .values()
            .map(|item| {
                let localized = locale.and_then(|l| l.get(&format!("{} Name", item.id)));
                let name = localized.cloned().unwrap_or_else(|| item.name.clone());
                (item.id.clone(), name)
            })
            .collect();
        Self { names }
    }

    /// Display name of `id`, or the id itself when unknown.
    pub fn get<'a>(&'a self, id: &'a str) -> &'a str {
        self.names.get(id).map(String::as_str).unwrap_or(id)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
