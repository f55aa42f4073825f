//! Operations the reference host routes through its hook registry, plus
//! the routine symbols it exposes for splicing.

use crate::hooks::Operation;
use crate::loot::{LootGenerationRequest, PopulationReport};
use crate::types::{MinMax, PmcData, Repairable};

use super::configs::SellChance;

/// Routine and symbol names in the host's routine table.
pub mod symbols {
    pub const GAME_START: &str = "GameController.gameStart";
    pub const UPDATE_PROFILE_HEALTH_VALUES: &str = "GameController.updateProfileHealthValues";
    pub const CREATE_PROFILE_SNAPSHOT: &str = "GameController.createProfileSnapshot";
    pub const CHECK_PMC_PROFILE: &str = "ProfileFixerService.checkForAndFixPmcProfileIssues";
}

// ---------------------------------------------------------------------------
// Ragfair
// ---------------------------------------------------------------------------

/// Percent chance that a player's flea market offer sells.
pub struct CalculateSellChance;

impl Operation for CalculateSellChance {
    const ID: &'static str = "RagfairSellHelper.calculateSellChance";
    type Input = SellChanceQuery;
    type Output = f64;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SellChanceQuery {
    pub average_offer_price: f64,
    pub player_listed_price: f64,
    pub quality_multiplier: f64,
    /// The host's live sell chance settings at call time.
    pub chances: SellChance,
}

// ---------------------------------------------------------------------------
// Repair
// ---------------------------------------------------------------------------

/// Restore an item's durability, returning its new durability state.
pub struct RepairItem;

impl Operation for RepairItem {
    const ID: &'static str = "RepairService.repairItem";
    type Input = RepairRequest;
    type Output = Repairable;
}

#[derive(Debug, Clone, PartialEq)]
pub struct RepairRequest {
    pub item_id: String,
    pub tpl: String,
    pub repairable: Repairable,
    /// Max durability of a factory-new item, from the template.
    pub template_max_durability: Option<f64>,
    /// Fraction of the repaired amount lost from max durability.
    pub degradation: MinMax,
    pub use_repair_kit: bool,
}

// ---------------------------------------------------------------------------
// Loot
// ---------------------------------------------------------------------------

/// Populate a location's loose loot for one raid.
pub struct GenerateLooseLoot;

impl Operation for GenerateLooseLoot {
    const ID: &'static str = "LocationLootGenerator.generateDynamicLoot";
    type Input = LootGenerationRequest;
    type Output = PopulationReport;
}

// ---------------------------------------------------------------------------
// Profiles
// ---------------------------------------------------------------------------

/// Refresh a PMC's health values when a game session starts.
pub struct UpdateProfileHealthValues;

impl Operation for UpdateProfileHealthValues {
    const ID: &'static str = "GameController.updateProfileHealthValues";
    type Input = ProfileHealthSync;
    type Output = ();
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProfileHealthSync {
    /// Game edition of the owning profile; selects the profile template.
    pub edition: String,
    pub pmc: PmcData,
}
