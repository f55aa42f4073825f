//! Loose loot population strategies and loot table transforms.
//!
//! A raid's loose loot is produced by exactly one [`SpawnPopulationStrategy`],
//! chosen once at startup:
//! - [`random::RandomPick`]: the host's weighted-random selection, one item
//!   per chosen spawn point.
//! - [`enumerator::ExhaustiveLootEnumerator`]: every candidate of every
//!   spawn point, one template each.

pub mod enumerator;
pub mod inversion;
pub mod random;

use std::collections::HashSet;
use std::sync::Arc;

use crate::error::DataGap;
use crate::host::ItemFactory;
use crate::types::{Item, ItemDistributionEntry, LooseLoot, SpawnPoint, SpawnTemplate};

// ---------------------------------------------------------------------------
// Request & report
// ---------------------------------------------------------------------------

/// Everything a strategy needs to populate one location.
///
/// Built by the host per raid from a clone of the database's loose loot, so
/// strategies never see the live snapshot.
#[derive(Clone)]
pub struct LootGenerationRequest {
    pub location_id: String,
    pub loose_loot: LooseLoot,
    /// Spawn point or template ids that must never spawn on this location.
    pub blacklist: HashSet<String>,
    /// Item templates whose seasonal event is currently inactive.
    pub inactive_seasonal_items: HashSet<String>,
    pub loot_multiplier: f64,
    pub factory: Arc<dyn ItemFactory>,
}

/// A spawn point that produced nothing, and why.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedSpawnPoint {
    pub spawn_point: String,
    pub reason: DataGap,
}

/// A single candidate whose construction failed.
#[derive(Debug, Clone, PartialEq)]
pub struct FailedItem {
    pub spawn_point: String,
    pub item_key: String,
    pub reason: String,
}

/// Result of populating one location.
#[derive(Debug, Clone, Default)]
pub struct PopulationReport {
    pub spawned: Vec<SpawnTemplate>,
    pub skipped: Vec<SkippedSpawnPoint>,
    pub failed: Vec<FailedItem>,
}

impl PopulationReport {
    pub(crate) fn skip(&mut self, spawn_point: &str, reason: DataGap) {
        self.skipped.push(SkippedSpawnPoint {
            spawn_point: spawn_point.to_string(),
            reason,
        });
    }
}

/// Chooses what loose loot appears in a raid.
pub trait SpawnPopulationStrategy: Send + Sync {
    fn populate(&self, request: &LootGenerationRequest) -> PopulationReport;

    /// Strategy name for logging.
    fn name(&self) -> &'static str;
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

pub(crate) fn is_blacklisted(point: &SpawnPoint, blacklist: &HashSet<String>) -> bool {
    blacklist.contains(&point.id)
        || point
            .template
            .as_ref()
            .is_some_and(|t| blacklist.contains(&t.id))
}

/// The point's template, if it carries at least one item.
pub(crate) fn usable_template(point: &SpawnPoint) -> Option<&SpawnTemplate> {
    point.template.as_ref().filter(|t| !t.items.is_empty())
}

/// Distribution entries left after dropping seasonally inactive items.
///
/// Entries whose key is absent from the template are kept; the item
/// factory reports them.
pub(crate) fn seasonal_candidates<'a>(
    point: &'a SpawnPoint,
    template: &SpawnTemplate,
    inactive: &HashSet<String>,
) -> Vec<&'a ItemDistributionEntry> {
    point
        .item_distribution
        .iter()
        .filter(|entry| {
            template
                .tpl_of(&entry.item_key)
                .map_or(true, |tpl| !inactive.contains(tpl))
        })
        .collect()
}

/// Clone `template` with `items` as its payload and the first item as root.
pub(crate) fn spawn_from(template: &SpawnTemplate, items: Vec<Item>) -> Option<SpawnTemplate> {
    let root = items.first()?.id.clone();
    let mut spawned = template.clone();
    spawned.id = format!("{}_{}", template.id, root);
    spawned.root = root;
    spawned.items = items;
    Some(spawned)
}
