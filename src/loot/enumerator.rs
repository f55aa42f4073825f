//! Exhaustive loose loot enumeration.
//!
//! Replaces the weighted-random pick at every loose spawn point with every
//! candidate at once: a point that would yield one random item out of N now
//! yields N templates, one per candidate. Expensive on purpose; only used in
//! the "force spawn all loose loot" mode.

use tracing::{debug, info, warn};

use super::{
    is_blacklisted, seasonal_candidates, spawn_from, usable_template, FailedItem,
    LootGenerationRequest, PopulationReport, SpawnPopulationStrategy,
};
use crate::error::DataGap;

/// Deterministic strategy that spawns every candidate of every spawn point.
///
/// Work is O(Σ spawn points × candidates per point). Entries of one point
/// are emitted in distribution order.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExhaustiveLootEnumerator;

impl ExhaustiveLootEnumerator {
    pub fn new() -> Self {
        Self
    }
}

impl SpawnPopulationStrategy for ExhaustiveLootEnumerator {
    fn populate(&self, request: &LootGenerationRequest) -> PopulationReport {
        let mut report = PopulationReport::default();

        for point in &request.loose_loot.spawnpoints {
            if point.forced {
                match point.template.as_ref() {
                    Some(template) => report.spawned.push(template.clone()),
                    None => report.skip(&point.id, DataGap::MissingTemplate(point.id.clone())),
                }
                continue;
            }

            if is_blacklisted(point, &request.blacklist) {
                debug!(spawn_point = %point.id, "Blacklisted spawn point skipped");
                continue;
            }

            let Some(template) = usable_template(point) else {
                warn!(
                    location = %request.location_id,
                    spawn_point = %point.id,
                    "Spawn point has no item template, skipped"
                );
                report.skip(&point.id, DataGap::MissingTemplate(point.id.clone()));
                continue;
            };

            let candidates = seasonal_candidates(point, template, &request.inactive_seasonal_items);
            if candidates.is_empty() {
                warn!(
                    location = %request.location_id,
                    spawn_point = %point.id,
                    "No candidates left after seasonal filtering, skipped"
                );
                report.skip(&point.id, DataGap::NoCandidates(point.id.clone()));
                continue;
            }

            for entry in candidates {
                let built = request
                    .factory
                    .create_item(&entry.item_key, template)
                    .map_err(|e| e.to_string())
                    .and_then(|items| {
                        spawn_from(template, items)
                            .ok_or_else(|| "factory returned no items".to_string())
                    });

                match built {
                    Ok(mut spawned) => {
                        spawned.use_gravity = false;
                        spawned.random_rotation = false;
                        report.spawned.push(spawned);
                    }
                    Err(reason) => {
                        warn!(
                            location = %request.location_id,
                            spawn_point = %point.id,
                            item_key = %entry.item_key,
                            error = %reason,
                            "Item construction failed, entry excluded"
                        );
                        report.failed.push(FailedItem {
                            spawn_point: point.id.clone(),
                            item_key: entry.item_key.clone(),
                            reason,
                        });
                    }
                }
            }
        }

        info!(
            location = %request.location_id,
            spawned = report.spawned.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "Loose loot enumerated"
        );
        report
    }

    fn name(&self) -> &'static str {
        "force-all"
    }
}
