//! Weighted-random loose loot selection, the host's default strategy.

use std::sync::{Mutex, PoisonError};

use rand::distributions::{Distribution, WeightedIndex};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, warn};

use super::{
    is_blacklisted, seasonal_candidates, spawn_from, usable_template, FailedItem,
    LootGenerationRequest, PopulationReport, SpawnPopulationStrategy,
};
use crate::error::DataGap;
use crate::types::SpawnPoint;

/// Picks a random number of spawn points weighted by their probability and
/// one weighted-random item at each.
pub struct RandomPick {
    rng: Mutex<ChaCha8Rng>,
}

impl RandomPick {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(ChaCha8Rng::seed_from_u64(seed)),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: Mutex::new(ChaCha8Rng::from_entropy()),
        }
    }
}

impl SpawnPopulationStrategy for RandomPick {
    fn populate(&self, request: &LootGenerationRequest) -> PopulationReport {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        let mut report = PopulationReport::default();

        let mut dynamic: Vec<&SpawnPoint> = Vec::new();
        for point in &request.loose_loot.spawnpoints {
            if point.forced {
                match point.template.as_ref() {
                    Some(template) => report.spawned.push(template.clone()),
                    None => report.skip(&point.id, DataGap::MissingTemplate(point.id.clone())),
                }
            } else if !is_blacklisted(point, &request.blacklist) && point.probability > 0.0 {
                dynamic.push(point);
            }
        }

        let range = request.loose_loot.spawnpoint_count;
        let low = range.min.max(0.0).round() as usize;
        let high = (range.max.round() as usize).max(low);
        let rolled = rng.gen_range(low..=high);
        let count = ((rolled as f64 * request.loot_multiplier).round() as usize).min(dynamic.len());

        let chosen: Vec<&SpawnPoint> =
            match dynamic.choose_multiple_weighted(&mut *rng, count, |p| p.probability) {
                Ok(iter) => iter.copied().collect(),
                Err(e) => {
                    warn!(location = %request.location_id, error = %e, "Spawn point weights unusable");
                    Vec::new()
                }
            };

        for point in chosen {
            let Some(template) = usable_template(point) else {
                report.skip(&point.id, DataGap::MissingTemplate(point.id.clone()));
                continue;
            };
            let candidates = seasonal_candidates(point, template, &request.inactive_seasonal_items);
            let Ok(weights) = WeightedIndex::new(candidates.iter().map(|e| e.relative_probability))
            else {
                report.skip(&point.id, DataGap::NoCandidates(point.id.clone()));
                continue;
            };
            let entry = candidates[weights.sample(&mut *rng)];

            let built = request
                .factory
                .create_item(&entry.item_key, template)
                .map_err(|e| e.to_string())
                .and_then(|items| {
                    spawn_from(template, items).ok_or_else(|| "factory returned no items".to_string())
                });
            match built {
                Ok(spawned) => {
                    debug!(spawn_point = %point.id, item_key = %entry.item_key, "Loose item picked");
                    report.spawned.push(spawned);
                }
                Err(reason) => report.failed.push(FailedItem {
                    spawn_point: point.id.clone(),
                    item_key: entry.item_key.clone(),
                    reason,
                }),
            }
        }

        debug!(
            location = %request.location_id,
            rolled,
            count,
            spawned = report.spawned.len(),
            "Loose loot picked"
        );
        report
    }

    fn name(&self) -> &'static str {
        "random-pick"
    }
}
