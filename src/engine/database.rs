//! Tweaks applied once the database snapshot is loaded.
//!
//! Every tweak edits the snapshot or a host config block in place. Missing
//! ids are data gaps: logged, and the rest of the tweak still runs.

use std::collections::HashSet;

use tracing::{debug, error, info, warn};

use crate::config::{
    BossSpawnConfig, BotEquipmentsConfig, ExperienceTweaks, FenceTweaks, ItemTweaks, LootTweaks,
    PmcTweaks, PrisciluConfig, ProfileTweaks, RagfairTweaks, RaidTweaks, TraderTweaks,
    TweakConfig,
};
use crate::error::DataGap;
use crate::host::configs::{BotConfig, FenceConfig, LocationConfig, PmcConfig, RagfairConfig, TraderConfig};
use crate::host::HostConfigs;
use crate::loot::inversion::invert_location;
use crate::rescale::{rescale, rescale_opt};
use crate::types::{ids, CurrentMaxPair, Database, Health, ItemNames, MinMax, Side};

/// Locations key holding shared data rather than a map.
const BASE_LOCATION: &str = "base";

// ---------------------------------------------------------------------------
// Items
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ItemTweakCounts {
    pub unlimited_keys: usize,
    pub no_repair_degradation: usize,
    pub full_auto: usize,
}

pub fn tweak_items(db: &mut Database, item: &ItemTweaks, names: &ItemNames, verbose: bool) -> ItemTweakCounts {
    let mut counts = ItemTweakCounts::default();
    if !item.enable {
        return counts;
    }

    for (id, template) in db.items.iter_mut() {
        let props = &mut template.props;
        let is_key = template.parent == ids::MECHANICAL_KEY || template.parent == ids::KEYCARD;

        if is_key && props.maximum_number_of_usage.is_some() {
            if item.infinite_key_usage {
                props.maximum_number_of_usage = Some(0);
                counts.unlimited_keys += 1;
                if verbose {
                    debug!(item = names.get(id), "No usage limit");
                }
            }
        } else if props.has_repair_degradation() && item.no_repair_degradation {
            props.min_repair_degradation = Some(0.0);
            props.max_repair_degradation = Some(0.0);
            props.min_repair_kit_degradation = Some(0.0);
            props.max_repair_kit_degradation = Some(0.0);
            counts.no_repair_degradation += 1;
            if verbose {
                debug!(item = names.get(id), "No repair damage");
            }
        }

        if item.all_gun_fullauto {
            if let Some(modes) = props.weap_fire_type.as_mut() {
                if !modes.iter().any(|m| m == "fullauto") {
                    modes.push("fullauto".to_string());
                    counts.full_auto += 1;
                }
            }
        }
    }

    info!(
        keys = counts.unlimited_keys,
        repairable = counts.no_repair_degradation,
        full_auto = counts.full_auto,
        "Items tweaked"
    );
    counts
}

pub fn no_armor_repair_damage(db: &mut Database) {
    let materials = &mut db.globals.config.armor_materials;
    for material in materials.values_mut() {
        material.min_repair_degradation = 0.0;
        material.max_repair_degradation = 0.0;
        material.min_repair_kit_degradation = 0.0;
        material.max_repair_kit_degradation = 0.0;
    }
    info!(materials = materials.len(), "Armor repair damage removed");
}

/// Let the default inventory's holster take grenade launchers and SMGs.
pub fn allow_things_in_holster(db: &mut Database) -> Result<(), DataGap> {
    let filter = db
        .items
        .get_mut(ids::DEFAULT_INVENTORY)
        .and_then(|inv| inv.props.slots.as_mut())
        .and_then(|slots| slots.get_mut(ids::HOLSTER_SLOT))
        .and_then(|slot| slot.props.filters.first_mut())
        .ok_or_else(|| DataGap::UnknownItem(ids::DEFAULT_INVENTORY.to_string()))?;

    for tpl in [ids::GRENADE_LAUNCHER, ids::SMG] {
        if !filter.filter.iter().any(|f| f == tpl) {
            filter.filter.push(tpl.to_string());
        }
    }
    info!("Holster accepts grenade launchers and SMGs");
    Ok(())
}

// ---------------------------------------------------------------------------
// Insurance
// ---------------------------------------------------------------------------

pub fn tweak_insurance(db: &mut Database, configs: &mut HostConfigs) {
    for trader in [ids::PRAPOR, ids::THERAPIST] {
        configs
            .insurance
            .insurance_multiplier
            .insert(trader.to_string(), 0.01);
        configs
            .insurance
            .return_chance_percent
            .insert(trader.to_string(), 100.0);

        match db.traders.get_mut(trader) {
            Some(t) => {
                t.base.insurance.min_return_hour = 0.0;
                t.base.insurance.max_return_hour = 1.0;
            }
            None => warn!(gap = %DataGap::UnknownTrader(trader.to_string()), "Insurance return time unchanged"),
        }
    }
    db.globals.config.insurance.max_storage_time_in_hour = 720.0;
    info!("Insurance buffed");
}

// ---------------------------------------------------------------------------
// Traders
// ---------------------------------------------------------------------------

/// Drop every Priscilu assort item that can be bought on the flea market,
/// except the configured exceptions. Returns the number removed.
pub fn filter_priscilu(db: &mut Database, priscilu: &PrisciluConfig) -> Result<usize, DataGap> {
    let items = &db.items;
    let trader = db
        .traders
        .get_mut(ids::PRISCILU)
        .ok_or_else(|| DataGap::UnknownTrader(ids::PRISCILU.to_string()))?;
    let exceptions: HashSet<&str> = priscilu.exceptions.iter().map(String::as_str).collect();

    let before = trader.assort.items.len();
    trader.assort.items.retain(|item| {
        exceptions.contains(item.tpl.as_str())
            || items
                .get(&item.tpl)
                .is_some_and(|t| t.props.can_sell_on_ragfair == Some(false))
    });
    let removed = before - trader.assort.items.len();
    info!(removed, "Priscilu's items filtered");
    Ok(removed)
}

pub fn tweak_traders(trader: &mut TraderConfig, tweaks: &TraderTweaks, names: &ItemNames) {
    trader.purchases_are_found_in_raid = tweaks.purchase_fir;
    trader.trader_price_multipler *= tweaks.price_multiplier;
    info!(multiplier = trader.trader_price_multipler, "Trader prices tweaked");
    tweak_fence(&mut trader.fence, &tweaks.fence, names);
}

pub fn tweak_fence(fence: &mut FenceConfig, tweaks: &FenceTweaks, names: &ItemNames) {
    let multi = tweaks.assort_size_multi;
    fence.weapon_preset_min_max = fence.weapon_preset_min_max.scaled(multi);
    fence.equipment_preset_min_max = fence.equipment_preset_min_max.scaled(multi);

    let mut total: f64 = 0.0;
    for (category, limit) in fence.item_type_limits.iter_mut() {
        *limit = ((*limit).max(1.0) * multi).round();
        total += *limit;
        debug!(category = names.get(category), limit = *limit, "Fence category limit");
    }
    total += fence.weapon_preset_min_max.max + fence.equipment_preset_min_max.max;
    fence.assort_size = (total.max((fence.assort_size * multi).round()) / 100.0).ceil() * 100.0;
    info!(
        guns = %fence.weapon_preset_min_max,
        equipment = %fence.equipment_preset_min_max,
        assort_size = fence.assort_size,
        "Fence assort scaled"
    );

    fence.item_price_mult *= tweaks.price_multi;
    fence.preset_price_mult *= tweaks.price_multi;
    fence.regenerate_assorts_on_refresh = tweaks.regenerate_on_refresh;
    fence.chance_plate_exists_in_armor_percent = tweaks.armor_with_plates_chance;

    let durability = MinMax::new(tweaks.min_curr_durability, tweaks.max_durability);
    fence.armor_max_durability_percent_min_max = durability;
    fence.preset_max_durability_percent_min_max = durability;

    for limit in fence.item_category_rouble_price_limit.values_mut() {
        *limit = (*limit * tweaks.price_limit_multi).round();
    }

    if tweaks.filter_blacklist {
        let exceptions: HashSet<&str> = tweaks.blacklist_exception.iter().map(String::as_str).collect();
        fence.blacklist.retain(|tpl| {
            let keep = exceptions.contains(tpl.as_str());
            debug!(item = names.get(tpl), kept = keep, "Fence blacklist entry");
            keep
        });
    }
    info!(
        item_price = fence.item_price_mult,
        preset_price = fence.preset_price_mult,
        durability = %durability,
        blacklisted = fence.blacklist.len(),
        "Fence tweaked"
    );
}

// ---------------------------------------------------------------------------
// Bots
// ---------------------------------------------------------------------------

/// Set each configured boss spawn chance. Returns the number of spawns
/// changed.
pub fn change_boss_spawn_rate(db: &mut Database, boss_spawn: &BossSpawnConfig) -> usize {
    let mut changed = 0;
    let locations = db
        .locations
        .iter_mut()
        .filter(|(id, _)| id.as_str() != BASE_LOCATION);

    if boss_spawn.unified && !boss_spawn.unified_chance.is_nan() {
        info!(chance = boss_spawn.unified_chance, "Boss spawn rate is unified");
        for (id, location) in locations {
            for spawn in location.base.boss_location_spawn.iter_mut() {
                spawn.boss_chance = boss_spawn.unified_chance;
                changed += 1;
                debug!(boss = %spawn.boss_name, location = %id, chance = spawn.boss_chance, "Boss spawn chance");
            }
        }
        return changed;
    }

    let per_boss: Vec<(String, f64)> = boss_spawn
        .per_boss_spawn
        .iter()
        .filter(|(_, spawn)| spawn.unified && !spawn.unified_chance.is_nan())
        .map(|(name, spawn)| (name.to_lowercase(), spawn.unified_chance))
        .collect();
    for (id, location) in locations {
        for spawn in location.base.boss_location_spawn.iter_mut() {
            let boss = spawn.boss_name.to_lowercase();
            if let Some((_, chance)) = per_boss.iter().find(|(name, _)| *name == boss) {
                spawn.boss_chance = *chance;
                changed += 1;
                debug!(boss = %spawn.boss_name, location = %id, chance, "Boss spawn chance");
            }
        }
    }
    info!(changed, "Boss spawn rates set per boss");
    changed
}

/// Force each configured bot slot to one item. Returns the slots locked.
pub fn lock_bot_equipment(db: &mut Database, equipments: &BotEquipmentsConfig, names: &ItemNames) -> usize {
    let mut locked = 0;
    for (bot_name, slots) in &equipments.equipment_locks {
        for (slot, item_id) in slots {
            if !db.items.contains_key(item_id) {
                warn!(bot = %bot_name, slot = %slot, gap = %DataGap::UnknownItem(item_id.clone()), "Equipment lock skipped");
                continue;
            }
            let Some(bot) = db.bots.get_mut(bot_name) else {
                warn!(gap = %DataGap::UnknownBot(bot_name.clone()), "Equipment lock skipped");
                continue;
            };

            let weights = bot.inventory.equipment.entry(slot.clone()).or_default();
            weights.values_mut().for_each(|w| *w = 0.0);
            weights.insert(item_id.clone(), 100.0);
            bot.chances.equipment.insert(slot.clone(), 100.0);
            locked += 1;
            info!(bot = %bot_name, slot = %slot, item = names.get(item_id), "Equipment locked");
        }
    }
    locked
}

/// Clear per-bot item spawn limits except the keep list.
pub fn remove_inventory_limits(bot: &mut BotConfig, keep: &[String]) {
    let keep: HashSet<&str> = keep.iter().map(String::as_str).collect();
    for limits in bot.item_spawn_limits.values_mut() {
        limits.retain(|tpl, _| keep.contains(tpl.as_str()));
    }
    info!(bots = bot.item_spawn_limits.len(), "Bot inventory limits removed");
}

pub fn tweak_pmc_conversion(pmc: &mut PmcConfig, tweaks: &PmcTweaks) {
    for (bot_name, rate) in &tweaks.pmc_conversion {
        if rate.is_nan() {
            error!(bot = %bot_name, "PMC conversion rate is not a number");
            continue;
        }
        pmc.convert_into_pmc_chance
            .insert(bot_name.clone(), MinMax::fixed(*rate));
        info!(bot = %bot_name, rate, "PMC conversion rate set");
    }
}

/// Keep only the exceptions in the PMC loot blacklist.
pub fn filter_pmc_loot_blacklist(pmc: &mut PmcConfig, tweaks: &PmcTweaks) {
    let exceptions: HashSet<&str> = tweaks.blacklist_exception.iter().map(String::as_str).collect();
    let before = pmc.loot_blacklist.len();
    pmc.loot_blacklist.retain(|tpl| exceptions.contains(tpl.as_str()));
    info!(removed = before - pmc.loot_blacklist.len(), "PMC loot blacklist filtered");
}

/// Scale every bot's kill reward range. The upper bound is multiplied and
/// the lower bound keeps its share of it, through the rescaler.
pub fn scale_experience(db: &mut Database, experience: &ExperienceTweaks) {
    let multi = experience.reward_multiplier;
    for (bot_name, bot) in db.bots.iter_mut() {
        for (difficulty, reward) in bot.experience.reward.iter_mut() {
            let mut pair = CurrentMaxPair::new(reward.min, reward.max);
            match (rescale(&mut pair, Some(reward.max * multi)), pair.current, pair.maximum) {
                (true, Some(min), Some(max)) => *reward = MinMax::new(min, max),
                _ => warn!(bot = %bot_name, difficulty = %difficulty, range = %reward, "Reward range left unchanged"),
            }
        }
    }
    info!(multiplier = multi, "Bot experience rewards scaled");
}

// ---------------------------------------------------------------------------
// Ragfair
// ---------------------------------------------------------------------------

pub fn update_ragfair_sell_chance(ragfair: &mut RagfairConfig, tweaks: &RagfairTweaks) {
    let chance = &mut ragfair.sell.chance;
    chance.base = tweaks.base_sell_chance;
    chance.min_sell_chance_percent = tweaks.min_sell_chance;
    chance.max_sell_chance_percent = tweaks.max_sell_chance;
    ragfair.sell.expire_seconds = tweaks.cancel_wait_time;
    info!(
        base = chance.base,
        min = chance.min_sell_chance_percent,
        max = chance.max_sell_chance_percent,
        "Ragfair sell chance set"
    );
}

// ---------------------------------------------------------------------------
// Loot
// ---------------------------------------------------------------------------

pub fn loot_multiplier(location: &mut LocationConfig, loot: &LootTweaks) {
    if loot.use_global_multiplier {
        let multi = loot.global_multiplier;
        for value in location.loose_loot_multiplier.values_mut() {
            *value *= multi;
        }
        for value in location.static_loot_multiplier.values_mut() {
            *value *= multi;
        }
        info!(multiplier = multi, locations = location.loose_loot_multiplier.len(), "Global loot multiplier applied");
        return;
    }

    for (id, multi) in &loot.per_location_multiplier {
        let loose = location.loose_loot_multiplier.entry(id.clone()).or_insert(1.0);
        *loose *= multi;
        let loose = *loose;
        let fixed = location.static_loot_multiplier.entry(id.clone()).or_insert(1.0);
        *fixed *= multi;
        info!(location = %id, loose, static_multiplier = *fixed, "Loot multiplier applied");
    }
}

/// Make every loose spawn point fire. Returns the number of points changed.
pub fn force_all_spawn_points(db: &mut Database) -> usize {
    let mut forced = 0;
    for location in db.locations.values_mut() {
        if let Some(loose) = location.loose_loot.as_mut() {
            for point in loose.spawnpoints.iter_mut() {
                point.probability = 1.0;
                forced += 1;
            }
        }
    }
    info!(spawn_points = forced, "All loose spawn points forced");
    forced
}

pub fn invert_loot_weights(db: &mut Database) {
    for (id, location) in db.locations.iter_mut() {
        let counts = invert_location(location);
        debug!(
            location = %id,
            spawn_points = counts.spawn_points,
            containers = counts.containers,
            ammo = counts.ammo_tables,
            "Loot weights inverted"
        );
    }
    info!(locations = db.locations.len(), "Loot weights inverted");
}

// ---------------------------------------------------------------------------
// Raids & quests
// ---------------------------------------------------------------------------

pub fn tweak_raid(db: &mut Database, raid: &RaidTweaks) {
    for (id, location) in db.locations.iter_mut().filter(|(id, _)| id.as_str() != BASE_LOCATION) {
        location.base.escape_time_limit += raid.extra_time;
        if raid.chance_extracts_always_available {
            for exit in location.base.exits.iter_mut() {
                if exit.chance > 0.0 && exit.chance < 100.0 {
                    exit.chance = 100.0;
                }
            }
        }
        debug!(location = %id, minutes = location.base.escape_time_limit, "Raid time extended");
    }
    info!(extra_minutes = raid.extra_time, "Raids tweaked");
}

/// Remove the wait between a prerequisite quest and its follow-ups.
pub fn remove_quest_wait_time(db: &mut Database) -> usize {
    let mut cleared = 0;
    for quest in db.quests.values_mut() {
        for condition in quest.conditions.available_for_start.iter_mut() {
            if condition.available_after.is_some_and(|s| s > 0) {
                condition.available_after = Some(0);
                cleared += 1;
            }
        }
    }
    info!(conditions = cleared, "Quest wait times removed");
    cleared
}

// ---------------------------------------------------------------------------
// Profile templates
// ---------------------------------------------------------------------------

fn rescale_template_pair(pair: Option<&mut CurrentMaxPair>, new_max: impl FnOnce(f64) -> f64) {
    if let Some(pair) = pair {
        let target = pair.maximum.map(new_max);
        rescale(pair, target);
    }
}

fn tweak_template_health(health: &mut Health, profile: &ProfileTweaks) {
    let tweaks = &profile.health;
    health.immortal = Some(tweaks.immortal);

    if tweaks.use_exact_values {
        let exact = &tweaks.exact_values;
        rescale_template_pair(health.energy.as_mut(), |_| exact.energy);
        rescale_template_pair(health.hydration.as_mut(), |_| exact.hydration);
        for (name, max) in &exact.body_parts {
            match health.body_parts.get_mut(name) {
                Some(part) => {
                    rescale_opt(part.health.as_mut(), Some(*max));
                }
                None => warn!(body_part = %name, "Body part not found in profile template"),
            }
        }
    } else {
        rescale_template_pair(health.energy.as_mut(), |m| m * tweaks.energy_multiplier);
        rescale_template_pair(health.hydration.as_mut(), |m| m * tweaks.hydration_multiplier);
        for part in health.body_parts.values_mut() {
            rescale_template_pair(part.health.as_mut(), |m| m * tweaks.health_multiplier);
        }
    }
}

pub fn tweak_profile_templates(db: &mut Database, profile: &ProfileTweaks) {
    for (edition, sides) in db.profile_templates.iter_mut() {
        info!(edition = %edition, "Tweaking profile template");
        for side in [Side::Bear, Side::Usec] {
            if let Some(health) = sides.health_mut(side) {
                tweak_template_health(health, profile);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Phase entry point
// ---------------------------------------------------------------------------

/// Run every enabled tweak against the snapshot and config blocks.
pub fn apply(db: &mut Database, configs: &mut HostConfigs, config: &TweakConfig, names: &ItemNames) {
    info!("Modifying database...");
    let verbose = config.verbose_logging;

    tweak_items(db, &config.item, names, verbose);
    if config.item.enable && config.item.no_repair_degradation {
        no_armor_repair_damage(db);
    }
    if config.insurance.enable {
        tweak_insurance(db, configs);
    }

    if config.bot_equipments.enable {
        lock_bot_equipment(db, &config.bot_equipments, names);
        if config.bot_equipments.remove_inventory_limits {
            remove_inventory_limits(&mut configs.bot, &config.bot_equipments.inventory_limit_to_keep);
        }
    }
    tweak_pmc_conversion(&mut configs.pmc, &config.pmc);
    if config.pmc.enable && config.pmc.filter_loot_blacklist {
        filter_pmc_loot_blacklist(&mut configs.pmc, &config.pmc);
    }
    if let Err(gap) = allow_things_in_holster(db) {
        warn!(%gap, "Holster unchanged");
    }

    if config.priscilu.filter_priscilu {
        if let Err(gap) = filter_priscilu(db, &config.priscilu) {
            warn!(%gap, "Priscilu not installed, skipped");
        }
    }
    if config.boss_spawn.enable {
        change_boss_spawn_rate(db, &config.boss_spawn);
    }
    if config.ragfair.better_ragfair_sell_chance {
        update_ragfair_sell_chance(&mut configs.ragfair, &config.ragfair);
    }

    if config.loot.enable {
        loot_multiplier(&mut configs.location, &config.loot);
        if config.loot.disable_container_randomization {
            configs.location.container_randomisation_enabled = false;
        }
        if config.loot.force_all_spawn_points {
            force_all_spawn_points(db);
        }
        if config.loot.invert_weights {
            invert_loot_weights(db);
        }
    }

    if config.trader.enable {
        tweak_traders(&mut configs.trader, &config.trader, names);
    }
    if config.raid.enable {
        tweak_raid(db, &config.raid);
    }
    if config.quest.enable && config.quest.remove_quest_wait_time {
        remove_quest_wait_time(db);
    }
    if config.experience.enable {
        scale_experience(db, &config.experience);
    }
    if config.profile.enable {
        tweak_profile_templates(db, &config.profile);
    }
    info!("Database modification done");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BossSpawn;
    use crate::types::{
        BodyPartHealth, BossLocationSpawn, Exit, Item, ItemProps, ItemTemplate, Location, LooseLoot,
        ProfileSide, ProfileSides, Slot, SlotFilter, SlotProps, SpawnPoint, TemplateCharacter, Trader,
    };
    use std::collections::BTreeMap;

    fn template(id: &str, parent: &str, props: ItemProps) -> ItemTemplate {
        ItemTemplate {
            id: id.into(),
            name: id.into(),
            parent: parent.into(),
            props,
        }
    }

    fn insert(db: &mut Database, t: ItemTemplate) {
        db.items.insert(t.id.clone(), t);
    }

    #[test]
    fn test_keys_get_infinite_uses_others_lose_degradation() {
        let mut db = Database::default();
        insert(
            &mut db,
            template(
                "key",
                ids::MECHANICAL_KEY,
                ItemProps {
                    maximum_number_of_usage: Some(40),
                    ..Default::default()
                },
            ),
        );
        insert(
            &mut db,
            template(
                "gun",
                "weapon",
                ItemProps {
                    min_repair_degradation: Some(0.1),
                    max_repair_degradation: Some(0.2),
                    min_repair_kit_degradation: Some(0.05),
                    max_repair_kit_degradation: Some(0.1),
                    weap_fire_type: Some(vec!["single".into()]),
                    ..Default::default()
                },
            ),
        );
        let config = ItemTweaks {
            all_gun_fullauto: true,
            ..Default::default()
        };

        let counts = tweak_items(&mut db, &config, &ItemNames::default(), true);
        assert_eq!(
            counts,
            ItemTweakCounts {
                unlimited_keys: 1,
                no_repair_degradation: 1,
                full_auto: 1
            }
        );
        assert_eq!(db.items["key"].props.maximum_number_of_usage, Some(0));
        let gun = &db.items["gun"].props;
        assert_eq!(gun.max_repair_kit_degradation, Some(0.0));
        assert_eq!(
            gun.weap_fire_type.as_deref(),
            Some(&["single".to_string(), "fullauto".to_string()][..])
        );
    }

    #[test]
    fn test_holster_filter_extended_once() {
        let mut db = Database::default();
        let slots = (0..3)
            .map(|i| Slot {
                name: format!("slot{i}"),
                props: SlotProps {
                    filters: vec![SlotFilter {
                        filter: vec!["pistol".into()],
                    }],
                },
            })
            .collect();
        insert(
            &mut db,
            template(
                ids::DEFAULT_INVENTORY,
                "",
                ItemProps {
                    slots: Some(slots),
                    ..Default::default()
                },
            ),
        );

        allow_things_in_holster(&mut db).unwrap();
        allow_things_in_holster(&mut db).unwrap();
        let holster = &db.items[ids::DEFAULT_INVENTORY].props.slots.as_ref().unwrap()[2];
        assert_eq!(
            holster.props.filters[0].filter,
            vec!["pistol", ids::GRENADE_LAUNCHER, ids::SMG]
        );

        let mut empty = Database::default();
        assert!(matches!(
            allow_things_in_holster(&mut empty),
            Err(DataGap::UnknownItem(_))
        ));
    }

    #[test]
    fn test_insurance_buff() {
        let mut db = Database::default();
        db.traders.insert(ids::PRAPOR.into(), Trader::default());
        let mut configs = HostConfigs::default();

        tweak_insurance(&mut db, &mut configs);
        assert_eq!(configs.insurance.insurance_multiplier[ids::THERAPIST], 0.01);
        assert_eq!(configs.insurance.return_chance_percent[ids::PRAPOR], 100.0);
        assert_eq!(db.traders[ids::PRAPOR].base.insurance.max_return_hour, 1.0);
        assert_eq!(db.globals.config.insurance.max_storage_time_in_hour, 720.0);
    }

    #[test]
    fn test_priscilu_keeps_exceptions_and_unsellable() {
        let mut db = Database::default();
        insert(&mut db, template("sellable", "", ItemProps::default()));
        insert(
            &mut db,
            template(
                "unsellable",
                "",
                ItemProps {
                    can_sell_on_ragfair: Some(false),
                    ..Default::default()
                },
            ),
        );
        let config = PrisciluConfig::default();
        let exception = config.exceptions[0].clone();

        let mut trader = Trader::default();
        trader.assort.items = vec![
            Item::new("a", "sellable"),
            Item::new("b", "unsellable"),
            Item::new("c", exception.clone()),
        ];
        db.traders.insert(ids::PRISCILU.into(), trader);

        assert_eq!(filter_priscilu(&mut db, &config), Ok(1));
        let kept: Vec<_> = db.traders[ids::PRISCILU]
            .assort
            .items
            .iter()
            .map(|i| i.tpl.clone())
            .collect();
        assert_eq!(kept, vec!["unsellable".to_string(), exception]);

        db.traders.clear();
        assert!(filter_priscilu(&mut db, &config).is_err());
    }

    fn boss_db() -> Database {
        let mut db = Database::default();
        for id in ["bigmap", "base"] {
            let mut location = Location::default();
            location.base.boss_location_spawn = vec![
                BossLocationSpawn {
                    boss_name: "BossKolontay".into(),
                    boss_chance: 10.0,
                },
                BossLocationSpawn {
                    boss_name: "bossBully".into(),
                    boss_chance: 20.0,
                },
            ];
            db.locations.insert(id.into(), location);
        }
        db
    }

    #[test]
    fn test_boss_spawn_unified() {
        let mut db = boss_db();
        let config = BossSpawnConfig {
            enable: true,
            unified: true,
            unified_chance: 75.0,
            per_boss_spawn: BTreeMap::new(),
        };
        assert_eq!(change_boss_spawn_rate(&mut db, &config), 2);
        assert!(db.locations["bigmap"]
            .base
            .boss_location_spawn
            .iter()
            .all(|s| s.boss_chance == 75.0));
        // the shared base entry is not a map
        assert_eq!(db.locations["base"].base.boss_location_spawn[0].boss_chance, 10.0);
    }

    #[test]
    fn test_boss_spawn_per_boss_case_insensitive() {
        let mut db = boss_db();
        let config = BossSpawnConfig {
            enable: true,
            per_boss_spawn: BTreeMap::from([
                ("bosskolontay".to_string(), BossSpawn::default()),
                (
                    "bossbully".to_string(),
                    BossSpawn {
                        unified: false,
                        unified_chance: 5.0,
                    },
                ),
            ]),
            ..Default::default()
        };
        assert_eq!(change_boss_spawn_rate(&mut db, &config), 1);
        let spawns = &db.locations["bigmap"].base.boss_location_spawn;
        assert_eq!(spawns[0].boss_chance, 100.0);
        assert_eq!(spawns[1].boss_chance, 20.0);
    }

    #[test]
    fn test_equipment_lock() {
        let mut db = Database::default();
        insert(&mut db, template("deagle", "", ItemProps::default()));
        let mut bot = crate::types::BotType::default();
        bot.inventory.equipment.insert(
            "Holster".into(),
            BTreeMap::from([("pm".to_string(), 50.0), ("tt".to_string(), 50.0)]),
        );
        db.bots.insert("bossbully".into(), bot);

        let config = BotEquipmentsConfig {
            enable: true,
            equipment_locks: BTreeMap::from([
                (
                    "bossbully".to_string(),
                    BTreeMap::from([("Holster".to_string(), "deagle".to_string())]),
                ),
                (
                    "ghost".to_string(),
                    BTreeMap::from([("Holster".to_string(), "deagle".to_string())]),
                ),
                (
                    "assault".to_string(),
                    BTreeMap::from([("Holster".to_string(), "missing".to_string())]),
                ),
            ]),
            ..Default::default()
        };

        assert_eq!(lock_bot_equipment(&mut db, &config, &ItemNames::default()), 1);
        let bot = &db.bots["bossbully"];
        assert_eq!(bot.inventory.equipment["Holster"]["pm"], 0.0);
        assert_eq!(bot.inventory.equipment["Holster"]["deagle"], 100.0);
        assert_eq!(bot.chances.equipment["Holster"], 100.0);
    }

    #[test]
    fn test_inventory_limits_keep_list() {
        let mut bot = BotConfig::default();
        bot.item_spawn_limits.insert(
            "assault".into(),
            BTreeMap::from([(ids::MONEY.to_string(), 2), ("grenade".to_string(), 1)]),
        );
        remove_inventory_limits(&mut bot, &[ids::MONEY.to_string()]);
        assert_eq!(
            bot.item_spawn_limits["assault"].keys().collect::<Vec<_>>(),
            vec![ids::MONEY]
        );
    }

    #[test]
    fn test_pmc_conversion_and_blacklist() {
        let mut pmc = PmcConfig::default();
        pmc.loot_blacklist = vec!["59f32bb586f774757e1e8442".into(), "junk".into()];
        let mut tweaks = PmcTweaks::default();
        tweaks.pmc_conversion.insert("cursed".into(), f64::NAN);

        tweak_pmc_conversion(&mut pmc, &tweaks);
        filter_pmc_loot_blacklist(&mut pmc, &tweaks);
        assert_eq!(pmc.convert_into_pmc_chance["assault"], MinMax::fixed(30.0));
        assert!(!pmc.convert_into_pmc_chance.contains_key("cursed"));
        assert_eq!(pmc.loot_blacklist, vec!["59f32bb586f774757e1e8442".to_string()]);
    }

    #[test]
    fn test_fence_scaling() {
        let mut fence = FenceConfig::default();
        fence.item_type_limits = BTreeMap::from([("ammo".to_string(), 5.0), ("keys".to_string(), 0.0)]);
        fence.item_category_rouble_price_limit = BTreeMap::from([("armor".to_string(), 12_345.0)]);
        fence.blacklist = vec!["5d52cc5ba4b9367408500062".into(), "other".into()];

        tweak_fence(&mut fence, &FenceTweaks::default(), &ItemNames::default());
        // (12,19) and (10,14) scaled by 3
        assert_eq!(fence.weapon_preset_min_max, MinMax::new(36.0, 57.0));
        assert_eq!(fence.equipment_preset_min_max, MinMax::new(30.0, 42.0));
        // limits 15 + 3 (zero counts as one) + 57 + 42 = 117; assort 140*3 = 420
        assert_eq!(fence.item_type_limits["keys"], 3.0);
        assert_eq!(fence.assort_size, 500.0);
        assert_eq!(fence.armor_max_durability_percent_min_max, MinMax::new(90.0, 100.0));
        assert_eq!(fence.item_category_rouble_price_limit["armor"], 1_234_500.0);
        assert_eq!(fence.blacklist, vec!["5d52cc5ba4b9367408500062".to_string()]);
        assert!(!fence.regenerate_assorts_on_refresh);
    }

    #[test]
    fn test_loot_multiplier_global_and_per_location() {
        let mut location = LocationConfig::default();
        location.loose_loot_multiplier = BTreeMap::from([("bigmap".to_string(), 2.0)]);
        location.static_loot_multiplier = BTreeMap::from([("bigmap".to_string(), 1.0)]);

        let mut per_location = location.clone();
        loot_multiplier(&mut per_location, &LootTweaks::default());
        assert_eq!(per_location.loose_loot_multiplier["bigmap"], 2.0);
        assert_eq!(per_location.loose_loot_multiplier["laboratory"], 2.5);
        assert_eq!(per_location.static_loot_multiplier["rezervbase"], 2.5);

        let global = LootTweaks {
            use_global_multiplier: true,
            global_multiplier: 3.0,
            ..Default::default()
        };
        loot_multiplier(&mut location, &global);
        assert_eq!(location.loose_loot_multiplier["bigmap"], 6.0);
        assert_eq!(location.static_loot_multiplier["bigmap"], 3.0);
        assert!(!location.loose_loot_multiplier.contains_key("laboratory"));
    }

    #[test]
    fn test_force_all_spawn_points() {
        let mut db = Database::default();
        let mut location = Location::default();
        location.loose_loot = Some(LooseLoot {
            spawnpoints: vec![SpawnPoint {
                id: "sp".into(),
                probability: 0.05,
                ..Default::default()
            }],
            ..Default::default()
        });
        db.locations.insert("bigmap".into(), location);

        assert_eq!(force_all_spawn_points(&mut db), 1);
        let loose = db.locations["bigmap"].loose_loot.as_ref().unwrap();
        assert_eq!(loose.spawnpoints[0].probability, 1.0);
    }

    #[test]
    fn test_raid_time_and_extracts() {
        let mut db = Database::default();
        let mut location = Location::default();
        location.base.escape_time_limit = 40.0;
        location.base.exits = vec![
            Exit {
                name: "coop".into(),
                chance: 25.0,
                ..Default::default()
            },
            Exit {
                name: "closed".into(),
                chance: 0.0,
                ..Default::default()
            },
        ];
        db.locations.insert("woods".into(), location);

        tweak_raid(&mut db, &RaidTweaks::default());
        let base = &db.locations["woods"].base;
        assert_eq!(base.escape_time_limit, 100.0);
        assert_eq!(base.exits[0].chance, 100.0);
        assert_eq!(base.exits[1].chance, 0.0);
    }

    #[test]
    fn test_quest_wait_removed() {
        let mut db = Database::default();
        let mut quest = crate::types::Quest::default();
        quest.conditions.available_for_start = vec![
            crate::types::QuestCondition {
                condition_type: "Quest".into(),
                available_after: Some(3600),
            },
            crate::types::QuestCondition {
                condition_type: "Level".into(),
                available_after: None,
            },
        ];
        db.quests.insert("q".into(), quest);

        assert_eq!(remove_quest_wait_time(&mut db), 1);
        assert_eq!(
            db.quests["q"].conditions.available_for_start[0].available_after,
            Some(0)
        );
    }

    #[test]
    fn test_experience_scaled() {
        let mut db = Database::default();
        let mut bot = crate::types::BotType::default();
        bot.experience.reward.insert("normal".into(), MinMax::new(100.0, 200.0));
        db.bots.insert("assault".into(), bot);

        let experience = ExperienceTweaks {
            enable: true,
            reward_multiplier: 1.5,
        };
        scale_experience(&mut db, &experience);
        assert_eq!(db.bots["assault"].experience.reward["normal"], MinMax::new(150.0, 300.0));
    }

    #[test]
    fn test_experience_lower_bound_keeps_share_rounded_down() {
        let mut db = Database::default();
        let mut bot = crate::types::BotType::default();
        bot.experience.reward.insert("easy".into(), MinMax::new(5.0, 10.0));
        bot.experience.reward.insert("empty".into(), MinMax::new(0.0, 0.0));
        db.bots.insert("assault".into(), bot);

        let experience = ExperienceTweaks {
            enable: true,
            reward_multiplier: 1.5,
        };
        scale_experience(&mut db, &experience);
        let rewards = &db.bots["assault"].experience.reward;
        assert_eq!(rewards["easy"], MinMax::new(7.0, 15.0));
        // zero maximum is left alone
        assert_eq!(rewards["empty"], MinMax::new(0.0, 0.0));
    }

    fn health_template() -> Health {
        let mut health = Health {
            energy: Some(CurrentMaxPair::new(100.0, 100.0)),
            hydration: Some(CurrentMaxPair::new(100.0, 100.0)),
            ..Default::default()
        };
        health.body_parts.insert(
            "Head".into(),
            BodyPartHealth {
                health: Some(CurrentMaxPair::new(35.0, 35.0)),
            },
        );
        health
    }

    fn profile_db() -> Database {
        let mut db = Database::default();
        let side = ProfileSide {
            character: Some(TemplateCharacter {
                health: Some(health_template()),
            }),
        };
        db.profile_templates.insert(
            "Standard".into(),
            ProfileSides {
                bear: Some(side.clone()),
                usec: Some(side),
            },
        );
        db
    }

    #[test]
    fn test_profile_template_multipliers() {
        let mut db = profile_db();
        let mut profile = ProfileTweaks {
            enable: true,
            ..Default::default()
        };
        profile.health.health_multiplier = 2.0;
        profile.health.energy_multiplier = 1.5;
        profile.health.immortal = true;

        tweak_profile_templates(&mut db, &profile);
        let health = db.profile_templates["Standard"].health(Side::Usec).unwrap();
        assert_eq!(health.immortal, Some(true));
        assert_eq!(health.energy, Some(CurrentMaxPair::new(150.0, 150.0)));
        assert_eq!(health.hydration, Some(CurrentMaxPair::new(100.0, 100.0)));
        assert_eq!(
            health.body_parts["Head"].health,
            Some(CurrentMaxPair::new(70.0, 70.0))
        );
    }

    #[test]
    fn test_profile_template_exact_values() {
        let mut db = profile_db();
        let mut profile = ProfileTweaks {
            enable: true,
            ..Default::default()
        };
        profile.health.use_exact_values = true;
        profile.health.exact_values.energy = 120.0;

        tweak_profile_templates(&mut db, &profile);
        let health = db.profile_templates["Standard"].health(Side::Bear).unwrap();
        assert_eq!(health.energy, Some(CurrentMaxPair::new(120.0, 120.0)));
        // Head keeps its default exact value
        assert_eq!(
            health.body_parts["Head"].health,
            Some(CurrentMaxPair::new(35.0, 35.0))
        );
    }
}
