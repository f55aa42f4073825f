//! Fixtures for driving the reference host end to end.
//!
//! Builds a small but complete database snapshot, an item factory that
//! counts what it builds, and a few mods that misbehave on purpose.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::NaiveDate;

use spt_tweaks::config::TweakConfig;
use spt_tweaks::engine::TweaksEngine;
use spt_tweaks::error::{HostError, Result};
use spt_tweaks::hooks::splice::Instruction;
use spt_tweaks::host::operations::symbols;
use spt_tweaks::host::{
    DatabaseContext, HostConfigs, HostItemFactory, HostMod, ItemFactory, Server, ServerOptions,
};
use spt_tweaks::types::{
    BodyPartHealth, CurrentMaxPair, Database, Health, Item, ItemDistributionEntry, ItemProps,
    ItemTemplate, Location, LooseLoot, MinMax, PmcData, ProfileInfo, ProfileSide, ProfileSides,
    Repairable, Side, SpawnPoint, SpawnTemplate, SptProfile, TemplateCharacter, Upd,
};

pub const LOCATION: &str = "bigmap";
pub const SESSION: &str = "pmc-session";
pub const WEAPON_TPL: &str = "5447a9cd4bdc2dbd208b4567";

/// Christmas ornament, inactive outside its event.
pub const XMAS_TPL: &str = "5df8a6a186f77412640e2e80";
/// Halloween item, inactive outside its event.
pub const HALLOWEEN_TPL: &str = "635267ab3c89e2112001f826";

/// A date with no seasonal event running.
pub fn midsummer() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 7, 1).unwrap()
}

pub fn options() -> ServerOptions {
    ServerOptions {
        seed: Some(7),
        date: Some(midsummer()),
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// Database
// ---------------------------------------------------------------------------

fn template(id: &str, props: ItemProps) -> ItemTemplate {
    ItemTemplate {
        id: id.into(),
        name: id.into(),
        props,
        ..Default::default()
    }
}

/// One spawn point offering five candidates, two of them seasonal.
pub fn mixed_spawn_point() -> SpawnPoint {
    let keys = [
        ("key-1", "tpl-ammo"),
        ("key-2", "tpl-food"),
        ("key-3", XMAS_TPL),
        ("key-4", "tpl-tool"),
        ("key-5", HALLOWEEN_TPL),
    ];
    SpawnPoint {
        id: "sp-mixed".into(),
        probability: 0.2,
        template: Some(SpawnTemplate {
            id: "tmpl-mixed".into(),
            root: "key-1".into(),
            items: keys.iter().map(|(key, tpl)| Item::new(*key, *tpl)).collect(),
            ..Default::default()
        }),
        item_distribution: keys
            .iter()
            .map(|(key, _)| ItemDistributionEntry::new(*key, 1.0))
            .collect(),
        ..Default::default()
    }
}

fn health(head: CurrentMaxPair, energy: CurrentMaxPair) -> Health {
    let mut health = Health {
        energy: Some(energy),
        hydration: Some(CurrentMaxPair::new(100.0, 100.0)),
        ..Default::default()
    };
    health.body_parts.insert(
        "Head".into(),
        BodyPartHealth {
            health: Some(head),
        },
    );
    health
}

fn template_side() -> ProfileSide {
    ProfileSide {
        character: Some(TemplateCharacter {
            health: Some(health(
                CurrentMaxPair::new(35.0, 35.0),
                CurrentMaxPair::new(100.0, 100.0),
            )),
        }),
    }
}

pub fn database() -> Database {
    let mut db = Database::default();
    for tpl in ["tpl-ammo", "tpl-food", "tpl-tool", XMAS_TPL, HALLOWEEN_TPL] {
        db.items.insert(tpl.into(), template(tpl, ItemProps::default()));
    }
    db.items.insert(
        WEAPON_TPL.into(),
        template(
            WEAPON_TPL,
            ItemProps {
                max_durability: Some(100.0),
                min_repair_degradation: Some(0.1),
                max_repair_degradation: Some(0.2),
                ..Default::default()
            },
        ),
    );

    db.locations.insert(
        LOCATION.into(),
        Location {
            loose_loot: Some(LooseLoot {
                spawnpoint_count: MinMax::new(1.0, 1.0),
                spawnpoints: vec![mixed_spawn_point()],
            }),
            ..Default::default()
        },
    );

    db.profile_templates.insert(
        "Standard".into(),
        ProfileSides {
            bear: Some(template_side()),
            usec: Some(template_side()),
        },
    );
    db
}

/// A player whose head is full and whose energy is half empty.
pub fn profile() -> SptProfile {
    let mut profile = SptProfile {
        info: ProfileInfo {
            id: SESSION.into(),
            username: "tester".into(),
            edition: "Standard".into(),
        },
        ..Default::default()
    };
    let pmc = &mut profile.characters.pmc;
    *pmc = PmcData {
        id: "pmc-1".into(),
        health: Some(health(
            CurrentMaxPair::new(35.0, 35.0),
            CurrentMaxPair::new(50.0, 100.0),
        )),
        ..Default::default()
    };
    pmc.info.nickname = "Tester".into();
    pmc.info.side = Side::Usec;
    profile
}

pub fn worn_weapon() -> Item {
    let mut item = Item::new("weapon-1", WEAPON_TPL);
    item.upd = Some(Upd {
        repairable: Some(Repairable {
            durability: 40.0,
            max_durability: 80.0,
        }),
        ..Default::default()
    });
    item
}

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

/// A server with the engine loaded under `config`, started and serving.
pub fn serving(config: TweakConfig, options: ServerOptions) -> (Server, Arc<CountingFactory>) {
    let db = database();
    let factory = Arc::new(CountingFactory::new(&db));
    let engine = TweaksEngine::new(config);
    let mut server = Server::new(db, HostConfigs::default(), options)
        .with_item_factory(factory.clone());
    server.add_session(profile());
    server.start(&[&engine]).unwrap();
    (server, factory)
}

// ---------------------------------------------------------------------------
// Item factory
// ---------------------------------------------------------------------------

/// The host factory, with a call counter.
pub struct CountingFactory {
    inner: HostItemFactory,
    calls: AtomicUsize,
}

impl CountingFactory {
    pub fn new(db: &Database) -> Self {
        Self {
            inner: HostItemFactory::new(db.items.keys().cloned()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ItemFactory for CountingFactory {
    fn create_item(&self, item_key: &str, template: &SpawnTemplate) -> std::result::Result<Vec<Item>, HostError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.create_item(item_key, template)
    }
}

// ---------------------------------------------------------------------------
// Misbehaving mods
// ---------------------------------------------------------------------------

/// How [`RoutineRewriter`] mangles the game start routine.
#[derive(Debug, Clone, Copy)]
pub enum Rewrite {
    /// Call the health update a second time.
    DuplicateUpdate,
    /// Drop the health update call.
    RemoveUpdate,
}

/// A mod that rewrites the game start routine before the engine sees it.
pub struct RoutineRewriter(pub Rewrite);

impl HostMod for RoutineRewriter {
    fn name(&self) -> &str {
        "routine-rewriter"
    }

    fn after_database_load(&self, ctx: &mut DatabaseContext<'_>) -> Result<()> {
        let Some(mut body) = ctx.routines.routine(symbols::GAME_START).cloned() else {
            return Ok(());
        };
        let target = symbols::UPDATE_PROFILE_HEALTH_VALUES;
        match self.0 {
            Rewrite::DuplicateUpdate => {
                let at = body.instructions.len() - 1;
                body.instructions.splice(
                    at..at,
                    [
                        Instruction::LoadLocal(0),
                        Instruction::LoadLocal(1),
                        Instruction::call(target),
                    ],
                );
            }
            Rewrite::RemoveUpdate => body.instructions.retain(|i| !i.is_call_to(target)),
        }
        ctx.routines.replace_routine(body)?;
        Ok(())
    }
}

pub fn tweaks_with_profile_sync() -> TweakConfig {
    let mut config = TweakConfig::default();
    config.profile.enable = true;
    config.profile.health.health_multiplier = 2.0;
    config.profile.health.energy_multiplier = 2.0;
    config
}
