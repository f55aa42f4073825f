//! Reference host server.
//!
//! Owns the database snapshot and host configuration, runs mods through the
//! two startup phases, then serves requests. Every request entry point
//! routes the overridable operation through the hook registry with the
//! host's own implementation as the fallback.

use std::collections::BTreeMap;
use std::mem;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::NaiveDate;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, error, info, warn};

use super::configs::HostConfigs;
use super::factory::HostItemFactory;
use super::operations::{
    symbols, CalculateSellChance, GenerateLooseLoot, ProfileHealthSync, RepairItem,
    RepairRequest, SellChanceQuery, UpdateProfileHealthValues,
};
use super::routine::RoutineTable;
use super::season::SeasonalCalendar;
use super::{BeforeListenContext, ChatCommands, DatabaseContext, HostMod, ItemFactory, Phase};
use crate::error::{EngineError, HostError, Result};
use crate::hooks::splice::{Callable, Frame, Instruction, RoutineBody};
use crate::hooks::HookRegistry;
use crate::loot::random::RandomPick;
use crate::loot::{LootGenerationRequest, PopulationReport, SpawnPopulationStrategy};
use crate::types::{CurrentMaxPair, Database, Health, Item, MinMax, PmcData, Repairable, SptProfile};

/// Local slots of the game start routine.
pub const PROFILE_LOCAL: usize = 0;
pub const PMC_LOCAL: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Created,
    Serving,
    Aborted,
}

#[derive(Debug, Clone, Default)]
pub struct ServerOptions {
    /// Route profile health updates through the hook registry. When off,
    /// the update is only reachable inside the game start routine.
    pub expose_profile_health_hook: bool,
    /// Seed for repair rolls and random loot; entropy when absent.
    pub seed: Option<u64>,
    /// Fixed date for seasonal checks; today when absent.
    pub date: Option<NaiveDate>,
    pub calendar: SeasonalCalendar,
}

pub struct Server {
    database: Database,
    configs: HostConfigs,
    hooks: HookRegistry,
    routines: RoutineTable,
    commands: ChatCommands,
    sessions: BTreeMap<String, SptProfile>,
    factory: Arc<dyn ItemFactory>,
    loot: RandomPick,
    rng: Mutex<ChaCha8Rng>,
    options: ServerOptions,
    state: Lifecycle,
}

impl Server {
    pub fn new(database: Database, configs: HostConfigs, options: ServerOptions) -> Self {
        let factory = Arc::new(HostItemFactory::new(database.items.keys().cloned()));
        let (loot, rng) = match options.seed {
            Some(seed) => (RandomPick::new(seed), ChaCha8Rng::seed_from_u64(seed)),
            None => (RandomPick::from_entropy(), ChaCha8Rng::from_entropy()),
        };

        let mut hooks = HookRegistry::new();
        hooks.expose::<CalculateSellChance>();
        hooks.expose::<RepairItem>();
        hooks.expose::<GenerateLooseLoot>();
        if options.expose_profile_health_hook {
            hooks.expose::<UpdateProfileHealthValues>();
        }

        Self {
            database,
            configs,
            hooks,
            routines: host_routines(),
            commands: ChatCommands::new(),
            sessions: BTreeMap::new(),
            factory,
            loot,
            rng: Mutex::new(rng),
            options,
            state: Lifecycle::Created,
        }
    }

    /// Swap the item construction primitive.
    pub fn with_item_factory(mut self, factory: Arc<dyn ItemFactory>) -> Self {
        self.factory = factory;
        self
    }

    // -- Startup ----------------------------------------------------------

    /// Run every mod's before-listen callback, then every mod's
    /// after-database-load callback, then start serving.
    ///
    /// Any mod error leaves the server aborted: every later request is
    /// rejected with [`HostError::NotServing`].
    pub fn start(&mut self, mods: &[&dyn HostMod]) -> Result<()> {
        if self.state != Lifecycle::Created {
            warn!(state = ?self.state, "Server already started");
            return match self.state {
                Lifecycle::Serving => Ok(()),
                _ => Err(EngineError::Construction(HostError::NotServing)),
            };
        }

        let result = self.run_phases(mods);
        self.routines.seal();
        match &result {
            Ok(()) => {
                self.state = Lifecycle::Serving;
                info!(
                    ip = %self.configs.http.ip,
                    port = self.configs.http.port,
                    backend = %self.configs.http.backend_ip,
                    mods = mods.len(),
                    handlers = self.hooks.len(),
                    "Server started"
                );
            }
            Err(e) => {
                self.state = Lifecycle::Aborted;
                error!(error = %e, "Startup aborted, server will not serve requests");
            }
        }
        result
    }

    fn run_phases(&mut self, mods: &[&dyn HostMod]) -> Result<()> {
        for m in mods {
            info!(mod_name = m.name(), phase = %Phase::BeforeListen, "Loading mod");
            let mut ctx = BeforeListenContext {
                hooks: &mut self.hooks,
                configs: &mut self.configs,
                commands: &mut self.commands,
            };
            m.before_listen(&mut ctx)?;
        }

        debug!(ip = %self.configs.http.ip, port = self.configs.http.port, "Listener configured");

        for m in mods {
            info!(mod_name = m.name(), phase = %Phase::AfterDatabaseLoad, "Loading mod");
            let mut ctx = DatabaseContext {
                database: &mut self.database,
                configs: &mut self.configs,
                hooks: &mut self.hooks,
                routines: &mut self.routines,
            };
            m.after_database_load(&mut ctx)?;
        }
        Ok(())
    }

    fn ensure_serving(&self) -> std::result::Result<(), HostError> {
        match self.state {
            Lifecycle::Serving => Ok(()),
            _ => Err(HostError::NotServing),
        }
    }

    // -- Accessors --------------------------------------------------------

    pub fn state(&self) -> Lifecycle {
        self.state
    }

    pub fn is_serving(&self) -> bool {
        self.state == Lifecycle::Serving
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn configs(&self) -> &HostConfigs {
        &self.configs
    }

    pub fn hooks(&self) -> &HookRegistry {
        &self.hooks
    }

    pub fn session(&self, session_id: &str) -> Option<&SptProfile> {
        self.sessions.get(session_id)
    }

    /// Register a player profile; its id becomes the session id.
    pub fn add_session(&mut self, profile: SptProfile) {
        self.sessions.insert(profile.info.id.clone(), profile);
    }

    fn today(&self) -> NaiveDate {
        self.options
            .date
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }

    // -- Requests ---------------------------------------------------------

    /// Percent chance that an offer listed at `listed` sells.
    pub fn sell_chance(
        &self,
        average: f64,
        listed: f64,
        quality: f64,
    ) -> std::result::Result<f64, HostError> {
        self.ensure_serving()?;
        let mut query = SellChanceQuery {
            average_offer_price: average,
            player_listed_price: listed,
            quality_multiplier: quality,
            chances: self.configs.ragfair.sell.chance,
        };
        Ok(self
            .hooks
            .invoke::<CalculateSellChance, _>(&mut query, default_sell_chance))
    }

    /// Repair `item` fully, applying the resulting durability to it.
    pub fn repair_item(
        &self,
        item: &mut Item,
        use_repair_kit: bool,
    ) -> std::result::Result<Repairable, HostError> {
        self.ensure_serving()?;
        let not_repairable = || HostError::NotRepairable(item.id.clone());
        let template = self.database.items.get(&item.tpl).ok_or_else(not_repairable)?;
        let repairable = item
            .upd
            .as_ref()
            .and_then(|u| u.repairable)
            .ok_or_else(not_repairable)?;

        let props = &template.props;
        let degradation = if use_repair_kit {
            MinMax::new(
                props.min_repair_kit_degradation.unwrap_or(0.0),
                props.max_repair_kit_degradation.unwrap_or(0.0),
            )
        } else {
            MinMax::new(
                props.min_repair_degradation.unwrap_or(0.0),
                props.max_repair_degradation.unwrap_or(0.0),
            )
        };
        let mut request = RepairRequest {
            item_id: item.id.clone(),
            tpl: item.tpl.clone(),
            repairable,
            template_max_durability: props.max_durability,
            degradation,
            use_repair_kit,
        };

        let randomize = self.configs.repair.apply_randomize_durability_loss;
        let rng = &self.rng;
        let repaired = self.hooks.invoke::<RepairItem, _>(&mut request, |req| {
            let mut rng = rng.lock().unwrap_or_else(PoisonError::into_inner);
            default_repair(req, randomize, &mut *rng)
        });

        if let Some(upd) = item.upd.as_mut() {
            upd.repairable = Some(repaired);
        }
        info!(item = %item.id, durability = %repaired.as_pair(), "Item repaired");
        Ok(repaired)
    }

    /// Loose loot for one raid on `location_id`.
    pub fn generate_loose_loot(
        &self,
        location_id: &str,
    ) -> std::result::Result<PopulationReport, HostError> {
        self.ensure_serving()?;
        let location = self
            .database
            .locations
            .get(location_id)
            .ok_or_else(|| HostError::UnknownLocation(location_id.to_string()))?;

        let mut request = LootGenerationRequest {
            location_id: location_id.to_string(),
            loose_loot: location.loose_loot.clone().unwrap_or_default(),
            blacklist: self
                .configs
                .location
                .loose_loot_blacklist
                .get(location_id)
                .map(|ids| ids.iter().cloned().collect())
                .unwrap_or_default(),
            inactive_seasonal_items: self.options.calendar.inactive_items(self.today()),
            loot_multiplier: self.configs.location.loose_multiplier(location_id),
            factory: Arc::clone(&self.factory),
        };

        let loot = &self.loot;
        let report = self
            .hooks
            .invoke::<GenerateLooseLoot, _>(&mut request, |req| loot.populate(req));
        info!(
            location = location_id,
            spawned = report.spawned.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "Loose loot generated"
        );
        Ok(report)
    }

    /// Run the game start routine for `session_id`.
    pub fn game_start(&mut self, session_id: &str) -> std::result::Result<(), HostError> {
        self.ensure_serving()?;
        let profile = self
            .sessions
            .get_mut(session_id)
            .ok_or_else(|| HostError::UnknownSession(session_id.to_string()))?;

        let pmc = mem::take(&mut profile.characters.pmc);
        let owned = mem::take(profile);
        let mut frame = Frame::new(vec![Box::new(owned), Box::new(pmc)]);
        let result = self
            .routines
            .execute(symbols::GAME_START, &mut frame, &self.hooks);

        let mut locals = frame.into_locals().into_iter();
        let restored = locals.next().and_then(|l| l.downcast::<SptProfile>().ok());
        let restored_pmc = locals.next().and_then(|l| l.downcast::<PmcData>().ok());
        match (restored, restored_pmc) {
            (Some(p), Some(pmc)) => {
                *profile = *p;
                profile.characters.pmc = *pmc;
            }
            _ => error!(session = session_id, "Game start routine lost the profile locals"),
        }

        match &result {
            Ok(()) => info!(session = session_id, "Game started"),
            Err(e) => error!(session = session_id, error = %e, "Game start failed"),
        }
        result
    }

    /// Dispatch a chat message to the command registered for its prefix.
    pub fn chat_command(&mut self, text: &str) -> std::result::Result<String, HostError> {
        self.ensure_serving()?;
        let prefix = text.split(' ').next().unwrap_or_default();
        let command = self
            .commands
            .find(prefix)
            .ok_or_else(|| HostError::UnknownCommand(prefix.to_string()))?;
        debug!(prefix, text, "Chat command received");
        Ok(command.handle(text, &mut self.configs))
    }
}

// ---------------------------------------------------------------------------
// Host defaults
// ---------------------------------------------------------------------------

/// The host's own sell chance: cheaper than average sells more often.
pub fn default_sell_chance(query: &mut SellChanceQuery) -> f64 {
    let chances = query.chances;
    if query.player_listed_price <= 0.0 {
        return chances.max_sell_chance_percent;
    }
    let base = chances.base * query.quality_multiplier;
    let ratio = query.average_offer_price / query.player_listed_price;
    let raw = (base * chances.sell_multiplier * ratio).round();
    raw.clamp(
        chances.min_sell_chance_percent,
        chances.max_sell_chance_percent.max(chances.min_sell_chance_percent),
    )
}

/// The host's own repair: max durability loses a rolled fraction of the
/// repaired amount, then durability is restored to the new max.
pub fn default_repair<R: Rng + ?Sized>(req: &mut RepairRequest, randomize: bool, rng: &mut R) -> Repairable {
    let state = req.repairable;
    let repaired_amount = (state.max_durability - state.durability).max(0.0);
    let range = req.degradation;
    let fraction = if randomize && range.min < range.max {
        rng.gen_range(range.min..=range.max)
    } else {
        range.max
    };
    let new_max = (state.max_durability - repaired_amount * fraction).max(0.0);
    Repairable {
        durability: new_max,
        max_durability: new_max,
    }
}

fn clamp_pair(pair: Option<&mut CurrentMaxPair>) {
    if let Some(CurrentMaxPair {
        current: Some(current),
        maximum: Some(maximum),
    }) = pair
    {
        *current = (*current).clamp(0.0, (*maximum).max(0.0));
    }
}

/// The host's own health update: keep every current value within bounds.
fn clamp_health(health: &mut Health) {
    clamp_pair(health.energy.as_mut());
    clamp_pair(health.hydration.as_mut());
    for part in health.body_parts.values_mut() {
        clamp_pair(part.health.as_mut());
    }
}

/// The game start routine and the native symbols it calls.
fn host_routines() -> RoutineTable {
    let mut routines = RoutineTable::new();

    routines.define_symbol(
        symbols::CREATE_PROFILE_SNAPSHOT,
        Callable::new(1, |frame, args, _| {
            let profile = frame.local_mut::<SptProfile>(args[0])?;
            debug!(profile = %profile.info.id, "Profile snapshot taken");
            Ok(())
        }),
    );
    routines.define_symbol(
        symbols::CHECK_PMC_PROFILE,
        Callable::new(1, |frame, args, _| {
            let pmc = frame.local_mut::<PmcData>(args[0])?;
            pmc.health.get_or_insert_with(Health::default);
            Ok(())
        }),
    );
    routines.define_symbol(
        symbols::UPDATE_PROFILE_HEALTH_VALUES,
        Callable::new(2, |frame, args, hooks| {
            let (profile, pmc) = frame.pair_mut::<SptProfile, PmcData>(args[0], args[1])?;
            let mut sync = ProfileHealthSync {
                edition: profile.info.edition.clone(),
                pmc: mem::take(pmc),
            };
            hooks.invoke::<UpdateProfileHealthValues, _>(&mut sync, |s| {
                if let Some(health) = s.pmc.health.as_mut() {
                    clamp_health(health);
                }
            });
            *pmc = sync.pmc;
            Ok(())
        }),
    );

    routines.define_routine(RoutineBody::new(
        symbols::GAME_START,
        vec![
            Instruction::LoadLocal(PMC_LOCAL),
            Instruction::call(symbols::CHECK_PMC_PROFILE),
            Instruction::LoadLocal(PROFILE_LOCAL),
            Instruction::LoadLocal(PMC_LOCAL),
            Instruction::call(symbols::UPDATE_PROFILE_HEALTH_VALUES),
            Instruction::LoadLocal(PROFILE_LOCAL),
            Instruction::call(symbols::CREATE_PROFILE_SNAPSHOT),
            Instruction::Return,
        ],
    ));
    routines
}
