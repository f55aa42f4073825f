//! Profile health sync on game start.
//!
//! Profile templates may have been rescaled by the database tweaks, but
//! existing characters still carry the old maxima. When a session starts,
//! every body part, energy and hydration is moved onto the template maximum
//! for the profile's edition and side, keeping the fraction the player had.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{info, warn};

use crate::error::{DataGap, Result};
use crate::hooks::splice::{install_call_observer, Callable};
use crate::hooks::Operation;
use crate::host::operations::{symbols, UpdateProfileHealthValues};
use crate::host::server::{PMC_LOCAL, PROFILE_LOCAL};
use crate::host::DatabaseContext;
use crate::rescale::rescale_health;
use crate::types::{PmcData, ProfileSides, SptProfile};

/// Symbol the spliced observer is bound under.
pub const OBSERVER_SYMBOL: &str = "SptTweaks.processProfile";

/// Rescales a PMC's health onto the profile templates.
#[derive(Debug, Clone, Default)]
pub struct ProfileHealthUpdater {
    /// Edition → template sides, snapshotted after the template tweaks.
    templates: BTreeMap<String, ProfileSides>,
}

impl ProfileHealthUpdater {
    pub fn new(templates: BTreeMap<String, ProfileSides>) -> Self {
        Self { templates }
    }

    /// Rescale `pmc` onto the template for `edition`. A PMC without
    /// health is left alone.
    pub fn update(&self, edition: &str, pmc: &mut PmcData) -> std::result::Result<(), DataGap> {
        let Some(health) = pmc.health.as_mut() else {
            return Ok(());
        };
        let side = pmc.info.side;
        let template = self
            .templates
            .get(edition)
            .and_then(|sides| sides.health(side))
            .ok_or_else(|| DataGap::MissingHealthTemplate {
                edition: edition.to_string(),
                side: side.to_string(),
            })?;

        if template.immortal.is_some() {
            health.immortal = template.immortal;
        }
        for part in rescale_health(health, template) {
            warn!(body_part = %part, "Body part not found in template");
        }
        info!(pmc = %pmc.info.nickname, edition, "Profile health updated");
        Ok(())
    }

    fn update_logged(&self, edition: &str, pmc: &mut PmcData) {
        if let Err(gap) = self.update(edition, pmc) {
            warn!(%gap, "Profile health left unchanged");
        }
    }
}

/// Hook the updater in after the host's own health update.
///
/// Uses the host's extension point when it exposes one and falls back to
/// splicing the game start routine otherwise.
pub fn install(ctx: &mut DatabaseContext<'_>, updater: Arc<ProfileHealthUpdater>) -> Result<()> {
    if ctx.hooks.is_exposed(UpdateProfileHealthValues::ID) {
        ctx.hooks
            .augment_after::<UpdateProfileHealthValues, _>(move |sync, _| {
                updater.update_logged(&sync.edition, &mut sync.pmc);
            })?;
        info!(operation = UpdateProfileHealthValues::ID, "Profile health sync registered");
        return Ok(());
    }

    let observer = Callable::new(2, move |frame, args, _| {
        let (profile, pmc) = frame.pair_mut::<SptProfile, PmcData>(args[0], args[1])?;
        updater.update_logged(&profile.info.edition, pmc);
        Ok(())
    });
    install_call_observer(
        ctx.routines,
        symbols::GAME_START,
        symbols::UPDATE_PROFILE_HEALTH_VALUES,
        [PROFILE_LOCAL, PMC_LOCAL],
        OBSERVER_SYMBOL,
        observer,
    )?;
    Ok(())
}
