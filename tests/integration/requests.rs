//! Sell chance, repair and chat command requests.

use spt_tweaks::config::TweakConfig;
use spt_tweaks::error::HostError;
use spt_tweaks::types::{MinMax, Repairable};

use crate::mock_host::{self, WEAPON_TPL};

// -- Ragfair ----------------------------------------------------------------

#[test]
fn test_sell_chance_punishes_only_overpricing() {
    let (server, _) = mock_host::serving(TweakConfig::default(), mock_host::options());

    assert_eq!(server.sell_chance(10_000.0, 5_000.0, 1.0), Ok(100.0));
    assert_eq!(server.sell_chance(10_000.0, 10_000.0, 1.0), Ok(100.0));
    assert_eq!(server.sell_chance(10_000.0, 20_000.0, 1.0), Ok(50.0));
}

#[test]
fn test_sell_chance_clamped_to_configured_bounds() {
    let (server, _) = mock_host::serving(TweakConfig::default(), mock_host::options());

    assert_eq!(server.sell_chance(100.0, 1_000_000.0, 1.0), Ok(20.0));
    assert_eq!(server.sell_chance(100.0, 100.0, 5.0), Ok(100.0));
}

#[test]
fn test_host_sell_chance_without_override() {
    let mut config = TweakConfig::default();
    config.ragfair.better_ragfair_sell_chance = false;
    let (server, _) = mock_host::serving(config, mock_host::options());

    // 50 base * 1.24 sell multiplier
    assert_eq!(server.sell_chance(10_000.0, 10_000.0, 1.0), Ok(62.0));
}

// -- Repair -----------------------------------------------------------------

#[test]
fn test_lossless_repair_keeps_max_durability() {
    let mut config = TweakConfig::default();
    config.repair.enable = true;
    let (server, _) = mock_host::serving(config, mock_host::options());

    let mut weapon = mock_host::worn_weapon();
    let repaired = server.repair_item(&mut weapon, false).unwrap();
    assert_eq!(
        repaired,
        Repairable {
            durability: 80.0,
            max_durability: 80.0
        }
    );
    assert_eq!(weapon.upd.unwrap().repairable, Some(repaired));
}

#[test]
fn test_reset_repair_restores_factory_durability() {
    let mut config = TweakConfig::default();
    config.repair.enable = true;
    config.repair.reset_durability = true;
    let (server, _) = mock_host::serving(config, mock_host::options());

    let mut weapon = mock_host::worn_weapon();
    let repaired = server.repair_item(&mut weapon, true).unwrap();
    assert_eq!(repaired.max_durability, 100.0);
    assert_eq!(repaired.durability, 100.0);
}

#[test]
fn test_host_repair_loses_durability() {
    let (server, _) = mock_host::serving(TweakConfig::default(), mock_host::options());

    let mut weapon = mock_host::worn_weapon();
    let repaired = server.repair_item(&mut weapon, false).unwrap();
    assert!(repaired.max_durability <= 80.0);
    assert_eq!(repaired.durability, repaired.max_durability);
}

#[test]
fn test_item_without_durability_not_repairable() {
    let (server, _) = mock_host::serving(TweakConfig::default(), mock_host::options());

    let mut item = spt_tweaks::types::Item::new("plain", WEAPON_TPL);
    assert_eq!(
        server.repair_item(&mut item, false),
        Err(HostError::NotRepairable("plain".into()))
    );
}

// -- Chat command -----------------------------------------------------------

#[test]
fn test_chat_command_reads_and_writes_pmc_conversion() {
    let (mut server, _) = mock_host::serving(TweakConfig::default(), mock_host::options());

    assert_eq!(
        server.chat_command("tweaks get pmcConv pmcbot").unwrap(),
        "[40% - 40%]"
    );
    assert_eq!(
        server.chat_command("tweaks set pmcConv assault 55").unwrap(),
        "Success"
    );
    assert_eq!(
        server.configs().pmc.convert_into_pmc_chance["assault"],
        MinMax::fixed(55.0)
    );
    assert_eq!(
        server.chat_command("tweaks get pmcConv assault").unwrap(),
        "[55% - 55%]"
    );
    assert_eq!(
        server.chat_command("tweaks set pmcConv assault lots").unwrap(),
        "Not a number"
    );
    assert_eq!(
        server.chat_command("tweaks get pmcConv gifter").unwrap(),
        "Impossible"
    );
}

#[test]
fn test_unknown_chat_prefix_rejected() {
    let (mut server, _) = mock_host::serving(TweakConfig::default(), mock_host::options());
    assert_eq!(
        server.chat_command("spawn 10 bosses"),
        Err(HostError::UnknownCommand("spawn".into()))
    );
}
