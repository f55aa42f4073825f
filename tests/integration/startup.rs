//! Startup ordering and aborts.

use spt_tweaks::config::TweakConfig;
use spt_tweaks::engine::TweaksEngine;
use spt_tweaks::error::{EngineError, HostError, StartupError};
use spt_tweaks::hooks::{HandlerKind, Operation};
use spt_tweaks::host::operations::{CalculateSellChance, GenerateLooseLoot, RepairItem};
use spt_tweaks::host::server::Lifecycle;
use spt_tweaks::host::{HostConfigs, Server, ServerOptions};

use crate::mock_host::{self, Rewrite, RoutineRewriter, SESSION};

fn server(options: ServerOptions) -> Server {
    let mut server = Server::new(mock_host::database(), HostConfigs::default(), options);
    server.add_session(mock_host::profile());
    server
}

#[test]
fn test_engine_starts_and_installs_overrides() {
    let mut config = TweakConfig::default();
    config.repair.enable = true;
    config.loot.force_all_loose_loot = true;
    let (server, _) = mock_host::serving(config, mock_host::options());

    assert_eq!(server.state(), Lifecycle::Serving);
    let hooks = server.hooks();
    assert_eq!(hooks.installed(CalculateSellChance::ID), Some(HandlerKind::Replace));
    assert_eq!(hooks.installed(RepairItem::ID), Some(HandlerKind::Replace));
    assert_eq!(hooks.installed(GenerateLooseLoot::ID), Some(HandlerKind::Replace));
}

#[test]
fn test_database_tweaks_land_in_snapshot_and_configs() {
    let (server, _) = mock_host::serving(mock_host::tweaks_with_profile_sync(), mock_host::options());

    let chance = server.configs().ragfair.sell.chance;
    assert_eq!(chance.base, 100.0);
    assert_eq!(chance.min_sell_chance_percent, 20.0);
    assert!(server.configs().pmc.convert_into_pmc_chance.contains_key("pmcbot"));

    let template = server.database().profile_templates["Standard"]
        .health(spt_tweaks::types::Side::Usec)
        .cloned()
        .unwrap();
    assert_eq!(template.energy.unwrap().maximum, Some(200.0));
    assert_eq!(template.body_parts["Head"].health.unwrap().maximum, Some(70.0));
}

#[test]
fn test_ambiguous_call_site_aborts_startup() {
    let engine = TweaksEngine::new(mock_host::tweaks_with_profile_sync());
    let rewriter = RoutineRewriter(Rewrite::DuplicateUpdate);
    let mut server = server(mock_host::options());

    let err = server.start(&[&rewriter, &engine]).unwrap_err();
    assert!(err.is_fatal());
    assert!(matches!(
        err,
        EngineError::Startup(StartupError::PatternAmbiguous { matches: 2, .. })
    ));
    assert_eq!(server.state(), Lifecycle::Aborted);

    assert_eq!(server.sell_chance(100.0, 100.0, 1.0), Err(HostError::NotServing));
    assert_eq!(server.game_start(SESSION), Err(HostError::NotServing));
    assert!(matches!(
        server.generate_loose_loot(mock_host::LOCATION),
        Err(HostError::NotServing)
    ));
}

#[test]
fn test_missing_call_site_aborts_startup() {
    let engine = TweaksEngine::new(mock_host::tweaks_with_profile_sync());
    let rewriter = RoutineRewriter(Rewrite::RemoveUpdate);
    let mut server = server(mock_host::options());

    let err = server.start(&[&rewriter, &engine]).unwrap_err();
    assert!(matches!(
        err,
        EngineError::Startup(StartupError::PatternNotFound { .. })
    ));
    assert!(!server.is_serving());
    assert!(matches!(
        server.chat_command("tweaks get pmcConv"),
        Err(HostError::NotServing)
    ));
}

#[test]
fn test_exposed_hook_ignores_routine_shape() {
    let engine = TweaksEngine::new(mock_host::tweaks_with_profile_sync());
    let rewriter = RoutineRewriter(Rewrite::DuplicateUpdate);
    let mut server = server(ServerOptions {
        expose_profile_health_hook: true,
        ..mock_host::options()
    });

    server.start(&[&rewriter, &engine]).unwrap();
    assert!(server.is_serving());
}

#[test]
fn test_profile_sync_disabled_needs_no_call_site() {
    let engine = TweaksEngine::new(TweakConfig::default());
    let rewriter = RoutineRewriter(Rewrite::RemoveUpdate);
    let mut server = server(mock_host::options());

    server.start(&[&rewriter, &engine]).unwrap();
    assert!(server.is_serving());
}

#[test]
fn test_second_start_is_noop() {
    let (mut server, _) = mock_host::serving(TweakConfig::default(), mock_host::options());
    let handlers = server.hooks().len();
    let engine = TweaksEngine::new(TweakConfig::default());

    server.start(&[&engine]).unwrap();
    assert_eq!(server.hooks().len(), handlers);
}
