//! Profile health sync on game start, through both install paths.

use spt_tweaks::config::TweakConfig;
use spt_tweaks::error::HostError;
use spt_tweaks::hooks::{HandlerKind, Operation};
use spt_tweaks::host::operations::UpdateProfileHealthValues;
use spt_tweaks::host::{Server, ServerOptions};
use spt_tweaks::types::{CurrentMaxPair, Health};

use crate::mock_host::{self, SESSION};

fn health_after_start(server: &mut Server) -> Health {
    server.game_start(SESSION).unwrap();
    server
        .session(SESSION)
        .and_then(|p| p.characters.pmc.health.clone())
        .unwrap()
}

fn assert_synced(health: &Health) {
    assert_eq!(
        health.body_parts["Head"].health,
        Some(CurrentMaxPair::new(70.0, 70.0))
    );
    assert_eq!(health.energy, Some(CurrentMaxPair::new(100.0, 200.0)));
    assert_eq!(health.hydration, Some(CurrentMaxPair::new(100.0, 100.0)));
}

#[test]
fn test_spliced_observer_syncs_health() {
    let (mut server, _) =
        mock_host::serving(mock_host::tweaks_with_profile_sync(), mock_host::options());
    assert!(!server.hooks().is_exposed(UpdateProfileHealthValues::ID));

    let health = health_after_start(&mut server);
    assert_synced(&health);
    assert_eq!(health.immortal, Some(false));
}

#[test]
fn test_registered_observer_syncs_health() {
    let options = ServerOptions {
        expose_profile_health_hook: true,
        ..mock_host::options()
    };
    let (mut server, _) = mock_host::serving(mock_host::tweaks_with_profile_sync(), options);
    assert_eq!(
        server.hooks().installed(UpdateProfileHealthValues::ID),
        Some(HandlerKind::AugmentAfter)
    );

    assert_synced(&health_after_start(&mut server));
}

#[test]
fn test_repeated_game_start_is_stable() {
    let (mut server, _) =
        mock_host::serving(mock_host::tweaks_with_profile_sync(), mock_host::options());
    let first = health_after_start(&mut server);
    let second = health_after_start(&mut server);
    assert_eq!(first, second);
    assert_eq!(server.session(SESSION).unwrap().info.edition, "Standard");
}

#[test]
fn test_disabled_sync_only_clamps() {
    let (mut server, _) = mock_host::serving(TweakConfig::default(), mock_host::options());

    let health = health_after_start(&mut server);
    assert_eq!(
        health.body_parts["Head"].health,
        Some(CurrentMaxPair::new(35.0, 35.0))
    );
    assert_eq!(health.energy, Some(CurrentMaxPair::new(50.0, 100.0)));
}

#[test]
fn test_unknown_session_rejected() {
    let (mut server, _) =
        mock_host::serving(mock_host::tweaks_with_profile_sync(), mock_host::options());
    assert_eq!(
        server.game_start("nobody"),
        Err(HostError::UnknownSession("nobody".into()))
    );
}
