//! Loose loot generation through the host.

use std::collections::HashSet;

use chrono::NaiveDate;

use spt_tweaks::config::TweakConfig;
use spt_tweaks::error::HostError;
use spt_tweaks::hooks::Operation;
use spt_tweaks::host::operations::GenerateLooseLoot;
use spt_tweaks::host::ServerOptions;
use spt_tweaks::loot::PopulationReport;

use crate::mock_host::{self, HALLOWEEN_TPL, LOCATION, XMAS_TPL};

fn force_all() -> TweakConfig {
    let mut config = TweakConfig::default();
    config.loot.force_all_loose_loot = true;
    config
}

fn root_tpls(report: &PopulationReport) -> Vec<String> {
    report
        .spawned
        .iter()
        .map(|s| s.items[0].tpl.clone())
        .collect()
}

#[test]
fn test_force_all_spawns_every_active_candidate() {
    let (server, factory) = mock_host::serving(force_all(), mock_host::options());

    let report = server.generate_loose_loot(LOCATION).unwrap();
    assert_eq!(report.spawned.len(), 3);
    assert_eq!(factory.calls(), 3);
    assert!(report.skipped.is_empty());
    assert!(report.failed.is_empty());

    let tpls = root_tpls(&report);
    assert!(!tpls.iter().any(|t| t == XMAS_TPL || t == HALLOWEEN_TPL));
    assert_eq!(tpls, vec!["tpl-ammo", "tpl-food", "tpl-tool"]);
}

#[test]
fn test_force_all_roots_are_fresh_and_distinct() {
    let (server, _) = mock_host::serving(force_all(), mock_host::options());

    let report = server.generate_loose_loot(LOCATION).unwrap();
    let roots: HashSet<&str> = report.spawned.iter().map(|s| s.root.as_str()).collect();
    assert_eq!(roots.len(), report.spawned.len());
    for spawned in &report.spawned {
        assert_eq!(spawned.items[0].id, spawned.root);
        assert!(!spawned.root.starts_with("key-"));
        assert!(!spawned.use_gravity);
        assert!(!spawned.random_rotation);
    }

    // a second raid builds new instances
    let again = server.generate_loose_loot(LOCATION).unwrap();
    assert!(again.spawned.iter().all(|s| !roots.contains(s.root.as_str())));
}

#[test]
fn test_active_event_items_spawn() {
    let christmas = ServerOptions {
        date: NaiveDate::from_ymd_opt(2024, 12, 25),
        ..mock_host::options()
    };
    let (server, _) = mock_host::serving(force_all(), christmas);

    let report = server.generate_loose_loot(LOCATION).unwrap();
    let tpls = root_tpls(&report);
    assert_eq!(tpls.len(), 4);
    assert!(tpls.iter().any(|t| t == XMAS_TPL));
    assert!(!tpls.iter().any(|t| t == HALLOWEEN_TPL));
}

#[test]
fn test_default_generation_never_spawns_inactive_items() {
    let (server, _) = mock_host::serving(TweakConfig::default(), mock_host::options());
    assert!(server
        .hooks()
        .installed(GenerateLooseLoot::ID)
        .is_none());

    for _ in 0..10 {
        let report = server.generate_loose_loot(LOCATION).unwrap();
        assert!(report.spawned.len() <= 1);
        assert!(!root_tpls(&report)
            .iter()
            .any(|t| t == XMAS_TPL || t == HALLOWEEN_TPL));
    }
}

#[test]
fn test_unknown_location_rejected() {
    let (server, _) = mock_host::serving(force_all(), mock_host::options());
    assert!(matches!(
        server.generate_loose_loot("moon"),
        Err(HostError::UnknownLocation(id)) if id == "moon"
    ));
}
