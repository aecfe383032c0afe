//! Integration tests running the bundled scenarios against the bundled ship data.

use std::path::PathBuf;

use starliners_core::report::BattleHistory;
use starliners_headless::{
    builtin_ship_classes, run_scenario, verify_determinism, BattleRunner, Scenario,
};

fn scenario_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../data/scenarios")
        .join(name)
}

#[test]
fn bundled_scenarios_load_and_build() {
    let classes = builtin_ship_classes().unwrap();
    for name in ["frontier_clash.ron", "volcanic_levies.ron"] {
        let scenario = Scenario::load(scenario_path(name)).unwrap();
        for class in scenario.class_ids() {
            assert!(classes.get(class).is_some(), "{name} uses unknown class {class}");
        }
        let forces = scenario.build(&classes).unwrap();
        assert_eq!(forces.fleets().count(), scenario.fleets.len());
    }
}

#[test]
fn frontier_clash_file_matches_builtin() {
    let from_file = Scenario::load(scenario_path("frontier_clash.ron")).unwrap();
    assert_eq!(from_file, Scenario::frontier_clash());
}

#[test]
fn frontier_clash_runs_deterministically() {
    let classes = builtin_ship_classes().unwrap();
    let scenario = Scenario::frontier_clash();

    let a = run_scenario(&scenario, &classes, 99, 2_000).unwrap();
    let b = run_scenario(&scenario, &classes, 99, 2_000).unwrap();
    assert_eq!(a, b);
    assert!(verify_determinism(&scenario, &classes, 99, 3));
}

#[test]
fn battle_outcomes_agree_with_counters() {
    let classes = builtin_ship_classes().unwrap();
    let scenario = Scenario::load(scenario_path("volcanic_levies.ron")).unwrap();
    let metrics = run_scenario(&scenario, &classes, scenario.seed, scenario.max_ticks).unwrap();

    let losses: u64 = metrics
        .battles
        .iter()
        .map(|b| u64::from(b.attacker_losses + b.defender_losses))
        .sum();
    if !metrics.timed_out {
        assert_eq!(losses, metrics.counters.ships_destroyed);
    }
    for battle in &metrics.battles {
        assert_eq!(battle.winners.is_empty(), battle.resolution.winner().is_none());
    }
}

#[test]
fn history_archive_survives_save_and_load() {
    let classes = builtin_ship_classes().unwrap();
    let mut scenario = Scenario::frontier_clash();
    scenario.battle.undead_turns = 1;

    let mut runner = BattleRunner::new(&scenario, &classes, 5).unwrap();
    runner.run(scenario.max_ticks).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("history.bin");
    runner.history().save(&path).unwrap();

    let loaded = BattleHistory::load(&path).unwrap();
    assert_eq!(loaded.reports(), runner.history().reports());
}
