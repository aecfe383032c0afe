//! Headless battle runner.
//!
//! Drives the world loop a game client would: each tick it matches idle
//! fleets into battles, ticks every battle and advances construction at
//! turn boundaries. Output is collected as [`RunMetrics`].

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use tracing::{debug, info};

use starliners_core::battle::{BattleConfig, BattleContext};
use starliners_core::engagement::Engagements;
use starliners_core::error::Result;
use starliners_core::forces::Forces;
use starliners_core::math::percent;
use starliners_core::metrics::BattleMetrics;
use starliners_core::notifications::RecordingNotifications;
use starliners_core::random::WorldRng;
use starliners_core::report::BattleHistory;
use starliners_core::ship::ShipClassRegistry;

use crate::metrics::{BattleOutcome, RunMetrics};
use crate::scenario::{Scenario, ScenarioError};

/// World state of one headless run.
#[derive(Debug, Clone)]
pub struct BattleRunner {
    scenario: String,
    seed: u64,
    construction_percent: u32,
    config: BattleConfig,
    forces: Forces,
    engagements: Engagements,
    rng: WorldRng,
    notifications: RecordingNotifications,
    history: BattleHistory,
    metrics: BattleMetrics,
    now: u64,
}

impl BattleRunner {
    /// Build the scenario's forces and seed the world random source.
    pub fn new(
        scenario: &Scenario,
        classes: &ShipClassRegistry,
        seed: u64,
    ) -> std::result::Result<Self, ScenarioError> {
        let forces = scenario.build(classes)?;
        Ok(Self {
            scenario: scenario.name.clone(),
            seed,
            construction_percent: scenario.construction_percent,
            config: scenario.battle,
            forces,
            engagements: Engagements::new(scenario.battle),
            rng: WorldRng::new(seed),
            notifications: RecordingNotifications::new(),
            history: BattleHistory::new(),
            metrics: BattleMetrics::default(),
            now: 0,
        })
    }

    /// Current tick.
    #[must_use]
    pub const fn now(&self) -> u64 {
        self.now
    }

    /// Fleets, levies and ships.
    #[must_use]
    pub const fn forces(&self) -> &Forces {
        &self.forces
    }

    /// Running battles.
    #[must_use]
    pub const fn engagements(&self) -> &Engagements {
        &self.engagements
    }

    /// Archived battles.
    #[must_use]
    pub const fn history(&self) -> &BattleHistory {
        &self.history
    }

    /// Notifications sent so far.
    #[must_use]
    pub const fn notifications(&self) -> &RecordingNotifications {
        &self.notifications
    }

    /// Advance the world by one tick.
    pub fn step(&mut self) -> Result<()> {
        let opened = self
            .engagements
            .detect(&mut self.forces, self.now, &mut self.notifications)?;
        for id in opened {
            debug!(battle = %id, tick = self.now, "Engagement detected");
        }

        let mut ctx = BattleContext::new(
            self.now,
            &mut self.rng,
            &mut self.notifications,
            &mut self.history,
            &mut self.metrics,
        );
        self.engagements.tick(&mut self.forces, &mut ctx)?;

        if self.construction_percent > 0 && self.now % self.config.ticks_per_turn.max(1) == 0 {
            let progress = percent(i32::try_from(self.construction_percent).unwrap_or(100));
            let completed = self.forces.advance_construction(progress);
            if completed > 0 {
                debug!(tick = self.now, completed, "Ships completed");
            }
        }

        self.now += 1;
        Ok(())
    }

    /// Check if no battle is running and none can start.
    fn is_settled(&self) -> bool {
        self.engagements.is_empty() && self.now > 0
    }

    /// Run until every battle has been archived or `max_ticks` pass.
    pub fn run(&mut self, max_ticks: u64) -> Result<RunMetrics> {
        info!(scenario = %self.scenario, seed = self.seed, max_ticks, "Run started");
        while self.now < max_ticks {
            self.step()?;
            if self.is_settled() {
                break;
            }
        }
        let metrics = self.collect();
        info!(
            scenario = %self.scenario,
            ticks = metrics.duration_ticks,
            battles = metrics.battles.len(),
            winner = ?metrics.winner(),
            "Run finished"
        );
        Ok(metrics)
    }

    /// Snapshot the outcome so far.
    #[must_use]
    pub fn collect(&self) -> RunMetrics {
        let name_of = |id: u32| {
            self.forces
                .factions()
                .find(|faction| faction.id.0 == id)
                .map_or_else(|| format!("faction#{id}"), |faction| faction.name.clone())
        };
        RunMetrics {
            scenario: self.scenario.clone(),
            seed: self.seed,
            duration_ticks: self.now,
            timed_out: !self.engagements.is_empty(),
            battles: self
                .history
                .reports()
                .iter()
                .map(|report| BattleOutcome::from_report(report, name_of))
                .collect(),
            counters: self.metrics,
            scores: self
                .forces
                .factions()
                .map(|faction| (faction.name.clone(), faction.score))
                .collect(),
            state_hash: self.state_hash(),
        }
    }

    /// Hash of the world state.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.now.hash(&mut hasher);
        self.rng.draws().hash(&mut hasher);
        for battle in self.engagements.battles() {
            battle.state_hash(&self.forces).hash(&mut hasher);
        }
        for levy in self.forces.levies() {
            levy.id().hash(&mut hasher);
            for ship in levy.ships() {
                ship.id().hash(&mut hasher);
                ship.layers().hash(&mut hasher);
                ship.experience().hash(&mut hasher);
            }
        }
        for faction in self.forces.factions() {
            faction.score.hash(&mut hasher);
        }
        hasher.finish()
    }
}

/// Build and run a scenario once.
pub fn run_scenario(
    scenario: &Scenario,
    classes: &ShipClassRegistry,
    seed: u64,
    max_ticks: u64,
) -> std::result::Result<RunMetrics, ScenarioError> {
    let mut runner = BattleRunner::new(scenario, classes, seed)?;
    Ok(runner.run(max_ticks)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::ShipCount;
    use starliners_core::battle::BattleResolution;
    use starliners_core::notifications::NotificationCategory;
    use starliners_test_utils::sample_registry;

    fn lopsided() -> Scenario {
        let mut scenario = Scenario::frontier_clash();
        scenario.fleets[0].levies[0].ships = vec![ShipCount::new("lancer", 8)];
        scenario.fleets[1].levies[0].ships = vec![ShipCount::new("picket", 3)];
        scenario.battle.undead_turns = 2;
        scenario
    }

    #[test]
    fn test_run_to_completion() {
        let metrics = run_scenario(&lopsided(), &sample_registry(), 3, 5_000).unwrap();
        assert!(!metrics.timed_out);
        assert_eq!(metrics.battles.len(), 1);
        assert_eq!(
            metrics.battles[0].resolution,
            BattleResolution::VictoryAttacker
        );
        assert_eq!(metrics.winner(), Some("Concord"));
        assert_eq!(metrics.battles[0].defender_losses, 3);
        assert_eq!(metrics.scores["Concord"], 30);
    }

    #[test]
    fn test_same_seed_same_hash() {
        let a = run_scenario(&lopsided(), &sample_registry(), 17, 5_000).unwrap();
        let b = run_scenario(&lopsided(), &sample_registry(), 17, 5_000).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_tick_limit_times_out() {
        let metrics = run_scenario(&Scenario::frontier_clash(), &sample_registry(), 1, 3).unwrap();
        assert!(metrics.timed_out);
        assert!(metrics.battles.is_empty());
        assert_eq!(metrics.duration_ticks, 3);
    }

    #[test]
    fn test_neutral_fleets_never_fight() {
        let mut scenario = lopsided();
        for faction in &mut scenario.factions {
            faction.hostile.clear();
        }
        let mut runner = BattleRunner::new(&scenario, &sample_registry(), 1).unwrap();
        let metrics = runner.run(50).unwrap();
        assert!(metrics.battles.is_empty());
        assert!(runner.engagements().is_empty());
        assert!(runner.notifications().is_empty());
    }

    #[test]
    fn test_outcome_notifications() {
        let mut runner = BattleRunner::new(&lopsided(), &sample_registry(), 9).unwrap();
        runner.run(5_000).unwrap();
        assert_eq!(
            runner
                .notifications()
                .of_category(NotificationCategory::Victory)
                .count(),
            1
        );
        assert_eq!(runner.history().len(), 1);
    }

    #[test]
    fn test_construction_completes_ships() {
        let mut scenario = lopsided();
        scenario.construction_percent = 50;
        scenario.fleets[0].levies[0].building = vec![ShipCount::new("lancer", 2)];
        for faction in &mut scenario.factions {
            faction.hostile.clear();
        }
        let mut runner = BattleRunner::new(&scenario, &sample_registry(), 1).unwrap();
        let before = runner
            .forces()
            .levies()
            .flat_map(|levy| levy.ships())
            .filter(|ship| ship.is_constructed())
            .count();
        for _ in 0..10 {
            runner.step().unwrap();
        }
        let after = runner
            .forces()
            .levies()
            .flat_map(|levy| levy.ships())
            .filter(|ship| ship.is_constructed())
            .count();
        assert_eq!(after, before + 2);
    }
}
