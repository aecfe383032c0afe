//! A single battle bundled with everything it borrows per tick.
//!
//! [`Skirmish`] owns the world-side collaborators a [`Battle`] needs
//! (forces, random source, notification and history sinks, counters) so
//! tests and benches can drive a battle with one call per tick.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use starliners_core::battle::{Battle, BattleConfig, BattleContext, BattleId, BattleResolution};
use starliners_core::error::Result;
use starliners_core::metrics::BattleMetrics;
use starliners_core::notifications::RecordingNotifications;
use starliners_core::random::WorldRng;
use starliners_core::report::BattleHistory;
use tracing::debug;

use crate::fixtures::{Armada, BATTLEFIELD};

/// One battle and its surroundings.
#[derive(Debug, Clone)]
pub struct Skirmish {
    /// Fleets, levies and ships.
    pub armada: Armada,
    /// The battle being fought.
    pub battle: Battle,
    /// World random source.
    pub rng: WorldRng,
    /// Notifications sent so far.
    pub notifications: RecordingNotifications,
    /// Archived reports.
    pub history: BattleHistory,
    /// Counters.
    pub metrics: BattleMetrics,
    /// Next tick to run.
    pub now: u64,
}

impl Skirmish {
    /// Open a battle between the armada's two fleets at tick 0.
    ///
    /// # Panics
    ///
    /// Panics if the armada's fleets cannot open a battle.
    #[must_use]
    pub fn new(mut armada: Armada, seed: u64, config: BattleConfig) -> Self {
        let battle = Battle::new(
            BattleId::new(1),
            BATTLEFIELD,
            armada.attacker_fleet,
            armada.defender_fleet,
            &mut armada.forces,
            0,
            config,
        )
        .expect("fixture fleets open a battle");

        Self {
            armada,
            battle,
            rng: WorldRng::new(seed),
            notifications: RecordingNotifications::new(),
            history: BattleHistory::new(),
            metrics: BattleMetrics::default(),
            now: 0,
        }
    }

    /// Run one tick.
    pub fn step(&mut self) -> Result<()> {
        let mut ctx = BattleContext::new(
            self.now,
            &mut self.rng,
            &mut self.notifications,
            &mut self.history,
            &mut self.metrics,
        );
        self.battle.tick(&mut self.armada.forces, &mut ctx)?;
        self.now += 1;
        Ok(())
    }

    /// Run `ticks` ticks, stopping early once the battle is dead.
    pub fn run(&mut self, ticks: u64) -> Result<()> {
        for _ in 0..ticks {
            if self.battle.is_dead() {
                break;
            }
            self.step()?;
        }
        Ok(())
    }

    /// Run until the battle is resolved or `max_ticks` have passed.
    pub fn run_to_resolution(&mut self, max_ticks: u64) -> Result<BattleResolution> {
        let limit = self.now + max_ticks;
        while self.now < limit && !self.battle.resolution().is_resolved() {
            self.step()?;
        }
        let resolution = self.battle.resolution();
        debug!(tick = self.now, ?resolution, "Skirmish stopped");
        Ok(resolution)
    }

    /// Hash of the battle state plus the random source position.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.battle.state_hash(&self.armada.forces).hash(&mut hasher);
        self.rng.draws().hash(&mut hasher);
        self.now.hash(&mut hasher);
        hasher.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lopsided_skirmish_resolves() {
        let mut armada = Armada::new();
        armada.attackers("lancer", 6).defenders("picket", 2);
        let mut skirmish = Skirmish::new(armada, 11, BattleConfig::default());

        let resolution = skirmish.run_to_resolution(500).unwrap();
        assert_eq!(resolution, BattleResolution::VictoryAttacker);
        assert!(skirmish.metrics.salvos_fired > 0);
    }

    #[test]
    fn test_run_stops_on_dead_battle() {
        let mut armada = Armada::new();
        armada.attackers("lancer", 4).defenders("picket", 1);
        let config = BattleConfig {
            undead_turns: 1,
            ..BattleConfig::default()
        };
        let mut skirmish = Skirmish::new(armada, 5, config);
        skirmish.run(10_000).unwrap();
        assert!(skirmish.battle.is_dead());
        assert_eq!(skirmish.history.len(), 1);
        assert!(skirmish.now < 10_000);
    }
}
