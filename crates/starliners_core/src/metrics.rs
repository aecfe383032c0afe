//! Counters collected while battles run.

use serde::{Deserialize, Serialize};

/// Running totals for one or more battles.
///
/// Owned by the caller and lent to each tick, so separate simulations never
/// share counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BattleMetrics {
    /// Combat turns resolved.
    pub turns: u64,
    /// Salvos produced by grids.
    pub salvos_fired: u64,
    /// Salvos that found a target.
    pub salvos_landed: u64,
    /// Salvos dropped for lack of targets.
    pub salvos_dropped: u64,
    /// Repairs applied to a ship.
    pub regens_applied: u64,
    /// Ships removed as wrecks.
    pub ships_destroyed: u64,
    /// Ships withdrawn intact.
    pub ships_retreated: u64,
    /// Ships placed into grid slots.
    pub ships_reinforced: u64,
    /// Battles that reached a resolution.
    pub battles_resolved: u64,
}

impl BattleMetrics {
    /// Add another set of counters to this one.
    pub fn merge(&mut self, other: &Self) {
        self.turns += other.turns;
        self.salvos_fired += other.salvos_fired;
        self.salvos_landed += other.salvos_landed;
        self.salvos_dropped += other.salvos_dropped;
        self.regens_applied += other.regens_applied;
        self.ships_destroyed += other.ships_destroyed;
        self.ships_retreated += other.ships_retreated;
        self.ships_reinforced += other.ships_reinforced;
        self.battles_resolved += other.battles_resolved;
    }

    /// Share of fired salvos that landed, in whole percent.
    #[must_use]
    pub fn landed_percent(&self) -> u64 {
        if self.salvos_fired == 0 {
            return 0;
        }
        self.salvos_landed * 100 / self.salvos_fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_adds_counters() {
        let mut total = BattleMetrics {
            turns: 2,
            salvos_fired: 10,
            ..BattleMetrics::default()
        };
        let other = BattleMetrics {
            turns: 3,
            salvos_fired: 10,
            salvos_landed: 15,
            ..BattleMetrics::default()
        };
        total.merge(&other);
        assert_eq!(total.turns, 5);
        assert_eq!(total.salvos_fired, 20);
        assert_eq!(total.landed_percent(), 75);
    }

    #[test]
    fn test_landed_percent_without_fire() {
        assert_eq!(BattleMetrics::default().landed_percent(), 0);
    }
}
