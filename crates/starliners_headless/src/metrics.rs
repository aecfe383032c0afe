//! Per-run outcome metrics and batch aggregation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use starliners_core::battle::{BattleResolution, BattleSide};
use starliners_core::metrics::BattleMetrics;
use starliners_core::report::BattleReport;

/// Outcome of one battle within a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleOutcome {
    /// Battle id.
    pub battle: u64,
    /// How it ended.
    pub resolution: BattleResolution,
    /// Names of the winning factions, empty on a draw.
    pub winners: Vec<String>,
    /// Combat turns fought.
    pub turns: u32,
    /// Ships the attacking side lost.
    pub attacker_losses: u32,
    /// Ships the defending side lost.
    pub defender_losses: u32,
    /// Damage dealt by the attacking side.
    pub attacker_damage: u64,
    /// Damage dealt by the defending side.
    pub defender_damage: u64,
}

impl BattleOutcome {
    /// Summarize a finished report. `name_of` resolves faction names.
    pub fn from_report(report: &BattleReport, name_of: impl Fn(u32) -> String) -> Self {
        let winners = report
            .resolution
            .winner()
            .map(|side| {
                report
                    .side(side)
                    .factions
                    .iter()
                    .map(|faction| name_of(faction.0))
                    .collect()
            })
            .unwrap_or_default();
        let attacker = report.side(BattleSide::Attacker).totals();
        let defender = report.side(BattleSide::Defender).totals();
        Self {
            battle: report.battle.0,
            resolution: report.resolution,
            winners,
            turns: report.turns,
            attacker_losses: attacker.destroyed,
            defender_losses: defender.destroyed,
            attacker_damage: attacker.damage_dealt,
            defender_damage: defender.damage_dealt,
        }
    }
}

/// Metrics for one headless run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetrics {
    /// Scenario name.
    pub scenario: String,
    /// Random seed.
    pub seed: u64,
    /// Ticks simulated.
    pub duration_ticks: u64,
    /// Whether the run stopped at the tick limit with battles still open.
    pub timed_out: bool,
    /// Finished battles in the order they were archived.
    pub battles: Vec<BattleOutcome>,
    /// Counters over every battle.
    pub counters: BattleMetrics,
    /// Final faction scores by name.
    pub scores: BTreeMap<String, u64>,
    /// Hash of the final state, for determinism checks.
    pub state_hash: u64,
}

impl RunMetrics {
    /// Winner of the first battle, if it had one.
    #[must_use]
    pub fn winner(&self) -> Option<&str> {
        self.battles
            .first()
            .and_then(|battle| battle.winners.first())
            .map(String::as_str)
    }
}

/// Summary statistics across many runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Runs aggregated.
    pub total_runs: u32,
    /// Runs won by each faction.
    pub wins_by_faction: BTreeMap<String, u32>,
    /// Win rates by faction.
    pub win_rates: BTreeMap<String, f64>,
    /// Runs without a winner.
    pub draws: u32,
    /// Runs that hit the tick limit.
    pub timeouts: u32,
    /// Average run length in ticks.
    pub avg_duration_ticks: f64,
    /// Shortest run.
    pub min_duration_ticks: u64,
    /// Longest run.
    pub max_duration_ticks: u64,
    /// Average turns per battle.
    pub avg_turns: f64,
    /// Counters summed over every run.
    pub counters: BattleMetrics,
}

impl BatchSummary {
    /// Calculate the summary of a set of runs.
    #[must_use]
    pub fn from_runs(runs: &[RunMetrics]) -> Self {
        if runs.is_empty() {
            return Self::default();
        }

        let mut summary = Self {
            total_runs: runs.len() as u32,
            min_duration_ticks: u64::MAX,
            ..Self::default()
        };
        let mut duration_sum = 0u64;
        let mut turn_sum = 0u64;
        let mut battle_count = 0u64;

        for run in runs {
            duration_sum += run.duration_ticks;
            summary.min_duration_ticks = summary.min_duration_ticks.min(run.duration_ticks);
            summary.max_duration_ticks = summary.max_duration_ticks.max(run.duration_ticks);
            summary.counters.merge(&run.counters);
            if run.timed_out {
                summary.timeouts += 1;
            }
            match run.winner() {
                Some(winner) => *summary.wins_by_faction.entry(winner.to_string()).or_default() += 1,
                None => summary.draws += 1,
            }
            for battle in &run.battles {
                turn_sum += u64::from(battle.turns);
                battle_count += 1;
            }
        }

        summary.avg_duration_ticks = duration_sum as f64 / runs.len() as f64;
        summary.avg_turns = turn_sum as f64 / battle_count.max(1) as f64;
        for (faction, wins) in &summary.wins_by_faction {
            summary
                .win_rates
                .insert(faction.clone(), f64::from(*wins) / f64::from(summary.total_runs));
        }
        summary
    }

    /// Check if every win rate is within `threshold` of an even split.
    #[must_use]
    pub fn is_balanced(&self, threshold: f64) -> bool {
        self.win_rates.values().all(|rate| (rate - 0.5).abs() <= threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(winner: Option<&str>, ticks: u64, turns: u32) -> RunMetrics {
        RunMetrics {
            scenario: "test".to_string(),
            seed: 0,
            duration_ticks: ticks,
            timed_out: winner.is_none(),
            battles: vec![BattleOutcome {
                battle: 1,
                resolution: if winner.is_some() {
                    BattleResolution::VictoryAttacker
                } else {
                    BattleResolution::None
                },
                winners: winner.map(|w| vec![w.to_string()]).unwrap_or_default(),
                turns,
                attacker_losses: 0,
                defender_losses: 0,
                attacker_damage: 0,
                defender_damage: 0,
            }],
            counters: BattleMetrics {
                turns: u64::from(turns),
                ..BattleMetrics::default()
            },
            scores: BTreeMap::new(),
            state_hash: 0,
        }
    }

    #[test]
    fn test_summary_from_runs() {
        let runs = [
            run(Some("Concord"), 100, 20),
            run(Some("Hegemony"), 200, 40),
            run(Some("Concord"), 150, 30),
            run(None, 500, 100),
        ];
        let summary = BatchSummary::from_runs(&runs);
        assert_eq!(summary.total_runs, 4);
        assert_eq!(summary.wins_by_faction["Concord"], 2);
        assert_eq!(summary.draws, 1);
        assert_eq!(summary.timeouts, 1);
        assert_eq!(summary.min_duration_ticks, 100);
        assert_eq!(summary.max_duration_ticks, 500);
        assert!((summary.avg_turns - 47.5).abs() < 1e-9);
        assert_eq!(summary.counters.turns, 190);
        assert!((summary.win_rates["Concord"] - 0.5).abs() < 1e-9);
        assert!(summary.is_balanced(0.3));
    }

    #[test]
    fn test_empty_summary() {
        let summary = BatchSummary::from_runs(&[]);
        assert_eq!(summary.total_runs, 0);
        assert!(summary.is_balanced(0.0));
    }
}
