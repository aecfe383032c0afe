//! Determinism testing utilities.
//!
//! A battle is fully determined by its starting forces, its configuration
//! and the draws taken from the world's random source. This module runs the
//! same setup repeatedly and compares state hashes to prove it.
//!
//! # Sources of divergence
//!
//! - **Floating-point math**: every fraction is [`starliners_core::math::Fixed`].
//! - **Map iteration order**: fleets, levies and ships live in ordered maps.
//! - **Hidden randomness**: battles only draw from the lent `WorldRng`.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::thread;

use crate::skirmish::Skirmish;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of ticks simulated.
    pub ticks: u64,
}

impl DeterminismResult {
    /// Distinct hashes seen (1 for a deterministic battle).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that every run matched.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            panic!(
                "Battle is non-deterministic!\n\
                 Runs: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.ticks,
                self.unique_hashes().len(),
                self.hashes
            );
        }
    }
}

/// Run any stepped state several times and compare the final hashes.
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    ticks: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let hashes: Vec<u64> = (0..runs)
        .map(|_| {
            let mut state = setup();
            for _ in 0..ticks {
                step(&mut state);
            }
            hash(&state)
        })
        .collect();

    DeterminismResult {
        is_deterministic: hashes.windows(2).all(|w| w[0] == w[1]),
        hashes,
        ticks,
    }
}

/// Run a skirmish twice for `ticks` ticks and compare.
///
/// # Panics
///
/// Panics if a tick fails.
pub fn verify_skirmish_determinism<F>(setup: F, ticks: u64) -> DeterminismResult
where
    F: Fn() -> Skirmish,
{
    verify_determinism(
        2,
        ticks,
        setup,
        |skirmish| skirmish.step().expect("tick"),
        Skirmish::state_hash,
    )
}

/// Run the same skirmish on several threads at once.
///
/// # Panics
///
/// Panics if a tick fails or a worker thread panics.
pub fn run_parallel_skirmishes<F>(setup: F, runs: usize, ticks: u64) -> DeterminismResult
where
    F: Fn() -> Skirmish + Sync,
{
    let hashes: Vec<u64> = thread::scope(|scope| {
        let handles: Vec<_> = (0..runs)
            .map(|_| {
                scope.spawn(|| {
                    let mut skirmish = setup();
                    for _ in 0..ticks {
                        skirmish.step().expect("tick");
                    }
                    skirmish.state_hash()
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("skirmish thread"))
            .collect()
    });

    DeterminismResult {
        is_deterministic: hashes.windows(2).all(|w| w[0] == w[1]),
        hashes,
        ticks,
    }
}

/// Step two copies side by side and report the first tick their hashes differ.
///
/// # Panics
///
/// Panics if a tick fails.
pub fn find_first_divergence<F>(setup: F, ticks: u64) -> Option<u64>
where
    F: Fn() -> Skirmish,
{
    let mut a = setup();
    let mut b = setup();
    if a.state_hash() != b.state_hash() {
        return Some(0);
    }
    for tick in 1..=ticks {
        a.step().expect("tick");
        b.step().expect("tick");
        if a.state_hash() != b.state_hash() {
            return Some(tick);
        }
    }
    None
}

/// Hash any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Proptest strategies for battle inputs.
pub mod strategies {
    use proptest::prelude::*;
    use starliners_core::damage::{DamageKind, PerKind, PerLayer, Volley};
    use starliners_core::data::ShipClassData;
    use starliners_core::math::Fixed;
    use starliners_core::ship::{Resists, ShipRole, ShipSize, MAX_MANOUVER, RESIST_CAP_PERCENT};

    /// Any damage kind.
    pub fn arb_kind() -> impl Strategy<Value = DamageKind> {
        prop_oneof![
            Just(DamageKind::Heat),
            Just(DamageKind::Kinetic),
            Just(DamageKind::Radiation),
        ]
    }

    /// Any hull size.
    pub fn arb_size() -> impl Strategy<Value = ShipSize> {
        prop::sample::select(ShipSize::ALL.to_vec())
    }

    /// A manoeuvre or tracking rating within range.
    pub fn arb_rating() -> impl Strategy<Value = u32> {
        0..=MAX_MANOUVER
    }

    /// A volley of 1 to 500 damage.
    pub fn arb_volley() -> impl Strategy<Value = Volley> {
        (arb_kind(), arb_rating(), 1u32..500).prop_map(|(kind, tracking, damage)| {
            Volley::new(kind, tracking, damage)
        })
    }

    /// Resistances anywhere from -2 to 2, before clamping.
    pub fn arb_raw_resists() -> impl Strategy<Value = Resists> {
        let value = (-200i32..=200).prop_map(|p| Fixed::from_num(p) / 100);
        (value.clone(), value.clone(), value)
            .prop_map(|(heat, kinetic, radiation)| Resists::new(PerKind::new(heat, kinetic, radiation)))
    }

    fn arb_percent_resists() -> impl Strategy<Value = PerKind<u8>> {
        (
            0..=RESIST_CAP_PERCENT,
            0..=RESIST_CAP_PERCENT,
            0..=RESIST_CAP_PERCENT,
        )
            .prop_map(|(h, k, r)| PerKind::new(h, k, r))
    }

    /// A ship class definition that passes validation.
    pub fn arb_class_data() -> impl Strategy<Value = ShipClassData> {
        (
            arb_size(),
            (0u32..60, 0u32..60, 0u32..60),
            (0i32..300, 0i32..300, 1i32..300),
            (arb_percent_resists(), arb_percent_resists(), arb_percent_resists()),
            arb_rating(),
            arb_rating(),
            (0u32..20, 0u32..20, 0u32..20),
        )
            .prop_map(
                |(size, (fh, fk, fr), (cs, ca, ch), (rs, ra, rh), manoeuvre, tracking, (ss, sa, sh))| {
                    ShipClassData {
                        id: "generated".to_string(),
                        name: "ship.generated.name".to_string(),
                        size,
                        role: ShipRole::Line,
                        firepower: PerKind::new(fh, fk, fr),
                        capacity: PerLayer::new(cs, ca, ch),
                        resists: PerLayer::new(rs, ra, rh),
                        manoeuvre,
                        tracking,
                        support: PerLayer::new(ss, sa, sh),
                        tags: Vec::new(),
                    }
                },
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::Armada;
    use starliners_core::battle::BattleConfig;

    fn mixed_skirmish() -> Skirmish {
        let mut armada = Armada::new();
        armada
            .attackers("interceptor", 8)
            .attackers("tender", 2)
            .defenders("lancer", 4)
            .defenders("bastion", 1);
        Skirmish::new(armada, 42, BattleConfig::default())
    }

    #[test]
    fn test_repeated_runs_match() {
        verify_skirmish_determinism(mixed_skirmish, 200).assert_deterministic();
    }

    #[test]
    fn test_parallel_runs_match() {
        run_parallel_skirmishes(mixed_skirmish, 4, 150).assert_deterministic();
    }

    #[test]
    fn test_no_divergence() {
        assert_eq!(find_first_divergence(mixed_skirmish, 100), None);
    }

    #[test]
    fn test_different_seeds_diverge() {
        let a = {
            let mut s = mixed_skirmish();
            s.run(100).unwrap();
            s.state_hash()
        };
        let b = {
            let mut armada = Armada::new();
            armada
                .attackers("interceptor", 8)
                .attackers("tender", 2)
                .defenders("lancer", 4)
                .defenders("bastion", 1);
            let mut s = Skirmish::new(armada, 43, BattleConfig::default());
            s.run(100).unwrap();
            s.state_hash()
        };
        assert_ne!(a, b);
    }

    #[test]
    fn test_unique_hashes() {
        let result = DeterminismResult {
            is_deterministic: false,
            hashes: vec![3, 1, 3],
            ticks: 1,
        };
        assert_eq!(result.unique_hashes(), vec![1, 3]);
    }

    #[test]
    fn test_compute_hash_stable() {
        assert_eq!(compute_hash(&(1u32, "a")), compute_hash(&(1u32, "a")));
    }
}
