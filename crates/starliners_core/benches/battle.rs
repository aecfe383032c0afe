//! Battle benchmarks for starliners_core.
//!
//! Run with: `cargo bench -p starliners_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use starliners_core::battle::BattleConfig;
use starliners_core::damage::{DamageKind, Volley};
use starliners_core::factions::CombatProperties;
use starliners_core::forces::{LevyId, ShipId};
use starliners_core::random::WorldRng;
use starliners_core::ship::{ShipInstance, ShipModifiers, ShipProperties};
use starliners_test_utils::{sample_class, Armada, Skirmish};

fn full_grids() -> Skirmish {
    let mut armada = Armada::new();
    armada
        .attackers("interceptor", 30)
        .attackers("lancer", 15)
        .attackers("tender", 5)
        .defenders("bastion", 10)
        .defenders("lancer", 30)
        .defenders("tender", 5);
    Skirmish::new(armada, 7, BattleConfig::default())
}

/// Full battles from first contact to resolution.
pub fn battle_benchmark(c: &mut Criterion) {
    c.bench_function("battle_to_resolution", |b| {
        b.iter_batched(
            full_grids,
            |mut skirmish| black_box(skirmish.run_to_resolution(5_000)),
            BatchSize::SmallInput,
        )
    });

    c.bench_function("battle_single_turn", |b| {
        b.iter_batched(
            || {
                let mut skirmish = full_grids();
                // Let reinforcements fill both grids.
                skirmish.run(10).expect("warm-up");
                skirmish
            },
            |mut skirmish| black_box(skirmish.run(5)),
            BatchSize::SmallInput,
        )
    });
}

/// Volley absorption on a single ship.
pub fn absorb_benchmark(c: &mut Criterion) {
    let class = sample_class("bastion");
    c.bench_function("absorb_volley", |b| {
        b.iter_batched(
            || {
                let properties = ShipProperties::compute(
                    &class,
                    &ShipModifiers::default(),
                    &CombatProperties::default(),
                );
                let ship = ShipInstance::new(ShipId::new(1), class.clone(), properties, LevyId::new(1));
                (ship, WorldRng::new(3))
            },
            |(mut ship, mut rng)| {
                let volley = Volley::new(DamageKind::Kinetic, 5_000, 40);
                black_box(ship.absorb_volley(&volley, &mut rng))
            },
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, battle_benchmark, absorb_benchmark);
criterion_main!(benches);
