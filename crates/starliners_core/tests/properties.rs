//! Property tests for the damage model and grid capacity.

use std::sync::Arc;

use proptest::prelude::*;
use starliners_core::battle::BattleSide;
use starliners_core::damage::{DamageKind, Layer, PerKind};
use starliners_core::error::GameError;
use starliners_core::factions::CombatProperties;
use starliners_core::forces::{LevyId, ShipId, ShipRef};
use starliners_core::grid::{BattleGrid, GRID_CAPACITY};
use starliners_core::math::Fixed;
use starliners_core::random::WorldRng;
use starliners_core::ship::{
    resist_cap, OriginAttributes, ShipClass, ShipInstance, ShipModifiers, ShipProperties,
    MAX_AFFINITY,
};
use starliners_test_utils::determinism::strategies::{
    arb_class_data, arb_raw_resists, arb_volley,
};
use starliners_test_utils::Armada;

fn arb_modifiers() -> impl Strategy<Value = ShipModifiers> {
    (0..=MAX_AFFINITY, 0..=MAX_AFFINITY, 0..=MAX_AFFINITY).prop_map(|(h, k, r)| {
        ShipModifiers::from_attributes(&OriginAttributes {
            affinity: PerKind::new(h, k, r),
        })
    })
}

fn arb_combat() -> impl Strategy<Value = CombatProperties> {
    let value = -100i16..=100;
    (
        (value.clone(), value.clone(), value.clone()),
        (value.clone(), value.clone(), value),
    )
        .prop_map(|((sh, sk, sr), (wh, wk, wr))| CombatProperties {
            strength: PerKind::new(sh, sk, sr),
            weakness: PerKind::new(wh, wk, wr),
        })
}

proptest! {
    #[test]
    fn prop_layers_stay_in_bounds(
        data in arb_class_data(),
        volleys in proptest::collection::vec(arb_volley(), 1..40),
        heals in proptest::collection::vec(0u32..200, 0..10),
        seed in any::<u64>(),
    ) {
        let class = Arc::new(ShipClass::from_data(&data).unwrap());
        let properties = ShipProperties::compute(
            &class,
            &ShipModifiers::default(),
            &CombatProperties::default(),
        );
        let mut ship = ShipInstance::new(ShipId::new(1), Arc::clone(&class), properties, LevyId::new(1));
        let mut rng = WorldRng::new(seed);

        for volley in &volleys {
            let before = ship.layers();
            let report = ship.absorb_volley(volley, &mut rng);
            for layer in Layer::ALL {
                prop_assert!(ship.layer(layer) >= 0);
                prop_assert!(ship.layer(layer) <= class.capacity[layer]);
                prop_assert!(report.damage(layer) >= 0);
            }
            if report.no_effect() {
                prop_assert_eq!(ship.layers(), before);
            }
        }

        for (i, amount) in heals.iter().enumerate() {
            let layer = Layer::ALL[i % Layer::ALL.len()];
            let applied = ship.apply_healing(layer, *amount);
            prop_assert!(applied >= 0);
            prop_assert!(ship.layer(layer) <= class.capacity[layer]);
        }
    }

    #[test]
    fn prop_effective_resists_within_cap(
        data in arb_class_data(),
        modifiers in arb_modifiers(),
        combat in arb_combat(),
    ) {
        let class = ShipClass::from_data(&data).unwrap();
        let properties = ShipProperties::compute(&class, &modifiers, &combat);
        for layer in Layer::ALL {
            for kind in DamageKind::ALL {
                let resist = properties.resist(layer, kind);
                prop_assert!(resist >= Fixed::ZERO);
                prop_assert!(resist <= resist_cap());
            }
        }
    }

    #[test]
    fn prop_enforce_max_caps_every_kind(resists in arb_raw_resists()) {
        let capped = resists.enforce_max();
        for kind in DamageKind::ALL {
            prop_assert!(capped[kind] <= resist_cap());
            prop_assert!(capped[kind] == resists[kind].min(resist_cap()));
        }
        prop_assert_eq!(capped.enforce_max(), capped);
    }

    #[test]
    fn prop_grid_never_exceeds_capacity(count in 0usize..70) {
        let mut armada = Armada::new();
        armada.attackers("interceptor", count);
        let levy = armada.attacker_levy;
        let handles: Vec<ShipRef> = armada
            .forces
            .levy(levy)
            .unwrap()
            .ships()
            .map(|ship| ShipRef::new(levy, ship.id()))
            .collect();

        let mut grid = BattleGrid::new(BattleSide::Attacker);
        for (i, handle) in handles.into_iter().enumerate() {
            let result = grid.push(handle, &mut armada.forces, 0);
            if i < GRID_CAPACITY {
                prop_assert_eq!(result.unwrap(), i);
            } else {
                let is_full = matches!(result, Err(GameError::GridFull { .. }));
                prop_assert!(is_full);
            }
            prop_assert!(grid.ship_count() <= grid.max_count());
        }
        prop_assert_eq!(grid.ship_count(), count.min(GRID_CAPACITY));
    }
}
