//! Shared helpers for unit tests.

use std::sync::Arc;

use crate::damage::{PerKind, PerLayer};
use crate::factions::{Faction, FactionId, Relation};
use crate::forces::{FleetId, Forces, LevyId, LocationId, ShipRef};
use crate::ship::{OriginAttributes, Resists, ShipClass, ShipRole, ShipSize};

pub(crate) fn class_with(
    id: &str,
    size: ShipSize,
    firepower: PerKind<u32>,
    capacity: PerLayer<i32>,
    manoeuvre: u32,
    tracking: u32,
) -> Arc<ShipClass> {
    Arc::new(ShipClass {
        id: id.to_string(),
        name: format!("ship.{id}.name"),
        size,
        role: ShipRole::Line,
        firepower,
        capacity,
        resists: PerLayer::new(Resists::default(), Resists::default(), Resists::default()),
        manoeuvre,
        tracking,
        support: PerLayer::default(),
    })
}

pub(crate) fn sample_class() -> Arc<ShipClass> {
    class_with(
        "corvette",
        ShipSize::Frigate,
        PerKind::new(12, 6, 0),
        PerLayer::new(20, 20, 40),
        2000,
        4000,
    )
}

pub(crate) struct Sides {
    pub forces: Forces,
    pub attacker_faction: FactionId,
    pub defender_faction: FactionId,
    pub attacker_fleet: FleetId,
    pub defender_fleet: FleetId,
    pub attacker_levy: LevyId,
    pub defender_levy: LevyId,
}

/// Two hostile factions, each with one fleet holding one empty levy.
pub(crate) fn hostile_pair() -> Sides {
    let mut forces = Forces::new();
    let attacker_faction = FactionId::new(1);
    let defender_faction = FactionId::new(2);
    forces.add_faction(Faction::new(attacker_faction, "Concord"));
    forces.add_faction(Faction::new(defender_faction, "Hegemony"));
    forces.set_relation(attacker_faction, defender_faction, Relation::Hostile);

    let location = LocationId::new(1);
    let attacker_fleet = forces.create_fleet(attacker_faction, "Vanguard", location);
    let defender_fleet = forces.create_fleet(defender_faction, "Picket", location);
    let attacker_levy = forces.create_levy(attacker_faction, "Home Guard", OriginAttributes::default());
    let defender_levy = forces.create_levy(defender_faction, "Garrison", OriginAttributes::default());
    forces
        .attach_levy(attacker_fleet, attacker_levy)
        .expect("attach attacker levy");
    forces
        .attach_levy(defender_fleet, defender_levy)
        .expect("attach defender levy");

    Sides {
        forces,
        attacker_faction,
        defender_faction,
        attacker_fleet,
        defender_fleet,
        attacker_levy,
        defender_levy,
    }
}

pub(crate) fn raise(
    forces: &mut Forces,
    levy: LevyId,
    class: &Arc<ShipClass>,
    count: usize,
) -> Vec<ShipRef> {
    (0..count)
        .map(|_| {
            let ship = forces.raise_ship(levy, class).expect("raise ship");
            ShipRef::new(levy, ship)
        })
        .collect()
}
