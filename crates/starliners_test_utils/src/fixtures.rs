//! Test fixtures and helpers.
//!
//! Sample ship classes, fixed-point helpers and a builder for two hostile
//! fleets sharing a location.

use std::sync::Arc;

use starliners_core::data::parse_ship_classes;
use starliners_core::factions::{Faction, FactionId, Relation};
use starliners_core::forces::{FleetId, Forces, LevyId, LocationId};
use starliners_core::math::Fixed;
use starliners_core::ship::{OriginAttributes, ShipClass, ShipClassRegistry};

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> Fixed {
    Fixed::from_num(n)
}

/// Create a fixed-point number from a float (tests only).
#[must_use]
pub fn fixed_f(n: f64) -> Fixed {
    Fixed::from_num(n)
}

/// Ship classes used throughout the test suites.
///
/// - `interceptor`: fast frigate, kinetic guns, thin layers
/// - `lancer`: destroyer with heat lances and heavy shields
/// - `bastion`: slow cruiser, very high capacity, no evasion
/// - `tender`: unarmed support frigate repairing every layer
/// - `ghost`: untouchable frigate with maximum manoeuvre and no guns
/// - `picket`: unarmed frigate that never tracks anything
pub const SAMPLE_CLASSES: &str = r#"[
    ShipClassData(
        id: "interceptor",
        name: "ship.interceptor.name",
        size: Frigate,
        role: Escort,
        firepower: (heat: 0, kinetic: 14, radiation: 0),
        capacity: (shield: 20, armour: 30, hull: 40),
        resists: (
            shield: (heat: 10, kinetic: 10, radiation: 10),
            armour: (heat: 5, kinetic: 20, radiation: 5),
            hull: (heat: 0, kinetic: 0, radiation: 0),
        ),
        manoeuvre: 4500,
        tracking: 6000,
    ),
    ShipClassData(
        id: "lancer",
        name: "ship.lancer.name",
        size: Destroyer,
        firepower: (heat: 24, kinetic: 0, radiation: 6),
        capacity: (shield: 120, armour: 80, hull: 100),
        resists: (
            shield: (heat: 40, kinetic: 10, radiation: 20),
            armour: (heat: 20, kinetic: 35, radiation: 10),
            hull: (heat: 5, kinetic: 5, radiation: 5),
        ),
        manoeuvre: 2500,
        tracking: 4000,
    ),
    ShipClassData(
        id: "bastion",
        name: "ship.bastion.name",
        size: Cruiser,
        firepower: (heat: 10, kinetic: 30, radiation: 10),
        capacity: (shield: 200, armour: 300, hull: 400),
        resists: (
            shield: (heat: 30, kinetic: 30, radiation: 30),
            armour: (heat: 40, kinetic: 50, radiation: 20),
            hull: (heat: 10, kinetic: 10, radiation: 10),
        ),
        tracking: 3000,
    ),
    ShipClassData(
        id: "tender",
        name: "ship.tender.name",
        size: Frigate,
        role: Support,
        capacity: (shield: 40, armour: 40, hull: 60),
        manoeuvre: 3000,
        support: (shield: 15, armour: 10, hull: 5),
        tags: ["support"],
    ),
    ShipClassData(
        id: "ghost",
        name: "ship.ghost.name",
        size: Frigate,
        capacity: (shield: 10, armour: 10, hull: 10),
        manoeuvre: 10000,
    ),
    ShipClassData(
        id: "picket",
        name: "ship.picket.name",
        size: Frigate,
        capacity: (shield: 0, armour: 10, hull: 20),
    ),
]"#;

/// Registry built from [`SAMPLE_CLASSES`].
///
/// # Panics
///
/// Panics if the embedded data stops parsing.
#[must_use]
pub fn sample_registry() -> ShipClassRegistry {
    let data = parse_ship_classes(SAMPLE_CLASSES, "<fixtures>").expect("sample classes parse");
    ShipClassRegistry::from_data(&data).expect("sample classes are valid")
}

/// Look up a sample class by id.
///
/// # Panics
///
/// Panics if `id` is not one of the sample classes.
#[must_use]
pub fn sample_class(id: &str) -> Arc<ShipClass> {
    sample_registry()
        .get(id)
        .unwrap_or_else(|| panic!("no sample class '{id}'"))
}

/// Where both fixture fleets meet.
pub const BATTLEFIELD: LocationId = LocationId::new(1);

/// Two hostile factions with one fleet and one levy each.
#[derive(Debug, Clone)]
pub struct Armada {
    /// Registry owning every fleet, levy and ship.
    pub forces: Forces,
    /// Classes available to [`Armada::raise`].
    pub classes: ShipClassRegistry,
    /// Attacking faction.
    pub attacker_faction: FactionId,
    /// Defending faction.
    pub defender_faction: FactionId,
    /// Attacking fleet.
    pub attacker_fleet: FleetId,
    /// Defending fleet.
    pub defender_fleet: FleetId,
    /// Levy of the attacking fleet.
    pub attacker_levy: LevyId,
    /// Levy of the defending fleet.
    pub defender_levy: LevyId,
}

impl Armada {
    /// Set up the two factions at [`BATTLEFIELD`] with no ships yet.
    ///
    /// # Panics
    ///
    /// Panics if a freshly created levy cannot be attached.
    #[must_use]
    pub fn new() -> Self {
        let mut forces = Forces::new();
        let attacker_faction = FactionId::new(1);
        let defender_faction = FactionId::new(2);
        forces.add_faction(Faction::new(attacker_faction, "Concord"));
        forces.add_faction(Faction::new(defender_faction, "Hegemony"));
        forces.set_relation(attacker_faction, defender_faction, Relation::Hostile);

        let attacker_fleet = forces.create_fleet(attacker_faction, "Vanguard", BATTLEFIELD);
        let defender_fleet = forces.create_fleet(defender_faction, "Garrison", BATTLEFIELD);
        let attacker_levy =
            forces.create_levy(attacker_faction, "First Levy", OriginAttributes::default());
        let defender_levy =
            forces.create_levy(defender_faction, "Home Levy", OriginAttributes::default());
        forces
            .attach_levy(attacker_fleet, attacker_levy)
            .expect("attach attacker levy");
        forces
            .attach_levy(defender_fleet, defender_levy)
            .expect("attach defender levy");

        Self {
            forces,
            classes: sample_registry(),
            attacker_faction,
            defender_faction,
            attacker_fleet,
            defender_fleet,
            attacker_levy,
            defender_levy,
        }
    }

    /// Add `count` finished ships of a sample class to a levy.
    ///
    /// # Panics
    ///
    /// Panics on an unknown class or levy.
    pub fn raise(&mut self, levy: LevyId, class: &str, count: usize) -> &mut Self {
        let class = self.classes.get(class).expect("known sample class");
        for _ in 0..count {
            self.forces.raise_ship(levy, &class).expect("raise ship");
        }
        self
    }

    /// Add ships to the attacking levy.
    pub fn attackers(&mut self, class: &str, count: usize) -> &mut Self {
        let levy = self.attacker_levy;
        self.raise(levy, class, count)
    }

    /// Add ships to the defending levy.
    pub fn defenders(&mut self, class: &str, count: usize) -> &mut Self {
        let levy = self.defender_levy;
        self.raise(levy, class, count)
    }
}

impl Default for Armada {
    fn default() -> Self {
        Self::new()
    }
}
