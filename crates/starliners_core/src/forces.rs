//! Levies, fleets, and the registry that owns them.
//!
//! Ownership runs one way: [`Forces`] owns factions, fleets and levies, a
//! [`Levy`] owns its ships. Everything else (grids, fleets listing their
//! levies, ships naming their levy) holds plain identifiers and resolves them
//! through the registry.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::battle::BattleId;
use crate::error::{GameError, Result};
use crate::factions::{Faction, FactionId, Relation};
use crate::math::Fixed;
use crate::ship::{
    Deployment, OriginAttributes, ShipClass, ShipInstance, ShipModifiers, ShipProperties, ShipSize,
};

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub u64);

        impl $name {
            /// Create a new identifier.
            #[must_use]
            pub const fn new(id: u64) -> Self {
                Self(id)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "#{}"), self.0)
            }
        }
    };
}

id_type!(
    /// Unique identifier for ships.
    ShipId,
    "ship"
);
id_type!(
    /// Unique identifier for levies.
    LevyId,
    "levy"
);
id_type!(
    /// Unique identifier for fleets.
    FleetId,
    "fleet"
);
id_type!(
    /// Identifier of a location (star system) fleets can occupy.
    LocationId,
    "location"
);

/// Handle to a ship: the owning levy plus the ship id within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ShipRef {
    /// Owning levy.
    pub levy: LevyId,
    /// Ship within the levy.
    pub ship: ShipId,
}

impl ShipRef {
    /// Create a ship handle.
    #[must_use]
    pub const fn new(levy: LevyId, ship: ShipId) -> Self {
        Self { levy, ship }
    }
}

/// A pool of ships raised by a faction or planet.
#[derive(Debug, Clone)]
pub struct Levy {
    id: LevyId,
    owner: FactionId,
    name: String,
    origin: OriginAttributes,
    modifiers: ShipModifiers,
    ships: BTreeMap<ShipId, ShipInstance>,
    losses: u32,
    standdowns: u32,
}

impl Levy {
    /// Create an empty levy.
    #[must_use]
    pub fn new(id: LevyId, owner: FactionId, name: impl Into<String>, origin: OriginAttributes) -> Self {
        Self {
            id,
            owner,
            name: name.into(),
            origin,
            modifiers: ShipModifiers::from_attributes(&origin),
            ships: BTreeMap::new(),
            losses: 0,
            standdowns: 0,
        }
    }

    /// Levy identifier.
    #[must_use]
    pub const fn id(&self) -> LevyId {
        self.id
    }

    /// Owning faction.
    #[must_use]
    pub const fn owner(&self) -> FactionId {
        self.owner
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Planetary attributes of origin.
    #[must_use]
    pub const fn origin(&self) -> &OriginAttributes {
        &self.origin
    }

    /// Modifiers applied to ships raised from now on.
    #[must_use]
    pub const fn modifiers(&self) -> &ShipModifiers {
        &self.modifiers
    }

    /// Ships in id order.
    pub fn ships(&self) -> impl Iterator<Item = &ShipInstance> {
        self.ships.values()
    }

    /// Look up a ship.
    #[must_use]
    pub fn ship(&self, id: ShipId) -> Option<&ShipInstance> {
        self.ships.get(&id)
    }

    /// Look up a ship mutably.
    pub fn ship_mut(&mut self, id: ShipId) -> Option<&mut ShipInstance> {
        self.ships.get_mut(&id)
    }

    /// Number of ships, including ones under construction.
    #[must_use]
    pub fn ship_count(&self) -> usize {
        self.ships.len()
    }

    /// A levy with no ships left has nothing to contribute.
    #[must_use]
    pub fn is_depleted(&self) -> bool {
        self.ships.is_empty()
    }

    /// Ships destroyed in battle so far.
    #[must_use]
    pub const fn losses(&self) -> u32 {
        self.losses
    }

    /// Ships withdrawn from battle intact so far.
    #[must_use]
    pub const fn standdowns(&self) -> u32 {
        self.standdowns
    }

    /// First ship of the given size that is built, intact and not deployed.
    #[must_use]
    pub fn get_pending(&self, size: ShipSize) -> Option<ShipId> {
        self.ships
            .values()
            .find(|ship| ship.class().size == size && ship.is_available())
            .map(ShipInstance::id)
    }

    /// Advance construction of every unfinished ship. Returns how many were completed.
    pub fn advance_construction(&mut self, progress: Fixed) -> usize {
        self.ships
            .values_mut()
            .filter_map(|ship| ship.advance_construction(progress).then_some(()))
            .count()
    }

    pub(crate) fn insert(&mut self, ship: ShipInstance) {
        self.ships.insert(ship.id(), ship);
    }

    /// A ship left battle as a wreck: it is gone for good.
    pub(crate) fn on_ship_lost(&mut self, id: ShipId) -> Option<ShipInstance> {
        let removed = self.ships.remove(&id);
        if removed.is_some() {
            self.losses += 1;
        }
        removed
    }

    /// A ship left battle intact and returns to the reserve.
    pub(crate) fn on_ship_stood_down(&mut self, id: ShipId) -> bool {
        match self.ships.get_mut(&id) {
            Some(ship) => {
                ship.set_deployment(Deployment::Reserve);
                self.standdowns += 1;
                true
            }
            None => false,
        }
    }
}

/// A deployable group of levies belonging to one faction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fleet {
    id: FleetId,
    owner: FactionId,
    name: String,
    location: LocationId,
    levies: Vec<LevyId>,
    dead: bool,
    engaged: Option<BattleId>,
}

impl Fleet {
    /// Fleet identifier.
    #[must_use]
    pub const fn id(&self) -> FleetId {
        self.id
    }

    /// Owning faction.
    #[must_use]
    pub const fn owner(&self) -> FactionId {
        self.owner
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current location.
    #[must_use]
    pub const fn location(&self) -> LocationId {
        self.location
    }

    /// Move the fleet. Engaged fleets should be retreated from their battle first.
    pub fn set_location(&mut self, location: LocationId) {
        self.location = location;
    }

    /// Levies in this fleet.
    #[must_use]
    pub fn levies(&self) -> &[LevyId] {
        &self.levies
    }

    /// Check if the fleet has been disbanded or destroyed.
    #[must_use]
    pub const fn is_dead(&self) -> bool {
        self.dead
    }

    /// Flag the fleet as disbanded.
    pub fn mark_dead(&mut self) {
        self.dead = true;
    }

    /// Battle this fleet is engaged in.
    #[must_use]
    pub const fn engaged(&self) -> Option<BattleId> {
        self.engaged
    }

    pub(crate) fn set_engaged(&mut self, battle: Option<BattleId>) {
        self.engaged = battle;
    }

    pub(crate) fn retain_levies(&mut self, keep: impl FnMut(&LevyId) -> bool) -> usize {
        let before = self.levies.len();
        self.levies.retain(keep);
        before - self.levies.len()
    }
}

/// Registry owning every faction, fleet and levy.
///
/// Typed maps replace any scan over a mixed collection of world objects.
#[derive(Debug, Clone, Default)]
pub struct Forces {
    factions: BTreeMap<FactionId, Faction>,
    fleets: BTreeMap<FleetId, Fleet>,
    levies: BTreeMap<LevyId, Levy>,
    next_ship: u64,
    next_levy: u64,
    next_fleet: u64,
}

impl Forces {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a faction, replacing one with the same id.
    pub fn add_faction(&mut self, faction: Faction) {
        self.factions.insert(faction.id, faction);
    }

    /// Look up a faction.
    #[must_use]
    pub fn faction(&self, id: FactionId) -> Option<&Faction> {
        self.factions.get(&id)
    }

    /// Look up a faction mutably.
    pub fn faction_mut(&mut self, id: FactionId) -> Option<&mut Faction> {
        self.factions.get_mut(&id)
    }

    /// Factions in id order.
    pub fn factions(&self) -> impl Iterator<Item = &Faction> {
        self.factions.values()
    }

    /// Set the relation between two factions in both directions.
    pub fn set_relation(&mut self, a: FactionId, b: FactionId, relation: Relation) {
        if let Some(faction) = self.factions.get_mut(&a) {
            faction.relations.insert(b, relation);
        }
        if let Some(faction) = self.factions.get_mut(&b) {
            faction.relations.insert(a, relation);
        }
    }

    /// Relation of `a` toward `b`. Unknown factions are neutral to everyone but themselves.
    #[must_use]
    pub fn relation(&self, a: FactionId, b: FactionId) -> Relation {
        if a == b {
            return Relation::Allied;
        }
        self.factions
            .get(&a)
            .map_or(Relation::Neutral, |faction| faction.relation_to(b))
    }

    /// Create an empty fleet.
    pub fn create_fleet(
        &mut self,
        owner: FactionId,
        name: impl Into<String>,
        location: LocationId,
    ) -> FleetId {
        self.next_fleet += 1;
        let id = FleetId::new(self.next_fleet);
        self.fleets.insert(
            id,
            Fleet {
                id,
                owner,
                name: name.into(),
                location,
                levies: Vec::new(),
                dead: false,
                engaged: None,
            },
        );
        id
    }

    /// Create an empty levy.
    pub fn create_levy(
        &mut self,
        owner: FactionId,
        name: impl Into<String>,
        origin: OriginAttributes,
    ) -> LevyId {
        self.next_levy += 1;
        let id = LevyId::new(self.next_levy);
        self.levies.insert(id, Levy::new(id, owner, name, origin));
        id
    }

    /// Attach a levy to a fleet.
    pub fn attach_levy(&mut self, fleet: FleetId, levy: LevyId) -> Result<()> {
        if !self.levies.contains_key(&levy) {
            return Err(GameError::LevyNotFound(levy));
        }
        let fleet = self
            .fleets
            .get_mut(&fleet)
            .ok_or(GameError::FleetNotFound(fleet))?;
        if !fleet.levies.contains(&levy) {
            fleet.levies.push(levy);
        }
        Ok(())
    }

    /// Raise a finished ship of `class` into a levy.
    pub fn raise_ship(&mut self, levy: LevyId, class: &Arc<ShipClass>) -> Result<ShipId> {
        self.raise(levy, class, true)
    }

    /// Start building a ship of `class` in a levy.
    pub fn lay_down_ship(&mut self, levy: LevyId, class: &Arc<ShipClass>) -> Result<ShipId> {
        self.raise(levy, class, false)
    }

    fn raise(&mut self, levy_id: LevyId, class: &Arc<ShipClass>, built: bool) -> Result<ShipId> {
        let levy = self
            .levies
            .get_mut(&levy_id)
            .ok_or(GameError::LevyNotFound(levy_id))?;
        let combat = self
            .factions
            .get(&levy.owner)
            .map(|faction| faction.combat)
            .unwrap_or_default();
        let properties = ShipProperties::compute(class, &levy.modifiers, &combat);

        self.next_ship += 1;
        let id = ShipId::new(self.next_ship);
        let ship = if built {
            ShipInstance::new(id, Arc::clone(class), properties, levy_id)
        } else {
            ShipInstance::under_construction(id, Arc::clone(class), properties, levy_id)
        };
        levy.insert(ship);
        Ok(id)
    }

    /// Look up a fleet.
    #[must_use]
    pub fn fleet(&self, id: FleetId) -> Option<&Fleet> {
        self.fleets.get(&id)
    }

    /// Look up a fleet mutably.
    pub fn fleet_mut(&mut self, id: FleetId) -> Option<&mut Fleet> {
        self.fleets.get_mut(&id)
    }

    /// Fleets in id order.
    pub fn fleets(&self) -> impl Iterator<Item = &Fleet> {
        self.fleets.values()
    }

    /// Look up a levy.
    #[must_use]
    pub fn levy(&self, id: LevyId) -> Option<&Levy> {
        self.levies.get(&id)
    }

    /// Look up a levy mutably.
    pub fn levy_mut(&mut self, id: LevyId) -> Option<&mut Levy> {
        self.levies.get_mut(&id)
    }

    /// Levies in id order.
    pub fn levies(&self) -> impl Iterator<Item = &Levy> {
        self.levies.values()
    }

    /// Resolve a ship handle.
    #[must_use]
    pub fn ship(&self, handle: ShipRef) -> Option<&ShipInstance> {
        self.levies.get(&handle.levy)?.ship(handle.ship)
    }

    /// Resolve a ship handle mutably.
    pub fn ship_mut(&mut self, handle: ShipRef) -> Option<&mut ShipInstance> {
        self.levies.get_mut(&handle.levy)?.ship_mut(handle.ship)
    }

    /// Resolve a ship handle, failing when it dangles.
    pub fn require_ship(&self, handle: ShipRef) -> Result<&ShipInstance> {
        self.ship(handle).ok_or(GameError::ShipNotFound(handle.ship))
    }

    /// Resolve a ship handle mutably, failing when it dangles.
    pub fn require_ship_mut(&mut self, handle: ShipRef) -> Result<&mut ShipInstance> {
        self.ship_mut(handle)
            .ok_or(GameError::ShipNotFound(handle.ship))
    }

    /// Owning faction of a ship's levy.
    #[must_use]
    pub fn owner_of(&self, levy: LevyId) -> Option<FactionId> {
        self.levies.get(&levy).map(Levy::owner)
    }

    /// Advance construction in every levy. Returns the number of ships completed.
    pub fn advance_construction(&mut self, progress: Fixed) -> usize {
        self.levies
            .values_mut()
            .map(|levy| levy.advance_construction(progress))
            .sum()
    }

    /// Total ships across a fleet's levies.
    #[must_use]
    pub fn fleet_ship_count(&self, fleet: FleetId) -> usize {
        self.fleets.get(&fleet).map_or(0, |fleet| {
            fleet
                .levies
                .iter()
                .filter_map(|id| self.levies.get(id))
                .map(Levy::ship_count)
                .sum()
        })
    }
}
