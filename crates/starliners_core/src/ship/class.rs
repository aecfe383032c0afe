//! Immutable ship class assets and their registry.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::damage::{PerKind, PerLayer};
use crate::data::ShipClassData;
use crate::error::{GameError, Result};
use crate::math::percent;

use super::properties::Resists;

/// Hull size category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ShipSize {
    /// Smallest hull.
    Frigate,
    /// Light escort hull.
    Destroyer,
    /// Medium hull.
    Cruiser,
    /// Heavy hull.
    Battleship,
    /// Capital hull.
    Dreadnought,
}

impl ShipSize {
    /// Every size, smallest first.
    pub const ALL: [Self; 5] = [
        Self::Frigate,
        Self::Destroyer,
        Self::Cruiser,
        Self::Battleship,
        Self::Dreadnought,
    ];

    /// Loot awarded for destroying a ship of this size.
    #[must_use]
    pub const fn loot_value(self) -> u32 {
        match self {
            Self::Frigate => 10,
            Self::Destroyer => 20,
            Self::Cruiser => 40,
            Self::Battleship => 80,
            Self::Dreadnought => 160,
        }
    }
}

/// Tactical role of a ship class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ShipRole {
    /// Front-line combatant.
    #[default]
    Line,
    /// Fast screening ship.
    Escort,
    /// Repair and logistics ship.
    Support,
}

/// Immutable ship class, shared by every instance built from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShipClass {
    /// Unique identifier.
    pub id: String,
    /// Localization key for the display name.
    pub name: String,
    /// Hull size.
    pub size: ShipSize,
    /// Tactical role.
    pub role: ShipRole,
    /// Base firepower per damage kind.
    pub firepower: PerKind<u32>,
    /// Maximum health per layer.
    pub capacity: PerLayer<i32>,
    /// Base resistances per layer.
    pub resists: PerLayer<Resists>,
    /// Evasion rating.
    pub manoeuvre: u32,
    /// Weapon tracking rating.
    pub tracking: u32,
    /// Repair output per layer per turn.
    pub support: PerLayer<u32>,
}

impl ShipClass {
    /// Build a class from validated data.
    pub fn from_data(data: &ShipClassData) -> Result<Self> {
        data.validate()?;
        Ok(Self {
            id: data.id.clone(),
            name: data.name.clone(),
            size: data.size,
            role: data.role,
            firepower: data.firepower,
            capacity: data.capacity,
            resists: data
                .resists
                .map(|_, per_kind| Resists::new(per_kind.map(|_, p| percent(i32::from(p))))),
            manoeuvre: data.manoeuvre,
            tracking: data.tracking,
            support: data.support,
        })
    }

    /// Loot awarded for destroying a ship of this class.
    #[must_use]
    pub const fn loot_value(&self) -> u32 {
        self.size.loot_value()
    }
}

/// Registry of ship classes keyed by identifier.
#[derive(Debug, Clone, Default)]
pub struct ShipClassRegistry {
    classes: BTreeMap<String, Arc<ShipClass>>,
}

impl ShipClassRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from data definitions.
    pub fn from_data<'a, I>(definitions: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a ShipClassData>,
    {
        let mut registry = Self::new();
        for data in definitions {
            registry.register(ShipClass::from_data(data)?);
        }
        Ok(registry)
    }

    /// Register a class, replacing any previous class with the same id.
    pub fn register(&mut self, class: ShipClass) -> Arc<ShipClass> {
        let class = Arc::new(class);
        self.classes.insert(class.id.clone(), Arc::clone(&class));
        class
    }

    /// Look up a class.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Arc<ShipClass>> {
        self.classes.get(id).cloned()
    }

    /// Look up a class, failing when it is unknown.
    pub fn require(&self, id: &str) -> Result<Arc<ShipClass>> {
        self.get(id)
            .ok_or_else(|| GameError::UnknownShipClass(id.to_string()))
    }

    /// Iterate over all classes in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<ShipClass>> {
        self.classes.values()
    }

    /// Number of registered classes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Check if the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}
