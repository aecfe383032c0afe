//! Faction definitions, diplomatic relations, and faction-wide combat traits.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::damage::PerKind;

/// Unique identifier for factions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FactionId(pub u32);

impl FactionId {
    /// Create a new faction ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }
}

impl fmt::Display for FactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "faction#{}", self.0)
    }
}

/// Standing between two factions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Relation {
    /// Fights on the same side.
    Allied,
    /// Ignores the other.
    #[default]
    Neutral,
    /// Engages on sight.
    Hostile,
}

/// Faction-level strengths and weaknesses, as whole percentages per damage kind.
///
/// `strength` raises the firepower of every ship the faction fields,
/// `weakness` lowers every resistance of that kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct CombatProperties {
    /// Firepower bonus per kind.
    #[serde(default)]
    pub strength: PerKind<i16>,
    /// Resistance penalty per kind.
    #[serde(default)]
    pub weakness: PerKind<i16>,
}

/// RGB colour used to tint a faction's weapon effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Colour {
    /// Red.
    pub r: u8,
    /// Green.
    pub g: u8,
    /// Blue.
    pub b: u8,
}

impl Colour {
    /// Create a colour.
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl Default for Colour {
    fn default() -> Self {
        Self::rgb(255, 255, 255)
    }
}

/// A faction taking part in battles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Faction {
    /// Identifier.
    pub id: FactionId,
    /// Display name.
    pub name: String,
    /// Faction-wide combat traits.
    #[serde(default)]
    pub combat: CombatProperties,
    /// Weapon effect colour.
    #[serde(default)]
    pub weapon_colour: Colour,
    /// Explicit relations. Factions not listed are [`Relation::Neutral`].
    #[serde(default)]
    pub relations: BTreeMap<FactionId, Relation>,
    /// Accumulated battle score (loot).
    #[serde(default)]
    pub score: u64,
}

impl Faction {
    /// Create a faction with no relations and neutral combat traits.
    #[must_use]
    pub fn new(id: FactionId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            combat: CombatProperties::default(),
            weapon_colour: Colour::default(),
            relations: BTreeMap::new(),
            score: 0,
        }
    }

    /// Builder method to set combat traits.
    #[must_use]
    pub fn with_combat(mut self, combat: CombatProperties) -> Self {
        self.combat = combat;
        self
    }

    /// Builder method to set the weapon colour.
    #[must_use]
    pub fn with_colour(mut self, colour: Colour) -> Self {
        self.weapon_colour = colour;
        self
    }

    /// Standing toward another faction. A faction is always allied with itself.
    #[must_use]
    pub fn relation_to(&self, other: FactionId) -> Relation {
        if other == self.id {
            return Relation::Allied;
        }
        self.relations.get(&other).copied().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_self_relation_is_allied() {
        let faction = Faction::new(FactionId::new(1), "Concord");
        assert_eq!(faction.relation_to(FactionId::new(1)), Relation::Allied);
    }

    #[test]
    fn test_unlisted_relation_is_neutral() {
        let mut faction = Faction::new(FactionId::new(1), "Concord");
        faction
            .relations
            .insert(FactionId::new(2), Relation::Hostile);
        assert_eq!(faction.relation_to(FactionId::new(2)), Relation::Hostile);
        assert_eq!(faction.relation_to(FactionId::new(3)), Relation::Neutral);
    }

    #[test]
    fn test_display() {
        assert_eq!(FactionId::new(4).to_string(), "faction#4");
    }
}
