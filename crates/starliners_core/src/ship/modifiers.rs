//! Levy-wide ship modifiers derived from the levy's planet of origin.

use serde::{Deserialize, Serialize};

use crate::damage::PerKind;

/// Highest affinity level a planet can have for a damage kind.
pub const MAX_AFFINITY: u8 = 10;

/// Planetary attributes a levy was raised from.
///
/// Affinity is a level from 0 to [`MAX_AFFINITY`] per damage kind, e.g. a
/// volcanic world breeds heat-hardened crews.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct OriginAttributes {
    /// Affinity level per damage kind.
    #[serde(default)]
    pub affinity: PerKind<u8>,
}

/// Additive per-kind bonuses applied to every ship of a levy, in whole percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ShipModifiers {
    /// Resistance bonus per kind.
    pub resist: PerKind<i16>,
    /// Firepower bonus per kind.
    pub focus: PerKind<i16>,
}

impl ShipModifiers {
    /// Derive modifiers from origin attributes: +1% resist and +2% focus per affinity level.
    #[must_use]
    pub fn from_attributes(attributes: &OriginAttributes) -> Self {
        let level = attributes
            .affinity
            .map(|_, level| i16::from(level.min(MAX_AFFINITY)));
        Self {
            resist: level,
            focus: level.map(|_, l| l * 2),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neutral_origin_has_no_bonus() {
        let modifiers = ShipModifiers::from_attributes(&OriginAttributes::default());
        assert_eq!(modifiers, ShipModifiers::default());
    }

    #[test]
    fn test_affinity_maps_to_bonuses() {
        let attributes = OriginAttributes {
            affinity: PerKind::new(4, 0, 10),
        };
        let modifiers = ShipModifiers::from_attributes(&attributes);
        assert_eq!(modifiers.resist, PerKind::new(4, 0, 10));
        assert_eq!(modifiers.focus, PerKind::new(8, 0, 20));
    }

    #[test]
    fn test_affinity_is_capped() {
        let attributes = OriginAttributes {
            affinity: PerKind::new(200, 0, 0),
        };
        let modifiers = ShipModifiers::from_attributes(&attributes);
        assert_eq!(modifiers.resist.heat, i16::from(MAX_AFFINITY));
    }
}
