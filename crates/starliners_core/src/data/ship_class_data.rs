//! Ship class data structures for data-driven ship definitions.

use serde::{Deserialize, Serialize};

use crate::damage::{DamageKind, Layer, PerKind, PerLayer};
use crate::error::{GameError, Result};
use crate::ship::{ShipRole, ShipSize, MAX_MANOUVER, RESIST_CAP_PERCENT};

/// Data-driven ship class definition.
///
/// Resistances are whole percentages, manoeuvre and tracking are ratings
/// out of [`MAX_MANOUVER`].
///
/// # Example RON
///
/// ```ron
/// ShipClassData(
///     id: "lancer",
///     name: "ship.lancer.name",
///     size: Destroyer,
///     role: Line,
///     firepower: (heat: 24, kinetic: 0, radiation: 6),
///     capacity: (shield: 120, armour: 80, hull: 100),
///     resists: (
///         shield: (heat: 40, kinetic: 10, radiation: 20),
///         armour: (heat: 20, kinetic: 35, radiation: 10),
///         hull: (heat: 5, kinetic: 5, radiation: 5),
///     ),
///     manoeuvre: 3500,
///     tracking: 4000,
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipClassData {
    /// Unique string identifier for this class.
    pub id: String,

    /// Localization key for the display name.
    pub name: String,

    /// Hull size category.
    pub size: ShipSize,

    /// Tactical role.
    #[serde(default)]
    pub role: ShipRole,

    /// Base firepower per damage kind.
    #[serde(default)]
    pub firepower: PerKind<u32>,

    /// Maximum health per layer.
    pub capacity: PerLayer<i32>,

    /// Base resistance percentages per layer and damage kind.
    #[serde(default)]
    pub resists: PerLayer<PerKind<u8>>,

    /// Evasion rating.
    #[serde(default)]
    pub manoeuvre: u32,

    /// Weapon tracking rating.
    #[serde(default)]
    pub tracking: u32,

    /// Repair output per layer per turn.
    #[serde(default)]
    pub support: PerLayer<u32>,

    /// Free-form tags (e.g. "carrier", "prototype").
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Largest firepower per damage kind or support per layer a class may declare.
pub const MAX_OUTPUT: u32 = 1_000_000;

impl ShipClassData {
    /// Check the definition for values the battle model cannot represent.
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| GameError::InvalidShipClass {
            id: self.id.clone(),
            reason,
        };

        if self.id.trim().is_empty() {
            return Err(invalid("id is empty".to_string()));
        }
        if self.capacity.hull <= 0 {
            return Err(invalid(format!(
                "hull capacity must be positive, got {}",
                self.capacity.hull
            )));
        }
        for layer in Layer::ALL {
            if self.capacity[layer] < 0 {
                return Err(invalid(format!("{layer:?} capacity is negative")));
            }
            for kind in DamageKind::ALL {
                let resist = self.resists[layer][kind];
                if resist > RESIST_CAP_PERCENT {
                    return Err(invalid(format!(
                        "{layer:?} {kind:?} resistance {resist}% exceeds {RESIST_CAP_PERCENT}%"
                    )));
                }
            }
        }
        for kind in DamageKind::ALL {
            if self.firepower[kind] > MAX_OUTPUT {
                return Err(invalid(format!(
                    "{kind:?} firepower {} exceeds {MAX_OUTPUT}",
                    self.firepower[kind]
                )));
            }
        }
        for layer in Layer::ALL {
            if self.support[layer] > MAX_OUTPUT {
                return Err(invalid(format!(
                    "{layer:?} support {} exceeds {MAX_OUTPUT}",
                    self.support[layer]
                )));
            }
        }
        if self.manoeuvre > MAX_MANOUVER {
            return Err(invalid(format!(
                "manoeuvre {} exceeds {MAX_MANOUVER}",
                self.manoeuvre
            )));
        }
        if self.tracking > MAX_MANOUVER {
            return Err(invalid(format!(
                "tracking {} exceeds {MAX_MANOUVER}",
                self.tracking
            )));
        }
        Ok(())
    }

    /// Check if this class has the specified tag.
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Check if this class can put out any damage.
    #[must_use]
    pub fn is_combatant(&self) -> bool {
        DamageKind::ALL.iter().any(|&kind| self.firepower[kind] > 0)
    }
}

/// Parse a RON document holding either one class or a list of classes.
pub fn parse_ship_classes(source: &str, path: &str) -> Result<Vec<ShipClassData>> {
    let parse_error = |e: ron::error::SpannedError| GameError::DataParseError {
        path: path.to_string(),
        message: e.to_string(),
    };

    let trimmed = source.trim_start();
    if trimmed.starts_with('[') {
        ron::from_str::<Vec<ShipClassData>>(source).map_err(parse_error)
    } else {
        ron::from_str::<ShipClassData>(source)
            .map(|class| vec![class])
            .map_err(parse_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_class() -> ShipClassData {
        ShipClassData {
            id: "test_frigate".to_string(),
            name: "ship.test.name".to_string(),
            size: ShipSize::Frigate,
            role: ShipRole::Line,
            firepower: PerKind::new(10, 0, 0),
            capacity: PerLayer::new(20, 10, 30),
            resists: PerLayer::new(
                PerKind::splat(10),
                PerKind::splat(20),
                PerKind::splat(0),
            ),
            manoeuvre: 4000,
            tracking: 5000,
            support: PerLayer::default(),
            tags: vec!["prototype".to_string()],
        }
    }

    #[test]
    fn test_valid_class_passes() {
        assert!(create_test_class().validate().is_ok());
    }

    #[test]
    fn test_zero_hull_rejected() {
        let mut class = create_test_class();
        class.capacity.hull = 0;
        assert!(matches!(
            class.validate(),
            Err(GameError::InvalidShipClass { .. })
        ));
    }

    #[test]
    fn test_resist_over_cap_rejected() {
        let mut class = create_test_class();
        class.resists.shield.heat = 96;
        assert!(class.validate().is_err());
        class.resists.shield.heat = 95;
        assert!(class.validate().is_ok());
    }

    #[test]
    fn test_manoeuvre_over_max_rejected() {
        let mut class = create_test_class();
        class.manoeuvre = MAX_MANOUVER + 1;
        assert!(class.validate().is_err());
    }

    #[test]
    fn test_output_over_limit_rejected() {
        let mut class = create_test_class();
        class.firepower.heat = MAX_OUTPUT;
        class.support.hull = MAX_OUTPUT;
        assert!(class.validate().is_ok());

        class.firepower.heat = MAX_OUTPUT + 1;
        assert!(matches!(
            class.validate(),
            Err(GameError::InvalidShipClass { .. })
        ));

        class.firepower.heat = 10;
        class.support.hull = 3_000_000_000;
        assert!(matches!(
            class.validate(),
            Err(GameError::InvalidShipClass { .. })
        ));
    }

    #[test]
    fn test_tags_and_combatant() {
        let mut class = create_test_class();
        assert!(class.has_tag("prototype"));
        assert!(!class.has_tag("carrier"));
        assert!(class.is_combatant());
        class.firepower = PerKind::default();
        assert!(!class.is_combatant());
    }

    #[test]
    fn test_parse_single_and_list() {
        let single = r#"
            ShipClassData(
                id: "picket",
                name: "ship.picket.name",
                size: Frigate,
                firepower: (heat: 5, kinetic: 5, radiation: 0),
                capacity: (shield: 10, armour: 10, hull: 20),
                manoeuvre: 6000,
                tracking: 3000,
            )
        "#;
        let parsed = parse_ship_classes(single, "picket.ron").unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].role, ShipRole::Line);
        assert_eq!(parsed[0].resists, PerLayer::default());

        let list = format!("[{}, {}]", single.trim(), single.trim());
        assert_eq!(parse_ship_classes(&list, "list.ron").unwrap().len(), 2);
    }

    #[test]
    fn test_parse_error_names_path() {
        let err = parse_ship_classes("ShipClassData(", "broken.ron").unwrap_err();
        assert!(err.to_string().contains("broken.ron"));
    }
}
