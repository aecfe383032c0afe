//! Effective combat numbers of a ship.
//!
//! [`ShipProperties`] are derived once per ship from its class, the
//! modifiers of the levy that raised it, and the combat traits of the owning
//! faction. They never change while the ship is in battle.

use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

use crate::damage::{DamageKind, Layer, PerKind, PerLayer};
use crate::factions::CombatProperties;
use crate::math::{basis_points, fixed_serde, from_basis_points, percent, scale_percent, Fixed};

use super::class::ShipClass;
use super::modifiers::ShipModifiers;
use super::RESIST_CAP_PERCENT;

/// Highest resistance any layer may reach (0.95). A ship is never immune.
#[must_use]
pub fn resist_cap() -> Fixed {
    percent(i32::from(RESIST_CAP_PERCENT))
}

/// Resistance fractions of one layer, per damage kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Resists {
    /// Heat resistance.
    #[serde(with = "fixed_serde")]
    pub heat: Fixed,
    /// Kinetic resistance.
    #[serde(with = "fixed_serde")]
    pub kinetic: Fixed,
    /// Radiation resistance.
    #[serde(with = "fixed_serde")]
    pub radiation: Fixed,
}

impl Resists {
    /// Create from per-kind fractions.
    #[must_use]
    pub const fn new(values: PerKind<Fixed>) -> Self {
        Self {
            heat: values.heat,
            kinetic: values.kinetic,
            radiation: values.radiation,
        }
    }

    /// Clamp every fraction above the cap down to the cap.
    ///
    /// Values at or below the cap are left untouched.
    #[must_use]
    pub fn enforce_max(self) -> Self {
        let cap = resist_cap();
        Self {
            heat: self.heat.min(cap),
            kinetic: self.kinetic.min(cap),
            radiation: self.radiation.min(cap),
        }
    }

    /// Clamp every negative fraction up to zero.
    #[must_use]
    pub fn enforce_min(self) -> Self {
        Self {
            heat: self.heat.max(Fixed::ZERO),
            kinetic: self.kinetic.max(Fixed::ZERO),
            radiation: self.radiation.max(Fixed::ZERO),
        }
    }
}

impl Index<DamageKind> for Resists {
    type Output = Fixed;

    fn index(&self, kind: DamageKind) -> &Fixed {
        match kind {
            DamageKind::Heat => &self.heat,
            DamageKind::Kinetic => &self.kinetic,
            DamageKind::Radiation => &self.radiation,
        }
    }
}

impl IndexMut<DamageKind> for Resists {
    fn index_mut(&mut self, kind: DamageKind) -> &mut Fixed {
        match kind {
            DamageKind::Heat => &mut self.heat,
            DamageKind::Kinetic => &mut self.kinetic,
            DamageKind::Radiation => &mut self.radiation,
        }
    }
}

/// Effective combat numbers of one ship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ShipProperties {
    /// Resistances per layer, within `[0, 0.95]`.
    pub resists: PerLayer<Resists>,
    /// Firepower per damage kind.
    pub firepower: PerKind<u32>,
    /// Repair output per layer.
    pub support: PerLayer<u32>,
}

impl ShipProperties {
    /// Derive effective numbers from a class, levy modifiers and faction traits.
    ///
    /// ```text
    /// resist    = clamp(base + levy resist - faction weakness, 0, 0.95)
    /// firepower = base * (1 + levy focus + faction strength), floored at 0
    /// ```
    #[must_use]
    pub fn compute(
        class: &ShipClass,
        modifiers: &ShipModifiers,
        combat: &CombatProperties,
    ) -> Self {
        let resists = class.resists.map(|_, base| {
            let mut adjusted = base;
            for kind in DamageKind::ALL {
                let delta = i64::from(modifiers.resist[kind]) - i64::from(combat.weakness[kind]);
                adjusted[kind] = from_basis_points(basis_points(base[kind]) + delta * 100);
            }
            adjusted.enforce_min().enforce_max()
        });

        let firepower = class.firepower.map(|kind, base| {
            let bonus = i32::from(modifiers.focus[kind]) + i32::from(combat.strength[kind]);
            scale_percent(base, 100 + bonus)
        });

        Self {
            resists,
            firepower,
            support: class.support,
        }
    }

    /// Resistance of one layer against one damage kind.
    #[must_use]
    pub fn resist(&self, layer: Layer, kind: DamageKind) -> Fixed {
        self.resists[layer][kind]
    }
}
