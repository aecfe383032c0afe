//! Damage kinds, defensive layers, and the value objects describing one
//! exchange of fire.
//!
//! A [`Volley`] is what a ship puts out for one damage kind in one turn. The
//! receiving ship turns it into a [`DamageReport`]: how much each layer
//! resisted and how much it actually lost, plus the [`HitType`] severity.

use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

use crate::math::{percent, Fixed};
use crate::random::WorldRng;

/// Kind of damage a weapon deals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DamageKind {
    /// Lasers, plasma.
    Heat,
    /// Mass drivers, railguns, missiles.
    Kinetic,
    /// Particle beams.
    Radiation,
}

impl DamageKind {
    /// All damage kinds in firing order.
    pub const ALL: [Self; 3] = [Self::Heat, Self::Kinetic, Self::Radiation];
}

/// Defensive layer of a ship, in the order incoming damage meets them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Layer {
    /// Regenerating energy barrier.
    Shield,
    /// Ablative plating.
    Armour,
    /// Structure. A ship is wrecked when this reaches zero.
    Hull,
}

impl Layer {
    /// All layers in absorption order.
    pub const ALL: [Self; 3] = [Self::Shield, Self::Armour, Self::Hull];
}

/// One value per [`DamageKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PerKind<T> {
    /// Heat value.
    pub heat: T,
    /// Kinetic value.
    pub kinetic: T,
    /// Radiation value.
    pub radiation: T,
}

impl<T> PerKind<T> {
    /// Create from explicit values.
    pub const fn new(heat: T, kinetic: T, radiation: T) -> Self {
        Self {
            heat,
            kinetic,
            radiation,
        }
    }

    /// Apply `f` to every kind.
    pub fn map<U>(self, mut f: impl FnMut(DamageKind, T) -> U) -> PerKind<U> {
        PerKind {
            heat: f(DamageKind::Heat, self.heat),
            kinetic: f(DamageKind::Kinetic, self.kinetic),
            radiation: f(DamageKind::Radiation, self.radiation),
        }
    }
}

impl<T: Copy> PerKind<T> {
    /// Same value for every kind.
    pub const fn splat(value: T) -> Self {
        Self::new(value, value, value)
    }
}

impl<T> Index<DamageKind> for PerKind<T> {
    type Output = T;

    fn index(&self, kind: DamageKind) -> &T {
        match kind {
            DamageKind::Heat => &self.heat,
            DamageKind::Kinetic => &self.kinetic,
            DamageKind::Radiation => &self.radiation,
        }
    }
}

impl<T> IndexMut<DamageKind> for PerKind<T> {
    fn index_mut(&mut self, kind: DamageKind) -> &mut T {
        match kind {
            DamageKind::Heat => &mut self.heat,
            DamageKind::Kinetic => &mut self.kinetic,
            DamageKind::Radiation => &mut self.radiation,
        }
    }
}

/// One value per [`Layer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PerLayer<T> {
    /// Shield value.
    pub shield: T,
    /// Armour value.
    pub armour: T,
    /// Hull value.
    pub hull: T,
}

impl<T> PerLayer<T> {
    /// Create from explicit values.
    pub const fn new(shield: T, armour: T, hull: T) -> Self {
        Self {
            shield,
            armour,
            hull,
        }
    }

    /// Apply `f` to every layer.
    pub fn map<U>(self, mut f: impl FnMut(Layer, T) -> U) -> PerLayer<U> {
        PerLayer {
            shield: f(Layer::Shield, self.shield),
            armour: f(Layer::Armour, self.armour),
            hull: f(Layer::Hull, self.hull),
        }
    }
}

impl<T> Index<Layer> for PerLayer<T> {
    type Output = T;

    fn index(&self, layer: Layer) -> &T {
        match layer {
            Layer::Shield => &self.shield,
            Layer::Armour => &self.armour,
            Layer::Hull => &self.hull,
        }
    }
}

impl<T> IndexMut<Layer> for PerLayer<T> {
    fn index_mut(&mut self, layer: Layer) -> &mut T {
        match layer {
            Layer::Shield => &mut self.shield,
            Layer::Armour => &mut self.armour,
            Layer::Hull => &mut self.hull,
        }
    }
}

/// Severity of a hit.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub enum HitType {
    /// The target evaded completely.
    #[default]
    Missed,
    /// Glancing hit.
    Grazed,
    /// Solid hit.
    Notable,
    /// Direct hit.
    Direct,
    /// Critical hit.
    Critical,
}

impl HitType {
    /// Severities a volley can achieve, in the order they are contested.
    pub const SEVERITIES: [Self; 4] = [Self::Grazed, Self::Notable, Self::Direct, Self::Critical];

    /// Damage multiplier as a whole percentage.
    #[must_use]
    pub const fn damage_percent(self) -> i32 {
        match self {
            Self::Critical => 150,
            Self::Direct => 125,
            Self::Notable => 100,
            Self::Grazed => 75,
            Self::Missed => 0,
        }
    }

    /// Damage multiplier applied to a volley's base damage.
    #[must_use]
    pub fn damage_multiplier(self) -> Fixed {
        percent(self.damage_percent())
    }

    /// Roll damage for this severity.
    ///
    /// The result is uniform over the top half of the scaled range:
    /// `scaled/2 + uniform(0, scaled/2)` where `scaled = base * multiplier`.
    /// Always draws exactly one fraction, even for a miss.
    pub fn randomized_damage(self, base: u32, rng: &mut WorldRng) -> i32 {
        let scaled = i64::from(base) * i64::from(self.damage_percent());
        let half = Fixed::saturating_from_num(scaled / 200)
            .saturating_add(Fixed::from_num(scaled % 200) / Fixed::from_num(200));
        half.saturating_add(rng.fraction().saturating_mul(half))
            .saturating_to_num::<i32>()
    }
}

/// Immutable record of what one volley did to one ship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct DamageReport {
    /// Shield points lost.
    pub shield_damage: i32,
    /// Damage the shield resisted.
    pub shield_resisted: i32,
    /// Armour points lost.
    pub armour_damage: i32,
    /// Damage the armour resisted.
    pub armour_resisted: i32,
    /// Hull points lost.
    pub structure_damage: i32,
    /// Damage the hull resisted.
    pub structure_resisted: i32,
    /// Severity achieved by the volley.
    pub hit: HitType,
    /// Set when this hit wrecked the ship.
    pub final_hit: bool,
}

impl DamageReport {
    /// Report for a volley that had no effect at all.
    pub const NO_DAMAGE: Self = Self {
        shield_damage: 0,
        shield_resisted: 0,
        armour_damage: 0,
        armour_resisted: 0,
        structure_damage: 0,
        structure_resisted: 0,
        hit: HitType::Missed,
        final_hit: false,
    };

    /// Create an empty report carrying a hit severity.
    #[must_use]
    pub const fn with_hit(hit: HitType) -> Self {
        Self {
            hit,
            ..Self::NO_DAMAGE
        }
    }

    /// True iff nothing was absorbed and nothing was delivered.
    #[must_use]
    pub const fn no_effect(&self) -> bool {
        self.shield_damage <= 0
            && self.shield_resisted <= 0
            && self.armour_damage <= 0
            && self.armour_resisted <= 0
            && self.structure_damage <= 0
            && self.structure_resisted <= 0
    }

    /// Record the outcome for one layer.
    pub fn record(&mut self, layer: Layer, resisted: i32, damage: i32) {
        match layer {
            Layer::Shield => {
                self.shield_resisted = resisted;
                self.shield_damage = damage;
            }
            Layer::Armour => {
                self.armour_resisted = resisted;
                self.armour_damage = damage;
            }
            Layer::Hull => {
                self.structure_resisted = resisted;
                self.structure_damage = damage;
            }
        }
    }

    /// Points lost on one layer.
    #[must_use]
    pub const fn damage(&self, layer: Layer) -> i32 {
        match layer {
            Layer::Shield => self.shield_damage,
            Layer::Armour => self.armour_damage,
            Layer::Hull => self.structure_damage,
        }
    }

    /// Damage resisted by one layer.
    #[must_use]
    pub const fn resisted(&self, layer: Layer) -> i32 {
        match layer {
            Layer::Shield => self.shield_resisted,
            Layer::Armour => self.armour_resisted,
            Layer::Hull => self.structure_resisted,
        }
    }

    /// Points lost across all layers.
    #[must_use]
    pub const fn total_damage(&self) -> i32 {
        self.shield_damage + self.armour_damage + self.structure_damage
    }

    /// Damage resisted across all layers.
    #[must_use]
    pub const fn total_resisted(&self) -> i32 {
        self.shield_resisted + self.armour_resisted + self.structure_resisted
    }
}

/// Firepower a ship puts out for one damage kind in one turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Volley {
    /// Damage kind.
    pub kind: DamageKind,
    /// Tracking rating, out of [`crate::ship::MAX_MANOUVER`].
    pub tracking: u32,
    /// Raw damage before severity and resistances.
    pub damage: u32,
}

impl Volley {
    /// Create a volley.
    #[must_use]
    pub const fn new(kind: DamageKind, tracking: u32, damage: u32) -> Self {
        Self {
            kind,
            tracking,
            damage,
        }
    }
}
