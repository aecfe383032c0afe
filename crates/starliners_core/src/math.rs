//! Fixed-point math utilities for deterministic combat resolution.
//!
//! Every fractional quantity in a battle (resistances, evasion, tracking,
//! damage multipliers, random draws) is a [`Fixed`] so that a replayed
//! random sequence produces bit-identical results on every platform.

use fixed::types::I32F32;

/// Fixed-point number type for all simulation math.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
pub type Fixed = I32F32;

/// Basis points in one whole.
pub const BASIS_POINTS: i64 = 10_000;

/// Build a fraction from basis points (`from_basis_points(9_500)` is 0.95).
#[must_use]
pub fn from_basis_points(value: i64) -> Fixed {
    Fixed::saturating_from_num(value) / Fixed::from_num(BASIS_POINTS)
}

/// Round a fraction to the nearest basis point.
///
/// Fractions built from percentages are not exactly representable in
/// binary; rounding recovers the whole number of basis points they stand for.
#[must_use]
pub fn basis_points(value: Fixed) -> i64 {
    value
        .saturating_mul_int(BASIS_POINTS)
        .saturating_round()
        .to_num::<i64>()
}

/// Build a fraction from a whole percentage (`percent(95)` is 0.95).
#[must_use]
pub fn percent(value: i32) -> Fixed {
    from_basis_points(i64::from(value) * 100)
}

/// Build a fraction `numerator / denominator`, zero when the denominator is zero.
#[must_use]
pub fn ratio(numerator: u32, denominator: u32) -> Fixed {
    if denominator == 0 {
        return Fixed::ZERO;
    }
    Fixed::from_num(numerator) / Fixed::from_num(denominator)
}

/// Multiply an integer amount by a fraction, truncating toward zero.
///
/// The product is taken in integer space at basis-point precision, so
/// `scale(100, percent(95))` is exactly 95.
#[must_use]
pub fn scale(amount: i32, factor: Fixed) -> i32 {
    if amount <= 0 || factor <= Fixed::ZERO {
        return 0;
    }
    let product = i64::from(amount) * basis_points(factor) / BASIS_POINTS;
    i32::try_from(product).unwrap_or(i32::MAX)
}

/// Multiply a non-negative amount by a whole percentage, truncating toward zero.
#[must_use]
pub fn scale_percent(amount: u32, percent: i32) -> u32 {
    let product = i64::from(amount) * i64::from(percent) / 100;
    u32::try_from(product.max(0)).unwrap_or(u32::MAX)
}

/// Serde support for fixed-point numbers.
///
/// Serializes fixed-point numbers as their raw bit representation (i64)
/// to preserve exact precision across serialization boundaries.
pub mod fixed_serde {
    use super::Fixed;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a fixed-point number as its raw bit representation.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.to_bits().serialize(serializer)
    }

    /// Deserialize a fixed-point number from its raw bit representation.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bits = i64::deserialize(deserializer)?;
        Ok(Fixed::from_bits(bits))
    }
}
