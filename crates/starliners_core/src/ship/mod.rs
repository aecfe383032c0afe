//! Ships: immutable classes, levy modifiers, effective properties, and the
//! mutable per-ship combat state.

mod class;
mod instance;
mod modifiers;
mod properties;

pub use class::{ShipClass, ShipClassRegistry, ShipRole, ShipSize};
pub use instance::{Deployment, ShipInstance, ShipLevel, ShipState};
pub use modifiers::{OriginAttributes, ShipModifiers, MAX_AFFINITY};
pub use properties::{resist_cap, Resists, ShipProperties};

/// Rating scale for manoeuvre and tracking. A rating of this value is a
/// certainty (evasion or tracking of 1.0).
pub const MAX_MANOUVER: u32 = 10_000;

/// Resistance cap as a whole percentage.
pub const RESIST_CAP_PERCENT: u8 = 95;
