//! Data structures for ship class configuration.
//!
//! Pure data types deserialized from RON files. This module does not touch
//! the filesystem; loading directories is left to the headless runner and
//! the tools crate.

mod ship_class_data;

pub use ship_class_data::{parse_ship_classes, ShipClassData, MAX_OUTPUT};
