//! # Starliners Development Tools
//!
//! Command-line tools for development:
//! - Ship class data validator

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod validate;
