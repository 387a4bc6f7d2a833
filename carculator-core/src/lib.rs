// TODO: uncomment when docs are somewhat mature to check for missing docs
// #![warn(missing_docs)]

//! Crate for reshaping road vehicle scenario data into the dense, labelled arrays consumed by
//! life cycle inventory calculations.
//!
//! - [`labels`] maps IAM technology labels onto IAM market variables
//! - [`electricity_mix`] extracts normalized electricity mixes from IAM output tables
//! - [`fleet`] builds and validates fleet composition arrays
//!
//! # Features:
//! - resources: embed the default label mapping file in the crate (default)

#[macro_use]
pub mod macros;

pub mod electricity_mix;
pub mod error;
pub mod fleet;
pub mod imports;
pub mod labels;
pub mod prelude;
#[cfg(feature = "resources")]
pub mod resources;
pub mod scope;
pub mod traits;
pub mod utils;
