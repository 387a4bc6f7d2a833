//! Fleet composition arrays: vehicle-kilometers by powertrain, size, vintage year and calendar
//! year.

use crate::imports::*;

pub mod array;
pub mod composition;

pub use array::{build_fleet_array, FleetArray};
pub use composition::{build_fleet_composition, FleetComposition};

/// Settings of fleet composition building
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FleetConfig {
    /// Decimal places vehicle-kilometers are rounded to
    pub decimals: i32,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self { decimals: 3 }
    }
}

impl SerdeAPI for FleetConfig {}
