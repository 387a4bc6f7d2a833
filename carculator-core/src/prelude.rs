//! Convenience module for exposing commonly used structs
pub use crate::electricity_mix::{
    extract_electricity_mix_with_labels, ElectricityMix, ElectricityMixConfig,
    ElectricityMixExtractor, IamModel, TECHNOLOGIES,
};
#[cfg(feature = "resources")]
pub use crate::electricity_mix::extract_electricity_mix;
pub use crate::error::CarculatorError;
pub use crate::fleet::{
    build_fleet_array, build_fleet_composition, FleetArray, FleetComposition, FleetConfig,
};
pub use crate::labels::ElectricityMarketLabels;
pub use crate::scope::Scope;
pub use crate::traits::*;
