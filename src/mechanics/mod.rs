//! Implements the per-cell mechanical properties and stress-strain state

mod mechanical_properties;
mod stress_strain_state;
pub use crate::mechanics::mechanical_properties::*;
pub use crate::mechanics::stress_strain_state::*;
