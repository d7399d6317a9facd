use super::SearchAdjacentGridblocks;
use crate::StrError;
use serde::{Deserialize, Serialize};

/// Defines the smallest allowed adaptive timestep in seconds
pub const CONTROL_MIN_DT: f64 = 1e-6;

/// Defines the default maximum fractional MFP33 increase per timestep
pub const CONTROL_DEFAULT_MAX_MFP33_INCREASE: f64 = 0.002;

/// Defines the default minimum clear-zone volume fraction
pub const CONTROL_DEFAULT_MIN_CLEAR_ZONE: f64 = 0.01;

/// Defines the default maximum effective-stress change per timestep in Pa
pub const CONTROL_DEFAULT_MAX_STRESS_INCREMENT: f64 = 1e5;

/// Defines the default absolute MFP33 increase allowed per timestep
pub const CONTROL_DEFAULT_MAX_MFP33_ABS_INCREASE: f64 = 1e-8;

/// Holds the options controlling fracture nucleation, propagation and termination
///
/// All ratio-based termination checks are disabled by a value ≤ 0.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct PropagationControl {
    /// Maximum fractional increase of macrofracture volumetric ratio (MFP33) per timestep
    pub max_timestep_mfp33_increase: f64,

    /// Absolute MFP33 increase allowed per timestep on top of the fractional budget
    ///
    /// While the macrofracture volume is still negligible, the fractional
    /// budget alone would shrink the timestep toward zero; the absolute term
    /// keeps the step finite until the population is significant. Set to 0.0
    /// for a purely fractional control.
    pub max_timestep_mfp33_abs_increase: f64,

    /// Maximum change of any effective-stress component per timestep (Pa)
    ///
    /// Bounds the timestep from the loading rate, so the stress path leading
    /// up to the first nucleation is resolved even while the MFP33 control
    /// has no fracture volume to work with.
    pub max_timestep_stress_increment: f64,

    /// Optional hard ceiling on the timestep duration in seconds
    pub max_timestep_duration: Option<f64>,

    /// Maximum number of timesteps per cell
    pub max_timesteps: usize,

    /// Minimum clear-zone volume fraction below which a dip set terminates
    pub minimum_clear_zone_volume: f64,

    /// Terminates a dip set when `current_active_MFP33 / peak_historic_MFP33` drops below this ratio (≤ 0 disables)
    pub current_historic_mfp33_termination_ratio: f64,

    /// Terminates a dip set when `active_MFP30 / total_MFP30` drops below this ratio (≤ 0 disables)
    pub active_total_mfp30_termination_ratio: f64,

    /// Considers stress shadows from all fracture sets, not only the fracture's own set
    pub check_all_stress_shadows: bool,

    /// Allows fractures with a reverse slip sense to propagate
    pub allow_reverse_fractures: bool,

    /// Draws nucleation events probabilistically when the deterministic count per step falls below this limit (≤ 0 disables)
    pub probabilistic_fracture_nucleation_limit: f64,

    /// Controls cross-cell stress-shadow queries
    pub search_adjacent_gridblocks: SearchAdjacentGridblocks,

    /// Recomputes the bulk elastic tensor from the fracture population every step
    pub output_bulk_rock_elastic_tensors: bool,

    /// Stress-shadow half-width as a multiple of the layer thickness
    pub stress_shadow_width_multiplier: f64,

    /// Horizontal stress anisotropy below which all fracture sets grow with equal driving stress
    pub anisotropy_cutoff: f64,

    /// Mean implicit aperture used to convert MFP32 to MFP33 during growth
    pub implicit_aperture: f64,

    /// Number of radius bins used to discretize the microfracture population
    pub micro_radius_bins: usize,

    /// Smallest microfracture radius tracked by the population (m)
    pub minimum_micro_radius: f64,

    /// Runs the per-cell update in parallel across gridblocks
    pub parallel: bool,
}

impl PropagationControl {
    /// Allocates a new instance with default values
    pub fn new() -> Self {
        PropagationControl {
            max_timestep_mfp33_increase: CONTROL_DEFAULT_MAX_MFP33_INCREASE,
            max_timestep_mfp33_abs_increase: CONTROL_DEFAULT_MAX_MFP33_ABS_INCREASE,
            max_timestep_stress_increment: CONTROL_DEFAULT_MAX_STRESS_INCREMENT,
            max_timestep_duration: None,
            max_timesteps: 1000,
            minimum_clear_zone_volume: CONTROL_DEFAULT_MIN_CLEAR_ZONE,
            current_historic_mfp33_termination_ratio: -1.0,
            active_total_mfp30_termination_ratio: -1.0,
            check_all_stress_shadows: false,
            allow_reverse_fractures: false,
            probabilistic_fracture_nucleation_limit: -1.0,
            search_adjacent_gridblocks: SearchAdjacentGridblocks::None,
            output_bulk_rock_elastic_tensors: false,
            stress_shadow_width_multiplier: 1.0,
            anisotropy_cutoff: 0.01,
            implicit_aperture: 1e-4,
            micro_radius_bins: 20,
            minimum_micro_radius: 1e-3,
            parallel: false,
        }
    }

    /// Sets the maximum fractional MFP33 increase per timestep
    pub fn set_max_timestep_mfp33_increase(&mut self, value: f64) -> Result<&mut Self, StrError> {
        if value <= 0.0 {
            return Err("max timestep MFP33 increase must be > 0.0");
        }
        self.max_timestep_mfp33_increase = value;
        Ok(self)
    }

    /// Sets the absolute MFP33 increase allowed per timestep
    pub fn set_max_timestep_mfp33_abs_increase(&mut self, value: f64) -> Result<&mut Self, StrError> {
        if value < 0.0 {
            return Err("max timestep absolute MFP33 increase must be ≥ 0.0");
        }
        self.max_timestep_mfp33_abs_increase = value;
        Ok(self)
    }

    /// Sets the maximum effective-stress change per timestep in Pa
    pub fn set_max_timestep_stress_increment(&mut self, value: f64) -> Result<&mut Self, StrError> {
        if value <= 0.0 {
            return Err("max timestep stress increment must be > 0.0");
        }
        self.max_timestep_stress_increment = value;
        Ok(self)
    }

    /// Sets the hard ceiling on the timestep duration in seconds
    pub fn set_max_timestep_duration(&mut self, value: f64) -> Result<&mut Self, StrError> {
        if value < CONTROL_MIN_DT {
            return Err("max timestep duration must be ≥ the minimum allowed timestep");
        }
        self.max_timestep_duration = Some(value);
        Ok(self)
    }

    /// Sets the maximum number of timesteps per cell
    pub fn set_max_timesteps(&mut self, value: usize) -> Result<&mut Self, StrError> {
        if value < 1 {
            return Err("max timesteps must be ≥ 1");
        }
        self.max_timesteps = value;
        Ok(self)
    }

    /// Sets the minimum clear-zone volume fraction
    pub fn set_minimum_clear_zone_volume(&mut self, value: f64) -> Result<&mut Self, StrError> {
        if value < 0.0 || value >= 1.0 {
            return Err("minimum clear zone volume must be in 0.0 ≤ v < 1.0");
        }
        self.minimum_clear_zone_volume = value;
        Ok(self)
    }

    /// Sets the stress-shadow half-width multiplier
    pub fn set_stress_shadow_width_multiplier(&mut self, value: f64) -> Result<&mut Self, StrError> {
        if value <= 0.0 {
            return Err("stress shadow width multiplier must be > 0.0");
        }
        self.stress_shadow_width_multiplier = value;
        Ok(self)
    }

    /// Sets the mean implicit aperture used to convert MFP32 to MFP33
    pub fn set_implicit_aperture(&mut self, value: f64) -> Result<&mut Self, StrError> {
        if value <= 0.0 {
            return Err("implicit aperture must be > 0.0");
        }
        self.implicit_aperture = value;
        Ok(self)
    }

    /// Sets the discretization of the microfracture population
    pub fn set_micro_population(&mut self, n_bins: usize, r_min: f64) -> Result<&mut Self, StrError> {
        if n_bins < 2 {
            return Err("the microfracture population needs at least 2 radius bins");
        }
        if r_min <= 0.0 {
            return Err("the minimum microfracture radius must be > 0.0");
        }
        self.micro_radius_bins = n_bins;
        self.minimum_micro_radius = r_min;
        Ok(self)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::PropagationControl;
    use crate::StrError;

    #[test]
    fn setters_handle_wrong_input() {
        let mut control = PropagationControl::new();
        assert_eq!(
            control.set_max_timestep_mfp33_increase(0.0).err(),
            Some("max timestep MFP33 increase must be > 0.0")
        );
        assert_eq!(
            control.set_max_timestep_mfp33_abs_increase(-1e-9).err(),
            Some("max timestep absolute MFP33 increase must be ≥ 0.0")
        );
        assert_eq!(control.set_max_timesteps(0).err(), Some("max timesteps must be ≥ 1"));
        assert_eq!(
            control.set_max_timestep_stress_increment(0.0).err(),
            Some("max timestep stress increment must be > 0.0")
        );
        assert_eq!(
            control.set_minimum_clear_zone_volume(1.0).err(),
            Some("minimum clear zone volume must be in 0.0 ≤ v < 1.0")
        );
        assert_eq!(
            control.set_micro_population(1, 1e-3).err(),
            Some("the microfracture population needs at least 2 radius bins")
        );
    }

    #[test]
    fn setters_work() -> Result<(), StrError> {
        let mut control = PropagationControl::new();
        control
            .set_max_timestep_mfp33_increase(0.01)?
            .set_max_timestep_mfp33_abs_increase(1e-9)?
            .set_max_timestep_stress_increment(5e5)?
            .set_max_timestep_duration(1e10)?
            .set_max_timesteps(50)?
            .set_minimum_clear_zone_volume(0.05)?
            .set_stress_shadow_width_multiplier(2.0)?
            .set_implicit_aperture(5e-4)?
            .set_micro_population(10, 1e-2)?;
        assert_eq!(control.max_timesteps, 50);
        assert_eq!(control.max_timestep_duration, Some(1e10));
        assert_eq!(control.micro_radius_bins, 10);
        Ok(())
    }
}
