use crate::base::TimeUnits;
use crate::tensor::Tensor2;
use crate::StrError;
use log::warn;
use serde::{Deserialize, Serialize};

/// Defines the duration of a deformation episode
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
pub enum EpisodeDuration {
    /// Fixed duration in the episode's time units (≥ 0)
    Fixed(f64),

    /// The episode runs until every fracture set in the cell saturates
    UntilSaturation,
}

/// Defines the load applied during a deformation episode
///
/// The two representations are mutually exclusive: when an absolute stress
/// time series is supplied by the host, it is converted to a sequence of
/// `StressRate` episodes which overrides and disables the strain-rate form.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub enum EpisodeLoad {
    /// External strain-rate tensor plus scalar load rates
    StrainRate {
        /// Strain-rate tensor (1/s after unit conversion; extension positive)
        strain_rate: Tensor2,

        /// Fluid overpressure rate (Pa/s)
        fluid_pressure_rate: f64,

        /// Temperature rate (°C/s)
        temperature_rate: f64,

        /// Uplift rate (m/s; positive reduces burial depth)
        uplift_rate: f64,

        /// Stress-arching factor in [0,1]; 0 = constant vertical load, 1 = full arching
        stress_arching: f64,
    },

    /// Absolute effective-stress-rate tensor
    StressRate {
        /// Effective-stress-rate tensor (Pa/s; compression negative)
        stress_rate: Tensor2,

        /// Fluid pressure rate (Pa/s)
        fluid_pressure_rate: f64,
    },
}

/// Holds one stage of the loading history applied to a gridblock
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct DeformationEpisode {
    /// Load representation and rates (rates are per the episode's time unit)
    pub load: EpisodeLoad,

    /// Episode duration (in the episode's time units)
    pub duration: EpisodeDuration,

    /// Time units of the duration and of all rates
    pub time_units: TimeUnits,

    /// Absolute effective stress applied at the start of the first sub-episode
    pub initial_stress_override: Option<Tensor2>,

    /// Absolute fluid pressure applied at the start of the first sub-episode
    pub initial_pressure_override: Option<f64>,

    /// Externally supplied sub-episode durations (same time units); slices the episode
    pub sub_episode_durations: Option<Vec<f64>>,
}

impl DeformationEpisode {
    /// Allocates a strain-rate episode with zero scalar load rates
    pub fn from_strain_rate(
        strain_rate: Tensor2,
        duration: EpisodeDuration,
        time_units: TimeUnits,
    ) -> Result<Self, StrError> {
        let episode = DeformationEpisode {
            load: EpisodeLoad::StrainRate {
                strain_rate,
                fluid_pressure_rate: 0.0,
                temperature_rate: 0.0,
                uplift_rate: 0.0,
                stress_arching: 0.0,
            },
            duration,
            time_units,
            initial_stress_override: None,
            initial_pressure_override: None,
            sub_episode_durations: None,
        };
        episode.check_duration()?;
        Ok(episode)
    }

    /// Allocates a biaxial horizontal strain-rate episode
    ///
    /// # Input
    ///
    /// * `ehmin_azimuth` -- azimuth of the minimum horizontal strain direction,
    ///   radians counterclockwise from the grid x axis
    /// * `ehmin_rate` -- strain rate along the azimuth (extension positive)
    /// * `ehmax_rate` -- strain rate perpendicular to the azimuth
    pub fn biaxial_strain(
        ehmin_azimuth: f64,
        ehmin_rate: f64,
        ehmax_rate: f64,
        duration: EpisodeDuration,
        time_units: TimeUnits,
    ) -> Result<Self, StrError> {
        let principal = Tensor2::from_components(ehmin_rate, ehmax_rate, 0.0, 0.0, 0.0, 0.0);
        DeformationEpisode::from_strain_rate(principal.rotated_about_z(ehmin_azimuth), duration, time_units)
    }

    /// Allocates an effective-stress-rate episode
    pub fn from_stress_rate(
        stress_rate: Tensor2,
        fluid_pressure_rate: f64,
        duration: EpisodeDuration,
        time_units: TimeUnits,
    ) -> Result<Self, StrError> {
        let episode = DeformationEpisode {
            load: EpisodeLoad::StressRate {
                stress_rate,
                fluid_pressure_rate,
            },
            duration,
            time_units,
            initial_stress_override: None,
            initial_pressure_override: None,
            sub_episode_durations: None,
        };
        episode.check_duration()?;
        Ok(episode)
    }

    /// Sets the scalar load rates of a strain-rate episode
    ///
    /// The stress-arching factor is clamped to [0,1] with a warning.
    pub fn set_scalar_rates(
        &mut self,
        fluid_pressure_rate: f64,
        temperature_rate: f64,
        uplift_rate: f64,
        stress_arching: f64,
    ) -> Result<&mut Self, StrError> {
        match &mut self.load {
            EpisodeLoad::StrainRate {
                fluid_pressure_rate: pr,
                temperature_rate: tr,
                uplift_rate: ur,
                stress_arching: arch,
                ..
            } => {
                *pr = fluid_pressure_rate;
                *tr = temperature_rate;
                *ur = uplift_rate;
                *arch = if stress_arching < 0.0 || stress_arching > 1.0 {
                    let clamped = stress_arching.clamp(0.0, 1.0);
                    warn!("stress-arching factor {} clamped to {}", stress_arching, clamped);
                    clamped
                } else {
                    stress_arching
                };
                Ok(self)
            }
            EpisodeLoad::StressRate { .. } => {
                Err("scalar load rates apply to strain-rate episodes only")
            }
        }
    }

    /// Sets the absolute stress/pressure overrides applied at the first sub-episode
    pub fn set_initial_overrides(&mut self, stress: Option<Tensor2>, pressure: Option<f64>) -> &mut Self {
        self.initial_stress_override = stress;
        self.initial_pressure_override = pressure;
        self
    }

    /// Sets the externally supplied sub-episode duration list
    pub fn set_sub_episode_durations(&mut self, durations: Vec<f64>) -> Result<&mut Self, StrError> {
        if durations.is_empty() {
            return Err("the sub-episode duration list must not be empty");
        }
        if durations.iter().any(|d| *d <= 0.0) {
            return Err("all sub-episode durations must be > 0.0");
        }
        if let EpisodeDuration::Fixed(total) = self.duration {
            let sum: f64 = durations.iter().sum();
            if sum > total * (1.0 + 1e-10) {
                return Err("the sub-episode durations exceed the episode duration");
            }
        }
        self.sub_episode_durations = Some(durations);
        Ok(self)
    }

    /// Returns the load with all rates converted from per-time-unit to per-second
    pub fn load_per_second(&self) -> EpisodeLoad {
        let f = 1.0 / self.time_units.to_seconds();
        match &self.load {
            EpisodeLoad::StrainRate {
                strain_rate,
                fluid_pressure_rate,
                temperature_rate,
                uplift_rate,
                stress_arching,
            } => {
                let mut rate = *strain_rate;
                rate.scale(f);
                EpisodeLoad::StrainRate {
                    strain_rate: rate,
                    fluid_pressure_rate: fluid_pressure_rate * f,
                    temperature_rate: temperature_rate * f,
                    uplift_rate: uplift_rate * f,
                    stress_arching: *stress_arching,
                }
            }
            EpisodeLoad::StressRate {
                stress_rate,
                fluid_pressure_rate,
            } => {
                let mut rate = *stress_rate;
                rate.scale(f);
                EpisodeLoad::StressRate {
                    stress_rate: rate,
                    fluid_pressure_rate: fluid_pressure_rate * f,
                }
            }
        }
    }

    /// Returns the episode duration in seconds (None = until saturation)
    pub fn duration_seconds(&self) -> Option<f64> {
        match self.duration {
            EpisodeDuration::Fixed(d) => Some(d * self.time_units.to_seconds()),
            EpisodeDuration::UntilSaturation => None,
        }
    }

    /// Splits the episode into sub-episodes
    ///
    /// Each sub-episode inherits the parent's load, rates and time units, so
    /// the load at the start of sub-episode k+1 equals the load at the end of
    /// sub-episode k (continuity). The initial overrides apply to the first
    /// sub-episode only. Without an external duration list, the episode is
    /// its own single sub-episode.
    pub fn sub_episodes(&self) -> Vec<SubEpisode> {
        let factor = self.time_units.to_seconds();
        match &self.sub_episode_durations {
            Some(durations) => {
                let mut out = Vec::with_capacity(durations.len() + 1);
                let mut start = 0.0;
                for (k, d) in durations.iter().enumerate() {
                    out.push(SubEpisode {
                        start_offset: start,
                        duration: Some(d * factor),
                        apply_overrides: k == 0,
                    });
                    start += d * factor;
                }
                // remainder of a fixed duration stays as a trailing sub-episode
                if let Some(total) = self.duration_seconds() {
                    if total > start * (1.0 + 1e-10) {
                        out.push(SubEpisode {
                            start_offset: start,
                            duration: Some(total - start),
                            apply_overrides: false,
                        });
                    }
                } else {
                    out.push(SubEpisode {
                        start_offset: start,
                        duration: None,
                        apply_overrides: false,
                    });
                }
                out
            }
            None => vec![SubEpisode {
                start_offset: 0.0,
                duration: self.duration_seconds(),
                apply_overrides: true,
            }],
        }
    }

    fn check_duration(&self) -> Result<(), StrError> {
        if let EpisodeDuration::Fixed(d) = self.duration {
            if d < 0.0 {
                return Err("the episode duration must be ≥ 0.0");
            }
        }
        Ok(())
    }
}

/// Holds one time-slice of a deformation episode
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SubEpisode {
    /// Start time relative to the episode start (seconds)
    pub start_offset: f64,

    /// Duration in seconds (None = until saturation)
    pub duration: Option<f64>,

    /// Whether the parent's initial stress/pressure overrides apply at the start
    pub apply_overrides: bool,
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{DeformationEpisode, EpisodeDuration, EpisodeLoad};
    use crate::base::{TimeUnits, SECONDS_PER_YEAR};
    use crate::tensor::Tensor2;
    use crate::StrError;
    use russell_chk::assert_approx_eq;
    use std::f64::consts::PI;

    #[test]
    fn constructors_handle_wrong_input() {
        let rate = Tensor2::new();
        assert_eq!(
            DeformationEpisode::from_strain_rate(rate, EpisodeDuration::Fixed(-1.0), TimeUnits::Years).err(),
            Some("the episode duration must be ≥ 0.0")
        );
        let mut episode =
            DeformationEpisode::from_stress_rate(rate, 0.0, EpisodeDuration::Fixed(1.0), TimeUnits::Years).unwrap();
        assert_eq!(
            episode.set_scalar_rates(0.0, 0.0, 0.0, 0.5).err(),
            Some("scalar load rates apply to strain-rate episodes only")
        );
        assert_eq!(
            episode.set_sub_episode_durations(vec![]).err(),
            Some("the sub-episode duration list must not be empty")
        );
        assert_eq!(
            episode.set_sub_episode_durations(vec![0.6, 0.6]).err(),
            Some("the sub-episode durations exceed the episode duration")
        );
    }

    #[test]
    fn arching_factor_is_clamped() -> Result<(), StrError> {
        let rate = Tensor2::isotropic(1e-16);
        let mut episode =
            DeformationEpisode::from_strain_rate(rate, EpisodeDuration::Fixed(1.0), TimeUnits::MegaYears)?;
        episode.set_scalar_rates(0.0, 0.0, 0.0, 1.5)?;
        match episode.load {
            EpisodeLoad::StrainRate { stress_arching, .. } => assert_eq!(stress_arching, 1.0),
            _ => unreachable!(),
        }
        Ok(())
    }

    #[test]
    fn biaxial_strain_orients_the_tensor() -> Result<(), StrError> {
        // ehmin along y (azimuth 90°): the xx rate must equal ehmax
        let episode =
            DeformationEpisode::biaxial_strain(PI / 2.0, 1e-16, 3e-16, EpisodeDuration::Fixed(1.0), TimeUnits::Years)?;
        match episode.load {
            EpisodeLoad::StrainRate { strain_rate, .. } => {
                assert_approx_eq!(strain_rate.get(0, 0), 3e-16, 1e-30);
                assert_approx_eq!(strain_rate.get(1, 1), 1e-16, 1e-30);
            }
            _ => unreachable!(),
        }
        Ok(())
    }

    #[test]
    fn duration_conversion_works() -> Result<(), StrError> {
        let rate = Tensor2::new();
        let episode = DeformationEpisode::from_strain_rate(rate, EpisodeDuration::Fixed(2.0), TimeUnits::Years)?;
        assert_approx_eq!(episode.duration_seconds().unwrap(), 2.0 * SECONDS_PER_YEAR, 1e-6);
        let open = DeformationEpisode::from_strain_rate(rate, EpisodeDuration::UntilSaturation, TimeUnits::Years)?;
        assert_eq!(open.duration_seconds(), None);
        Ok(())
    }

    #[test]
    fn sub_episode_slicing_preserves_continuity() -> Result<(), StrError> {
        let rate = Tensor2::isotropic(1e-16);
        let mut episode = DeformationEpisode::from_strain_rate(rate, EpisodeDuration::Fixed(10.0), TimeUnits::Seconds)?;
        episode.set_sub_episode_durations(vec![2.0, 3.0])?;
        let subs = episode.sub_episodes();
        // two slices plus the remainder
        assert_eq!(subs.len(), 3);
        assert_eq!(subs[0].apply_overrides, true);
        assert_eq!(subs[1].apply_overrides, false);
        // each sub-episode starts where the previous one ended
        assert_approx_eq!(subs[0].start_offset + subs[0].duration.unwrap(), subs[1].start_offset, 1e-15);
        assert_approx_eq!(subs[1].start_offset + subs[1].duration.unwrap(), subs[2].start_offset, 1e-15);
        // total duration is preserved
        assert_approx_eq!(subs[2].start_offset + subs[2].duration.unwrap(), 10.0, 1e-15);
        Ok(())
    }
}
