use super::MechanicalProperties;
use crate::base::InitialStressRelaxation;
use crate::loading::EpisodeLoad;
use crate::tensor::{Tensor2, Tensor4};
use crate::StrError;
use log::warn;
use serde::{Deserialize, Serialize};

/// Gravity acceleration (m/s²)
pub const GRAVITY: f64 = 9.81;

/// Holds the evolving stress, pressure and temperature state of one gridblock
///
/// # Notes
///
/// * Created once per gridblock at configuration time from burial, fluid and
///   thermal inputs; afterwards it changes only through [`StressStrainState::advance`]
///   and the geothermal-gradient setter
/// * Sign convention follows continuum mechanics: compression is negative;
///   the fluid pressure is positive
/// * Effective stress is Terzaghi-Biot: `σ' = σ + α・p`
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct StressStrainState {
    /// Current burial depth (m, positive downwards)
    depth: f64,

    /// Bulk sediment density (kg/m³)
    sediment_density: f64,

    /// Pore fluid density (kg/m³)
    fluid_density: f64,

    /// Geothermal gradient (°C/m)
    geothermal_gradient: f64,

    /// Current total vertical stress (Pa, negative)
    sigma_v_total: f64,

    /// Current effective stress tensor (Pa, compression negative)
    sigma_eff: Tensor2,

    /// Current fluid pressure (Pa, positive)
    fluid_pressure: f64,

    /// Current temperature (°C)
    temperature: f64,

    /// Effective stress at configuration time, the target of viscous strain relaxation
    sigma_eff_initial: Tensor2,
}

impl StressStrainState {
    /// Allocates a new instance, solving the initial condition from burial inputs
    ///
    /// # Input
    ///
    /// * `depth` -- burial depth of the cell center (m, > 0)
    /// * `sediment_density` -- bulk density of the overburden (kg/m³)
    /// * `fluid_density` -- pore fluid density (kg/m³)
    /// * `initial_overpressure` -- fluid pressure in excess of hydrostatic (Pa)
    /// * `geothermal_gradient` -- °C/m
    /// * `relaxation` -- how the initial horizontal effective stress follows the vertical
    pub fn new(
        depth: f64,
        sediment_density: f64,
        fluid_density: f64,
        initial_overpressure: f64,
        geothermal_gradient: f64,
        relaxation: InitialStressRelaxation,
        mech: &MechanicalProperties,
    ) -> Result<Self, StrError> {
        if depth <= 0.0 {
            return Err("the burial depth must be > 0.0");
        }
        if sediment_density <= 0.0 || fluid_density <= 0.0 {
            return Err("the sediment and fluid densities must be > 0.0");
        }
        let fluid_pressure = fluid_density * GRAVITY * depth + initial_overpressure;
        let sigma_v_total = -sediment_density * GRAVITY * depth;
        let sigma_v_eff = sigma_v_total + mech.biot_coefficient * fluid_pressure;
        let k0 = match relaxation {
            InitialStressRelaxation::Uniaxial => mech.k0_uniaxial(),
            InitialStressRelaxation::Critical => 1.0 / mech.friction_stress_ratio(),
            InitialStressRelaxation::User(k0) => {
                if k0 < 0.0 {
                    warn!("initial stress ratio {} clamped to 0.0", k0);
                    0.0
                } else {
                    k0
                }
            }
        };
        let sigma_h_eff = k0 * sigma_v_eff;
        let sigma_eff = Tensor2::from_components(sigma_h_eff, sigma_h_eff, sigma_v_eff, 0.0, 0.0, 0.0);
        Ok(StressStrainState {
            depth,
            sediment_density,
            fluid_density,
            geothermal_gradient,
            sigma_v_total,
            sigma_eff,
            fluid_pressure,
            temperature: geothermal_gradient * depth,
            sigma_eff_initial: sigma_eff,
        })
    }

    /// Returns the current burial depth (m)
    pub fn depth(&self) -> f64 {
        self.depth
    }

    /// Returns the current effective stress tensor
    pub fn effective_stress(&self) -> &Tensor2 {
        &self.sigma_eff
    }

    /// Returns the current vertical effective stress (Pa, negative in compression)
    pub fn vertical_effective_stress(&self) -> f64 {
        self.sigma_eff.get(2, 2)
    }

    /// Returns the current fluid pressure (Pa)
    pub fn fluid_pressure(&self) -> f64 {
        self.fluid_pressure
    }

    /// Returns the current temperature (°C)
    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    /// Sets the geothermal gradient (°C/m)
    pub fn set_geothermal_gradient(&mut self, value: f64) {
        self.geothermal_gradient = value;
    }

    /// Returns the horizontal principal effective stresses as (σh_min, σh_max, azimuth of σh_min)
    ///
    /// "Minimum" means the most compressive (most negative) value; the azimuth
    /// is radians counterclockwise from the grid x axis.
    pub fn horizontal_principal_stresses(&self) -> (f64, f64, f64) {
        let sxx = self.sigma_eff.get(0, 0);
        let syy = self.sigma_eff.get(1, 1);
        let sxy = self.sigma_eff.get(0, 1);
        let center = 0.5 * (sxx + syy);
        let radius = f64::sqrt(0.25 * (sxx - syy) * (sxx - syy) + sxy * sxy);
        let azimuth = 0.5 * f64::atan2(2.0 * sxy, sxx - syy);
        // center − radius is the most compressive; its axis is perpendicular to the σ1 axis
        (center - radius, center + radius, azimuth + std::f64::consts::FRAC_PI_2)
    }

    /// Returns the horizontal differential stress `σh_max − σh_min` (Pa, ≥ 0)
    pub fn horizontal_stress_anisotropy(&self) -> f64 {
        let (s_min, s_max, _) = self.horizontal_principal_stresses();
        s_max - s_min
    }

    /// Overrides the absolute effective stress and fluid pressure (first sub-episode of an episode)
    pub fn apply_override(&mut self, stress: Option<&Tensor2>, pressure: Option<f64>) {
        if let Some(sigma) = stress {
            self.sigma_eff = *sigma;
        }
        if let Some(p) = pressure {
            self.fluid_pressure = p;
        }
    }

    /// Advances the state by dt under the given per-second load rates
    ///
    /// For a strain-rate load this applies, in order: the elastic stress
    /// increment `Δσ = C:Δε` (the vertical component scaled by the
    /// stress-arching factor), the uplift correction of overburden,
    /// hydrostatic pressure and temperature, the overpressure increment,
    /// the confined thermal stress, and viscous strain relaxation toward the
    /// initial stress state. An absolute stress-rate load bypasses all of
    /// these and integrates the supplied rates directly.
    pub fn advance(&mut self, load: &EpisodeLoad, mech: &MechanicalProperties, stiffness: &Tensor4, dt: f64) {
        match load {
            EpisodeLoad::StrainRate {
                strain_rate,
                fluid_pressure_rate,
                temperature_rate,
                uplift_rate,
                stress_arching,
            } => {
                // elastic increment from the external strain rate
                let mut deps = *strain_rate;
                deps.scale(dt);
                let dsigma = stiffness.stress_from_strain(&deps);
                self.sigma_eff.vec[0] += dsigma.vec[0];
                self.sigma_eff.vec[1] += dsigma.vec[1];
                self.sigma_eff.vec[2] += stress_arching * dsigma.vec[2];
                self.sigma_eff.vec[3] += dsigma.vec[3];
                self.sigma_eff.vec[4] += dsigma.vec[4];
                self.sigma_eff.vec[5] += dsigma.vec[5];

                // uplift: overburden removal and hydrostatic drop
                let dz = uplift_rate * dt;
                if dz != 0.0 {
                    self.depth -= dz;
                    let d_sigma_v = self.sediment_density * GRAVITY * dz;
                    let dp_hydro = -self.fluid_density * GRAVITY * dz;
                    self.sigma_v_total += d_sigma_v;
                    self.fluid_pressure += dp_hydro;
                    self.sigma_eff.vec[2] += d_sigma_v + mech.biot_coefficient * dp_hydro;
                    self.sigma_eff.vec[0] += mech.biot_coefficient * dp_hydro;
                    self.sigma_eff.vec[1] += mech.biot_coefficient * dp_hydro;
                }

                // overpressure
                let dp = fluid_pressure_rate * dt;
                if dp != 0.0 {
                    self.fluid_pressure += dp;
                    let dp_eff = mech.biot_coefficient * dp;
                    self.sigma_eff.vec[0] += dp_eff;
                    self.sigma_eff.vec[1] += dp_eff;
                    self.sigma_eff.vec[2] += dp_eff;
                }

                // temperature change: applied rate minus the geothermal effect of uplift
                let dtemp = temperature_rate * dt - self.geothermal_gradient * dz;
                if dtemp != 0.0 {
                    self.temperature += dtemp;
                    // laterally confined thermal stress (linear expansivity = α/3)
                    let alpha_linear = mech.thermal_expansion / 3.0;
                    let d_thermal =
                        -mech.young_modulus * alpha_linear * dtemp / (1.0 - mech.poisson_ratio);
                    self.sigma_eff.vec[0] += d_thermal;
                    self.sigma_eff.vec[1] += d_thermal;
                }

                // viscous relaxation of differential stress toward the initial state
                if mech.rock_strain_relaxation > 0.0 {
                    let decay = f64::exp(-dt / mech.rock_strain_relaxation);
                    for p in 0..6 {
                        let target = self.sigma_eff_initial.vec[p];
                        self.sigma_eff.vec[p] = target + (self.sigma_eff.vec[p] - target) * decay;
                    }
                }
            }
            EpisodeLoad::StressRate {
                stress_rate,
                fluid_pressure_rate,
            } => {
                self.sigma_eff.add(dt, stress_rate);
                self.fluid_pressure += fluid_pressure_rate * dt;
            }
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{StressStrainState, GRAVITY};
    use crate::base::InitialStressRelaxation;
    use crate::loading::EpisodeLoad;
    use crate::mechanics::MechanicalProperties;
    use crate::tensor::Tensor2;
    use crate::StrError;
    use russell_chk::assert_approx_eq;

    fn sample_state() -> Result<StressStrainState, StrError> {
        let mech = MechanicalProperties::sample_brittle_sandstone();
        StressStrainState::new(2000.0, 2500.0, 1000.0, 0.0, 0.03, InitialStressRelaxation::Uniaxial, &mech)
    }

    #[test]
    fn new_handles_wrong_input() {
        let mech = MechanicalProperties::sample_brittle_sandstone();
        assert_eq!(
            StressStrainState::new(0.0, 2500.0, 1000.0, 0.0, 0.03, InitialStressRelaxation::Uniaxial, &mech).err(),
            Some("the burial depth must be > 0.0")
        );
        assert_eq!(
            StressStrainState::new(2000.0, 0.0, 1000.0, 0.0, 0.03, InitialStressRelaxation::Uniaxial, &mech).err(),
            Some("the sediment and fluid densities must be > 0.0")
        );
    }

    #[test]
    fn initial_condition_solver_works() -> Result<(), StrError> {
        let state = sample_state()?;
        // hydrostatic pressure at 2 km
        assert_approx_eq!(state.fluid_pressure(), 1000.0 * GRAVITY * 2000.0, 1e-6);
        // Terzaghi effective vertical stress (Biot = 1)
        let sigma_v_total = -2500.0 * GRAVITY * 2000.0;
        let sigma_v_eff = sigma_v_total + state.fluid_pressure();
        assert_approx_eq!(state.vertical_effective_stress(), sigma_v_eff, 1e-6);
        // uniaxial ratio ν/(1−ν) = 1/3
        assert_approx_eq!(state.effective_stress().get(0, 0), sigma_v_eff / 3.0, 1e-6);
        // geothermal temperature
        assert_approx_eq!(state.temperature(), 60.0, 1e-12);
        Ok(())
    }

    #[test]
    fn strain_rate_advance_builds_differential_stress() -> Result<(), StrError> {
        let mech = MechanicalProperties::sample_brittle_sandstone();
        let mut state = sample_state()?;
        let stiffness = mech.intact_compliance()?.inverse()?;
        let sxx_before = state.effective_stress().get(0, 0);
        let szz_before = state.vertical_effective_stress();
        // uniaxial extension along x, zero arching: vertical stress untouched
        let load = EpisodeLoad::StrainRate {
            strain_rate: Tensor2::from_components(1e-16, 0.0, 0.0, 0.0, 0.0, 0.0),
            fluid_pressure_rate: 0.0,
            temperature_rate: 0.0,
            uplift_rate: 0.0,
            stress_arching: 0.0,
        };
        let stiff_xx = stiffness.mat[0][0];
        state.advance(&load, &mech, &stiffness, 1e13);
        let expected_dxx = stiff_xx * 1e-16 * 1e13;
        assert_approx_eq!(state.effective_stress().get(0, 0), sxx_before + expected_dxx, 1.0);
        assert_approx_eq!(state.vertical_effective_stress(), szz_before, 1e-9);
        Ok(())
    }

    #[test]
    fn overpressure_reduces_compression() -> Result<(), StrError> {
        let mech = MechanicalProperties::sample_brittle_sandstone();
        let mut state = sample_state()?;
        let stiffness = mech.intact_compliance()?.inverse()?;
        let szz_before = state.vertical_effective_stress();
        let p_before = state.fluid_pressure();
        let load = EpisodeLoad::StrainRate {
            strain_rate: Tensor2::new(),
            fluid_pressure_rate: 100.0,
            temperature_rate: 0.0,
            uplift_rate: 0.0,
            stress_arching: 0.0,
        };
        state.advance(&load, &mech, &stiffness, 1000.0);
        assert_approx_eq!(state.fluid_pressure(), p_before + 1e5, 1e-6);
        assert_approx_eq!(state.vertical_effective_stress(), szz_before + 1e5, 1e-6);
        Ok(())
    }

    #[test]
    fn stress_rate_mode_integrates_directly() -> Result<(), StrError> {
        let mech = MechanicalProperties::sample_brittle_sandstone();
        let mut state = sample_state()?;
        let stiffness = mech.intact_compliance()?.inverse()?;
        let before = *state.effective_stress();
        let load = EpisodeLoad::StressRate {
            stress_rate: Tensor2::from_components(10.0, 20.0, 30.0, 0.0, 0.0, 0.0),
            fluid_pressure_rate: 1.0,
        };
        state.advance(&load, &mech, &stiffness, 100.0);
        assert_approx_eq!(state.effective_stress().get(0, 0), before.get(0, 0) + 1000.0, 1e-9);
        assert_approx_eq!(state.effective_stress().get(2, 2), before.get(2, 2) + 3000.0, 1e-9);
        Ok(())
    }

    #[test]
    fn horizontal_principal_stresses_work() -> Result<(), StrError> {
        let mut state = sample_state()?;
        state.apply_override(
            Some(&Tensor2::from_components(-10e6, -20e6, -30e6, 0.0, 0.0, 0.0)),
            None,
        );
        let (s_min, s_max, azimuth) = state.horizontal_principal_stresses();
        assert_approx_eq!(s_min, -20e6, 1e-6);
        assert_approx_eq!(s_max, -10e6, 1e-6);
        // most compressive direction is y, so its azimuth is π/2
        assert_approx_eq!(azimuth, std::f64::consts::FRAC_PI_2, 1e-12);
        assert_approx_eq!(state.horizontal_stress_anisotropy(), 10e6, 1e-6);
        Ok(())
    }
}
