use crate::tensor::Tensor4;
use crate::StrError;
use log::warn;
use serde::{Deserialize, Serialize};

/// Largest Poisson's ratio accepted before clamping
pub const POISSON_MAX: f64 = 0.4999;

/// Smallest Poisson's ratio accepted before clamping
pub const POISSON_MIN: f64 = -0.9999;

/// Holds the elastic, plastic and fracture-mechanical constants of one cell
///
/// # Notes
///
/// * Out-of-range values are corrected by clamping to the nearest valid value
///   with a non-fatal warning (see [`MechanicalProperties::validated`])
/// * The strain-relaxation time constants are disabled by a value ≤ 0
#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
pub struct MechanicalProperties {
    /// Young's modulus (Pa, > 0)
    pub young_modulus: f64,

    /// Poisson's ratio (must lie in −1 < ν < 0.5)
    pub poisson_ratio: f64,

    /// Matrix porosity (fraction in [0,1])
    pub porosity: f64,

    /// Biot poroelastic coefficient (fraction in [0,1])
    pub biot_coefficient: f64,

    /// Volumetric thermal expansion coefficient (1/°C)
    pub thermal_expansion: f64,

    /// Crack surface energy γ (J/m²)
    pub crack_surface_energy: f64,

    /// Internal friction coefficient μ
    pub friction_coefficient: f64,

    /// Strain-relaxation time constant of the intact rock (s; ≤ 0 disables)
    pub rock_strain_relaxation: f64,

    /// Strain-relaxation time constant on fracture surfaces (s; ≤ 0 disables)
    pub fracture_strain_relaxation: f64,

    /// Critical (maximum) fracture propagation rate (m/s)
    pub critical_propagation_rate: f64,

    /// Subcritical fracture propagation index b
    pub subcritical_index: f64,
}

impl MechanicalProperties {
    /// Returns a sample set of properties for a brittle sandstone
    pub fn sample_brittle_sandstone() -> Self {
        MechanicalProperties {
            young_modulus: 10e9,
            poisson_ratio: 0.25,
            porosity: 0.2,
            biot_coefficient: 1.0,
            thermal_expansion: 4e-5,
            crack_surface_energy: 1000.0,
            friction_coefficient: 0.5,
            rock_strain_relaxation: -1.0,
            fracture_strain_relaxation: -1.0,
            critical_propagation_rate: 2000.0,
            subcritical_index: 10.0,
        }
    }

    /// Returns a copy with all values clamped into their valid ranges
    ///
    /// Clamping is non-fatal: each corrected value emits a warning and the
    /// calculation proceeds.
    pub fn validated(&self) -> Self {
        let mut p = *self;
        if p.young_modulus <= 0.0 {
            warn!("Young's modulus {} clamped to 1e9 Pa", p.young_modulus);
            p.young_modulus = 1e9;
        }
        if p.poisson_ratio < POISSON_MIN || p.poisson_ratio > POISSON_MAX {
            let clamped = p.poisson_ratio.clamp(POISSON_MIN, POISSON_MAX);
            warn!("Poisson's ratio {} clamped to {}", p.poisson_ratio, clamped);
            p.poisson_ratio = clamped;
        }
        if p.porosity < 0.0 || p.porosity > 1.0 {
            let clamped = p.porosity.clamp(0.0, 1.0);
            warn!("porosity {} clamped to {}", p.porosity, clamped);
            p.porosity = clamped;
        }
        if p.biot_coefficient < 0.0 || p.biot_coefficient > 1.0 {
            let clamped = p.biot_coefficient.clamp(0.0, 1.0);
            warn!("Biot coefficient {} clamped to {}", p.biot_coefficient, clamped);
            p.biot_coefficient = clamped;
        }
        if p.crack_surface_energy < 0.0 {
            warn!("crack surface energy {} clamped to 0.0", p.crack_surface_energy);
            p.crack_surface_energy = 0.0;
        }
        if p.friction_coefficient < 0.0 {
            warn!("friction coefficient {} clamped to 0.0", p.friction_coefficient);
            p.friction_coefficient = 0.0;
        }
        if p.critical_propagation_rate < 0.0 {
            warn!("critical propagation rate {} clamped to 0.0", p.critical_propagation_rate);
            p.critical_propagation_rate = 0.0;
        }
        p
    }

    /// Returns the shear modulus `G = E/(2(1+ν))`
    pub fn shear_modulus(&self) -> f64 {
        self.young_modulus / (2.0 * (1.0 + self.poisson_ratio))
    }

    /// Returns the critical stress intensity (fracture toughness) from the Griffith relation
    ///
    /// `K_IC = √(2・E・γ / (1 − ν²))`
    pub fn critical_stress_intensity(&self) -> f64 {
        f64::sqrt(2.0 * self.young_modulus * self.crack_surface_energy / (1.0 - self.poisson_ratio * self.poisson_ratio))
    }

    /// Returns the uniaxial-strain horizontal-to-vertical effective stress ratio `ν/(1−ν)`
    pub fn k0_uniaxial(&self) -> f64 {
        self.poisson_ratio / (1.0 - self.poisson_ratio)
    }

    /// Returns the critical-state stress ratio `Kp = (√(1+μ²)+μ)²` for the friction coefficient
    pub fn friction_stress_ratio(&self) -> f64 {
        let mu = self.friction_coefficient;
        let root = f64::sqrt(1.0 + mu * mu) + mu;
        root * root
    }

    /// Returns the isotropic compliance tensor of the intact rock
    pub fn intact_compliance(&self) -> Result<Tensor4, StrError> {
        Tensor4::isotropic_compliance(self.young_modulus, self.poisson_ratio)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
