use serde::{Deserialize, Serialize};

/// Holds the quantities an aperture model may consult
#[derive(Clone, Copy, Debug)]
pub struct ApertureContext {
    /// Thickness of the fractured layer (m)
    pub layer_thickness: f64,

    /// Size of the fracture: radius for a microfracture, half-length for a macrofracture (m)
    pub fracture_size: f64,

    /// Effective stress normal to the fracture plane (Pa, compression negative)
    pub effective_normal_stress: f64,

    /// Young's modulus of the host rock (Pa)
    pub young_modulus: f64,
}

/// Defines the model assigning a mean hydraulic aperture to each fracture
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
pub enum ApertureModel {
    /// Constant aperture (m)
    Uniform {
        /// Aperture (m)
        aperture: f64,
    },

    /// Aperture proportional to the fracture size
    SizeDependent {
        /// Dimensionless multiplier applied to the fracture size
        multiplier: f64,
    },

    /// Elastic opening in response to the current effective normal stress
    ///
    /// `aperture = multiplier・max(0, σn')・size / E`: closed under compression,
    /// opening linearly with the tensile normal stress response.
    Dynamic {
        /// Dimensionless multiplier
        multiplier: f64,
    },

    /// Barton-Bandis joint closure law
    ///
    /// The initial aperture follows `E0 = JRC/5・(0.2・σc/JCS − 0.1)` (mm);
    /// closure under the net normal stress is hyperbolic,
    /// `ΔE = σn/(kni + σn/Vm)`, so the aperture is strictly decreasing in
    /// normal stress and bounded below by `E0 − Vm`.
    BartonBandis {
        /// Joint roughness coefficient
        jrc: f64,

        /// Ratio of unconfined compressive strength to joint wall compressive strength `σc/JCS`
        ucs_ratio: f64,

        /// Normal stress at which the aperture equals the initial aperture (Pa, ≥ 0)
        initial_normal_stress: f64,

        /// Initial joint normal stiffness kni (Pa/m)
        normal_stiffness: f64,

        /// Maximum joint closure Vm (m)
        maximum_closure: f64,
    },
}

impl ApertureModel {
    /// Returns the mean hydraulic aperture (m, ≥ 0)
    pub fn aperture(&self, ctx: &ApertureContext) -> f64 {
        match self {
            ApertureModel::Uniform { aperture } => f64::max(0.0, *aperture),
            ApertureModel::SizeDependent { multiplier } => f64::max(0.0, multiplier * ctx.fracture_size),
            ApertureModel::Dynamic { multiplier } => {
                let tensile = f64::max(0.0, ctx.effective_normal_stress);
                f64::max(0.0, multiplier * tensile * ctx.fracture_size / ctx.young_modulus)
            }
            ApertureModel::BartonBandis {
                jrc,
                ucs_ratio,
                initial_normal_stress,
                normal_stiffness,
                maximum_closure,
            } => {
                // initial aperture in mm, converted to m
                let e0 = f64::max(0.0, jrc / 5.0 * (0.2 * ucs_ratio - 0.1)) * 1e-3;
                let compression = f64::max(0.0, -ctx.effective_normal_stress);
                let net = f64::max(0.0, compression - initial_normal_stress);
                let closure = if *maximum_closure > 0.0 && *normal_stiffness > 0.0 {
                    net / (normal_stiffness + net / maximum_closure)
                } else {
                    0.0
                };
                f64::max(0.0, e0 - closure)
            }
        }
    }

    /// Returns the parallel-plate permeability `aperture²/12` (m²)
    pub fn permeability(aperture: f64) -> f64 {
        aperture * aperture / 12.0
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{ApertureContext, ApertureModel};
    use russell_chk::assert_approx_eq;

    fn ctx(normal_stress: f64) -> ApertureContext {
        ApertureContext {
            layer_thickness: 10.0,
            fracture_size: 5.0,
            effective_normal_stress: normal_stress,
            young_modulus: 10e9,
        }
    }

    #[test]
    fn uniform_and_size_dependent_work() {
        let uniform = ApertureModel::Uniform { aperture: 2e-4 };
        assert_eq!(uniform.aperture(&ctx(-1e6)), 2e-4);
        let sized = ApertureModel::SizeDependent { multiplier: 1e-4 };
        assert_approx_eq!(sized.aperture(&ctx(-1e6)), 5e-4, 1e-15);
    }

    #[test]
    fn dynamic_closes_under_compression() {
        let dynamic = ApertureModel::Dynamic { multiplier: 2.0 };
        assert_eq!(dynamic.aperture(&ctx(-1e6)), 0.0);
        // tensile 1 MPa: 2・1e6・5/10e9 = 1e-3
        assert_approx_eq!(dynamic.aperture(&ctx(1e6)), 1e-3, 1e-15);
    }

    #[test]
    fn barton_bandis_is_decreasing_and_bounded() {
        let model = ApertureModel::BartonBandis {
            jrc: 10.0,
            ucs_ratio: 2.0,
            initial_normal_stress: 0.0,
            normal_stiffness: 1e10,
            maximum_closure: 3e-4,
        };
        // E0 = 10/5・(0.4−0.1) mm = 0.6 mm
        let e0 = model.aperture(&ctx(0.0));
        assert_approx_eq!(e0, 6e-4, 1e-15);
        // strictly decreasing in applied compression
        let mut previous = e0;
        for stress in [-1e6, -5e6, -20e6, -100e6, -500e6] {
            let a = model.aperture(&ctx(stress));
            assert!(a < previous);
            // bounded below by E0 − Vm
            assert!(a >= 6e-4 - 3e-4);
            previous = a;
        }
    }

    #[test]
    fn permeability_follows_parallel_plates() {
        assert_approx_eq!(ApertureModel::permeability(1e-4), 1e-8 / 12.0, 1e-24);
    }
}
