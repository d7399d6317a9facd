use super::{DipSetStatus, FractureDipSet};
use crate::base::PropagationControl;
use crate::StrError;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Aggregates the dip sets sharing one strike azimuth
///
/// A vertical fracture set holds a single dip set; a non-vertical set holds
/// a biazimuthal conjugate pair (opposite dip directions) which, under a
/// stress state without vertical shear on the strike plane, grows with equal
/// population on both partners.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct FractureSet {
    /// Strike azimuth (radians counterclockwise from the grid x axis)
    pub strike: f64,

    /// One dip set (vertical) or two conjugate dip sets
    pub dip_sets: Vec<FractureDipSet>,
}

impl FractureSet {
    /// Allocates a vertical fracture set with a single dip set
    pub fn new_vertical(
        strike: f64,
        layer_thickness: f64,
        initial_micro_density: f64,
        size_exponent: f64,
        control: &PropagationControl,
    ) -> Result<Self, StrError> {
        let dip_set = FractureDipSet::new(
            strike,
            PI / 2.0,
            1.0,
            layer_thickness,
            initial_micro_density,
            size_exponent,
            control,
        )?;
        Ok(FractureSet {
            strike,
            dip_sets: vec![dip_set],
        })
    }

    /// Allocates a non-vertical set as a biazimuthal conjugate pair
    ///
    /// The seed microfracture density is split evenly between the partners.
    pub fn new_conjugate(
        strike: f64,
        dip: f64,
        layer_thickness: f64,
        initial_micro_density: f64,
        size_exponent: f64,
        control: &PropagationControl,
    ) -> Result<Self, StrError> {
        let half = initial_micro_density / 2.0;
        let plus = FractureDipSet::new(strike, dip, 1.0, layer_thickness, half, size_exponent, control)?;
        let minus = FractureDipSet::new(strike, dip, -1.0, layer_thickness, half, size_exponent, control)?;
        Ok(FractureSet {
            strike,
            dip_sets: vec![plus, minus],
        })
    }

    /// Returns the total macrofracture number density over all dip sets (1/m³)
    pub fn total_mfp30(&self) -> f64 {
        self.dip_sets.iter().map(|d| d.total_mfp30()).sum()
    }

    /// Returns the total macrofracture area density over all dip sets (1/m)
    pub fn total_mfp32(&self) -> f64 {
        self.dip_sets.iter().map(|d| d.total_mfp32()).sum()
    }

    /// Returns the total macrofracture volume fraction over all dip sets
    pub fn total_mfp33(&self, control: &PropagationControl) -> f64 {
        self.dip_sets.iter().map(|d| d.total_mfp33(control)).sum()
    }

    /// Returns the microfracture area density over all dip sets (1/m)
    pub fn micro_p32(&self) -> f64 {
        self.dip_sets.iter().map(|d| d.micro_p32()).sum()
    }

    /// Returns the fracture porosity over all dip sets at the implicit aperture
    pub fn porosity(&self, control: &PropagationControl) -> f64 {
        (self.micro_p32() + self.total_mfp32()) * control.implicit_aperture
    }

    /// Returns whether every dip set has reached the terminal state
    pub fn is_terminated(&self) -> bool {
        self.dip_sets.iter().all(|d| d.status() == DipSetStatus::Terminated)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::FractureSet;
    use crate::base::PropagationControl;
    use crate::StrError;
    use russell_chk::assert_approx_eq;
    use std::f64::consts::PI;

    #[test]
    fn vertical_and_conjugate_layouts_work() -> Result<(), StrError> {
        let control = PropagationControl::new();
        let vertical = FractureSet::new_vertical(0.5, 10.0, 0.01, 2.0, &control)?;
        assert_eq!(vertical.dip_sets.len(), 1);
        assert_approx_eq!(vertical.dip_sets[0].dip(), PI / 2.0, 1e-15);
        let conjugate = FractureSet::new_conjugate(0.5, PI / 3.0, 10.0, 0.01, 2.0, &control)?;
        assert_eq!(conjugate.dip_sets.len(), 2);
        assert_eq!(conjugate.dip_sets[0].dip_sign(), 1.0);
        assert_eq!(conjugate.dip_sets[1].dip_sign(), -1.0);
        // the conjugate pair carries the same seed density as a whole
        assert_approx_eq!(
            conjugate.micro_p32(),
            vertical.micro_p32(),
            vertical.micro_p32() * 1e-12
        );
        assert!(!vertical.is_terminated());
        Ok(())
    }
}
