use crate::StrError;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Holds one Lagrangian radius bin of the microfracture population
#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
pub struct MicroBin {
    /// Current representative radius (m); grows with the bin
    pub radius: f64,

    /// Number of microfractures per unit volume in the bin (1/m³)
    pub density: f64,
}

/// Holds the radius-binned microfracture population of one dip set
///
/// # Notes
///
/// * The initial population follows a power-law size distribution with
///   cumulative density `N(r ≥ R) = B・R^(−c)` truncated to
///   `r_min ≤ R < r_max`
/// * Bins are Lagrangian: each bin keeps its density and its representative
///   radius is advected by the subcritical propagation velocity; density that
///   reaches `r_max` (half the layer thickness) leaves the population as
///   macrofracture nucleation flux
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct MicrofracturePopulation {
    /// Radius bins in increasing radius order
    bins: Vec<MicroBin>,

    /// Radius at which a microfracture becomes a macrofracture (m)
    r_max: f64,
}

impl MicrofracturePopulation {
    /// Allocates a new instance from a truncated power-law size distribution
    ///
    /// # Input
    ///
    /// * `initial_density` -- density coefficient B (1/m³); 0 gives an empty population
    /// * `size_exponent` -- power-law exponent c (> 0)
    /// * `r_min` -- smallest tracked radius (m, > 0)
    /// * `r_max` -- conversion radius, normally half the layer thickness (m, > r_min)
    /// * `n_bins` -- number of log-spaced radius bins (≥ 2)
    pub fn new(
        initial_density: f64,
        size_exponent: f64,
        r_min: f64,
        r_max: f64,
        n_bins: usize,
    ) -> Result<Self, StrError> {
        if initial_density < 0.0 {
            return Err("the initial microfracture density must be ≥ 0.0");
        }
        if size_exponent <= 0.0 {
            return Err("the microfracture size exponent must be > 0.0");
        }
        if r_min <= 0.0 || r_max <= r_min {
            return Err("the microfracture radius range must satisfy 0 < r_min < r_max");
        }
        if n_bins < 2 {
            return Err("the microfracture population needs at least 2 radius bins");
        }
        let ratio = f64::powf(r_max / r_min, 1.0 / n_bins as f64);
        let mut bins = Vec::with_capacity(n_bins);
        for k in 0..n_bins {
            let r_lo = r_min * ratio.powi(k as i32);
            let r_hi = r_min * ratio.powi(k as i32 + 1);
            // density between the bin edges from the cumulative power law
            let density = initial_density * (f64::powf(r_lo, -size_exponent) - f64::powf(r_hi, -size_exponent));
            bins.push(MicroBin {
                radius: f64::sqrt(r_lo * r_hi),
                density,
            });
        }
        Ok(MicrofracturePopulation { bins, r_max })
    }

    /// Returns the microfracture area density P32 = Σ n・π・r² (1/m)
    pub fn p32(&self) -> f64 {
        self.bins.iter().map(|b| b.density * PI * b.radius * b.radius).sum()
    }

    /// Returns the total number density (1/m³)
    pub fn p30(&self) -> f64 {
        self.bins.iter().map(|b| b.density).sum()
    }

    /// Returns the number density of microfractures with radius ≥ r (1/m³)
    pub fn density_above(&self, r: f64) -> f64 {
        self.bins.iter().filter(|b| b.radius >= r).map(|b| b.density).sum()
    }

    /// Returns the radius bins
    pub fn bins(&self) -> &[MicroBin] {
        &self.bins
    }

    /// Advances all bins by one timestep and returns the macrofracture nucleation flux
    ///
    /// # Input
    ///
    /// * `velocity` -- subcritical propagation velocity as a function of radius (m/s)
    /// * `dt` -- timestep (s)
    /// * `clear_fraction` -- fraction of the cell outside stress shadows;
    ///   growth only happens in the clear zone
    ///
    /// # Output
    ///
    /// Returns the number density (1/m³) of microfractures whose radius
    /// crossed `r_max` during the step.
    pub fn advance(&mut self, velocity: impl Fn(f64) -> f64, dt: f64, clear_fraction: f64) -> f64 {
        let mut nucleated = 0.0;
        for bin in &mut self.bins {
            if bin.density == 0.0 && bin.radius >= self.r_max {
                continue;
            }
            bin.radius += clear_fraction * velocity(bin.radius) * dt;
            if bin.radius >= self.r_max {
                bin.radius = self.r_max;
                nucleated += bin.density;
                bin.density = 0.0;
            }
        }
        nucleated
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::MicrofracturePopulation;
    use crate::StrError;
    use russell_chk::assert_approx_eq;

    #[test]
    fn new_handles_wrong_input() {
        assert_eq!(
            MicrofracturePopulation::new(-1.0, 2.0, 1e-3, 1.0, 10).err(),
            Some("the initial microfracture density must be ≥ 0.0")
        );
        assert_eq!(
            MicrofracturePopulation::new(1.0, 0.0, 1e-3, 1.0, 10).err(),
            Some("the microfracture size exponent must be > 0.0")
        );
        assert_eq!(
            MicrofracturePopulation::new(1.0, 2.0, 1.0, 0.5, 10).err(),
            Some("the microfracture radius range must satisfy 0 < r_min < r_max")
        );
        assert_eq!(
            MicrofracturePopulation::new(1.0, 2.0, 1e-3, 1.0, 1).err(),
            Some("the microfracture population needs at least 2 radius bins")
        );
    }

    #[test]
    fn initial_distribution_matches_power_law() -> Result<(), StrError> {
        let (b, c) = (0.01, 2.0);
        let population = MicrofracturePopulation::new(b, c, 0.01, 1.0, 50)?;
        // total number density = B(r_min^−c − r_max^−c)
        let expected = b * (f64::powf(0.01, -c) - f64::powf(1.0, -c));
        assert_approx_eq!(population.p30(), expected, expected * 1e-12);
        assert!(population.p32() > 0.0);
        // zero B gives an empty population
        let empty = MicrofracturePopulation::new(0.0, c, 0.01, 1.0, 50)?;
        assert_eq!(empty.p30(), 0.0);
        assert_eq!(empty.p32(), 0.0);
        Ok(())
    }

    #[test]
    fn advance_converts_large_bins_to_nucleation_flux() -> Result<(), StrError> {
        let mut population = MicrofracturePopulation::new(0.01, 2.0, 0.1, 1.0, 5)?;
        let p30_before = population.p30();
        // a fast constant velocity pushes every bin past r_max in one step
        let nucleated = population.advance(|_| 1.0, 10.0, 1.0);
        assert_approx_eq!(nucleated, p30_before, p30_before * 1e-12);
        assert_eq!(population.p30(), 0.0);
        // a second step produces no further flux
        assert_eq!(population.advance(|_| 1.0, 10.0, 1.0), 0.0);
        Ok(())
    }

    #[test]
    fn zero_velocity_freezes_the_population() -> Result<(), StrError> {
        let mut population = MicrofracturePopulation::new(0.01, 2.0, 0.1, 1.0, 5)?;
        let p32_before = population.p32();
        let nucleated = population.advance(|_| 0.0, 1e6, 1.0);
        assert_eq!(nucleated, 0.0);
        assert_approx_eq!(population.p32(), p32_before, 1e-15);
        Ok(())
    }
}
