use super::{voigt_index, Tensor2};
use crate::StrError;
use serde::{Deserialize, Serialize};

/// Tolerance to detect a singular pivot during 6×6 inversion
pub const TENSOR4_MIN_PIVOT: f64 = 1e-300;

/// Implements a symmetric fourth-order tensor as a 6×6 Voigt matrix
///
/// # Notes
///
/// * Used for both the compliance tensor S (strain from stress) and the
///   stiffness tensor C (stress from strain); `C = S⁻¹`
/// * The engineering-shear convention applies: the matrix acts on stress
///   vectors directly and on strain vectors with doubled shear entries,
///   so the plain 6×6 matrix inverse relates S and C exactly
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Tensor4 {
    /// Components as a 6×6 matrix in Voigt order [XX, YY, ZZ, XY, YZ, ZX]
    pub mat: [[f64; 6]; 6],
}

impl Tensor4 {
    /// Allocates a new zeroed instance
    pub fn new() -> Self {
        Tensor4 { mat: [[0.0; 6]; 6] }
    }

    /// Allocates the isotropic compliance tensor from Young's modulus and Poisson's ratio
    pub fn isotropic_compliance(young: f64, poisson: f64) -> Result<Self, StrError> {
        if young <= 0.0 {
            return Err("Young's modulus must be > 0.0 to build a compliance tensor");
        }
        let mut tt = Tensor4::new();
        let g = 2.0 * (1.0 + poisson) / young;
        for i in 0..3 {
            for j in 0..3 {
                tt.mat[i][j] = if i == j { 1.0 / young } else { -poisson / young };
            }
            tt.mat[3 + i][3 + i] = g;
        }
        Ok(tt)
    }

    /// Returns the (i,j,k,l) tensor component
    pub fn get(&self, i: usize, j: usize, k: usize, l: usize) -> f64 {
        self.mat[voigt_index(i, j)][voigt_index(k, l)]
    }

    /// Performs self += alpha・other
    pub fn add(&mut self, alpha: f64, other: &Tensor4) {
        for p in 0..6 {
            for q in 0..6 {
                self.mat[p][q] += alpha * other.mat[p][q];
            }
        }
    }

    /// Computes the inverse by Gauss-Jordan elimination with partial pivoting
    pub fn inverse(&self) -> Result<Tensor4, StrError> {
        let mut a = self.mat;
        let mut inv = [[0.0; 6]; 6];
        for p in 0..6 {
            inv[p][p] = 1.0;
        }
        for col in 0..6 {
            // pivot selection
            let mut pivot_row = col;
            for row in (col + 1)..6 {
                if a[row][col].abs() > a[pivot_row][col].abs() {
                    pivot_row = row;
                }
            }
            if a[pivot_row][col].abs() < TENSOR4_MIN_PIVOT {
                return Err("cannot invert singular fourth-order tensor");
            }
            a.swap(col, pivot_row);
            inv.swap(col, pivot_row);
            // normalize pivot row
            let pivot = a[col][col];
            for q in 0..6 {
                a[col][q] /= pivot;
                inv[col][q] /= pivot;
            }
            // eliminate
            for row in 0..6 {
                if row != col {
                    let factor = a[row][col];
                    if factor != 0.0 {
                        for q in 0..6 {
                            a[row][q] -= factor * a[col][q];
                            inv[row][q] -= factor * inv[col][q];
                        }
                    }
                }
            }
        }
        Ok(Tensor4 { mat: inv })
    }

    /// Computes the strain produced by a stress, treating self as a compliance tensor
    ///
    /// Returns a tensor holding **tensor** shear components (the engineering
    /// shears coming out of the Voigt product are halved)
    pub fn strain_from_stress(&self, sigma: &Tensor2) -> Tensor2 {
        let mut eps = Tensor2::new();
        for p in 0..6 {
            let mut sum = 0.0;
            for q in 0..6 {
                sum += self.mat[p][q] * sigma.vec[q];
            }
            eps.vec[p] = if p < 3 { sum } else { sum / 2.0 };
        }
        eps
    }

    /// Computes the stress produced by a strain, treating self as a stiffness tensor
    ///
    /// The input holds tensor shear components; they are doubled into
    /// engineering shears before the Voigt product
    pub fn stress_from_strain(&self, eps: &Tensor2) -> Tensor2 {
        let mut sigma = Tensor2::new();
        for p in 0..6 {
            let mut sum = 0.0;
            for q in 0..6 {
                let e = if q < 3 { eps.vec[q] } else { 2.0 * eps.vec[q] };
                sum += self.mat[p][q] * e;
            }
            sigma.vec[p] = sum;
        }
        sigma
    }

    /// Adds the extra compliance contributed by a population of parallel penny-shaped cracks
    ///
    /// # Input
    ///
    /// * `n` -- unit normal of the crack plane
    /// * `delta_n` -- additional normal compliance δN
    /// * `delta_t` -- additional shear compliance δT
    ///
    /// The added tensor is
    /// `ΔS_ijkl = (δN − δT)・ni・nj・nk・nl + δT/4・(δik・nj・nl + δil・nj・nk + δjk・ni・nl + δjl・ni・nk)`
    pub fn add_crack_compliance(&mut self, n: &[f64; 3], delta_n: f64, delta_t: f64) {
        const PAIRS: [(usize, usize); 6] = [(0, 0), (1, 1), (2, 2), (0, 1), (1, 2), (0, 2)];
        let kron = |i: usize, j: usize| if i == j { 1.0 } else { 0.0 };
        for p in 0..6 {
            let (i, j) = PAIRS[p];
            for q in 0..6 {
                let (k, l) = PAIRS[q];
                let ds = (delta_n - delta_t) * n[i] * n[j] * n[k] * n[l]
                    + delta_t / 4.0
                        * (kron(i, k) * n[j] * n[l]
                            + kron(i, l) * n[j] * n[k]
                            + kron(j, k) * n[i] * n[l]
                            + kron(j, l) * n[i] * n[k]);
                // engineering-shear weights for the Voigt compliance matrix
                let wp = if p >= 3 { 2.0 } else { 1.0 };
                let wq = if q >= 3 { 2.0 } else { 1.0 };
                let weight = wp * wq;
                self.mat[p][q] += weight * ds;
            }
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{Tensor2, Tensor4};
    use crate::StrError;
    use russell_chk::assert_approx_eq;

    #[test]
    fn isotropic_compliance_handles_wrong_input() {
        assert_eq!(
            Tensor4::isotropic_compliance(0.0, 0.25).err(),
            Some("Young's modulus must be > 0.0 to build a compliance tensor")
        );
    }

    #[test]
    fn inverse_recovers_compliance_and_stiffness() -> Result<(), StrError> {
        let (young, poisson) = (30e9, 0.25);
        let ss = Tensor4::isotropic_compliance(young, poisson)?;
        let cc = ss.inverse()?;
        // C₁₁ = E(1−ν)/((1+ν)(1−2ν)) for the isotropic stiffness
        let c11 = young * (1.0 - poisson) / ((1.0 + poisson) * (1.0 - 2.0 * poisson));
        let c12 = young * poisson / ((1.0 + poisson) * (1.0 - 2.0 * poisson));
        assert_approx_eq!(cc.mat[0][0], c11, c11 * 1e-12);
        assert_approx_eq!(cc.mat[0][1], c12, c12 * 1e-12);
        // round trip
        let ss_back = cc.inverse()?;
        for p in 0..6 {
            for q in 0..6 {
                assert_approx_eq!(ss_back.mat[p][q], ss.mat[p][q], 1e-12 / young);
            }
        }
        Ok(())
    }

    #[test]
    fn inverse_detects_singular_matrix() {
        let tt = Tensor4::new();
        assert_eq!(tt.inverse().err(), Some("cannot invert singular fourth-order tensor"));
    }

    #[test]
    fn strain_stress_products_are_consistent() -> Result<(), StrError> {
        let (young, poisson) = (10e9, 0.2);
        let ss = Tensor4::isotropic_compliance(young, poisson)?;
        let cc = ss.inverse()?;
        let sigma = Tensor2::from_components(-10e6, -5e6, -20e6, 1e6, -2e6, 0.5e6);
        let eps = ss.strain_from_stress(&sigma);
        // uniaxial check on the shear channel: εxy = (1+ν)/E・σxy
        assert_approx_eq!(eps.get(0, 1), (1.0 + poisson) / young * 1e6, 1e-12);
        let sigma_back = cc.stress_from_strain(&eps);
        for p in 0..6 {
            assert_approx_eq!(sigma_back.vec[p], sigma.vec[p], 1e-6);
        }
        Ok(())
    }

    #[test]
    fn crack_compliance_softens_normal_direction() -> Result<(), StrError> {
        let (young, poisson) = (30e9, 0.25);
        let mut ss = Tensor4::isotropic_compliance(young, poisson)?;
        let before = ss.mat[0][0];
        let (dn, dt) = (1e-11, 0.5e-11);
        ss.add_crack_compliance(&[1.0, 0.0, 0.0], dn, dt);
        assert_approx_eq!(ss.mat[0][0], before + dn, 1e-25);
        // plane containing the normal picks up the shear compliance
        let g_before = 2.0 * (1.0 + poisson) / young;
        assert_approx_eq!(ss.mat[3][3], g_before + dt, 1e-25);
        // the yy direction is unaffected
        assert_approx_eq!(ss.mat[1][1], 1.0 / young, 1e-25);
        Ok(())
    }
}
