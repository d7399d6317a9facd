use serde::{Deserialize, Serialize};

/// Maps a pair of tensor indices (i,j) to the Voigt position
///
/// The Voigt ordering is `[XX, YY, ZZ, XY, YZ, ZX]`
#[inline]
pub fn voigt_index(i: usize, j: usize) -> usize {
    match (i, j) {
        (0, 0) => 0,
        (1, 1) => 1,
        (2, 2) => 2,
        (0, 1) | (1, 0) => 3,
        (1, 2) | (2, 1) => 4,
        (0, 2) | (2, 0) => 5,
        _ => panic!("tensor indices must be in 0 ≤ i,j ≤ 2"),
    }
}

/// Implements a symmetric second-order tensor (stress, strain, or their rates)
///
/// # Notes
///
/// * The six independent components are stored in Voigt order
///   `[XX, YY, ZZ, XY, YZ, ZX]`
/// * Off-diagonal entries hold the **tensor** components (e.g., εxy),
///   not the engineering shear strains (γxy = 2・εxy)
/// * Sign convention follows continuum mechanics: compression is negative
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct Tensor2 {
    /// Components in Voigt order [XX, YY, ZZ, XY, YZ, ZX]
    pub vec: [f64; 6],
}

impl Tensor2 {
    /// Allocates a new zeroed instance
    pub fn new() -> Self {
        Tensor2 { vec: [0.0; 6] }
    }

    /// Allocates a new instance from the six independent components
    pub fn from_components(xx: f64, yy: f64, zz: f64, xy: f64, yz: f64, zx: f64) -> Self {
        Tensor2 {
            vec: [xx, yy, zz, xy, yz, zx],
        }
    }

    /// Allocates an isotropic tensor with the given diagonal value
    pub fn isotropic(value: f64) -> Self {
        Tensor2 {
            vec: [value, value, value, 0.0, 0.0, 0.0],
        }
    }

    /// Returns the (i,j) component
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.vec[voigt_index(i, j)]
    }

    /// Sets the (i,j) component (and its symmetric counterpart)
    pub fn set(&mut self, i: usize, j: usize, value: f64) {
        self.vec[voigt_index(i, j)] = value;
    }

    /// Performs self += alpha・other
    pub fn add(&mut self, alpha: f64, other: &Tensor2) {
        for p in 0..6 {
            self.vec[p] += alpha * other.vec[p];
        }
    }

    /// Performs self *= alpha
    pub fn scale(&mut self, alpha: f64) {
        for p in 0..6 {
            self.vec[p] *= alpha;
        }
    }

    /// Returns the trace `tr(σ) = σxx + σyy + σzz`
    pub fn trace(&self) -> f64 {
        self.vec[0] + self.vec[1] + self.vec[2]
    }

    /// Returns the mean (hydrostatic) value `tr(σ)/3`
    pub fn mean(&self) -> f64 {
        self.trace() / 3.0
    }

    /// Returns the traction vector `t = σ・n` for a plane with unit normal n
    pub fn traction(&self, n: &[f64; 3]) -> [f64; 3] {
        let mut t = [0.0; 3];
        for i in 0..3 {
            for j in 0..3 {
                t[i] += self.get(i, j) * n[j];
            }
        }
        t
    }

    /// Returns the normal component `σn = n・σ・n` on a plane with unit normal n
    pub fn normal_component(&self, n: &[f64; 3]) -> f64 {
        let t = self.traction(n);
        t[0] * n[0] + t[1] * n[1] + t[2] * n[2]
    }

    /// Returns the shear (tangential) magnitude `|σ・n − (n・σ・n)n|` on a plane
    pub fn shear_component(&self, n: &[f64; 3]) -> f64 {
        let t = self.traction(n);
        let sn = t[0] * n[0] + t[1] * n[1] + t[2] * n[2];
        let sx = t[0] - sn * n[0];
        let sy = t[1] - sn * n[1];
        let sz = t[2] - sn * n[2];
        f64::sqrt(sx * sx + sy * sy + sz * sz)
    }

    /// Returns a copy rotated by an angle θ (radians, counterclockwise) about the vertical axis
    ///
    /// Computes `σ' = R・σ・Rᵀ` with R the rotation matrix about z
    pub fn rotated_about_z(&self, theta: f64) -> Tensor2 {
        let (s, c) = theta.sin_cos();
        let r = [[c, -s, 0.0], [s, c, 0.0], [0.0, 0.0, 1.0]];
        let mut out = Tensor2::new();
        for i in 0..3 {
            for j in i..3 {
                let mut sum = 0.0;
                for k in 0..3 {
                    for l in 0..3 {
                        sum += r[i][k] * self.get(k, l) * r[j][l];
                    }
                }
                out.set(i, j, sum);
            }
        }
        out
    }

    /// Returns the largest absolute component
    pub fn max_abs(&self) -> f64 {
        self.vec.iter().fold(0.0, |acc, v| f64::max(acc, v.abs()))
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::Tensor2;
    use russell_chk::assert_approx_eq;
    use std::f64::consts::PI;

    #[test]
    fn get_set_and_symmetry_work() {
        let mut t = Tensor2::new();
        t.set(0, 1, 3.0);
        t.set(2, 2, -1.0);
        assert_eq!(t.get(1, 0), 3.0);
        assert_eq!(t.get(0, 1), 3.0);
        assert_eq!(t.get(2, 2), -1.0);
        assert_eq!(t.trace(), -1.0);
    }

    #[test]
    fn add_and_scale_work() {
        let mut a = Tensor2::from_components(1.0, 2.0, 3.0, 4.0, 5.0, 6.0);
        let b = Tensor2::isotropic(1.0);
        a.add(2.0, &b);
        assert_eq!(a.vec, [3.0, 4.0, 5.0, 4.0, 5.0, 6.0]);
        a.scale(0.5);
        assert_eq!(a.vec, [1.5, 2.0, 2.5, 2.0, 2.5, 3.0]);
        assert_approx_eq!(a.mean(), 2.0, 1e-15);
    }

    #[test]
    fn traction_and_resolved_components_work() {
        // uniaxial compression along x: σxx = -10
        let sigma = Tensor2::from_components(-10.0, 0.0, 0.0, 0.0, 0.0, 0.0);
        let n = [1.0, 0.0, 0.0];
        assert_approx_eq!(sigma.normal_component(&n), -10.0, 1e-15);
        assert_approx_eq!(sigma.shear_component(&n), 0.0, 1e-15);
        // plane at 45°: σn = -5, |τ| = 5
        let s = f64::sqrt(2.0) / 2.0;
        let n45 = [s, s, 0.0];
        assert_approx_eq!(sigma.normal_component(&n45), -5.0, 1e-14);
        assert_approx_eq!(sigma.shear_component(&n45), 5.0, 1e-14);
    }

    #[test]
    fn rotation_about_z_works() {
        // rotating uniaxial σxx by 90° must move it onto yy
        let sigma = Tensor2::from_components(-10.0, 0.0, 0.0, 0.0, 0.0, 0.0);
        let rot = sigma.rotated_about_z(PI / 2.0);
        assert_approx_eq!(rot.get(0, 0), 0.0, 1e-14);
        assert_approx_eq!(rot.get(1, 1), -10.0, 1e-14);
        assert_approx_eq!(rot.get(2, 2), 0.0, 1e-15);
        // rotation preserves the trace
        let full = Tensor2::from_components(-1.0, -2.0, -3.0, 0.5, 0.25, 0.125);
        let rot = full.rotated_about_z(0.3);
        assert_approx_eq!(rot.trace(), full.trace(), 1e-14);
    }
}
