use crate::StrError;
use serde::{Deserialize, Serialize};

/// Holds the eight corner points of a gridblock
///
/// # Notes
///
/// * Corners are ordered SW, NW, NE, SE, first the top face then the bottom
/// * Coordinates are (x, y, z) with z the burial depth, positive downwards,
///   so the top face has the smaller z values
#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
pub struct CornerPoints {
    /// Corner coordinates: indices 0-3 top (SW, NW, NE, SE), 4-7 bottom
    pub corners: [[f64; 3]; 8],
}

impl CornerPoints {
    /// Allocates a new instance from the top and bottom faces
    pub fn new(top: [[f64; 3]; 4], bottom: [[f64; 3]; 4]) -> Result<Self, StrError> {
        let cp = CornerPoints {
            corners: [
                top[0], top[1], top[2], top[3], bottom[0], bottom[1], bottom[2], bottom[3],
            ],
        };
        if cp.thickness() <= 0.0 {
            return Err("the bottom face must lie below the top face");
        }
        if cp.footprint_area() <= 0.0 {
            return Err("the gridblock footprint is degenerate");
        }
        Ok(cp)
    }

    /// Allocates an axis-aligned box cell
    pub fn new_box(x0: f64, y0: f64, x1: f64, y1: f64, z_top: f64, z_bottom: f64) -> Result<Self, StrError> {
        if x1 <= x0 || y1 <= y0 {
            return Err("the box extents must satisfy x0 < x1 and y0 < y1");
        }
        CornerPoints::new(
            [
                [x0, y0, z_top],
                [x0, y1, z_top],
                [x1, y1, z_top],
                [x1, y0, z_top],
            ],
            [
                [x0, y0, z_bottom],
                [x0, y1, z_bottom],
                [x1, y1, z_bottom],
                [x1, y0, z_bottom],
            ],
        )
    }

    /// Returns the mean layer thickness (m)
    pub fn thickness(&self) -> f64 {
        let top: f64 = (0..4).map(|k| self.corners[k][2]).sum::<f64>() / 4.0;
        let bottom: f64 = (4..8).map(|k| self.corners[k][2]).sum::<f64>() / 4.0;
        bottom - top
    }

    /// Returns the mean burial depth of the cell center (m)
    pub fn mean_depth(&self) -> f64 {
        self.corners.iter().map(|c| c[2]).sum::<f64>() / 8.0
    }

    /// Returns the horizontal footprint area by the shoelace formula (m²)
    pub fn footprint_area(&self) -> f64 {
        let quad = self.mid_footprint();
        let mut sum = 0.0;
        for k in 0..4 {
            let (a, b) = (quad[k], quad[(k + 1) % 4]);
            sum += a[0] * b[1] - b[0] * a[1];
        }
        0.5 * sum.abs()
    }

    /// Returns the cell volume (m³)
    pub fn volume(&self) -> f64 {
        self.footprint_area() * self.thickness()
    }

    /// Returns the cell center (x, y, z)
    pub fn center(&self) -> [f64; 3] {
        let mut c = [0.0; 3];
        for corner in &self.corners {
            for i in 0..3 {
                c[i] += corner[i] / 8.0;
            }
        }
        c
    }

    /// Returns the footprint corners at mid-layer depth (SW, NW, NE, SE)
    pub fn mid_footprint(&self) -> [[f64; 2]; 4] {
        let mut quad = [[0.0; 2]; 4];
        for k in 0..4 {
            quad[k][0] = 0.5 * (self.corners[k][0] + self.corners[k + 4][0]);
            quad[k][1] = 0.5 * (self.corners[k][1] + self.corners[k + 4][1]);
        }
        quad
    }

    /// Returns a point inside the footprint by bilinear interpolation of (u, v) in [0,1]²
    pub fn footprint_point(&self, u: f64, v: f64) -> [f64; 2] {
        let quad = self.mid_footprint();
        let (sw, nw, ne, se) = (quad[0], quad[1], quad[2], quad[3]);
        let mut p = [0.0; 2];
        for i in 0..2 {
            let south = sw[i] + (se[i] - sw[i]) * u;
            let north = nw[i] + (ne[i] - nw[i]) * u;
            p[i] = south + (north - south) * v;
        }
        p
    }

    /// Returns the distance from a point to the footprint boundary along a direction
    ///
    /// # Output
    ///
    /// Returns `(distance, edge)` where edge is 0 = west, 1 = north, 2 = east,
    /// 3 = south, or an error when the ray never leaves the footprint
    /// (degenerate geometry or zero direction).
    pub fn exit_distance(&self, from: &[f64; 2], direction: &[f64; 2]) -> Result<(f64, usize), StrError> {
        let norm = f64::sqrt(direction[0] * direction[0] + direction[1] * direction[1]);
        if norm == 0.0 {
            return Err("the ray direction must be non-zero");
        }
        let d = [direction[0] / norm, direction[1] / norm];
        let quad = self.mid_footprint();
        // edges in corner order: SW-NW = west, NW-NE = north, NE-SE = east, SE-SW = south
        let mut best: Option<(f64, usize)> = None;
        for k in 0..4 {
            let (a, b) = (quad[k], quad[(k + 1) % 4]);
            let e = [b[0] - a[0], b[1] - a[1]];
            let denominator = d[0] * (-e[1]) - d[1] * (-e[0]);
            if denominator.abs() < 1e-30 {
                continue; // parallel to the edge
            }
            let (fx, fy) = (a[0] - from[0], a[1] - from[1]);
            let t = (fx * (-e[1]) - fy * (-e[0])) / denominator;
            let s = (d[0] * fy - d[1] * fx) / denominator;
            if t > 1e-9 && s >= -1e-9 && s <= 1.0 + 1e-9 {
                if best.map_or(true, |(bt, _)| t < bt) {
                    best = Some((t, k));
                }
            }
        }
        best.ok_or("the ray does not reach the footprint boundary")
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::CornerPoints;
    use crate::StrError;
    use russell_chk::assert_approx_eq;

    #[test]
    fn new_handles_wrong_input() {
        assert_eq!(
            CornerPoints::new_box(0.0, 0.0, 100.0, 100.0, 2000.0, 1990.0).err(),
            Some("the bottom face must lie below the top face")
        );
        assert_eq!(
            CornerPoints::new_box(0.0, 0.0, 0.0, 100.0, 1990.0, 2000.0).err(),
            Some("the box extents must satisfy x0 < x1 and y0 < y1")
        );
    }

    #[test]
    fn measures_work_for_a_box() -> Result<(), StrError> {
        let cp = CornerPoints::new_box(0.0, 0.0, 200.0, 100.0, 1990.0, 2000.0)?;
        assert_approx_eq!(cp.thickness(), 10.0, 1e-12);
        assert_approx_eq!(cp.footprint_area(), 20000.0, 1e-9);
        assert_approx_eq!(cp.volume(), 200000.0, 1e-9);
        assert_approx_eq!(cp.mean_depth(), 1995.0, 1e-12);
        let center = cp.center();
        assert_approx_eq!(center[0], 100.0, 1e-12);
        assert_approx_eq!(center[1], 50.0, 1e-12);
        Ok(())
    }

    #[test]
    fn footprint_point_interpolates_bilinearly() -> Result<(), StrError> {
        let cp = CornerPoints::new_box(0.0, 0.0, 100.0, 100.0, 1990.0, 2000.0)?;
        let p = cp.footprint_point(0.5, 0.5);
        assert_approx_eq!(p[0], 50.0, 1e-12);
        assert_approx_eq!(p[1], 50.0, 1e-12);
        let corner = cp.footprint_point(0.0, 0.0);
        assert_approx_eq!(corner[0], 0.0, 1e-12);
        assert_approx_eq!(corner[1], 0.0, 1e-12);
        Ok(())
    }

    #[test]
    fn exit_distance_finds_the_right_edge() -> Result<(), StrError> {
        let cp = CornerPoints::new_box(0.0, 0.0, 100.0, 100.0, 1990.0, 2000.0)?;
        // from the center heading east
        let (t, edge) = cp.exit_distance(&[50.0, 50.0], &[1.0, 0.0])?;
        assert_approx_eq!(t, 50.0, 1e-9);
        assert_eq!(edge, 2);
        // heading west
        let (t, edge) = cp.exit_distance(&[50.0, 50.0], &[-1.0, 0.0])?;
        assert_approx_eq!(t, 50.0, 1e-9);
        assert_eq!(edge, 0);
        // heading north
        let (_, edge) = cp.exit_distance(&[50.0, 50.0], &[0.0, 1.0])?;
        assert_eq!(edge, 1);
        assert_eq!(
            cp.exit_distance(&[50.0, 50.0], &[0.0, 0.0]).err(),
            Some("the ray direction must be non-zero")
        );
        Ok(())
    }
}
