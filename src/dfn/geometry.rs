use crate::fracture::ApertureModel;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Defines the connection state of one macrofracture tip
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub enum TipState {
    /// The tip is still free (propagating or frozen mid-cell)
    Unconnected,

    /// The tip stopped in the stress shadow of a sub-parallel fracture
    Relay,

    /// The tip abuts another fracture or a faulted boundary
    Connected,
}

/// Holds one explicit microfracture as a penny-shaped disc
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Microfracture {
    /// Disc center (x, y, z with z the burial depth)
    pub center: [f64; 3],

    /// Disc radius (m)
    pub radius: f64,

    /// Unit normal of the disc plane
    pub normal: [f64; 3],
}

impl Microfracture {
    /// Returns the disc discretized as a regular polygon with n vertices
    pub fn polygon(&self, n_vertices: usize) -> Vec<[f64; 3]> {
        let (u, v) = plane_basis(&self.normal);
        let n = n_vertices.max(3);
        let mut out = Vec::with_capacity(n);
        for k in 0..n {
            let theta = 2.0 * PI * k as f64 / n as f64;
            let (sin_t, cos_t) = theta.sin_cos();
            out.push([
                self.center[0] + self.radius * (cos_t * u[0] + sin_t * v[0]),
                self.center[1] + self.radius * (cos_t * u[1] + sin_t * v[1]),
                self.center[2] + self.radius * (cos_t * u[2] + sin_t * v[2]),
            ]);
        }
        out
    }

    /// Returns the disc area (m²)
    pub fn area(&self) -> f64 {
        PI * self.radius * self.radius
    }
}

/// Holds one planar segment of a macrofracture
///
/// A segment is a quadrilateral spanning the layer from top to bottom, or a
/// triangle tapering to the tip of a still-propagating fracture. Corners are
/// ordered counterclockwise seen from the positive-normal side.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct MacrofractureSegment {
    /// Corner coordinates (4 for a quadrilateral, 3 for a triangle)
    pub corners: Vec<[f64; 3]>,

    /// Set when cropping reduced the segment to zero strike length
    pub zero_length: bool,

    /// Hydraulic aperture (m)
    pub aperture: f64,
}

impl MacrofractureSegment {
    /// Returns the segment area from the corner polygon (m²)
    pub fn area(&self) -> f64 {
        if self.corners.len() < 3 {
            return 0.0;
        }
        // fan triangulation about the first corner
        let a = self.corners[0];
        let mut sum = [0.0; 3];
        for k in 1..self.corners.len() - 1 {
            let (b, c) = (self.corners[k], self.corners[k + 1]);
            let ab = [b[0] - a[0], b[1] - a[1], b[2] - a[2]];
            let ac = [c[0] - a[0], c[1] - a[1], c[2] - a[2]];
            sum[0] += ab[1] * ac[2] - ab[2] * ac[1];
            sum[1] += ab[2] * ac[0] - ab[0] * ac[2];
            sum[2] += ab[0] * ac[1] - ab[1] * ac[0];
        }
        0.5 * f64::sqrt(sum[0] * sum[0] + sum[1] * sum[1] + sum[2] * sum[2])
    }

    /// Returns the parallel-plate permeability of the segment (m²)
    pub fn permeability(&self) -> f64 {
        ApertureModel::permeability(self.aperture)
    }
}

/// Holds one explicit macrofracture as two segment lists growing from the nucleation point
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Macrofracture {
    /// Index of the fracture set this fracture belongs to
    pub set_index: usize,

    /// Nucleation point (x, y, z)
    pub nucleation: [f64; 3],

    /// Segments on the positive strike side, ordered outward from the nucleation point
    pub segments_plus: Vec<MacrofractureSegment>,

    /// Segments on the negative strike side, ordered outward from the nucleation point
    pub segments_minus: Vec<MacrofractureSegment>,

    /// Connection state of the positive-side tip
    pub tip_plus: TipState,

    /// Connection state of the negative-side tip
    pub tip_minus: TipState,

    /// Mid-layer centerline polyline, populated on request only
    pub centerline: Option<Vec<[f64; 3]>>,
}

impl Macrofracture {
    /// Returns the total fracture area over both segment lists (m²)
    pub fn area(&self) -> f64 {
        self.segments_plus.iter().map(|s| s.area()).sum::<f64>()
            + self.segments_minus.iter().map(|s| s.area()).sum::<f64>()
    }

    /// Returns the number of tips that are connected or in a relay
    pub fn n_linked_tips(&self) -> usize {
        [self.tip_plus, self.tip_minus]
            .iter()
            .filter(|t| **t != TipState::Unconnected)
            .count()
    }
}

/// Holds one snapshot of the explicit fracture network at a generation stage
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct GlobalDfn {
    /// Snapshot time (s)
    pub time: f64,

    /// Explicit microfracture discs
    pub microfractures: Vec<Microfracture>,

    /// Explicit macrofractures
    pub macrofractures: Vec<Macrofracture>,
}

impl GlobalDfn {
    /// Returns the total fracture area of the network (m²)
    pub fn total_area(&self) -> f64 {
        self.microfractures.iter().map(|m| m.area()).sum::<f64>()
            + self.macrofractures.iter().map(|m| m.area()).sum::<f64>()
    }

    /// Returns the fraction of macrofracture tips that are connected or in a relay
    pub fn connectivity_index(&self) -> f64 {
        let n_tips = 2 * self.macrofractures.len();
        if n_tips == 0 {
            return 0.0;
        }
        let linked: usize = self.macrofractures.iter().map(|m| m.n_linked_tips()).sum();
        linked as f64 / n_tips as f64
    }
}

/// Returns an orthonormal basis (u, v) of the plane with the given unit normal
pub(crate) fn plane_basis(normal: &[f64; 3]) -> ([f64; 3], [f64; 3]) {
    // pick the axis least aligned with the normal to avoid degeneracy
    let helper = if normal[2].abs() < 0.9 {
        [0.0, 0.0, 1.0]
    } else {
        [1.0, 0.0, 0.0]
    };
    let mut u = [
        helper[1] * normal[2] - helper[2] * normal[1],
        helper[2] * normal[0] - helper[0] * normal[2],
        helper[0] * normal[1] - helper[1] * normal[0],
    ];
    let norm = f64::sqrt(u[0] * u[0] + u[1] * u[1] + u[2] * u[2]);
    for value in &mut u {
        *value /= norm;
    }
    let v = [
        normal[1] * u[2] - normal[2] * u[1],
        normal[2] * u[0] - normal[0] * u[2],
        normal[0] * u[1] - normal[1] * u[0],
    ];
    (u, v)
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
