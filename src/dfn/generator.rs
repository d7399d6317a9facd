use super::{GlobalDfn, Macrofracture, MacrofractureSegment, Microfracture, TipState};
use crate::base::{ProgressMonitor, PropagationControl};
use crate::fracture::{ApertureContext, ApertureModel, FractureDipSet, TimestepRecord};
use crate::grid::{FractureGrid, Gridblock};
use crate::StrError;
use log::warn;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Safety cap on the number of explicit objects drawn per dip set and stage
const DFN_MAX_OBJECTS_PER_SET: usize = 100_000;

/// Defines how the network snapshot times are selected
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub enum StageSelection {
    /// A fixed number of stages equally spaced in time over the recorded run
    EqualDuration(usize),

    /// A fixed number of stages equally spaced in cumulative macrofracture area
    EqualArea(usize),

    /// One stage at the end of every deformation episode
    EpisodeBoundaries,

    /// Explicit stage times in seconds
    SpecifiedTimes(Vec<f64>),
}

/// Holds the options controlling explicit DFN generation
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct DfnGenerationConfig {
    /// Selection of the intermediate network snapshot times
    pub stages: StageSelection,

    /// Smallest microfracture radius drawn explicitly (m; ≤ 0 keeps all microfractures implicit)
    pub min_explicit_radius: f64,

    /// Represents the outermost segment of a still-propagating tip as a triangle
    pub triangular_segments: bool,

    /// Largest strike difference (radians) across which a fracture continues into the neighbor cell
    pub max_consistency_angle: f64,

    /// Crops fractures at the footprint boundary of their cell column
    pub crop_at_boundary: bool,

    /// Adds an explicit linking segment at every relay tip
    pub link_stress_shadows: bool,

    /// Stores the mid-layer centerline polyline of every macrofracture
    pub generate_centerlines: bool,

    /// Number of vertices of a microfracture disc polygon
    pub n_polygon_vertices: usize,

    /// Aperture model applied to every explicit fracture
    pub aperture_model: ApertureModel,

    /// Base seed of the per-cell random generators
    pub random_seed: u64,
}

impl DfnGenerationConfig {
    /// Allocates a new instance with default values
    pub fn new() -> Self {
        DfnGenerationConfig {
            stages: StageSelection::EqualDuration(1),
            min_explicit_radius: -1.0,
            triangular_segments: false,
            max_consistency_angle: PI / 4.0,
            crop_at_boundary: true,
            link_stress_shadows: false,
            generate_centerlines: false,
            n_polygon_vertices: 16,
            aperture_model: ApertureModel::Uniform { aperture: 1e-4 },
            random_seed: 14014,
        }
    }

    /// Sets a fixed number of equal-duration network snapshots
    pub fn set_n_stages(&mut self, value: usize) -> Result<&mut Self, StrError> {
        self.set_stage_selection(StageSelection::EqualDuration(value))
    }

    /// Sets the stage selection mode
    pub fn set_stage_selection(&mut self, stages: StageSelection) -> Result<&mut Self, StrError> {
        match &stages {
            StageSelection::EqualDuration(n) | StageSelection::EqualArea(n) => {
                if *n < 1 {
                    return Err("the number of generation stages must be ≥ 1");
                }
            }
            StageSelection::SpecifiedTimes(times) => {
                if times.is_empty() {
                    return Err("the stage time list must not be empty");
                }
                if times[0] <= 0.0 || times.windows(2).any(|pair| pair[1] <= pair[0]) {
                    return Err("the stage times must be positive and increasing");
                }
            }
            StageSelection::EpisodeBoundaries => (),
        }
        self.stages = stages;
        Ok(self)
    }

    /// Sets the maximum strike difference for cross-cell continuation
    pub fn set_max_consistency_angle(&mut self, value: f64) -> Result<&mut Self, StrError> {
        if value < 0.0 || value > PI / 2.0 {
            return Err("the maximum consistency angle must be in 0 ≤ angle ≤ π/2");
        }
        self.max_consistency_angle = value;
        Ok(self)
    }
}

impl Default for DfnGenerationConfig {
    fn default() -> Self {
        DfnGenerationConfig::new()
    }
}

/// Generates explicit fracture networks from the recorded population history of a grid
///
/// # Notes
///
/// * Each stage is an independent stochastic sample of the populations the
///   grid recorded at the stage time; cells are visited row-major with one
///   seeded generator per cell, so repeated runs reproduce the same network
/// * A fracture reaching the cell boundary continues into the neighbor cell
///   when the neighbor carries a matching dip set within the consistency
///   angle, and terminates at the boundary otherwise
pub struct DfnGenerator<'a> {
    grid: &'a FractureGrid,
    control: &'a PropagationControl,
    config: &'a DfnGenerationConfig,
}

impl<'a> DfnGenerator<'a> {
    /// Allocates a new instance
    pub fn new(
        grid: &'a FractureGrid,
        control: &'a PropagationControl,
        config: &'a DfnGenerationConfig,
    ) -> Result<Self, StrError> {
        match &config.stages {
            StageSelection::EqualDuration(n) | StageSelection::EqualArea(n) if *n < 1 => {
                return Err("the number of generation stages must be ≥ 1")
            }
            StageSelection::SpecifiedTimes(times) if times.is_empty() => {
                return Err("the stage time list must not be empty")
            }
            _ => (),
        }
        Ok(DfnGenerator { grid, control, config })
    }

    /// Returns the snapshot times implied by the stage selection (s)
    pub fn stage_times(&self) -> Result<Vec<f64>, StrError> {
        let times = self.grid.merged_timestep_times();
        let end_time = match times.last() {
            Some(t) => *t,
            None => return Err("the grid has no recorded timesteps to sample"),
        };
        let stage_times = match &self.config.stages {
            StageSelection::EqualDuration(n) => (1..=*n).map(|k| end_time * k as f64 / *n as f64).collect(),
            StageSelection::SpecifiedTimes(list) => list.clone(),
            StageSelection::EpisodeBoundaries => {
                let cell = self
                    .grid
                    .populated_cells()
                    .next()
                    .ok_or("the grid needs at least one populated cell")?
                    .2;
                // an open-ended last episode samples the end of the run
                cell.schedule.boundaries().iter().map(|b| b.unwrap_or(end_time)).collect()
            }
            StageSelection::EqualArea(n) => {
                let total = self.total_mfp32_at(end_time);
                if total <= 0.0 {
                    // a barren run degenerates to equal-duration spacing
                    (1..=*n).map(|k| end_time * k as f64 / *n as f64).collect()
                } else {
                    let mut out = Vec::with_capacity(*n);
                    for k in 1..*n {
                        let target = total * k as f64 / *n as f64;
                        let time = times
                            .iter()
                            .find(|t| self.total_mfp32_at(**t) >= target)
                            .copied()
                            .unwrap_or(end_time);
                        out.push(time);
                    }
                    out.push(end_time);
                    out
                }
            }
        };
        Ok(stage_times)
    }

    /// Returns the total recorded macrofracture area density over the grid at a time (1/m)
    fn total_mfp32_at(&self, time: f64) -> f64 {
        let mut sum = 0.0;
        for (_, _, cell) in self.grid.populated_cells() {
            for set in &cell.fracture_sets {
                for dip_set in &set.dip_sets {
                    if let Some(index) = dip_set.timestep_index_for(time) {
                        if let Ok(record) = dip_set.series().get(index) {
                            sum += record.total_mfp32;
                        }
                    }
                }
            }
        }
        sum
    }

    /// Generates one network snapshot per stage
    ///
    /// An abort request stops the sweep at the next cell boundary and returns
    /// the snapshots completed so far.
    pub fn generate(&self, monitor: &ProgressMonitor) -> Result<Vec<GlobalDfn>, StrError> {
        let stage_times = self.stage_times()?;
        let mut snapshots = Vec::with_capacity(stage_times.len());
        for (stage, &time) in stage_times.iter().enumerate() {
            let mut dfn = GlobalDfn {
                time,
                microfractures: Vec::new(),
                macrofractures: Vec::new(),
            };
            let mut aborted = false;
            for (row, col, cell) in self.grid.populated_cells() {
                if monitor.abort_requested() {
                    aborted = true;
                    break;
                }
                let cell_index = row * self.grid.ncols() + col;
                let seed = self
                    .config
                    .random_seed
                    .wrapping_add((stage * self.grid.nrows() * self.grid.ncols() + cell_index) as u64);
                let mut rng = StdRng::seed_from_u64(seed);
                self.sample_cell(row, col, cell, time, &mut dfn, &mut rng);
                monitor.advance(1);
            }
            snapshots.push(dfn);
            if aborted {
                break;
            }
        }
        Ok(snapshots)
    }

    /// Samples the explicit fractures of one cell at the stage time
    fn sample_cell(
        &self,
        row: usize,
        col: usize,
        cell: &Gridblock,
        time: f64,
        dfn: &mut GlobalDfn,
        rng: &mut StdRng,
    ) {
        for (set_index, set) in cell.fracture_sets.iter().enumerate() {
            for dip_set in &set.dip_sets {
                let index = match dip_set.timestep_index_for(time) {
                    Some(index) => index,
                    None => continue, // nothing recorded yet at this time
                };
                let record = match dip_set.series().get(index) {
                    Ok(record) => *record,
                    Err(message) => {
                        warn!("skipping dip set {} of cell ({}, {}): {}", set_index, row, col, message);
                        continue;
                    }
                };
                self.sample_microfractures(cell, dip_set, &record, dfn, rng);
                self.sample_macrofractures(row, col, cell, set_index, dip_set, &record, dfn, rng);
            }
        }
    }

    /// Draws explicit microfracture discs from the radius-binned population
    fn sample_microfractures(
        &self,
        cell: &Gridblock,
        dip_set: &FractureDipSet,
        record: &TimestepRecord,
        dfn: &mut GlobalDfn,
        rng: &mut StdRng,
    ) {
        let r_min = self.config.min_explicit_radius;
        if r_min <= 0.0 {
            return;
        }
        let current_p32 = dip_set.micro_p32();
        if current_p32 <= 0.0 || record.micro_p32 <= 0.0 {
            return;
        }
        // the bins hold the end-of-run population; rescale to the stage intensity
        let scale = record.micro_p32 / current_p32;
        let volume = cell.corners.volume();
        let z_top = mean_top_depth(cell);
        let thickness = cell.corners.thickness();
        let normal = dip_set.normal_vector();
        for bin in dip_set.micro_population().bins() {
            if bin.radius < r_min || bin.density <= 0.0 {
                continue;
            }
            let count = probabilistic_round(bin.density * scale * volume, rng);
            for _ in 0..count.min(DFN_MAX_OBJECTS_PER_SET) {
                let p = cell.corners.footprint_point(rng.gen::<f64>(), rng.gen::<f64>());
                // keep the disc inside the layer where it fits
                let margin = f64::min(bin.radius, thickness / 2.0);
                let z = z_top + margin + rng.gen::<f64>() * f64::max(0.0, thickness - 2.0 * margin);
                dfn.microfractures.push(Microfracture {
                    center: [p[0], p[1], z],
                    radius: bin.radius,
                    normal,
                });
            }
            if count > DFN_MAX_OBJECTS_PER_SET {
                warn!("microfracture count {} capped at {}", count, DFN_MAX_OBJECTS_PER_SET);
            }
        }
    }

    /// Draws explicit macrofractures matching the recorded number and area densities
    #[allow(clippy::too_many_arguments)]
    fn sample_macrofractures(
        &self,
        row: usize,
        col: usize,
        cell: &Gridblock,
        set_index: usize,
        dip_set: &FractureDipSet,
        record: &TimestepRecord,
        dfn: &mut GlobalDfn,
        rng: &mut StdRng,
    ) {
        if record.total_mfp30 <= 0.0 {
            return;
        }
        let volume = cell.corners.volume();
        let thickness = cell.corners.thickness();
        let count = probabilistic_round(record.total_mfp30 * volume, rng);
        if count > DFN_MAX_OBJECTS_PER_SET {
            warn!("macrofracture count {} capped at {}", count, DFN_MAX_OBJECTS_PER_SET);
        }
        let mean_half_length = record.total_mfp32 / (2.0 * thickness * record.total_mfp30);
        let p_active = record.active_mfp30 / record.total_mfp30;
        let p_relay = record.static_relay_mfp30 / record.total_mfp30;
        for _ in 0..count.min(DFN_MAX_OBJECTS_PER_SET) {
            let p = cell.corners.footprint_point(rng.gen::<f64>(), rng.gen::<f64>());
            let result = self.build_macrofracture(
                row,
                col,
                cell,
                set_index,
                dip_set,
                p,
                mean_half_length,
                p_active,
                p_relay,
                rng,
            );
            match result {
                Ok(fracture) => dfn.macrofractures.push(fracture),
                Err(message) => {
                    warn!("skipping fracture at ({:.1}, {:.1}): {}", p[0], p[1], message);
                }
            }
        }
    }

    /// Builds one macrofracture growing from a nucleation point in both strike directions
    #[allow(clippy::too_many_arguments)]
    fn build_macrofracture(
        &self,
        row: usize,
        col: usize,
        cell: &Gridblock,
        set_index: usize,
        dip_set: &FractureDipSet,
        nucleation: [f64; 2],
        mean_half_length: f64,
        p_active: f64,
        p_relay: f64,
        rng: &mut StdRng,
    ) -> Result<Macrofracture, StrError> {
        let strike = dip_set.strike();
        let direction = [strike.cos(), strike.sin()];
        let z_top = mean_top_depth(cell);
        let thickness = cell.corners.thickness();
        let z_mid = z_top + thickness / 2.0;

        let length_plus = sample_exponential(mean_half_length, rng);
        let length_minus = sample_exponential(mean_half_length, rng);
        let tip_plus = draw_tip_state(p_active, p_relay, rng);
        let tip_minus = draw_tip_state(p_active, p_relay, rng);

        let aperture = self.config.aperture_model.aperture(&ApertureContext {
            layer_thickness: thickness,
            fracture_size: (length_plus + length_minus) / 2.0,
            effective_normal_stress: cell.state.effective_stress().normal_component(&dip_set.normal_vector()),
            young_modulus: cell.mech.young_modulus,
        });

        let mut segments_plus = self.build_side(row, col, cell, dip_set, nucleation, direction, length_plus, tip_plus, aperture)?;
        let mut segments_minus = self.build_side(
            row,
            col,
            cell,
            dip_set,
            nucleation,
            [-direction[0], -direction[1]],
            length_minus,
            tip_minus,
            aperture,
        )?;

        if self.config.link_stress_shadows {
            let width = self.control.stress_shadow_width_multiplier * thickness;
            for (tip, segments, dir) in [
                (tip_plus, &mut segments_plus, direction),
                (tip_minus, &mut segments_minus, [-direction[0], -direction[1]]),
            ] {
                if tip == TipState::Relay {
                    if let Some(link) = relay_link_segment(cell, dip_set, segments, dir, width, aperture, rng) {
                        segments.push(link);
                    }
                }
            }
        }

        let centerline = if self.config.generate_centerlines {
            Some(centerline_polyline(&segments_minus, &segments_plus, [nucleation[0], nucleation[1], z_mid]))
        } else {
            None
        };

        Ok(Macrofracture {
            set_index,
            nucleation: [nucleation[0], nucleation[1], z_mid],
            segments_plus,
            segments_minus,
            tip_plus,
            tip_minus,
            centerline,
        })
    }

    /// Builds the segment list of one strike side, cropping or continuing at the cell boundary
    #[allow(clippy::too_many_arguments)]
    fn build_side(
        &self,
        row: usize,
        col: usize,
        cell: &Gridblock,
        dip_set: &FractureDipSet,
        start: [f64; 2],
        direction: [f64; 2],
        length: f64,
        tip: TipState,
        aperture: f64,
    ) -> Result<Vec<MacrofractureSegment>, StrError> {
        let mut segments = Vec::new();
        if length <= 0.0 {
            segments.push(zero_length_segment(cell, dip_set, start, aperture)?);
            return Ok(segments);
        }
        if !self.config.crop_at_boundary {
            let end = [start[0] + direction[0] * length, start[1] + direction[1] * length];
            segments.push(layer_segment(cell, dip_set, start, end, aperture, self.taper(tip))?);
            return Ok(segments);
        }
        let (exit, edge) = cell.corners.exit_distance(&start, &direction)?;
        if length <= exit {
            let end = [start[0] + direction[0] * length, start[1] + direction[1] * length];
            segments.push(layer_segment(cell, dip_set, start, end, aperture, self.taper(tip))?);
            return Ok(segments);
        }
        // the fracture reaches the boundary: crop the in-cell part
        let boundary = [start[0] + direction[0] * exit, start[1] + direction[1] * exit];
        let remaining = length - exit;
        match self.continuation(row, col, edge, direction) {
            Some((neighbor, next_dip_set, next_direction)) => {
                segments.push(layer_segment(cell, dip_set, start, boundary, aperture, false)?);
                let (next_exit, _) = neighbor.corners.exit_distance(&boundary, &next_direction)?;
                let next_length = remaining.min(next_exit);
                let end = [
                    boundary[0] + next_direction[0] * next_length,
                    boundary[1] + next_direction[1] * next_length,
                ];
                segments.push(layer_segment(neighbor, next_dip_set, boundary, end, aperture, self.taper(tip))?);
            }
            None => {
                // no consistent continuation: the fracture terminates at the boundary
                segments.push(layer_segment(cell, dip_set, start, boundary, aperture, false)?);
            }
        }
        Ok(segments)
    }

    /// Finds the neighbor continuation across a footprint edge, honoring the consistency angle
    ///
    /// Every dip set of every neighbor set is a candidate; the closest strike
    /// within the consistency angle wins, whatever its set index.
    fn continuation(
        &self,
        row: usize,
        col: usize,
        edge: usize,
        direction: [f64; 2],
    ) -> Option<(&'a Gridblock, &'a FractureDipSet, [f64; 2])> {
        // edge indices follow the footprint corner order: 0 west, 1 north, 2 east, 3 south
        let (n_row, n_col) = match edge {
            0 if col > 0 => (row, col - 1),
            1 => (row + 1, col),
            2 => (row, col + 1),
            3 if row > 0 => (row - 1, col),
            _ => return None,
        };
        let neighbor = self.grid.cell(n_row, n_col).ok().flatten()?;
        let own_strike = f64::atan2(direction[1], direction[0]);
        let mut best: Option<(&FractureDipSet, f64)> = None;
        for set in &neighbor.fracture_sets {
            for dip_set in &set.dip_sets {
                let delta = angle_difference(own_strike, dip_set.strike());
                if delta <= self.config.max_consistency_angle && best.map_or(true, |(_, d)| delta < d) {
                    best = Some((dip_set, delta));
                }
            }
        }
        let (dip_set, _) = best?;
        // continue along the matched strike, keeping the direction of travel
        let mut next = [dip_set.strike().cos(), dip_set.strike().sin()];
        if next[0] * direction[0] + next[1] * direction[1] < 0.0 {
            next = [-next[0], -next[1]];
        }
        Some((neighbor, dip_set, next))
    }

    /// Returns whether the outer segment of this tip should taper to a triangle
    fn taper(&self, tip: TipState) -> bool {
        self.config.triangular_segments && tip == TipState::Unconnected
    }
}

/// Returns the mean burial depth of the top face of a cell
fn mean_top_depth(cell: &Gridblock) -> f64 {
    (0..4).map(|k| cell.corners.corners[k][2]).sum::<f64>() / 4.0
}

/// Draws from an exponential distribution with the given mean
fn sample_exponential(mean: f64, rng: &mut StdRng) -> f64 {
    if mean <= 0.0 {
        return 0.0;
    }
    -mean * f64::ln(1.0 - rng.gen::<f64>())
}

/// Rounds an expected count probabilistically, preserving the mean
fn probabilistic_round(expected: f64, rng: &mut StdRng) -> usize {
    if expected <= 0.0 {
        return 0;
    }
    let floor = expected.floor();
    let extra = if rng.gen::<f64>() < expected - floor { 1 } else { 0 };
    floor as usize + extra
}

/// Draws a tip state from the recorded active, relay and intersect proportions
fn draw_tip_state(p_active: f64, p_relay: f64, rng: &mut StdRng) -> TipState {
    let u = rng.gen::<f64>();
    if u < p_active {
        TipState::Unconnected
    } else if u < p_active + p_relay {
        TipState::Relay
    } else {
        TipState::Connected
    }
}

/// Returns the smallest angle between two strike azimuths (0 ≤ angle ≤ π/2)
fn angle_difference(a: f64, b: f64) -> f64 {
    let mut delta = (a - b).rem_euclid(PI);
    if delta > PI / 2.0 {
        delta = PI - delta;
    }
    delta
}

/// Returns the down-dip offset vector spanning the layer from top to bottom
fn down_dip_offset(cell: &Gridblock, dip_set: &FractureDipSet) -> Result<[f64; 3], StrError> {
    let thickness = cell.corners.thickness();
    let n = dip_set.normal_vector();
    let strike = dip_set.strike();
    let s = [strike.cos(), strike.sin(), 0.0];
    // down-dip direction in the fracture plane
    let d = [
        n[1] * s[2] - n[2] * s[1],
        n[2] * s[0] - n[0] * s[2],
        n[0] * s[1] - n[1] * s[0],
    ];
    if d[2].abs() < 1e-12 {
        return Err("the fracture plane is horizontal");
    }
    let factor = thickness / d[2];
    Ok([d[0] * factor, d[1] * factor, d[2] * factor])
}

/// Builds one layer-spanning segment between two points on the mid-layer footprint
///
/// With `taper` set the segment becomes a triangle with its apex at the outer
/// end, halfway down the layer.
fn layer_segment(
    cell: &Gridblock,
    dip_set: &FractureDipSet,
    from: [f64; 2],
    to: [f64; 2],
    aperture: f64,
    taper: bool,
) -> Result<MacrofractureSegment, StrError> {
    let z_top = mean_top_depth(cell);
    let offset = down_dip_offset(cell, dip_set)?;
    // the footprint positions are mid-layer; shift up-dip by half the offset for the top edge
    let top_from = [from[0] - offset[0] / 2.0, from[1] - offset[1] / 2.0, z_top];
    let top_to = [to[0] - offset[0] / 2.0, to[1] - offset[1] / 2.0, z_top];
    let zero_length = {
        let (dx, dy) = (to[0] - from[0], to[1] - from[1]);
        f64::sqrt(dx * dx + dy * dy) < 1e-9
    };
    let corners = if taper {
        vec![
            top_from,
            [to[0], to[1], z_top + offset[2] / 2.0],
            [top_from[0] + offset[0], top_from[1] + offset[1], top_from[2] + offset[2]],
        ]
    } else {
        vec![
            top_from,
            top_to,
            [top_to[0] + offset[0], top_to[1] + offset[1], top_to[2] + offset[2]],
            [top_from[0] + offset[0], top_from[1] + offset[1], top_from[2] + offset[2]],
        ]
    };
    Ok(MacrofractureSegment {
        corners,
        zero_length,
        aperture,
    })
}

/// Builds a collapsed segment marking a side that was cropped to nothing
fn zero_length_segment(
    cell: &Gridblock,
    dip_set: &FractureDipSet,
    at: [f64; 2],
    aperture: f64,
) -> Result<MacrofractureSegment, StrError> {
    layer_segment(cell, dip_set, at, at, aperture, false)
}

/// Builds the short perpendicular segment linking a relay tip to its shadowing fracture
fn relay_link_segment(
    cell: &Gridblock,
    dip_set: &FractureDipSet,
    segments: &[MacrofractureSegment],
    direction: [f64; 2],
    width: f64,
    aperture: f64,
    rng: &mut StdRng,
) -> Option<MacrofractureSegment> {
    let last = segments.last()?;
    if last.zero_length || last.corners.len() < 2 {
        return None;
    }
    // tip position at mid-layer from the outer top corner
    let outer = last.corners[1];
    let offset = down_dip_offset(cell, dip_set).ok()?;
    let tip = [outer[0] + offset[0] / 2.0, outer[1] + offset[1] / 2.0];
    // the shadowing fracture lies on either side; pick one at random
    let side = if rng.gen::<bool>() { 1.0 } else { -1.0 };
    let perpendicular = [-direction[1] * side, direction[0] * side];
    let end = [tip[0] + perpendicular[0] * width, tip[1] + perpendicular[1] * width];
    layer_segment(cell, dip_set, tip, end, aperture, false).ok()
}

/// Collects the mid-layer centerline polyline from the two segment lists
fn centerline_polyline(
    segments_minus: &[MacrofractureSegment],
    segments_plus: &[MacrofractureSegment],
    nucleation: [f64; 3],
) -> Vec<[f64; 3]> {
    let mid = |segment: &MacrofractureSegment| -> [f64; 3] {
        let c = &segment.corners;
        if c.len() == 3 {
            c[1]
        } else {
            [(c[1][0] + c[2][0]) / 2.0, (c[1][1] + c[2][1]) / 2.0, (c[1][2] + c[2][2]) / 2.0]
        }
    };
    let mut polyline: Vec<[f64; 3]> = segments_minus.iter().rev().map(&mid).collect();
    polyline.push(nucleation);
    polyline.extend(segments_plus.iter().map(&mid));
    polyline
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
