use super::Gridblock;
use crate::base::{BoundaryKind, ProgressMonitor, PropagationControl, SearchAdjacentGridblocks};
use crate::StrError;
use log::info;
use rayon::prelude::*;

/// Relative tolerance used to merge nearly-equal timestep end times
pub const GRID_TIME_MERGE_TOL: f64 = 1e-10;

/// Weight of a neighbor-cell population when casting shadows across a shared face
const NEIGHBOR_SHADOW_WEIGHT: f64 = 0.5;

/// Summarizes a grid calculation
#[derive(Clone, Copy, Debug)]
pub struct RunSummary {
    /// Number of populated cells
    pub n_cells: usize,

    /// Number of cells whose calculation ran to completion
    pub n_finished: usize,

    /// Total number of timesteps over all cells
    pub n_timesteps: usize,

    /// Set when the calculation stopped early on an abort request
    pub aborted: bool,
}

/// Implements the row-column grid of gridblocks and the global calculation driver
///
/// # Notes
///
/// * Cells are stored row-major; a `None` entry is a hole in the grid
///   (pinched-out or inactive cell) which neither computes nor interacts
/// * All populated cells must share the same episode boundaries, so the grid
///   can synchronize at every episode boundary and exchange neighbor
///   populations between episodes
pub struct FractureGrid {
    /// Number of rows (y direction)
    nrows: usize,

    /// Number of columns (x direction)
    ncols: usize,

    /// Row-major cells
    cells: Vec<Option<Gridblock>>,
}

impl FractureGrid {
    /// Allocates a new instance, validating the episode boundaries across cells
    pub fn new(nrows: usize, ncols: usize, cells: Vec<Option<Gridblock>>) -> Result<Self, StrError> {
        if nrows < 1 || ncols < 1 {
            return Err("the grid needs at least one row and one column");
        }
        if cells.len() != nrows * ncols {
            return Err("the number of cells must equal nrows times ncols");
        }
        let mut reference: Option<Vec<Option<f64>>> = None;
        for cell in cells.iter().flatten() {
            let boundaries = cell.schedule.boundaries();
            match &reference {
                None => reference = Some(boundaries),
                Some(expected) => {
                    if !same_boundaries(expected, &boundaries) {
                        return Err("all cells must share the same episode boundaries");
                    }
                }
            }
        }
        if reference.is_none() {
            return Err("the grid needs at least one populated cell");
        }
        Ok(FractureGrid { nrows, ncols, cells })
    }

    /// Returns the number of rows
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    /// Returns the number of columns
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// Returns the number of populated cells
    pub fn n_populated(&self) -> usize {
        self.cells.iter().flatten().count()
    }

    /// Returns a reference to a cell (None for a hole)
    pub fn cell(&self, row: usize, col: usize) -> Result<Option<&Gridblock>, StrError> {
        if row >= self.nrows || col >= self.ncols {
            return Err("the cell indices are out of range");
        }
        Ok(self.cells[row * self.ncols + col].as_ref())
    }

    /// Returns a mutable reference to a cell (None for a hole)
    pub fn cell_mut(&mut self, row: usize, col: usize) -> Result<Option<&mut Gridblock>, StrError> {
        if row >= self.nrows || col >= self.ncols {
            return Err("the cell indices are out of range");
        }
        Ok(self.cells[row * self.ncols + col].as_mut())
    }

    /// Returns an iterator over the populated cells in row-major order
    pub fn populated_cells(&self) -> impl Iterator<Item = (usize, usize, &Gridblock)> {
        let ncols = self.ncols;
        self.cells
            .iter()
            .enumerate()
            .filter_map(move |(index, cell)| cell.as_ref().map(|c| (index / ncols, index % ncols, c)))
    }

    /// Runs the whole episode sequence over all cells
    ///
    /// Every cell advances through one episode before any cell starts the
    /// next, so cross-cell interaction always reads the neighbor populations
    /// frozen at the last episode boundary. An abort request stops the
    /// calculation at the next cell boundary and keeps all partial results.
    pub fn run(&mut self, control: &PropagationControl, monitor: &ProgressMonitor) -> Result<RunSummary, StrError> {
        let n_episodes = self
            .cells
            .iter()
            .flatten()
            .next()
            .ok_or("the grid needs at least one populated cell")?
            .schedule
            .len();
        let mut aborted = false;
        for episode in 0..n_episodes {
            if monitor.abort_requested() {
                aborted = true;
                break;
            }
            let shadows = self.neighbor_shadows(control);
            if control.parallel {
                self.cells
                    .par_iter_mut()
                    .zip(shadows.par_iter())
                    .try_for_each(|(cell, shadow)| match cell {
                        Some(cell) if !monitor.abort_requested() => {
                            let result = cell.run_episode(episode, shadow, control);
                            monitor.advance(1);
                            result
                        }
                        _ => {
                            monitor.advance(1);
                            Ok(())
                        }
                    })?;
            } else {
                for (cell, shadow) in self.cells.iter_mut().zip(shadows.iter()) {
                    if monitor.abort_requested() {
                        aborted = true;
                        break;
                    }
                    if let Some(cell) = cell {
                        cell.run_episode(episode, shadow, control)?;
                    }
                    monitor.advance(1);
                }
            }
            if aborted || monitor.abort_requested() {
                aborted = true;
                break;
            }
            info!("episode {}/{} complete", episode + 1, n_episodes);
        }
        let summary = RunSummary {
            n_cells: self.n_populated(),
            n_finished: self.cells.iter().flatten().filter(|c| c.is_finished()).count(),
            n_timesteps: self.cells.iter().flatten().map(|c| c.n_timesteps()).sum(),
            aborted,
        };
        Ok(summary)
    }

    /// Returns the merged, deduplicated list of timestep end times over all cells (s)
    pub fn merged_timestep_times(&self) -> Vec<f64> {
        let mut times: Vec<f64> = Vec::new();
        for cell in self.cells.iter().flatten() {
            for set in &cell.fracture_sets {
                for dip_set in &set.dip_sets {
                    times.extend(dip_set.series().times());
                }
            }
        }
        times.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        times.dedup_by(|a, b| (*a - *b).abs() <= GRID_TIME_MERGE_TOL * (1.0 + b.abs()));
        times
    }

    /// Composes the per-cell, per-set shadow densities cast by the four neighbors
    ///
    /// Reads the populations frozen at the last episode boundary, so the
    /// result is independent of the cell update order within the episode.
    fn neighbor_shadows(&self, control: &PropagationControl) -> Vec<Vec<f64>> {
        let snapshots: Vec<Option<Vec<f64>>> = self
            .cells
            .iter()
            .map(|cell| cell.as_ref().map(|c| c.set_mfp32_snapshot()))
            .collect();
        let mut shadows = Vec::with_capacity(self.cells.len());
        for (index, cell) in self.cells.iter().enumerate() {
            let cell = match cell {
                Some(cell) => cell,
                None => {
                    shadows.push(Vec::new());
                    continue;
                }
            };
            let n_sets = cell.fracture_sets.len();
            let mut shadow = vec![0.0; n_sets];
            if control.search_adjacent_gridblocks != SearchAdjacentGridblocks::None {
                let (row, col) = (index / self.ncols, index % self.ncols);
                for (n_row, n_col) in self.neighbor_indices(row, col) {
                    if !self.boundary_allows_search(row, col, n_row, n_col, control) {
                        continue;
                    }
                    if let Some(snapshot) = &snapshots[n_row * self.ncols + n_col] {
                        for (k, value) in snapshot.iter().enumerate().take(n_sets) {
                            shadow[k] += NEIGHBOR_SHADOW_WEIGHT * value;
                        }
                    }
                }
            }
            shadows.push(shadow);
        }
        shadows
    }

    /// Returns the in-range 4-neighborhood of a cell
    fn neighbor_indices(&self, row: usize, col: usize) -> Vec<(usize, usize)> {
        let mut out = Vec::with_capacity(4);
        if col > 0 {
            out.push((row, col - 1));
        }
        if col + 1 < self.ncols {
            out.push((row, col + 1));
        }
        if row > 0 {
            out.push((row - 1, col));
        }
        if row + 1 < self.nrows {
            out.push((row + 1, col));
        }
        out
    }

    /// Returns whether the shared boundary between two adjacent cells passes stress shadows
    ///
    /// In `Automatic` mode a faulted boundary decouples the two cells; in
    /// `All` mode every boundary passes.
    fn boundary_allows_search(
        &self,
        row: usize,
        col: usize,
        n_row: usize,
        n_col: usize,
        control: &PropagationControl,
    ) -> bool {
        if control.search_adjacent_gridblocks != SearchAdjacentGridblocks::Automatic {
            return true;
        }
        // the shared face is the west boundary of the eastern cell, or the
        // south boundary of the northern cell
        let boundary = if n_col != col {
            let east_col = col.max(n_col);
            self.cells[row * self.ncols + east_col].as_ref().map(|c| c.west_boundary)
        } else {
            let north_row = row.max(n_row);
            self.cells[north_row * self.ncols + col].as_ref().map(|c| c.south_boundary)
        };
        boundary != Some(BoundaryKind::Faulted)
    }
}

/// Compares two episode boundary lists within the merge tolerance
fn same_boundaries(a: &[Option<f64>], b: &[Option<f64>]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).all(|(x, y)| match (x, y) {
        (None, None) => true,
        (Some(x), Some(y)) => (x - y).abs() <= GRID_TIME_MERGE_TOL * (1.0 + y.abs()),
        _ => false,
    })
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{FractureGrid, GRID_TIME_MERGE_TOL};
    use crate::base::{ProgressMonitor, PropagationControl, SearchAdjacentGridblocks, TimeUnits};
    use crate::grid::{CornerPoints, Gridblock, GridblockConfig};
    use crate::loading::{DeformationEpisode, EpisodeDuration, EpisodeSchedule};
    use crate::mechanics::MechanicalProperties;
    use crate::tensor::Tensor2;
    use crate::StrError;

    fn extension_schedule(duration_years: f64) -> EpisodeSchedule {
        let strain_rate = Tensor2::from_components(1e-8, 0.0, 0.0, 0.0, 0.0, 0.0);
        let episode = DeformationEpisode::from_strain_rate(
            strain_rate,
            EpisodeDuration::Fixed(duration_years),
            TimeUnits::Years,
        )
        .unwrap();
        let mut schedule = EpisodeSchedule::new();
        schedule.push(episode).unwrap();
        schedule
    }

    fn sample_cell(col: usize, duration_years: f64, control: &PropagationControl) -> Result<Gridblock, StrError> {
        let x0 = col as f64 * 100.0;
        let corners = CornerPoints::new_box(x0, 0.0, x0 + 100.0, 100.0, 1995.0, 2005.0)?;
        let mech = MechanicalProperties::sample_brittle_sandstone();
        let mut config = GridblockConfig::sample();
        config.random_seed = 1000 + col as u64;
        Gridblock::new(corners, &mech, &config, extension_schedule(duration_years), control)
    }

    #[test]
    fn new_handles_wrong_input() -> Result<(), StrError> {
        let control = PropagationControl::new();
        assert_eq!(
            FractureGrid::new(0, 1, Vec::new()).err(),
            Some("the grid needs at least one row and one column")
        );
        assert_eq!(
            FractureGrid::new(1, 2, vec![None]).err(),
            Some("the number of cells must equal nrows times ncols")
        );
        assert_eq!(
            FractureGrid::new(1, 1, vec![None]).err(),
            Some("the grid needs at least one populated cell")
        );
        // mismatched episode boundaries are rejected
        let a = sample_cell(0, 1e5, &control)?;
        let b = sample_cell(1, 2e5, &control)?;
        assert_eq!(
            FractureGrid::new(1, 2, vec![Some(a), Some(b)]).err(),
            Some("all cells must share the same episode boundaries")
        );
        Ok(())
    }

    #[test]
    fn grid_runs_all_cells_with_holes() -> Result<(), StrError> {
        let control = PropagationControl::new();
        let cells = vec![
            Some(sample_cell(0, 1e5, &control)?),
            None,
            Some(sample_cell(2, 1e5, &control)?),
        ];
        let mut grid = FractureGrid::new(1, 3, cells)?;
        let monitor = ProgressMonitor::new(3);
        let summary = grid.run(&control, &monitor)?;
        assert_eq!(summary.n_cells, 2);
        assert_eq!(summary.n_finished, 2);
        assert!(!summary.aborted);
        assert!(grid.cell(0, 0)?.is_some());
        assert!(grid.cell(0, 1)?.is_none());
        assert_eq!(monitor.completed(), 3);
        Ok(())
    }

    #[test]
    fn parallel_run_matches_the_serial_result() -> Result<(), StrError> {
        let mut serial_control = PropagationControl::new();
        serial_control.parallel = false;
        let mut parallel_control = serial_control.clone();
        parallel_control.parallel = true;
        let make = |control: &PropagationControl| -> Result<FractureGrid, StrError> {
            let cells = vec![
                Some(sample_cell(0, 1e5, control)?),
                Some(sample_cell(1, 1e5, control)?),
            ];
            FractureGrid::new(1, 2, cells)
        };
        let mut serial = make(&serial_control)?;
        let mut parallel = make(&parallel_control)?;
        serial.run(&serial_control, &ProgressMonitor::new(2))?;
        parallel.run(&parallel_control, &ProgressMonitor::new(2))?;
        for col in 0..2 {
            let a = serial.cell(0, col)?.unwrap();
            let b = parallel.cell(0, col)?.unwrap();
            assert_eq!(a.total_mfp32(), b.total_mfp32());
            assert_eq!(a.n_timesteps(), b.n_timesteps());
        }
        Ok(())
    }

    #[test]
    fn abort_keeps_partial_results() -> Result<(), StrError> {
        let control = PropagationControl::new();
        let cells = vec![Some(sample_cell(0, 1e5, &control)?)];
        let mut grid = FractureGrid::new(1, 1, cells)?;
        let monitor = ProgressMonitor::new(1);
        monitor.request_abort();
        let summary = grid.run(&control, &monitor)?;
        assert!(summary.aborted);
        assert_eq!(summary.n_timesteps, 0);
        Ok(())
    }

    #[test]
    fn merged_times_are_sorted_and_deduplicated() -> Result<(), StrError> {
        let control = PropagationControl::new();
        let cells = vec![
            Some(sample_cell(0, 1e5, &control)?),
            Some(sample_cell(1, 1e5, &control)?),
        ];
        let mut grid = FractureGrid::new(1, 2, cells)?;
        grid.run(&control, &ProgressMonitor::new(2))?;
        let times = grid.merged_timestep_times();
        assert!(!times.is_empty());
        for pair in times.windows(2) {
            assert!(pair[1] - pair[0] > GRID_TIME_MERGE_TOL * (1.0 + pair[0].abs()));
        }
        Ok(())
    }

    #[test]
    fn adjacent_search_composes_neighbor_shadows() -> Result<(), StrError> {
        let mut control = PropagationControl::new();
        control.search_adjacent_gridblocks = SearchAdjacentGridblocks::All;
        let cells = vec![
            Some(sample_cell(0, 1e5, &control)?),
            Some(sample_cell(1, 1e5, &control)?),
        ];
        let grid = FractureGrid::new(1, 2, cells)?;
        // populations start empty, so the initial snapshot casts no shadow
        let shadows = grid.neighbor_shadows(&control);
        assert_eq!(shadows.len(), 2);
        assert!(shadows[0].iter().all(|&s| s == 0.0));
        Ok(())
    }
}
