use super::CornerPoints;
use crate::base::{BoundaryDeformation, BoundaryKind, InitialStressRelaxation, PropagationControl, CONTROL_MIN_DT};
use crate::fracture::{FractureSet, SetInteraction};
use crate::loading::{EpisodeLoad, EpisodeSchedule};
use crate::mechanics::{MechanicalProperties, StressStrainState};
use crate::tensor::{Tensor2, Tensor4};
use crate::StrError;
use log::warn;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Holds the per-cell configuration of burial, fluid, thermal and seed-population inputs
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct GridblockConfig {
    /// Bulk density of the overburden (kg/m³)
    pub sediment_density: f64,

    /// Pore fluid density (kg/m³)
    pub fluid_density: f64,

    /// Fluid pressure in excess of hydrostatic at configuration time (Pa)
    pub initial_overpressure: f64,

    /// Geothermal gradient (°C/m)
    pub geothermal_gradient: f64,

    /// How the initial horizontal effective stress follows the vertical
    pub initial_stress_relaxation: InitialStressRelaxation,

    /// Number of fracture sets to generate (≥ 1)
    pub fracture_set_count: usize,

    /// Strike azimuth of the first set (radians); None derives it from the
    /// most compressive horizontal stress direction of the initial state
    pub base_azimuth: Option<f64>,

    /// Dip angle of all sets (radians); None generates vertical sets,
    /// otherwise each set is a biazimuthal conjugate pair
    pub fracture_dip: Option<f64>,

    /// Power-law coefficient B of the seed microfracture population (1/m³),
    /// split evenly between the sets
    pub initial_micro_density: f64,

    /// Power-law exponent c of the seed population
    pub size_exponent: f64,

    /// Mechanical behavior of the lateral boundaries (ductile falls back to rigid)
    pub boundary_deformation: BoundaryDeformation,

    /// Seed of the per-cell random generator
    pub random_seed: u64,
}

impl GridblockConfig {
    /// Returns a sample configuration for a cell at about 2 km burial
    pub fn sample() -> Self {
        GridblockConfig {
            sediment_density: 2500.0,
            fluid_density: 1000.0,
            initial_overpressure: 0.0,
            geothermal_gradient: 0.03,
            initial_stress_relaxation: InitialStressRelaxation::Uniaxial,
            fracture_set_count: 2,
            base_azimuth: Some(0.0),
            fracture_dip: None,
            initial_micro_density: 0.001,
            size_exponent: 2.0,
            boundary_deformation: BoundaryDeformation::Rigid,
            random_seed: 8448,
        }
    }
}

/// Implements one cell of the fracture grid
///
/// A gridblock owns its mechanical properties, its evolving stress state, its
/// loading schedule and its fracture sets, and drives the adaptive-timestep
/// population growth through the episode sequence.
pub struct Gridblock {
    /// Corner-point geometry
    pub corners: CornerPoints,

    /// Mechanical constants (validated at construction)
    pub mech: MechanicalProperties,

    /// Evolving stress, pressure and temperature state
    pub state: StressStrainState,

    /// Fracture sets, one per strike azimuth
    pub fracture_sets: Vec<FractureSet>,

    /// Loading history
    pub schedule: EpisodeSchedule,

    /// Kind of the western cell boundary
    pub west_boundary: BoundaryKind,

    /// Kind of the southern cell boundary
    pub south_boundary: BoundaryKind,

    /// Intact elastic stiffness used to convert strain rates to stress rates
    stiffness: Tensor4,

    /// Bulk compliance including the crack contribution of the current population
    bulk_compliance: Tensor4,

    /// Current simulation time (s)
    clock: f64,

    /// Number of timesteps taken so far
    n_timesteps: usize,

    /// Set when the cell stops advancing (saturation or timestep budget)
    finished: bool,

    /// Per-cell random generator for probabilistic nucleation
    rng: StdRng,
}

impl Gridblock {
    /// Allocates a new instance, solving the initial stress state and seeding the fracture sets
    ///
    /// # Notes
    ///
    /// * Set strikes are fanned evenly over π starting from the base azimuth,
    ///   so two sets give an orthogonal pair and n sets give a π/n fan
    /// * The seed microfracture density is split evenly between the sets
    pub fn new(
        corners: CornerPoints,
        mech: &MechanicalProperties,
        config: &GridblockConfig,
        schedule: EpisodeSchedule,
        control: &PropagationControl,
    ) -> Result<Self, StrError> {
        if config.fracture_set_count < 1 {
            return Err("a gridblock needs at least one fracture set");
        }
        if schedule.is_empty() {
            return Err("a gridblock needs at least one deformation episode");
        }
        if config.boundary_deformation == BoundaryDeformation::Ductile {
            warn!("ductile boundary conditions are not implemented; using rigid boundaries");
        }
        let mech = mech.validated();
        let state = StressStrainState::new(
            corners.mean_depth(),
            config.sediment_density,
            config.fluid_density,
            config.initial_overpressure,
            config.geothermal_gradient,
            config.initial_stress_relaxation,
            &mech,
        )?;
        let base_azimuth = match config.base_azimuth {
            Some(azimuth) => azimuth,
            None => state.horizontal_principal_stresses().2,
        };
        let n_sets = config.fracture_set_count;
        let density_per_set = config.initial_micro_density / n_sets as f64;
        let thickness = corners.thickness();
        let mut fracture_sets = Vec::with_capacity(n_sets);
        for k in 0..n_sets {
            let strike = base_azimuth + k as f64 * PI / n_sets as f64;
            let set = match config.fracture_dip {
                None => FractureSet::new_vertical(strike, thickness, density_per_set, config.size_exponent, control)?,
                Some(dip) => FractureSet::new_conjugate(
                    strike,
                    dip,
                    thickness,
                    density_per_set,
                    config.size_exponent,
                    control,
                )?,
            };
            fracture_sets.push(set);
        }
        let compliance = mech.intact_compliance()?;
        let stiffness = compliance.inverse()?;
        Ok(Gridblock {
            corners,
            mech,
            state,
            fracture_sets,
            schedule,
            west_boundary: BoundaryKind::Open,
            south_boundary: BoundaryKind::Open,
            stiffness,
            bulk_compliance: compliance,
            clock: 0.0,
            n_timesteps: 0,
            finished: false,
            rng: StdRng::seed_from_u64(config.random_seed),
        })
    }

    /// Returns the current simulation time (s)
    pub fn clock(&self) -> f64 {
        self.clock
    }

    /// Returns the number of timesteps taken so far
    pub fn n_timesteps(&self) -> usize {
        self.n_timesteps
    }

    /// Returns whether the cell has stopped advancing
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Returns the current bulk compliance tensor
    ///
    /// Includes the crack contribution only when the control option
    /// `output_bulk_rock_elastic_tensors` is on.
    pub fn bulk_compliance(&self) -> &Tensor4 {
        &self.bulk_compliance
    }

    /// Returns the total macrofracture area density over all sets (1/m)
    pub fn total_mfp32(&self) -> f64 {
        self.fracture_sets.iter().map(|s| s.total_mfp32()).sum()
    }

    /// Returns the total macrofracture number density over all sets (1/m³)
    pub fn total_mfp30(&self) -> f64 {
        self.fracture_sets.iter().map(|s| s.total_mfp30()).sum()
    }

    /// Returns the fracture porosity over all sets
    pub fn porosity(&self, control: &PropagationControl) -> f64 {
        self.fracture_sets.iter().map(|s| s.porosity(control)).sum()
    }

    /// Returns the area-density anisotropy index `(max − min)/sum` over the fracture sets
    pub fn p32_anisotropy(&self) -> f64 {
        let values: Vec<f64> = self.fracture_sets.iter().map(|s| s.total_mfp32()).collect();
        anisotropy_index(&values)
    }

    /// Returns the porosity anisotropy index `(max − min)/sum` over the fracture sets
    pub fn porosity_anisotropy(&self, control: &PropagationControl) -> f64 {
        let values: Vec<f64> = self.fracture_sets.iter().map(|s| s.porosity(control)).collect();
        anisotropy_index(&values)
    }

    /// Returns whether every fracture set has reached the terminal state
    pub fn all_sets_terminated(&self) -> bool {
        self.fracture_sets.iter().all(|s| s.is_terminated())
    }

    /// Composes the cross-set interaction densities seen by one dip set
    ///
    /// The conjugate partner of the same set always casts a shadow; other
    /// sets contribute shadows weighted by `|cos Δstrike|` only when
    /// `check_all_stress_shadows` is on, and intersections weighted by
    /// `|sin Δstrike|` always. The neighbor-cell contribution is added to
    /// the shadow term unweighted.
    pub fn compose_interaction(
        &self,
        set_index: usize,
        dip_index: usize,
        neighbor_shadow: f64,
        control: &PropagationControl,
    ) -> SetInteraction {
        let own = &self.fracture_sets[set_index];
        let mut shadow = neighbor_shadow;
        for (d, partner) in own.dip_sets.iter().enumerate() {
            if d != dip_index {
                shadow += partner.total_mfp32();
            }
        }
        let mut intersect = 0.0;
        for (j, other) in self.fracture_sets.iter().enumerate() {
            if j == set_index {
                continue;
            }
            let delta = other.strike - own.strike;
            if control.check_all_stress_shadows {
                shadow += other.total_mfp32() * delta.cos().abs();
            }
            intersect += other.total_mfp32() * delta.sin().abs();
        }
        SetInteraction {
            shadow_mfp32: shadow,
            intersect_mfp32: intersect,
        }
    }

    /// Advances the cell by one adaptive timestep
    ///
    /// # Input
    ///
    /// * `load` -- the current episode load with per-second rates
    /// * `span_end` -- absolute end time of the current sub-episode (None = open-ended)
    /// * `neighbor_shadow` -- per-set sub-parallel area density from adjacent cells (1/m)
    ///
    /// # Output
    ///
    /// Returns false when the cell cannot advance (saturated, timestep budget
    /// exhausted, or open-ended span with no loading rate and no timestep ceiling).
    pub fn step(
        &mut self,
        load: &EpisodeLoad,
        span_end: Option<f64>,
        neighbor_shadow: &[f64],
        control: &PropagationControl,
    ) -> Result<bool, StrError> {
        if neighbor_shadow.len() != self.fracture_sets.len() {
            return Err("the neighbor shadow array must have one entry per fracture set");
        }
        if self.finished || self.all_sets_terminated() {
            self.finished = true;
            return Ok(false);
        }
        if self.n_timesteps >= control.max_timesteps {
            self.finished = true;
            return Ok(false);
        }

        let sigma = self.driving_stress_tensor(control);

        // interaction densities are composed from the populations at the start of the step
        let mut interactions = Vec::with_capacity(self.fracture_sets.len());
        for (i, set) in self.fracture_sets.iter().enumerate() {
            let per_dip: Vec<SetInteraction> = (0..set.dip_sets.len())
                .map(|d| self.compose_interaction(i, d, neighbor_shadow[i], control))
                .collect();
            interactions.push(per_dip);
        }

        // the timestep limits the fractional MFP33 increase of the fastest-growing set
        let mut dt = None;
        for (i, set) in self.fracture_sets.iter().enumerate() {
            for (d, dip_set) in set.dip_sets.iter().enumerate() {
                if let Some(suggestion) = dip_set.suggest_timestep(&sigma, &self.mech, control, &interactions[i][d]) {
                    dt = Some(dt.map_or(suggestion, |current: f64| current.min(suggestion)));
                }
            }
        }
        // before nucleation the MFP33 control has no volume to bound, so the
        // loading rate resolves the stress path instead
        if let Some(limit) = self.loading_rate_timestep(load, control) {
            dt = Some(dt.map_or(limit, |current: f64| current.min(limit)));
        }
        if let Some(ceiling) = control.max_timestep_duration {
            dt = Some(dt.map_or(ceiling, |current: f64| current.min(ceiling)));
        }
        let remaining = span_end.map(|end| end - self.clock);
        let mut dt = match (dt, remaining) {
            (Some(dt), Some(remaining)) => dt.min(remaining),
            (Some(dt), None) => dt,
            (None, Some(remaining)) => remaining,
            (None, None) => return Err("an open-ended episode requires a maximum timestep duration"),
        };
        if dt <= 0.0 {
            return Ok(false);
        }
        dt = dt.max(CONTROL_MIN_DT);
        if let Some(remaining) = remaining {
            dt = dt.min(remaining);
        }

        self.state.advance(load, &self.mech, &self.stiffness, dt);
        let sigma = self.driving_stress_tensor(control);

        let time_end = self.clock + dt;
        let volume = self.corners.volume();
        for (i, set) in self.fracture_sets.iter_mut().enumerate() {
            for (d, dip_set) in set.dip_sets.iter_mut().enumerate() {
                dip_set.update(
                    time_end,
                    dt,
                    &sigma,
                    &self.mech,
                    control,
                    &interactions[i][d],
                    volume,
                    &mut self.rng,
                )?;
            }
        }

        self.clock = time_end;
        self.n_timesteps += 1;
        if control.output_bulk_rock_elastic_tensors {
            self.update_bulk_compliance(control)?;
        }
        Ok(true)
    }

    /// Runs one sub-episode span to its end (or to saturation)
    pub fn run_span(
        &mut self,
        episode_index: usize,
        span_start: f64,
        span_duration: Option<f64>,
        apply_overrides: bool,
        neighbor_shadow: &[f64],
        control: &PropagationControl,
    ) -> Result<(), StrError> {
        if episode_index >= self.schedule.len() {
            return Err("the episode index is out of range");
        }
        let episode = &self.schedule.episodes[episode_index];
        let load = episode.load_per_second();
        if apply_overrides {
            let stress = episode.initial_stress_override;
            let pressure = episode.initial_pressure_override;
            self.state.apply_override(stress.as_ref(), pressure);
        }
        if self.clock < span_start {
            self.clock = span_start;
        }
        let span_end = span_duration.map(|d| span_start + d);
        while self.step(&load, span_end, neighbor_shadow, control)? {}
        // a finite span only finishes the cell when the schedule has nothing left
        if self.finished {
            return Ok(());
        }
        if span_end.is_none() {
            self.finished = true;
        }
        Ok(())
    }

    /// Runs all sub-episode spans of one episode with a fixed neighbor-shadow snapshot
    pub fn run_episode(
        &mut self,
        episode_index: usize,
        neighbor_shadow: &[f64],
        control: &PropagationControl,
    ) -> Result<(), StrError> {
        let spans = self.schedule.spans();
        for (index, span_start, span_duration, apply_overrides) in spans {
            if index != episode_index {
                continue;
            }
            self.run_span(index, span_start, span_duration, apply_overrides, neighbor_shadow, control)?;
            if self.finished {
                break;
            }
        }
        // nothing left after the last episode
        if episode_index + 1 == self.schedule.len() {
            self.finished = true;
        }
        Ok(())
    }

    /// Returns the current area density of each fracture set (1/m)
    pub fn set_mfp32_snapshot(&self) -> Vec<f64> {
        self.fracture_sets.iter().map(|s| s.total_mfp32()).collect()
    }

    /// Runs the full episode schedule of a standalone cell (no neighbor interaction)
    pub fn run(&mut self, control: &PropagationControl) -> Result<(), StrError> {
        let zeros = vec![0.0; self.fracture_sets.len()];
        let spans = self.schedule.spans();
        for (episode_index, span_start, span_duration, apply_overrides) in spans {
            self.run_span(episode_index, span_start, span_duration, apply_overrides, &zeros, control)?;
            if self.finished {
                break;
            }
        }
        self.finished = true;
        Ok(())
    }

    /// Recomputes the bulk compliance from the intact rock plus the crack contribution
    ///
    /// Each dip set adds a penny-crack compliance increment proportional to
    /// its dimensionless crack density `MFP32・r̄`.
    pub fn update_bulk_compliance(&mut self, _control: &PropagationControl) -> Result<(), StrError> {
        let mut compliance = self.mech.intact_compliance()?;
        let (young, poisson) = (self.mech.young_modulus, self.mech.poisson_ratio);
        let factor = 16.0 * (1.0 - poisson * poisson) / (3.0 * young);
        for set in &self.fracture_sets {
            for dip_set in &set.dip_sets {
                let alpha = dip_set.total_mfp32() * dip_set.mean_half_length();
                if alpha > 0.0 {
                    let delta_n = factor * alpha;
                    let delta_t = delta_n / (1.0 - poisson / 2.0);
                    compliance.add_crack_compliance(&dip_set.normal_vector(), delta_n, delta_t);
                }
            }
        }
        self.bulk_compliance = compliance;
        Ok(())
    }

    /// Returns the timestep that keeps the stress change within the control's increment
    fn loading_rate_timestep(&self, load: &EpisodeLoad, control: &PropagationControl) -> Option<f64> {
        let stress_rate = match load {
            EpisodeLoad::StrainRate { strain_rate, .. } => self.stiffness.stress_from_strain(strain_rate),
            EpisodeLoad::StressRate { stress_rate, .. } => *stress_rate,
        };
        let magnitude = stress_rate.max_abs();
        if magnitude > 0.0 {
            Some(control.max_timestep_stress_increment / magnitude)
        } else {
            None
        }
    }

    /// Returns the effective stress used to drive fracture growth
    ///
    /// Below the anisotropy cutoff the horizontal components are replaced by
    /// their mean and the horizontal shear is dropped, so all sets see the
    /// same driving stress.
    fn driving_stress_tensor(&self, control: &PropagationControl) -> Tensor2 {
        let sigma = *self.state.effective_stress();
        let scale = f64::max(sigma.mean().abs(), 1.0);
        if self.state.horizontal_stress_anisotropy() < control.anisotropy_cutoff * scale {
            let mean_h = 0.5 * (sigma.get(0, 0) + sigma.get(1, 1));
            Tensor2::from_components(mean_h, mean_h, sigma.get(2, 2), 0.0, sigma.get(1, 2), sigma.get(2, 0))
        } else {
            sigma
        }
    }
}

/// Returns `(max − min)/sum` of a set of non-negative intensities (0 when the sum vanishes)
fn anisotropy_index(values: &[f64]) -> f64 {
    let sum: f64 = values.iter().sum();
    if sum <= 0.0 || values.is_empty() {
        return 0.0;
    }
    let max = values.iter().cloned().fold(f64::MIN, f64::max);
    let min = values.iter().cloned().fold(f64::MAX, f64::min);
    (max - min) / sum
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
