use super::{MicrofracturePopulation, PopulationSeries, TimestepRecord};
use crate::base::{PropagationControl, SlipSense, CONTROL_MIN_DT};
use crate::mechanics::MechanicalProperties;
use crate::tensor::Tensor2;
use crate::StrError;
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Defines the lifecycle state of a fracture dip set
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub enum DipSetStatus {
    /// No macrofracture has nucleated yet
    Nucleating,

    /// Macrofractures exist and all of them are propagating
    Active,

    /// Some macrofractures have been deactivated but growth continues
    PartiallyDeactivated,

    /// Terminal state: the population is frozen and records stop advancing
    Terminated,
}

/// Holds the interaction densities a dip set sees from other sets and neighboring cells
///
/// Composed by the owning gridblock per timestep: `shadow_mfp32` carries the
/// area density of sub-parallel fractures casting stress shadows onto this
/// set (other sets when `check_all_stress_shadows` is on, plus neighbor-cell
/// contributions when adjacent-gridblock search is enabled), and
/// `intersect_mfp32` carries the crossing-set area density weighted by
/// `|sin Δstrike|`.
#[derive(Clone, Copy, Debug, Default)]
pub struct SetInteraction {
    /// Sub-parallel area density contributing stress shadows (1/m)
    pub shadow_mfp32: f64,

    /// Crossing area density weighted by the strike angle difference (1/m)
    pub intersect_mfp32: f64,
}

/// Implements the statistical growth state machine of one fracture dip set
///
/// Tracks the microfracture and macrofracture population density of a single
/// dip orientation through time: nucleation from the microfracture tail,
/// subcritical propagation, deactivation by stress shadowing and crossing
/// fractures, and saturation.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct FractureDipSet {
    /// Strike azimuth (radians counterclockwise from the grid x axis)
    strike: f64,

    /// Dip angle (radians; π/2 = vertical)
    dip: f64,

    /// Dip direction: +1 or −1 selects the conjugate partner
    dip_sign: f64,

    /// Thickness of the fractured layer (m)
    layer_thickness: f64,

    /// Microfracture population
    micro: MicrofracturePopulation,

    /// Number density of propagating macrofractures (1/m³)
    active_mfp30: f64,

    /// Number density of macrofractures stopped by stress shadows (1/m³)
    relay_mfp30: f64,

    /// Number density of macrofractures stopped by intersection (1/m³)
    intersect_mfp30: f64,

    /// Total-length density of propagating macrofractures (m/m³)
    active_length: f64,

    /// Total-length density of shadow-stopped macrofractures (m/m³)
    relay_length: f64,

    /// Total-length density of intersection-stopped macrofractures (m/m³)
    intersect_length: f64,

    /// Peak historic value of the active MFP33
    peak_active_mfp33: f64,

    /// Current slip sense resolved from the stress state
    slip_sense: SlipSense,

    /// Lifecycle state
    status: DipSetStatus,

    /// Append-only per-timestep history
    series: PopulationSeries,
}

impl FractureDipSet {
    /// Allocates a new empty dip set
    ///
    /// # Input
    ///
    /// * `strike` -- strike azimuth (radians from the grid x axis)
    /// * `dip` -- dip angle (radians, 0 < dip ≤ π/2)
    /// * `dip_sign` -- +1.0 or −1.0, selecting the conjugate dip direction
    /// * `layer_thickness` -- fractured layer thickness (m, > 0)
    /// * `initial_micro_density` -- power-law coefficient B of the seed
    ///   microfracture population (1/m³; 0 = no seed population)
    /// * `size_exponent` -- power-law exponent c of the seed population
    pub fn new(
        strike: f64,
        dip: f64,
        dip_sign: f64,
        layer_thickness: f64,
        initial_micro_density: f64,
        size_exponent: f64,
        control: &PropagationControl,
    ) -> Result<Self, StrError> {
        if layer_thickness <= 0.0 {
            return Err("the layer thickness must be > 0.0");
        }
        if dip <= 0.0 || dip > PI / 2.0 {
            return Err("the dip angle must be in 0 < dip ≤ π/2");
        }
        if dip_sign != 1.0 && dip_sign != -1.0 {
            return Err("the dip sign must be +1.0 or −1.0");
        }
        let micro = MicrofracturePopulation::new(
            initial_micro_density,
            size_exponent,
            control.minimum_micro_radius,
            layer_thickness / 2.0,
            control.micro_radius_bins,
        )?;
        Ok(FractureDipSet {
            strike,
            dip,
            dip_sign,
            layer_thickness,
            micro,
            active_mfp30: 0.0,
            relay_mfp30: 0.0,
            intersect_mfp30: 0.0,
            active_length: 0.0,
            relay_length: 0.0,
            intersect_length: 0.0,
            peak_active_mfp33: 0.0,
            slip_sense: SlipSense::Dilatant,
            status: DipSetStatus::Nucleating,
            series: PopulationSeries::new(),
        })
    }

    /// Returns the strike azimuth (radians)
    pub fn strike(&self) -> f64 {
        self.strike
    }

    /// Returns the dip angle (radians)
    pub fn dip(&self) -> f64 {
        self.dip
    }

    /// Returns the dip direction sign
    pub fn dip_sign(&self) -> f64 {
        self.dip_sign
    }

    /// Returns the lifecycle state
    pub fn status(&self) -> DipSetStatus {
        self.status
    }

    /// Returns the current slip sense
    pub fn slip_sense(&self) -> SlipSense {
        self.slip_sense
    }

    /// Returns the unit normal of the fracture plane
    pub fn normal_vector(&self) -> [f64; 3] {
        let (sin_a, cos_a) = self.strike.sin_cos();
        let (sin_d, cos_d) = self.dip.sin_cos();
        [
            self.dip_sign * sin_d * sin_a,
            -self.dip_sign * sin_d * cos_a,
            cos_d,
        ]
    }

    /// Returns the total macrofracture number density P30 (1/m³)
    pub fn total_mfp30(&self) -> f64 {
        self.active_mfp30 + self.relay_mfp30 + self.intersect_mfp30
    }

    /// Returns the active macrofracture number density (1/m³)
    pub fn active_mfp30(&self) -> f64 {
        self.active_mfp30
    }

    /// Returns the static-relay macrofracture number density (1/m³)
    pub fn static_relay_mfp30(&self) -> f64 {
        self.relay_mfp30
    }

    /// Returns the static-intersect macrofracture number density (1/m³)
    pub fn static_intersect_mfp30(&self) -> f64 {
        self.intersect_mfp30
    }

    /// Returns the total macrofracture area density P32 (1/m)
    pub fn total_mfp32(&self) -> f64 {
        (self.active_length + self.relay_length + self.intersect_length) * self.layer_thickness
    }

    /// Returns the active macrofracture area density (1/m)
    pub fn active_mfp32(&self) -> f64 {
        self.active_length * self.layer_thickness
    }

    /// Returns the total macrofracture volume fraction at the implicit aperture
    pub fn total_mfp33(&self, control: &PropagationControl) -> f64 {
        self.total_mfp32() * control.implicit_aperture
    }

    /// Returns the microfracture area density P32 (1/m)
    pub fn micro_p32(&self) -> f64 {
        self.micro.p32()
    }

    /// Returns the microfracture population
    pub fn micro_population(&self) -> &MicrofracturePopulation {
        &self.micro
    }

    /// Returns the mean macrofracture half-length (m)
    pub fn mean_half_length(&self) -> f64 {
        let p30 = self.total_mfp30();
        if p30 > 0.0 {
            (self.active_length + self.relay_length + self.intersect_length) / (2.0 * p30)
        } else {
            0.0
        }
    }

    /// Returns the recorded history
    pub fn series(&self) -> &PopulationSeries {
        &self.series
    }

    /// Returns the latest timestep index with recorded time ≤ the query time
    pub fn timestep_index_for(&self, time: f64) -> Option<usize> {
        self.series.timestep_index_for(time)
    }

    /// Resolves the driving stress on the set orientation
    ///
    /// Mode I driving is the tensile effective normal stress; mode II driving
    /// is the shear stress in excess of friction. Returns the larger of the
    /// two (≥ 0) and the corresponding slip sense.
    pub fn driving_stress(&self, sigma_eff: &Tensor2, mech: &MechanicalProperties) -> (f64, SlipSense) {
        let n = self.normal_vector();
        let sigma_n = sigma_eff.normal_component(&n);
        let tau = sigma_eff.shear_component(&n);
        let tensile = sigma_n;
        let shear_excess = tau + mech.friction_coefficient * f64::min(sigma_n, 0.0);
        if tensile >= shear_excess {
            (f64::max(0.0, tensile), SlipSense::Dilatant)
        } else {
            let sense = if sigma_n < sigma_eff.get(2, 2) {
                SlipSense::Reverse
            } else {
                SlipSense::Normal
            };
            (f64::max(0.0, shear_excess), sense)
        }
    }

    /// Returns the subcritical propagation velocity for a fracture of size r
    ///
    /// `V = Vmax・min(1, (K_I/K_IC)^b)` with `K_I = σd・√(π・r)`
    pub fn propagation_velocity(&self, driving_stress: f64, r: f64, mech: &MechanicalProperties) -> f64 {
        subcritical_velocity(driving_stress, r, mech)
    }

    /// Returns the stress-shadow exclusion volume fraction for a given sub-parallel area density
    pub fn exclusion_fraction(&self, shadow_mfp32: f64, control: &PropagationControl) -> f64 {
        let width = control.stress_shadow_width_multiplier * self.layer_thickness;
        f64::min(1.0, 2.0 * width * shadow_mfp32)
    }

    /// Returns the clear-zone volume fraction given the cross-set interaction
    pub fn clear_zone_fraction(&self, interaction: &SetInteraction, control: &PropagationControl) -> f64 {
        let chi = self.exclusion_fraction(self.total_mfp32() + interaction.shadow_mfp32, control);
        f64::max(0.0, 1.0 - chi)
    }

    /// Suggests a timestep limiting the MFP33 increase
    ///
    /// The per-step budget is `abs + frac·MFP33`, so the suggestion stays
    /// finite while the macrofracture volume is still negligible. Returns
    /// None when the set has no growing volumetric intensity yet (the caller
    /// then falls back to the loading-rate bound, the hard ceiling or the
    /// span end).
    pub fn suggest_timestep(
        &self,
        sigma_eff: &Tensor2,
        mech: &MechanicalProperties,
        control: &PropagationControl,
        interaction: &SetInteraction,
    ) -> Option<f64> {
        if self.status == DipSetStatus::Terminated {
            return None;
        }
        let (sigma_d, sense) = self.driving_stress(sigma_eff, mech);
        if sense == SlipSense::Reverse && !control.allow_reverse_fractures {
            return None;
        }
        let psi = self.clear_zone_fraction(interaction, control);
        let velocity = self.propagation_velocity(sigma_d, self.layer_thickness / 2.0, mech);
        let growth_rate = 2.0 * velocity * psi * self.active_mfp30 * self.layer_thickness * control.implicit_aperture;
        let mfp33 = self.total_mfp33(control);
        if growth_rate <= 0.0 || mfp33 <= 0.0 {
            return None;
        }
        let budget = control.max_timestep_mfp33_abs_increase + control.max_timestep_mfp33_increase * mfp33;
        Some(f64::max(budget / growth_rate, CONTROL_MIN_DT))
    }

    /// Advances the population by one timestep and appends a record
    ///
    /// Once the set is `Terminated` this is a no-op: values stay frozen and
    /// no further record is appended.
    ///
    /// # Input
    ///
    /// * `time_end` -- absolute end time of the step (s)
    /// * `dt` -- step duration (s, > 0)
    /// * `sigma_eff` -- current effective stress of the gridblock
    /// * `interaction` -- cross-set and cross-cell densities (see [`SetInteraction`])
    /// * `cell_volume` -- gridblock volume (m³), for the probabilistic nucleation limit
    /// * `rng` -- random generator used only when the probabilistic limit applies
    pub fn update(
        &mut self,
        time_end: f64,
        dt: f64,
        sigma_eff: &Tensor2,
        mech: &MechanicalProperties,
        control: &PropagationControl,
        interaction: &SetInteraction,
        cell_volume: f64,
        rng: &mut StdRng,
    ) -> Result<(), StrError> {
        if self.status == DipSetStatus::Terminated {
            return Ok(());
        }
        if dt <= 0.0 {
            return Err("the timestep duration must be > 0.0");
        }

        let (sigma_d, sense) = self.driving_stress(sigma_eff, mech);
        self.slip_sense = sense;
        let blocked = sense == SlipSense::Reverse && !control.allow_reverse_fractures;

        let chi_before = self.exclusion_fraction(self.total_mfp32() + interaction.shadow_mfp32, control);
        let psi = f64::max(0.0, 1.0 - chi_before);

        // nucleation: flux of the microfracture population across r = h/2
        let mut nucleated = if blocked {
            0.0
        } else {
            self.micro.advance(|r| subcritical_velocity(sigma_d, r, mech), dt, psi)
        };
        let limit = control.probabilistic_fracture_nucleation_limit;
        if limit > 0.0 && nucleated > 0.0 && cell_volume > 0.0 {
            let expected = nucleated * cell_volume;
            if expected < limit {
                // draw the under-resolved deterministic count probabilistically
                let count = expected.floor() + if rng.gen::<f64>() < expected.fract() { 1.0 } else { 0.0 };
                nucleated = count / cell_volume;
            }
        }
        self.active_mfp30 += nucleated;
        // a new macrofracture starts with half-length h/2 in each direction
        self.active_length += nucleated * self.layer_thickness;

        // bidirectional propagation of all active macrofractures
        let velocity = if blocked {
            0.0
        } else {
            self.propagation_velocity(sigma_d, self.layer_thickness / 2.0, mech)
        };
        self.active_length += 2.0 * velocity * psi * self.active_mfp30 * dt;

        // deactivation from the growth of the exclusion volume and from crossing sets
        let chi_after = self.exclusion_fraction(self.total_mfp32() + interaction.shadow_mfp32, control);
        if self.active_mfp30 > 0.0 {
            let d_chi = f64::max(0.0, chi_after - chi_before);
            let mut f_relay = if psi > 0.0 { f64::min(1.0, d_chi / psi) } else { 1.0 };
            let mut f_int = f64::min(1.0, velocity * psi * dt * interaction.intersect_mfp32);
            let f_total = f_relay + f_int;
            if f_total > 1.0 {
                f_relay /= f_total;
                f_int /= f_total;
            }
            let d_relay = self.active_mfp30 * f_relay;
            let d_int = self.active_mfp30 * f_int;
            let moved_fraction = (d_relay + d_int) / self.active_mfp30;
            let moved_length = self.active_length * moved_fraction;
            let relay_share = if d_relay + d_int > 0.0 { d_relay / (d_relay + d_int) } else { 0.0 };
            self.relay_mfp30 += d_relay;
            self.intersect_mfp30 += d_int;
            self.relay_length += moved_length * relay_share;
            self.intersect_length += moved_length * (1.0 - relay_share);
            self.active_mfp30 -= d_relay + d_int;
            self.active_length -= moved_length;
        }

        // track the historic peak of the active volumetric intensity
        let active_mfp33 = self.active_mfp32() * control.implicit_aperture;
        self.peak_active_mfp33 = f64::max(self.peak_active_mfp33, active_mfp33);

        // termination checks; any configured ratio ≤ 0 disables that check
        let psi_now = f64::max(0.0, 1.0 - chi_after);
        let mut terminate = psi_now < control.minimum_clear_zone_volume;
        let r_hist = control.current_historic_mfp33_termination_ratio;
        if !terminate && r_hist > 0.0 && self.peak_active_mfp33 > 0.0 {
            terminate = active_mfp33 / self.peak_active_mfp33 < r_hist;
        }
        let r_active = control.active_total_mfp30_termination_ratio;
        if !terminate && r_active > 0.0 && self.total_mfp30() > 0.0 {
            terminate = self.active_mfp30 / self.total_mfp30() < r_active;
        }
        if terminate {
            self.relay_mfp30 += self.active_mfp30;
            self.relay_length += self.active_length;
            self.active_mfp30 = 0.0;
            self.active_length = 0.0;
            self.status = DipSetStatus::Terminated;
        } else {
            self.status = if self.total_mfp30() == 0.0 {
                DipSetStatus::Nucleating
            } else if self.active_mfp30 == self.total_mfp30() {
                DipSetStatus::Active
            } else {
                DipSetStatus::PartiallyDeactivated
            };
        }

        self.series.push(TimestepRecord {
            time: time_end,
            active_mfp30: self.active_mfp30,
            static_relay_mfp30: self.relay_mfp30,
            static_intersect_mfp30: self.intersect_mfp30,
            total_mfp30: self.total_mfp30(),
            total_mfp32: self.total_mfp32(),
            total_mfp33: self.total_mfp33(control),
            micro_p32: self.micro.p32(),
            porosity: (self.micro.p32() + self.total_mfp32()) * control.implicit_aperture,
        })
    }
}

/// Returns the subcritical propagation velocity `Vmax・min(1, (K_I/K_IC)^b)` with `K_I = σd・√(π・r)`
fn subcritical_velocity(driving_stress: f64, r: f64, mech: &MechanicalProperties) -> f64 {
    if driving_stress <= 0.0 || r <= 0.0 {
        return 0.0;
    }
    let k1 = driving_stress * f64::sqrt(PI * r);
    let k1c = mech.critical_stress_intensity();
    if k1c <= 0.0 || k1 >= k1c {
        mech.critical_propagation_rate
    } else {
        mech.critical_propagation_rate * f64::powf(k1 / k1c, mech.subcritical_index)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
