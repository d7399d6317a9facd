use fracsim::prelude::*;
use russell_chk::assert_approx_eq;

/// Builds a horizontal-extension schedule strong enough to overcome the
/// initial compression at 2 km burial
fn extension_schedule(exx: f64, eyy: f64) -> EpisodeSchedule {
    let strain_rate = Tensor2::from_components(exx, eyy, 0.0, 0.0, 0.0, 0.0);
    let episode =
        DeformationEpisode::from_strain_rate(strain_rate, EpisodeDuration::Fixed(1e5), TimeUnits::Years).unwrap();
    let mut schedule = EpisodeSchedule::new();
    schedule.push(episode).unwrap();
    schedule
}

fn box_cell(
    col: usize,
    base_azimuth: f64,
    micro_density: f64,
    schedule: EpisodeSchedule,
    control: &PropagationControl,
) -> Result<Gridblock, StrError> {
    let x0 = col as f64 * 100.0;
    let corners = CornerPoints::new_box(x0, 0.0, x0 + 100.0, 100.0, 1995.0, 2005.0)?;
    let mech = MechanicalProperties::sample_brittle_sandstone();
    let mut config = GridblockConfig::sample();
    config.base_azimuth = Some(base_azimuth);
    config.initial_micro_density = micro_density;
    config.random_seed = 3000 + col as u64;
    Gridblock::new(corners, &mech, &config, schedule, control)
}

#[test]
fn barren_rock_produces_no_fractures() -> Result<(), StrError> {
    // a cell without a seed microfracture population never grows anything,
    // no matter how strongly it is loaded
    let control = PropagationControl::new();
    let cells = vec![Some(box_cell(0, 0.0, 0.0, extension_schedule(1e-8, 0.0), &control)?)];
    let mut grid = FractureGrid::new(1, 1, cells)?;
    let summary = grid.run(&control, &ProgressMonitor::new(1))?;
    assert_eq!(summary.n_finished, 1);
    let cell = grid.cell(0, 0)?.unwrap();
    assert_eq!(cell.total_mfp30(), 0.0);
    assert_eq!(cell.total_mfp32(), 0.0);

    // the explicit network is empty as well
    let config = DfnGenerationConfig::new();
    let generator = DfnGenerator::new(&grid, &control, &config)?;
    let snapshots = generator.generate(&ProgressMonitor::new(1))?;
    assert_eq!(snapshots.len(), 1);
    assert!(snapshots[0].macrofractures.is_empty());
    assert!(snapshots[0].microfractures.is_empty());
    Ok(())
}

#[test]
fn seeded_cell_grows_saturates_and_conserves() -> Result<(), StrError> {
    let control = PropagationControl::new();
    let cells = vec![Some(box_cell(0, 0.0, 1e-6, extension_schedule(1e-8, 0.0), &control)?)];
    let mut grid = FractureGrid::new(1, 1, cells)?;
    grid.run(&control, &ProgressMonitor::new(1))?;
    let cell = grid.cell(0, 0)?.unwrap();
    assert!(cell.total_mfp30() > 0.0);
    assert!(cell.n_timesteps() <= control.max_timesteps);

    // every recorded timestep conserves the population buckets and the
    // cumulative intensity never decreases
    for set in &cell.fracture_sets {
        for dip_set in &set.dip_sets {
            let mut previous = 0.0;
            for index in 0..dip_set.series().len() {
                let record = dip_set.series().get(index)?;
                assert_approx_eq!(
                    record.active_mfp30 + record.static_relay_mfp30 + record.static_intersect_mfp30,
                    record.total_mfp30,
                    1e-12 * f64::max(record.total_mfp30, 1.0)
                );
                assert!(record.total_mfp32 >= previous);
                previous = record.total_mfp32;
            }
        }
    }
    Ok(())
}

#[test]
fn isotropic_extension_grows_orthogonal_sets_equally() -> Result<(), StrError> {
    // equal horizontal extension gives both orthogonal sets the same driving
    // stress, so they must end with identical populations
    let control = PropagationControl::new();
    let cells = vec![Some(box_cell(0, 0.0, 1e-6, extension_schedule(1e-8, 1e-8), &control)?)];
    let mut grid = FractureGrid::new(1, 1, cells)?;
    grid.run(&control, &ProgressMonitor::new(1))?;
    let cell = grid.cell(0, 0)?.unwrap();
    let (a, b) = (&cell.fracture_sets[0], &cell.fracture_sets[1]);
    assert!(a.total_mfp32() > 0.0);
    assert_approx_eq!(a.total_mfp30(), b.total_mfp30(), 1e-12 * f64::max(a.total_mfp30(), 1.0));
    assert_approx_eq!(a.total_mfp32(), b.total_mfp32(), 1e-12 * f64::max(a.total_mfp32(), 1.0));
    assert_approx_eq!(cell.p32_anisotropy(), 0.0, 1e-12);
    Ok(())
}

#[test]
fn conjugate_dip_pairs_grow_symmetrically() -> Result<(), StrError> {
    // dipping sets come as biazimuthal conjugate pairs; under a shear-free
    // load both members see the same resolved stress and grow identically
    let control = PropagationControl::new();
    let corners = CornerPoints::new_box(0.0, 0.0, 100.0, 100.0, 1995.0, 2005.0)?;
    let mech = MechanicalProperties::sample_brittle_sandstone();
    let mut config = GridblockConfig::sample();
    config.fracture_set_count = 1;
    config.fracture_dip = Some(std::f64::consts::PI / 3.0);
    config.initial_micro_density = 1e-6;
    let mut cell = Gridblock::new(corners, &mech, &config, extension_schedule(0.0, 1e-8), &control)?;
    cell.run(&control)?;
    let set = &cell.fracture_sets[0];
    assert_eq!(set.dip_sets.len(), 2);
    let (a, b) = (&set.dip_sets[0], &set.dip_sets[1]);
    assert!(a.total_mfp32() > 0.0);
    assert_approx_eq!(a.total_mfp30(), b.total_mfp30(), 1e-12 * f64::max(a.total_mfp30(), 1.0));
    assert_approx_eq!(a.total_mfp32(), b.total_mfp32(), 1e-12 * f64::max(a.total_mfp32(), 1.0));
    Ok(())
}

#[test]
fn fractures_cross_consistent_cell_boundaries_only() -> Result<(), StrError> {
    // two cells whose matching sets differ in strike by about 8.6 degrees;
    // extension along y drives the east-west striking sets across the shared
    // boundary
    let control = PropagationControl::new();
    let build = |control: &PropagationControl| -> Result<FractureGrid, StrError> {
        let cells = vec![
            Some(box_cell(0, 0.0, 1e-8, extension_schedule(0.0, 1e-8), control)?),
            Some(box_cell(1, 0.15, 1e-8, extension_schedule(0.0, 1e-8), control)?),
        ];
        FractureGrid::new(1, 2, cells)
    };
    let mut grid = build(&control)?;
    grid.run(&control, &ProgressMonitor::new(2))?;

    let count_crossings = |snapshots: &[GlobalDfn]| -> usize {
        snapshots[0]
            .macrofractures
            .iter()
            .filter(|f| f.segments_plus.len() > 1 || f.segments_minus.len() > 1)
            .count()
    };

    // within the consistency angle the fracture continues into the neighbor
    let permissive = DfnGenerationConfig::new();
    let generator = DfnGenerator::new(&grid, &control, &permissive)?;
    let snapshots = generator.generate(&ProgressMonitor::new(2))?;
    assert!(!snapshots[0].macrofractures.is_empty());
    assert!(count_crossings(&snapshots) > 0);

    // with a near-zero consistency angle every fracture stops at the boundary
    let mut strict = DfnGenerationConfig::new();
    strict.set_max_consistency_angle(0.01)?;
    let generator = DfnGenerator::new(&grid, &control, &strict)?;
    let snapshots = generator.generate(&ProgressMonitor::new(2))?;
    assert_eq!(count_crossings(&snapshots), 0);
    Ok(())
}

#[test]
fn continuation_matches_sets_across_different_indices() -> Result<(), StrError> {
    // the east cell's strike fan is rotated a quarter turn, so the set that
    // lines up with the west cell's growing set sits at a different set index
    let control = PropagationControl::new();
    let cells = vec![
        Some(box_cell(0, 0.0, 1e-8, extension_schedule(0.0, 1e-8), &control)?),
        Some(box_cell(1, std::f64::consts::FRAC_PI_2, 1e-8, extension_schedule(0.0, 1e-8), &control)?),
    ];
    let mut grid = FractureGrid::new(1, 2, cells)?;
    grid.run(&control, &ProgressMonitor::new(2))?;
    let config = DfnGenerationConfig::new();
    let generator = DfnGenerator::new(&grid, &control, &config)?;
    let snapshots = generator.generate(&ProgressMonitor::new(2))?;
    let crossings = snapshots[0]
        .macrofractures
        .iter()
        .filter(|f| f.segments_plus.len() > 1 || f.segments_minus.len() > 1)
        .count();
    assert!(crossings > 0);
    Ok(())
}

#[test]
fn aperture_model_flows_into_the_explicit_network() -> Result<(), StrError> {
    let control = PropagationControl::new();
    let cells = vec![Some(box_cell(0, 0.0, 1e-9, extension_schedule(1e-8, 0.0), &control)?)];
    let mut grid = FractureGrid::new(1, 1, cells)?;
    grid.run(&control, &ProgressMonitor::new(1))?;

    let mut config = DfnGenerationConfig::new();
    config.aperture_model = ApertureModel::BartonBandis {
        jrc: 10.0,
        ucs_ratio: 2.0,
        initial_normal_stress: 0.0,
        normal_stiffness: 1e10,
        maximum_closure: 3e-4,
    };
    let generator = DfnGenerator::new(&grid, &control, &config)?;
    let snapshots = generator.generate(&ProgressMonitor::new(1))?;
    assert!(!snapshots[0].macrofractures.is_empty());
    for fracture in &snapshots[0].macrofractures {
        for segment in fracture.segments_plus.iter().chain(fracture.segments_minus.iter()) {
            // Barton-Bandis apertures are bounded by E0 and E0 − Vm
            assert!(segment.aperture <= 6e-4 + 1e-15);
            assert!(segment.aperture >= 3e-4 - 1e-15);
            assert_approx_eq!(
                segment.permeability(),
                segment.aperture * segment.aperture / 12.0,
                1e-24
            );
        }
    }
    Ok(())
}

#[test]
fn timestep_budget_always_terminates_the_run() -> Result<(), StrError> {
    // an open-ended episode is bounded by the timestep budget
    let strain_rate = Tensor2::from_components(1e-8, 0.0, 0.0, 0.0, 0.0, 0.0);
    let episode =
        DeformationEpisode::from_strain_rate(strain_rate, EpisodeDuration::UntilSaturation, TimeUnits::Years)?;
    let mut schedule = EpisodeSchedule::new();
    schedule.push(episode)?;
    let mut control = PropagationControl::new();
    control.set_max_timesteps(100)?.set_max_timestep_duration(1e10)?;
    let corners = CornerPoints::new_box(0.0, 0.0, 100.0, 100.0, 1995.0, 2005.0)?;
    let mech = MechanicalProperties::sample_brittle_sandstone();
    let mut config = GridblockConfig::sample();
    config.initial_micro_density = 1e-6;
    let mut cell = Gridblock::new(corners, &mech, &config, schedule, &control)?;
    cell.run(&control)?;
    assert!(cell.is_finished());
    assert!(cell.n_timesteps() <= 100);
    Ok(())
}
