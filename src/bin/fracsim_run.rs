use fracsim::prelude::*;
use serde::Deserialize;
use std::fs;
use structopt::StructOpt;

/// Command line options
#[derive(StructOpt, Debug)]
#[structopt(
    name = "fracsim_run",
    about = "Runs a fracture growth scenario and generates the explicit fracture network"
)]
struct Options {
    /// Path of the scenario file (JSON)
    scenario: String,

    /// Path of the DFN output file (JSON); omit to skip the explicit network
    #[structopt(short, long)]
    output: Option<String>,
}

/// Describes one complete simulation scenario on a regular grid of box cells
#[derive(Deserialize)]
struct Scenario {
    /// Number of grid rows
    nrows: usize,

    /// Number of grid columns
    ncols: usize,

    /// Southwest corner of the grid (x, y)
    origin: [f64; 2],

    /// Horizontal cell size (dx, dy)
    cell_size: [f64; 2],

    /// Burial depth of the layer top and bottom (m)
    z_top: f64,
    z_bottom: f64,

    /// Mechanical constants shared by all cells
    mechanics: MechanicalProperties,

    /// Burial, fluid and seed-population configuration shared by all cells
    cell: GridblockConfig,

    /// Propagation control options
    control: PropagationControl,

    /// Loading history shared by all cells
    schedule: EpisodeSchedule,

    /// Explicit network generation options (omit to skip)
    dfn: Option<DfnGenerationConfig>,
}

fn main() -> Result<(), StrError> {
    // logging
    env_logger::init();

    // parse options
    let options = Options::from_args();

    // load scenario
    let text = fs::read_to_string(&options.scenario).map_err(|_| "cannot read the scenario file")?;
    let scenario: Scenario = serde_json::from_str(&text).map_err(|_| "cannot parse the scenario file")?;

    // build the grid
    let mut cells = Vec::with_capacity(scenario.nrows * scenario.ncols);
    for row in 0..scenario.nrows {
        for col in 0..scenario.ncols {
            let x0 = scenario.origin[0] + col as f64 * scenario.cell_size[0];
            let y0 = scenario.origin[1] + row as f64 * scenario.cell_size[1];
            let corners = CornerPoints::new_box(
                x0,
                y0,
                x0 + scenario.cell_size[0],
                y0 + scenario.cell_size[1],
                scenario.z_top,
                scenario.z_bottom,
            )?;
            let mut cell_config = scenario.cell.clone();
            cell_config.random_seed = scenario.cell.random_seed + (row * scenario.ncols + col) as u64;
            cells.push(Some(Gridblock::new(
                corners,
                &scenario.mechanics,
                &cell_config,
                scenario.schedule.clone(),
                &scenario.control,
            )?));
        }
    }
    let mut grid = FractureGrid::new(scenario.nrows, scenario.ncols, cells)?;

    // run the growth calculation
    let n_episodes = scenario.schedule.len();
    let monitor = ProgressMonitor::new(scenario.nrows * scenario.ncols * n_episodes);
    let summary = grid.run(&scenario.control, &monitor)?;

    // generate and write the explicit network
    let mut n_fractures = 0;
    if let (Some(dfn_config), Some(output)) = (&scenario.dfn, &options.output) {
        let generator = DfnGenerator::new(&grid, &scenario.control, dfn_config)?;
        let dfn_monitor = ProgressMonitor::new(generator.stage_times()?.len() * grid.n_populated());
        let snapshots = generator.generate(&dfn_monitor)?;
        n_fractures = snapshots.last().map_or(0, |s| s.macrofractures.len());
        let json = serde_json::to_string_pretty(&snapshots).map_err(|_| "cannot serialize the fracture network")?;
        fs::write(output, json).map_err(|_| "cannot write the output file")?;
    }

    // message
    let line = format!("{:─^1$}", "", 48);
    println!("\n{}", line);
    println!("cells computed ........ {}", summary.n_cells);
    println!("cells finished ........ {}", summary.n_finished);
    println!("timesteps total ....... {}", summary.n_timesteps);
    if summary.aborted {
        println!("status ................ aborted (partial results)");
    }
    if let Some(output) = &options.output {
        println!("fractures generated ... {}", n_fractures);
        println!("network written to .... {}", output);
    }
    println!("{}\n", line);
    Ok(())
}
