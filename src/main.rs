use std::fs::File;
use std::io::{BufReader, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use ambulance_routing::{CapacityMode, Instance};
use clap::Parser;
use log::{error, info, warn};

/// Route ambulances from a shared origin to several emergencies through a capacitated road network.
#[derive(Parser, Debug)]
#[clap(name = "ambulance-routing", version)]
struct Args {
    /// Instance file (JSON) with the network, the origin, the emergencies and optionally a config
    instance: PathBuf,
    /// Wall-clock budget of the solver in seconds
    #[clap(long)]
    time_limit: Option<f64>,
    /// Required speed of the least urgent severity, km/h
    #[clap(long)]
    r_min: Option<f64>,
    /// Required speed of the most urgent severity, km/h
    #[clap(long)]
    r_max: Option<f64>,
    /// How road capacity is shared: aggregate or per-commodity
    #[clap(long)]
    capacity_mode: Option<CapacityMode>,
    /// Show the solver's own log
    #[clap(long)]
    solver_output: bool,
    /// Where to write the solution report, stdout if omitted
    #[clap(short, long)]
    output: Option<PathBuf>,
}

fn run(args: Args) -> Result<bool, Box<dyn std::error::Error>> {
    let file = File::open(&args.instance)?;
    let reader = BufReader::new(file);
    let mut instance: Instance = serde_json::from_reader(reader)?;

    let config = &mut instance.config;
    if let Some(time_limit) = args.time_limit {
        config.time_limit_secs = time_limit;
    }
    if let Some(r_min) = args.r_min {
        config.r_min = r_min;
    }
    if let Some(r_max) = args.r_max {
        config.r_max = r_max;
    }
    if let Some(mode) = args.capacity_mode {
        config.capacity_mode = mode;
    }
    config.solver_output |= args.solver_output;

    info!(
        "Routing {} emergencies from node {} over {} nodes and {} edges",
        instance.emergencies.len(),
        instance.origin,
        instance.network.nodes().len(),
        instance.network.edges().len()
    );

    let attempt = instance.solve()?;
    let report = match attempt.report {
        Some(report) => report,
        None => {
            warn!(
                "No feasible routing ({:?}); try lower speed requirements or wider capacities",
                attempt.outcome
            );
            return Ok(false);
        }
    };

    info!(
        "Total cost {:.2}, total time {:.2} min, total distance {:.2} km",
        report.total_cost, report.total_time_minutes, report.total_distance_km
    );

    match &args.output {
        Some(path) => serde_json::to_writer_pretty(File::create(path)?, &report)?,
        None => {
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            serde_json::to_writer_pretty(&mut handle, &report)?;
            writeln!(handle)?;
        }
    }

    Ok(true)
}

pub fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    match run(args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(2),
        Err(err) => {
            error!("{}", err);
            ExitCode::FAILURE
        }
    }
}
