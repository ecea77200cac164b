use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use nalgebra::Point3;

use dem::config::Dimension;
use dem::logging::RunLog;
use dem::output::{load_checkpoint, Outputs};
use dem::simulation::{SolveOptions, StopReason};

mod scenario;

use scenario::ChuteSetup;

#[derive(Parser, Debug)]
#[command(name = "dem", version, about = "Run a periodic chute flow with the dem engine")]
struct Opts {
    /// Lower domain corner as x,y,z
    #[arg(long, value_parser = parse_point, default_value = "0,0,0")]
    domain_min: Point3<f64>,

    /// Upper domain corner as x,y,z
    #[arg(long, value_parser = parse_point, default_value = "20,10,20")]
    domain_max: Point3<f64>,

    /// Time step (default: collision time / 50)
    #[arg(long)]
    time_step: Option<f64>,

    /// End time of the run
    #[arg(long, default_value_t = 1.0)]
    max_time: f64,

    /// Write outputs every N steps
    #[arg(long, default_value_t = 1000)]
    save_every: u64,

    /// Continue from this restart file if it exists
    #[arg(long)]
    restart: Option<PathBuf>,

    /// Directory for .data/.fstat/.ene/.restart files
    #[arg(long, default_value = "out")]
    output_dir: PathBuf,

    /// Run name, used as the output file stem
    #[arg(long, default_value = "chute")]
    name: String,

    /// Number of particles to insert
    #[arg(long, default_value_t = 500)]
    particles: u64,

    /// Chute inclination in degrees
    #[arg(long, default_value_t = 24.0)]
    inclination: f64,

    /// Mean particle radius
    #[arg(long, default_value_t = 0.5)]
    radius: f64,

    /// Relative radius spread
    #[arg(long, default_value_t = 0.1)]
    polydispersity: f64,

    /// Collision time of a typical pair
    #[arg(long, default_value_t = 0.005)]
    collision_time: f64,

    /// Normal restitution coefficient
    #[arg(long, default_value_t = 0.8)]
    restitution: f64,

    /// Sliding friction coefficient
    #[arg(long, default_value_t = 0.5)]
    friction: f64,

    /// Spatial dimension, 2 or 3
    #[arg(long, default_value_t = 3)]
    dimension: u8,

    /// Seed for particle insertion
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Stop and checkpoint after this many seconds of wall-clock time
    #[arg(long)]
    wall_time: Option<f64>,
}

fn parse_point(s: &str) -> Result<Point3<f64>, String> {
    let parts: Vec<f64> = s
        .split(',')
        .map(|p| p.trim().parse::<f64>().map_err(|e| format!("'{p}': {e}")))
        .collect::<Result<_, _>>()?;
    match parts.as_slice() {
        [x, y, z] => Ok(Point3::new(*x, *y, *z)),
        _ => Err(format!("expected three comma-separated numbers, got '{s}'")),
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let opt = Opts::parse();

    let dimension = match opt.dimension {
        2 => Dimension::Two,
        3 => Dimension::Three,
        other => bail!("dimension must be 2 or 3, got {other}"),
    };

    let setup = ChuteSetup {
        name: opt.name.clone(),
        dimension,
        domain_min: opt.domain_min,
        domain_max: opt.domain_max,
        inclination: opt.inclination,
        radius: opt.radius,
        polydispersity: opt.polydispersity,
        particles: opt.particles,
        density: 1.0,
        collision_time: opt.collision_time,
        restitution: opt.restitution,
        friction: opt.friction,
        time_step: opt.time_step,
        max_time: opt.max_time,
        save_every: opt.save_every,
        seed: opt.seed,
    };

    let restored = match &opt.restart {
        Some(path) => load_checkpoint(path, &RunLog::Global)
            .with_context(|| format!("reading restart file {}", path.display()))?,
        None => None,
    };
    let mut sim = match restored {
        Some(sim) => {
            log::info!(
                "restarting from {} at t = {}",
                opt.restart.as_deref().unwrap_or(std::path::Path::new("")).display(),
                sim.time()
            );
            sim
        }
        None => setup.build()?,
    };

    let mut outputs = Outputs::in_directory(&opt.output_dir, &opt.name)
        .with_context(|| format!("creating outputs in {}", opt.output_dir.display()))?;

    let mut options = SolveOptions::default();
    if let Some(seconds) = opt.wall_time {
        options = options.with_wall_clock_limit(Duration::from_secs_f64(seconds.max(0.0)));
    }

    let summary = sim.solve_with(&mut outputs, options, |_| true)?;

    println!(
        "{}: t = {} after {} steps, {} particles, {} saves",
        opt.name,
        summary.time,
        summary.steps,
        sim.particles().real_count(),
        summary.saves
    );
    if summary.stop == StopReason::WallClock {
        println!("stopped on wall-clock limit; rerun with --restart to continue");
    }
    Ok(())
}
