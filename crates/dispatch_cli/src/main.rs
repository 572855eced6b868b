use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{ensure, Context, Result};
use bevy_ecs::prelude::World;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};

use dispatch_core::clock::SimulationClock;
use dispatch_core::runner::{run_next_event, simulation_schedule};
use dispatch_core::scenario::{build_scenario, SimulationEndTime, SimulationParams};
use dispatch_core::telemetry::build_report;

mod loaders;

/// Road-network ride-dispatch simulator.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Path of the road-network JSON file
    #[clap(long)]
    map_file: PathBuf,
    /// Path of the request trace CSV file
    #[clap(long)]
    resource_file: PathBuf,
    /// Path of a KML bounding polygon used to crop the map
    #[clap(long)]
    bounding_polygon_file: Option<PathBuf>,
    /// Number of vehicles to deploy
    #[clap(long, default_value_t = 100)]
    vehicles: u64,
    /// Maximum life time of a request, in seconds
    #[clap(long, default_value_t = 600)]
    max_life_time: u64,
    /// Seed for random vehicle placement
    #[clap(long, default_value_t = 0)]
    placement_seed: u64,
    /// Travel-time scaling for traffic and turn delays, in (0, 1]
    #[clap(long, default_value_t = 1.0)]
    speed_reduction: f64,
}

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::init();

    ensure!(
        args.speed_reduction > 0.0 && args.speed_reduction <= 1.0,
        "speed reduction must be in (0, 1]"
    );

    let polygon = args
        .bounding_polygon_file
        .as_deref()
        .map(loaders::polygon::load_polygon)
        .transpose()
        .context("loading bounding polygon")?;

    println!("Creating the map and pre-computing all pair travel times...");
    let map = Arc::new(
        loaders::map_file::load_map(&args.map_file, polygon.as_ref(), args.speed_reduction)
            .context("loading map")?,
    );

    println!("Loading and map-matching requests...");
    let requests =
        loaders::trace::load_requests(&args.resource_file, &map).context("loading request trace")?;
    ensure!(!requests.is_empty(), "request trace is empty");
    let total_requests = requests.len();

    let params = SimulationParams::default()
        .with_vehicles(args.vehicles)
        .with_max_life_secs(args.max_life_time)
        .with_placement_seed(args.placement_seed);

    println!("Randomly placing {} vehicles on the map...", args.vehicles);
    let mut world = World::new();
    build_scenario(&mut world, map, requests, params);
    let mut schedule = simulation_schedule();

    println!("Running the simulation...");
    let end_time = world.resource::<SimulationEndTime>().0;
    let begin_time = world
        .resource::<SimulationClock>()
        .peek()
        .map(|event| event.time)
        .unwrap_or(0);

    let progress = ProgressBar::new(100);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
            .unwrap()
            .progress_chars("#>-"),
    );
    while run_next_event(&mut world, &mut schedule) {
        let now = world.resource::<SimulationClock>().now();
        if end_time > begin_time {
            progress.set_position(((now.saturating_sub(begin_time)) * 100
                / (end_time - begin_time))
                .min(100));
        }
    }
    progress.finish_and_clear();
    println!("Simulation finished.");

    println!("\n***Simulation environment***");
    println!("JSON map file: {}", args.map_file.display());
    println!("Request trace file: {}", args.resource_file.display());
    match &args.bounding_polygon_file {
        Some(path) => println!("Bounding polygon KML file: {}", path.display()),
        None => println!("Bounding polygon KML file: (none)"),
    }
    println!("Number of vehicles: {}", args.vehicles);
    println!("Number of requests: {total_requests}");
    println!("Request maximum life time: {} seconds", args.max_life_time);
    println!("Speed reduction: {}", args.speed_reduction);
    println!("Placement seed: {}", args.placement_seed);

    let report = build_report(&world);
    println!("\n{report}");
    Ok(())
}
