// Radial-expansion RRT planning demo
//
// Plans through one of the preset obstacle maps (or a random one), runs the
// waypoint optimizer and prints the resulting waypoints.
//
//   RUST_LOG=debug cargo run --bin radial_rrt -- --variant rewiring --map 3 --seed 7

use std::path::PathBuf;

use clap::Parser;
use log::{info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;

use radial_rrt::mapping::DEFAULT_INFLATION;
use radial_rrt::{
    GoalRegion, ObstacleMap, PlannerVariant, PlanningError, Point2D, RrtConfig, RrtPlanner,
};

#[derive(Parser, Debug)]
#[command(name = "radial_rrt", about = "Radial-expansion RRT path planning demo")]
struct Args {
    /// Planner variant: basic, cost-greedy or rewiring
    #[arg(long, default_value = "rewiring")]
    variant: PlannerVariant,

    /// Preset map (0, 1 or 3)
    #[arg(long, default_value_t = 0)]
    map: u32,

    /// Use a random map with this many obstacles instead of a preset
    #[arg(long)]
    random: Option<usize>,

    /// Seed for reproducible sampling
    #[arg(long)]
    seed: Option<u64>,

    /// TOML planner configuration; variant defaults when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of optimization passes
    #[arg(long, default_value_t = 3)]
    runs: usize,

    #[arg(long, default_value_t = 800.0)]
    width: f64,

    #[arg(long, default_value_t = 800.0)]
    height: f64,

    /// Obstacle and border safety offset
    #[arg(long, default_value_t = DEFAULT_INFLATION)]
    inflation: f64,

    #[arg(long, default_value_t = 60.0)]
    start_x: f64,

    #[arg(long, default_value_t = 60.0)]
    start_y: f64,

    /// Goal rectangle as x, y, w, h
    #[arg(long, value_delimiter = ',', default_value = "680,680,80,80")]
    goal: Vec<f64>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            RrtConfig::load(path)?
        }
        None => RrtConfig::for_variant(args.variant),
    };

    let map = match args.random {
        Some(amount) => {
            let mut rng = match args.seed {
                Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(1)),
                None => StdRng::from_entropy(),
            };
            ObstacleMap::random(amount, args.width, args.height, args.inflation, &mut rng)
        }
        None => ObstacleMap::preset(args.map, args.width, args.height, args.inflation)?,
    };

    let goal = match args.goal.as_slice() {
        [x, y, w, h] => GoalRegion::new(*x, *y, *w, *h),
        _ => {
            return Err(PlanningError::InvalidConfiguration(
                "goal needs exactly four values".to_string(),
            )
            .into())
        }
    };
    let start = Point2D::new(args.start_x, args.start_y);

    let mut planner = match args.seed {
        Some(seed) => RrtPlanner::seeded(&map, map.bounds(), args.variant, config, seed)?,
        None => RrtPlanner::new(&map, map.bounds(), args.variant, config)?,
    };

    println!("{} RRT path planning start!!", args.variant);
    match planner.plan(start, &goal) {
        Ok(path) => info!("Raw path: {} waypoints, length {:.2}", path.len(), path.total_length()),
        Err(PlanningError::NoPathFound { nodes }) => {
            println!("Cannot find path ({} nodes grown)", nodes);
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    }

    match planner.optimize(args.runs) {
        Ok(passes) => info!("Optimization finished after {} passes", passes),
        Err(PlanningError::WaypointLimitExceeded { waypoints, limit }) => {
            warn!("Optimization stopped at {} waypoints (limit {})", waypoints, limit)
        }
        Err(e) => return Err(e.into()),
    }

    let path = planner.path();
    println!(
        "Found path with {} waypoints, length {:.2}",
        path.len(),
        path.total_length()
    );
    for p in &path.points {
        println!("{:.1}\t{:.1}", p.x, p.y);
    }
    println!("{} RRT path planning finish!!", args.variant);
    Ok(())
}
