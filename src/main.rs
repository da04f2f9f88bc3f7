use evo_swarm::simulation::agent::AgentType;
use evo_swarm::simulation::error::Result;
use evo_swarm::simulation::grid::Grid;
use evo_swarm::simulation::params::Params;
use evo_swarm::simulation::population::Simulation;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const DT: f32 = 0.1;
const DEFAULT_GENERATIONS: u32 = 10;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run() {
        error!(error = %e, "simulation failed");
        std::process::exit(1);
    }
}

/// Usage: `evo-swarm [params.json] [generations]`
fn run() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let params = match args.next() {
        Some(path) => Params::from_json_file(&path)?,
        None => Params::default(),
    };
    let generations = args
        .next()
        .and_then(|g| g.parse().ok())
        .unwrap_or(DEFAULT_GENERATIONS);

    let grid = Grid::new(params.grid_width, params.grid_height);
    let mut sim = Simulation::new(params, Box::new(grid))?;

    info!(generations, "starting evolution");
    for _ in 0..generations {
        sim.run_generation(DT)?;
        info!(
            generation = sim.generation(),
            herbivores = sim.population(AgentType::Herbivore),
            carnivores = sim.population(AgentType::Carnivore),
            scavengers = sim.population(AgentType::Scavenger),
            gold = sim.gold(),
            "generation finished"
        );
    }
    Ok(())
}
