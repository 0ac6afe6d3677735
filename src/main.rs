//! Demo: an agent crossing a small level
//!
//! Usage: `platform-nav [config.ron|config.json]`
//!
//! Set `RUST_LOG=debug` to see planning and sensor decisions.

use std::process::ExitCode;

use platform_nav::prelude::*;

/// Level geometry, top row first
const LEVEL: &str = "
################
#..............#
#.......T......#
#S.............#
#####....#######
#####.....#....#
#####.......G..#
################
";

/// Tile edge length in world units
const TILE: f32 = 1.0;

/// Variable frame length of the simulated host loop
const FRAME: f32 = 1.0 / 60.0;

/// Give up after this many simulated seconds
const TIME_LIMIT: f32 = 30.0;

fn load_config() -> Result<NavConfig, String> {
    match std::env::args().nth(1) {
        Some(path) => {
            let config = NavConfig::load(&path).map_err(|e| format!("{path}: {e}"))?;
            log::info!("Loaded config from {path}");
            Ok(config)
        }
        None => Ok(NavConfig::default()),
    }
}

fn run() -> Result<f32, String> {
    let config = load_config()?;
    let layout = TileLayout::parse(LEVEL).map_err(|e| format!("level: {e}"))?;
    let (Some(start), Some(goal)) = (layout.start(), layout.goal()) else {
        return Err("level needs a start and a goal".to_string());
    };

    let mut physics = Physics::new();
    layout.populate(&mut physics, Vec2::ZERO, TILE, LayerMask::GROUND);
    // The body collides with solids only
    physics.set_queries_hit_triggers(false);

    let size = layout.world_size(TILE);
    let grid_config = config.grid.clone().with_bounds(size * 0.5, size);
    let grid = GridBuilder::new(grid_config).build(&mut physics);
    log::debug!("Navigation grid:\n{}", grid.describe());

    let feet = Vec2::new(start.0 as f32 + 0.5, start.1 as f32) * TILE;
    // Lower quarter of the goal tile: the cell the body stands in
    let goal = Vec2::new(goal.0 as f32 + 0.5, goal.1 as f32 + 0.25) * TILE;
    let mut body = PlatformerBody::new(config.body.clone(), feet);
    let mut agent = NavAgent::new(&config);
    agent.set_target(goal);

    let mut elapsed = 0.0;
    let mut next_report = 1.0;
    while elapsed < TIME_LIMIT {
        let steps = agent.update(FRAME, &grid, &body);
        for _ in 0..steps {
            let sensors = body.sensors(&physics, &config.sensors);
            let command = agent.fixed_update(&mut body, &sensors);
            if let AgentCommand::Scan(phase) = command {
                log::trace!("Scanning: {phase:?}");
            }
            body.step(&physics, agent.fixed_step());
        }
        elapsed += FRAME;

        let cell = grid.world_to_cell(body.position() + Vec2::Y * grid.cell_diameter() * 0.5);
        if cell == grid.world_to_cell(goal) && !agent.follower().has_path() {
            log::info!("{}", agent.follower().planner().stats().format_stats());
            return Ok(elapsed);
        }

        if elapsed >= next_report {
            next_report += 1.0;
            log::info!(
                "t = {elapsed:.1}s at {} (waypoint {}/{})",
                body.position(),
                agent.follower().index(),
                agent.follower().path().len()
            );
        }
    }

    Err(format!(
        "goal not reached after {TIME_LIMIT}s, agent at {}",
        body.position()
    ))
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run() {
        Ok(seconds) => {
            log::info!("Reached goal in {seconds:.2}s");
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
