use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use grid_snake::game::{
    BoundaryPolicy, GameConfig, GameEngine, GameOverPolicy, ObstacleLayout, SpeedTrigger,
};
use grid_snake::modes::{HumanMode, ViewportSource};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "grid_snake")]
#[command(version, about = "Snake with obstacles, levels and speed-ups")]
struct Cli {
    /// Game mode
    #[arg(long, default_value = "human")]
    mode: Mode,

    /// JSON game configuration; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Board width in cells (default: fit the terminal)
    #[arg(long, requires = "height")]
    width: Option<i32>,

    /// Board height in cells (default: fit the terminal)
    #[arg(long, requires = "width")]
    height: Option<i32>,

    /// What happens at the edge of the board
    #[arg(long)]
    boundary: Option<Boundary>,

    /// Obstacle layout
    #[arg(long)]
    layout: Option<Layout>,

    /// Restart silently instead of showing the final score
    #[arg(long)]
    silent_reset: bool,

    /// Speed up on every food instead of on every level
    #[arg(long)]
    speed_per_food: bool,

    /// Food needed per level
    #[arg(long)]
    level_threshold: Option<u32>,

    /// Seed for food and obstacle placement
    #[arg(long)]
    seed: Option<u64>,

    /// Write logs to this file (filtered by RUST_LOG, default "info")
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[derive(Clone, ValueEnum)]
enum Mode {
    /// Play snake with keyboard or mouse controls
    Human,
}

#[derive(Clone, Copy, ValueEnum)]
enum Boundary {
    Wrap,
    HardWall,
}

#[derive(Clone, Copy, ValueEnum)]
enum Layout {
    Random,
    Maze,
}

impl Cli {
    /// Configuration file (or defaults) with command-line overrides applied
    fn game_config(&self) -> Result<GameConfig> {
        let mut config = match &self.config {
            Some(path) => GameConfig::from_json_file(path)?,
            None => GameConfig::default(),
        };

        if let (Some(width), Some(height)) = (self.width, self.height) {
            config.viewport_width = width
                .checked_mul(config.grid_size)
                .with_context(|| format!("Board width {} is too large", width))?;
            config.viewport_height = height
                .checked_mul(config.grid_size)
                .and_then(|h| h.checked_add(config.header_height))
                .with_context(|| format!("Board height {} is too large", height))?;
        }
        if let Some(boundary) = self.boundary {
            config.boundary = match boundary {
                Boundary::Wrap => BoundaryPolicy::Wrap,
                Boundary::HardWall => BoundaryPolicy::HardWall,
            };
        }
        if let Some(layout) = self.layout {
            config.obstacles = match layout {
                Layout::Random => ObstacleLayout::default(),
                Layout::Maze => ObstacleLayout::Maze,
            };
        }
        if self.silent_reset {
            config.game_over = GameOverPolicy::SilentReset;
        }
        if self.speed_per_food {
            config.speed_trigger = SpeedTrigger::Food;
        }
        if let Some(threshold) = self.level_threshold {
            config.level_threshold = threshold;
        }

        config.validate().context("Invalid game configuration")?;
        Ok(config)
    }

    fn viewport(&self) -> ViewportSource {
        if self.width.is_some() {
            ViewportSource::Fixed
        } else {
            ViewportSource::Terminal
        }
    }
}

/// Log to a file; the terminal belongs to the game
fn init_logging(path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create log file {}", path.display()))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = &cli.log_file {
        init_logging(path)?;
    }

    let config = cli.game_config()?;
    let engine = match cli.seed {
        Some(seed) => GameEngine::with_seed(config, seed),
        None => GameEngine::new(config),
    };

    // Dispatch to appropriate mode
    match cli.mode {
        Mode::Human => {
            let mut human_mode = HumanMode::with_engine(engine, cli.viewport())?;
            human_mode.run().await?;
        }
    }

    Ok(())
}
