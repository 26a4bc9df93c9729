use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::bounds::Bounds;
use super::error::ConfigError;

/// What happens when the head leaves the play field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BoundaryPolicy {
    /// Re-enter at the opposite edge of the playable area
    #[default]
    Wrap,
    /// Leaving the playable area (or touching the header band) is fatal
    HardWall,
}

/// What the engine reports when a round ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GameOverPolicy {
    /// Emit a `GameOver` event with the final score, then reset
    #[default]
    Notify,
    /// Reset without telling anyone
    SilentReset,
}

/// When the tick period shrinks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SpeedTrigger {
    /// On every level advance
    #[default]
    Level,
    /// On every food eaten
    Food,
}

/// How obstacles are laid out for a level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "kind")]
pub enum ObstacleLayout {
    /// `per_level * level` random cells
    Random { per_level: usize },
    /// Hand-authored wall patterns, empty for levels without one
    Maze,
}

impl Default for ObstacleLayout {
    fn default() -> Self {
        ObstacleLayout::Random { per_level: 2 }
    }
}

/// Configuration for the game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Edge length of one cell, in viewport units
    pub grid_size: i32,
    /// Viewport width in viewport units
    pub viewport_width: i32,
    /// Viewport height in viewport units, header band included
    pub viewport_height: i32,
    /// Height of the band reserved for score/title text
    pub header_height: i32,

    /// Initial length of the snake
    pub initial_snake_length: usize,
    /// Starting head cell, relative to the playable origin
    pub start_cell: (i32, i32),

    pub boundary: BoundaryPolicy,
    pub game_over: GameOverPolicy,
    pub obstacles: ObstacleLayout,

    /// Points per food eaten
    pub score_per_food: u32,
    /// Food eaten per level advance
    pub level_threshold: u32,

    /// Tick period at the start of a round
    pub initial_speed_ms: u64,
    /// Decrement applied on each speed-up
    pub speed_step_ms: u64,
    /// Fastest allowed tick period
    pub min_speed_ms: u64,
    pub speed_trigger: SpeedTrigger,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            grid_size: 20,
            viewport_width: 20 * 32,
            viewport_height: 20 * 24,
            header_height: 20 * 2,
            initial_snake_length: 3,
            start_cell: (5, 5),
            boundary: BoundaryPolicy::default(),
            game_over: GameOverPolicy::default(),
            obstacles: ObstacleLayout::default(),
            score_per_food: 1,
            level_threshold: 5,
            initial_speed_ms: 100,
            speed_step_ms: 5,
            min_speed_ms: 50,
            speed_trigger: SpeedTrigger::default(),
        }
    }
}

impl GameConfig {
    /// Create a configuration whose playable area is `columns` x `rows` cells
    pub fn new(columns: i32, rows: i32) -> Self {
        let defaults = Self::default();
        Self {
            viewport_width: columns * defaults.grid_size,
            viewport_height: rows * defaults.grid_size + defaults.header_height,
            ..defaults
        }
    }

    /// Create a small grid for testing
    pub fn small() -> Self {
        Self::new(10, 10)
    }

    /// Load a configuration from a JSON file. Missing fields take defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Self = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Play-field geometry for the configured viewport
    pub fn bounds(&self) -> Bounds {
        Bounds::from_viewport(
            self.viewport_width,
            self.viewport_height,
            self.header_height,
            self.grid_size,
        )
    }

    /// Next tick period after one speed-up, never below the floor
    pub fn faster(&self, speed_ms: u64) -> u64 {
        speed_ms.saturating_sub(self.speed_step_ms).max(self.min_speed_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid_size <= 0 {
            return Err(ConfigError::ZeroGridSize);
        }
        if self.initial_snake_length == 0 {
            return Err(ConfigError::EmptySnake);
        }
        if self.level_threshold == 0 {
            return Err(ConfigError::ZeroLevelThreshold);
        }
        if self.min_speed_ms == 0 {
            return Err(ConfigError::ZeroSpeedFloor);
        }
        if self.min_speed_ms > self.initial_speed_ms {
            return Err(ConfigError::SpeedFloorAboveInitial {
                min: self.min_speed_ms,
                initial: self.initial_speed_ms,
            });
        }
        if !self.bounds().is_playable() {
            return Err(ConfigError::NoPlayableArea {
                width: self.viewport_width,
                height: self.viewport_height,
                header: self.header_height,
            });
        }
        let cells = self.bounds().cell_count();
        let needed = self.initial_snake_length.saturating_add(1);
        if cells < needed {
            return Err(ConfigError::BoardTooSmall { cells, needed });
        }
        Ok(())
    }
}
