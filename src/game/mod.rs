//! Core game logic module for Snake
//!
//! This module contains all the game logic without any I/O or rendering dependencies.
//! The host drives it by calling [`GameEngine::step`] once per tick and posting
//! steering through [`GameState::set_pending_direction`] in between.

pub mod action;
pub mod bounds;
pub mod config;
pub mod engine;
pub mod error;
pub mod food;
pub mod level;
pub mod state;

// Re-export commonly used types
pub use action::Direction;
pub use bounds::Bounds;
pub use config::{BoundaryPolicy, GameConfig, GameOverPolicy, ObstacleLayout, SpeedTrigger};
pub use engine::{GameEngine, GameEvent, StepResult};
pub use error::{ConfigError, PlacementError};
pub use state::{CollisionType, GameState, Position, RoundEnd, Snake, Snapshot};
