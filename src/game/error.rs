use thiserror::Error;

/// Failure to find a free cell for food or obstacles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PlacementError {
    #[error("no free cell left in a {columns}x{rows} play field")]
    NoSpaceAvailable { columns: i32, rows: i32 },
}

/// Rejected game configuration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("grid_size must be positive")]
    ZeroGridSize,
    #[error("initial_snake_length must be at least 1")]
    EmptySnake,
    #[error("level_threshold must be at least 1")]
    ZeroLevelThreshold,
    #[error("min_speed_ms {min} is above initial_speed_ms {initial}")]
    SpeedFloorAboveInitial { min: u64, initial: u64 },
    #[error("min_speed_ms must be positive")]
    ZeroSpeedFloor,
    #[error("viewport {width}x{height} leaves no playable cell below a {header} header")]
    NoPlayableArea { width: i32, height: i32, header: i32 },
    #[error("play field has {cells} cells; the starting snake and its food need {needed}")]
    BoardTooSmall { cells: usize, needed: usize },
}
