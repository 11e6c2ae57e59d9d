use thiserror::Error;

/// Errors surfaced by grid placement, configuration and population setup.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Rejection sampling ran out of attempts before the population was complete.
    #[error(
        "grid cannot hold the requested population: placed {placed} of {requested} agents \
         before {attempts} consecutive placements collided"
    )]
    Capacity {
        placed: usize,
        requested: usize,
        attempts: u32,
    },

    #[error("cell ({x}, {y}) is outside the grid")]
    OutOfBounds { x: i32, y: i32 },

    #[error("cell ({x}, {y}) is already occupied")]
    CellOccupied { x: i32, y: i32 },

    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse configuration: {0}")]
    Json(#[from] serde_json::Error),
}
