pub mod agent;
pub mod grid;
pub mod population;

pub use agent::{Agent, DisplayCategory, Health};
pub use grid::{Position, SpatialGrid};
pub use population::{Census, Population};
