pub mod error;
pub mod id;
pub mod model;
pub mod sim;

pub use error::SimError;
pub use id::AgentId;
pub use model::{Agent, Census, DisplayCategory, Health, Population, Position, SpatialGrid};
pub use sim::{OutbreakSummary, SimConfig, SimulationRunner};
