mod config;
mod contagion;
mod context;
mod observer;
mod runner;

pub use config::{MAX_GRID_SIDE, SimConfig};
pub use contagion::ContagionEngine;
pub use context::SimContext;
pub use observer::{CensusLogger, DisplayTally, TickObserver};
pub use runner::{OutbreakSummary, SimulationRunner, sweep};
