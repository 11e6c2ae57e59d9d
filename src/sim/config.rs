use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SimError;

/// Largest accepted grid side. Keeps every coordinate sum (position plus
/// velocity, footprint or contagion reach) well inside `i32`.
pub const MAX_GRID_SIDE: u32 = 1 << 20;

/// Parameters for one outbreak run.
///
/// Every field has a default, so a JSON config file only needs the keys it
/// overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Grid width in cells.
    pub width: u32,
    /// Grid height in cells.
    pub height: u32,
    /// Number of agents to place.
    pub population_size: usize,
    /// Chance an agent starts immune (0.0 to 1.0).
    pub immune_proportion: f64,
    /// Chance a non-immune agent starts weak (0.0 to 1.0).
    pub weak_proportion: f64,
    /// Chance a sick agent infects each susceptible neighbour per tick.
    pub contagion_probability: f64,
    /// Side of the square neighbourhood a sick agent infects.
    pub contagion_distance: u32,
    /// Chance of becoming immune on recovery.
    pub immune_gain_probability: f64,
    /// Side of an agent's square footprint. Spans half of this on each side.
    pub agent_size: u32,
    /// Ticks spent incubating before turning sick.
    pub incubation_duration: u32,
    /// Ticks spent sick.
    pub sick_duration: u32,
    /// Per-axis velocity bound, in cells per tick.
    pub max_speed: f64,
    /// Velocity multiplier applied every tick.
    pub damping: f64,
    /// Agents closer than this to the grid centre start sick.
    pub outbreak_radius: f64,
    /// Consecutive rejected positions tolerated while placing one agent.
    pub max_placement_attempts: u32,
    /// Stop after this many ticks even if the outbreak is still running.
    pub max_ticks: Option<u64>,
    /// RNG seed. `None` draws one from the OS.
    pub seed: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            width: 600,
            height: 600,
            population_size: 18_000,
            immune_proportion: 0.2,
            weak_proportion: 0.1,
            contagion_probability: 0.7,
            contagion_distance: 6,
            immune_gain_probability: 0.98,
            agent_size: 4,
            incubation_duration: 10,
            sick_duration: 130,
            max_speed: 1.0,
            damping: 0.8,
            outbreak_radius: 20.0,
            max_placement_attempts: 10_000,
            max_ticks: None,
            seed: None,
        }
    }
}

impl SimConfig {
    /// Load a config from a JSON file. Missing keys keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, SimError> {
        let data = std::fs::read_to_string(path)?;
        let config: SimConfig = serde_json::from_str(&data)?;
        Ok(config)
    }

    /// Half the footprint side, the reach of collision scans on each side.
    pub fn footprint_half(&self) -> i32 {
        (self.agent_size / 2) as i32
    }

    /// Half the contagion neighbourhood side.
    pub fn contagion_half(&self) -> i32 {
        (self.contagion_distance / 2) as i32
    }

    pub fn validate(&self) -> Result<(), SimError> {
        if self.width == 0 || self.height == 0 {
            return Err(invalid("grid dimensions must be positive"));
        }
        if self.width > MAX_GRID_SIDE || self.height > MAX_GRID_SIDE {
            return Err(invalid(&format!(
                "grid dimensions must not exceed {MAX_GRID_SIDE}, got {}x{}",
                self.width, self.height
            )));
        }
        let shortest_side = self.width.min(self.height);
        if self.population_size == 0 {
            return Err(invalid("population_size must be positive"));
        }
        for (name, p) in [
            ("immune_proportion", self.immune_proportion),
            ("weak_proportion", self.weak_proportion),
            ("contagion_probability", self.contagion_probability),
            ("immune_gain_probability", self.immune_gain_probability),
            ("damping", self.damping),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(invalid(&format!("{name} must be within [0, 1], got {p}")));
            }
        }
        if !(self.max_speed >= 0.0 && self.max_speed <= f64::from(shortest_side)) {
            return Err(invalid(&format!(
                "max_speed must be within [0, {shortest_side}], got {}",
                self.max_speed
            )));
        }
        if self.agent_size > shortest_side {
            return Err(invalid(&format!(
                "agent_size {} does not fit a {}x{} grid",
                self.agent_size, self.width, self.height
            )));
        }
        if self.contagion_distance > shortest_side {
            return Err(invalid(&format!(
                "contagion_distance {} does not fit a {}x{} grid",
                self.contagion_distance, self.width, self.height
            )));
        }
        if !(self.outbreak_radius >= 0.0) {
            return Err(invalid("outbreak_radius must be non-negative"));
        }
        if self.incubation_duration == 0 || self.sick_duration == 0 {
            return Err(invalid("incubation_duration and sick_duration must be positive"));
        }
        if self.incubation_duration > i32::MAX as u32 || self.sick_duration > i32::MAX as u32 {
            return Err(invalid(&format!(
                "incubation_duration and sick_duration must not exceed {}",
                i32::MAX
            )));
        }
        if self.max_placement_attempts == 0 {
            return Err(invalid("max_placement_attempts must be positive"));
        }
        Ok(())
    }
}

fn invalid(msg: &str) -> SimError {
    SimError::InvalidConfig(msg.to_string())
}
