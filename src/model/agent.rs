use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use super::grid::{Position, SpatialGrid};
use crate::id::AgentId;
use crate::sim::SimConfig;

/// Infection stage. Weak and immune are separate flags on the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Health {
    Healthy,
    Incubating { remaining: i32 },
    Sick { remaining: i32 },
    Dead,
}

/// How a renderer should draw an agent, checked in this order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum DisplayCategory {
    Dead,
    /// `intensity` is the fraction of the sick period still to run.
    Sick { intensity: f64 },
    Incubating,
    Immune,
    Weak,
    Healthy,
}

/// One simulated individual.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Agent {
    pub id: AgentId,
    position: Position,
    vx: f64,
    vy: f64,
    health: Health,
    pub immune: bool,
    pub weak: bool,
}

impl Agent {
    pub fn new(id: AgentId, position: Position) -> Self {
        Self {
            id,
            position,
            vx: 0.0,
            vy: 0.0,
            health: Health::Healthy,
            immune: false,
            weak: false,
        }
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn velocity(&self) -> (f64, f64) {
        (self.vx, self.vy)
    }

    pub fn health(&self) -> Health {
        self.health
    }

    pub fn is_dead(&self) -> bool {
        self.health == Health::Dead
    }

    pub fn is_sick(&self) -> bool {
        matches!(self.health, Health::Sick { .. })
    }

    pub fn is_incubating(&self) -> bool {
        matches!(self.health, Health::Incubating { .. })
    }

    /// Can be contaminated by a sick neighbour. Incubating agents count:
    /// re-exposure restarts their incubation.
    pub fn is_susceptible(&self) -> bool {
        !self.is_dead() && !self.immune && !self.is_sick()
    }

    /// Start the agent mid-illness with `remaining` ticks left.
    pub fn set_sick(&mut self, remaining: i32) {
        self.health = Health::Sick { remaining };
    }

    pub fn display_category(&self, config: &SimConfig) -> DisplayCategory {
        match self.health {
            Health::Dead => DisplayCategory::Dead,
            Health::Sick { remaining } => DisplayCategory::Sick {
                intensity: f64::from(remaining) / f64::from(config.sick_duration),
            },
            Health::Incubating { .. } => DisplayCategory::Incubating,
            Health::Healthy if self.immune => DisplayCategory::Immune,
            Health::Healthy if self.weak => DisplayCategory::Weak,
            Health::Healthy => DisplayCategory::Healthy,
        }
    }

    /// Tick the incubation or sickness countdown.
    pub fn advance_state(&mut self, rng: &mut dyn RngCore, config: &SimConfig) {
        match self.health {
            Health::Incubating { remaining } => {
                let remaining = remaining - 1;
                self.health = if remaining <= 0 {
                    Health::Sick {
                        remaining: config.sick_duration as i32,
                    }
                } else {
                    Health::Incubating { remaining }
                };
            }
            Health::Sick { remaining } => {
                let remaining = remaining - 1;
                if remaining <= 0 {
                    self.health = Health::Healthy;
                    if rng.random_range(0.0..1.0) < config.immune_gain_probability {
                        self.immune = true;
                    }
                } else {
                    self.health = Health::Sick { remaining };
                }
            }
            Health::Healthy | Health::Dead => {}
        }
    }

    /// Pass the disease to this agent. Weak agents die on the spot and free
    /// their cell; everyone else starts incubating.
    pub fn contaminate(&mut self, grid: &mut SpatialGrid, config: &SimConfig) {
        debug_assert!(
            self.is_susceptible(),
            "{} contaminated while not susceptible: {:?}",
            self.id,
            self.health
        );
        if self.weak {
            self.health = Health::Dead;
            if grid.occupant_at(self.position.x, self.position.y) == Some(self.id) {
                grid.vacate(self.position.x, self.position.y);
            }
        } else {
            self.health = Health::Incubating {
                remaining: config.incubation_duration as i32,
            };
        }
    }

    /// Brownian step with momentum. Returns whether the agent moved.
    ///
    /// The pending velocity is applied first, then damped, then a random unit
    /// step on one axis is added to both position and velocity. A move that
    /// leaves the grid or collides is dropped and stops the agent.
    pub fn attempt_move(
        &mut self,
        grid: &mut SpatialGrid,
        rng: &mut dyn RngCore,
        config: &SimConfig,
    ) -> bool {
        if self.is_dead() {
            return false;
        }
        let old = self.position;
        // `as i32` truncates toward zero.
        let mut new = Position::new(old.x + self.vx as i32, old.y + self.vy as i32);

        self.vx *= config.damping;
        self.vy *= config.damping;

        let horizontal = rng.random_range(0.0..1.0) < 0.5;
        let step = if rng.random_range(0.0..1.0) < 0.5 { 1 } else { -1 };
        if horizontal {
            new.x += step;
            self.vx += f64::from(step);
        } else {
            new.y += step;
            self.vy += f64::from(step);
        }

        self.vx = self.vx.clamp(-config.max_speed, config.max_speed);
        self.vy = self.vy.clamp(-config.max_speed, config.max_speed);

        if grid.is_move_valid(self.id, old, new, config.footprint_half())
            && grid.move_agent(self.id, old, new).is_ok()
        {
            self.position = new;
            true
        } else {
            self.vx = 0.0;
            self.vy = 0.0;
            false
        }
    }
}
