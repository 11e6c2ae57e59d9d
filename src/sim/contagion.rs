use rand::Rng;

use super::context::SimContext;
use crate::id::AgentId;

/// Advances the population one tick at a time and spreads the disease.
///
/// Each live agent is updated, moved and (if sick) allowed to infect its
/// neighbours before the next agent is looked at, so an infection handed out
/// early in a pass is visible to agents processed later in the same pass.
#[derive(Debug, Default)]
pub struct ContagionEngine {
    ticks: u64,
    infections: u64,
    deaths: u64,
}

impl ContagionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ticks stepped so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Contaminations that started an incubation.
    pub fn infections(&self) -> u64 {
        self.infections
    }

    /// Contaminations that killed a weak agent.
    pub fn deaths(&self) -> u64 {
        self.deaths
    }

    /// Run one tick. Returns `true` once no agent updated this tick is sick
    /// or incubating.
    pub fn step(&mut self, ctx: &mut SimContext) -> bool {
        self.ticks += 1;
        let mut terminated = true;

        for index in 0..ctx.population.len() {
            let id = AgentId(index);
            let agent = &mut ctx.population[id];
            if agent.is_dead() {
                continue;
            }

            agent.advance_state(&mut *ctx.rng, ctx.config);
            agent.attempt_move(ctx.grid, &mut *ctx.rng, ctx.config);

            if agent.is_sick() {
                terminated = false;
                self.contaminate_neighbours(ctx, id);
            } else if agent.is_incubating() {
                terminated = false;
            }
        }

        terminated
    }

    /// Roll for every susceptible occupant of the square around `source`.
    ///
    /// The square runs from `-half` to `half - 1` on each axis around the
    /// source; the source's own cell is skipped.
    fn contaminate_neighbours(&mut self, ctx: &mut SimContext, source: AgentId) {
        let origin = ctx.population[source].position();
        let half = ctx.config.contagion_half();

        for x in origin.x - half..origin.x + half {
            for y in origin.y - half..origin.y + half {
                if x == origin.x && y == origin.y {
                    continue;
                }
                let Some(neighbour_id) = ctx.grid.occupant_at(x, y) else {
                    continue;
                };
                let neighbour = &mut ctx.population[neighbour_id];
                if !neighbour.is_susceptible() {
                    continue;
                }
                if ctx.rng.random_range(0.0..1.0) < ctx.config.contagion_probability {
                    neighbour.contaminate(ctx.grid, ctx.config);
                    if neighbour.is_dead() {
                        self.deaths += 1;
                    } else {
                        self.infections += 1;
                    }
                }
            }
        }
    }
}
