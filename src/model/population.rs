use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

use super::agent::{Agent, Health};
use crate::id::AgentId;

/// Owner of every agent. Iteration order is tick order.
#[derive(Debug, Clone, Default)]
pub struct Population {
    agents: Vec<Agent>,
}

/// Head count per state. `weak` and `immune` only count living agents that
/// are neither sick nor incubating.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Census {
    pub healthy: usize,
    pub incubating: usize,
    pub sick: usize,
    pub immune: usize,
    pub weak: usize,
    pub dead: usize,
}

impl Census {
    pub fn total(&self) -> usize {
        self.healthy + self.incubating + self.sick + self.immune + self.weak + self.dead
    }

    /// No one left who can pass the disease on.
    pub fn is_quiescent(&self) -> bool {
        self.sick == 0 && self.incubating == 0
    }

    /// Percentage of weak agents that died, or `None` if there never were any.
    pub fn death_ratio(&self) -> Option<f64> {
        let weak_total = self.dead + self.weak;
        (weak_total > 0).then(|| 100.0 * self.dead as f64 / weak_total as f64)
    }
}

impl Population {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            agents: Vec::with_capacity(capacity),
        }
    }

    /// Id the next pushed agent will get.
    pub fn next_id(&self) -> AgentId {
        AgentId(self.agents.len())
    }

    /// Append an agent. Its id must be `next_id()`.
    pub fn push(&mut self, agent: Agent) -> AgentId {
        debug_assert_eq!(agent.id, self.next_id(), "agent id out of sequence");
        let id = agent.id;
        self.agents.push(agent);
        id
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Agent> {
        self.agents.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Agent> {
        self.agents.iter_mut()
    }

    pub fn census(&self) -> Census {
        let mut census = Census::default();
        for agent in &self.agents {
            match agent.health() {
                Health::Dead => census.dead += 1,
                Health::Sick { .. } => census.sick += 1,
                Health::Incubating { .. } => census.incubating += 1,
                Health::Healthy if agent.immune => census.immune += 1,
                Health::Healthy if agent.weak => census.weak += 1,
                Health::Healthy => census.healthy += 1,
            }
        }
        census
    }
}

impl Index<AgentId> for Population {
    type Output = Agent;

    fn index(&self, id: AgentId) -> &Agent {
        &self.agents[id.index()]
    }
}

impl IndexMut<AgentId> for Population {
    fn index_mut(&mut self, id: AgentId) -> &mut Agent {
        &mut self.agents[id.index()]
    }
}

impl<'a> IntoIterator for &'a Population {
    type Item = &'a Agent;
    type IntoIter = std::slice::Iter<'a, Agent>;

    fn into_iter(self) -> Self::IntoIter {
        self.agents.iter()
    }
}
