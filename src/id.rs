use std::fmt;

use serde::{Deserialize, Serialize};

/// Handle to an agent: its index in the owning `Population`.
///
/// The grid stores these instead of references, so agents are only ever owned
/// by the population and a handle never dangles while the population lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AgentId(pub usize);

impl AgentId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "agent#{}", self.0)
    }
}
