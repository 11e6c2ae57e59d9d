use rand::RngCore;

use super::config::SimConfig;
use crate::model::{Population, SpatialGrid};

/// Everything a tick mutates, borrowed from the runner for one step.
///
/// The RNG is the only source of randomness in a run; seed it to replay one.
pub struct SimContext<'a> {
    pub population: &'a mut Population,
    pub grid: &'a mut SpatialGrid,
    pub rng: &'a mut dyn RngCore,
    pub config: &'a SimConfig,
}
