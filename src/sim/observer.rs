use std::thread;
use std::time::Duration;

use tracing::info;

use super::config::SimConfig;
use crate::model::{Census, DisplayCategory, Population};

/// Read-only hook called between ticks, e.g. by a renderer.
///
/// Tick 0 is the seeded population before the first step. `config` carries
/// what drawing needs beyond the agents: `agent_size` for the footprint and
/// `sick_duration` behind each agent's `display_category`.
pub trait TickObserver {
    fn observe(&mut self, tick: u64, population: &Population, config: &SimConfig);
}

/// Head count per display category, plus the mean sick intensity.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DisplayTally {
    pub census: Census,
    pub mean_sick_intensity: Option<f64>,
}

impl DisplayTally {
    pub fn of(population: &Population, config: &SimConfig) -> Self {
        let mut census = Census::default();
        let mut intensity_sum = 0.0;
        for agent in population {
            match agent.display_category(config) {
                DisplayCategory::Dead => census.dead += 1,
                DisplayCategory::Sick { intensity } => {
                    census.sick += 1;
                    intensity_sum += intensity;
                }
                DisplayCategory::Incubating => census.incubating += 1,
                DisplayCategory::Immune => census.immune += 1,
                DisplayCategory::Weak => census.weak += 1,
                DisplayCategory::Healthy => census.healthy += 1,
            }
        }
        Self {
            census,
            mean_sick_intensity: (census.sick > 0).then(|| intensity_sum / census.sick as f64),
        }
    }
}

/// Logs a census line every `every` ticks and optionally paces the run.
#[derive(Debug, Clone)]
pub struct CensusLogger {
    every: u64,
    frame_delay: Option<Duration>,
    last: Option<DisplayTally>,
}

impl CensusLogger {
    pub fn new(every: u64) -> Self {
        Self {
            every: every.max(1),
            frame_delay: None,
            last: None,
        }
    }

    /// Sleep this long after each observed tick.
    pub fn with_frame_delay(mut self, delay: Duration) -> Self {
        self.frame_delay = Some(delay);
        self
    }

    /// The most recently logged tally.
    pub fn last(&self) -> Option<&DisplayTally> {
        self.last.as_ref()
    }
}

impl TickObserver for CensusLogger {
    fn observe(&mut self, tick: u64, population: &Population, config: &SimConfig) {
        if tick % self.every == 0 && !population.is_empty() {
            let tally = DisplayTally::of(population, config);
            let census = tally.census;
            info!(
                tick,
                sick = census.sick,
                incubating = census.incubating,
                immune = census.immune,
                dead = census.dead,
                intensity = tally.mean_sick_intensity.unwrap_or(0.0),
                "sick {:.1}%, dead {}",
                100.0 * census.sick as f64 / census.total() as f64,
                census
                    .death_ratio()
                    .map_or_else(|| "n/a".to_string(), |r| format!("{r:.1}%")),
            );
            self.last = Some(tally);
        }
        if let Some(delay) = self.frame_delay {
            thread::sleep(delay);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::AgentId;
    use crate::model::{Agent, Position};

    fn mixed_population() -> Population {
        let mut population = Population::new();
        for i in 0..5 {
            let id = population.next_id();
            population.push(Agent::new(id, Position::new(i, 0)));
        }
        population[AgentId(0)].set_sick(130);
        population[AgentId(1)].set_sick(65);
        population[AgentId(2)].immune = true;
        population[AgentId(3)].weak = true;
        population
    }

    #[test]
    fn tally_matches_census_and_tracks_intensity() {
        let config = SimConfig::default();
        let population = mixed_population();
        let tally = DisplayTally::of(&population, &config);

        assert_eq!(tally.census, population.census());
        assert_eq!(tally.census.sick, 2);
        assert_eq!(tally.mean_sick_intensity, Some(0.75));
    }

    #[test]
    fn no_intensity_without_sick_agents() {
        let tally = DisplayTally::of(&Population::new(), &SimConfig::default());
        assert_eq!(tally.census.total(), 0);
        assert_eq!(tally.mean_sick_intensity, None);
    }

    #[test]
    fn logger_records_on_interval_only() {
        let config = SimConfig::default();
        let population = mixed_population();
        let mut logger = CensusLogger::new(5);

        logger.observe(3, &population, &config);
        assert!(logger.last().is_none());
        logger.observe(5, &population, &config);
        assert_eq!(logger.last().map(|t| t.census.sick), Some(2));
    }

    #[test]
    fn interval_is_at_least_one() {
        let mut logger = CensusLogger::new(0);
        assert_eq!(logger.every, 1);
        logger.observe(3, &mixed_population(), &SimConfig::default());
        assert!(logger.last().is_some());
    }
}
