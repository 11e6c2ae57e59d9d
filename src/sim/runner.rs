use std::fmt;

use rand::rngs::SmallRng;
use rand::{Rng, RngCore, SeedableRng};
use serde::Serialize;
use tracing::{info, warn};

use super::config::SimConfig;
use super::contagion::ContagionEngine;
use super::context::SimContext;
use super::observer::TickObserver;
use crate::error::SimError;
use crate::model::{Agent, Census, Population, Position, SpatialGrid};

/// Result of one outbreak, reported once the run stops.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutbreakSummary {
    pub immune_proportion: f64,
    pub population: usize,
    pub ticks: u64,
    /// `false` if the run hit `max_ticks` before the outbreak died out.
    pub terminated: bool,
    pub census: Census,
    pub infections: u64,
    pub deaths: u64,
    /// Percentage of weak agents killed; `None` if none were weak.
    pub death_ratio: Option<f64>,
}

impl fmt::Display for OutbreakSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.death_ratio {
            Some(ratio) => write!(f, "The outbreak killed {ratio:.1}% of weak people."),
            None => write!(f, "The outbreak had no weak people to kill."),
        }
    }
}

/// Owns the grid, the population and the RNG for a single run.
pub struct SimulationRunner {
    config: SimConfig,
    grid: SpatialGrid,
    population: Population,
    rng: Box<dyn RngCore>,
    engine: ContagionEngine,
    observers: Vec<Box<dyn TickObserver>>,
}

impl SimulationRunner {
    /// Runner seeded from `config.seed`, or from OS entropy when unset.
    pub fn new(config: SimConfig) -> Result<Self, SimError> {
        let rng = match config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_os_rng(),
        };
        Self::with_rng(config, rng)
    }

    /// Runner drawing every random number from `rng`.
    pub fn with_rng(config: SimConfig, rng: impl RngCore + 'static) -> Result<Self, SimError> {
        config.validate()?;
        Ok(Self {
            grid: SpatialGrid::new(config.width, config.height),
            population: Population::new(),
            rng: Box::new(rng),
            engine: ContagionEngine::new(),
            observers: Vec::new(),
            config,
        })
    }

    pub fn add_observer(&mut self, observer: Box<dyn TickObserver>) {
        self.observers.push(observer);
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn population(&self) -> &Population {
        &self.population
    }

    pub fn grid(&self) -> &SpatialGrid {
        &self.grid
    }

    pub fn ticks(&self) -> u64 {
        self.engine.ticks()
    }

    /// Replace the grid and population with `size` fresh agents.
    ///
    /// Positions come from rejection sampling: a candidate is redrawn while
    /// its footprint touches an occupied cell. Each agent is immune with
    /// probability `immune_proportion`, otherwise weak with probability
    /// `weak_proportion`.
    pub fn generate_population(
        &mut self,
        immune_proportion: f64,
        size: usize,
    ) -> Result<(), SimError> {
        if !(0.0..=1.0).contains(&immune_proportion) {
            return Err(SimError::InvalidConfig(format!(
                "immune proportion must be within [0, 1], got {immune_proportion}"
            )));
        }

        self.grid = SpatialGrid::new(self.config.width, self.config.height);
        self.population = Population::with_capacity(size);
        self.engine = ContagionEngine::new();
        let half = self.config.footprint_half();

        for placed in 0..size {
            let position = self.free_position(half).ok_or(SimError::Capacity {
                placed,
                requested: size,
                attempts: self.config.max_placement_attempts,
            })?;

            let id = self.population.next_id();
            let mut agent = Agent::new(id, position);
            if self.rng.random_range(0.0..1.0) < immune_proportion {
                agent.immune = true;
            } else if self.rng.random_range(0.0..1.0) < self.config.weak_proportion {
                agent.weak = true;
            }

            self.grid.place(id, position.x, position.y)?;
            self.population.push(agent);
        }

        info!(
            agents = size,
            immune_proportion,
            occupied = self.grid.occupied_count(),
            "population generated"
        );
        Ok(())
    }

    fn free_position(&mut self, half: i32) -> Option<Position> {
        for _ in 0..self.config.max_placement_attempts {
            let x = self.rng.random_range(0..self.grid.width());
            let y = self.rng.random_range(0..self.grid.height());
            if !self.grid.placement_collides(x, y, half) {
                return Some(Position::new(x, y));
            }
        }
        None
    }

    /// Make every agent near the grid centre sick, partway through its illness.
    ///
    /// Returns the number of agents seeded.
    pub fn seed_outbreak(&mut self, radius: f64) -> usize {
        let cx = f64::from(self.grid.width() / 2);
        let cy = f64::from(self.grid.height() / 2);
        let sick_duration = self.config.sick_duration as i32;
        let mut seeded = 0;

        for agent in self.population.iter_mut() {
            if agent.is_dead() || agent.position().distance_to(cx, cy) >= radius {
                continue;
            }
            agent.weak = false;
            agent.immune = false;
            agent.set_sick(self.rng.random_range(0..sick_duration));
            seeded += 1;
        }

        info!(seeded, radius, "outbreak seeded");
        seeded
    }

    /// Advance one tick. Returns `true` once nobody is sick or incubating.
    pub fn step(&mut self) -> bool {
        let mut ctx = SimContext {
            population: &mut self.population,
            grid: &mut self.grid,
            rng: &mut *self.rng,
            config: &self.config,
        };
        let terminated = self.engine.step(&mut ctx);

        let tick = self.engine.ticks();
        for observer in &mut self.observers {
            observer.observe(tick, &self.population, &self.config);
        }
        terminated
    }

    /// Generate, seed and step until the outbreak dies out or `max_ticks`
    /// is reached.
    pub fn run(&mut self) -> Result<OutbreakSummary, SimError> {
        info!(
            "Running simulation with {}% immune.",
            (100.0 * self.config.immune_proportion) as i32
        );

        self.generate_population(self.config.immune_proportion, self.config.population_size)?;
        self.seed_outbreak(self.config.outbreak_radius);
        for observer in &mut self.observers {
            observer.observe(0, &self.population, &self.config);
        }

        let terminated = loop {
            if self.step() {
                break true;
            }
            if self
                .config
                .max_ticks
                .is_some_and(|max| self.engine.ticks() >= max)
            {
                warn!(ticks = self.engine.ticks(), "tick limit reached before the outbreak ended");
                break false;
            }
        };

        let summary = self.summary(terminated);
        if summary.death_ratio.is_none() {
            warn!("no weak agents in the population; death ratio is undefined");
        }
        info!(
            ticks = summary.ticks,
            dead = summary.census.dead,
            infections = summary.infections,
            "outbreak over"
        );
        Ok(summary)
    }

    pub fn summary(&self, terminated: bool) -> OutbreakSummary {
        let census = self.population.census();
        OutbreakSummary {
            immune_proportion: self.config.immune_proportion,
            population: self.population.len(),
            ticks: self.engine.ticks(),
            terminated,
            census,
            infections: self.engine.infections(),
            deaths: self.engine.deaths(),
            death_ratio: census.death_ratio(),
        }
    }
}

/// One run per immune proportion, everything else taken from `base`.
///
/// With a seed set, run `i` uses `seed + i` so runs differ but replay.
pub fn sweep(base: &SimConfig, proportions: &[f64]) -> Result<Vec<OutbreakSummary>, SimError> {
    proportions
        .iter()
        .enumerate()
        .map(|(i, &immune_proportion)| {
            let config = SimConfig {
                immune_proportion,
                seed: base.seed.map(|s| s.wrapping_add(i as u64)),
                ..base.clone()
            };
            SimulationRunner::new(config)?.run()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::model::{DisplayCategory, Health};

    fn small_config(seed: u64) -> SimConfig {
        SimConfig {
            width: 80,
            height: 80,
            population_size: 300,
            outbreak_radius: 10.0,
            seed: Some(seed),
            max_ticks: Some(50_000),
            ..SimConfig::default()
        }
    }

    struct Recorder {
        ticks: Rc<RefCell<Vec<u64>>>,
    }

    impl TickObserver for Recorder {
        fn observe(&mut self, tick: u64, _population: &Population, _config: &SimConfig) {
            self.ticks.borrow_mut().push(tick);
        }
    }

    /// Draws nothing, but checks every agent classifies the way a renderer
    /// would need it to.
    struct Classifier {
        frames: Rc<RefCell<u64>>,
    }

    impl TickObserver for Classifier {
        fn observe(&mut self, _tick: u64, population: &Population, config: &SimConfig) {
            assert!(config.agent_size > 0);
            for agent in population {
                let p = agent.position();
                assert!(p.x >= 0 && (p.x as u32) < config.width);
                assert!(p.y >= 0 && (p.y as u32) < config.height);
                match agent.display_category(config) {
                    DisplayCategory::Sick { intensity } => {
                        assert!((0.0..=1.0).contains(&intensity), "intensity {intensity}");
                        assert!(agent.is_sick());
                    }
                    DisplayCategory::Dead => assert!(agent.is_dead()),
                    DisplayCategory::Incubating => assert!(agent.is_incubating()),
                    DisplayCategory::Immune => assert!(agent.immune),
                    DisplayCategory::Weak => assert!(agent.weak && !agent.immune),
                    DisplayCategory::Healthy => assert_eq!(agent.health(), Health::Healthy),
                }
            }
            *self.frames.borrow_mut() += 1;
        }
    }

    #[test]
    fn generated_population_has_requested_size_and_sync_grid() {
        let mut runner = SimulationRunner::new(small_config(1)).unwrap();
        runner.generate_population(0.3, 200).unwrap();

        assert_eq!(runner.population().len(), 200);
        assert_eq!(runner.grid().occupied_count(), 200);
        for agent in runner.population() {
            let p = agent.position();
            assert_eq!(runner.grid().occupant_at(p.x, p.y), Some(agent.id));
            assert!(!(agent.immune && agent.weak));
        }
    }

    #[test]
    fn all_immune_population() {
        let mut runner = SimulationRunner::new(small_config(2)).unwrap();
        runner.generate_population(1.0, 50).unwrap();
        assert!(runner.population().iter().all(|a| a.immune && !a.weak));
    }

    #[test]
    fn overfull_grid_is_a_capacity_error() {
        let config = SimConfig {
            width: 6,
            height: 6,
            max_placement_attempts: 200,
            ..small_config(3)
        };
        let mut runner = SimulationRunner::new(config).unwrap();
        let err = runner.generate_population(0.0, 100).unwrap_err();
        match err {
            SimError::Capacity {
                placed,
                requested,
                attempts,
            } => {
                assert!(placed < 100);
                assert_eq!(requested, 100);
                assert_eq!(attempts, 200);
            }
            other => panic!("expected capacity error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_bad_immune_proportion() {
        let mut runner = SimulationRunner::new(small_config(4)).unwrap();
        assert!(matches!(
            runner.generate_population(-0.1, 10),
            Err(SimError::InvalidConfig(_))
        ));
    }

    #[test]
    fn outbreak_only_touches_centre() {
        let mut runner = SimulationRunner::new(small_config(5)).unwrap();
        runner.generate_population(0.5, 300).unwrap();
        let seeded = runner.seed_outbreak(10.0);

        let sick: Vec<_> = runner.population().iter().filter(|a| a.is_sick()).collect();
        assert_eq!(sick.len(), seeded);
        for agent in sick {
            assert!(agent.position().distance_to(40.0, 40.0) < 10.0);
            assert!(!agent.weak && !agent.immune);
            match agent.health() {
                Health::Sick { remaining } => assert!((0..130).contains(&remaining)),
                other => panic!("unexpected state {other:?}"),
            }
        }
    }

    #[test]
    fn zero_radius_seeds_nobody() {
        let mut runner = SimulationRunner::new(small_config(6)).unwrap();
        runner.generate_population(0.0, 100).unwrap();
        assert_eq!(runner.seed_outbreak(0.0), 0);
        assert!(runner.step());
    }

    #[test]
    fn run_terminates_with_consistent_summary() {
        let mut runner = SimulationRunner::new(small_config(7)).unwrap();
        let summary = runner.run().unwrap();

        assert!(summary.terminated);
        assert!(summary.census.is_quiescent());
        assert_eq!(summary.census.total(), 300);
        assert_eq!(summary.census.dead as u64, summary.deaths);
        if let Some(ratio) = summary.death_ratio {
            assert!((0.0..=100.0).contains(&ratio));
        }
    }

    #[test]
    fn same_seed_same_outcome() {
        let a = SimulationRunner::new(small_config(8)).unwrap().run().unwrap();
        let b = SimulationRunner::new(small_config(8)).unwrap().run().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn tick_limit_stops_run() {
        let config = SimConfig {
            max_ticks: Some(3),
            sick_duration: 1_000,
            ..small_config(9)
        };
        let summary = SimulationRunner::new(config).unwrap().run().unwrap();
        assert_eq!(summary.ticks, 3);
        assert!(!summary.terminated);
    }

    #[test]
    fn observers_see_every_tick() {
        let ticks = Rc::new(RefCell::new(Vec::new()));
        let mut runner = SimulationRunner::new(small_config(10)).unwrap();
        runner.add_observer(Box::new(Recorder {
            ticks: ticks.clone(),
        }));
        let summary = runner.run().unwrap();

        let seen = ticks.borrow();
        assert_eq!(seen.len() as u64, summary.ticks + 1);
        assert!(seen.iter().copied().eq(0..=summary.ticks));
    }

    #[test]
    fn observers_can_classify_every_agent() {
        let frames = Rc::new(RefCell::new(0));
        let mut runner = SimulationRunner::new(small_config(12)).unwrap();
        runner.add_observer(Box::new(Classifier {
            frames: frames.clone(),
        }));
        let summary = runner.run().unwrap();
        assert_eq!(*frames.borrow(), summary.ticks + 1);
    }

    #[test]
    fn oversized_durations_fail_before_running() {
        let config = SimConfig {
            sick_duration: 3_000_000_000,
            ..small_config(13)
        };
        assert!(matches!(
            SimulationRunner::new(config),
            Err(SimError::InvalidConfig(_))
        ));
    }

    #[test]
    fn summary_line_formats_ratio() {
        let summary = OutbreakSummary {
            immune_proportion: 0.2,
            population: 10,
            ticks: 4,
            terminated: true,
            census: Census::default(),
            infections: 0,
            deaths: 0,
            death_ratio: Some(12.345),
        };
        assert_eq!(
            summary.to_string(),
            "The outbreak killed 12.3% of weak people."
        );
    }

    #[test]
    fn sweep_runs_each_proportion() {
        let base = SimConfig {
            population_size: 100,
            ..small_config(11)
        };
        let results = sweep(&base, &[0.0, 0.5, 0.9]).unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[1].immune_proportion, 0.5);
        assert!(results.iter().all(|r| r.population == 100));
    }
}
