//! Ant Colony Optimization for the RCSPP.
//!
//! Every iteration each ant walks from the source towards the target,
//! choosing among the unvisited successors that keep it within the fuel
//! budget by roulette-wheel selection on `tau^alpha * eta^beta`, where
//! `eta = 1 / (time + EPSILON)`. After all ants have walked, every trail
//! evaporates and each ant that reached the target deposits
//! `deposit_scale / (time + EPSILON)` on its edges.
//!
//! Ants of one iteration only read the pheromone matrix, so they can be
//! built in parallel; each gets its own RNG seeded from the run RNG before
//! construction starts, which keeps parallel and sequential runs identical.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use ordered_float::OrderedFloat;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

use crate::error::ConfigError;
use crate::heuristics::pheromone::PheromoneMatrix;
use crate::heuristics::roulette::sample;
use crate::instance::ProblemInstance;
use crate::solution::{PathSolution, SolveStatus};
use crate::solver::Solver;

/// Guards `1 / time` and `Q / time` against zero-time edges and paths
pub const EPSILON: f64 = 1e-9;

/// ACO configuration parameters
#[derive(Debug, Clone)]
pub struct AcoConfig {
    /// Ants per iteration
    pub ant_count: usize,
    /// Number of pheromone-update rounds
    pub iteration_count: usize,
    /// Pheromone importance (alpha)
    pub alpha: f64,
    /// Heuristic importance (beta)
    pub beta: f64,
    /// Fraction of trail lost per iteration (rho)
    pub evaporation_rate: f64,
    /// Pheromone deposit numerator (Q)
    pub deposit_scale: f64,
    /// Random seed
    pub seed: u64,
    /// Build the ants of an iteration on the rayon thread pool
    pub parallel: bool,
    /// Wall-clock limit in seconds, checked between iterations
    pub time_limit: Option<f64>,
}

impl Default for AcoConfig {
    fn default() -> Self {
        AcoConfig {
            ant_count: 20,
            iteration_count: 100,
            alpha: 1.0,
            beta: 2.0,
            evaporation_rate: 0.5,
            deposit_scale: 100.0,
            seed: 42,
            parallel: false,
            time_limit: None,
        }
    }
}

impl AcoConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ant_count == 0 {
            return Err(ConfigError::NoAnts);
        }
        if !(self.evaporation_rate > 0.0 && self.evaporation_rate < 1.0) {
            return Err(ConfigError::EvaporationRate(self.evaporation_rate));
        }
        for (name, value) in [("alpha", self.alpha), ("beta", self.beta)] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Exponent { name, value });
            }
        }
        if !self.deposit_scale.is_finite() || self.deposit_scale <= 0.0 {
            return Err(ConfigError::DepositScale(self.deposit_scale));
        }
        if let Some(limit) = self.time_limit {
            if !limit.is_finite() || limit <= 0.0 {
                return Err(ConfigError::TimeLimit(limit));
            }
        }
        Ok(())
    }
}

/// A path built by one ant that reached the target
#[derive(Debug, Clone, PartialEq)]
pub struct AntPath {
    pub path: Vec<usize>,
    pub time: f64,
    pub fuel: f64,
}

/// Walk one ant from the source.
///
/// Returns `None` when the ant reaches a node with no unvisited successor
/// inside the fuel budget.
pub fn construct_path<R: Rng + ?Sized>(
    instance: &ProblemInstance,
    pheromone: &PheromoneMatrix,
    config: &AcoConfig,
    rng: &mut R,
) -> Option<AntPath> {
    let source = instance.source();
    let target = instance.target();
    let budget = instance.fuel_budget();

    let mut path = vec![source];
    let mut visited = HashSet::from([source]);
    let mut time = 0.0;
    let mut fuel = 0.0;

    let mut candidates = Vec::new();
    let mut weights = Vec::new();

    let mut current = source;
    while current != target {
        candidates.clear();
        weights.clear();

        for &v in instance.successors(current) {
            if visited.contains(&v) {
                continue;
            }
            let edge_fuel = instance.fuel(current, v);
            if fuel + edge_fuel > budget {
                continue;
            }

            let tau = pheromone.get(current, v).powf(config.alpha);
            let eta = (1.0 / (instance.time(current, v) + EPSILON)).powf(config.beta);
            candidates.push(v);
            weights.push(tau * eta);
        }

        // dead end: no feasible move
        let next = candidates[sample(&weights, rng)?];

        time += instance.time(current, next);
        fuel += instance.fuel(current, next);
        path.push(next);
        visited.insert(next);
        current = next;
    }

    Some(AntPath { path, time, fuel })
}

/// State of one ACO run: the pheromone matrix, the run RNG and the best path.
pub struct Colony<'a> {
    instance: &'a ProblemInstance,
    config: &'a AcoConfig,
    pheromone: PheromoneMatrix,
    rng: ChaCha8Rng,
    best: Option<AntPath>,
    iterations: usize,
}

impl<'a> Colony<'a> {
    pub fn new(instance: &'a ProblemInstance, config: &'a AcoConfig) -> Self {
        Colony {
            instance,
            config,
            pheromone: PheromoneMatrix::default(),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            best: None,
            iterations: 0,
        }
    }

    /// Run one iteration: construct, evaporate, reinforce.
    ///
    /// Returns what every ant built, `None` for ants that died.
    pub fn step(&mut self) -> Vec<Option<AntPath>> {
        let instance = self.instance;
        let config = self.config;

        let seeds: Vec<u64> = (0..config.ant_count).map(|_| self.rng.gen()).collect();

        let pheromone = &self.pheromone;
        let construct = |seed: u64| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            construct_path(instance, pheromone, config, &mut rng)
        };
        let ants: Vec<Option<AntPath>> = if config.parallel {
            seeds.par_iter().map(|&seed| construct(seed)).collect()
        } else {
            seeds.iter().map(|&seed| construct(seed)).collect()
        };

        if let Some(ant) = ants
            .iter()
            .flatten()
            .min_by_key(|ant| OrderedFloat(ant.time))
        {
            let improves = self.best.as_ref().map_or(true, |best| ant.time < best.time);
            if improves {
                log::debug!(
                    "Iteration {}: new best {:?} (time {}, fuel {})",
                    self.iterations,
                    ant.path,
                    ant.time,
                    ant.fuel
                );
                self.best = Some(ant.clone());
            }
        }

        self.pheromone.evaporate(instance, config.evaporation_rate);
        for ant in ants.iter().flatten() {
            self.pheromone
                .deposit(&ant.path, config.deposit_scale / (ant.time + EPSILON));
        }

        self.iterations += 1;
        ants
    }

    /// Best path over all iterations so far
    pub fn best(&self) -> Option<&AntPath> {
        self.best.as_ref()
    }

    pub fn pheromone(&self) -> &PheromoneMatrix {
        &self.pheromone
    }

    /// Iterations completed
    pub fn iterations(&self) -> usize {
        self.iterations
    }
}

/// Ant Colony Optimization solver
#[derive(Debug, Clone)]
pub struct AntColonyOptimization {
    config: AcoConfig,
    interrupt: Option<Arc<AtomicBool>>,
}

impl AntColonyOptimization {
    pub fn new(config: AcoConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(AntColonyOptimization {
            config,
            interrupt: None,
        })
    }

    /// Stop between iterations once `flag` is raised
    pub fn with_interrupt(mut self, flag: Arc<AtomicBool>) -> Self {
        self.interrupt = Some(flag);
        self
    }

    pub fn config(&self) -> &AcoConfig {
        &self.config
    }

    /// Run ACO algorithm
    pub fn run(&self, instance: &ProblemInstance) -> PathSolution {
        debug_assert!(instance.contains_node(instance.source()) && instance.contains_node(instance.target()));
        let start = Instant::now();
        let mut colony = Colony::new(instance, &self.config);
        let mut interrupted = false;

        while colony.iterations() < self.config.iteration_count {
            if let Some(flag) = &self.interrupt {
                if flag.load(Ordering::Relaxed) {
                    log::info!("ACO interrupted after {} iterations", colony.iterations());
                    interrupted = true;
                    break;
                }
            }
            if let Some(limit) = self.config.time_limit {
                if start.elapsed().as_secs_f64() >= limit {
                    log::info!("ACO time limit reached after {} iterations", colony.iterations());
                    break;
                }
            }

            colony.step();
        }

        let mut solution = match colony.best() {
            Some(best) => PathSolution::with_path(
                best.path.clone(),
                best.time,
                best.fuel,
                SolveStatus::Feasible,
                self.name(),
            ),
            None if interrupted => PathSolution {
                status: SolveStatus::Interrupted,
                ..PathSolution::infeasible(self.name())
            },
            None => PathSolution::infeasible(self.name()),
        };
        solution.computation_time = start.elapsed().as_secs_f64();
        solution.iterations = Some(colony.iterations());

        log::info!(
            "ACO finished: {} (time {}) after {} iterations ({:.4}s)",
            solution.status,
            solution.time_cost,
            colony.iterations(),
            solution.computation_time
        );

        solution
    }
}

impl Solver for AntColonyOptimization {
    fn solve(&self, instance: &ProblemInstance) -> PathSolution {
        self.run(instance)
    }

    fn name(&self) -> &str {
        "ACO"
    }
}
