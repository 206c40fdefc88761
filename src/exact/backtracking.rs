//! Exact branch-and-bound backtracking for the RCSPP.
//!
//! Enumerates simple paths depth-first from the source, abandoning a branch
//! as soon as its fuel exceeds the budget or its time cannot beat the best
//! complete path found so far. Exponential in the worst case.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::instance::ProblemInstance;
use crate::solution::{PathSolution, SolveStatus};
use crate::solver::Solver;

/// Depth-first exact solver
#[derive(Debug, Clone, Default)]
pub struct BacktrackingSolver {
    interrupt: Option<Arc<AtomicBool>>,
}

impl BacktrackingSolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop the search as soon as `flag` is raised.
    ///
    /// The flag is polled at every search node.
    pub fn with_interrupt(mut self, flag: Arc<AtomicBool>) -> Self {
        self.interrupt = Some(flag);
        self
    }

    /// Run the search on `instance`
    pub fn run(&self, instance: &ProblemInstance) -> PathSolution {
        debug_assert!(instance.contains_node(instance.source()) && instance.contains_node(instance.target()));
        let start = Instant::now();
        let source = instance.source();

        let mut search = Search {
            instance,
            interrupt: self.interrupt.as_deref(),
            path: vec![source],
            visited: HashSet::from([source]),
            best_path: None,
            best_time: f64::INFINITY,
            best_fuel: f64::INFINITY,
            nodes_explored: 0,
            interrupted: false,
        };
        search.dfs(source);

        let status = match (&search.best_path, search.interrupted) {
            (Some(_), false) => SolveStatus::Optimal,
            (Some(_), true) => SolveStatus::Feasible,
            (None, false) => SolveStatus::Infeasible,
            (None, true) => SolveStatus::Interrupted,
        };

        let mut solution = match search.best_path {
            Some(path) => PathSolution::with_path(
                path,
                search.best_time,
                search.best_fuel,
                status,
                self.name(),
            ),
            None => PathSolution {
                status,
                ..PathSolution::infeasible(self.name())
            },
        };
        solution.computation_time = start.elapsed().as_secs_f64();
        solution.nodes_explored = Some(search.nodes_explored);

        log::info!(
            "Backtracking finished: {} after {} nodes ({:.4}s)",
            solution.status,
            search.nodes_explored,
            solution.computation_time
        );

        solution
    }
}

impl Solver for BacktrackingSolver {
    fn solve(&self, instance: &ProblemInstance) -> PathSolution {
        self.run(instance)
    }

    fn name(&self) -> &str {
        "Backtracking"
    }
}

/// Transient state of one search
struct Search<'a> {
    instance: &'a ProblemInstance,
    interrupt: Option<&'a AtomicBool>,
    path: Vec<usize>,
    visited: HashSet<usize>,
    best_path: Option<Vec<usize>>,
    best_time: f64,
    best_fuel: f64,
    nodes_explored: u64,
    interrupted: bool,
}

/// A node on the current path and the next successor to try from it
struct Frame {
    node: usize,
    next: usize,
    time_used: f64,
    fuel_used: f64,
}

impl Search<'_> {
    /// Depth-first enumeration on an explicit stack, so long paths cannot
    /// overflow the thread stack.
    fn dfs(&mut self, source: usize) {
        let instance = self.instance;
        let mut stack = Vec::new();
        if self.enter(source, 0.0, 0.0) {
            stack.push(Frame { node: source, next: 0, time_used: 0.0, fuel_used: 0.0 });
        }

        while let Some(frame) = stack.last_mut() {
            if self.interrupted {
                break;
            }

            let u = frame.node;
            let successors = instance.successors(u);
            let Some(&v) = successors.get(frame.next) else {
                self.visited.remove(&u);
                self.path.pop();
                stack.pop();
                continue;
            };
            frame.next += 1;
            if self.visited.contains(&v) {
                continue;
            }

            let time_used = frame.time_used + instance.time(u, v);
            let fuel_used = frame.fuel_used + instance.fuel(u, v);

            self.path.push(v);
            self.visited.insert(v);
            if self.enter(v, time_used, fuel_used) {
                stack.push(Frame { node: v, next: 0, time_used, fuel_used });
            } else {
                self.visited.remove(&v);
                self.path.pop();
            }
        }
    }

    /// Apply the prunes to the path ending at `u`; true if it should be extended
    fn enter(&mut self, u: usize, time_used: f64, fuel_used: f64) -> bool {
        self.nodes_explored += 1;

        if self.interrupted || self.interrupt.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
            self.interrupted = true;
            return false;
        }

        // fuel only accumulates, so an over-budget prefix stays infeasible
        if fuel_used > self.instance.fuel_budget() {
            return false;
        }
        // strict: equal-time paths found later are discarded
        if time_used >= self.best_time {
            return false;
        }
        if u == self.instance.target() {
            log::debug!("New best path {:?} (time {}, fuel {})", self.path, time_used, fuel_used);
            self.best_path = Some(self.path.clone());
            self.best_time = time_used;
            self.best_fuel = fuel_used;
            return false;
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::prelude::*;
    use rand_chacha::ChaCha8Rng;

    fn random_instance(rng: &mut ChaCha8Rng) -> ProblemInstance {
        let n = rng.gen_range(2..=6);
        let mut builder = ProblemInstance::builder();
        for u in 0..n {
            builder.add_node(u);
            for v in 0..n {
                if u != v && rng.gen_bool(0.5) {
                    let time = rng.gen_range(0..10) as f64;
                    let fuel = rng.gen_range(0..10) as f64;
                    builder.add_edge(u, v, time, fuel);
                }
            }
        }
        builder
            .source(0)
            .target(n - 1)
            .fuel_budget(rng.gen_range(0..20) as f64);
        builder.build().unwrap()
    }

    /// Minimum time over every feasible simple path, by plain enumeration
    fn brute_force_best_time(instance: &ProblemInstance) -> Option<f64> {
        fn enumerate(
            instance: &ProblemInstance,
            path: &mut Vec<usize>,
            best: &mut Option<f64>,
        ) {
            let u = *path.last().unwrap();
            if u == instance.target() {
                if instance.is_feasible_path(path) {
                    let (time, _) = instance.path_costs(path).unwrap();
                    if best.map_or(true, |b| time < b) {
                        *best = Some(time);
                    }
                }
                return;
            }
            for &v in instance.successors(u) {
                if !path.contains(&v) {
                    path.push(v);
                    enumerate(instance, path, best);
                    path.pop();
                }
            }
        }

        let mut best = None;
        enumerate(instance, &mut vec![instance.source()], &mut best);
        best
    }

    #[test]
    fn test_example_scenario() {
        let instance = ProblemInstance::example();
        let solution = BacktrackingSolver::new().solve(&instance);

        assert_eq!(solution.path, Some(vec![0, 1, 2, 3]));
        assert_eq!(solution.time_cost, 5.0);
        assert_eq!(solution.fuel_cost, 6.0);
        assert_eq!(solution.status, SolveStatus::Optimal);
        assert!(solution.is_feasible(&instance));
        assert!(solution.nodes_explored.unwrap() > 0);
    }

    #[test]
    fn test_zero_budget_is_infeasible() {
        let mut builder = ProblemInstance::builder();
        builder
            .add_edge(0, 1, 1.0, 1.0)
            .add_edge(1, 2, 1.0, 0.0)
            .add_node(2)
            .source(0)
            .target(2)
            .fuel_budget(0.0);
        let instance = builder.build().unwrap();

        let solution = BacktrackingSolver::new().solve(&instance);
        assert_eq!(solution.as_triple(), (None, f64::INFINITY, f64::INFINITY));
        assert_eq!(solution.status, SolveStatus::Infeasible);
    }

    #[test]
    fn test_unreachable_target() {
        let mut builder = ProblemInstance::builder();
        builder
            .add_edge(0, 1, 1.0, 1.0)
            .add_node(1)
            .add_node(2)
            .source(0)
            .target(2)
            .fuel_budget(100.0);
        let instance = builder.build().unwrap();

        let solution = BacktrackingSolver::new().solve(&instance);
        assert!(solution.path.is_none());
        assert_eq!(solution.time_cost, f64::INFINITY);
    }

    #[test]
    fn test_source_is_target() {
        let mut builder = ProblemInstance::builder();
        builder.add_edge(0, 1, 1.0, 1.0).add_node(1).source(0).target(0);
        let instance = builder.build().unwrap();

        let solution = BacktrackingSolver::new().solve(&instance);
        assert_eq!(solution.path, Some(vec![0]));
        assert_eq!(solution.time_cost, 0.0);
        assert_eq!(solution.fuel_cost, 0.0);
    }

    #[test]
    fn test_first_found_wins_ties() {
        let build = |first: usize, second: usize| {
            let mut builder = ProblemInstance::builder();
            builder
                .add_edge(0, first, 1.0, 1.0)
                .add_edge(0, second, 1.0, 1.0)
                .add_edge(first, 3, 1.0, 1.0)
                .add_edge(second, 3, 1.0, 1.0)
                .add_node(3)
                .source(0)
                .target(3)
                .fuel_budget(10.0);
            builder.build().unwrap()
        };

        let solver = BacktrackingSolver::new();
        assert_eq!(solver.solve(&build(1, 2)).path, Some(vec![0, 1, 3]));
        assert_eq!(solver.solve(&build(2, 1)).path, Some(vec![0, 2, 3]));
    }

    #[test]
    fn test_cheaper_path_over_budget_is_skipped() {
        let mut builder = ProblemInstance::builder();
        builder
            .add_edge(0, 1, 1.0, 10.0)
            .add_edge(0, 2, 5.0, 1.0)
            .add_edge(1, 3, 1.0, 10.0)
            .add_edge(2, 3, 5.0, 1.0)
            .add_node(3)
            .source(0)
            .target(3)
            .fuel_budget(5.0);
        let instance = builder.build().unwrap();

        let solution = BacktrackingSolver::new().solve(&instance);
        assert_eq!(solution.path, Some(vec![0, 2, 3]));
        assert_eq!(solution.time_cost, 10.0);
    }

    #[test]
    fn test_deterministic() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let solver = BacktrackingSolver::new();

        for _ in 0..20 {
            let instance = random_instance(&mut rng);
            let a = solver.solve(&instance);
            let b = solver.solve(&instance);
            assert_eq!(a.path, b.path);
            assert_eq!(a.time_cost, b.time_cost);
            assert_eq!(a.fuel_cost, b.fuel_cost);
        }
    }

    #[test]
    fn test_matches_brute_force() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let solver = BacktrackingSolver::new();

        for _ in 0..300 {
            let instance = random_instance(&mut rng);
            let solution = solver.solve(&instance);
            assert!(solution.is_feasible(&instance));

            match brute_force_best_time(&instance) {
                Some(best) => {
                    assert_eq!(solution.time_cost, best);
                    assert_eq!(solution.status, SolveStatus::Optimal);
                }
                None => {
                    assert!(solution.path.is_none());
                    assert_eq!(solution.status, SolveStatus::Infeasible);
                }
            }
        }
    }

    #[test]
    fn test_interrupt() {
        let flag = Arc::new(AtomicBool::new(true));
        let solver = BacktrackingSolver::new().with_interrupt(flag.clone());

        let solution = solver.solve(&ProblemInstance::example());
        assert_eq!(solution.status, SolveStatus::Interrupted);
        assert!(solution.path.is_none());

        flag.store(false, Ordering::Relaxed);
        let solution = solver.solve(&ProblemInstance::example());
        assert_eq!(solution.status, SolveStatus::Optimal);
    }

    #[test]
    fn test_long_chain_does_not_overflow() {
        let n = 200_000;
        let mut builder = ProblemInstance::builder();
        for u in 0..n - 1 {
            builder.add_edge(u, u + 1, 1.0, 1.0);
        }
        builder.add_node(n - 1).source(0).target(n - 1).fuel_budget(n as f64);
        let instance = builder.build().unwrap();

        let solution = BacktrackingSolver::new().solve(&instance);
        assert_eq!(solution.status, SolveStatus::Optimal);
        assert_eq!(solution.path.as_ref().map(Vec::len), Some(n));
        assert_eq!(solution.time_cost, (n - 1) as f64);
        assert_eq!(solution.nodes_explored, Some(n as u64));
    }
}
