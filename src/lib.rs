//! RCSPP Solver Library
//!
//! Solvers for the Resource-Constrained Shortest Path Problem: find a simple
//! path from a source to a target in a directed graph that minimizes total
//! travel time while keeping total fuel within a budget.
//!
//! # Features
//!
//! - Exact branch-and-bound backtracking (optimal, exponential worst case)
//! - Ant Colony Optimization (approximate, seeded, optionally parallel)
//! - JSON instance loading and a validating instance builder
//! - Benchmarking tools with CSV export
//!
//! # Example
//!
//! ```
//! use rcspp_solver::exact::BacktrackingSolver;
//! use rcspp_solver::heuristics::aco::{AcoConfig, AntColonyOptimization};
//! use rcspp_solver::instance::ProblemInstance;
//! use rcspp_solver::solver::Solver;
//!
//! let instance = ProblemInstance::example();
//!
//! let exact = BacktrackingSolver::new().solve(&instance);
//! assert_eq!(exact.path, Some(vec![0, 1, 2, 3]));
//!
//! let config = AcoConfig { ant_count: 10, iteration_count: 50, ..Default::default() };
//! let aco = AntColonyOptimization::new(config).unwrap().solve(&instance);
//! assert!(aco.time_cost >= exact.time_cost);
//! ```

pub mod benchmark;
pub mod error;
pub mod exact;
pub mod heuristics;
pub mod instance;
pub mod solution;
pub mod solver;

pub use error::{ConfigError, ProblemError};
pub use instance::ProblemInstance;
pub use solution::{PathSolution, SolveStatus};
pub use solver::Solver;
