//! Common interface of the RCSPP solvers.

use crate::instance::ProblemInstance;
use crate::solution::PathSolution;

/// Trait for algorithms that search a fuel-feasible, time-minimal path
pub trait Solver {
    /// Solve `instance`, reporting infeasibility through the returned solution
    fn solve(&self, instance: &ProblemInstance) -> PathSolution;

    /// Get the name of the solver
    fn name(&self) -> &str;
}
