//! Error types for instance construction and solver configuration.
//!
//! Infeasibility is not an error: solvers report it through
//! [`crate::solution::SolveStatus::Infeasible`].

use thiserror::Error;

/// Precondition violations detected while building a [`crate::ProblemInstance`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProblemError {
    /// No source node was given to the builder.
    #[error("source node is not set")]
    MissingSource,
    /// No target node was given to the builder.
    #[error("target node is not set")]
    MissingTarget,
    /// The source is not a node of the graph.
    #[error("source node {0} is not in the graph")]
    UnknownSource(usize),
    /// The target is not a node of the graph.
    #[error("target node {0} is not in the graph")]
    UnknownTarget(usize),
    /// An edge points to a node that has no adjacency entry.
    #[error("edge ({from}, {to}) points to a node that is not in the graph")]
    UnknownSuccessor {
        /// Tail of the edge.
        from: usize,
        /// Missing head of the edge.
        to: usize,
    },
    /// The same directed edge was declared twice.
    #[error("edge ({from}, {to}) is declared more than once")]
    DuplicateEdge {
        /// Tail of the edge.
        from: usize,
        /// Head of the edge.
        to: usize,
    },
    /// An edge weight is negative, NaN or infinite.
    #[error("edge ({from}, {to}) has invalid {weight} weight {value}")]
    InvalidWeight {
        /// Tail of the edge.
        from: usize,
        /// Head of the edge.
        to: usize,
        /// Which weight is invalid ("time" or "fuel").
        weight: &'static str,
        /// The rejected value.
        value: f64,
    },
    /// The fuel budget is negative, NaN or infinite.
    #[error("fuel budget {0} must be a finite non-negative number")]
    InvalidBudget(f64),
    /// Reading the instance file failed.
    #[error("cannot read instance file: {0}")]
    Io(String),
    /// The instance file is not valid JSON for the expected format.
    #[error("cannot parse instance file: {0}")]
    Parse(String),
}

/// Invalid Ant Colony Optimization parameters.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// At least one ant is needed per iteration.
    #[error("ant count must be at least 1")]
    NoAnts,
    /// Evaporation must remove some trail but not all of it.
    #[error("evaporation rate {0} must lie strictly between 0 and 1")]
    EvaporationRate(f64),
    /// Exponents must be finite and non-negative.
    #[error("{name} exponent {value} must be finite and non-negative")]
    Exponent {
        /// "alpha" or "beta".
        name: &'static str,
        /// The rejected value.
        value: f64,
    },
    /// The deposit numerator must be finite and positive.
    #[error("deposit scale {0} must be finite and positive")]
    DepositScale(f64),
    /// A time limit, when set, must be finite and positive.
    #[error("time limit {0} must be finite and positive")]
    TimeLimit(f64),
}
