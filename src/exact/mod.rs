//! Exact solvers module.

pub mod backtracking;

pub use backtracking::*;
