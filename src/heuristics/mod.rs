//! Heuristics module for the RCSPP.
//!
//! This module exports the Ant Colony Optimization solver and its building
//! blocks.

pub mod aco;
pub mod pheromone;
pub mod roulette;

pub use aco::*;
pub use pheromone::*;
pub use roulette::*;
