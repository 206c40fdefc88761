//! Pheromone trails for Ant Colony Optimization.

use std::collections::HashMap;

use crate::instance::ProblemInstance;

/// Trail strength per directed edge.
///
/// Edges that were never written read as the default trail. The matrix lives
/// for a single run.
#[derive(Debug, Clone)]
pub struct PheromoneMatrix {
    trails: HashMap<(usize, usize), f64>,
    default_trail: f64,
}

impl PheromoneMatrix {
    /// Initial trail of every edge
    pub const DEFAULT_TRAIL: f64 = 1.0;

    pub fn new(default_trail: f64) -> Self {
        PheromoneMatrix {
            trails: HashMap::new(),
            default_trail,
        }
    }

    /// Trail on `(u, v)`
    #[inline]
    pub fn get(&self, u: usize, v: usize) -> f64 {
        self.trails.get(&(u, v)).copied().unwrap_or(self.default_trail)
    }

    pub fn default_trail(&self) -> f64 {
        self.default_trail
    }

    /// Number of edges holding an explicit value
    pub fn len(&self) -> usize {
        self.trails.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trails.is_empty()
    }

    /// Multiply every edge of `instance` by `1 - rate`, used or not
    pub fn evaporate(&mut self, instance: &ProblemInstance, rate: f64) {
        let keep = 1.0 - rate;
        for (u, v) in instance.edges() {
            let trail = self.get(u, v) * keep;
            self.trails.insert((u, v), trail);
        }
    }

    /// Add `amount` to every edge along `path`
    pub fn deposit(&mut self, path: &[usize], amount: f64) {
        for pair in path.windows(2) {
            *self
                .trails
                .entry((pair[0], pair[1]))
                .or_insert(self.default_trail) += amount;
        }
    }
}

impl Default for PheromoneMatrix {
    fn default() -> Self {
        Self::new(Self::DEFAULT_TRAIL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_trail() {
        let pheromone = PheromoneMatrix::default();
        assert_eq!(pheromone.get(0, 1), 1.0);
        assert_eq!(pheromone.get(7, 3), 1.0);
        assert_eq!(pheromone.default_trail(), PheromoneMatrix::DEFAULT_TRAIL);
        assert!(pheromone.is_empty());

        let weak = PheromoneMatrix::new(0.25);
        assert_eq!(weak.default_trail(), 0.25);
        assert_eq!(weak.get(0, 1), 0.25);
    }

    #[test]
    fn test_evaporation_decreases_every_edge() {
        let instance = ProblemInstance::example();
        let mut pheromone = PheromoneMatrix::default();
        pheromone.deposit(&[0, 1, 2], 3.0);

        let before: Vec<f64> = instance.edges().map(|(u, v)| pheromone.get(u, v)).collect();
        pheromone.evaporate(&instance, 0.1);
        let after: Vec<f64> = instance.edges().map(|(u, v)| pheromone.get(u, v)).collect();

        for (b, a) in before.iter().zip(&after) {
            assert!(a < b);
            assert!((a - b * 0.9).abs() < 1e-12);
        }
        assert_eq!(pheromone.len(), instance.num_edges());
    }

    #[test]
    fn test_deposit_along_path() {
        let mut pheromone = PheromoneMatrix::new(0.5);
        pheromone.deposit(&[0, 1, 2, 3], 2.0);
        pheromone.deposit(&[0, 1], 1.0);

        assert_eq!(pheromone.get(0, 1), 3.5);
        assert_eq!(pheromone.get(1, 2), 2.5);
        assert_eq!(pheromone.get(2, 3), 2.5);
        assert_eq!(pheromone.get(1, 0), 0.5);
    }
}
