//! Solution representation for the RCSPP.
//!
//! A solution is the result triple `(path | none, time, fuel)` returned by
//! every solver, plus some bookkeeping about the run that produced it.

use crate::instance::ProblemInstance;
use serde::{Deserialize, Serialize};

/// How a solver run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolveStatus {
    /// Exhaustive search completed; the path is optimal
    Optimal,
    /// A feasible path without optimality proof
    Feasible,
    /// No feasible path was found
    Infeasible,
    /// Stopped from outside before any path was found
    Interrupted,
}

impl std::fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            SolveStatus::Optimal => "optimal",
            SolveStatus::Feasible => "feasible",
            SolveStatus::Infeasible => "infeasible",
            SolveStatus::Interrupted => "interrupted",
        };
        f.write_str(label)
    }
}

/// Result of a solver run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathSolution {
    /// Source-to-target node sequence, `None` if no feasible path was found
    pub path: Option<Vec<usize>>,
    /// Total time along the path (`+inf` without a path)
    #[serde(with = "cost")]
    pub time_cost: f64,
    /// Total fuel along the path (`+inf` without a path)
    #[serde(with = "cost")]
    pub fuel_cost: f64,
    /// How the run ended
    pub status: SolveStatus,
    /// Algorithm that generated this solution
    pub algorithm: String,
    /// Computation time in seconds
    pub computation_time: f64,
    /// Number of iterations (if applicable)
    pub iterations: Option<usize>,
    /// Number of search nodes visited (if applicable)
    pub nodes_explored: Option<u64>,
}

impl PathSolution {
    /// Solution carrying no path
    pub fn infeasible(algorithm: &str) -> Self {
        PathSolution {
            path: None,
            time_cost: f64::INFINITY,
            fuel_cost: f64::INFINITY,
            status: SolveStatus::Infeasible,
            algorithm: algorithm.to_string(),
            computation_time: 0.0,
            iterations: None,
            nodes_explored: None,
        }
    }

    /// Solution for an already costed path
    pub fn with_path(
        path: Vec<usize>,
        time_cost: f64,
        fuel_cost: f64,
        status: SolveStatus,
        algorithm: &str,
    ) -> Self {
        PathSolution {
            path: Some(path),
            time_cost,
            fuel_cost,
            status,
            ..Self::infeasible(algorithm)
        }
    }

    /// Whether a path was found
    pub fn has_path(&self) -> bool {
        self.path.is_some()
    }

    /// The result triple
    pub fn as_triple(&self) -> (Option<&[usize]>, f64, f64) {
        (self.path.as_deref(), self.time_cost, self.fuel_cost)
    }

    /// Re-check the solution against `instance`.
    ///
    /// A solution without path is consistent when both costs are infinite.
    /// With a path, the path must be feasible and the stored costs must
    /// match the edge weights along it.
    pub fn is_feasible(&self, instance: &ProblemInstance) -> bool {
        match &self.path {
            None => self.time_cost == f64::INFINITY && self.fuel_cost == f64::INFINITY,
            Some(path) => {
                if !instance.is_feasible_path(path) {
                    return false;
                }
                match instance.path_costs(path) {
                    Some((time, fuel)) => {
                        (time - self.time_cost).abs() <= 1e-9 * time.max(1.0)
                            && (fuel - self.fuel_cost).abs() <= 1e-9 * fuel.max(1.0)
                    }
                    None => false,
                }
            }
        }
    }
}

impl std::fmt::Display for PathSolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Solution ({})", self.algorithm)?;
        writeln!(f, "  Status: {}", self.status)?;
        match &self.path {
            Some(path) => {
                writeln!(f, "  Path: {:?}", path)?;
                writeln!(f, "  Time cost: {:.2}", self.time_cost)?;
                writeln!(f, "  Fuel used: {:.2}", self.fuel_cost)?;
            }
            None => writeln!(f, "  Path: none")?,
        }
        if let Some(iter) = self.iterations {
            writeln!(f, "  Iterations: {}", iter)?;
        }
        if let Some(nodes) = self.nodes_explored {
            writeln!(f, "  Nodes explored: {}", nodes)?;
        }
        write!(f, "  Time: {:.4}s", self.computation_time)
    }
}

/// Path costs as JSON numbers, with non-finite values spelled `"inf"`,
/// `"-inf"` or `"nan"` since JSON has no literal for them.
mod cost {
    use serde::de::{Error, Unexpected};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            serializer.serialize_f64(*value)
        } else if value.is_nan() {
            serializer.serialize_str("nan")
        } else if *value > 0.0 {
            serializer.serialize_str("inf")
        } else {
            serializer.serialize_str("-inf")
        }
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(f64),
        Text(String),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        match Repr::deserialize(deserializer)? {
            Repr::Number(value) => Ok(value),
            Repr::Text(text) => match text.as_str() {
                "inf" => Ok(f64::INFINITY),
                "-inf" => Ok(f64::NEG_INFINITY),
                "nan" => Ok(f64::NAN),
                other => Err(D::Error::invalid_value(
                    Unexpected::Str(other),
                    &"a number, \"inf\", \"-inf\" or \"nan\"",
                )),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infeasible_solution() {
        let sol = PathSolution::infeasible("test");
        assert!(!sol.has_path());
        assert_eq!(sol.status, SolveStatus::Infeasible);
        assert_eq!(sol.as_triple(), (None, f64::INFINITY, f64::INFINITY));
        assert!(sol.is_feasible(&ProblemInstance::example()));
    }

    #[test]
    fn test_feasibility_check() {
        let instance = ProblemInstance::example();

        let good = PathSolution::with_path(vec![0, 1, 2, 3], 5.0, 6.0, SolveStatus::Optimal, "t");
        assert!(good.is_feasible(&instance));

        let wrong_costs =
            PathSolution::with_path(vec![0, 1, 2, 3], 4.0, 6.0, SolveStatus::Optimal, "t");
        assert!(!wrong_costs.is_feasible(&instance));

        let over_budget = PathSolution::with_path(vec![0, 2, 3], 7.0, 8.0, SolveStatus::Feasible, "t");
        assert!(!over_budget.is_feasible(&instance));
    }

    #[test]
    fn test_json_keeps_infinite_costs() {
        let sol = PathSolution::infeasible("Backtracking");
        let json = serde_json::to_string(&sol).unwrap();
        assert!(json.contains(r#""time_cost":"inf""#));
        assert!(json.contains(r#""fuel_cost":"inf""#));

        let back: PathSolution = serde_json::from_str(&json).unwrap();
        assert_eq!(back.as_triple(), (None, f64::INFINITY, f64::INFINITY));
        assert_eq!(back.status, SolveStatus::Infeasible);
        assert_eq!(back.algorithm, "Backtracking");

        let found = PathSolution::with_path(vec![0, 1, 2, 3], 5.0, 6.0, SolveStatus::Optimal, "t");
        let back: PathSolution =
            serde_json::from_str(&serde_json::to_string(&found).unwrap()).unwrap();
        assert_eq!(back.as_triple(), (Some(&[0, 1, 2, 3][..]), 5.0, 6.0));

        let bad = r#"{"path":null,"time_cost":"far","fuel_cost":1.0,"status":"Feasible",
            "algorithm":"t","computation_time":0.0,"iterations":null,"nodes_explored":null}"#;
        assert!(serde_json::from_str::<PathSolution>(bad).is_err());
    }
}
