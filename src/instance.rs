//! Module for building and representing RCSPP instances.
//!
//! An instance is a directed graph whose edges carry a travel time and a fuel
//! consumption, together with a source, a target and an inclusive fuel budget.
//! Instances are immutable once built; both solvers only read from them.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ProblemError;

/// Weights carried by a directed edge
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    /// Traversal time
    pub time: f64,
    /// Fuel consumed by the traversal
    pub fuel: f64,
}

/// A validated, read-only RCSPP instance
#[derive(Debug, Clone)]
pub struct ProblemInstance {
    name: String,
    adjacency: BTreeMap<usize, Vec<usize>>,
    edges: HashMap<(usize, usize), Edge>,
    source: usize,
    target: usize,
    fuel_budget: f64,
}

impl ProblemInstance {
    /// Start building a new instance
    pub fn builder() -> ProblemBuilder {
        ProblemBuilder::new()
    }

    /// Four-node demonstration graph.
    ///
    /// The only feasible optimum within the budget of 6 is `[0, 1, 2, 3]`
    /// with time 5 and fuel 6.
    pub fn example() -> Self {
        let mut builder = ProblemBuilder::new();
        builder
            .name("demo")
            .add_edge(0, 1, 2.0, 3.0)
            .add_edge(0, 2, 5.0, 6.0)
            .add_edge(1, 2, 1.0, 1.0)
            .add_edge(1, 3, 4.0, 3.0)
            .add_edge(2, 3, 2.0, 2.0)
            .add_node(3)
            .source(0)
            .target(3)
            .fuel_budget(6.0);

        match builder.build() {
            Ok(instance) => instance,
            Err(e) => unreachable!("demo instance is well-formed: {}", e),
        }
    }

    /// Parse an instance from a JSON file.
    ///
    /// An instance without a `name` is named after the file stem.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ProblemError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| ProblemError::Io(e.to_string()))?;
        let mut instance = Self::from_json(&text)?;

        if instance.name.is_empty() {
            if let Some(stem) = path.file_stem() {
                instance.name = stem.to_string_lossy().into_owned();
            }
        }
        Ok(instance)
    }

    /// Parse an instance from a JSON document
    pub fn from_json(text: &str) -> Result<Self, ProblemError> {
        let file: InstanceFile =
            serde_json::from_str(text).map_err(|e| ProblemError::Parse(e.to_string()))?;

        let mut builder = ProblemBuilder::new();
        if let Some(name) = &file.name {
            builder.name(name);
        }
        for &node in &file.nodes {
            builder.add_node(node);
        }
        for edge in &file.edges {
            builder.add_edge(edge.from, edge.to, edge.time, edge.fuel);
        }
        builder
            .source(file.source)
            .target(file.target)
            .fuel_budget(file.fuel_budget);

        let instance = builder.build()?;
        log::debug!(
            "Loaded instance '{}' ({} nodes, {} edges)",
            instance.name,
            instance.num_nodes(),
            instance.num_edges()
        );
        Ok(instance)
    }

    /// Instance name, empty if none was given
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn source(&self) -> usize {
        self.source
    }

    #[inline]
    pub fn target(&self) -> usize {
        self.target
    }

    /// Inclusive upper bound on the fuel of any accepted path
    #[inline]
    pub fn fuel_budget(&self) -> f64 {
        self.fuel_budget
    }

    pub fn num_nodes(&self) -> usize {
        self.adjacency.len()
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    pub fn contains_node(&self, node: usize) -> bool {
        self.adjacency.contains_key(&node)
    }

    /// Nodes in ascending order
    pub fn nodes(&self) -> impl Iterator<Item = usize> + '_ {
        self.adjacency.keys().copied()
    }

    /// Successors of `node` in declaration order.
    ///
    /// Panics if `node` is not in the graph.
    #[inline]
    pub fn successors(&self, node: usize) -> &[usize] {
        match self.adjacency.get(&node) {
            Some(successors) => successors,
            None => panic!("node {} is not in the graph", node),
        }
    }

    /// All edges, tails ascending, heads in declaration order
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.adjacency
            .iter()
            .flat_map(|(&u, successors)| successors.iter().map(move |&v| (u, v)))
    }

    /// Weights of `(u, v)`, or `None` if it is not an edge
    #[inline]
    pub fn edge(&self, u: usize, v: usize) -> Option<Edge> {
        self.edges.get(&(u, v)).copied()
    }

    /// Travel time of `(u, v)`.
    ///
    /// Panics if `(u, v)` is not an edge.
    #[inline]
    pub fn time(&self, u: usize, v: usize) -> f64 {
        self.expect_edge(u, v).time
    }

    /// Fuel consumption of `(u, v)`.
    ///
    /// Panics if `(u, v)` is not an edge.
    #[inline]
    pub fn fuel(&self, u: usize, v: usize) -> f64 {
        self.expect_edge(u, v).fuel
    }

    fn expect_edge(&self, u: usize, v: usize) -> Edge {
        match self.edges.get(&(u, v)) {
            Some(edge) => *edge,
            None => panic!("({}, {}) is not an edge of the graph", u, v),
        }
    }

    /// Sum time and fuel along `path`.
    ///
    /// Returns `None` if two consecutive nodes are not joined by an edge.
    pub fn path_costs(&self, path: &[usize]) -> Option<(f64, f64)> {
        let mut time = 0.0;
        let mut fuel = 0.0;
        for pair in path.windows(2) {
            let edge = self.edge(pair[0], pair[1])?;
            time += edge.time;
            fuel += edge.fuel;
        }
        Some((time, fuel))
    }

    /// Check that `path` is a simple source-to-target path within the budget
    pub fn is_feasible_path(&self, path: &[usize]) -> bool {
        if path.first() != Some(&self.source) || path.last() != Some(&self.target) {
            return false;
        }

        let mut seen = HashSet::with_capacity(path.len());
        if !path.iter().all(|&node| seen.insert(node)) {
            return false;
        }

        match self.path_costs(path) {
            Some((_, fuel)) => fuel <= self.fuel_budget,
            None => false,
        }
    }

    /// Whether the target can be reached at all, ignoring the fuel budget
    pub fn target_reachable(&self) -> bool {
        let mut seen = HashSet::new();
        let mut queue = VecDeque::new();
        seen.insert(self.source);
        queue.push_back(self.source);

        while let Some(u) = queue.pop_front() {
            if u == self.target {
                return true;
            }
            for &v in self.successors(u) {
                if seen.insert(v) {
                    queue.push_back(v);
                }
            }
        }

        false
    }

    /// Get statistics about the instance
    pub fn statistics(&self) -> InstanceStatistics {
        let degrees: Vec<usize> = self.adjacency.values().map(Vec::len).collect();
        let max_out_degree = degrees.iter().copied().max().unwrap_or(0);
        let avg_out_degree = if degrees.is_empty() {
            0.0
        } else {
            degrees.iter().sum::<usize>() as f64 / degrees.len() as f64
        };

        let time_range = value_range(self.edges.values().map(|e| e.time));
        let fuel_range = value_range(self.edges.values().map(|e| e.fuel));

        InstanceStatistics {
            name: self.name.clone(),
            num_nodes: self.num_nodes(),
            num_edges: self.num_edges(),
            source: self.source,
            target: self.target,
            fuel_budget: self.fuel_budget,
            max_out_degree,
            avg_out_degree,
            time_range,
            fuel_range,
            target_reachable: self.target_reachable(),
        }
    }
}

fn value_range(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values.fold(None, |range, x| match range {
        Some((lo, hi)) => Some((f64::min(lo, x), f64::max(hi, x))),
        None => Some((x, x)),
    })
}

/// Incremental construction of a [`ProblemInstance`].
///
/// `add_edge` registers its tail as a node; heads that never appear as a
/// tail must be declared with `add_node`, otherwise `build` reports
/// [`ProblemError::UnknownSuccessor`].
#[derive(Debug, Clone, Default)]
pub struct ProblemBuilder {
    name: String,
    adjacency: BTreeMap<usize, Vec<usize>>,
    edges: Vec<(usize, usize, f64, f64)>,
    source: Option<usize>,
    target: Option<usize>,
    fuel_budget: f64,
}

impl ProblemBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(&mut self, name: &str) -> &mut Self {
        self.name = name.to_string();
        self
    }

    /// Declare a node, possibly without successors
    pub fn add_node(&mut self, node: usize) -> &mut Self {
        self.adjacency.entry(node).or_default();
        self
    }

    /// Declare the directed edge `(from, to)`
    pub fn add_edge(&mut self, from: usize, to: usize, time: f64, fuel: f64) -> &mut Self {
        self.adjacency.entry(from).or_default().push(to);
        self.edges.push((from, to, time, fuel));
        self
    }

    pub fn source(&mut self, source: usize) -> &mut Self {
        self.source = Some(source);
        self
    }

    pub fn target(&mut self, target: usize) -> &mut Self {
        self.target = Some(target);
        self
    }

    pub fn fuel_budget(&mut self, fuel_budget: f64) -> &mut Self {
        self.fuel_budget = fuel_budget;
        self
    }

    /// Validate every precondition and freeze the instance
    pub fn build(&self) -> Result<ProblemInstance, ProblemError> {
        let source = self.source.ok_or(ProblemError::MissingSource)?;
        let target = self.target.ok_or(ProblemError::MissingTarget)?;

        if !self.fuel_budget.is_finite() || self.fuel_budget < 0.0 {
            return Err(ProblemError::InvalidBudget(self.fuel_budget));
        }
        if !self.adjacency.contains_key(&source) {
            return Err(ProblemError::UnknownSource(source));
        }
        if !self.adjacency.contains_key(&target) {
            return Err(ProblemError::UnknownTarget(target));
        }

        let mut edges = HashMap::with_capacity(self.edges.len());
        for &(from, to, time, fuel) in &self.edges {
            if !self.adjacency.contains_key(&to) {
                return Err(ProblemError::UnknownSuccessor { from, to });
            }
            for (weight, value) in [("time", time), ("fuel", fuel)] {
                if !value.is_finite() || value < 0.0 {
                    return Err(ProblemError::InvalidWeight { from, to, weight, value });
                }
            }
            if edges.insert((from, to), Edge { time, fuel }).is_some() {
                return Err(ProblemError::DuplicateEdge { from, to });
            }
        }

        Ok(ProblemInstance {
            name: self.name.clone(),
            adjacency: self.adjacency.clone(),
            edges,
            source,
            target,
            fuel_budget: self.fuel_budget,
        })
    }
}

/// On-disk JSON layout of an instance
#[derive(Debug, Clone, Serialize, Deserialize)]
struct InstanceFile {
    #[serde(default)]
    name: Option<String>,
    source: usize,
    target: usize,
    fuel_budget: f64,
    #[serde(default)]
    nodes: Vec<usize>,
    edges: Vec<EdgeRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct EdgeRecord {
    from: usize,
    to: usize,
    time: f64,
    fuel: f64,
}

/// Statistics about an RCSPP instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceStatistics {
    pub name: String,
    pub num_nodes: usize,
    pub num_edges: usize,
    pub source: usize,
    pub target: usize,
    pub fuel_budget: f64,
    pub max_out_degree: usize,
    pub avg_out_degree: f64,
    /// (min, max) edge time, `None` without edges
    pub time_range: Option<(f64, f64)>,
    /// (min, max) edge fuel, `None` without edges
    pub fuel_range: Option<(f64, f64)>,
    pub target_reachable: bool,
}

impl std::fmt::Display for InstanceStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Instance: {}", self.name)?;
        writeln!(f, "  Nodes: {}", self.num_nodes)?;
        writeln!(f, "  Edges: {}", self.num_edges)?;
        writeln!(f, "  Source -> target: {} -> {}", self.source, self.target)?;
        writeln!(f, "  Fuel budget: {:.2}", self.fuel_budget)?;
        writeln!(f, "  Out-degree: max {}, avg {:.2}", self.max_out_degree, self.avg_out_degree)?;
        if let Some((lo, hi)) = self.time_range {
            writeln!(f, "  Edge time: [{:.2}, {:.2}]", lo, hi)?;
        }
        if let Some((lo, hi)) = self.fuel_range {
            writeln!(f, "  Edge fuel: [{:.2}, {:.2}]", lo, hi)?;
        }
        writeln!(f, "  Target reachable (ignoring fuel): {}", self.target_reachable)
    }
}
