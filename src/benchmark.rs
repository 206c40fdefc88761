//! Benchmarking and experimentation module for the RCSPP.
//!
//! Runs the exact solver once and ACO over several seeds per instance,
//! collects per-run results, aggregates statistics and exports CSV files.

use crate::exact::BacktrackingSolver;
use crate::heuristics::aco::{AcoConfig, AntColonyOptimization};
use crate::instance::ProblemInstance;
use crate::solution::{PathSolution, SolveStatus};
use crate::solver::Solver;

use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

/// Result of running a single algorithm once on an instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    /// Algorithm name
    pub algorithm: String,
    /// Instance name
    pub instance: String,
    /// Seed used (stochastic methods only)
    pub seed: Option<u64>,
    /// Whether a feasible path was found
    pub found: bool,
    /// Run status
    pub status: SolveStatus,
    /// Total time of the path found
    pub time_cost: f64,
    /// Total fuel of the path found
    pub fuel_cost: f64,
    /// Computation time in seconds
    pub cpu_time: f64,
    /// Number of iterations (if applicable)
    pub iterations: Option<usize>,
    /// Search nodes visited (if applicable)
    pub nodes_explored: Option<u64>,
    /// Relative gap to the proven optimum, in percent
    pub gap_to_optimal: Option<f64>,
}

/// Aggregated statistics for an algorithm
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlgorithmStatistics {
    /// Algorithm name
    pub algorithm: String,
    /// Number of runs
    pub num_runs: usize,
    /// Runs that found a feasible path
    pub num_found: usize,
    /// Runs that matched the proven optimum
    pub num_optimal: usize,
    /// Average path time
    pub avg_time_cost: f64,
    /// Best path time
    pub best_time_cost: f64,
    /// Worst path time
    pub worst_time_cost: f64,
    /// Standard deviation of path time
    pub std_time_cost: f64,
    /// Average computation time
    pub avg_cpu_time: f64,
    /// Total computation time
    pub total_cpu_time: f64,
    /// Average gap to the optimum
    pub avg_gap: Option<f64>,
}

/// Benchmark configuration
#[derive(Debug, Clone)]
pub struct BenchmarkConfig {
    /// Number of ACO runs per instance, seeds `0..num_runs`
    pub num_runs: usize,
    /// Parameters shared by every ACO run (the seed is overridden)
    pub aco: AcoConfig,
    /// Run the exact solver first to obtain the optimum
    pub run_exact: bool,
    /// Show a progress bar over the ACO runs
    pub show_progress: bool,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        BenchmarkConfig {
            num_runs: 5,
            aco: AcoConfig::default(),
            run_exact: true,
            show_progress: false,
        }
    }
}

/// Benchmarking engine
pub struct Benchmark {
    config: BenchmarkConfig,
    results: Vec<RunResult>,
    optimum: HashMap<String, f64>,
}

impl Benchmark {
    pub fn new(config: BenchmarkConfig) -> Self {
        Benchmark {
            config,
            results: Vec::new(),
            optimum: HashMap::new(),
        }
    }

    /// Set the known optimal time for an instance
    pub fn set_optimum(&mut self, instance_name: &str, time_cost: f64) {
        self.optimum.insert(instance_name.to_string(), time_cost);
    }

    /// Run the exact solver on instance
    pub fn run_exact(&mut self, instance: &ProblemInstance) -> Option<PathSolution> {
        if !self.config.run_exact {
            return None;
        }

        let solution = BacktrackingSolver::new().solve(instance);
        if solution.status == SolveStatus::Optimal {
            self.optimum
                .insert(instance.name().to_string(), solution.time_cost);
        }
        self.record_result(instance, &solution, None);
        Some(solution)
    }

    /// Run ACO once per seed
    pub fn run_aco(&mut self, instance: &ProblemInstance) -> Result<(), crate::error::ConfigError> {
        let progress = if self.config.show_progress {
            let bar = ProgressBar::new(self.config.num_runs as u64);
            if let Ok(style) = ProgressStyle::with_template("{msg} [{bar:40}] {pos}/{len} ({elapsed})") {
                bar.set_style(style);
            }
            bar.set_message(format!("ACO on {}", instance.name()));
            bar
        } else {
            ProgressBar::hidden()
        };

        for seed in 0..self.config.num_runs as u64 {
            let config = AcoConfig {
                seed,
                ..self.config.aco.clone()
            };
            let aco = AntColonyOptimization::new(config)?;
            let solution = aco.solve(instance);
            self.record_result(instance, &solution, Some(seed));
            progress.inc(1);
        }

        progress.finish_and_clear();
        Ok(())
    }

    /// Run full benchmark on an instance
    pub fn run_full_benchmark(
        &mut self,
        instance: &ProblemInstance,
    ) -> Result<(), crate::error::ConfigError> {
        log::info!("Running benchmark on instance: {}", instance.name());

        self.run_exact(instance);
        self.run_aco(instance)
    }

    /// Record a result
    fn record_result(&mut self, instance: &ProblemInstance, solution: &PathSolution, seed: Option<u64>) {
        let gap_to_optimal = match self.optimum.get(instance.name()) {
            Some(&best) if solution.has_path() => Some(relative_gap(solution.time_cost, best)),
            _ => None,
        };

        self.results.push(RunResult {
            algorithm: solution.algorithm.clone(),
            instance: instance.name().to_string(),
            seed,
            found: solution.has_path(),
            status: solution.status,
            time_cost: solution.time_cost,
            fuel_cost: solution.fuel_cost,
            cpu_time: solution.computation_time,
            iterations: solution.iterations,
            nodes_explored: solution.nodes_explored,
            gap_to_optimal,
        });
    }

    /// Compute statistics for each algorithm
    pub fn compute_statistics(&self) -> Vec<AlgorithmStatistics> {
        let mut stats_map: HashMap<String, Vec<&RunResult>> = HashMap::new();

        for result in &self.results {
            stats_map
                .entry(result.algorithm.clone())
                .or_default()
                .push(result);
        }

        let mut statistics = Vec::new();

        for (algo, results) in stats_map {
            let found: Vec<_> = results.iter().filter(|r| r.found).collect();
            let cpu_times: Vec<f64> = results.iter().map(|r| r.cpu_time).collect();
            let costs: Vec<f64> = found.iter().map(|r| r.time_cost).collect();
            let gaps: Vec<f64> = found.iter().filter_map(|r| r.gap_to_optimal).collect();

            let (avg_time_cost, std_time_cost) = if costs.is_empty() {
                (f64::INFINITY, 0.0)
            } else {
                (costs.iter().mean(), costs.iter().population_std_dev())
            };

            statistics.push(AlgorithmStatistics {
                algorithm: algo,
                num_runs: results.len(),
                num_found: found.len(),
                num_optimal: gaps.iter().filter(|&&g| g.abs() < 1e-9).count(),
                avg_time_cost,
                best_time_cost: costs.iter().cloned().fold(f64::INFINITY, f64::min),
                worst_time_cost: costs.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
                std_time_cost,
                avg_cpu_time: cpu_times.iter().mean(),
                total_cpu_time: cpu_times.iter().sum(),
                avg_gap: if gaps.is_empty() {
                    None
                } else {
                    Some(gaps.iter().mean())
                },
            });
        }

        statistics.sort_by(|a, b| {
            a.avg_time_cost
                .total_cmp(&b.avg_time_cost)
                .then_with(|| a.algorithm.cmp(&b.algorithm))
        });

        statistics
    }

    /// Export results to CSV
    pub fn export_to_csv<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let file = File::create(path)?;
        let mut writer = csv::Writer::from_writer(file);

        for result in &self.results {
            writer.serialize(result)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Export statistics to CSV
    pub fn export_statistics_csv<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let file = File::create(path)?;
        let mut writer = csv::Writer::from_writer(file);

        for stat in self.compute_statistics() {
            writer.serialize(stat)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Generate summary report
    pub fn generate_report(&self) -> String {
        let mut report = String::new();

        report.push_str("========================================\n");
        report.push_str("        RCSPP Benchmark Report\n");
        report.push_str("========================================\n");
        report.push_str(&format!(
            "Generated: {}\n\n",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        ));

        report.push_str("Algorithm Performance Summary:\n");
        report.push_str("-".repeat(84).as_str());
        report.push('\n');
        report.push_str(&format!(
            "{:<15} {:>8} {:>8} {:>12} {:>12} {:>12} {:>10}\n",
            "Algorithm", "Found", "Optimal", "Avg Time", "Best Time", "Avg Gap%", "Avg CPU"
        ));
        report.push_str("-".repeat(84).as_str());
        report.push('\n');

        for stat in self.compute_statistics() {
            let gap_str = stat
                .avg_gap
                .map(|g| format!("{:.2}%", g))
                .unwrap_or_else(|| "-".to_string());

            report.push_str(&format!(
                "{:<15} {:>8} {:>8} {:>12.2} {:>12.2} {:>12} {:>10.4}\n",
                stat.algorithm,
                format!("{}/{}", stat.num_found, stat.num_runs),
                stat.num_optimal,
                stat.avg_time_cost,
                stat.best_time_cost,
                gap_str,
                stat.avg_cpu_time
            ));
        }

        report.push_str("-".repeat(84).as_str());
        report.push('\n');

        report.push_str("\nBest Paths per Instance:\n");

        let mut instance_best: HashMap<&str, &RunResult> = HashMap::new();
        for result in self.results.iter().filter(|r| r.found) {
            let entry = instance_best.entry(result.instance.as_str()).or_insert(result);
            if result.time_cost < entry.time_cost {
                *entry = result;
            }
        }

        let mut names: Vec<_> = instance_best.keys().copied().collect();
        names.sort_unstable();
        for name in names {
            let best = instance_best[name];
            report.push_str(&format!(
                "  {}: time {:.2}, fuel {:.2} ({})\n",
                name, best.time_cost, best.fuel_cost, best.algorithm
            ));
        }

        report
    }

    /// Get all results
    pub fn results(&self) -> &[RunResult] {
        &self.results
    }

    /// Get known optimal times
    pub fn optimum(&self) -> &HashMap<String, f64> {
        &self.optimum
    }
}

/// Gap of `value` over `best` in percent; absolute difference when `best` is zero
fn relative_gap(value: f64, best: f64) -> f64 {
    if best.abs() < 1e-12 {
        (value - best) * 100.0
    } else {
        (value - best) / best * 100.0
    }
}

/// Helper function to load instances from a directory
pub fn load_instances_from_dir<P: AsRef<Path>>(dir: P) -> Vec<ProblemInstance> {
    let mut instances = Vec::new();

    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().map(|e| e == "json").unwrap_or(false) {
                match ProblemInstance::from_file(&path) {
                    Ok(instance) => instances.push(instance),
                    Err(e) => log::warn!("Skipping {:?}: {}", path, e),
                }
            }
        }
    }

    // Sort by size
    instances.sort_by_key(|i| (i.num_nodes(), i.num_edges()));

    instances
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> BenchmarkConfig {
        BenchmarkConfig {
            num_runs: 3,
            aco: AcoConfig {
                ant_count: 10,
                iteration_count: 30,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_benchmark_config() {
        let config = BenchmarkConfig::default();
        assert_eq!(config.num_runs, 5);
        assert!(config.run_exact);
    }

    #[test]
    fn test_full_benchmark_on_example() {
        let instance = ProblemInstance::example();
        let mut benchmark = Benchmark::new(small_config());
        benchmark.run_full_benchmark(&instance).unwrap();

        assert_eq!(benchmark.results().len(), 4);
        assert_eq!(benchmark.optimum().get("demo"), Some(&5.0));

        let stats = benchmark.compute_statistics();
        assert_eq!(stats.len(), 2);

        let exact = stats.iter().find(|s| s.algorithm == "Backtracking").unwrap();
        assert_eq!(exact.num_found, 1);
        assert_eq!(exact.best_time_cost, 5.0);

        let aco = stats.iter().find(|s| s.algorithm == "ACO").unwrap();
        assert_eq!(aco.num_runs, 3);
        assert!(aco.best_time_cost >= 5.0);
        assert!(aco.avg_gap.unwrap() >= 0.0);

        let report = benchmark.generate_report();
        assert!(report.contains("Backtracking"));
        assert!(report.contains("demo: time 5.00"));
    }

    #[test]
    fn test_statistics_without_feasible_runs() {
        let mut builder = ProblemInstance::builder();
        builder
            .name("empty")
            .add_edge(0, 1, 1.0, 5.0)
            .add_node(1)
            .source(0)
            .target(1)
            .fuel_budget(1.0);
        let instance = builder.build().unwrap();

        let mut benchmark = Benchmark::new(small_config());
        benchmark.run_full_benchmark(&instance).unwrap();

        for stat in benchmark.compute_statistics() {
            assert_eq!(stat.num_found, 0);
            assert_eq!(stat.best_time_cost, f64::INFINITY);
            assert_eq!(stat.avg_gap, None);
        }
    }

    #[test]
    fn test_relative_gap() {
        assert_eq!(relative_gap(6.0, 5.0), 20.0);
        assert_eq!(relative_gap(5.0, 5.0), 0.0);
        assert_eq!(relative_gap(0.5, 0.0), 50.0);
    }

    fn scratch_dir(label: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("rcspp-{}-{}", label, std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_unnamed_instances_stay_distinct() {
        let dir = scratch_dir("load");
        std::fs::write(
            dir.join("short.json"),
            r#"{ "source": 0, "target": 1, "fuel_budget": 5.0, "nodes": [1],
                 "edges": [ { "from": 0, "to": 1, "time": 3.0, "fuel": 1.0 } ] }"#,
        )
        .unwrap();
        std::fs::write(
            dir.join("long.json"),
            r#"{ "source": 0, "target": 2, "fuel_budget": 5.0, "nodes": [2],
                 "edges": [ { "from": 0, "to": 1, "time": 4.0, "fuel": 1.0 },
                            { "from": 1, "to": 2, "time": 5.0, "fuel": 1.0 } ] }"#,
        )
        .unwrap();
        std::fs::write(dir.join("broken.json"), "{ not json").unwrap();
        std::fs::write(dir.join("notes.txt"), "ignored").unwrap();

        let instances = load_instances_from_dir(&dir);
        let names: Vec<&str> = instances.iter().map(|i| i.name()).collect();
        assert_eq!(names, vec!["short", "long"]);

        let mut benchmark = Benchmark::new(small_config());
        for instance in &instances {
            benchmark.run_full_benchmark(instance).unwrap();
        }

        assert_eq!(benchmark.optimum().get("short"), Some(&3.0));
        assert_eq!(benchmark.optimum().get("long"), Some(&9.0));
        for result in benchmark.results().iter().filter(|r| r.found) {
            assert_eq!(result.gap_to_optimal, Some(0.0));
        }

        let report = benchmark.generate_report();
        assert!(report.contains("short: time 3.00"));
        assert!(report.contains("long: time 9.00"));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_csv_export() {
        let dir = scratch_dir("csv");
        let mut benchmark = Benchmark::new(small_config());
        benchmark.run_full_benchmark(&ProblemInstance::example()).unwrap();

        let results_path = dir.join("results.csv");
        benchmark.export_to_csv(&results_path).unwrap();
        let mut reader = csv::Reader::from_path(&results_path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert!(headers.iter().any(|h| h == "gap_to_optimal"));
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 4);
        assert_eq!(&rows[0][0], "Backtracking");
        assert_eq!(&rows[0][1], "demo");

        let stats_path = dir.join("statistics.csv");
        benchmark.export_statistics_csv(&stats_path).unwrap();
        let mut reader = csv::Reader::from_path(&stats_path).unwrap();
        let algorithms: Vec<String> = reader
            .records()
            .map(|r| r.unwrap()[0].to_string())
            .collect();
        assert_eq!(algorithms.len(), 2);
        assert!(algorithms.contains(&"ACO".to_string()));
        assert!(algorithms.contains(&"Backtracking".to_string()));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_known_optimum_without_exact_run() {
        let config = BenchmarkConfig {
            run_exact: false,
            ..small_config()
        };
        let mut benchmark = Benchmark::new(config);
        benchmark.set_optimum("demo", 4.0);
        benchmark.run_full_benchmark(&ProblemInstance::example()).unwrap();

        assert_eq!(benchmark.results().len(), 3);
        for result in benchmark.results().iter().filter(|r| r.found) {
            let expected = relative_gap(result.time_cost, 4.0);
            assert_eq!(result.gap_to_optimal, Some(expected));
            assert!(expected > 0.0);
        }
    }
}
