//! RCSPP Solver - Command Line Interface
//!
//! Fuel-constrained shortest paths with exact backtracking and Ant Colony Optimization.

use clap::{Parser, Subcommand, ValueEnum};
use rcspp_solver::benchmark::{load_instances_from_dir, Benchmark, BenchmarkConfig};
use rcspp_solver::exact::BacktrackingSolver;
use rcspp_solver::heuristics::aco::{AcoConfig, AntColonyOptimization};
use rcspp_solver::instance::ProblemInstance;
use rcspp_solver::solution::PathSolution;
use rcspp_solver::solver::Solver;

use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "rcspp-solver")]
#[command(author = "M2 AI2D Student")]
#[command(version = "1.0")]
#[command(about = "Fuel-constrained shortest path solver (exact backtracking and ACO)")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// ACO parameters shared by several subcommands
#[derive(clap::Args, Debug, Clone)]
struct AcoArgs {
    /// Ants per iteration
    #[arg(long, default_value = "20")]
    ants: usize,

    /// Number of iterations
    #[arg(long, default_value = "100")]
    iterations: usize,

    /// Pheromone exponent
    #[arg(long, default_value = "1.0")]
    alpha: f64,

    /// Heuristic (1 / time) exponent
    #[arg(long, default_value = "2.0")]
    beta: f64,

    /// Fraction of trail lost per iteration
    #[arg(long, default_value = "0.5")]
    evaporation_rate: f64,

    /// Pheromone deposit numerator
    #[arg(long, default_value = "100.0")]
    deposit_scale: f64,

    /// Time limit in seconds for one ACO run
    #[arg(short, long)]
    time_limit: Option<f64>,

    /// Build ants in parallel
    #[arg(long)]
    parallel: bool,
}

impl AcoArgs {
    fn to_config(&self, seed: u64) -> AcoConfig {
        AcoConfig {
            ant_count: self.ants,
            iteration_count: self.iterations,
            alpha: self.alpha,
            beta: self.beta,
            evaporation_rate: self.evaporation_rate,
            deposit_scale: self.deposit_scale,
            seed,
            parallel: self.parallel,
            time_limit: self.time_limit,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Solve an instance
    Solve {
        /// Path to the JSON instance file
        #[arg(short, long)]
        instance: PathBuf,

        /// Algorithm to use
        #[arg(short, long, value_enum, default_value = "both")]
        algorithm: Algorithm,

        #[command(flatten)]
        aco: AcoArgs,

        /// Random seed
        #[arg(short, long, default_value = "42")]
        seed: u64,

        /// Output solutions to a JSON file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Compare exact search and ACO on an instance
    Compare {
        /// Path to the JSON instance file
        #[arg(short, long)]
        instance: PathBuf,

        /// Number of ACO runs (seeds 0..runs)
        #[arg(short, long, default_value = "10")]
        runs: usize,

        #[command(flatten)]
        aco: AcoArgs,

        /// Output CSV file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run benchmarks on a directory of instances
    Benchmark {
        /// Directory containing JSON instance files
        #[arg(short, long)]
        dir: PathBuf,

        /// Output directory for results
        #[arg(short, long, default_value = "results")]
        output: PathBuf,

        /// Number of ACO runs per instance
        #[arg(short, long, default_value = "5")]
        runs: usize,

        #[command(flatten)]
        aco: AcoArgs,

        /// Skip the exact solver
        #[arg(long)]
        no_exact: bool,

        /// Maximum number of nodes
        #[arg(long)]
        max_size: Option<usize>,
    },

    /// Analyze an instance
    Analyze {
        /// Path to the JSON instance file
        #[arg(short, long)]
        instance: PathBuf,
    },

    /// Run both solvers on the built-in demo graph
    Demo {
        /// Random seed
        #[arg(short, long, default_value = "42")]
        seed: u64,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
enum Algorithm {
    /// Exact backtracking
    Exact,
    /// Ant Colony Optimization
    Aco,
    /// Both, for comparison
    Both,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Solve { instance, algorithm, aco, seed, output, verbose } => {
            let instance = load_instance(&instance);
            solve_instance(&instance, algorithm, aco.to_config(seed), output, verbose);
        }

        Commands::Compare { instance, runs, aco, output } => {
            let instance = load_instance(&instance);
            compare_algorithms(&instance, runs, aco.to_config(0), output);
        }

        Commands::Benchmark { dir, output, runs, aco, no_exact, max_size } => {
            run_benchmark(&dir, &output, runs, aco.to_config(0), !no_exact, max_size);
        }

        Commands::Analyze { instance } => {
            let instance = load_instance(&instance);
            println!("========== Instance Analysis ==========\n");
            println!("{}", instance.statistics());
        }

        Commands::Demo { seed } => {
            let config = AcoConfig {
                ant_count: 10,
                iteration_count: 50,
                seed,
                ..Default::default()
            };
            solve_instance(&ProblemInstance::example(), Algorithm::Both, config, None, true);
        }
    }
}

fn load_instance(path: &Path) -> ProblemInstance {
    println!("Loading instance from {:?}...", path);

    match ProblemInstance::from_file(path) {
        Ok(instance) => instance,
        Err(e) => {
            eprintln!("Error loading instance: {}", e);
            std::process::exit(1);
        }
    }
}

fn build_aco(config: AcoConfig) -> AntColonyOptimization {
    match AntColonyOptimization::new(config) {
        Ok(aco) => aco,
        Err(e) => {
            eprintln!("Invalid ACO parameters: {}", e);
            std::process::exit(1);
        }
    }
}

fn solve_instance(
    instance: &ProblemInstance,
    algorithm: Algorithm,
    config: AcoConfig,
    output: Option<PathBuf>,
    verbose: bool,
) {
    if verbose {
        println!("{}", instance.statistics());
    }

    let mut solvers: Vec<Box<dyn Solver>> = Vec::new();
    if matches!(algorithm, Algorithm::Aco | Algorithm::Both) {
        solvers.push(Box::new(build_aco(config)));
    }
    if matches!(algorithm, Algorithm::Exact | Algorithm::Both) {
        solvers.push(Box::new(BacktrackingSolver::new()));
    }

    let mut solutions: Vec<PathSolution> = Vec::new();
    for solver in &solvers {
        println!("Solving with {}...", solver.name());
        let solution = solver.solve(instance);

        println!("\n========== Results ==========");
        println!("{}", solution);
        if verbose {
            println!("Feasible: {}", solution.is_feasible(instance));
        }
        solutions.push(solution);
    }

    if let [heuristic, exact] = solutions.as_slice() {
        if exact.has_path() && heuristic.has_path() {
            println!(
                "\nACO gap to optimum: {:.2}",
                heuristic.time_cost - exact.time_cost
            );
        }
    }

    if let Some(out_path) = output {
        let json = match serde_json::to_string_pretty(&solutions) {
            Ok(json) => json,
            Err(e) => {
                eprintln!("Failed to serialize solutions: {}", e);
                std::process::exit(1);
            }
        };
        if let Err(e) = std::fs::write(&out_path, json) {
            eprintln!("Failed to write output: {}", e);
            std::process::exit(1);
        }
        println!("\nSolutions saved to {:?}", out_path);
    }
}

fn compare_algorithms(instance: &ProblemInstance, runs: usize, aco: AcoConfig, output: Option<PathBuf>) {
    println!(
        "Comparing algorithms on {} ({} nodes, {} edges)...\n",
        instance.name(),
        instance.num_nodes(),
        instance.num_edges()
    );

    let config = BenchmarkConfig {
        num_runs: runs,
        aco,
        run_exact: true,
        show_progress: true,
    };
    let mut benchmark = Benchmark::new(config);

    if let Err(e) = benchmark.run_full_benchmark(instance) {
        eprintln!("Invalid ACO parameters: {}", e);
        std::process::exit(1);
    }

    println!("{}", benchmark.generate_report());

    if let Some(out_path) = output {
        if let Err(e) = benchmark.export_to_csv(&out_path) {
            eprintln!("Failed to write CSV: {}", e);
            std::process::exit(1);
        }
        println!("\nResults exported to {:?}", out_path);
    }
}

fn run_benchmark(
    dir: &Path,
    output: &Path,
    runs: usize,
    aco: AcoConfig,
    exact: bool,
    max_size: Option<usize>,
) {
    println!("Loading instances from {:?}...", dir);

    let mut instances = load_instances_from_dir(dir);

    if let Some(max) = max_size {
        instances.retain(|i| i.num_nodes() <= max);
    }

    println!("Found {} instances", instances.len());

    if instances.is_empty() {
        eprintln!("No instances found!");
        return;
    }

    if let Err(e) = std::fs::create_dir_all(output) {
        eprintln!("Failed to create output directory: {}", e);
        std::process::exit(1);
    }

    let config = BenchmarkConfig {
        num_runs: runs,
        aco,
        run_exact: exact,
        show_progress: true,
    };

    let mut benchmark = Benchmark::new(config);

    for (i, instance) in instances.iter().enumerate() {
        println!(
            "\n[{}/{}] Processing {} (n={})...",
            i + 1,
            instances.len(),
            instance.name(),
            instance.num_nodes()
        );

        if let Err(e) = benchmark.run_full_benchmark(instance) {
            eprintln!("Invalid ACO parameters: {}", e);
            std::process::exit(1);
        }
    }

    let results_path = output.join("results.csv");
    match benchmark.export_to_csv(&results_path) {
        Ok(()) => println!("\nResults exported to {:?}", results_path),
        Err(e) => eprintln!("Failed to export results: {}", e),
    }

    let stats_path = output.join("statistics.csv");
    match benchmark.export_statistics_csv(&stats_path) {
        Ok(()) => println!("Statistics exported to {:?}", stats_path),
        Err(e) => eprintln!("Failed to export statistics: {}", e),
    }

    let report = benchmark.generate_report();
    println!("\n{}", report);

    let report_path = output.join("report.txt");
    match std::fs::write(&report_path, &report) {
        Ok(()) => println!("Report saved to {:?}", report_path),
        Err(e) => eprintln!("Failed to save report: {}", e),
    }
}
