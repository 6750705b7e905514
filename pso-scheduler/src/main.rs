/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use anyhow::Result;
use clap::{ArgGroup, Parser};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, error, info, warn};

use pso_scheduler::config::{load_problem, SwarmConfig};
use pso_scheduler::ensemble::Ensemble;
use pso_scheduler::history;
use pso_scheduler::resource::cost::{CostMatrix, MatrixLayout};
use pso_scheduler::resource::ResourcePool;
use pso_scheduler::scenario::ScenarioRegistry;
use pso_scheduler::task::Workload;

/// Scenario used when no problem source is given.
const DEFAULT_SCENARIO: &str = "mixed-batch";

/// ChaCha stream reserved for problem generation; swarms use streams `0..N`.
const PROBLEM_STREAM: u64 = u64::MAX;

// ── CLI argument definition ───────────────────────────────────────────────────

/// Energy-aware task-to-VM scheduler (discrete particle swarm optimisation).
///
/// Example:
///   pso-scheduler --scenario paper --swarms 5 --iterations 300 \
///                 --history paper.tsv
#[derive(Debug, Parser)]
#[command(
    name = "pso-scheduler",
    about = "Discrete PSO task-to-VM scheduler",
    long_about = None,
    group(ArgGroup::new("source").args(["scenario", "problem", "cost_matrix"])),
)]
struct Cli {
    /// Named scenario to optimise (see --list-scenarios).
    #[arg(short = 's', long)]
    scenario: Option<String>,

    /// YAML problem file (virtual_machines + tasks / random_tasks).
    #[arg(short = 'p', long)]
    problem: Option<PathBuf>,

    /// Pre-computed execution-time matrix (tasks × VMs).
    #[arg(short = 'm', long = "cost-matrix")]
    cost_matrix: Option<PathBuf>,

    /// Cost-matrix layout: `rows` or `braun:<tasks>x<vms>`.
    #[arg(long, default_value = "rows")]
    layout: MatrixLayout,

    /// YAML run configuration; command-line values take precedence.
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Random seed.
    #[arg(long)]
    seed: Option<u64>,

    /// Number of independent swarms.
    #[arg(short = 'n', long)]
    swarms: Option<usize>,

    /// Iterations per swarm.
    #[arg(short = 'i', long)]
    iterations: Option<usize>,

    /// Candidates per swarm.
    #[arg(long)]
    population: Option<usize>,

    /// Write the winning swarm's fitness histories to this TSV file.
    #[arg(long)]
    history: Option<PathBuf>,

    /// List the built-in scenarios and exit.
    #[arg(long, default_value_t = false)]
    list_scenarios: bool,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    // Level is controlled by the RUST_LOG env-var (e.g. RUST_LOG=debug).
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        error!("Scheduling run failed: {:#}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let registry = ScenarioRegistry::with_defaults();

    if cli.list_scenarios {
        for (name, description) in registry.descriptions() {
            println!("{name:<14} {description}");
        }
        return Ok(());
    }

    // ── Configuration ─────────────────────────────────────────────────────────
    let mut config = match &cli.config {
        Some(path) => SwarmConfig::load_from_file(path)?,
        None => SwarmConfig::default(),
    };
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }
    if let Some(swarms) = cli.swarms {
        config.ensemble_size = swarms;
    }
    if let Some(iterations) = cli.iterations {
        config.max_iterations = iterations;
    }
    if let Some(population) = cli.population {
        config.population = population;
    }
    config.validate()?;

    info!(
        seed         = config.seed,
        swarms       = config.ensemble_size,
        population   = config.population,
        iterations   = config.max_iterations,
        seeding      = ?config.seeding,
        "Configuration"
    );

    // ── Problem ───────────────────────────────────────────────────────────────
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    rng.set_stream(PROBLEM_STREAM);

    let (workload, pool) = if let Some(path) = &cli.problem {
        load_problem(path, &mut rng)?
    } else if let Some(path) = &cli.cost_matrix {
        let matrix = CostMatrix::load_from_file(path, cli.layout)?;
        let workload = Workload::null(matrix.task_count());
        (workload, ResourcePool::from_cost_matrix(matrix))
    } else {
        let name = match &cli.scenario {
            Some(name) => name.as_str(),
            None => {
                warn!("No problem source given, using scenario '{DEFAULT_SCENARIO}'");
                DEFAULT_SCENARIO
            }
        };
        info!("Building scenario: {name}");
        registry.build(name, &mut rng)?
    };
    info!(
        tasks = workload.len(),
        vms = pool.vm_count(),
        total_work = workload.total_work(),
        "Problem ready"
    );

    // ── Optimise ──────────────────────────────────────────────────────────────
    let workload = Arc::new(workload);
    let outcome = Ensemble::new(config.clone())?.run(Arc::clone(&workload), &pool)?;

    for swarm in &outcome.swarms {
        info!("  [swarm {}]  fitness={}", swarm.swarm, swarm.fitness);
    }

    let best = outcome.best();
    let mut scratch = pool.clone();
    scratch.load_position(&workload, &best.position)?;
    let eval = scratch.evaluate(&config.objective_weights())?;
    info!(
        winner     = outcome.winner,
        makespan   = eval.makespan,
        throughput = eval.throughput,
        energy_kw  = eval.energy_kw,
        fitness    = eval.fitness,
        "Best schedule"
    );
    debug!(mapping = ?best.mapping, "task → VM mapping");

    if let Some(path) = &cli.history {
        history::write_tsv(path, &best.histories)?;
    }

    println!("task\tvm");
    for (task, vm) in best.mapping.iter().enumerate() {
        println!("{task}\t{vm}");
    }
    Ok(())
}
