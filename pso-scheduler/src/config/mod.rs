/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Run configuration and problem files.
//!
//! # Run configuration
//!
//! Every field is optional; missing values fall back to
//! [`SwarmConfig::default`].
//! ```yaml
//! population: 20
//! max_iterations: 200
//! ensemble_size: 5
//! seed: 1
//! inertia_max: 0.9
//! inertia_min: 0.4
//! c1: 2.0
//! c2: 1.49455
//! v_max: 10.0
//! mct_jitter: 0.25
//! energy_weight: 2.0
//! energy_unit_scale: 10.0
//! seeding: [minimum_completion_time, uniform, capacity_stratified]
//! ```
//!
//! # Problem file
//!
//! VMs and tasks are numbered in file order.  Tasks are either listed or
//! drawn at random from `[min_work, max_work)`:
//! ```yaml
//! virtual_machines:
//!   - rate: 100
//!   - rate: 50
//!     active_energy: 400
//!     idle_energy: 120
//! tasks:
//!   - work: 10
//!   - work: 25
//! # or
//! random_tasks: { count: 100, min_work: 5, max_work: 20 }
//! ```

use std::path::Path;

use anyhow::{bail, Context, Result};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::SwarmError;
use crate::resource::{
    ObjectiveWeights, ResourcePool, VmSpec, DEFAULT_ACTIVE_ENERGY, DEFAULT_ENERGY_UNIT_SCALE,
    DEFAULT_ENERGY_WEIGHT,
};
use crate::scenario::random_workload;
use crate::swarm::seeding::SeedingStrategy;
use crate::task::Workload;

// ── SwarmConfig ───────────────────────────────────────────────────────────────

/// Parameters of one optimisation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SwarmConfig {
    /// Candidates per swarm.
    pub population: usize,
    pub max_iterations: usize,
    /// Independent swarms run by the ensemble.
    pub ensemble_size: usize,
    pub seed: u64,

    /// Upper inertia bound `w1`.
    pub inertia_max: f64,
    /// Lower inertia bound `w2`.
    pub inertia_min: f64,
    /// Cognitive (personal-best) coefficient.
    pub c1: f64,
    /// Social (global-best) coefficient.
    pub c2: f64,
    pub v_max: f64,

    /// Probability that greedy seeding places a task on a random VM.
    pub mct_jitter: f64,
    pub energy_weight: f64,
    pub energy_unit_scale: f64,

    /// Strategies assigned round-robin to candidates.
    pub seeding: Vec<SeedingStrategy>,
}

impl Default for SwarmConfig {
    fn default() -> Self {
        Self {
            population: 20,
            max_iterations: 200,
            ensemble_size: 5,
            seed: 1,
            inertia_max: 0.9,
            inertia_min: 0.4,
            c1: 2.0,
            c2: 1.49455,
            v_max: 10.0,
            mct_jitter: 0.25,
            energy_weight: DEFAULT_ENERGY_WEIGHT,
            energy_unit_scale: DEFAULT_ENERGY_UNIT_SCALE,
            seeding: SeedingStrategy::default_mix(),
        }
    }
}

impl SwarmConfig {
    /// Loads a YAML run configuration and validates it.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, is not valid YAML, names
    /// an unknown field, or fails [`validate`](Self::validate).
    pub fn load_from_file(path: &Path) -> Result<Self> {
        info!("Loading run configuration from: {}", path.display());
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot open configuration file: {}", path.display()))?;
        let config: SwarmConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse YAML file: {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid configuration in {}", path.display()))?;
        debug!(?config, "run configuration loaded");
        Ok(config)
    }

    /// Rejects values the optimiser cannot run with.
    pub fn validate(&self) -> Result<(), SwarmError> {
        let invalid = |msg: String| Err(SwarmError::InvalidConfig(msg));

        if self.population == 0 {
            return invalid("population must be at least 1".into());
        }
        if self.max_iterations == 0 {
            return invalid("max_iterations must be at least 1".into());
        }
        if self.ensemble_size == 0 {
            return invalid("ensemble_size must be at least 1".into());
        }
        if !(self.v_max.is_finite() && self.v_max > 0.0) {
            return invalid(format!("v_max must be positive and finite, got {}", self.v_max));
        }
        if !(0.0..=1.0).contains(&self.mct_jitter) {
            return invalid(format!("mct_jitter must lie in [0, 1], got {}", self.mct_jitter));
        }
        if self.seeding.is_empty() {
            return invalid("seeding must name at least one strategy".into());
        }
        let finite = [
            ("inertia_max", self.inertia_max),
            ("inertia_min", self.inertia_min),
            ("c1", self.c1),
            ("c2", self.c2),
            ("energy_weight", self.energy_weight),
            ("energy_unit_scale", self.energy_unit_scale),
        ];
        for (name, value) in finite {
            if !value.is_finite() {
                return invalid(format!("{name} must be finite, got {value}"));
            }
        }
        if self.inertia_min > self.inertia_max {
            return invalid(format!(
                "inertia_min ({}) exceeds inertia_max ({})",
                self.inertia_min, self.inertia_max
            ));
        }
        Ok(())
    }

    pub fn objective_weights(&self) -> ObjectiveWeights {
        ObjectiveWeights {
            energy_weight: self.energy_weight,
            energy_unit_scale: self.energy_unit_scale,
        }
    }
}

// ── Private problem-file deserialization types ────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProblemFile {
    virtual_machines: Vec<VmEntry>,
    #[serde(default)]
    tasks: Vec<TaskEntry>,
    random_tasks: Option<RandomTasksEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct VmEntry {
    rate: u64,
    #[serde(default = "default_active_energy")]
    active_energy: f64,
    idle_energy: Option<f64>,
}

fn default_active_energy() -> f64 {
    DEFAULT_ACTIVE_ENERGY
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TaskEntry {
    work: u64,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RandomTasksEntry {
    count: usize,
    min_work: u64,
    max_work: u64,
}

// ── Problem loading ───────────────────────────────────────────────────────────

/// Builds a workload and an analytic pool from problem-file YAML.
///
/// `rng` is only drawn from for `random_tasks`.
pub fn parse_problem(content: &str, rng: &mut ChaCha8Rng) -> Result<(Workload, ResourcePool)> {
    let file: ProblemFile = serde_yaml::from_str(content).context("Failed to parse problem YAML")?;

    if file.virtual_machines.is_empty() {
        bail!("problem defines no virtual machines");
    }
    for (id, vm) in file.virtual_machines.iter().enumerate() {
        if vm.rate == 0 {
            bail!("virtual machine {id} has a zero rate");
        }
    }

    let workload = match (file.tasks.is_empty(), file.random_tasks) {
        (false, None) => {
            if let Some(id) = file.tasks.iter().position(|t| t.work == 0) {
                bail!("task {id} has zero work");
            }
            Workload::from_work_sizes(file.tasks.iter().map(|t| t.work))
        }
        (true, Some(r)) => {
            if r.min_work == 0 {
                bail!("random_tasks: min_work must be at least 1");
            }
            if r.min_work > r.max_work {
                bail!(
                    "random_tasks: min_work ({}) exceeds max_work ({})",
                    r.min_work,
                    r.max_work
                );
            }
            random_workload(rng, r.count, r.min_work, r.max_work)
        }
        (false, Some(_)) => bail!("problem sets both 'tasks' and 'random_tasks'"),
        (true, None) => bail!("problem defines no tasks (set 'tasks' or 'random_tasks')"),
    };

    let pool = ResourcePool::analytic(file.virtual_machines.iter().map(|vm| {
        let spec = VmSpec::new(vm.rate).with_active_energy(vm.active_energy);
        match vm.idle_energy {
            Some(idle) => spec.with_idle_energy(idle),
            None => spec,
        }
    }));

    Ok((workload, pool))
}

/// Reads and parses a problem file.
///
/// # Errors
/// Returns an error if the file cannot be read or does not describe a valid
/// problem.
pub fn load_problem(path: &Path, rng: &mut ChaCha8Rng) -> Result<(Workload, ResourcePool)> {
    info!("Loading problem from: {}", path.display());
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Cannot open problem file: {}", path.display()))?;
    let (workload, pool) = parse_problem(&content, rng)
        .with_context(|| format!("Invalid problem file: {}", path.display()))?;
    info!(
        tasks = workload.len(),
        vms = pool.vm_count(),
        total_work = workload.total_work(),
        "problem loaded"
    );
    Ok((workload, pool))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use std::io::Write;
    use tempfile::NamedTempFile;

    /// Helper: write a YAML string to a temp file and return it.
    fn yaml_tempfile(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(1)
    }

    // ── SwarmConfig ───────────────────────────────────────────────────────────

    #[test]
    fn default_config_is_valid() {
        let cfg = SwarmConfig::default();
        cfg.validate().unwrap();
        assert_eq!(cfg.population, 20);
        assert_eq!(cfg.c2, 1.49455);
        assert_eq!(cfg.seeding.len(), 3);
        assert_eq!(cfg.objective_weights(), ObjectiveWeights::default());
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let f = yaml_tempfile("population: 8\nseed: 99\nseeding: [uniform]\n");
        let cfg = SwarmConfig::load_from_file(f.path()).unwrap();
        assert_eq!(cfg.population, 8);
        assert_eq!(cfg.seed, 99);
        assert_eq!(cfg.seeding, vec![SeedingStrategy::Uniform]);
        assert_eq!(cfg.max_iterations, 200);
        assert_eq!(cfg.v_max, 10.0);
    }

    #[test]
    fn unknown_field_is_rejected() {
        let f = yaml_tempfile("populaton: 8\n");
        assert!(SwarmConfig::load_from_file(f.path()).is_err());
    }

    #[test]
    fn invalid_values_are_rejected_on_load() {
        let f = yaml_tempfile("mct_jitter: 1.5\n");
        let err = SwarmConfig::load_from_file(f.path()).unwrap_err();
        assert!(format!("{err:#}").contains("mct_jitter"), "{err:#}");
    }

    #[test]
    fn missing_config_file_returns_error() {
        assert!(SwarmConfig::load_from_file(Path::new("/nonexistent/run.yaml")).is_err());
    }

    #[test]
    fn validate_catches_each_rule() {
        let cases = [
            SwarmConfig { population: 0, ..Default::default() },
            SwarmConfig { max_iterations: 0, ..Default::default() },
            SwarmConfig { ensemble_size: 0, ..Default::default() },
            SwarmConfig { v_max: 0.0, ..Default::default() },
            SwarmConfig { v_max: f64::INFINITY, ..Default::default() },
            SwarmConfig { mct_jitter: -0.1, ..Default::default() },
            SwarmConfig { seeding: vec![], ..Default::default() },
            SwarmConfig { c1: f64::NAN, ..Default::default() },
            SwarmConfig { inertia_min: 0.95, ..Default::default() },
        ];
        for cfg in cases {
            assert!(
                matches!(cfg.validate(), Err(SwarmError::InvalidConfig(_))),
                "{cfg:?}"
            );
        }
    }

    // ── Problem files ─────────────────────────────────────────────────────────

    #[test]
    fn explicit_problem_is_loaded_in_file_order() {
        let yaml = r#"
virtual_machines:
  - rate: 100
  - rate: 50
    active_energy: 400
    idle_energy: 120
tasks:
  - work: 10
  - work: 25
"#;
        let f = yaml_tempfile(yaml);
        let (wl, pool) = load_problem(f.path(), &mut rng()).unwrap();

        assert_eq!(wl.len(), 2);
        assert_eq!(wl.task(1).unwrap().work, 25);
        assert_eq!(pool.vm_count(), 2);

        let vm0 = pool.vm(0).unwrap();
        assert_eq!(vm0.rate, 100);
        assert_eq!(vm0.active_energy, DEFAULT_ACTIVE_ENERGY);
        assert_eq!(vm0.idle_energy, DEFAULT_ACTIVE_ENERGY * 0.6);

        let vm1 = pool.vm(1).unwrap();
        assert_eq!((vm1.rate, vm1.active_energy, vm1.idle_energy), (50, 400.0, 120.0));
    }

    #[test]
    fn random_tasks_respect_range() {
        let yaml = r#"
virtual_machines: [{ rate: 80 }]
random_tasks: { count: 50, min_work: 5, max_work: 20 }
"#;
        let (wl, _) = parse_problem(yaml, &mut rng()).unwrap();
        assert_eq!(wl.len(), 50);
        assert!(wl.tasks().iter().all(|t| (5..20).contains(&t.work)));
    }

    #[test]
    fn random_tasks_are_seeded() {
        let yaml = "virtual_machines: [{ rate: 80 }]\nrandom_tasks: { count: 20, min_work: 1, max_work: 1000 }\n";
        let (a, _) = parse_problem(yaml, &mut rng()).unwrap();
        let (b, _) = parse_problem(yaml, &mut rng()).unwrap();
        let works = |wl: &Workload| wl.tasks().iter().map(|t| t.work).collect::<Vec<_>>();
        assert_eq!(works(&a), works(&b));
    }

    #[test]
    fn problem_without_tasks_is_rejected() {
        assert!(parse_problem("virtual_machines: [{ rate: 80 }]\n", &mut rng()).is_err());
    }

    #[test]
    fn problem_with_both_task_forms_is_rejected() {
        let yaml = r#"
virtual_machines: [{ rate: 80 }]
tasks: [{ work: 3 }]
random_tasks: { count: 2, min_work: 1, max_work: 2 }
"#;
        assert!(parse_problem(yaml, &mut rng()).is_err());
    }

    #[test]
    fn problem_without_vms_is_rejected() {
        let yaml = "virtual_machines: []\ntasks: [{ work: 3 }]\n";
        assert!(parse_problem(yaml, &mut rng()).is_err());
    }

    #[test]
    fn zero_rate_vm_is_rejected() {
        let yaml = "virtual_machines: [{ rate: 0 }]\ntasks: [{ work: 3 }]\n";
        let err = parse_problem(yaml, &mut rng()).unwrap_err();
        assert!(err.to_string().contains("zero rate"), "{err}");
    }

    #[test]
    fn zero_work_task_is_rejected() {
        let yaml = "virtual_machines: [{ rate: 100 }]\ntasks: [{ work: 4 }, { work: 0 }]\n";
        let err = parse_problem(yaml, &mut rng()).unwrap_err();
        assert!(err.to_string().contains("task 1 has zero work"), "{err}");
    }

    #[test]
    fn zero_min_work_is_rejected() {
        let yaml = "virtual_machines: [{ rate: 1 }]\nrandom_tasks: { count: 2, min_work: 0, max_work: 3 }\n";
        let err = parse_problem(yaml, &mut rng()).unwrap_err();
        assert!(err.to_string().contains("min_work"), "{err}");
    }

    #[test]
    fn inverted_work_range_is_rejected() {
        let yaml = "virtual_machines: [{ rate: 1 }]\nrandom_tasks: { count: 2, min_work: 9, max_work: 3 }\n";
        assert!(parse_problem(yaml, &mut rng()).is_err());
    }

    #[test]
    fn missing_problem_file_returns_error() {
        assert!(load_problem(Path::new("/nonexistent/problem.yaml"), &mut rng()).is_err());
    }
}
