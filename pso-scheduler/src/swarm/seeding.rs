/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Initial position / velocity heuristics.
//!
//! | Strategy | Position | Velocity |
//! |---|---|---|
//! | `Uniform` | argmax of the velocity | `U[0,1)` |
//! | `MinimumCompletionTime` | greedy earliest-finish, largest task first, with random jitter | `U[0,1)` |
//! | `CapacityStratified` | small tasks → random slow VM, large tasks → random fast VM | `U[0,1)` |
//!
//! A strategy only builds the matrices.  The candidate scores the result
//! with a full reset + assign pass immediately afterwards, so every strategy
//! ends with a scored personal best.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use crate::config::SwarmConfig;
use crate::error::ScoringError;
use crate::matrix::AssignmentMatrix;
use crate::resource::ResourcePool;
use crate::task::Workload;

/// The initial state handed to a new candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct Seed {
    pub position: AssignmentMatrix,
    pub velocity: AssignmentMatrix,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedingStrategy {
    /// Random velocity, position derived by discretisation.
    Uniform,

    /// Greedy earliest-completion placement, tasks in descending work order.
    /// With probability `mct_jitter` a task goes to a uniformly random VM
    /// instead.
    MinimumCompletionTime,

    /// VMs split at the median rate, tasks at the median work size; each
    /// task goes to a random VM of its half.
    ///
    /// With a single VM the slow half is empty and falls back to the whole
    /// pool.
    CapacityStratified,
}

impl SeedingStrategy {
    /// The round-robin mix used when the configuration does not name one.
    pub fn default_mix() -> Vec<SeedingStrategy> {
        vec![
            SeedingStrategy::MinimumCompletionTime,
            SeedingStrategy::Uniform,
            SeedingStrategy::CapacityStratified,
        ]
    }

    /// Builds an initial position and velocity.
    ///
    /// `pool` is used as scratch state by the greedy strategy; its ready
    /// times are left in an unspecified state and must be `reset()` before
    /// scoring.
    pub fn seed<R: Rng>(
        &self,
        workload: &Workload,
        pool: &mut ResourcePool,
        rng: &mut R,
        config: &SwarmConfig,
    ) -> Result<Seed, ScoringError> {
        let (rows, cols) = (workload.len(), pool.vm_count());
        if cols == 0 {
            return Err(ScoringError::VmOutOfRange { vm: 0, count: 0 });
        }

        let seed = match self {
            SeedingStrategy::Uniform => {
                let velocity = AssignmentMatrix::from_fn(rows, cols, || rng.random::<f64>());
                let position = AssignmentMatrix::discretize(&velocity);
                Seed { position, velocity }
            }
            SeedingStrategy::MinimumCompletionTime => {
                let mapping = greedy_mapping(workload, pool, rng, config.mct_jitter)?;
                let position = AssignmentMatrix::one_hot(&mapping, cols)?;
                let velocity = AssignmentMatrix::from_fn(rows, cols, || rng.random::<f64>());
                Seed { position, velocity }
            }
            SeedingStrategy::CapacityStratified => {
                let mapping = stratified_mapping(workload, pool, rng);
                let position = AssignmentMatrix::one_hot(&mapping, cols)?;
                let velocity = AssignmentMatrix::from_fn(rows, cols, || rng.random::<f64>());
                Seed { position, velocity }
            }
        };

        trace!(strategy = %self, tasks = rows, vms = cols, "seeded candidate");
        Ok(seed)
    }
}

// ── Strategy internals ────────────────────────────────────────────────────────

fn greedy_mapping<R: Rng>(
    workload: &Workload,
    pool: &mut ResourcePool,
    rng: &mut R,
    jitter: f64,
) -> Result<Vec<usize>, ScoringError> {
    let vm_count = pool.vm_count();
    let mut mapping = vec![0; workload.len()];

    pool.reset();
    for task in workload.sorted_by_work(true) {
        let vm = if rng.random::<f64>() < jitter {
            rng.random_range(0..vm_count)
        } else {
            pool.min_completion_vm(task)?
        };
        pool.assign(task, vm)?;
        mapping[task.id] = vm;
    }
    Ok(mapping)
}

fn stratified_mapping<R: Rng>(
    workload: &Workload,
    pool: &ResourcePool,
    rng: &mut R,
) -> Vec<usize> {
    let vms = pool.vms_by_rate();
    let (mut slow, fast) = vms.split_at(vms.len() / 2);
    if slow.is_empty() {
        warn!(
            vms = vms.len(),
            "capacity stratification has an empty low-capacity half, using the whole pool"
        );
        slow = vms.as_slice();
    }

    let tasks = workload.sorted_by_work(false);
    let split = tasks.len() / 2;
    let mut mapping = vec![0; workload.len()];
    for (rank, task) in tasks.into_iter().enumerate() {
        let half = if rank < split { slow } else { fast };
        mapping[task.id] = half[rng.random_range(0..half.len())];
    }
    mapping
}

impl fmt::Display for SeedingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SeedingStrategy::Uniform => "uniform",
            SeedingStrategy::MinimumCompletionTime => "minimum_completion_time",
            SeedingStrategy::CapacityStratified => "capacity_stratified",
        };
        f.write_str(name)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::VmSpec;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn pool(rates: &[u64]) -> ResourcePool {
        ResourcePool::analytic(rates.iter().map(|&r| VmSpec::new(r)))
    }

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(7)
    }

    fn no_jitter() -> SwarmConfig {
        SwarmConfig {
            mct_jitter: 0.0,
            ..SwarmConfig::default()
        }
    }

    // ── Uniform ───────────────────────────────────────────────────────────────

    #[test]
    fn uniform_position_is_argmax_of_velocity() {
        let wl = Workload::from_work_sizes([10, 20, 30, 40]);
        let mut p = pool(&[50, 60, 70]);
        let seed = SeedingStrategy::Uniform
            .seed(&wl, &mut p, &mut rng(), &SwarmConfig::default())
            .unwrap();
        assert!(seed.position.is_one_hot());
        assert_eq!(seed.position, AssignmentMatrix::discretize(&seed.velocity));
        assert!(seed.velocity.iter().all(|&v| (0.0..1.0).contains(&v)));
    }

    // ── MinimumCompletionTime ─────────────────────────────────────────────────

    #[test]
    fn greedy_without_jitter_balances_by_completion_time() {
        // Largest first: 100 → VM1 (fast, 1.0 s); 50 → VM0 (1.0 s vs 1.5 s);
        // 10 → VM1 (1.1 s vs 1.2 s).
        let wl = Workload::from_work_sizes([10, 100, 50]);
        let mut p = pool(&[50, 100]);
        let seed = SeedingStrategy::MinimumCompletionTime
            .seed(&wl, &mut p, &mut rng(), &no_jitter())
            .unwrap();
        assert_eq!(seed.position.assignments().unwrap(), vec![1, 1, 0]);
    }

    #[test]
    fn greedy_picks_fast_vm_for_single_task() {
        let wl = Workload::from_work_sizes([10]);
        let mut p = pool(&[50, 100]);
        let seed = SeedingStrategy::MinimumCompletionTime
            .seed(&wl, &mut p, &mut rng(), &no_jitter())
            .unwrap();
        assert_eq!(seed.position.assignments().unwrap(), vec![1]);
    }

    #[test]
    fn full_jitter_still_yields_one_hot_rows() {
        let wl = Workload::from_work_sizes([5; 40]);
        let mut p = pool(&[20, 40, 60, 80]);
        let cfg = SwarmConfig {
            mct_jitter: 1.0,
            ..SwarmConfig::default()
        };
        let seed = SeedingStrategy::MinimumCompletionTime
            .seed(&wl, &mut p, &mut rng(), &cfg)
            .unwrap();
        assert!(seed.position.is_one_hot());
    }

    // ── CapacityStratified ────────────────────────────────────────────────────

    #[test]
    fn stratified_sends_small_tasks_to_slow_vms() {
        // VMs 0,2 slow; 1,3 fast.  Tasks 1,3 small; 0,2 large.
        let wl = Workload::from_work_sizes([90, 5, 80, 10]);
        let mut p = pool(&[10, 100, 20, 200]);
        let seed = SeedingStrategy::CapacityStratified
            .seed(&wl, &mut p, &mut rng(), &SwarmConfig::default())
            .unwrap();
        let mapping = seed.position.assignments().unwrap();
        for small in [1, 3] {
            assert!([0, 2].contains(&mapping[small]), "{mapping:?}");
        }
        for large in [0, 2] {
            assert!([1, 3].contains(&mapping[large]), "{mapping:?}");
        }
    }

    #[test]
    fn stratified_single_vm_falls_back_to_whole_pool() {
        let wl = Workload::from_work_sizes([1, 2, 3]);
        let mut p = pool(&[100]);
        let seed = SeedingStrategy::CapacityStratified
            .seed(&wl, &mut p, &mut rng(), &SwarmConfig::default())
            .unwrap();
        assert_eq!(seed.position.assignments().unwrap(), vec![0, 0, 0]);
    }

    #[test]
    fn stratified_single_task_goes_to_fast_half() {
        let wl = Workload::from_work_sizes([10]);
        let mut p = pool(&[50, 100]);
        let seed = SeedingStrategy::CapacityStratified
            .seed(&wl, &mut p, &mut rng(), &SwarmConfig::default())
            .unwrap();
        assert_eq!(seed.position.assignments().unwrap(), vec![1]);
    }

    // ── Common ────────────────────────────────────────────────────────────────

    #[test]
    fn empty_pool_is_rejected() {
        let wl = Workload::from_work_sizes([10]);
        let mut p = pool(&[]);
        for strategy in SeedingStrategy::default_mix() {
            assert!(strategy
                .seed(&wl, &mut p, &mut rng(), &SwarmConfig::default())
                .is_err());
        }
    }

    #[test]
    fn same_rng_state_gives_same_seed() {
        let wl = Workload::from_work_sizes([3, 9, 4, 7, 1]);
        for strategy in SeedingStrategy::default_mix() {
            let a = strategy
                .seed(&wl, &mut pool(&[30, 60, 90]), &mut rng(), &SwarmConfig::default())
                .unwrap();
            let b = strategy
                .seed(&wl, &mut pool(&[30, 60, 90]), &mut rng(), &SwarmConfig::default())
                .unwrap();
            assert_eq!(a, b, "{strategy}");
        }
    }

    #[test]
    fn strategy_names_round_trip_through_yaml() {
        let parsed: Vec<SeedingStrategy> =
            serde_yaml::from_str("[uniform, minimum_completion_time, capacity_stratified]").unwrap();
        assert_eq!(
            parsed,
            vec![
                SeedingStrategy::Uniform,
                SeedingStrategy::MinimumCompletionTime,
                SeedingStrategy::CapacityStratified,
            ]
        );
        assert_eq!(SeedingStrategy::CapacityStratified.to_string(), "capacity_stratified");
    }
}
