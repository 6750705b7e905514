/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Ensemble of independent swarms.
//!
//! Each swarm runs on its own scoped OS thread with its own candidates,
//! resource-pool clones and ChaCha stream (`stream_rng(seed, i)`).  Nothing
//! mutable is shared; the threads are joined and the best final global best
//! wins, ties going to the lowest swarm index.
//!
//! At most `available_parallelism()` swarms run at once; larger ensembles
//! run in consecutive batches.  Streams are per swarm, so batching does not
//! change any result.
//!
//! Swarm 0 uses the same stream as a stand-alone [`SwarmOptimizer`] with the
//! same seed, so an ensemble never does worse than that single swarm.

use std::num::NonZeroUsize;
use std::ops::Range;
use std::sync::Arc;
use std::thread;

use tracing::{debug, info};

use crate::config::SwarmConfig;
use crate::error::SwarmError;
use crate::resource::ResourcePool;
use crate::swarm::{stream_rng, SwarmOptimizer, SwarmOutcome};
use crate::task::Workload;

/// Outcome of every swarm plus the index of the winner.
#[derive(Debug, Clone)]
pub struct EnsembleOutcome {
    pub winner: usize,
    pub swarms: Vec<SwarmOutcome>,
}

impl EnsembleOutcome {
    pub fn best(&self) -> &SwarmOutcome {
        &self.swarms[self.winner]
    }

    pub fn fitness(&self) -> f64 {
        self.best().fitness
    }

    pub fn mapping(&self) -> &[usize] {
        &self.best().mapping
    }

    /// Final fitness of each swarm, in swarm order.
    pub fn fitness_by_swarm(&self) -> Vec<f64> {
        self.swarms.iter().map(|s| s.fitness).collect()
    }
}

#[derive(Debug, Clone)]
pub struct Ensemble {
    config: SwarmConfig,
}

impl Ensemble {
    /// # Errors
    /// [`SwarmError::InvalidConfig`] if `config` fails validation.
    pub fn new(config: SwarmConfig) -> Result<Self, SwarmError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn size(&self) -> usize {
        self.config.ensemble_size
    }

    /// Runs `ensemble_size` swarms in parallel and picks the winner.
    ///
    /// If several swarms fail, the error of the lowest-indexed one is
    /// returned.  A panicking swarm thread is resumed on the caller.
    pub fn run(
        &self,
        workload: Arc<Workload>,
        pool: &ResourcePool,
    ) -> Result<EnsembleOutcome, SwarmError> {
        let config = &self.config;
        let workers = thread::available_parallelism().map_or(1, NonZeroUsize::get);
        info!(
            swarms = config.ensemble_size,
            workers,
            seed = config.seed,
            population = config.population,
            iterations = config.max_iterations,
            "starting ensemble"
        );

        let mut results: Vec<Result<SwarmOutcome, SwarmError>> =
            Vec::with_capacity(config.ensemble_size);
        for batch in batches(config.ensemble_size, workers) {
            debug!(first = batch.start, last = batch.end - 1, "running swarm batch");
            thread::scope(|scope| {
                let handles: Vec<_> = batch
                    .map(|i| {
                        let workload = Arc::clone(&workload);
                        scope.spawn(move || {
                            let rng = stream_rng(config.seed, i);
                            SwarmOptimizer::new(i, workload, pool, config, rng)?.run()
                        })
                    })
                    .collect();

                results.extend(handles.into_iter().map(|h| {
                    h.join()
                        .unwrap_or_else(|payload| std::panic::resume_unwind(payload))
                }));
            });
        }

        let swarms = results.into_iter().collect::<Result<Vec<_>, _>>()?;

        let mut winner = 0;
        for (i, swarm) in swarms.iter().enumerate().skip(1) {
            if swarm.fitness > swarms[winner].fitness {
                winner = i;
            }
        }

        info!(
            winner,
            fitness = swarms[winner].fitness,
            "ensemble finished"
        );
        Ok(EnsembleOutcome { winner, swarms })
    }
}

/// Consecutive index ranges of at most `width` covering `0..total`.
fn batches(total: usize, width: usize) -> Vec<Range<usize>> {
    let width = width.max(1);
    (0..total)
        .step_by(width)
        .map(|start| start..(start + width).min(total))
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::VmSpec;

    fn problem() -> (Arc<Workload>, ResourcePool) {
        let wl = Workload::from_work_sizes([14, 6, 19, 8, 11, 5, 17, 9, 12, 7, 16, 10]);
        let pool = ResourcePool::analytic([25, 40, 60, 85, 30, 95].map(VmSpec::new));
        (Arc::new(wl), pool)
    }

    fn config(seed: u64, ensemble_size: usize) -> SwarmConfig {
        SwarmConfig {
            population: 8,
            max_iterations: 25,
            ensemble_size,
            seed,
            ..SwarmConfig::default()
        }
    }

    #[test]
    fn ensemble_never_loses_to_a_single_swarm() {
        let (wl, pool) = problem();
        for seed in 1..=4 {
            let cfg = config(seed, 5);
            let single = SwarmOptimizer::new(0, Arc::clone(&wl), &pool, &cfg, stream_rng(seed, 0))
                .unwrap()
                .run()
                .unwrap();
            let ensemble = Ensemble::new(cfg).unwrap().run(Arc::clone(&wl), &pool).unwrap();

            assert!(
                ensemble.fitness() >= single.fitness,
                "seed {seed}: ensemble {} < single {}",
                ensemble.fitness(),
                single.fitness
            );
            // Swarm 0 replays the stand-alone run exactly.
            assert_eq!(ensemble.swarms[0].fitness.to_bits(), single.fitness.to_bits());
            assert_eq!(ensemble.swarms[0].mapping, single.mapping);
        }
    }

    #[test]
    fn winner_has_highest_fitness() {
        let (wl, pool) = problem();
        let outcome = Ensemble::new(config(3, 4)).unwrap().run(wl, &pool).unwrap();
        assert_eq!(outcome.swarms.len(), 4);
        let best = outcome
            .fitness_by_swarm()
            .into_iter()
            .fold(f64::NEG_INFINITY, f64::max);
        assert_eq!(outcome.fitness(), best);
        assert!(outcome.swarms[..outcome.winner]
            .iter()
            .all(|s| s.fitness < outcome.fitness()));
    }

    #[test]
    fn swarms_report_their_index() {
        let (wl, pool) = problem();
        let outcome = Ensemble::new(config(9, 3)).unwrap().run(wl, &pool).unwrap();
        let indices: Vec<usize> = outcome.swarms.iter().map(|s| s.swarm).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn ensemble_runs_are_reproducible() {
        let (wl, pool) = problem();
        let a = Ensemble::new(config(77, 3)).unwrap().run(Arc::clone(&wl), &pool).unwrap();
        let b = Ensemble::new(config(77, 3)).unwrap().run(wl, &pool).unwrap();
        assert_eq!(a.winner, b.winner);
        assert_eq!(a.mapping(), b.mapping());
        assert_eq!(a.fitness_by_swarm(), b.fitness_by_swarm());
    }

    #[test]
    fn single_vm_ensemble_finds_trivial_mapping() {
        let wl = Arc::new(Workload::from_work_sizes([10]));
        let pool = ResourcePool::analytic([VmSpec::new(100)]);
        let outcome = Ensemble::new(config(1, 2)).unwrap().run(wl, &pool).unwrap();
        assert_eq!(outcome.mapping(), &[0]);
        assert_eq!(outcome.winner, 0);
    }

    #[test]
    fn swarm_failure_surfaces_as_error() {
        let wl = Arc::new(Workload::from_work_sizes([10]));
        let pool = ResourcePool::analytic([VmSpec::new(0)]);
        let result = Ensemble::new(config(1, 3)).unwrap().run(wl, &pool);
        assert!(matches!(
            result,
            Err(SwarmError::Candidate { swarm: 0, candidate: 0, .. })
        ));
    }

    #[test]
    fn batches_cover_every_swarm_once() {
        assert_eq!(batches(10, 4), vec![0..4, 4..8, 8..10]);
        assert_eq!(batches(3, 8), vec![0..3]);
        assert_eq!(batches(4, 0), vec![0..1, 1..2, 2..3, 3..4]);
        assert!(batches(0, 4).is_empty());
    }

    #[test]
    fn ensemble_larger_than_worker_count_keeps_swarm_order() {
        let (wl, pool) = problem();
        let workers = thread::available_parallelism().map_or(1, NonZeroUsize::get);
        let size = 2 * workers + 1;
        let cfg = SwarmConfig {
            population: 3,
            max_iterations: 2,
            ensemble_size: size,
            seed: 11,
            ..SwarmConfig::default()
        };
        let outcome = Ensemble::new(cfg.clone()).unwrap().run(Arc::clone(&wl), &pool).unwrap();
        let indices: Vec<usize> = outcome.swarms.iter().map(|s| s.swarm).collect();
        assert_eq!(indices, (0..size).collect::<Vec<_>>());

        let last = SwarmOptimizer::new(size - 1, wl, &pool, &cfg, stream_rng(11, size - 1))
            .unwrap()
            .run()
            .unwrap();
        assert_eq!(outcome.swarms[size - 1].mapping, last.mapping);
    }

    #[test]
    fn zero_ensemble_size_is_rejected() {
        assert!(matches!(
            Ensemble::new(config(1, 0)),
            Err(SwarmError::InvalidConfig(_))
        ));
    }
}
