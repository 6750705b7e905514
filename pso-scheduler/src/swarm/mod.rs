/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Discrete particle-swarm optimiser.
//!
//! # Iteration loop
//!
//! ```text
//! new():   seed population (round-robin strategies) ──► global best = best seed
//!
//! for t in 1..=max_iterations:
//!     w   = inertia(t, p_s)
//!     s   = Σ candidate.step(w)            (sequential, one RNG per swarm)
//!     p_s = s / population                 (1 if s == 0)
//!     if any personal best > global best:
//!         global best = that position (deep copy), pushed to every candidate
//! ```
//!
//! The global best is only ever replaced by a strictly better fitness, so its
//! trajectory is non-decreasing.  All randomness flows through one
//! [`ChaCha8Rng`] per swarm; see [`stream_rng`].

pub mod candidate;
pub mod inertia;
pub mod seeding;

use std::sync::Arc;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use crate::config::SwarmConfig;
use crate::error::SwarmError;
use crate::matrix::AssignmentMatrix;
use crate::resource::ResourcePool;
use crate::task::Workload;

use candidate::Candidate;
use inertia::InertiaSchedule;

/// Generator for swarm `swarm` of a run seeded with `seed`.
///
/// Every swarm shares the key derived from `seed` and gets its own ChaCha
/// stream, so stream 0 is exactly what a stand-alone swarm with the same
/// seed uses.
pub fn stream_rng(seed: u64, swarm: usize) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(swarm as u64);
    rng
}

// ── Result type ───────────────────────────────────────────────────────────────

/// Final state of one swarm.
#[derive(Debug, Clone)]
pub struct SwarmOutcome {
    /// Index of the swarm within its ensemble (0 for a stand-alone run).
    pub swarm: usize,
    /// `mapping[task] = vm` for the global best.
    pub mapping: Vec<usize>,
    pub position: AssignmentMatrix,
    pub fitness: f64,
    /// Personal-best fitness after each iteration, one sequence per candidate.
    pub histories: Vec<Vec<f64>>,
    /// Global-best fitness after each iteration.
    pub global_best_history: Vec<f64>,
}

// ── SwarmOptimizer ────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct SwarmOptimizer {
    index: usize,
    candidates: Vec<Candidate>,
    global_best: Arc<AssignmentMatrix>,
    global_best_fitness: f64,
    global_best_history: Vec<f64>,
    schedule: InertiaSchedule,
    success_ratio: f64,
    iteration: usize,
    rng: ChaCha8Rng,
}

impl SwarmOptimizer {
    /// Validates the inputs, seeds the population and computes the initial
    /// global best.
    ///
    /// Candidate `c` is seeded with `config.seeding[c % config.seeding.len()]`.
    ///
    /// # Errors
    /// * [`SwarmError::InvalidConfig`] if `config` fails validation.
    /// * [`SwarmError::EmptyWorkload`] / [`SwarmError::EmptyResourcePool`].
    /// * [`SwarmError::Candidate`] if seeding or scoring a candidate fails.
    pub fn new(
        index: usize,
        workload: Arc<Workload>,
        pool: &ResourcePool,
        config: &SwarmConfig,
        mut rng: ChaCha8Rng,
    ) -> Result<Self, SwarmError> {
        config.validate()?;
        if workload.is_empty() {
            return Err(SwarmError::EmptyWorkload);
        }
        if pool.is_empty() {
            return Err(SwarmError::EmptyResourcePool);
        }

        let mut candidates = Vec::with_capacity(config.population);
        for c in 0..config.population {
            let strategy = config.seeding[c % config.seeding.len()];
            let candidate =
                Candidate::new(c, strategy, Arc::clone(&workload), pool, config, &mut rng)
                    .map_err(|source| SwarmError::Candidate {
                        swarm: index,
                        candidate: c,
                        source,
                    })?;
            candidates.push(candidate);
        }

        // Candidate 0 is the baseline; later seeds must beat it strictly.
        let mut best = 0;
        for (c, candidate) in candidates.iter().enumerate().skip(1) {
            if candidate.best_fitness() > candidates[best].best_fitness() {
                best = c;
            }
        }
        let global_best = Arc::new(candidates[best].best_position().clone());
        let global_best_fitness = candidates[best].best_fitness();
        for candidate in candidates.iter_mut() {
            candidate.set_global_best(Arc::clone(&global_best));
        }

        info!(
            swarm = index,
            population = config.population,
            tasks = workload.len(),
            vms = pool.vm_count(),
            fitness = global_best_fitness,
            "swarm seeded"
        );

        Ok(Self {
            index,
            candidates,
            global_best,
            global_best_fitness,
            global_best_history: Vec::with_capacity(config.max_iterations),
            schedule: InertiaSchedule::new(
                config.inertia_max,
                config.inertia_min,
                config.max_iterations,
            ),
            success_ratio: 1.0,
            iteration: 0,
            rng,
        })
    }

    /// Runs every remaining iteration and returns the final state.
    pub fn run(mut self) -> Result<SwarmOutcome, SwarmError> {
        while self.iteration < self.schedule.max_iterations {
            self.tick()?;
        }
        info!(
            swarm = self.index,
            iterations = self.iteration,
            fitness = self.global_best_fitness,
            "swarm finished"
        );
        self.into_outcome()
    }

    /// Advances the swarm by one iteration and returns the success count.
    pub fn tick(&mut self) -> Result<usize, SwarmError> {
        self.iteration += 1;
        let inertia = self.schedule.weight(self.iteration, self.success_ratio);

        let mut successes = 0;
        for candidate in self.candidates.iter_mut() {
            let improved = candidate.step(inertia, &mut self.rng).map_err(|source| {
                SwarmError::Candidate {
                    swarm: self.index,
                    candidate: candidate.id(),
                    source,
                }
            })?;
            successes += usize::from(improved);
        }
        self.success_ratio = inertia::success_ratio(successes, self.candidates.len());

        let improved = self.update_global_best();
        self.global_best_history.push(self.global_best_fitness);

        debug!(
            swarm = self.index,
            iteration = self.iteration,
            inertia,
            successes,
            global_best = self.global_best_fitness,
            improved,
            "iteration complete"
        );
        Ok(successes)
    }

    /// Adopts the best personal best if it strictly beats the global best.
    fn update_global_best(&mut self) -> bool {
        let mut winner = None;
        let mut best = self.global_best_fitness;
        for (c, candidate) in self.candidates.iter().enumerate() {
            if candidate.best_fitness() > best {
                best = candidate.best_fitness();
                winner = Some(c);
            }
        }

        let Some(c) = winner else {
            return false;
        };
        self.global_best = Arc::new(self.candidates[c].best_position().clone());
        self.global_best_fitness = best;
        for candidate in self.candidates.iter_mut() {
            candidate.set_global_best(Arc::clone(&self.global_best));
        }
        true
    }

    fn into_outcome(self) -> Result<SwarmOutcome, SwarmError> {
        let mapping = self.global_best.assignments()?;
        Ok(SwarmOutcome {
            swarm: self.index,
            mapping,
            position: Arc::unwrap_or_clone(self.global_best),
            fitness: self.global_best_fitness,
            histories: self
                .candidates
                .iter()
                .map(|c| c.history().to_vec())
                .collect(),
            global_best_history: self.global_best_history,
        })
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn iteration(&self) -> usize {
        self.iteration
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn global_best(&self) -> &AssignmentMatrix {
        &self.global_best
    }

    pub fn global_best_fitness(&self) -> f64 {
        self.global_best_fitness
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
