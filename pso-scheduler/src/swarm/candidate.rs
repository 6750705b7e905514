/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! One particle of the swarm.
//!
//! A candidate owns its position, velocity, personal best and fitness
//! history, plus a private [`ResourcePool`] clone so its scoring passes never
//! interleave with another candidate's.  The global best is shared read-only
//! through an `Arc` and replaced by the optimiser whenever it improves.

use std::sync::Arc;

use rand::Rng;
use tracing::trace;

use crate::config::SwarmConfig;
use crate::error::ScoringError;
use crate::matrix::AssignmentMatrix;
use crate::resource::{ObjectiveWeights, ResourcePool};
use crate::swarm::seeding::{Seed, SeedingStrategy};
use crate::task::Workload;

/// Acceleration coefficients and velocity bound of one step.
#[derive(Debug, Clone, Copy, PartialEq)]
struct StepParams {
    c1: f64,
    c2: f64,
    v_max: f64,
    weights: ObjectiveWeights,
}

impl From<&SwarmConfig> for StepParams {
    fn from(config: &SwarmConfig) -> Self {
        Self {
            c1: config.c1,
            c2: config.c2,
            v_max: config.v_max,
            weights: config.objective_weights(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Candidate {
    id: usize,
    strategy: SeedingStrategy,
    workload: Arc<Workload>,
    pool: ResourcePool,
    params: StepParams,

    position: AssignmentMatrix,
    velocity: AssignmentMatrix,

    best_position: AssignmentMatrix,
    best_fitness: f64,

    global_best: Arc<AssignmentMatrix>,

    /// Personal-best fitness after each step.
    history: Vec<f64>,
}

impl Candidate {
    /// Seeds a candidate with `strategy` and scores the initial position.
    ///
    /// The personal best starts at the seeded position.  Until the optimiser
    /// pushes a global best the candidate treats its own seed as the global
    /// best.
    pub fn new<R: Rng>(
        id: usize,
        strategy: SeedingStrategy,
        workload: Arc<Workload>,
        pool: &ResourcePool,
        config: &SwarmConfig,
        rng: &mut R,
    ) -> Result<Self, ScoringError> {
        let params = StepParams::from(config);
        let mut pool = pool.clone();

        let Seed { position, velocity } = strategy.seed(&workload, &mut pool, rng, config)?;
        let fitness = pool.score(&workload, &position, &params.weights)?;

        trace!(candidate = id, %strategy, fitness, "candidate seeded");

        Ok(Self {
            id,
            strategy,
            workload,
            pool,
            params,
            best_position: position.clone(),
            best_fitness: fitness,
            global_best: Arc::new(position.clone()),
            position,
            velocity,
            history: Vec::new(),
        })
    }

    /// One PSO iteration.  Returns `true` if the personal best improved.
    ///
    /// ```text
    /// v ← w·v + c1·r1·(pbest − x) + c2·r2·(gbest − x)
    /// v[i,j] ← U[0, v_max)   wherever |v[i,j]| > v_max
    /// x ← one-hot argmax of each row of v
    /// ```
    pub fn step<R: Rng>(&mut self, inertia: f64, rng: &mut R) -> Result<bool, ScoringError> {
        let r1: f64 = rng.random();
        let r2: f64 = rng.random();
        let StepParams { c1, c2, v_max, weights } = self.params;

        let cognitive = self.best_position.sub(&self.position)?;
        let social = self.global_best.sub(&self.position)?;

        self.velocity.scale(inertia);
        self.velocity.add_scaled(&cognitive, c1 * r1)?;
        self.velocity.add_scaled(&social, c2 * r2)?;
        self.velocity
            .reinject_out_of_bounds(v_max, || rng.random_range(0.0..v_max));

        self.position = AssignmentMatrix::discretize(&self.velocity);
        let fitness = self.pool.score(&self.workload, &self.position, &weights)?;

        let improved = fitness > self.best_fitness;
        if improved {
            self.best_position = self.position.clone();
            self.best_fitness = fitness;
        }
        self.history.push(self.best_fitness);
        Ok(improved)
    }

    /// Replaces the shared global-best position used by [`step`](Self::step).
    pub fn set_global_best(&mut self, global_best: Arc<AssignmentMatrix>) {
        self.global_best = global_best;
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn strategy(&self) -> SeedingStrategy {
        self.strategy
    }

    pub fn position(&self) -> &AssignmentMatrix {
        &self.position
    }

    pub fn velocity(&self) -> &AssignmentMatrix {
        &self.velocity
    }

    pub fn best_position(&self) -> &AssignmentMatrix {
        &self.best_position
    }

    pub fn best_fitness(&self) -> f64 {
        self.best_fitness
    }

    pub fn history(&self) -> &[f64] {
        &self.history
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
