/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Structured error types for the swarm scheduler.
//!
//! Two error enums model the two failure layers:
//!
//! * [`ScoringError`]: why a single scoring pass (reset + assign + fitness)
//!   could not complete.  Low-level, carries the exact row / id / count.
//! * [`SwarmError`]: top-level failure returned from
//!   [`SwarmOptimizer`](crate::swarm::SwarmOptimizer) and
//!   [`Ensemble`](crate::ensemble::Ensemble).
//!
//! None of these are retried: the computation is deterministic, so a fault
//! aborts the run and the variant tells the caller exactly where it came from.

use thiserror::Error;

// ── Scoring pass ──────────────────────────────────────────────────────────────

/// Detailed reason why a scoring pass against a
/// [`ResourcePool`](crate::resource::ResourcePool) failed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScoringError {
    /// Makespan, throughput or energy was requested with no task assigned
    /// since the last `reset()`.
    #[error("no tasks assigned; makespan and fitness are undefined for an empty workload")]
    EmptyWorkload,

    /// A position row has no column equal to 1.  Never defaulted to VM 0.
    #[error("position row {row} has no assigned VM (no column equal to 1)")]
    MalformedPosition { row: usize },

    /// Task id outside `0..count`.
    #[error("task {task} out of range (workload has {count} task(s))")]
    TaskOutOfRange { task: usize, count: usize },

    /// VM id outside `0..count`.
    #[error("VM {vm} out of range (pool has {count} VM(s))")]
    VmOutOfRange { vm: usize, count: usize },

    /// The analytic cost model divides by the VM rate; a zero rate would
    /// make every execution time infinite.
    #[error("VM {vm} has a zero processing rate")]
    InvalidRate { vm: usize },

    /// The pass produced a makespan that is zero, negative or not finite,
    /// so throughput would be infinite or undefined.
    #[error("degenerate makespan {makespan}: execution times must be positive and finite")]
    DegenerateMakespan { makespan: f64 },

    /// Two matrices (or a matrix and the problem) disagree on shape.
    #[error("dimension mismatch: expected {expected:?}, found {found:?}")]
    DimensionMismatch {
        expected: (usize, usize),
        found: (usize, usize),
    },
}

// ── Top-level swarm errors ────────────────────────────────────────────────────

/// Top-level error type returned by the optimiser and the ensemble.
#[derive(Debug, Error)]
pub enum SwarmError {
    /// The workload has no tasks.
    #[error("no tasks provided, workload is empty")]
    EmptyWorkload,

    /// The resource pool has no VMs.
    #[error("no virtual machines provided, resource pool is empty")]
    EmptyResourcePool,

    /// A [`SwarmConfig`](crate::config::SwarmConfig) value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A candidate's seeding or step failed.  Names the swarm and candidate
    /// so the fault can be traced back to one random stream.
    #[error("swarm {swarm}, candidate {candidate}: {source}")]
    Candidate {
        swarm: usize,
        candidate: usize,
        #[source]
        source: ScoringError,
    },

    /// A scoring fault outside any candidate (e.g. final evaluation).
    #[error(transparent)]
    Scoring(#[from] ScoringError),

    /// A named scenario is not in the registry.
    #[error("unknown scenario: '{name}' (valid: {valid})")]
    UnknownScenario { name: String, valid: String },
}

// ── Tests ─────────────────────────────────────────────────────────────────────
