/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! pso-scheduler – discrete particle-swarm task-to-VM scheduler
//!
//! Module layout:
//!
//! ```text
//! lib.rs
//! ├── error.rs        – ScoringError / SwarmError
//! ├── task.rs         – Task, Workload
//! ├── matrix.rs       – AssignmentMatrix (positions and velocities)
//! ├── resource/       – VirtualMachine, ResourcePool, cost models
//! ├── swarm/          – Candidate, seeding, inertia, SwarmOptimizer
//! ├── ensemble.rs     – parallel independent swarms
//! ├── config/         – YAML run configuration and problem files
//! ├── scenario/       – named problem instances
//! └── history.rs      – TSV fitness-history export
//! ```

pub mod config;
pub mod ensemble;
pub mod error;
pub mod history;
pub mod matrix;
pub mod resource;
pub mod scenario;
pub mod swarm;
pub mod task;
