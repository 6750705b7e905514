/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Virtual machines, the resource pool and the optimisation objective.
//!
//! A [`ResourcePool`] pairs an immutable topology (VMs + cost model, shared
//! behind an `Arc`) with a small amount of mutable simulation state: the
//! per-VM ready time and two counters.  Scoring a position is always a full
//! pass:
//!
//! ```text
//! reset() ──► assign(task 0, vm) ──► … ──► assign(task n-1, vm) ──► compute_fitness()
//! ```
//!
//! The pass is not reentrant.  Each candidate owns its own clone of the pool;
//! cloning copies the ready-time vector and shares the topology, so two
//! candidates never observe each other's partial passes.

pub mod cost;

use std::fmt;
use std::sync::Arc;

use tracing::warn;

use crate::error::ScoringError;
use crate::matrix::AssignmentMatrix;
use crate::task::{Task, Workload};

use cost::{AnalyticCost, CostMatrix, ExecutionCost};

// ── Constants ─────────────────────────────────────────────────────────────────

/// Idle-state energy rate as a fraction of the active-state rate, used when a
/// VM does not specify its idle rate explicitly.
pub const IDLE_ENERGY_RATIO: f64 = 0.6;

/// Active-state energy rate (J per million instructions) when none is given.
pub const DEFAULT_ACTIVE_ENERGY: f64 = 500.0;

/// Weight `k` of the inverse-energy term of the fitness.
pub const DEFAULT_ENERGY_WEIGHT: f64 = 2.0;

/// Scale applied to kW before averaging per task (kW → hW).
pub const DEFAULT_ENERGY_UNIT_SCALE: f64 = 10.0;

// ── VirtualMachine ────────────────────────────────────────────────────────────

/// Description of one VM to be added to a pool.  The pool assigns the id.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VmSpec {
    /// Processing rate in millions of instructions per second.
    pub rate: u64,
    /// Active-state energy rate.
    pub active_energy: f64,
    /// Idle-state energy rate; `None` derives it from `active_energy`.
    pub idle_energy: Option<f64>,
}

impl VmSpec {
    pub fn new(rate: u64) -> Self {
        Self {
            rate,
            active_energy: DEFAULT_ACTIVE_ENERGY,
            idle_energy: None,
        }
    }

    pub fn with_active_energy(mut self, active_energy: f64) -> Self {
        self.active_energy = active_energy;
        self
    }

    pub fn with_idle_energy(mut self, idle_energy: f64) -> Self {
        self.idle_energy = Some(idle_energy);
        self
    }
}

/// A VM as seen by the optimiser.  Immutable once in a pool.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VirtualMachine {
    /// Column index in the assignment matrix.
    pub id: usize,
    pub rate: u64,
    pub active_energy: f64,
    pub idle_energy: f64,
}

impl VirtualMachine {
    /// Creates a VM whose idle rate is [`IDLE_ENERGY_RATIO`] × `active_energy`.
    pub fn new(id: usize, rate: u64, active_energy: f64) -> Self {
        Self {
            id,
            rate,
            active_energy,
            idle_energy: active_energy * IDLE_ENERGY_RATIO,
        }
    }

    fn from_spec(id: usize, spec: VmSpec) -> Self {
        let vm = Self::new(id, spec.rate, spec.active_energy);
        match spec.idle_energy {
            Some(idle_energy) => Self { idle_energy, ..vm },
            None => vm,
        }
    }
}

impl fmt::Display for VirtualMachine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "(vm{}: {} mips, {} J/MI active, {} J/MI idle)",
            self.id, self.rate, self.active_energy, self.idle_energy
        )
    }
}

// ── Objective ─────────────────────────────────────────────────────────────────

/// Constants of the fitness formula.
///
/// `fitness = throughput + energy_weight / (energy_kw × energy_unit_scale / task_count)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectiveWeights {
    pub energy_weight: f64,
    pub energy_unit_scale: f64,
}

impl Default for ObjectiveWeights {
    fn default() -> Self {
        Self {
            energy_weight: DEFAULT_ENERGY_WEIGHT,
            energy_unit_scale: DEFAULT_ENERGY_UNIT_SCALE,
        }
    }
}

/// Every component of the objective for the pool's current assignment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    /// Completion time of the last-finishing VM, in seconds.
    pub makespan: f64,
    /// Tasks per second.
    pub throughput: f64,
    /// Work-normalised power draw in kW.
    pub energy_kw: f64,
    pub fitness: f64,
}

// ── ResourcePool ──────────────────────────────────────────────────────────────

#[derive(Debug)]
struct Topology {
    vms: Vec<VirtualMachine>,
    cost: Arc<dyn ExecutionCost>,
}

/// Ordered VMs plus the per-scoring-pass ready-time state.
#[derive(Debug, Clone)]
pub struct ResourcePool {
    topology: Arc<Topology>,
    ready_times: Vec<f64>,
    task_count: usize,
    total_work: u64,
}

impl ResourcePool {
    /// Pool scored with the analytic `work / rate` model.  Ids follow the
    /// iteration order of `specs`.
    pub fn analytic(specs: impl IntoIterator<Item = VmSpec>) -> Self {
        Self::with_cost_model(specs, Arc::new(AnalyticCost))
    }

    /// Pool scored with an arbitrary cost model.
    pub fn with_cost_model(
        specs: impl IntoIterator<Item = VmSpec>,
        cost: Arc<dyn ExecutionCost>,
    ) -> Self {
        let vms: Vec<VirtualMachine> = specs
            .into_iter()
            .enumerate()
            .map(|(id, spec)| VirtualMachine::from_spec(id, spec))
            .collect();
        let ready_times = vec![0.0; vms.len()];
        Self {
            topology: Arc::new(Topology { vms, cost }),
            ready_times,
            task_count: 0,
            total_work: 0,
        }
    }

    /// Pool replaying a fixed cost matrix: one placeholder VM (rate 0,
    /// default energy rates) per matrix column.
    pub fn from_cost_matrix(matrix: CostMatrix) -> Self {
        let specs = vec![VmSpec::new(0); matrix.vm_count()];
        Self::with_cost_model(specs, Arc::new(matrix))
    }

    pub fn vms(&self) -> &[VirtualMachine] {
        &self.topology.vms
    }

    pub fn vm_count(&self) -> usize {
        self.topology.vms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topology.vms.is_empty()
    }

    /// Looks up a VM by id.
    pub fn vm(&self, id: usize) -> Result<&VirtualMachine, ScoringError> {
        self.topology.vms.get(id).ok_or(ScoringError::VmOutOfRange {
            vm: id,
            count: self.vm_count(),
        })
    }

    /// Accumulated execution time of VM `id` in the current pass.
    pub fn ready_time(&self, id: usize) -> Result<f64, ScoringError> {
        self.vm(id)?;
        Ok(self.ready_times[id])
    }

    pub fn task_count(&self) -> usize {
        self.task_count
    }

    pub fn total_work(&self) -> u64 {
        self.total_work
    }

    // ── Scoring protocol ──────────────────────────────────────────────────────

    /// Starts a new scoring pass: ready times and counters back to zero.
    pub fn reset(&mut self) {
        self.ready_times.iter_mut().for_each(|t| *t = 0.0);
        self.task_count = 0;
        self.total_work = 0;
    }

    /// Execution time of `task` on VM `vm` under the pool's cost model.
    pub fn load_execution_time(&self, task: &Task, vm: usize) -> Result<f64, ScoringError> {
        let machine = self.vm(vm)?;
        self.topology.cost.execution_time(task, machine)
    }

    /// Places `task` on VM `vm` for the current pass.
    pub fn assign(&mut self, task: &Task, vm: usize) -> Result<(), ScoringError> {
        let time = self.load_execution_time(task, vm)?;
        self.ready_times[vm] += time;
        self.task_count += 1;
        self.total_work += task.work;
        Ok(())
    }

    /// Max ready time over all VMs.
    ///
    /// # Errors
    /// [`ScoringError::EmptyWorkload`] if nothing was assigned since `reset()`,
    /// [`ScoringError::DegenerateMakespan`] if any ready time is not finite
    /// or the maximum is not strictly positive.
    pub fn compute_makespan(&self) -> Result<f64, ScoringError> {
        if self.task_count == 0 {
            return Err(ScoringError::EmptyWorkload);
        }
        if let Some(&bad) = self.ready_times.iter().find(|t| !t.is_finite()) {
            return Err(ScoringError::DegenerateMakespan { makespan: bad });
        }
        let makespan = self.ready_times.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if makespan <= 0.0 {
            return Err(ScoringError::DegenerateMakespan { makespan });
        }
        Ok(makespan)
    }

    /// Work-normalised energy in kW for a given makespan.
    ///
    /// Each VM is charged its active rate for its busy time and its idle
    /// rate for the rest of the makespan, weighted by its processing rate.
    /// Returns `0.0` when the assigned work is zero (cost-matrix replays),
    /// since the normalisation is undefined there.
    pub fn compute_energy_kw(&self, makespan: f64) -> f64 {
        if self.total_work == 0 {
            return 0.0;
        }
        let joules_mips: f64 = self
            .topology
            .vms
            .iter()
            .zip(&self.ready_times)
            .map(|(vm, &busy)| {
                let active = busy * vm.active_energy;
                let idle = (makespan - busy) * vm.idle_energy;
                (active + idle) * vm.rate as f64
            })
            .sum();
        // J·MIPS / MI → W, then W → kW
        joules_mips / self.total_work as f64 / 1000.0
    }

    /// All objective components for the current pass.
    pub fn evaluate(&self, weights: &ObjectiveWeights) -> Result<Evaluation, ScoringError> {
        let makespan = self.compute_makespan()?;
        let tasks = self.task_count as f64;
        let throughput = tasks / makespan;
        let energy_kw = self.compute_energy_kw(makespan);

        let energy_per_task = energy_kw * weights.energy_unit_scale / tasks;
        let energy_term = if energy_per_task > 0.0 && energy_per_task.is_finite() {
            weights.energy_weight / energy_per_task
        } else {
            0.0
        };

        Ok(Evaluation {
            makespan,
            throughput,
            energy_kw,
            fitness: throughput + energy_term,
        })
    }

    /// `throughput + k / average_energy_per_task`.  Higher is better.
    pub fn compute_fitness(&self, weights: &ObjectiveWeights) -> Result<f64, ScoringError> {
        Ok(self.evaluate(weights)?.fitness)
    }

    /// Full pass over `position`: reset, assign every task to its VM, score.
    pub fn score(
        &mut self,
        workload: &Workload,
        position: &AssignmentMatrix,
        weights: &ObjectiveWeights,
    ) -> Result<f64, ScoringError> {
        self.load_position(workload, position)?;
        let fitness = self.compute_fitness(weights)?;
        if fitness.is_nan() {
            warn!(tasks = workload.len(), "scoring pass produced NaN fitness");
        }
        Ok(fitness)
    }

    /// Reset + assign for every row of `position`, without scoring.
    pub fn load_position(
        &mut self,
        workload: &Workload,
        position: &AssignmentMatrix,
    ) -> Result<(), ScoringError> {
        let expected = (workload.len(), self.vm_count());
        if position.shape() != expected {
            return Err(ScoringError::DimensionMismatch {
                expected,
                found: position.shape(),
            });
        }
        self.reset();
        for task in workload.tasks() {
            let vm = position.assigned_vm(task.id)?;
            self.assign(task, vm)?;
        }
        Ok(())
    }

    // ── Seeding helpers ───────────────────────────────────────────────────────

    /// VM with the earliest completion time for `task` given the current
    /// ready times.  Ties go to the lowest id.
    pub fn min_completion_vm(&self, task: &Task) -> Result<usize, ScoringError> {
        let mut best: Option<(usize, f64)> = None;
        for vm in 0..self.vm_count() {
            let finish = self.ready_times[vm] + self.load_execution_time(task, vm)?;
            match best {
                Some((_, t)) if finish >= t => {}
                _ => best = Some((vm, finish)),
            }
        }
        best.map(|(vm, _)| vm)
            .ok_or(ScoringError::VmOutOfRange { vm: 0, count: 0 })
    }

    /// VM ids ordered by processing rate, slowest first (stable).
    pub fn vms_by_rate(&self) -> Vec<usize> {
        let mut ids: Vec<usize> = (0..self.vm_count()).collect();
        ids.sort_by_key(|&id| self.topology.vms[id].rate);
        ids
    }
}

impl fmt::Display for ResourcePool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "pool[{} VM(s), {} task(s) loaded, ready = {:?}]",
            self.vm_count(),
            self.task_count,
            self.ready_times
        )
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
