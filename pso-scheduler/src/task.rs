/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Task and workload data structures.
//!
//! ```text
//! factory ──(work sizes)──►  Workload [Task 0, Task 1, …]  ──(row index)──►  AssignmentMatrix
//! ```
//!
//! # Ownership model
//! A `Workload` is built once per optimisation run and shared read-only by
//! every candidate (`Arc<Workload>`).  Task ids are assigned by the workload
//! itself in insertion order, so the id of a task *is* its row in every
//! position / velocity matrix.  There is no process-wide id counter: two
//! workloads built side by side both start at id 0.

use std::fmt;

use crate::error::ScoringError;

// ── Task ──────────────────────────────────────────────────────────────────────

/// A unit of work to be placed on exactly one VM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Task {
    /// Row index in the assignment matrix.  Unique within one workload.
    pub id: usize,

    /// Size in abstract instruction units (millions of instructions).
    pub work: u64,
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(task{}: {} mi)", self.id, self.work)
    }
}

// ── Workload ──────────────────────────────────────────────────────────────────

/// Ordered, immutable-after-construction sequence of tasks.
#[derive(Debug, Clone, Default)]
pub struct Workload {
    tasks: Vec<Task>,
}

impl Workload {
    /// Creates an empty workload.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a workload from work sizes; ids follow iteration order.
    pub fn from_work_sizes(sizes: impl IntoIterator<Item = u64>) -> Self {
        let mut workload = Self::new();
        for work in sizes {
            workload.add_task(work);
        }
        workload
    }

    /// A workload of `count` zero-sized tasks.
    ///
    /// Used with a fixed cost matrix, where execution times come from the
    /// table and the task size carries no information.
    pub fn null(count: usize) -> Self {
        Self::from_work_sizes(std::iter::repeat(0).take(count))
    }

    /// Appends a task and returns the id it was given.
    pub fn add_task(&mut self, work: u64) -> usize {
        let id = self.tasks.len();
        self.tasks.push(Task { id, work });
        id
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Looks up a task by id.
    ///
    /// # Errors
    /// [`ScoringError::TaskOutOfRange`] if `id >= len()`.
    pub fn task(&self, id: usize) -> Result<&Task, ScoringError> {
        self.tasks.get(id).ok_or(ScoringError::TaskOutOfRange {
            task: id,
            count: self.tasks.len(),
        })
    }

    /// Sum of all task sizes.
    pub fn total_work(&self) -> u64 {
        self.tasks.iter().map(|t| t.work).sum()
    }

    /// Tasks ordered by work size.
    ///
    /// The sort is stable, so equal-sized tasks keep their id order in both
    /// directions.
    pub fn sorted_by_work(&self, descending: bool) -> Vec<&Task> {
        let mut sorted: Vec<&Task> = self.tasks.iter().collect();
        if descending {
            sorted.sort_by(|a, b| b.work.cmp(&a.work));
        } else {
            sorted.sort_by(|a, b| a.work.cmp(&b.work));
        }
        sorted
    }
}

impl fmt::Display for Workload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "workload[")?;
        for (i, task) in self.tasks.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{task}")?;
        }
        write!(f, "]")
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
