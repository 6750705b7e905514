/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Execution-time cost models.
//!
//! [`ResourcePool`](super::ResourcePool) never computes an execution time
//! itself; it asks an [`ExecutionCost`].  Two implementations ship:
//!
//! * [`AnalyticCost`]: `work(task) / rate(vm)`.
//! * [`CostMatrix`]: a fixed table keyed by `(task id, vm id)`, used to
//!   replay a benchmark data set whose execution times were measured
//!   elsewhere (e.g. the Braun et al. HCSP instances).

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use tracing::{debug, info};

use crate::error::ScoringError;
use crate::resource::VirtualMachine;
use crate::task::Task;

/// Source of the execution time of one task on one VM.
///
/// Implementations must be pure: the same `(task, vm)` pair always yields
/// the same value, so candidates can share one model across threads.
pub trait ExecutionCost: fmt::Debug + Send + Sync {
    fn execution_time(&self, task: &Task, vm: &VirtualMachine) -> Result<f64, ScoringError>;
}

// ── Analytic model ────────────────────────────────────────────────────────────

/// `work / rate`: instructions divided by instructions-per-second.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnalyticCost;

impl ExecutionCost for AnalyticCost {
    fn execution_time(&self, task: &Task, vm: &VirtualMachine) -> Result<f64, ScoringError> {
        if vm.rate == 0 {
            return Err(ScoringError::InvalidRate { vm: vm.id });
        }
        Ok(task.work as f64 / vm.rate as f64)
    }
}

// ── Fixed cost matrix ─────────────────────────────────────────────────────────

/// On-disk layout of a cost-matrix file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatrixLayout {
    /// One line per task; whitespace-separated values, one column per VM.
    Rows,

    /// One value per line, machine-major: all tasks for VM 0, then all
    /// tasks for VM 1, and so on.  Dimensions are not in the file.
    Braun { tasks: usize, vms: usize },
}

/// Pre-computed execution times, `tasks × vms`, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct CostMatrix {
    tasks: usize,
    vms: usize,
    times: Vec<f64>,
}

impl CostMatrix {
    /// Builds a matrix from task rows.  All rows must have the same length
    /// and every value must be finite and non-negative.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        let tasks = rows.len();
        let vms = rows.first().map(Vec::len).unwrap_or(0);
        let mut times = Vec::with_capacity(tasks * vms);
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != vms {
                bail!(
                    "cost matrix row {} has {} column(s), expected {}",
                    i,
                    row.len(),
                    vms
                );
            }
            for (j, &value) in row.iter().enumerate() {
                check_time(value, || format!("row {i}, column {j}"))?;
            }
            times.extend(row);
        }
        Ok(Self { tasks, vms, times })
    }

    /// Parses matrix text in the given layout.
    pub fn parse(content: &str, layout: MatrixLayout) -> Result<Self> {
        match layout {
            MatrixLayout::Rows => {
                let mut rows = Vec::new();
                for (lineno, line) in content.lines().enumerate() {
                    let line = line.trim();
                    if line.is_empty() || line.starts_with('#') {
                        continue;
                    }
                    let row = line
                        .split_whitespace()
                        .map(|tok| parse_time(tok, || format!("line {}", lineno + 1)))
                        .collect::<Result<Vec<f64>>>()?;
                    rows.push(row);
                }
                Self::from_rows(rows)
            }
            MatrixLayout::Braun { tasks, vms } => {
                let Some(expected) = tasks.checked_mul(vms) else {
                    bail!("{tasks} task(s) × {vms} VM(s) overflows the matrix size");
                };
                let values = content
                    .split_whitespace()
                    .enumerate()
                    .map(|(i, tok)| parse_time(tok, || format!("value {i}")))
                    .collect::<Result<Vec<f64>>>()?;
                if values.len() != expected {
                    bail!(
                        "expected {} values for {} task(s) × {} VM(s), found {}",
                        expected,
                        tasks,
                        vms,
                        values.len()
                    );
                }
                // Transpose machine-major input into task rows.
                let mut times = vec![0.0; expected];
                for (k, value) in values.into_iter().enumerate() {
                    let (vm, task) = (k / tasks, k % tasks);
                    times[task * vms + vm] = value;
                }
                Ok(Self { tasks, vms, times })
            }
        }
    }

    /// Reads and parses a cost-matrix file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, any value is not a
    /// finite non-negative number, or the dimensions are inconsistent with
    /// `layout`.
    pub fn load_from_file(path: &Path, layout: MatrixLayout) -> Result<Self> {
        info!("Loading cost matrix from: {}", path.display());
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot open cost matrix file: {}", path.display()))?;
        let matrix = Self::parse(&content, layout)
            .with_context(|| format!("Failed to parse cost matrix: {}", path.display()))?;
        debug!(
            tasks = matrix.tasks,
            vms = matrix.vms,
            "cost matrix loaded"
        );
        Ok(matrix)
    }

    pub fn task_count(&self) -> usize {
        self.tasks
    }

    pub fn vm_count(&self) -> usize {
        self.vms
    }
}

fn parse_time(tok: &str, at: impl Fn() -> String) -> Result<f64> {
    let value = tok
        .parse::<f64>()
        .with_context(|| format!("{}: invalid execution time '{}'", at(), tok))?;
    check_time(value, at)?;
    Ok(value)
}

fn check_time(value: f64, at: impl Fn() -> String) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        bail!(
            "{}: execution time '{}' must be finite and non-negative",
            at(),
            value
        );
    }
    Ok(())
}

impl ExecutionCost for CostMatrix {
    fn execution_time(&self, task: &Task, vm: &VirtualMachine) -> Result<f64, ScoringError> {
        if task.id >= self.tasks {
            return Err(ScoringError::TaskOutOfRange {
                task: task.id,
                count: self.tasks,
            });
        }
        if vm.id >= self.vms {
            return Err(ScoringError::VmOutOfRange {
                vm: vm.id,
                count: self.vms,
            });
        }
        Ok(self.times[task.id * self.vms + vm.id])
    }
}

impl FromStr for MatrixLayout {
    type Err = String;

    /// Parses `rows`, or `braun:<tasks>x<vms>`.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("rows") {
            return Ok(MatrixLayout::Rows);
        }
        let dims = s
            .strip_prefix("braun:")
            .ok_or_else(|| format!("unknown matrix layout '{s}' (valid: rows, braun:<tasks>x<vms>)"))?;
        let (t, v) = dims
            .split_once('x')
            .ok_or_else(|| format!("braun layout needs <tasks>x<vms>, got '{dims}'"))?;
        let tasks: usize = t.parse().map_err(|_| format!("invalid task count '{t}'"))?;
        let vms: usize = v.parse().map_err(|_| format!("invalid VM count '{v}'"))?;
        if tasks.checked_mul(vms).is_none() {
            return Err(format!("braun layout {tasks}x{vms} is too large"));
        }
        Ok(MatrixLayout::Braun { tasks, vms })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn vm(id: usize, rate: u64) -> VirtualMachine {
        VirtualMachine::new(id, rate, 500.0)
    }

    fn task(id: usize, work: u64) -> Task {
        Task { id, work }
    }

    // ── AnalyticCost ──────────────────────────────────────────────────────────

    #[test]
    fn analytic_cost_is_work_over_rate() {
        let t = AnalyticCost.execution_time(&task(0, 10), &vm(0, 100)).unwrap();
        assert!((t - 0.1).abs() < 1e-12);
    }

    #[test]
    fn analytic_cost_rejects_zero_rate() {
        let err = AnalyticCost.execution_time(&task(0, 10), &vm(3, 0)).unwrap_err();
        assert_eq!(err, ScoringError::InvalidRate { vm: 3 });
    }

    // ── CostMatrix ────────────────────────────────────────────────────────────

    #[test]
    fn rows_layout_is_task_major() {
        let m = CostMatrix::parse("1 2 3\n4 5 6\n", MatrixLayout::Rows).unwrap();
        assert_eq!((m.task_count(), m.vm_count()), (2, 3));
        assert_eq!(m.execution_time(&task(1, 0), &vm(2, 0)).unwrap(), 6.0);
    }

    #[test]
    fn rows_layout_skips_blank_and_comment_lines() {
        let m = CostMatrix::parse("# header\n\n1 2\n", MatrixLayout::Rows).unwrap();
        assert_eq!(m.task_count(), 1);
    }

    #[test]
    fn ragged_rows_are_rejected() {
        assert!(CostMatrix::parse("1 2\n3\n", MatrixLayout::Rows).is_err());
    }

    #[test]
    fn non_finite_or_negative_times_are_rejected() {
        let err = CostMatrix::parse("1 2\nNaN 5\n", MatrixLayout::Rows).unwrap_err();
        assert!(err.to_string().contains("line 2"), "{err}");
        assert!(err.to_string().contains("NaN"), "{err}");

        let err = CostMatrix::parse("1 -3\n", MatrixLayout::Rows).unwrap_err();
        assert!(err.to_string().contains("'-3'"), "{err}");

        assert!(CostMatrix::parse("inf 1\n", MatrixLayout::Rows).is_err());
        let layout = MatrixLayout::Braun { tasks: 1, vms: 2 };
        assert!(CostMatrix::parse("4\n-1\n", layout).is_err());
        assert!(CostMatrix::from_rows(vec![vec![1.0, f64::INFINITY]]).is_err());
    }

    #[test]
    fn zero_times_are_accepted() {
        let m = CostMatrix::parse("0 1\n", MatrixLayout::Rows).unwrap();
        assert_eq!(m.execution_time(&task(0, 0), &vm(0, 0)).unwrap(), 0.0);
    }

    #[test]
    fn braun_layout_is_machine_major() {
        // 2 tasks × 2 VMs: VM0 = [t0, t1], VM1 = [t0, t1]
        let layout = MatrixLayout::Braun { tasks: 2, vms: 2 };
        let m = CostMatrix::parse("10\n20\n30\n40\n", layout).unwrap();
        assert_eq!(m.execution_time(&task(0, 0), &vm(0, 0)).unwrap(), 10.0);
        assert_eq!(m.execution_time(&task(1, 0), &vm(0, 0)).unwrap(), 20.0);
        assert_eq!(m.execution_time(&task(0, 0), &vm(1, 0)).unwrap(), 30.0);
        assert_eq!(m.execution_time(&task(1, 0), &vm(1, 0)).unwrap(), 40.0);
    }

    #[test]
    fn braun_layout_checks_value_count() {
        let layout = MatrixLayout::Braun { tasks: 2, vms: 2 };
        assert!(CostMatrix::parse("1\n2\n3\n", layout).is_err());
    }

    #[test]
    fn lookup_outside_table_is_an_error() {
        let m = CostMatrix::parse("1 2\n", MatrixLayout::Rows).unwrap();
        assert!(matches!(
            m.execution_time(&task(1, 0), &vm(0, 0)),
            Err(ScoringError::TaskOutOfRange { task: 1, count: 1 })
        ));
        assert!(matches!(
            m.execution_time(&task(0, 0), &vm(2, 0)),
            Err(ScoringError::VmOutOfRange { vm: 2, count: 2 })
        ));
    }

    #[test]
    fn load_from_file_reads_rows() {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(b"0.5 1.5\n2.5 3.5\n").unwrap();
        let m = CostMatrix::load_from_file(f.path(), MatrixLayout::Rows).unwrap();
        assert_eq!(m.execution_time(&task(1, 0), &vm(1, 0)).unwrap(), 3.5);
    }

    #[test]
    fn load_from_missing_file_is_an_error() {
        let result = CostMatrix::load_from_file(Path::new("/nonexistent/hcsp.txt"), MatrixLayout::Rows);
        assert!(result.is_err());
    }

    // ── MatrixLayout ──────────────────────────────────────────────────────────

    #[test]
    fn layout_parses_from_cli_strings() {
        assert_eq!("rows".parse::<MatrixLayout>().unwrap(), MatrixLayout::Rows);
        assert_eq!(
            "braun:512x16".parse::<MatrixLayout>().unwrap(),
            MatrixLayout::Braun { tasks: 512, vms: 16 }
        );
        assert!("braun:512".parse::<MatrixLayout>().is_err());
        assert!("columns".parse::<MatrixLayout>().is_err());
    }

    #[test]
    fn oversized_braun_layout_is_rejected() {
        let huge = format!("braun:{}x2", usize::MAX);
        assert!(huge.parse::<MatrixLayout>().is_err());

        let layout = MatrixLayout::Braun { tasks: usize::MAX, vms: 2 };
        let err = CostMatrix::parse("1\n", layout).unwrap_err();
        assert!(err.to_string().contains("overflows"), "{err}");
    }
}
