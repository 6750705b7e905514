/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Dense tasks × VMs matrix used for both candidate positions and velocities.
//!
//! * **Position**: every row is one-hot: exactly one entry equals `1.0`, the
//!   rest are `0.0`.  Row `i` set at column `j` means task `i` runs on VM `j`.
//! * **Velocity**: unconstrained reals, bounded to `[-v_max, v_max]` after
//!   each update by [`AssignmentMatrix::reinject_out_of_bounds`].
//!
//! Storage is a single row-major `Vec<f64>`; the shape is fixed at
//! construction.

use std::fmt;
use std::ops::{Index, IndexMut};

use crate::error::ScoringError;

#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentMatrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl AssignmentMatrix {
    /// All-zero matrix of the given shape.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Matrix whose entries are produced by `f`, in row-major order.
    pub fn from_fn(rows: usize, cols: usize, mut f: impl FnMut() -> f64) -> Self {
        let data = (0..rows * cols).map(|_| f()).collect();
        Self { rows, cols, data }
    }

    /// One-hot position matrix from a task → VM mapping.
    ///
    /// # Errors
    /// [`ScoringError::VmOutOfRange`] if any mapped VM is `>= cols`.
    pub fn one_hot(mapping: &[usize], cols: usize) -> Result<Self, ScoringError> {
        let mut m = Self::zeros(mapping.len(), cols);
        for (row, &vm) in mapping.iter().enumerate() {
            if vm >= cols {
                return Err(ScoringError::VmOutOfRange { vm, count: cols });
            }
            m[(row, vm)] = 1.0;
        }
        Ok(m)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn row(&self, row: usize) -> &[f64] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    pub fn iter(&self) -> impl Iterator<Item = &f64> {
        self.data.iter()
    }

    fn check_shape(&self, other: &Self) -> Result<(), ScoringError> {
        if self.shape() != other.shape() {
            return Err(ScoringError::DimensionMismatch {
                expected: self.shape(),
                found: other.shape(),
            });
        }
        Ok(())
    }

    // ── Elementwise arithmetic ────────────────────────────────────────────────

    /// `self *= factor`.
    pub fn scale(&mut self, factor: f64) {
        self.data.iter_mut().for_each(|v| *v *= factor);
    }

    /// `self - other`, as a new matrix.
    pub fn sub(&self, other: &Self) -> Result<Self, ScoringError> {
        self.check_shape(other)?;
        let data = self
            .data
            .iter()
            .zip(&other.data)
            .map(|(a, b)| a - b)
            .collect();
        Ok(Self {
            rows: self.rows,
            cols: self.cols,
            data,
        })
    }

    /// `self += factor * other`.
    pub fn add_scaled(&mut self, other: &Self, factor: f64) -> Result<(), ScoringError> {
        self.check_shape(other)?;
        for (a, b) in self.data.iter_mut().zip(&other.data) {
            *a += factor * b;
        }
        Ok(())
    }

    /// Replaces every entry whose absolute value exceeds `bound` with a fresh
    /// value from `draw`, returning how many entries were replaced.
    ///
    /// Non-finite entries count as out of bounds.  `draw` must yield values
    /// in `[0, bound]`.
    pub fn reinject_out_of_bounds(&mut self, bound: f64, mut draw: impl FnMut() -> f64) -> usize {
        let mut replaced = 0;
        for v in self.data.iter_mut() {
            if !v.is_finite() || v.abs() > bound {
                *v = draw();
                replaced += 1;
            }
        }
        replaced
    }

    /// Largest absolute entry (`0.0` for an empty matrix).
    pub fn max_abs(&self) -> f64 {
        self.data.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()))
    }

    // ── Row reductions ────────────────────────────────────────────────────────

    /// Column of the largest entry in `row`.  Ties go to the lowest column.
    pub fn argmax_row(&self, row: usize) -> usize {
        let values = self.row(row);
        let mut best = 0;
        for (col, &v) in values.iter().enumerate().skip(1) {
            if v > values[best] {
                best = col;
            }
        }
        best
    }

    /// First column in `row` whose entry equals `value` exactly.
    pub fn first_match_row(&self, row: usize, value: f64) -> Option<usize> {
        self.row(row).iter().position(|&v| v == value)
    }

    /// Sum of each row.
    pub fn row_sums(&self) -> Vec<f64> {
        (0..self.rows).map(|r| self.row(r).iter().sum()).collect()
    }

    // ── Position helpers ──────────────────────────────────────────────────────

    /// Discretises a velocity matrix into a one-hot position: each row gets a
    /// single `1.0` at the column of its maximum velocity.
    pub fn discretize(velocity: &Self) -> Self {
        let mut position = Self::zeros(velocity.rows, velocity.cols);
        if velocity.cols == 0 {
            return position;
        }
        for row in 0..velocity.rows {
            let col = velocity.argmax_row(row);
            position[(row, col)] = 1.0;
        }
        position
    }

    /// VM assigned to task `row` in a position matrix.
    ///
    /// # Errors
    /// * [`ScoringError::TaskOutOfRange`] if `row >= rows()`.
    /// * [`ScoringError::MalformedPosition`] if no column equals `1.0`.
    pub fn assigned_vm(&self, row: usize) -> Result<usize, ScoringError> {
        if row >= self.rows {
            return Err(ScoringError::TaskOutOfRange {
                task: row,
                count: self.rows,
            });
        }
        self.first_match_row(row, 1.0)
            .ok_or(ScoringError::MalformedPosition { row })
    }

    /// Full task → VM mapping of a position matrix.
    pub fn assignments(&self) -> Result<Vec<usize>, ScoringError> {
        (0..self.rows).map(|row| self.assigned_vm(row)).collect()
    }

    /// `true` if every row holds exactly one `1.0` and zeros elsewhere.
    pub fn is_one_hot(&self) -> bool {
        (0..self.rows).all(|r| {
            let row = self.row(r);
            row.iter().filter(|&&v| v == 1.0).count() == 1
                && row.iter().all(|&v| v == 0.0 || v == 1.0)
        })
    }
}

impl Index<(usize, usize)> for AssignmentMatrix {
    type Output = f64;

    fn index(&self, (row, col): (usize, usize)) -> &Self::Output {
        debug_assert!(row < self.rows && col < self.cols);
        &self.data[row * self.cols + col]
    }
}

impl IndexMut<(usize, usize)> for AssignmentMatrix {
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut Self::Output {
        debug_assert!(row < self.rows && col < self.cols);
        &mut self.data[row * self.cols + col]
    }
}

impl fmt::Display for AssignmentMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[")?;
        for r in 0..self.rows {
            writeln!(f, "  {:?}", self.row(r))?;
        }
        write!(f, "]")
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
