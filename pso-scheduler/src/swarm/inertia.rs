/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Success-rate-adaptive inertia weight.
//!
//! For iteration `t` of `T`, with bounds `w1 > w2` and the previous
//! iteration's success ratio `p_s`:
//!
//! ```text
//! w(t) = (w1 − w2) / p_s  +  ((T − t) / T) · (w2 / p_s)
//! ```
//!
//! (`w2` is written `w1 − (w1 − w2)` in the literature.)  With every
//! candidate improving (`p_s = 1`) the weight decays linearly from `w1`
//! towards `w1 − w2` as the run matures.  A low success ratio divides both
//! terms by a small number, so a stalled swarm gets a large inertia and
//! explores again; oversized velocity components are then reinjected by the
//! `v_max` bound in the candidate step.

// ── Public API ────────────────────────────────────────────────────────────────

/// Inertia bounds plus the iteration horizon they are spread over.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InertiaSchedule {
    pub w_max: f64,
    pub w_min: f64,
    pub max_iterations: usize,
}

impl InertiaSchedule {
    pub fn new(w_max: f64, w_min: f64, max_iterations: usize) -> Self {
        Self {
            w_max,
            w_min,
            max_iterations,
        }
    }

    /// Inertia weight for `iteration` (1-based) given the previous success
    /// ratio.  A non-positive ratio is treated as `1`.
    pub fn weight(&self, iteration: usize, success_ratio: f64) -> f64 {
        let p_s = if success_ratio > 0.0 { success_ratio } else { 1.0 };
        let horizon = self.max_iterations.max(1) as f64;
        let remaining = (horizon - iteration as f64) / horizon;
        let spread = self.w_max - self.w_min;
        spread / p_s + remaining * ((self.w_max - spread) / p_s)
    }
}

/// Fraction of the population that improved its personal best.
///
/// Returns `1.0` when nobody improved (or the population is empty), which
/// restarts the schedule at its nominal value for the next iteration.
pub fn success_ratio(successes: usize, population: usize) -> f64 {
    if successes == 0 || population == 0 {
        return 1.0;
    }
    successes as f64 / population as f64
}

// ── Tests ─────────────────────────────────────────────────────────────────────
