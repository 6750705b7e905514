/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Named problem instances.
//!
//! A [`ScenarioRegistry`] maps a name to a builder closure that draws a
//! workload and a resource pool from the run's generator.  Names are resolved
//! when the run is configured; an unknown name is an error that lists the
//! valid ones.
//!
//! | name | VMs | tasks |
//! |---|---|---|
//! | `single` | 1 × rate 100 | 1 × work 10 |
//! | `pair` | rates 50, 100 | 1 × work 10 |
//! | `one-fast` | 36: one at 100, the rest at 50 | 1 × work 10 |
//! | `uniform-vms` | 36 × rate U[20,100) | 1 × work 10 |
//! | `small-batch` | 36 × rate U[20,100) | 5 × work 10 |
//! | `random-small-batch` | 36 × rate U[20,100) | 5 × work U[5,20) |
//! | `mixed-batch` | 36 × rate U[20,100) | 100 × work U[5,20) |
//! | `large-batch` | 36 × rate U[20,100) | 500 × work U[5,20) |
//! | `graded` | 36 × rate 50, 70, …, 750 | 500 × work U[5,20) |
//! | `paper` | 100 × rate U[1000,5000) | 800 × work U[1000,4000) |
//! | `paper-energy` | as `paper`, active energy U[200,1000) | 800 × work U[1000,4000) |
//!
//! `one-fast` pins the fast VM at id 0 among 36 so its expected mapping is
//! known; draw a random position with a custom scenario if that matters.

use std::collections::BTreeMap;
use std::fmt;

use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::error::SwarmError;
use crate::resource::{ResourcePool, VmSpec};
use crate::task::Workload;

/// Builds one problem instance from the run's generator.
pub type ScenarioBuilder =
    Box<dyn Fn(&mut ChaCha8Rng) -> Result<(Workload, ResourcePool), SwarmError> + Send + Sync>;

struct Scenario {
    description: String,
    builder: ScenarioBuilder,
}

#[derive(Default)]
pub struct ScenarioRegistry {
    scenarios: BTreeMap<String, Scenario>,
}

impl ScenarioRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `builder` under `name`, replacing any previous entry.
    pub fn register<F>(&mut self, name: &str, description: &str, builder: F)
    where
        F: Fn(&mut ChaCha8Rng) -> Result<(Workload, ResourcePool), SwarmError>
            + Send
            + Sync
            + 'static,
    {
        self.scenarios.insert(
            name.to_string(),
            Scenario {
                description: description.to_string(),
                builder: Box::new(builder),
            },
        );
    }

    /// Registry holding the reference scenarios.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();

        registry.register("single", "1 VM (rate 100), 1 task (work 10)", |_| {
            Ok((fixed_workload(1, 10), fixed_pool(&[100])))
        });
        registry.register("pair", "2 VMs (rates 50, 100), 1 task (work 10)", |_| {
            Ok((fixed_workload(1, 10), fixed_pool(&[50, 100])))
        });
        registry.register(
            "one-fast",
            "36 VMs, one at rate 100 and 35 at rate 50, 1 task (work 10)",
            |_| {
                let mut rates = vec![50; 36];
                rates[0] = 100;
                Ok((fixed_workload(1, 10), fixed_pool(&rates)))
            },
        );
        registry.register("uniform-vms", "36 VMs rate U[20,100), 1 task (work 10)", |rng| {
            let pool = random_pool(rng, 36, 20, 100);
            Ok((fixed_workload(1, 10), pool))
        });
        registry.register("small-batch", "36 VMs rate U[20,100), 5 tasks (work 10)", |rng| {
            let pool = random_pool(rng, 36, 20, 100);
            Ok((fixed_workload(5, 10), pool))
        });
        registry.register(
            "random-small-batch",
            "36 VMs rate U[20,100), 5 tasks work U[5,20)",
            |rng| {
                let pool = random_pool(rng, 36, 20, 100);
                Ok((random_workload(rng, 5, 5, 20), pool))
            },
        );
        registry.register(
            "mixed-batch",
            "36 VMs rate U[20,100), 100 tasks work U[5,20)",
            |rng| {
                let pool = random_pool(rng, 36, 20, 100);
                Ok((random_workload(rng, 100, 5, 20), pool))
            },
        );
        registry.register(
            "large-batch",
            "36 VMs rate U[20,100), 500 tasks work U[5,20)",
            |rng| {
                let pool = random_pool(rng, 36, 20, 100);
                Ok((random_workload(rng, 500, 5, 20), pool))
            },
        );
        registry.register(
            "graded",
            "36 VMs rate 50, 70, ..., 750, 500 tasks work U[5,20)",
            |rng| {
                let rates: Vec<u64> = (0..36).map(|i| 50 + 20 * i).collect();
                Ok((random_workload(rng, 500, 5, 20), fixed_pool(&rates)))
            },
        );
        registry.register(
            "paper",
            "100 VMs rate U[1000,5000), 800 tasks work U[1000,4000)",
            |rng| {
                let pool = random_pool(rng, 100, 1000, 5000);
                Ok((random_workload(rng, 800, 1000, 4000), pool))
            },
        );
        registry.register(
            "paper-energy",
            "as 'paper', with active energy U[200,1000) per VM",
            |rng| {
                let specs: Vec<VmSpec> = (0..100)
                    .map(|_| {
                        let rate = rng.random_range(1000..5000);
                        let energy = rng.random_range(200..1000);
                        VmSpec::new(rate).with_active_energy(energy as f64)
                    })
                    .collect();
                let pool = ResourcePool::analytic(specs);
                Ok((random_workload(rng, 800, 1000, 4000), pool))
            },
        );

        registry
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.scenarios.keys().map(String::as_str).collect()
    }

    /// `(name, description)` pairs, sorted by name.
    pub fn descriptions(&self) -> impl Iterator<Item = (&str, &str)> {
        self.scenarios
            .iter()
            .map(|(name, s)| (name.as_str(), s.description.as_str()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.scenarios.contains_key(name)
    }

    /// Builds scenario `name`.
    ///
    /// # Errors
    /// [`SwarmError::UnknownScenario`] if `name` is not registered, or
    /// whatever the builder returns.
    pub fn build(
        &self,
        name: &str,
        rng: &mut ChaCha8Rng,
    ) -> Result<(Workload, ResourcePool), SwarmError> {
        let scenario = self
            .scenarios
            .get(name)
            .ok_or_else(|| SwarmError::UnknownScenario {
                name: name.to_string(),
                valid: self.names().join(", "),
            })?;
        (scenario.builder)(rng)
    }
}

impl fmt::Debug for ScenarioRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScenarioRegistry")
            .field("scenarios", &self.names())
            .finish()
    }
}

// ── Factories ─────────────────────────────────────────────────────────────────

/// `count` tasks of work `U[min_work, max_work)` (`min_work` when the bounds
/// are equal).
pub fn random_workload(rng: &mut ChaCha8Rng, count: usize, min_work: u64, max_work: u64) -> Workload {
    Workload::from_work_sizes((0..count).map(|_| draw(rng, min_work, max_work)))
}

/// `count` VMs of rate `U[min_rate, max_rate)` with default energy rates.
pub fn random_pool(rng: &mut ChaCha8Rng, count: usize, min_rate: u64, max_rate: u64) -> ResourcePool {
    let specs: Vec<VmSpec> = (0..count)
        .map(|_| VmSpec::new(draw(rng, min_rate, max_rate)))
        .collect();
    ResourcePool::analytic(specs)
}

fn draw(rng: &mut ChaCha8Rng, lo: u64, hi: u64) -> u64 {
    if lo < hi {
        rng.random_range(lo..hi)
    } else {
        lo
    }
}

fn fixed_workload(count: usize, work: u64) -> Workload {
    Workload::from_work_sizes(std::iter::repeat(work).take(count))
}

fn fixed_pool(rates: &[u64]) -> ResourcePool {
    ResourcePool::analytic(rates.iter().map(|&rate| VmSpec::new(rate)))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
