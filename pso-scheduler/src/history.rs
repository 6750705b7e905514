/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Tab-separated export of fitness histories: one line per candidate, one
//! column per iteration.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

/// Renders `histories` as TSV text.
pub fn to_tsv(histories: &[Vec<f64>]) -> String {
    let mut out = String::new();
    for history in histories {
        for (i, value) in history.iter().enumerate() {
            if i > 0 {
                out.push('\t');
            }
            out.push_str(&value.to_string());
        }
        out.push('\n');
    }
    out
}

/// Writes `histories` to `path` as TSV, replacing any existing file.
pub fn write_tsv(path: &Path, histories: &[Vec<f64>]) -> Result<()> {
    std::fs::write(path, to_tsv(histories))
        .with_context(|| format!("Cannot write fitness history: {}", path.display()))?;
    info!(
        path = %path.display(),
        candidates = histories.len(),
        "fitness history written"
    );
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
