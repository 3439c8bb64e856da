//! Trajectory export: CSV and newline-delimited JSON.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use crate::state::Trajectory;
use crate::{Result, SimulationError};

/// Render a trajectory as CSV.
///
/// Header is `Time` followed by metabolite ids in pathway declaration order;
/// rows ascend in time. Metabolites absent from a snapshot are written as 0.
pub fn trajectory_to_csv(trajectory: &Trajectory, metabolite_ids: &[String]) -> String {
    let mut out = String::new();
    out.push_str("Time");
    for id in metabolite_ids {
        out.push(',');
        out.push_str(id);
    }
    out.push('\n');

    for snapshot in trajectory.snapshots() {
        let _ = write!(out, "{:.6}", snapshot.time_s);
        for id in metabolite_ids {
            let _ = write!(out, ",{:.6}", snapshot.concentration_or_zero(id));
        }
        out.push('\n');
    }
    out
}

pub fn write_csv(path: &Path, trajectory: &Trajectory, metabolite_ids: &[String]) -> Result<()> {
    fs::write(path, trajectory_to_csv(trajectory, metabolite_ids)).map_err(|source| {
        SimulationError::Io {
            path: path.display().to_string(),
            source,
        }
    })
}

/// One JSON snapshot per line, for streaming consumers.
pub fn trajectory_to_ndjson(trajectory: &Trajectory) -> String {
    trajectory
        .snapshots()
        .iter()
        .filter_map(|s| serde_json::to_string(s).ok())
        .map(|line| line + "\n")
        .collect()
}

pub fn write_ndjson(path: &Path, trajectory: &Trajectory) -> Result<()> {
    fs::write(path, trajectory_to_ndjson(trajectory)).map_err(|source| SimulationError::Io {
        path: path.display().to_string(),
        source,
    })
}
