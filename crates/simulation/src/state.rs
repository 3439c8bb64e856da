//! Trajectory snapshots: the read interface consumers see.

use std::collections::BTreeMap;

use ndarray::Array1;
use pathway::CompiledPathway;
use serde::{Deserialize, Serialize};

/// Point-in-time view of the simulation.
///
/// Concentration maps use ordered keys so serialized snapshots are stable
/// across runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Seconds of step time since simulation start.
    pub time_s: f64,
    /// Metabolite id -> concentration (mM).
    pub concentrations: BTreeMap<String, f64>,
    /// Reaction id -> instantaneous rate (mM/s), when flux recording is on.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fluxes: Option<BTreeMap<String, f64>>,
}

impl Snapshot {
    pub fn from_state(
        compiled: &CompiledPathway,
        time_s: f64,
        y: &Array1<f64>,
        fluxes: Option<Vec<f64>>,
    ) -> Self {
        let concentrations = compiled
            .metabolite_ids()
            .iter()
            .zip(y.iter())
            .map(|(id, v)| (id.clone(), *v))
            .collect();
        let fluxes = fluxes.map(|rates| {
            compiled
                .reactions()
                .iter()
                .zip(rates)
                .map(|(r, v)| (r.id.clone(), v))
                .collect()
        });
        Self {
            time_s,
            concentrations,
            fluxes,
        }
    }

    /// Concentration for `id`, `None` when the metabolite is not tracked.
    pub fn concentration(&self, id: &str) -> Option<f64> {
        self.concentrations.get(id).copied()
    }

    /// Concentration for `id`, 0 when absent. Use [`Snapshot::concentration`]
    /// to distinguish "absent" from "present at zero".
    pub fn concentration_or_zero(&self, id: &str) -> f64 {
        self.concentration(id).unwrap_or(0.0)
    }
}

/// Ordered sample history with strictly increasing time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    snapshots: Vec<Snapshot>,
}

impl Trajectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a snapshot. Samples that do not advance time are dropped,
    /// preserving the strictly-increasing invariant.
    pub fn push(&mut self, snapshot: Snapshot) {
        if let Some(last) = self.snapshots.last() {
            if snapshot.time_s <= last.time_s {
                return;
            }
        }
        self.snapshots.push(snapshot);
    }

    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn first(&self) -> Option<&Snapshot> {
        self.snapshots.first()
    }

    pub fn last(&self) -> Option<&Snapshot> {
        self.snapshots.last()
    }
}
