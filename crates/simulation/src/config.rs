//! Run configuration knobs.

use serde::{Deserialize, Serialize};

use crate::supplements::Supplement;

/// Everything a batch run needs beyond the pathway, profile, and schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationConfig {
    /// Total step time to simulate (s).
    #[serde(alias = "Duration")]
    pub duration: f64,
    /// RK4 step (s).
    #[serde(alias = "TimeStep")]
    pub time_step: f64,
    /// Seconds of step time between emitted snapshots.
    #[serde(alias = "OutputInterval")]
    pub output_interval: f64,
    /// Integrator substeps per driver tick.
    #[serde(default = "default_substeps")]
    pub substeps_per_tick: u32,
    /// Minutes-of-day at t = 0.
    #[serde(default = "default_start_minute")]
    pub start_minute: f64,
    /// How fast the day advances per second of step time in batch mode.
    #[serde(default = "default_minute_rate")]
    pub minutes_per_sim_second: f64,
    /// Path to a raw SNP export, when genetics apply.
    #[serde(alias = "GeneticProfile", default)]
    pub genetic_profile: Option<String>,
    #[serde(alias = "Supplements", default)]
    pub supplements: Vec<Supplement>,
    /// Record per-reaction fluxes into snapshots.
    #[serde(default)]
    pub record_fluxes: bool,
}

fn default_substeps() -> u32 {
    10
}

fn default_start_minute() -> f64 {
    7.0 * 60.0
}

fn default_minute_rate() -> f64 {
    1.0
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            duration: 60.0,
            time_step: 0.01,
            output_interval: 1.0,
            substeps_per_tick: default_substeps(),
            start_minute: default_start_minute(),
            minutes_per_sim_second: default_minute_rate(),
            genetic_profile: None,
            supplements: Vec::new(),
            record_fluxes: false,
        }
    }
}

impl SimulationConfig {
    /// Step time covered by one driver tick (s).
    pub fn tick_seconds(&self) -> f64 {
        self.time_step * f64::from(self.substeps_per_tick)
    }
}
