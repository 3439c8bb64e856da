//! Simulation driver: composes the kinetics, pathway, personalization,
//! integrator, schedule, and homeostasis layers into a per-tick loop.
//!
//! One driver owns one simulation instance. The pathway, enzyme table, and
//! schedule are read-only after construction, so concurrent drivers may
//! share them; state and trajectory buffers belong to exactly one driver.

pub mod config;
pub mod derivative;
pub mod driver;
pub mod export;
pub mod scenario;
pub mod state;
pub mod supplements;

pub use config::SimulationConfig;
pub use driver::{FixedClock, SimulationDriver, TimeSource, WallClock};
pub use scenario::{run_scenarios, Scenario, ScenarioResult};
pub use state::{Snapshot, Trajectory};
pub use supplements::{apply_supplements, Supplement, SupplementKind};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error(transparent)]
    Pathway(#[from] pathway::PathwayError),

    #[error("failed to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, SimulationError>;
