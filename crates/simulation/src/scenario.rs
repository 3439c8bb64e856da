//! Scenario sweeps: baseline vs. variant vs. intervention.
//!
//! Each scenario personalizes the shared immutable pathway its own way and
//! runs an independent driver, so sweeps parallelize without any
//! cross-instance coupling.

use genetics::GeneticProfile;
use pathway::Pathway;
use personalization::{apply_genetics, apply_profile, UserProfile};
use rayon::prelude::*;
use schedule::Schedule;

use crate::config::SimulationConfig;
use crate::driver::SimulationDriver;
use crate::state::Trajectory;
use crate::supplements::{apply_supplements, Supplement};
use crate::Result;

/// One personalization to sweep.
#[derive(Debug, Clone, Default)]
pub struct Scenario {
    pub name: String,
    pub user_profile: Option<UserProfile>,
    pub genetic_profile: Option<GeneticProfile>,
    pub supplements: Vec<Supplement>,
}

impl Scenario {
    pub fn baseline(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_user_profile(mut self, profile: UserProfile) -> Self {
        self.user_profile = Some(profile);
        self
    }

    pub fn with_genetics(mut self, profile: GeneticProfile) -> Self {
        self.genetic_profile = Some(profile);
        self
    }

    pub fn with_supplement(mut self, supplement: Supplement) -> Self {
        self.supplements.push(supplement);
        self
    }
}

#[derive(Debug, Clone)]
pub struct ScenarioResult {
    pub name: String,
    pub trajectory: Trajectory,
}

/// Personalize, build a driver, and run one scenario to completion.
pub fn run_scenario(
    base: &Pathway,
    schedule: &Schedule,
    config: &SimulationConfig,
    scenario: &Scenario,
) -> Result<ScenarioResult> {
    let mut personalized = match &scenario.user_profile {
        Some(profile) => apply_profile(base, profile),
        None => base.clone(),
    };
    if let Some(genetics) = &scenario.genetic_profile {
        personalized = apply_genetics(&personalized, genetics);
    }
    let (personalized, multipliers) = apply_supplements(&personalized, &scenario.supplements);

    let mut driver = SimulationDriver::new(&personalized, schedule.clone(), config.clone())?;
    driver.apply_enzyme_multipliers(&multipliers);
    driver.run();

    Ok(ScenarioResult {
        name: scenario.name.clone(),
        trajectory: driver.into_trajectory(),
    })
}

/// Run scenarios in parallel over the shared pathway and schedule.
///
/// Results come back in scenario order regardless of completion order.
pub fn run_scenarios(
    base: &Pathway,
    schedule: &Schedule,
    config: &SimulationConfig,
    scenarios: &[Scenario],
) -> Result<Vec<ScenarioResult>> {
    scenarios
        .par_iter()
        .map(|scenario| run_scenario(base, schedule, config, scenario))
        .collect()
}
