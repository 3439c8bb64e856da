//! Supplement interventions: declarative pre-run modifications.
//!
//! Substrate, cofactor, and direct additions raise a metabolite's initial
//! concentration; enzyme activation/inhibition scale the enzyme activity
//! multiplier the driver feeds into rate evaluation. Supplements act once at
//! initialization; mid-run dosing goes through the schedule instead.

use std::collections::HashMap;

use pathway::Pathway;
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SupplementKind {
    SubstrateIncrease,
    CofactorIncrease,
    EnzymeActivation,
    EnzymeInhibition,
    DirectMetaboliteAddition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Supplement {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub kind: SupplementKind,
    #[serde(alias = "target_id")]
    pub target_id: String,
    #[serde(alias = "effect_magnitude")]
    pub effect_magnitude: f64,
    #[serde(default)]
    pub mechanism: String,
}

/// Apply supplements to a personalized pathway.
///
/// Returns the adjusted pathway plus enzyme-id -> activity multiplier for
/// activation/inhibition entries. Targets that do not exist in the pathway
/// are skipped with a warning.
pub fn apply_supplements(
    pathway: &Pathway,
    supplements: &[Supplement],
) -> (Pathway, HashMap<String, f64>) {
    let mut out = pathway.clone();
    let mut multipliers: HashMap<String, f64> = HashMap::new();

    for s in supplements {
        match s.kind {
            SupplementKind::SubstrateIncrease
            | SupplementKind::CofactorIncrease
            | SupplementKind::DirectMetaboliteAddition => match out.metabolite(&s.target_id) {
                Some(m) => {
                    let raised = m.initial_concentration + s.effect_magnitude;
                    out = out.with_initial_concentration(&s.target_id, raised);
                }
                None => {
                    warn!(supplement = %s.id, target = %s.target_id, "supplement targets unknown metabolite");
                }
            },
            SupplementKind::EnzymeActivation => {
                if out.enzyme(&s.target_id).is_some() {
                    *multipliers.entry(s.target_id.clone()).or_insert(1.0) *= s.effect_magnitude;
                } else {
                    warn!(supplement = %s.id, target = %s.target_id, "supplement targets unknown enzyme");
                }
            }
            SupplementKind::EnzymeInhibition => {
                if s.effect_magnitude <= 0.0 {
                    warn!(supplement = %s.id, "non-positive inhibition magnitude ignored");
                } else if out.enzyme(&s.target_id).is_some() {
                    *multipliers.entry(s.target_id.clone()).or_insert(1.0) /= s.effect_magnitude;
                } else {
                    warn!(supplement = %s.id, target = %s.target_id, "supplement targets unknown enzyme");
                }
            }
        }
    }

    (out, multipliers)
}
