//! Personalization layer: pure transforms from a pathway plus a user profile
//! to a personalized pathway.
//!
//! Nothing here mutates its input. [`apply_profile`] and [`apply_genetics`]
//! rebuild the pathway through structural update, which keeps the baseline
//! network available for diff-based comparison runs.

use std::collections::HashMap;

use genetics::{enzyme_activity_multiplier, GeneticProfile};
use pathway::Pathway;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Biological sex, kept for demographics; no kinetic rule reads it today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sex {
    Female,
    Male,
}

/// Demographics, sleep, and lab values for one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Age in years.
    pub age: f64,
    #[serde(alias = "weight_kg", default)]
    pub weight_kg: f64,
    #[serde(alias = "height_cm", default)]
    pub height_cm: f64,
    pub sex: Sex,
    /// Average nightly sleep (hours).
    #[serde(alias = "sleep_hours")]
    pub sleep_hours: f64,
    /// Subjective sleep quality, 0-100.
    #[serde(alias = "sleep_quality")]
    pub sleep_quality: f64,
    /// Lab name -> measured value (mM after unit conversion upstream).
    #[serde(default)]
    pub labs: HashMap<String, f64>,
}

impl Default for UserProfile {
    /// The neutral profile: applying it changes nothing.
    fn default() -> Self {
        Self {
            age: 30.0,
            weight_kg: 70.0,
            height_cm: 170.0,
            sex: Sex::Female,
            sleep_hours: 8.0,
            sleep_quality: 100.0,
            labs: HashMap::new(),
        }
    }
}

impl UserProfile {
    /// Short sleep or low quality: drives ROS and NAMPT adjustments.
    pub fn poor_sleep(&self) -> bool {
        self.sleep_hours < 6.0 || self.sleep_quality < 70.0
    }
}

/// Metabolite ids addressable through lab overrides.
const LAB_METABOLITES: &[(&str, &str)] = &[
    ("glucose", "glucose_blood"),
    ("homocysteine", "hcy"),
    ("cortisol", "cortisol"),
    ("vitamin_b12", "b12"),
];

fn lab_metabolite_id(lab: &str) -> Option<&'static str> {
    LAB_METABOLITES
        .iter()
        .find(|(name, _)| *name == lab)
        .map(|(_, id)| *id)
}

/// NAD+ availability falls roughly 1.5% per year past 30.
fn nad_decline_factor(age: f64) -> f64 {
    (1.0 - (age - 30.0).max(0.0) * 0.015).max(0.0)
}

/// Baseline oxidative load rises with age and degrades with poor sleep.
fn oxidative_stress_multiplier(age: f64, poor_sleep: bool) -> f64 {
    let age_term = 1.0 + (age - 40.0).max(0.0) * 0.02;
    if poor_sleep {
        age_term * 1.2
    } else {
        age_term
    }
}

/// Rewrite initial concentrations and enzyme Vmax from demographics, sleep,
/// and lab overrides. Returns a new pathway; the input is untouched.
///
/// All age terms anchor at the age-30 baseline so the neutral profile
/// (age 30, 8 h sleep, quality 100, no labs) is the identity.
pub fn apply_profile(pathway: &Pathway, profile: &UserProfile) -> Pathway {
    let poor_sleep = profile.poor_sleep();

    let mut out = pathway
        .with_initial_scaled("nad", nad_decline_factor(profile.age))
        .with_initial_scaled("ros", oxidative_stress_multiplier(profile.age, poor_sleep));

    if profile.sleep_hours < 6.0 || profile.sleep_quality < 60.0 {
        out = out.with_initial_scaled("cortisol", 1.5);
    }

    // CD38 consumes NAD+ faster with age; complex I output declines.
    out = out.with_vmax_scaled("cd38", 1.0 + (profile.age - 30.0).max(0.0) / 60.0);
    out = out.with_vmax_scaled(
        "etc_complex1",
        (1.0 - (profile.age - 30.0).max(0.0) * 0.01).max(0.5),
    );

    if poor_sleep {
        out = out.with_vmax_scaled("nampt", 0.7);
    }
    if profile.sleep_quality < 60.0 {
        out = out.with_vmax_scaled("cps1", 0.8).with_vmax_scaled("otc", 0.8);
    }

    for (lab, value) in &profile.labs {
        match lab_metabolite_id(lab) {
            Some(id) if pathway.metabolite(id).is_some() => {
                out = out.with_initial_concentration(id, *value);
            }
            Some(id) => {
                warn!(lab = %lab, metabolite = id, "lab override targets metabolite not in pathway");
            }
            None => {
                warn!(lab = %lab, "unrecognized lab name, override skipped");
            }
        }
    }

    out
}

/// Scale every enzyme's Vmax by its composite genetic multiplier.
///
/// An empty genotype map is the identity; modifiers on one enzyme compose
/// multiplicatively (see `genetics::enzyme_activity_multiplier`).
pub fn apply_genetics(pathway: &Pathway, profile: &GeneticProfile) -> Pathway {
    let mut out = pathway.clone();
    for enzyme in &mut out.enzymes {
        let multiplier = enzyme_activity_multiplier(enzyme, profile);
        if multiplier != 1.0 {
            *enzyme = enzyme.with_vmax_scaled(multiplier);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use pathway::{Enzyme, GeneticModifier, Metabolite, StrandOrientation};

    fn metabolite(id: &str, conc: f64) -> Metabolite {
        Metabolite {
            id: id.to_string(),
            name: id.to_string(),
            initial_concentration: conc,
            compartment: String::new(),
        }
    }

    fn enzyme(id: &str, vmax: f64) -> Enzyme {
        Enzyme {
            id: id.to_string(),
            name: id.to_string(),
            ec_number: String::new(),
            vmax,
            km: 0.1,
            cofactors: vec![],
            genetic_modifiers: vec![],
        }
    }

    fn sample_pathway() -> Pathway {
        Pathway::build(
            "p",
            "sample",
            "",
            vec![
                metabolite("nad", 1.0),
                metabolite("ros", 0.01),
                metabolite("cortisol", 0.4),
                metabolite("glucose_blood", 5.0),
            ],
            vec![
                enzyme("cd38", 0.2),
                enzyme("etc_complex1", 1.0),
                enzyme("nampt", 0.5),
                enzyme("cps1", 0.3),
                enzyme("otc", 0.3),
            ],
            vec![],
        )
        .unwrap()
    }

    #[test]
    fn neutral_profile_is_identity() {
        let p = sample_pathway();
        let out = apply_profile(&p, &UserProfile::default());
        assert_eq!(p, out);
    }

    #[test]
    fn empty_genotype_map_is_identity() {
        let p = sample_pathway();
        let out = apply_genetics(&p, &GeneticProfile::empty());
        assert_eq!(p, out);
    }

    #[test]
    fn aging_scales_nad_and_enzymes() {
        let p = sample_pathway();
        let profile = UserProfile {
            age: 50.0,
            ..UserProfile::default()
        };
        let out = apply_profile(&p, &profile);

        // 1 - 20 * 0.015 = 0.70
        assert_relative_eq!(
            out.metabolite("nad").unwrap().initial_concentration,
            0.70,
            epsilon = 1e-12
        );
        // 1 + 10 * 0.02 = 1.2, no sleep penalty
        assert_relative_eq!(
            out.metabolite("ros").unwrap().initial_concentration,
            0.012,
            epsilon = 1e-12
        );
        // cd38: 1 + 20/60
        assert_relative_eq!(out.enzyme("cd38").unwrap().vmax, 0.2 * (1.0 + 20.0 / 60.0));
        // complex I: 1 - 20 * 0.01 = 0.8
        assert_relative_eq!(out.enzyme("etc_complex1").unwrap().vmax, 0.8);
        // cortisol untouched with good sleep
        assert_relative_eq!(out.metabolite("cortisol").unwrap().initial_concentration, 0.4);
    }

    #[test]
    fn complex1_decline_floors_at_half() {
        let p = sample_pathway();
        let profile = UserProfile {
            age: 95.0,
            ..UserProfile::default()
        };
        let out = apply_profile(&p, &profile);
        assert_relative_eq!(out.enzyme("etc_complex1").unwrap().vmax, 0.5);
    }

    #[test]
    fn poor_sleep_raises_ros_and_cortisol_and_slows_nampt() {
        let p = sample_pathway();
        let profile = UserProfile {
            sleep_hours: 5.0,
            sleep_quality: 50.0,
            ..UserProfile::default()
        };
        let out = apply_profile(&p, &profile);

        assert_relative_eq!(
            out.metabolite("ros").unwrap().initial_concentration,
            0.012,
            epsilon = 1e-12
        );
        assert_relative_eq!(
            out.metabolite("cortisol").unwrap().initial_concentration,
            0.6,
            epsilon = 1e-12
        );
        assert_relative_eq!(out.enzyme("nampt").unwrap().vmax, 0.35);
        assert_relative_eq!(out.enzyme("cps1").unwrap().vmax, 0.24);
        assert_relative_eq!(out.enzyme("otc").unwrap().vmax, 0.24);
    }

    #[test]
    fn lab_override_replaces_initial_concentration() {
        let p = sample_pathway();
        let mut profile = UserProfile::default();
        profile.labs.insert("glucose".to_string(), 6.2);
        profile.labs.insert("unknown_marker".to_string(), 1.0);

        let out = apply_profile(&p, &profile);
        assert_relative_eq!(
            out.metabolite("glucose_blood").unwrap().initial_concentration,
            6.2
        );
    }

    #[test]
    fn genetics_scales_vmax_through_modifiers() {
        let mut p = sample_pathway();
        p.enzymes.push(Enzyme {
            id: "mthfr".to_string(),
            name: "MTHFR".to_string(),
            ec_number: String::new(),
            vmax: 0.5,
            km: 0.05,
            cofactors: vec![],
            genetic_modifiers: vec![GeneticModifier {
                rs_id: "rs1801133".to_string(),
                gene_name: "MTHFR".to_string(),
                risk_allele: "A".to_string(),
                orientation: StrandOrientation::Minus,
                homozygous_effect: 0.3,
                heterozygous_effect: 0.65,
                description: String::new(),
            }],
        });

        let genotypes = GeneticProfile::empty().with_genotype("rs1801133", "TT");
        let out = apply_genetics(&p, &genotypes);
        assert_relative_eq!(out.enzyme("mthfr").unwrap().vmax, 0.15, epsilon = 1e-12);
        // untouched enzymes keep their Vmax
        assert_relative_eq!(out.enzyme("nampt").unwrap().vmax, 0.5);
    }
}
