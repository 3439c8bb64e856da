//! Homeostatic clamping of vital metabolites.
//!
//! The pathway network does not represent everything that keeps a body in
//! range: endocrine loops, breathing, glycogen stores, nucleotide salvage.
//! This crate models their aggregate effect as a table of named rules
//! applied after each integration substep. The table is data, not branches:
//! rules can be disabled individually to test the pure network.
//!
//! Rules come in two kinds. `Projection` rules are triggered corrections
//! that move the state onto a bound and are idempotent at a given state.
//! `Relaxation` rules are always-on dt-driven flows (oxygen resupply,
//! insulin decay, ROS clearance) that approach a target over time.

use std::collections::HashSet;

use ndarray::Array1;
use pathway::CompiledPathway;

/// Physiological glucose envelope (mM).
const GLUCOSE_FLOOR: f64 = 4.5;
const GLUCOSE_CEILING: f64 = 5.3;
/// Grams of glycogen spent per mM of blood glucose restored.
const GLYCOGEN_G_PER_MM: f64 = 5.0;
/// Grams of adipose spent per mM of glucose made de novo.
const ADIPOSE_G_PER_MM: f64 = 20.0;
const GLYCOGEN_CAPACITY_G: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    Projection,
    Relaxation,
}

/// One clamp rule: a name for toggling and an action over the state vector.
pub struct ClampRule {
    pub name: &'static str,
    pub kind: RuleKind,
    apply: fn(&Homeostat, &mut Array1<f64>, f64),
}

/// State-vector indices of the metabolites the rules read and write.
///
/// Every index is optional: a pathway that does not track a species simply
/// skips the rules that need it.
#[derive(Debug, Clone, Default)]
pub struct VitalIndices {
    pub glucose_blood: Option<usize>,
    pub glycogen_liver: Option<usize>,
    pub adipose: Option<usize>,
    pub fatty_acids_blood: Option<usize>,
    pub atp: Option<usize>,
    pub adp: Option<usize>,
    pub o2: Option<usize>,
    pub nad: Option<usize>,
    pub nadh: Option<usize>,
    pub met: Option<usize>,
    pub amino_pool: Option<usize>,
    pub insulin: Option<usize>,
    pub cortisol: Option<usize>,
    pub ros: Option<usize>,
    pub acetyl_coa: Option<usize>,
    pub prpp: Option<usize>,
    pub coa: Option<usize>,
    pub citrate: Option<usize>,
    pub succinate: Option<usize>,
    pub malate: Option<usize>,
    pub pyruvate: Option<usize>,
}

impl VitalIndices {
    pub fn resolve(compiled: &CompiledPathway) -> Self {
        let ix = |id: &str| compiled.metabolite_index(id);
        Self {
            glucose_blood: ix("glucose_blood"),
            glycogen_liver: ix("glycogen_liver"),
            adipose: ix("adipose"),
            fatty_acids_blood: ix("fatty_acids_blood"),
            atp: ix("atp"),
            adp: ix("adp"),
            o2: ix("o2"),
            nad: ix("nad"),
            nadh: ix("nadh"),
            met: ix("met"),
            amino_pool: ix("amino_pool"),
            insulin: ix("insulin"),
            cortisol: ix("cortisol"),
            ros: ix("ros"),
            acetyl_coa: ix("acetyl_coa"),
            prpp: ix("prpp"),
            coa: ix("coa"),
            citrate: ix("citrate"),
            succinate: ix("succinate"),
            malate: ix("malate"),
            pyruvate: ix("pyruvate"),
        }
    }
}

/// The clamp: vital indices, the rule table, and per-rule toggles.
pub struct Homeostat {
    pub idx: VitalIndices,
    /// Insulin resting level the decay rule relaxes toward.
    pub insulin_baseline: f64,
    rules: Vec<ClampRule>,
    disabled: HashSet<&'static str>,
}

impl Homeostat {
    pub fn new(compiled: &CompiledPathway) -> Self {
        Self::with_indices(VitalIndices::resolve(compiled))
    }

    pub fn with_indices(idx: VitalIndices) -> Self {
        Self {
            idx,
            insulin_baseline: 1.0,
            rules: rule_table(),
            disabled: HashSet::new(),
        }
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name).collect()
    }

    pub fn set_rule_enabled(&mut self, name: &'static str, enabled: bool) {
        if enabled {
            self.disabled.remove(name);
        } else {
            self.disabled.insert(name);
        }
    }

    /// Disable every dt-driven relaxation rule, leaving only the idempotent
    /// projections active.
    pub fn disable_relaxation_rules(&mut self) {
        let names: Vec<&'static str> = self
            .rules
            .iter()
            .filter(|r| r.kind == RuleKind::Relaxation)
            .map(|r| r.name)
            .collect();
        for name in names {
            self.disabled.insert(name);
        }
    }

    /// Apply all enabled rules in table order.
    pub fn apply(&self, y: &mut Array1<f64>, dt: f64) {
        for rule in &self.rules {
            if !self.disabled.contains(rule.name) {
                (rule.apply)(self, y, dt);
            }
        }
    }
}

fn rule_table() -> Vec<ClampRule> {
    vec![
        ClampRule { name: "glucose_floor", kind: RuleKind::Projection, apply: glucose_floor },
        ClampRule { name: "gluconeogenesis", kind: RuleKind::Projection, apply: gluconeogenesis },
        ClampRule { name: "glucose_storage", kind: RuleKind::Projection, apply: glucose_storage },
        ClampRule { name: "atp_floor", kind: RuleKind::Projection, apply: atp_floor },
        ClampRule { name: "adenine_pool", kind: RuleKind::Projection, apply: adenine_pool },
        ClampRule { name: "atp_ceiling", kind: RuleKind::Projection, apply: atp_ceiling },
        ClampRule { name: "o2_resupply", kind: RuleKind::Relaxation, apply: o2_resupply },
        ClampRule { name: "nad_floor", kind: RuleKind::Projection, apply: nad_floor },
        ClampRule { name: "amino_release", kind: RuleKind::Relaxation, apply: amino_release },
        ClampRule { name: "insulin_decay", kind: RuleKind::Relaxation, apply: insulin_decay },
        ClampRule { name: "cortisol_bounds", kind: RuleKind::Projection, apply: cortisol_bounds },
        ClampRule { name: "ros_clearance", kind: RuleKind::Relaxation, apply: ros_clearance },
        ClampRule { name: "acetyl_coa_floor", kind: RuleKind::Relaxation, apply: acetyl_coa_floor },
        ClampRule { name: "cofactor_floors", kind: RuleKind::Relaxation, apply: cofactor_floors },
        ClampRule { name: "accumulation_caps", kind: RuleKind::Projection, apply: accumulation_caps },
    ]
}

/// Below the glucose floor, release liver glycogen at 5 g per mM needed.
fn glucose_floor(h: &Homeostat, y: &mut Array1<f64>, _dt: f64) {
    let (Some(gi), Some(si)) = (h.idx.glucose_blood, h.idx.glycogen_liver) else {
        return;
    };
    if y[gi] >= GLUCOSE_FLOOR || y[si] <= 0.0 {
        return;
    }
    let needed_g = (GLUCOSE_FLOOR - y[gi]) * GLYCOGEN_G_PER_MM;
    let released_g = needed_g.min(y[si]);
    y[gi] += released_g / GLYCOGEN_G_PER_MM;
    y[si] -= released_g;
}

/// Glycogen exhausted and still below the floor: make glucose from adipose.
fn gluconeogenesis(h: &Homeostat, y: &mut Array1<f64>, _dt: f64) {
    let (Some(gi), Some(si), Some(ai)) =
        (h.idx.glucose_blood, h.idx.glycogen_liver, h.idx.adipose)
    else {
        return;
    };
    if y[gi] >= GLUCOSE_FLOOR || y[si] > 0.0 || y[ai] <= 0.0 {
        return;
    }
    let needed_g = (GLUCOSE_FLOOR - y[gi]) * ADIPOSE_G_PER_MM;
    let burned_g = needed_g.min(y[ai]);
    y[gi] = (y[gi] + burned_g / ADIPOSE_G_PER_MM).min(GLUCOSE_FLOOR);
    y[ai] -= burned_g;
    if let Some(fi) = h.idx.fatty_acids_blood {
        // Lipolysis spills fatty acids into circulation.
        y[fi] += burned_g * 0.01;
    }
}

/// Above the ceiling, store the insulin-scaled fraction of the excess as
/// glycogen, up to store capacity.
fn glucose_storage(h: &Homeostat, y: &mut Array1<f64>, _dt: f64) {
    let (Some(gi), Some(si)) = (h.idx.glucose_blood, h.idx.glycogen_liver) else {
        return;
    };
    if y[gi] <= GLUCOSE_CEILING || y[si] >= GLYCOGEN_CAPACITY_G {
        return;
    }
    let insulin = h.idx.insulin.map_or(1.0, |ii| y[ii]);
    let fraction = (insulin / 3.0).min(1.0).max(0.0);
    let stored_mm = (y[gi] - GLUCOSE_CEILING) * fraction;
    let stored_g = (stored_mm * GLYCOGEN_G_PER_MM).min(GLYCOGEN_CAPACITY_G - y[si]);
    y[gi] -= stored_g / GLYCOGEN_G_PER_MM;
    y[si] += stored_g;
}

/// Regenerate ATP from ADP when ATP drops below 4 mM, paying in glucose.
fn atp_floor(h: &Homeostat, y: &mut Array1<f64>, _dt: f64) {
    let (Some(ti), Some(di)) = (h.idx.atp, h.idx.adp) else {
        return;
    };
    if y[ti] >= 4.0 {
        return;
    }
    let deficit = 4.0 - y[ti];
    let converted = deficit.min(y[di] * 0.8);
    y[ti] += converted;
    y[di] -= converted;
    if let Some(gi) = h.idx.glucose_blood {
        y[gi] = (y[gi] - 0.1 * converted).max(0.0);
    }
}

/// Keep the adenine nucleotide pool from draining: below 5 mM total, reset
/// to 5.5 mM split 80/20 ATP/ADP.
fn adenine_pool(h: &Homeostat, y: &mut Array1<f64>, _dt: f64) {
    let (Some(ti), Some(di)) = (h.idx.atp, h.idx.adp) else {
        return;
    };
    if y[ti] + y[di] >= 5.0 {
        return;
    }
    y[ti] = 5.5 * 0.8;
    y[di] = 5.5 * 0.2;
}

/// Excess ATP above 6 mM shifts to ADP.
fn atp_ceiling(h: &Homeostat, y: &mut Array1<f64>, _dt: f64) {
    let (Some(ti), Some(di)) = (h.idx.atp, h.idx.adp) else {
        return;
    };
    if y[ti] <= 6.0 {
        return;
    }
    let excess = y[ti] - 6.0;
    y[ti] = 6.0;
    y[di] += excess;
}

/// Breathing: dissolved O2 relaxes toward 0.13 mM.
fn o2_resupply(h: &Homeostat, y: &mut Array1<f64>, dt: f64) {
    let Some(oi) = h.idx.o2 else { return };
    y[oi] += (0.13 - y[oi]) * 0.5 * dt;
}

/// The NAD pool never collapses entirely; salvage keeps minimum levels.
fn nad_floor(h: &Homeostat, y: &mut Array1<f64>, _dt: f64) {
    let (Some(ni), Some(hi)) = (h.idx.nad, h.idx.nadh) else {
        return;
    };
    if y[ni] + y[hi] >= 1.0 {
        return;
    }
    y[ni] = y[ni].max(0.5);
    y[hi] = y[hi].max(0.3);
}

/// Protein turnover releases methionine from the amino pool when free
/// methionine is nearly exhausted.
fn amino_release(h: &Homeostat, y: &mut Array1<f64>, dt: f64) {
    let (Some(mi), Some(pi)) = (h.idx.met, h.idx.amino_pool) else {
        return;
    };
    if y[mi] >= 0.01 || y[pi] <= 0.0 {
        return;
    }
    let released_g = (0.001 * dt / 60.0).min(y[pi]);
    y[pi] -= released_g;
    y[mi] += released_g * 0.1;
}

/// First-order insulin return to baseline.
fn insulin_decay(h: &Homeostat, y: &mut Array1<f64>, dt: f64) {
    let Some(ii) = h.idx.insulin else { return };
    let base = h.insulin_baseline;
    y[ii] = base + (y[ii] - base) * (-0.05 * dt).exp();
}

/// Cortisol stays inside its physiological band.
fn cortisol_bounds(h: &Homeostat, y: &mut Array1<f64>, _dt: f64) {
    let Some(ci) = h.idx.cortisol else { return };
    y[ci] = y[ci].clamp(0.05, 1.5);
}

/// Antioxidant systems clear ROS at a constant rate.
fn ros_clearance(h: &Homeostat, y: &mut Array1<f64>, dt: f64) {
    let Some(ri) = h.idx.ros else { return };
    if y[ri] > 0.001 {
        y[ri] = (y[ri] - 0.01 * dt).max(0.0);
    }
}

/// Beta-oxidation keeps acetyl-CoA from bottoming out, at adipose expense.
fn acetyl_coa_floor(h: &Homeostat, y: &mut Array1<f64>, dt: f64) {
    let Some(ai) = h.idx.acetyl_coa else { return };
    if y[ai] >= 0.05 {
        return;
    }
    y[ai] += 0.01 * dt;
    if let Some(fi) = h.idx.adipose {
        y[fi] = (y[fi] - 0.5 * dt).max(0.0);
    }
}

/// Slow drip keeping PRPP and CoA synthesis ahead of consumption.
fn cofactor_floors(h: &Homeostat, y: &mut Array1<f64>, dt: f64) {
    if let Some(pi) = h.idx.prpp {
        if y[pi] < 0.05 {
            y[pi] += 0.02 * dt;
        }
    }
    if let Some(ci) = h.idx.coa {
        if y[ci] < 0.2 {
            y[ci] += 0.02 * dt;
        }
    }
}

/// TCA intermediates and pyruvate cannot pile up without bound.
fn accumulation_caps(h: &Homeostat, y: &mut Array1<f64>, _dt: f64) {
    for idx in [h.idx.citrate, h.idx.succinate, h.idx.malate] {
        if let Some(i) = idx {
            y[i] = y[i].min(2.0);
        }
    }
    if let Some(i) = h.idx.pyruvate {
        y[i] = y[i].min(1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Indices over a dense test vector covering every vital metabolite.
    fn dense_indices() -> VitalIndices {
        VitalIndices {
            glucose_blood: Some(0),
            glycogen_liver: Some(1),
            adipose: Some(2),
            fatty_acids_blood: Some(3),
            atp: Some(4),
            adp: Some(5),
            o2: Some(6),
            nad: Some(7),
            nadh: Some(8),
            met: Some(9),
            amino_pool: Some(10),
            insulin: Some(11),
            cortisol: Some(12),
            ros: Some(13),
            acetyl_coa: Some(14),
            prpp: Some(15),
            coa: Some(16),
            citrate: Some(17),
            succinate: Some(18),
            malate: Some(19),
            pyruvate: Some(20),
        }
    }

    /// A state comfortably inside every envelope.
    fn healthy_state() -> Array1<f64> {
        ndarray::arr1(&[
            5.0,  // glucose_blood
            50.0, // glycogen_liver
            500.0, // adipose
            0.3,  // fatty_acids_blood
            5.0,  // atp
            0.5,  // adp
            0.13, // o2
            0.8,  // nad
            0.4,  // nadh
            0.03, // met
            10.0, // amino_pool
            1.0,  // insulin (at baseline)
            0.5,  // cortisol
            0.0,  // ros
            0.1,  // acetyl_coa
            0.1,  // prpp
            0.3,  // coa
            0.5,  // citrate
            0.5,  // succinate
            0.5,  // malate
            0.2,  // pyruvate
        ])
    }

    #[test]
    fn healthy_state_is_a_fixed_point() {
        let h = Homeostat::with_indices(dense_indices());
        let mut y = healthy_state();
        let before = y.clone();
        h.apply(&mut y, 0.01);
        for (a, b) in before.iter().zip(y.iter()) {
            assert_relative_eq!(a, b, epsilon = 1e-12);
        }
    }

    #[test]
    fn low_glucose_releases_glycogen() {
        let h = Homeostat::with_indices(dense_indices());
        let mut y = healthy_state();
        y[0] = 4.0;
        h.apply(&mut y, 0.01);
        assert_relative_eq!(y[0], 4.5, epsilon = 1e-9);
        assert_relative_eq!(y[1], 50.0 - 2.5, epsilon = 1e-9);
    }

    #[test]
    fn depleted_glycogen_triggers_gluconeogenesis() {
        let h = Homeostat::with_indices(dense_indices());
        let mut y = healthy_state();
        y[0] = 4.0;
        y[1] = 0.0;
        let fatty_before = y[3];
        h.apply(&mut y, 0.01);
        assert_relative_eq!(y[0], 4.5, epsilon = 1e-9);
        assert!(y[2] < 500.0);
        assert!(y[3] > fatty_before);
    }

    #[test]
    fn high_glucose_stores_glycogen_scaled_by_insulin() {
        let h = Homeostat::with_indices(dense_indices());
        let mut y = healthy_state();
        y[0] = 6.3;
        y[11] = 3.0; // full storage fraction
        h.apply(&mut y, 0.01);
        // whole 1.0 mM excess moved into glycogen
        assert!(y[0] < 6.3);
        assert_relative_eq!(y[0], 5.3, epsilon = 1e-9);
        assert_relative_eq!(y[1], 55.0, epsilon = 1e-9);
    }

    #[test]
    fn atp_floor_converts_adp_and_pays_glucose() {
        let h = Homeostat::with_indices(dense_indices());
        let mut y = healthy_state();
        y[4] = 3.5;
        y[5] = 2.0;
        h.apply(&mut y, 0.01);
        assert_relative_eq!(y[4], 4.0, epsilon = 1e-9);
        assert_relative_eq!(y[5], 1.5, epsilon = 1e-9);
        assert_relative_eq!(y[0], 5.0 - 0.05, epsilon = 1e-9);
    }

    #[test]
    fn collapsed_adenine_pool_is_refilled() {
        let h = Homeostat::with_indices(dense_indices());
        let mut y = healthy_state();
        y[4] = 2.0;
        y[5] = 0.1;
        h.apply(&mut y, 0.01);
        assert_relative_eq!(y[4] + y[5], 5.5, epsilon = 1e-9);
        assert_relative_eq!(y[4], 4.4, epsilon = 1e-9);
    }

    #[test]
    fn atp_ceiling_shifts_excess_to_adp() {
        let h = Homeostat::with_indices(dense_indices());
        let mut y = healthy_state();
        y[4] = 6.4;
        h.apply(&mut y, 0.01);
        assert_relative_eq!(y[4], 6.0, epsilon = 1e-9);
        assert_relative_eq!(y[5], 0.9, epsilon = 1e-9);
    }

    #[test]
    fn o2_relaxes_toward_arterial_level() {
        let h = Homeostat::with_indices(dense_indices());
        let mut y = healthy_state();
        y[6] = 0.05;
        h.apply(&mut y, 0.1);
        assert!(y[6] > 0.05 && y[6] < 0.13);
    }

    #[test]
    fn insulin_decays_toward_baseline() {
        let h = Homeostat::with_indices(dense_indices());
        let mut y = healthy_state();
        y[11] = 9.0;
        h.apply(&mut y, 1.0);
        let expected = 1.0 + 8.0 * (-0.05f64).exp();
        assert_relative_eq!(y[11], expected, epsilon = 1e-9);
    }

    #[test]
    fn cortisol_is_bounded() {
        let h = Homeostat::with_indices(dense_indices());
        let mut y = healthy_state();
        y[12] = 3.0;
        h.apply(&mut y, 0.01);
        assert_relative_eq!(y[12], 1.5);
        y[12] = 0.0;
        h.apply(&mut y, 0.01);
        assert_relative_eq!(y[12], 0.05);
    }

    #[test]
    fn accumulation_caps_clip_tca_intermediates() {
        let h = Homeostat::with_indices(dense_indices());
        let mut y = healthy_state();
        y[17] = 5.0;
        y[20] = 2.0;
        h.apply(&mut y, 0.01);
        assert_relative_eq!(y[17], 2.0);
        assert_relative_eq!(y[20], 1.0);
    }

    #[test]
    fn projection_rules_are_idempotent() {
        let mut h = Homeostat::with_indices(dense_indices());
        h.disable_relaxation_rules();

        // Independent envelope violations: floors and caps that settle in
        // one pass without one correction re-triggering another.
        let mut y = healthy_state();
        y[0] = 3.8;
        y[4] = 6.4;
        y[12] = 2.5;
        y[17] = 4.0;
        y[20] = 1.8;

        let mut once = y.clone();
        h.apply(&mut once, 0.01);
        let mut twice = once.clone();
        h.apply(&mut twice, 0.01);

        for (a, b) in once.iter().zip(twice.iter()) {
            assert_relative_eq!(a, b, epsilon = 1e-12);
        }
    }

    #[test]
    fn rules_toggle_individually() {
        let mut h = Homeostat::with_indices(dense_indices());
        h.set_rule_enabled("glucose_floor", false);
        h.set_rule_enabled("gluconeogenesis", false);

        let mut y = healthy_state();
        y[0] = 4.0;
        h.apply(&mut y, 0.01);
        assert_relative_eq!(y[0], 4.0, epsilon = 1e-9);

        h.set_rule_enabled("glucose_floor", true);
        h.apply(&mut y, 0.01);
        assert_relative_eq!(y[0], 4.5, epsilon = 1e-9);
    }

    #[test]
    fn missing_metabolites_skip_rules() {
        // Only glucose tracked: every other rule must no-op safely.
        let idx = VitalIndices {
            glucose_blood: Some(0),
            ..VitalIndices::default()
        };
        let h = Homeostat::with_indices(idx);
        let mut y = ndarray::arr1(&[4.0]);
        h.apply(&mut y, 0.01);
        assert_relative_eq!(y[0], 4.0);
    }
}
