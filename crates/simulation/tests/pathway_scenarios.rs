//! End-to-end scenarios over the shipped pathway library.

use std::path::PathBuf;

use genetics::GeneticProfile;
use pathway::{load_library, Pathway};
use personalization::apply_genetics;
use schedule::Schedule;
use simulation::export::trajectory_to_csv;
use simulation::{
    apply_supplements, SimulationConfig, SimulationDriver, Supplement, SupplementKind, Trajectory,
};

fn data_path(filename: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("../../data");
    path.push(filename);
    path
}

fn load_pathway_library() -> Vec<Pathway> {
    load_library(&data_path("enzymes.json"), &data_path("pathways.json"))
        .expect("library should load")
}

fn pathway_by_id(id: &str) -> Pathway {
    load_pathway_library()
        .into_iter()
        .find(|p| p.id == id)
        .unwrap_or_else(|| panic!("pathway '{id}' should exist"))
}

fn whole_body() -> Pathway {
    let library = load_pathway_library();
    Pathway::merge("whole_body", "Whole body", &library).expect("merge should validate")
}

fn run(pathway: &Pathway, schedule: Schedule, config: SimulationConfig) -> Trajectory {
    let mut driver =
        SimulationDriver::new(pathway, schedule, config).expect("driver should build");
    driver.run();
    driver.into_trajectory()
}

fn final_value(trajectory: &Trajectory, id: &str) -> f64 {
    trajectory
        .last()
        .expect("trajectory should have samples")
        .concentration(id)
        .unwrap_or_else(|| panic!("'{id}' should be tracked"))
}

#[test]
fn methylation_baseline_stays_positive() {
    let pathway = pathway_by_id("methylation");
    let config = SimulationConfig {
        duration: 30.0,
        time_step: 0.01,
        output_interval: 10.0,
        ..SimulationConfig::default()
    };
    let trajectory = run(&pathway, Schedule::default(), config);

    let times: Vec<f64> = trajectory.snapshots().iter().map(|s| s.time_s).collect();
    assert_eq!(times.len(), 4);
    for (expected, actual) in [0.0, 10.0, 20.0, 30.0].iter().zip(&times) {
        assert!((expected - actual).abs() < 1e-6, "expected sample at {expected}");
    }

    for snapshot in trajectory.snapshots() {
        for key in ["hcy", "methyl_thf", "sam"] {
            let value = snapshot
                .concentration(key)
                .unwrap_or_else(|| panic!("'{key}' should be tracked"));
            assert!(value > 0.0, "{key} must stay positive, got {value}");
        }
    }
}

#[test]
fn mthfr_tt_reduces_methyl_thf() {
    let pathway = pathway_by_id("methylation");
    let config = SimulationConfig {
        duration: 60.0,
        output_interval: 10.0,
        ..SimulationConfig::default()
    };

    let baseline = run(&pathway, Schedule::default(), config.clone());

    let genotypes = GeneticProfile::from_file(&data_path("genome.txt")).expect("genome loads");
    assert_eq!(genotypes.genotype("rs1801133"), Some("TT"));
    let variant_pathway = apply_genetics(&pathway, &genotypes);
    let variant = run(&variant_pathway, Schedule::default(), config);

    let baseline_final = final_value(&baseline, "methyl_thf");
    let variant_final = final_value(&variant, "methyl_thf");
    assert!(
        variant_final < baseline_final,
        "TT variant should lower 5-MTHF: {variant_final} vs {baseline_final}"
    );
}

#[test]
fn methylfolate_supplement_rescues_variant() {
    let pathway = pathway_by_id("methylation");
    let config = SimulationConfig {
        duration: 60.0,
        output_interval: 10.0,
        ..SimulationConfig::default()
    };

    let genotypes = GeneticProfile::from_file(&data_path("genome.txt")).expect("genome loads");
    let variant_pathway = apply_genetics(&pathway, &genotypes);
    let without = run(&variant_pathway, Schedule::default(), config.clone());

    let supplement = Supplement {
        id: "methylfolate".to_string(),
        name: "L-methylfolate".to_string(),
        kind: SupplementKind::SubstrateIncrease,
        target_id: "methyl_thf".to_string(),
        effect_magnitude: 0.1,
        mechanism: "bypasses MTHFR".to_string(),
    };
    let (supplemented_pathway, multipliers) =
        apply_supplements(&variant_pathway, &[supplement]);
    assert!(multipliers.is_empty());
    let with = run(&supplemented_pathway, Schedule::default(), config);

    assert!(
        final_value(&with, "methyl_thf") > final_value(&without, "methyl_thf"),
        "supplement should raise final 5-MTHF"
    );
}

#[test]
fn krebs_cycle_turns_over_nadh() {
    let pathway = pathway_by_id("energy");
    let config = SimulationConfig {
        duration: 30.0,
        output_interval: 10.0,
        ..SimulationConfig::default()
    };
    let trajectory = run(&pathway, Schedule::default(), config);

    let initial = trajectory
        .first()
        .unwrap()
        .concentration("nadh")
        .expect("nadh tracked");
    let final_nadh = final_value(&trajectory, "nadh");
    assert!(
        (final_nadh - initial).abs() > 1e-4,
        "cycle should move NADH away from its initial value"
    );
}

#[test]
fn whole_body_day_respects_invariants() {
    let pathway = whole_body();
    let schedule = Schedule::from_file(&data_path("schedule.json"));
    assert_eq!(schedule.events.len(), 4);

    let config = SimulationConfig {
        duration: 120.0, // two sim hours from 07:00, crossing breakfast
        output_interval: 10.0,
        ..SimulationConfig::default()
    };
    let trajectory = run(&pathway, schedule, config);

    // Non-negativity and id closure on every sample
    let declared: std::collections::HashSet<&str> =
        pathway.metabolites.iter().map(|m| m.id.as_str()).collect();
    let mut last_time = f64::NEG_INFINITY;
    for snapshot in trajectory.snapshots() {
        assert!(snapshot.time_s > last_time, "time must strictly increase");
        last_time = snapshot.time_s;
        for (id, value) in &snapshot.concentrations {
            assert!(declared.contains(id.as_str()), "undeclared key {id}");
            assert!(value.is_finite() && *value >= 0.0, "{id} = {value}");
        }
    }

    // Breakfast at 08:00 (t = 60 s) raises insulin above baseline
    let peak_insulin = trajectory
        .snapshots()
        .iter()
        .map(|s| s.concentration_or_zero("insulin"))
        .fold(0.0, f64::max);
    assert!(peak_insulin > 1.5, "meal should spike insulin, peak {peak_insulin}");

    // Glucose stays inside the homeostatic envelope
    for snapshot in trajectory.snapshots() {
        let glucose = snapshot.concentration_or_zero("glucose_blood");
        assert!(
            (4.0..=5.6).contains(&glucose),
            "glucose out of envelope: {glucose} at t={}",
            snapshot.time_s
        );
    }
}

#[test]
fn identical_whole_body_runs_match_exactly() {
    let pathway = whole_body();
    let schedule = Schedule::from_file(&data_path("schedule.json"));
    let config = SimulationConfig {
        duration: 30.0,
        output_interval: 5.0,
        ..SimulationConfig::default()
    };

    let a = run(&pathway, schedule.clone(), config.clone());
    let b = run(&pathway, schedule, config);
    assert_eq!(a, b);
}

#[test]
fn library_round_trips_through_json() {
    for pathway in load_pathway_library() {
        let text = serde_json::to_string(&pathway).expect("serializes");
        let reparsed: Pathway = serde_json::from_str(&text).expect("reparses");
        assert_eq!(pathway, reparsed);
    }
}

#[test]
fn csv_export_follows_declaration_order() {
    let pathway = pathway_by_id("methylation");
    let config = SimulationConfig {
        duration: 10.0,
        output_interval: 5.0,
        ..SimulationConfig::default()
    };
    let trajectory = run(&pathway, Schedule::default(), config);

    let ids: Vec<String> = pathway.metabolites.iter().map(|m| m.id.clone()).collect();
    let csv = trajectory_to_csv(&trajectory, &ids);
    let header = csv.lines().next().expect("header");
    assert_eq!(header, format!("Time,{}", ids.join(",")));
    assert_eq!(csv.lines().count(), 1 + trajectory.len());
    // six fractional digits on every numeric field
    let row = csv.lines().nth(1).unwrap();
    for field in row.split(',') {
        let (_, frac) = field.split_once('.').expect("fractional part");
        assert!(frac.len() >= 6);
    }
}
