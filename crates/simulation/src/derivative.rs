//! Derivative assembly: from a compiled pathway and enzyme activity to the
//! right-hand side of the ODE system.
//!
//! Reactions are summed in declaration order, which keeps double addition
//! bit-stable on a platform and makes runs reproducible.

use kinetics::{reaction_rate, RateInput};
use ndarray::Array1;
use pathway::{CompiledPathway, CompiledReaction};

fn sum_at(y: &Array1<f64>, indices: &[usize]) -> f64 {
    indices.iter().map(|&i| y[i]).sum()
}

/// Instantaneous rate of one reaction under the given enzyme activity
/// multiplier (personalization x genetics are already baked into Vmax;
/// `activity` carries supplements and circadian enzyme modulation).
pub fn rate_of(
    compiled: &CompiledPathway,
    reaction: &CompiledReaction,
    activity: &[f64],
    y: &Array1<f64>,
) -> f64 {
    let input = RateInput {
        vmax: compiled.vmax(reaction.enzyme) * activity[reaction.enzyme],
        km: compiled.km(reaction.enzyme),
        substrate: reaction.substrates.first().map(|&(i, _)| y[i]),
        inhibitor: sum_at(y, &reaction.inhibitors),
        ki: reaction.ki,
        activator: sum_at(y, &reaction.activators),
        ka: reaction.ka,
        hill: reaction.hill,
    };
    reaction_rate(reaction.kinetics, &input)
}

/// Per-reaction rates in declaration order.
pub fn fluxes(compiled: &CompiledPathway, activity: &[f64], y: &Array1<f64>) -> Vec<f64> {
    compiled
        .reactions()
        .iter()
        .map(|r| rate_of(compiled, r, activity, y))
        .collect()
}

/// Assemble dy/dt: each reaction subtracts `v * coeff` from its substrates
/// and adds `v * coeff` to its products.
pub fn derivative(compiled: &CompiledPathway, activity: &[f64], y: &Array1<f64>) -> Array1<f64> {
    let mut dydt = Array1::zeros(compiled.num_metabolites());
    for reaction in compiled.reactions() {
        let v = rate_of(compiled, reaction, activity, y);
        if v == 0.0 {
            continue;
        }
        for &(i, coeff) in &reaction.substrates {
            dydt[i] -= v * coeff;
        }
        for &(i, coeff) in &reaction.products {
            dydt[i] += v * coeff;
        }
    }
    dydt
}
