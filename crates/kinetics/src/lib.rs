//! Enzyme rate laws for pathway simulation.
//!
//! Pure functions computing an instantaneous reaction velocity (mM/s) from
//! kinetic parameters and current concentrations. No state is kept here.
//!
//! # Rate laws
//!
//! ```text
//! v = Vmax * [S] / (Km + [S])                       // Michaelis-Menten
//! v = Vmax * [S] / (Km * (1 + [I]/Ki) + [S])        // Competitive inhibition
//! v = (Vmax / (1 + [I]/Ki)) * [S] / (Km + [S])      // Non-competitive inhibition
//! v = Vmax * [S]^n / (K^n + [S]^n)                  // Allosteric (Hill)
//! v = k * [S]                                       // Mass action
//! ```
//!
//! Degenerate inputs (non-positive substrate, Vmax, or Km) yield a rate of
//! zero rather than an error; a negative velocity is never produced. The one
//! exception is mass action over an empty substrate list, which models a
//! constant source running at `k`.

use serde::{Deserialize, Serialize};

/// Which rate law a reaction uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KineticsKind {
    MichaelisMenten,
    CompetitiveInhibition,
    NonCompetitiveInhibition,
    Allosteric,
    MassAction,
}

/// Inputs for a single rate evaluation.
///
/// `substrate` is the limiting substrate concentration: the first substrate
/// of the reaction in declared order. Reactions with more than one substrate
/// apply the rate law to the limiting one only; the others enter the
/// derivative through stoichiometric consumption, not rate scaling. This is
/// a deliberate simplification (no min-across-saturation co-limiting).
/// `substrate` is `None` for reactions with no substrates at all.
#[derive(Debug, Clone, Copy)]
pub struct RateInput {
    /// Maximum velocity (mM/s), already scaled by enzyme activity.
    pub vmax: f64,
    /// Half-saturation constant (mM).
    pub km: f64,
    /// Limiting substrate concentration (mM), if any.
    pub substrate: Option<f64>,
    /// Summed concentration of all declared inhibitors (mM).
    pub inhibitor: f64,
    /// Inhibition constant Ki (mM); non-positive disables inhibition.
    pub ki: f64,
    /// Summed concentration of all declared activators (mM).
    pub activator: f64,
    /// Activation constant Ka (mM); non-positive disables activation.
    pub ka: f64,
    /// Hill coefficient for allosteric kinetics.
    pub hill: f64,
}

impl RateInput {
    /// Plain saturable reaction with no modifiers.
    pub fn saturable(vmax: f64, km: f64, substrate: f64) -> Self {
        Self {
            vmax,
            km,
            substrate: Some(substrate),
            inhibitor: 0.0,
            ki: 0.0,
            activator: 0.0,
            ka: 0.0,
            hill: 1.0,
        }
    }
}

/// Standard Michaelis-Menten velocity.
pub fn michaelis_menten(vmax: f64, km: f64, substrate: f64) -> f64 {
    if substrate <= 0.0 || vmax <= 0.0 || km <= 0.0 {
        return 0.0;
    }
    vmax * substrate / (km + substrate)
}

/// Competitive inhibition: the inhibitor raises the apparent Km.
///
/// Falls back to plain Michaelis-Menten when `ki` is non-positive.
pub fn competitive_inhibition(vmax: f64, km: f64, substrate: f64, inhibitor: f64, ki: f64) -> f64 {
    if ki <= 0.0 {
        return michaelis_menten(vmax, km, substrate);
    }
    if substrate <= 0.0 || vmax <= 0.0 || km <= 0.0 {
        return 0.0;
    }
    let apparent_km = km * (1.0 + inhibitor.max(0.0) / ki);
    vmax * substrate / (apparent_km + substrate)
}

/// Non-competitive inhibition: the inhibitor lowers the apparent Vmax.
///
/// Falls back to plain Michaelis-Menten when `ki` is non-positive.
pub fn noncompetitive_inhibition(
    vmax: f64,
    km: f64,
    substrate: f64,
    inhibitor: f64,
    ki: f64,
) -> f64 {
    if ki <= 0.0 {
        return michaelis_menten(vmax, km, substrate);
    }
    let apparent_vmax = vmax / (1.0 + inhibitor.max(0.0) / ki);
    michaelis_menten(apparent_vmax, km, substrate)
}

/// Allosteric (Hill) kinetics with cooperativity `n`.
///
/// A non-positive Hill coefficient is treated as 1 (no cooperativity).
pub fn allosteric(vmax: f64, k: f64, substrate: f64, n: f64) -> f64 {
    if substrate <= 0.0 || vmax <= 0.0 || k <= 0.0 {
        return 0.0;
    }
    let n = if n > 0.0 { n } else { 1.0 };
    let s_n = substrate.powf(n);
    vmax * s_n / (k.powf(n) + s_n)
}

/// First-order mass action, `v = k * [S]`.
pub fn mass_action(k: f64, substrate: f64) -> f64 {
    if substrate <= 0.0 || k <= 0.0 {
        return 0.0;
    }
    k * substrate
}

/// Scale a base rate by an activator: `v * (1 + [A]/Ka)`.
///
/// Returns the base rate unchanged when `ka` is non-positive or no activator
/// is present.
pub fn activation_multiplier(base_rate: f64, activator: f64, ka: f64) -> f64 {
    if ka <= 0.0 || activator <= 0.0 {
        return base_rate;
    }
    base_rate * (1.0 + activator / ka)
}

/// Evaluate a reaction's velocity by dispatching on its kinetics kind.
///
/// Mass action over an empty substrate list returns `vmax` directly: the
/// reaction is a constant source. All other kinds return 0 without a
/// substrate. The activator term multiplies whichever base law applies.
pub fn reaction_rate(kind: KineticsKind, input: &RateInput) -> f64 {
    let base = match (kind, input.substrate) {
        (KineticsKind::MassAction, None) => input.vmax.max(0.0),
        (_, None) => 0.0,
        (KineticsKind::MichaelisMenten, Some(s)) => michaelis_menten(input.vmax, input.km, s),
        (KineticsKind::CompetitiveInhibition, Some(s)) => {
            competitive_inhibition(input.vmax, input.km, s, input.inhibitor, input.ki)
        }
        (KineticsKind::NonCompetitiveInhibition, Some(s)) => {
            noncompetitive_inhibition(input.vmax, input.km, s, input.inhibitor, input.ki)
        }
        (KineticsKind::Allosteric, Some(s)) => allosteric(input.vmax, input.km, s, input.hill),
        (KineticsKind::MassAction, Some(s)) => mass_action(input.vmax, s),
    };
    activation_multiplier(base, input.activator, input.ka).max(0.0)
}
