//! Entity types and build-time validation.

use std::collections::HashSet;

use kinetics::KineticsKind;
use serde::{Deserialize, Serialize};

use crate::{PathwayError, Result};

/// A chemical species tracked over time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metabolite {
    pub id: String,
    pub name: String,
    /// Starting concentration (mM). Must be non-negative.
    #[serde(alias = "initial_concentration")]
    pub initial_concentration: f64,
    /// Compartment label (e.g. "cytosol", "blood", "mitochondria").
    #[serde(default)]
    pub compartment: String,
}

/// Which strand the reported risk allele refers to.
///
/// For `Minus`, the observed genotype is complemented base-by-base before the
/// risk allele is counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StrandOrientation {
    #[serde(alias = "plus", alias = "PLUS")]
    Plus,
    #[serde(alias = "minus", alias = "MINUS")]
    Minus,
}

/// How a genotype at one SNP scales an enzyme's Vmax.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneticModifier {
    #[serde(alias = "rs_id", alias = "rsid")]
    pub rs_id: String,
    #[serde(alias = "gene_name", default)]
    pub gene_name: String,
    /// Single base whose presence scales activity.
    #[serde(alias = "risk_allele")]
    pub risk_allele: String,
    pub orientation: StrandOrientation,
    /// Vmax multiplier with two copies of the risk allele.
    #[serde(alias = "homozygous_effect")]
    pub homozygous_effect: f64,
    /// Vmax multiplier with one copy.
    #[serde(alias = "heterozygous_effect")]
    pub heterozygous_effect: f64,
    #[serde(default)]
    pub description: String,
}

/// A catalyst with kinetic parameters and genetic modifiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enzyme {
    pub id: String,
    pub name: String,
    #[serde(alias = "ec_number", default)]
    pub ec_number: String,
    /// Maximum velocity (mM/s).
    pub vmax: f64,
    /// Half-saturation constant (mM).
    pub km: f64,
    #[serde(default)]
    pub cofactors: Vec<String>,
    #[serde(alias = "genetic_modifiers", default)]
    pub genetic_modifiers: Vec<GeneticModifier>,
}

impl Enzyme {
    /// Copy with Vmax multiplied by `factor`.
    pub fn with_vmax_scaled(&self, factor: f64) -> Self {
        Self {
            vmax: self.vmax * factor,
            ..self.clone()
        }
    }
}

/// Stoichiometric role of one metabolite in a reaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionParticipant {
    #[serde(alias = "metabolite_id")]
    pub metabolite_id: String,
    pub coefficient: u32,
}

/// A directed transformation from substrates to products.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reaction {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(alias = "enzyme_id")]
    pub enzyme_id: String,
    pub substrates: Vec<ReactionParticipant>,
    pub products: Vec<ReactionParticipant>,
    pub kinetics: KineticsKind,
    #[serde(default)]
    pub inhibitors: Vec<String>,
    #[serde(default)]
    pub activators: Vec<String>,
    pub ki: Option<f64>,
    pub ka: Option<f64>,
    #[serde(alias = "hill_coefficient")]
    pub hill_coefficient: Option<f64>,
}

/// An immutable metabolic network.
///
/// Construct through [`Pathway::build`], which validates id uniqueness and
/// reference closure. All "mutation" happens by structural update: the
/// `with_*` / `scale_*` helpers return a fresh pathway and leave the original
/// untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pathway {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub metabolites: Vec<Metabolite>,
    #[serde(default)]
    pub enzymes: Vec<Enzyme>,
    pub reactions: Vec<Reaction>,
}

impl Pathway {
    /// Validate and assemble a pathway.
    ///
    /// Fails on duplicate metabolite/enzyme/reaction ids, on reactions that
    /// reference undeclared metabolites or enzymes, and on zero stoichiometric
    /// coefficients.
    pub fn build(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        metabolites: Vec<Metabolite>,
        enzymes: Vec<Enzyme>,
        reactions: Vec<Reaction>,
    ) -> Result<Self> {
        let pathway = Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            metabolites,
            enzymes,
            reactions,
        };
        pathway.validate()?;
        Ok(pathway)
    }

    fn validate(&self) -> Result<()> {
        let mut metabolite_ids = HashSet::new();
        for m in &self.metabolites {
            if !metabolite_ids.insert(m.id.as_str()) {
                return Err(PathwayError::DuplicateId {
                    kind: "metabolite",
                    id: m.id.clone(),
                    pathway: self.id.clone(),
                });
            }
        }

        let mut enzyme_ids = HashSet::new();
        for e in &self.enzymes {
            if !enzyme_ids.insert(e.id.as_str()) {
                return Err(PathwayError::DuplicateId {
                    kind: "enzyme",
                    id: e.id.clone(),
                    pathway: self.id.clone(),
                });
            }
        }

        let mut reaction_ids = HashSet::new();
        for r in &self.reactions {
            if !reaction_ids.insert(r.id.as_str()) {
                return Err(PathwayError::DuplicateId {
                    kind: "reaction",
                    id: r.id.clone(),
                    pathway: self.id.clone(),
                });
            }
            if !enzyme_ids.contains(r.enzyme_id.as_str()) {
                return Err(PathwayError::MissingEnzyme {
                    reaction: r.id.clone(),
                    enzyme: r.enzyme_id.clone(),
                });
            }
            for p in r.substrates.iter().chain(r.products.iter()) {
                if !metabolite_ids.contains(p.metabolite_id.as_str()) {
                    return Err(PathwayError::UnknownReference {
                        reaction: r.id.clone(),
                        metabolite: p.metabolite_id.clone(),
                    });
                }
                if p.coefficient == 0 {
                    return Err(PathwayError::InvalidCoefficient {
                        reaction: r.id.clone(),
                        metabolite: p.metabolite_id.clone(),
                    });
                }
            }
            for id in r.inhibitors.iter().chain(r.activators.iter()) {
                if !metabolite_ids.contains(id.as_str()) {
                    return Err(PathwayError::UnknownReference {
                        reaction: r.id.clone(),
                        metabolite: id.clone(),
                    });
                }
            }
        }

        Ok(())
    }

    /// Merge several pathways into one whole-body network.
    ///
    /// Metabolites and enzymes are unioned by id (first definition wins);
    /// reactions are concatenated in pathway order.
    pub fn merge(
        id: impl Into<String>,
        name: impl Into<String>,
        pathways: &[Pathway],
    ) -> Result<Self> {
        let mut metabolites: Vec<Metabolite> = Vec::new();
        let mut enzymes: Vec<Enzyme> = Vec::new();
        let mut reactions: Vec<Reaction> = Vec::new();
        let mut seen_metabolites = HashSet::new();
        let mut seen_enzymes = HashSet::new();

        for p in pathways {
            for m in &p.metabolites {
                if seen_metabolites.insert(m.id.clone()) {
                    metabolites.push(m.clone());
                }
            }
            for e in &p.enzymes {
                if seen_enzymes.insert(e.id.clone()) {
                    enzymes.push(e.clone());
                }
            }
            reactions.extend(p.reactions.iter().cloned());
        }

        Self::build(id, name, "", metabolites, enzymes, reactions)
    }

    pub fn metabolite(&self, id: &str) -> Option<&Metabolite> {
        self.metabolites.iter().find(|m| m.id == id)
    }

    pub fn enzyme(&self, id: &str) -> Option<&Enzyme> {
        self.enzymes.iter().find(|e| e.id == id)
    }

    /// Copy with one metabolite's initial concentration replaced.
    ///
    /// Unknown ids are a no-op; the personalizer treats them as absent labs.
    pub fn with_initial_concentration(&self, id: &str, value: f64) -> Self {
        let mut out = self.clone();
        for m in &mut out.metabolites {
            if m.id == id {
                m.initial_concentration = value.max(0.0);
            }
        }
        out
    }

    /// Copy with one metabolite's initial concentration scaled.
    pub fn with_initial_scaled(&self, id: &str, factor: f64) -> Self {
        match self.metabolite(id) {
            Some(m) => self.with_initial_concentration(id, m.initial_concentration * factor),
            None => self.clone(),
        }
    }

    /// Copy with one enzyme's Vmax scaled. Unknown ids are a no-op.
    pub fn with_vmax_scaled(&self, enzyme_id: &str, factor: f64) -> Self {
        let mut out = self.clone();
        for e in &mut out.enzymes {
            if e.id == enzyme_id {
                *e = e.with_vmax_scaled(factor);
            }
        }
        out
    }
}
