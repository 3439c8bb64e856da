//! Id-to-index resolution for the integration hot path.
//!
//! The declarative model references everything by string id. Compiling a
//! pathway resolves every reference once, so the per-step derivative loop
//! touches only integer indices into a flat state vector.

use std::collections::HashMap;

use kinetics::KineticsKind;

use crate::model::Pathway;
use crate::{PathwayError, Result};

/// One reaction with every reference resolved to an index.
#[derive(Debug, Clone)]
pub struct CompiledReaction {
    pub id: String,
    /// Index into the enzyme tables.
    pub enzyme: usize,
    pub kinetics: KineticsKind,
    /// (metabolite index, stoichiometric coefficient), declaration order.
    pub substrates: Vec<(usize, f64)>,
    pub products: Vec<(usize, f64)>,
    pub inhibitors: Vec<usize>,
    pub activators: Vec<usize>,
    pub ki: f64,
    pub ka: f64,
    pub hill: f64,
}

/// A validated pathway flattened into index form.
#[derive(Debug, Clone)]
pub struct CompiledPathway {
    metabolite_ids: Vec<String>,
    metabolite_index: HashMap<String, usize>,
    initial: Vec<f64>,
    enzyme_ids: Vec<String>,
    enzyme_index: HashMap<String, usize>,
    vmax: Vec<f64>,
    km: Vec<f64>,
    reactions: Vec<CompiledReaction>,
}

impl CompiledPathway {
    pub fn compile(pathway: &Pathway) -> Result<Self> {
        let metabolite_ids: Vec<String> =
            pathway.metabolites.iter().map(|m| m.id.clone()).collect();
        let metabolite_index: HashMap<String, usize> = metabolite_ids
            .iter()
            .enumerate()
            .map(|(i, id)| (id.clone(), i))
            .collect();
        let initial: Vec<f64> = pathway
            .metabolites
            .iter()
            .map(|m| m.initial_concentration.max(0.0))
            .collect();

        let enzyme_ids: Vec<String> = pathway.enzymes.iter().map(|e| e.id.clone()).collect();
        let enzyme_index: HashMap<String, usize> = enzyme_ids
            .iter()
            .enumerate()
            .map(|(i, id)| (id.clone(), i))
            .collect();
        let vmax: Vec<f64> = pathway.enzymes.iter().map(|e| e.vmax).collect();
        let km: Vec<f64> = pathway.enzymes.iter().map(|e| e.km).collect();

        let lookup = |reaction: &str, id: &str| -> Result<usize> {
            metabolite_index
                .get(id)
                .copied()
                .ok_or_else(|| PathwayError::UnknownReference {
                    reaction: reaction.to_string(),
                    metabolite: id.to_string(),
                })
        };

        let mut reactions = Vec::with_capacity(pathway.reactions.len());
        for r in &pathway.reactions {
            let enzyme = enzyme_index.get(&r.enzyme_id).copied().ok_or_else(|| {
                PathwayError::MissingEnzyme {
                    reaction: r.id.clone(),
                    enzyme: r.enzyme_id.clone(),
                }
            })?;

            let mut substrates = Vec::with_capacity(r.substrates.len());
            for p in &r.substrates {
                substrates.push((lookup(&r.id, &p.metabolite_id)?, f64::from(p.coefficient)));
            }
            let mut products = Vec::with_capacity(r.products.len());
            for p in &r.products {
                products.push((lookup(&r.id, &p.metabolite_id)?, f64::from(p.coefficient)));
            }
            let mut inhibitors = Vec::with_capacity(r.inhibitors.len());
            for id in &r.inhibitors {
                inhibitors.push(lookup(&r.id, id)?);
            }
            let mut activators = Vec::with_capacity(r.activators.len());
            for id in &r.activators {
                activators.push(lookup(&r.id, id)?);
            }

            reactions.push(CompiledReaction {
                id: r.id.clone(),
                enzyme,
                kinetics: r.kinetics,
                substrates,
                products,
                inhibitors,
                activators,
                ki: r.ki.unwrap_or(0.0),
                ka: r.ka.unwrap_or(0.0),
                hill: r.hill_coefficient.unwrap_or(1.0),
            });
        }

        Ok(Self {
            metabolite_ids,
            metabolite_index,
            initial,
            enzyme_ids,
            enzyme_index,
            vmax,
            km,
            reactions,
        })
    }

    pub fn num_metabolites(&self) -> usize {
        self.metabolite_ids.len()
    }

    pub fn num_enzymes(&self) -> usize {
        self.enzyme_ids.len()
    }

    /// Metabolite ids in declaration order (the state-vector layout).
    pub fn metabolite_ids(&self) -> &[String] {
        &self.metabolite_ids
    }

    pub fn metabolite_index(&self, id: &str) -> Option<usize> {
        self.metabolite_index.get(id).copied()
    }

    pub fn enzyme_index(&self, id: &str) -> Option<usize> {
        self.enzyme_index.get(id).copied()
    }

    pub fn enzyme_ids(&self) -> &[String] {
        &self.enzyme_ids
    }

    /// Initial concentrations in state-vector order.
    pub fn initial_concentrations(&self) -> &[f64] {
        &self.initial
    }

    pub fn vmax(&self, enzyme: usize) -> f64 {
        self.vmax[enzyme]
    }

    pub fn km(&self, enzyme: usize) -> f64 {
        self.km[enzyme]
    }

    /// Reactions in declaration order. Derivative assembly iterates this
    /// order so summation stays bit-stable between runs.
    pub fn reactions(&self) -> &[CompiledReaction] {
        &self.reactions
    }
}
