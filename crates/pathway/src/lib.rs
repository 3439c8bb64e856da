//! Declarative metabolic network model.
//!
//! A [`Pathway`] is an immutable graph of metabolites, enzymes, and reactions
//! referenced by id strings. Validation happens once at build time; the hot
//! path works on a [`CompiledPathway`] where every id has been resolved to an
//! integer index and the state vector is a plain array.

pub mod compiled;
pub mod config;
pub mod model;

pub use compiled::{CompiledPathway, CompiledReaction};
pub use config::{load_enzymes, load_library, load_pathways};
pub use model::{
    Enzyme, GeneticModifier, Metabolite, Pathway, Reaction, ReactionParticipant,
    StrandOrientation,
};

use thiserror::Error;

/// Build-time validation failures. All of these are fatal to the caller.
#[derive(Debug, Error)]
pub enum PathwayError {
    #[error("duplicate {kind} id '{id}' in pathway '{pathway}'")]
    DuplicateId {
        kind: &'static str,
        id: String,
        pathway: String,
    },

    #[error("reaction '{reaction}' references unknown metabolite '{metabolite}'")]
    UnknownReference { reaction: String, metabolite: String },

    #[error("reaction '{reaction}' references unknown enzyme '{enzyme}'")]
    MissingEnzyme { reaction: String, enzyme: String },

    #[error("reaction '{reaction}' has participant '{metabolite}' with zero coefficient")]
    InvalidCoefficient { reaction: String, metabolite: String },

    #[error("failed to parse {path}: {source}")]
    InvalidDocument {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, PathwayError>;
