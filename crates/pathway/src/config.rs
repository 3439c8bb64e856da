//! JSON configuration documents: the enzyme table and the pathway library.
//!
//! Two files are consumed: `enzymes.json` (array of enzyme definitions with
//! kinetic parameters and genetic modifiers) and `pathways.json` (array of
//! pathway definitions whose reactions reference enzymes by id). Loading
//! attaches each pathway's referenced enzymes and runs build validation, so
//! an unknown `enzymeId` is fatal here.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::model::{Enzyme, Metabolite, Pathway, Reaction};
use crate::{PathwayError, Result};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PathwayDoc {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
    metabolites: Vec<Metabolite>,
    reactions: Vec<Reaction>,
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let text = fs::read_to_string(path).map_err(|source| PathwayError::Io {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| PathwayError::InvalidDocument {
        path: path.display().to_string(),
        source,
    })
}

/// Load the enzyme table from `enzymes.json`.
pub fn load_enzymes(path: &Path) -> Result<Vec<Enzyme>> {
    read_json(path)
}

/// Load `pathways.json`, attaching each pathway's referenced enzymes from
/// `enzymes` and validating the result.
pub fn load_pathways(path: &Path, enzymes: &[Enzyme]) -> Result<Vec<Pathway>> {
    let docs: Vec<PathwayDoc> = read_json(path)?;
    docs.into_iter()
        .map(|doc| attach_enzymes(doc, enzymes))
        .collect()
}

/// Load both documents and return validated pathways.
pub fn load_library(enzymes_path: &Path, pathways_path: &Path) -> Result<Vec<Pathway>> {
    let enzymes = load_enzymes(enzymes_path)?;
    load_pathways(pathways_path, &enzymes)
}

fn attach_enzymes(doc: PathwayDoc, table: &[Enzyme]) -> Result<Pathway> {
    let referenced: HashSet<&str> = doc
        .reactions
        .iter()
        .map(|r| r.enzyme_id.as_str())
        .collect();

    // Table order keeps enzyme layout deterministic across loads.
    let attached: Vec<Enzyme> = table
        .iter()
        .filter(|e| referenced.contains(e.id.as_str()))
        .cloned()
        .collect();

    Pathway::build(
        doc.id,
        doc.name,
        doc.description,
        doc.metabolites,
        attached,
        doc.reactions,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENZYMES: &str = r#"[
        {
            "id": "mthfr",
            "name": "Methylenetetrahydrofolate reductase",
            "ecNumber": "1.5.1.20",
            "vmax": 0.5,
            "km": 0.05,
            "cofactors": ["FAD", "NADPH"],
            "geneticModifiers": [
                {
                    "rsId": "rs1801133",
                    "geneName": "MTHFR",
                    "riskAllele": "A",
                    "orientation": "Minus",
                    "homozygousEffect": 0.3,
                    "heterozygousEffect": 0.65,
                    "description": "C677T"
                }
            ]
        }
    ]"#;

    const PATHWAYS: &str = r#"[
        {
            "id": "methylation",
            "name": "Methylation cycle",
            "metabolites": [
                { "id": "methylene_thf", "name": "5,10-methylene-THF", "initialConcentration": 0.4, "compartment": "cytosol" },
                { "id": "methyl_thf", "name": "5-MTHF", "initialConcentration": 0.2, "compartment": "cytosol" }
            ],
            "reactions": [
                {
                    "id": "mthfr_reduction",
                    "name": "Methylene-THF reduction",
                    "enzymeId": "mthfr",
                    "substrates": [ { "metaboliteId": "methylene_thf", "coefficient": 1 } ],
                    "products": [ { "metaboliteId": "methyl_thf", "coefficient": 1 } ],
                    "kinetics": "MichaelisMenten"
                }
            ]
        }
    ]"#;

    #[test]
    fn parse_and_attach() {
        let enzymes: Vec<Enzyme> = serde_json::from_str(ENZYMES).unwrap();
        assert_eq!(enzymes[0].genetic_modifiers[0].rs_id, "rs1801133");

        let docs: Vec<PathwayDoc> = serde_json::from_str(PATHWAYS).unwrap();
        let pathway = attach_enzymes(docs.into_iter().next().unwrap(), &enzymes).unwrap();
        assert_eq!(pathway.enzymes.len(), 1);
        assert_eq!(pathway.reactions[0].enzyme_id, "mthfr");
    }

    #[test]
    fn unknown_enzyme_is_fatal() {
        let docs: Vec<PathwayDoc> = serde_json::from_str(PATHWAYS).unwrap();
        let err = attach_enzymes(docs.into_iter().next().unwrap(), &[]).unwrap_err();
        assert!(matches!(err, PathwayError::MissingEnzyme { .. }));
    }

    #[test]
    fn reserialized_pathway_is_semantically_equal() {
        let enzymes: Vec<Enzyme> = serde_json::from_str(ENZYMES).unwrap();
        let docs: Vec<PathwayDoc> = serde_json::from_str(PATHWAYS).unwrap();
        let pathway = attach_enzymes(docs.into_iter().next().unwrap(), &enzymes).unwrap();

        let text = serde_json::to_string(&pathway).unwrap();
        let reparsed: Pathway = serde_json::from_str(&text).unwrap();
        assert_eq!(pathway, reparsed);
    }
}
