//! Genetic profiles and genotype interpretation.
//!
//! Consumes the tab-separated raw SNP export (`rsid  chromosome  position
//! genotype`) and turns per-SNP genotypes into enzyme activity multipliers
//! through the modifiers declared on each enzyme.
//!
//! A missing SNP is never an error: the modifier simply contributes a factor
//! of 1.0. Malformed lines are skipped with a warning so one bad row cannot
//! poison an otherwise usable file.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use pathway::{Enzyme, GeneticModifier, StrandOrientation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum GeneticsError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, GeneticsError>;

/// One row of the raw SNP table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnpRecord {
    pub chromosome: String,
    pub position: u64,
    /// Two observed bases, e.g. "AG".
    pub genotype: String,
}

/// Map from rsId to observed genotype.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneticProfile {
    records: HashMap<String, SnpRecord>,
}

impl GeneticProfile {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse the tab-separated raw format.
    ///
    /// Lines starting with `#` and blank lines are ignored. A genotype of
    /// `--` marks missing data and the line is skipped. Lines with a
    /// malformed position or genotype are skipped with a warning.
    pub fn parse(text: &str) -> Self {
        let mut records = HashMap::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut fields = line.split('\t');
            let (rsid, chromosome, position, genotype) = match (
                fields.next(),
                fields.next(),
                fields.next(),
                fields.next(),
            ) {
                (Some(a), Some(b), Some(c), Some(d)) => (a, b, c, d),
                _ => {
                    warn!(line, "skipping SNP row with missing fields");
                    continue;
                }
            };
            if genotype == "--" {
                continue;
            }
            let position: u64 = match position.parse() {
                Ok(p) => p,
                Err(_) => {
                    warn!(rsid, position, "skipping SNP row with unparsable position");
                    continue;
                }
            };
            if genotype.len() != 2 || !genotype.chars().all(|c| c.is_ascii_alphabetic()) {
                warn!(rsid, genotype, "skipping SNP row with malformed genotype");
                continue;
            }
            records.insert(
                rsid.to_string(),
                SnpRecord {
                    chromosome: chromosome.to_string(),
                    position,
                    genotype: genotype.to_ascii_uppercase(),
                },
            );
        }
        Self { records }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| GeneticsError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self::parse(&text))
    }

    /// Insert a genotype directly (test and scenario construction).
    pub fn with_genotype(mut self, rs_id: &str, genotype: &str) -> Self {
        self.records.insert(
            rs_id.to_string(),
            SnpRecord {
                chromosome: String::new(),
                position: 0,
                genotype: genotype.to_ascii_uppercase(),
            },
        );
        self
    }

    pub fn genotype(&self, rs_id: &str) -> Option<&str> {
        self.records.get(rs_id).map(|r| r.genotype.as_str())
    }

    pub fn record(&self, rs_id: &str) -> Option<&SnpRecord> {
        self.records.get(rs_id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Watson-Crick complement; characters outside ACGT pass through unchanged.
pub fn complement_base(base: char) -> char {
    match base.to_ascii_uppercase() {
        'A' => 'T',
        'T' => 'A',
        'C' => 'G',
        'G' => 'C',
        other => other,
    }
}

/// The genotype as seen from the modifier's declared strand.
///
/// Minus orientation complements each base; plus returns the genotype as
/// observed.
pub fn oriented_genotype(genotype: &str, orientation: StrandOrientation) -> String {
    match orientation {
        StrandOrientation::Plus => genotype.to_ascii_uppercase(),
        StrandOrientation::Minus => genotype.chars().map(complement_base).collect(),
    }
}

/// Count copies of the risk allele in the oriented genotype, case-insensitive.
pub fn risk_allele_count(
    genotype: &str,
    risk_allele: &str,
    orientation: StrandOrientation,
) -> u32 {
    let Some(allele) = risk_allele.chars().next().map(|c| c.to_ascii_uppercase()) else {
        return 0;
    };
    oriented_genotype(genotype, orientation)
        .chars()
        .filter(|c| c.to_ascii_uppercase() == allele)
        .count() as u32
}

/// Vmax multiplier contributed by one modifier under one profile.
///
/// Two risk-allele copies apply the homozygous effect, one applies the
/// heterozygous effect, zero (or a missing rsId) contributes 1.0.
pub fn modifier_multiplier(modifier: &GeneticModifier, profile: &GeneticProfile) -> f64 {
    let Some(genotype) = profile.genotype(&modifier.rs_id) else {
        return 1.0;
    };
    match risk_allele_count(genotype, &modifier.risk_allele, modifier.orientation) {
        2 => modifier.homozygous_effect,
        1 => modifier.heterozygous_effect,
        _ => 1.0,
    }
}

/// Composite activity multiplier for an enzyme: the product over all of its
/// modifiers.
pub fn enzyme_activity_multiplier(enzyme: &Enzyme, profile: &GeneticProfile) -> f64 {
    enzyme
        .genetic_modifiers
        .iter()
        .map(|m| modifier_multiplier(m, profile))
        .product()
}
