//! Model identity and residue selections.
//!
//! Every analyzed structure gets a [`ModelId`] issued exactly once when the
//! batch is assembled; all downstream tables are keyed by it. Keeping the
//! identifier as a dedicated type (rather than passing bare strings around)
//! means a label typo fails at the join instead of silently producing an
//! orphan row.

use crate::error::{AnalysisError, Result};
use std::fmt;
use std::path::PathBuf;

/// Unique, human-assigned label of one structural model (e.g. "WT", "D296N").
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModelId(String);

impl ModelId {
    /// Create an identifier from a label. Leading/trailing whitespace is
    /// stripped; the label itself is matched exactly everywhere else.
    pub fn new(label: &str) -> Self {
        Self(label.trim().to_string())
    }

    /// The label as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether a model is the reference everything else is scored against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// The reference model (typically the wild type).
    Baseline,
    /// Any model compared against the baseline.
    Candidate,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Role::Baseline => write!(f, "baseline"),
            Role::Candidate => write!(f, "candidate"),
        }
    }
}

/// One analyzed structure: identity, role and (optionally) where its
/// coordinates live. Immutable after creation.
#[derive(Debug, Clone)]
pub struct Model {
    /// Unique identifier of the model.
    pub id: ModelId,
    /// Baseline or candidate.
    pub role: Role,
    /// Coordinate file, if one was provided for this model.
    pub structure: Option<PathBuf>,
}

/// A `(chain, residue index)` pair identifying one residue of a model.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResidueId {
    /// Chain identifier, e.g. "A".
    pub chain: String,
    /// Residue sequence number.
    pub resi: isize,
}

impl ResidueId {
    /// Create a residue identifier.
    pub fn new(chain: &str, resi: isize) -> Self {
        Self {
            chain: chain.to_string(),
            resi,
        }
    }
}

impl fmt::Display for ResidueId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.chain, self.resi)
    }
}

/// An ordered, duplicate-free set of residues.
///
/// Used both for the surface/H-bond region of interest and for the two
/// contact groups. Order is the order of first appearance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResidueSet {
    residues: Vec<ResidueId>,
}

impl ResidueSet {
    /// Build a set from residues, dropping duplicates while preserving the
    /// order of first appearance.
    pub fn new(residues: impl IntoIterator<Item = ResidueId>) -> Self {
        let mut seen = std::collections::HashSet::new();
        let residues = residues
            .into_iter()
            .filter(|r| seen.insert(r.clone()))
            .collect();
        Self { residues }
    }

    /// Parse a residue expression like `A:298,A:300-305` or `A:298;B:12`.
    ///
    /// Items are separated by commas, semicolons or whitespace (full-width
    /// commas from CJK input methods are accepted too). Each item is
    /// `<chain>:<index>` or `<chain>:<start>-<end>` with an inclusive range.
    pub fn from_expr(expr: &str) -> Result<Self> {
        let expr = expr.replace('，', ",");
        let mut residues = Vec::new();
        for item in expr
            .split(|c: char| c == ',' || c == ';' || c.is_whitespace())
            .filter(|s| !s.is_empty())
        {
            let (chain, span) = item.split_once(':').ok_or_else(|| {
                AnalysisError::InvalidInput(format!(
                    "residue item '{item}' is not of the form chain:index"
                ))
            })?;
            if chain.is_empty() {
                return Err(AnalysisError::InvalidInput(format!(
                    "residue item '{item}' has an empty chain ID"
                )));
            }
            // `-` can be both the range separator and a sign; only split on a
            // dash that is not the leading character.
            let range = span
                .char_indices()
                .skip(1)
                .find(|(_, c)| *c == '-')
                .map(|(i, _)| span.split_at(i));
            let (start, end) = match range {
                Some((a, b)) => (parse_resi(item, a)?, parse_resi(item, &b[1..])?),
                None => {
                    let resi = parse_resi(item, span)?;
                    (resi, resi)
                }
            };
            if end < start {
                return Err(AnalysisError::InvalidInput(format!(
                    "residue range '{item}' runs backwards"
                )));
            }
            for resi in start..=end {
                residues.push(ResidueId::new(chain, resi));
            }
        }
        if residues.is_empty() {
            return Err(AnalysisError::InvalidInput(
                "residue expression selects no residues".to_string(),
            ));
        }
        Ok(Self::new(residues))
    }

    /// Number of residues in the set.
    pub fn len(&self) -> usize {
        self.residues.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.residues.is_empty()
    }

    /// Whether the set contains the given residue.
    pub fn contains(&self, residue: &ResidueId) -> bool {
        self.residues.contains(residue)
    }

    /// Iterate over residues in order.
    pub fn iter(&self) -> impl Iterator<Item = &ResidueId> {
        self.residues.iter()
    }
}

fn parse_resi(item: &str, text: &str) -> Result<isize> {
    text.trim().parse().map_err(|_| {
        AnalysisError::InvalidInput(format!("residue index '{text}' in '{item}' is not an integer"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_residues_and_ranges() {
        let set = ResidueSet::from_expr("A:298,A:300-302").unwrap();
        let resis: Vec<isize> = set.iter().map(|r| r.resi).collect();
        assert_eq!(resis, vec![298, 300, 301, 302]);
        assert!(set.iter().all(|r| r.chain == "A"));
    }

    #[test]
    fn mixed_separators_and_chains() {
        let set = ResidueSet::from_expr("A:1; B:2 B:3，A:4").unwrap();
        assert_eq!(set.len(), 4);
        assert!(set.contains(&ResidueId::new("B", 3)));
    }

    #[test]
    fn duplicates_are_dropped_in_order() {
        let set = ResidueSet::from_expr("A:5,A:4-6").unwrap();
        let resis: Vec<isize> = set.iter().map(|r| r.resi).collect();
        assert_eq!(resis, vec![5, 4, 6], "first appearance wins");
    }

    #[test]
    fn bad_expressions_are_rejected() {
        assert!(ResidueSet::from_expr("298").is_err(), "missing chain");
        assert!(ResidueSet::from_expr("A:").is_err(), "missing index");
        assert!(ResidueSet::from_expr("A:abc").is_err(), "non-numeric index");
        assert!(ResidueSet::from_expr("A:5-3").is_err(), "backwards range");
        assert!(ResidueSet::from_expr("  ").is_err(), "empty selection");
    }

    #[test]
    fn negative_indices_parse() {
        let set = ResidueSet::from_expr("A:-2").unwrap();
        assert!(set.contains(&ResidueId::new("A", -2)));
    }
}
