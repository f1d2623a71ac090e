//! Residue-group contact analysis on atomic coordinates.
//!
//! Given two residue groups A and B, the analyzer builds the full |A|x|B|
//! matrix of minimum interatomic distances once, then answers every
//! cutoff-dependent question by re-thresholding that cached matrix. This
//! keeps a cutoff sweep linear in the number of cutoffs and guarantees the
//! reported pair counts are monotone across ascending cutoffs.

use crate::error::{AnalysisError, Result};
use crate::model::{ModelId, ResidueId, ResidueSet};
use nalgebra as na;
use pdbtbx::*;
use polars::prelude::*;
use std::collections::HashMap;
use tracing::warn;

/// Which atoms of each residue participate in distance measurements.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AtomSelection {
    /// All non-hydrogen atoms (the default).
    #[default]
    HeavyAtoms,
    /// A single named representative atom per residue, e.g. `CA`.
    Representative(String),
}

/// Configuration for contact analysis.
#[derive(Debug, Clone, Default)]
pub struct ContactConfig {
    /// Atom subset used for residue-residue distances.
    pub selection: AtomSelection,
}

/// Minimum residue-residue distances between two groups, cached for reuse.
#[derive(Debug, Clone)]
pub struct DistanceMatrix {
    group_a: Vec<ResidueId>,
    group_b: Vec<ResidueId>,
    /// Row-major |A|x|B| distances in Å.
    dist: Vec<f64>,
}

/// Contact metrics for one model at a primary cutoff plus a sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct CrossContactMetrics {
    /// Number of residue pairs within the primary cutoff.
    pub pairs_count: u32,
    /// `pairs_count / (|A| * |B|)`, always in [0, 1].
    pub density: f64,
    /// Global minimum of the distance matrix, independent of any cutoff.
    pub min_dist: f64,
    /// `(cutoff, pairs_count)` for each swept cutoff, cutoffs ascending.
    pub cutoff_sweep: Vec<(f64, u32)>,
}

impl DistanceMatrix {
    /// Build the distance matrix for groups `a` and `b` from `pdb`.
    ///
    /// Fails with [`AnalysisError::InvalidInput`] when either group is empty
    /// or none of its residues carry selectable atoms in the structure.
    /// Group residues missing from the structure are dropped with a warning;
    /// the matrix (and the density denominator) covers the residues found.
    pub fn build(pdb: &PDB, a: &ResidueSet, b: &ResidueSet, config: &ContactConfig) -> Result<Self> {
        if a.is_empty() || b.is_empty() {
            return Err(AnalysisError::InvalidInput(
                "contact groups must not be empty".to_string(),
            ));
        }

        let mut coords: HashMap<ResidueId, Vec<na::Vector3<f64>>> = HashMap::new();
        for hier in pdb.atoms_with_hierarchy() {
            let atom = hier.atom();
            let keep = match &config.selection {
                AtomSelection::HeavyAtoms => atom.element() != Some(&Element::H),
                AtomSelection::Representative(name) => atom.name() == name,
            };
            if !keep {
                continue;
            }
            let residue = ResidueId::new(hier.chain().id(), hier.residue().id().0);
            if a.contains(&residue) || b.contains(&residue) {
                let (x, y, z) = atom.pos();
                coords.entry(residue).or_default().push(na::Vector3::new(x, y, z));
            }
        }

        let group_a = found_residues(a, &coords, "A")?;
        let group_b = found_residues(b, &coords, "B")?;

        let mut dist = Vec::with_capacity(group_a.len() * group_b.len());
        for ra in &group_a {
            for rb in &group_b {
                dist.push(min_atom_distance(&coords[ra], &coords[rb]));
            }
        }
        Ok(Self { group_a, group_b, dist })
    }

    /// Residues of group A present in the matrix.
    pub fn group_a(&self) -> &[ResidueId] {
        &self.group_a
    }

    /// Residues of group B present in the matrix.
    pub fn group_b(&self) -> &[ResidueId] {
        &self.group_b
    }

    /// Global minimum distance, in Å.
    pub fn min_dist(&self) -> f64 {
        self.dist.iter().copied().fold(f64::INFINITY, f64::min)
    }

    /// Number of residue pairs at or below `cutoff`.
    pub fn pairs_count(&self, cutoff: f64) -> u32 {
        self.dist.iter().filter(|d| **d <= cutoff).count() as u32
    }

    /// Fraction of all pairs at or below `cutoff`.
    pub fn density(&self, cutoff: f64) -> f64 {
        self.pairs_count(cutoff) as f64 / self.dist.len() as f64
    }

    /// Threshold the cached matrix once per cutoff.
    ///
    /// Fails with [`AnalysisError::InvalidInput`] unless the cutoffs are
    /// strictly ascending.
    pub fn sweep(&self, cutoffs: &[f64]) -> Result<Vec<(f64, u32)>> {
        if cutoffs.windows(2).any(|w| w[0] >= w[1]) {
            return Err(AnalysisError::InvalidInput(format!(
                "cutoff sweep {cutoffs:?} is not strictly ascending"
            )));
        }
        Ok(cutoffs.iter().map(|&c| (c, self.pairs_count(c))).collect())
    }

    /// Assemble the per-model metrics record.
    pub fn metrics(&self, cutoff: f64, sweep_cutoffs: &[f64]) -> Result<CrossContactMetrics> {
        Ok(CrossContactMetrics {
            pairs_count: self.pairs_count(cutoff),
            density: self.density(cutoff),
            min_dist: self.min_dist(),
            cutoff_sweep: self.sweep(sweep_cutoffs)?,
        })
    }
}

/// Compute contact metrics for one model in a single call.
pub fn cross_contact_metrics(
    pdb: &PDB,
    a: &ResidueSet,
    b: &ResidueSet,
    cutoff: f64,
    sweep_cutoffs: &[f64],
    config: &ContactConfig,
) -> Result<CrossContactMetrics> {
    DistanceMatrix::build(pdb, a, b, config)?.metrics(cutoff, sweep_cutoffs)
}

fn found_residues(
    requested: &ResidueSet,
    coords: &HashMap<ResidueId, Vec<na::Vector3<f64>>>,
    group_name: &str,
) -> Result<Vec<ResidueId>> {
    let mut found = Vec::with_capacity(requested.len());
    for residue in requested.iter() {
        if coords.contains_key(residue) {
            found.push(residue.clone());
        } else {
            warn!("group {group_name}: residue {residue} has no selectable atoms in the structure");
        }
    }
    if found.is_empty() {
        return Err(AnalysisError::InvalidInput(format!(
            "no atoms found for any residue of group {group_name}"
        )));
    }
    Ok(found)
}

fn min_atom_distance(xs: &[na::Vector3<f64>], ys: &[na::Vector3<f64>]) -> f64 {
    let mut best = f64::INFINITY;
    for x in xs {
        for y in ys {
            best = best.min((x - y).norm());
        }
    }
    best
}

/// Build the cross-contact summary table: one row per model, one extra
/// column per swept cutoff.
pub fn cross_contact_df(rows: &[(ModelId, CrossContactMetrics)]) -> DataFrame {
    let mut df = df!(
        "label" => rows.iter().map(|(id, _)| id.as_str().to_owned()).collect::<Vec<String>>(),
        "pairs_count" => rows.iter().map(|(_, m)| m.pairs_count).collect::<Vec<u32>>(),
        "density" => rows.iter().map(|(_, m)| m.density).collect::<Vec<f64>>(),
        "min_dist" => rows.iter().map(|(_, m)| m.min_dist).collect::<Vec<f64>>(),
    )
    .unwrap();

    for (cutoff, column) in sweep_columns(rows.iter().map(|(_, m)| m)) {
        df.with_column(Series::new(format!("pairs_le_{cutoff}").into(), column))
            .unwrap();
    }
    df.sort(["label"], Default::default()).unwrap()
}

/// Collect the union of swept cutoffs and one `Option<u32>` column per
/// cutoff, in ascending order. Shared with the merged table builder.
pub(crate) fn sweep_columns<'a>(
    rows: impl Iterator<Item = &'a CrossContactMetrics> + Clone,
) -> Vec<(f64, Vec<Option<u32>>)> {
    let mut cutoffs: Vec<f64> = Vec::new();
    for m in rows.clone() {
        for (c, _) in &m.cutoff_sweep {
            if !cutoffs.contains(c) {
                cutoffs.push(*c);
            }
        }
    }
    cutoffs.sort_by(f64::total_cmp);

    cutoffs
        .into_iter()
        .map(|cutoff| {
            let column = rows
                .clone()
                .map(|m| {
                    m.cutoff_sweep
                        .iter()
                        .find(|(c, _)| *c == cutoff)
                        .map(|(_, n)| *n)
                })
                .collect();
            (cutoff, column)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::load_model;

    fn load_fixture() -> PDB {
        let root = env!("CARGO_MANIFEST_DIR");
        let path = format!("{}/{}", root, "test-data/gate.pdb");
        let (pdb, _) = load_model(&path).unwrap();
        pdb
    }

    fn groups() -> (ResidueSet, ResidueSet) {
        (
            ResidueSet::from_expr("A:1-3").unwrap(),
            ResidueSet::from_expr("B:10-13").unwrap(),
        )
    }

    #[test]
    fn hydrogens_are_excluded_from_distances() {
        let pdb = load_fixture();
        let (a, b) = groups();
        let m = DistanceMatrix::build(&pdb, &a, &b, &ContactConfig::default()).unwrap();
        // A:1 carries a hydrogen 0.1 Å from B:10's CA; the heavy-atom
        // minimum is the CA-CA distance.
        assert!((m.min_dist() - 3.0).abs() < 1e-6, "min_dist = {}", m.min_dist());
    }

    #[test]
    fn pair_counts_and_density() {
        let pdb = load_fixture();
        let (a, b) = groups();
        let m = DistanceMatrix::build(&pdb, &a, &b, &ContactConfig::default()).unwrap();
        assert_eq!(m.group_a().len(), 3);
        assert_eq!(m.group_b().len(), 4);
        assert_eq!(m.pairs_count(4.0), 1);
        assert_eq!(m.pairs_count(5.0), 3);
        assert!((m.density(5.0) - 0.25).abs() < 1e-9);
    }

    #[test]
    fn density_is_monotone_and_bounded() {
        let pdb = load_fixture();
        let (a, b) = groups();
        let m = DistanceMatrix::build(&pdb, &a, &b, &ContactConfig::default()).unwrap();
        let mut last = 0.0;
        for cutoff in [1.0, 3.0, 4.5, 6.0, 9.0, 15.0, 25.0] {
            let d = m.density(cutoff);
            assert!((0.0..=1.0).contains(&d));
            assert!(d >= last, "density must not decrease with cutoff");
            last = d;
        }
        assert_eq!(last, 1.0, "every pair is within 25 Å in the fixture");
    }

    #[test]
    fn sweep_reuses_the_matrix_and_stays_monotone() {
        let pdb = load_fixture();
        let (a, b) = groups();
        let m = DistanceMatrix::build(&pdb, &a, &b, &ContactConfig::default()).unwrap();
        let sweep = m.sweep(&[4.0, 5.0, 6.0]).unwrap();
        let counts: Vec<u32> = sweep.iter().map(|(_, n)| *n).collect();
        assert_eq!(counts, vec![1, 3, 3]);
        assert!(counts.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn non_ascending_sweep_is_rejected() {
        let pdb = load_fixture();
        let (a, b) = groups();
        let m = DistanceMatrix::build(&pdb, &a, &b, &ContactConfig::default()).unwrap();
        assert!(m.sweep(&[4.0, 4.0]).is_err());
        assert!(m.sweep(&[5.0, 4.0]).is_err());
        assert!(m.sweep(&[]).unwrap().is_empty());
    }

    #[test]
    fn empty_groups_are_invalid_input() {
        let pdb = load_fixture();
        let (a, _) = groups();
        let err = DistanceMatrix::build(&pdb, &a, &ResidueSet::default(), &ContactConfig::default())
            .unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidInput(_)));
    }

    #[test]
    fn absent_residues_are_dropped_not_fatal() {
        let pdb = load_fixture();
        let a = ResidueSet::from_expr("A:1-3,A:99").unwrap();
        let b = ResidueSet::from_expr("B:10").unwrap();
        let m = DistanceMatrix::build(&pdb, &a, &b, &ContactConfig::default()).unwrap();
        assert_eq!(m.group_a().len(), 3, "A:99 is not in the structure");
    }

    #[test]
    fn representative_atom_selection() {
        let pdb = load_fixture();
        let (a, b) = groups();
        let cfg = ContactConfig { selection: AtomSelection::Representative("CA".to_string()) };
        let m = DistanceMatrix::build(&pdb, &a, &b, &cfg).unwrap();
        assert!((m.min_dist() - 3.0).abs() < 1e-6);
    }

    #[test]
    fn summary_table_carries_sweep_columns() {
        let pdb = load_fixture();
        let (a, b) = groups();
        let metrics =
            cross_contact_metrics(&pdb, &a, &b, 4.0, &[4.0, 5.0], &ContactConfig::default())
                .unwrap();
        let df = cross_contact_df(&[(ModelId::new("WT"), metrics)]);
        let columns: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert!(columns.contains(&"pairs_le_4".to_string()));
        assert!(columns.contains(&"pairs_le_5".to_string()));
    }
}
