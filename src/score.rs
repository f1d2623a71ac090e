//! Baseline-relative scoring of merged metrics.
//!
//! Sign convention (fixed, additive): positive contributions mean tightening
//! or burial relative to the baseline.
//! - smaller `min_radius` than baseline: positive,
//! - shorter `gate_length` than baseline: positive,
//! - smaller `total_sasa` than baseline (more buried gate): positive,
//! - more hydrogen bonds than baseline: positive.
//!
//! Each comparison is scaled by the baseline magnitude (with a 1.0 floor so
//! near-zero baselines compare absolutely), summed per component, and the
//! total is banded against a symmetric epsilon to classify the model.
//!
//! A missing measurement never reads as "no change": rows lacking gate or
//! hydro inputs keep the corresponding score fields unavailable.

use crate::error::{AnalysisError, Result};
use crate::merge::{MergedTable, MetricsRow};
use crate::model::{ModelId, ResidueId, ResidueSet, Role};
use pdbtbx::{ContainsAtomConformer, ContainsAtomConformerResidue, ContainsAtomConformerResidueChain, PDB};
use polars::prelude::*;
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

/// Scoring thresholds.
#[derive(Debug, Clone, Copy)]
pub struct ScoreConfig {
    /// Half-width of the "similar to WT" band around zero.
    pub epsilon: f64,
}

impl Default for ScoreConfig {
    fn default() -> Self {
        Self { epsilon: 0.05 }
    }
}

/// Qualitative comparison of a model against the baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreClass {
    /// Total score above +epsilon: tighter/more stabilized than baseline.
    BetterThanWt,
    /// Total score within the epsilon band.
    SimilarToWt,
    /// Total score below -epsilon.
    WorseThanWt,
}

impl fmt::Display for ScoreClass {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ScoreClass::BetterThanWt => write!(f, "better_than_WT"),
            ScoreClass::SimilarToWt => write!(f, "similar_to_WT"),
            ScoreClass::WorseThanWt => write!(f, "worse_than_WT"),
        }
    }
}

/// Banded structural confidence, from per-residue pLDDT values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfidenceClass {
    /// Mean pLDDT below 70.
    Low,
    /// Mean pLDDT in [70, 90).
    Medium,
    /// Mean pLDDT of 90 or above.
    High,
}

impl fmt::Display for ConfidenceClass {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfidenceClass::Low => write!(f, "low"),
            ConfidenceClass::Medium => write!(f, "medium"),
            ConfidenceClass::High => write!(f, "high"),
        }
    }
}

/// Summary of per-residue confidence values over the gate region.
///
/// Kept separate from the quantitative scores: confidence qualifies how much
/// to trust a row, it never shifts `total_score`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceSummary {
    /// Mean pLDDT.
    pub mean: f64,
    /// Median pLDDT.
    pub median: f64,
    /// Residues with pLDDT < 70.
    pub n_low: u32,
    /// Residues with 70 <= pLDDT < 90.
    pub n_medium: u32,
    /// Residues with pLDDT >= 90.
    pub n_high: u32,
    /// Band of the mean.
    pub class: ConfidenceClass,
}

/// Quantitative and qualitative scores for one merged row.
#[derive(Debug, Clone)]
pub struct ScoreResult {
    /// Model identity.
    pub id: ModelId,
    /// Gate-tightening component, unavailable without gate metrics on both
    /// sides of the comparison.
    pub gate_tight_score: Option<f64>,
    /// Surface/H-bond component, unavailable without complete surface
    /// measurements on both sides.
    pub hydro_score: Option<f64>,
    /// `gate_tight_score + hydro_score`, unavailable if either is.
    pub total_score: Option<f64>,
    /// Banded classification of `total_score`.
    pub score_class: Option<ScoreClass>,
    /// Confidence summary, if per-residue values were supplied.
    pub confidence: Option<ConfidenceSummary>,
}

/// Baseline-scaled signed difference; positive when `value` is below the
/// baseline. The 1.0 floor keeps near-zero baselines (e.g. a point gate with
/// zero length) from blowing up the ratio.
fn rel_delta(baseline: f64, value: f64) -> f64 {
    (baseline - value) / baseline.abs().max(1.0)
}

/// Score every merged row against the single baseline row.
///
/// Fails with [`AnalysisError::MissingBaseline`] when no row carries the
/// baseline role, and with [`AnalysisError::InvalidInput`] when several do.
/// Per-residue confidence values may be supplied per label; they only feed
/// the confidence summary.
pub fn score_rows(
    table: &MergedTable,
    config: &ScoreConfig,
    confidence: &HashMap<ModelId, Vec<f64>>,
) -> Result<Vec<ScoreResult>> {
    let mut baselines = table.rows.iter().filter(|r| r.role == Some(Role::Baseline));
    let baseline = baselines.next().ok_or(AnalysisError::MissingBaseline)?;
    if baselines.next().is_some() {
        return Err(AnalysisError::InvalidInput(
            "more than one model is flagged as baseline".to_string(),
        ));
    }
    debug!("scoring {} rows against baseline {}", table.rows.len(), baseline.id);

    Ok(table
        .rows
        .iter()
        .map(|row| {
            let gate_tight_score = gate_component(baseline, row);
            let hydro_score = hydro_component(baseline, row);
            let total_score = match (gate_tight_score, hydro_score) {
                (Some(g), Some(h)) => Some(g + h),
                _ => None,
            };
            let score_class = total_score.map(|t| classify(t, config.epsilon));
            ScoreResult {
                id: row.id.clone(),
                gate_tight_score,
                hydro_score,
                total_score,
                score_class,
                confidence: confidence.get(&row.id).and_then(|v| summarize_confidence(v)),
            }
        })
        .collect())
}

fn gate_component(baseline: &MetricsRow, row: &MetricsRow) -> Option<f64> {
    let b = baseline.gate?;
    let g = row.gate?;
    Some(rel_delta(b.min_radius, g.min_radius) + rel_delta(b.gate_length, g.gate_length))
}

fn hydro_component(baseline: &MetricsRow, row: &MetricsRow) -> Option<f64> {
    let b = baseline.surface.as_ref()?;
    let s = row.surface.as_ref()?;
    // Both terms must be measurable on both sides; scoring half a component
    // would silently treat the missing half as "no change".
    let sasa = rel_delta(b.total_sasa?, s.total_sasa?);
    let hbonds = (s.hbond_count? as f64 - b.hbond_count? as f64)
        / (b.hbond_count? as f64).max(1.0);
    Some(sasa + hbonds)
}

fn classify(total: f64, epsilon: f64) -> ScoreClass {
    if total > epsilon {
        ScoreClass::BetterThanWt
    } else if total < -epsilon {
        ScoreClass::WorseThanWt
    } else {
        ScoreClass::SimilarToWt
    }
}

/// Summarize per-residue pLDDT values; `None` for an empty slice.
pub fn summarize_confidence(values: &[f64]) -> Option<ConfidenceSummary> {
    if values.is_empty() {
        return None;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    let median = if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    };

    let n_low = values.iter().filter(|v| **v < 70.0).count() as u32;
    let n_high = values.iter().filter(|v| **v >= 90.0).count() as u32;
    let n_medium = values.len() as u32 - n_low - n_high;

    let class = if mean >= 90.0 {
        ConfidenceClass::High
    } else if mean >= 70.0 {
        ConfidenceClass::Medium
    } else {
        ConfidenceClass::Low
    };
    Some(ConfidenceSummary { mean, median, n_low, n_medium, n_high, class })
}

/// Mean per-residue B-factor over `region`, read as pLDDT (the convention
/// predicted structures use for per-residue confidence).
pub fn region_plddt(pdb: &PDB, region: &ResidueSet) -> Vec<f64> {
    let mut sums: HashMap<ResidueId, (f64, usize)> = HashMap::new();
    for hier in pdb.atoms_with_hierarchy() {
        let residue = ResidueId::new(hier.chain().id(), hier.residue().id().0);
        if region.contains(&residue) {
            let entry = sums.entry(residue).or_insert((0.0, 0));
            entry.0 += hier.atom().b_factor();
            entry.1 += 1;
        }
    }
    region
        .iter()
        .filter_map(|r| sums.get(r).map(|(sum, n)| sum / *n as f64))
        .collect()
}

/// Build the scored metrics table: the merged table plus score columns.
pub fn scored_df(table: &MergedTable, scores: &[ScoreResult]) -> DataFrame {
    let scores_df = df!(
        "label" => scores.iter().map(|s| s.id.as_str().to_owned()).collect::<Vec<String>>(),
        "gate_tight_score" => scores.iter().map(|s| s.gate_tight_score).collect::<Vec<Option<f64>>>(),
        "hydro_score" => scores.iter().map(|s| s.hydro_score).collect::<Vec<Option<f64>>>(),
        "total_score" => scores.iter().map(|s| s.total_score).collect::<Vec<Option<f64>>>(),
        "score_class" => scores.iter().map(|s| s.score_class.map(|c| c.to_string())).collect::<Vec<Option<String>>>(),
        "confidence_mean" => scores.iter().map(|s| s.confidence.map(|c| c.mean)).collect::<Vec<Option<f64>>>(),
        "confidence_median" => scores.iter().map(|s| s.confidence.map(|c| c.median)).collect::<Vec<Option<f64>>>(),
        "confidence_class" => scores.iter().map(|s| s.confidence.map(|c| c.class.to_string())).collect::<Vec<Option<String>>>(),
    )
    .unwrap();

    crate::merge::merged_df(table)
        .lazy()
        .join(
            scores_df.lazy(),
            [col("label")],
            [col("label")],
            JoinArgs::new(JoinType::Left),
        )
        .sort(["label"], Default::default())
        .collect()
        .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contacts::CrossContactMetrics;
    use crate::gate::GateMetrics;
    use crate::merge::merge;
    use crate::model::Model;
    use crate::surface::SurfaceBondRecord;

    fn gate(min_radius: f64, gate_length: f64) -> GateMetrics {
        GateMetrics {
            min_radius,
            min_radius_position: 0.0,
            gate_start: 0.0,
            gate_end: gate_length,
            gate_length,
            degenerate: false,
        }
    }

    fn surface(total_sasa: Option<f64>, hbond_count: Option<u32>) -> SurfaceBondRecord {
        SurfaceBondRecord {
            total_sasa,
            hbond_count,
            per_residue_sasa: vec![],
            parse_warnings: 0,
        }
    }

    fn models(labels: &[(&str, Role)]) -> Vec<Model> {
        labels
            .iter()
            .map(|(label, role)| Model {
                id: ModelId::new(label),
                role: *role,
                structure: None,
            })
            .collect()
    }

    fn table_with(rows: Vec<(&str, Role, GateMetrics, SurfaceBondRecord)>) -> MergedTable {
        let declared = models(&rows.iter().map(|(l, r, _, _)| (*l, *r)).collect::<Vec<_>>());
        merge(
            &declared,
            rows.iter().map(|(l, _, g, _)| (ModelId::new(l), *g)).collect(),
            rows.iter().map(|(l, _, _, s)| (ModelId::new(l), s.clone())).collect(),
            vec![],
        )
    }

    #[test]
    fn baseline_scores_zero_against_itself() {
        let table = table_with(vec![(
            "WT",
            Role::Baseline,
            gate(2.0, 3.0),
            surface(Some(800.0), Some(4)),
        )]);
        let scores = score_rows(&table, &ScoreConfig::default(), &HashMap::new()).unwrap();
        assert_eq!(scores.len(), 1);
        assert_eq!(scores[0].total_score, Some(0.0));
        assert_eq!(scores[0].score_class, Some(ScoreClass::SimilarToWt));
    }

    #[test]
    fn tightening_scores_positive() {
        let table = table_with(vec![
            ("WT", Role::Baseline, gate(2.0, 3.0), surface(Some(800.0), Some(4))),
            ("M1", Role::Candidate, gate(1.0, 1.0), surface(Some(600.0), Some(6))),
        ]);
        let scores = score_rows(&table, &ScoreConfig::default(), &HashMap::new()).unwrap();
        let m1 = scores.iter().find(|s| s.id.as_str() == "M1").unwrap();
        // min_radius: (2-1)/2 = 0.5; gate_length: (3-1)/3 = 2/3
        assert!((m1.gate_tight_score.unwrap() - (0.5 + 2.0 / 3.0)).abs() < 1e-9);
        // sasa: (800-600)/800 = 0.25; hbonds: (6-4)/4 = 0.5
        assert!((m1.hydro_score.unwrap() - 0.75).abs() < 1e-9);
        assert_eq!(m1.score_class, Some(ScoreClass::BetterThanWt));
    }

    #[test]
    fn widening_scores_negative() {
        let table = table_with(vec![
            ("WT", Role::Baseline, gate(2.0, 3.0), surface(Some(800.0), Some(4))),
            ("M2", Role::Candidate, gate(3.0, 5.0), surface(Some(1000.0), Some(2))),
        ]);
        let scores = score_rows(&table, &ScoreConfig::default(), &HashMap::new()).unwrap();
        let m2 = scores.iter().find(|s| s.id.as_str() == "M2").unwrap();
        assert!(m2.total_score.unwrap() < 0.0);
        assert_eq!(m2.score_class, Some(ScoreClass::WorseThanWt));
    }

    #[test]
    fn missing_inputs_leave_scores_unavailable() {
        let declared = models(&[("WT", Role::Baseline), ("M3", Role::Candidate)]);
        let table = merge(
            &declared,
            vec![
                (ModelId::new("WT"), gate(2.0, 3.0)),
                (ModelId::new("M3"), gate(1.5, 2.0)),
            ],
            // M3 has a SASA value but no H-bond count: hydro must stay
            // unavailable, not read as "no change".
            vec![
                (ModelId::new("WT"), surface(Some(800.0), Some(4))),
                (ModelId::new("M3"), surface(Some(700.0), None)),
            ],
            vec![],
        );
        let scores = score_rows(&table, &ScoreConfig::default(), &HashMap::new()).unwrap();
        let m3 = scores.iter().find(|s| s.id.as_str() == "M3").unwrap();
        assert!(m3.gate_tight_score.is_some());
        assert!(m3.hydro_score.is_none());
        assert!(m3.total_score.is_none());
        assert!(m3.score_class.is_none());
    }

    #[test]
    fn no_baseline_is_fatal_for_scoring() {
        let table = table_with(vec![(
            "M1",
            Role::Candidate,
            gate(2.0, 3.0),
            surface(Some(800.0), Some(4)),
        )]);
        let err = score_rows(&table, &ScoreConfig::default(), &HashMap::new()).unwrap_err();
        assert!(matches!(err, AnalysisError::MissingBaseline));
    }

    #[test]
    fn duplicate_baselines_are_rejected() {
        let table = table_with(vec![
            ("WT1", Role::Baseline, gate(2.0, 3.0), surface(Some(800.0), Some(4))),
            ("WT2", Role::Baseline, gate(2.0, 3.0), surface(Some(800.0), Some(4))),
        ]);
        let err = score_rows(&table, &ScoreConfig::default(), &HashMap::new()).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidInput(_)));
    }

    #[test]
    fn confidence_summary_bands() {
        let summary = summarize_confidence(&[95.0, 91.0, 60.0]).unwrap();
        assert!((summary.mean - 82.0).abs() < 1e-9);
        assert_eq!(summary.median, 91.0);
        assert_eq!((summary.n_low, summary.n_medium, summary.n_high), (1, 0, 2));
        assert_eq!(summary.class, ConfidenceClass::Medium);

        assert!(summarize_confidence(&[]).is_none());
        assert_eq!(summarize_confidence(&[96.0, 94.0]).unwrap().class, ConfidenceClass::High);
        assert_eq!(summarize_confidence(&[40.0]).unwrap().class, ConfidenceClass::Low);
    }

    #[test]
    fn confidence_never_changes_total_score() {
        let table = table_with(vec![(
            "WT",
            Role::Baseline,
            gate(2.0, 3.0),
            surface(Some(800.0), Some(4)),
        )]);
        let mut confidence = HashMap::new();
        confidence.insert(ModelId::new("WT"), vec![40.0, 45.0]);
        let scores = score_rows(&table, &ScoreConfig::default(), &confidence).unwrap();
        assert_eq!(scores[0].total_score, Some(0.0));
        assert_eq!(scores[0].confidence.unwrap().class, ConfidenceClass::Low);
    }

    #[test]
    fn scored_table_joins_on_label() {
        let table = table_with(vec![
            ("WT", Role::Baseline, gate(2.0, 3.0), surface(Some(800.0), Some(4))),
            ("M1", Role::Candidate, gate(1.0, 1.0), surface(Some(600.0), Some(6))),
        ]);
        let scores = score_rows(&table, &ScoreConfig::default(), &HashMap::new()).unwrap();
        let df = scored_df(&table, &scores);
        assert_eq!(df.height(), 2);
        let columns: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert!(columns.contains(&"total_score".to_string()));
        assert!(columns.contains(&"score_class".to_string()));
        assert!(columns.contains(&"min_radius".to_string()));
    }
}
