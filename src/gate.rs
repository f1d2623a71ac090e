//! Gate metrics derived from a pore profile.
//!
//! The gate is the constriction of the pore: the narrowest sample plus the
//! maximal contiguous run of samples around it whose radius stays within a
//! margin of that minimum.

use crate::error::{AnalysisError, Result};
use crate::model::ModelId;
use crate::profile::PoreProfile;
use polars::prelude::*;

/// Tuning knobs for gate-segment detection.
#[derive(Debug, Clone, Copy)]
pub struct GateConfig {
    /// Radius tolerance (Å) above the minimum that still counts as gate.
    pub margin: f64,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self { margin: 0.5 }
    }
}

/// Gate geometry for one model, derived from its [`PoreProfile`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GateMetrics {
    /// Smallest radius in the profile, in Å.
    pub min_radius: f64,
    /// Axial position of the minimum (first occurrence on ties).
    pub min_radius_position: f64,
    /// Axial start of the gate segment.
    pub gate_start: f64,
    /// Axial end of the gate segment.
    pub gate_end: f64,
    /// `gate_end - gate_start`, always >= 0.
    pub gate_length: f64,
    /// True when the minimum sits on a profile endpoint, i.e. the profile is
    /// monotonic and shows no interior constriction. Such results are
    /// lower-confidence, not invalid.
    pub degenerate: bool,
}

/// Compute gate metrics from a profile.
///
/// The minimum is global; ties are broken towards the lowest axial position.
/// The gate segment is the maximal contiguous run of samples containing the
/// minimum with radius <= `min_radius + margin`.
pub fn gate_metrics(profile: &PoreProfile, config: &GateConfig) -> Result<GateMetrics> {
    let samples = profile.samples();
    if samples.is_empty() {
        return Err(AnalysisError::InvalidInput(
            "cannot derive gate metrics from an empty profile".to_string(),
        ));
    }

    // Strictly-less keeps the first occurrence; samples are axially sorted.
    let mut min_idx = 0;
    for (i, s) in samples.iter().enumerate() {
        if s.radius < samples[min_idx].radius {
            min_idx = i;
        }
    }
    let min_radius = samples[min_idx].radius;
    let threshold = min_radius + config.margin;

    let mut start = min_idx;
    while start > 0 && samples[start - 1].radius <= threshold {
        start -= 1;
    }
    let mut end = min_idx;
    while end + 1 < samples.len() && samples[end + 1].radius <= threshold {
        end += 1;
    }

    let gate_start = samples[start].axial;
    let gate_end = samples[end].axial;
    Ok(GateMetrics {
        min_radius,
        min_radius_position: samples[min_idx].axial,
        gate_start,
        gate_end,
        gate_length: gate_end - gate_start,
        degenerate: min_idx == 0 || min_idx == samples.len() - 1,
    })
}

/// Build the pore summary table: one row per model.
pub fn pore_summary_df(rows: &[(ModelId, GateMetrics)]) -> DataFrame {
    df!(
        "label" => rows.iter().map(|(id, _)| id.as_str().to_owned()).collect::<Vec<String>>(),
        "min_radius" => rows.iter().map(|(_, g)| g.min_radius).collect::<Vec<f64>>(),
        "min_radius_position" => rows.iter().map(|(_, g)| g.min_radius_position).collect::<Vec<f64>>(),
        "gate_start" => rows.iter().map(|(_, g)| g.gate_start).collect::<Vec<f64>>(),
        "gate_end" => rows.iter().map(|(_, g)| g.gate_end).collect::<Vec<f64>>(),
        "gate_length" => rows.iter().map(|(_, g)| g.gate_length).collect::<Vec<f64>>(),
        "degenerate" => rows.iter().map(|(_, g)| g.degenerate).collect::<Vec<bool>>(),
    )
    .unwrap()
    .sort(["label"], Default::default())
    .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::PoreProfile;

    fn profile(samples: &[(f64, f64)]) -> PoreProfile {
        PoreProfile::from_samples(samples.iter().copied()).unwrap()
    }

    #[test]
    fn flat_bottom_gate_segment() {
        let p = profile(&[(0.0, 10.0), (1.0, 6.0), (2.0, 4.0), (3.0, 4.0), (4.0, 7.0), (5.0, 12.0)]);
        let g = gate_metrics(&p, &GateConfig { margin: 1.0 }).unwrap();
        assert_eq!(g.min_radius, 4.0);
        assert_eq!(g.min_radius_position, 2.0, "first occurrence wins the tie");
        assert_eq!(g.gate_start, 2.0);
        assert_eq!(g.gate_end, 3.0);
        assert_eq!(g.gate_length, 1.0);
        assert!(!g.degenerate);
    }

    #[test]
    fn zero_margin_single_minimum_collapses_to_a_point() {
        let p = profile(&[(0.0, 5.0), (1.0, 2.0), (2.0, 6.0)]);
        let g = gate_metrics(&p, &GateConfig { margin: 0.0 }).unwrap();
        assert_eq!(g.gate_length, 0.0);
        assert_eq!(g.gate_start, g.min_radius_position);
        assert_eq!(g.gate_end, g.min_radius_position);
    }

    #[test]
    fn monotonic_profile_is_degenerate_but_still_reported() {
        let p = profile(&[(0.0, 1.0), (1.0, 2.0), (2.0, 3.0)]);
        let g = gate_metrics(&p, &GateConfig::default()).unwrap();
        assert!(g.degenerate);
        assert_eq!(g.min_radius, 1.0);
        assert_eq!(g.min_radius_position, 0.0);
        assert!(g.gate_length >= 0.0);
    }

    #[test]
    fn margin_widens_the_segment() {
        let p = profile(&[(0.0, 9.0), (1.0, 3.4), (2.0, 3.0), (3.0, 3.3), (4.0, 8.0)]);
        let narrow = gate_metrics(&p, &GateConfig { margin: 0.0 }).unwrap();
        let wide = gate_metrics(&p, &GateConfig { margin: 0.5 }).unwrap();
        assert_eq!(narrow.gate_length, 0.0);
        assert_eq!((wide.gate_start, wide.gate_end), (1.0, 3.0));
        assert_eq!(wide.gate_length, 2.0);
    }

    #[test]
    fn summary_table_has_one_row_per_model() {
        let p = profile(&[(0.0, 5.0), (1.0, 2.0), (2.0, 6.0)]);
        let g = gate_metrics(&p, &GateConfig::default()).unwrap();
        let df = pore_summary_df(&[
            (crate::model::ModelId::new("WT"), g),
            (crate::model::ModelId::new("DMI"), g),
        ]);
        assert_eq!(df.height(), 2);
        let columns: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert!(columns.contains(&"gate_length".to_string()));
    }
}
