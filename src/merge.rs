//! Joining per-model metrics into one table.
//!
//! This stage is a data-integrity join, not a transform. Rows are keyed by
//! the exact model label and any subset of sources may be present for a
//! label. Fields from absent sources stay `None` and render as nulls in the
//! merged table, never as a numeric default.

use crate::contacts::{sweep_columns, CrossContactMetrics};
use crate::gate::GateMetrics;
use crate::model::{Model, ModelId, Role};
use crate::surface::SurfaceBondRecord;
use polars::prelude::*;
use std::collections::BTreeMap;
use tracing::debug;

/// One merged row: the union of whatever sources reported for this label.
#[derive(Debug, Clone)]
pub struct MetricsRow {
    /// Model identity, the merge key.
    pub id: ModelId,
    /// Declared role, if the label was declared in the model list.
    pub role: Option<Role>,
    /// Gate metrics, if a pore profile was analyzed.
    pub gate: Option<GateMetrics>,
    /// Surface/H-bond measurements, if either report was parsed.
    pub surface: Option<SurfaceBondRecord>,
    /// Contact metrics, if a contact analysis ran.
    pub contacts: Option<CrossContactMetrics>,
}

impl MetricsRow {
    fn empty(id: ModelId) -> Self {
        Self { id, role: None, gate: None, surface: None, contacts: None }
    }

    /// True when at least one source is missing for this row.
    pub fn is_partial(&self) -> bool {
        self.gate.is_none() || self.surface.is_none() || self.contacts.is_none()
    }
}

/// The merged table plus its run-level partial-data warning count.
#[derive(Debug, Clone, Default)]
pub struct MergedTable {
    /// Rows ordered by label.
    pub rows: Vec<MetricsRow>,
    /// Number of rows lacking one or more sources.
    pub partial_rows: u32,
}

/// Join the per-model outputs of the three sources by exact label.
///
/// Every label seen in any source (or declared in `models`) produces a row;
/// no fuzzy matching is attempted.
pub fn merge(
    models: &[Model],
    gate: Vec<(ModelId, GateMetrics)>,
    surface: Vec<(ModelId, SurfaceBondRecord)>,
    contacts: Vec<(ModelId, CrossContactMetrics)>,
) -> MergedTable {
    fn row<'a>(rows: &'a mut BTreeMap<ModelId, MetricsRow>, id: &ModelId) -> &'a mut MetricsRow {
        rows.entry(id.clone()).or_insert_with(|| MetricsRow::empty(id.clone()))
    }

    let mut rows: BTreeMap<ModelId, MetricsRow> = BTreeMap::new();
    for model in models {
        row(&mut rows, &model.id).role = Some(model.role);
    }
    for (id, g) in gate {
        row(&mut rows, &id).gate = Some(g);
    }
    for (id, s) in surface {
        row(&mut rows, &id).surface = Some(s);
    }
    for (id, c) in contacts {
        row(&mut rows, &id).contacts = Some(c);
    }

    let rows: Vec<MetricsRow> = rows.into_values().collect();
    let partial_rows = rows.iter().filter(|r| r.is_partial()).count() as u32;
    if partial_rows > 0 {
        debug!("{partial_rows} of {} merged rows have missing sources", rows.len());
    }
    MergedTable { rows, partial_rows }
}

/// Build the merged metrics table: one row per model, nulls for absent
/// sources, plus one column per swept contact cutoff.
pub fn merged_df(table: &MergedTable) -> DataFrame {
    let rows = &table.rows;
    let mut df = df!(
        "label" => rows.iter().map(|r| r.id.as_str().to_owned()).collect::<Vec<String>>(),
        "role" => rows.iter().map(|r| r.role.map(|x| x.to_string())).collect::<Vec<Option<String>>>(),
        "min_radius" => rows.iter().map(|r| r.gate.map(|g| g.min_radius)).collect::<Vec<Option<f64>>>(),
        "min_radius_position" => rows.iter().map(|r| r.gate.map(|g| g.min_radius_position)).collect::<Vec<Option<f64>>>(),
        "gate_start" => rows.iter().map(|r| r.gate.map(|g| g.gate_start)).collect::<Vec<Option<f64>>>(),
        "gate_end" => rows.iter().map(|r| r.gate.map(|g| g.gate_end)).collect::<Vec<Option<f64>>>(),
        "gate_length" => rows.iter().map(|r| r.gate.map(|g| g.gate_length)).collect::<Vec<Option<f64>>>(),
        "degenerate" => rows.iter().map(|r| r.gate.map(|g| g.degenerate)).collect::<Vec<Option<bool>>>(),
        "total_sasa" => rows.iter().map(|r| r.surface.as_ref().and_then(|s| s.total_sasa)).collect::<Vec<Option<f64>>>(),
        "hbond_count" => rows.iter().map(|r| r.surface.as_ref().and_then(|s| s.hbond_count)).collect::<Vec<Option<u32>>>(),
        "parse_warnings" => rows.iter().map(|r| r.surface.as_ref().map(|s| s.parse_warnings)).collect::<Vec<Option<u32>>>(),
        "pairs_count" => rows.iter().map(|r| r.contacts.as_ref().map(|c| c.pairs_count)).collect::<Vec<Option<u32>>>(),
        "density" => rows.iter().map(|r| r.contacts.as_ref().map(|c| c.density)).collect::<Vec<Option<f64>>>(),
        "min_dist" => rows.iter().map(|r| r.contacts.as_ref().map(|c| c.min_dist)).collect::<Vec<Option<f64>>>(),
    )
    .unwrap();

    let with_contacts: Vec<&CrossContactMetrics> =
        rows.iter().filter_map(|r| r.contacts.as_ref()).collect();
    for (cutoff, column) in sweep_columns(with_contacts.iter().copied()) {
        // Spread the per-cutoff columns back over all rows, null where the
        // row had no contact analysis.
        let mut values = Vec::with_capacity(rows.len());
        let mut present = column.into_iter();
        for r in rows {
            values.push(match r.contacts {
                Some(_) => present.next().flatten(),
                None => None,
            });
        }
        df.with_column(Series::new(format!("pairs_le_{cutoff}").into(), values))
            .unwrap();
    }
    df
}
