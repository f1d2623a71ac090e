//! Batch analysis across a directory of models.
//!
//! Each model's artifacts are independent, so the per-model work (profile
//! parse, surface/bond parse, contact analysis) runs across the rayon pool
//! with no shared mutable state. The merge is the synchronization barrier: a
//! failed metric is captured as a per-model error and never blocks the other
//! models, and scoring only runs once over the completed table.
//!
//! Artifact discovery follows the run-directory convention of the upstream
//! pipeline: for a model labelled `M`, the directory may contain
//! `M_pore.log`, `M_sasa.html`, `M_hbonds.txt` and `M.pdb` (or `M.cif`).

use crate::contacts::{cross_contact_metrics, ContactConfig, CrossContactMetrics};
use crate::error::{AnalysisError, Result};
use crate::gate::{gate_metrics, GateConfig, GateMetrics};
use crate::merge::{merge, MergedTable};
use crate::model::{Model, ModelId, ResidueSet, Role};
use crate::profile::parse_profile_log;
use crate::score::{region_plddt, score_rows, ScoreConfig, ScoreResult};
use crate::surface::{parse_hbond_report, parse_sasa_report, SurfaceBondRecord};
use crate::utils::{load_model, read_text};
use rayon::prelude::*;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Artifact paths for one model. Any of them may be absent; whatever exists
/// is analyzed.
#[derive(Debug, Clone)]
pub struct ModelInputs {
    /// Identity and role of the model.
    pub model: Model,
    /// Pore-profile log, if present.
    pub profile_log: Option<PathBuf>,
    /// Surface-area report, if present.
    pub sasa_report: Option<PathBuf>,
    /// Hydrogen-bond report, if present.
    pub hbond_report: Option<PathBuf>,
}

/// Immutable configuration for one batch run, passed into every component.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Gate-segment detection knobs.
    pub gate: GateConfig,
    /// Region of interest for per-residue SASA and confidence.
    pub region: ResidueSet,
    /// Contact group A; contact analysis is skipped when unset.
    pub group_a: Option<ResidueSet>,
    /// Contact group B.
    pub group_b: Option<ResidueSet>,
    /// Atom selection for contact distances.
    pub contact: ContactConfig,
    /// Primary contact cutoff, in Å.
    pub contact_cutoff: f64,
    /// Cutoff sweep, strictly ascending.
    pub sweep: Vec<f64>,
    /// Scoring thresholds.
    pub score: ScoreConfig,
    /// When set, a parse whose warning count exceeds this budget escalates
    /// to a parse failure for that metric.
    pub max_parse_warnings: Option<u32>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            gate: GateConfig::default(),
            region: ResidueSet::default(),
            group_a: None,
            group_b: None,
            contact: ContactConfig::default(),
            contact_cutoff: 4.0,
            sweep: vec![4.0, 4.5, 5.0],
            score: ScoreConfig::default(),
            max_parse_warnings: None,
        }
    }
}

/// One captured per-model, per-metric failure.
#[derive(Debug)]
pub struct MetricError {
    /// Label of the affected model.
    pub label: String,
    /// Which metric failed ("gate", "surface", "contacts", "structure",
    /// "scoring").
    pub metric: &'static str,
    /// The underlying error.
    pub error: AnalysisError,
}

/// Everything a batch run produced.
#[derive(Debug)]
pub struct BatchReport {
    /// The merged per-model table.
    pub merged: MergedTable,
    /// Scores, unless the scoring stage failed as a whole.
    pub scores: Option<Vec<ScoreResult>>,
    /// Per-model records for the surface tables.
    pub surface_rows: Vec<(ModelId, SurfaceBondRecord)>,
    /// Per-model gate metrics for the pore summary table.
    pub gate_rows: Vec<(ModelId, GateMetrics)>,
    /// Per-model contact metrics for the cross-contact table.
    pub contact_rows: Vec<(ModelId, CrossContactMetrics)>,
    /// Captured failures, attributed to model and metric.
    pub errors: Vec<MetricError>,
}

struct ModelOutcome {
    model: Model,
    gate: Option<Result<GateMetrics>>,
    surface: Option<Result<SurfaceBondRecord>>,
    contacts: Option<Result<CrossContactMetrics>>,
    confidence: Option<Vec<f64>>,
    structure_error: Option<AnalysisError>,
}

/// Scan a run directory for per-model artifacts.
///
/// The model whose label equals `baseline_label` becomes the baseline; all
/// others are candidates. Labels are matched exactly.
pub fn discover_models(dir: &Path, baseline_label: &str) -> Result<Vec<ModelInputs>> {
    let entries = std::fs::read_dir(dir).map_err(|source| AnalysisError::Io {
        path: dir.display().to_string(),
        source,
    })?;

    #[derive(Default)]
    struct Found {
        profile: Option<PathBuf>,
        sasa: Option<PathBuf>,
        hbonds: Option<PathBuf>,
        structure: Option<PathBuf>,
    }
    let mut by_label: BTreeMap<String, Found> = BTreeMap::new();

    for entry in entries.filter_map(|e| e.ok()) {
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()).map(str::to_owned) else {
            continue;
        };
        if let Some(label) = name.strip_suffix("_pore.log") {
            by_label.entry(label.to_string()).or_default().profile = Some(path);
        } else if let Some(label) = name.strip_suffix("_sasa.html") {
            by_label.entry(label.to_string()).or_default().sasa = Some(path);
        } else if let Some(label) = name.strip_suffix("_hbonds.txt") {
            by_label.entry(label.to_string()).or_default().hbonds = Some(path);
        } else if let Some(label) = name.strip_suffix(".pdb").or(name.strip_suffix(".cif")) {
            by_label.entry(label.to_string()).or_default().structure = Some(path);
        }
    }

    if by_label.is_empty() {
        return Err(AnalysisError::InvalidInput(format!(
            "no model artifacts found under {}",
            dir.display()
        )));
    }
    if !by_label.contains_key(baseline_label) {
        warn!("baseline label '{baseline_label}' has no artifacts; scoring will fail");
    }

    Ok(by_label
        .into_iter()
        .map(|(label, found)| {
            let role = if label == baseline_label {
                Role::Baseline
            } else {
                Role::Candidate
            };
            ModelInputs {
                model: Model {
                    id: ModelId::new(&label),
                    role,
                    structure: found.structure,
                },
                profile_log: found.profile,
                sasa_report: found.sasa,
                hbond_report: found.hbonds,
            }
        })
        .collect())
}

/// Run the whole batch: analyze every model in parallel, merge, then score.
///
/// The run always completes; per-model failures end up in
/// [`BatchReport::errors`] and the affected fields stay unavailable. Only a
/// missing baseline invalidates the scoring stage, and even then the merged
/// table is still returned.
pub fn run_batch(inputs: &[ModelInputs], config: &BatchConfig) -> BatchReport {
    let outcomes: Vec<ModelOutcome> = inputs
        .par_iter()
        .map(|input| analyze_model(input, config))
        .collect();

    let mut gate_rows = Vec::new();
    let mut surface_rows = Vec::new();
    let mut contact_rows = Vec::new();
    let mut confidence = HashMap::new();
    let mut errors = Vec::new();
    let mut models = Vec::new();

    fn collect<T>(
        errors: &mut Vec<MetricError>,
        label: &str,
        metric: &'static str,
        result: Option<Result<T>>,
    ) -> Option<T> {
        match result {
            Some(Ok(value)) => Some(value),
            Some(Err(error)) => {
                errors.push(MetricError { label: label.to_string(), metric, error });
                None
            }
            None => None,
        }
    }

    for outcome in outcomes {
        let label = outcome.model.id.as_str().to_string();
        if let Some(g) = collect(&mut errors, &label, "gate", outcome.gate) {
            gate_rows.push((outcome.model.id.clone(), g));
        }
        if let Some(s) = collect(&mut errors, &label, "surface", outcome.surface) {
            surface_rows.push((outcome.model.id.clone(), s));
        }
        if let Some(c) = collect(&mut errors, &label, "contacts", outcome.contacts) {
            contact_rows.push((outcome.model.id.clone(), c));
        }
        if let Some(error) = outcome.structure_error {
            errors.push(MetricError { label: label.clone(), metric: "structure", error });
        }
        if let Some(values) = outcome.confidence {
            confidence.insert(outcome.model.id.clone(), values);
        }
        models.push(outcome.model);
    }

    let merged = merge(
        &models,
        gate_rows.clone(),
        surface_rows.clone(),
        contact_rows.clone(),
    );
    info!(
        "merged {} models ({} partial rows, {} captured errors)",
        merged.rows.len(),
        merged.partial_rows,
        errors.len()
    );

    let scores = match score_rows(&merged, &config.score, &confidence) {
        Ok(scores) => Some(scores),
        Err(error) => {
            errors.push(MetricError {
                label: "<run>".to_string(),
                metric: "scoring",
                error,
            });
            None
        }
    };

    BatchReport { merged, scores, surface_rows, gate_rows, contact_rows, errors }
}

fn analyze_model(input: &ModelInputs, config: &BatchConfig) -> ModelOutcome {
    let label = input.model.id.as_str();
    debug!("analyzing model {label}");

    let gate = input.profile_log.as_deref().map(|path| {
        let text = read_text(path)?;
        gate_metrics(&parse_profile_log(&text)?, &config.gate)
    });

    let surface = analyze_surface(input, config);

    let (contacts, confidence, structure_error) = analyze_structure(input, config);

    ModelOutcome {
        model: input.model.clone(),
        gate,
        surface,
        contacts,
        confidence,
        structure_error,
    }
}

fn analyze_surface(
    input: &ModelInputs,
    config: &BatchConfig,
) -> Option<Result<SurfaceBondRecord>> {
    if input.sasa_report.is_none() && input.hbond_report.is_none() {
        return None;
    }
    let run = || -> Result<SurfaceBondRecord> {
        let sasa = input
            .sasa_report
            .as_deref()
            .map(|path| read_text(path).map(|text| parse_sasa_report(&text, &config.region)))
            .transpose()?;
        let hbonds = input
            .hbond_report
            .as_deref()
            .map(|path| read_text(path).map(|text| parse_hbond_report(&text)))
            .transpose()?;
        let record = SurfaceBondRecord::from_reports(sasa, hbonds);
        if record.is_vacant() {
            return Err(AnalysisError::Parse {
                kind: "surface/bond reports",
                reason: "no measurements could be extracted".to_string(),
            });
        }
        if let Some(budget) = config.max_parse_warnings {
            if record.parse_warnings > budget {
                return Err(AnalysisError::Parse {
                    kind: "surface/bond reports",
                    reason: format!(
                        "{} parse warnings exceed the budget of {budget}",
                        record.parse_warnings
                    ),
                });
            }
        }
        Ok(record)
    };
    Some(run())
}

/// Contact metrics and per-residue confidence both come from the coordinate
/// file, so it is loaded once here.
#[allow(clippy::type_complexity)]
fn analyze_structure(
    input: &ModelInputs,
    config: &BatchConfig,
) -> (
    Option<Result<CrossContactMetrics>>,
    Option<Vec<f64>>,
    Option<AnalysisError>,
) {
    let Some(path) = input.model.structure.as_deref() else {
        return (None, None, None);
    };
    let contacts_requested = config.group_a.is_some() && config.group_b.is_some();
    let loaded = load_model(&path.display().to_string());
    let pdb = match loaded {
        Ok((pdb, diagnostics)) => {
            for d in diagnostics {
                debug!("{}: {d}", input.model.id);
            }
            pdb
        }
        Err(error) => {
            // Blame the contacts metric only when contacts actually needed
            // the file; otherwise report a plain structure failure.
            return if contacts_requested {
                (Some(Err(error)), None, None)
            } else {
                (None, None, Some(error))
            };
        }
    };

    let contacts = match (&config.group_a, &config.group_b) {
        (Some(a), Some(b)) => Some(cross_contact_metrics(
            &pdb,
            a,
            b,
            config.contact_cutoff,
            &config.sweep,
            &config.contact,
        )),
        _ => None,
    };

    let confidence = if config.region.is_empty() {
        None
    } else {
        let values = region_plddt(&pdb, &config.region);
        (!values.is_empty()).then_some(values)
    };

    (contacts, confidence, None)
}
