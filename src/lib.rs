#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

//! # Porescore Library
//!
//! This library batch-analyzes structural models (wild type and point
//! mutants) of a membrane channel. It parses the loosely-structured logs of
//! external profiling/visualization tools into typed per-model records,
//! measures residue-contact geometry directly on atomic coordinates, joins
//! everything into one table per model, and scores every model against a
//! designated baseline.
//!
//! Results are returned as Polars DataFrames, which can be written to CSV,
//! Parquet or JSON through [`write_df_to_file`].

pub mod batch;
pub mod contacts;
pub mod error;
pub mod gate;
pub mod merge;
pub mod model;
pub mod profile;
pub mod score;
pub mod surface;
mod utils;

// Re-export key public types
pub use batch::{discover_models, run_batch, BatchConfig, BatchReport, MetricError, ModelInputs};
pub use contacts::{
    cross_contact_df, cross_contact_metrics, AtomSelection, ContactConfig, CrossContactMetrics,
    DistanceMatrix,
};
pub use error::{AnalysisError, Result};
pub use gate::{gate_metrics, pore_summary_df, GateConfig, GateMetrics};
pub use merge::{merge, merged_df, MergedTable, MetricsRow};
pub use model::{Model, ModelId, ResidueId, ResidueSet, Role};
pub use profile::{parse_profile_log, PoreProfile, ProfileSample};
pub use score::{
    region_plddt, score_rows, scored_df, summarize_confidence, ConfidenceClass, ConfidenceSummary,
    ScoreClass, ScoreConfig, ScoreResult,
};
pub use surface::{
    parse_hbond_report, parse_sasa_report, per_residue_sasa_df, surface_summary_df, HbondReport,
    SasaReport, SurfaceBondRecord,
};
pub use utils::{load_model, read_text, write_df_to_file, DataFrameFileType};
