//! Crate-wide error type.
//!
//! Every fallible operation in the analysis core returns [`Result`]. Errors
//! are attributed to a single metric of a single model wherever possible; the
//! batch driver captures them per model instead of aborting the run.

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// All errors the analysis core can produce.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// A log or report yielded zero extractable records (or exceeded the
    /// configured warning budget). Fatal for the affected metric only.
    #[error("no usable records in {kind} input: {reason}")]
    Parse {
        /// Which input kind failed ("pore profile", "SASA report", ...).
        kind: &'static str,
        /// Human-readable explanation of what went wrong.
        reason: String,
    },

    /// An argument was structurally invalid (empty residue group,
    /// non-ascending cutoff list, malformed residue expression, ...).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Scoring was requested but no merged row is flagged as the baseline.
    #[error("no baseline model in the merged table; cannot score")]
    MissingBaseline,

    /// A coordinate file could not be loaded.
    #[error("failed to load structure {path}: {reason}")]
    Structure {
        /// Path of the offending file.
        path: String,
        /// Loader diagnostics, joined into one string.
        reason: String,
    },

    /// Plain I/O failure with the offending path attached.
    #[error("failed to access {path}")]
    Io {
        /// Path of the offending file or directory.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A table operation failed while assembling output DataFrames.
    #[error(transparent)]
    Table(#[from] polars::error::PolarsError),
}
