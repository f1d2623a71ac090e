//! File loading and table output helpers.

use crate::error::{AnalysisError, Result};
use pdbtbx::*;
use polars::prelude::*;
use std::path::Path;

/// Open an atomic coordinate file with [`pdbtbx::open`].
///
/// Reads loosely (predicted-structure PDBs are often not fully conformant)
/// and keeps only atomic coordinates. Non-breaking loader diagnostics are
/// returned alongside the structure for the caller to log.
pub fn load_model(input_file: &str) -> Result<(PDB, Vec<PDBError>)> {
    ReadOptions::default()
        .set_only_atomic_coords(true)
        .set_level(StrictnessLevel::Loose)
        .read(input_file)
        .map_err(|errors| AnalysisError::Structure {
            path: input_file.to_string(),
            reason: errors
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("; "),
        })
}

/// Read a text artifact (profile log, SASA or H-bond report) into a string.
pub fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| AnalysisError::Io {
        path: path.display().to_string(),
        source,
    })
}

/// Write a DataFrame to a file, with the extension chosen by the file type.
///
/// The table is written to a temporary sibling first and renamed into place,
/// so a failed write never leaves a truncated file at the target path.
pub fn write_df_to_file(
    df: &mut DataFrame,
    file_path: &Path,
    file_type: DataFrameFileType,
) -> Result<()> {
    let file_suffix = file_type.to_string();
    let out_path = file_path.with_extension(&file_suffix);
    let tmp_path = file_path.with_extension(format!("{file_suffix}.tmp"));
    let mut file = std::fs::File::create(&tmp_path).map_err(|source| AnalysisError::Io {
        path: tmp_path.display().to_string(),
        source,
    })?;

    let written: Result<()> = (|| {
        match file_type {
            DataFrameFileType::Csv => {
                CsvWriter::new(&mut file).finish(df)?;
            }
            DataFrameFileType::Parquet => {
                ParquetWriter::new(&mut file).finish(df)?;
            }
            DataFrameFileType::Json => {
                JsonWriter::new(&mut file)
                    .with_json_format(JsonFormat::Json)
                    .finish(df)?;
            }
            DataFrameFileType::NDJson => {
                JsonWriter::new(&mut file)
                    .with_json_format(JsonFormat::JsonLines)
                    .finish(df)?;
            }
        }
        Ok(())
    })();
    if let Err(e) = written {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(e);
    }

    std::fs::rename(&tmp_path, &out_path).map_err(|source| AnalysisError::Io {
        path: out_path.display().to_string(),
        source,
    })
}

/// File format for writing DataFrames.
#[derive(clap::ValueEnum, Clone, Debug, Copy)]
pub enum DataFrameFileType {
    /// Comma-separated values
    Csv,
    /// Parquet columnar storage
    Parquet,
    /// Standard JSON
    Json,
    /// Newline-delimited JSON
    NDJson,
}

impl std::fmt::Display for DataFrameFileType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            DataFrameFileType::Csv => write!(f, "csv"),
            DataFrameFileType::Parquet => write!(f, "parquet"),
            DataFrameFileType::Json => write!(f, "json"),
            DataFrameFileType::NDJson => write!(f, "ndjson"),
        }
    }
}
