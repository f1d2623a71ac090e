use clap::Parser;
use porescore::{
    cross_contact_df, cross_contact_metrics, load_model, write_df_to_file, AtomSelection,
    ContactConfig, DataFrameFileType, ModelId, ResidueSet,
};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, trace, warn};

#[derive(Parser, Debug, Clone)]
#[command(version, about)]
pub(crate) struct Args {
    /// Path to the PDB or mmCIF file to be analyzed
    #[arg(short, long)]
    input: PathBuf,

    /// Output file path (extension is set by the output format)
    #[arg(short, long)]
    output: PathBuf,

    /// Model label for the emitted row
    #[arg(short, long)]
    label: String,

    /// First residue group, e.g. "A:294-298"
    #[arg(short = 'a', long)]
    group_a: String,

    /// Second residue group, e.g. "B:294-298"
    #[arg(short = 'b', long)]
    group_b: String,

    /// Primary contact cutoff in Å
    #[arg(short, long, default_value_t = 4.0)]
    cutoff: f64,

    /// Cutoff sweep in Å, strictly ascending
    #[arg(short, long, value_delimiter = ',', default_values_t = [4.0, 4.5, 5.0])]
    sweep: Vec<f64>,

    /// Measure from this atom only (e.g. CA) instead of all heavy atoms
    #[arg(long)]
    rep_atom: Option<String>,

    /// Output file type
    #[arg(short = 't', long, default_value_t = DataFrameFileType::Csv)]
    output_format: DataFrameFileType,
}

pub(crate) fn run(args: &Args) {
    trace!("{args:?}");

    let (group_a, group_b) = match (
        ResidueSet::from_expr(&args.group_a),
        ResidueSet::from_expr(&args.group_b),
    ) {
        (Ok(a), Ok(b)) => (a, b),
        (Err(e), _) | (_, Err(e)) => {
            error!("{e}");
            return;
        }
    };

    let input_path = match Path::new(&args.input).canonicalize() {
        Ok(path) => path,
        Err(e) => {
            error!("Failed to resolve {}: {e}", args.input.display());
            return;
        }
    };
    let (pdb, diagnostics) = match load_model(&input_path.display().to_string()) {
        Ok(loaded) => loaded,
        Err(e) => {
            error!("{e}");
            return;
        }
    };
    diagnostics.iter().for_each(|d| debug!("{d}"));

    let config = ContactConfig {
        selection: match &args.rep_atom {
            Some(name) => AtomSelection::Representative(name.clone()),
            None => AtomSelection::HeavyAtoms,
        },
    };
    let metrics = match cross_contact_metrics(
        &pdb,
        &group_a,
        &group_b,
        args.cutoff,
        &args.sweep,
        &config,
    ) {
        Ok(metrics) => metrics,
        Err(e) => {
            error!("{e}");
            return;
        }
    };
    if metrics.pairs_count == 0 {
        warn!("No residue pairs within {} Å", args.cutoff);
    }

    let mut df = cross_contact_df(&[(ModelId::new(&args.label), metrics)]);
    info!("Contact metrics for {}\n{}", args.label, df);
    if let Err(e) = write_df_to_file(&mut df, &args.output, args.output_format) {
        error!("{e}");
    }
}
