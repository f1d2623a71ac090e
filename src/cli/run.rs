use clap::Parser;
use porescore::{
    cross_contact_df, discover_models, merged_df, per_residue_sasa_df, pore_summary_df, run_batch,
    scored_df, surface_summary_df, write_df_to_file, AtomSelection, BatchConfig, ContactConfig,
    DataFrameFileType, GateConfig, ResidueSet, ScoreConfig,
};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, trace, warn};

#[derive(Parser, Debug, Clone)]
#[command(version, about)]
pub(crate) struct Args {
    /// Run directory holding per-model artifacts
    /// (<label>_pore.log, <label>_sasa.html, <label>_hbonds.txt, <label>.pdb)
    #[arg(short, long)]
    input: PathBuf,

    /// Output directory for the emitted tables
    #[arg(short, long)]
    output: PathBuf,

    /// Label of the baseline model
    #[arg(short, long, default_value_t = String::from("WT"))]
    baseline: String,

    /// Gate region for per-residue SASA and confidence, e.g. "A:294-302"
    #[arg(short, long, default_value = "")]
    region: String,

    /// First contact group; contact analysis runs only when both groups are
    /// given
    #[arg(long)]
    group_a: Option<String>,

    /// Second contact group
    #[arg(long)]
    group_b: Option<String>,

    /// Radius margin (Å) above the minimum that still counts as gate
    #[arg(short, long, default_value_t = 0.5)]
    margin: f64,

    /// Primary contact cutoff in Å
    #[arg(short, long, default_value_t = 4.0)]
    cutoff: f64,

    /// Cutoff sweep in Å, strictly ascending
    #[arg(short, long, value_delimiter = ',', default_values_t = [4.0, 4.5, 5.0])]
    sweep: Vec<f64>,

    /// Measure contacts from this atom only (e.g. CA) instead of heavy atoms
    #[arg(long)]
    rep_atom: Option<String>,

    /// Half-width of the "similar to baseline" score band
    #[arg(short, long, default_value_t = 0.05)]
    epsilon: f64,

    /// Fail a model's surface metric when its reports accumulate more parse
    /// warnings than this
    #[arg(long)]
    max_warnings: Option<u32>,

    /// Number of threads to use for parallel processing
    #[arg(short = 'j', long = "num-threads", default_value_t = 0)]
    num_threads: usize,

    /// Output file type
    #[arg(short = 't', long, default_value_t = DataFrameFileType::Csv)]
    output_format: DataFrameFileType,
}

fn parse_group(expr: &Option<String>) -> porescore::Result<Option<ResidueSet>> {
    expr.as_deref().map(ResidueSet::from_expr).transpose()
}

pub(crate) fn run(args: &Args) {
    trace!("{args:?}");

    // Create Rayon thread pool
    rayon::ThreadPoolBuilder::new()
        .num_threads(args.num_threads)
        .build_global()
        .unwrap();
    debug!("Using {} thread(s)", rayon::current_num_threads());

    let region = if args.region.is_empty() {
        ResidueSet::default()
    } else {
        match ResidueSet::from_expr(&args.region) {
            Ok(region) => region,
            Err(e) => {
                error!("{e}");
                return;
            }
        }
    };
    let (group_a, group_b) = match (parse_group(&args.group_a), parse_group(&args.group_b)) {
        (Ok(a), Ok(b)) => (a, b),
        (Err(e), _) | (_, Err(e)) => {
            error!("{e}");
            return;
        }
    };
    if group_a.is_some() != group_b.is_some() {
        error!("Contact analysis needs both --group-a and --group-b");
        return;
    }

    let config = BatchConfig {
        gate: GateConfig { margin: args.margin },
        region,
        group_a,
        group_b,
        contact: ContactConfig {
            selection: match &args.rep_atom {
                Some(name) => AtomSelection::Representative(name.clone()),
                None => AtomSelection::HeavyAtoms,
            },
        },
        contact_cutoff: args.cutoff,
        sweep: args.sweep.clone(),
        score: ScoreConfig { epsilon: args.epsilon },
        max_parse_warnings: args.max_warnings,
    };

    let input_path = match Path::new(&args.input).canonicalize() {
        Ok(path) => path,
        Err(e) => {
            error!("Failed to resolve {}: {e}", args.input.display());
            return;
        }
    };
    let inputs = match discover_models(&input_path, &args.baseline) {
        Ok(inputs) => inputs,
        Err(e) => {
            error!("{e}");
            return;
        }
    };
    info!("Discovered {} models under {}", inputs.len(), input_path.display());

    let report = run_batch(&inputs, &config);
    for e in &report.errors {
        warn!("{} [{}]: {}", e.label, e.metric, e.error);
    }

    if let Err(e) = std::fs::create_dir_all(&args.output) {
        error!("Failed to create {}: {e}", args.output.display());
        return;
    }
    let save = |name: &str, mut df: polars::prelude::DataFrame| {
        debug!("{name}\n{df}");
        if let Err(e) = write_df_to_file(&mut df, &args.output.join(name), args.output_format) {
            error!("Failed to write {name}: {e}");
        }
    };

    save("pore_summary", pore_summary_df(&report.gate_rows));
    save("sasa_hbonds_summary", surface_summary_df(&report.surface_rows));
    save("sasa_per_residue", per_residue_sasa_df(&report.surface_rows));
    save("contact_summary", cross_contact_df(&report.contact_rows));
    save("merged_metrics", merged_df(&report.merged));

    match &report.scores {
        Some(scores) => {
            let df = scored_df(&report.merged, scores);
            info!("Scored {} models against {}\n{}", df.height(), args.baseline, df);
            save("scored_metrics", df);
        }
        None => warn!("Scoring did not run; only the merged table was written"),
    }
}
