use clap::Parser;
use porescore::{
    parse_hbond_report, parse_sasa_report, per_residue_sasa_df, read_text, surface_summary_df,
    write_df_to_file, DataFrameFileType, ModelId, ResidueSet, SurfaceBondRecord,
};
use std::path::PathBuf;
use tracing::{error, info, trace, warn};

#[derive(Parser, Debug, Clone)]
#[command(version, about)]
pub(crate) struct Args {
    /// Saved surface-area report (HTML or plain-text log)
    #[arg(long)]
    sasa: Option<PathBuf>,

    /// Saved hydrogen-bond report
    #[arg(long)]
    hbonds: Option<PathBuf>,

    /// Residues of interest, e.g. "A:294-302" or "A:296,A:298-300"
    #[arg(short, long, default_value = "")]
    region: String,

    /// Model label for the emitted rows
    #[arg(short, long)]
    label: String,

    /// Output directory for the summary and per-residue tables
    #[arg(short, long)]
    output: PathBuf,

    /// Output file type
    #[arg(short = 't', long, default_value_t = DataFrameFileType::Csv)]
    output_format: DataFrameFileType,
}

pub(crate) fn run(args: &Args) {
    trace!("{args:?}");
    if args.sasa.is_none() && args.hbonds.is_none() {
        error!("Nothing to do: pass --sasa and/or --hbonds");
        return;
    }

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

    let sasa = match args.sasa.as_deref() {
        Some(path) => match read_text(path) {
            Ok(text) => Some(parse_sasa_report(&text, &region)),
            Err(e) => {
                error!("{e}");
                return;
            }
        },
        None => None,
    };
    let hbonds = match args.hbonds.as_deref() {
        Some(path) => match read_text(path) {
            Ok(text) => Some(parse_hbond_report(&text)),
            Err(e) => {
                error!("{e}");
                return;
            }
        },
        None => None,
    };

    let record = SurfaceBondRecord::from_reports(sasa, hbonds);
    if record.is_vacant() {
        warn!("No measurements could be extracted from the given reports");
    }
    if record.parse_warnings > 0 {
        warn!("{} lines could not be parsed", record.parse_warnings);
    }

    if let Err(e) = std::fs::create_dir_all(&args.output) {
        error!("Failed to create {}: {e}", args.output.display());
        return;
    }
    let rows = vec![(ModelId::new(&args.label), record)];

    let mut summary = surface_summary_df(&rows);
    info!("Surface summary for {}\n{}", args.label, summary);
    if let Err(e) = write_df_to_file(
        &mut summary,
        &args.output.join("sasa_hbonds_summary"),
        args.output_format,
    ) {
        error!("{e}");
        return;
    }

    let mut per_residue = per_residue_sasa_df(&rows);
    if let Err(e) = write_df_to_file(
        &mut per_residue,
        &args.output.join("sasa_per_residue"),
        args.output_format,
    ) {
        error!("{e}");
    }
}
