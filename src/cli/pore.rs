use clap::Parser;
use porescore::{
    gate_metrics, parse_profile_log, pore_summary_df, read_text, write_df_to_file,
    DataFrameFileType, GateConfig, ModelId,
};
use std::path::PathBuf;
use tracing::{error, info, trace};

#[derive(Parser, Debug, Clone)]
#[command(version, about)]
pub(crate) struct Args {
    /// Path to the pore-profile log to be parsed
    #[arg(short, long)]
    input: PathBuf,

    /// Output file path (extension is set by the output format)
    #[arg(short, long)]
    output: PathBuf,

    /// Model label for the emitted row
    #[arg(short, long)]
    label: String,

    /// Radius margin (Å) above the minimum that still counts as gate
    #[arg(short, long, default_value_t = 0.5)]
    margin: f64,

    /// Output file type
    #[arg(short = 't', long, default_value_t = DataFrameFileType::Csv)]
    output_format: DataFrameFileType,
}

pub(crate) fn run(args: &Args) {
    trace!("{args:?}");

    let text = match read_text(&args.input) {
        Ok(text) => text,
        Err(e) => {
            error!("{e}");
            return;
        }
    };

    let profile = match parse_profile_log(&text) {
        Ok(profile) => profile,
        Err(e) => {
            error!("{e}");
            return;
        }
    };
    info!("Parsed {} profile samples", profile.len());

    let metrics = match gate_metrics(&profile, &GateConfig { margin: args.margin }) {
        Ok(metrics) => metrics,
        Err(e) => {
            error!("{e}");
            return;
        }
    };
    if metrics.degenerate {
        info!("Profile minimum sits on an endpoint; treat the gate as low-confidence");
    }

    let mut df = pore_summary_df(&[(ModelId::new(&args.label), metrics)]);
    info!("Gate metrics for {}\n{}", args.label, df);
    if let Err(e) = write_df_to_file(&mut df, &args.output, args.output_format) {
        error!("{e}");
    }
}
