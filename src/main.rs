mod cli;

use clap::{Parser, Subcommand};
use tracing::Level;

/// Batch pore-geometry, surface and contact metrics for membrane channel
/// models.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbosity of the program:
    /// -v for debug and -vv for trace
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Parse a pore-profile log into gate metrics
    Pore(cli::pore::Args),
    /// Parse surface-area and H-bond reports into summary tables
    Surface(cli::surface::Args),
    /// Measure residue-group contact geometry on a structure
    Contacts(cli::contacts::Args),
    /// Analyze a whole run directory, merge and score against a baseline
    Run(cli::run::Args),
}

fn main() {
    let args = Cli::parse();

    let log_level = match args.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt().with_max_level(log_level).init();

    match &args.command {
        Commands::Pore(args) => cli::pore::run(args),
        Commands::Surface(args) => cli::surface::run(args),
        Commands::Contacts(args) => cli::contacts::run(args),
        Commands::Run(args) => cli::run::run(args),
    }
}
