use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod commands;
use commands::{check::CheckArgs, dataset::DatasetCommand, scan::ScanArgs};

#[derive(Parser)]
#[command(name = "glyphscan")]
#[command(about = "Detect confusable, bidi and identifier-spoofing Unicode in text")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan files or directories
    Scan(ScanArgs),

    /// Analyze a single string
    Check(CheckArgs),

    /// Inspect the Unicode property dataset
    Dataset {
        #[command(subcommand)]
        subcommand: DatasetCommand,
    },
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Scan(args) => args.execute(cli.verbose > 0),
        Commands::Check(args) => args.execute(),
        Commands::Dataset { subcommand } => subcommand.execute().map(|()| ExitCode::SUCCESS),
    }
}
