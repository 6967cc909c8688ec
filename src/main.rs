//! hsigen - command line front-end for the synthetic hyperspectral generator.

mod cli;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use hsigen::config::GeneratorConfig;

/// Generate synthetic hyperspectral data cubes
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a starter project file
    Init(cli::InitArgs),
    /// Render a layout preview image
    Preview(cli::PreviewArgs),
    /// Write a hyperspectral cube and its header
    Export(cli::ExportArgs),
}

fn main() {
    let cli = Cli::parse();
    let config = GeneratorConfig::load_or_default(cli.config.as_deref());

    // RUST_LOG takes precedence over the configured level
    env_logger::Builder::new()
        .filter_level(config.preferences.log_level.to_level_filter())
        .parse_default_env()
        .init();

    let result = match &cli.command {
        Commands::Init(args) => args.execute(&config),
        Commands::Preview(args) => args.execute(&config),
        Commands::Export(args) => args.execute(&config),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
