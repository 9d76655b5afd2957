//! Sonant CLI - convert values, try the clamp operators and render automation
//! scripts.

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sonant")]
#[command(author, version, about = "Sonant signal CLI", long_about = None)]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a value between its units and the engine domain
    Convert(commands::convert::ConvertArgs),

    /// Clamp a constant input with a Min or Max operator
    Clamp(commands::clamp::ClampArgs),

    /// Render an automation script to WAV or JSON
    Render(commands::render::RenderArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Convert(args) => commands::convert::run(args),
        Commands::Clamp(args) => commands::clamp::run(args),
        Commands::Render(args) => commands::render::run(args),
    }
}
