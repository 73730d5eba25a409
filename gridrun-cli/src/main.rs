//! GRIDRUN CLI - Command-line interface
//!
//! Commands:
//! - evaluate: Score a population of controllers on the maze
//! - watch: Play one controller with rendered frames

mod evaluate;
mod population;
mod watch;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use evaluate::EvaluateArgs;
use watch::WatchArgs;

#[derive(Parser)]
#[command(name = "gridrun")]
#[command(about = "GRIDRUN controller fitness evaluator")]
struct Cli {
    /// Random seed for genome generation and environments
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a population and print a ranked table
    Evaluate(EvaluateArgs),
    /// Watch a single genome play
    Watch(WatchArgs),
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Evaluate(args) => evaluate::run(args, cli.seed),
        Commands::Watch(args) => watch::run(args, cli.seed),
    }
}
