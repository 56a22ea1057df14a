//! xtask - Development task runner for sortmru
//!
//! Usage:
//!   cargo xtask stress [--runs <n>] [--test <target>] [--features <list>] [--release] [--loom]

mod stress;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Development task runner for sortmru")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the test suite repeatedly until it fails
    Stress(stress::StressArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Stress(args) => stress::run(&args),
    }
}
