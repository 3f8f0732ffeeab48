//! CLI for KernTrace
//!
//! Stands in for a host runtime during development and comparison testing:
//! - replay: drive a trace session from a recorded hook script
//! - demo: emit a built-in demonstration trace

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod output;

#[derive(Parser)]
#[command(name = "kerntrace")]
#[command(about = "Human-readable kernel execution traces", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a recorded hook script through a trace session
    Replay(commands::replay::ReplayArgs),

    /// Emit a built-in demonstration trace
    Demo(commands::demo::DemoArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Replay(args) => {
            init_tracing(args.verbose);
            commands::replay::run(args)
        }
        Commands::Demo(args) => {
            init_tracing(args.verbose);
            commands::demo::run(args)
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}
