//! Loom CLI: run demo scenarios, inspect snapshots, validate scenario files.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "loom")]
#[command(version, about = "Multi-threaded cloth simulation runtime")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a preset or a scenario file.
    Run {
        /// Preset name, `all`, or path to a scenario TOML file.
        #[arg(short, long, default_value = "clamped_rod")]
        scenario: String,

        /// Override the scenario's frame count.
        #[arg(short, long)]
        frames: Option<u32>,

        /// Worker threads (0 runs solvers on the calling thread).
        #[arg(short, long, default_value_t = 4)]
        threads: usize,

        /// Output CSV file path.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Save a snapshot of the first instance after the last frame.
        #[arg(long)]
        snapshot: Option<PathBuf>,

        /// Export every frame of the first instance as JSON.
        #[arg(long)]
        export: Option<PathBuf>,
    },

    /// List the built-in scenarios.
    List,

    /// Inspect a cloth snapshot file.
    Inspect {
        /// Path to snapshot file.
        path: PathBuf,
    },

    /// Validate a scenario file.
    Validate {
        /// Path to scenario TOML.
        path: PathBuf,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            scenario,
            frames,
            threads,
            output,
            snapshot,
            export,
        } => commands::run(&commands::RunArgs {
            scenario,
            frames,
            threads,
            output,
            snapshot,
            export,
        }),
        Commands::List => commands::list(),
        Commands::Inspect { path } => commands::inspect(&path),
        Commands::Validate { path } => commands::validate(&path),
    };

    if let Err(e) = result {
        tracing::error!("{e}");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
