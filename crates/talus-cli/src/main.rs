//! Talus CLI: simulation, benchmarking, and file inspection.

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "talus")]
#[command(version, about = "Talus: soft-sphere discrete element engine")]
struct Cli {
    /// Log filter, e.g. `info` or `talus_solver=debug`. Overrides RUST_LOG.
    #[arg(long, global = true)]
    log: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a simulation from an input file.
    Simulate {
        /// Path to the simulation input (TOML).
        #[arg(short, long, default_value = "simulation.toml")]
        config: String,
    },

    /// Run benchmark suite.
    Benchmark {
        /// Which scenario to run (binary_collision, box_settling,
        /// cylinder_pour, screw_conveyor, all).
        #[arg(short, long, default_value = "all")]
        scenario: String,

        /// Output CSV file path.
        #[arg(short, long)]
        output: Option<String>,

        /// Overrides the step count of every scenario.
        #[arg(short, long)]
        timesteps: Option<u64>,
    },

    /// Inspect a restart, data or snapshot file.
    Inspect {
        /// Path to the file.
        path: String,
    },

    /// Validate a simulation input or an engine configuration.
    Validate {
        /// Path to the TOML file.
        path: String,
    },
}

fn init_logging(filter: Option<&str>) {
    let filter = match filter {
        Some(directive) => EnvFilter::new(directive),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log.as_deref());

    let result = match cli.command {
        Commands::Simulate { config } => commands::simulate(&config),
        Commands::Benchmark {
            scenario,
            output,
            timesteps,
        } => commands::benchmark(&scenario, output.as_deref(), timesteps),
        Commands::Inspect { path } => commands::inspect(&path),
        Commands::Validate { path } => commands::validate(&path),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
