#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

mod commands;
mod logging;

use clap::Parser;
use miette::Result;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "janus")]
#[command(author, version, about = "Split module identity diagnostics for JS build pipelines", long_about = None)]
struct Cli {
    /// Increase logging verbosity (-v for DEBUG, -vv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit JSON formatted output (stable, machine-readable)
    #[arg(long, global = true)]
    json: bool,

    /// Override the working directory
    #[arg(long, global = true, value_name = "PATH")]
    cwd: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Print version information
    Version,

    /// Compare portable and native path resolution for the working
    /// directory and a set of candidate paths
    Probe {
        /// Extra candidate paths to check, on top of the configured defaults
        paths: Vec<PathBuf>,
    },

    /// Drive the identity tracers through a recorded build event script
    Replay {
        /// Path to the event script
        script: PathBuf,

        /// Path to a JSON trace config (markers, probe paths)
        #[arg(long, short = 'c', value_name = "FILE")]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let cwd = cli
        .cwd
        .clone()
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."));

    logging::init(cli.verbose, cli.json);

    match &cli.command {
        Commands::Version => commands::version::run(),
        Commands::Probe { paths } => commands::probe::run(&cwd, paths, cli.json),
        Commands::Replay { script, config } => {
            commands::replay::run(&cwd, script, config.as_deref())
        }
    }
}
