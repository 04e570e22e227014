//! Main CLI application structure

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use super::output::{Output, OutputFormat};
use super::{heuristic_cmd, model_cmd};
use crate::domain::{FactId, TaskId};
use crate::heuristics::HeuristicKind;
use crate::storage::{Config, HeuristicsConfig};

#[derive(Parser)]
#[command(name = "htnh")]
#[command(author, version, about = "Heuristic estimates for grounded HTN planning problems")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format (defaults to the global config, then text)
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Enable verbose output and debug logging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Heuristic settings file (defaults to htnh.toml in this or a parent directory)
    #[arg(long, global = true, env = "HTNH_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a heuristic and print the estimate of the initial node
    Estimate {
        /// Grounded problem file (JSON)
        problem: PathBuf,

        #[command(flatten)]
        selection: HeuristicArgs,
    },

    /// Evaluate a single search node
    Evaluate {
        /// Grounded problem file (JSON)
        problem: PathBuf,

        /// Task ids of the task network, comma separated
        #[arg(long, value_delimiter = ',')]
        network: Vec<TaskId>,

        /// Fact indices of the state, comma separated (defaults to the initial state)
        #[arg(long, value_delimiter = ',')]
        state: Option<Vec<FactId>>,

        #[command(flatten)]
        selection: HeuristicArgs,
    },

    /// Print the converged fact and task cost tables
    Costs {
        /// Grounded problem file (JSON)
        problem: PathBuf,

        #[command(flatten)]
        selection: HeuristicArgs,
    },

    /// Validate a problem file and print its size
    Model {
        /// Grounded problem file (JSON)
        problem: PathBuf,
    },
}

/// Heuristic selection shared by the estimating commands
#[derive(Args, Debug, Clone, Default)]
pub struct HeuristicArgs {
    /// Heuristic to use (defaults to the configured one)
    #[arg(long)]
    pub heuristic: Option<HeuristicKind>,

    /// Sum subtask costs in method order instead of taking the maximum
    #[arg(long)]
    pub no_ordering_relaxation: bool,
}

impl HeuristicArgs {
    /// Applies the flags on top of the file configuration
    pub fn resolve(&self, config: &HeuristicsConfig) -> (HeuristicKind, HeuristicsConfig) {
        let mut settings = config.clone();
        if self.no_ordering_relaxation {
            settings.del_relax.ordering_relaxation = false;
        }
        let kind = self.heuristic.unwrap_or(settings.default_heuristic);
        (kind, settings)
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    // Ignored if a subscriber is already installed
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Main entry point for the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = Config::load(cli.config.as_deref())?;
    let format = cli
        .format
        .unwrap_or_else(|| config.global.default_format.into());
    let output = Output::new(format, cli.verbose);

    match &config.config_path {
        Some(path) => output.verbose_ctx("config", &format!("Using {}", path.display())),
        None => output.verbose_ctx("config", "No htnh.toml found, using defaults"),
    }

    match cli.command {
        Commands::Estimate { problem, selection } => {
            let (kind, settings) = selection.resolve(&config.heuristics);
            heuristic_cmd::estimate(&output, &problem, kind, &settings)?
        }
        Commands::Evaluate {
            problem,
            network,
            state,
            selection,
        } => {
            let (kind, settings) = selection.resolve(&config.heuristics);
            heuristic_cmd::evaluate(&output, &problem, kind, &settings, network, state)?
        }
        Commands::Costs { problem, selection } => {
            let (kind, settings) = selection.resolve(&config.heuristics);
            heuristic_cmd::costs(&output, &problem, kind, &settings)?
        }
        Commands::Model { problem } => model_cmd::show(&output, &problem)?,
    }

    Ok(())
}
