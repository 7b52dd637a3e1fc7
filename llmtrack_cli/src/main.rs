mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber;

#[derive(Parser)]
#[command(name = "llmtrack")]
#[command(about = "Experiment tracking and rolling telemetry for text-generation services", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable quiet mode (errors only)
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the tracking server
    Serve {
        /// Path to config file (YAML, TOML, or JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Bind address override
        #[arg(short, long)]
        bind: Option<String>,

        /// Upstream generation service URL override
        #[arg(short, long)]
        upstream: Option<String>,

        /// Experiment snapshot path override
        #[arg(short, long)]
        snapshot: Option<PathBuf>,

        /// Write the final metrics summary to this file on shutdown
        #[arg(long)]
        summary_export: Option<PathBuf>,
    },

    /// List experiments from a snapshot file
    List {
        /// Path to the experiment snapshot
        #[arg(short, long, default_value = "experiments.json")]
        snapshot: PathBuf,
    },

    /// Show the best completed experiment by a metric
    Best {
        /// Path to the experiment snapshot
        #[arg(short, long, default_value = "experiments.json")]
        snapshot: PathBuf,

        /// Metric name to rank by
        #[arg(short, long, default_value = "latency")]
        metric: String,

        /// Pick the largest value instead of the smallest
        #[arg(long)]
        maximize: bool,
    },

    /// Render a per-model report from a snapshot file
    Report {
        /// Path to the experiment snapshot
        #[arg(short, long, default_value = "experiments.json")]
        snapshot: PathBuf,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else if cli.quiet {
        Level::ERROR
    } else {
        Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Serve {
            config,
            bind,
            upstream,
            snapshot,
            summary_export,
        } => {
            commands::serve::execute(config, bind, upstream, snapshot, summary_export).await?;
        }

        Commands::List { snapshot } => {
            commands::list::execute(snapshot)?;
        }

        Commands::Best {
            snapshot,
            metric,
            maximize,
        } => {
            commands::best::execute(snapshot, metric, maximize)?;
        }

        Commands::Report { snapshot, output } => {
            commands::report::execute(snapshot, output).await?;
        }
    }

    Ok(())
}
