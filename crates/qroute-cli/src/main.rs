//! qroute CLI - Q-learning route planner
//!
//! Loads a road network, learns a route between two nodes, and prints it.
//! Intended for scripting and debugging the planner without a map front-end.

// Clippy pedantic allows - these are intentional design choices
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::unused_async)]

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use qroute_planner::{Config, WeightModeKind};

mod commands;

use commands::{config, graph, nearest, plan};

#[derive(Parser)]
#[command(name = "qroute")]
#[command(author, version, about = "qroute - Q-learning road route planner", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalArgs,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Options that override the configuration file
#[derive(Args)]
pub struct GlobalArgs {
    /// Configuration file (TOML, or INI with a .ini extension)
    #[arg(short, long, global = true, env = "QROUTE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Node file, overrides data.nodes
    #[arg(long, global = true)]
    pub nodes: Option<PathBuf>,

    /// Edge file, overrides data.edges
    #[arg(long, global = true)]
    pub edges: Option<PathBuf>,

    /// Treat the fourth edge field as a correction to the coordinate distance
    #[arg(long, global = true)]
    pub derived: bool,
}

impl GlobalArgs {
    fn load_config(&self) -> Result<Config> {
        let mut config = Config::load(self.config.as_deref())?;
        if let Some(nodes) = &self.nodes {
            config.data.nodes.clone_from(nodes);
        }
        if let Some(edges) = &self.edges {
            config.data.edges.clone_from(edges);
        }
        if self.derived {
            config.data.weight_mode = WeightModeKind::Derived;
        }
        Ok(config)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Learn and print a route between two nodes
    Plan(plan::PlanArgs),

    /// Find the facility closest to a node
    Nearest(nearest::NearestArgs),

    /// Summarise the loaded road graph
    Graph,

    /// Configuration management
    #[command(subcommand)]
    Config(config::ConfigCommands),
}

fn init_logging(level: &str) {
    let default_filter = ["qroute", "qroute_core", "qroute_rl", "qroute_planner"]
        .map(|target| format!("{target}={level}"))
        .join(",");

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::Config(config::ConfigCommands::Init { force }) = cli.command {
        init_logging(if cli.verbose { "debug" } else { "info" });
        return config::init(force);
    }

    let config = cli.global.load_config()?;
    let level = if cli.verbose {
        "debug"
    } else {
        config.logging.level.as_str()
    };
    init_logging(level);

    match cli.command {
        Commands::Plan(args) => plan::run(args, &config).await,
        Commands::Nearest(args) => nearest::run(args, &config).await,
        Commands::Graph => graph::run(&config),
        Commands::Config(cmd) => config::run(cmd, &config),
    }
}
