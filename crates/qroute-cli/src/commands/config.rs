//! Configuration management commands

use std::path::Path;

use anyhow::Result;
use clap::Subcommand;

use qroute_planner::Config;

const DEFAULT_CONFIG_PATH: &str = "qroute.toml";

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show,
    /// Write a default configuration file to ./qroute.toml
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}

pub fn run(cmd: ConfigCommands, config: &Config) -> Result<()> {
    match cmd {
        ConfigCommands::Show => show(config),
        ConfigCommands::Init { force } => init(force),
    }
}

fn show(config: &Config) -> Result<()> {
    println!("{}", config.to_toml()?);
    Ok(())
}

pub fn init(force: bool) -> Result<()> {
    let path = Path::new(DEFAULT_CONFIG_PATH);

    if path.exists() && !force {
        println!("Configuration file already exists: {DEFAULT_CONFIG_PATH}");
        println!("Use --force to overwrite");
        return Ok(());
    }

    std::fs::write(path, Config::default().to_toml()?)?;
    println!("Configuration written to {DEFAULT_CONFIG_PATH}");
    Ok(())
}
