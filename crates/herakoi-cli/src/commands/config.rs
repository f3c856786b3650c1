//! Configuration file management command.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Subcommand};
use herakoi_config::{
    CONFIG_FILE_NAME, HerakoiConfig, default_config_path, find_config, user_config_dir,
    user_tracks_dir,
};

use super::common::load_config;

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print the effective configuration as TOML
    Show {
        /// Configuration file (default: discovered)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Write a configuration file with default values
    Init {
        /// Destination (default: the user config directory)
        #[arg(long)]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Check a configuration file for errors
    Validate {
        /// Configuration file (default: discovered)
        path: Option<PathBuf>,
    },

    /// Show where configuration and tracks are looked up
    Path,
}

pub fn run(args: ConfigArgs) -> anyhow::Result<()> {
    match args.command {
        ConfigCommand::Show { config } => {
            let config = load_config(config.as_deref())?;
            print!("{}", config.to_toml()?);
        }

        ConfigCommand::Init { path, force } => {
            let path = path.unwrap_or_else(default_config_path);
            if path.exists() && !force {
                anyhow::bail!(
                    "{} already exists (use --force to overwrite)",
                    path.display()
                );
            }
            HerakoiConfig::default().save(&path)?;
            println!("Wrote default configuration to {}", path.display());
        }

        ConfigCommand::Validate { path } => {
            let (config, source) = HerakoiConfig::discover(path.as_deref())?;
            let Some(source) = source else {
                println!("No configuration file found; defaults are in use.");
                return Ok(());
            };
            config
                .validate()
                .with_context(|| format!("{} is invalid", source.display()))?;
            println!("{} is valid.", source.display());
        }

        ConfigCommand::Path => {
            println!("Configuration");
            println!("=============\n");
            println!("  Local file:  ./{}", CONFIG_FILE_NAME);
            println!("  User file:   {}", default_config_path().display());
            println!("  User dir:    {}", user_config_dir().display());
            println!("  Tracks dir:  {}", user_tracks_dir().display());
            match find_config() {
                Some(path) => println!("  In use:      {}", path.display()),
                None => println!("  In use:      (defaults)"),
            }
        }
    }

    Ok(())
}
