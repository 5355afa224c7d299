//! Init command - writes a default configuration file into a project

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use jniguard_core::config::{CONFIG_FILENAME, default_config_toml};
use std::fs;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Project directory to initialize
    #[arg(value_name = "DIR", default_value = ".")]
    pub dir: PathBuf,

    /// Force overwrite existing configuration
    #[arg(short, long)]
    pub force: bool,
}

impl InitArgs {
    pub fn run(&self) -> Result<()> {
        let config_path = self.write_config()?;
        println!(
            "{} Created {} configuration file",
            "✓".green().bold(),
            config_path.display().to_string().cyan()
        );
        Ok(())
    }

    fn write_config(&self) -> Result<PathBuf> {
        if !self.dir.is_dir() {
            anyhow::bail!("Directory does not exist: {}", self.dir.display());
        }

        let config_path = self.dir.join(CONFIG_FILENAME);
        if config_path.exists() && !self.force {
            anyhow::bail!(
                "Config file '{}' already exists. Use --force to overwrite.",
                config_path.display()
            );
        }

        fs::write(&config_path, default_config_toml())
            .with_context(|| format!("Failed to write {}", config_path.display()))?;
        Ok(config_path)
    }
}
