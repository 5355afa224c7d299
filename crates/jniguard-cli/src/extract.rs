//! Running the external tree and slice extractor
//!
//! The extractor is any command that prints a profile store document for the
//! project path passed as its last argument. Its output is cached so later
//! runs can skip extraction.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result};
use tracing::{info, warn};

pub struct Extractor<'a> {
    command: &'a [String],
    cache: PathBuf,
}

impl<'a> Extractor<'a> {
    pub fn new(command: &'a [String], cache: PathBuf) -> Self {
        Self { command, cache }
    }

    /// Makes sure the cache holds profiles for `project` and returns its path.
    /// With `skip_extraction` an existing cache is reused as is.
    pub fn ensure(&self, project: &Path, skip_extraction: bool) -> Result<&Path> {
        if skip_extraction {
            if self.cache.exists() {
                info!("Reusing cached profiles at {}", self.cache.display());
                return Ok(&self.cache);
            }
            warn!(
                "No cached profiles at {}, running the extractor",
                self.cache.display()
            );
        }
        self.extract(project)?;
        Ok(&self.cache)
    }

    fn extract(&self, project: &Path) -> Result<()> {
        let Some((program, args)) = self.command.split_first() else {
            anyhow::bail!(
                "No extractor configured. Set `extractor` in the config file or pass --profiles"
            );
        };

        info!("Running extractor {} on {}", program, project.display());
        let output = Command::new(program)
            .args(args)
            .arg(project)
            .output()
            .with_context(|| format!("Failed to run extractor '{}'", program))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!(
                "Extractor '{}' failed ({}): {}",
                program,
                output.status,
                stderr.trim()
            );
        }

        if let Some(parent) = self.cache.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(&self.cache, &output.stdout)
            .with_context(|| format!("Failed to write cache {}", self.cache.display()))?;
        info!(
            "Cached {} bytes of profiles at {}",
            output.stdout.len(),
            self.cache.display()
        );
        Ok(())
    }
}
