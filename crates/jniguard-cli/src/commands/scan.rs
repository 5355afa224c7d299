//! Scan command - traces a project's slice profiles for buffer misuse

use crate::extract::Extractor;
use crate::output::json::JsonFormatter;
use crate::output::pretty::PrettyFormatter;
use crate::output::text;
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use jniguard_core::config::{Config, ModeSettings, RunMode, load_config_or_default_with_warnings};
use jniguard_core::{Analyzer, ProfileStore, RunOutcome};
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use tracing::info;
use walkdir::WalkDir;

const DOCUMENT_EXTENSION: &str = "json";

#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Project directory to analyze
    #[arg(value_name = "PATH", default_value = ".")]
    pub path: PathBuf,

    /// Side of the JNI boundary to verify from (native, managed)
    #[arg(short, long)]
    pub mode: Option<RunMode>,

    /// Only dump reachability paths mentioning every keyword (repeatable)
    #[arg(short, long, value_name = "KEYWORD")]
    pub keyword: Vec<String>,

    /// Export the dependency graph in DOT format to this file
    #[arg(long, value_name = "FILE")]
    pub graph: Option<PathBuf>,

    /// Reuse cached profiles instead of running the extractor
    #[arg(long)]
    pub skip_extraction: bool,

    /// Do not report buffer writes
    #[arg(long)]
    pub no_buffer_check: bool,

    /// Load prebuilt profile documents (a file, or a directory of *.json)
    #[arg(long, value_name = "PATH")]
    pub profiles: Option<PathBuf>,

    /// Output format for results (pretty, text, json)
    #[arg(short, long, default_value = "pretty")]
    pub format: String,

    /// Exit with code 1 when violations are detected
    #[arg(long)]
    pub fail_on_violations: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

impl ScanArgs {
    pub fn run(&self) -> Result<()> {
        self.configure_colors();

        let project = self
            .path
            .canonicalize()
            .with_context(|| format!("Path does not exist: {}", self.path.display()))?;
        let config_result = load_config_or_default_with_warnings(&project)?;
        for warning in &config_result.warnings {
            eprintln!("{} {}", "warning:".yellow().bold(), warning);
        }
        let config = config_result.config;

        let mode = self.mode.unwrap_or(config.mode);
        let settings = self.settings(mode, &config);
        info!("Scanning {} in {} mode", project.display(), mode.as_str());

        let store = self.load_store(&project, &config, &settings)?;
        if store.file_count() == 0 {
            println!("No slice profiles found.");
            return Ok(());
        }

        let outcome = Analyzer::with_settings(&store, mode, settings.clone()).run();

        if settings.export_graph {
            let graph_path = self
                .graph
                .clone()
                .unwrap_or_else(|| project.join(&config.graph_output));
            write_graph(&outcome, &graph_path)?;
        }

        match self.format.as_str() {
            "json" => println!(
                "{}",
                JsonFormatter::new().format(&outcome, &project.to_string_lossy())
            ),
            "text" => print!("{}", text::format(&outcome)),
            "pretty" => print!("{}", PrettyFormatter::new().format(&outcome)),
            other => anyhow::bail!(
                "Invalid format '{}'. Valid values: pretty, text, json",
                other
            ),
        }

        if self.fail_on_violations && outcome.detected() > 0 {
            process::exit(1);
        }

        Ok(())
    }

    /// Mode defaults, then the config's `[overrides]`, then flags.
    fn settings(&self, mode: RunMode, config: &Config) -> ModeSettings {
        let mut settings = mode.settings();
        config.overrides.apply(&mut settings);

        if !self.keyword.is_empty() {
            settings.keywords = self.keyword.clone();
        }
        if self.graph.is_some() {
            settings.export_graph = true;
        }
        if self.skip_extraction {
            settings.skip_extraction = true;
        }
        if self.no_buffer_check {
            settings.check_buffer = false;
        }
        settings
    }

    fn load_store(&self, project: &Path, config: &Config, settings: &ModeSettings) -> Result<ProfileStore> {
        if let Some(profiles) = &self.profiles {
            return load_documents(profiles);
        }

        let extractor = Extractor::new(&config.extractor, project.join(&config.cache));
        let cache = extractor.ensure(project, settings.skip_extraction)?;
        load_documents(cache)
    }

    fn configure_colors(&self) {
        let no_color_env = std::env::var("NO_COLOR").is_ok();
        if self.no_color || no_color_env {
            colored::control::set_override(false);
        }
    }
}

/// Loads one document, or merges every document below a directory.
fn load_documents(path: &Path) -> Result<ProfileStore> {
    let documents = discover_documents(path)?;
    let mut store = ProfileStore::new();
    for document in &documents {
        store.merge(ProfileStore::from_path(document)?)?;
    }
    info!(
        "Loaded {} profiles for {} files from {} documents",
        store.profile_count(),
        store.file_count(),
        documents.len()
    );
    Ok(store)
}

fn discover_documents(path: &Path) -> Result<Vec<PathBuf>> {
    if !path.exists() {
        anyhow::bail!("Path does not exist: {}", path.display());
    }

    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }

    let files: Vec<PathBuf> = WalkDir::new(path)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_hidden(e))
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| is_document(e.path()))
        .map(|e| e.path().to_path_buf())
        .collect();

    Ok(files)
}

fn is_document(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext == DOCUMENT_EXTENSION)
        .unwrap_or(false)
}

fn is_hidden(entry: &walkdir::DirEntry) -> bool {
    if entry.depth() == 0 {
        return false;
    }
    entry
        .file_name()
        .to_str()
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

fn write_graph(outcome: &RunOutcome, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(path, outcome.graph.to_dot())
        .with_context(|| format!("Failed to write graph to {}", path.display()))?;
    eprintln!(
        "{} Wrote dependency graph ({} vertices, {} edges) to {}",
        "✓".green().bold(),
        outcome.graph.vertex_count(),
        outcome.graph.edge_count(),
        path.display()
    );
    Ok(())
}
