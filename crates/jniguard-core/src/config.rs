//! Configuration loading and parsing for jniguard
//!
//! Provides functionality to load and parse `jniguard.toml` configuration files.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::profile::Language;

pub const CONFIG_FILENAME: &str = "jniguard.toml";
pub const DEFAULT_CACHE: &str = ".jniguard/profiles.json";
pub const DEFAULT_GRAPH_OUTPUT: &str = "graph.dot";

const KNOWN_TOP_LEVEL_KEYS: &[&str] = &["mode", "extractor", "cache", "graph_output", "overrides"];
const KNOWN_OVERRIDE_KEYS: &[&str] = &[
    "check_buffer",
    "skip_extraction",
    "export_graph",
    "skip_violations",
    "keywords",
];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid TOML in '{path}': {message}")]
    ParseError { path: PathBuf, message: String },
}

#[derive(Debug, Clone, Default)]
pub struct ConfigResult {
    pub config: Config,
    pub warnings: Vec<String>,
}

/// Which side of the JNI boundary drives the analysis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// Verify from native code.
    Native,
    /// Verify from managed code.
    #[default]
    Managed,
}

impl RunMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunMode::Native => "native",
            RunMode::Managed => "managed",
        }
    }

    pub fn driving_language(&self) -> Language {
        match self {
            RunMode::Native => Language::Native,
            RunMode::Managed => Language::Managed,
        }
    }

    pub fn settings(&self) -> ModeSettings {
        match self {
            RunMode::Native => ModeSettings {
                check_buffer: false,
                skip_extraction: true,
                export_graph: true,
                skip_violations: true,
                keywords: Vec::new(),
            },
            RunMode::Managed => ModeSettings {
                check_buffer: true,
                skip_extraction: false,
                export_graph: false,
                skip_violations: false,
                keywords: Vec::new(),
            },
        }
    }
}

impl std::str::FromStr for RunMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "native" => Ok(RunMode::Native),
            "managed" => Ok(RunMode::Managed),
            other => Err(format!("unknown mode '{}', expected 'native' or 'managed'", other)),
        }
    }
}

/// The five switches a run mode fixes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModeSettings {
    pub check_buffer: bool,
    pub skip_extraction: bool,
    pub export_graph: bool,
    pub skip_violations: bool,
    pub keywords: Vec<String>,
}

impl Default for ModeSettings {
    fn default() -> Self {
        RunMode::default().settings()
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct ModeOverrides {
    pub check_buffer: Option<bool>,
    pub skip_extraction: Option<bool>,
    pub export_graph: Option<bool>,
    pub skip_violations: Option<bool>,
    pub keywords: Option<Vec<String>>,
}

impl ModeOverrides {
    pub fn apply(&self, settings: &mut ModeSettings) {
        if let Some(value) = self.check_buffer {
            settings.check_buffer = value;
        }
        if let Some(value) = self.skip_extraction {
            settings.skip_extraction = value;
        }
        if let Some(value) = self.export_graph {
            settings.export_graph = value;
        }
        if let Some(value) = self.skip_violations {
            settings.skip_violations = value;
        }
        if let Some(keywords) = &self.keywords {
            settings.keywords = keywords.clone();
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub mode: RunMode,
    /// Extraction command line; the project path is appended as last argument.
    pub extractor: Vec<String>,
    pub cache: PathBuf,
    pub graph_output: PathBuf,
    pub overrides: ModeOverrides,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: RunMode::default(),
            extractor: Vec::new(),
            cache: PathBuf::from(DEFAULT_CACHE),
            graph_output: PathBuf::from(DEFAULT_GRAPH_OUTPUT),
            overrides: ModeOverrides::default(),
        }
    }
}

impl Config {
    /// Mode defaults with the `[overrides]` table applied.
    pub fn settings(&self) -> ModeSettings {
        let mut settings = self.mode.settings();
        self.overrides.apply(&mut settings);
        settings
    }
}

pub fn find_config_file(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();
    loop {
        let config_path = current.join(CONFIG_FILENAME);
        if config_path.exists() {
            return Some(config_path);
        }
        if !current.pop() {
            return None;
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    Ok(load_config_with_warnings(path)?.config)
}

pub fn load_config_with_warnings(path: &Path) -> Result<ConfigResult, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        message: e.message().to_string(),
    })?;

    let warnings = detect_unknown_keys(&content);

    Ok(ConfigResult { config, warnings })
}

fn detect_unknown_keys(content: &str) -> Vec<String> {
    let mut warnings = Vec::new();

    let table: toml::Table = match content.parse() {
        Ok(t) => t,
        Err(_) => return warnings,
    };

    let known_top: HashSet<&str> = KNOWN_TOP_LEVEL_KEYS.iter().copied().collect();
    for key in table.keys() {
        if !known_top.contains(key.as_str()) {
            warnings.push(format!("Unknown config option: '{}'", key));
        }
    }

    if let Some(toml::Value::Table(overrides)) = table.get("overrides") {
        let known: HashSet<&str> = KNOWN_OVERRIDE_KEYS.iter().copied().collect();
        for key in overrides.keys() {
            if !known.contains(key.as_str()) {
                warnings.push(format!("Unknown config option in [overrides]: '{}'", key));
            }
        }
    }

    warnings
}

/// Discovered config, or defaults when none exists. A config file that fails
/// to load is an error rather than silently replaced.
pub fn load_config_or_default_with_warnings(start_dir: &Path) -> Result<ConfigResult, ConfigError> {
    match find_config_file(start_dir) {
        Some(path) => load_config_with_warnings(&path),
        None => Ok(ConfigResult::default()),
    }
}

pub fn default_config_toml() -> String {
    format!(
        r#"# Which side of the JNI boundary drives the analysis: "managed" or "native"
mode = "managed"

# Tree and slice extraction command; the project path is appended
extractor = []

cache = "{}"
graph_output = "{}"

[overrides]
# check_buffer = true
# skip_extraction = false
# export_graph = false
# skip_violations = false
# keywords = []
"#,
        DEFAULT_CACHE, DEFAULT_GRAPH_OUTPUT
    )
}
