//! JSON output formatter for programmatic integration

use jniguard_core::violation::ViolationKind;
use jniguard_core::{KeywordTrace, RunOutcome, Vertex};
use serde::Serialize;

#[derive(Serialize)]
pub struct JsonOutput<'a> {
    pub version: &'static str,
    pub metadata: JsonMetadata,
    pub summary: JsonSummary,
    pub traces: Vec<JsonTrace<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub keyword_traces: Vec<&'a KeywordTrace>,
}

#[derive(Serialize)]
pub struct JsonMetadata {
    pub jniguard_version: &'static str,
    pub working_directory: String,
    pub analyzed_path: String,
    pub mode: &'static str,
}

#[derive(Serialize)]
pub struct JsonSummary {
    pub files_analyzed: usize,
    pub profiles_analyzed: usize,
    pub vertices: usize,
    pub edges: usize,
    pub violations_detected: usize,
    pub distinct_traces: usize,
    pub elapsed_ms: u64,
}

#[derive(Serialize)]
pub struct JsonTrace<'a> {
    pub description: &'a str,
    pub kind: &'static str,
    /// Full paths; an unsafe call ends in its marker vertex.
    pub paths: Vec<&'a [Vertex]>,
}

pub struct JsonFormatter;

impl JsonFormatter {
    pub fn new() -> Self {
        Self
    }

    pub fn format(&self, outcome: &RunOutcome, analyzed_path: &str) -> String {
        let output = self.build_output(outcome, analyzed_path);
        serde_json::to_string_pretty(&output).unwrap_or_else(|_| "{}".to_string())
    }

    fn build_output<'a>(&self, outcome: &'a RunOutcome, analyzed_path: &str) -> JsonOutput<'a> {
        JsonOutput {
            version: "1.0",
            metadata: JsonMetadata {
                jniguard_version: env!("CARGO_PKG_VERSION"),
                working_directory: std::env::current_dir()
                    .map(|p| p.to_string_lossy().to_string())
                    .unwrap_or_default(),
                analyzed_path: analyzed_path.to_string(),
                mode: outcome.mode.as_str(),
            },
            summary: JsonSummary {
                files_analyzed: outcome.files_analyzed,
                profiles_analyzed: outcome.profiles_analyzed,
                vertices: outcome.graph.vertex_count(),
                edges: outcome.graph.edge_count(),
                violations_detected: outcome.detected(),
                distinct_traces: outcome.report.as_ref().map_or(0, |r| r.trace_count()),
                elapsed_ms: outcome.elapsed.as_millis() as u64,
            },
            traces: self.convert_traces(outcome),
            keyword_traces: outcome.keyword_traces.iter().collect(),
        }
    }

    fn convert_traces<'a>(&self, outcome: &'a RunOutcome) -> Vec<JsonTrace<'a>> {
        let Some(report) = &outcome.report else {
            return Vec::new();
        };
        report
            .traces
            .iter()
            .map(|(description, paths)| JsonTrace {
                description,
                kind: paths
                    .first()
                    .and_then(|path| path.last())
                    .map_or(ViolationKind::BufferWrite, ViolationKind::of)
                    .as_str(),
                paths: paths.iter().map(Vec::as_slice).collect(),
            })
            .collect()
    }
}

impl Default for JsonFormatter {
    fn default() -> Self {
        Self::new()
    }
}
