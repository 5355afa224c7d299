//! One analysis run over a loaded profile store
//!
//! Drives the engine over every profile of the driving universe, then
//! reports violation traces or, in keyword mode, the filtered reachability
//! dump from each origin.

use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, info};

use crate::config::{ModeSettings, RunMode};
use crate::engine::AnalysisContext;
use crate::graph::{DependencyGraph, Vertex};
use crate::profile::{Language, ProfileStore};
use crate::report::{ViolationReport, keyword_paths};
use crate::violation::ViolationRegistry;

pub struct Analyzer<'a> {
    store: &'a ProfileStore,
    mode: RunMode,
    settings: ModeSettings,
}

#[derive(Debug, Clone, Serialize)]
pub struct KeywordTrace {
    pub origin: Vertex,
    pub paths: Vec<Vec<Vertex>>,
}

#[derive(Debug)]
pub struct RunOutcome {
    pub mode: RunMode,
    pub graph: DependencyGraph,
    pub violations: ViolationRegistry,
    /// Absent when violation reporting is skipped.
    pub report: Option<ViolationReport>,
    pub keyword_traces: Vec<KeywordTrace>,
    pub files_analyzed: usize,
    pub profiles_analyzed: usize,
    pub elapsed: Duration,
}

impl RunOutcome {
    pub fn detected(&self) -> usize {
        self.report.as_ref().map_or(0, |report| report.detected)
    }
}

impl<'a> Analyzer<'a> {
    pub fn new(store: &'a ProfileStore, mode: RunMode) -> Self {
        Self {
            store,
            mode,
            settings: mode.settings(),
        }
    }

    pub fn with_settings(store: &'a ProfileStore, mode: RunMode, settings: ModeSettings) -> Self {
        Self {
            store,
            mode,
            settings,
        }
    }

    pub fn settings(&self) -> &ModeSettings {
        &self.settings
    }

    pub fn run(&self) -> RunOutcome {
        let start = Instant::now();
        let universe = self.mode.driving_language();
        info!(
            "Analyzing {} managed and {} native files from the {} side",
            self.store.files_in(Language::Managed).count(),
            self.store.files_in(Language::Native).count(),
            universe.as_str()
        );

        let mut context = AnalysisContext::new(self.store, self.settings.check_buffer);
        for file in self.store.files_in(universe) {
            debug!("Analyzing {} profiles of {}", file.profiles.len(), file.path);
            for profile in file.profiles.values() {
                context.analyze(profile, universe);
            }
        }
        let profiles_analyzed = context.analyzed_count();
        let (graph, violations) = context.into_parts();
        info!(
            "Built dependency graph with {} vertices and {} edges in {:?}",
            graph.vertex_count(),
            graph.edge_count(),
            start.elapsed()
        );

        let (report, keyword_traces) = if self.settings.skip_violations {
            (None, self.keyword_traces(&graph))
        } else {
            (Some(ViolationReport::build(&graph, &violations)), Vec::new())
        };

        RunOutcome {
            mode: self.mode,
            graph,
            violations,
            report,
            keyword_traces,
            files_analyzed: self.store.file_count(),
            profiles_analyzed,
            elapsed: start.elapsed(),
        }
    }

    fn keyword_traces(&self, graph: &DependencyGraph) -> Vec<KeywordTrace> {
        graph
            .origins()
            .into_iter()
            .filter_map(|origin| {
                let paths = keyword_paths(graph, origin, &self.settings.keywords);
                (!paths.is_empty()).then(|| KeywordTrace {
                    origin: origin.clone(),
                    paths,
                })
            })
            .collect()
    }
}
