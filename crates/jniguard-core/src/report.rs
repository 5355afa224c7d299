//! Traces from origin vertices to recorded violations

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write;

use rayon::prelude::*;
use serde::Serialize;

use crate::graph::{DependencyGraph, Vertex};
use crate::violation::ViolationRegistry;

pub const TRACE_PREFIX: &str = "Possible out-of-bounds operation path : ";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ViolationReport {
    /// Distinct shortest paths per violation description.
    pub traces: BTreeMap<String, BTreeSet<Vec<Vertex>>>,
    /// Sum of descriptions over every reachable origin/violation pair, counted
    /// before paths are deduplicated.
    pub detected: usize,
}

impl ViolationReport {
    pub fn build(graph: &DependencyGraph, violations: &ViolationRegistry) -> Self {
        let origins = graph.origins();
        let found: Vec<Vec<(&[String], Vec<Vertex>)>> = origins
            .par_iter()
            .map(|origin| {
                let Some(tree) = graph.bfs_tree(origin) else {
                    return Vec::new();
                };
                violations
                    .iter()
                    .filter_map(|(target, descriptions)| {
                        tree.path_to(target).map(|path| (descriptions, path))
                    })
                    .collect()
            })
            .collect();

        let mut report = ViolationReport::default();
        for (descriptions, path) in found.into_iter().flatten() {
            report.detected += descriptions.len();
            for description in descriptions {
                report
                    .traces
                    .entry(description.clone())
                    .or_default()
                    .insert(path.clone());
            }
        }
        report
    }

    pub fn is_empty(&self) -> bool {
        self.traces.is_empty()
    }

    pub fn trace_count(&self) -> usize {
        self.traces.values().map(BTreeSet::len).sum()
    }

    pub fn render_text(&self) -> String {
        let mut out = String::new();
        for (description, paths) in &self.traces {
            for path in paths {
                let _ = writeln!(out, "{TRACE_PREFIX}{}", render_trace(path));
            }
            let _ = writeln!(out, "{description}\n");
        }
        out
    }
}

/// The printable part of a trace: a trailing unsafe-call marker is dropped.
pub fn displayed_vertices(path: &[Vertex]) -> &[Vertex] {
    match path.split_last() {
        Some((last, rest)) if last.is_marker() => rest,
        _ => path,
    }
}

pub fn render_trace(path: &[Vertex]) -> String {
    displayed_vertices(path)
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" -> ")
}

pub fn contains_all_keywords(text: &str, keywords: &[String]) -> bool {
    keywords.iter().all(|keyword| text.contains(keyword.as_str()))
}

/// Every breadth-first path from `origin` whose rendering mentions all
/// `keywords`. An empty keyword list keeps every path.
pub fn keyword_paths(graph: &DependencyGraph, origin: &Vertex, keywords: &[String]) -> Vec<Vec<Vertex>> {
    graph
        .bfs_tree(origin)
        .map(|tree| tree.paths())
        .unwrap_or_default()
        .into_iter()
        .filter(|path| {
            let rendered = path
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            contains_all_keywords(&rendered, keywords)
        })
        .collect()
}
