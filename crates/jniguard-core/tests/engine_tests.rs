//! Integration tests for the analysis engine and trace reporting
//!
//! Each fixture is a profile store document as produced by the slice
//! generator for a small C/C++/Java project.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use jniguard_core::config::{ModeSettings, RunMode};
use jniguard_core::engine::AnalysisContext;
use jniguard_core::profile::{Language, ProfileStore};
use jniguard_core::report::render_trace;
use jniguard_core::{Analyzer, DependencyGraph, EnclNamePosTuple, UnsafeUse, Vertex};
use serde_json::json;

const FIXTURES_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures");

fn load_fixture(name: &str) -> ProfileStore {
    let path = Path::new(FIXTURES_DIR).join(name);
    let text = fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read fixture {}: {}", path.display(), e));
    ProfileStore::from_json_str(&text, name)
        .unwrap_or_else(|e| panic!("Failed to load fixture {}: {}", name, e))
}

fn occurrence(var: &str, function: &str, file: &str, position: &str) -> Vertex {
    Vertex::from(EnclNamePosTuple::new(var, function, file, position))
}

fn analyze_all(store: &ProfileStore, universe: Language, check_buffer: bool) -> AnalysisContext<'_> {
    let mut context = AnalysisContext::new(store, check_buffer);
    for file in store.files_in(universe) {
        for profile in file.profiles.values() {
            context.analyze(profile, universe);
        }
    }
    context
}

fn edge_set(graph: &DependencyGraph) -> BTreeSet<(Vertex, Vertex)> {
    graph
        .edges()
        .map(|(a, b)| (a.clone(), b.clone()))
        .collect()
}

fn vertex_set(graph: &DependencyGraph) -> BTreeSet<Vertex> {
    graph.vertices().cloned().collect()
}

fn reporting(mode: RunMode) -> ModeSettings {
    ModeSettings {
        check_buffer: true,
        skip_violations: false,
        ..mode.settings()
    }
}

#[test]
fn unresolved_strcpy_gets_a_marker_vertex() {
    let store = load_fixture("unsafe_call.json");
    let context = analyze_all(&store, Language::Native, false);

    let buf = occurrence("buf", "copy", "copy.c", "2:10");
    let src = occurrence("src", "copy", "copy.c", "1:23");
    let marker = Vertex::from(UnsafeUse::new(
        &EnclNamePosTuple::new("buf", "copy", "copy.c", "2:10"),
        "strcpy",
        "3:5",
    ));

    assert!(context.graph().contains_edge(&buf, &marker));
    assert!(context.graph().contains_edge(&buf, &src));
    assert_eq!(
        context.violations().get(&marker).unwrap(),
        ["Use of strcpy at 3:5"]
    );
    assert_eq!(marker.to_string(), "buf#strcpy@copy(copy.c:3:5)");
}

#[test]
fn unsafe_call_report_hides_marker() {
    let store = load_fixture("unsafe_call.json");
    let outcome = Analyzer::with_settings(&store, RunMode::Native, reporting(RunMode::Native)).run();
    let report = outcome.report.unwrap();

    assert_eq!(report.detected, 2);
    let rendered: Vec<_> = report.traces["Use of strcpy at 3:5"]
        .iter()
        .map(|path| render_trace(path))
        .collect();
    assert_eq!(
        rendered,
        vec![
            "buf@copy(copy.c:2:10) -> src@copy(copy.c:1:23)",
            "buf@copy(copy.c:2:10)",
        ]
    );
}

#[test]
fn user_defined_callee_is_linked_once() {
    let store = load_fixture("user_callee.json");
    let context = analyze_all(&store, Language::Native, true);

    let data = occurrence("data", "main", "main.c", "6:11");
    let x = occurrence("x", "foo", "main.c", "1:16");
    assert!(context.graph().contains_edge(&data, &x));
    assert_eq!(
        context.violations().get(&x).unwrap(),
        ["Buffer write at 2:5"]
    );
    assert_eq!(context.analyzed_count(), 4);
}

#[test]
fn defaulted_parameters_and_constructors_resolve() {
    let store = load_fixture("user_callee.json");
    let context = analyze_all(&store, Language::Native, true);

    let data = occurrence("data", "main", "main.c", "6:11");
    let path = occurrence("path", "open_file", "io.cpp", "3:27");
    let bytes = occurrence("bytes", "Buffer", "io.cpp", "9:24");
    assert!(context.graph().contains_edge(&data, &path));
    assert!(context.graph().contains_edge(&data, &bytes));
    assert_eq!(
        context.violations().get(&bytes).unwrap(),
        ["Buffer write at 11:9"]
    );
}

#[test]
fn user_callee_report() {
    let store = load_fixture("user_callee.json");
    let outcome = Analyzer::with_settings(&store, RunMode::Native, reporting(RunMode::Native)).run();
    let report = outcome.report.unwrap();

    assert_eq!(outcome.graph.origins().len(), 1);
    assert_eq!(report.detected, 3);
    insta::assert_snapshot!(report.render_text().trim_end(), @r"
    Possible out-of-bounds operation path : data@main(main.c:6:11) -> bytes@Buffer(io.cpp:9:24)
    Buffer write at 11:9

    Possible out-of-bounds operation path : data@main(main.c:6:11) -> x@foo(main.c:1:16)
    Buffer write at 2:5

    Possible out-of-bounds operation path : data@main(main.c:6:11) -> path@open_file(io.cpp:3:27)
    Use of strlen at 4:12
    ");
}

#[test]
fn native_method_bridges_to_jni_implementation() {
    let store = load_fixture("jni_bridge.json");
    let context = analyze_all(&store, Language::Managed, true);

    let java = "src/android/graphics/Canvas.java";
    let cpp = "jni/android_graphics_Canvas.cpp";
    let color = occurrence("color", "draw", java, "4:26");
    let param = occurrence("x", "nDraw", java, "7:35");
    let native = occurrence("x", "android_graphics_Canvas_Draw", cpp, "10:74");
    let other = occurrence("x", "Canvas_DrawRect", cpp, "30:61");

    assert!(context.graph().contains_edge(&color, &param));
    assert!(context.graph().contains_edge(&param, &native));
    assert!(!context.graph().contains_vertex(&other));
    assert_eq!(context.graph().successors(&param).len(), 1);

    // buffer writes in Java sources are never reported
    assert!(context.violations().get(&param).is_none());
    assert_eq!(
        context.violations().get(&native).unwrap(),
        ["Buffer write at 12:5"]
    );
}

#[test]
fn managed_run_reports_across_the_bridge() {
    let store = load_fixture("jni_bridge.json");
    let outcome = Analyzer::new(&store, RunMode::Managed).run();
    let report = outcome.report.as_ref().unwrap();

    assert_eq!(outcome.files_analyzed, 2);
    assert_eq!(outcome.detected(), 2);
    let memcpy: Vec<_> = report.traces["Use of memcpy at 13:5"].iter().collect();
    assert_eq!(memcpy.len(), 1);
    assert_eq!(memcpy[0].len(), 4);
    assert_eq!(
        render_trace(memcpy[0]),
        "color@draw(src/android/graphics/Canvas.java:4:26) -> \
         x@nDraw(src/android/graphics/Canvas.java:7:35) -> \
         x@android_graphics_Canvas_Draw(jni/android_graphics_Canvas.cpp:10:74)"
    );
}

#[test]
fn native_run_stays_on_native_side() {
    let store = load_fixture("jni_bridge.json");
    let outcome = Analyzer::new(&store, RunMode::Native).run();

    assert!(outcome.report.is_none());
    assert_eq!(outcome.profiles_analyzed, 2);
    assert!(
        outcome
            .graph
            .vertices()
            .all(|vertex| vertex.file_name().ends_with(".cpp"))
    );
    assert_eq!(outcome.keyword_traces.len(), 2);
}

#[test]
fn analysis_is_idempotent() {
    let store = load_fixture("user_callee.json");
    let once = analyze_all(&store, Language::Native, true);

    let mut twice = analyze_all(&store, Language::Native, true);
    for file in store.files_in(Language::Native) {
        for profile in file.profiles.values() {
            twice.analyze(profile, Language::Native);
        }
    }

    assert_eq!(vertex_set(once.graph()), vertex_set(twice.graph()));
    assert_eq!(edge_set(once.graph()), edge_set(twice.graph()));
    assert_eq!(once.violations(), twice.violations());
}

#[test]
fn graph_has_no_self_loops_or_parallel_edges() {
    for fixture in ["unsafe_call.json", "user_callee.json", "jni_bridge.json"] {
        let store = load_fixture(fixture);
        for universe in [Language::Native, Language::Managed] {
            let context = analyze_all(&store, universe, true);
            let graph = context.graph();
            let edges: Vec<_> = graph.edges().collect();
            let distinct: BTreeSet<_> = edges.iter().copied().collect();
            assert_eq!(edges.len(), distinct.len(), "{fixture}");
            assert!(edges.iter().all(|(a, b)| a != b), "{fixture}");
        }
    }
}

#[test]
fn cyclic_dependencies_terminate() {
    let document = json!({
        "files": [{
            "path": "loop.c",
            "tree": { "tag": "unit", "children": [
                { "tag": "function", "children": [
                    { "tag": "name", "text": "spin", "attributes": { "pos:start": "1:6" } }
                ]}
            ]},
            "profiles": [
                {
                    "var_name": "a", "function_name": "spin", "defined_position": "2:9",
                    "dependent_vars": [ { "name": "b", "function_name": "spin", "position": "3:9" } ]
                },
                {
                    "var_name": "b", "function_name": "spin", "defined_position": "3:9",
                    "dependent_vars": [
                        { "name": "a", "function_name": "spin", "position": "2:9" },
                        { "name": "b", "function_name": "spin", "position": "3:9" }
                    ],
                    "used_positions": [ { "write_positions": [ { "kind": "buffer_write", "position": "4:5" } ] } ]
                }
            ]
        }]
    });
    let store = ProfileStore::from_json_str(&document.to_string(), "inline").unwrap();
    let outcome = Analyzer::with_settings(&store, RunMode::Native, reporting(RunMode::Native)).run();

    assert_eq!(outcome.graph.edge_count(), 2);
    assert!(outcome.graph.origins().is_empty());
    assert_eq!(outcome.violations.description_count(), 1);
    assert!(outcome.report.unwrap().is_empty());
}

#[test]
fn exported_graph_round_trips() {
    for fixture in ["unsafe_call.json", "user_callee.json", "jni_bridge.json"] {
        let store = load_fixture(fixture);
        let context = analyze_all(&store, Language::Managed, true);
        let graph = context.graph();

        let parsed = DependencyGraph::from_dot(&graph.to_dot()).unwrap();
        assert_eq!(vertex_set(&parsed), vertex_set(graph), "{fixture}");
        assert_eq!(edge_set(&parsed), edge_set(graph), "{fixture}");
    }
}

#[test]
fn keyword_dump_filters_paths() {
    let store = load_fixture("user_callee.json");
    let settings = ModeSettings {
        keywords: vec!["foo".to_string()],
        ..RunMode::Native.settings()
    };
    let outcome = Analyzer::with_settings(&store, RunMode::Native, settings).run();

    assert_eq!(outcome.keyword_traces.len(), 1);
    let trace = &outcome.keyword_traces[0];
    assert_eq!(trace.origin, occurrence("data", "main", "main.c", "6:11"));
    assert_eq!(
        trace.paths,
        vec![vec![
            occurrence("data", "main", "main.c", "6:11"),
            occurrence("x", "foo", "main.c", "1:16"),
        ]]
    );
}
