//! Output formatters for run results

pub mod json;
pub mod pretty;
pub mod text;

use jniguard_core::Vertex;

/// Every vertex of a keyword-dump path, markers included.
pub fn render_path(path: &[Vertex]) -> String {
    path.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" -> ")
}

#[cfg(test)]
pub(crate) mod fixtures {
    use jniguard_core::{Analyzer, ModeSettings, ProfileStore, RunMode, RunOutcome};

    const STORE: &str = r#"{
        "files": [{
            "path": "copy.c",
            "tree": { "tag": "unit", "children": [
                { "tag": "function", "children": [ { "tag": "name", "text": "copy", "attributes": { "pos:start": "1:6" } } ] }
            ]},
            "profiles": [{
                "var_name": "buf", "function_name": "copy", "defined_position": "2:10",
                "call_sites": [ { "callee": "strcpy", "position": "3:5", "arg_pos_index": 1 } ],
                "used_positions": [ { "write_positions": [ { "kind": "buffer_write", "position": "4:5" } ] } ]
            }]
        }]
    }"#;

    pub fn reported_outcome() -> RunOutcome {
        let store = ProfileStore::from_json_str(STORE, "inline").unwrap();
        let settings = ModeSettings {
            check_buffer: true,
            skip_violations: false,
            ..RunMode::Native.settings()
        };
        Analyzer::with_settings(&store, RunMode::Native, settings).run()
    }

    pub fn keyword_outcome() -> RunOutcome {
        let store = ProfileStore::from_json_str(STORE, "inline").unwrap();
        Analyzer::new(&store, RunMode::Native).run()
    }
}
