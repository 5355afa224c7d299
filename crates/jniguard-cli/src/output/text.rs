//! Plain text output
//!
//! One `Possible out-of-bounds operation path : ...` line per trace followed
//! by its description, then the run counters.

use std::fmt::Write;

use jniguard_core::RunOutcome;

use super::render_path;

pub fn format(outcome: &RunOutcome) -> String {
    let mut out = match &outcome.report {
        Some(report) => report.render_text(),
        None => keyword_dump(outcome),
    };

    let _ = writeln!(out, "Files analyzed: {}", outcome.files_analyzed);
    if outcome.report.is_some() {
        let _ = writeln!(out, "Violations detected: {}", outcome.detected());
    }
    let _ = writeln!(out, "Elapsed: {:.3}s", outcome.elapsed.as_secs_f64());
    out
}

fn keyword_dump(outcome: &RunOutcome) -> String {
    let mut out = String::new();
    for trace in &outcome.keyword_traces {
        for path in &trace.paths {
            let _ = writeln!(out, "{}", render_path(path));
        }
        out.push('\n');
    }
    out
}
