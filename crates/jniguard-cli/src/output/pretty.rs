//! Pretty formatter for human-readable terminal output
//!
//! Groups traces under their violation, one arrow line per trace, and ends
//! with a colored summary.

use colored::{ColoredString, Colorize};
use jniguard_core::report::displayed_vertices;
use jniguard_core::violation::ViolationKind;
use jniguard_core::{KeywordTrace, RunOutcome, Vertex, ViolationReport};

pub struct PrettyFormatter;

impl PrettyFormatter {
    pub fn new() -> Self {
        Self
    }

    pub fn format(&self, outcome: &RunOutcome) -> String {
        let mut lines = match &outcome.report {
            Some(report) => self.format_report(report),
            None => self.format_keyword_traces(&outcome.keyword_traces),
        };
        lines.push(self.format_summary(outcome));

        let mut output = lines.join("\n");
        output.push('\n');
        output
    }

    fn format_report(&self, report: &ViolationReport) -> Vec<String> {
        let mut lines = Vec::new();
        for (description, paths) in &report.traces {
            let kind = paths
                .first()
                .and_then(|path| path.last())
                .map_or(ViolationKind::BufferWrite, ViolationKind::of);
            lines.push(format!("{}: {}", self.colorize_kind(kind), description));
            for path in paths {
                lines.push(format!(
                    "  {} {}",
                    "-->".blue(),
                    self.format_path(displayed_vertices(path))
                ));
            }
            lines.push(String::new());
        }
        lines
    }

    fn format_keyword_traces(&self, traces: &[KeywordTrace]) -> Vec<String> {
        let mut lines = Vec::new();
        for trace in traces {
            lines.push(format!("{} from {}", "trace".cyan().bold(), trace.origin));
            for path in &trace.paths {
                lines.push(format!("  {} {}", "-->".blue(), self.format_path(path)));
            }
            lines.push(String::new());
        }
        lines
    }

    fn format_path(&self, path: &[Vertex]) -> String {
        let arrow = format!(" {} ", "->".dimmed());
        path.iter()
            .map(|vertex| match vertex {
                Vertex::Marker(_) => vertex.to_string().red().to_string(),
                Vertex::Occurrence(_) => vertex.to_string(),
            })
            .collect::<Vec<_>>()
            .join(&arrow)
    }

    fn colorize_kind(&self, kind: ViolationKind) -> ColoredString {
        match kind {
            ViolationKind::BufferWrite => "buffer write".yellow().bold(),
            ViolationKind::UnsafeCall => "unsafe call".red().bold(),
        }
    }

    fn format_summary(&self, outcome: &RunOutcome) -> String {
        let elapsed = format!("{:.2?}", outcome.elapsed);
        match &outcome.report {
            Some(report) if report.is_empty() => format!(
                "{} No violations found in {} files ({})",
                "✓".green().bold(),
                outcome.files_analyzed,
                elapsed
            ),
            Some(report) => format!(
                "{} {} violation(s) detected on {} trace(s) across {} files ({})",
                "✗".red().bold(),
                outcome.detected(),
                report.trace_count(),
                outcome.files_analyzed,
                elapsed
            ),
            None => format!(
                "{} {} origin(s) traced in {} files ({})",
                "•".cyan().bold(),
                outcome.keyword_traces.len(),
                outcome.files_analyzed,
                elapsed
            ),
        }
    }
}

impl Default for PrettyFormatter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::fixtures;

    #[test]
    fn groups_traces_under_descriptions() {
        let output = PrettyFormatter::new().format(&fixtures::reported_outcome());

        assert!(output.contains("Buffer write at 4:5"));
        assert!(output.contains("Use of strcpy at 3:5"));
        assert!(output.contains("buf@copy(copy.c:2:10)"));
        assert!(!output.contains("buf#strcpy"));
        assert!(output.contains("2 violation(s) detected on 2 trace(s) across 1 files"));
    }

    #[test]
    fn keyword_traces_keep_markers() {
        let output = PrettyFormatter::new().format(&fixtures::keyword_outcome());

        assert!(output.contains("from buf@copy(copy.c:2:10)"));
        assert!(output.contains("buf#strcpy@copy(copy.c:3:5)"));
        assert!(output.contains("1 origin(s) traced in 1 files"));
    }
}
