//! Text summary builder for CLI output.
//!
//! Formats human-readable lines from a session view for text mode.

use crate::model::SessionView;

/// Pre-formatted lines for text output.
pub struct TextSummary {
    pub lines: Vec<String>,
}

/// Build a text summary from the current session view.
pub fn build_text_summary(view: &SessionView) -> TextSummary {
    let mut lines = Vec::new();

    match &view.trace {
        None => lines.push("No trace loaded.".to_string()),
        Some(trace) => {
            lines.push(format!("Trace: {}", trace.source_path.display()));
            lines.push(format!("Network type: {}", trace.network_type));
            if !trace.missing_files.is_empty() {
                lines.push(format!(
                    "Missing artifacts: {}",
                    trace.missing_files.join(", ")
                ));
            }
        }
    }

    lines.push(format!(
        "Profile: {} ({})",
        view.profile.name(),
        view.profile.profile_type()
    ));

    let selected: Vec<&str> = view
        .filters
        .iter()
        .filter(|s| s.selected)
        .map(|s| s.app_name.as_str())
        .collect();
    if !selected.is_empty() {
        lines.push(format!("Application filter: {}", selected.join(", ")));
    }

    match &view.analysis {
        None => lines.push("Analysis: none".to_string()),
        Some(analysis) => {
            lines.push(format!("Analyzed at: {}", analysis.timestamp_utc));
            lines.push(format!(
                "Artifacts: {}  Capture bytes: {}",
                analysis.artifact_count, analysis.capture_bytes
            ));
            lines.push(format!(
                "Energy estimate: {:.1} J",
                analysis.energy_estimate_j
            ));
            if !analysis.included_apps.is_empty() {
                lines.push(format!(
                    "Applications analyzed: {}",
                    analysis.included_apps.join(", ")
                ));
            }
        }
    }

    TextSummary { lines }
}
