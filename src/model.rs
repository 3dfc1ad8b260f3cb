use serde::{Deserialize, Serialize};

use crate::analysis::AnalysisResult;
use crate::collector::IndicatorEffect;
use crate::profiles::Profile;
use crate::trace::TraceHandle;

/// Radio network technology detected for a trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NetworkType {
    ThreeG,
    Lte,
    Unknown,
}

impl std::fmt::Display for NetworkType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NetworkType::ThreeG => write!(f, "3G"),
            NetworkType::Lte => write!(f, "LTE"),
            NetworkType::Unknown => write!(f, "unknown"),
        }
    }
}

/// One application observed in a trace and whether it is included in analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationSelection {
    pub app_name: String,
    pub selected: bool,
}

impl ApplicationSelection {
    pub fn selected(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            selected: true,
        }
    }
}

/// Consistent read-only snapshot of the session, handed to presentation layers.
///
/// `analysis`, when present, was computed from exactly this trace, profile, and
/// filter set; the controller never publishes a mixed combination.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionView {
    pub trace: Option<TraceHandle>,
    pub profile: Profile,
    pub filters: Vec<ApplicationSelection>,
    pub analysis: Option<AnalysisResult>,
}

/// Notifications emitted to the host application. These two variants are the
/// only observation points a host needs to implement against.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    SessionChanged {
        // Box to keep SessionEvent small; SessionView is large.
        view: Box<SessionView>,
    },
    CollectorStatus {
        effect: IndicatorEffect,
    },
}

/// Why an external command run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitReason {
    /// The command ran and both streams were drained to EOF.
    Completed,
    /// The command could not be launched or waited on.
    IoFailure,
    /// The wait was interrupted (timeout or cancelled drain).
    Interrupted,
}

/// Captured output of one external command run. Created fresh per invocation
/// and owned by the caller; never cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_reason: ExitReason,
}

impl CommandResult {
    /// Drained stdout followed by drained stderr.
    pub fn combined_output(&self) -> String {
        format!("{}{}", self.stdout, self.stderr)
    }

    pub(crate) fn failed(exit_reason: ExitReason) -> Self {
        Self {
            stdout: String::new(),
            stderr: String::new(),
            exit_reason,
        }
    }
}
