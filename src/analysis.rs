//! Analysis engine contract and the built-in summary engine.
//!
//! The real statistical analysis is an external collaborator invoked through
//! [`AnalysisEngine`]; the session controller treats it as a pure, possibly
//! slow, function call and offers it no cancellation. [`SummaryEngine`] is a
//! deliberately shallow implementation (surface statistics only) so the CLI
//! works end to end without that collaborator.

use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::error::AnalysisError;
use crate::model::{ApplicationSelection, NetworkType};
use crate::profiles::Profile;
use crate::trace::TraceHandle;

/// Derived statistics computed from a trace, profile, and filter set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub timestamp_utc: String,
    pub profile_name: String,
    pub network_type: NetworkType,
    /// Number of artifact files examined.
    pub artifact_count: usize,
    /// Total bytes across the examined artifacts.
    pub capture_bytes: u64,
    /// Applications included by the filter set, in selection order.
    pub included_apps: Vec<String>,
    /// Coarse radio energy estimate in joules, derived from the profile's
    /// power characteristics. Not a substitute for full analysis.
    pub energy_estimate_j: f64,
}

/// Contract of the analysis engine collaborator.
pub trait AnalysisEngine: Send + Sync {
    fn run_analysis(
        &self,
        trace: &TraceHandle,
        profile: &Profile,
        filters: &[ApplicationSelection],
    ) -> Result<AnalysisResult, AnalysisError>;
}

impl<E: AnalysisEngine + ?Sized> AnalysisEngine for std::sync::Arc<E> {
    fn run_analysis(
        &self,
        trace: &TraceHandle,
        profile: &Profile,
        filters: &[ApplicationSelection],
    ) -> Result<AnalysisResult, AnalysisError> {
        (**self).run_analysis(trace, profile, filters)
    }
}

/// Surface-statistics engine: artifact counts, byte totals, and a coarse
/// profile-weighted energy estimate.
#[derive(Debug, Default)]
pub struct SummaryEngine;

impl SummaryEngine {
    pub fn new() -> Self {
        Self
    }
}

impl AnalysisEngine for SummaryEngine {
    fn run_analysis(
        &self,
        trace: &TraceHandle,
        profile: &Profile,
        filters: &[ApplicationSelection],
    ) -> Result<AnalysisResult, AnalysisError> {
        let meta = std::fs::metadata(&trace.source_path).map_err(|e| {
            AnalysisError::EngineFailure(format!(
                "cannot stat {}: {e}",
                trace.source_path.display()
            ))
        })?;

        let (artifact_count, capture_bytes) = if meta.is_dir() {
            let entries = std::fs::read_dir(&trace.source_path).map_err(|e| {
                AnalysisError::EngineFailure(format!(
                    "cannot read {}: {e}",
                    trace.source_path.display()
                ))
            })?;
            let mut count = 0usize;
            let mut bytes = 0u64;
            for entry in entries.flatten() {
                if let Ok(file_meta) = entry.metadata() {
                    if file_meta.is_file() {
                        count += 1;
                        bytes += file_meta.len();
                    }
                }
            }
            (count, bytes)
        } else {
            (1, meta.len())
        };

        let included_apps: Vec<String> = filters
            .iter()
            .filter(|s| s.selected)
            .map(|s| s.app_name.clone())
            .collect();

        Ok(AnalysisResult {
            timestamp_utc: OffsetDateTime::now_utc()
                .format(&Rfc3339)
                .unwrap_or_default(),
            profile_name: profile.name().to_string(),
            network_type: trace.network_type,
            artifact_count,
            capture_bytes,
            included_apps,
            energy_estimate_j: estimate_energy(profile, capture_bytes),
        })
    }
}

/// Transfer-time model at an assumed 1 Mbps plus one inactivity tail.
fn estimate_energy(profile: &Profile, capture_bytes: u64) -> f64 {
    let active_secs = capture_bytes as f64 / 125_000.0;
    match profile {
        Profile::ThreeG(p) => (active_secs + p.dch_tail_secs) * p.power_dch_mw / 1000.0,
        Profile::Lte(p) => (active_secs + p.inactivity_tail_secs) * p.power_active_mw / 1000.0,
    }
}
