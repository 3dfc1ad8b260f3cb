//! Session lifecycle controller.
//!
//! Owns the single authoritative session state (trace, profile, filters,
//! analysis result) and serializes every mutating operation behind one mutex,
//! so stale analysis can never leak into a new trace and no half-applied
//! combination is ever observable. Presentation layers watch the notifier
//! channel; read accessors take a published snapshot and never block on an
//! in-flight mutation.

use std::path::{Path, PathBuf};
use tokio::sync::mpsc::UnboundedSender;

use crate::analysis::{AnalysisEngine, AnalysisResult};
use crate::error::{AnalysisError, TraceError};
use crate::model::{ApplicationSelection, NetworkType, SessionEvent, SessionView};
use crate::profiles::{self, Profile, ProfileSelector, ProfileStore};
use crate::trace::{TraceHandle, TraceLoader};
use log::{debug, warn};

/// The authoritative session state. `analysis` is `None` whenever `trace` is
/// `None`; when present it was computed from the current trace, profile, and
/// filter triple.
struct Session {
    trace: Option<TraceHandle>,
    profile: Profile,
    filters: Vec<ApplicationSelection>,
    analysis: Option<AnalysisResult>,
    trace_directory: Option<PathBuf>,
}

impl Session {
    fn view(&self) -> SessionView {
        SessionView {
            trace: self.trace.clone(),
            profile: self.profile.clone(),
            filters: self.filters.clone(),
            analysis: self.analysis.clone(),
        }
    }
}

pub struct SessionController<L, E, S> {
    loader: L,
    engine: E,
    selector: ProfileSelector<S>,
    state: tokio::sync::Mutex<Session>,
    snapshot: std::sync::Mutex<SessionView>,
    notify: UnboundedSender<SessionEvent>,
}

impl<L, E, S> SessionController<L, E, S>
where
    L: TraceLoader,
    E: AnalysisEngine,
    S: ProfileStore,
{
    /// Create an empty session. The profile is seeded from the persisted
    /// last-used profile, falling back to the built-in default.
    pub fn new(loader: L, engine: E, store: S, notify: UnboundedSender<SessionEvent>) -> Self {
        let selector = ProfileSelector::new(store);
        let selection = selector.select_for_network_type(NetworkType::Unknown);
        if let Some(reason) = selection.fallback {
            debug!("startup profile: {reason}");
        }
        let session = Session {
            trace: None,
            profile: selection.profile,
            filters: Vec::new(),
            analysis: None,
            trace_directory: selector.store().last_trace_directory(),
        };
        let snapshot = std::sync::Mutex::new(session.view());
        Self {
            loader,
            engine,
            selector,
            state: tokio::sync::Mutex::new(session),
            snapshot,
            notify,
        }
    }

    /// Open a collector trace directory, replacing any loaded session.
    ///
    /// The previous trace and analysis are dropped before loading. If the
    /// detected network type does not match the held profile's variant, the
    /// profile is replaced with the last-used profile for that type (built-in
    /// default when lookup fails; lookup failure never aborts the open).
    /// Returns the trace's missing-artifact names; non-empty is a warning,
    /// not a failure.
    pub async fn open_trace(&self, path: &Path) -> Result<Vec<String>, TraceError> {
        self.open_inner(path, false).await
    }

    /// Open a raw capture file. Same clear-then-load shape as [`Self::open_trace`],
    /// but capture files carry no network-type metadata, so no profile
    /// reconciliation happens.
    pub async fn open_capture(&self, path: &Path) -> Result<Vec<String>, TraceError> {
        self.open_inner(path, true).await
    }

    async fn open_inner(&self, path: &Path, capture: bool) -> Result<Vec<String>, TraceError> {
        let mut state = self.state.lock().await;

        // Clear before load: stale analysis must never survive into a new trace.
        state.trace = None;
        state.analysis = None;

        let handle = match if capture {
            self.loader.load_capture(path)
        } else {
            self.loader.load(path)
        } {
            Ok(handle) => handle,
            Err(e) => {
                // The old session is already gone; let observers see that.
                self.publish(&state);
                return Err(e);
            }
        };

        let missing = handle.missing_files.clone();
        if !missing.is_empty() {
            warn!(
                "trace {} is missing {} artifact(s): {}",
                path.display(),
                missing.len(),
                missing.join(", ")
            );
        }

        if !capture && !profiles::validate(&state.profile, handle.network_type) {
            let selection = self.selector.select_for_network_type(handle.network_type);
            if let Some(reason) = selection.fallback {
                warn!("profile reconciliation: {reason}");
            }
            debug!(
                "switching profile to {} for {} trace",
                selection.profile.name(),
                handle.network_type
            );
            state.profile = selection.profile;
        }

        state.trace = Some(handle);
        state.trace_directory = path.parent().map(Path::to_path_buf);
        if let Some(dir) = state.trace_directory.clone() {
            if let Err(e) = self.selector.store().set_last_trace_directory(&dir) {
                warn!("could not remember trace directory: {e}");
            }
        }

        self.refresh_locked(&mut state)?;
        Ok(missing)
    }

    /// Replace the analysis profile: clears the current analysis (not the
    /// trace) and re-runs analysis against the existing trace and filters.
    pub async fn set_profile(&self, profile: Profile) -> Result<(), AnalysisError> {
        let mut state = self.state.lock().await;
        state.analysis = None;
        state.profile = profile;
        self.refresh_locked(&mut state)
    }

    /// Replace the application filter set and re-run analysis.
    pub async fn set_application_filters(
        &self,
        selections: Vec<ApplicationSelection>,
    ) -> Result<(), AnalysisError> {
        let mut state = self.state.lock().await;
        state.analysis = None;
        state.filters = selections;
        self.refresh_locked(&mut state)
    }

    /// Drop the trace and analysis and notify observers with an empty view.
    /// Idempotent.
    pub async fn clear(&self) {
        let mut state = self.state.lock().await;
        state.trace = None;
        state.analysis = None;
        self.publish(&state);
    }

    /// With no trace, analysis becomes `None` and observers see an empty
    /// view. Otherwise the engine runs with the current trace, profile, and
    /// filters; on failure the session reverts to "trace loaded, no
    /// analysis" rather than keeping a stale result, and observers are
    /// notified of that state before the error propagates.
    fn refresh_locked(&self, state: &mut Session) -> Result<(), AnalysisError> {
        let result = match &state.trace {
            None => {
                state.analysis = None;
                None
            }
            Some(trace) => {
                match self
                    .engine
                    .run_analysis(trace, &state.profile, &state.filters)
                {
                    Ok(result) => Some(result),
                    Err(e) => {
                        state.analysis = None;
                        self.publish(state);
                        return Err(e);
                    }
                }
            }
        };
        state.analysis = result;
        if let Err(e) = self.selector.persist_last_used(&state.profile) {
            warn!("could not persist last-used profile: {e}");
        }
        self.publish(state);
        Ok(())
    }

    /// Publish the snapshot and emit exactly one session-changed notification.
    fn publish(&self, state: &Session) {
        let view = state.view();
        {
            let mut snapshot = self.snapshot.lock().unwrap_or_else(|e| e.into_inner());
            *snapshot = view.clone();
        }
        let _ = self.notify.send(SessionEvent::SessionChanged {
            view: Box::new(view),
        });
    }

    /// Consistent snapshot as of the last completed mutation. Never blocks on
    /// an in-flight operation.
    pub fn snapshot(&self) -> SessionView {
        self.snapshot
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn current_trace(&self) -> Option<TraceHandle> {
        self.snapshot().trace
    }

    pub fn current_profile(&self) -> Profile {
        self.snapshot().profile
    }

    pub fn current_analysis(&self) -> Option<AnalysisResult> {
        self.snapshot().analysis
    }

    /// Directory remembered from the most recently opened trace.
    pub async fn trace_directory(&self) -> Option<PathBuf> {
        self.state.lock().await.trace_directory.clone()
    }
}
