//! Finite-state model of the external collector process's lifecycle.
//!
//! The machine performs no I/O: it is a pure mapping from the current status
//! and an incoming event to the new status and a UI side-effect request.
//! Events arrive as asynchronous notifications from the collector process;
//! [`run_status_loop`] serializes delivery on a single-consumer queue so the
//! machine is never re-entered from two notification sources concurrently.

use serde::Serialize;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

use crate::model::SessionEvent;

/// Collector process lifecycle status.
///
/// Normal cycle `Stopped -> Starting -> Started -> Stopped`, with
/// `Stopped -> Ready -> Starting` as an optional pre-armed path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum CollectorStatus {
    #[default]
    Stopped,
    Starting,
    Started,
    Ready,
}

/// Status notification from the collector. `Unknown` covers notification
/// payloads this version does not recognize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectorEvent {
    Stopped,
    Starting,
    Started,
    Ready,
    Unknown,
}

impl CollectorEvent {
    /// Parse a notification label as sent by the collector process.
    pub fn parse(label: &str) -> Self {
        match label.trim().to_ascii_uppercase().as_str() {
            "STOPPED" => CollectorEvent::Stopped,
            "STARTING" => CollectorEvent::Starting,
            "STARTED" => CollectorEvent::Started,
            "READY" => CollectorEvent::Ready,
            _ => CollectorEvent::Unknown,
        }
    }
}

/// Recording indicator the host should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Indicator {
    Hidden,
    /// Collector is starting up; recording not yet in progress.
    Armed,
    /// Collection in progress.
    Active,
}

/// UI side-effect request accompanying a status change. Opaque to this core;
/// the host maps it onto its indicator and start/stop controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IndicatorEffect {
    pub indicator: Indicator,
    pub start_enabled: bool,
    pub stop_enabled: bool,
}

#[derive(Debug, Default)]
pub struct CollectorStatusMachine {
    status: CollectorStatus,
}

impl CollectorStatusMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> CollectorStatus {
        self.status
    }

    /// Apply one event: map it to the new status and return the UI effect.
    ///
    /// An unrecognized event falls back to `Stopped`. The fallback is relied
    /// on as a safety default; do not change it without product review.
    pub fn apply(&mut self, event: CollectorEvent) -> IndicatorEffect {
        self.status = match event {
            CollectorEvent::Starting => CollectorStatus::Starting,
            CollectorEvent::Started => CollectorStatus::Started,
            CollectorEvent::Ready => CollectorStatus::Ready,
            CollectorEvent::Stopped | CollectorEvent::Unknown => CollectorStatus::Stopped,
        };
        effect_for(self.status)
    }
}

fn effect_for(status: CollectorStatus) -> IndicatorEffect {
    match status {
        CollectorStatus::Stopped | CollectorStatus::Ready => IndicatorEffect {
            indicator: Indicator::Hidden,
            start_enabled: true,
            stop_enabled: false,
        },
        CollectorStatus::Starting => IndicatorEffect {
            indicator: Indicator::Armed,
            start_enabled: false,
            stop_enabled: false,
        },
        CollectorStatus::Started => IndicatorEffect {
            indicator: Indicator::Active,
            start_enabled: false,
            stop_enabled: true,
        },
    }
}

/// Single-consumer delivery loop: applies events in arrival order and
/// forwards each effect to the notifier channel. Ends when either side of
/// the plumbing goes away.
pub async fn run_status_loop(
    mut events: UnboundedReceiver<CollectorEvent>,
    notify: UnboundedSender<SessionEvent>,
) {
    let mut machine = CollectorStatusMachine::new();
    while let Some(event) = events.recv().await {
        let effect = machine.apply(event);
        if notify
            .send(SessionEvent::CollectorStatus { effect })
            .is_err()
        {
            break;
        }
    }
}
