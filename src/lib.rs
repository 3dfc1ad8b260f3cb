//! Session lifecycle core for a captured-trace analysis tool.
//!
//! The crate owns "what trace is currently loaded, under what profile, with
//! what analysis result": [`session::SessionController`] serializes
//! load/clear/refresh requests and guarantees stale analysis never leaks into
//! a new trace; [`runner::ProcessRunner`] executes external commands without
//! deadlocking on OS pipe buffers; [`collector::CollectorStatusMachine`]
//! models the external collector's lifecycle for host UIs. Presentation is a
//! host concern: hosts observe the [`model::SessionEvent`] channel and render
//! the views it carries.

pub mod analysis;
pub mod cli;
pub mod collector;
pub mod error;
pub mod model;
pub mod profiles;
pub mod runner;
pub mod session;
pub mod storage;
pub mod text_summary;
pub mod trace;

pub use model::{SessionEvent, SessionView};
pub use session::SessionController;
