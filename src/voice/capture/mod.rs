//! Continuous speech capture session
//!
//! [`CaptureMachine`] is the whole session state machine: one transition
//! function fed with user requests, recognizer callbacks, visibility changes and
//! timer fires. It never sleeps or spawns; deferred work comes back to the
//! caller as [`CaptureEffect`]s. [`crate::voice::driver`] runs it on tokio.

mod config;
mod machine;
mod snapshot;

pub use config::CaptureConfig;
pub use machine::{CaptureEffect, CaptureInput, CaptureMachine, Visibility};
pub use snapshot::{CapturePhase, CaptureSnapshot, VoiceEvent};
