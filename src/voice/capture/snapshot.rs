use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::voice::parser::ParsedIntent;

/// One captured utterance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceEvent {
    /// When the final transcript arrived
    pub timestamp: DateTime<Utc>,

    /// Transcript as recognized, trimmed
    pub raw_text: String,

    /// Parser output for `raw_text`
    pub parsed_intent: ParsedIntent,
}

/// Lifecycle phase of a capture session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapturePhase {
    #[default]
    Idle,
    /// Microphone permission requested, start in flight
    AwaitingPermission,
    /// Recognizer start issued, waiting for the platform to confirm
    Starting,
    Listening,
    /// Session ended, restart timer pending
    Restarting,
    /// Host surface hidden; resumes when visible again
    Suspended,
    /// Fatal error, auto-restart abandoned
    Failed,
}

/// Observable state of a capture session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureSnapshot {
    pub phase: CapturePhase,

    /// The user has asked for capture and it has not been stopped or failed
    pub active: bool,

    /// The recognizer is currently running
    pub listening: bool,

    /// Captured utterances, oldest first; shared with the session until the
    /// next utterance arrives
    pub events: Arc<Vec<VoiceEvent>>,

    /// Latest user-facing error message
    pub error: Option<String>,
}
