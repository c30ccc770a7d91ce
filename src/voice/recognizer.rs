//! Speech recognition capability supplied by the host
//!
//! The capture session never looks for a recognizer on its own. The host hands
//! in a [`RecognizerFactory`] that either builds one or reports
//! [`CaptureError::Unsupported`], plus a [`MicrophonePermission`] prompt.
//! Recognizers report lifecycle callbacks through a [`RecognizerSink`].

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use super::capture::CaptureInput;

/// Settings applied when a recognizer is created
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognizerSettings {
    /// BCP 47 language tag
    pub lang: String,

    /// Keep streaming results instead of stopping after the first utterance
    pub continuous: bool,

    /// Deliver interim (non-final) hypotheses
    pub interim_results: bool,

    /// Alternatives per result
    pub max_alternatives: u32,
}

impl Default for RecognizerSettings {
    fn default() -> Self {
        Self {
            lang: "en-GB".to_string(),
            continuous: true,
            interim_results: false,
            max_alternatives: 1,
        }
    }
}

/// One recognition result as delivered by the platform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognitionResult {
    pub transcript: String,
    pub is_final: bool,
    pub confidence: Option<f32>,
}

impl RecognitionResult {
    pub fn final_text(transcript: impl Into<String>) -> Self {
        Self {
            transcript: transcript.into(),
            is_final: true,
            confidence: None,
        }
    }
}

/// Lifecycle callbacks of a recognizer
#[derive(Debug, Clone, PartialEq)]
pub enum RecognizerEvent {
    Started,
    Results(Vec<RecognitionResult>),
    /// Platform error code, e.g. `"not-allowed"` or `"no-speech"`
    Error(String),
    Ended,
}

/// Failure of a recognizer's `start` call
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecognizerError {
    #[error("recognizer is already started")]
    AlreadyStarted,

    #[error("{0}")]
    Failed(String),
}

/// User-facing capture failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CaptureError {
    #[error("Speech recognition is not supported on this host.")]
    Unsupported,

    #[error("Microphone permission denied.")]
    PermissionDenied,

    #[error("No microphone detected or it's in use by another app.")]
    NoMicrophone,

    #[error("Speech service unreachable (network). Check connectivity and serve over https or localhost.")]
    Network,

    #[error("Speech service not allowed on this origin. Use https (or localhost) and a supported browser.")]
    ServiceNotAllowed,

    #[error("Recognition keeps stopping quickly. Check mic permissions and blockers.")]
    KeepsStoppingQuickly,

    #[error("Failed to start recognition: {0}")]
    StartFailed(String),
}

impl CaptureError {
    /// Map a platform error code to a fatal capture error.
    ///
    /// Returns `None` for codes that only interrupt the current session
    /// (`no-speech`, `aborted`, unknown codes, ...).
    pub fn from_recognizer_code(code: &str) -> Option<Self> {
        match code {
            "not-allowed" => Some(Self::PermissionDenied),
            "audio-capture" => Some(Self::NoMicrophone),
            "network" => Some(Self::Network),
            "service-not-allowed" => Some(Self::ServiceNotAllowed),
            _ => None,
        }
    }
}

/// Handle a recognizer uses to report its callbacks back to the capture session
#[derive(Debug, Clone)]
pub struct RecognizerSink {
    tx: mpsc::WeakUnboundedSender<CaptureInput>,
}

impl RecognizerSink {
    pub fn new(tx: mpsc::WeakUnboundedSender<CaptureInput>) -> Self {
        Self { tx }
    }

    /// A sink not connected to any session, for hosts that feed
    /// [`CaptureMachine`](super::capture::CaptureMachine) inputs themselves
    pub fn detached() -> Self {
        let (tx, _rx) = mpsc::unbounded_channel();
        Self { tx: tx.downgrade() }
    }

    /// Deliver an event; returns `false` once the session is gone
    pub fn emit(&self, event: RecognizerEvent) -> bool {
        match self.tx.upgrade() {
            Some(tx) => tx.send(CaptureInput::Recognizer(event)).is_ok(),
            None => false,
        }
    }
}

/// A running speech recognizer instance
pub trait SpeechRecognizer: Send {
    /// Begin capturing; confirmation arrives later as [`RecognizerEvent::Started`]
    fn start(&mut self) -> Result<(), RecognizerError>;

    /// Stop gracefully, delivering pending results before `Ended`
    fn stop(&mut self);

    /// Stop immediately, discarding pending results
    fn abort(&mut self);
}

/// Builds the host's recognizer, if the host has one
pub trait RecognizerFactory: Send + Sync {
    fn create(
        &self,
        settings: &RecognizerSettings,
        sink: RecognizerSink,
    ) -> Result<Box<dyn SpeechRecognizer>, CaptureError>;
}

/// Host microphone permission prompt
#[async_trait::async_trait]
pub trait MicrophonePermission: Send + Sync {
    /// Ask for microphone access; `true` when granted
    async fn request(&self) -> bool;
}
