use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::voice::recognizer::RecognizerSettings;

/// Configuration for a speech capture session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Settings handed to the recognizer factory
    pub recognizer: RecognizerSettings,

    /// First restart delay after a session ends
    /// Default: 250ms
    pub base_backoff: Duration,

    /// Upper bound for the restart delay
    /// Default: 4 seconds
    pub max_backoff: Duration,

    /// Sessions shorter than this count as quick failures
    /// Default: 1 second
    pub quick_failure_threshold: Duration,

    /// Consecutive quick failures before auto-restart gives up
    /// Default: 3
    pub max_quick_failures: u32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            recognizer: RecognizerSettings::default(),
            base_backoff: Duration::from_millis(250),
            max_backoff: Duration::from_secs(4),
            quick_failure_threshold: Duration::from_secs(1),
            max_quick_failures: 3,
        }
    }
}
