use chrono::Utc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use super::config::CaptureConfig;
use super::snapshot::{CapturePhase, CaptureSnapshot, VoiceEvent};
use crate::voice::parser::PhraseParser;
use crate::voice::recognizer::{
    CaptureError, RecognitionResult, RecognizerError, RecognizerEvent, RecognizerFactory,
    RecognizerSink, SpeechRecognizer,
};

/// Host surface visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Visible,
    Hidden,
}

/// Everything that can drive the session forward
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureInput {
    Start,
    Stop,
    Clear,
    PermissionResolved { granted: bool },
    Recognizer(RecognizerEvent),
    Visibility(Visibility),
    /// A restart timer fired; stale generations are ignored
    RestartDue { generation: u64 },
    Dispose,
}

/// Deferred work the caller must carry out and report back as inputs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureEffect {
    /// Prompt for the microphone, then send `PermissionResolved`
    RequestPermission,
    /// Send `RestartDue { generation }` after `delay`
    ScheduleRestart { delay: Duration, generation: u64 },
}

/// Speech capture session state machine
pub struct CaptureMachine {
    config: CaptureConfig,
    parser: PhraseParser,
    factory: Arc<dyn RecognizerFactory>,
    sink: RecognizerSink,

    /// Created on first start, reused afterwards
    recognizer: Option<Box<dyn SpeechRecognizer>>,

    phase: CapturePhase,

    /// Standing request to stay listening across interruptions
    keep_alive: bool,
    active: bool,
    listening: bool,
    hidden: bool,

    /// Delay for the next restart after a quick failure
    backoff: Duration,
    quick_failures: u32,

    /// When the current recognizer session began
    session_started_at: Option<Instant>,

    /// Bumped whenever pending restart timers must be invalidated
    generation: u64,

    events: Arc<Vec<VoiceEvent>>,
    error: Option<String>,
}

impl CaptureMachine {
    pub fn new(
        config: CaptureConfig,
        parser: PhraseParser,
        factory: Arc<dyn RecognizerFactory>,
        sink: RecognizerSink,
    ) -> Self {
        let backoff = config.base_backoff;
        Self {
            config,
            parser,
            factory,
            sink,
            recognizer: None,
            phase: CapturePhase::Idle,
            keep_alive: false,
            active: false,
            listening: false,
            hidden: false,
            backoff,
            quick_failures: 0,
            session_started_at: None,
            generation: 0,
            events: Arc::default(),
            error: None,
        }
    }

    pub fn phase(&self) -> CapturePhase {
        self.phase
    }

    pub fn active(&self) -> bool {
        self.active
    }

    pub fn listening(&self) -> bool {
        self.listening
    }

    pub fn keep_alive(&self) -> bool {
        self.keep_alive
    }

    pub fn events(&self) -> &[VoiceEvent] {
        &self.events
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn snapshot(&self) -> CaptureSnapshot {
        CaptureSnapshot {
            phase: self.phase,
            active: self.active,
            listening: self.listening,
            events: Arc::clone(&self.events),
            error: self.error.clone(),
        }
    }

    /// Apply one input and return the deferred work it calls for
    pub fn handle(&mut self, input: CaptureInput, now: Instant) -> Vec<CaptureEffect> {
        match input {
            CaptureInput::Start => self.start(),
            CaptureInput::Stop => {
                self.stop();
                Vec::new()
            }
            CaptureInput::Clear => {
                self.clear();
                Vec::new()
            }
            CaptureInput::PermissionResolved { granted } => self.on_permission(granted, now),
            CaptureInput::Recognizer(event) => self.on_recognizer(event, now),
            CaptureInput::Visibility(visibility) => self.on_visibility(visibility),
            CaptureInput::RestartDue { generation } => self.on_restart_due(generation),
            CaptureInput::Dispose => {
                self.dispose();
                Vec::new()
            }
        }
    }

    /// User request to begin capturing. Idempotent.
    pub fn start(&mut self) -> Vec<CaptureEffect> {
        self.keep_alive = true;
        self.hidden = false;

        match self.phase {
            CapturePhase::AwaitingPermission => {
                debug!("Start already in flight");
                Vec::new()
            }
            CapturePhase::Starting | CapturePhase::Listening => {
                debug!("Capture already running");
                Vec::new()
            }
            CapturePhase::Idle
            | CapturePhase::Restarting
            | CapturePhase::Suspended
            | CapturePhase::Failed => {
                info!("Starting speech capture ({})", self.config.recognizer.lang);
                self.reset_retry_policy();
                // an explicit start supersedes any pending restart
                self.generation += 1;
                self.try_start()
            }
        }
    }

    /// User request to end capturing. Idempotent.
    pub fn stop(&mut self) {
        if self.keep_alive || self.listening {
            info!("Stopping speech capture");
        }

        self.keep_alive = false;
        self.reset_retry_policy();
        self.generation += 1;
        self.halt_recognizer();
        self.listening = false;
        self.active = false;
        if self.phase != CapturePhase::Failed {
            self.phase = CapturePhase::Idle;
        }
    }

    /// Empty the event log; session state is untouched
    pub fn clear(&mut self) {
        self.events = Arc::default();
    }

    /// Permanent teardown, regardless of keep-alive intent
    pub fn dispose(&mut self) {
        self.stop();
        self.recognizer = None;
    }

    fn reset_retry_policy(&mut self) {
        self.quick_failures = 0;
        self.backoff = self.config.base_backoff;
    }

    fn halt_recognizer(&mut self) {
        if let Some(recognizer) = self.recognizer.as_mut() {
            recognizer.abort();
            recognizer.stop();
        }
    }

    fn ensure_recognizer(&mut self) -> Result<(), CaptureError> {
        if self.recognizer.is_none() {
            let recognizer = self
                .factory
                .create(&self.config.recognizer, self.sink.clone())?;
            debug!("Recognizer created");
            self.recognizer = Some(recognizer);
        }
        Ok(())
    }

    fn try_start(&mut self) -> Vec<CaptureEffect> {
        if let Err(e) = self.ensure_recognizer() {
            self.fail(e);
            return Vec::new();
        }

        self.phase = CapturePhase::AwaitingPermission;
        vec![CaptureEffect::RequestPermission]
    }

    fn fail(&mut self, err: CaptureError) {
        error!("Speech capture failed: {}", err);

        self.keep_alive = false;
        self.active = false;
        self.listening = false;
        self.generation += 1;
        self.phase = CapturePhase::Failed;
        self.error = Some(err.to_string());
        if let Some(recognizer) = self.recognizer.as_mut() {
            recognizer.abort();
        }
    }

    fn on_permission(&mut self, granted: bool, now: Instant) -> Vec<CaptureEffect> {
        if self.phase != CapturePhase::AwaitingPermission {
            debug!("Ignoring permission result in phase {:?}", self.phase);
            return Vec::new();
        }

        if !granted {
            self.fail(CaptureError::PermissionDenied);
            return Vec::new();
        }

        if self.hidden {
            self.phase = CapturePhase::Suspended;
            return Vec::new();
        }

        if let Err(e) = self.ensure_recognizer() {
            self.fail(e);
            return Vec::new();
        }

        self.error = None;
        self.session_started_at = Some(now);

        let result = match self.recognizer.as_mut() {
            Some(recognizer) => recognizer.start(),
            None => Err(RecognizerError::Failed("recognizer unavailable".to_string())),
        };

        match result {
            Ok(()) | Err(RecognizerError::AlreadyStarted) => {
                self.active = true;
                self.phase = CapturePhase::Starting;
                Vec::new()
            }
            Err(RecognizerError::Failed(msg)) => {
                warn!("Recognizer start failed: {}", msg);
                self.error = Some(CaptureError::StartFailed(msg).to_string());
                self.active = true;
                self.schedule_restart(now)
            }
        }
    }

    fn on_recognizer(&mut self, event: RecognizerEvent, now: Instant) -> Vec<CaptureEffect> {
        match event {
            RecognizerEvent::Started => {
                self.on_started(now);
                Vec::new()
            }
            RecognizerEvent::Results(results) => {
                self.on_results(results);
                Vec::new()
            }
            RecognizerEvent::Error(code) => {
                self.on_error(&code);
                Vec::new()
            }
            RecognizerEvent::Ended => self.on_ended(now),
        }
    }

    fn on_started(&mut self, now: Instant) {
        if !self.keep_alive || self.hidden {
            // stopped or hidden while the platform was still starting up
            debug!("Recognizer started after capture was halted, aborting");
            if let Some(recognizer) = self.recognizer.as_mut() {
                recognizer.abort();
            }
            return;
        }

        info!("Listening");
        self.listening = true;
        self.phase = CapturePhase::Listening;
        self.session_started_at = Some(now);
        self.error = None;
    }

    fn on_results(&mut self, results: Vec<RecognitionResult>) {
        for result in results.into_iter().filter(|r| r.is_final) {
            let raw_text = result.transcript.trim().to_string();
            let parsed_intent = self.parser.parse(&raw_text);
            debug!("Utterance {:?} -> {:?}", raw_text, parsed_intent);

            Arc::make_mut(&mut self.events).push(VoiceEvent {
                timestamp: Utc::now(),
                raw_text,
                parsed_intent,
            });
        }
    }

    fn on_error(&mut self, code: &str) {
        match CaptureError::from_recognizer_code(code) {
            Some(fatal) => self.fail(fatal),
            None => {
                warn!("Recognizer error: {}", code);
                self.error = Some(code.to_string());
            }
        }
    }

    fn on_ended(&mut self, now: Instant) -> Vec<CaptureEffect> {
        self.listening = false;

        if !matches!(self.phase, CapturePhase::Starting | CapturePhase::Listening) {
            // end of a session that was already halted or superseded
            return Vec::new();
        }

        if !self.keep_alive {
            self.phase = CapturePhase::Idle;
            return Vec::new();
        }

        if self.hidden {
            self.phase = CapturePhase::Suspended;
            return Vec::new();
        }

        debug!("Recognizer session ended");
        self.schedule_restart(now)
    }

    /// Apply the retry policy to a session that just ended
    fn schedule_restart(&mut self, now: Instant) -> Vec<CaptureEffect> {
        let alive = self
            .session_started_at
            .map(|t| now.saturating_duration_since(t))
            .unwrap_or_default();

        let delay = if alive < self.config.quick_failure_threshold {
            self.quick_failures += 1;
            if self.quick_failures >= self.config.max_quick_failures {
                self.fail(CaptureError::KeepsStoppingQuickly);
                return Vec::new();
            }
            let delay = self.backoff.min(self.config.max_backoff);
            self.backoff = (self.backoff * 2).min(self.config.max_backoff);
            delay
        } else {
            self.reset_retry_policy();
            self.backoff
        };

        self.generation += 1;
        self.phase = CapturePhase::Restarting;
        info!(
            "Restarting recognizer in {}ms (quick failures: {})",
            delay.as_millis(),
            self.quick_failures
        );

        vec![CaptureEffect::ScheduleRestart {
            delay,
            generation: self.generation,
        }]
    }

    fn on_restart_due(&mut self, generation: u64) -> Vec<CaptureEffect> {
        if generation != self.generation
            || !self.keep_alive
            || self.phase != CapturePhase::Restarting
        {
            debug!("Ignoring stale restart timer {}", generation);
            return Vec::new();
        }

        self.try_start()
    }

    fn on_visibility(&mut self, visibility: Visibility) -> Vec<CaptureEffect> {
        match visibility {
            Visibility::Hidden => {
                self.hidden = true;
                match self.phase {
                    CapturePhase::Listening | CapturePhase::Starting => {
                        info!("Host hidden, suspending capture");
                        self.halt_recognizer();
                        self.listening = false;
                        self.phase = CapturePhase::Suspended;
                    }
                    CapturePhase::Restarting => {
                        self.generation += 1;
                        self.phase = CapturePhase::Suspended;
                    }
                    _ => {}
                }
                Vec::new()
            }
            Visibility::Visible => {
                self.hidden = false;
                if self.keep_alive && !self.listening && self.phase == CapturePhase::Suspended {
                    info!("Host visible again, resuming capture");
                    self.reset_retry_policy();
                    self.generation += 1;
                    return self.try_start();
                }
                Vec::new()
            }
        }
    }
}
