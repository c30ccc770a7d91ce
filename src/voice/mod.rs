//! Voice input: phrase parsing and continuous speech capture
//!
//! - [`parser`] turns one utterance into a [`ParsedIntent`]
//! - [`capture`] is the recognition session state machine
//! - [`driver`] runs a capture session on tokio
//! - [`console`] is a text-line recognizer for terminals and tests

pub mod capture;
pub mod console;
pub mod driver;
pub mod parser;
pub mod recognizer;
pub mod time;
pub mod vocabulary;

pub use capture::{CaptureConfig, CapturePhase, CaptureSnapshot, Visibility, VoiceEvent};
pub use driver::{CaptureHandle, SpeechCapture};
pub use parser::{normalize_time_tokens, parse_phrase, ParsedIntent, PhraseParser, TimeField};
pub use recognizer::{
    CaptureError, MicrophonePermission, RecognitionResult, RecognizerError, RecognizerEvent,
    RecognizerFactory, RecognizerSettings, RecognizerSink, SpeechRecognizer,
};
pub use time::ClockTime;
pub use vocabulary::{IntentVocabulary, VocabularyIssue};
