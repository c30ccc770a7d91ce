//! Line-oriented recognizer for terminals and tests
//!
//! Each line read from the input is delivered as one final recognition result,
//! which lets the `listen` command and integration tests drive a real capture
//! session without a speech engine.

use std::sync::{Arc, Mutex, MutexGuard};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::debug;

use super::recognizer::{
    CaptureError, MicrophonePermission, RecognitionResult, RecognizerError, RecognizerEvent,
    RecognizerFactory, RecognizerSettings, RecognizerSink, SpeechRecognizer,
};

#[derive(Default)]
struct Shared {
    sink: Option<RecognizerSink>,
    running: bool,
}

/// Builds [`ConsoleRecognizer`]s and feeds them text lines
#[derive(Clone, Default)]
pub struct ConsoleRecognizerFactory {
    shared: Arc<Mutex<Shared>>,
}

fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(|e| e.into_inner())
}

impl ConsoleRecognizerFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver one utterance; dropped unless the recognizer is running
    pub fn say(&self, text: &str) -> bool {
        let shared = lock(&self.shared);
        match (&shared.sink, shared.running) {
            (Some(sink), true) => sink.emit(RecognizerEvent::Results(vec![
                RecognitionResult::final_text(text),
            ])),
            _ => {
                debug!("Recognizer not running, dropping {:?}", text);
                false
            }
        }
    }

    /// Read lines until EOF, delivering each non-empty one as an utterance
    pub async fn feed<R>(&self, reader: R) -> std::io::Result<usize>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = reader.lines();
        let mut delivered = 0;

        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if self.say(line) {
                delivered += 1;
            }
        }

        Ok(delivered)
    }
}

impl RecognizerFactory for ConsoleRecognizerFactory {
    fn create(
        &self,
        settings: &RecognizerSettings,
        sink: RecognizerSink,
    ) -> Result<Box<dyn SpeechRecognizer>, CaptureError> {
        debug!("Console recognizer created ({})", settings.lang);
        lock(&self.shared).sink = Some(sink);

        Ok(Box::new(ConsoleRecognizer {
            shared: Arc::clone(&self.shared),
        }))
    }
}

/// Recognizer whose speech comes from [`ConsoleRecognizerFactory::say`]
pub struct ConsoleRecognizer {
    shared: Arc<Mutex<Shared>>,
}

impl ConsoleRecognizer {
    fn end(&mut self) {
        let mut shared = lock(&self.shared);
        if shared.running {
            shared.running = false;
            if let Some(sink) = &shared.sink {
                sink.emit(RecognizerEvent::Ended);
            }
        }
    }
}

impl SpeechRecognizer for ConsoleRecognizer {
    fn start(&mut self) -> Result<(), RecognizerError> {
        let mut shared = lock(&self.shared);
        if shared.running {
            return Err(RecognizerError::AlreadyStarted);
        }
        shared.running = true;
        if let Some(sink) = &shared.sink {
            sink.emit(RecognizerEvent::Started);
        }
        Ok(())
    }

    fn stop(&mut self) {
        self.end();
    }

    fn abort(&mut self) {
        self.end();
    }
}

/// Permission prompt that is always granted
pub struct GrantedPermission;

#[async_trait::async_trait]
impl MicrophonePermission for GrantedPermission {
    async fn request(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voice::capture::CaptureInput;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_console_recognizer_lifecycle() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let factory = ConsoleRecognizerFactory::new();
        let mut recognizer = factory
            .create(&RecognizerSettings::default(), RecognizerSink::new(tx.downgrade()))
            .unwrap();

        // nothing is delivered before start
        assert!(!factory.say("gate open 1900"));

        recognizer.start().unwrap();
        assert_eq!(recognizer.start(), Err(RecognizerError::AlreadyStarted));
        assert!(factory.say("gate open 1900"));

        recognizer.abort();
        recognizer.stop();

        assert_eq!(
            rx.recv().await,
            Some(CaptureInput::Recognizer(RecognizerEvent::Started))
        );
        assert!(matches!(
            rx.recv().await,
            Some(CaptureInput::Recognizer(RecognizerEvent::Results(r))) if r[0].transcript == "gate open 1900"
        ));
        assert_eq!(
            rx.recv().await,
            Some(CaptureInput::Recognizer(RecognizerEvent::Ended))
        );
        // a second halt does not end twice
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_feed_skips_blank_lines() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let factory = ConsoleRecognizerFactory::new();
        let mut recognizer = factory
            .create(&RecognizerSettings::default(), RecognizerSink::new(tx.downgrade()))
            .unwrap();
        recognizer.start().unwrap();

        let input: &[u8] = b"first bus 0930\n\n  \nwalkout\n";
        assert_eq!(factory.feed(input).await.unwrap(), 2);

        let _started = rx.recv().await;
        let mut transcripts = Vec::new();
        while let Ok(CaptureInput::Recognizer(RecognizerEvent::Results(r))) = rx.try_recv() {
            transcripts.push(r[0].transcript.clone());
        }
        assert_eq!(transcripts, vec!["first bus 0930", "walkout"]);
    }
}
