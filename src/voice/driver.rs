use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};
use tracing::{debug, info};

use super::capture::{
    CaptureConfig, CaptureEffect, CaptureInput, CaptureMachine, CaptureSnapshot, Visibility,
};
use super::parser::PhraseParser;
use super::recognizer::{MicrophonePermission, RecognizerFactory, RecognizerSink};

/// Runs a [`CaptureMachine`] on its own tokio task.
///
/// The task is the session's event loop: user requests, recognizer callbacks,
/// permission answers and restart timers all arrive on one channel and are
/// applied in order. The session is disposed when every [`CaptureHandle`] is
/// dropped or [`CaptureHandle::dispose`] is called.
pub struct SpeechCapture;

impl SpeechCapture {
    pub fn spawn(
        config: CaptureConfig,
        parser: PhraseParser,
        factory: Arc<dyn RecognizerFactory>,
        permission: Arc<dyn MicrophonePermission>,
    ) -> CaptureHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        let weak = tx.downgrade();

        let machine = CaptureMachine::new(config, parser, factory, RecognizerSink::new(weak.clone()));
        let (state_tx, state_rx) = watch::channel(machine.snapshot());

        let task = tokio::spawn(run(machine, rx, weak, permission, state_tx));

        CaptureHandle {
            tx,
            state: state_rx,
            task: Arc::new(task),
        }
    }
}

async fn run(
    mut machine: CaptureMachine,
    mut rx: mpsc::UnboundedReceiver<CaptureInput>,
    tx: mpsc::WeakUnboundedSender<CaptureInput>,
    permission: Arc<dyn MicrophonePermission>,
    state_tx: watch::Sender<CaptureSnapshot>,
) {
    debug!("Speech capture task started");

    while let Some(input) = rx.recv().await {
        let dispose = matches!(input, CaptureInput::Dispose);
        let effects = machine.handle(input, Instant::now().into_std());

        for effect in effects {
            match effect {
                CaptureEffect::RequestPermission => {
                    let permission = Arc::clone(&permission);
                    let tx = tx.clone();
                    tokio::spawn(async move {
                        let granted = permission.request().await;
                        if let Some(tx) = tx.upgrade() {
                            let _ = tx.send(CaptureInput::PermissionResolved { granted });
                        }
                    });
                }
                CaptureEffect::ScheduleRestart { delay, generation } => {
                    let tx = tx.clone();
                    tokio::spawn(async move {
                        sleep(delay).await;
                        if let Some(tx) = tx.upgrade() {
                            let _ = tx.send(CaptureInput::RestartDue { generation });
                        }
                    });
                }
            }
        }

        publish(&state_tx, machine.snapshot());

        if dispose {
            break;
        }
    }

    machine.dispose();
    publish(&state_tx, machine.snapshot());
    info!("Speech capture disposed");
}

/// Notify subscribers only when the observable state actually changed
fn publish(state_tx: &watch::Sender<CaptureSnapshot>, snapshot: CaptureSnapshot) {
    state_tx.send_if_modified(|current| {
        if *current == snapshot {
            return false;
        }
        *current = snapshot;
        true
    });
}

/// Control and observation handle for a running capture session
#[derive(Clone)]
pub struct CaptureHandle {
    tx: mpsc::UnboundedSender<CaptureInput>,
    state: watch::Receiver<CaptureSnapshot>,
    task: Arc<JoinHandle<()>>,
}

impl CaptureHandle {
    fn send(&self, input: CaptureInput) {
        if self.tx.send(input).is_err() {
            debug!("Speech capture already disposed");
        }
    }

    /// Request capture; returns immediately
    pub fn start(&self) {
        self.send(CaptureInput::Start);
    }

    pub fn stop(&self) {
        self.send(CaptureInput::Stop);
    }

    /// Empty the event log
    pub fn clear(&self) {
        self.send(CaptureInput::Clear);
    }

    /// Report host surface visibility changes
    pub fn set_visibility(&self, visibility: Visibility) {
        self.send(CaptureInput::Visibility(visibility));
    }

    /// Stop unconditionally and end the session task
    pub fn dispose(&self) {
        self.send(CaptureInput::Dispose);
    }

    /// Whether the session task has exited
    pub fn is_disposed(&self) -> bool {
        self.task.is_finished()
    }

    /// Current observable state
    pub fn snapshot(&self) -> CaptureSnapshot {
        self.state.borrow().clone()
    }

    /// Receiver notified on every state change
    pub fn subscribe(&self) -> watch::Receiver<CaptureSnapshot> {
        self.state.clone()
    }

    pub fn active(&self) -> bool {
        self.state.borrow().active
    }

    pub fn listening(&self) -> bool {
        self.state.borrow().listening
    }

    pub fn error(&self) -> Option<String> {
        self.state.borrow().error.clone()
    }
}
