//! Relay of agent summaries to the spreadsheet backend
//!
//! The backend is any HTTP endpoint that accepts a JSON [`PushPayload`] and
//! answers `{"ok": true}`. Without one, pushes queue up in a local [`Outbox`].

mod client;
mod outbox;
mod payload;

pub use client::{forward, PushOutcome, SheetsClient};
pub use outbox::{Outbox, OutboxEntry};
pub use payload::{PushFlight, PushPayload};

/// Errors from pushing to the sheets backend
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("No sheets endpoint configured")]
    NotConfigured,

    #[error("Sheets request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("Outbox unavailable: {0}")]
    Outbox(#[from] std::io::Error),

    #[error("Failed to encode outbox: {0}")]
    Encode(#[from] serde_json::Error),
}
