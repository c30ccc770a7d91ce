use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use super::outbox::Outbox;
use super::payload::PushPayload;
use super::RelayError;

/// What happened to a push
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// Accepted by the sheets endpoint
    Sent,
    /// Held in the outbox; the value is the queue length
    Queued(usize),
}

#[derive(Debug, Deserialize)]
struct SheetsReply {
    #[serde(default)]
    ok: bool,
    error: Option<String>,
}

/// POST `body` to `endpoint` and hand back the upstream status and JSON body.
///
/// A body that is not JSON comes back as `{"raw": text}`.
pub async fn forward(
    http: &reqwest::Client,
    endpoint: &str,
    body: &Value,
) -> Result<(u16, Value), RelayError> {
    let resp = http.post(endpoint).json(body).send().await?;
    let status = resp.status().as_u16();
    let text = resp.text().await?;

    let data = serde_json::from_str(&text).unwrap_or_else(|_| serde_json::json!({ "raw": text }));
    Ok((status, data))
}

/// Pushes agent summaries to the sheets backend
#[derive(Debug, Clone)]
pub struct SheetsClient {
    http: reqwest::Client,
    endpoint: Option<String>,
    outbox: Outbox,
}

impl SheetsClient {
    pub fn new(http: reqwest::Client, endpoint: Option<String>, outbox: Outbox) -> Self {
        let endpoint = endpoint.filter(|e| !e.trim().is_empty());
        Self {
            http,
            endpoint,
            outbox,
        }
    }

    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    pub fn outbox(&self) -> &Outbox {
        &self.outbox
    }

    /// Send a push, or queue it when no endpoint is configured
    pub async fn push(&self, payload: PushPayload) -> Result<PushOutcome, RelayError> {
        match &self.endpoint {
            Some(endpoint) => {
                self.send(endpoint, &payload).await?;
                info!(
                    "Pushed {} / {} to sheets",
                    payload.flight.number, payload.agent_id
                );
                Ok(PushOutcome::Sent)
            }
            None => {
                let queued = self.outbox.append(payload).await?;
                info!("No sheets endpoint configured, queued push ({} pending)", queued);
                Ok(PushOutcome::Queued(queued))
            }
        }
    }

    async fn send(&self, endpoint: &str, payload: &PushPayload) -> Result<(), RelayError> {
        let resp = self.http.post(endpoint).json(payload).send().await?;
        let status = resp.status();
        let reply: Option<SheetsReply> = resp.json().await.ok();

        match reply {
            Some(reply) if status.is_success() && reply.ok => Ok(()),
            reply => Err(RelayError::Rejected {
                status: status.as_u16(),
                message: reply
                    .and_then(|r| r.error)
                    .unwrap_or_else(|| format!("Sheets push failed: {}", status.as_u16())),
            }),
        }
    }

    /// Submit queued pushes. Entries that fail stay queued.
    ///
    /// Returns how many were sent.
    pub async fn flush_outbox(&self) -> Result<usize, RelayError> {
        let endpoint = self.endpoint.as_deref().ok_or(RelayError::NotConfigured)?;

        let entries = self.outbox.entries().await?;
        let mut remaining = Vec::new();
        let mut sent = 0;

        for entry in entries {
            match self.send(endpoint, &entry.payload).await {
                Ok(()) => sent += 1,
                Err(e) => {
                    warn!("Queued push from {} still failing: {}", entry.when, e);
                    remaining.push(entry);
                }
            }
        }

        self.outbox.write(&remaining).await?;
        info!("Flushed {} queued pushes, {} remaining", sent, remaining.len());
        Ok(sent)
    }
}
