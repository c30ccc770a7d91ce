use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::payload::PushPayload;
use super::RelayError;

/// A push held back for later submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboxEntry {
    pub when: DateTime<Utc>,
    pub payload: PushPayload,
}

/// JSON file queue of pushes made while no sheets endpoint is configured
#[derive(Debug, Clone)]
pub struct Outbox {
    path: PathBuf,
}

impl Outbox {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Queued entries, oldest first. A missing or unreadable file is empty.
    pub async fn entries(&self) -> Result<Vec<OutboxEntry>, RelayError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => Ok(serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!("Ignoring corrupt outbox {}: {}", self.path.display(), e);
                Vec::new()
            })),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn append(&self, payload: PushPayload) -> Result<usize, RelayError> {
        let mut entries = self.entries().await?;
        entries.push(OutboxEntry {
            when: Utc::now(),
            payload,
        });
        self.write(&entries).await?;

        debug!("Outbox {} holds {} entries", self.path.display(), entries.len());
        Ok(entries.len())
    }

    /// Replace the queue contents
    pub async fn write(&self, entries: &[OutboxEntry]) -> Result<(), RelayError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(entries)?;
        tokio::fs::write(&self.path, json).await?;
        Ok(())
    }
}
