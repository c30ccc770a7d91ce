use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

use crate::voice::{CaptureConfig, IntentVocabulary, PhraseParser, RecognizerSettings};

/// Environment prefix, e.g. `FLIGHTOPS__SERVICE__HTTP__PORT=9000`
const ENV_PREFIX: &str = "FLIGHTOPS";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub store: StoreConfig,
    pub relay: RelayConfig,
    pub voice: VoiceConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// JSON file holding all flights
    pub path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RelayConfig {
    /// Sheets backend; pushes are queued in the outbox when unset
    pub sheets_endpoint: Option<String>,

    /// Required `x-api-key` value on `/api/push` when set
    pub shared_secret: Option<String>,

    pub outbox_path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VoiceConfig {
    /// Recognizer language tag
    pub lang: String,
    pub base_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub quick_failure_ms: u64,
    pub max_quick_failures: u32,

    /// Replaces the built-in synonym lists
    pub vocabulary: Option<IntentVocabulary>,
}

impl Config {
    /// Load `path` (any format the `config` crate knows, extension optional)
    /// layered under `FLIGHTOPS__*` environment variables.
    ///
    /// The file is optional; every setting has a default.
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .set_default("service.name", "flightops")?
            .set_default("service.http.bind", "127.0.0.1")?
            .set_default("service.http.port", 8080)?
            .set_default("store.path", "data/flights.json")?
            .set_default("relay.outbox_path", "data/outbox.json")?
            .set_default("voice.lang", "en-GB")?
            .set_default("voice.base_backoff_ms", 250)?
            .set_default("voice.max_backoff_ms", 4000)?
            .set_default("voice.quick_failure_ms", 1000)?
            .set_default("voice.max_quick_failures", 3)?
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()
            .with_context(|| format!("Failed to load config from {}", path))?;

        let mut cfg: Self = settings
            .try_deserialize()
            .context("Invalid configuration")?;

        // plain variables used by earlier deployments of the relay
        if cfg.relay.sheets_endpoint.is_none() {
            cfg.relay.sheets_endpoint = std::env::var("SHEETS_ENDPOINT").ok();
        }
        if cfg.relay.shared_secret.is_none() {
            cfg.relay.shared_secret = std::env::var("SHARED_SECRET").ok();
        }
        cfg.relay.sheets_endpoint = cfg.relay.sheets_endpoint.filter(|s| !s.trim().is_empty());
        cfg.relay.shared_secret = cfg.relay.shared_secret.filter(|s| !s.is_empty());

        Ok(cfg)
    }

    /// Address the HTTP server listens on
    pub fn http_addr(&self) -> String {
        format!("{}:{}", self.service.http.bind, self.service.http.port)
    }
}

impl VoiceConfig {
    pub fn capture_config(&self) -> CaptureConfig {
        CaptureConfig {
            recognizer: RecognizerSettings {
                lang: self.lang.clone(),
                ..Default::default()
            },
            base_backoff: Duration::from_millis(self.base_backoff_ms),
            max_backoff: Duration::from_millis(self.max_backoff_ms),
            quick_failure_threshold: Duration::from_millis(self.quick_failure_ms),
            max_quick_failures: self.max_quick_failures,
        }
    }

    /// Parser over the configured vocabulary, warning about synonyms that
    /// cannot work as written
    pub fn phrase_parser(&self) -> PhraseParser {
        let vocabulary = self.vocabulary.clone().unwrap_or_default();
        for issue in vocabulary.issues() {
            warn!("Vocabulary: {}", issue);
        }
        PhraseParser::new(vocabulary)
    }
}
