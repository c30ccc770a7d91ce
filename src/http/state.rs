use crate::config::RelayConfig;
use crate::flights::FlightStore;
use crate::relay::{Outbox, SheetsClient};
use crate::voice::PhraseParser;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// All flights, persisted on every change
    pub store: Arc<RwLock<FlightStore>>,

    /// Parser for voice phrases posted as text
    pub parser: Arc<PhraseParser>,

    /// Agent summary pushes (sheets endpoint or outbox)
    pub sheets: SheetsClient,

    /// Settings for the `/api/push` pass-through
    pub relay: Arc<RelayConfig>,

    /// Client used to reach the sheets endpoint
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(store: FlightStore, parser: PhraseParser, relay: RelayConfig) -> Self {
        let http = reqwest::Client::new();
        let sheets = SheetsClient::new(
            http.clone(),
            relay.sheets_endpoint.clone(),
            Outbox::new(relay.outbox_path.clone()),
        );

        Self {
            store: Arc::new(RwLock::new(store)),
            parser: Arc::new(parser),
            sheets,
            relay: Arc::new(relay),
            http,
        }
    }
}
