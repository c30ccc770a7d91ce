pub mod config;
pub mod export;
pub mod flights;
pub mod http;
pub mod relay;
pub mod voice;

pub use config::Config;
pub use flights::{Flight, FlightStore, StoreError};
pub use http::{create_router, AppState};
pub use relay::{PushPayload, RelayError, SheetsClient};
pub use voice::{
    parse_phrase, CaptureHandle, ClockTime, ParsedIntent, PhraseParser, SpeechCapture, TimeField,
    VoiceEvent,
};
