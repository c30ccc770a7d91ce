use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use flightops::export::{parse_jet2, rows_to_csv, to_jet2, to_sheet_rows};
use flightops::flights::FlightStore;
use flightops::relay::{Outbox, SheetsClient};
use flightops::voice::console::{ConsoleRecognizerFactory, GrantedPermission};
use flightops::voice::{CapturePhase, SpeechCapture};
use flightops::{create_router, AppState, Config};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::BufReader;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "flightops", version, about = "Ground operations tracking with voice input")]
struct Cli {
    /// Config file (extension optional)
    #[arg(long, global = true, default_value = "config/flightops")]
    config: String,

    /// Debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP API
    Serve,

    /// Parse a phrase and print the intent as JSON
    Parse {
        #[arg(required = true)]
        text: Vec<String>,
    },

    /// Write the daily sheet as CSV
    Export {
        /// DDMMMYY or YYYY-MM-DD
        #[arg(long)]
        date: String,

        /// Output file (stdout when omitted)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Capture phrases from stdin, one per line, and apply them to a flight
    Listen {
        #[arg(long)]
        flight: String,

        #[arg(long)]
        agent: String,
    },

    /// Send pushes queued in the outbox
    Flush,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(if cli.verbose { "debug" } else { "info" }))
        .context("Invalid log filter")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cfg = Config::load(&cli.config)?;

    match cli.command {
        Command::Serve => serve(cfg).await,
        Command::Parse { text } => {
            let intent = cfg.voice.phrase_parser().parse(&text.join(" "));
            println!("{}", serde_json::to_string_pretty(&intent)?);
            Ok(())
        }
        Command::Export { date, out } => export(cfg, &date, out).await,
        Command::Listen { flight, agent } => listen(cfg, &flight, &agent).await,
        Command::Flush => {
            let sheets = SheetsClient::new(
                reqwest::Client::new(),
                cfg.relay.sheets_endpoint.clone(),
                Outbox::new(cfg.relay.outbox_path.clone()),
            );
            let sent = sheets.flush_outbox().await?;
            info!("Sent {} queued pushes", sent);
            Ok(())
        }
    }
}

async fn serve(cfg: Config) -> Result<()> {
    info!("{} v{}", cfg.service.name, env!("CARGO_PKG_VERSION"));

    let store = FlightStore::open(&cfg.store.path)
        .await
        .context("Failed to open flight store")?;
    if cfg.relay.sheets_endpoint.is_none() {
        info!(
            "No sheets endpoint configured, pushes queue in {}",
            cfg.relay.outbox_path.display()
        );
    }

    let addr = cfg.http_addr();
    let state = AppState::new(store, cfg.voice.phrase_parser(), cfg.relay);
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("HTTP server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await
        .context("HTTP server failed")?;

    Ok(())
}

async fn export(cfg: Config, date: &str, out: Option<PathBuf>) -> Result<()> {
    let day = match parse_jet2(date) {
        Some(_) => date.to_ascii_uppercase(),
        None => to_jet2(date).with_context(|| format!("Invalid date {:?}", date))?,
    };

    let store = FlightStore::open(&cfg.store.path)
        .await
        .context("Failed to open flight store")?;
    let rows = to_sheet_rows(store.flights(), &day);
    let csv = rows_to_csv(&rows);

    match out {
        Some(path) => {
            tokio::fs::write(&path, csv)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Wrote {} rows for {} to {}", rows.len(), day, path.display());
        }
        None => println!("{}", csv),
    }
    Ok(())
}

async fn listen(cfg: Config, flight_id: &str, agent_id: &str) -> Result<()> {
    let mut store = FlightStore::open(&cfg.store.path)
        .await
        .context("Failed to open flight store")?;
    let flight = store
        .get(flight_id)
        .with_context(|| format!("Flight {} not found", flight_id))?;
    info!("Listening for {} on {} {}", agent_id, flight.number, flight.date);

    let factory = ConsoleRecognizerFactory::new();
    let capture = SpeechCapture::spawn(
        cfg.voice.capture_config(),
        cfg.voice.phrase_parser(),
        Arc::new(factory.clone()),
        Arc::new(GrantedPermission),
    );

    let mut state = capture.subscribe();
    capture.start();
    let ready = state
        .wait_for(|s| s.listening || s.phase == CapturePhase::Failed)
        .await
        .map(|s| s.clone())
        .context("Speech capture ended before it started")?;
    if let Some(err) = ready.error.filter(|_| ready.phase == CapturePhase::Failed) {
        anyhow::bail!("Speech capture failed: {}", err);
    }

    let flight_id = flight_id.to_string();
    let agent_id = agent_id.to_string();
    let applier = tokio::spawn(async move {
        let mut seen = 0;
        while state.changed().await.is_ok() {
            let snapshot = state.borrow_and_update().clone();

            for event in snapshot.events.iter().skip(seen) {
                match store.apply_intent(&flight_id, &agent_id, &event.parsed_intent).await {
                    Ok(true) => info!("{:?} -> {:?}", event.raw_text, event.parsed_intent),
                    Ok(false) => warn!("Not understood: {:?}", event.raw_text),
                    Err(e) => error!("Failed to apply {:?}: {}", event.raw_text, e),
                }
            }
            seen = snapshot.events.len();
        }
    });

    let lines = factory
        .feed(BufReader::new(tokio::io::stdin()))
        .await
        .context("Failed to read stdin")?;
    info!("Input closed after {} phrases", lines);

    capture.dispose();
    applier.await.context("Voice applier task failed")?;
    Ok(())
}
