use super::state::AppState;
use crate::export::{parse_jet2, rows_to_csv, to_jet2, to_sheet_rows};
use crate::flights::{
    AgentOps, AgentOpsUpdate, Assignment, Flight, FlightUpdate, NewAssignment, NewFlight,
    StoreError,
};
use crate::relay::{forward, PushOutcome, PushPayload};
use crate::voice::ParsedIntent;
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{error, info, warn};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct FlightsQuery {
    /// Only flights operating on this Jet2 date
    pub date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    /// Jet2 (`25MAY25`) or ISO (`2025-05-25`) date
    pub date: String,
}

#[derive(Debug, Deserialize)]
pub struct VoiceRequest {
    /// One finalized utterance
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct VoiceResponse {
    pub intent: ParsedIntent,

    /// Whether the intent changed the flight
    pub applied: bool,
}

#[derive(Debug, Deserialize)]
pub struct PushRequest {
    /// Gate the flight boarded from
    #[serde(default)]
    pub gate: String,
}

#[derive(Debug, Serialize)]
pub struct PushResponse {
    /// "sent" or "queued"
    pub status: String,

    /// Outbox length after queueing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, error: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
        .into_response()
}

fn store_error(e: StoreError) -> Response {
    match e {
        StoreError::FlightNotFound(_) => error_response(StatusCode::NOT_FOUND, e.to_string()),
        e => {
            error!("Flight store error: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

/// Accept a Jet2 date as is, or convert an ISO date
fn jet2_date(date: &str) -> Option<String> {
    match parse_jet2(date) {
        Some(_) => Some(date.trim().to_ascii_uppercase()),
        None => to_jet2(date),
    }
}

// ============================================================================
// Flights
// ============================================================================

/// GET /flights
pub async fn list_flights(
    State(state): State<AppState>,
    Query(query): Query<FlightsQuery>,
) -> Response {
    let day = match query.date.as_deref() {
        Some(date) => match jet2_date(date) {
            Some(day) => Some(day),
            None => {
                return error_response(
                    StatusCode::BAD_REQUEST,
                    format!("Invalid date {:?}, expected DDMMMYY or YYYY-MM-DD", date),
                )
            }
        },
        None => None,
    };

    let store = state.store.read().await;
    let flights: Vec<Flight> = store
        .flights()
        .iter()
        .filter(|f| day.as_ref().map_or(true, |d| &f.date == d))
        .cloned()
        .collect();

    Json(flights).into_response()
}

/// POST /flights
pub async fn create_flight(
    State(state): State<AppState>,
    Json(mut req): Json<NewFlight>,
) -> Response {
    let Some(date) = jet2_date(&req.date) else {
        return error_response(
            StatusCode::BAD_REQUEST,
            format!("Invalid date {:?}, expected DDMMMYY or YYYY-MM-DD", req.date),
        );
    };
    req.date = date;

    let mut store = state.store.write().await;
    match store.add_flight(req).await {
        Ok(flight) => (StatusCode::CREATED, Json(flight)).into_response(),
        Err(e) => store_error(e),
    }
}

/// GET /flights/:id
pub async fn get_flight(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let store = state.store.read().await;
    match store.get(&id) {
        Some(flight) => Json(flight.clone()).into_response(),
        None => store_error(StoreError::FlightNotFound(id)),
    }
}

/// PATCH /flights/:id
pub async fn update_flight(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(mut req): Json<FlightUpdate>,
) -> Response {
    if let Some(date) = req.date.take() {
        match jet2_date(&date) {
            Some(date) => req.date = Some(date),
            None => {
                return error_response(
                    StatusCode::BAD_REQUEST,
                    format!("Invalid date {:?}, expected DDMMMYY or YYYY-MM-DD", date),
                )
            }
        }
    }

    let mut store = state.store.write().await;
    match store.update_flight(&id, req).await {
        Ok(flight) => Json(flight).into_response(),
        Err(e) => store_error(e),
    }
}

/// POST /flights/:id/assignments
pub async fn add_assignment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<NewAssignment>,
) -> Response {
    let mut store = state.store.write().await;
    match store.add_assignment(&id, req).await {
        Ok(assignment) => (StatusCode::CREATED, Json::<Assignment>(assignment)).into_response(),
        Err(e) => store_error(e),
    }
}

/// PATCH /flights/:id/ops/:agent_id
pub async fn update_agent_ops(
    State(state): State<AppState>,
    Path((id, agent_id)): Path<(String, String)>,
    Json(req): Json<AgentOpsUpdate>,
) -> Response {
    let mut store = state.store.write().await;
    match store.update_agent_ops(&id, &agent_id, req).await {
        Ok(ops) => Json::<AgentOps>(ops).into_response(),
        Err(e) => store_error(e),
    }
}

// ============================================================================
// Voice
// ============================================================================

/// POST /voice/parse
pub async fn parse_voice(
    State(state): State<AppState>,
    Json(req): Json<VoiceRequest>,
) -> impl IntoResponse {
    Json(state.parser.parse(&req.text))
}

/// POST /flights/:id/ops/:agent_id/voice
/// Parse an utterance and apply it to the agent's log
pub async fn apply_voice(
    State(state): State<AppState>,
    Path((id, agent_id)): Path<(String, String)>,
    Json(req): Json<VoiceRequest>,
) -> Response {
    let intent = state.parser.parse(&req.text);

    let mut store = state.store.write().await;
    match store.apply_intent(&id, &agent_id, &intent).await {
        Ok(applied) => {
            info!("Voice {:?} on {} by {}: {:?}", req.text, id, agent_id, intent);
            Json(VoiceResponse { intent, applied }).into_response()
        }
        Err(e) => store_error(e),
    }
}

// ============================================================================
// Export & push
// ============================================================================

/// GET /export.csv?date=DDMMMYY
pub async fn export_csv(
    State(state): State<AppState>,
    Query(query): Query<ExportQuery>,
) -> Response {
    let Some(day) = jet2_date(&query.date) else {
        return error_response(
            StatusCode::BAD_REQUEST,
            format!("Invalid date {:?}, expected DDMMMYY or YYYY-MM-DD", query.date),
        );
    };

    let store = state.store.read().await;
    let csv = rows_to_csv(&to_sheet_rows(store.flights(), &day));

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"flightops-{}.csv\"", day),
            ),
        ],
        csv,
    )
        .into_response()
}

/// POST /flights/:id/ops/:agent_id/push
/// Send the agent's summary to the sheets backend, or queue it
pub async fn push_agent(
    State(state): State<AppState>,
    Path((id, agent_id)): Path<(String, String)>,
    Json(req): Json<PushRequest>,
) -> Response {
    let payload = {
        let store = state.store.read().await;
        match store.get(&id) {
            Some(flight) => PushPayload::for_agent(flight, &agent_id, &req.gate),
            None => return store_error(StoreError::FlightNotFound(id)),
        }
    };

    match state.sheets.push(payload).await {
        Ok(PushOutcome::Sent) => Json(PushResponse {
            status: "sent".to_string(),
            pending: None,
        })
        .into_response(),
        Ok(PushOutcome::Queued(pending)) => (
            StatusCode::ACCEPTED,
            Json(PushResponse {
                status: "queued".to_string(),
                pending: Some(pending),
            }),
        )
            .into_response(),
        Err(e) => {
            error!("Push failed: {}", e);
            error_response(StatusCode::BAD_GATEWAY, e.to_string())
        }
    }
}

// ============================================================================
// /api/push pass-through
// ============================================================================

fn with_cors(status: StatusCode, body: Option<Value>) -> Response {
    let mut resp = match body {
        Some(body) => (status, Json(body)).into_response(),
        None => status.into_response(),
    };

    let headers = resp.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("POST, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type, x-api-key"),
    );
    resp
}

/// OPTIONS /api/push
pub async fn relay_preflight() -> Response {
    with_cors(StatusCode::OK, None)
}

/// Any other method on /api/push
pub async fn relay_method_not_allowed() -> Response {
    with_cors(
        StatusCode::METHOD_NOT_ALLOWED,
        Some(json!({ "ok": false, "error": "Method not allowed" })),
    )
}

/// POST /api/push
/// Forward the body to the sheets endpoint and mirror its answer
pub async fn relay_push(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    if let Some(secret) = &state.relay.shared_secret {
        let key = headers.get("x-api-key").and_then(|v| v.to_str().ok());
        if key != Some(secret.as_str()) {
            warn!("Rejected relay request with bad api key");
            return with_cors(
                StatusCode::UNAUTHORIZED,
                Some(json!({ "ok": false, "error": "Unauthorized" })),
            );
        }
    }

    let Some(endpoint) = state.relay.sheets_endpoint.as_deref() else {
        return with_cors(
            StatusCode::INTERNAL_SERVER_ERROR,
            Some(json!({ "ok": false, "error": "Sheets endpoint not configured" })),
        );
    };

    let payload: Value = if body.is_empty() {
        Value::Null
    } else {
        match serde_json::from_slice(&body) {
            Ok(v) => v,
            Err(e) => {
                return with_cors(
                    StatusCode::BAD_REQUEST,
                    Some(json!({ "ok": false, "error": format!("Invalid JSON: {}", e) })),
                )
            }
        }
    };

    match forward(&state.http, endpoint, &payload).await {
        Ok((status, data)) => {
            let status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
            with_cors(status, Some(data))
        }
        Err(e) => {
            error!("Relay to sheets failed: {}", e);
            with_cors(
                StatusCode::INTERNAL_SERVER_ERROR,
                Some(json!({ "ok": false, "error": e.to_string() })),
            )
        }
    }
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
