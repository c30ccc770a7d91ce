//! HTTP API for flight operations
//!
//! - GET/POST /flights, GET/PATCH /flights/:id - Flight records
//! - POST /flights/:id/assignments - Assign an agent
//! - PATCH /flights/:id/ops/:agent_id - Log agent times and counts
//! - POST /flights/:id/ops/:agent_id/voice - Apply a spoken phrase
//! - POST /flights/:id/ops/:agent_id/push - Send the agent summary to sheets
//! - POST /voice/parse - Parse a phrase without applying it
//! - GET /export.csv?date= - Daily sheet as CSV
//! - POST /api/push - Pass-through to the sheets endpoint
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
