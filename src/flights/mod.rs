//! Flights, assignments and per-agent operational logs

mod store;
mod types;

pub use store::{FlightStore, StoreError};
pub use types::{
    AgentOps, AgentOpsUpdate, Assignment, Flight, FlightUpdate, NewAssignment, NewFlight,
    PrmData, RemarkData, Role,
};
