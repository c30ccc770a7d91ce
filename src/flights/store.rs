use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::types::{
    AgentOps, AgentOpsUpdate, Assignment, Flight, FlightUpdate, NewAssignment, NewFlight,
    RemarkData,
};
use crate::export::parse_pax;
use crate::voice::{ParsedIntent, TimeField};

/// Errors returned by [`FlightStore`]
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Flight {0} not found")]
    FlightNotFound(String),

    #[error("Failed to access flight store: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode flight store: {0}")]
    Encode(#[from] serde_json::Error),
}

fn merge<T>(slot: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *slot = value;
    }
}

/// On-disk layout; flights live under a single well-known key
#[derive(Debug, Default, Deserialize)]
struct Document {
    #[serde(rename = "flightops/flights", default)]
    flights: Vec<Flight>,
}

#[derive(Serialize)]
struct DocumentRef<'a> {
    #[serde(rename = "flightops/flights")]
    flights: &'a [Flight],
}

/// Flights and assignments, persisted to a JSON file after every change
#[derive(Debug, Default)]
pub struct FlightStore {
    /// Backing file; `None` keeps everything in memory
    path: Option<PathBuf>,
    flights: Vec<Flight>,
}

impl FlightStore {
    /// Store that is never written to disk
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Load the store at `path`.
    ///
    /// A missing file yields an empty store. So does an unreadable document,
    /// with a warning; the next write replaces it.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();

        let flights = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => match serde_json::from_str::<Document>(&raw) {
                Ok(doc) => doc.flights,
                Err(e) => {
                    warn!("Ignoring corrupt flight store {}: {}", path.display(), e);
                    Vec::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };

        info!("Loaded {} flights from {}", flights.len(), path.display());

        Ok(Self {
            path: Some(path),
            flights,
        })
    }

    pub fn flights(&self) -> &[Flight] {
        &self.flights
    }

    pub fn get(&self, id: &str) -> Option<&Flight> {
        self.flights.iter().find(|f| f.id == id)
    }

    /// Write `flights` out, then make them current. A failed write leaves
    /// the store as it was.
    async fn commit(&mut self, flights: Vec<Flight>) -> Result<(), StoreError> {
        if let Some(path) = &self.path {
            write_document(path, &flights).await?;
            debug!("Saved {} flights to {}", flights.len(), path.display());
        }
        self.flights = flights;
        Ok(())
    }

    /// Copy of the flight list with the flight `id` picked out for editing
    fn stage(&self, id: &str) -> Result<(Vec<Flight>, usize), StoreError> {
        let index = self
            .flights
            .iter()
            .position(|f| f.id == id)
            .ok_or_else(|| StoreError::FlightNotFound(id.to_string()))?;
        Ok((self.flights.clone(), index))
    }

    /// Create a flight with no assignments, remarks or PRM data
    pub async fn add_flight(&mut self, new: NewFlight) -> Result<Flight, StoreError> {
        let flight = Flight {
            id: uuid::Uuid::new_v4().to_string(),
            number: new.number,
            destination: new.destination,
            sched_time: new.sched_time,
            date: new.date,
            assignments: Vec::new(),
            prms: None,
            remarks: None,
            agent_ops: Default::default(),
        };

        let mut flights = self.flights.clone();
        flights.push(flight.clone());
        self.commit(flights).await?;

        info!("Added flight {} ({} {})", flight.number, flight.date, flight.sched_time);
        Ok(flight)
    }

    pub async fn update_flight(
        &mut self,
        id: &str,
        update: FlightUpdate,
    ) -> Result<Flight, StoreError> {
        let (mut flights, index) = self.stage(id)?;
        let flight = &mut flights[index];

        if let Some(number) = update.number {
            flight.number = number;
        }
        if let Some(destination) = update.destination {
            flight.destination = destination;
        }
        if let Some(sched_time) = update.sched_time {
            flight.sched_time = sched_time;
        }
        if let Some(date) = update.date {
            flight.date = date;
        }
        if let Some(prms) = update.prms {
            flight.prms = Some(prms);
        }
        if let Some(remarks) = update.remarks {
            flight.remarks = Some(remarks);
        }

        let flight = flight.clone();
        self.commit(flights).await?;
        Ok(flight)
    }

    pub async fn add_assignment(
        &mut self,
        flight_id: &str,
        new: NewAssignment,
    ) -> Result<Assignment, StoreError> {
        let (mut flights, index) = self.stage(flight_id)?;
        let flight = &mut flights[index];

        let assignment = Assignment {
            id: uuid::Uuid::new_v4().to_string(),
            agent_id: new.agent_id,
            role: new.role,
        };
        flight.assignments.push(assignment.clone());
        let number = flight.number.clone();

        self.commit(flights).await?;
        info!(
            "Assigned {} to flight {} as {:?}",
            assignment.agent_id, number, assignment.role
        );
        Ok(assignment)
    }

    /// Merge `update` into the agent's ops for a flight, creating them if needed.
    ///
    /// A `paxString` of the form "N+M" also sets the boarded and infant counts;
    /// any other text clears them.
    pub async fn update_agent_ops(
        &mut self,
        flight_id: &str,
        agent_id: &str,
        update: AgentOpsUpdate,
    ) -> Result<AgentOps, StoreError> {
        let (mut flights, index) = self.stage(flight_id)?;
        let ops = flights[index]
            .agent_ops
            .entry(agent_id.to_string())
            .or_insert_with(|| AgentOps::new(agent_id));

        merge(&mut ops.gate_start, update.gate_start);
        merge(&mut ops.gate_end, update.gate_end);
        merge(&mut ops.first_bus, update.first_bus);
        merge(&mut ops.last_bus, update.last_bus);
        merge(&mut ops.walkout, update.walkout);
        merge(&mut ops.prm_pickup, update.prm_pickup);
        merge(&mut ops.pax_boarded, update.pax_boarded);
        merge(&mut ops.infants_boarded, update.infants_boarded);

        if let Some(pax) = update.pax_string {
            let counts = parse_pax(&pax);
            ops.pax_boarded = counts.map(|(adults, _)| adults);
            ops.infants_boarded = counts.map(|(_, infants)| infants);
            ops.pax_string = Some(pax).filter(|s| !s.is_empty());
        }

        ops.updated_by = agent_id.to_string();
        ops.updated_at = Utc::now();

        let ops = ops.clone();
        self.commit(flights).await?;
        Ok(ops)
    }

    /// Apply a recognized voice intent on behalf of an agent.
    ///
    /// Returns `false` for [`ParsedIntent::Unrecognized`], which changes nothing.
    pub async fn apply_intent(
        &mut self,
        flight_id: &str,
        agent_id: &str,
        intent: &ParsedIntent,
    ) -> Result<bool, StoreError> {
        match intent {
            ParsedIntent::TimeUpdate { field, hhmm } => {
                let mut update = AgentOpsUpdate::default();
                let slot = match field {
                    TimeField::GateStart => &mut update.gate_start,
                    TimeField::GateEnd => &mut update.gate_end,
                    TimeField::FirstBus => &mut update.first_bus,
                    TimeField::LastBus => &mut update.last_bus,
                    TimeField::PrmPickup => &mut update.prm_pickup,
                };
                *slot = Some(*hhmm);
                self.update_agent_ops(flight_id, agent_id, update).await?;
            }
            ParsedIntent::WalkoutFlag { value } => {
                let update = AgentOpsUpdate {
                    walkout: Some(*value),
                    ..Default::default()
                };
                self.update_agent_ops(flight_id, agent_id, update).await?;
            }
            ParsedIntent::RemarkText { text } => {
                self.append_remark(flight_id, text).await?;
            }
            ParsedIntent::Unrecognized => return Ok(false),
        }
        Ok(true)
    }

    /// Append a line to the flight remark, never replacing what is there
    pub async fn append_remark(&mut self, flight_id: &str, text: &str) -> Result<(), StoreError> {
        let (mut flights, index) = self.stage(flight_id)?;
        let remarks = flights[index]
            .remarks
            .get_or_insert_with(RemarkData::default);

        remarks.text = Some(match remarks.text.take().filter(|t| !t.is_empty()) {
            Some(existing) => format!("{existing}\n{text}"),
            None => text.to_string(),
        });

        self.commit(flights).await
    }
}

async fn write_document(path: &Path, flights: &[Flight]) -> Result<(), StoreError> {
    let json = serde_json::to_string_pretty(&DocumentRef { flights })?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    // write-then-rename so readers never see a partial file
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, json).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}
