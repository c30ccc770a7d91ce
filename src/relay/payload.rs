use serde::{Deserialize, Serialize};

use crate::export::{operational_item_row, remarks_row};
use crate::flights::{AgentOps, Flight};
use crate::voice::ClockTime;

/// Flight details carried in a push
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushFlight {
    pub id: String,
    pub number: String,
    pub destination: String,
    pub sched_time: ClockTime,
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
}

/// One agent's summary for a flight, as sent to the sheets backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushPayload {
    pub agent_id: String,
    pub flight: PushFlight,
    pub ops: AgentOps,
    pub gate: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,

    /// Operational Items rows (columns B..AC): the task row, then a remarks
    /// row when there are remarks
    #[serde(default)]
    pub rows: Vec<Vec<String>>,
}

impl PushPayload {
    /// Build the push for `agent_id` on `flight`; an agent with nothing
    /// logged yet sends empty ops
    pub fn for_agent(flight: &Flight, agent_id: &str, gate: &str) -> Self {
        let remarks = flight
            .remarks
            .as_ref()
            .and_then(|r| r.text.clone())
            .filter(|t| !t.trim().is_empty());

        let ops = flight
            .agent_ops
            .get(agent_id)
            .cloned()
            .unwrap_or_else(|| AgentOps::new(agent_id));

        let mut rows = vec![operational_item_row(&flight.number, agent_id, &ops, gate)];
        rows.extend(remarks_row(remarks.as_deref()));

        Self {
            agent_id: agent_id.to_string(),
            flight: PushFlight {
                id: flight.id.clone(),
                number: flight.number.clone(),
                destination: flight.destination.clone(),
                sched_time: flight.sched_time,
                date: flight.date.clone(),
                remarks: remarks.clone(),
            },
            ops,
            gate: gate.to_string(),
            remarks,
            rows,
        }
    }
}
