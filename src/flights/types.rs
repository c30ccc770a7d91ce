use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::voice::ClockTime;

/// What an agent does on a flight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Arrival,
    Gate,
}

/// An agent assigned to a flight
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub id: String,
    pub agent_id: String,
    pub role: Role,
}

/// Passengers with reduced mobility, counted per SSR code
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub struct PrmData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wchr: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wchs: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wchc: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emd: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maas: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dpna: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nut: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemarkData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// Operational times and counts logged by one agent on one flight
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentOps {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gate_start: Option<ClockTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gate_end: Option<ClockTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_bus: Option<ClockTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_bus: Option<ClockTime>,

    /// Passengers walked to the aircraft; bus times do not apply
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub walkout: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prm_pickup: Option<ClockTime>,

    /// Boarded count as entered, e.g. "189+1" (adults + infants)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pax_string: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pax_boarded: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub infants_boarded: Option<u32>,

    pub updated_by: String,
    pub updated_at: DateTime<Utc>,
}

impl AgentOps {
    pub fn new(agent_id: &str) -> Self {
        Self {
            gate_start: None,
            gate_end: None,
            first_bus: None,
            last_bus: None,
            walkout: None,
            prm_pickup: None,
            pax_string: None,
            pax_boarded: None,
            infants_boarded: None,
            updated_by: agent_id.to_string(),
            updated_at: Utc::now(),
        }
    }

    pub fn is_walkout(&self) -> bool {
        self.walkout.unwrap_or(false)
    }
}

/// A departure being handled
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flight {
    pub id: String,

    /// Flight number, e.g. "LS123"
    pub number: String,

    /// Destination airport code
    pub destination: String,

    /// Scheduled departure
    pub sched_time: ClockTime,

    /// Operating day as a Jet2 date (`DDMMMYY`)
    pub date: String,

    #[serde(default)]
    pub assignments: Vec<Assignment>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prms: Option<PrmData>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remarks: Option<RemarkData>,

    /// Per-agent logs, keyed by agent id
    #[serde(default)]
    pub agent_ops: BTreeMap<String, AgentOps>,
}

/// Fields supplied when creating a flight
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFlight {
    pub number: String,
    pub destination: String,
    pub sched_time: ClockTime,
    pub date: String,
}

/// Partial flight update; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightUpdate {
    pub number: Option<String>,
    pub destination: Option<String>,
    pub sched_time: Option<ClockTime>,
    pub date: Option<String>,
    pub prms: Option<PrmData>,
    pub remarks: Option<RemarkData>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAssignment {
    pub agent_id: String,
    pub role: Role,
}

/// Partial agent-ops update; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentOpsUpdate {
    pub gate_start: Option<ClockTime>,
    pub gate_end: Option<ClockTime>,
    pub first_bus: Option<ClockTime>,
    pub last_bus: Option<ClockTime>,
    pub walkout: Option<bool>,
    pub prm_pickup: Option<ClockTime>,

    /// Also sets `paxBoarded`/`infantsBoarded` when it reads "N+M"
    pub pax_string: Option<String>,
    pub pax_boarded: Option<u32>,
    pub infants_boarded: Option<u32>,
}
