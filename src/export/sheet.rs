use serde::Serialize;

use crate::flights::{AgentOps, Flight};
use crate::voice::ClockTime;

/// Column headers, in output order
pub const SHEET_COLUMNS: [&str; 15] = [
    "Date",
    "FlightNo",
    "Destination",
    "STD",
    "Agent",
    "Role",
    "GateStart",
    "GateEnd",
    "FirstBus",
    "LastBus",
    "Walkout",
    "PRMPickup",
    "PaxString",
    "PaxBoarded",
    "InfantsBoarded",
];

/// One assignment's row in the daily operations sheet
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SheetRow {
    /// Jet2 date, `DDMMMYY`
    pub date: String,
    pub flight_no: String,
    pub destination: String,
    #[serde(rename = "STD")]
    pub std: String,
    pub agent: String,
    pub role: String,
    pub gate_start: Option<String>,
    pub gate_end: Option<String>,
    pub first_bus: Option<String>,
    pub last_bus: Option<String>,
    /// `Y` or `N`
    pub walkout: char,
    #[serde(rename = "PRMPickup")]
    pub prm_pickup: Option<String>,
    pub pax_string: Option<String>,
    pub pax_boarded: Option<u32>,
    pub infants_boarded: Option<u32>,
}

impl SheetRow {
    /// Cell values in [`SHEET_COLUMNS`] order; missing values are empty
    pub fn values(&self) -> [String; 15] {
        let opt = |v: &Option<String>| v.clone().unwrap_or_default();
        let num = |v: &Option<u32>| v.map(|n| n.to_string()).unwrap_or_default();

        [
            self.date.clone(),
            self.flight_no.clone(),
            self.destination.clone(),
            self.std.clone(),
            self.agent.clone(),
            self.role.clone(),
            opt(&self.gate_start),
            opt(&self.gate_end),
            opt(&self.first_bus),
            opt(&self.last_bus),
            self.walkout.to_string(),
            opt(&self.prm_pickup),
            opt(&self.pax_string),
            num(&self.pax_boarded),
            num(&self.infants_boarded),
        ]
    }
}

/// One row per assignment on flights operating on `day` (a Jet2 date)
pub fn to_sheet_rows(flights: &[Flight], day: &str) -> Vec<SheetRow> {
    flights
        .iter()
        .filter(|f| f.date == day)
        .flat_map(|f| {
            f.assignments.iter().map(move |a| {
                let ops = f.agent_ops.get(&a.agent_id);
                let time = |pick: fn(&AgentOps) -> Option<ClockTime>| {
                    ops.and_then(pick).map(|t| t.to_string())
                };

                SheetRow {
                    date: day.to_string(),
                    flight_no: f.number.clone(),
                    destination: f.destination.clone(),
                    std: f.sched_time.to_string(),
                    agent: a.agent_id.clone(),
                    role: format!("{:?}", a.role),
                    gate_start: time(|o| o.gate_start),
                    gate_end: time(|o| o.gate_end),
                    first_bus: time(|o| o.first_bus),
                    last_bus: time(|o| o.last_bus),
                    walkout: if ops.is_some_and(|o| o.is_walkout()) { 'Y' } else { 'N' },
                    prm_pickup: time(|o| o.prm_pickup),
                    pax_string: ops.and_then(|o| o.pax_string.clone()),
                    pax_boarded: ops.and_then(|o| o.pax_boarded),
                    infants_boarded: ops.and_then(|o| o.infants_boarded),
                }
            })
        })
        .collect()
}

/// Render rows as CSV: a header line, then every value double-quoted with
/// embedded quotes doubled. No rows renders as an empty string.
pub fn rows_to_csv(rows: &[SheetRow]) -> String {
    if rows.is_empty() {
        return String::new();
    }

    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(SHEET_COLUMNS.join(","));
    for row in rows {
        let cells: Vec<String> = row
            .values()
            .iter()
            .map(|v| format!("\"{}\"", v.replace('"', "\"\"")))
            .collect();
        lines.push(cells.join(","));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> SheetRow {
        SheetRow {
            date: "25MAY25".to_string(),
            flight_no: "LS123".to_string(),
            destination: "MAN".to_string(),
            std: "06:30".to_string(),
            agent: "agent-7".to_string(),
            role: "Gate".to_string(),
            gate_start: Some("05:50".to_string()),
            gate_end: None,
            first_bus: None,
            last_bus: None,
            walkout: 'Y',
            prm_pickup: None,
            pax_string: Some("189+1".to_string()),
            pax_boarded: Some(189),
            infants_boarded: Some(1),
        }
    }

    #[test]
    fn test_csv_quotes_every_value() {
        let csv = rows_to_csv(&[row()]);
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("Date,FlightNo,Destination,STD,Agent,Role,GateStart,GateEnd,FirstBus,LastBus,Walkout,PRMPickup,PaxString,PaxBoarded,InfantsBoarded")
        );
        assert_eq!(
            lines.next(),
            Some(r#""25MAY25","LS123","MAN","06:30","agent-7","Gate","05:50","","","","Y","","189+1","189","1""#)
        );
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_csv_escapes_quotes() {
        let mut r = row();
        r.destination = r#"say "hi""#.to_string();
        assert!(rows_to_csv(&[r]).contains(r#""LS123","say ""hi""","06:30""#));
    }

    #[test]
    fn test_csv_empty() {
        assert_eq!(rows_to_csv(&[]), "");
    }
}
