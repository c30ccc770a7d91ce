//! Operational item rows for the daily workbook
//!
//! Rows span columns B..AC. The item row carries the flight number, agent and
//! a one-line summary comment; an optional second row carries the remarks.

use regex::Regex;
use std::sync::LazyLock;

use crate::flights::AgentOps;
use crate::voice::ClockTime;

/// Columns B..AC
pub const ROW_WIDTH: usize = 28;

const COL_ITEM: usize = 0; // B
const COL_AREA: usize = 1; // C
const COL_AREA_2: usize = 2; // D
const COL_FLIGHT: usize = 3; // E
const COL_AGENT: usize = 6; // H
const COL_COMMENT: usize = 11; // M

const MISSING: &str = "—";

static PAX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\s*\+\s*(\d+)$").expect("pax regex is valid"));

/// Split a boarded count like "189+1" into (passengers, infants)
pub fn parse_pax(value: &str) -> Option<(u32, u32)> {
    let caps = PAX_RE.captures(value)?;
    Some((caps[1].parse().ok()?, caps[2].parse().ok()?))
}

/// "Gate 12, start: 05:50, end: —, first bus: walkout, ..."
pub fn build_comment(ops: &AgentOps, gate: &str) -> String {
    let walkout = ops.is_walkout();
    let seg = |label: &str, value: Option<ClockTime>, as_walkout: bool| match value {
        Some(t) => format!("{label}: {t}"),
        None if as_walkout => format!("{label}: walkout"),
        None => format!("{label}: {MISSING}"),
    };

    let gate = if gate.trim().is_empty() { MISSING } else { gate };

    [
        format!("Gate {gate}"),
        seg("start", ops.gate_start, false),
        seg("end", ops.gate_end, false),
        seg("first bus", ops.first_bus, walkout),
        seg("last bus", ops.last_bus, walkout),
        seg("prm", ops.prm_pickup, false),
    ]
    .join(", ")
}

fn boarding_row(item: &str) -> Vec<String> {
    let mut row = vec![String::new(); ROW_WIDTH];
    row[COL_ITEM] = item.to_string();
    row[COL_AREA] = "Boarding".to_string();
    row[COL_AREA_2] = "Boarding".to_string();
    row
}

/// The "Task" row for one agent's work on a flight
pub fn operational_item_row(
    flight_number: &str,
    agent_id: &str,
    ops: &AgentOps,
    gate: &str,
) -> Vec<String> {
    let mut row = boarding_row("Task");
    row[COL_FLIGHT] = flight_number.to_string();
    row[COL_AGENT] = agent_id.to_string();
    row[COL_COMMENT] = build_comment(ops, gate);
    row
}

/// The "info" row carrying remarks, if there are any
pub fn remarks_row(remarks: Option<&str>) -> Option<Vec<String>> {
    let remarks = remarks.filter(|r| !r.trim().is_empty())?;
    let mut row = boarding_row("info");
    row[COL_COMMENT] = remarks.to_string();
    Some(row)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pax() {
        assert_eq!(parse_pax("189+1"), Some((189, 1)));
        assert_eq!(parse_pax("150 + 0"), Some((150, 0)));
        assert_eq!(parse_pax("189"), None);
        assert_eq!(parse_pax(" 189+1"), None);
        assert_eq!(parse_pax("a+1"), None);
    }

    #[test]
    fn test_comment_with_walkout() {
        let mut ops = AgentOps::new("agent-7");
        ops.gate_start = ClockTime::new(5, 50);
        ops.walkout = Some(true);

        assert_eq!(
            build_comment(&ops, "12"),
            "Gate 12, start: 05:50, end: —, first bus: walkout, last bus: walkout, prm: —"
        );
    }

    #[test]
    fn test_comment_without_gate() {
        let mut ops = AgentOps::new("agent-7");
        ops.first_bus = ClockTime::new(6, 5);
        assert_eq!(
            build_comment(&ops, ""),
            "Gate —, start: —, end: —, first bus: 06:05, last bus: —, prm: —"
        );
    }

    #[test]
    fn test_item_row_layout() {
        let ops = AgentOps::new("agent-7");
        let row = operational_item_row("LS123", "agent-7", &ops, "12");

        assert_eq!(row.len(), ROW_WIDTH);
        assert_eq!(row[0], "Task");
        assert_eq!(row[1], "Boarding");
        assert_eq!(row[2], "Boarding");
        assert_eq!(row[3], "LS123");
        assert_eq!(row[6], "agent-7");
        assert!(row[11].starts_with("Gate 12, "));
        assert!(row[4].is_empty() && row[27].is_empty());
    }

    #[test]
    fn test_remarks_row() {
        assert_eq!(remarks_row(None), None);
        assert_eq!(remarks_row(Some("  ")), None);

        let row = remarks_row(Some("catering late")).unwrap();
        assert_eq!(row[0], "info");
        assert_eq!(row[11], "catering late");
    }
}
