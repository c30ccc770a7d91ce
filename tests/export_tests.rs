// Integration tests for spreadsheet exports
//
// Flights are built through the store so rows reflect what voice updates
// actually leave behind.

use anyhow::Result;
use flightops::export::{
    format_jet2, from_jet2, operational_item_row, remarks_row, rows_to_csv, to_jet2,
    to_sheet_rows, ROW_WIDTH, SHEET_COLUMNS,
};
use flightops::flights::{NewAssignment, NewFlight, Role};
use flightops::relay::PushPayload;
use flightops::voice::parse_phrase;
use flightops::FlightStore;

async fn seeded_store() -> Result<(FlightStore, String)> {
    let mut store = FlightStore::in_memory();

    let add = |number: &str, date: &str| NewFlight {
        number: number.to_string(),
        destination: "PMI".to_string(),
        sched_time: "07:15".parse().unwrap(),
        date: date.to_string(),
    };
    let today = store.add_flight(add("LS101", "25MAY25")).await?.id;
    let tomorrow = store.add_flight(add("LS202", "26MAY25")).await?.id;

    for (flight, agent, role) in [
        (&today, "agent-1", Role::Gate),
        (&today, "agent-2", Role::Arrival),
        (&tomorrow, "agent-1", Role::Gate),
    ] {
        store
            .add_assignment(
                flight,
                NewAssignment {
                    agent_id: agent.to_string(),
                    role,
                },
            )
            .await?;
    }

    for phrase in ["gate open 0550", "gate closed 06:40", "walkout"] {
        store
            .apply_intent(&today, "agent-1", &parse_phrase(phrase))
            .await?;
    }
    store
        .apply_intent(&today, "agent-1", &parse_phrase("remark crew late"))
        .await?;

    Ok((store, today))
}

#[tokio::test]
async fn test_daily_sheet_rows() -> Result<()> {
    let (store, _) = seeded_store().await?;

    let rows = to_sheet_rows(store.flights(), "25MAY25");
    assert_eq!(rows.len(), 2);

    let gate = &rows[0];
    assert_eq!(gate.flight_no, "LS101");
    assert_eq!(gate.agent, "agent-1");
    assert_eq!(gate.role, "Gate");
    assert_eq!(gate.gate_start.as_deref(), Some("05:50"));
    assert_eq!(gate.gate_end.as_deref(), Some("06:40"));
    assert_eq!(gate.walkout, 'Y');

    // assigned but never logged anything
    let arrival = &rows[1];
    assert_eq!(arrival.role, "Arrival");
    assert_eq!(arrival.gate_start, None);
    assert_eq!(arrival.walkout, 'N');

    assert!(to_sheet_rows(store.flights(), "27MAY25").is_empty());
    Ok(())
}

#[tokio::test]
async fn test_daily_csv() -> Result<()> {
    let (store, _) = seeded_store().await?;

    let csv = rows_to_csv(&to_sheet_rows(store.flights(), "26MAY25"));
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines, vec![
        SHEET_COLUMNS.join(",").as_str(),
        r#""26MAY25","LS202","PMI","07:15","agent-1","Gate","","","","","N","","","","""#,
    ]);

    assert_eq!(rows_to_csv(&[]), "");
    Ok(())
}

#[tokio::test]
async fn test_operational_rows_from_store() -> Result<()> {
    let (store, today) = seeded_store().await?;
    let flight = store.get(&today).unwrap();

    let payload = PushPayload::for_agent(flight, "agent-1", "14");
    assert_eq!(payload.rows.len(), 2);

    let row = &payload.rows[0];
    assert_eq!(row.len(), ROW_WIDTH);
    assert_eq!(row[0], "Task");
    assert_eq!(row[3], "LS101");
    assert_eq!(row[6], "agent-1");
    assert_eq!(
        row[11],
        "Gate 14, start: 05:50, end: 06:40, first bus: walkout, last bus: walkout, prm: —"
    );

    let info = &payload.rows[1];
    assert_eq!(info[0], "info");
    assert_eq!(info[11], "crew late");
    assert_eq!(remarks_row(Some("  ")), None);

    // an agent with nothing logged still gets a task row
    let idle = PushPayload::for_agent(flight, "agent-2", "");
    assert_eq!(
        idle.rows[0],
        operational_item_row("LS101", "agent-2", &idle.ops, "")
    );
    assert!(idle.rows[0][11].starts_with("Gate —, start: —"));
    Ok(())
}

#[test]
fn test_jet2_dates() {
    assert_eq!(to_jet2("2025-05-25").as_deref(), Some("25MAY25"));
    assert_eq!(to_jet2("2031-12-01").as_deref(), Some("01DEC31"));
    assert_eq!(from_jet2("01dec31").as_deref(), Some("2031-12-01"));
    assert_eq!(from_jet2("31FEB25"), None);
    assert_eq!(from_jet2("25MAY2025"), None);

    let date = chrono::NaiveDate::from_ymd_opt(2026, 1, 9).unwrap();
    assert_eq!(format_jet2(date), "09JAN26");
}
