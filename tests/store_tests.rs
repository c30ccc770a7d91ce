// Integration tests for the JSON-file flight store
//
// These verify persistence across reopen, tolerance of missing and corrupt
// files, and how voice intents land in agent logs and remarks.

use anyhow::Result;
use flightops::flights::{AgentOpsUpdate, FlightStore, NewAssignment, NewFlight, Role};
use flightops::voice::{parse_phrase, ClockTime, ParsedIntent};
use std::fs;
use tempfile::TempDir;

fn new_flight(number: &str, date: &str) -> NewFlight {
    NewFlight {
        number: number.to_string(),
        destination: "MAN".to_string(),
        sched_time: "06:30".parse().unwrap(),
        date: date.to_string(),
    }
}

#[tokio::test]
async fn test_missing_file_is_empty_store() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let store = FlightStore::open(temp_dir.path().join("flights.json")).await?;
    assert!(store.flights().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_flights_survive_reopen() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("data").join("flights.json");

    let id = {
        let mut store = FlightStore::open(&path).await?;
        let flight = store.add_flight(new_flight("LS123", "25MAY25")).await?;
        store
            .add_assignment(
                &flight.id,
                NewAssignment {
                    agent_id: "agent-7".to_string(),
                    role: Role::Gate,
                },
            )
            .await?;
        store
            .apply_intent(&flight.id, "agent-7", &parse_phrase("gate open 05:50"))
            .await?;
        flight.id
    };

    let store = FlightStore::open(&path).await?;
    let flight = store.get(&id).expect("flight persisted");
    assert_eq!(flight.number, "LS123");
    assert_eq!(flight.assignments.len(), 1);
    assert_eq!(flight.assignments[0].role, Role::Gate);
    assert_eq!(
        flight.agent_ops["agent-7"].gate_start,
        ClockTime::new(5, 50)
    );

    // document layout: flights under one well-known key, camelCase fields
    let doc: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path)?)?;
    let stored = &doc["flightops/flights"][0];
    assert_eq!(stored["schedTime"], "06:30");
    assert_eq!(stored["agentOps"]["agent-7"]["gateStart"], "05:50");
    assert_eq!(stored["assignments"][0]["agentId"], "agent-7");

    Ok(())
}

#[tokio::test]
async fn test_corrupt_file_is_replaced() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("flights.json");
    fs::write(&path, "{ not json")?;

    let mut store = FlightStore::open(&path).await?;
    assert!(store.flights().is_empty());

    store.add_flight(new_flight("LS456", "26MAY25")).await?;
    let reopened = FlightStore::open(&path).await?;
    assert_eq!(reopened.flights().len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_voice_intents_update_agent_log() -> Result<()> {
    let mut store = FlightStore::in_memory();
    let id = store.add_flight(new_flight("LS123", "25MAY25")).await?.id;

    for phrase in [
        "gate open 0550",
        "close the gate at 06:20",
        "first bus 06:05",
        "walk out to aircraft",
        "prm pickup six ten",
    ] {
        assert!(
            store
                .apply_intent(&id, "agent-7", &parse_phrase(phrase))
                .await?,
            "{phrase:?} not applied"
        );
    }
    assert!(!store
        .apply_intent(&id, "agent-7", &ParsedIntent::Unrecognized)
        .await?);

    let ops = &store.get(&id).unwrap().agent_ops["agent-7"];
    assert_eq!(ops.gate_start, ClockTime::new(5, 50));
    assert_eq!(ops.gate_end, ClockTime::new(6, 20));
    assert_eq!(ops.first_bus, ClockTime::new(6, 5));
    assert_eq!(ops.prm_pickup, ClockTime::new(6, 10));
    assert_eq!(ops.walkout, Some(true));
    assert_eq!(ops.updated_by, "agent-7");
    Ok(())
}

#[tokio::test]
async fn test_remarks_append() -> Result<()> {
    let mut store = FlightStore::in_memory();
    let id = store.add_flight(new_flight("LS123", "25MAY25")).await?.id;

    store
        .apply_intent(&id, "agent-7", &parse_phrase("remark Catering late"))
        .await?;
    store
        .apply_intent(&id, "agent-9", &parse_phrase("Remark, two WCHR at stand"))
        .await?;

    let remarks = store.get(&id).unwrap().remarks.clone().unwrap();
    assert_eq!(
        remarks.text.as_deref(),
        Some("Catering late\ntwo WCHR at stand")
    );
    Ok(())
}

#[tokio::test]
async fn test_pax_string_sets_counts() -> Result<()> {
    let mut store = FlightStore::in_memory();
    let id = store.add_flight(new_flight("LS123", "25MAY25")).await?.id;

    let update = |pax: &str| AgentOpsUpdate {
        pax_string: Some(pax.to_string()),
        ..Default::default()
    };

    let ops = store.update_agent_ops(&id, "agent-7", update("189 + 2")).await?;
    assert_eq!((ops.pax_boarded, ops.infants_boarded), (Some(189), Some(2)));

    let ops = store.update_agent_ops(&id, "agent-7", update("about 190")).await?;
    assert_eq!(ops.pax_string.as_deref(), Some("about 190"));
    assert_eq!((ops.pax_boarded, ops.infants_boarded), (None, None));
    Ok(())
}

#[tokio::test]
async fn test_unknown_flight_is_an_error() {
    let mut store = FlightStore::in_memory();
    let result = store
        .apply_intent("missing", "agent-7", &parse_phrase("gate open 0550"))
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_failed_write_leaves_store_unchanged() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let dir = temp_dir.path().join("data");

    let mut store = FlightStore::open(dir.join("flights.json")).await?;
    let id = store.add_flight(new_flight("LS123", "25MAY25")).await?.id;

    // a regular file where the store directory should be
    fs::remove_dir_all(&dir)?;
    fs::write(&dir, "")?;

    assert!(store.add_flight(new_flight("LS456", "25MAY25")).await.is_err());
    assert_eq!(store.flights().len(), 1);

    assert!(store
        .apply_intent(&id, "agent-7", &parse_phrase("gate open 05:50"))
        .await
        .is_err());
    assert!(store.get(&id).unwrap().agent_ops.is_empty());

    assert!(store.append_remark(&id, "catering late").await.is_err());
    assert_eq!(store.get(&id).unwrap().remarks, None);

    // once the directory is back, the next write carries only committed changes
    fs::remove_file(&dir)?;
    store.append_remark(&id, "crew late").await?;

    let reopened = FlightStore::open(dir.join("flights.json")).await?;
    assert_eq!(reopened.flights().len(), 1);
    assert!(reopened.get(&id).unwrap().agent_ops.is_empty());
    Ok(())
}
