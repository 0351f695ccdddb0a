use fleet_dispatch::adapters::inbound::InMemoryEventStore;
use fleet_dispatch::common::*;
use fleet_dispatch::config::{AssignmentStrategyKind, Config};
use fleet_dispatch::domains::fleet::*;
use std::time::Duration;

fn metadata() -> EventMetadata {
    EventMetadata {
        correlation_id: Some(uuid::Uuid::new_v4()),
        dispatch_cycle: None,
        source: "test".to_string(),
    }
}

fn envelope(event: &FleetEvent) -> EventEnvelope {
    EventEnvelope::new(event, "FleetState", metadata()).unwrap()
}

#[tokio::test]
async fn test_in_memory_event_store() {
    let event_store = InMemoryEventStore::new();
    let mut fleet = FleetState::new("store-fleet");
    fleet
        .register_location(Location::station("A", Position2D::new(0.0, 0.0)))
        .unwrap();
    fleet
        .register_vehicle(Vehicle::new("V1").at("A", Position2D::new(0.0, 0.0)))
        .unwrap();
    let envelopes: Vec<EventEnvelope> =
        fleet.take_uncommitted_events().iter().map(envelope).collect();

    event_store
        .append_events("store-fleet", 0, envelopes)
        .await
        .unwrap();

    let events = event_store.load_events("store-fleet", 0).await.unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].event_type, "LocationRegistered");
    assert_eq!(events[1].aggregate_id, "V1");
    assert_eq!(event_store.load_events("store-fleet", 1).await.unwrap().len(), 1);
    assert!(event_store.load_events("other", 0).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_event_store_rejects_stale_writer() {
    let event_store = InMemoryEventStore::new();
    let event = FleetEvent::SequenceCompleted {
        sequence_id: "S1".to_string(),
        timestamp: chrono::Utc::now(),
    };
    event_store
        .append_events("store-fleet", 0, vec![envelope(&event)])
        .await
        .unwrap();

    let result = event_store
        .append_events("store-fleet", 0, vec![envelope(&event)])
        .await;

    assert!(result.is_err());
    assert_eq!(event_store.stream_len("store-fleet").await, 1);
}

#[tokio::test]
async fn test_load_events_by_type_across_streams() {
    let event_store = InMemoryEventStore::new();
    let before = chrono::Utc::now();
    for (stream, order_id) in [("fleet-a", "O1"), ("fleet-b", "O2")] {
        let events = [
            FleetEvent::OrderDispatchable {
                order_id: order_id.to_string(),
                timestamp: chrono::Utc::now(),
            },
            FleetEvent::OrderFinished {
                order_id: order_id.to_string(),
                timestamp: chrono::Utc::now(),
            },
        ];
        event_store
            .append_events(stream, 0, events.iter().map(envelope).collect())
            .await
            .unwrap();
    }

    let finished = event_store
        .load_events_by_type("OrderFinished", Some(before))
        .await
        .unwrap();
    assert_eq!(finished.len(), 2);
    assert!(finished.windows(2).all(|w| w[0].occurred_at <= w[1].occurred_at));

    let later = chrono::Utc::now() + chrono::Duration::seconds(60);
    let none = event_store
        .load_events_by_type("OrderFinished", Some(later))
        .await
        .unwrap();
    assert!(none.is_empty());
}

#[test]
fn test_fleet_event_serialization() {
    let event = FleetEvent::OrderAssigned {
        order_id: "O1".to_string(),
        vehicle_id: "V1".to_string(),
        resources: vec!["A".to_string(), "A --- B".to_string()],
        timestamp: chrono::Utc::now(),
    };

    let envelope = envelope(&event);
    assert_eq!(envelope.event_type, "OrderAssigned");
    assert_eq!(envelope.aggregate_id, "O1");
    let restored: FleetEvent = serde_json::from_value(envelope.event_data).unwrap();
    assert_eq!(restored.event_type(), "OrderAssigned");
}

#[tokio::test]
async fn test_config_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fleet.toml");
    std::fs::write(
        &path,
        r#"
[dispatcher]
assignment_strategy = "order_age"
park_idle_vehicles = false

[executor]
fleet_id = "hall-3"
dispatch_interval_ms = 0
"#,
    )
    .unwrap();

    let config = Config::from_file(&path).await.unwrap();

    assert_eq!(config.dispatcher.assignment_strategy, AssignmentStrategyKind::OrderAge);
    assert!(!config.dispatcher.park_idle_vehicles);
    // Unset keys keep their defaults.
    assert!(config.dispatcher.recharge_idle_vehicles);
    assert_eq!(config.executor.fleet_id, "hall-3");
    assert_eq!(config.executor.dispatch_interval(), None);
}

#[test]
fn test_config_layers_defaults_file_and_environment() {
    let missing = Config::load("/nonexistent/fleet.toml").unwrap();
    assert_eq!(missing.executor.fleet_id, "fleet");
    assert_eq!(missing.executor.dispatch_interval(), Some(Duration::from_millis(5000)));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fleet.toml");
    std::fs::write(
        &path,
        "[dispatcher]\nenergy_critical_threshold = 15\nenergy_recharge_threshold = 40\n",
    )
    .unwrap();

    std::env::set_var("FLEET__DISPATCHER__ENERGY_CRITICAL_THRESHOLD", "5");
    let config = Config::load(&path);
    std::env::remove_var("FLEET__DISPATCHER__ENERGY_CRITICAL_THRESHOLD");
    let config = config.unwrap();

    assert_eq!(config.dispatcher.energy_critical_threshold, 5);
    assert_eq!(config.dispatcher.energy_recharge_threshold, 40);
    assert!(config.dispatcher.park_idle_vehicles);
}
