mod common;

use common::*;
use fleet_dispatch::adapters::outbound::RecordingCommandSink;
use fleet_dispatch::config::DispatcherConfig;
use fleet_dispatch::domains::fleet::*;

fn park(vehicle: &str, location: &str) -> DispatchCommand {
    DispatchCommand::Park {
        vehicle_id: vehicle.to_string(),
        location: location.to_string(),
    }
}

fn run_once(fleet: &mut FleetState, config: &DispatcherConfig) -> Vec<DispatchCommand> {
    let mut pipeline = started_pipeline(config);
    let mut sink = RecordingCommandSink::new();
    run_phase(&mut pipeline, fleet, &mut sink);
    sink.commands()
}

#[test]
fn test_low_energy_vehicle_is_sent_to_charger() {
    let mut fleet = plant();
    fleet
        .register_vehicle(vehicle_at("V1", &fleet, "A").with_energy(20))
        .unwrap();

    let commands = run_once(&mut fleet, &DispatcherConfig::default());

    assert_eq!(
        commands,
        vec![DispatchCommand::Recharge {
            vehicle_id: "V1".to_string(),
            location: "CH".to_string(),
        }]
    );
    let v1 = fleet.vehicle("V1").unwrap();
    assert_eq!(v1.state, ProcState::Charging);
    assert_eq!(v1.target_location.as_deref(), Some("CH"));
    assert_eq!(fleet.claims().holder("CH"), Some("V1"));
}

#[test]
fn test_critical_vehicle_recharges_instead_of_working() {
    let mut fleet = plant();
    fleet
        .register_vehicle(vehicle_at("V1", &fleet, "A").with_energy(5))
        .unwrap();
    fleet.create_order(order("O1", &["B"])).unwrap();

    let commands = run_once(&mut fleet, &DispatcherConfig::default());

    assert_eq!(fleet.order("O1").unwrap().state, OrderState::Dispatchable);
    assert!(matches!(commands.as_slice(), [DispatchCommand::Recharge { .. }]));
}

#[test]
fn test_occupied_charger_is_not_shared() {
    let mut fleet = plant();
    fleet
        .register_vehicle(vehicle_at("V1", &fleet, "A").with_energy(20))
        .unwrap();
    fleet
        .register_vehicle(vehicle_at("V2", &fleet, "C").with_energy(20))
        .unwrap();
    let config = DispatcherConfig {
        park_idle_vehicles: false,
        ..DispatcherConfig::default()
    };

    let commands = run_once(&mut fleet, &config);

    assert_eq!(commands.len(), 1);
    let charging = fleet.vehicle_ids_where(|v| v.state == ProcState::Charging);
    assert_eq!(charging.len(), 1);
}

#[test]
fn test_idle_vehicle_parks_at_nearest_spot_once() {
    let mut fleet = plant();
    fleet.register_vehicle(vehicle_at("V1", &fleet, "A")).unwrap();
    let config = DispatcherConfig::default();
    let mut pipeline = started_pipeline(&config);
    let mut sink = RecordingCommandSink::new();

    run_phase(&mut pipeline, &mut fleet, &mut sink);
    run_phase(&mut pipeline, &mut fleet, &mut sink);

    assert_eq!(sink.commands(), vec![park("V1", "P1")]);
    assert_eq!(fleet.claims().holder("P1"), Some("V1"));
    assert_eq!(fleet.vehicle("V1").unwrap().state, ProcState::Idle);
}

#[test]
fn test_priority_parking_target_wins_over_distance() {
    let mut fleet = plant();
    fleet
        .register_vehicle(vehicle_at("V1", &fleet, "C").with_priority_parking_target("P1"))
        .unwrap();

    let commands = run_once(&mut fleet, &DispatcherConfig::default());

    assert_eq!(commands, vec![park("V1", "P1")]);
}

#[test]
fn test_vehicle_on_contested_spot_is_reparked() {
    let mut fleet = plant();
    fleet
        .register_vehicle(vehicle_at("V1", &fleet, "P1").with_allowed_order_types(["Special"]))
        .unwrap();
    fleet.create_order(order("O1", &["P1"])).unwrap();

    let commands = run_once(&mut fleet, &DispatcherConfig::default());

    assert_eq!(commands, vec![park("V1", "P2")]);
    assert_eq!(fleet.claims().holder("P2"), Some("V1"));
    assert_eq!(fleet.claims().holder("P1"), None);
    assert_eq!(fleet.order("O1").unwrap().state, OrderState::Dispatchable);
}

#[test]
fn test_repark_to_higher_priority_spot_is_optional() {
    let mut fleet = plant();
    fleet.register_vehicle(vehicle_at("V1", &fleet, "P2")).unwrap();
    let mut without = fleet.clone();

    let enabled = DispatcherConfig {
        repark_to_higher_priority_positions: true,
        ..DispatcherConfig::default()
    };
    assert_eq!(run_once(&mut fleet, &enabled), vec![park("V1", "P1")]);
    assert!(run_once(&mut without, &DispatcherConfig::default()).is_empty());
}

#[test]
fn test_parking_can_be_disabled() {
    let mut fleet = plant();
    fleet.register_vehicle(vehicle_at("V1", &fleet, "A")).unwrap();
    let config = DispatcherConfig {
        park_idle_vehicles: false,
        ..DispatcherConfig::default()
    };

    assert!(run_once(&mut fleet, &config).is_empty());
    assert!(fleet.claims().is_empty());
}

#[test]
fn test_parked_vehicle_leaves_spot_for_an_order() {
    let mut fleet = plant();
    fleet.register_vehicle(vehicle_at("V1", &fleet, "P1")).unwrap();
    fleet.create_order(order("O1", &["B"])).unwrap();

    let commands = run_once(&mut fleet, &DispatcherConfig::default());

    assert!(matches!(commands.as_slice(), [DispatchCommand::Drive { .. }]));
    assert_eq!(fleet.claims().holder("P1"), None);
    assert_eq!(fleet.claims().holder("B"), Some("V1"));
}
