#![allow(dead_code)]

use fleet_dispatch::adapters::outbound::RecordingCommandSink;
use fleet_dispatch::config::DispatcherConfig;
use fleet_dispatch::domains::dispatching::{DispatchContext, DispatchPipeline, Phase};
use fleet_dispatch::domains::fleet::*;

/// Stations A, B, C on a line, parking P1 (priority 1) and P2 (no priority),
/// charger CH.
pub fn plant() -> FleetState {
    let mut fleet = FleetState::new("test-fleet");
    for location in [
        Location::station("A", Position2D::new(0.0, 0.0)),
        Location::station("B", Position2D::new(10.0, 0.0)),
        Location::station("C", Position2D::new(20.0, 0.0)),
        Location::parking("P1", Position2D::new(0.0, 10.0), Some(1)),
        Location::parking("P2", Position2D::new(20.0, 10.0), None),
        Location::charging("CH", Position2D::new(10.0, -10.0)),
    ] {
        fleet.register_location(location).unwrap();
    }
    fleet
}

pub fn vehicle_at(id: &str, fleet: &FleetState, location: &str) -> Vehicle {
    let position = fleet.location(location).unwrap().position;
    Vehicle::new(id).at(location, position)
}

pub fn order(id: &str, destinations: &[&str]) -> TransportOrder {
    TransportOrder::new(
        id,
        destinations
            .iter()
            .map(|d| DriveStep::new(*d, "NOP"))
            .collect(),
    )
}

/// Parking and recharging off, so assignment tests only see assignment.
pub fn assignment_only_config() -> DispatcherConfig {
    DispatcherConfig {
        park_idle_vehicles: false,
        recharge_idle_vehicles: false,
        ..DispatcherConfig::default()
    }
}

pub fn started_pipeline(config: &DispatcherConfig) -> DispatchPipeline {
    let mut pipeline = DispatchPipeline::new(config);
    pipeline.initialize();
    pipeline
}

pub fn run_phase(phase: &mut dyn Phase, fleet: &mut FleetState, sink: &mut RecordingCommandSink) {
    let mut ctx = DispatchContext::new(fleet, sink);
    phase.run(&mut ctx);
}

/// Vehicle reports that it finished the step it was driving.
pub fn report_arrival(fleet: &mut FleetState, vehicle_id: &str) {
    let target = fleet.vehicle(vehicle_id).unwrap().target_location.clone().unwrap();
    fleet
        .update_vehicle(
            VehicleUpdate::new(vehicle_id)
                .state(ProcState::AwaitingOrder)
                .arrived_at(target, None),
        )
        .unwrap();
}
