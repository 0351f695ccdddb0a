use crate::config::DispatcherConfig;
use crate::domains::dispatching::phase::{phase_lifecycle, DispatchContext, Lifecycle, Phase};
use crate::domains::fleet::{DispatchCommand, FleetState, Location, OrderState, Vehicle};
use ordered_float::OrderedFloat;
use std::collections::BTreeSet;

fn distance(vehicle: &Vehicle, location: &Location) -> OrderedFloat<f64> {
    OrderedFloat(
        vehicle
            .position
            .map_or(f64::INFINITY, |p| p.distance_to(&location.position)),
    )
}

/// Idle, unbound vehicles in id order.
fn idle_vehicle_ids(fleet: &FleetState) -> Vec<String> {
    fleet.vehicle_ids_where(Vehicle::is_idle_and_unbound)
}

/// Resources that DISPATCHABLE orders are waiting for.
fn contested_resources(fleet: &FleetState) -> BTreeSet<String> {
    fleet
        .orders()
        .filter(|o| o.state == OrderState::Dispatchable)
        .flat_map(|o| o.required_resources())
        .collect()
}

/// Nearest parking spot the vehicle may claim; ties by priority, then name.
fn nearest_free_parking<'a>(
    fleet: &'a FleetState,
    vehicle: &Vehicle,
    accept: impl Fn(&Location) -> bool,
) -> Option<&'a Location> {
    fleet
        .locations()
        .filter(|l| l.is_parking() && fleet.claims().is_free_for(&l.name, &vehicle.id))
        .filter(|l| vehicle.effective_location() != Some(l.name.as_str()))
        .filter(|l| accept(l))
        .min_by_key(|l| (distance(vehicle, l), l.parking_rank(), l.name.clone()))
}

fn park(ctx: &mut DispatchContext<'_>, vehicle_id: &str, location: &str, why: &str) {
    match ctx.fleet.send_to_park(vehicle_id, location) {
        Ok(()) => {
            ctx.commands.emit(DispatchCommand::Park {
                vehicle_id: vehicle_id.to_string(),
                location: location.to_string(),
            });
            tracing::info!("Sending vehicle {} to parking {} ({})", vehicle_id, location, why);
        }
        Err(e) => tracing::warn!("Could not park vehicle {} at {}: {}", vehicle_id, location, e),
    }
}

/// Sends idle vehicles with low energy to the nearest free charging location.
#[derive(Debug)]
pub struct RechargeIdleVehiclesPhase {
    lifecycle: Lifecycle,
    enabled: bool,
    energy_recharge_threshold: u8,
}

impl RechargeIdleVehiclesPhase {
    pub fn new(config: &DispatcherConfig) -> Self {
        Self {
            lifecycle: Lifecycle::default(),
            enabled: config.recharge_idle_vehicles,
            energy_recharge_threshold: config.energy_recharge_threshold,
        }
    }
}

impl Phase for RechargeIdleVehiclesPhase {
    phase_lifecycle!("recharge_idle_vehicles");

    fn run(&mut self, ctx: &mut DispatchContext<'_>) {
        if !self.lifecycle.ensure_runnable(self.name()) || !self.enabled {
            return;
        }
        for vehicle_id in idle_vehicle_ids(ctx.fleet) {
            let target = {
                let fleet = &*ctx.fleet;
                let Some(vehicle) = fleet.vehicle(&vehicle_id) else { continue };
                if vehicle.energy_level >= self.energy_recharge_threshold {
                    continue;
                }
                fleet
                    .locations()
                    .filter(|l| l.is_charging() && fleet.claims().is_free_for(&l.name, &vehicle.id))
                    .min_by_key(|l| (distance(vehicle, l), l.name.clone()))
                    .map(|l| l.name.clone())
            };
            let Some(location) = target else {
                tracing::debug!("No free charging location for vehicle {}", vehicle_id);
                continue;
            };
            match ctx.fleet.send_to_recharge(&vehicle_id, &location) {
                Ok(()) => {
                    ctx.commands.emit(DispatchCommand::Recharge {
                        vehicle_id: vehicle_id.clone(),
                        location: location.clone(),
                    });
                    tracing::info!("Sending vehicle {} to recharge at {}", vehicle_id, location);
                }
                Err(e) => tracing::warn!("Could not recharge vehicle {}: {}", vehicle_id, e),
            }
        }
    }
}

/// Moves parked vehicles off spots that pending orders need and, when
/// enabled, onto free spots of strictly higher priority.
#[derive(Debug)]
pub struct PrioritizedReparkPhase {
    lifecycle: Lifecycle,
    enabled: bool,
    contested_positions: bool,
    higher_priority_positions: bool,
}

impl PrioritizedReparkPhase {
    pub fn new(config: &DispatcherConfig) -> Self {
        Self {
            lifecycle: Lifecycle::default(),
            enabled: config.park_idle_vehicles,
            contested_positions: config.repark_contested_positions,
            higher_priority_positions: config.repark_to_higher_priority_positions,
        }
    }
}

impl Phase for PrioritizedReparkPhase {
    phase_lifecycle!("prioritized_repark");

    fn run(&mut self, ctx: &mut DispatchContext<'_>) {
        if !self.lifecycle.ensure_runnable(self.name()) || !self.enabled {
            return;
        }
        let contested = contested_resources(ctx.fleet);
        for vehicle_id in idle_vehicle_ids(ctx.fleet) {
            let decision = {
                let fleet = &*ctx.fleet;
                let Some(vehicle) = fleet.vehicle(&vehicle_id) else { continue };
                let Some(spot) = fleet.parking_spot_of(vehicle) else { continue };
                let uncontested = |l: &Location| !contested.contains(&l.name);
                if self.contested_positions && contested.contains(&spot.name) {
                    nearest_free_parking(fleet, vehicle, uncontested)
                        .map(|l| (l.name.clone(), "spot needed by an order"))
                } else if self.higher_priority_positions {
                    let rank = spot.parking_rank();
                    fleet
                        .locations()
                        .filter(|l| l.is_parking() && l.parking_rank() < rank)
                        .filter(|l| fleet.claims().is_free_for(&l.name, &vehicle.id))
                        .filter(|l| uncontested(l))
                        .min_by_key(|l| (l.parking_rank(), distance(vehicle, l), l.name.clone()))
                        .map(|l| (l.name.clone(), "higher priority spot"))
                } else {
                    None
                }
            };
            if let Some((location, why)) = decision {
                park(ctx, &vehicle_id, &location, why);
            }
        }
    }
}

/// Sends unparked vehicles to their own priority parking spot if it is free.
#[derive(Debug)]
pub struct PrioritizedParkingPhase {
    lifecycle: Lifecycle,
    enabled: bool,
}

impl PrioritizedParkingPhase {
    pub fn new(config: &DispatcherConfig) -> Self {
        Self {
            lifecycle: Lifecycle::default(),
            enabled: config.park_idle_vehicles && config.prioritized_parking,
        }
    }
}

impl Phase for PrioritizedParkingPhase {
    phase_lifecycle!("prioritized_parking");

    fn run(&mut self, ctx: &mut DispatchContext<'_>) {
        if !self.lifecycle.ensure_runnable(self.name()) || !self.enabled {
            return;
        }
        for vehicle_id in idle_vehicle_ids(ctx.fleet) {
            let target = {
                let fleet = &*ctx.fleet;
                let Some(vehicle) = fleet.vehicle(&vehicle_id) else { continue };
                if fleet.parking_spot_of(vehicle).is_some() {
                    continue;
                }
                vehicle
                    .priority_parking_target
                    .as_deref()
                    .and_then(|name| fleet.location(name))
                    .filter(|l| l.is_parking() && fleet.claims().is_free_for(&l.name, &vehicle.id))
                    .map(|l| l.name.clone())
            };
            if let Some(location) = target {
                park(ctx, &vehicle_id, &location, "priority parking target");
            }
        }
    }
}

/// Sends remaining unparked idle vehicles to the nearest free parking spot.
#[derive(Debug)]
pub struct ParkIdleVehiclesPhase {
    lifecycle: Lifecycle,
    enabled: bool,
}

impl ParkIdleVehiclesPhase {
    pub fn new(config: &DispatcherConfig) -> Self {
        Self {
            lifecycle: Lifecycle::default(),
            enabled: config.park_idle_vehicles,
        }
    }
}

impl Phase for ParkIdleVehiclesPhase {
    phase_lifecycle!("park_idle_vehicles");

    fn run(&mut self, ctx: &mut DispatchContext<'_>) {
        if !self.lifecycle.ensure_runnable(self.name()) || !self.enabled {
            return;
        }
        for vehicle_id in idle_vehicle_ids(ctx.fleet) {
            let target = {
                let fleet = &*ctx.fleet;
                let Some(vehicle) = fleet.vehicle(&vehicle_id) else { continue };
                if fleet.parking_spot_of(vehicle).is_some() {
                    continue;
                }
                nearest_free_parking(fleet, vehicle, |_| true).map(|l| l.name.clone())
            };
            match target {
                Some(location) => park(ctx, &vehicle_id, &location, "idle"),
                None => tracing::debug!("No free parking spot for vehicle {}", vehicle_id),
            }
        }
    }
}
