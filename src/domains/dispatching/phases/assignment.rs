use crate::config::DispatcherConfig;
use crate::domains::dispatching::phase::{phase_lifecycle, DispatchContext, Lifecycle, Phase};
use crate::domains::dispatching::phases::continuation::advance_order;
use crate::domains::dispatching::strategy::AssignmentStrategy;
use crate::domains::fleet::{FleetState, OrderState, TransportOrder, Vehicle};
use chrono::{DateTime, Utc};
use ordered_float::OrderedFloat;
use std::collections::HashSet;

/// Whether `vehicle` may take `order` right now.
pub fn is_eligible(
    fleet: &FleetState,
    order: &TransportOrder,
    vehicle: &Vehicle,
    energy_critical_threshold: u8,
) -> bool {
    vehicle.is_idle_and_unbound()
        && vehicle.energy_level > energy_critical_threshold
        && vehicle.accepts_order_type(&order.order_type)
        && fleet.sequence_open_for_assignment(order)
        && fleet
            .claims()
            .can_claim_all(&order.required_resources(), &vehicle.id)
}

/// DISPATCHABLE orders, oldest first.
fn dispatchable_orders(fleet: &FleetState) -> Vec<&TransportOrder> {
    let mut orders: Vec<&TransportOrder> = fleet
        .orders()
        .filter(|o| o.state == OrderState::Dispatchable)
        .collect();
    orders.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
    orders
}

fn commit(ctx: &mut DispatchContext<'_>, order_id: &str, vehicle_id: &str) {
    let result = ctx
        .fleet
        .assign_order(order_id, vehicle_id)
        .and_then(|()| advance_order(ctx, order_id));
    match result {
        Ok(advance) => tracing::info!(
            "Assigned order {} to vehicle {} ({:?})",
            order_id,
            vehicle_id,
            advance
        ),
        Err(e) => tracing::warn!("Assignment of {} to {} failed: {}", order_id, vehicle_id, e),
    }
}

/// Assigns orders that name their vehicle, directly or through their sequence.
#[derive(Debug)]
pub struct AssignReservedOrdersPhase {
    lifecycle: Lifecycle,
    energy_critical_threshold: u8,
}

impl AssignReservedOrdersPhase {
    pub fn new(config: &DispatcherConfig) -> Self {
        Self {
            lifecycle: Lifecycle::default(),
            energy_critical_threshold: config.energy_critical_threshold,
        }
    }
}

impl Phase for AssignReservedOrdersPhase {
    phase_lifecycle!("assign_reserved_orders");

    fn run(&mut self, ctx: &mut DispatchContext<'_>) {
        if !self.lifecycle.ensure_runnable(self.name()) {
            return;
        }
        let fleet = &*ctx.fleet;
        let reserved: Vec<(String, String)> = dispatchable_orders(fleet)
            .into_iter()
            .filter_map(|o| fleet.intended_vehicle_of(o).map(|v| (o.id.clone(), v)))
            .collect();
        for (order_id, vehicle_id) in reserved {
            let eligible = match (ctx.fleet.order(&order_id), ctx.fleet.vehicle(&vehicle_id)) {
                (Some(order), Some(vehicle)) => is_eligible(
                    ctx.fleet,
                    order,
                    vehicle,
                    self.energy_critical_threshold,
                ),
                _ => false,
            };
            if eligible {
                commit(ctx, &order_id, &vehicle_id);
            } else {
                tracing::debug!("Reserved order {} waits for vehicle {}", order_id, vehicle_id);
            }
        }
    }
}

/// Candidate key: cost, then order age, order id and vehicle id.
type Candidate = (OrderedFloat<f64>, DateTime<Utc>, String, String);

/// Assigns unconstrained orders to idle vehicles using the configured
/// [`AssignmentStrategy`]. Pairs are committed cheapest first; a pair whose
/// resources were claimed in the meantime is skipped.
pub struct AssignFreeOrdersPhase {
    lifecycle: Lifecycle,
    energy_critical_threshold: u8,
    strategy: Box<dyn AssignmentStrategy>,
}

impl AssignFreeOrdersPhase {
    pub fn new(config: &DispatcherConfig, strategy: Box<dyn AssignmentStrategy>) -> Self {
        Self {
            lifecycle: Lifecycle::default(),
            energy_critical_threshold: config.energy_critical_threshold,
            strategy,
        }
    }

    fn candidates(&self, fleet: &FleetState) -> Vec<Candidate> {
        let orders: Vec<&TransportOrder> = dispatchable_orders(fleet)
            .into_iter()
            .filter(|o| fleet.intended_vehicle_of(o).is_none())
            .collect();
        let vehicles: Vec<&Vehicle> =
            fleet.vehicles().filter(|v| v.is_idle_and_unbound()).collect();

        let mut candidates = Vec::new();
        for order in &orders {
            for vehicle in &vehicles {
                if !is_eligible(fleet, order, vehicle, self.energy_critical_threshold) {
                    continue;
                }
                if let Some(cost) = self.strategy.cost(fleet, order, vehicle) {
                    candidates.push((
                        OrderedFloat(cost),
                        order.created_at,
                        order.id.clone(),
                        vehicle.id.clone(),
                    ));
                }
            }
        }
        candidates.sort();
        candidates
    }
}

impl Phase for AssignFreeOrdersPhase {
    phase_lifecycle!("assign_free_orders");

    fn run(&mut self, ctx: &mut DispatchContext<'_>) {
        if !self.lifecycle.ensure_runnable(self.name()) {
            return;
        }
        let candidates = self.candidates(ctx.fleet);
        tracing::trace!(
            "{} candidate pairs ranked by {}",
            candidates.len(),
            self.strategy.name()
        );
        let mut used_orders: HashSet<String> = HashSet::new();
        let mut used_vehicles: HashSet<String> = HashSet::new();
        for (_, _, order_id, vehicle_id) in candidates {
            if used_orders.contains(&order_id) || used_vehicles.contains(&vehicle_id) {
                continue;
            }
            // Claims made earlier in this pass may collide with this pair.
            let still_free = ctx.fleet.order(&order_id).is_some_and(|o| {
                ctx.fleet
                    .claims()
                    .can_claim_all(&o.required_resources(), &vehicle_id)
            });
            if !still_free {
                tracing::debug!("Skipping {} -> {}: resources taken", order_id, vehicle_id);
                continue;
            }
            commit(ctx, &order_id, &vehicle_id);
            used_orders.insert(order_id);
            used_vehicles.insert(vehicle_id);
        }
    }
}
