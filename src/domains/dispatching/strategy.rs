use crate::config::AssignmentStrategyKind;
use crate::domains::fleet::{FleetState, TransportOrder, Vehicle};

/// Cost model for the free assignment phase. Lower cost wins; `None` rules
/// the pair out.
pub trait AssignmentStrategy: Send + Sync {
    fn name(&self) -> &'static str;
    fn cost(&self, fleet: &FleetState, order: &TransportOrder, vehicle: &Vehicle) -> Option<f64>;
}

/// Euclidean distance from the vehicle to the order's first destination.
/// Vehicles without a known position sort last.
#[derive(Debug, Default, Clone, Copy)]
pub struct NearestVehicle;

impl AssignmentStrategy for NearestVehicle {
    fn name(&self) -> &'static str {
        "nearest_vehicle"
    }

    fn cost(&self, fleet: &FleetState, order: &TransportOrder, vehicle: &Vehicle) -> Option<f64> {
        let destination = fleet.location(order.first_destination()?)?;
        Some(
            vehicle
                .position
                .map_or(f64::INFINITY, |p| p.distance_to(&destination.position)),
        )
    }
}

/// First come, first served: every pair costs the same, so order age decides.
#[derive(Debug, Default, Clone, Copy)]
pub struct OrderAge;

impl AssignmentStrategy for OrderAge {
    fn name(&self) -> &'static str {
        "order_age"
    }

    fn cost(
        &self,
        _fleet: &FleetState,
        _order: &TransportOrder,
        _vehicle: &Vehicle,
    ) -> Option<f64> {
        Some(0.0)
    }
}

pub fn strategy_for(kind: AssignmentStrategyKind) -> Box<dyn AssignmentStrategy> {
    match kind {
        AssignmentStrategyKind::NearestVehicle => Box::new(NearestVehicle),
        AssignmentStrategyKind::OrderAge => Box::new(OrderAge),
    }
}
