// Read model kept next to the fleet state by the executor.
use super::aggregate::OrderState;
use super::events::FleetEvent;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DispatchOverview {
    pub fleet_id: String,
    pub vehicles: usize,
    order_states: BTreeMap<String, OrderState>,
    /// order id -> vehicle id for orders currently bound.
    pub assignments: BTreeMap<String, String>,
    pub drive_commands: usize,
    pub park_commands: usize,
    pub recharge_commands: usize,
    pub peripheral_jobs_triggered: usize,
    pub dispatch_cycles: u64,
}

impl DispatchOverview {
    pub fn new(fleet_id: impl Into<String>) -> Self {
        Self {
            fleet_id: fleet_id.into(),
            ..Default::default()
        }
    }

    pub fn apply_event(&mut self, event: &FleetEvent) {
        match event {
            FleetEvent::VehicleRegistered { .. } => self.vehicles += 1,
            FleetEvent::OrderCreated { order, .. } => {
                self.order_states.insert(order.id.clone(), OrderState::Raw);
            }
            FleetEvent::OrderDispatchable { order_id, .. } => {
                self.order_states.insert(order_id.clone(), OrderState::Dispatchable);
            }
            FleetEvent::OrderAssigned { order_id, vehicle_id, .. } => {
                self.order_states.insert(order_id.clone(), OrderState::BeingProcessed);
                self.assignments.insert(order_id.clone(), vehicle_id.clone());
            }
            FleetEvent::OrderWithdrawalRequested { order_id, .. } => {
                self.order_states.insert(order_id.clone(), OrderState::Withdrawn);
            }
            FleetEvent::OrderFinished { order_id, .. } => {
                self.order_states.insert(order_id.clone(), OrderState::Finished);
                self.assignments.remove(order_id);
            }
            FleetEvent::OrderFailed { order_id, reason, .. } => {
                self.order_states.insert(order_id.clone(), OrderState::Failed(reason.clone()));
                self.assignments.remove(order_id);
            }
            FleetEvent::DriveStepIssued { .. } => self.drive_commands += 1,
            FleetEvent::PeripheralJobTriggered { .. } => self.peripheral_jobs_triggered += 1,
            FleetEvent::VehicleSentToPark { .. } => self.park_commands += 1,
            FleetEvent::VehicleSentToRecharge { .. } => self.recharge_commands += 1,
            _ => {}
        }
    }

    pub fn record_cycle(&mut self) {
        self.dispatch_cycles += 1;
    }

    pub fn order_state(&self, order_id: &str) -> Option<&OrderState> {
        self.order_states.get(order_id)
    }

    pub fn count_orders(&self, predicate: impl Fn(&OrderState) -> bool) -> usize {
        self.order_states.values().filter(|state| predicate(state)).count()
    }

    pub fn orders_in_process(&self) -> usize {
        self.count_orders(|s| *s == OrderState::BeingProcessed)
    }

    pub fn finished_orders(&self) -> usize {
        self.count_orders(|s| *s == OrderState::Finished)
    }

    pub fn failed_orders(&self) -> usize {
        self.count_orders(|s| matches!(s, OrderState::Failed(_)))
    }
}
