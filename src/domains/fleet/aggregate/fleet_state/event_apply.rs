use super::FleetState;
use crate::common::{AggregateRoot, DomainError, DomainResult};
use crate::domains::fleet::aggregate::{
    OrderSequence, OrderState, PeripheralJob, PeripheralJobState, ProcState, TransportOrder,
    Vehicle,
};
use crate::domains::fleet::events::FleetEvent;

impl AggregateRoot for FleetState {
    type Event = FleetEvent;

    fn aggregate_id(&self) -> &str {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }

    fn apply(&mut self, event: &Self::Event) -> DomainResult<()> {
        match event {
            FleetEvent::LocationRegistered { location, .. } => {
                self.locations.insert(location.name.clone(), location.clone());
            }
            FleetEvent::VehicleRegistered { vehicle, .. } => {
                // A vehicle registered on a parking or charging spot holds it.
                if let Some(name) = &vehicle.current_location {
                    let occupies = self
                        .locations
                        .get(name)
                        .is_some_and(|l| l.is_parking() || l.is_charging());
                    if occupies && self.claims.holder(name).is_none() {
                        self.claims.claim_all([name], &vehicle.id);
                    }
                }
                self.vehicles.insert(vehicle.id.clone(), vehicle.clone());
            }
            FleetEvent::SequenceCreated { sequence, .. } => {
                self.sequences.insert(sequence.id.clone(), sequence.clone());
            }
            FleetEvent::SequenceCompleted { sequence_id, .. } => {
                self.sequence_mut(sequence_id)?.complete = true;
            }
            FleetEvent::OrderCreated { order, .. } => {
                if let Some(sequence_id) = &order.sequence {
                    self.sequence_mut(sequence_id)?.orders.push(order.id.clone());
                }
                self.orders.insert(order.id.clone(), order.clone());
            }
            FleetEvent::PeripheralJobRegistered { job, .. } => {
                self.peripheral_jobs.insert(job.id.clone(), job.clone());
            }
            FleetEvent::VehicleUpdated { update, .. } => {
                let reported_spot = update
                    .current_location
                    .as_deref()
                    .and_then(|name| self.locations.get(name))
                    .map(|l| l.position);
                let vehicle = self.vehicle_mut(&update.vehicle_id)?;
                if let Some(state) = update.state {
                    vehicle.state = state;
                }
                if let Some(level) = update.energy_level {
                    vehicle.energy_level = level;
                }
                if let Some(position) = update.position.or(reported_spot) {
                    vehicle.position = Some(position);
                }
                if let Some(location) = &update.current_location {
                    if vehicle.target_location.as_ref() == Some(location) {
                        vehicle.target_location = None;
                    }
                    vehicle.current_location = Some(location.clone());
                }
            }
            FleetEvent::OrderDispatchable { order_id, .. } => {
                self.order_mut(order_id)?.state = OrderState::Dispatchable;
            }
            FleetEvent::OrderAssigned { order_id, vehicle_id, resources, .. } => {
                self.order_mut(order_id)?;
                if let Some((resource, holder)) =
                    self.claims.first_conflict(resources, vehicle_id)
                {
                    return Err(DomainError::ResourceConflict { resource, holder });
                }
                let sequence_id = self.orders.get(order_id).and_then(|o| o.sequence.clone());
                let vehicle = self.vehicle_mut(vehicle_id)?;
                vehicle.order = Some(order_id.clone());
                vehicle.state = ProcState::AwaitingOrder;
                vehicle.target_location = None;
                if sequence_id.is_some() {
                    vehicle.sequence = sequence_id.clone();
                }

                self.claims.release_all(vehicle_id);
                self.claims.claim_all(resources, vehicle_id);
                if let Some(sequence) = sequence_id.and_then(|id| self.sequences.get_mut(&id)) {
                    sequence.vehicle = Some(vehicle_id.clone());
                }
                let order = self.order_mut(order_id)?;
                order.state = OrderState::BeingProcessed;
                order.vehicle = Some(vehicle_id.clone());
            }
            FleetEvent::DriveStepIssued { order_id, vehicle_id, step_index, destination, .. } => {
                self.order_mut(order_id)?.next_step = step_index + 1;
                let vehicle = self.vehicle_mut(vehicle_id)?;
                vehicle.state = ProcState::Executing;
                vehicle.target_location = Some(destination.clone());
            }
            FleetEvent::PeripheralJobTriggered { job_id, .. } => {
                self.job_mut(job_id)?.state = PeripheralJobState::Executing;
            }
            FleetEvent::OrderWithdrawalRequested { order_id, .. } => {
                self.order_mut(order_id)?.state = OrderState::Withdrawn;
            }
            FleetEvent::OrderFinished { order_id, .. } => {
                self.order_mut(order_id)?.state = OrderState::Finished;
            }
            FleetEvent::OrderFailed { order_id, reason, .. } => {
                self.order_mut(order_id)?.state = OrderState::Failed(reason.clone());
            }
            FleetEvent::VehicleReleased { vehicle_id, .. } => {
                let vehicle = self.vehicle_mut(vehicle_id)?;
                vehicle.order = None;
                vehicle.state = ProcState::Idle;
                vehicle.target_location = None;
                self.claims.release_all(vehicle_id);
            }
            FleetEvent::SequenceFinished { sequence_id, vehicle_id, .. } => {
                let sequence = self.sequence_mut(sequence_id)?;
                sequence.finished = true;
                sequence.vehicle = None;
                if let Some(vehicle) =
                    vehicle_id.as_ref().and_then(|id| self.vehicles.get_mut(id))
                {
                    if vehicle.sequence.as_ref() == Some(sequence_id) {
                        vehicle.sequence = None;
                    }
                }
            }
            FleetEvent::SequenceReleased { sequence_id, vehicle_id, .. } => {
                self.sequence_mut(sequence_id)?.vehicle = None;
                let vehicle = self.vehicle_mut(vehicle_id)?;
                if vehicle.sequence.as_ref() == Some(sequence_id) {
                    vehicle.sequence = None;
                }
            }
            FleetEvent::VehicleSentToRecharge { vehicle_id, location, .. } => {
                self.move_idle_vehicle(vehicle_id, location)?;
                if let Some(vehicle) = self.vehicles.get_mut(vehicle_id) {
                    vehicle.state = ProcState::Charging;
                }
            }
            FleetEvent::VehicleSentToPark { vehicle_id, location, .. } => {
                self.move_idle_vehicle(vehicle_id, location)?;
            }
            FleetEvent::PeripheralJobFinished { job, .. } => {
                let mut finished = job.clone();
                finished.state = PeripheralJobState::Finished;
                self.peripheral_jobs.insert(job.id.clone(), finished);
            }
            FleetEvent::PeripheralJobFailed { job, .. } => {
                let mut failed = job.clone();
                failed.state = PeripheralJobState::Failed;
                self.peripheral_jobs.insert(job.id.clone(), failed);
            }
        }
        self.version += 1;
        Ok(())
    }

    fn uncommitted_events(&self) -> &[Self::Event] {
        &self.uncommitted_events
    }

    fn mark_events_as_committed(&mut self) {
        self.uncommitted_events.clear();
    }

    fn add_event(&mut self, event: Self::Event) {
        self.uncommitted_events.push(event);
    }
}

impl FleetState {
    fn order_mut(&mut self, id: &str) -> DomainResult<&mut TransportOrder> {
        self.orders.get_mut(id).ok_or_else(|| DomainError::not_found("Order", id))
    }

    fn vehicle_mut(&mut self, id: &str) -> DomainResult<&mut Vehicle> {
        self.vehicles.get_mut(id).ok_or_else(|| DomainError::not_found("Vehicle", id))
    }

    fn sequence_mut(&mut self, id: &str) -> DomainResult<&mut OrderSequence> {
        self.sequences.get_mut(id).ok_or_else(|| DomainError::not_found("Order sequence", id))
    }

    fn job_mut(&mut self, id: &str) -> DomainResult<&mut PeripheralJob> {
        self.peripheral_jobs.get_mut(id).ok_or_else(|| DomainError::not_found("Peripheral job", id))
    }

    /// Swap the vehicle's claims for the target spot and send it there.
    fn move_idle_vehicle(&mut self, vehicle_id: &str, location: &str) -> DomainResult<()> {
        let location = location.to_string();
        if let Some((resource, holder)) = self.claims.first_conflict([&location], vehicle_id) {
            return Err(DomainError::ResourceConflict { resource, holder });
        }
        let vehicle = self.vehicle_mut(vehicle_id)?;
        vehicle.target_location = if vehicle.current_location.as_ref() == Some(&location) {
            None
        } else {
            Some(location.clone())
        };
        self.claims.release_all(vehicle_id);
        self.claims.claim_all([&location], vehicle_id);
        Ok(())
    }
}
