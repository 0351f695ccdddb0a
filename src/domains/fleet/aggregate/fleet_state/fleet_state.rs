use crate::common::aggregate::AggregateRoot;
use crate::common::{DomainError, DomainResult};
use crate::domains::fleet::aggregate::{
    DriveStep, FailureReason, Location, OrderSequence, OrderState, PeripheralJob,
    PeripheralJobState, ProcState, ResourceClaims, TransportOrder, Vehicle, VehicleUpdate,
};
use crate::domains::fleet::events::FleetEvent;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Shared state of one fleet: vehicles, orders, sequences, peripheral jobs,
/// locations and resource claims.
///
/// Every change goes through a command method that validates against the
/// current state and records a [`FleetEvent`]; `apply` is the only code that
/// mutates the maps. Owned by the kernel executor, so no locking is needed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FleetState {
    pub id: String,
    pub(super) orders: BTreeMap<String, TransportOrder>,
    pub(super) vehicles: BTreeMap<String, Vehicle>,
    pub(super) sequences: BTreeMap<String, OrderSequence>,
    pub(super) peripheral_jobs: BTreeMap<String, PeripheralJob>,
    pub(super) locations: BTreeMap<String, Location>,
    pub(super) claims: ResourceClaims,
    pub version: u64,
    #[serde(skip)]
    pub(super) uncommitted_events: Vec<FleetEvent>,
}

impl FleetState {
    /// Hand the uncommitted events to the journal.
    pub fn take_uncommitted_events(&mut self) -> Vec<FleetEvent> {
        std::mem::take(&mut self.uncommitted_events)
    }
}

// Registration of externally defined data.
impl FleetState {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            orders: BTreeMap::new(),
            vehicles: BTreeMap::new(),
            sequences: BTreeMap::new(),
            peripheral_jobs: BTreeMap::new(),
            locations: BTreeMap::new(),
            claims: ResourceClaims::new(),
            version: 0,
            uncommitted_events: Vec::new(),
        }
    }

    pub fn register_location(&mut self, location: Location) -> DomainResult<()> {
        if self.locations.contains_key(&location.name) {
            return Err(DomainError::invalid(format!(
                "Location {} is already registered",
                location.name
            )));
        }
        self.record(FleetEvent::LocationRegistered { location, timestamp: Utc::now() })
    }

    pub fn register_vehicle(&mut self, vehicle: Vehicle) -> DomainResult<()> {
        if self.vehicles.contains_key(&vehicle.id) {
            return Err(DomainError::invalid(format!(
                "Vehicle {} is already registered",
                vehicle.id
            )));
        }
        if vehicle.order.is_some() || vehicle.sequence.is_some() {
            return Err(DomainError::invalid(format!(
                "Vehicle {} cannot be registered with an order or sequence binding",
                vehicle.id
            )));
        }
        if matches!(vehicle.state, ProcState::AwaitingOrder | ProcState::Executing) {
            return Err(DomainError::invalid(format!(
                "Vehicle {} cannot be registered as {:?} without an order",
                vehicle.id, vehicle.state
            )));
        }
        self.record(FleetEvent::VehicleRegistered { vehicle, timestamp: Utc::now() })
    }

    pub fn create_sequence(&mut self, sequence: OrderSequence) -> DomainResult<()> {
        if self.sequences.contains_key(&sequence.id) {
            return Err(DomainError::invalid(format!(
                "Order sequence {} already exists",
                sequence.id
            )));
        }
        if !sequence.orders.is_empty() || sequence.vehicle.is_some() || sequence.finished {
            return Err(DomainError::invalid(format!(
                "Order sequence {} must be created empty and unbound",
                sequence.id
            )));
        }
        if let Some(vehicle_id) = &sequence.intended_vehicle {
            self.require_vehicle(vehicle_id)?;
        }
        self.record(FleetEvent::SequenceCreated { sequence, timestamp: Utc::now() })
    }

    /// Declare that no further orders will be appended to the sequence.
    pub fn complete_sequence(&mut self, sequence_id: &str) -> DomainResult<()> {
        if self.require_sequence(sequence_id)?.complete {
            return Ok(());
        }
        self.record(FleetEvent::SequenceCompleted {
            sequence_id: sequence_id.to_string(),
            timestamp: Utc::now(),
        })
    }

    pub fn create_order(&mut self, order: TransportOrder) -> DomainResult<()> {
        if self.orders.contains_key(&order.id) {
            return Err(DomainError::invalid(format!("Order {} already exists", order.id)));
        }
        if order.steps.is_empty() {
            return Err(DomainError::invalid(format!("Order {} has no drive steps", order.id)));
        }
        if order.state != OrderState::Raw || order.vehicle.is_some() || order.next_step != 0 {
            return Err(DomainError::invalid(format!(
                "Order {} must be created RAW and unassigned",
                order.id
            )));
        }
        for step in &order.steps {
            self.require_location(&step.destination)?;
        }
        if let Some(vehicle_id) = &order.intended_vehicle {
            self.require_vehicle(vehicle_id)?;
        }
        if let Some(sequence_id) = &order.sequence {
            if self.require_sequence(sequence_id)?.complete {
                return Err(DomainError::invalid(format!(
                    "Order sequence {} is complete; order {} cannot be appended",
                    sequence_id, order.id
                )));
            }
        }
        self.record(FleetEvent::OrderCreated { order, timestamp: Utc::now() })
    }

    pub fn register_peripheral_job(&mut self, job: PeripheralJob) -> DomainResult<()> {
        if self.peripheral_jobs.contains_key(&job.id) {
            return Err(DomainError::invalid(format!(
                "Peripheral job {} is already registered",
                job.id
            )));
        }
        self.record(FleetEvent::PeripheralJobRegistered { job, timestamp: Utc::now() })
    }

    /// Adapter feedback. An IDLE report from a vehicle still bound to an
    /// order means it stopped and waits, so it is stored as AWAITING_ORDER.
    pub fn update_vehicle(&mut self, mut update: VehicleUpdate) -> DomainResult<()> {
        let vehicle = self.require_vehicle(&update.vehicle_id)?;
        if update.state == Some(ProcState::Idle) && vehicle.order.is_some() {
            update.state = Some(ProcState::AwaitingOrder);
        }
        if matches!(update.state, Some(ProcState::AwaitingOrder | ProcState::Executing))
            && vehicle.order.is_none()
        {
            update.state = Some(ProcState::Idle);
        }
        update.energy_level = update.energy_level.map(|level| level.min(100));
        self.record(FleetEvent::VehicleUpdated { update, timestamp: Utc::now() })
    }

    /// Withdraw an order. Unassigned orders fail at once; bound orders are
    /// flagged and finalized once their vehicle stops.
    pub fn request_withdrawal(&mut self, order_id: &str) -> DomainResult<()> {
        let order = self.require_order(order_id)?;
        match &order.state {
            OrderState::Raw | OrderState::Dispatchable => {
                self.fail_order(order_id, FailureReason::Withdrawn)
            }
            OrderState::BeingProcessed => self.record(FleetEvent::OrderWithdrawalRequested {
                order_id: order_id.to_string(),
                timestamp: Utc::now(),
            }),
            OrderState::Withdrawn => Ok(()),
            state => Err(DomainError::invalid(format!(
                "Order {} is already {:?} and cannot be withdrawn",
                order_id, state
            ))),
        }
    }
}

// Transitions decided by the dispatch phases.
impl FleetState {
    pub fn mark_dispatchable(&mut self, order_id: &str) -> DomainResult<()> {
        let order = self.require_order(order_id)?;
        if order.state != OrderState::Raw {
            return Err(DomainError::invalid(format!(
                "Order {} is {:?}, not RAW",
                order_id, order.state
            )));
        }
        self.record(FleetEvent::OrderDispatchable {
            order_id: order_id.to_string(),
            timestamp: Utc::now(),
        })
    }

    /// Bind a DISPATCHABLE order to an idle vehicle and claim its resources.
    pub fn assign_order(&mut self, order_id: &str, vehicle_id: &str) -> DomainResult<()> {
        let order = self.require_order(order_id)?;
        let vehicle = self.require_vehicle(vehicle_id)?;
        if order.state != OrderState::Dispatchable {
            return Err(DomainError::invalid(format!(
                "Order {} is {:?}, not DISPATCHABLE",
                order_id, order.state
            )));
        }
        if vehicle.state != ProcState::Idle || vehicle.order.is_some() {
            return Err(DomainError::invalid(format!(
                "Vehicle {} is not idle and unassigned",
                vehicle_id
            )));
        }
        if vehicle.sequence.is_some() && vehicle.sequence != order.sequence {
            return Err(DomainError::invalid(format!(
                "Vehicle {} is bound to another order sequence",
                vehicle_id
            )));
        }
        if let Some(sequence_id) = &order.sequence {
            let sequence = self.require_sequence(sequence_id)?;
            if sequence.vehicle.as_deref().is_some_and(|bound| bound != vehicle_id) {
                return Err(DomainError::invalid(format!(
                    "Order sequence {} is bound to another vehicle",
                    sequence_id
                )));
            }
        }
        let resources = order.required_resources();
        if let Some((resource, holder)) = self.claims.first_conflict(&resources, vehicle_id) {
            return Err(DomainError::ResourceConflict { resource, holder });
        }
        self.record(FleetEvent::OrderAssigned {
            order_id: order_id.to_string(),
            vehicle_id: vehicle_id.to_string(),
            resources: resources.into_iter().collect(),
            timestamp: Utc::now(),
        })
    }

    /// Record that the order's next step was handed to its vehicle.
    pub fn record_drive_step(&mut self, order_id: &str) -> DomainResult<DriveStep> {
        let order = self.require_order(order_id)?;
        if order.state != OrderState::BeingProcessed {
            return Err(DomainError::invalid(format!(
                "Order {} is {:?}, not BEING_PROCESSED",
                order_id, order.state
            )));
        }
        let vehicle_id = order
            .vehicle
            .clone()
            .ok_or_else(|| DomainError::invalid(format!("Order {} has no vehicle", order_id)))?;
        let step_index = order.next_step;
        let step = order.next_drive_step().cloned().ok_or_else(|| {
            DomainError::invalid(format!("Order {} has no remaining drive steps", order_id))
        })?;
        self.record(FleetEvent::DriveStepIssued {
            order_id: order_id.to_string(),
            vehicle_id,
            step_index,
            destination: step.destination.clone(),
            timestamp: Utc::now(),
        })?;
        Ok(step)
    }

    pub fn trigger_peripheral_job(&mut self, job_id: &str) -> DomainResult<()> {
        let job = self.require_peripheral_job(job_id)?;
        if job.state != PeripheralJobState::Pending {
            return Err(DomainError::invalid(format!(
                "Peripheral job {} is {:?}, not PENDING",
                job_id, job.state
            )));
        }
        self.record(FleetEvent::PeripheralJobTriggered {
            job_id: job_id.to_string(),
            timestamp: Utc::now(),
        })
    }

    /// Finish an order whose steps are all issued and free its vehicle.
    pub fn finish_order(&mut self, order_id: &str) -> DomainResult<()> {
        let order = self.require_order(order_id)?;
        if order.state != OrderState::BeingProcessed || !order.remaining_steps().is_empty() {
            return Err(DomainError::invalid(format!(
                "Order {} cannot finish in state {:?} with {} steps left",
                order_id,
                order.state,
                order.remaining_steps().len()
            )));
        }
        let vehicle_id = order.vehicle.clone();
        self.record(FleetEvent::OrderFinished {
            order_id: order_id.to_string(),
            timestamp: Utc::now(),
        })?;
        match vehicle_id {
            Some(vehicle_id) => self.release_vehicle(&vehicle_id),
            None => Ok(()),
        }
    }

    /// Fail an order. The vehicle stays bound until it reports that it
    /// stopped; in a failure-fatal sequence all later members fail as well.
    pub fn fail_order(&mut self, order_id: &str, reason: FailureReason) -> DomainResult<()> {
        let order = self.require_order(order_id)?;
        if order.state.is_terminal() {
            return Err(DomainError::invalid(format!(
                "Order {} is already {:?}",
                order_id, order.state
            )));
        }
        let sequence_id = order.sequence.clone();
        self.record(FleetEvent::OrderFailed {
            order_id: order_id.to_string(),
            reason,
            timestamp: Utc::now(),
        })?;

        let Some(sequence_id) = sequence_id else {
            return Ok(());
        };
        let sequence = self.require_sequence(&sequence_id)?;
        if !sequence.failure_fatal {
            return Ok(());
        }
        let followers: Vec<String> = sequence
            .orders
            .iter()
            .skip_while(|member| member.as_str() != order_id)
            .skip(1)
            .filter(|member| self.orders.get(*member).is_some_and(|o| !o.state.is_terminal()))
            .cloned()
            .collect();
        let complete = sequence.complete;
        for member in followers {
            self.record(FleetEvent::OrderFailed {
                order_id: member,
                reason: FailureReason::SequenceAborted { sequence_id: sequence_id.clone() },
                timestamp: Utc::now(),
            })?;
        }
        if !complete {
            self.record(FleetEvent::SequenceCompleted { sequence_id, timestamp: Utc::now() })?;
        }
        Ok(())
    }

    /// Unbind a vehicle from its terminal order; it becomes IDLE.
    pub fn release_vehicle(&mut self, vehicle_id: &str) -> DomainResult<()> {
        let vehicle = self.require_vehicle(vehicle_id)?;
        let order_id = vehicle.order.clone().ok_or_else(|| {
            DomainError::invalid(format!("Vehicle {} has no order to release", vehicle_id))
        })?;
        let order = self.require_order(&order_id)?;
        if !order.state.is_terminal() {
            return Err(DomainError::invalid(format!(
                "Vehicle {} cannot leave order {} while it is {:?}",
                vehicle_id, order_id, order.state
            )));
        }
        self.record(FleetEvent::VehicleReleased {
            vehicle_id: vehicle_id.to_string(),
            order_id,
            timestamp: Utc::now(),
        })
    }

    /// Finalize a withdrawal once the vehicle reports AWAITING_ORDER.
    pub fn finalize_withdrawal(&mut self, vehicle_id: &str) -> DomainResult<String> {
        let vehicle = self.require_vehicle(vehicle_id)?;
        if vehicle.state != ProcState::AwaitingOrder {
            return Err(DomainError::invalid(format!(
                "Vehicle {} has not stopped yet ({:?})",
                vehicle_id, vehicle.state
            )));
        }
        let order_id = vehicle.order.clone().ok_or_else(|| {
            DomainError::invalid(format!("Vehicle {} has no order", vehicle_id))
        })?;
        if self.require_order(&order_id)?.state != OrderState::Withdrawn {
            return Err(DomainError::invalid(format!("Order {} is not WITHDRAWN", order_id)));
        }
        self.fail_order(&order_id, FailureReason::Withdrawn)?;
        self.release_vehicle(vehicle_id)?;
        Ok(order_id)
    }

    pub fn finish_sequence(&mut self, sequence_id: &str) -> DomainResult<()> {
        let sequence = self.require_sequence(sequence_id)?;
        if sequence.finished {
            return Ok(());
        }
        if !sequence.complete || self.sequence_next_order(sequence_id).is_some() {
            return Err(DomainError::invalid(format!(
                "Order sequence {} still has open members",
                sequence_id
            )));
        }
        let vehicle_id = sequence.vehicle.clone();
        self.record(FleetEvent::SequenceFinished {
            sequence_id: sequence_id.to_string(),
            vehicle_id,
            timestamp: Utc::now(),
        })
    }

    /// Unbind the vehicle of a blocked sequence. The remaining members stay
    /// RAW until they are withdrawn.
    pub fn release_sequence(&mut self, sequence_id: &str) -> DomainResult<()> {
        let sequence = self.require_sequence(sequence_id)?;
        let Some(vehicle_id) = sequence.vehicle.clone() else {
            return Ok(());
        };
        if !self.sequence_blocked(sequence_id) {
            return Err(DomainError::invalid(format!(
                "Order sequence {} is not blocked",
                sequence_id
            )));
        }
        self.record(FleetEvent::SequenceReleased {
            sequence_id: sequence_id.to_string(),
            vehicle_id,
            timestamp: Utc::now(),
        })
    }

    pub fn send_to_recharge(&mut self, vehicle_id: &str, location: &str) -> DomainResult<()> {
        self.check_idle_move(vehicle_id, location, |l| l.is_charging(), "charging")?;
        self.record(FleetEvent::VehicleSentToRecharge {
            vehicle_id: vehicle_id.to_string(),
            location: location.to_string(),
            timestamp: Utc::now(),
        })
    }

    pub fn send_to_park(&mut self, vehicle_id: &str, location: &str) -> DomainResult<()> {
        self.check_idle_move(vehicle_id, location, |l| l.is_parking(), "parking")?;
        self.record(FleetEvent::VehicleSentToPark {
            vehicle_id: vehicle_id.to_string(),
            location: location.to_string(),
            timestamp: Utc::now(),
        })
    }

    fn check_idle_move(
        &self,
        vehicle_id: &str,
        location: &str,
        kind_ok: impl Fn(&Location) -> bool,
        kind: &str,
    ) -> DomainResult<()> {
        if !self.require_vehicle(vehicle_id)?.is_idle_and_unbound() {
            return Err(DomainError::invalid(format!(
                "Vehicle {} is not idle and unbound",
                vehicle_id
            )));
        }
        if !kind_ok(self.require_location(location)?) {
            return Err(DomainError::invalid(format!(
                "Location {} is not a {} location",
                location, kind
            )));
        }
        match self.claims.holder(location) {
            Some(holder) if holder != vehicle_id => Err(DomainError::ResourceConflict {
                resource: location.to_string(),
                holder: holder.to_string(),
            }),
            _ => Ok(()),
        }
    }

    /// Record a reported job completion; gated steps may continue next cycle.
    pub fn complete_peripheral_job(&mut self, job: &PeripheralJob) -> DomainResult<()> {
        self.record(FleetEvent::PeripheralJobFinished {
            job: job.clone(),
            timestamp: Utc::now(),
        })
    }

    /// Record a reported job failure and fail every order waiting on it.
    /// Returns the ids of the failed orders.
    pub fn fail_peripheral_job(&mut self, job: &PeripheralJob) -> DomainResult<Vec<String>> {
        self.record(FleetEvent::PeripheralJobFailed {
            job: job.clone(),
            timestamp: Utc::now(),
        })?;
        let affected: Vec<String> = self
            .orders
            .values()
            .filter(|order| !order.state.is_terminal() && order.state != OrderState::Withdrawn)
            .filter(|order| {
                job.related_order.as_deref() == Some(order.id.as_str())
                    || order
                        .remaining_steps()
                        .iter()
                        .any(|step| step.peripheral_job.as_deref() == Some(job.id.as_str()))
            })
            .map(|order| order.id.clone())
            .collect();
        let mut failed = Vec::new();
        for order_id in affected {
            // An earlier member's fatal failure may already have failed it.
            if self.orders.get(&order_id).is_some_and(|o| o.state.is_terminal()) {
                continue;
            }
            self.fail_order(
                &order_id,
                FailureReason::PeripheralJobFailed { job_id: job.id.clone() },
            )?;
            failed.push(order_id);
        }
        Ok(failed)
    }
}

// Queries.
impl FleetState {
    pub fn order(&self, id: &str) -> Option<&TransportOrder> {
        self.orders.get(id)
    }

    pub fn orders(&self) -> impl Iterator<Item = &TransportOrder> {
        self.orders.values()
    }

    pub fn vehicle(&self, id: &str) -> Option<&Vehicle> {
        self.vehicles.get(id)
    }

    pub fn vehicles(&self) -> impl Iterator<Item = &Vehicle> {
        self.vehicles.values()
    }

    pub fn sequence(&self, id: &str) -> Option<&OrderSequence> {
        self.sequences.get(id)
    }

    pub fn sequences(&self) -> impl Iterator<Item = &OrderSequence> {
        self.sequences.values()
    }

    pub fn location(&self, name: &str) -> Option<&Location> {
        self.locations.get(name)
    }

    pub fn locations(&self) -> impl Iterator<Item = &Location> {
        self.locations.values()
    }

    pub fn peripheral_job(&self, id: &str) -> Option<&PeripheralJob> {
        self.peripheral_jobs.get(id)
    }

    pub fn claims(&self) -> &ResourceClaims {
        &self.claims
    }

    pub fn order_ids_in_state(&self, state: &OrderState) -> Vec<String> {
        self.orders
            .values()
            .filter(|order| &order.state == state)
            .map(|order| order.id.clone())
            .collect()
    }

    pub fn vehicle_ids_where(&self, predicate: impl Fn(&Vehicle) -> bool) -> Vec<String> {
        self.vehicles
            .values()
            .filter(|vehicle| predicate(vehicle))
            .map(|vehicle| vehicle.id.clone())
            .collect()
    }

    /// Every dependency exists and is FINISHED.
    pub fn dependencies_finished(&self, order: &TransportOrder) -> bool {
        order.dependencies.iter().all(|dependency| {
            self.orders
                .get(dependency)
                .is_some_and(|d| d.state == OrderState::Finished)
        })
    }

    /// Every earlier member of the order's sequence is FINISHED.
    pub fn sequence_predecessors_done(&self, order: &TransportOrder) -> bool {
        let Some(sequence) = order.sequence.as_deref().and_then(|id| self.sequences.get(id)) else {
            return true;
        };
        sequence.predecessors_of(&order.id).iter().all(|member| {
            self.orders
                .get(member)
                .is_some_and(|o| o.state == OrderState::Finished)
        })
    }

    /// A failed member sits in front of the sequence's next open member, so
    /// that member can never become dispatchable.
    pub fn sequence_blocked(&self, sequence_id: &str) -> bool {
        let Some(next) = self.sequence_next_order(sequence_id) else {
            return false;
        };
        self.sequences.get(sequence_id).is_some_and(|sequence| {
            sequence.predecessors_of(&next.id).iter().any(|member| {
                self.orders
                    .get(member)
                    .is_some_and(|o| matches!(o.state, OrderState::Failed(_)))
            })
        })
    }

    /// First member of the sequence that is not terminal yet.
    pub fn sequence_next_order(&self, sequence_id: &str) -> Option<&TransportOrder> {
        self.sequences.get(sequence_id)?.orders.iter().find_map(|member| {
            self.orders.get(member).filter(|o| !o.state.is_terminal())
        })
    }

    /// The vehicle an order is reserved for, directly or through its sequence.
    pub fn intended_vehicle_of(&self, order: &TransportOrder) -> Option<String> {
        order.intended_vehicle.clone().or_else(|| {
            order
                .sequence
                .as_deref()
                .and_then(|id| self.sequences.get(id))
                .and_then(|s| s.intended_vehicle.clone())
        })
    }

    /// Sequence members may only be picked by general assignment while the
    /// sequence has no vehicle yet.
    pub fn sequence_open_for_assignment(&self, order: &TransportOrder) -> bool {
        order
            .sequence
            .as_deref()
            .and_then(|id| self.sequences.get(id))
            .map_or(true, |s| s.vehicle.is_none() && !s.finished)
    }

    /// Parking location the vehicle is at or heading to.
    pub fn parking_spot_of(&self, vehicle: &Vehicle) -> Option<&Location> {
        vehicle
            .effective_location()
            .and_then(|name| self.locations.get(name))
            .filter(|location| location.is_parking())
    }

    /// Descriptions of broken fleet invariants; empty when consistent.
    pub fn invariant_violations(&self) -> Vec<String> {
        let mut violations = Vec::new();
        let mut processing: HashMap<&str, &str> = HashMap::new();
        for order in self.orders.values() {
            if order.state != OrderState::BeingProcessed {
                continue;
            }
            match order.vehicle.as_deref() {
                None => violations.push(format!(
                    "order {} is BEING_PROCESSED without vehicle",
                    order.id
                )),
                Some(vehicle_id) => {
                    if let Some(other) = processing.insert(vehicle_id, &order.id) {
                        violations.push(format!(
                            "vehicle {} processes both {} and {}",
                            vehicle_id, other, order.id
                        ));
                    }
                    if self.vehicles.get(vehicle_id).and_then(|v| v.order.as_deref())
                        != Some(order.id.as_str())
                    {
                        violations.push(format!(
                            "order {} and vehicle {} disagree about their binding",
                            order.id, vehicle_id
                        ));
                    }
                }
            }
        }
        for vehicle in self.vehicles.values() {
            if vehicle.state == ProcState::Idle && vehicle.order.is_some() {
                violations.push(format!("idle vehicle {} holds an order", vehicle.id));
            }
        }
        for sequence in self.sequences.values() {
            let active = sequence
                .orders
                .iter()
                .filter(|member| {
                    self.orders
                        .get(*member)
                        .is_some_and(|o| {
                            matches!(o.state, OrderState::BeingProcessed | OrderState::Withdrawn)
                        })
                })
                .count();
            if active > 1 {
                violations.push(format!("sequence {} has {} active members", sequence.id, active));
            }
        }
        violations
    }

    pub(crate) fn require_order(&self, id: &str) -> DomainResult<&TransportOrder> {
        self.orders.get(id).ok_or_else(|| DomainError::not_found("Order", id))
    }

    pub(crate) fn require_vehicle(&self, id: &str) -> DomainResult<&Vehicle> {
        self.vehicles.get(id).ok_or_else(|| DomainError::not_found("Vehicle", id))
    }

    pub(crate) fn require_sequence(&self, id: &str) -> DomainResult<&OrderSequence> {
        self.sequences.get(id).ok_or_else(|| DomainError::not_found("Order sequence", id))
    }

    pub(crate) fn require_location(&self, name: &str) -> DomainResult<&Location> {
        self.locations.get(name).ok_or_else(|| DomainError::not_found("Location", name))
    }

    pub(crate) fn require_peripheral_job(&self, id: &str) -> DomainResult<&PeripheralJob> {
        self.peripheral_jobs.get(id).ok_or_else(|| DomainError::not_found("Peripheral job", id))
    }
}
