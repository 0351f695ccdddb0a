use super::aggregate::{
    FailureReason, Location, OrderSequence, PeripheralJob, TransportOrder, Vehicle, VehicleUpdate,
};
use crate::common::DomainEvent;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum FleetEvent {
    VehicleRegistered {
        vehicle: Vehicle,
        timestamp: DateTime<Utc>,
    },
    LocationRegistered {
        location: Location,
        timestamp: DateTime<Utc>,
    },
    OrderCreated {
        order: TransportOrder,
        timestamp: DateTime<Utc>,
    },
    SequenceCreated {
        sequence: OrderSequence,
        timestamp: DateTime<Utc>,
    },
    SequenceCompleted {
        sequence_id: String,
        timestamp: DateTime<Utc>,
    },
    PeripheralJobRegistered {
        job: PeripheralJob,
        timestamp: DateTime<Utc>,
    },
    VehicleUpdated {
        update: VehicleUpdate,
        timestamp: DateTime<Utc>,
    },
    OrderDispatchable {
        order_id: String,
        timestamp: DateTime<Utc>,
    },
    OrderAssigned {
        order_id: String,
        vehicle_id: String,
        resources: Vec<String>,
        timestamp: DateTime<Utc>,
    },
    DriveStepIssued {
        order_id: String,
        vehicle_id: String,
        step_index: usize,
        destination: String,
        timestamp: DateTime<Utc>,
    },
    PeripheralJobTriggered {
        job_id: String,
        timestamp: DateTime<Utc>,
    },
    OrderWithdrawalRequested {
        order_id: String,
        timestamp: DateTime<Utc>,
    },
    OrderFinished {
        order_id: String,
        timestamp: DateTime<Utc>,
    },
    OrderFailed {
        order_id: String,
        reason: FailureReason,
        timestamp: DateTime<Utc>,
    },
    VehicleReleased {
        vehicle_id: String,
        order_id: String,
        timestamp: DateTime<Utc>,
    },
    SequenceFinished {
        sequence_id: String,
        vehicle_id: Option<String>,
        timestamp: DateTime<Utc>,
    },
    SequenceReleased {
        sequence_id: String,
        vehicle_id: String,
        timestamp: DateTime<Utc>,
    },
    VehicleSentToRecharge {
        vehicle_id: String,
        location: String,
        timestamp: DateTime<Utc>,
    },
    VehicleSentToPark {
        vehicle_id: String,
        location: String,
        timestamp: DateTime<Utc>,
    },
    PeripheralJobFinished {
        job: PeripheralJob,
        timestamp: DateTime<Utc>,
    },
    PeripheralJobFailed {
        job: PeripheralJob,
        timestamp: DateTime<Utc>,
    },
}

impl DomainEvent for FleetEvent {
    fn event_type(&self) -> &'static str {
        match self {
            FleetEvent::VehicleRegistered { .. } => "VehicleRegistered",
            FleetEvent::LocationRegistered { .. } => "LocationRegistered",
            FleetEvent::OrderCreated { .. } => "OrderCreated",
            FleetEvent::SequenceCreated { .. } => "SequenceCreated",
            FleetEvent::SequenceCompleted { .. } => "SequenceCompleted",
            FleetEvent::PeripheralJobRegistered { .. } => "PeripheralJobRegistered",
            FleetEvent::VehicleUpdated { .. } => "VehicleUpdated",
            FleetEvent::OrderDispatchable { .. } => "OrderDispatchable",
            FleetEvent::OrderAssigned { .. } => "OrderAssigned",
            FleetEvent::DriveStepIssued { .. } => "DriveStepIssued",
            FleetEvent::PeripheralJobTriggered { .. } => "PeripheralJobTriggered",
            FleetEvent::OrderWithdrawalRequested { .. } => "OrderWithdrawalRequested",
            FleetEvent::OrderFinished { .. } => "OrderFinished",
            FleetEvent::OrderFailed { .. } => "OrderFailed",
            FleetEvent::VehicleReleased { .. } => "VehicleReleased",
            FleetEvent::SequenceFinished { .. } => "SequenceFinished",
            FleetEvent::SequenceReleased { .. } => "SequenceReleased",
            FleetEvent::VehicleSentToRecharge { .. } => "VehicleSentToRecharge",
            FleetEvent::VehicleSentToPark { .. } => "VehicleSentToPark",
            FleetEvent::PeripheralJobFinished { .. } => "PeripheralJobFinished",
            FleetEvent::PeripheralJobFailed { .. } => "PeripheralJobFailed",
        }
    }

    fn aggregate_id(&self) -> &str {
        match self {
            FleetEvent::VehicleRegistered { vehicle, .. } => &vehicle.id,
            FleetEvent::LocationRegistered { location, .. } => &location.name,
            FleetEvent::OrderCreated { order, .. } => &order.id,
            FleetEvent::SequenceCreated { sequence, .. } => &sequence.id,
            FleetEvent::SequenceCompleted { sequence_id, .. } => sequence_id,
            FleetEvent::PeripheralJobRegistered { job, .. } => &job.id,
            FleetEvent::VehicleUpdated { update, .. } => &update.vehicle_id,
            FleetEvent::OrderDispatchable { order_id, .. } => order_id,
            FleetEvent::OrderAssigned { order_id, .. } => order_id,
            FleetEvent::DriveStepIssued { order_id, .. } => order_id,
            FleetEvent::PeripheralJobTriggered { job_id, .. } => job_id,
            FleetEvent::OrderWithdrawalRequested { order_id, .. } => order_id,
            FleetEvent::OrderFinished { order_id, .. } => order_id,
            FleetEvent::OrderFailed { order_id, .. } => order_id,
            FleetEvent::VehicleReleased { vehicle_id, .. } => vehicle_id,
            FleetEvent::SequenceFinished { sequence_id, .. } => sequence_id,
            FleetEvent::SequenceReleased { sequence_id, .. } => sequence_id,
            FleetEvent::VehicleSentToRecharge { vehicle_id, .. } => vehicle_id,
            FleetEvent::VehicleSentToPark { vehicle_id, .. } => vehicle_id,
            FleetEvent::PeripheralJobFinished { job, .. } => &job.id,
            FleetEvent::PeripheralJobFailed { job, .. } => &job.id,
        }
    }

    fn event_version(&self) -> u64 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            FleetEvent::VehicleRegistered { timestamp, .. }
            | FleetEvent::LocationRegistered { timestamp, .. }
            | FleetEvent::OrderCreated { timestamp, .. }
            | FleetEvent::SequenceCreated { timestamp, .. }
            | FleetEvent::SequenceCompleted { timestamp, .. }
            | FleetEvent::PeripheralJobRegistered { timestamp, .. }
            | FleetEvent::VehicleUpdated { timestamp, .. }
            | FleetEvent::OrderDispatchable { timestamp, .. }
            | FleetEvent::OrderAssigned { timestamp, .. }
            | FleetEvent::DriveStepIssued { timestamp, .. }
            | FleetEvent::PeripheralJobTriggered { timestamp, .. }
            | FleetEvent::OrderWithdrawalRequested { timestamp, .. }
            | FleetEvent::OrderFinished { timestamp, .. }
            | FleetEvent::OrderFailed { timestamp, .. }
            | FleetEvent::VehicleReleased { timestamp, .. }
            | FleetEvent::SequenceFinished { timestamp, .. }
            | FleetEvent::SequenceReleased { timestamp, .. }
            | FleetEvent::VehicleSentToRecharge { timestamp, .. }
            | FleetEvent::VehicleSentToPark { timestamp, .. }
            | FleetEvent::PeripheralJobFinished { timestamp, .. }
            | FleetEvent::PeripheralJobFailed { timestamp, .. } => *timestamp,
        }
    }
}
