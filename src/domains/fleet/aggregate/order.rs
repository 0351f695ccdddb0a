use super::resources::canonical_resource;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Order type accepted by every vehicle unless restricted.
pub const DEFAULT_ORDER_TYPE: &str = "-";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum OrderState {
    Raw,
    Dispatchable,
    BeingProcessed,
    /// Withdrawal requested while bound to a vehicle; finalized by the
    /// withdrawal phase once the vehicle stops.
    Withdrawn,
    Finished,
    Failed(FailureReason),
}

impl OrderState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderState::Finished | OrderState::Failed(_))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum FailureReason {
    Withdrawn,
    PeripheralJobFailed { job_id: String },
    SequenceAborted { sequence_id: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DriveStep {
    pub destination: String,
    pub operation: String,
    /// Peripheral job that must finish before this step may start.
    pub peripheral_job: Option<String>,
}

impl DriveStep {
    pub fn new(destination: impl Into<String>, operation: impl Into<String>) -> Self {
        Self {
            destination: destination.into(),
            operation: operation.into(),
            peripheral_job: None,
        }
    }

    pub fn gated_by(mut self, job_id: impl Into<String>) -> Self {
        self.peripheral_job = Some(job_id.into());
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportOrder {
    pub id: String,
    pub order_type: String,
    pub steps: Vec<DriveStep>,
    /// Index of the next step to issue.
    pub next_step: usize,
    pub dependencies: BTreeSet<String>,
    /// Blocks or paths claimed in addition to the step destinations.
    pub extra_resources: BTreeSet<String>,
    pub intended_vehicle: Option<String>,
    pub sequence: Option<String>,
    pub state: OrderState,
    pub vehicle: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TransportOrder {
    pub fn new(id: impl Into<String>, steps: Vec<DriveStep>) -> Self {
        Self {
            id: id.into(),
            order_type: DEFAULT_ORDER_TYPE.to_string(),
            steps,
            next_step: 0,
            dependencies: BTreeSet::new(),
            extra_resources: BTreeSet::new(),
            intended_vehicle: None,
            sequence: None,
            state: OrderState::Raw,
            vehicle: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_dependencies<I, S>(mut self, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = dependencies.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_intended_vehicle(mut self, vehicle_id: impl Into<String>) -> Self {
        self.intended_vehicle = Some(vehicle_id.into());
        self
    }

    pub fn with_order_type(mut self, order_type: impl Into<String>) -> Self {
        self.order_type = order_type.into();
        self
    }

    pub fn with_resources<I, S>(mut self, resources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_resources = resources.into_iter().map(Into::into).collect();
        self
    }

    pub fn in_sequence(mut self, sequence_id: impl Into<String>) -> Self {
        self.sequence = Some(sequence_id.into());
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    pub fn next_drive_step(&self) -> Option<&DriveStep> {
        self.steps.get(self.next_step)
    }

    pub fn remaining_steps(&self) -> &[DriveStep] {
        self.steps.get(self.next_step..).unwrap_or(&[])
    }

    pub fn first_destination(&self) -> Option<&str> {
        self.steps.first().map(|s| s.destination.as_str())
    }

    /// Everything a vehicle must hold while processing this order, canonicalized.
    pub fn required_resources(&self) -> BTreeSet<String> {
        self.steps
            .iter()
            .map(|s| s.destination.as_str())
            .chain(self.extra_resources.iter().map(String::as_str))
            .map(canonical_resource)
            .collect()
    }
}
