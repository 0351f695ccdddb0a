use crate::common::{DomainError, DomainResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PeripheralJobState {
    Pending,
    Executing,
    Finished,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PeripheralOperation {
    pub location: String,
    pub operation: String,
    /// Gated drive steps wait for the job only when this is set.
    pub completion_required: bool,
}

impl PeripheralOperation {
    pub fn new(location: impl Into<String>, operation: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            operation: operation.into(),
            completion_required: true,
        }
    }

    pub fn completion_required(mut self, required: bool) -> Self {
        self.completion_required = required;
        self
    }
}

/// A job executed by a door, lift or conveyor. Owned by the peripheral
/// subsystem; the fleet only keeps the copy it was told about.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PeripheralJob {
    pub id: String,
    pub reservation_token: String,
    pub operation: PeripheralOperation,
    pub related_vehicle: Option<String>,
    pub related_order: Option<String>,
    pub state: PeripheralJobState,
    pub created_at: DateTime<Utc>,
}

impl PeripheralJob {
    pub fn new(
        id: impl Into<String>,
        reservation_token: impl Into<String>,
        operation: PeripheralOperation,
    ) -> DomainResult<Self> {
        let id = id.into();
        let reservation_token = reservation_token.into();
        if id.trim().is_empty() {
            return Err(DomainError::invalid("Peripheral job id must not be empty"));
        }
        if reservation_token.trim().is_empty() {
            return Err(DomainError::invalid(format!(
                "Peripheral job {} has no reservation token",
                id
            )));
        }
        if operation.location.trim().is_empty() || operation.operation.trim().is_empty() {
            return Err(DomainError::invalid(format!(
                "Peripheral job {} needs a location and an operation",
                id
            )));
        }
        Ok(Self {
            id,
            reservation_token,
            operation,
            related_vehicle: None,
            related_order: None,
            state: PeripheralJobState::Pending,
            created_at: Utc::now(),
        })
    }

    pub fn related_to_order(mut self, order_id: impl Into<String>) -> Self {
        self.related_order = Some(order_id.into());
        self
    }

    pub fn related_to_vehicle(mut self, vehicle_id: impl Into<String>) -> Self {
        self.related_vehicle = Some(vehicle_id.into());
        self
    }

    pub fn with_state(mut self, state: PeripheralJobState) -> Self {
        self.state = state;
        self
    }

    /// Whether a drive step gated on this job has to keep waiting.
    pub fn blocks_gated_step(&self) -> bool {
        self.operation.completion_required && self.state != PeripheralJobState::Finished
    }
}
