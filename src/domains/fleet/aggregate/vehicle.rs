use super::types::Position2D;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Matches every order type in `allowed_order_types`.
pub const ANY_ORDER_TYPE: &str = "*";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ProcState {
    Idle,
    AwaitingOrder,
    Executing,
    Charging,
    Unavailable,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: String,
    pub state: ProcState,
    /// Percent, 0..=100.
    pub energy_level: u8,
    pub allowed_order_types: BTreeSet<String>,
    pub position: Option<Position2D>,
    pub current_location: Option<String>,
    /// Where the vehicle was last sent to; cleared once it reports arrival.
    pub target_location: Option<String>,
    pub order: Option<String>,
    pub sequence: Option<String>,
    pub priority_parking_target: Option<String>,
}

impl Vehicle {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            state: ProcState::Idle,
            energy_level: 100,
            allowed_order_types: [ANY_ORDER_TYPE.to_string()].into_iter().collect(),
            position: None,
            current_location: None,
            target_location: None,
            order: None,
            sequence: None,
            priority_parking_target: None,
        }
    }

    pub fn with_energy(mut self, energy_level: u8) -> Self {
        self.energy_level = energy_level.min(100);
        self
    }

    pub fn at(mut self, location: impl Into<String>, position: Position2D) -> Self {
        self.current_location = Some(location.into());
        self.position = Some(position);
        self
    }

    pub fn with_state(mut self, state: ProcState) -> Self {
        self.state = state;
        self
    }

    pub fn with_allowed_order_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_order_types = types.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_priority_parking_target(mut self, location: impl Into<String>) -> Self {
        self.priority_parking_target = Some(location.into());
        self
    }

    pub fn accepts_order_type(&self, order_type: &str) -> bool {
        self.allowed_order_types.contains(ANY_ORDER_TYPE)
            || self.allowed_order_types.contains(order_type)
    }

    /// IDLE and bound to neither an order nor a sequence.
    pub fn is_idle_and_unbound(&self) -> bool {
        self.state == ProcState::Idle && self.order.is_none() && self.sequence.is_none()
    }

    /// The location the vehicle is at, or heading to if it was sent somewhere.
    pub fn effective_location(&self) -> Option<&str> {
        self.target_location
            .as_deref()
            .or(self.current_location.as_deref())
    }
}

/// Feedback from a vehicle adapter; `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct VehicleUpdate {
    pub vehicle_id: String,
    pub state: Option<ProcState>,
    pub energy_level: Option<u8>,
    pub current_location: Option<String>,
    pub position: Option<Position2D>,
}

impl VehicleUpdate {
    pub fn new(vehicle_id: impl Into<String>) -> Self {
        Self {
            vehicle_id: vehicle_id.into(),
            ..Default::default()
        }
    }

    pub fn state(mut self, state: ProcState) -> Self {
        self.state = Some(state);
        self
    }

    pub fn energy(mut self, energy_level: u8) -> Self {
        self.energy_level = Some(energy_level);
        self
    }

    pub fn arrived_at(mut self, location: impl Into<String>, position: Option<Position2D>) -> Self {
        self.current_location = Some(location.into());
        self.position = position;
        self
    }
}
