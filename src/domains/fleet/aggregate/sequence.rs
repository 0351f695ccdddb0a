use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderSequence {
    pub id: String,
    /// Member order ids in processing order.
    pub orders: Vec<String>,
    /// No further members will be appended.
    pub complete: bool,
    /// A failed member fails all members after it. Otherwise they stay RAW
    /// behind the failed member.
    pub failure_fatal: bool,
    pub intended_vehicle: Option<String>,
    pub vehicle: Option<String>,
    pub finished: bool,
}

impl OrderSequence {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            orders: Vec::new(),
            complete: false,
            failure_fatal: false,
            intended_vehicle: None,
            vehicle: None,
            finished: false,
        }
    }

    pub fn failure_fatal(mut self, failure_fatal: bool) -> Self {
        self.failure_fatal = failure_fatal;
        self
    }

    pub fn with_intended_vehicle(mut self, vehicle_id: impl Into<String>) -> Self {
        self.intended_vehicle = Some(vehicle_id.into());
        self
    }

    pub fn position_of(&self, order_id: &str) -> Option<usize> {
        self.orders.iter().position(|o| o == order_id)
    }

    /// Members that come before `order_id`.
    pub fn predecessors_of(&self, order_id: &str) -> &[String] {
        match self.position_of(order_id) {
            Some(index) => &self.orders[..index],
            None => &[],
        }
    }
}
