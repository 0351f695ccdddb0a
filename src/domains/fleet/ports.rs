use serde::{Deserialize, Serialize};

/// Instruction for a vehicle or peripheral device, produced by the dispatch
/// phases and handed to the outside world without waiting for a result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum DispatchCommand {
    Drive {
        vehicle_id: String,
        order_id: String,
        step_index: usize,
        destination: String,
        operation: String,
    },
    TriggerPeripheralJob {
        job_id: String,
        location: String,
        operation: String,
    },
    Park {
        vehicle_id: String,
        location: String,
    },
    Recharge {
        vehicle_id: String,
        location: String,
    },
}

impl DispatchCommand {
    pub fn vehicle_id(&self) -> Option<&str> {
        match self {
            DispatchCommand::Drive { vehicle_id, .. }
            | DispatchCommand::Park { vehicle_id, .. }
            | DispatchCommand::Recharge { vehicle_id, .. } => Some(vehicle_id),
            DispatchCommand::TriggerPeripheralJob { .. } => None,
        }
    }
}

/// Port the dispatch phases emit commands through. Emission must not block;
/// adapters queue or record.
pub trait CommandSink: Send {
    fn emit(&mut self, command: DispatchCommand);
}
