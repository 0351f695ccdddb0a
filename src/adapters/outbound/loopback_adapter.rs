use crate::application::DispatcherHandle;
use crate::common::ApplicationError;
use crate::domains::fleet::{DispatchCommand, ProcState, VehicleUpdate};
use std::time::Duration;
use tokio::sync::mpsc;

/// Simulated vehicles and peripherals: every command completes after
/// `delay` and is reported back through the dispatcher handle.
pub struct LoopbackVehicleAdapter {
    commands: mpsc::UnboundedReceiver<DispatchCommand>,
    handle: DispatcherHandle,
    delay: Duration,
}

impl LoopbackVehicleAdapter {
    pub fn new(
        commands: mpsc::UnboundedReceiver<DispatchCommand>,
        handle: DispatcherHandle,
        delay: Duration,
    ) -> Self {
        Self { commands, handle, delay }
    }

    /// Runs until the command channel closes or the executor goes away.
    pub async fn run(mut self) -> usize {
        let mut handled = 0;
        while let Some(command) = self.commands.recv().await {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            let result = match &command {
                DispatchCommand::Drive { vehicle_id, destination, .. } => {
                    self.handle
                        .update_vehicle(
                            VehicleUpdate::new(vehicle_id.as_str())
                                .state(ProcState::AwaitingOrder)
                                .arrived_at(destination.as_str(), None),
                        )
                        .await
                }
                DispatchCommand::Park { vehicle_id, location } => {
                    self.handle
                        .update_vehicle(
                            VehicleUpdate::new(vehicle_id.as_str())
                                .state(ProcState::Idle)
                                .arrived_at(location.as_str(), None),
                        )
                        .await
                }
                DispatchCommand::Recharge { vehicle_id, location } => {
                    self.handle
                        .update_vehicle(
                            VehicleUpdate::new(vehicle_id.as_str())
                                .state(ProcState::Idle)
                                .energy(100)
                                .arrived_at(location.as_str(), None),
                        )
                        .await
                }
                DispatchCommand::TriggerPeripheralJob { job_id, .. } => {
                    match self.handle.snapshot().await {
                        Ok(fleet) => match fleet.peripheral_job(job_id) {
                            Some(job) => self.handle.peripheral_job_finished(job.clone()).await,
                            None => Ok(()),
                        },
                        Err(e) => Err(e),
                    }
                }
            };
            match result {
                Ok(()) => handled += 1,
                Err(ApplicationError::ExecutorUnavailable(reason)) => {
                    tracing::debug!("Loopback adapter stopping: {}", reason);
                    break;
                }
                Err(e) => tracing::warn!("Report for {:?} rejected: {}", command, e),
            }
        }
        handled
    }
}
