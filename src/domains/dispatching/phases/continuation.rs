use crate::common::{DomainError, DomainResult};
use crate::domains::dispatching::phase::{phase_lifecycle, DispatchContext, Lifecycle, Phase};
use crate::domains::fleet::{
    DispatchCommand, FailureReason, OrderState, PeripheralJobState, ProcState,
};

/// What happened when an order was pushed forward by one step.
#[derive(Debug, Clone, PartialEq)]
pub enum Advance {
    /// The gating peripheral job was triggered; the vehicle waits for it.
    JobTriggered(String),
    /// The next step waits for a peripheral job already in progress.
    Waiting,
    StepIssued(usize),
    Finished,
    Failed,
}

/// Push a BEING_PROCESSED order forward: trigger its gating job, issue its
/// next drive step, or finish it when no steps remain.
pub fn advance_order(ctx: &mut DispatchContext<'_>, order_id: &str) -> DomainResult<Advance> {
    let order = ctx.fleet.require_order(order_id)?;
    let vehicle_id = order
        .vehicle
        .clone()
        .ok_or_else(|| DomainError::invalid(format!("Order {} has no vehicle", order_id)))?;
    let step_index = order.next_step;
    let Some(step) = order.next_drive_step().cloned() else {
        ctx.fleet.finish_order(order_id)?;
        tracing::info!("Order {} finished by vehicle {}", order_id, vehicle_id);
        return Ok(Advance::Finished);
    };

    if let Some(job_id) = &step.peripheral_job {
        let Some(job) = ctx.fleet.peripheral_job(job_id) else {
            tracing::debug!("Order {} waits for unknown peripheral job {}", order_id, job_id);
            return Ok(Advance::Waiting);
        };
        match job.state {
            PeripheralJobState::Failed if job.operation.completion_required => {
                ctx.fleet.fail_order(
                    order_id,
                    FailureReason::PeripheralJobFailed { job_id: job_id.clone() },
                )?;
                return Ok(Advance::Failed);
            }
            PeripheralJobState::Pending if job.blocks_gated_step() => {
                let command = DispatchCommand::TriggerPeripheralJob {
                    job_id: job.id.clone(),
                    location: job.operation.location.clone(),
                    operation: job.operation.operation.clone(),
                };
                ctx.fleet.trigger_peripheral_job(job_id)?;
                ctx.commands.emit(command);
                tracing::info!("Triggered peripheral job {} for order {}", job_id, order_id);
                return Ok(Advance::JobTriggered(job_id.clone()));
            }
            _ if job.blocks_gated_step() => return Ok(Advance::Waiting),
            PeripheralJobState::Pending => {
                // Completion not required: start the job and drive on.
                let command = DispatchCommand::TriggerPeripheralJob {
                    job_id: job.id.clone(),
                    location: job.operation.location.clone(),
                    operation: job.operation.operation.clone(),
                };
                ctx.fleet.trigger_peripheral_job(job_id)?;
                ctx.commands.emit(command);
            }
            _ => {}
        }
    }

    ctx.fleet.record_drive_step(order_id)?;
    ctx.commands.emit(DispatchCommand::Drive {
        vehicle_id: vehicle_id.clone(),
        order_id: order_id.to_string(),
        step_index,
        destination: step.destination.clone(),
        operation: step.operation.clone(),
    });
    tracing::debug!(
        "Issued step {} of order {} to vehicle {} ({})",
        step_index,
        order_id,
        vehicle_id,
        step.destination
    );
    Ok(Advance::StepIssued(step_index))
}

/// Continues orders whose vehicle finished its previous step.
#[derive(Debug, Default)]
pub struct AssignNextDriveOrdersPhase {
    lifecycle: Lifecycle,
}

impl AssignNextDriveOrdersPhase {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Phase for AssignNextDriveOrdersPhase {
    phase_lifecycle!("assign_next_drive_orders");

    fn run(&mut self, ctx: &mut DispatchContext<'_>) {
        if !self.lifecycle.ensure_runnable(self.name()) {
            return;
        }
        let waiting = ctx
            .fleet
            .vehicle_ids_where(|v| v.state == ProcState::AwaitingOrder && v.order.is_some());
        for vehicle_id in waiting {
            let Some((order_id, state)) = ctx
                .fleet
                .vehicle(&vehicle_id)
                .and_then(|v| v.order.as_deref())
                .and_then(|id| ctx.fleet.order(id))
                .map(|o| (o.id.clone(), o.state.clone()))
            else {
                continue;
            };
            let result = match state {
                OrderState::BeingProcessed => advance_order(ctx, &order_id).map(|_| ()),
                OrderState::Failed(_) | OrderState::Finished => {
                    ctx.fleet.release_vehicle(&vehicle_id).map(|()| {
                        tracing::info!("Vehicle {} released from order {}", vehicle_id, order_id)
                    })
                }
                _ => Ok(()),
            };
            if let Err(e) = result {
                tracing::warn!(
                    "Could not continue order {} on vehicle {}: {}",
                    order_id,
                    vehicle_id,
                    e
                );
            }
        }
    }
}

/// Hands sequence-bound vehicles the next member of their sequence and
/// finishes sequences that have run out of members.
#[derive(Debug, Default)]
pub struct AssignSequenceSuccessorsPhase {
    lifecycle: Lifecycle,
}

impl AssignSequenceSuccessorsPhase {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Phase for AssignSequenceSuccessorsPhase {
    phase_lifecycle!("assign_sequence_successors");

    fn run(&mut self, ctx: &mut DispatchContext<'_>) {
        if !self.lifecycle.ensure_runnable(self.name()) {
            return;
        }
        let bound = ctx.fleet.vehicle_ids_where(|v| {
            v.state == ProcState::Idle && v.order.is_none() && v.sequence.is_some()
        });
        for vehicle_id in bound {
            let Some(sequence_id) = ctx.fleet.vehicle(&vehicle_id).and_then(|v| v.sequence.clone())
            else {
                continue;
            };
            let next = ctx
                .fleet
                .sequence_next_order(&sequence_id)
                .map(|o| (o.id.clone(), o.state.clone()));
            let result = match next {
                Some((order_id, OrderState::Dispatchable)) => ctx
                    .fleet
                    .assign_order(&order_id, &vehicle_id)
                    .and_then(|()| advance_order(ctx, &order_id))
                    .map(|_| {
                        tracing::info!(
                            "Assigned sequence successor {} to vehicle {}",
                            order_id,
                            vehicle_id
                        )
                    }),
                Some(_) if ctx.fleet.sequence_blocked(&sequence_id) => {
                    ctx.fleet.release_sequence(&sequence_id).map(|()| {
                        tracing::warn!(
                            "Order sequence {} blocked by a failed member; vehicle {} released",
                            sequence_id,
                            vehicle_id
                        )
                    })
                }
                Some(_) => Ok(()),
                None if ctx.fleet.sequence(&sequence_id).is_some_and(|s| s.complete) => {
                    ctx.fleet.finish_sequence(&sequence_id).map(|()| {
                        tracing::info!("Order sequence {} finished", sequence_id)
                    })
                }
                None => Ok(()),
            };
            if let Err(e) = result {
                tracing::warn!("Sequence {} on vehicle {}: {}", sequence_id, vehicle_id, e);
            }
        }

        // Complete sequences that never got a vehicle, e.g. all members withdrawn.
        let orphaned: Vec<String> = ctx
            .fleet
            .sequences()
            .filter(|s| s.complete && !s.finished && s.vehicle.is_none())
            .map(|s| s.id.clone())
            .collect();
        for sequence_id in orphaned {
            if ctx.fleet.sequence_next_order(&sequence_id).is_none() {
                if let Err(e) = ctx.fleet.finish_sequence(&sequence_id) {
                    tracing::warn!("Could not finish sequence {}: {}", sequence_id, e);
                }
            }
        }
    }
}
