use crate::domains::dispatching::phase::{phase_lifecycle, DispatchContext, Lifecycle, Phase};
use crate::domains::fleet::{OrderState, ProcState};

/// Completes withdrawals of orders whose vehicle has come to a stop.
#[derive(Debug, Default)]
pub struct FinishWithdrawalsPhase {
    lifecycle: Lifecycle,
}

impl FinishWithdrawalsPhase {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Phase for FinishWithdrawalsPhase {
    phase_lifecycle!("finish_withdrawals");

    fn run(&mut self, ctx: &mut DispatchContext<'_>) {
        if !self.lifecycle.ensure_runnable(self.name()) {
            return;
        }
        let fleet = &*ctx.fleet;
        let stopped = fleet.vehicle_ids_where(|v| {
            v.state == ProcState::AwaitingOrder
                && v.order
                    .as_deref()
                    .and_then(|id| fleet.order(id))
                    .is_some_and(|o| o.state == OrderState::Withdrawn)
        });
        for vehicle_id in stopped {
            match ctx.fleet.finalize_withdrawal(&vehicle_id) {
                Ok(order_id) => tracing::info!(
                    "Withdrawal of order {} from vehicle {} completed",
                    order_id,
                    vehicle_id
                ),
                Err(e) => {
                    tracing::warn!("Withdrawal for vehicle {} not completed: {}", vehicle_id, e)
                }
            }
        }
    }
}
