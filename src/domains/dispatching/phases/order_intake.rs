use crate::domains::dispatching::phase::{phase_lifecycle, DispatchContext, Lifecycle, Phase};
use crate::domains::fleet::OrderState;

/// Moves RAW orders whose dependencies and sequence predecessors are all
/// finished to DISPATCHABLE.
#[derive(Debug, Default)]
pub struct CheckNewOrdersPhase {
    lifecycle: Lifecycle,
}

impl CheckNewOrdersPhase {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Phase for CheckNewOrdersPhase {
    phase_lifecycle!("check_new_orders");

    fn run(&mut self, ctx: &mut DispatchContext<'_>) {
        if !self.lifecycle.ensure_runnable(self.name()) {
            return;
        }
        for order_id in ctx.fleet.order_ids_in_state(&OrderState::Raw) {
            let ready = ctx.fleet.order(&order_id).is_some_and(|order| {
                ctx.fleet.dependencies_finished(order)
                    && ctx.fleet.sequence_predecessors_done(order)
            });
            if !ready {
                continue;
            }
            match ctx.fleet.mark_dispatchable(&order_id) {
                Ok(()) => tracing::debug!("Order {} is dispatchable", order_id),
                Err(e) => tracing::warn!("Could not mark order {} dispatchable: {}", order_id, e),
            }
        }
    }
}
