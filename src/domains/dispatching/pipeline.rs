use super::phase::{DispatchContext, Phase};
use super::phases::*;
use super::strategy::strategy_for;
use crate::config::DispatcherConfig;

/// The full dispatch cycle.
///
/// The top-level order is fixed: intake, withdrawals, next drive orders,
/// sequence successors, then the three hooks `assign_orders`,
/// `recharge_vehicles` and `park_vehicles`. Each hook is a list of phases
/// that can be replaced without touching the rest of the cycle.
pub struct DispatchPipeline {
    check_new_orders: Box<dyn Phase>,
    finish_withdrawals: Box<dyn Phase>,
    assign_next_drive_orders: Box<dyn Phase>,
    assign_sequence_successors: Box<dyn Phase>,
    assign_orders: Vec<Box<dyn Phase>>,
    recharge_vehicles: Vec<Box<dyn Phase>>,
    park_vehicles: Vec<Box<dyn Phase>>,
    initialized: bool,
    cycles: u64,
}

impl DispatchPipeline {
    /// Pipeline with the default phases for every hook.
    pub fn new(config: &DispatcherConfig) -> Self {
        Self {
            check_new_orders: Box::new(CheckNewOrdersPhase::new()),
            finish_withdrawals: Box::new(FinishWithdrawalsPhase::new()),
            assign_next_drive_orders: Box::new(AssignNextDriveOrdersPhase::new()),
            assign_sequence_successors: Box::new(AssignSequenceSuccessorsPhase::new()),
            assign_orders: vec![
                Box::new(AssignReservedOrdersPhase::new(config)),
                Box::new(AssignFreeOrdersPhase::new(
                    config,
                    strategy_for(config.assignment_strategy),
                )),
            ],
            recharge_vehicles: vec![Box::new(RechargeIdleVehiclesPhase::new(config))],
            park_vehicles: vec![
                Box::new(PrioritizedReparkPhase::new(config)),
                Box::new(PrioritizedParkingPhase::new(config)),
                Box::new(ParkIdleVehiclesPhase::new(config)),
            ],
            initialized: false,
            cycles: 0,
        }
    }

    pub fn with_assign_orders(mut self, phases: Vec<Box<dyn Phase>>) -> Self {
        self.set_assign_orders(phases);
        self
    }

    pub fn with_recharge_vehicles(mut self, phases: Vec<Box<dyn Phase>>) -> Self {
        self.set_recharge_vehicles(phases);
        self
    }

    pub fn with_park_vehicles(mut self, phases: Vec<Box<dyn Phase>>) -> Self {
        self.set_park_vehicles(phases);
        self
    }

    pub fn set_assign_orders(&mut self, phases: Vec<Box<dyn Phase>>) {
        let initialized = self.initialized;
        Self::replace_hook(&mut self.assign_orders, phases, initialized);
    }

    pub fn set_recharge_vehicles(&mut self, phases: Vec<Box<dyn Phase>>) {
        let initialized = self.initialized;
        Self::replace_hook(&mut self.recharge_vehicles, phases, initialized);
    }

    pub fn set_park_vehicles(&mut self, phases: Vec<Box<dyn Phase>>) {
        let initialized = self.initialized;
        Self::replace_hook(&mut self.park_vehicles, phases, initialized);
    }

    /// Swap a hook's phases, keeping their lifecycle in step with the pipeline.
    fn replace_hook(
        hook: &mut Vec<Box<dyn Phase>>,
        mut phases: Vec<Box<dyn Phase>>,
        initialized: bool,
    ) {
        if initialized {
            hook.iter_mut().for_each(|phase| phase.terminate());
            phases.iter_mut().for_each(|phase| phase.initialize());
        }
        *hook = phases;
    }

    pub fn phase_names(&self) -> Vec<&'static str> {
        self.phases().map(|phase| phase.name()).collect()
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    fn phases(&self) -> impl Iterator<Item = &Box<dyn Phase>> {
        [
            &self.check_new_orders,
            &self.finish_withdrawals,
            &self.assign_next_drive_orders,
            &self.assign_sequence_successors,
        ]
        .into_iter()
        .chain(self.assign_orders.iter())
        .chain(self.recharge_vehicles.iter())
        .chain(self.park_vehicles.iter())
    }

    fn phases_mut(&mut self) -> impl Iterator<Item = &mut Box<dyn Phase>> {
        [
            &mut self.check_new_orders,
            &mut self.finish_withdrawals,
            &mut self.assign_next_drive_orders,
            &mut self.assign_sequence_successors,
        ]
        .into_iter()
        .chain(self.assign_orders.iter_mut())
        .chain(self.recharge_vehicles.iter_mut())
        .chain(self.park_vehicles.iter_mut())
    }
}

impl Phase for DispatchPipeline {
    fn name(&self) -> &'static str {
        "dispatch_pipeline"
    }

    fn initialize(&mut self) {
        if self.initialized {
            return;
        }
        self.phases_mut().for_each(|phase| phase.initialize());
        self.initialized = true;
        tracing::debug!("Dispatch pipeline initialized: {:?}", self.phase_names());
    }

    fn terminate(&mut self) {
        if !self.initialized {
            return;
        }
        self.phases_mut().for_each(|phase| phase.terminate());
        self.initialized = false;
        tracing::debug!("Dispatch pipeline terminated after {} cycles", self.cycles);
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn run(&mut self, ctx: &mut DispatchContext<'_>) {
        debug_assert!(self.initialized, "dispatch pipeline run while not initialized");
        if !self.initialized {
            tracing::error!("Dispatch pipeline run while not initialized; skipping");
            return;
        }
        self.cycles += 1;
        tracing::debug!("Dispatch cycle {} started", self.cycles);
        for phase in self.phases_mut() {
            tracing::trace!("Running phase {}", phase.name());
            phase.run(ctx);
        }
        let violations = ctx.fleet.invariant_violations();
        debug_assert!(violations.is_empty(), "fleet invariants broken: {:?}", violations);
        for violation in &violations {
            tracing::error!("Fleet invariant broken after cycle {}: {}", self.cycles, violation);
        }
    }
}
