use crate::domains::fleet::{CommandSink, FleetState};

/// Everything a phase may touch during one run.
pub struct DispatchContext<'a> {
    pub fleet: &'a mut FleetState,
    pub commands: &'a mut dyn CommandSink,
}

impl<'a> DispatchContext<'a> {
    pub fn new(fleet: &'a mut FleetState, commands: &'a mut dyn CommandSink) -> Self {
        Self { fleet, commands }
    }
}

/// One step of the dispatch cycle.
///
/// `initialize` and `terminate` are idempotent. `run` performs one bounded
/// pass over the fleet state and never waits on I/O; commands go to the
/// context's sink. Running an uninitialized phase is a programming error.
pub trait Phase: Send {
    fn name(&self) -> &'static str;
    fn initialize(&mut self);
    fn terminate(&mut self);
    fn is_initialized(&self) -> bool;
    fn run(&mut self, ctx: &mut DispatchContext<'_>);
}

/// Initialization flag shared by the phase implementations.
#[derive(Debug, Default, Clone, Copy)]
pub struct Lifecycle {
    initialized: bool,
}

impl Lifecycle {
    pub fn initialize(&mut self) {
        self.initialized = true;
    }

    pub fn terminate(&mut self) {
        self.initialized = false;
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Whether `run` may proceed. Panics in debug builds when it may not.
    pub fn ensure_runnable(&self, phase: &str) -> bool {
        debug_assert!(self.initialized, "phase {} run while not initialized", phase);
        if !self.initialized {
            tracing::error!("Phase {} run while not initialized; skipping", phase);
        }
        self.initialized
    }
}

/// Implements the lifecycle half of [`Phase`] through a `lifecycle` field.
macro_rules! phase_lifecycle {
    ($name:expr) => {
        fn name(&self) -> &'static str {
            $name
        }

        fn initialize(&mut self) {
            self.lifecycle.initialize();
        }

        fn terminate(&mut self) {
            self.lifecycle.terminate();
        }

        fn is_initialized(&self) -> bool {
            self.lifecycle.is_initialized()
        }
    };
}

pub(crate) use phase_lifecycle;
