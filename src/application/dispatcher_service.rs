// Kernel executor: the single task that owns the fleet state.
use crate::common::{
    ApplicationError, ApplicationResult, DomainEvent, DomainResult, EventEnvelope, EventMetadata,
    EventStore,
};
use crate::config::Config;
use crate::domains::dispatching::{DispatchContext, DispatchPipeline, Phase, PeripheralJobCallback};
use crate::domains::fleet::{
    CommandSink, DispatchOverview, FleetState, Location, OrderSequence, PeripheralJob,
    TransportOrder, Vehicle, VehicleUpdate,
};
use crate::domains::logger::DynLogger;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{interval, Interval, MissedTickBehavior};
use uuid::Uuid;

const AGGREGATE_TYPE: &str = "FleetState";

/// A change requested from outside the executor.
#[derive(Debug, Clone)]
pub enum FleetMutation {
    RegisterLocation(Location),
    RegisterVehicle(Vehicle),
    CreateOrder(TransportOrder),
    CreateSequence(OrderSequence),
    CompleteSequence(String),
    RegisterPeripheralJob(PeripheralJob),
    WithdrawOrder(String),
    UpdateVehicle(VehicleUpdate),
    PeripheralJobFinished(PeripheralJob),
    PeripheralJobFailed(PeripheralJob),
}

impl FleetMutation {
    fn apply(self, fleet: &mut FleetState) -> DomainResult<()> {
        match self {
            FleetMutation::RegisterLocation(location) => fleet.register_location(location),
            FleetMutation::RegisterVehicle(vehicle) => fleet.register_vehicle(vehicle),
            FleetMutation::CreateOrder(order) => fleet.create_order(order),
            FleetMutation::CreateSequence(sequence) => fleet.create_sequence(sequence),
            FleetMutation::CompleteSequence(id) => fleet.complete_sequence(&id),
            FleetMutation::RegisterPeripheralJob(job) => fleet.register_peripheral_job(job),
            FleetMutation::WithdrawOrder(id) => fleet.request_withdrawal(&id),
            FleetMutation::UpdateVehicle(update) => fleet.update_vehicle(update),
            FleetMutation::PeripheralJobFinished(job) => fleet.peripheral_job_finished(&job),
            FleetMutation::PeripheralJobFailed(job) => fleet.peripheral_job_failed(&job),
        }
    }

    fn describe(&self) -> String {
        match self {
            FleetMutation::RegisterLocation(l) => format!("location registration {}", l.name),
            FleetMutation::RegisterVehicle(v) => format!("vehicle registration {}", v.id),
            FleetMutation::CreateOrder(o) => format!("order {}", o.id),
            FleetMutation::CreateSequence(s) => format!("order sequence {}", s.id),
            FleetMutation::CompleteSequence(id) => format!("completion of sequence {}", id),
            FleetMutation::RegisterPeripheralJob(j) => format!("peripheral job {}", j.id),
            FleetMutation::WithdrawOrder(id) => format!("withdrawal of order {}", id),
            FleetMutation::UpdateVehicle(u) => format!("update of vehicle {}", u.vehicle_id),
            FleetMutation::PeripheralJobFinished(j) => format!("finish report of job {}", j.id),
            FleetMutation::PeripheralJobFailed(j) => format!("failure report of job {}", j.id),
        }
    }
}

#[derive(Debug)]
pub enum KernelMessage {
    Mutate {
        mutation: FleetMutation,
        reply: oneshot::Sender<DomainResult<()>>,
    },
    Dispatch {
        reply: oneshot::Sender<u64>,
    },
    Overview {
        reply: oneshot::Sender<DispatchOverview>,
    },
    Snapshot {
        reply: oneshot::Sender<FleetState>,
    },
    Shutdown,
}

/// Cloneable entry point to the kernel executor. Every call is marshalled
/// onto the executor's queue and answered once it was handled.
#[derive(Debug, Clone)]
pub struct DispatcherHandle {
    sender: mpsc::Sender<KernelMessage>,
}

impl DispatcherHandle {
    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> KernelMessage,
    ) -> ApplicationResult<T> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(make(reply))
            .await
            .map_err(|e| ApplicationError::ExecutorUnavailable(format!("send failed: {}", e)))?;
        response
            .await
            .map_err(|e| ApplicationError::ExecutorUnavailable(format!("no reply: {}", e)))
    }

    pub async fn mutate(&self, mutation: FleetMutation) -> ApplicationResult<()> {
        self.request(|reply| KernelMessage::Mutate { mutation, reply })
            .await?
            .map_err(ApplicationError::from)
    }

    pub async fn register_location(&self, location: Location) -> ApplicationResult<()> {
        self.mutate(FleetMutation::RegisterLocation(location)).await
    }

    pub async fn register_vehicle(&self, vehicle: Vehicle) -> ApplicationResult<()> {
        self.mutate(FleetMutation::RegisterVehicle(vehicle)).await
    }

    pub async fn create_order(&self, order: TransportOrder) -> ApplicationResult<()> {
        self.mutate(FleetMutation::CreateOrder(order)).await
    }

    pub async fn create_sequence(&self, sequence: OrderSequence) -> ApplicationResult<()> {
        self.mutate(FleetMutation::CreateSequence(sequence)).await
    }

    pub async fn complete_sequence(&self, sequence_id: &str) -> ApplicationResult<()> {
        self.mutate(FleetMutation::CompleteSequence(sequence_id.to_string())).await
    }

    pub async fn register_peripheral_job(&self, job: PeripheralJob) -> ApplicationResult<()> {
        self.mutate(FleetMutation::RegisterPeripheralJob(job)).await
    }

    pub async fn withdraw_order(&self, order_id: &str) -> ApplicationResult<()> {
        self.mutate(FleetMutation::WithdrawOrder(order_id.to_string())).await
    }

    pub async fn update_vehicle(&self, update: VehicleUpdate) -> ApplicationResult<()> {
        self.mutate(FleetMutation::UpdateVehicle(update)).await
    }

    pub async fn peripheral_job_finished(&self, job: PeripheralJob) -> ApplicationResult<()> {
        self.mutate(FleetMutation::PeripheralJobFinished(job)).await
    }

    pub async fn peripheral_job_failed(&self, job: PeripheralJob) -> ApplicationResult<()> {
        self.mutate(FleetMutation::PeripheralJobFailed(job)).await
    }

    /// Run one dispatch cycle now; returns the number of cycles run so far.
    pub async fn dispatch(&self) -> ApplicationResult<u64> {
        self.request(|reply| KernelMessage::Dispatch { reply }).await
    }

    pub async fn overview(&self) -> ApplicationResult<DispatchOverview> {
        self.request(|reply| KernelMessage::Overview { reply }).await
    }

    /// Copy of the fleet state as seen by the executor.
    pub async fn snapshot(&self) -> ApplicationResult<FleetState> {
        self.request(|reply| KernelMessage::Snapshot { reply }).await
    }

    pub async fn shutdown(&self) -> ApplicationResult<()> {
        self.sender
            .send(KernelMessage::Shutdown)
            .await
            .map_err(|e| ApplicationError::ExecutorUnavailable(format!("send failed: {}", e)))
    }
}

enum Wakeup {
    Message(Option<KernelMessage>),
    Tick,
}

/// Owns the fleet state and the dispatch pipeline and processes one message
/// at a time, so dispatch cycles and callbacks never interleave.
pub struct KernelExecutor {
    fleet: FleetState,
    pipeline: DispatchPipeline,
    commands: Box<dyn CommandSink>,
    event_store: Arc<dyn EventStore + Send + Sync>,
    logger: DynLogger,
    overview: DispatchOverview,
    receiver: mpsc::Receiver<KernelMessage>,
    config: Config,
    journal_version: u64,
    /// Envelopes not yet accepted by the event store, oldest first.
    unjournaled: Vec<EventEnvelope>,
}

impl KernelExecutor {
    pub fn new(
        config: Config,
        commands: Box<dyn CommandSink>,
        event_store: Arc<dyn EventStore + Send + Sync>,
        logger: DynLogger,
    ) -> (Self, DispatcherHandle) {
        let (sender, receiver) = mpsc::channel(config.executor.channel_capacity.max(1));
        let fleet_id = config.executor.fleet_id.clone();
        let executor = Self {
            fleet: FleetState::new(fleet_id.clone()),
            pipeline: DispatchPipeline::new(&config.dispatcher),
            commands,
            event_store,
            logger,
            overview: DispatchOverview::new(fleet_id),
            receiver,
            config,
            journal_version: 0,
            unjournaled: Vec::new(),
        };
        (executor, DispatcherHandle { sender })
    }

    /// Replace the default pipeline, e.g. with custom hook phases.
    pub fn with_pipeline(mut self, pipeline: DispatchPipeline) -> Self {
        self.pipeline = pipeline;
        self
    }

    pub fn spawn(self) -> JoinHandle<FleetState> {
        tokio::spawn(self.run())
    }

    /// Process messages until shutdown or until every handle is dropped.
    /// Returns the final fleet state.
    pub async fn run(mut self) -> FleetState {
        self.pipeline.initialize();
        self.logger.info(&format!(
            "Kernel executor for fleet {} started ({} phases)",
            self.fleet.id,
            self.pipeline.phase_names().len()
        ));
        let mut ticker = self.config.executor.dispatch_interval().map(|period| {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            ticker
        });

        loop {
            let wakeup = tokio::select! {
                message = self.receiver.recv() => Wakeup::Message(message),
                _ = next_tick(&mut ticker) => Wakeup::Tick,
            };
            match wakeup {
                Wakeup::Message(None) | Wakeup::Message(Some(KernelMessage::Shutdown)) => break,
                Wakeup::Message(Some(message)) => self.handle(message).await,
                Wakeup::Tick => {
                    self.run_cycle();
                    self.journal(Uuid::new_v4(), true).await;
                }
            }
        }

        self.pipeline.terminate();
        self.logger.info(&format!(
            "Kernel executor for fleet {} stopped after {} dispatch cycles",
            self.fleet.id,
            self.pipeline.cycles()
        ));
        self.fleet
    }

    async fn handle(&mut self, message: KernelMessage) {
        let correlation_id = Uuid::new_v4();
        match message {
            KernelMessage::Mutate { mutation, reply } => {
                let description = mutation.describe();
                let result = mutation.apply(&mut self.fleet);
                let dispatched = match &result {
                    Ok(()) => {
                        tracing::debug!("Accepted {}", description);
                        if self.config.executor.dispatch_on_change {
                            self.run_cycle();
                            true
                        } else {
                            false
                        }
                    }
                    Err(e) => {
                        tracing::warn!("Rejected {}: {}", description, e);
                        self.logger.warn(&format!("Rejected {}: {}", description, e));
                        false
                    }
                };
                self.journal(correlation_id, dispatched).await;
                let _ = reply.send(result);
            }
            KernelMessage::Dispatch { reply } => {
                self.run_cycle();
                self.journal(correlation_id, true).await;
                let _ = reply.send(self.pipeline.cycles());
            }
            KernelMessage::Overview { reply } => {
                let _ = reply.send(self.overview.clone());
            }
            KernelMessage::Snapshot { reply } => {
                let _ = reply.send(self.fleet.clone());
            }
            KernelMessage::Shutdown => {}
        }
    }

    fn run_cycle(&mut self) {
        let mut ctx = DispatchContext::new(&mut self.fleet, &mut *self.commands);
        self.pipeline.run(&mut ctx);
        self.overview.record_cycle();
    }

    /// Append the events recorded since the last call to the event store and
    /// feed them to the overview projection. Envelopes the store rejects are
    /// kept and appended ahead of the next batch.
    async fn journal(&mut self, correlation_id: Uuid, dispatched: bool) {
        let events = self.fleet.take_uncommitted_events();
        if events.is_empty() && self.unjournaled.is_empty() {
            return;
        }
        let metadata = EventMetadata {
            correlation_id: Some(correlation_id),
            dispatch_cycle: dispatched.then(|| self.pipeline.cycles()),
            source: "kernel-executor".to_string(),
        };
        for event in &events {
            self.overview.apply_event(event);
            match EventEnvelope::new(event, AGGREGATE_TYPE, metadata.clone()) {
                Ok(envelope) => self.unjournaled.push(envelope),
                Err(e) => self.logger.error(&format!(
                    "Could not serialize {} event: {}",
                    event.event_type(),
                    e
                )),
            }
        }
        if self.unjournaled.is_empty() {
            return;
        }

        if let Err(first) = self.append_unjournaled().await {
            tracing::warn!("Journal append failed, retrying: {}", first);
            // Re-sync with the stream, then retry once.
            let stream_id = self.fleet.id.clone();
            if let Ok(existing) = self.event_store.load_events(&stream_id, 0).await {
                self.journal_version = existing.len() as u64;
            }
            if let Err(e) = self.append_unjournaled().await {
                tracing::error!("Journal append failed: {}", e);
                self.logger.error(&format!(
                    "Journal append failed, {} events held back: {}",
                    self.unjournaled.len(),
                    e
                ));
            }
        }
    }

    async fn append_unjournaled(&mut self) -> Result<(), String> {
        let count = self.unjournaled.len() as u64;
        self.event_store
            .append_events(&self.fleet.id, self.journal_version, self.unjournaled.clone())
            .await?;
        self.journal_version += count;
        self.unjournaled.clear();
        Ok(())
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}
