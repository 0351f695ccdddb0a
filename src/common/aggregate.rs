use crate::common::{DomainEvent, DomainResult};
use serde::{Deserialize, Serialize};

pub trait AggregateRoot: Send + Sync + Clone {
    type Event: DomainEvent + Serialize + for<'de> Deserialize<'de>;

    fn aggregate_id(&self) -> &str;
    fn version(&self) -> u64;

    /// Apply an event to update the aggregate state
    fn apply(&mut self, event: &Self::Event) -> DomainResult<()>;

    /// Get uncommitted events
    fn uncommitted_events(&self) -> &[Self::Event];

    /// Mark events as committed
    fn mark_events_as_committed(&mut self);

    /// Add a new event to the uncommitted events list
    fn add_event(&mut self, event: Self::Event);

    /// Record and apply in one step; the usual way command methods change state.
    fn record(&mut self, event: Self::Event) -> DomainResult<()> {
        self.apply(&event)?;
        self.add_event(event);
        Ok(())
    }

    /// Rebuild state by replaying previously recorded events.
    fn replay<I>(&mut self, events: I) -> DomainResult<()>
    where
        I: IntoIterator<Item = Self::Event>,
    {
        for event in events {
            self.apply(&event)?;
        }
        Ok(())
    }
}
