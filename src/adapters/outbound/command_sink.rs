use crate::domains::fleet::{CommandSink, DispatchCommand};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// Keeps every emitted command. Clones share the same record, so a test can
/// hand one clone to the executor and inspect the other.
#[derive(Debug, Default, Clone)]
pub struct RecordingCommandSink {
    commands: Arc<Mutex<Vec<DispatchCommand>>>,
}

impl RecordingCommandSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> Vec<DispatchCommand> {
        self.commands
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Remove and return everything recorded so far.
    pub fn drain(&self) -> Vec<DispatchCommand> {
        std::mem::take(
            &mut *self
                .commands
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner()),
        )
    }
}

impl CommandSink for RecordingCommandSink {
    fn emit(&mut self, command: DispatchCommand) {
        self.commands
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(command);
    }
}

/// Forwards commands to an unbounded channel; never blocks the executor.
#[derive(Debug, Clone)]
pub struct ChannelCommandSink {
    sender: mpsc::UnboundedSender<DispatchCommand>,
}

impl ChannelCommandSink {
    pub fn new(sender: mpsc::UnboundedSender<DispatchCommand>) -> Self {
        Self { sender }
    }

    pub fn channel() -> (Self, mpsc::UnboundedReceiver<DispatchCommand>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self::new(sender), receiver)
    }
}

impl CommandSink for ChannelCommandSink {
    fn emit(&mut self, command: DispatchCommand) {
        if let Err(e) = self.sender.send(command) {
            tracing::warn!("Command receiver gone, dropping {:?}", e.0);
        }
    }
}
