use tokio::sync::mpsc::UnboundedSender;

use crate::JobEvent;

pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: JobEvent);
}

/// Forwards events to a channel; a closed receiver drops them.
pub struct ChannelProgressSink {
    tx: UnboundedSender<JobEvent>,
}

impl ChannelProgressSink {
    pub fn new(tx: UnboundedSender<JobEvent>) -> Self {
        Self { tx }
    }
}

impl ProgressSink for ChannelProgressSink {
    fn emit(&self, event: JobEvent) {
        let _ = self.tx.send(event);
    }
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn emit(&self, _event: JobEvent) {}
}
