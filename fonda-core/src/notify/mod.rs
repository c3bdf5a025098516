//! Notification sink collaborator
//!
//! Fire-and-forget, best-effort. A sink failure is logged and swallowed;
//! it never fails the primary operation that emitted the event.

use parking_lot::Mutex;
use shared::order::event::{NotificationEvent, Priority};

pub trait NotificationSink: Send + Sync {
    fn notify(&self, event: NotificationEvent) -> anyhow::Result<()>;
}

/// Deliver an event, logging (not propagating) sink failures
pub(crate) fn emit(sink: &dyn NotificationSink, event: NotificationEvent) {
    let event_id = event.event_id.clone();
    if let Err(e) = sink.notify(event) {
        tracing::warn!(event_id = %event_id, error = %e, "notification sink failed, continuing");
    }
}

/// Sink that writes events to the tracing log
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn notify(&self, event: NotificationEvent) -> anyhow::Result<()> {
        match event.priority {
            Priority::High => tracing::warn!(
                order_id = %event.order_id,
                receipt = %event.receipt_number,
                audience = ?event.audience,
                payload = ?event.payload,
                "notification"
            ),
            Priority::Normal => tracing::info!(
                order_id = %event.order_id,
                receipt = %event.receipt_number,
                audience = ?event.audience,
                payload = ?event.payload,
                "notification"
            ),
        }
        Ok(())
    }
}

/// Sink that records events for test assertions
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<NotificationEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<NotificationEvent> {
        self.events.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl NotificationSink for RecordingSink {
    fn notify(&self, event: NotificationEvent) -> anyhow::Result<()> {
        self.events.lock().push(event);
        Ok(())
    }
}

/// Sink that always fails; used to verify best-effort semantics
#[cfg(test)]
pub(crate) struct FailingSink;

#[cfg(test)]
impl NotificationSink for FailingSink {
    fn notify(&self, _event: NotificationEvent) -> anyhow::Result<()> {
        anyhow::bail!("sink unavailable")
    }
}
