//! Order workflow event types
//!
//! Notification events are the side-effect channel of the state machine:
//! every applied transition emits one, routed to the roles that care
//! about it. Delivery is fire-and-forget; the sink collaborator decides
//! transport (toast, push, kitchen screen).

pub mod event;

// Re-exports
pub use event::{NotificationEvent, NotificationPayload, Priority, Role};
