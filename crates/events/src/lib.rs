#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Event system for async communication in wallsync
//!
//! All observable output of the transfer client goes through events on an
//! unbounded channel; no direct logging or printing happens inside the
//! library. Every emission is also bridged to `tracing` at the event's
//! severity, so a subscriber sees structured logs without draining the
//! channel.

mod events;

pub use events::TransferEvent;

use tokio::sync::mpsc::UnboundedSender;

/// Type alias for the transfer event sender
pub type EventSender = UnboundedSender<TransferEvent>;

/// Type alias for the transfer event receiver
pub type EventReceiver = tokio::sync::mpsc::UnboundedReceiver<TransferEvent>;

/// Create a new event channel
#[must_use]
pub fn channel() -> (EventSender, EventReceiver) {
    tokio::sync::mpsc::unbounded_channel()
}

/// The unified trait for emitting events throughout the wallsync system
///
/// This trait provides a single, consistent API for emitting events
/// regardless of whether you have a raw `EventSender` or a struct that
/// contains one.
pub trait EventEmitter {
    /// Get the event sender for this emitter
    fn event_sender(&self) -> Option<&EventSender>;

    /// Emit an event through this emitter
    fn emit(&self, event: TransferEvent) {
        event.trace();
        if let Some(sender) = self.event_sender() {
            // Ignore send errors - if the receiver is dropped, we continue
            let _ = sender.send(event);
        }
    }

    /// Emit a debug message event
    fn emit_debug(&self, message: impl Into<String>) {
        self.emit(TransferEvent::Debug {
            message: message.into(),
        });
    }

    /// Emit a warning event
    fn emit_warning(&self, message: impl Into<String>) {
        self.emit(TransferEvent::Warning {
            message: message.into(),
        });
    }
}

/// Implementation of `EventEmitter` for the raw `EventSender`
/// This allows `EventSender` to be used directly where `EventEmitter` is expected
impl EventEmitter for EventSender {
    fn event_sender(&self) -> Option<&EventSender> {
        Some(self)
    }
}
