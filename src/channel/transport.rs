//! Transport seam between the channel and the network
//!
//! A [`Connector`] starts one connection attempt per call and reports what
//! happens to it through the [`EventSink`] it was given. The channel owns the
//! returned [`Transport`] and closes it on teardown.

use std::fmt;
use std::sync::Weak;

use url::Url;

/// Something that happened to a transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// Connection established
    Opened,
    /// One text frame received
    Message(String),
    /// Connect failure or mid-stream error
    Error(String),
    /// Remote closed the connection or the stream ended
    Closed,
}

/// Starts connection attempts
pub trait Connector: Send + Sync + 'static {
    /// Begin connecting to `address` without blocking.
    ///
    /// Events must be emitted asynchronously, never from inside `open`.
    fn open(&self, address: &Url, sink: EventSink) -> Box<dyn Transport>;
}

/// Handle to one live connection attempt
pub trait Transport: Send {
    /// Request shutdown. Must be idempotent.
    fn close(&mut self);
}

/// Receiver side of transport events, implemented by the channel
pub(crate) trait EventTarget: Send + Sync {
    fn on_transport_event(&self, attempt: u64, event: TransportEvent);
}

/// Reports events for one connection attempt back to its channel
///
/// Events from an attempt the channel has since replaced or torn down are
/// ignored, so a sink may outlive its transport safely.
#[derive(Clone)]
pub struct EventSink {
    target: Weak<dyn EventTarget>,
    attempt: u64,
}

impl EventSink {
    pub(crate) fn new(target: Weak<dyn EventTarget>, attempt: u64) -> Self {
        Self { target, attempt }
    }

    /// Generation number of the attempt this sink belongs to
    pub fn attempt(&self) -> u64 {
        self.attempt
    }

    /// Deliver an event. Does nothing once the channel is gone.
    pub fn emit(&self, event: TransportEvent) {
        if let Some(target) = self.target.upgrade() {
            target.on_transport_event(self.attempt, event);
        }
    }

    /// Whether the owning channel still exists
    pub fn is_attached(&self) -> bool {
        self.target.strong_count() > 0
    }
}

impl fmt::Debug for EventSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSink")
            .field("attempt", &self.attempt)
            .field("attached", &self.is_attached())
            .finish()
    }
}
