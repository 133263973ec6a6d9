//! Self-healing push channel for real-time dashboard updates
//!
//! [`UpdateChannel`] owns at most one transport at a time, reconnects on a
//! fixed interval after any failure or close, and fans decoded messages out
//! to subscribers in registration order.
//!
//! ## Lifecycle
//! - `Idle --connect--> Connecting --opened--> Open`
//! - `Connecting | Open --error/close--> ReconnectPending --timer--> Connecting`
//! - `any --disconnect--> Closed` (no further reconnection until `connect`)
//!
//! ## Example
//! ```no_run
//! use incident_copilot::channel::UpdateChannel;
//!
//! # async fn example() -> Result<(), url::ParseError> {
//! let channel = UpdateChannel::new();
//! let _subscription = channel.subscribe(|msg| {
//!     if let Some(id) = msg.incident_id() {
//!         println!("incident {} changed", id);
//!     }
//! });
//! channel.connect("ws://localhost:8000/ws".parse()?);
//! # Ok(())
//! # }
//! ```

pub mod message;
pub mod registry;
pub mod state;
pub mod transport;
pub mod websocket;

use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::{Mutex, ReentrantMutex};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use url::Url;

pub use message::{DecodeError, UpdateMessage, INCIDENT_ID_FIELD};
pub use registry::{Handler, SubscriberRegistry, Subscription, SubscriptionId};
pub use state::ChannelState;
pub use transport::{Connector, EventSink, Transport, TransportEvent};
pub use websocket::WsConnector;

use transport::EventTarget;

/// Delay between a close/error event and the next connection attempt
pub const DEFAULT_RECONNECT_INTERVAL: Duration = Duration::from_millis(5000);

/// Armed single-shot reconnect
struct ReconnectTimer {
    id: u64,
    task: JoinHandle<()>,
}

/// Connection resources, owned exclusively by the channel
struct Link {
    state: ChannelState,
    address: Option<Url>,
    transport: Option<Box<dyn Transport>>,
    reconnect: Option<ReconnectTimer>,
    /// Generation of the current transport attempt
    attempt: u64,
    timer_seq: u64,
}

impl Link {
    fn new() -> Self {
        Self {
            state: ChannelState::Idle,
            address: None,
            transport: None,
            reconnect: None,
            attempt: 0,
            timer_seq: 0,
        }
    }

    fn cancel_reconnect(&mut self) {
        if let Some(timer) = self.reconnect.take() {
            timer.task.abort();
        }
    }

    fn close_transport(&mut self) {
        if let Some(mut transport) = self.transport.take() {
            transport.close();
        }
    }

    /// Drop every resource and invalidate events from the current attempt
    fn teardown(&mut self) {
        self.cancel_reconnect();
        self.close_transport();
        self.attempt += 1;
    }
}

struct Shared {
    me: Weak<Shared>,
    connector: Box<dyn Connector>,
    reconnect_interval: Duration,
    runtime: Handle,
    link: Mutex<Link>,
    subscribers: Arc<SubscriberRegistry>,
    /// Held while handlers run; `disconnect` takes it to wait out a dispatch
    dispatch_gate: ReentrantMutex<()>,
}

impl Shared {
    fn event_sink(&self, attempt: u64) -> EventSink {
        let target: Weak<dyn EventTarget> = self.me.clone();
        EventSink::new(target, attempt)
    }

    /// Open a new transport to the stored address
    fn start_attempt(&self, link: &mut Link) {
        let Some(address) = link.address.clone() else {
            return;
        };

        link.attempt += 1;
        link.state = ChannelState::Connecting;
        log::info!("[UpdateChannel] Connecting to {} (attempt {})", address, link.attempt);

        let sink = self.event_sink(link.attempt);
        let _runtime = self.runtime.enter();
        link.transport = Some(self.connector.open(&address, sink));
    }

    /// Arm the reconnect timer unless one is already outstanding
    fn schedule_reconnect(&self, link: &mut Link) {
        link.state = ChannelState::ReconnectPending;

        if link.reconnect.is_some() {
            log::debug!("[UpdateChannel] Reconnect already scheduled");
            return;
        }

        link.timer_seq += 1;
        let id = link.timer_seq;
        let delay = self.reconnect_interval;
        let shared = self.me.clone();

        let task = self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(shared) = shared.upgrade() {
                shared.on_reconnect_timer(id);
            }
        });

        log::info!("[UpdateChannel] Reconnecting in {:?}", delay);
        link.reconnect = Some(ReconnectTimer { id, task });
    }

    fn on_reconnect_timer(&self, id: u64) {
        let mut link = self.link.lock();

        match &link.reconnect {
            Some(timer) if timer.id == id => {}
            _ => return, // cancelled or superseded
        }
        link.reconnect = None;

        if link.state != ChannelState::ReconnectPending {
            return;
        }

        log::info!("[UpdateChannel] Attempting to reconnect...");
        self.start_attempt(&mut link);
    }

    fn on_transport_down(&self, attempt: u64, reason: Option<&str>) {
        let mut link = self.link.lock();
        if link.attempt != attempt || !link.state.is_active() {
            return;
        }

        match reason {
            Some(reason) => log::warn!("[UpdateChannel] Transport error: {}", reason),
            None => log::info!("[UpdateChannel] Disconnected"),
        }

        link.close_transport();
        self.schedule_reconnect(&mut link);
    }

    fn on_opened(&self, attempt: u64) {
        let mut link = self.link.lock();
        if link.attempt != attempt || link.state != ChannelState::Connecting {
            return;
        }

        link.cancel_reconnect();
        link.state = ChannelState::Open;
        if let Some(address) = &link.address {
            log::info!("[UpdateChannel] Connected to {}", address);
        }
    }

    fn dispatch(&self, attempt: u64, text: &str) {
        let _gate = self.dispatch_gate.lock();

        {
            let link = self.link.lock();
            if link.attempt != attempt || link.state != ChannelState::Open {
                return;
            }
        }

        let message = match UpdateMessage::decode(text) {
            Ok(message) => message,
            Err(e) => {
                log::warn!("[UpdateChannel] Failed to parse message: {}", e);
                return;
            }
        };

        for handler in self.subscribers.snapshot() {
            let delivered = panic::catch_unwind(AssertUnwindSafe(|| handler(&message)));
            if delivered.is_err() {
                log::error!("[UpdateChannel] Subscriber panicked while handling a message");
            }
        }
    }
}

impl EventTarget for Shared {
    fn on_transport_event(&self, attempt: u64, event: TransportEvent) {
        match event {
            TransportEvent::Opened => self.on_opened(attempt),
            TransportEvent::Message(text) => self.dispatch(attempt, &text),
            TransportEvent::Error(reason) => self.on_transport_down(attempt, Some(&reason)),
            TransportEvent::Closed => self.on_transport_down(attempt, None),
        }
    }
}

/// Resilient push-update channel
///
/// Cloning yields another handle to the same channel. None of the public
/// operations fail or block.
#[derive(Clone)]
pub struct UpdateChannel {
    shared: Arc<Shared>,
}

impl UpdateChannel {
    /// Channel using the WebSocket transport and the default interval
    ///
    /// # Panics
    /// Panics when called outside of a Tokio runtime.
    pub fn new() -> Self {
        Self::with_connector(WsConnector::new())
    }

    /// Channel using a custom transport
    ///
    /// # Panics
    /// Panics when called outside of a Tokio runtime.
    pub fn with_connector(connector: impl Connector) -> Self {
        Self::with_options(connector, DEFAULT_RECONNECT_INTERVAL, Handle::current())
    }

    /// Fully configured channel
    pub fn with_options(
        connector: impl Connector,
        reconnect_interval: Duration,
        runtime: Handle,
    ) -> Self {
        let shared = Arc::new_cyclic(|me| Shared {
            me: me.clone(),
            connector: Box::new(connector),
            reconnect_interval,
            runtime,
            link: Mutex::new(Link::new()),
            subscribers: Arc::new(SubscriberRegistry::new()),
            dispatch_gate: ReentrantMutex::new(()),
        });

        Self { shared }
    }

    /// Start (or restart) the connection loop for `address`
    ///
    /// A no-op while already connecting to or connected to the same address.
    pub fn connect(&self, address: Url) {
        let shared = &self.shared;
        let _gate = shared.dispatch_gate.lock();
        let mut link = shared.link.lock();

        if link.state.has_transport() && link.address.as_ref() == Some(&address) {
            log::debug!("[UpdateChannel] Already {} to {}", link.state, address);
            return;
        }

        link.teardown();
        link.address = Some(address);
        shared.start_attempt(&mut link);
    }

    /// Register a handler for every decoded message
    ///
    /// A handler that owns a clone of this channel keeps it alive forever;
    /// capture [`downgrade`](Self::downgrade) instead to call back into it.
    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&UpdateMessage) + Send + Sync + 'static,
    {
        self.shared.subscribers.subscribe(Arc::new(handler))
    }

    /// Stop the connection loop and release the transport
    ///
    /// Idempotent. Once this returns no message is being delivered, none will
    /// be delivered, and no reconnect attempt will happen.
    pub fn disconnect(&self) {
        let shared = &self.shared;
        let _gate = shared.dispatch_gate.lock();
        let mut link = shared.link.lock();

        if link.state.is_active() {
            log::info!("[UpdateChannel] Disconnecting");
        }

        link.teardown();
        link.address = None;
        link.state = ChannelState::Closed;
    }

    /// Handle that does not keep the channel alive
    pub fn downgrade(&self) -> WeakUpdateChannel {
        WeakUpdateChannel {
            shared: Arc::downgrade(&self.shared),
        }
    }

    pub fn state(&self) -> ChannelState {
        self.shared.link.lock().state
    }

    /// Address the loop is (re)connecting to
    pub fn address(&self) -> Option<Url> {
        self.shared.link.lock().address.clone()
    }

    pub fn subscriber_count(&self) -> usize {
        self.shared.subscribers.len()
    }

    pub fn has_pending_reconnect(&self) -> bool {
        self.shared.link.lock().reconnect.is_some()
    }

    pub fn reconnect_interval(&self) -> Duration {
        self.shared.reconnect_interval
    }
}

/// Non-owning reference to an [`UpdateChannel`]
#[derive(Clone)]
pub struct WeakUpdateChannel {
    shared: Weak<Shared>,
}

impl WeakUpdateChannel {
    /// The channel, if any strong handle still exists
    pub fn upgrade(&self) -> Option<UpdateChannel> {
        self.shared.upgrade().map(|shared| UpdateChannel { shared })
    }
}

impl std::fmt::Debug for WeakUpdateChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeakUpdateChannel")
            .field("alive", &(self.shared.strong_count() > 0))
            .finish()
    }
}

impl Default for UpdateChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for UpdateChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let link = self.shared.link.lock();
        f.debug_struct("UpdateChannel")
            .field("state", &link.state)
            .field("address", &link.address)
            .field("subscribers", &self.shared.subscribers.len())
            .finish()
    }
}
