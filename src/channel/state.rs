//! Connection lifecycle states

use std::fmt;

/// Lifecycle state of an [`UpdateChannel`](super::UpdateChannel)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelState {
    /// Constructed, never connected
    Idle,
    /// A transport attempt is in flight
    Connecting,
    /// Transport is open and messages are being dispatched
    Open,
    /// Transport failed or closed; a reconnect timer is armed
    ReconnectPending,
    /// Explicitly disconnected; no automatic reconnection happens
    Closed,
}

impl ChannelState {
    /// Whether a transport is currently held (connecting or open)
    pub fn has_transport(&self) -> bool {
        matches!(self, ChannelState::Connecting | ChannelState::Open)
    }

    /// Whether the reconnect loop is running
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            ChannelState::Connecting | ChannelState::Open | ChannelState::ReconnectPending
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelState::Idle => "idle",
            ChannelState::Connecting => "connecting",
            ChannelState::Open => "open",
            ChannelState::ReconnectPending => "reconnect_pending",
            ChannelState::Closed => "closed",
        }
    }
}

impl Default for ChannelState {
    fn default() -> Self {
        ChannelState::Idle
    }
}

impl fmt::Display for ChannelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
