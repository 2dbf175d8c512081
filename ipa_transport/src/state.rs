//! Transport channel lifecycle states

/// Lifecycle of a transport channel
///
/// `Closed` is terminal; a channel never reopens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    /// Channel constructed, no message exchanged yet
    Open,
    /// At least one message has been exchanged
    Active,
    /// Graceful shutdown requested, draining
    Closing,
    /// Transport severed or shut down
    Closed,
}

impl ChannelState {
    /// Checks whether the channel can still carry messages
    pub fn is_usable(&self) -> bool {
        matches!(self, ChannelState::Open | ChannelState::Active)
    }

    /// Checks whether the channel is terminally closed
    pub fn is_closed(&self) -> bool {
        matches!(self, ChannelState::Closed)
    }
}
