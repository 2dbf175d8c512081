//! Per-context call-cycle state

/// Call-cycle state of one client stub
///
/// Synchronous calls cycle `Idle → AwaitingReply → Idle`; asynchronous
/// calls return to `Idle` immediately after send. `Broken` is terminal,
/// entered from any state when the channel closes or a call times out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallState {
    /// No call in flight
    Idle,
    /// A synchronous call awaits its correlated reply
    AwaitingReply,
    /// Channel failure; no further calls accepted
    Broken,
}

impl CallState {
    /// Checks whether new calls are accepted
    pub fn accepts_calls(&self) -> bool {
        matches!(self, CallState::Idle)
    }

    /// Checks whether the context is terminally broken
    pub fn is_broken(&self) -> bool {
        matches!(self, CallState::Broken)
    }
}
