//! Channel abstraction and the in-memory channel pair

use crate::error::TransportError;
use crate::state::ChannelState;
use ipa_wire::WireMessage;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::time::Duration;

/// One endpoint of a bidirectional message channel
///
/// Exclusively owned by one side of the controller/module boundary; a
/// channel endpoint is never shared between contexts.
pub trait MessageChannel: Send {
    /// Enqueues a message for FIFO delivery to the peer
    fn send(&mut self, message: WireMessage) -> Result<(), TransportError>;

    /// Yields the next complete message, blocking until one is available
    /// or the channel closes
    fn receive(&mut self) -> Result<WireMessage, TransportError>;

    /// Like [`receive`](Self::receive), but gives up with
    /// [`TransportError::ReceiveTimeout`] after `timeout`
    ///
    /// Transports without a deadline mechanism block as `receive` does.
    fn receive_timeout(&mut self, _timeout: Duration) -> Result<WireMessage, TransportError> {
        self.receive()
    }

    /// Closes this endpoint; the peer observes `ChannelClosed`
    fn close(&mut self);

    /// Returns the channel state as observed from this endpoint
    fn state(&self) -> ChannelState;
}

impl<C: MessageChannel + ?Sized> MessageChannel for Box<C> {
    fn send(&mut self, message: WireMessage) -> Result<(), TransportError> {
        (**self).send(message)
    }

    fn receive(&mut self) -> Result<WireMessage, TransportError> {
        (**self).receive()
    }

    fn receive_timeout(&mut self, timeout: Duration) -> Result<WireMessage, TransportError> {
        (**self).receive_timeout(timeout)
    }

    fn close(&mut self) {
        (**self).close()
    }

    fn state(&self) -> ChannelState {
        (**self).state()
    }
}

/// Creates a connected in-memory channel pair
///
/// Each half sends to the other's receive queue. Dropping or closing
/// either half severs the channel for its peer.
pub fn channel_pair() -> (ChannelHalf, ChannelHalf) {
    let (a_tx, b_rx) = mpsc::channel();
    let (b_tx, a_rx) = mpsc::channel();

    (ChannelHalf::new(a_tx, a_rx), ChannelHalf::new(b_tx, b_rx))
}

/// One half of an in-memory channel pair
pub struct ChannelHalf {
    tx: Option<Sender<WireMessage>>,
    rx: Option<Receiver<WireMessage>>,
    state: ChannelState,
}

impl ChannelHalf {
    fn new(tx: Sender<WireMessage>, rx: Receiver<WireMessage>) -> Self {
        Self {
            tx: Some(tx),
            rx: Some(rx),
            state: ChannelState::Open,
        }
    }

    /// Polls for a message without blocking
    ///
    /// Returns `Ok(None)` when no message is queued.
    pub fn try_receive(&mut self) -> Result<Option<WireMessage>, TransportError> {
        let rx = match &self.rx {
            Some(rx) if self.state.is_usable() => rx,
            _ => return Err(TransportError::ChannelClosed),
        };

        match rx.try_recv() {
            Ok(message) => {
                self.state = ChannelState::Active;
                Ok(Some(message))
            }
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => {
                self.mark_closed();
                Err(TransportError::ChannelClosed)
            }
        }
    }

    fn mark_closed(&mut self) {
        self.state = ChannelState::Closed;
        self.tx = None;
        self.rx = None;
    }
}

impl MessageChannel for ChannelHalf {
    fn send(&mut self, message: WireMessage) -> Result<(), TransportError> {
        let tx = match &self.tx {
            Some(tx) if self.state.is_usable() => tx,
            _ => return Err(TransportError::ChannelClosed),
        };

        if tx.send(message).is_err() {
            self.mark_closed();
            return Err(TransportError::ChannelClosed);
        }

        self.state = ChannelState::Active;
        Ok(())
    }

    fn receive(&mut self) -> Result<WireMessage, TransportError> {
        let rx = match &self.rx {
            Some(rx) if self.state.is_usable() => rx,
            _ => return Err(TransportError::ChannelClosed),
        };

        match rx.recv() {
            Ok(message) => {
                self.state = ChannelState::Active;
                Ok(message)
            }
            Err(_) => {
                self.mark_closed();
                Err(TransportError::ChannelClosed)
            }
        }
    }

    fn receive_timeout(&mut self, timeout: Duration) -> Result<WireMessage, TransportError> {
        let rx = match &self.rx {
            Some(rx) if self.state.is_usable() => rx,
            _ => return Err(TransportError::ChannelClosed),
        };

        match rx.recv_timeout(timeout) {
            Ok(message) => {
                self.state = ChannelState::Active;
                Ok(message)
            }
            Err(RecvTimeoutError::Timeout) => Err(TransportError::ReceiveTimeout),
            Err(RecvTimeoutError::Disconnected) => {
                self.mark_closed();
                Err(TransportError::ChannelClosed)
            }
        }
    }

    fn close(&mut self) {
        if !self.state.is_closed() {
            self.state = ChannelState::Closing;
            log::debug!("channel endpoint closing");
            self.mark_closed();
        }
    }

    fn state(&self) -> ChannelState {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ipa_wire::{CorrelationId, WirePayload};

    fn message(n: u32) -> WireMessage {
        WireMessage::call(1, CorrelationId::new(n), WirePayload::empty())
    }

    #[test]
    fn test_pair_round_trip() {
        let (mut a, mut b) = channel_pair();

        a.send(message(1)).unwrap();
        let received = b.receive().unwrap();
        assert_eq!(received.correlation, CorrelationId::new(1));

        b.send(message(2)).unwrap();
        assert_eq!(a.receive().unwrap().correlation, CorrelationId::new(2));
    }

    #[test]
    fn test_fifo_order() {
        let (mut a, mut b) = channel_pair();

        for n in 0..20 {
            a.send(message(n)).unwrap();
        }
        for n in 0..20 {
            assert_eq!(b.receive().unwrap().correlation, CorrelationId::new(n));
        }
    }

    #[test]
    fn test_state_transitions() {
        let (mut a, mut b) = channel_pair();
        assert_eq!(a.state(), ChannelState::Open);

        a.send(message(1)).unwrap();
        assert_eq!(a.state(), ChannelState::Active);

        b.receive().unwrap();
        assert_eq!(b.state(), ChannelState::Active);

        a.close();
        assert_eq!(a.state(), ChannelState::Closed);
    }

    #[test]
    fn test_send_after_peer_dropped() {
        let (mut a, b) = channel_pair();
        drop(b);

        assert!(matches!(
            a.send(message(1)),
            Err(TransportError::ChannelClosed)
        ));
        assert_eq!(a.state(), ChannelState::Closed);

        // Closed is terminal: every later operation fails the same way.
        assert!(matches!(
            a.receive(),
            Err(TransportError::ChannelClosed)
        ));
    }

    #[test]
    fn test_receive_unblocks_on_close() {
        let (a, mut b) = channel_pair();

        let handle = std::thread::spawn(move || b.receive());
        drop(a);

        let result = handle.join().unwrap();
        assert!(matches!(result, Err(TransportError::ChannelClosed)));
    }

    #[test]
    fn test_receive_timeout() {
        let (_a, mut b) = channel_pair();
        let result = b.receive_timeout(Duration::from_millis(10));
        assert!(matches!(result, Err(TransportError::ReceiveTimeout)));
        // The channel survives a timeout.
        assert!(b.state().is_usable());
    }

    #[test]
    fn test_try_receive() {
        let (mut a, mut b) = channel_pair();
        assert!(b.try_receive().unwrap().is_none());

        a.send(message(5)).unwrap();
        let received = b.try_receive().unwrap().unwrap();
        assert_eq!(received.correlation, CorrelationId::new(5));
    }

    #[test]
    fn test_queued_messages_drain_before_closure() {
        let (mut a, mut b) = channel_pair();
        a.send(message(1)).unwrap();
        a.send(message(2)).unwrap();
        drop(a);

        assert_eq!(b.receive().unwrap().correlation, CorrelationId::new(1));
        assert_eq!(b.receive().unwrap().correlation, CorrelationId::new(2));
        assert!(matches!(b.receive(), Err(TransportError::ChannelClosed)));
    }
}
