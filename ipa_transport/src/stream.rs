//! Framed channel over byte-stream halves

use crate::error::TransportError;
use crate::state::ChannelState;
use ipa_wire::{FrameReader, FrameWriter, WireError, WireMessage};
use std::io::{ErrorKind, Read, Write};

/// A message channel framing over a byte stream
///
/// The read and write halves are typically the two directions of a Unix
/// socket pair or pipe pair to an isolated process. A read deadline, where
/// wanted, is configured on the stream itself (e.g.
/// `UnixStream::set_read_timeout`); it surfaces here as
/// [`TransportError::ReceiveTimeout`].
pub struct StreamChannel<R: Read, W: Write> {
    reader: Option<FrameReader<R>>,
    writer: Option<FrameWriter<W>>,
    state: ChannelState,
}

impl<R: Read, W: Write> StreamChannel<R, W> {
    /// Creates a channel over a read half and a write half
    pub fn new(read: R, write: W) -> Self {
        Self {
            reader: Some(FrameReader::new(read)),
            writer: Some(FrameWriter::new(write)),
            state: ChannelState::Open,
        }
    }

    fn mark_closed(&mut self) {
        self.state = ChannelState::Closed;
        self.reader = None;
        self.writer = None;
    }

    /// Maps a framing error, severing the channel when the stream can no
    /// longer be trusted
    fn map_wire_error(&mut self, err: WireError) -> TransportError {
        match &err {
            WireError::Io(io) if matches!(io.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                TransportError::ReceiveTimeout
            }
            // A malformed body was fully consumed; framing stays aligned
            // and only the one message is lost.
            _ if err.is_local() => TransportError::Wire(err),
            _ => {
                self.mark_closed();
                log::warn!("stream channel severed: {}", err);
                TransportError::ChannelClosed
            }
        }
    }
}

impl<R: Read + Send, W: Write + Send> crate::channel::MessageChannel for StreamChannel<R, W> {
    fn send(&mut self, message: WireMessage) -> Result<(), TransportError> {
        if !self.state.is_usable() {
            return Err(TransportError::ChannelClosed);
        }
        let writer = self.writer.as_mut().ok_or(TransportError::ChannelClosed)?;

        match writer.write_message(&message) {
            Ok(()) => {
                self.state = ChannelState::Active;
                Ok(())
            }
            Err(err) => Err(self.map_wire_error(err)),
        }
    }

    fn receive(&mut self) -> Result<WireMessage, TransportError> {
        if !self.state.is_usable() {
            return Err(TransportError::ChannelClosed);
        }
        let reader = self.reader.as_mut().ok_or(TransportError::ChannelClosed)?;

        match reader.read_message() {
            Ok(message) => {
                self.state = ChannelState::Active;
                Ok(message)
            }
            Err(err) => Err(self.map_wire_error(err)),
        }
    }

    fn close(&mut self) {
        if !self.state.is_closed() {
            self.state = ChannelState::Closing;
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
    use crate::channel::MessageChannel;
    use ipa_wire::{CorrelationId, WirePayload};
    use std::os::unix::net::UnixStream;

    fn message(n: u32) -> WireMessage {
        WireMessage::call(2, CorrelationId::new(n), WirePayload::new(&n).unwrap())
    }

    #[test]
    fn test_socket_pair_round_trip() {
        let (left, right) = UnixStream::pair().unwrap();
        let mut a = StreamChannel::new(left.try_clone().unwrap(), left);
        let mut b = StreamChannel::new(right.try_clone().unwrap(), right);

        a.send(message(1)).unwrap();
        a.send(message(2)).unwrap();

        assert_eq!(b.receive().unwrap().correlation, CorrelationId::new(1));
        assert_eq!(b.receive().unwrap().correlation, CorrelationId::new(2));

        b.send(message(3)).unwrap();
        assert_eq!(a.receive().unwrap().correlation, CorrelationId::new(3));
    }

    #[test]
    fn test_peer_close_severs_channel() {
        let (left, right) = UnixStream::pair().unwrap();
        let mut a = StreamChannel::new(left.try_clone().unwrap(), left);
        let b = StreamChannel::new(right.try_clone().unwrap(), right);
        drop(b);

        assert!(matches!(a.receive(), Err(TransportError::ChannelClosed)));
        assert_eq!(a.state(), ChannelState::Closed);
        assert!(matches!(
            a.send(message(1)),
            Err(TransportError::ChannelClosed)
        ));
    }

    #[test]
    fn test_read_timeout_is_not_fatal() {
        let (left, right) = UnixStream::pair().unwrap();
        left.set_read_timeout(Some(std::time::Duration::from_millis(10)))
            .unwrap();
        let mut a = StreamChannel::new(left.try_clone().unwrap(), left);
        let _b = StreamChannel::new(right.try_clone().unwrap(), right);

        let result = a.receive();
        assert!(matches!(result, Err(TransportError::ReceiveTimeout)));
        assert!(a.state().is_usable());
    }

    #[test]
    fn test_cross_thread_exchange() {
        let (left, right) = UnixStream::pair().unwrap();
        let mut a = StreamChannel::new(left.try_clone().unwrap(), left);
        let mut b = StreamChannel::new(right.try_clone().unwrap(), right);

        let handle = std::thread::spawn(move || {
            let received = b.receive().unwrap();
            b.send(WireMessage::call(
                received.opcode,
                received.correlation,
                WirePayload::empty(),
            ))
            .unwrap();
        });

        a.send(message(9)).unwrap();
        let reply = a.receive().unwrap();
        assert_eq!(reply.correlation, CorrelationId::new(9));
        handle.join().unwrap();
    }
}
