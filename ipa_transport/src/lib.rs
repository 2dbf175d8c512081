//! # IPA Transport Channel
//!
//! Bidirectional, ordered message pipes between the controller and a
//! module's execution context.
//!
//! ## Philosophy
//!
//! - **Messages, not shared memory**: all communication is explicit message
//!   passing; the only shared state is the out-of-band bulk buffers, which
//!   are handle-referenced and never concurrently mutated.
//! - **FIFO or dead**: a channel delivers messages in send order or fails
//!   with [`TransportError::ChannelClosed`]; it never reorders, merges or
//!   drops.
//! - **Closed is terminal**: a severed channel cannot be reopened — the
//!   owning context must be rebuilt.
//!
//! Two transports are provided: [`channel_pair`] builds the in-memory pair
//! used between the controller and an isolated worker, and
//! [`StreamChannel`] frames messages over byte-stream halves such as a Unix
//! socket pair.

pub mod channel;
pub mod error;
pub mod state;
pub mod stream;

pub use channel::{channel_pair, ChannelHalf, MessageChannel};
pub use error::TransportError;
pub use state::ChannelState;
pub use stream::StreamChannel;
