//! # IPA Proxy Pair
//!
//! Generated-interface plumbing between the controller and an IPA module:
//! the client stub turns typed calls into wire messages, the server stub
//! turns wire messages back into calls on the module implementation.
//!
//! ## Call semantics
//!
//! - **Synchronous** operations block the calling thread until the
//!   correlated reply arrives, the channel closes, or the configured
//!   timeout expires. One outstanding synchronous call per context, ever —
//!   the stub takes `&mut self`.
//! - **Asynchronous** operations are serialized and sent without waiting;
//!   there is no completion signal, and no ordering guarantee beyond FIFO
//!   send order.
//! - **Events** flow module → controller at any time. Events arriving
//!   while a reply is awaited are buffered and dispatched, in arrival
//!   order, on the next [`ClientStub::poll_events`].
//!
//! Serialization and framing failures stay local to the proxy pair: a
//! malformed message is rejected (and, for a synchronous call, answered
//! with a fault), never allowed to take the channel down.

pub mod client;
pub mod error;
pub mod module;
pub mod reply;
pub mod server;
pub mod state;

pub use client::{ClientStub, EventSink};
pub use error::ProxyError;
pub use module::{EventSender, IpaModule, ModuleCall};
pub use reply::{decode_reply, encode_reply};
pub use server::{ServeExit, ServerStub};
pub use state::CallState;

// Re-exported for module implementors.
pub use ipa_wire::{WireMessage, WirePayload};
