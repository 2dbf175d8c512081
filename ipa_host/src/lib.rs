//! # IPA Host
//!
//! The controller-side assembly: an [`IpaManager`] resolves a module for
//! a camera, decides its execution mode, and hands back an
//! [`IpaContext`] — the per-camera binding of module instance, client
//! stub, transport, and (when isolated) supervised worker.
//!
//! The `soft` module is the generated-style contract for the software
//! ISP pipeline type: typed client, typed dispatcher, and event router
//! over the untyped proxy pair.

pub mod context;
pub mod error;
pub mod inline;
pub mod manager;
pub mod soft;

pub use context::IpaContext;
pub use error::HostError;
pub use inline::InlineChannel;
pub use manager::IpaManager;
