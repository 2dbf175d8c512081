//! # Core Camera Types
//!
//! This crate defines the fundamental data types shared by the IPA
//! communication layer.
//!
//! ## Philosophy
//!
//! - **Explicit over implicit**: identities are typed and cannot be confused.
//! - **Wire-ready**: every type here may cross a process boundary, so every
//!   type is serializable.
//! - **Immutable contracts**: values exchanged with a module are plain data,
//!   never handles into controller-owned state — except [`BufferHandle`],
//!   which is an explicit out-of-band reference.
//!
//! ## Key Types
//!
//! - [`CameraId`], [`ContextId`]: unique identifiers
//! - [`ProtocolVersion`]: version tag gating controller/module pairings
//! - [`StreamConfig`], [`PixelFormat`], [`Size`], [`Rectangle`]: stream geometry
//! - [`ControlList`], [`ControlValue`]: algorithm control exchange
//! - [`BufferHandle`]: out-of-band bulk buffer reference

pub mod buffers;
pub mod controls;
pub mod geometry;
pub mod ids;
pub mod stream;
pub mod version;

pub use buffers::{BufferHandle, FrameMetadata};
pub use controls::{ControlList, ControlValue};
pub use geometry::{Rectangle, Size};
pub use ids::{CameraId, ContextId};
pub use stream::{PixelFormat, StreamConfig};
pub use version::ProtocolVersion;
