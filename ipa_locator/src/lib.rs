//! # IPA Module Locator
//!
//! Registry of loadable IPA modules. Given a pipeline type and the
//! protocol version the controller was built against, the locator picks
//! a compatible module or reports why none qualifies, and resolves the
//! execution mode (isolated or in-process) from the module's declared
//! preference and the controller's policy.
//!
//! Locators are plain values with explicit construction and teardown;
//! tests build as many independent ones as they need.

pub mod descriptor;
pub mod error;
pub mod registry;

pub use descriptor::{ExecutionMode, ExecutionPreference, IsolationPolicy, ModuleDescriptor};
pub use error::LocatorError;
pub use registry::ModuleRegistry;
