//! Resolution-time failures
//!
//! These surface before any context is created; a camera whose module
//! cannot be resolved never reaches the proxy layer.

use camera_types::ProtocolVersion;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocatorError {
    /// No registered module matches the pipeline type and version policy
    #[error("No module for pipeline '{pipeline}' compatible with {requested}")]
    NoCompatibleModule {
        pipeline: String,
        requested: ProtocolVersion,
    },

    /// Two or more modules remain equally preferable after tie-breaking
    #[error("Multiple modules for pipeline '{pipeline}' at {version}: {first} and {second}")]
    AmbiguousModule {
        pipeline: String,
        version: ProtocolVersion,
        first: String,
        second: String,
    },
}
