//! Host-level error type

use ipa_locator::LocatorError;
use ipa_proxy::ProxyError;
use ipa_schema::SchemaError;
use ipa_supervisor::SupervisorError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HostError {
    /// No schema registered for the requested pipeline type
    #[error("Unknown pipeline type '{0}'")]
    UnknownPipeline(String),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Locator(#[from] LocatorError),

    #[error(transparent)]
    Supervisor(#[from] SupervisorError),

    #[error(transparent)]
    Proxy(#[from] ProxyError),
}
