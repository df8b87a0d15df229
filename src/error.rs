use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("a service name must be provided in order to discover cluster members")]
    /// The membership source was configured without a logical service name.
    ///
    /// This is a configuration error and is surfaced when the source is
    /// constructed, never lazily at the first poll.
    MissingServiceName,

    #[error("{0}")]
    /// Resolving the service name via DNS failed.
    Resolution(#[from] io::Error),

    #[error("{0}")]
    /// Fetching the service endpoints from the control plane failed.
    Lookup(anyhow::Error),
}
