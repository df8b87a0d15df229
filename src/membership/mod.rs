mod dns;
mod endpoints;

use async_trait::async_trait;
pub use dns::{DnsMembership, HostResolver, SystemResolver};
pub use endpoints::{
    EndpointAddress,
    EndpointSubset,
    EndpointsClient,
    EndpointsMembership,
    ServiceEndpoints,
    DEFAULT_NAMESPACE,
};

use crate::error::DiscoveryError;

#[async_trait]
/// A pluggable way of discovering the members of the cluster.
///
/// Implementations return the complete set of peer addresses known to the
/// backing system on every call. They do not diff, cache or publish
/// anything themselves, the watcher owns all of that.
pub trait MembershipSource {
    /// Fetches the current set of peer addresses for the service.
    ///
    /// Addresses are returned in whatever order the backing system
    /// produced them.
    async fn get_members(&self) -> Result<Vec<String>, DiscoveryError>;
}
