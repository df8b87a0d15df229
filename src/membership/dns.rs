use std::io;
use std::net::IpAddr;

use async_trait::async_trait;
use tokio::net::lookup_host;

use crate::addr::{format_peer_addr, PEER_PORT};
use crate::error::DiscoveryError;
use crate::membership::MembershipSource;

#[async_trait]
/// Standard host name resolution.
///
/// The discovery layer only ever asks one question, "what addresses back
/// this name right now", so anything smarter like caching or SRV lookups
/// belongs to the implementation.
pub trait HostResolver: Send + Sync + 'static {
    /// Resolves a host name to the set of IP addresses currently backing it.
    async fn resolve(&self, host: &str) -> io::Result<Vec<IpAddr>>;
}

#[derive(Debug, Copy, Clone, Default)]
/// A [`HostResolver`] which uses the operating system's resolver.
pub struct SystemResolver;

#[async_trait]
impl HostResolver for SystemResolver {
    async fn resolve(&self, host: &str) -> io::Result<Vec<IpAddr>> {
        let addrs = lookup_host((host, PEER_PORT)).await?;
        Ok(addrs.map(|addr| addr.ip()).collect())
    }
}

#[derive(Debug)]
/// Discovers cluster members by resolving a DNS name.
///
/// This suits headless services where the service name resolves to one
/// record per live member. Every resolved address is formatted into a peer
/// address with [`format_peer_addr`].
pub struct DnsMembership<R = SystemResolver> {
    service: String,
    resolver: R,
}

impl DnsMembership {
    /// Creates a source which resolves `service` with the system resolver.
    pub fn new(service: impl Into<String>) -> Result<Self, DiscoveryError> {
        Self::with_resolver(service, SystemResolver)
    }
}

impl<R> DnsMembership<R>
where
    R: HostResolver,
{
    /// Creates a source backed by a custom resolver implementation.
    pub fn with_resolver(
        service: impl Into<String>,
        resolver: R,
    ) -> Result<Self, DiscoveryError> {
        let service = service.into();

        if service.is_empty() {
            return Err(DiscoveryError::MissingServiceName);
        }

        Ok(Self { service, resolver })
    }
}

#[async_trait]
impl<R> MembershipSource for DnsMembership<R>
where
    R: HostResolver,
{
    async fn get_members(&self) -> Result<Vec<String>, DiscoveryError> {
        let hosts = self.resolver.resolve(&self.service).await?;
        Ok(hosts.into_iter().map(format_peer_addr).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedResolver(Vec<IpAddr>);

    #[async_trait]
    impl HostResolver for FixedResolver {
        async fn resolve(&self, _host: &str) -> io::Result<Vec<IpAddr>> {
            Ok(self.0.clone())
        }
    }

    struct FailingResolver;

    #[async_trait]
    impl HostResolver for FailingResolver {
        async fn resolve(&self, host: &str) -> io::Result<Vec<IpAddr>> {
            Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no such host: {}", host),
            ))
        }
    }

    #[tokio::test]
    async fn test_resolved_hosts_become_peer_addresses() -> anyhow::Result<()> {
        let ips = vec!["10.0.0.2".parse()?, "10.0.0.1".parse()?];
        let source = DnsMembership::with_resolver("indexer-peers", FixedResolver(ips))?;

        let members = source.get_members().await?;
        assert_eq!(
            members,
            vec!["http://10.0.0.2:8081", "http://10.0.0.1:8081"],
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_name_resolving_to_nothing_yields_no_members() -> anyhow::Result<()> {
        let source = DnsMembership::with_resolver("indexer-peers", FixedResolver(Vec::new()))?;

        let members = source.get_members().await?;
        assert!(members.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn test_resolution_failure_is_surfaced() -> anyhow::Result<()> {
        let source = DnsMembership::with_resolver("indexer-peers", FailingResolver)?;

        let error = source.get_members().await.unwrap_err();
        assert!(matches!(error, DiscoveryError::Resolution(_)));
        assert!(error.to_string().contains("no such host"));

        Ok(())
    }

    #[test]
    fn test_empty_service_name_is_rejected() {
        let error = DnsMembership::new("").unwrap_err();
        assert!(matches!(error, DiscoveryError::MissingServiceName));
    }
}
