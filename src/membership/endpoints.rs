use std::borrow::Cow;
use std::fmt::Display;

use async_trait::async_trait;
use tracing::warn;

use crate::addr::format_peer_addr;
use crate::error::DiscoveryError;
use crate::membership::MembershipSource;

/// The namespace services are looked up in unless overridden.
pub static DEFAULT_NAMESPACE: &str = "default";

#[async_trait]
/// A client able to read the endpoint topology of a named service.
///
/// This is the only operation the discovery layer needs from the cluster
/// control plane. Building the client and managing its credentials is
/// entirely the caller's concern.
pub trait EndpointsClient: Send + Sync + 'static {
    /// Fetches the endpoints currently backing `service` within `namespace`.
    async fn service_endpoints(
        &self,
        namespace: &str,
        service: &str,
    ) -> Result<ServiceEndpoints, anyhow::Error>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// The endpoint topology of a single service.
pub struct ServiceEndpoints {
    /// Groups of addresses which share the same readiness and port set.
    pub subsets: Vec<EndpointSubset>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndpointSubset {
    /// The ready addresses within this subset.
    pub addresses: Vec<EndpointAddress>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndpointAddress {
    /// The raw IP of the endpoint.
    pub ip: String,
    /// The name of the workload backing the endpoint, if the control plane
    /// reports one.
    pub target_name: Option<String>,
}

#[derive(Debug)]
/// Discovers cluster members from the control plane's endpoint records.
///
/// Peers are advertised under the name of their backing workload rather
/// than a raw IP, which keeps peer identity stable when addresses get
/// reassigned.
pub struct EndpointsMembership<C> {
    client: C,
    service: String,
    namespace: Cow<'static, str>,
}

impl<C> EndpointsMembership<C>
where
    C: EndpointsClient,
{
    /// Creates a source reading the endpoints of `service` in the default
    /// namespace.
    pub fn new(client: C, service: impl Into<String>) -> Result<Self, DiscoveryError> {
        let service = service.into();

        if service.is_empty() {
            return Err(DiscoveryError::MissingServiceName);
        }

        Ok(Self {
            client,
            service,
            namespace: Cow::Borrowed(DEFAULT_NAMESPACE),
        })
    }

    /// Set the namespace the service is looked up in.
    pub fn with_namespace(mut self, namespace: impl Display) -> Self {
        self.namespace = Cow::Owned(namespace.to_string());
        self
    }
}

#[async_trait]
impl<C> MembershipSource for EndpointsMembership<C>
where
    C: EndpointsClient,
{
    async fn get_members(&self) -> Result<Vec<String>, DiscoveryError> {
        let endpoints = self
            .client
            .service_endpoints(&self.namespace, &self.service)
            .await
            .map_err(DiscoveryError::Lookup)?;

        let mut members = Vec::new();
        for subset in endpoints.subsets {
            for address in subset.addresses {
                match address.target_name {
                    Some(name) => members.push(format_peer_addr(name)),
                    None => warn!(
                        ip = %address.ip,
                        "Endpoint has no backing workload name, ignoring member.",
                    ),
                }
            }
        }

        Ok(members)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::Mutex;

    use super::*;

    #[derive(Clone, Default)]
    struct StaticEndpoints(Arc<StaticEndpointsInner>);

    #[derive(Default)]
    struct StaticEndpointsInner {
        endpoints: Mutex<ServiceEndpoints>,
        seen_namespaces: Mutex<Vec<String>>,
    }

    impl StaticEndpoints {
        fn new(endpoints: ServiceEndpoints) -> Self {
            let client = Self::default();
            *client.0.endpoints.lock() = endpoints;
            client
        }

        fn seen_namespaces(&self) -> Vec<String> {
            self.0.seen_namespaces.lock().clone()
        }
    }

    #[async_trait]
    impl EndpointsClient for StaticEndpoints {
        async fn service_endpoints(
            &self,
            namespace: &str,
            _service: &str,
        ) -> Result<ServiceEndpoints, anyhow::Error> {
            self.0.seen_namespaces.lock().push(namespace.to_string());
            Ok(self.0.endpoints.lock().clone())
        }
    }

    #[derive(Debug)]
    struct UnavailableControlPlane;

    #[async_trait]
    impl EndpointsClient for UnavailableControlPlane {
        async fn service_endpoints(
            &self,
            _namespace: &str,
            _service: &str,
        ) -> Result<ServiceEndpoints, anyhow::Error> {
            Err(anyhow::anyhow!("control plane unavailable"))
        }
    }

    fn address(ip: &str, target_name: Option<&str>) -> EndpointAddress {
        EndpointAddress {
            ip: ip.to_string(),
            target_name: target_name.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_backing_workloads_become_peer_addresses() -> anyhow::Result<()> {
        let client = StaticEndpoints::new(ServiceEndpoints {
            subsets: vec![
                EndpointSubset {
                    addresses: vec![address("10.0.0.1", Some("pod-a"))],
                },
                EndpointSubset {
                    addresses: vec![address("10.0.0.2", Some("pod-b"))],
                },
            ],
        });

        let source = EndpointsMembership::new(client, "indexer-peers")?;

        let members = source.get_members().await?;
        assert_eq!(members, vec!["http://pod-a:8081", "http://pod-b:8081"]);

        Ok(())
    }

    #[tokio::test]
    async fn test_addresses_without_workload_names_are_skipped() -> anyhow::Result<()> {
        let client = StaticEndpoints::new(ServiceEndpoints {
            subsets: vec![EndpointSubset {
                addresses: vec![
                    address("10.0.0.1", Some("pod-a")),
                    address("10.0.0.2", None),
                ],
            }],
        });

        let source = EndpointsMembership::new(client, "indexer-peers")?;

        let members = source.get_members().await?;
        assert_eq!(members, vec!["http://pod-a:8081"]);

        Ok(())
    }

    #[tokio::test]
    async fn test_lookup_failure_is_surfaced() -> anyhow::Result<()> {
        let source = EndpointsMembership::new(UnavailableControlPlane, "indexer-peers")?;

        let error = source.get_members().await.unwrap_err();
        assert!(matches!(error, DiscoveryError::Lookup(_)));
        assert!(error.to_string().contains("control plane unavailable"));

        Ok(())
    }

    #[tokio::test]
    async fn test_namespace_is_forwarded_to_the_client() -> anyhow::Result<()> {
        let client = StaticEndpoints::new(ServiceEndpoints::default());

        let source = EndpointsMembership::new(client.clone(), "indexer-peers")?;
        source.get_members().await?;

        let source = EndpointsMembership::new(client.clone(), "indexer-peers")?
            .with_namespace("search");
        source.get_members().await?;

        assert_eq!(client.seen_namespaces(), vec!["default", "search"]);

        Ok(())
    }

    #[test]
    fn test_empty_service_name_is_rejected() {
        let error = EndpointsMembership::new(UnavailableControlPlane, "").unwrap_err();
        assert!(matches!(error, DiscoveryError::MissingServiceName));
    }
}
