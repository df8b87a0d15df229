//! # Peerwatch
//! A live, self-updating view of a service's cluster peers.
//!
//! Peer membership is discovered rather than configured: a background task
//! polls a pluggable [`MembershipSource`] on a fixed interval, publishes a
//! new peer list whenever the membership actually changes, and notifies
//! registered callbacks without ever blocking readers.
//!
//! Two sources are provided out of the box:
//!
//! - [`DnsMembership`] resolves a (typically headless) service name via DNS
//!   and advertises one peer per resolved address.
//! - [`EndpointsMembership`] reads the endpoint records of a service from
//!   the cluster control plane through the [`EndpointsClient`] boundary and
//!   advertises peers under their stable workload names.
//!
//! Anything else can join in by implementing [`MembershipSource`].
//!
//! ### Basic Example
//! ```rust
//! use std::time::Duration;
//!
//! use peerwatch::test_utils::StubMembers;
//! use peerwatch::PeerWatcherBuilder;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let source = StubMembers::new(["http://10.0.0.1:8081"]);
//!
//!     let watcher = PeerWatcherBuilder::new(source, "http://10.0.0.9:8081")
//!         .with_poll_interval(Duration::from_millis(100))
//!         .start();
//!
//!     // The list starts out seeded with this node's own address.
//!     assert_eq!(watcher.peers(), vec!["http://10.0.0.9:8081".to_string()]);
//!
//!     watcher
//!         .wait_for_peers(
//!             |peers| peers.len() == 1 && peers[0] == "http://10.0.0.1:8081",
//!             Duration::from_secs(5),
//!         )
//!         .await?;
//!
//!     watcher.shutdown();
//!     Ok(())
//! }
//! ```

mod addr;
mod error;
mod membership;
mod statistics;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
mod watcher;

use std::time::Duration;

pub use addr::{format_peer_addr, same_members, PEER_PORT};
pub use error::DiscoveryError;
pub use membership::{
    DnsMembership,
    EndpointAddress,
    EndpointSubset,
    EndpointsClient,
    EndpointsMembership,
    HostResolver,
    MembershipSource,
    ServiceEndpoints,
    SystemResolver,
    DEFAULT_NAMESPACE,
};
pub use statistics::WatcherStatistics;
use tracing::info;
pub use watcher::PeerWatcher;

/// How often the membership source is polled unless overridden.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Build a new peer watcher using the provided settings.
pub struct PeerWatcherBuilder<S> {
    source: S,
    self_addr: String,
    poll_interval: Duration,
}

impl<S> PeerWatcherBuilder<S>
where
    S: MembershipSource + Send + Sync + 'static,
{
    /// Creates a new builder around a membership source.
    ///
    /// `self_addr` is this node's own externally reachable peer address. It
    /// seeds the peer list so the view is never empty before the first
    /// successful poll.
    pub fn new(source: S, self_addr: impl Into<String>) -> Self {
        Self {
            source,
            self_addr: self_addr.into(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Set the interval the membership source is polled at.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Starts the watcher, returning as soon as the polling task is spawned.
    ///
    /// The returned handle serves the seeded peer list immediately, the
    /// first poll happens one full interval after this call.
    pub fn start(self) -> PeerWatcher {
        info!(
            self_addr = %self.self_addr,
            poll_interval = ?self.poll_interval,
            "Starting peer watcher.",
        );

        PeerWatcher::start(self.source, self.self_addr, self.poll_interval)
    }
}
