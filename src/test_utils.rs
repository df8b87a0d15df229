use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::anyhow;
use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::info;

use crate::error::DiscoveryError;
use crate::membership::MembershipSource;

#[derive(Clone, Default)]
/// A membership source driven entirely from test code.
///
/// This is not suitable for any sort of real world usage outside of testing.
/// Polls return whatever list was last set, or an error while the source is
/// marked as failing.
pub struct StubMembers(Arc<StubMembersInner>);

#[derive(Default)]
struct StubMembersInner {
    members: Mutex<Vec<String>>,
    failing: AtomicBool,
    polls: AtomicU64,
}

impl StubMembers {
    /// Creates a source returning the given members.
    pub fn new(members: impl IntoIterator<Item = impl AsRef<str>>) -> Self {
        let stub = Self::default();
        stub.set_members(members);
        stub
    }

    /// Replaces the members returned by future polls.
    pub fn set_members(&self, members: impl IntoIterator<Item = impl AsRef<str>>) {
        let members = members
            .into_iter()
            .map(|member| member.as_ref().to_string())
            .collect();
        *self.0.members.lock() = members;
    }

    /// Makes future polls fail, or succeed again.
    pub fn set_failing(&self, failing: bool) {
        self.0.failing.store(failing, Ordering::Relaxed);
    }

    /// The number of times the source has been polled so far.
    pub fn num_polls(&self) -> u64 {
        self.0.polls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl MembershipSource for StubMembers {
    async fn get_members(&self) -> Result<Vec<String>, DiscoveryError> {
        self.0.polls.fetch_add(1, Ordering::Relaxed);

        if self.0.failing.load(Ordering::Relaxed) {
            return Err(DiscoveryError::Lookup(anyhow!("stub source set to fail")));
        }

        Ok(self.0.members.lock().clone())
    }
}

/// A wrapping type around another `MembershipSource` implementation that
/// logs every poll going into and out of the source.
///
/// This is a very useful system for debugging issues with discovery.
pub struct InstrumentedSource<S: MembershipSource>(pub S);

#[async_trait]
impl<S: MembershipSource + Send + Sync> MembershipSource for InstrumentedSource<S> {
    async fn get_members(&self) -> Result<Vec<String>, DiscoveryError> {
        let members = self.0.get_members().await;
        info!(members = ?members, "get_members");
        members
    }
}
