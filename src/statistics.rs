use std::ops::Deref;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
/// Live metrics around the peer watching system.
pub struct WatcherStatistics(Arc<WatcherStatisticsInner>);

impl Deref for WatcherStatistics {
    type Target = WatcherStatisticsInner;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[derive(Debug, Default)]
pub struct WatcherStatisticsInner {
    /// The number of peers in the currently published list.
    pub(crate) num_peers: AtomicU64,
    /// The number of poll cycles attempted since the watcher started.
    pub(crate) num_polls: AtomicU64,
    /// The number of poll cycles skipped because the source failed.
    pub(crate) num_failed_polls: AtomicU64,
    /// The number of membership changes published so far.
    pub(crate) num_changes: AtomicU64,
}

impl WatcherStatisticsInner {
    /// The number of peers in the currently published list.
    pub fn num_peers(&self) -> u64 {
        self.num_peers.load(Ordering::Relaxed)
    }

    /// The number of poll cycles attempted since the watcher started.
    pub fn num_polls(&self) -> u64 {
        self.num_polls.load(Ordering::Relaxed)
    }

    /// The number of poll cycles skipped because the source failed.
    pub fn num_failed_polls(&self) -> u64 {
        self.num_failed_polls.load(Ordering::Relaxed)
    }

    /// The number of membership changes published so far.
    pub fn num_changes(&self) -> u64 {
        self.num_changes.load(Ordering::Relaxed)
    }
}
