use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_stream::wrappers::WatchStream;
use tokio_stream::StreamExt;
use tracing::{debug, info, warn};

use crate::addr::same_members;
use crate::membership::MembershipSource;
use crate::statistics::WatcherStatistics;

type ChangeCallback = Arc<dyn Fn() + Send + Sync>;

#[derive(Clone)]
/// A live view of the service's cluster peers.
///
/// The watcher runs a background task which polls the configured
/// [`MembershipSource`] on a fixed interval and republishes the peer list
/// whenever the membership changes. Handles are cheap to clone and can be
/// shared freely across tasks.
pub struct PeerWatcher {
    shared: Arc<WatcherState>,
}

struct WatcherState {
    peers: watch::Receiver<Vec<String>>,
    callbacks: Mutex<Vec<ChangeCallback>>,
    statistics: WatcherStatistics,
    stop: AtomicBool,
}

impl PeerWatcher {
    /// Seeds the peer list with this node's own address and spawns the
    /// polling task.
    pub(crate) fn start<S>(source: S, self_addr: String, poll_interval: Duration) -> Self
    where
        S: MembershipSource + Send + Sync + 'static,
    {
        let statistics = WatcherStatistics::default();
        statistics.num_peers.store(1, Ordering::Relaxed);

        let (peers_tx, peers_rx) = watch::channel(vec![self_addr]);
        let shared = Arc::new(WatcherState {
            peers: peers_rx,
            callbacks: Mutex::new(Vec::new()),
            statistics,
            stop: AtomicBool::new(false),
        });

        tokio::spawn(run_poll_cycles(
            source,
            shared.clone(),
            peers_tx,
            poll_interval,
        ));

        Self { shared }
    }

    /// Returns a copy of the currently published peer list.
    ///
    /// The list contains this node's own address until the first successful
    /// poll replaces it, so callers never observe an empty cluster at
    /// startup.
    pub fn peers(&self) -> Vec<String> {
        self.shared.peers.borrow().clone()
    }

    /// Registers a callback invoked after every published membership change.
    ///
    /// Callbacks carry no payload, they are expected to call
    /// [`PeerWatcher::peers`] to read the new state. Changes published
    /// before registration are not replayed. Every invocation runs as its
    /// own task, so a slow callback delays neither the polling loop nor the
    /// other callbacks.
    pub fn on_change<F>(&self, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.shared.callbacks.lock().push(Arc::new(callback));
    }

    /// Returns a stream of published peer lists.
    ///
    /// The stream yields the list as of subscription first and then one
    /// item per publish. A slow consumer may miss intermediate lists, the
    /// latest list is always delivered.
    pub fn changes(&self) -> WatchStream<Vec<String>> {
        WatchStream::new(self.shared.peers.clone())
    }

    #[inline]
    /// Gets the live statistics of the watcher.
    pub fn statistics(&self) -> WatcherStatistics {
        self.shared.statistics.clone()
    }

    /// Signals the polling task to stop.
    ///
    /// The task exits at its next wakeup, a poll already in flight is never
    /// interrupted and callbacks already spawned run to completion.
    /// Dropping every handle without calling this leaves the task polling
    /// for the life of the process.
    pub fn shutdown(&self) {
        info!("Shutting down the peer watcher.");
        self.shared.stop.store(true, Ordering::Relaxed);
    }

    /// Convenience method that waits for the predicate to hold true for the
    /// published peer list.
    pub async fn wait_for_peers<F>(
        &self,
        mut predicate: F,
        timeout_after: Duration,
    ) -> Result<(), anyhow::Error>
    where
        F: FnMut(&[String]) -> bool,
    {
        use tokio::time::timeout;

        let matched = timeout(
            timeout_after,
            self.changes().skip_while(|peers| !predicate(peers)).next(),
        )
        .await?;

        if matched.is_none() {
            return Err(anyhow::anyhow!(
                "the watcher stopped before the peer list matched"
            ));
        }

        Ok(())
    }
}

async fn run_poll_cycles<S>(
    source: S,
    shared: Arc<WatcherState>,
    peers_tx: watch::Sender<Vec<String>>,
    poll_interval: Duration,
) where
    S: MembershipSource + Send + Sync + 'static,
{
    let mut last_published = shared.peers.borrow().clone();

    // The seeded list stays visible for one full interval before the first
    // poll can replace it.
    let mut interval = interval_at(Instant::now() + poll_interval, poll_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        interval.tick().await;

        if shared.stop.load(Ordering::Relaxed) {
            debug!("Received a stop signal. Stopping.");
            break;
        }

        shared.statistics.num_polls.fetch_add(1, Ordering::Relaxed);

        let mut members = match source.get_members().await {
            Ok(members) => members,
            Err(error) => {
                shared
                    .statistics
                    .num_failed_polls
                    .fetch_add(1, Ordering::Relaxed);
                warn!(
                    error = ?error,
                    "Unable to fetch service members. Keeping last known peers.",
                );
                continue;
            },
        };

        members.sort_unstable();
        if same_members(&last_published, &members) {
            continue;
        }

        info!(num_peers = members.len(), "Cluster membership has changed.");

        shared
            .statistics
            .num_peers
            .store(members.len() as u64, Ordering::Relaxed);
        shared
            .statistics
            .num_changes
            .fetch_add(1, Ordering::Relaxed);

        last_published = members.clone();
        peers_tx.send_replace(members);

        // Don't block the loop on any of the callbacks.
        let callbacks = shared.callbacks.lock().clone();
        for callback in callbacks {
            tokio::spawn(async move { callback() });
        }
    }
}
