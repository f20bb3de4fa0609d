//! Background refresh loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::{PodcastRefresher, RefreshOutcome};

/// Keeps one cache key fresh from a spawned task, so reads never wait on
/// upstream calls.
pub struct BackgroundRefresher {
    refresher: Arc<PodcastRefresher>,
    key: String,
    ttl: chrono::Duration,
    poll_interval: Duration,

    /// Run flag of the most recently started loop. Each start gets its own
    /// flag so a restart never revives a loop that is still winding down.
    current: Mutex<Option<Arc<AtomicBool>>>,
    shutdown_tx: broadcast::Sender<()>,
}

impl BackgroundRefresher {
    pub fn new(
        refresher: Arc<PodcastRefresher>,
        key: impl Into<String>,
        ttl: chrono::Duration,
        poll_interval: Duration,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            refresher,
            key: key.into(),
            ttl,
            poll_interval,
            current: Mutex::new(None),
            shutdown_tx,
        }
    }

    pub fn is_running(&self) -> bool {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|running| running.load(Ordering::Relaxed))
    }

    /// Start the refresh loop. The first check runs immediately.
    pub fn start(&self) {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        if current.is_some() {
            warn!("Background refresher already running");
            return;
        }
        let running = Arc::new(AtomicBool::new(true));
        *current = Some(Arc::clone(&running));

        info!(
            "Starting background refresher for '{}' (poll every {:?})",
            self.key, self.poll_interval
        );

        let refresher = Arc::clone(&self.refresher);
        let key = self.key.clone();
        let ttl = self.ttl;
        let poll_interval = self.poll_interval;
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            loop {
                if !running.load(Ordering::Relaxed) {
                    break;
                }

                match refresher.refresh_if_stale(&key, ttl).await {
                    Ok(RefreshOutcome::Refreshed(_)) => {}
                    Ok(RefreshOutcome::AlreadyFresh) => debug!("Cache key '{}' is fresh", key),
                    // Already logged by the refresher; retried on the next tick.
                    Err(_) => {}
                }

                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("Background refresher received shutdown signal");
                        break;
                    }
                    _ = tokio::time::sleep(poll_interval) => {}
                }
            }
            info!("Background refresher stopped");
        });
    }

    /// Stop the refresh loop. A cycle in progress runs to completion.
    pub fn stop(&self) {
        let Some(running) = self
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        else {
            warn!("Background refresher not running");
            return;
        };
        running.store(false, Ordering::SeqCst);

        info!("Stopping background refresher for '{}'", self.key);
        let _ = self.shutdown_tx.send(());
    }
}
