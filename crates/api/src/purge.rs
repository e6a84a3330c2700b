//! Chamber purge fan actuator
//!
//! The verification engine only requests a purge; the fan itself is driven
//! by a background task so requests never block a request handler.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use verification::ChamberPurge;

/// Forwards purge requests to the fan task
#[derive(Clone)]
pub struct PurgeNotifier {
    tx: mpsc::UnboundedSender<Duration>,
    busy: Arc<AtomicBool>,
}

impl PurgeNotifier {
    /// Spawn the fan task on the current runtime
    pub fn spawn() -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let busy = Arc::new(AtomicBool::new(false));
        let handle = tokio::spawn(run_fan(rx, busy.clone()));
        (Self { tx, busy }, handle)
    }

    /// True while the fan is running
    pub fn in_progress(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

impl ChamberPurge for PurgeNotifier {
    fn request_purge(&self, duration: Duration) {
        if self.tx.send(duration).is_err() {
            warn!("Purge fan task has stopped; purge request dropped");
        }
    }
}

async fn run_fan(mut rx: mpsc::UnboundedReceiver<Duration>, busy: Arc<AtomicBool>) {
    while let Some(mut duration) = rx.recv().await {
        // requests queued behind this one collapse into a single cycle
        while let Ok(next) = rx.try_recv() {
            duration = duration.max(next);
        }

        busy.store(true, Ordering::Release);
        info!("Purge fan ON for {}s", duration.as_secs());
        tokio::time::sleep(duration).await;
        busy.store(false, Ordering::Release);
        info!("Purge fan OFF");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_purge_cycle() {
        let (notifier, _handle) = PurgeNotifier::spawn();
        assert!(!notifier.in_progress());

        notifier.request_purge(Duration::from_secs(30));
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(notifier.in_progress());

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(!notifier.in_progress());
    }

    #[tokio::test(start_paused = true)]
    async fn test_queued_requests_collapse() {
        let (notifier, _handle) = PurgeNotifier::spawn();
        notifier.request_purge(Duration::from_secs(10));
        notifier.request_purge(Duration::from_secs(20));

        tokio::time::sleep(Duration::from_secs(15)).await;
        assert!(notifier.in_progress());
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(!notifier.in_progress());
    }
}
