use crate::engine::{PurgeSummary, RecycleEngine};
use crate::error::Error;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Runs [`RecycleEngine::purge`] on a fixed interval until cancelled.
pub struct Scheduler {
    engine: Arc<RecycleEngine>,
    interval: Duration,
}

impl Scheduler {
    pub fn new(engine: Arc<RecycleEngine>, interval: Duration) -> Self {
        Self { engine, interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Loop until `shutdown` is cancelled and return the number of purge
    /// cycles that ran.
    ///
    /// Cancellation is checked before each sleep and again on waking, so a
    /// shutdown during the sleep never starts another cycle. Purge errors are
    /// logged and the loop carries on.
    pub async fn run(&self, shutdown: CancellationToken) -> usize {
        info!(
            interval_secs = self.interval.as_secs(),
            "Purge scheduler started"
        );
        let mut cycles = 0;

        loop {
            if shutdown.is_cancelled() {
                break;
            }

            debug!("Sleeping for {:?} before next purge", self.interval);
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }

            if shutdown.is_cancelled() {
                break;
            }

            cycles += 1;
            match self.purge_once().await {
                Ok(summary) if summary.is_idle() => {
                    info!(cycle = cycles, "No expired files to purge");
                }
                Ok(summary) => {
                    info!(
                        cycle = cycles,
                        purged = summary.purged,
                        failed = summary.failed,
                        missing = summary.missing,
                        "Purge cycle complete"
                    );
                }
                Err(e) => {
                    error!(cycle = cycles, "Purge cycle failed: {}", e);
                }
            }
        }

        info!(cycles, "Purge scheduler stopped");
        cycles
    }

    /// Run one purge on the blocking pool; SQLite and filesystem calls block.
    pub async fn purge_once(&self) -> Result<PurgeSummary, Error> {
        let engine = Arc::clone(&self.engine);
        match tokio::task::spawn_blocking(move || engine.purge()).await {
            Ok(result) => result,
            Err(join_err) => Err(Error::Io {
                path: self.engine.holding().dir().to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::Other, join_err),
            }),
        }
    }
}
