//! GC Scheduler
//!
//! Background task that runs one forced GC sweep shortly after startup,
//! purging anything restored from a previous session, and then a
//! threshold-driven sweep at a fixed interval.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::ApiCache;
use crate::config::Config;

/// Handle to a running GC task. Stopping or dropping it aborts the task.
#[derive(Debug)]
pub struct GcScheduler {
    handle: JoinHandle<()>,
}

impl GcScheduler {
    /// Spawns the GC task on the current tokio runtime.
    ///
    /// # Arguments
    /// * `cache` - Cache to sweep
    /// * `interval` - Time between periodic sweeps
    /// * `startup_delay` - Time before the forced startup sweep
    pub fn start(cache: ApiCache, interval: Duration, startup_delay: Duration) -> Self {
        let handle = tokio::spawn(async move {
            info!(
                "Starting GC task: startup sweep in {}ms, then every {}ms",
                startup_delay.as_millis(),
                interval.as_millis()
            );

            tokio::time::sleep(startup_delay).await;
            let report = cache.run_gc(true).await;
            info!(
                "Startup GC: removed {} expired, evicted {}, {} entries remain",
                report.expired_removed, report.evicted, report.remaining_entries
            );

            loop {
                tokio::time::sleep(interval).await;

                let report = cache.run_gc(false).await;
                if report.triggered {
                    debug!(
                        "Periodic GC: removed {} expired, evicted {}",
                        report.expired_removed, report.evicted
                    );
                } else {
                    debug!("Periodic GC: under threshold, skipped");
                }
            }
        });

        Self { handle }
    }

    /// Spawns the GC task with the interval and startup delay from `config`.
    pub fn from_config(cache: ApiCache, config: &Config) -> Self {
        Self::start(cache, config.gc_interval(), config.startup_gc_delay())
    }

    /// Aborts the task.
    pub fn stop(&self) {
        self.handle.abort();
        info!("GC task stopped");
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for GcScheduler {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
