//! Periodic scheduler that keeps active integrations fresh.
//!
//! Sweeps on a fixed tick for integrations whose last sync is older than
//! their own interval and runs a full sync for each. Work fans out onto a
//! bounded semaphore so one slow channel cannot monopolize the runtime,
//! and one integration's failure never stops the sweep.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{Notify, Semaphore};
use tokio::time::interval;
use tracing::{debug, error, info, warn};

use staylink_db::models::SyncOperation;

use crate::config::SchedulerConfig;
use crate::engine::SyncEngine;

pub struct SyncScheduler {
    engine: Arc<SyncEngine>,
    config: SchedulerConfig,
    shutdown: AtomicBool,
    shutdown_notify: Notify,
}

impl SyncScheduler {
    pub fn new(engine: Arc<SyncEngine>) -> Self {
        Self::with_config(engine, SchedulerConfig::default())
    }

    pub fn with_config(engine: Arc<SyncEngine>, config: SchedulerConfig) -> Self {
        Self {
            engine,
            config,
            shutdown: AtomicBool::new(false),
            shutdown_notify: Notify::new(),
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Run sweeps until [`shutdown`](Self::shutdown) is called, then wait
    /// for in-flight syncs to finish before returning.
    pub async fn run(&self) {
        info!(
            tick_secs = self.config.tick_secs,
            concurrency = self.config.concurrency,
            "sync scheduler started"
        );

        let semaphore = Arc::new(Semaphore::new(self.config.concurrency));
        let mut tick = interval(self.config.tick());

        loop {
            tokio::select! {
                _ = tick.tick() => {}
                _ = self.shutdown_notify.notified() => {}
            }
            if self.shutdown.load(Ordering::Relaxed) {
                info!("shutdown requested, stopping sync scheduler");
                break;
            }
            self.sweep(&semaphore).await;
        }

        let _ = semaphore
            .acquire_many(self.config.concurrency as u32)
            .await;
        info!("sync scheduler stopped");
    }

    /// Request a graceful stop. Wakes the run loop if it is waiting on the
    /// tick, so stopping does not take a full sweep interval.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
        self.shutdown_notify.notify_waiters();
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }

    /// One sweep: spawn a full sync for every stale integration, bounded
    /// by the concurrency budget.
    async fn sweep(&self, semaphore: &Arc<Semaphore>) {
        let due = match self.engine.store().integrations_needing_sync().await {
            Ok(due) => due,
            Err(err) => {
                error!(error = %err, "could not query integrations needing sync");
                return;
            }
        };
        if due.is_empty() {
            debug!("no integrations need syncing");
            return;
        }

        info!(count = due.len(), "syncing stale integrations");
        for integration in due {
            let permit = match semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => return,
            };
            let engine = self.engine.clone();
            tokio::spawn(async move {
                let _permit = permit;
                if let Err(err) = engine
                    .trigger_sync(&integration, SyncOperation::FullSync)
                    .await
                {
                    warn!(
                        integration_id = %integration.id,
                        error = %err,
                        "scheduled sync failed"
                    );
                }
            });
        }
    }

    /// One synchronous sweep, syncing each stale integration in turn.
    /// Returns how many synced cleanly. Used for diagnostics and tests.
    pub async fn run_once(&self) -> usize {
        let due = match self.engine.store().integrations_needing_sync().await {
            Ok(due) => due,
            Err(err) => {
                error!(error = %err, "could not query integrations needing sync");
                return 0;
            }
        };

        let mut synced = 0;
        for integration in due {
            match self
                .engine
                .trigger_sync(&integration, SyncOperation::FullSync)
                .await
            {
                Ok(_) => synced += 1,
                Err(err) => {
                    warn!(
                        integration_id = %integration.id,
                        error = %err,
                        "scheduled sync failed"
                    );
                }
            }
        }
        synced
    }
}
