//! Background poller for today's distribution status.
//!
//! [`StatusPoller::spawn`] fetches immediately, then keeps fetching on the
//! interval [`poll_interval`] picks for the last observed snapshot.  The
//! latest snapshot is published through a `tokio::sync::watch` channel;
//! [`Refetch::trigger`] cuts the current wait short.
//!
//! Fetch failures keep the stale snapshot and wait for the next regular
//! tick.  The first failure of a streak raises an error toast; the rest
//! are only logged.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use stakeboard_client::DistributionService;
use stakeboard_core::distribution::DistributionStatus;
use stakeboard_core::polling::poll_interval;

use crate::notify::Notifier;

/// Cloneable handle that asks the poller to fetch right away.
#[derive(Clone, Default)]
pub struct Refetch(Arc<Notify>);

impl Refetch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request an immediate fetch.  Requests made while a fetch is in
    /// flight collapse into one follow-up fetch.
    pub fn trigger(&self) {
        self.0.notify_one();
    }

    /// Wait for the next trigger.
    pub async fn requested(&self) {
        self.0.notified().await;
    }
}

pub struct StatusPoller {
    api: Arc<dyn DistributionService>,
    notifier: Notifier,
    refetch: Refetch,
}

/// Owner handle for a running poller.  Dropping it stops the task.
pub struct PollerHandle {
    status: watch::Receiver<Option<DistributionStatus>>,
    refetch: Refetch,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl StatusPoller {
    pub fn new(api: Arc<dyn DistributionService>, notifier: Notifier) -> Self {
        Self {
            api,
            notifier,
            refetch: Refetch::new(),
        }
    }

    /// Share an existing refetch handle (e.g. one a workflow already holds).
    pub fn with_refetch(mut self, refetch: Refetch) -> Self {
        self.refetch = refetch;
        self
    }

    /// Start polling until `cancel` fires or the handle is dropped.
    pub fn spawn(self, cancel: CancellationToken) -> PollerHandle {
        let (tx, rx) = watch::channel(None);
        let refetch = self.refetch.clone();
        let task = tokio::spawn(self.run(tx, cancel.clone()));

        PollerHandle {
            status: rx,
            refetch,
            cancel,
            task: Some(task),
        }
    }

    async fn run(self, tx: watch::Sender<Option<DistributionStatus>>, cancel: CancellationToken) {
        tracing::info!("Distribution status poller started");
        let mut failing = false;

        loop {
            let interval = match self.api.get_today_status().await {
                Ok(status) => {
                    if failing {
                        tracing::info!("Distribution status fetch recovered");
                        failing = false;
                    }
                    let interval = poll_interval(Some(&status), Utc::now());
                    tx.send_if_modified(|current| {
                        if current.as_ref() == Some(&status) {
                            return false;
                        }
                        tracing::debug!(state = %status.status, "Distribution status changed");
                        *current = Some(status);
                        true
                    });
                    interval
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to fetch distribution status");
                    if !failing {
                        self.notifier.error(format!(
                            "Could not refresh distribution status: {}",
                            e.user_message()
                        ));
                        failing = true;
                    }
                    let last = tx.borrow().clone();
                    poll_interval(last.as_ref(), Utc::now())
                }
            };

            tracing::debug!(interval_secs = interval.as_secs(), "Next status poll scheduled");

            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = self.refetch.requested() => {
                    tracing::debug!("Manual status refetch requested");
                }
                _ = tokio::time::sleep(interval) => {}
            }
        }

        tracing::info!("Distribution status poller stopped");
    }
}

impl PollerHandle {
    /// Most recent snapshot, if any fetch has succeeded.
    pub fn latest(&self) -> Option<DistributionStatus> {
        self.status.borrow().clone()
    }

    /// Receiver that is notified whenever the snapshot changes.
    pub fn subscribe(&self) -> watch::Receiver<Option<DistributionStatus>> {
        self.status.clone()
    }

    pub fn refetch(&self) -> Refetch {
        self.refetch.clone()
    }

    /// Stop the poller and wait for the task to finish.
    pub async fn stop(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
