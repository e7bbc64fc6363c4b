//! One-second countdown task driven by the poller's status channel.
//!
//! While the latest snapshot is PENDING with a `scheduledFor` time, the
//! task republishes the remaining time every second.  The deadline is
//! anchored to the tokio clock whenever a snapshot arrives, so the display
//! follows `tokio::time` (and paused test clocks).  When it reaches zero
//! it shows [`EXECUTING_NOW`](stakeboard_core::countdown::EXECUTING_NOW)
//! and asks the poller for exactly one refetch for that scheduled time.
//! Outside PENDING it sleeps until the status changes.

use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use stakeboard_core::countdown::{display_for_remaining, CountdownDisplay};
use stakeboard_core::distribution::{DistributionState, DistributionStatus};
use stakeboard_core::types::Timestamp;

use crate::poller::Refetch;

const TICK: Duration = Duration::from_secs(1);

/// Owner handle for a running countdown.  Dropping it stops the task.
pub struct CountdownHandle {
    display: watch::Receiver<Option<CountdownDisplay>>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl CountdownHandle {
    pub fn current(&self) -> Option<CountdownDisplay> {
        self.display.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<CountdownDisplay>> {
        self.display.clone()
    }

    pub async fn stop(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for CountdownHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

pub fn spawn_countdown(
    status: watch::Receiver<Option<DistributionStatus>>,
    refetch: Refetch,
    cancel: CancellationToken,
) -> CountdownHandle {
    let (tx, rx) = watch::channel(None);
    let task = tokio::spawn(run(status, tx, refetch, cancel.clone()));
    CountdownHandle {
        display: rx,
        cancel,
        task: Some(task),
    }
}

/// Scheduled time of a PENDING snapshot and its deadline on the tokio clock.
fn anchor(snapshot: Option<&DistributionStatus>) -> Option<(Timestamp, Instant)> {
    let status = snapshot?;
    if status.status != DistributionState::Pending {
        return None;
    }
    let scheduled_for = status.scheduled_for?;
    let remaining = (scheduled_for - Utc::now()).to_std().unwrap_or_default();
    Some((scheduled_for, Instant::now() + remaining))
}

async fn run(
    mut status: watch::Receiver<Option<DistributionStatus>>,
    tx: watch::Sender<Option<CountdownDisplay>>,
    refetch: Refetch,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(TICK);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut refetched_for: Option<Timestamp> = None;
    let mut target = anchor(status.borrow_and_update().as_ref());

    loop {
        let display = target.map(|(_, deadline)| {
            display_for_remaining(deadline.saturating_duration_since(Instant::now()))
        });

        if display == Some(CountdownDisplay::ExecutingNow) {
            let scheduled_for = target.map(|(at, _)| at);
            if refetched_for != scheduled_for {
                tracing::info!("Scheduled distribution time reached, refreshing status");
                refetched_for = scheduled_for;
                refetch.trigger();
            }
        }

        let active = display.is_some();
        tx.send_if_modified(|current| {
            if *current == display {
                return false;
            }
            *current = display;
            true
        });

        if active {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                changed = status.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    target = anchor(status.borrow_and_update().as_ref());
                }
                _ = ticker.tick() => {}
            }
        } else {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                changed = status.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    target = anchor(status.borrow_and_update().as_ref());
                }
            }
            ticker.reset();
        }
    }

    tracing::debug!("Countdown stopped");
}
