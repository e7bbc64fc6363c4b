//! Poll cadence and failure handling under a paused tokio clock.
//!
//! Sleeps are offset by half an interval so assertions never race a tick
//! that fires at the same instant.

mod common;

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use stakeboard_console::notify::{Notifier, ToastLevel};
use stakeboard_console::poller::StatusPoller;
use stakeboard_core::distribution::DistributionState;

use common::{drain, pending_in, settle, status, FakeDistributionService};

async fn advance(secs: u64) {
    tokio::time::sleep(Duration::from_secs(secs)).await;
}

#[tokio::test(start_paused = true)]
async fn executing_polls_once_per_ten_second_tick() {
    let fake = FakeDistributionService::new(status(DistributionState::Executing));
    let handle =
        StatusPoller::new(fake.clone(), Notifier::default()).spawn(CancellationToken::new());

    settle().await;
    assert_eq!(fake.fetch_count(), 1);
    assert_eq!(handle.latest().unwrap().status, DistributionState::Executing);

    advance(5).await;
    assert_eq!(fake.fetch_count(), 1);

    for expected in 2..=5 {
        advance(10).await;
        assert_eq!(fake.fetch_count(), expected);
    }

    handle.stop().await;
}

#[tokio::test(start_paused = true)]
async fn distant_pending_polls_at_baseline() {
    let fake = FakeDistributionService::new(pending_in(3_600));
    let handle =
        StatusPoller::new(fake.clone(), Notifier::default()).spawn(CancellationToken::new());

    settle().await;
    advance(25).await;
    assert_eq!(fake.fetch_count(), 1);

    advance(10).await;
    assert_eq!(fake.fetch_count(), 2);

    handle.stop().await;
}

#[tokio::test(start_paused = true)]
async fn imminent_pending_polls_fast() {
    let fake = FakeDistributionService::new(pending_in(300));
    let handle =
        StatusPoller::new(fake.clone(), Notifier::default()).spawn(CancellationToken::new());

    settle().await;
    advance(15).await;
    assert_eq!(fake.fetch_count(), 2);

    handle.stop().await;
}

#[tokio::test(start_paused = true)]
async fn interval_follows_the_latest_status() {
    let fake = FakeDistributionService::new(status(DistributionState::Empty));
    let handle =
        StatusPoller::new(fake.clone(), Notifier::default()).spawn(CancellationToken::new());

    settle().await;
    fake.set_status(status(DistributionState::Executing));

    // Baseline wait still applies to the EMPTY snapshot.
    advance(25).await;
    assert_eq!(fake.fetch_count(), 1);
    advance(10).await;
    assert_eq!(fake.fetch_count(), 2);
    assert_eq!(handle.latest().unwrap().status, DistributionState::Executing);

    // Now on the fast cadence.
    advance(10).await;
    assert_eq!(fake.fetch_count(), 3);

    handle.stop().await;
}

#[tokio::test(start_paused = true)]
async fn refetch_fetches_immediately() {
    let fake = FakeDistributionService::new(status(DistributionState::Empty));
    let handle =
        StatusPoller::new(fake.clone(), Notifier::default()).spawn(CancellationToken::new());

    settle().await;
    assert_eq!(fake.fetch_count(), 1);

    handle.refetch().trigger();
    settle().await;
    assert_eq!(fake.fetch_count(), 2);

    handle.stop().await;
}

#[tokio::test(start_paused = true)]
async fn fetch_errors_keep_stale_status_and_toast_once() {
    let fake = FakeDistributionService::new(status(DistributionState::Executing));
    let notifier = Notifier::default();
    let mut toasts = notifier.subscribe();
    let handle = StatusPoller::new(fake.clone(), notifier).spawn(CancellationToken::new());

    settle().await;
    fake.fail_fetches(true);

    advance(15).await;
    advance(10).await;
    assert_eq!(fake.fetch_count(), 3);
    assert_eq!(handle.latest().unwrap().status, DistributionState::Executing);

    let errors: Vec<_> = drain(&mut toasts)
        .into_iter()
        .filter(|t| t.level == ToastLevel::Error)
        .collect();
    assert_eq!(errors.len(), 1);

    // Recovery picks up the new snapshot on the next regular tick.
    fake.fail_fetches(false);
    fake.set_status(status(DistributionState::Completed));
    advance(10).await;
    assert_eq!(handle.latest().unwrap().status, DistributionState::Completed);

    handle.stop().await;
}

#[tokio::test(start_paused = true)]
async fn subscribers_see_changes() {
    let fake = FakeDistributionService::new(status(DistributionState::Executing));
    let handle =
        StatusPoller::new(fake.clone(), Notifier::default()).spawn(CancellationToken::new());
    let mut rx = handle.subscribe();

    rx.changed().await.unwrap();
    assert_eq!(rx.borrow_and_update().as_ref().unwrap().status, DistributionState::Executing);

    fake.set_status(status(DistributionState::Completed));
    rx.changed().await.unwrap();
    assert_eq!(rx.borrow_and_update().as_ref().unwrap().status, DistributionState::Completed);

    handle.stop().await;
}

#[tokio::test(start_paused = true)]
async fn cancellation_stops_polling() {
    let fake = FakeDistributionService::new(status(DistributionState::Executing));
    let cancel = CancellationToken::new();
    let handle = StatusPoller::new(fake.clone(), Notifier::default()).spawn(cancel.clone());

    settle().await;
    cancel.cancel();
    settle().await;
    advance(60).await;

    assert_eq!(fake.fetch_count(), 1);
    drop(handle);
}

#[tokio::test(start_paused = true)]
async fn dropping_the_handle_stops_polling() {
    let fake = FakeDistributionService::new(status(DistributionState::Executing));
    let handle =
        StatusPoller::new(fake.clone(), Notifier::default()).spawn(CancellationToken::new());

    settle().await;
    drop(handle);
    settle().await;
    advance(60).await;

    assert_eq!(fake.fetch_count(), 1);
}
