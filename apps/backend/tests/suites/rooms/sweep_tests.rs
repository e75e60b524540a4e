// Idle sweep: abandoned rooms are closed and their snapshots dropped.

use std::time::Duration;

use meitra_backend::{ErrorCode, GameConfig};
use time::OffsetDateTime;
use tokio_util::sync::CancellationToken;

use crate::support::decks::canonical;
use crate::support::{settle, Harness, Table};

#[tokio::test]
async fn idle_rooms_are_abandoned_and_deleted() {
    let mut table = Table::started(GameConfig::for_tests(), 17, vec![canonical()]).await;
    assert!(table.store.row(&table.room_id).is_some());

    assert_eq!(table.runtime.sweep_idle(OffsetDateTime::now_utc()), 0);
    let later = OffsetDateTime::now_utc() + time::Duration::hours(2);
    assert_eq!(table.runtime.sweep_idle(later), 1);

    assert!(table.runtime.rooms().is_empty());
    assert!(table.drain_names(0).contains(&"room-deleted"));
    let err = table.runtime.snapshot(&table.room_id).unwrap_err();
    assert_eq!(err.code(), ErrorCode::RoomNotFound);

    settle().await;
    assert!(table.store.row(&table.room_id).is_none());
}

#[tokio::test(start_paused = true)]
async fn sweeper_stops_on_shutdown() {
    let h = Harness::new(GameConfig::for_tests(), vec![]);
    let shutdown = CancellationToken::new();
    let sweeper = tokio::spawn(h.runtime.clone().run_sweeper(shutdown.clone()));

    tokio::time::sleep(Duration::from_secs(180)).await;
    assert!(!sweeper.is_finished());
    shutdown.cancel();
    sweeper.await.unwrap();
}
