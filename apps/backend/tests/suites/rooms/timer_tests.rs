// Timed behaviour on a paused clock: grace periods and delayed broadcasts.

use std::time::Duration;

use meitra_backend::domain::chombo::ViolationType;
use meitra_backend::services::rooms::RoomStatus;
use meitra_backend::services::scheduler::TimerKey;
use meitra_backend::{ErrorCode, GameConfig};
use tokio::time::sleep;

use crate::support::decks::{canonical, card, four_jacks_for_seat_one};
use crate::support::{settle, Table};

fn timed() -> GameConfig {
    GameConfig {
        disconnect_grace: Duration::from_secs(15),
        broadcast_delay: Duration::from_secs(3),
        game_over_reset: Duration::from_secs(5),
        ..GameConfig::for_tests()
    }
}

#[tokio::test(start_paused = true)]
async fn reconnect_within_grace_keeps_the_seat() {
    let mut table = Table::started(timed(), 17, vec![canonical()]).await;
    let grace = TimerKey::DisconnectGrace(table.id(2));
    table
        .runtime
        .disconnect(&table.room_id, &table.seats[2].connection_id)
        .unwrap();
    assert!(!table.player(2).is_connected());
    assert!(table.runtime.scheduler().is_pending(&table.room_id, &grace));

    sleep(Duration::from_secs(10)).await;
    let token = table.seats[2].token.clone();
    let connection_id = table.new_connection(2);
    table
        .runtime
        .reconnect(&table.room_id, &token, &connection_id)
        .await
        .unwrap();
    assert!(!table.runtime.scheduler().is_pending(&table.room_id, &grace));

    sleep(Duration::from_secs(10)).await;
    let summary = table.runtime.room_summary(&table.room_id).unwrap();
    assert!(!summary.seats[2].is_vacant);
    assert!(summary.seats[2].is_connected);
}

#[tokio::test(start_paused = true)]
async fn grace_expiry_vacates_the_seat() {
    let mut table = Table::started(timed(), 17, vec![canonical()]).await;
    table
        .runtime
        .disconnect(&table.room_id, &table.seats[2].connection_id)
        .unwrap();

    sleep(Duration::from_secs(14)).await;
    let summary = table.runtime.room_summary(&table.room_id).unwrap();
    assert!(!summary.seats[2].is_vacant);

    sleep(Duration::from_secs(2)).await;
    let summary = table.runtime.room_summary(&table.room_id).unwrap();
    assert!(summary.seats[2].is_vacant);
    assert_eq!(summary.status, RoomStatus::Playing);
    assert!(table.drain_names(0).contains(&"game-paused"));
}

#[tokio::test(start_paused = true)]
async fn agari_and_field_completion_wait_for_the_broadcast_delay() {
    let mut table = Table::started(timed(), 17, vec![canonical()]).await;
    table.seat_zero_wins_hel(6);
    settle().await;
    assert!(!table.drain_names(0).contains(&"reveal-agari"));

    sleep(Duration::from_secs(3)).await;
    assert!(table.drain_names(0).contains(&"reveal-agari"));

    table
        .runtime
        .select_negri(&table.room_id, &table.id(0), card("5♣"))
        .unwrap();
    for (seat, token) in [(0, "K♥"), (1, "A♥"), (2, "7♥"), (3, "8♥")] {
        table
            .runtime
            .play_card(&table.room_id, &table.id(seat), card(token))
            .unwrap();
    }
    settle().await;
    assert!(table.state().play_state.fields.is_empty());
    let err = table
        .runtime
        .play_card(&table.room_id, &table.id(3), card("Q♥"))
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::PhaseMismatch);

    sleep(Duration::from_secs(3)).await;
    let state = table.state();
    assert_eq!(state.play_state.fields.len(), 1);
    assert_eq!(state.current_turn(), Some(table.id(1).as_str()));
}

#[tokio::test(start_paused = true)]
async fn finished_room_resets_after_its_delay() {
    let table = Table::started(timed(), 5, vec![four_jacks_for_seat_one()]).await;
    table.runtime.pass_bid(&table.room_id, &table.id(0)).unwrap();
    table.runtime.pass_bid(&table.room_id, &table.id(1)).unwrap();
    table
        .runtime
        .report_violation(&table.room_id, &table.id(2), &table.id(1), ViolationType::FourJack)
        .unwrap();

    let status = || table.runtime.room_summary(&table.room_id).unwrap().status;
    sleep(Duration::from_secs(4)).await;
    assert_eq!(status(), RoomStatus::Finished);
    sleep(Duration::from_secs(2)).await;
    assert_eq!(status(), RoomStatus::Waiting);
}
