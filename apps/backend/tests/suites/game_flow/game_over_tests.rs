// Reaching the target score ends the game and resets the room.

use meitra_backend::domain::chombo::ViolationType;
use meitra_backend::protocol::OutboundEvent;
use meitra_backend::services::rooms::RoomStatus;
use meitra_backend::GameConfig;

use crate::support::decks::four_jacks_for_seat_one;
use crate::support::{settle, Table};

#[tokio::test]
async fn penalty_reaching_the_target_ends_and_resets_the_game() {
    let mut table = Table::started(GameConfig::for_tests(), 5, vec![four_jacks_for_seat_one()]).await;
    table.runtime.pass_bid(&table.room_id, &table.id(0)).unwrap();
    table.runtime.pass_bid(&table.room_id, &table.id(1)).unwrap();
    table
        .runtime
        .report_violation(&table.room_id, &table.id(0), &table.id(1), ViolationType::FourJack)
        .unwrap();

    let summary = table.runtime.room_summary(&table.room_id).unwrap();
    assert_eq!(summary.status, RoomStatus::Finished);
    let events = table.drain(3);
    let over = events.iter().find_map(|e| match e {
        OutboundEvent::GameOver(g) => Some(g.clone()),
        _ => None,
    });
    let over = over.expect("game-over broadcast");
    assert_eq!(over.winner, 0);
    assert_eq!(over.final_scores[0].total, 5.0);
    assert!(!events.iter().any(|e| e.name() == "new-round-started"));

    settle().await;
    let summary = table.runtime.room_summary(&table.room_id).unwrap();
    assert_eq!(summary.status, RoomStatus::Waiting);
    assert!(summary.seats.iter().all(|s| !s.is_ready && !s.is_vacant));

    let state = table.state();
    assert_eq!(state.game_phase, None);
    assert_eq!(state.round_number, 1);
    assert_eq!(state.team_scores[0].total, 0.0);
    assert!(state.team_score_records.iter().all(|r| r.cards.is_empty()));
    assert_eq!(state.players.len(), 4);
    assert!(state.players.iter().all(|p| p.hand.is_empty()));

    for seat in 0..4 {
        table.runtime.toggle_ready(&table.room_id, &table.id(seat)).unwrap();
    }
    table.runtime.start_game(&table.room_id, &table.id(0)).unwrap();
    assert_eq!(
        table.runtime.room_summary(&table.room_id).unwrap().status,
        RoomStatus::Playing
    );
}
