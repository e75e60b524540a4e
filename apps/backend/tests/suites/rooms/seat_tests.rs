// Mid-game seats: leaving, returning, claiming and reconnecting by token.

use std::collections::HashSet;

use meitra_backend::domain::{Card, GamePhase, GameState, TrumpType};
use meitra_backend::{ErrorCode, GameConfig};
use meitra_test_support::ids::unique_id;

use crate::support::decks::{canonical, four_jacks_for_seat_one, jacks};
use crate::support::{settle, Table};

#[tokio::test]
async fn leaving_mid_game_pauses_until_the_player_returns() {
    let mut table = Table::started(GameConfig::for_tests(), 17, vec![canonical()]).await;
    let hand = table.player(2).hand.clone();

    table.runtime.leave_room(&table.room_id, &table.id(2)).unwrap();
    let summary = table.runtime.room_summary(&table.room_id).unwrap();
    assert!(summary.seats[2].is_vacant);
    assert!(!summary.seats[2].is_connected);
    assert!(table.drain_names(0).contains(&"game-paused"));

    let err = table
        .runtime
        .declare_bid(&table.room_id, &table.id(0), TrumpType::Hel, 6)
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::PhaseMismatch);

    let connection_id = table.new_connection(2);
    let joined = table
        .runtime
        .join_room(&table.room_id, &table.id(2), "P2", &connection_id)
        .unwrap();
    assert_eq!(joined.reconnect_token.as_deref(), Some(table.seats[2].token.as_str()));

    let back = table.player(2);
    assert_eq!(back.hand, hand);
    assert_eq!(back.team, 0);
    assert_eq!(back.connection_id, connection_id);
    assert!(table.drain_names(0).contains(&"game-resumed"));

    table
        .runtime
        .declare_bid(&table.room_id, &table.id(0), TrumpType::Hel, 6)
        .unwrap();
}

#[tokio::test]
async fn newcomer_claims_a_vacated_seat_and_the_round_restarts() {
    let table = Table::started(GameConfig::for_tests(), 17, vec![canonical()]).await;
    table
        .runtime
        .declare_bid(&table.room_id, &table.id(0), TrumpType::Hel, 6)
        .unwrap();
    table.runtime.leave_room(&table.room_id, &table.id(2)).unwrap();

    let newcomer = unique_id("p4");
    let connection_id = format!("conn-{newcomer}");
    let mut rx = table.hub.register(&connection_id);
    let joined = table
        .runtime
        .join_room(&table.room_id, &newcomer, "P4", &connection_id)
        .unwrap();
    assert!(joined.reconnect_token.is_some());

    let state = table.state();
    assert!(state.player(&table.id(2)).is_none());
    assert_eq!(state.player_index(&newcomer), Some(2));
    let claimed = state.player(&newcomer).unwrap();
    assert!(claimed.hand.is_empty());
    assert_eq!(claimed.team, 0);

    settle().await;
    let state = table.state();
    assert_eq!(state.game_phase, Some(GamePhase::Blow));
    assert_eq!(state.round_number, 1);
    assert!(state.blow_state.declarations.is_empty());
    assert_eq!(state.current_turn(), Some(table.id(0).as_str()));
    assert!(state.players.iter().all(|p| p.hand.len() == 10));
    assert!(state.is_conserved());

    let mut names = Vec::new();
    while let Ok(event) = rx.try_recv() {
        names.push(event.name());
    }
    assert!(names.contains(&"new-round-started"));

    let err = table
        .runtime
        .reconnect(&table.room_id, &table.seats[2].token, "conn-ghost")
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::PlayerNotFound);
    let err = table
        .runtime
        .join_room(&table.room_id, &table.id(2), "P2", "conn-ghost")
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::GameInProgress);
}

#[tokio::test]
async fn reconnect_token_rebinds_the_connection() {
    let mut table = Table::started(GameConfig::for_tests(), 17, vec![canonical()]).await;
    let token = table.seats[1].token.clone();
    let connection_id = table.new_connection(1);

    let joined = table
        .runtime
        .reconnect(&table.room_id, &token, &connection_id)
        .await
        .unwrap();
    assert_eq!(joined.player_id, table.id(1));
    assert_eq!(table.player(1).connection_id, connection_id);
    assert!(table.drain_names(1).contains(&"update-players"));

    let err = table
        .runtime
        .reconnect(&table.room_id, "not-a-token", "conn-x")
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::PlayerNotFound);

    let err = table
        .runtime
        .reconnect("no-such-room", &token, "conn-x")
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::RoomNotFound);
}

fn cards_in_hands(state: &GameState) -> (usize, usize) {
    let held: Vec<Card> = state
        .players
        .iter()
        .flat_map(|p| p.hand.iter().copied())
        .collect();
    let unique: HashSet<Card> = held.iter().copied().collect();
    (held.len(), unique.len())
}

#[tokio::test]
async fn broken_redeal_waits_for_the_vacated_seat() {
    let mut table =
        Table::started(GameConfig::for_tests(), 17, vec![four_jacks_for_seat_one()]).await;
    let jack_hand = table.player(1).hand.clone();
    table
        .runtime
        .reveal_broken(&table.room_id, &table.id(1))
        .unwrap();
    table.runtime.leave_room(&table.room_id, &table.id(1)).unwrap();

    settle().await;
    let state = table.state();
    assert_eq!(state.player(&table.id(1)).unwrap().hand, jack_hand);
    assert!(state.is_conserved());

    let connection_id = table.new_connection(1);
    table
        .runtime
        .join_room(&table.room_id, &table.id(1), "P1", &connection_id)
        .unwrap();
    settle().await;

    let state = table.state();
    assert_eq!(state.game_phase, Some(GamePhase::Blow));
    assert_eq!(state.round_number, 1);
    assert_eq!(state.current_turn(), Some(table.id(0).as_str()));
    assert!(state.players.iter().all(|p| p.hand.len() == 10));
    assert_eq!(cards_in_hands(&state), (40, 40), "a card is held by two players");
    assert!(!jacks().iter().all(|j| table.player(1).holds(*j)));
    assert!(state.is_conserved());

    let names = table.drain_names(1);
    assert!(names.contains(&"game-resumed"));
    assert!(names.contains(&"new-round-started"));
}

#[tokio::test]
async fn claim_and_return_with_two_vacancies_redeals_everyone() {
    let mut table = Table::started(GameConfig::for_tests(), 17, vec![canonical()]).await;
    table.runtime.leave_room(&table.room_id, &table.id(1)).unwrap();
    table.runtime.leave_room(&table.room_id, &table.id(2)).unwrap();

    let newcomer = unique_id("p4");
    let newcomer_conn = format!("conn-{newcomer}");
    let _rx = table.hub.register(&newcomer_conn);
    table
        .runtime
        .join_room(&table.room_id, &newcomer, "P4", &newcomer_conn)
        .unwrap();
    let state = table.state();
    assert_eq!(state.player_index(&newcomer), Some(1));
    assert!(state.player(&newcomer).unwrap().hand.is_empty());
    assert!(state.is_conserved());

    let connection_id = table.new_connection(2);
    table
        .runtime
        .join_room(&table.room_id, &table.id(2), "P2", &connection_id)
        .unwrap();
    settle().await;

    let state = table.state();
    let summary = table.runtime.room_summary(&table.room_id).unwrap();
    assert!(summary.seats.iter().all(|s| !s.is_vacant));
    assert_eq!(state.game_phase, Some(GamePhase::Blow));
    let hands: Vec<usize> = state.players.iter().map(|p| p.hand.len()).collect();
    assert_eq!(hands, vec![10, 10, 10, 10]);
    assert!(state.deck.is_empty());
    assert_eq!(cards_in_hands(&state), (40, 40));
    assert!(state.is_conserved());
    assert!(table.drain_names(2).contains(&"game-resumed"));
}
