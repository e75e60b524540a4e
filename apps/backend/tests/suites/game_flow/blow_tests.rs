// Blow phase: declarations, passes, cancellation and the Agari hand-off.

use meitra_backend::domain::{Card, GamePhase, TrumpType};
use meitra_backend::protocol::OutboundEvent;
use meitra_backend::{ErrorCode, GameConfig};

use crate::support::decks::canonical;
use crate::support::{settle, Table};

#[tokio::test]
async fn start_deals_ten_each_and_seat_zero_opens() {
    let table = Table::started(GameConfig::for_tests(), 17, vec![canonical()]).await;
    let state = table.state();

    assert_eq!(state.game_phase, Some(GamePhase::Blow));
    assert_eq!(state.round_number, 1);
    assert_eq!(state.current_turn(), Some(table.id(0).as_str()));
    assert_eq!(state.agari, Some(Card::Joker));
    for player in &state.players {
        assert_eq!(player.hand.len(), 10);
    }
    let teams: Vec<u8> = state.players.iter().map(|p| p.team).collect();
    assert_eq!(teams, vec![0, 1, 0, 1]);
    assert!(state.is_conserved());
}

#[tokio::test]
async fn declaration_won_by_seat_zero_moves_to_play() {
    let mut table = Table::started(GameConfig::for_tests(), 17, vec![canonical()]).await;
    table.seat_zero_wins_hel(6);

    let state = table.state();
    assert_eq!(state.game_phase, Some(GamePhase::Play));
    assert_eq!(state.trump(), Some(TrumpType::Hel));
    assert_eq!(state.declarer_id(), Some(table.id(0).as_str()));
    assert_eq!(state.agari, None);
    let declarer = table.player(0);
    assert_eq!(declarer.hand.len(), 11);
    assert!(declarer.holds(Card::Joker));
    assert!(state.is_conserved());

    settle().await;
    let declarer_events = table.drain(0);
    let reveal = declarer_events.iter().find_map(|e| match e {
        OutboundEvent::RevealAgari(r) => Some(r.clone()),
        _ => None,
    });
    let reveal = reveal.expect("declarer sees the Agari");
    assert_eq!(reveal.agari, Some(Card::Joker));
    assert_eq!(reveal.player_id, table.id(0));

    let others = table.drain_names(1);
    assert!(!others.contains(&"reveal-agari"));
    assert!(others.contains(&"update-phase"));
}

#[tokio::test]
async fn out_of_turn_declaration_is_rejected_without_change() {
    let table = Table::started(GameConfig::for_tests(), 17, vec![canonical()]).await;
    let before = table.state();

    let err = table
        .runtime
        .declare_bid(&table.room_id, &table.id(1), TrumpType::Tra, 6)
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::OutOfTurn);
    assert_eq!(table.state(), before);
}

#[tokio::test]
async fn weaker_declaration_is_rejected() {
    let table = Table::started(GameConfig::for_tests(), 17, vec![canonical()]).await;
    table
        .runtime
        .declare_bid(&table.room_id, &table.id(0), TrumpType::Hel, 7)
        .unwrap();

    let err = table
        .runtime
        .declare_bid(&table.room_id, &table.id(1), TrumpType::Daya, 7)
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidBid);

    table
        .runtime
        .declare_bid(&table.room_id, &table.id(1), TrumpType::Tra, 7)
        .unwrap();
    let state = table.state();
    let highest = state.blow_state.current_highest_declaration.as_ref().unwrap();
    assert_eq!(highest.trump_type, TrumpType::Tra);
    assert_eq!(state.current_turn(), Some(table.id(2).as_str()));
}

#[tokio::test]
async fn pairs_outside_range_are_rejected() {
    let table = Table::started(GameConfig::for_tests(), 17, vec![canonical()]).await;
    for pairs in [5, 11] {
        let err = table
            .runtime
            .declare_bid(&table.room_id, &table.id(0), TrumpType::Zuppe, pairs)
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidBid, "{pairs} pairs");
    }
}

#[tokio::test]
async fn four_passes_cancel_and_rotate_the_opening_seat() {
    let mut table = Table::started(GameConfig::for_tests(), 17, vec![canonical()]).await;
    for seat in 0..4 {
        table.runtime.pass_bid(&table.room_id, &table.id(seat)).unwrap();
    }

    let state = table.state();
    assert_eq!(state.game_phase, Some(GamePhase::Blow));
    assert_eq!(state.current_turn(), Some(table.id(1).as_str()));
    assert!(state.blow_state.declarations.is_empty());
    assert!(state.players.iter().all(|p| !p.is_passer && p.hand.len() == 10));
    assert!(table.drain_names(2).contains(&"round-cancelled"));
}

#[tokio::test]
async fn passing_twice_is_rejected() {
    let table = Table::started(GameConfig::for_tests(), 17, vec![canonical()]).await;
    table.runtime.pass_bid(&table.room_id, &table.id(0)).unwrap();
    let err = table
        .runtime
        .pass_bid(&table.room_id, &table.id(0))
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::OutOfTurn);
}

#[tokio::test]
async fn trump_stays_unset_until_the_blow_closes() {
    let table = Table::started(GameConfig::for_tests(), 17, vec![canonical()]).await;
    table
        .runtime
        .declare_bid(&table.room_id, &table.id(0), TrumpType::Daya, 6)
        .unwrap();
    table
        .runtime
        .declare_bid(&table.room_id, &table.id(1), TrumpType::Hel, 6)
        .unwrap();
    let state = table.state();
    assert!(state.blow_state.current_trump.is_none());
    assert_eq!(state.game_phase, Some(GamePhase::Blow));

    table.runtime.pass_bid(&table.room_id, &table.id(2)).unwrap();
    assert!(table.state().blow_state.current_trump.is_none());
    table.runtime.pass_bid(&table.room_id, &table.id(3)).unwrap();

    let state = table.state();
    assert_eq!(state.game_phase, Some(GamePhase::Play));
    assert_eq!(state.blow_state.current_trump, Some(TrumpType::Hel));
    assert_eq!(state.declarer_id(), Some(table.id(1).as_str()));
}
