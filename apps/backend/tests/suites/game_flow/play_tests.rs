// Play phase: Negri, card legality, Joker leads and field completion.

use meitra_backend::domain::chombo::ViolationType;
use meitra_backend::domain::{Card, GamePhase, Suit};
use meitra_backend::protocol::OutboundEvent;
use meitra_backend::{ErrorCode, GameConfig};

use crate::support::decks::{canonical, card};
use crate::support::{settle, Table};

async fn in_play() -> Table {
    let mut table = Table::started(GameConfig::for_tests(), 17, vec![canonical()]).await;
    table.seat_zero_wins_hel(6);
    settle().await;
    table.drain_all();
    table
}

async fn negri_set() -> Table {
    let mut table = in_play().await;
    table
        .runtime
        .select_negri(&table.room_id, &table.id(0), card("5♣"))
        .unwrap();
    table.drain_all();
    table
}

#[tokio::test]
async fn negri_leaves_ten_cards_and_opens_the_first_field() {
    let table = in_play().await;
    table
        .runtime
        .select_negri(&table.room_id, &table.id(0), card("5♣"))
        .unwrap();

    let state = table.state();
    assert_eq!(state.play_state.negri_card, Some(card("5♣")));
    assert_eq!(table.player(0).hand.len(), 10);
    assert!(!table.player(0).holds(card("5♣")));
    let field = state.play_state.current_field.as_ref().unwrap();
    assert_eq!(field.dealer_id, table.id(0));
    assert_eq!(state.current_turn(), Some(table.id(0).as_str()));
    assert!(state.is_conserved());
}

#[tokio::test]
async fn negri_is_declarer_only_and_chosen_once() {
    let table = in_play().await;
    let err = table
        .runtime
        .select_negri(&table.room_id, &table.id(1), card("6♥"))
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotDeclarer);

    let err = table
        .runtime
        .select_negri(&table.room_id, &table.id(0), card("A♥"))
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::CardNotInHand);

    table
        .runtime
        .select_negri(&table.room_id, &table.id(0), card("5♣"))
        .unwrap();
    let err = table
        .runtime
        .select_negri(&table.room_id, &table.id(0), card("9♣"))
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::NegriAlreadySelected);
}

#[tokio::test]
async fn playing_before_the_negri_is_rejected_and_recorded() {
    let table = in_play().await;
    let err = table
        .runtime
        .play_card(&table.room_id, &table.id(0), card("K♥"))
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::NegriNotSelected);

    let state = table.state();
    assert!(table.player(0).holds(card("K♥")));
    let recorded: Vec<_> = state.chombo_violations.active_violations().collect();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].violation_type, ViolationType::NegriForget);
    assert_eq!(recorded[0].player_id, table.id(0));
}

#[tokio::test]
async fn full_field_is_won_by_the_strongest_card() {
    let mut table = negri_set().await;
    let plays = [(0, "K♥"), (1, "A♥"), (2, "7♥"), (3, "8♥")];
    for (seat, token) in plays {
        table
            .runtime
            .play_card(&table.room_id, &table.id(seat), card(token))
            .unwrap();
    }

    settle().await;
    let state = table.state();
    assert_eq!(state.play_state.fields.len(), 1);
    let completed = &state.play_state.fields[0];
    assert_eq!(completed.winner_id, table.id(1));
    assert_eq!(completed.winner_team, 1);
    assert_eq!(state.current_turn(), Some(table.id(1).as_str()));
    let next = state.play_state.current_field.as_ref().unwrap();
    assert_eq!(next.dealer_id, table.id(1));
    assert!(next.cards.is_empty());
    assert!(state.players.iter().all(|p| p.hand.len() == 9));
    assert!(state.is_conserved());

    let names = table.drain_names(2);
    let played = names.iter().filter(|n| **n == "card-played").count();
    assert_eq!(played, 4);
    assert!(names.contains(&"field-complete"));
}

#[tokio::test]
async fn follow_suit_and_turn_order_are_enforced() {
    let table = negri_set().await;
    table
        .runtime
        .play_card(&table.room_id, &table.id(0), card("K♥"))
        .unwrap();

    let err = table
        .runtime
        .play_card(&table.room_id, &table.id(2), card("7♥"))
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::OutOfTurn);

    let err = table
        .runtime
        .play_card(&table.room_id, &table.id(1), card("6♣"))
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::MustFollowSuit);

    let err = table
        .runtime
        .play_card(&table.room_id, &table.id(1), card("7♥"))
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::CardNotInHand);

    let field = table.state().play_state.current_field.unwrap();
    assert_eq!(field.cards, vec![card("K♥")]);
}

#[tokio::test]
async fn joker_lead_waits_for_a_base_suit() {
    let mut table = negri_set().await;
    table
        .runtime
        .play_card(&table.room_id, &table.id(0), Card::Joker)
        .unwrap();

    let state = table.state();
    assert!(state.play_state.current_field.as_ref().unwrap().awaits_base_suit());
    assert_eq!(state.current_turn(), Some(table.id(0).as_str()));
    let err = table
        .runtime
        .play_card(&table.room_id, &table.id(1), card("6♣"))
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::OutOfTurn);

    let err = table
        .runtime
        .select_base_suit(&table.room_id, &table.id(1), Suit::Clubs)
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::OutOfTurn);

    table
        .runtime
        .select_base_suit(&table.room_id, &table.id(0), Suit::Clubs)
        .unwrap();
    assert!(table
        .drain(1)
        .iter()
        .any(|e| matches!(e, OutboundEvent::FieldUpdated(f) if f.base_suit == Some(Suit::Clubs))));

    let err = table
        .runtime
        .play_card(&table.room_id, &table.id(1), card("8♦"))
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::MustFollowSuit);

    for (seat, token) in [(1, "6♣"), (2, "7♣"), (3, "8♣")] {
        table
            .runtime
            .play_card(&table.room_id, &table.id(seat), card(token))
            .unwrap();
    }
    settle().await;
    let state = table.state();
    assert_eq!(state.play_state.fields[0].winner_id, table.id(0));
    assert_eq!(state.current_turn(), Some(table.id(0).as_str()));

    let err = table
        .runtime
        .select_base_suit(&table.room_id, &table.id(0), Suit::Spades)
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::BaseSuitNotRequired);
}

#[tokio::test]
async fn open_is_only_for_the_declarer_leading_a_fresh_field() {
    let mut table = negri_set().await;
    let err = table
        .runtime
        .declare_open(&table.room_id, &table.id(1))
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidOpen);
    let recorded = table.state().chombo_violations.all().to_vec();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].violation_type, ViolationType::WrongOpen);

    table
        .runtime
        .declare_open(&table.room_id, &table.id(0))
        .unwrap();
    let state = table.state();
    assert!(state.play_state.open_declared);
    assert_eq!(state.play_state.open_declarer_id, Some(table.id(0)));
    assert!(table.drain_names(3).contains(&"open-declared"));
    assert_eq!(state.game_phase, Some(GamePhase::Play));
}
