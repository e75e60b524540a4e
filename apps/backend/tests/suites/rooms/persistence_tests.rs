// Snapshots: every persisted transition lands in the store, and a room can
// be resumed from it by a fresh runtime.

use std::sync::Arc;

use meitra_backend::domain::{FixedDeck, GamePhase, TrumpType};
use meitra_backend::repos::game_states::UnavailableGameStateStore;
use meitra_backend::services::rooms::TeamAssignmentMethod;
use meitra_backend::ws::ConnectionHub;
use meitra_backend::{ErrorCode, GameConfig, GameRuntime};
use meitra_test_support::ids::table_of_four;

use crate::support::decks::canonical;
use crate::support::{settle, Table};

#[tokio::test]
async fn transitions_are_snapshotted() {
    let table = Table::started(GameConfig::for_tests(), 17, vec![canonical()]).await;
    let row = table.store.row(&table.room_id).expect("snapshot row");
    assert_eq!(row.game_phase, Some(GamePhase::Blow));
    assert_eq!(row.round_number, 1);
    assert_eq!(row.current_player_index, 0);
    assert_eq!(row.to_state().unwrap(), table.state());

    table.runtime.pass_bid(&table.room_id, &table.id(0)).unwrap();
    settle().await;
    let row = table.store.row(&table.room_id).unwrap();
    assert_eq!(row.current_player_index, 1);
    assert_eq!(row.team_assignments[table.id(3).as_str()], 1);
}

#[tokio::test]
async fn fresh_runtime_resumes_a_room_from_its_snapshot() {
    let table = Table::started(GameConfig::for_tests(), 17, vec![canonical()]).await;
    table
        .runtime
        .declare_bid(&table.room_id, &table.id(0), TrumpType::Hel, 7)
        .unwrap();
    settle().await;
    let before = table.state();

    let hub = Arc::new(ConnectionHub::new());
    let runtime = GameRuntime::new(
        GameConfig::for_tests(),
        Arc::new(FixedDeck::default()),
        table.store.clone(),
        hub.clone(),
    );
    let mut rx = hub.register("conn-resumed");
    let joined = runtime
        .reconnect(&table.room_id, &table.seats[1].token, "conn-resumed")
        .await
        .unwrap();
    assert_eq!(joined.player_id, table.id(1));
    assert!(rx.try_recv().is_ok());

    let after = runtime.snapshot(&table.room_id).unwrap();
    assert_eq!(after.blow_state, before.blow_state);
    assert_eq!(after.current_player_index, before.current_player_index);
    for (resumed, original) in after.players.iter().zip(&before.players) {
        assert_eq!(resumed.player_id, original.player_id);
        assert_eq!(resumed.hand, original.hand);
        assert_eq!(resumed.team, original.team);
    }
    let connected: Vec<bool> = after.players.iter().map(|p| p.is_connected()).collect();
    assert_eq!(connected, vec![false, true, false, false]);

    runtime.pass_bid(&table.room_id, &table.id(1)).unwrap();
}

#[tokio::test]
async fn store_outage_never_reaches_players() {
    let hub = Arc::new(ConnectionHub::new());
    let runtime = GameRuntime::new(
        GameConfig::for_tests(),
        Arc::new(FixedDeck::default()),
        Arc::new(UnavailableGameStateStore),
        hub.clone(),
    );
    let ids = table_of_four("down");
    let room = runtime
        .create_room("offline", &ids[0], None, TeamAssignmentMethod::HostChoice)
        .unwrap();
    for id in &ids {
        let connection_id = format!("conn-{id}");
        let _rx = hub.register(&connection_id);
        runtime.join_room(&room.id, id, id, &connection_id).unwrap();
        runtime.toggle_ready(&room.id, id).unwrap();
    }
    runtime.start_game(&room.id, &ids[0]).unwrap();
    settle().await;
    assert_eq!(runtime.snapshot(&room.id).unwrap().game_phase, Some(GamePhase::Blow));

    let err = runtime
        .reconnect("gone", "token", "conn-x")
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::StoreUnavailable);
}
