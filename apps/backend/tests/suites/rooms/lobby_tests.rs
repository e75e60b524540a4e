// Lobby: creating, joining, readiness, teams and leaving before the game.

use meitra_backend::services::rooms::{RoomStatus, TeamAssignmentMethod};
use meitra_backend::{ErrorCode, GameConfig};
use meitra_test_support::ids::{table_of_four, unique_id};

use crate::support::{settle, Harness, Table};

#[tokio::test]
async fn create_room_validates_its_input() {
    let h = Harness::new(GameConfig::for_tests(), vec![]);
    let host = unique_id("host");

    let err = h
        .runtime
        .create_room("   ", &host, None, TeamAssignmentMethod::Random)
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::ValidationError);
    let err = h
        .runtime
        .create_room("lobby", &host, Some(0), TeamAssignmentMethod::Random)
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::ValidationError);

    let room = h
        .runtime
        .create_room("lobby", &host, None, TeamAssignmentMethod::Random)
        .unwrap();
    assert_eq!(room.points_to_win, 17);
    assert_eq!(room.status, RoomStatus::Waiting);
    assert_eq!(room.host_id, host);
    assert!(room.seats.is_empty());

    h.join(&room.id, &host);
    let err = h
        .runtime
        .create_room("second", &host, None, TeamAssignmentMethod::Random)
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::AlreadyInRoom);
    assert_eq!(h.runtime.list_rooms().len(), 1);
}

#[tokio::test]
async fn full_room_turns_a_fifth_player_away() {
    let table = Table::ready(GameConfig::for_tests(), 17, vec![]);
    let late = unique_id("late");
    let err = table
        .runtime
        .join_room(&table.room_id, &late, "Late", "conn-late")
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::RoomFull);
}

#[tokio::test]
async fn seated_player_cannot_join_another_room() {
    let table = Table::ready(GameConfig::for_tests(), 17, vec![]);
    let other = table
        .runtime
        .create_room("other", &unique_id("host"), None, TeamAssignmentMethod::Random)
        .unwrap();
    let err = table
        .runtime
        .join_room(&other.id, &table.id(0), "P0", "conn-elsewhere")
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::AlreadyInRoom);
}

#[tokio::test]
async fn readiness_gates_the_start() {
    let table = Table::ready(GameConfig::for_tests(), 17, vec![]);
    let status = || table.runtime.room_summary(&table.room_id).unwrap().status;
    assert_eq!(status(), RoomStatus::Ready);

    table.runtime.toggle_ready(&table.room_id, &table.id(2)).unwrap();
    assert_eq!(status(), RoomStatus::Waiting);
    let err = table
        .runtime
        .start_game(&table.room_id, &table.id(0))
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::RoomNotReady);

    table.runtime.toggle_ready(&table.room_id, &table.id(2)).unwrap();
    let err = table
        .runtime
        .start_game(&table.room_id, &table.id(1))
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotHost);

    table.runtime.start_game(&table.room_id, &table.id(0)).unwrap();
    assert_eq!(status(), RoomStatus::Playing);

    let err = table
        .runtime
        .toggle_ready(&table.room_id, &table.id(1))
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::GameInProgress);
    let late = unique_id("late");
    let err = table
        .runtime
        .join_room(&table.room_id, &late, "Late", "conn-late")
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::GameInProgress);
}

#[tokio::test]
async fn host_moves_players_and_start_alternates_seats() {
    let h = Harness::new(GameConfig::for_tests(), vec![]);
    let ids = table_of_four("t");
    let room = h
        .runtime
        .create_room("teams", &ids[0], None, TeamAssignmentMethod::HostChoice)
        .unwrap();
    for id in &ids[..3] {
        h.join(&room.id, id);
    }

    let err = h
        .runtime
        .change_team(&room.id, &ids[1], &ids[2], 1)
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotHost);
    let err = h
        .runtime
        .change_team(&room.id, &ids[0], &ids[1], 2)
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidTeam);
    let err = h
        .runtime
        .change_team(&room.id, &ids[1], &ids[1], 0)
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidTeam);

    h.runtime.change_team(&room.id, &ids[0], &ids[2], 1).unwrap();
    h.join(&room.id, &ids[3]);
    let teams: Vec<u8> = h
        .runtime
        .snapshot(&room.id)
        .unwrap()
        .players
        .iter()
        .map(|p| p.team)
        .collect();
    assert_eq!(teams, vec![0, 1, 1, 0]);

    for id in &ids {
        h.runtime.toggle_ready(&room.id, id).unwrap();
    }
    h.runtime.start_game(&room.id, &ids[0]).unwrap();
    let state = h.runtime.snapshot(&room.id).unwrap();
    let order: Vec<&str> = state.players.iter().map(|p| p.player_id.as_str()).collect();
    assert_eq!(order, vec![&ids[0][..], &ids[1][..], &ids[3][..], &ids[2][..]]);
    let teams: Vec<u8> = state.players.iter().map(|p| p.team).collect();
    assert_eq!(teams, vec![0, 1, 0, 1]);
    let summary = h.runtime.room_summary(&room.id).unwrap();
    let seat_ids: Vec<_> = summary.seats.iter().map(|s| s.player_id.clone().unwrap()).collect();
    assert_eq!(seat_ids, order);
}

#[tokio::test]
async fn random_assignment_balances_teams() {
    let h = Harness::new(GameConfig::for_tests(), vec![]);
    let ids = table_of_four("r");
    let room = h
        .runtime
        .create_room("random", &ids[0], None, TeamAssignmentMethod::Random)
        .unwrap();
    for id in &ids {
        h.join(&room.id, id);
    }
    let state = h.runtime.snapshot(&room.id).unwrap();
    for team in 0..2u8 {
        assert_eq!(state.players.iter().filter(|p| p.team == team).count(), 2);
    }
}

#[tokio::test]
async fn leaving_the_lobby_passes_host_and_the_last_one_out_closes_the_room() {
    let mut table = Table::ready(GameConfig::for_tests(), 17, vec![]);
    table.runtime.leave_room(&table.room_id, &table.id(0)).unwrap();

    let summary = table.runtime.room_summary(&table.room_id).unwrap();
    assert_eq!(summary.seats.len(), 3);
    assert_eq!(summary.host_id, table.id(1));
    assert_eq!(summary.status, RoomStatus::Waiting);
    assert!(table.drain_names(1).contains(&"room-updated"));

    for seat in 1..4 {
        table.runtime.leave_room(&table.room_id, &table.id(seat)).unwrap();
    }
    assert!(table.runtime.rooms().is_empty());
    let err = table.runtime.room_summary(&table.room_id).unwrap_err();
    assert_eq!(err.code(), ErrorCode::RoomNotFound);

    settle().await;
    assert!(table.store.row(&table.room_id).is_none());
}
