// Unit tests for error mapping - pure domain logic without transport or storage
use crate::errors::domain::{
    ConflictKind, DomainError, InfraErrorKind, NotFoundKind, ValidationKind,
};
use crate::protocol::events::OutboundEvent;
use crate::{AppError, ErrorCode};

#[test]
fn maps_validation_kinds_to_codes() {
    let app: AppError = DomainError::out_of_turn("not your turn").into();
    assert_eq!(app.code(), ErrorCode::OutOfTurn);
    assert!(app.is_rejection());

    let app: AppError =
        DomainError::validation(ValidationKind::MustFollowSuit, "follow ♥").into();
    assert_eq!(app.code().as_str(), "MUST_FOLLOW_SUIT");

    let app: AppError =
        DomainError::validation(ValidationKind::Other("x".into()), "generic").into();
    assert_eq!(app.code(), ErrorCode::ValidationError);
}

#[test]
fn maps_conflicts() {
    let app: AppError = DomainError::conflict(ConflictKind::SeatTaken, "seat taken").into();
    assert_eq!(app.code().as_str(), "SEAT_TAKEN");

    let app: AppError =
        DomainError::conflict(ConflictKind::Other("x".to_string()), "generic conflict").into();
    assert_eq!(app.code().as_str(), "CONFLICT");
}

#[test]
fn maps_not_found() {
    let app: AppError = DomainError::not_found(NotFoundKind::Room, "no room").into();
    assert_eq!(app.code(), ErrorCode::RoomNotFound);
    assert_eq!(app.detail(), "no room");
}

#[test]
fn maps_infra() {
    let app: AppError = DomainError::infra(InfraErrorKind::Timeout, "timeout").into();
    assert!(matches!(app, AppError::Timeout { .. }));
    assert!(!app.is_rejection());

    let app: AppError =
        DomainError::infra(InfraErrorKind::DataCorruption, "bad snapshot").into();
    assert_eq!(app.code(), ErrorCode::DataCorruption);
}

#[test]
fn renders_error_event() {
    let app = AppError::validation(ErrorCode::InvalidBid, "bid too low");
    match app.to_event() {
        OutboundEvent::Error(payload) => {
            assert_eq!(payload.code, "INVALID_BID");
            assert_eq!(payload.message, "bid too low");
        }
        other => panic!("unexpected event {other:?}"),
    }
}
