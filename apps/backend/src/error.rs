use serde::Serialize;
use thiserror::Error;

use crate::errors::domain::{
    ConflictKind, DomainError, InfraErrorKind, NotFoundKind, ValidationKind,
};
use crate::errors::ErrorCode;
use crate::protocol::events::OutboundEvent;

/// Error payload rendered into the outbound `error` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorPayload {
    pub code: String,
    pub message: String,
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {detail}")]
    Validation { code: ErrorCode, detail: String },
    #[error("Not found: {detail}")]
    NotFound { code: ErrorCode, detail: String },
    #[error("Conflict: {detail}")]
    Conflict { code: ErrorCode, detail: String },
    #[error("Store unavailable: {detail}")]
    StoreUnavailable { detail: String },
    #[error("Timeout: {detail}")]
    Timeout { detail: String },
    #[error("Internal error: {detail}")]
    Internal { code: ErrorCode, detail: String },
    #[error("Configuration error: {detail}")]
    Config { detail: String },
}

impl AppError {
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Validation { code, .. } => *code,
            AppError::NotFound { code, .. } => *code,
            AppError::Conflict { code, .. } => *code,
            AppError::StoreUnavailable { .. } => ErrorCode::StoreUnavailable,
            AppError::Timeout { .. } => ErrorCode::StoreTimeout,
            AppError::Internal { code, .. } => *code,
            AppError::Config { .. } => ErrorCode::ConfigError,
        }
    }

    pub fn detail(&self) -> String {
        match self {
            AppError::Validation { detail, .. }
            | AppError::NotFound { detail, .. }
            | AppError::Conflict { detail, .. }
            | AppError::StoreUnavailable { detail }
            | AppError::Timeout { detail }
            | AppError::Internal { detail, .. }
            | AppError::Config { detail } => detail.clone(),
        }
    }

    /// Rejections that leave the room untouched and are worth only a warning.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            AppError::Validation { .. } | AppError::NotFound { .. } | AppError::Conflict { .. }
        )
    }

    pub fn payload(&self) -> ErrorPayload {
        ErrorPayload {
            code: self.code().as_str().to_string(),
            message: self.detail(),
        }
    }

    /// The `error` notification sent back to the offending connection.
    pub fn to_event(&self) -> OutboundEvent {
        OutboundEvent::Error(self.payload())
    }

    // Convenience constructors
    pub fn validation(code: ErrorCode, detail: impl Into<String>) -> Self {
        Self::Validation {
            code,
            detail: detail.into(),
        }
    }

    pub fn not_found(code: ErrorCode, detail: impl Into<String>) -> Self {
        Self::NotFound {
            code,
            detail: detail.into(),
        }
    }

    pub fn conflict(code: ErrorCode, detail: impl Into<String>) -> Self {
        Self::Conflict {
            code,
            detail: detail.into(),
        }
    }

    pub fn internal(code: ErrorCode, detail: impl Into<String>) -> Self {
        Self::Internal {
            code,
            detail: detail.into(),
        }
    }

    pub fn config(detail: impl Into<String>) -> Self {
        Self::Config {
            detail: detail.into(),
        }
    }
}

fn validation_code(kind: &ValidationKind) -> ErrorCode {
    match kind {
        ValidationKind::OutOfTurn => ErrorCode::OutOfTurn,
        ValidationKind::PhaseMismatch => ErrorCode::PhaseMismatch,
        ValidationKind::CardNotInHand => ErrorCode::CardNotInHand,
        ValidationKind::MustFollowSuit => ErrorCode::MustFollowSuit,
        ValidationKind::MustPlayJoker => ErrorCode::MustPlayJoker,
        ValidationKind::InvalidBid => ErrorCode::InvalidBid,
        ValidationKind::AlreadyActed => ErrorCode::AlreadyActed,
        ValidationKind::BaseSuitNotRequired => ErrorCode::BaseSuitNotRequired,
        ValidationKind::NegriNotSelected => ErrorCode::NegriNotSelected,
        ValidationKind::NegriAlreadySelected => ErrorCode::NegriAlreadySelected,
        ValidationKind::NotDeclarer => ErrorCode::NotDeclarer,
        ValidationKind::NotHost => ErrorCode::NotHost,
        ValidationKind::NotBroken => ErrorCode::NotBroken,
        ValidationKind::InvalidOpen => ErrorCode::InvalidOpen,
        ValidationKind::InvalidTeam => ErrorCode::InvalidTeam,
        ValidationKind::InvalidReport => ErrorCode::InvalidReport,
        ValidationKind::RoomNotReady => ErrorCode::RoomNotReady,
        ValidationKind::ParseCard => ErrorCode::ParseCard,
        ValidationKind::InvalidTrumpConversion => ErrorCode::InvalidTrumpConversion,
        ValidationKind::Other(_) => ErrorCode::ValidationError,
    }
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(kind, detail) => AppError::Validation {
                code: validation_code(&kind),
                detail,
            },
            DomainError::Conflict(kind, detail) => {
                let code = match kind {
                    ConflictKind::SeatTaken => ErrorCode::SeatTaken,
                    ConflictKind::RoomFull => ErrorCode::RoomFull,
                    ConflictKind::AlreadyInRoom => ErrorCode::AlreadyInRoom,
                    ConflictKind::GameInProgress => ErrorCode::GameInProgress,
                    ConflictKind::AlreadyReported => ErrorCode::AlreadyReported,
                    ConflictKind::Other(_) => ErrorCode::Conflict,
                };
                AppError::Conflict { code, detail }
            }
            DomainError::NotFound(kind, detail) => {
                let code = match kind {
                    NotFoundKind::Room => ErrorCode::RoomNotFound,
                    NotFoundKind::Player => ErrorCode::PlayerNotFound,
                    NotFoundKind::Violation => ErrorCode::ViolationNotFound,
                    NotFoundKind::Other(_) => ErrorCode::NotFound,
                };
                AppError::NotFound { code, detail }
            }
            DomainError::Infra(kind, detail) => match kind {
                InfraErrorKind::Timeout => AppError::Timeout { detail },
                InfraErrorKind::StoreUnavailable => AppError::StoreUnavailable { detail },
                InfraErrorKind::DataCorruption => AppError::Internal {
                    code: ErrorCode::DataCorruption,
                    detail,
                },
                InfraErrorKind::Other(_) => AppError::Internal {
                    code: ErrorCode::Internal,
                    detail,
                },
            },
        }
    }
}
