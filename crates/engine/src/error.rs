//! The module contains the errors the engine can throw.
//!
//! Three classes matter to callers and map to distinct HTTP statuses in the
//! server crate:
//!
//! - configuration: [`NotConfigured`] (missing gateway credentials, missing
//!   tariff) — non-retryable.
//! - business rules: [`DuplicateTransaction`], [`InsufficientBalance`],
//!   [`OwnershipMismatch`], [`InvalidAmount`] — rejected before any write.
//! - transient: [`Gateway`] with a transient inner error — the payment stays
//!   `pending` and can be polled again.
//!
//! [`NotConfigured`]: EngineError::NotConfigured
//! [`DuplicateTransaction`]: EngineError::DuplicateTransaction
//! [`InsufficientBalance`]: EngineError::InsufficientBalance
//! [`OwnershipMismatch`]: EngineError::OwnershipMismatch
//! [`InvalidAmount`]: EngineError::InvalidAmount
//! [`Gateway`]: EngineError::Gateway
use sea_orm::DbErr;
use thiserror::Error;

use crate::gateway::GatewayError;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("duplicate transaction number: {0}")]
    DuplicateTransaction(String),
    #[error("insufficient balance: missing {missing_minor} minor units")]
    InsufficientBalance { missing_minor: i64 },
    #[error("ownership mismatch: {0}")]
    OwnershipMismatch(String),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("not configured: {0}")]
    NotConfigured(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::DuplicateTransaction(a), Self::DuplicateTransaction(b)) => a == b,
            (
                Self::InsufficientBalance { missing_minor: a },
                Self::InsufficientBalance { missing_minor: b },
            ) => a == b,
            (Self::OwnershipMismatch(a), Self::OwnershipMismatch(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::NotConfigured(a), Self::NotConfigured(b)) => a == b,
            (Self::Forbidden(a), Self::Forbidden(b)) => a == b,
            (Self::Gateway(a), Self::Gateway(b)) => a.to_string() == b.to_string(),
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
