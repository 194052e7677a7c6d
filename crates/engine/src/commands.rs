//! Command structs for engine operations.
//!
//! These types group parameters for write operations (record payment, create
//! order, adjust balance, pay for cards), keeping call sites readable and
//! avoiding long argument lists.

use chrono::{DateTime, Utc};

use crate::{Money, PaymentKind};

/// Create a ledger record directly (no gateway involved).
#[derive(Clone, Debug)]
pub struct RecordPaymentCmd {
    /// Caller-provided idempotency key; generated when `None`.
    pub transaction_number: Option<String>,
    pub kind: PaymentKind,
    pub status: String,
    pub amount: Money,
    pub currency: Option<String>,
    pub garden_id: Option<String>,
    pub card_id: Option<String>,
    pub gateway_id: Option<String>,
    pub comment: Option<String>,
}

impl RecordPaymentCmd {
    #[must_use]
    pub fn new(kind: PaymentKind, status: impl Into<String>, amount: Money) -> Self {
        Self {
            transaction_number: None,
            kind,
            status: status.into(),
            amount,
            currency: None,
            garden_id: None,
            card_id: None,
            gateway_id: None,
            comment: None,
        }
    }

    #[must_use]
    pub fn transaction_number(mut self, number: impl Into<String>) -> Self {
        self.transaction_number = Some(number.into());
        self
    }

    #[must_use]
    pub fn garden_id(mut self, garden_id: impl Into<String>) -> Self {
        self.garden_id = Some(garden_id.into());
        self
    }

    #[must_use]
    pub fn card_id(mut self, card_id: impl Into<String>) -> Self {
        self.card_id = Some(card_id.into());
        self
    }

    #[must_use]
    pub fn currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = Some(currency.into());
        self
    }

    #[must_use]
    pub fn gateway_id(mut self, gateway_id: impl Into<String>) -> Self {
        self.gateway_id = Some(gateway_id.into());
        self
    }

    #[must_use]
    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

/// Create a hosted-checkout order on an external gateway.
#[derive(Clone, Debug)]
pub struct CreateOrderCmd {
    pub amount: Option<Money>,
    pub currency: Option<String>,
    pub garden_id: Option<String>,
    pub card_id: Option<String>,
    pub gateway_id: Option<String>,
    pub description: Option<String>,
}

/// Direct garden balance adjustment; always recorded as a `garden_balance`
/// payment, `completed` by default.
#[derive(Clone, Debug)]
pub struct AdjustBalanceCmd {
    pub garden_id: String,
    pub amount: Money,
    pub currency: Option<String>,
    pub comment: Option<String>,
    /// Override the default `completed` status (a non-completed adjustment
    /// records the event without moving the balance).
    pub status: Option<String>,
}

/// The all-or-nothing "pay for cards" batch.
#[derive(Clone, Debug)]
pub struct PayForCardsCmd {
    pub garden_id: String,
    pub card_ids: Vec<String>,
    pub comment: Option<String>,
}

/// Optional filters for payment lists; all are AND-composed after the
/// role-based scope.
#[derive(Clone, Debug, Default)]
pub struct PaymentListFilter {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub country_id: Option<String>,
    pub city_id: Option<String>,
    pub dister_id: Option<String>,
    pub garden_id: Option<String>,
    pub gateway_id: Option<String>,
    pub kind: Option<PaymentKind>,
    pub status: Option<String>,
    pub card_phone: Option<String>,
    pub limit: Option<u64>,
}
