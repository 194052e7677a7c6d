//! Uniform contract over external hosted-payment gateways.
//!
//! Two providers with divergent request/response shapes sit behind one
//! trait; callback payload parsing is isolated per adapter behind the
//! normalized [`CallbackEvent`]. The engine never sees provider wire
//! formats.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use thiserror::Error;

use crate::gateways::GatewayKind;

mod bank;
mod ecomm;

pub use bank::{BankConfig, BankGateway};
pub use ecomm::{EcommConfig, EcommGateway};

/// Gateway failures, split into the three classes callers must tell apart.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Missing credentials/certificates. Non-retryable; surfaced to the
    /// caller as "gateway not configured".
    #[error("gateway not configured: {0}")]
    NotConfigured(String),
    /// The gateway understood the request and refused it.
    #[error("gateway rejected the request: {0}")]
    Rejected(String),
    /// Network/timeout. The order state is unknown; poll later.
    #[error("transient gateway error: {0}")]
    Transient(String),
    #[error("malformed gateway payload: {0}")]
    Malformed(String),
}

impl GatewayError {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

/// Result of a successful order registration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreatedOrder {
    pub external_order_id: String,
    /// Where the paying user must be redirected to complete the checkout.
    pub redirect_url: String,
}

/// Gateway-side order state, already mapped to ledger status strings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GatewayStatus {
    Pending,
    Completed,
    Failed,
    Cancelled,
}

impl GatewayStatus {
    pub fn as_payment_status(self) -> &'static str {
        match self {
            Self::Pending => crate::payments::STATUS_PENDING,
            Self::Completed => crate::payments::STATUS_COMPLETED,
            Self::Failed => crate::payments::STATUS_FAILED,
            Self::Cancelled => "cancelled",
        }
    }
}

/// A callback payload normalized out of a provider-specific shape.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallbackEvent {
    pub external_order_id: String,
    pub status: GatewayStatus,
    pub external_transaction_id: Option<String>,
}

#[async_trait]
pub trait GatewayAdapter: Send + Sync {
    /// Registers a hosted-checkout order for `amount_minor` in `currency`,
    /// tagged with our `reference` (the transaction number).
    async fn create_order(
        &self,
        amount_minor: i64,
        currency: &str,
        reference: &str,
    ) -> Result<CreatedOrder, GatewayError>;

    /// Parses a raw webhook body into a normalized event. Pure; replays of
    /// the same body yield the same event.
    fn parse_callback(&self, payload: &serde_json::Value) -> Result<CallbackEvent, GatewayError>;

    /// Queries the remote order state ("sync"), used when our stored status
    /// is still pending and a client polls.
    async fn fetch_status(&self, external_order_id: &str) -> Result<GatewayStatus, GatewayError>;
}

/// Adapter lookup by gateway kind.
///
/// Built once at startup from the app settings. A kind with no adapter is a
/// configuration error, distinct from any runtime gateway failure.
#[derive(Clone, Default)]
pub struct GatewayRegistry {
    adapters: HashMap<&'static str, Arc<dyn GatewayAdapter>>,
}

impl GatewayRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, kind: GatewayKind, adapter: Arc<dyn GatewayAdapter>) -> Self {
        self.adapters.insert(kind.as_str(), adapter);
        self
    }

    pub fn get(&self, kind: GatewayKind) -> Result<Arc<dyn GatewayAdapter>, GatewayError> {
        self.adapters.get(kind.as_str()).cloned().ok_or_else(|| {
            GatewayError::NotConfigured(format!("no adapter for gateway kind {}", kind.as_str()))
        })
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

impl std::fmt::Debug for GatewayRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayRegistry")
            .field("kinds", &self.adapters.keys().collect::<Vec<_>>())
            .finish()
    }
}

pub(crate) fn map_reqwest_error(err: reqwest::Error) -> GatewayError {
    if err.is_timeout() || err.is_connect() {
        GatewayError::Transient(err.to_string())
    } else {
        GatewayError::Rejected(err.to_string())
    }
}
