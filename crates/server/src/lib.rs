use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::{EngineError, GatewayError};

use serde::Serialize;
pub use server::{run, run_with_listener, spawn_with_listener};

mod gardens;
mod orders;
mod payments;
mod server;

pub mod types {
    pub mod payment {
        pub use api_types::payment::{PaymentList, PaymentListResponse, PaymentView};
    }

    pub mod order {
        pub use api_types::order::{
            BulkOrderNew, BulkOrderResponse, CallbackAck, OrderCreated, OrderNew,
            OrderStatusResponse,
        };
    }

    pub mod balance {
        pub use api_types::balance::BalanceAdjust;
    }

    pub mod licenses {
        pub use api_types::licenses::{PayForCards, PayForCardsResponse};
    }

    pub mod distribution {
        pub use api_types::distribution::{DistributionLineView, DistributionResponse};
    }
}

pub enum ServerError {
    Engine(EngineError),
    Generic(String),
}

#[derive(Serialize)]
struct Error {
    error: String,
    /// Extra machine-readable detail, e.g. the shortage on an
    /// insufficient-balance rejection.
    #[serde(skip_serializing_if = "Option::is_none")]
    missing_minor: Option<i64>,
}

fn status_for_gateway_error(err: &GatewayError) -> StatusCode {
    match err {
        // Configuration problems are a distinct, non-retryable class.
        GatewayError::NotConfigured(_) => StatusCode::SERVICE_UNAVAILABLE,
        GatewayError::Rejected(_) | GatewayError::Malformed(_) => StatusCode::BAD_GATEWAY,
        GatewayError::Transient(_) => StatusCode::GATEWAY_TIMEOUT,
    }
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::Forbidden(_) => StatusCode::FORBIDDEN,
        EngineError::KeyNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::DuplicateTransaction(_) => StatusCode::CONFLICT,
        EngineError::NotConfigured(_) => StatusCode::SERVICE_UNAVAILABLE,
        EngineError::Gateway(err) => status_for_gateway_error(err),
        EngineError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        EngineError::InsufficientBalance { .. }
        | EngineError::OwnershipMismatch(_)
        | EngineError::InvalidAmount(_) => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

fn body_for_engine_error(err: EngineError) -> Error {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            Error {
                error: "internal server error".to_string(),
                missing_minor: None,
            }
        }
        EngineError::InsufficientBalance { missing_minor } => Error {
            error: EngineError::InsufficientBalance { missing_minor }.to_string(),
            missing_minor: Some(missing_minor),
        },
        other => Error {
            error: other.to_string(),
            missing_minor: None,
        },
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            ServerError::Engine(err) => (status_for_engine_error(&err), body_for_engine_error(err)),
            ServerError::Generic(err) => (
                StatusCode::BAD_REQUEST,
                Error {
                    error: err,
                    missing_minor: None,
                },
            ),
        };

        (status, Json(error)).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_duplicate_maps_to_409() {
        let res =
            ServerError::from(EngineError::DuplicateTransaction("tx".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn engine_not_found_maps_to_404() {
        let res = ServerError::from(EngineError::KeyNotFound("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn engine_insufficient_balance_maps_to_422() {
        let res = ServerError::from(EngineError::InsufficientBalance { missing_minor: 50 })
            .into_response();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn engine_ownership_mismatch_maps_to_422() {
        let res =
            ServerError::from(EngineError::OwnershipMismatch("card".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn gateway_not_configured_maps_to_503() {
        let res = ServerError::from(EngineError::Gateway(GatewayError::NotConfigured(
            "bank".to_string(),
        )))
        .into_response();
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn gateway_transient_maps_to_504() {
        let res = ServerError::from(EngineError::Gateway(GatewayError::Transient(
            "timeout".to_string(),
        )))
        .into_response();
        assert_eq!(res.status(), StatusCode::GATEWAY_TIMEOUT);
    }

    #[test]
    fn generic_maps_to_400() {
        let res = ServerError::Generic("bad".to_string()).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
