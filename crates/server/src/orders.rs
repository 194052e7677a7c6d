//! Hosted-checkout order endpoints and the gateway callback sink.

use api_types::order::{
    BulkOrderItem, BulkOrderNew, BulkOrderResponse, CallbackAck, OrderCreated, OrderNew,
    OrderStatusResponse,
};
use axum::{
    Extension, Json,
    extract::{Path, State},
};
use serde_json::Value;

use crate::{ServerError, payments::map_payment, server::ServerState};
use engine::{Actor, CreateOrderCmd, EngineError, GatewayKind, Money};

/// Write-side scoping. Garden actors act only on their own garden; dister
/// actors are read-only.
fn require_write_scope(actor: &Actor, garden_id: Option<&str>) -> Result<(), ServerError> {
    match actor {
        Actor::Admin => Ok(()),
        Actor::Garden { garden_id: own } => match garden_id {
            Some(requested) if requested != own => Err(ServerError::Engine(
                EngineError::Forbidden("garden acting outside its own scope".to_string()),
            )),
            _ => Ok(()),
        },
        Actor::Dister { .. } => Err(ServerError::Engine(EngineError::Forbidden(
            "disters cannot create payments".to_string(),
        ))),
    }
}

pub async fn create(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Json(payload): Json<OrderNew>,
) -> Result<Json<OrderCreated>, ServerError> {
    require_write_scope(&actor, payload.garden_id.as_deref())?;
    // Card-targeted orders carry no garden_id; resolve the owner so a
    // garden actor cannot order against another garden's card.
    if let (Actor::Garden { garden_id: own }, Some(card_id)) =
        (&actor, payload.card_id.as_deref())
    {
        let owner = state.engine.card_owner(card_id).await?;
        if owner != *own {
            return Err(ServerError::Engine(EngineError::Forbidden(
                "garden acting outside its own scope".to_string(),
            )));
        }
    }

    let cmd = CreateOrderCmd {
        amount: payload.amount_minor.map(Money::new),
        currency: payload.currency,
        garden_id: payload.garden_id,
        card_id: payload.card_id,
        gateway_id: payload.gateway_id,
        description: payload.description,
    };

    let order = state.engine.create_order(cmd).await?;

    Ok(Json(OrderCreated {
        success: true,
        payment: map_payment(order.payment),
        redirect_url: order.redirect_url,
        external_transaction_id: order.external_order_id,
    }))
}

pub async fn create_bulk(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Json(payload): Json<BulkOrderNew>,
) -> Result<Json<BulkOrderResponse>, ServerError> {
    require_write_scope(&actor, Some(&payload.garden_id))?;

    let outcome = state
        .engine
        .create_orders_bulk(
            &payload.garden_id,
            &payload.card_ids,
            payload.description.as_deref(),
        )
        .await?;

    let results = outcome
        .results
        .into_iter()
        .map(|result| {
            let (payment_id, redirect_url, external_transaction_id) = match result.order {
                Some(order) => (
                    Some(order.payment.id.to_string()),
                    Some(order.redirect_url),
                    Some(order.external_order_id),
                ),
                None => (None, None, None),
            };
            BulkOrderItem {
                card_id: result.card_id,
                payment_id,
                redirect_url,
                external_transaction_id,
                error: result.error,
            }
        })
        .collect();

    Ok(Json(BulkOrderResponse {
        results,
        success_count: outcome.success_count,
        failed_count: outcome.failed_count,
    }))
}

pub async fn status(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<OrderStatusResponse>, ServerError> {
    // Scope check before the poll; out-of-scope ids answer 404.
    state.engine.payment_detail(&actor, &id).await?;
    let order_state = state.engine.order_status(&id).await?;

    Ok(Json(OrderStatusResponse {
        payment_id: order_state.payment.id.to_string(),
        status: order_state.payment.status,
        synced: order_state.synced,
    }))
}

pub async fn callback(
    State(state): State<ServerState>,
    Path(kind): Path<String>,
    Json(payload): Json<Value>,
) -> Result<Json<CallbackAck>, ServerError> {
    let kind = GatewayKind::try_from(kind.as_str())?;
    let (payment, transition) = state.engine.handle_callback(kind, &payload).await?;

    let message = if transition.changed() {
        format!("payment {} is now {}", payment.id, payment.status)
    } else {
        "already up to date".to_string()
    };

    Ok(Json(CallbackAck {
        success: true,
        message,
    }))
}
