//! Payment ledger read endpoints.

use api_types::PaymentKind as ApiKind;
use api_types::distribution::{DistributionLineView, DistributionResponse};
use api_types::payment::{PaymentList, PaymentListResponse, PaymentView};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};

use crate::{ServerError, server::ServerState};
use engine::{Actor, DistributionLine, Payment, PaymentListFilter};

pub(crate) fn map_kind(kind: engine::PaymentKind) -> ApiKind {
    match kind {
        engine::PaymentKind::Bank => ApiKind::Bank,
        engine::PaymentKind::GardenBalance => ApiKind::GardenBalance,
        engine::PaymentKind::AgentBalance => ApiKind::AgentBalance,
        engine::PaymentKind::GardenCardChange => ApiKind::GardenCardChange,
    }
}

pub(crate) fn map_kind_in(kind: ApiKind) -> engine::PaymentKind {
    match kind {
        ApiKind::Bank => engine::PaymentKind::Bank,
        ApiKind::GardenBalance => engine::PaymentKind::GardenBalance,
        ApiKind::AgentBalance => engine::PaymentKind::AgentBalance,
        ApiKind::GardenCardChange => engine::PaymentKind::GardenCardChange,
    }
}

pub(crate) fn map_payment(payment: Payment) -> PaymentView {
    PaymentView {
        id: payment.id.to_string(),
        transaction_number: payment.transaction_number,
        kind: map_kind(payment.kind),
        status: payment.status,
        amount_minor: payment.amount_minor,
        currency: payment.currency,
        garden_id: payment.garden_id,
        card_id: payment.card_id,
        gateway_id: payment.gateway_id,
        external_order_id: payment.external_order_id,
        external_transaction_id: payment.external_transaction_id,
        comment: payment.comment,
        created_at: payment.created_at,
        updated_at: payment.updated_at,
    }
}

pub async fn list(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Query(payload): Query<PaymentList>,
) -> Result<Json<PaymentListResponse>, ServerError> {
    let filter = PaymentListFilter {
        from: payload.from,
        to: payload.to,
        country_id: payload.country_id,
        city_id: payload.city_id,
        dister_id: payload.dister_id,
        garden_id: payload.garden_id,
        gateway_id: payload.gateway_id,
        kind: payload.kind.map(map_kind_in),
        status: payload.status,
        card_phone: payload.card_phone,
        limit: payload.limit,
    };

    let payments = state.engine.list_payments(&actor, &filter).await?;

    Ok(Json(PaymentListResponse {
        payments: payments.into_iter().map(map_payment).collect(),
    }))
}

pub async fn detail(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<PaymentView>, ServerError> {
    let payment = state.engine.payment_detail(&actor, &id).await?;
    Ok(Json(map_payment(payment)))
}

fn map_line(line: DistributionLine) -> DistributionLineView {
    DistributionLineView {
        dister_id: line.dister_id,
        name: line.name,
        percent: line.percent,
        amount_minor: line.amount_minor,
    }
}

pub async fn distribution(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<DistributionResponse>, ServerError> {
    // Scope check first so out-of-scope payments answer 404 here too.
    state.engine.payment_detail(&actor, &id).await?;
    let report = state.engine.distribution(&id).await?;

    Ok(Json(DistributionResponse {
        payment_id: report.payment_id,
        garden_id: report.garden_id,
        admin_percent: report.admin_percent,
        admin_amount_minor: report.admin_amount_minor,
        dister: report.dister.map(map_line),
        second_dister: report.second_dister.map(map_line),
    }))
}
