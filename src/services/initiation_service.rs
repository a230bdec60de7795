use sea_orm::{Set, TransactionTrait};
use uuid::Uuid;

use crate::{
    audit,
    channels::{self, ChannelArtifacts, InitiationRequest},
    dto::orders::InitiationResponse,
    entity::orders::Model as OrderModel,
    error::{AppError, AppResult},
    models::{OrderMetadata, OrderStatus, PaymentMethod},
    response::ApiResponse,
    services::{order_store, payout_service},
    state::AppState,
};

/// Attach channel artifacts to an order and move it to `waiting_payment`.
///
/// Safe to retry while the order is `pending`. Chat and mobile-money orders
/// already waiting for payment get their stored artifacts back unchanged.
pub async fn initiate_order(
    state: &AppState,
    order_id: Uuid,
) -> AppResult<ApiResponse<InitiationResponse>> {
    let order = order_store::find_order(&state.orm, order_id).await?;
    if is_idempotent_replay(&order) {
        return Ok(initiation_response(&order, ChannelArtifacts::stored(&order)));
    }
    if order.status != OrderStatus::Pending {
        return Err(AppError::InvalidTransition {
            from: order.status,
            to: OrderStatus::WaitingPayment,
        });
    }

    let payee = match order.payment_method {
        PaymentMethod::Card => None,
        method => payout_service::list_active_payout_accounts(&state.orm, order.seller_id, method)
            .await?
            .into_iter()
            .next(),
    };

    // The PSP call happens before any row is locked; a failure leaves the order untouched.
    let artifacts = channels::initiate(
        &state.config,
        state.psp.as_ref(),
        &InitiationRequest {
            order_id: order.id,
            amount: order.total,
            currency: &order.currency,
            method: order.payment_method,
            payee: payee.as_ref(),
        },
    )
    .await
    .inspect_err(|err| {
        tracing::warn!(%order_id, error = %err, "payment channel initiation failed");
    })?;

    let txn = state.orm.begin().await?;
    let locked = order_store::lock_order(&txn, order_id).await?;
    if is_idempotent_replay(&locked) {
        txn.commit().await?;
        return Ok(initiation_response(&locked, ChannelArtifacts::stored(&locked)));
    }

    let extra = locked.metadata.extra.clone();
    let stored = artifacts.clone();
    let updated = order_store::transition(&txn, locked, OrderStatus::WaitingPayment, move |active| {
        active.chat_link = Set(stored.chat_link);
        active.qr_payload = Set(stored.qr_payload);
        active.ussd_code = Set(stored.ussd_code);
        active.psp_intent_ref = Set(stored.psp_intent_ref);
        active.metadata = Set(OrderMetadata {
            channel: stored.metadata,
            extra,
        });
    })
    .await?;
    txn.commit().await?;

    audit::record(
        &state.orm,
        None,
        "payment_initiated",
        "orders",
        serde_json::json!({
            "order_id": updated.id,
            "payment_method": updated.payment_method.as_str(),
        }),
    )
    .await;

    Ok(initiation_response(&updated, artifacts))
}

fn is_idempotent_replay(order: &OrderModel) -> bool {
    order.status == OrderStatus::WaitingPayment && order.payment_method != PaymentMethod::Card
}

fn initiation_response(order: &OrderModel, artifacts: ChannelArtifacts) -> ApiResponse<InitiationResponse> {
    ApiResponse::ok(
        "Payment initiated",
        InitiationResponse {
            order_id: order.id,
            status: order.status,
            artifacts,
        },
    )
}
