//! Privileged overrides: manual approval, rejection and refund.

use sea_orm::TransactionTrait;
use uuid::Uuid;

use crate::{
    audit,
    dto::orders::{ManualDecision, ManualDecisionKind, RefundRequest},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin, ensure_admin_or_seller},
    models::{Order, OrderStatus},
    response::ApiResponse,
    services::{
        fulfillment::{self, Approval},
        order_store,
    },
    state::AppState,
};

fn required_reason(reason: Option<&str>) -> AppResult<String> {
    reason
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string)
        .ok_or_else(|| AppError::Validation("reason is required".into()))
}

pub async fn decide(
    state: &AppState,
    user: &AuthUser,
    order_id: Uuid,
    payload: ManualDecision,
) -> AppResult<ApiResponse<Order>> {
    match payload.decision {
        ManualDecisionKind::Approve => approve(state, user, order_id, payload.reason.as_deref()).await,
        ManualDecisionKind::Reject => reject(state, user, order_id, payload.reason.as_deref()).await,
    }
}

/// Approve an order that has a proof attached. Drives the same fulfillment as
/// automatic approval.
pub async fn approve(
    state: &AppState,
    user: &AuthUser,
    order_id: Uuid,
    note: Option<&str>,
) -> AppResult<ApiResponse<Order>> {
    let txn = state.orm.begin().await?;
    let order = order_store::lock_order(&txn, order_id).await?;
    ensure_admin_or_seller(user, order.seller_id)?;
    if !matches!(
        order.status,
        OrderStatus::WaitingPayment | OrderStatus::PendingManualReview
    ) {
        return Err(AppError::InvalidTransition {
            from: order.status,
            to: OrderStatus::Paid,
        });
    }
    if order.proof_image_ref.is_none() {
        return Err(AppError::Validation("no proof of payment attached".into()));
    }

    let notes = match note.map(str::trim).filter(|n| !n.is_empty()) {
        Some(note) => format!("manually approved: {note}"),
        None => "manually approved".to_string(),
    };
    let approval = Approval {
        verified_by: Some(user.user_id),
        notes,
    };
    let paid = fulfillment::settle(&state.orm, txn, order, approval)
        .await?
        .into_order();

    audit::record(
        &state.orm,
        Some(user.user_id),
        "manual_approval",
        "orders",
        serde_json::json!({ "order_id": order_id }),
    )
    .await;

    Ok(ApiResponse::ok(
        "Payment approved",
        order_store::order_from_entity(paid),
    ))
}

pub async fn reject(
    state: &AppState,
    user: &AuthUser,
    order_id: Uuid,
    reason: Option<&str>,
) -> AppResult<ApiResponse<Order>> {
    let reason = required_reason(reason)?;

    let txn = state.orm.begin().await?;
    let order = order_store::lock_order(&txn, order_id).await?;
    ensure_admin_or_seller(user, order.seller_id)?;
    let failed = order_store::transition(&txn, order, OrderStatus::Failed, |_| {}).await?;
    order_store::append_verification(&txn, order_id, Some(user.user_id), false, reason.clone())
        .await?;
    txn.commit().await?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        "manual_rejection",
        "orders",
        serde_json::json!({ "order_id": order_id, "reason": reason }),
    )
    .await;

    Ok(ApiResponse::ok(
        "Payment rejected",
        order_store::order_from_entity(failed),
    ))
}

/// Admin-only move of an open order to `refunded`.
pub async fn refund(
    state: &AppState,
    user: &AuthUser,
    order_id: Uuid,
    payload: RefundRequest,
) -> AppResult<ApiResponse<Order>> {
    ensure_admin(user)?;
    let reason = required_reason(Some(&payload.reason))?;

    let txn = state.orm.begin().await?;
    let order = order_store::lock_order(&txn, order_id).await?;
    let refunded = order_store::transition(&txn, order, OrderStatus::Refunded, |_| {}).await?;
    txn.commit().await?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        "refund",
        "orders",
        serde_json::json!({ "order_id": order_id, "reason": reason }),
    )
    .await;

    Ok(ApiResponse::ok(
        "Order refunded",
        order_store::order_from_entity(refunded),
    ))
}
