//! Persistence of the order aggregate and its verification trail.

use chrono::Utc;
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    entity::{
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        payment_verifications::{
            ActiveModel as VerificationActive, Column as VerificationCol,
            Entity as PaymentVerifications, Model as VerificationModel,
        },
    },
    error::{AppError, AppResult},
    lifecycle::ensure_transition,
    models::{Order, OrderStatus, VerificationRecord},
};

pub async fn find_order<C: ConnectionTrait>(conn: &C, id: Uuid) -> AppResult<OrderModel> {
    Orders::find_by_id(id)
        .one(conn)
        .await?
        .ok_or(AppError::NotFound)
}

/// Load an order holding a row lock until the surrounding transaction ends.
pub async fn lock_order<C: ConnectionTrait>(conn: &C, id: Uuid) -> AppResult<OrderModel> {
    Orders::find_by_id(id)
        .lock(LockType::Update)
        .one(conn)
        .await?
        .ok_or(AppError::NotFound)
}

pub async fn find_by_intent<C: ConnectionTrait>(
    conn: &C,
    intent_ref: &str,
) -> AppResult<Option<OrderModel>> {
    Ok(Orders::find()
        .filter(OrderCol::PspIntentRef.eq(intent_ref))
        .one(conn)
        .await?)
}

/// Move an order along one edge of the state graph, applying extra column
/// changes in the same update.
pub async fn transition<C, F>(
    conn: &C,
    order: OrderModel,
    to: OrderStatus,
    apply: F,
) -> AppResult<OrderModel>
where
    C: ConnectionTrait,
    F: FnOnce(&mut OrderActive),
{
    let from = order.status;
    ensure_transition(from, to)?;

    let mut active: OrderActive = order.into();
    active.status = Set(to);
    active.updated_at = Set(Utc::now().into());
    apply(&mut active);
    let updated = active.update(conn).await?;

    tracing::info!(
        order_id = %updated.id,
        from = from.as_str(),
        to = to.as_str(),
        "order transitioned"
    );
    Ok(updated)
}

/// Append to the verification trail. Records are never updated or deleted.
pub async fn append_verification<C: ConnectionTrait>(
    conn: &C,
    order_id: Uuid,
    verified_by: Option<Uuid>,
    is_approved: bool,
    notes: impl Into<String>,
) -> AppResult<VerificationModel> {
    let record = VerificationActive {
        id: Set(Uuid::new_v4()),
        order_id: Set(order_id),
        verified_by: Set(verified_by),
        is_approved: Set(is_approved),
        notes: Set(notes.into()),
        created_at: Set(Utc::now().into()),
    }
    .insert(conn)
    .await?;

    tracing::debug!(
        %order_id,
        verified_by = ?verified_by,
        is_approved,
        "verification recorded"
    );
    Ok(record)
}

pub async fn verifications_for<C: ConnectionTrait>(
    conn: &C,
    order_id: Uuid,
) -> AppResult<Vec<VerificationModel>> {
    Ok(PaymentVerifications::find()
        .filter(VerificationCol::OrderId.eq(order_id))
        .order_by_asc(VerificationCol::CreatedAt)
        .all(conn)
        .await?)
}

pub fn order_from_entity(model: OrderModel) -> Order {
    Order {
        id: model.id,
        seller_id: model.seller_id,
        customer_name: model.customer_name,
        customer_email: model.customer_email,
        customer_phone: model.customer_phone,
        payment_method: model.payment_method,
        payment_channel_phone: model.payment_channel_phone,
        cart_items: model.cart_items.0,
        subtotal: model.subtotal,
        tax: model.tax,
        total: model.total,
        currency: model.currency,
        status: model.status,
        payment_verified: model.payment_verified,
        verified_at: model.verified_at.map(|dt| dt.with_timezone(&Utc)),
        proof_image_ref: model.proof_image_ref,
        qr_payload: model.qr_payload,
        ussd_code: model.ussd_code,
        chat_link: model.chat_link,
        psp_intent_ref: model.psp_intent_ref,
        metadata: model.metadata,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

pub fn verification_from_entity(model: VerificationModel) -> VerificationRecord {
    VerificationRecord {
        id: model.id,
        order_id: model.order_id,
        verified_by: model.verified_by,
        is_approved: model.is_approved,
        notes: model.notes,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
