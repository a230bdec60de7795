//! Registry of seller payout accounts used to check receipt counterparties.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::payouts::RegisterPayoutAccount,
    entity::payout_accounts::{
        ActiveModel as PayoutActive, Column as PayoutCol, Entity as PayoutAccounts,
        Model as PayoutModel,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin_or_seller},
    models::{PaymentMethod, PayoutAccount},
    response::ApiResponse,
    state::AppState,
};

/// Active accounts of a seller for one channel, oldest first.
pub async fn list_active_payout_accounts<C: ConnectionTrait>(
    conn: &C,
    seller_id: Uuid,
    channel: PaymentMethod,
) -> AppResult<Vec<PayoutAccount>> {
    let accounts = PayoutAccounts::find()
        .filter(
            Condition::all()
                .add(PayoutCol::SellerId.eq(seller_id))
                .add(PayoutCol::Channel.eq(channel))
                .add(PayoutCol::Active.eq(true)),
        )
        .order_by_asc(PayoutCol::CreatedAt)
        .order_by_asc(PayoutCol::Id)
        .all(conn)
        .await?
        .into_iter()
        .map(payout_from_entity)
        .collect();
    Ok(accounts)
}

pub async fn register_account<C: ConnectionTrait>(
    conn: &C,
    payload: RegisterPayoutAccount,
) -> AppResult<PayoutAccount> {
    if !payload.channel.accepts_proof() {
        return Err(AppError::Validation(
            "card payments do not use payout accounts".into(),
        ));
    }
    let holder_name = payload.holder_name.trim();
    if holder_name.is_empty() {
        return Err(AppError::Validation("holder_name is required".into()));
    }
    if !payload.holder_number.chars().any(|c| c.is_ascii_digit()) {
        return Err(AppError::Validation("holder_number must contain digits".into()));
    }

    let model = PayoutActive {
        id: Set(Uuid::new_v4()),
        seller_id: Set(payload.seller_id),
        channel: Set(payload.channel),
        holder_name: Set(holder_name.to_string()),
        holder_number: Set(payload.holder_number.trim().to_string()),
        active: Set(true),
        created_at: Set(Utc::now().into()),
    }
    .insert(conn)
    .await?;
    Ok(payout_from_entity(model))
}

pub async fn register(
    state: &AppState,
    user: &AuthUser,
    payload: RegisterPayoutAccount,
) -> AppResult<ApiResponse<PayoutAccount>> {
    ensure_admin_or_seller(user, payload.seller_id)?;
    let account = register_account(&state.orm, payload).await?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        "payout_account_registered",
        "payout_accounts",
        serde_json::json!({ "account_id": account.id, "seller_id": account.seller_id }),
    )
    .await;

    Ok(ApiResponse::ok(
        "Payout account registered",
        account,
    ))
}

fn payout_from_entity(model: PayoutModel) -> PayoutAccount {
    PayoutAccount {
        id: model.id,
        seller_id: model.seller_id,
        channel: model.channel,
        holder_name: model.holder_name,
        holder_number: model.holder_number,
        active: model.active,
    }
}
