//! Guest carts keyed by an opaque session id.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use crate::{
    dto::cart::{AddToCartRequest, CartEntry, CartList},
    entity::{
        cart_items::{ActiveModel as CartActive, Column as CartCol, Entity as CartItems},
        products::Entity as Products,
    },
    error::{AppError, AppResult},
    response::{ApiResponse, Meta},
    state::AppState,
};

/// Resolve the session's cart against the catalog, oldest line first.
pub async fn get_cart<C: ConnectionTrait>(conn: &C, session_id: &str) -> AppResult<Vec<CartEntry>> {
    let rows = CartItems::find()
        .filter(CartCol::SessionId.eq(session_id))
        .find_also_related(Products)
        .order_by_asc(CartCol::CreatedAt)
        .all(conn)
        .await?;

    rows.into_iter()
        .map(|(item, product)| {
            let product = product.ok_or_else(|| {
                AppError::Validation(format!("product {} is no longer available", item.product_id))
            })?;
            Ok(CartEntry {
                product_id: product.id,
                seller_id: product.seller_id,
                name: product.name,
                unit_price: product.price,
                quantity: item.quantity,
            })
        })
        .collect()
}

pub async fn add_item<C: ConnectionTrait>(
    conn: &C,
    session_id: &str,
    payload: AddToCartRequest,
) -> AppResult<Vec<CartEntry>> {
    if session_id.trim().is_empty() {
        return Err(AppError::Validation("session_id is required".to_string()));
    }
    if payload.quantity <= 0 {
        return Err(AppError::Validation(
            "quantity must be greater than 0".to_string(),
        ));
    }
    if Products::find_by_id(payload.product_id).one(conn).await?.is_none() {
        return Err(AppError::Validation("product not found".to_string()));
    }

    let existing = CartItems::find()
        .filter(
            Condition::all()
                .add(CartCol::SessionId.eq(session_id))
                .add(CartCol::ProductId.eq(payload.product_id)),
        )
        .one(conn)
        .await?;

    match existing {
        Some(item) => {
            let quantity = item.quantity.saturating_add(payload.quantity);
            let mut active: CartActive = item.into();
            active.quantity = Set(quantity);
            active.update(conn).await?;
        }
        None => {
            CartActive {
                id: Set(Uuid::new_v4()),
                session_id: Set(session_id.to_string()),
                product_id: Set(payload.product_id),
                quantity: Set(payload.quantity),
                created_at: Set(Utc::now().into()),
            }
            .insert(conn)
            .await?;
        }
    }

    get_cart(conn, session_id).await
}

pub async fn clear_cart<C: ConnectionTrait>(conn: &C, session_id: &str) -> AppResult<u64> {
    let result = CartItems::delete_many()
        .filter(CartCol::SessionId.eq(session_id))
        .exec(conn)
        .await?;
    Ok(result.rows_affected)
}

pub async fn cart_list(state: &AppState, session_id: String) -> AppResult<ApiResponse<CartList>> {
    let items = get_cart(&state.orm, &session_id).await?;
    let total = items.len() as i64;
    Ok(ApiResponse::success(
        "OK",
        CartList { session_id, items },
        Some(Meta::new(1, total, total)),
    ))
}

pub async fn add_to_cart(
    state: &AppState,
    session_id: String,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<CartList>> {
    let product_id = payload.product_id;
    let quantity = payload.quantity;
    let items = add_item(&state.orm, &session_id, payload).await?;
    tracing::debug!(session_id = %session_id, %product_id, quantity, "cart updated");
    Ok(ApiResponse::ok(
        "Cart updated",
        CartList { session_id, items },
    ))
}
