//! Turns a guest cart and customer details into a frozen, pending order.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, Set, TransactionTrait};
use uuid::Uuid;

use crate::{
    audit,
    dto::{
        cart::CartEntry,
        orders::{CheckoutRequest, CheckoutResponse},
    },
    entity::orders::ActiveModel as OrderActive,
    error::{AppError, AppResult},
    models::{CartLine, CartSnapshot, OrderMetadata, OrderStatus},
    response::ApiResponse,
    services::{cart_service, initiation_service, order_store},
    state::AppState,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quote {
    pub subtotal: i64,
    pub tax: i64,
    pub total: i64,
}

/// Tax in minor units, rounded half up. `None` when the amount does not fit.
pub fn compute_tax(subtotal: i64, rate_bps: i64) -> Option<i64> {
    subtotal
        .checked_mul(rate_bps)
        .and_then(|scaled| scaled.checked_add(5_000))
        .map(|scaled| scaled / 10_000)
}

pub fn quote(lines: &[CartLine], rate_bps: i64) -> AppResult<Quote> {
    if lines.is_empty() {
        return Err(AppError::Validation("Cart is empty".into()));
    }
    let mut subtotal: i64 = 0;
    for line in lines {
        if line.quantity < 1 {
            return Err(AppError::Validation(format!(
                "quantity for product {} must be at least 1",
                line.product_id
            )));
        }
        if line.unit_price < 0 {
            return Err(AppError::Validation(format!(
                "price for product {} is negative",
                line.product_id
            )));
        }
        subtotal = line
            .unit_price
            .checked_mul(i64::from(line.quantity))
            .and_then(|amount| subtotal.checked_add(amount))
            .ok_or_else(too_large)?;
    }
    let tax = compute_tax(subtotal, rate_bps).ok_or_else(too_large)?;
    let total = subtotal.checked_add(tax).ok_or_else(too_large)?;
    Ok(Quote {
        subtotal,
        tax,
        total,
    })
}

fn too_large() -> AppError {
    AppError::Validation("order amount is too large".into())
}

fn validate_customer(payload: &CheckoutRequest) -> AppResult<()> {
    let required = [
        ("customer_name", &payload.customer_name),
        ("customer_email", &payload.customer_email),
        ("customer_phone", &payload.customer_phone),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            return Err(AppError::Validation(format!("{field} is required")));
        }
    }
    if !payload.customer_email.contains('@') {
        return Err(AppError::Validation("customer_email is invalid".into()));
    }
    Ok(())
}

/// Orders belong to exactly one seller; mixed carts are refused.
fn single_seller(entries: &[CartEntry]) -> AppResult<Uuid> {
    let mut sellers = entries.iter().map(|e| e.seller_id);
    let first = sellers
        .next()
        .ok_or_else(|| AppError::Validation("Cart is empty".into()))?;
    if sellers.any(|s| s != first) {
        return Err(AppError::Validation(
            "cart contains items from more than one seller".into(),
        ));
    }
    Ok(first)
}

pub async fn checkout(
    state: &AppState,
    payload: CheckoutRequest,
) -> AppResult<ApiResponse<CheckoutResponse>> {
    validate_customer(&payload)?;

    let entries = cart_service::get_cart(&state.orm, &payload.session_id).await?;
    let seller_id = single_seller(&entries)?;
    let lines: Vec<CartLine> = entries
        .into_iter()
        .map(|e| CartLine {
            product_id: e.product_id,
            name: e.name,
            unit_price: e.unit_price,
            quantity: e.quantity,
        })
        .collect();
    let quote = quote(&lines, state.config.tax_rate_bps)?;

    let now = Utc::now();
    let txn = state.orm.begin().await?;
    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        seller_id: Set(seller_id),
        customer_name: Set(payload.customer_name.trim().to_string()),
        customer_email: Set(payload.customer_email.trim().to_string()),
        customer_phone: Set(payload.customer_phone.trim().to_string()),
        payment_method: Set(payload.payment_method),
        payment_channel_phone: Set(payload.payment_channel_phone),
        cart_items: Set(CartSnapshot(lines)),
        subtotal: Set(quote.subtotal),
        tax: Set(quote.tax),
        total: Set(quote.total),
        currency: Set(state.config.currency.clone()),
        status: Set(OrderStatus::Pending),
        payment_verified: Set(false),
        verified_at: Set(None),
        proof_image_ref: Set(None),
        qr_payload: Set(None),
        ussd_code: Set(None),
        chat_link: Set(None),
        psp_intent_ref: Set(None),
        metadata: Set(OrderMetadata::default()),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&txn)
    .await?;
    cart_service::clear_cart(&txn, &payload.session_id).await?;
    txn.commit().await?;

    tracing::info!(order_id = %order.id, total = order.total, "order created");
    audit::record(
        &state.orm,
        None,
        "checkout",
        "orders",
        serde_json::json!({ "order_id": order.id, "total": order.total }),
    )
    .await;

    let (message, artifacts) = match initiation_service::initiate_order(state, order.id).await {
        Ok(resp) => ("Order created", resp.data.map(|d| d.artifacts)),
        Err(AppError::ChannelInitiation(_)) => (
            "Order created, payment channel unavailable, please retry",
            None,
        ),
        Err(err) => return Err(err),
    };

    let order = order_store::find_order(&state.orm, order.id).await?;
    Ok(ApiResponse::ok(
        message,
        CheckoutResponse {
            order: order_store::order_from_entity(order),
            artifacts,
        },
    ))
}
