use sea_orm::{
    ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};
use uuid::Uuid;

use crate::{
    dto::orders::{OrderList, OrderStatusView, OrderWithVerifications},
    entity::orders::{Column as OrderCol, Entity as Orders},
    error::AppResult,
    middleware::auth::{AuthUser, ensure_admin_or_seller},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    services::order_store,
    state::AppState,
};

/// Public status query for the customer's order page.
pub async fn order_status(state: &AppState, id: Uuid) -> AppResult<ApiResponse<OrderStatusView>> {
    let order = order_store::find_order(&state.orm, id).await?;
    Ok(ApiResponse::ok(
        "OK",
        OrderStatusView {
            order_id: order.id,
            status: order.status,
            payment_verified: order.payment_verified,
            final_amount: order.total,
            currency: order.currency,
        },
    ))
}

/// Review queue. Admins see every order, sellers only their own.
pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination().normalize();

    let mut condition = Condition::all();
    if !user.is_admin() {
        condition = condition.add(OrderCol::SellerId.eq(user.user_id));
    }
    if let Some(status) = query.status {
        condition = condition.add(OrderCol::Status.eq(status));
    }

    let mut finder = Orders::find().filter(condition);
    finder = match query.sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_store::order_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Orders",
        OrderList { items: orders },
        Some(meta),
    ))
}

pub async fn get_order_detail(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithVerifications>> {
    let order = order_store::find_order(&state.orm, id).await?;
    ensure_admin_or_seller(user, order.seller_id)?;

    let verifications = order_store::verifications_for(&state.orm, order.id)
        .await?
        .into_iter()
        .map(order_store::verification_from_entity)
        .collect();

    Ok(ApiResponse::ok(
        "Order found",
        OrderWithVerifications {
            order: order_store::order_from_entity(order),
            verifications,
        },
    ))
}
