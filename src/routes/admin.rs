use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::{
        orders::{ManualDecision, OrderList, OrderWithVerifications, RefundRequest},
        payouts::RegisterPayoutAccount,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::{Order, PayoutAccount},
    response::ApiResponse,
    routes::params::OrderListQuery,
    services::{order_service, payout_service, verification_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orders", get(list_orders))
        .route("/orders/{id}", get(get_order))
        .route("/orders/{id}/verify", post(verify_order))
        .route("/orders/{id}/refund", post(refund_order))
        .route("/payout-accounts", post(register_payout_account))
}

#[utoipa::path(
    get,
    path = "/api/admin/orders",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("status" = Option<String>, Query, description = "Filter by status, e.g. pending_manual_review"),
        ("sort_order" = Option<String>, Query, description = "Sort order: asc, desc")
    ),
    responses(
        (status = 200, description = "Orders visible to the caller", body = ApiResponse<OrderList>),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let resp = order_service::list_orders(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/orders/{id}",
    params(
        ("id" = Uuid, Path, description = "Order ID")
    ),
    responses(
        (status = 200, description = "Order with its verification history", body = ApiResponse<OrderWithVerifications>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn get_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<OrderWithVerifications>>> {
    let resp = order_service::get_order_detail(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/orders/{id}/verify",
    params(
        ("id" = Uuid, Path, description = "Order ID")
    ),
    request_body = ManualDecision,
    responses(
        (status = 200, description = "Decision applied", body = ApiResponse<Order>),
        (status = 400, description = "Missing proof or reason"),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "Order already finalized or item unavailable"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn verify_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ManualDecision>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = verification_service::decide(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/orders/{id}/refund",
    params(
        ("id" = Uuid, Path, description = "Order ID")
    ),
    request_body = RefundRequest,
    responses(
        (status = 200, description = "Order refunded", body = ApiResponse<Order>),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "Order already finalized"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn refund_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<RefundRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = verification_service::refund(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/payout-accounts",
    request_body = RegisterPayoutAccount,
    responses(
        (status = 200, description = "Payout account registered", body = ApiResponse<PayoutAccount>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn register_payout_account(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<RegisterPayoutAccount>,
) -> AppResult<Json<ApiResponse<PayoutAccount>>> {
    let resp = payout_service::register(&state, &user, payload).await?;
    Ok(Json(resp))
}
