use axum::{
    Json, Router,
    body::Bytes,
    extract::{DefaultBodyLimit, Path, State},
    http::{HeaderMap, StatusCode, header},
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::orders::{CheckoutRequest, CheckoutResponse, InitiationResponse, OrderStatusView, ProofOutcome},
    error::{AppError, AppResult},
    response::ApiResponse,
    services::{checkout_service, initiation_service, order_service, proof_service},
    state::AppState,
};

pub fn router(max_proof_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/checkout", post(checkout))
        .route("/{id}", get(order_status))
        .route("/{id}/initiate", post(initiate_payment))
        .route(
            "/{id}/proof",
            post(upload_proof).layer(DefaultBodyLimit::max(max_proof_bytes)),
        )
}

#[utoipa::path(
    post,
    path = "/api/orders/checkout",
    request_body = CheckoutRequest,
    responses(
        (status = 201, description = "Order created from the session cart", body = ApiResponse<CheckoutResponse>),
        (status = 400, description = "Invalid cart or customer fields"),
    ),
    tag = "Orders"
)]
pub async fn checkout(
    State(state): State<AppState>,
    Json(payload): Json<CheckoutRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<CheckoutResponse>>)> {
    let resp = checkout_service::checkout(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    params(
        ("id" = Uuid, Path, description = "Order ID")
    ),
    responses(
        (status = 200, description = "Order payment status", body = ApiResponse<OrderStatusView>),
        (status = 404, description = "Not Found"),
    ),
    tag = "Orders"
)]
pub async fn order_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<OrderStatusView>>> {
    let resp = order_service::order_status(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/orders/{id}/initiate",
    params(
        ("id" = Uuid, Path, description = "Order ID")
    ),
    responses(
        (status = 200, description = "Payment artifacts attached", body = ApiResponse<InitiationResponse>),
        (status = 409, description = "Order already finalized"),
        (status = 502, description = "Payment channel unavailable"),
    ),
    tag = "Orders"
)]
pub async fn initiate_payment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<InitiationResponse>>> {
    let resp = initiation_service::initiate_order(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/orders/{id}/proof",
    params(
        ("id" = Uuid, Path, description = "Order ID")
    ),
    request_body(content = Vec<u8>, content_type = "image/png", description = "Receipt image (png, jpeg or webp)"),
    responses(
        (status = 200, description = "Verification outcome", body = ApiResponse<ProofOutcome>),
        (status = 400, description = "Unsupported or empty image"),
        (status = 409, description = "Order already finalized"),
    ),
    tag = "Orders"
)]
pub async fn upload_proof(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<ApiResponse<ProofOutcome>>> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Validation("Content-Type header is required".into()))?;
    let resp = proof_service::submit_proof(&state, id, content_type, &body).await?;
    Ok(Json(resp))
}
