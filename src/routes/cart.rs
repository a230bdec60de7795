use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};

use crate::{
    dto::cart::{AddToCartRequest, CartList},
    error::AppResult,
    response::ApiResponse,
    services::cart_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/{session_id}", get(cart_list).post(add_to_cart))
}

#[utoipa::path(
    get,
    path = "/api/cart/{session_id}",
    params(
        ("session_id" = String, Path, description = "Guest session id")
    ),
    responses(
        (status = 200, description = "Cart snapshot for the session", body = ApiResponse<CartList>)
    ),
    tag = "Cart"
)]
pub async fn cart_list(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> AppResult<Json<ApiResponse<CartList>>> {
    let resp = cart_service::cart_list(&state, session_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/cart/{session_id}",
    params(
        ("session_id" = String, Path, description = "Guest session id")
    ),
    request_body = AddToCartRequest,
    responses(
        (status = 200, description = "Add or merge a cart line", body = ApiResponse<CartList>),
        (status = 400, description = "Bad request"),
    ),
    tag = "Cart"
)]
pub async fn add_to_cart(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(payload): Json<AddToCartRequest>,
) -> AppResult<Json<ApiResponse<CartList>>> {
    let resp = cart_service::add_to_cart(&state, session_id, payload).await?;
    Ok(Json(resp))
}
