use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::HeaderMap,
    routing::post,
};

use crate::{
    dto::orders::WebhookAck,
    error::AppResult,
    response::ApiResponse,
    services::webhook_service,
    state::AppState,
    webhook::SIGNATURE_HEADER,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/psp", post(psp_webhook))
}

#[utoipa::path(
    post,
    path = "/api/webhooks/psp",
    request_body(content = String, content_type = "application/json", description = "Raw PSP event"),
    params(
        ("Psp-Signature" = String, Header, description = "t=<unix>,v1=<hex hmac-sha256>")
    ),
    responses(
        (status = 200, description = "Event acknowledged", body = ApiResponse<WebhookAck>),
        (status = 400, description = "Invalid signature"),
    ),
    tag = "Webhooks"
)]
pub async fn psp_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<ApiResponse<WebhookAck>>> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());
    let resp = webhook_service::handle_psp_event(&state, signature, &body).await?;
    Ok(Json(resp))
}
