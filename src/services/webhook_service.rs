use chrono::Utc;
use uuid::Uuid;

use crate::{
    audit,
    dto::orders::WebhookAck,
    error::{AppError, AppResult},
    response::ApiResponse,
    services::{
        fulfillment::{self, Approval, Settlement},
        order_store,
    },
    state::AppState,
    webhook::{WebhookEvent, verify_signature},
};

/// Authenticate and apply one PSP event. Replays are harmless: fulfillment is
/// a no-op for orders that are already paid.
pub async fn handle_psp_event(
    state: &AppState,
    signature: Option<&str>,
    payload: &[u8],
) -> AppResult<ApiResponse<WebhookAck>> {
    let psp = &state.config.psp;
    let signature = signature.ok_or_else(|| {
        tracing::warn!("webhook without signature header");
        AppError::InvalidWebhookSignature
    })?;
    verify_signature(
        &psp.webhook_secret,
        signature,
        payload,
        Utc::now().timestamp(),
        psp.webhook_tolerance,
    )?;

    let event = WebhookEvent::parse(payload)?;
    if !event.is_payment_succeeded() {
        tracing::debug!(event_id = %event.id, kind = %event.kind, "webhook event ignored");
        return Ok(ack("Event ignored", &event, false, None));
    }

    let order_id = resolve_order(state, &event).await?;
    let approval = Approval {
        verified_by: None,
        notes: format!(
            "card payment confirmed by provider: intent {} event {}",
            event.intent_ref(),
            event.id
        ),
    };

    match fulfillment::fulfill(&state.orm, order_id, approval).await? {
        Settlement::Paid(order) => {
            audit::record(
                &state.orm,
                None,
                "webhook_payment_confirmed",
                "orders",
                serde_json::json!({ "order_id": order.id, "event_id": event.id }),
            )
            .await;
            Ok(ack("Payment confirmed", &event, true, Some(order.id)))
        }
        Settlement::AlreadyPaid(order) => {
            tracing::info!(order_id = %order.id, event_id = %event.id, "webhook replay");
            Ok(ack("Already processed", &event, false, Some(order.id)))
        }
    }
}

async fn resolve_order(state: &AppState, event: &WebhookEvent) -> AppResult<Uuid> {
    let intent = event.intent_ref();
    let order = match event.order_id() {
        Some(id) => order_store::find_order(&state.orm, id).await?,
        None => order_store::find_by_intent(&state.orm, intent)
            .await?
            .ok_or_else(|| {
                tracing::warn!(intent, "webhook for unknown payment intent");
                AppError::NotFound
            })?,
    };

    if let Some(stored) = order.psp_intent_ref.as_deref() {
        if stored != intent {
            tracing::warn!(order_id = %order.id, stored, intent, "webhook intent mismatch");
            return Err(AppError::Validation("payment intent does not match order".into()));
        }
    }
    Ok(order.id)
}

fn ack(message: &str, event: &WebhookEvent, applied: bool, order_id: Option<Uuid>) -> ApiResponse<WebhookAck> {
    ApiResponse::ok(
        message,
        WebhookAck {
            event_id: event.id.clone(),
            applied,
            order_id,
        },
    )
}
