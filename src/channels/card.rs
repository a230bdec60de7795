use super::{psp::IntentRequest, ChannelArtifacts, InitiationRequest, PaymentProvider};
use crate::{
    config::PaymentConfig,
    error::{AppError, AppResult},
    models::ChannelMetadata,
};

/// The only initiator with a network call. Failures leave the order untouched.
pub async fn initiate(
    config: &PaymentConfig,
    psp: &dyn PaymentProvider,
    request: &InitiationRequest<'_>,
) -> AppResult<ChannelArtifacts> {
    let intent_request = IntentRequest {
        order_id: request.order_id,
        amount: request.amount,
        currency: request.currency.to_string(),
    };

    let intent = tokio::time::timeout(config.psp.timeout, psp.create_payment_intent(&intent_request))
        .await
        .map_err(|_| {
            tracing::warn!(order_id = %request.order_id, "psp call timed out");
            AppError::ChannelInitiation("psp timeout".into())
        })?
        .map_err(|err| {
            tracing::warn!(order_id = %request.order_id, error = %err, "psp intent creation failed");
            AppError::ChannelInitiation(err.to_string())
        })?;

    tracing::info!(order_id = %request.order_id, intent = %intent.id, status = %intent.status, "payment intent created");
    Ok(ChannelArtifacts {
        psp_intent_ref: Some(intent.id.clone()),
        client_secret: intent.client_secret.clone(),
        metadata: Some(ChannelMetadata::Card {
            payment_intent_id: intent.id,
            client_secret: intent.client_secret,
        }),
        ..ChannelArtifacts::empty()
    })
}
