use reqwest::Url;

use super::{ChannelArtifacts, InitiationRequest};
use crate::{
    config::PaymentConfig,
    error::{AppError, AppResult},
    models::{ChannelMetadata, PayoutAccount},
};

/// Deep link into the messaging app, pre-filled with the order reference and amount.
pub fn build_chat_link(
    base: &str,
    seller_number: &str,
    message: &str,
) -> AppResult<String> {
    let digits: String = seller_number.chars().filter(char::is_ascii_digit).collect();
    let url = Url::parse_with_params(
        &format!("{}/{}", base.trim_end_matches('/'), digits),
        &[("text", message)],
    )
    .map_err(|e| AppError::ChannelInitiation(format!("chat link: {e}")))?;
    Ok(url.to_string())
}

pub fn payment_message(order_id: &uuid::Uuid, amount: i64, currency: &str) -> String {
    format!("Hello, I would like to pay order {order_id} for {amount} {currency}.")
}

pub fn initiate(
    config: &PaymentConfig,
    request: &InitiationRequest<'_>,
    payee: &PayoutAccount,
) -> AppResult<ChannelArtifacts> {
    let message = payment_message(&request.order_id, request.amount, request.currency);
    let link = build_chat_link(&config.chat_link_base, &payee.holder_number, &message)?;

    Ok(ChannelArtifacts {
        chat_link: Some(link),
        metadata: Some(ChannelMetadata::Chat {
            seller_number: payee.holder_number.clone(),
        }),
        ..ChannelArtifacts::empty()
    })
}
