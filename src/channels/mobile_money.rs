use super::{ChannelArtifacts, InitiationRequest};
use crate::{
    config::PaymentConfig,
    error::{AppError, AppResult},
    models::{ChannelMetadata, PaymentMethod, PayoutAccount},
};

const QR_VERSION: &str = "MOMO1";

pub fn network_code(method: PaymentMethod) -> Option<&'static str> {
    match method {
        PaymentMethod::MtnMomo => Some("MTN"),
        PaymentMethod::OrangeMoney => Some("ORANGE"),
        _ => None,
    }
}

/// Compact `|`-separated payload encoded into the QR code shown at checkout.
pub fn build_qr_payload(
    network: &str,
    merchant_number: &str,
    amount: i64,
    currency: &str,
    order_id: &uuid::Uuid,
) -> String {
    format!("{QR_VERSION}|{network}|{merchant_number}|{amount}|{currency}|{order_id}")
}

/// Dial string: network short-code prefix, merchant number, amount, then `#`.
pub fn build_ussd_code(prefix: &str, merchant_number: &str, amount: i64) -> String {
    format!("{prefix}{merchant_number}*{amount}#")
}

pub fn initiate(
    config: &PaymentConfig,
    request: &InitiationRequest<'_>,
    payee: &PayoutAccount,
) -> AppResult<ChannelArtifacts> {
    let network = network_code(request.method).ok_or_else(|| {
        AppError::ChannelInitiation(format!("{} is not a mobile money network", request.method.as_str()))
    })?;
    let prefix = match request.method {
        PaymentMethod::MtnMomo => &config.mtn_ussd_prefix,
        _ => &config.orange_ussd_prefix,
    };
    let merchant: String = payee
        .holder_number
        .chars()
        .filter(char::is_ascii_digit)
        .collect();

    Ok(ChannelArtifacts {
        qr_payload: Some(build_qr_payload(
            network,
            &merchant,
            request.amount,
            request.currency,
            &request.order_id,
        )),
        ussd_code: Some(build_ussd_code(prefix, &merchant, request.amount)),
        metadata: Some(ChannelMetadata::MobileMoney {
            network: request.method,
            merchant_number: merchant,
        }),
        ..ChannelArtifacts::empty()
    })
}
