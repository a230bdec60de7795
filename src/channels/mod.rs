//! Payment channel initiators. Each strategy produces the artifacts a customer
//! needs to pay through its channel.

pub mod card;
pub mod chat;
pub mod mobile_money;
pub mod psp;

use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    config::PaymentConfig,
    entity::orders::Model as OrderModel,
    error::{AppError, AppResult},
    models::{ChannelMetadata, PaymentMethod, PayoutAccount},
};
use psp::PaymentProvider;

/// What an initiator hands back to the customer and stores on the order.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ChannelArtifacts {
    pub chat_link: Option<String>,
    pub qr_payload: Option<String>,
    pub ussd_code: Option<String>,
    pub psp_intent_ref: Option<String>,
    pub client_secret: Option<String>,
    #[serde(skip)]
    pub metadata: Option<ChannelMetadata>,
}

impl ChannelArtifacts {
    fn empty() -> Self {
        Self {
            chat_link: None,
            qr_payload: None,
            ussd_code: None,
            psp_intent_ref: None,
            client_secret: None,
            metadata: None,
        }
    }

    /// Artifacts already attached to an order.
    pub fn stored(order: &OrderModel) -> Self {
        let channel = order.metadata.channel.clone();
        let client_secret = match &channel {
            Some(ChannelMetadata::Card { client_secret, .. }) => client_secret.clone(),
            _ => None,
        };
        Self {
            chat_link: order.chat_link.clone(),
            qr_payload: order.qr_payload.clone(),
            ussd_code: order.ussd_code.clone(),
            psp_intent_ref: order.psp_intent_ref.clone(),
            client_secret,
            metadata: channel,
        }
    }
}

#[derive(Debug, Clone)]
pub struct InitiationRequest<'a> {
    pub order_id: Uuid,
    pub amount: i64,
    pub currency: &'a str,
    pub method: PaymentMethod,
    /// Seller account receiving the transfer; required by chat and mobile money.
    pub payee: Option<&'a PayoutAccount>,
}

/// Run the strategy selected by the order's payment method.
pub async fn initiate(
    config: &PaymentConfig,
    psp: &dyn PaymentProvider,
    request: &InitiationRequest<'_>,
) -> AppResult<ChannelArtifacts> {
    match request.method {
        PaymentMethod::Chat => {
            let payee = require_payee(request)?;
            chat::initiate(config, request, payee)
        }
        PaymentMethod::MtnMomo | PaymentMethod::OrangeMoney => {
            let payee = require_payee(request)?;
            mobile_money::initiate(config, request, payee)
        }
        PaymentMethod::Card => card::initiate(config, psp, request).await,
    }
}

fn require_payee<'a>(request: &InitiationRequest<'a>) -> AppResult<&'a PayoutAccount> {
    request.payee.ok_or_else(|| {
        AppError::ChannelInitiation(format!(
            "seller has no active {} payout account",
            request.method.as_str()
        ))
    })
}
