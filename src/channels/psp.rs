//! Card payment-service-provider client (Stripe-compatible REST API).

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use crate::config::PspConfig;

#[derive(Debug, Error)]
pub enum PspError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("psp api error status={status} body={body}")]
    Api { status: u16, body: String },
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("psp is not configured")]
    NotConfigured,
}

#[derive(Debug, Clone)]
pub struct IntentRequest {
    pub order_id: Uuid,
    pub amount: i64,
    pub currency: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: Option<String>,
    pub status: String,
}

#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Create an intent carrying `order_id` as metadata so webhook events can be correlated.
    async fn create_payment_intent(&self, request: &IntentRequest) -> Result<PaymentIntent, PspError>;
}

pub struct StripeClient {
    http: reqwest::Client,
    api_base: String,
    secret_key: String,
}

impl StripeClient {
    pub fn new(config: &PspConfig) -> Result<Self, PspError> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            secret_key: config.secret_key.clone(),
        })
    }
}

#[async_trait]
impl PaymentProvider for StripeClient {
    async fn create_payment_intent(&self, request: &IntentRequest) -> Result<PaymentIntent, PspError> {
        if self.secret_key.is_empty() {
            return Err(PspError::NotConfigured);
        }

        let order_id = request.order_id.to_string();
        let amount = request.amount.to_string();
        let currency = request.currency.to_lowercase();
        let form = [
            ("amount", amount.as_str()),
            ("currency", currency.as_str()),
            ("metadata[order_id]", order_id.as_str()),
            ("automatic_payment_methods[enabled]", "true"),
        ];

        let resp = self
            .http
            .post(format!("{}/v1/payment_intents", self.api_base))
            .bearer_auth(&self.secret_key)
            // Retried initiations for the same order reuse the same intent.
            .header("Idempotency-Key", format!("order-{order_id}"))
            .form(&form)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(PspError::Api {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str::<PaymentIntent>(&body)
            .map_err(|e| PspError::InvalidResponse(format!("{e}; body={body}")))
    }
}
