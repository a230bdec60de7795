//! PSP webhook authentication and event decoding.
//!
//! Signature header format: `t=<unix seconds>,v1=<hex hmac-sha256>` computed
//! over `"<t>.<raw body>"` with the shared webhook secret.

use std::time::Duration;

use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

pub const SIGNATURE_HEADER: &str = "psp-signature";
pub const PAYMENT_SUCCEEDED: &str = "payment_intent.succeeded";

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, PartialEq, Eq)]
struct SignatureHeader {
    timestamp: i64,
    signatures: Vec<Vec<u8>>,
}

fn parse_header(header: &str) -> Option<SignatureHeader> {
    let mut timestamp = None;
    let mut signatures = Vec::new();
    for part in header.split(',') {
        let (key, value) = part.trim().split_once('=')?;
        match key {
            "t" => timestamp = value.parse::<i64>().ok(),
            "v1" => signatures.push(hex::decode(value).ok()?),
            _ => {}
        }
    }
    let timestamp = timestamp?;
    if signatures.is_empty() {
        return None;
    }
    Some(SignatureHeader {
        timestamp,
        signatures,
    })
}

fn mac_for(secret: &str, timestamp: i64, payload: &[u8]) -> AppResult<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::Internal(anyhow::anyhow!("webhook secret: {e}")))?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(mac)
}

/// Build a header value for `payload`. Used by tests and local tooling.
pub fn sign_payload(secret: &str, timestamp: i64, payload: &[u8]) -> AppResult<String> {
    let signature = mac_for(secret, timestamp, payload)?.finalize().into_bytes();
    Ok(format!("t={timestamp},v1={}", hex::encode(signature)))
}

/// Check the signature header against the raw body before anything is parsed.
pub fn verify_signature(
    secret: &str,
    header: &str,
    payload: &[u8],
    now: i64,
    tolerance: Duration,
) -> AppResult<()> {
    if secret.is_empty() {
        tracing::warn!("webhook received but no signing secret is configured");
        return Err(AppError::InvalidWebhookSignature);
    }
    let parsed = parse_header(header).ok_or_else(|| {
        tracing::warn!("malformed webhook signature header");
        AppError::InvalidWebhookSignature
    })?;

    let age = now.saturating_sub(parsed.timestamp).unsigned_abs();
    if age > tolerance.as_secs() {
        tracing::warn!(timestamp = parsed.timestamp, age, "webhook timestamp outside tolerance");
        return Err(AppError::InvalidWebhookSignature);
    }

    let mac = mac_for(secret, parsed.timestamp, payload)?;
    let valid = parsed
        .signatures
        .iter()
        .any(|candidate| mac.clone().verify_slice(candidate).is_ok());
    if !valid {
        tracing::warn!("webhook signature mismatch");
        return Err(AppError::InvalidWebhookSignature);
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
pub struct WebhookEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub data: EventData,
}

#[derive(Debug, Deserialize)]
pub struct EventData {
    pub object: IntentObject,
}

#[derive(Debug, Deserialize)]
pub struct IntentObject {
    pub id: String,
    #[serde(default)]
    pub amount: Option<i64>,
    #[serde(default)]
    pub metadata: IntentMetadata,
}

#[derive(Debug, Default, Deserialize)]
pub struct IntentMetadata {
    #[serde(default)]
    pub order_id: Option<String>,
}

impl WebhookEvent {
    pub fn parse(payload: &[u8]) -> AppResult<Self> {
        serde_json::from_slice(payload)
            .map_err(|e| AppError::Validation(format!("malformed webhook payload: {e}")))
    }

    pub fn is_payment_succeeded(&self) -> bool {
        self.kind == PAYMENT_SUCCEEDED
    }

    /// Order id carried in the intent metadata, if present and well formed.
    pub fn order_id(&self) -> Option<Uuid> {
        self.data
            .object
            .metadata
            .order_id
            .as_deref()
            .and_then(|raw| Uuid::parse_str(raw).ok())
    }

    pub fn intent_ref(&self) -> &str {
        &self.data.object.id
    }
}
