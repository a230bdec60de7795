//! Proof-of-payment extraction: text recognition followed by field patterns.

mod patterns;
mod tesseract;

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

pub use patterns::{extract_fields, parse_amount};
pub use tesseract::TesseractCli;

const RAW_TEXT_LIMIT: usize = 500;

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("image is empty")]
    EmptyImage,
    #[error("recognition engine failed: {0}")]
    Engine(String),
    #[error("recognition engine i/o: {0}")]
    Io(#[from] std::io::Error),
    #[error("recognition timed out after {0:?}")]
    Timeout(Duration),
}

/// Turns an image into plain text.
#[async_trait]
pub trait TextRecognizer: Send + Sync {
    async fn recognize(&self, image: &[u8]) -> Result<String, OcrError>;
}

/// Structured view of a transfer receipt. Fields that no pattern matched are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ExtractedFields {
    pub amount: Option<i64>,
    pub counterparty_name: Option<String>,
    pub counterparty_number: Option<String>,
    pub timestamp: Option<NaiveDateTime>,
    pub transaction_reference: Option<String>,
    pub resulting_balance: Option<i64>,
    /// Recognised text, truncated, kept for the audit trail.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub raw_text: String,
}

impl ExtractedFields {
    /// Copy suitable for showing to the customer.
    pub fn for_display(&self) -> Self {
        Self {
            raw_text: String::new(),
            ..self.clone()
        }
    }
}

/// Run recognition under a deadline and parse the receipt fields.
pub async fn extract_proof(
    recognizer: &dyn TextRecognizer,
    image: &[u8],
    timeout: Duration,
) -> Result<ExtractedFields, OcrError> {
    if image.is_empty() {
        return Err(OcrError::EmptyImage);
    }
    let text = tokio::time::timeout(timeout, recognizer.recognize(image))
        .await
        .map_err(|_| OcrError::Timeout(timeout))??;

    let fields = extract_fields(&text);
    tracing::debug!(
        amount = ?fields.amount,
        counterparty_number = ?fields.counterparty_number,
        "receipt fields extracted"
    );
    Ok(fields)
}

fn truncate_raw(text: &str) -> String {
    if text.chars().count() > RAW_TEXT_LIMIT {
        let head: String = text.chars().take(RAW_TEXT_LIMIT).collect();
        format!("{head}...")
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct SlowRecognizer;

    #[async_trait]
    impl TextRecognizer for SlowRecognizer {
        async fn recognize(&self, _image: &[u8]) -> Result<String, OcrError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(String::new())
        }
    }

    struct BrokenRecognizer;

    #[async_trait]
    impl TextRecognizer for BrokenRecognizer {
        async fn recognize(&self, _image: &[u8]) -> Result<String, OcrError> {
            Err(OcrError::Engine("segfault".into()))
        }
    }

    #[tokio::test]
    async fn timeout_is_an_error_not_an_empty_result() {
        let err = extract_proof(&SlowRecognizer, b"img", Duration::from_millis(20))
            .await
            .unwrap_err();
        assert!(matches!(err, OcrError::Timeout(_)));
    }

    #[tokio::test]
    async fn engine_failure_is_reported() {
        let err = extract_proof(&BrokenRecognizer, b"img", Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, OcrError::Engine(_)));
    }

    #[test]
    fn raw_text_is_truncated() {
        let long = "a".repeat(600);
        let out = truncate_raw(&long);
        assert_eq!(out.len(), RAW_TEXT_LIMIT + 3);
        assert!(out.ends_with("..."));
        assert_eq!(truncate_raw("short"), "short");
    }
}
