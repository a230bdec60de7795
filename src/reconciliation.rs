//! Automatic comparison of an extracted receipt against an order and the
//! seller's registered payout accounts.

use std::fmt;

use serde::Serialize;
use uuid::Uuid;

use crate::{models::PayoutAccount, ocr::ExtractedFields};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum ReviewReason {
    AmountNotDetected,
    AmountMismatch { expected: i64, found: i64 },
    CounterpartyMissing,
    NoMatchingAccount { name: String, number: String },
    ExtractionFailed { error: String },
}

impl fmt::Display for ReviewReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReviewReason::AmountNotDetected => write!(f, "amount not detected"),
            ReviewReason::AmountMismatch { expected, found } => {
                write!(f, "amount mismatch: expected {expected}, found {found}")
            }
            ReviewReason::CounterpartyMissing => write!(f, "counterparty name or number not detected"),
            ReviewReason::NoMatchingAccount { name, number } => write!(
                f,
                "no active payout account matches counterparty {name} ({number})"
            ),
            ReviewReason::ExtractionFailed { error } => write!(f, "extraction failed: {error}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Receipt matches the order amount and an active payout account.
    Approve { account_id: Uuid },
    /// Automation declined; a human has to look at the proof.
    Park(ReviewReason),
}

/// Decide between auto-approval and manual review. Deterministic for identical inputs.
pub fn reconcile(
    expected_total: i64,
    fields: &ExtractedFields,
    accounts: &[PayoutAccount],
    tolerance: i64,
) -> Decision {
    let Some(found) = fields.amount else {
        return Decision::Park(ReviewReason::AmountNotDetected);
    };
    if (found - expected_total).abs() > tolerance {
        return Decision::Park(ReviewReason::AmountMismatch {
            expected: expected_total,
            found,
        });
    }

    let (Some(name), Some(number)) = (
        fields.counterparty_name.as_deref(),
        fields.counterparty_number.as_deref(),
    ) else {
        return Decision::Park(ReviewReason::CounterpartyMissing);
    };

    let wanted_name = normalize_name(name);
    let wanted_number = digits_only(number);
    accounts
        .iter()
        .filter(|account| account.active)
        .find(|account| {
            normalize_name(&account.holder_name) == wanted_name
                && digits_only(&account.holder_number) == wanted_number
        })
        .map(|account| Decision::Approve {
            account_id: account.id,
        })
        .unwrap_or_else(|| {
            Decision::Park(ReviewReason::NoMatchingAccount {
                name: name.to_string(),
                number: number.to_string(),
            })
        })
}

fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn digits_only(number: &str) -> String {
    number.chars().filter(char::is_ascii_digit).collect()
}
