//! Proof-of-payment upload: store the image, read it, reconcile, record.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, Set, TransactionTrait};
use uuid::Uuid;

use crate::{
    audit,
    dto::orders::{ProofOutcome, VerificationOutcome},
    entity::orders::ActiveModel as OrderActive,
    error::{AppError, AppResult},
    models::OrderStatus,
    ocr::{self, ExtractedFields},
    reconciliation::{Decision, ReviewReason, reconcile},
    response::ApiResponse,
    services::{
        fulfillment::{self, Approval},
        order_store, payout_service,
    },
    state::AppState,
    storage::ProofStore,
};

fn ensure_accepts_proof(status: OrderStatus) -> AppResult<()> {
    match status {
        OrderStatus::WaitingPayment | OrderStatus::PendingManualReview => Ok(()),
        from => Err(AppError::InvalidTransition {
            from,
            to: OrderStatus::PendingManualReview,
        }),
    }
}

fn verification_notes(decision: &Decision, fields: Option<&ExtractedFields>) -> String {
    let head = match decision {
        Decision::Approve { account_id } => {
            format!("auto-approved: counterparty matches payout account {account_id}")
        }
        Decision::Park(reason) => format!("parked for manual review: {reason}"),
    };
    match fields.and_then(|f| serde_json::to_string(f).ok()) {
        Some(json) => format!("{head}; extracted={json}"),
        None => head,
    }
}

pub async fn submit_proof(
    state: &AppState,
    order_id: Uuid,
    content_type: &str,
    image: &[u8],
) -> AppResult<ApiResponse<ProofOutcome>> {
    let order = order_store::find_order(&state.orm, order_id).await?;
    if !order.payment_method.accepts_proof() {
        return Err(AppError::Validation(
            "card payments are confirmed by the payment provider".into(),
        ));
    }
    ensure_accepts_proof(order.status)?;

    let reference = state.proofs.save(order.id, content_type, image).await?;
    {
        let txn = state.orm.begin().await?;
        let locked = order_store::lock_order(&txn, order_id).await?;
        ensure_accepts_proof(locked.status)?;
        let mut active: OrderActive = locked.into();
        active.proof_image_ref = Set(Some(reference.clone()));
        active.updated_at = Set(Utc::now().into());
        active.update(&txn).await?;
        txn.commit().await?;
    }

    let accounts =
        payout_service::list_active_payout_accounts(&state.orm, order.seller_id, order.payment_method)
            .await?;

    // Recognition runs outside any transaction; it can take seconds.
    let (decision, fields) =
        match ocr::extract_proof(state.ocr.as_ref(), image, state.config.ocr.timeout).await {
            Ok(fields) => {
                let decision = reconcile(order.total, &fields, &accounts, state.config.amount_tolerance);
                (decision, Some(fields))
            }
            Err(err) => {
                tracing::warn!(%order_id, error = %err, "proof extraction failed");
                let reason = ReviewReason::ExtractionFailed {
                    error: err.to_string(),
                };
                (Decision::Park(reason), None)
            }
        };
    let notes = verification_notes(&decision, fields.as_ref());

    let txn = state.orm.begin().await?;
    let locked = order_store::lock_order(&txn, order_id).await?;
    ensure_accepts_proof(locked.status)?;

    let (outcome, status) = match (decision, locked.status) {
        (Decision::Approve { .. }, OrderStatus::WaitingPayment) => {
            let approval = Approval {
                verified_by: None,
                notes,
            };
            let paid = fulfillment::settle(&state.orm, txn, locked, approval)
                .await?
                .into_order();
            (VerificationOutcome::Approved, paid.status)
        }
        (Decision::Approve { .. }, status) => {
            // Already parked: a human has the final word.
            order_store::append_verification(
                &txn,
                order_id,
                None,
                false,
                format!("awaiting manual confirmation; {notes}"),
            )
            .await?;
            txn.commit().await?;
            (VerificationOutcome::PendingReview, status)
        }
        (Decision::Park(reason), status) => {
            let status = if status == OrderStatus::WaitingPayment {
                order_store::transition(&txn, locked, OrderStatus::PendingManualReview, |_| {})
                    .await?
                    .status
            } else {
                status
            };
            order_store::append_verification(&txn, order_id, None, false, notes).await?;
            txn.commit().await?;
            let outcome = match reason {
                ReviewReason::ExtractionFailed { .. } => VerificationOutcome::Error,
                _ => VerificationOutcome::PendingReview,
            };
            (outcome, status)
        }
    };

    tracing::info!(%order_id, outcome = ?outcome, status = status.as_str(), "proof processed");
    audit::record(
        &state.orm,
        None,
        "proof_submitted",
        "orders",
        serde_json::json!({ "order_id": order_id, "proof": reference, "outcome": outcome }),
    )
    .await;

    let message = match outcome {
        VerificationOutcome::Approved => "Payment confirmed",
        VerificationOutcome::PendingReview => "Payment pending verification",
        VerificationOutcome::Error => "Proof received, awaiting manual review",
    };
    Ok(ApiResponse::ok(
        message,
        ProofOutcome {
            order_id,
            outcome,
            status,
            extracted: fields.as_ref().map(ExtractedFields::for_display),
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notes_carry_reason_and_payload() {
        let fields = ExtractedFields {
            amount: Some(5000),
            raw_text: "You have transferred 5,000 XAF".into(),
            ..Default::default()
        };
        let decision = Decision::Park(ReviewReason::AmountMismatch {
            expected: 5500,
            found: 5000,
        });
        let notes = verification_notes(&decision, Some(&fields));
        assert!(notes.starts_with("parked for manual review: amount mismatch"));
        assert!(notes.contains("\"amount\":5000"));
        assert!(notes.contains("transferred 5,000 XAF"));
    }

    #[test]
    fn only_open_orders_take_proofs() {
        assert!(ensure_accepts_proof(OrderStatus::WaitingPayment).is_ok());
        assert!(ensure_accepts_proof(OrderStatus::PendingManualReview).is_ok());
        for status in [
            OrderStatus::Pending,
            OrderStatus::Paid,
            OrderStatus::Failed,
            OrderStatus::Refunded,
        ] {
            assert!(ensure_accepts_proof(status).is_err());
        }
    }
}
