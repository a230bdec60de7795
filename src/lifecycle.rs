//! Order state graph.
//!
//! ```text
//! pending -> waiting_payment -> paid
//!                  |              ^
//!                  v              |
//!        pending_manual_review ---+
//! ```
//!
//! Every non-terminal state may also move to `failed` or `refunded`.

use crate::{
    error::{AppError, AppResult},
    models::OrderStatus,
};

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Paid | OrderStatus::Failed | OrderStatus::Refunded
        )
    }

    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        match (self, next) {
            (Pending, WaitingPayment) => true,
            (WaitingPayment, Paid) | (WaitingPayment, PendingManualReview) => true,
            (PendingManualReview, Paid) => true,
            (from, Failed) | (from, Refunded) => !from.is_terminal(),
            _ => false,
        }
    }
}

/// Reject any edge that is not part of the graph.
pub fn ensure_transition(from: OrderStatus, to: OrderStatus) -> AppResult<()> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        tracing::warn!(from = from.as_str(), to = to.as_str(), "invalid order transition");
        Err(AppError::InvalidTransition { from, to })
    }
}
