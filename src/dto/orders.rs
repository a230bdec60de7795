use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    channels::ChannelArtifacts,
    models::{Order, OrderStatus, PaymentMethod, VerificationRecord},
    ocr::ExtractedFields,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckoutRequest {
    /// Guest cart to turn into an order.
    pub session_id: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub payment_method: PaymentMethod,
    pub payment_channel_phone: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CheckoutResponse {
    pub order: Order,
    /// Absent when the payment channel could not be initiated; retry with
    /// `POST /api/orders/{id}/initiate`.
    pub artifacts: Option<ChannelArtifacts>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InitiationResponse {
    pub order_id: Uuid,
    pub status: OrderStatus,
    pub artifacts: ChannelArtifacts,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum VerificationOutcome {
    Approved,
    PendingReview,
    Error,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProofOutcome {
    pub order_id: Uuid,
    pub outcome: VerificationOutcome,
    pub status: OrderStatus,
    /// Fields read from the receipt, for display. Absent when the image could not be read.
    pub extracted: Option<ExtractedFields>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ManualDecisionKind {
    Approve,
    Reject,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ManualDecision {
    pub decision: ManualDecisionKind,
    /// Mandatory when rejecting.
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RefundRequest {
    pub reason: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderStatusView {
    pub order_id: Uuid,
    pub status: OrderStatus,
    pub payment_verified: bool,
    pub final_amount: i64,
    pub currency: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderWithVerifications {
    pub order: Order,
    pub verifications: Vec<VerificationRecord>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<Order>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WebhookAck {
    pub event_id: String,
    /// False for ignored event types and replays.
    pub applied: bool,
    pub order_id: Option<Uuid>,
}
