use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::StringLen;
use sea_orm::FromJsonQueryResult;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

/// Lifecycle of an order. `PendingManualReview` is the parked state where a
/// human has to confirm the payment before the order can become `Paid`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "waiting_payment")]
    WaitingPayment,
    #[sea_orm(string_value = "pending_manual_review")]
    PendingManualReview,
    #[sea_orm(string_value = "paid")]
    Paid,
    #[sea_orm(string_value = "failed")]
    Failed,
    #[sea_orm(string_value = "refunded")]
    Refunded,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::WaitingPayment => "waiting_payment",
            OrderStatus::PendingManualReview => "pending_manual_review",
            OrderStatus::Paid => "paid",
            OrderStatus::Failed => "failed",
            OrderStatus::Refunded => "refunded",
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Peer-to-peer transfer negotiated over a messaging app.
    #[sea_orm(string_value = "chat")]
    Chat,
    #[sea_orm(string_value = "mtn_momo")]
    MtnMomo,
    #[sea_orm(string_value = "orange_money")]
    OrangeMoney,
    #[sea_orm(string_value = "card")]
    Card,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Chat => "chat",
            PaymentMethod::MtnMomo => "mtn_momo",
            PaymentMethod::OrangeMoney => "orange_money",
            PaymentMethod::Card => "card",
        }
    }

    /// Channels settled outside the system and confirmed with a receipt image.
    pub fn accepts_proof(&self) -> bool {
        !matches!(self, PaymentMethod::Card)
    }
}

/// One line of the frozen cart snapshot stored on an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CartLine {
    pub product_id: Uuid,
    pub name: String,
    pub unit_price: i64,
    pub quantity: i32,
}

impl CartLine {
    pub fn line_total(&self) -> i64 {
        self.unit_price * i64::from(self.quantity)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult, ToSchema)]
#[serde(transparent)]
pub struct CartSnapshot(pub Vec<CartLine>);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChannelMetadata {
    Chat {
        seller_number: String,
    },
    MobileMoney {
        network: PaymentMethod,
        merchant_number: String,
    },
    Card {
        payment_intent_id: String,
        client_secret: Option<String>,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromJsonQueryResult, ToSchema)]
pub struct OrderMetadata {
    pub channel: Option<ChannelMetadata>,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub seller_id: Uuid,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub payment_method: PaymentMethod,
    pub payment_channel_phone: Option<String>,
    pub cart_items: Vec<CartLine>,
    pub subtotal: i64,
    pub tax: i64,
    pub total: i64,
    pub currency: String,
    pub status: OrderStatus,
    pub payment_verified: bool,
    pub verified_at: Option<DateTime<Utc>>,
    pub proof_image_ref: Option<String>,
    pub qr_payload: Option<String>,
    pub ussd_code: Option<String>,
    pub chat_link: Option<String>,
    pub psp_intent_ref: Option<String>,
    pub metadata: OrderMetadata,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VerificationRecord {
    pub id: Uuid,
    pub order_id: Uuid,
    /// `None` means the decision was taken by the system.
    pub verified_by: Option<Uuid>,
    pub is_approved: bool,
    pub notes: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: Uuid,
    pub seller_id: Uuid,
    pub name: String,
    pub price: i64,
    pub stock: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PayoutAccount {
    pub id: Uuid,
    pub seller_id: Uuid,
    pub channel: PaymentMethod,
    pub holder_name: String,
    pub holder_number: String,
    pub active: bool,
}
