use sea_orm::entity::prelude::*;

use crate::models::{CartSnapshot, OrderMetadata, OrderStatus, PaymentMethod};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub seller_id: Uuid,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub payment_method: PaymentMethod,
    pub payment_channel_phone: Option<String>,
    #[sea_orm(column_type = "Json")]
    pub cart_items: CartSnapshot,
    pub subtotal: i64,
    pub tax: i64,
    pub total: i64,
    pub currency: String,
    pub status: OrderStatus,
    pub payment_verified: bool,
    pub verified_at: Option<DateTimeWithTimeZone>,
    pub proof_image_ref: Option<String>,
    pub qr_payload: Option<String>,
    pub ussd_code: Option<String>,
    pub chat_link: Option<String>,
    #[sea_orm(indexed)]
    pub psp_intent_ref: Option<String>,
    #[sea_orm(column_type = "Json")]
    pub metadata: OrderMetadata,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::payment_verifications::Entity")]
    PaymentVerifications,
}

impl Related<super::payment_verifications::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PaymentVerifications.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
