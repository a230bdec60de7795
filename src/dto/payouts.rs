use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::PaymentMethod;

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterPayoutAccount {
    pub seller_id: Uuid,
    pub channel: PaymentMethod,
    pub holder_name: String,
    pub holder_number: String,
}
