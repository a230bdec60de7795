use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    channels::ChannelArtifacts,
    dto::{
        cart::{AddToCartRequest, CartEntry, CartList},
        orders::{
            CheckoutRequest, CheckoutResponse, InitiationResponse, ManualDecision,
            ManualDecisionKind, OrderList, OrderStatusView, OrderWithVerifications, ProofOutcome,
            RefundRequest, VerificationOutcome, WebhookAck,
        },
        payouts::RegisterPayoutAccount,
    },
    models::{
        CartLine, ChannelMetadata, Order, OrderMetadata, OrderStatus, PaymentMethod,
        PayoutAccount, VerificationRecord,
    },
    ocr::ExtractedFields,
    response::{ApiResponse, Meta},
    routes::{admin, cart, health, orders, params, webhooks},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        health::readiness,
        cart::cart_list,
        cart::add_to_cart,
        orders::checkout,
        orders::order_status,
        orders::initiate_payment,
        orders::upload_proof,
        admin::list_orders,
        admin::get_order,
        admin::verify_order,
        admin::refund_order,
        admin::register_payout_account,
        webhooks::psp_webhook
    ),
    components(
        schemas(
            Order,
            OrderStatus,
            PaymentMethod,
            CartLine,
            OrderMetadata,
            ChannelMetadata,
            ChannelArtifacts,
            VerificationRecord,
            PayoutAccount,
            ExtractedFields,
            AddToCartRequest,
            CartEntry,
            CartList,
            CheckoutRequest,
            CheckoutResponse,
            InitiationResponse,
            ProofOutcome,
            VerificationOutcome,
            ManualDecision,
            ManualDecisionKind,
            RefundRequest,
            OrderStatusView,
            OrderWithVerifications,
            OrderList,
            WebhookAck,
            RegisterPayoutAccount,
            params::Pagination,
            params::SortOrder,
            params::OrderListQuery,
            Meta,
            ApiResponse<Order>,
            ApiResponse<CheckoutResponse>,
            ApiResponse<ProofOutcome>,
            ApiResponse<OrderStatusView>,
            ApiResponse<OrderList>,
            ApiResponse<OrderWithVerifications>
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Cart", description = "Guest cart endpoints"),
        (name = "Orders", description = "Checkout, payment initiation and proof upload"),
        (name = "Admin", description = "Review queue and manual verification"),
        (name = "Webhooks", description = "Payment provider callbacks"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
