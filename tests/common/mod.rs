#![allow(dead_code)]

use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use axum_payment_reconciler::{
    channels::psp::{IntentRequest, PaymentIntent, PaymentProvider, PspError},
    config::PaymentConfig,
    db::{create_orm_conn_with_pool, create_schema},
    dto::{cart::AddToCartRequest, orders::CheckoutRequest, payouts::RegisterPayoutAccount},
    middleware::auth::{AuthUser, ROLE_ADMIN, ROLE_SELLER},
    models::{PaymentMethod, PayoutAccount, Product},
    ocr::{OcrError, TextRecognizer},
    services::{cart_service, catalog_service, payout_service},
    state::AppState,
    storage::LocalProofStore,
};
use uuid::Uuid;

pub const WEBHOOK_SECRET: &str = "whsec_test_secret";
pub const PNG: &str = "image/png";
pub const IMAGE: &[u8] = b"\x89PNG fake receipt";

/// Recognizer returning whatever text the test scripted.
#[derive(Default)]
pub struct ScriptedOcr {
    text: Mutex<String>,
    failing: AtomicBool,
}

impl ScriptedOcr {
    pub fn returns(&self, text: &str) {
        *self.text.lock().unwrap() = text.to_string();
        self.failing.store(false, Ordering::SeqCst);
    }

    pub fn fails(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl TextRecognizer for ScriptedOcr {
    async fn recognize(&self, _image: &[u8]) -> Result<String, OcrError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(OcrError::Engine("engine offline".into()));
        }
        Ok(self.text.lock().unwrap().clone())
    }
}

#[derive(Default)]
pub struct ScriptedPsp {
    failing: AtomicBool,
    pub calls: AtomicUsize,
}

impl ScriptedPsp {
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl PaymentProvider for ScriptedPsp {
    async fn create_payment_intent(&self, request: &IntentRequest) -> Result<PaymentIntent, PspError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(PspError::Api {
                status: 503,
                body: "upstream unavailable".into(),
            });
        }
        let id = format!("pi_{}", request.order_id.simple());
        Ok(PaymentIntent {
            client_secret: Some(format!("{id}_secret")),
            id,
            status: "requires_payment_method".into(),
        })
    }
}

pub struct TestApp {
    pub state: AppState,
    pub ocr: Arc<ScriptedOcr>,
    pub psp: Arc<ScriptedPsp>,
    pub seller_id: Uuid,
    _proof_dir: tempfile::TempDir,
}

pub async fn setup() -> anyhow::Result<TestApp> {
    let orm = create_orm_conn_with_pool("sqlite::memory:", 1).await?;
    create_schema(&orm).await?;

    let proof_dir = tempfile::tempdir()?;
    let mut config = PaymentConfig::default();
    config.proof_dir = proof_dir.path().to_path_buf();
    config.psp.webhook_secret = WEBHOOK_SECRET.to_string();
    config.ocr.timeout = Duration::from_secs(2);
    config.psp.timeout = Duration::from_secs(2);

    let ocr = Arc::new(ScriptedOcr::default());
    let psp = Arc::new(ScriptedPsp::default());
    let state = AppState {
        orm,
        proofs: Arc::new(LocalProofStore::new(
            config.proof_dir.clone(),
            config.max_proof_bytes,
        )),
        config: Arc::new(config),
        ocr: ocr.clone(),
        psp: psp.clone(),
    };

    Ok(TestApp {
        state,
        ocr,
        psp,
        seller_id: Uuid::new_v4(),
        _proof_dir: proof_dir,
    })
}

impl TestApp {
    pub fn admin(&self) -> AuthUser {
        AuthUser {
            user_id: Uuid::new_v4(),
            role: ROLE_ADMIN.into(),
        }
    }

    pub fn seller(&self) -> AuthUser {
        AuthUser {
            user_id: self.seller_id,
            role: ROLE_SELLER.into(),
        }
    }

    pub async fn product(&self, price: i64, stock: i32) -> anyhow::Result<Product> {
        Ok(catalog_service::create_product(&self.state.orm, self.seller_id, "Wax print", price, stock).await?)
    }

    pub async fn payout_account(
        &self,
        channel: PaymentMethod,
        holder_name: &str,
        holder_number: &str,
    ) -> anyhow::Result<PayoutAccount> {
        Ok(payout_service::register_account(
            &self.state.orm,
            RegisterPayoutAccount {
                seller_id: self.seller_id,
                channel,
                holder_name: holder_name.into(),
                holder_number: holder_number.into(),
            },
        )
        .await?)
    }

    pub async fn fill_cart(&self, session_id: &str, lines: &[(Uuid, i32)]) -> anyhow::Result<()> {
        for &(product_id, quantity) in lines {
            cart_service::add_item(
                &self.state.orm,
                session_id,
                AddToCartRequest {
                    product_id,
                    quantity,
                },
            )
            .await?;
        }
        Ok(())
    }
}

pub fn checkout_request(session_id: &str, payment_method: PaymentMethod) -> CheckoutRequest {
    CheckoutRequest {
        session_id: session_id.to_string(),
        customer_name: "Awa Mbarga".into(),
        customer_email: "awa@example.com".into(),
        customer_phone: "+237677000111".into(),
        payment_method,
        payment_channel_phone: Some("677000111".into()),
    }
}

pub fn mtn_receipt(amount: &str) -> String {
    format!(
        "Yello! You have transferred {amount} XAF to JEAN DUPONT (670000001) at 2024-05-12 14:03:22. \
         Transaction ID: 8812345678. New balance: 12,000 XAF."
    )
}
