use std::sync::Arc;

use crate::{
    channels::psp::PaymentProvider, config::PaymentConfig, db::OrmConn, ocr::TextRecognizer,
    storage::ProofStore,
};

#[derive(Clone)]
pub struct AppState {
    pub orm: OrmConn,
    pub config: Arc<PaymentConfig>,
    pub ocr: Arc<dyn TextRecognizer>,
    pub psp: Arc<dyn PaymentProvider>,
    pub proofs: Arc<dyn ProofStore>,
}
