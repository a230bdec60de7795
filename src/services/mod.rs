pub mod cart_service;
pub mod catalog_service;
pub mod checkout_service;
pub mod fulfillment;
pub mod initiation_service;
pub mod order_service;
pub mod order_store;
pub mod payout_service;
pub mod proof_service;
pub mod verification_service;
pub mod webhook_service;
