pub mod audit_logs;
pub mod cart_items;
pub mod orders;
pub mod payment_verifications;
pub mod payout_accounts;
pub mod products;

pub use audit_logs::Entity as AuditLogs;
pub use cart_items::Entity as CartItems;
pub use orders::Entity as Orders;
pub use payment_verifications::Entity as PaymentVerifications;
pub use payout_accounts::Entity as PayoutAccounts;
pub use products::Entity as Products;
