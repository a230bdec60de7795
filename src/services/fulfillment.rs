//! The single path into `paid`: stock is checked under row locks, decremented,
//! and the order transitioned, all in one transaction.

use std::collections::BTreeMap;

use chrono::Utc;
use sea_orm::{DatabaseTransaction, Set, TransactionTrait};
use uuid::Uuid;

use crate::{
    audit,
    db::OrmConn,
    entity::orders::Model as OrderModel,
    error::{AppError, AppResult},
    lifecycle::ensure_transition,
    models::{CartSnapshot, OrderStatus},
    services::{
        catalog_service::{self, StockChange},
        order_store,
    },
};

/// Who confirmed the payment and why; becomes the approving verification record.
#[derive(Debug, Clone)]
pub struct Approval {
    pub verified_by: Option<Uuid>,
    pub notes: String,
}

#[derive(Debug)]
pub enum Settlement {
    Paid(OrderModel),
    /// The order was paid before this call; nothing changed.
    AlreadyPaid(OrderModel),
}

impl Settlement {
    pub fn into_order(self) -> OrderModel {
        match self {
            Settlement::Paid(order) | Settlement::AlreadyPaid(order) => order,
        }
    }
}

pub async fn fulfill(conn: &OrmConn, order_id: Uuid, approval: Approval) -> AppResult<Settlement> {
    let txn = conn.begin().await?;
    let order = order_store::lock_order(&txn, order_id).await?;
    settle(conn, txn, order, approval).await
}

/// Finish `txn` by paying `order`, which must have been loaded with a row lock
/// inside `txn`.
///
/// On a stock shortfall the transaction is rolled back and the order is moved
/// to `failed` in a separate transaction, with a rejected system record.
pub async fn settle(
    conn: &OrmConn,
    txn: DatabaseTransaction,
    order: OrderModel,
    approval: Approval,
) -> AppResult<Settlement> {
    if order.status == OrderStatus::Paid {
        txn.commit().await?;
        tracing::debug!(order_id = %order.id, "fulfillment replay ignored");
        return Ok(Settlement::AlreadyPaid(order));
    }
    ensure_transition(order.status, OrderStatus::Paid)?;

    let demand = demand_by_product(&order.cart_items);
    if let Some(product_id) = first_shortfall(&txn, &demand).await? {
        txn.rollback().await?;
        return fail_for_stock(conn, order.id, product_id, &approval).await;
    }
    for (&product_id, &quantity) in &demand {
        if catalog_service::decrement_stock(&txn, product_id, quantity).await? == StockChange::Insufficient {
            txn.rollback().await?;
            return fail_for_stock(conn, order.id, product_id, &approval).await;
        }
    }

    let now = Utc::now();
    let paid = order_store::transition(&txn, order, OrderStatus::Paid, |active| {
        active.payment_verified = Set(true);
        active.verified_at = Set(Some(now.into()));
    })
    .await?;
    order_store::append_verification(&txn, paid.id, approval.verified_by, true, approval.notes).await?;
    txn.commit().await?;

    tracing::info!(order_id = %paid.id, lines = demand.len(), "order fulfilled");
    Ok(Settlement::Paid(paid))
}

/// Total quantity per product. Iteration order is ascending product id, which
/// is also the lock acquisition order.
fn demand_by_product(cart: &CartSnapshot) -> BTreeMap<Uuid, i64> {
    let mut demand = BTreeMap::new();
    for line in &cart.0 {
        *demand.entry(line.product_id).or_insert(0) += i64::from(line.quantity);
    }
    demand
}

async fn first_shortfall(
    txn: &DatabaseTransaction,
    demand: &BTreeMap<Uuid, i64>,
) -> AppResult<Option<Uuid>> {
    for (&product_id, &quantity) in demand {
        match catalog_service::lock_stock(txn, product_id).await? {
            Some(stock) if i64::from(stock) >= quantity => {}
            _ => return Ok(Some(product_id)),
        }
    }
    Ok(None)
}

/// The rejected record keeps the approval notes, which carry the evidence
/// (extracted receipt, webhook event) the payment was accepted on.
async fn fail_for_stock(
    conn: &OrmConn,
    order_id: Uuid,
    product_id: Uuid,
    approval: &Approval,
) -> AppResult<Settlement> {
    let txn = conn.begin().await?;
    let order = order_store::lock_order(&txn, order_id).await?;
    let failed = order_store::transition(&txn, order, OrderStatus::Failed, |_| {}).await?;
    order_store::append_verification(
        &txn,
        failed.id,
        None,
        false,
        stock_rejection_note(product_id, &approval.notes),
    )
    .await?;
    txn.commit().await?;

    tracing::warn!(%order_id, %product_id, "fulfillment failed on stock");
    audit::record(
        conn,
        None,
        "fulfillment_failed",
        "orders",
        serde_json::json!({ "order_id": order_id, "product_id": product_id }),
    )
    .await;

    Err(AppError::InsufficientStock { product_id })
}

fn stock_rejection_note(product_id: Uuid, approval_notes: &str) -> String {
    format!(
        "rejected by system: insufficient stock for product {product_id}; payment evidence: {approval_notes}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CartLine;

    #[test]
    fn demand_merges_lines_and_sorts_by_product() {
        let a = Uuid::from_u128(2);
        let b = Uuid::from_u128(1);
        let line = |product_id, quantity| CartLine {
            product_id,
            name: "x".into(),
            unit_price: 10,
            quantity,
        };
        let cart = CartSnapshot(vec![line(a, 1), line(b, 2), line(a, 3)]);
        let demand: Vec<_> = demand_by_product(&cart).into_iter().collect();
        assert_eq!(demand, vec![(b, 2), (a, 4)]);
    }

    #[test]
    fn stock_rejection_keeps_payment_evidence() {
        let product_id = Uuid::from_u128(7);
        let note = stock_rejection_note(product_id, "auto-approved: ...; extracted={\"amount\":5500}");
        assert!(note.starts_with(&format!("rejected by system: insufficient stock for product {product_id}")));
        assert!(note.contains("\"amount\":5500"));
    }
}
