//! Product stock, as seen by checkout and fulfillment.

use chrono::Utc;
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    entity::products::{ActiveModel as ProductActive, Column as ProdCol, Entity as Products, Model as ProductModel},
    error::{AppError, AppResult},
    models::Product,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockChange {
    Decremented,
    Insufficient,
}

pub async fn get_stock<C: ConnectionTrait>(conn: &C, product_id: Uuid) -> AppResult<i32> {
    Products::find_by_id(product_id)
        .one(conn)
        .await?
        .map(|p| p.stock)
        .ok_or(AppError::NotFound)
}

/// Read stock under a row lock. `None` when the product no longer exists.
pub async fn lock_stock<C: ConnectionTrait>(conn: &C, product_id: Uuid) -> AppResult<Option<i32>> {
    Ok(Products::find_by_id(product_id)
        .lock(LockType::Update)
        .one(conn)
        .await?
        .map(|p| p.stock))
}

/// Conditional decrement: never takes stock below zero.
pub async fn decrement_stock<C: ConnectionTrait>(
    conn: &C,
    product_id: Uuid,
    quantity: i64,
) -> AppResult<StockChange> {
    let result = Products::update_many()
        .col_expr(ProdCol::Stock, Expr::col(ProdCol::Stock).sub(quantity))
        .filter(ProdCol::Id.eq(product_id))
        .filter(ProdCol::Stock.gte(quantity))
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        return Ok(StockChange::Insufficient);
    }
    Ok(StockChange::Decremented)
}

pub async fn create_product<C: ConnectionTrait>(
    conn: &C,
    seller_id: Uuid,
    name: &str,
    price: i64,
    stock: i32,
) -> AppResult<Product> {
    if price < 0 || stock < 0 {
        return Err(AppError::Validation("price and stock must not be negative".into()));
    }
    let model = ProductActive {
        id: Set(Uuid::new_v4()),
        seller_id: Set(seller_id),
        name: Set(name.to_string()),
        price: Set(price),
        stock: Set(stock),
        created_at: Set(Utc::now().into()),
    }
    .insert(conn)
    .await?;
    Ok(product_from_entity(model))
}

pub fn product_from_entity(model: ProductModel) -> Product {
    Product {
        id: model.id,
        seller_id: model.seller_id,
        name: model.name,
        price: model.price,
        stock: model.stock,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
