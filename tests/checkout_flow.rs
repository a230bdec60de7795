mod common;

use axum_payment_reconciler::{
    dto::{cart::AddToCartRequest, payouts::RegisterPayoutAccount},
    entity::products::{ActiveModel as ProductActive, Entity as Products},
    error::AppError,
    middleware::auth::{AuthUser, ROLE_SELLER},
    models::{OrderStatus, PaymentMethod},
    services::{
        cart_service, catalog_service, checkout_service, initiation_service, order_store,
        payout_service,
    },
};
use common::{checkout_request, setup};
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use uuid::Uuid;

#[tokio::test]
async fn mobile_money_checkout_quotes_tax_and_builds_codes() -> anyhow::Result<()> {
    let app = setup().await?;
    let product = app.product(2500, 10).await?;
    app.payout_account(PaymentMethod::MtnMomo, "Jean Dupont", "670000001").await?;
    app.fill_cart("s-a", &[(product.id, 2)]).await?;

    let resp = checkout_service::checkout(&app.state, checkout_request("s-a", PaymentMethod::MtnMomo)).await?;
    let data = resp.data.expect("checkout data");
    let order = data.order;

    assert_eq!(order.subtotal, 5000);
    assert_eq!(order.tax, 500);
    assert_eq!(order.total, 5500);
    assert_eq!(order.total, order.subtotal + order.tax);
    assert_eq!(order.status, OrderStatus::WaitingPayment);
    assert_eq!(order.seller_id, app.seller_id);
    assert_eq!(order.cart_items.len(), 1);
    assert_eq!(order.cart_items[0].unit_price, 2500);

    let artifacts = data.artifacts.expect("artifacts");
    let qr = artifacts.qr_payload.expect("qr payload");
    assert!(!qr.is_empty());
    assert!(qr.contains(&order.id.to_string()));
    let ussd = artifacts.ussd_code.expect("ussd code");
    assert!(ussd.contains("5500"));
    assert_eq!(ussd, "*126*9*670000001*5500#");
    assert_eq!(order.ussd_code.as_deref(), Some(ussd.as_str()));

    // Stock is only touched at fulfillment; the cart is consumed.
    assert_eq!(catalog_service::get_stock(&app.state.orm, product.id).await?, 10);
    assert!(cart_service::get_cart(&app.state.orm, "s-a").await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn frozen_quote_survives_price_changes() -> anyhow::Result<()> {
    let app = setup().await?;
    let product = app.product(1000, 10).await?;
    app.payout_account(PaymentMethod::OrangeMoney, "Jean Dupont", "699000001").await?;
    app.fill_cart("s-frozen", &[(product.id, 3)]).await?;

    let order = checkout_service::checkout(&app.state, checkout_request("s-frozen", PaymentMethod::OrangeMoney))
        .await?
        .data
        .expect("checkout data")
        .order;

    let model = Products::find_by_id(product.id).one(&app.state.orm).await?.expect("product");
    let mut active: ProductActive = model.into();
    active.price = Set(9999);
    active.update(&app.state.orm).await?;

    let reread = order_store::find_order(&app.state.orm, order.id).await?;
    assert_eq!(reread.subtotal, 3000);
    assert_eq!(reread.total, 3300);
    assert_eq!(reread.cart_items.0[0].unit_price, 1000);
    assert!(reread.ussd_code.unwrap().starts_with("#150*47*699000001*3300"));
    Ok(())
}

#[tokio::test]
async fn chat_initiation_is_idempotent() -> anyhow::Result<()> {
    let app = setup().await?;
    let product = app.product(4000, 5).await?;
    app.payout_account(PaymentMethod::Chat, "Jean Dupont", "+237 670 000 001").await?;
    app.fill_cart("s-chat", &[(product.id, 1)]).await?;

    let data = checkout_service::checkout(&app.state, checkout_request("s-chat", PaymentMethod::Chat))
        .await?
        .data
        .expect("checkout data");
    let link = data.artifacts.and_then(|a| a.chat_link).expect("chat link");
    assert!(link.starts_with("https://wa.me/237670000001?text="));

    let again = initiation_service::initiate_order(&app.state, data.order.id)
        .await?
        .data
        .expect("initiation data");
    assert_eq!(again.status, OrderStatus::WaitingPayment);
    assert_eq!(again.artifacts.chat_link.as_deref(), Some(link.as_str()));
    Ok(())
}

#[tokio::test]
async fn invalid_carts_and_customers_are_rejected() -> anyhow::Result<()> {
    let app = setup().await?;

    let err = checkout_service::checkout(&app.state, checkout_request("empty", PaymentMethod::Card))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let product = app.product(1000, 5).await?;
    app.fill_cart("s-missing", &[(product.id, 1)]).await?;
    let mut request = checkout_request("s-missing", PaymentMethod::Card);
    request.customer_name = "  ".into();
    let err = checkout_service::checkout(&app.state, request).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    // Mixed sellers.
    let other = catalog_service::create_product(&app.state.orm, Uuid::new_v4(), "Other", 700, 5).await?;
    app.fill_cart("s-mixed", &[(product.id, 1), (other.id, 1)]).await?;
    let err = checkout_service::checkout(&app.state, checkout_request("s-mixed", PaymentMethod::Card))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let err = cart_service::add_item(
        &app.state.orm,
        "s-zero",
        AddToCartRequest {
            product_id: product.id,
            quantity: 0,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    Ok(())
}

#[tokio::test]
async fn missing_payout_account_leaves_order_pending() -> anyhow::Result<()> {
    let app = setup().await?;
    let product = app.product(1000, 5).await?;
    app.fill_cart("s-nopayee", &[(product.id, 1)]).await?;

    let resp = checkout_service::checkout(&app.state, checkout_request("s-nopayee", PaymentMethod::MtnMomo)).await?;
    let data = resp.data.expect("checkout data");
    assert_eq!(data.order.status, OrderStatus::Pending);
    assert!(data.artifacts.is_none());
    assert!(data.order.ussd_code.is_none());

    app.payout_account(PaymentMethod::MtnMomo, "Jean Dupont", "670000001").await?;
    let retried = initiation_service::initiate_order(&app.state, data.order.id)
        .await?
        .data
        .expect("initiation data");
    assert_eq!(retried.status, OrderStatus::WaitingPayment);
    assert_eq!(retried.artifacts.ussd_code.as_deref(), Some("*126*9*670000001*1100#"));
    Ok(())
}

#[tokio::test]
async fn payout_registration_rules() -> anyhow::Result<()> {
    let app = setup().await?;
    let request = |channel, holder_name: &str, holder_number: &str| RegisterPayoutAccount {
        seller_id: app.seller_id,
        channel,
        holder_name: holder_name.into(),
        holder_number: holder_number.into(),
    };

    for bad in [
        request(PaymentMethod::Card, "Jean Dupont", "670000001"),
        request(PaymentMethod::MtnMomo, "   ", "670000001"),
        request(PaymentMethod::MtnMomo, "Jean Dupont", "n/a"),
    ] {
        let err = payout_service::register(&app.state, &app.seller(), bad)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    let stranger = AuthUser {
        user_id: Uuid::new_v4(),
        role: ROLE_SELLER.into(),
    };
    let err = payout_service::register(
        &app.state,
        &stranger,
        request(PaymentMethod::MtnMomo, "Jean Dupont", "670000001"),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    payout_service::register(
        &app.state,
        &app.seller(),
        request(PaymentMethod::OrangeMoney, " Marie Ngono ", "699112233"),
    )
    .await?;
    payout_service::register(
        &app.state,
        &app.admin(),
        request(PaymentMethod::OrangeMoney, "Marie Ngono", "699112234"),
    )
    .await?;
    let accounts = payout_service::list_active_payout_accounts(
        &app.state.orm,
        app.seller_id,
        PaymentMethod::OrangeMoney,
    )
    .await?;
    assert_eq!(accounts.len(), 2);
    assert_eq!(accounts[0].holder_name, "Marie Ngono");
    assert!(
        payout_service::list_active_payout_accounts(&app.state.orm, app.seller_id, PaymentMethod::MtnMomo)
            .await?
            .is_empty()
    );
    Ok(())
}
