mod common;

use axum_payment_reconciler::{
    error::AppError,
    models::{Order, OrderStatus, PaymentMethod},
    services::{
        catalog_service, checkout_service,
        fulfillment::{self, Approval, Settlement},
        order_store,
    },
};
use common::{TestApp, checkout_request, setup};
use uuid::Uuid;

async fn card_order(app: &TestApp, lines: &[(Uuid, i32)]) -> anyhow::Result<Order> {
    let session = Uuid::new_v4().to_string();
    app.fill_cart(&session, lines).await?;
    let order = checkout_service::checkout(&app.state, checkout_request(&session, PaymentMethod::Card))
        .await?
        .data
        .expect("checkout data")
        .order;
    assert_eq!(order.status, OrderStatus::WaitingPayment);
    Ok(order)
}

fn system_approval() -> Approval {
    Approval {
        verified_by: None,
        notes: "confirmed in test".into(),
    }
}

#[tokio::test]
async fn second_fulfillment_is_a_no_op() -> anyhow::Result<()> {
    let app = setup().await?;
    let product = app.product(1500, 10).await?;
    let order = card_order(&app, &[(product.id, 3)]).await?;

    let first = fulfillment::fulfill(&app.state.orm, order.id, system_approval()).await?;
    assert!(matches!(first, Settlement::Paid(_)));
    let second = fulfillment::fulfill(&app.state.orm, order.id, system_approval()).await?;
    assert!(matches!(second, Settlement::AlreadyPaid(_)));

    assert_eq!(catalog_service::get_stock(&app.state.orm, product.id).await?, 7);
    assert_eq!(order_store::verifications_for(&app.state.orm, order.id).await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn last_unit_goes_to_exactly_one_order() -> anyhow::Result<()> {
    let app = setup().await?;
    let product = app.product(1000, 1).await?;
    let first = card_order(&app, &[(product.id, 1)]).await?;
    let second = card_order(&app, &[(product.id, 1)]).await?;

    let (a, b) = tokio::join!(
        fulfillment::fulfill(&app.state.orm, first.id, system_approval()),
        fulfillment::fulfill(&app.state.orm, second.id, system_approval()),
    );

    let results = [a, b];
    let paid = results.iter().filter(|r| matches!(r, Ok(Settlement::Paid(_)))).count();
    let short = results
        .iter()
        .filter(|r| matches!(r, Err(AppError::InsufficientStock { product_id }) if *product_id == product.id))
        .count();
    assert_eq!((paid, short), (1, 1));
    assert_eq!(catalog_service::get_stock(&app.state.orm, product.id).await?, 0);

    let mut statuses = Vec::new();
    for id in [first.id, second.id] {
        statuses.push(order_store::find_order(&app.state.orm, id).await?.status);
    }
    statuses.sort_by_key(|s| s.as_str());
    assert_eq!(statuses, vec![OrderStatus::Failed, OrderStatus::Paid]);
    Ok(())
}

#[tokio::test]
async fn shortfall_on_one_line_fails_the_whole_order() -> anyhow::Result<()> {
    let app = setup().await?;
    let plenty = app.product(1000, 5).await?;
    let scarce = app.product(2000, 1).await?;
    let order = card_order(&app, &[(plenty.id, 2), (scarce.id, 2)]).await?;

    let err = fulfillment::fulfill(&app.state.orm, order.id, system_approval())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InsufficientStock { product_id } if product_id == scarce.id));

    assert_eq!(catalog_service::get_stock(&app.state.orm, plenty.id).await?, 5);
    assert_eq!(catalog_service::get_stock(&app.state.orm, scarce.id).await?, 1);

    let stored = order_store::find_order(&app.state.orm, order.id).await?;
    assert_eq!(stored.status, OrderStatus::Failed);
    assert!(!stored.payment_verified);

    let trail = order_store::verifications_for(&app.state.orm, order.id).await?;
    assert_eq!(trail.len(), 1);
    assert!(!trail[0].is_approved);
    assert_eq!(trail[0].verified_by, None);
    assert!(trail[0].notes.contains(&scarce.id.to_string()));
    assert!(trail[0].notes.contains("confirmed in test"));

    // Terminal now: no further payment can land.
    let err = fulfillment::fulfill(&app.state.orm, order.id, system_approval())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidTransition { from: OrderStatus::Failed, .. }));
    Ok(())
}

#[tokio::test]
async fn pending_orders_cannot_skip_initiation() -> anyhow::Result<()> {
    let app = setup().await?;
    let product = app.product(1000, 5).await?;
    app.psp.set_failing(true);
    let session = "pending-skip";
    app.fill_cart(session, &[(product.id, 1)]).await?;
    let order = checkout_service::checkout(&app.state, checkout_request(session, PaymentMethod::Card))
        .await?
        .data
        .expect("checkout data")
        .order;
    assert_eq!(order.status, OrderStatus::Pending);

    let err = fulfillment::fulfill(&app.state.orm, order.id, system_approval())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::InvalidTransition {
            from: OrderStatus::Pending,
            to: OrderStatus::Paid
        }
    ));
    assert_eq!(catalog_service::get_stock(&app.state.orm, product.id).await?, 5);
    Ok(())
}
