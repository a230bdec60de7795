mod common;

use std::sync::atomic::Ordering;

use axum_payment_reconciler::{
    error::AppError,
    models::{ChannelMetadata, Order, OrderStatus, PaymentMethod},
    services::{catalog_service, checkout_service, initiation_service, order_store, webhook_service},
    webhook::sign_payload,
};
use chrono::Utc;
use common::{TestApp, WEBHOOK_SECRET, checkout_request, setup};
use uuid::Uuid;

async fn card_order(app: &TestApp, product_id: Uuid, quantity: i32) -> anyhow::Result<Order> {
    let session = Uuid::new_v4().to_string();
    app.fill_cart(&session, &[(product_id, quantity)]).await?;
    Ok(checkout_service::checkout(&app.state, checkout_request(&session, PaymentMethod::Card))
        .await?
        .data
        .expect("checkout data")
        .order)
}

fn succeeded_event(event_id: &str, intent: &str, order_id: Option<Uuid>) -> Vec<u8> {
    let metadata = match order_id {
        Some(id) => serde_json::json!({ "order_id": id.to_string() }),
        None => serde_json::json!({}),
    };
    serde_json::to_vec(&serde_json::json!({
        "id": event_id,
        "type": "payment_intent.succeeded",
        "data": { "object": { "id": intent, "amount": 5500, "metadata": metadata } }
    }))
    .expect("event json")
}

fn sign(body: &[u8]) -> String {
    sign_payload(WEBHOOK_SECRET, Utc::now().timestamp(), body).expect("signature")
}

#[tokio::test]
async fn card_checkout_creates_intent_with_order_metadata() -> anyhow::Result<()> {
    let app = setup().await?;
    let product = app.product(5000, 3).await?;
    let order = card_order(&app, product.id, 1).await?;

    assert_eq!(order.status, OrderStatus::WaitingPayment);
    let intent = order.psp_intent_ref.clone().expect("intent ref");
    assert_eq!(intent, format!("pi_{}", order.id.simple()));
    match order.metadata.channel {
        Some(ChannelMetadata::Card {
            payment_intent_id,
            client_secret,
        }) => {
            assert_eq!(payment_intent_id, intent);
            assert!(client_secret.is_some());
        }
        other => panic!("unexpected channel metadata {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn signed_success_event_pays_once_even_when_replayed() -> anyhow::Result<()> {
    let app = setup().await?;
    let product = app.product(5000, 3).await?;
    let order = card_order(&app, product.id, 1).await?;
    let intent = order.psp_intent_ref.clone().expect("intent ref");

    let body = succeeded_event("evt_1", &intent, Some(order.id));
    let signature = sign(&body);

    let first = webhook_service::handle_psp_event(&app.state, Some(&signature), &body)
        .await?
        .data
        .expect("ack");
    assert!(first.applied);
    assert_eq!(first.order_id, Some(order.id));

    let replay = webhook_service::handle_psp_event(&app.state, Some(&signature), &body)
        .await?
        .data
        .expect("ack");
    assert!(!replay.applied);

    let stored = order_store::find_order(&app.state.orm, order.id).await?;
    assert_eq!(stored.status, OrderStatus::Paid);
    assert!(stored.payment_verified);
    assert_eq!(catalog_service::get_stock(&app.state.orm, product.id).await?, 2);

    let trail = order_store::verifications_for(&app.state.orm, order.id).await?;
    assert_eq!(trail.len(), 1);
    assert!(trail[0].is_approved);
    assert!(trail[0].notes.contains("evt_1"));
    Ok(())
}

#[tokio::test]
async fn bad_signatures_change_nothing() -> anyhow::Result<()> {
    let app = setup().await?;
    let product = app.product(5000, 3).await?;
    let order = card_order(&app, product.id, 1).await?;
    let intent = order.psp_intent_ref.clone().expect("intent ref");
    let body = succeeded_event("evt_forged", &intent, Some(order.id));

    let forged = sign_payload("not-the-secret", Utc::now().timestamp(), &body)?;
    let stale = sign_payload(WEBHOOK_SECRET, Utc::now().timestamp() - 3_600, &body)?;
    for header in [Some(forged.as_str()), Some(stale.as_str()), Some("t=1,v1=zz"), None] {
        let err = webhook_service::handle_psp_event(&app.state, header, &body)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidWebhookSignature));
    }

    let stored = order_store::find_order(&app.state.orm, order.id).await?;
    assert_eq!(stored.status, OrderStatus::WaitingPayment);
    assert_eq!(catalog_service::get_stock(&app.state.orm, product.id).await?, 3);
    Ok(())
}

#[tokio::test]
async fn events_resolve_by_intent_and_reject_mismatches() -> anyhow::Result<()> {
    let app = setup().await?;
    let product = app.product(5000, 3).await?;
    let order = card_order(&app, product.id, 1).await?;
    let intent = order.psp_intent_ref.clone().expect("intent ref");

    let mismatched = succeeded_event("evt_2", "pi_someone_else", Some(order.id));
    let err = webhook_service::handle_psp_event(&app.state, Some(&sign(&mismatched)), &mismatched)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let ignored = serde_json::to_vec(&serde_json::json!({
        "id": "evt_3",
        "type": "payment_intent.payment_failed",
        "data": { "object": { "id": intent, "metadata": { "order_id": order.id.to_string() } } }
    }))?;
    let ack = webhook_service::handle_psp_event(&app.state, Some(&sign(&ignored)), &ignored)
        .await?
        .data
        .expect("ack");
    assert!(!ack.applied);
    assert_eq!(
        order_store::find_order(&app.state.orm, order.id).await?.status,
        OrderStatus::WaitingPayment
    );

    let by_intent = succeeded_event("evt_4", &intent, None);
    let ack = webhook_service::handle_psp_event(&app.state, Some(&sign(&by_intent)), &by_intent)
        .await?
        .data
        .expect("ack");
    assert!(ack.applied);
    assert_eq!(ack.order_id, Some(order.id));
    Ok(())
}

#[tokio::test]
async fn psp_outage_keeps_order_pending_until_retry() -> anyhow::Result<()> {
    let app = setup().await?;
    let product = app.product(5000, 3).await?;
    app.psp.set_failing(true);

    let order = card_order(&app, product.id, 1).await?;
    assert_eq!(order.status, OrderStatus::Pending);
    assert!(order.psp_intent_ref.is_none());

    let err = initiation_service::initiate_order(&app.state, order.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ChannelInitiation(_)));
    assert_eq!(
        order_store::find_order(&app.state.orm, order.id).await?.status,
        OrderStatus::Pending
    );

    app.psp.set_failing(false);
    let resp = initiation_service::initiate_order(&app.state, order.id)
        .await?
        .data
        .expect("initiation data");
    assert_eq!(resp.status, OrderStatus::WaitingPayment);
    assert!(resp.artifacts.client_secret.is_some());
    assert_eq!(app.psp.calls.load(Ordering::SeqCst), 3);

    // Card initiation is not repeated once the intent exists.
    let err = initiation_service::initiate_order(&app.state, order.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidTransition { .. }));
    Ok(())
}
