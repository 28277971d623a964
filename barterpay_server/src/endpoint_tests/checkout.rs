use actix_web::{http::StatusCode, test::TestRequest};
use barterpay_engine::{
    bpe_api::correlator::EXTERNAL_TRANSACTION_ID_KEY,
    db_types::{OrderId, OrderStatusType},
    OrderStore,
    PaymentInitiated,
    ProviderError,
};
use serde_json::Value;

use super::{
    helpers::{fetch_status, seed_order, send, test_db},
    mocks::MockPaymentProvider,
};
use crate::errors::{PAYMENT_RESPONSE_MESSAGE, PAYMENT_TRANSPORT_MESSAGE};

#[actix_web::test]
async fn checkout_redirects_to_barterpay() {
    let db = test_db().await;
    seed_order(&db, "1042", 4999).await;
    let mut provider = MockPaymentProvider::new();
    provider
        .expect_initiate_payment()
        .withf(|req| {
            req.currency == "USD" && req.amount.value() == 4999 && req.external_transaction_id.starts_with("txn_")
        })
        .times(1)
        .returning(|_| {
            Ok(PaymentInitiated {
                redirect_url: "https://pay.example.com/p/abc".into(),
                provider_transaction_index: Some("8812".into()),
            })
        });

    let (status, _, body) = send(&db, provider, TestRequest::post().uri("/api/checkout/1042")).await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["result"], "success");
    assert_eq!(body["redirect"], "https://pay.example.com/p/abc");
    let txid = body["external_transaction_id"].as_str().unwrap().to_string();
    let stored = db.fetch_meta(&OrderId::new("1042"), EXTERNAL_TRANSACTION_ID_KEY).await.unwrap();
    assert_eq!(stored, Some(txid));
    assert_eq!(fetch_status(&db, "1042").await, OrderStatusType::OnHold);
}

#[actix_web::test]
async fn transport_failures_leave_the_order_alone() {
    let db = test_db().await;
    seed_order(&db, "1043", 2500).await;
    let mut provider = MockPaymentProvider::new();
    provider.expect_initiate_payment().times(1).returning(|_| Err(ProviderError::Transport("timed out".into())));

    let (status, _, body) = send(&db, provider, TestRequest::post().uri("/api/checkout/1043")).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["error"], PAYMENT_TRANSPORT_MESSAGE);
    assert_eq!(fetch_status(&db, "1043").await, OrderStatusType::Pending);
}

#[actix_web::test]
async fn invalid_provider_responses_are_not_shown_to_the_buyer() {
    let db = test_db().await;
    seed_order(&db, "1044", 2500).await;
    let mut provider = MockPaymentProvider::new();
    provider
        .expect_initiate_payment()
        .returning(|_| Err(ProviderError::InvalidResponse { body: r#"{"error":"internal secret"}"#.into() }));

    let (status, _, body) = send(&db, provider, TestRequest::post().uri("/api/checkout/1044")).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body.contains(PAYMENT_RESPONSE_MESSAGE));
    assert!(!body.contains("internal secret"));
    assert_eq!(fetch_status(&db, "1044").await, OrderStatusType::Pending);
}

#[actix_web::test]
async fn unknown_orders_and_unpayable_orders_are_rejected() {
    let db = test_db().await;
    let mut provider = MockPaymentProvider::new();
    provider.expect_initiate_payment().never();
    let (status, _, _) = send(&db, provider, TestRequest::post().uri("/api/checkout/9999")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    seed_order(&db, "1045", 0).await;
    let mut provider = MockPaymentProvider::new();
    provider.expect_initiate_payment().never();
    let (status, _, _) = send(&db, provider, TestRequest::post().uri("/api/checkout/1045")).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}
