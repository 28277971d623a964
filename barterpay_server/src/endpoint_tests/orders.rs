use actix_web::{http::StatusCode, test::TestRequest};
use barterpay_engine::{
    db_types::{OrderId, OrderStatusType},
    OrderStore,
};
use serde_json::{json, Value};

use super::{
    helpers::{send, test_db},
    mocks::MockPaymentProvider,
};

#[actix_web::test]
async fn order_sync_is_idempotent() {
    let db = test_db().await;
    let order = json!({
        "order_id": "3001",
        "order_key": "wc_order_k3001",
        "customer_id": "bob",
        "total_price": "49.99",
        "currency": "USD"
    });
    let req = TestRequest::post().uri("/api/orders").set_json(&order);
    let (status, _, body) = send(&db, MockPaymentProvider::new(), req).await;
    assert_eq!(status, StatusCode::CREATED);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["order_id"], "3001");
    assert_eq!(body["status"], "pending");

    let mut changed = order.clone();
    changed["total_price"] = json!(10);
    let req = TestRequest::post().uri("/api/orders").set_json(&changed);
    let (status, _, _) = send(&db, MockPaymentProvider::new(), req).await;
    assert_eq!(status, StatusCode::OK);

    let stored = db.fetch_order(&OrderId::new("3001")).await.unwrap().unwrap();
    assert_eq!(stored.total_price.value(), 4999);
    assert_eq!(stored.status, OrderStatusType::Pending);
}

#[actix_web::test]
async fn order_sync_rejects_bad_input() {
    let db = test_db().await;
    let req = TestRequest::post().uri("/api/orders").set_payload("{ not json");
    let (status, _, body) = send(&db, MockPaymentProvider::new(), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("error"));

    let req = TestRequest::post()
        .uri("/api/orders")
        .set_json(json!({"order_id": " ", "total_price": 1, "currency": "USD"}));
    let (status, _, _) = send(&db, MockPaymentProvider::new(), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn availability_for_virtual_and_shipped_carts() {
    let db = test_db().await;
    let req = TestRequest::post().uri("/api/availability").set_json(json!({"needs_shipping": false}));
    let (status, _, body) = send(&db, MockPaymentProvider::new(), req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"available":true}"#);

    let req = TestRequest::post()
        .uri("/api/availability")
        .set_json(json!({"needs_shipping": true, "chosen_rate_ids": ["flat_rate:3"]}));
    let (status, _, body) = send(&db, MockPaymentProvider::new(), req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"available":true}"#);
}
