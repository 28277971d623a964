use actix_web::{http::StatusCode, test::TestRequest};
use barterpay_engine::{db_types::OrderStatusType, OrderStore};
use serde_json::json;

use super::{
    helpers::{fetch_status, seed_order, seed_pending_payment, send, test_db, STORE_URL},
    mocks::MockPaymentProvider,
};

fn webhook(txid: &str, status: &str) -> TestRequest {
    TestRequest::post().uri("/barterpay/webhook").set_json(json!({"data": {
        "ExternalTransactionId": txid,
        "TransactionIndex": "8812",
        "TransactionStatus": status,
        "TransactionAmount": 49.99
    }}))
}

fn settlement_notes(notes: &[barterpay_engine::db_types::OrderNote]) -> usize {
    notes.iter().filter(|n| n.note.starts_with("Payment completed via BarterPay")).count()
}

#[actix_web::test]
async fn webhook_settles_the_order_once() {
    let db = test_db().await;
    let order = seed_pending_payment(&db, "2001", "txn_webhook_1").await;

    let (status, _, body) = send(&db, MockPaymentProvider::new(), webhook("txn_webhook_1", "success")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");
    assert_eq!(fetch_status(&db, "2001").await, OrderStatusType::Processing);

    // BarterPay retries, and the buyer's return arrives on top
    let (status, _, body) = send(&db, MockPaymentProvider::new(), webhook("txn_webhook_1", "success")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");
    let req = TestRequest::get().uri(
        "/barterpay/return?externalTransactionId=txn_webhook_1&transactionId=8812&transactionStatus=success\
         &transactionAmount=49.99",
    );
    let (status, location, _) = send(&db, MockPaymentProvider::new(), req).await;
    assert_eq!(status, StatusCode::FOUND);
    assert_eq!(location.as_deref(), Some(&*format!("{STORE_URL}/checkout/order-received/2001/?key=wc_order_2001")));
    let notes = db.fetch_notes(&order.order_id).await.unwrap();
    assert_eq!(settlement_notes(&notes), 1);
    let settled = db.fetch_order(&order.order_id).await.unwrap().unwrap();
    assert_eq!(settled.payment_reference.as_deref(), Some("8812"));
}

#[actix_web::test]
async fn webhook_declines() {
    let db = test_db().await;
    seed_pending_payment(&db, "2002", "txn_webhook_2").await;
    let (status, _, _) = send(&db, MockPaymentProvider::new(), webhook("txn_webhook_2", "Cancelled")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetch_status(&db, "2002").await, OrderStatusType::Failed);
}

#[actix_web::test]
async fn webhook_input_errors() {
    let db = test_db().await;
    let req = TestRequest::post()
        .uri("/barterpay/webhook")
        .set_json(json!({"data": {"TransactionStatus": "success"}}));
    let (status, _, _) = send(&db, MockPaymentProvider::new(), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let req = TestRequest::post().uri("/barterpay/webhook").set_payload("this is not json");
    let (status, _, _) = send(&db, MockPaymentProvider::new(), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn unknown_transactions_are_acknowledged() {
    let db = test_db().await;
    let order = seed_order(&db, "2003", 1000).await;
    let (status, _, body) = send(&db, MockPaymentProvider::new(), webhook("txn_nobody", "success")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");
    assert_eq!(fetch_status(&db, "2003").await, OrderStatusType::Pending);
    assert!(db.fetch_notes(&order.order_id).await.unwrap().is_empty());
}

#[actix_web::test]
async fn return_settles_and_redirects() {
    let db = test_db().await;
    seed_pending_payment(&db, "2004", "txn_return_1").await;
    let uri = "/barterpay/return?externalTransactionId=txn_return_1&transactionId=77&transactionStatus=success&\
               transactionAmount=49.99";
    let (status, location, _) = send(&db, MockPaymentProvider::new(), TestRequest::get().uri(uri)).await;
    assert_eq!(status, StatusCode::FOUND);
    assert_eq!(location.as_deref(), Some(&*format!("{STORE_URL}/checkout/order-received/2004/?key=wc_order_2004")));
    assert_eq!(fetch_status(&db, "2004").await, OrderStatusType::Processing);

    // The buyer refreshes the page after the webhook has already settled the order
    let (status, location, _) = send(&db, MockPaymentProvider::new(), TestRequest::get().uri(uri)).await;
    assert_eq!(status, StatusCode::FOUND);
    assert!(location.unwrap().contains("/order-received/2004/"));
}

#[actix_web::test]
async fn return_error_pages() {
    let db = test_db().await;
    let req = TestRequest::get().uri("/barterpay/return?externalTransactionId=txn_nobody&transactionStatus=success");
    let (status, location, body) = send(&db, MockPaymentProvider::new(), req).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(location.is_none());
    assert!(body.contains("<html>"));

    let req = TestRequest::get().uri("/barterpay/return?transactionStatus=success");
    let (status, _, body) = send(&db, MockPaymentProvider::new(), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("<html>"));
}

#[actix_web::test]
async fn legacy_callback_accepts_every_format() {
    let db = test_db().await;
    seed_pending_payment(&db, "2005", "txn_legacy_get").await;
    seed_pending_payment(&db, "2006", "txn_legacy_form").await;
    seed_pending_payment(&db, "2007", "txn_legacy_json").await;

    let req = TestRequest::get()
        .uri("/barterpay/callback?ExternalTransactionId=txn_legacy_get&TransactionStatus=success&TransactionIndex=5");
    let (status, _, _) = send(&db, MockPaymentProvider::new(), req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetch_status(&db, "2005").await, OrderStatusType::Processing);

    let req = TestRequest::post()
        .uri("/barterpay/callback")
        .insert_header(("Content-Type", "application/x-www-form-urlencoded"))
        .set_payload("externalTransactionId=txn_legacy_form&transactionStatus=expired");
    let (status, _, _) = send(&db, MockPaymentProvider::new(), req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetch_status(&db, "2006").await, OrderStatusType::Failed);

    let req = TestRequest::post()
        .uri("/barterpay/callback")
        .set_json(json!({"ExternalTransactionId": "txn_legacy_json", "TransactionStatus": "SUCCESS"}));
    let (status, _, _) = send(&db, MockPaymentProvider::new(), req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetch_status(&db, "2007").await, OrderStatusType::Processing);

    let req = TestRequest::post().uri("/barterpay/callback").set_payload("");
    let (status, _, _) = send(&db, MockPaymentProvider::new(), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn status_polling() {
    let db = test_db().await;
    seed_pending_payment(&db, "2008", "txn_poll").await;

    let (status, _, body) =
        send(&db, MockPaymentProvider::new(), TestRequest::get().uri("/barterpay/status?order_id=2008")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"status":"pending"}"#);

    send(&db, MockPaymentProvider::new(), webhook("txn_poll", "success")).await;
    let req = TestRequest::post().uri("/barterpay/status").set_json(json!({"order_id": "2008"}));
    let (status, _, body) = send(&db, MockPaymentProvider::new(), req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"status":"paid"}"#);

    let (status, _, body) =
        send(&db, MockPaymentProvider::new(), TestRequest::get().uri("/barterpay/status?order_id=404")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("error"));

    let (status, _, _) = send(&db, MockPaymentProvider::new(), TestRequest::post().uri("/barterpay/status")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
