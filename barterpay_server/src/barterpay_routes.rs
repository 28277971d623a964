//! BarterPay notification channels.
//!
//! BarterPay tells us about the outcome of a payment in up to three ways, often more than once, and in no particular
//! order. Every channel normalises what it receives and hands it to the same [`ReconciliationApi`], which makes sure an
//! order is settled exactly once. The channels differ only in how they answer:
//! * the webhook and the legacy callback answer BarterPay's servers with a short plain-text body,
//! * the browser return sends the buyer on to the storefront's thank-you page.
use std::collections::HashMap;

use actix_web::{
    http::{header, header::ContentType, StatusCode},
    web,
    HttpRequest,
    HttpResponse,
};
use barterpay_engine::{OrderStore, ReconciliationApi, ReconciliationError, ReconciliationOutcome};
use log::*;

use crate::{
    config::{GatewayConfig, ServerOptions},
    helpers::get_remote_ip,
    ingress::{json_object, notification_from_json, notification_from_params},
    route,
};

// ----------------------------------------------   Webhook  ----------------------------------------------------
route!(barterpay_webhook => Post "/webhook" impl OrderStore);
/// BarterPay's server-to-server notification.
///
/// Answers `200 OK` for anything that was handled, including notifications for unknown or already settled orders, so
/// that BarterPay stops retrying. Malformed notifications get a `400`, and a `500` asks BarterPay to try again later.
pub async fn barterpay_webhook<B: OrderStore>(
    req: HttpRequest,
    body: web::Bytes,
    options: web::Data<ServerOptions>,
    api: web::Data<ReconciliationApi<B>>,
) -> HttpResponse {
    log_peer(&req, &options, "webhook");
    let body = json_object(body.as_ref()).unwrap_or_default();
    let notification = notification_from_json(&body);
    acknowledge(api.apply_notification(notification).await)
}

// ----------------------------------------------   Return  ----------------------------------------------------
route!(barterpay_return => Get "/return" impl OrderStore);
/// Where BarterPay sends the buyer once they are done on the payment page.
///
/// The query string doubles as a payment notification, so it is applied first. The buyer is then redirected to the
/// thank-you page of the order the transaction belongs to, whether or not this request changed anything.
pub async fn barterpay_return<B: OrderStore>(
    query: web::Query<HashMap<String, String>>,
    gateway: web::Data<GatewayConfig>,
    api: web::Data<ReconciliationApi<B>>,
) -> HttpResponse {
    let notification = notification_from_params(&query);
    let txid = notification.external_transaction_id.clone();
    debug!("📨️ Buyer returned from BarterPay. Transaction id: '{txid}', status: {}", notification.status);
    let outcome = match api.apply_notification(notification).await {
        Ok(outcome) => outcome,
        Err(ReconciliationError::MissingCorrelationId) => {
            return error_page(
                StatusCode::BAD_REQUEST,
                "Invalid payment response",
                "The payment response did not include a transaction reference.",
            );
        },
        Err(e) => {
            error!("📨️ Could not process the return for transaction {txid}. {e}");
            return processing_error_page();
        },
    };
    let order = match outcome {
        ReconciliationOutcome::Unresolved => match api.find_order_for_transaction(&txid).await {
            Ok(order) => order,
            Err(e) => {
                error!("📨️ Could not look up the order for transaction {txid}. {e}");
                return processing_error_page();
            },
        },
        outcome => outcome.order().cloned(),
    };
    match order {
        Some(order) => {
            let location = gateway.redirect_for(&order);
            debug!("📨️ Sending buyer for order {} to {location}", order.order_id);
            HttpResponse::Found().insert_header((header::LOCATION, location)).finish()
        },
        None => {
            info!("📨️ Buyer returned with transaction {txid}, which does not belong to any order");
            error_page(
                StatusCode::NOT_FOUND,
                "Order not found",
                "We could not find the order for this payment. Please contact the store.",
            )
        },
    }
}

// ----------------------------------------------   Legacy callback  ----------------------------------------------
route!(barterpay_callback => Get "/callback" impl OrderStore);
/// The notification URL used by older BarterPay integrations. Behaves like the webhook, but also accepts the
/// notification as query or form parameters.
pub async fn barterpay_callback<B: OrderStore>(
    req: HttpRequest,
    query: web::Query<HashMap<String, String>>,
    options: web::Data<ServerOptions>,
    api: web::Data<ReconciliationApi<B>>,
) -> HttpResponse {
    log_peer(&req, &options, "callback");
    let notification = notification_from_params(&query);
    acknowledge(api.apply_notification(notification).await)
}

route!(barterpay_callback_post => Post "/callback" impl OrderStore);
pub async fn barterpay_callback_post<B: OrderStore>(
    req: HttpRequest,
    query: web::Query<HashMap<String, String>>,
    body: web::Bytes,
    options: web::Data<ServerOptions>,
    api: web::Data<ReconciliationApi<B>>,
) -> HttpResponse {
    log_peer(&req, &options, "callback");
    let notification = match json_object(body.as_ref()) {
        Some(json) => notification_from_json(&json),
        None => {
            let mut params = query.into_inner();
            params.extend(url::form_urlencoded::parse(body.as_ref()).into_owned());
            notification_from_params(&params)
        },
    };
    acknowledge(api.apply_notification(notification).await)
}

// ----------------------------------------------   Helpers  ----------------------------------------------------

fn acknowledge(result: Result<ReconciliationOutcome, ReconciliationError>) -> HttpResponse {
    match result {
        Ok(outcome) => {
            trace!("📨️ Notification handled: {}", describe(&outcome));
            HttpResponse::Ok().content_type(ContentType::plaintext()).body("OK")
        },
        Err(ReconciliationError::MissingCorrelationId) => {
            HttpResponse::BadRequest().content_type(ContentType::plaintext()).body("Missing transaction id")
        },
        Err(e) => {
            error!("📨️ Could not process BarterPay notification. {e}");
            HttpResponse::InternalServerError().content_type(ContentType::plaintext()).body("Internal error")
        },
    }
}

fn describe(outcome: &ReconciliationOutcome) -> String {
    match outcome {
        ReconciliationOutcome::Settled(o) => format!("order {} settled", o.order_id),
        ReconciliationOutcome::Declined { order, status } => format!("order {} declined ({status})", order.order_id),
        ReconciliationOutcome::AlreadyProcessed(o) => format!("order {} was already {}", o.order_id, o.status),
        ReconciliationOutcome::Ignored(o) => format!("order {} left as {}", o.order_id, o.status),
        ReconciliationOutcome::Unresolved => "no matching order".to_string(),
    }
}

fn log_peer(req: &HttpRequest, options: &ServerOptions, channel: &str) {
    match get_remote_ip(req, options.use_x_forwarded_for, options.use_forwarded) {
        Some(ip) => info!("📨️ BarterPay {channel} from {ip}"),
        None => info!("📨️ BarterPay {channel} from an unknown address"),
    }
}

/// A minimal, self-contained HTML page for buyers who land here by mistake.
fn error_page(status: StatusCode, title: &str, message: &str) -> HttpResponse {
    let body = format!(
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>{title}</title></head>\n<body><h1>{title}</h1>\
         <p>{message}</p></body></html>\n"
    );
    HttpResponse::build(status).content_type(ContentType::html()).body(body)
}

fn processing_error_page() -> HttpResponse {
    error_page(
        StatusCode::INTERNAL_SERVER_ERROR,
        "Payment processing error",
        "We could not process your payment response. Please contact the store.",
    )
}
