//! Storefront-facing routes, mounted under `/api`.
//!
//! The storefront pushes its orders here, asks whether BarterPay should be offered for a cart, and starts the checkout
//! once the buyer has chosen BarterPay.
use actix_web::{post, web, HttpResponse};
use barterpay_engine::{
    db_types::{NewOrder, OrderId},
    CartContext,
    CheckoutApi,
    GatewayAvailability,
    OrderStore,
    PaymentProvider,
};
use log::*;

use crate::{
    data_objects::{AvailabilityResponse, CheckoutResponse},
    errors::ServerError,
    route,
};

// ----------------------------------------------   Orders  ----------------------------------------------------
route!(sync_order => Post "/orders" impl OrderStore);
/// Copies an order from the storefront into the gateway's order store. Repeated calls for the same order id leave the
/// stored order untouched.
///
/// Responds with `201 Created` and the new order, or `200 OK` and the existing order.
pub async fn sync_order<B: OrderStore>(body: web::Bytes, db: web::Data<B>) -> Result<HttpResponse, ServerError> {
    let order = serde_json::from_slice::<NewOrder>(body.as_ref()).map_err(|e| {
        debug!("💻️ Could not parse order sync request. {e}");
        ServerError::InvalidRequestBody(e.to_string())
    })?;
    if order.order_id.as_str().trim().is_empty() {
        return Err(ServerError::InvalidRequestBody("The order id cannot be empty.".into()));
    }
    trace!("💻️ Order sync request for {order}");
    let (order, inserted) = db.insert_order(order).await?;
    if inserted {
        info!("💻️ Order {} has been added ({} {})", order.order_id, order.total_price, order.currency);
        Ok(HttpResponse::Created().json(order))
    } else {
        Ok(HttpResponse::Ok().json(order))
    }
}

// ----------------------------------------------   Checkout  ----------------------------------------------------
route!(checkout => Post "/checkout/{order_id}" impl OrderStore, PaymentProvider);
/// Starts a BarterPay payment for the order and tells the storefront where to send the buyer.
///
/// On success, the response is `{"result": "success", "redirect": "<payment page>", "external_transaction_id": "..."}`.
/// If BarterPay cannot be reached or gives an unusable answer, the response is a `502` with a message that is safe to
/// show to the buyer. The order is left as it was, so the buyer can simply try again.
pub async fn checkout<B: OrderStore, P: PaymentProvider>(
    path: web::Path<String>,
    api: web::Data<CheckoutApi<B, P>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = OrderId::new(path.into_inner().trim());
    if order_id.as_str().is_empty() {
        return Err(ServerError::InvalidRequestPath("The order id cannot be empty.".into()));
    }
    debug!("💻️ Checkout requested for order {order_id}");
    let redirect = api.initiate_payment(&order_id).await.map_err(|e| {
        warn!("💻️ Checkout for order {order_id} failed. {e}");
        ServerError::from(e)
    })?;
    Ok(HttpResponse::Ok().json(CheckoutResponse::from(redirect)))
}

// ----------------------------------------------   Availability  ----------------------------------------------
/// Whether BarterPay should be offered for the cart described in the body. Responds with `{"available": bool}`.
#[post("/availability")]
pub async fn availability(
    body: web::Json<CartContext>,
    gateway: web::Data<GatewayAvailability>,
) -> Result<HttpResponse, ServerError> {
    let available = gateway.is_available(&body);
    trace!("💻️ Availability for {:?}: {available}", body.0);
    Ok(HttpResponse::Ok().json(AvailabilityResponse { available }))
}
