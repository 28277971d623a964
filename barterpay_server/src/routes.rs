//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! * [`crate::barterpay_routes`] holds the BarterPay notification channels (webhook, browser return and the legacy
//!   callback).
//! * [`crate::api_routes`] holds the storefront-facing routes (order sync, checkout and availability).
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Any I/O, and in particular every database call, must be awaited
//! rather than blocked on.
use std::collections::HashMap;

use actix_web::{get, web, HttpResponse, Responder};
use barterpay_engine::{db_types::OrderId, OrderStore, StatusApi};
use log::*;

use crate::{data_objects::StatusResponse, errors::ServerError, ingress::order_id_from_request};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

// ----------------------------------------------   Status  ----------------------------------------------------
route!(order_status => Get "/status" impl OrderStore);
/// Polled by the storefront's thank-you page while it waits for BarterPay to confirm a payment.
///
/// The order id can be supplied as the `order_id` query parameter. The POST flavour also accepts it in a JSON or
/// form-encoded body. The response is `{"status": "paid" | "failed" | "pending"}`.
pub async fn order_status<B: OrderStore>(
    query: web::Query<HashMap<String, String>>,
    api: web::Data<StatusApi<B>>,
) -> Result<HttpResponse, ServerError> {
    poll_status(order_id_from_request(&query, &[]), api.as_ref()).await
}

route!(order_status_post => Post "/status" impl OrderStore);
pub async fn order_status_post<B: OrderStore>(
    query: web::Query<HashMap<String, String>>,
    body: web::Bytes,
    api: web::Data<StatusApi<B>>,
) -> Result<HttpResponse, ServerError> {
    poll_status(order_id_from_request(&query, body.as_ref()), api.as_ref()).await
}

async fn poll_status<B: OrderStore>(order_id: Option<String>, api: &StatusApi<B>) -> Result<HttpResponse, ServerError> {
    let order_id = order_id.map(OrderId::new).ok_or_else(|| {
        debug!("💻️ Status poll without an order id");
        ServerError::InvalidRequestBody("An order_id is required.".into())
    })?;
    trace!("💻️ Status poll for order {order_id}");
    let status = api
        .poll_status(&order_id)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound(format!("Order {order_id} does not exist.")))?;
    Ok(HttpResponse::Ok().json(StatusResponse { status }))
}
