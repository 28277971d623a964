//! HMAC middleware for Actix Web.
//!
//! Checks that the body of an incoming request was signed with a shared secret. The signature is the base64-encoded
//! HMAC-SHA256 of the raw request body, and is expected in a configurable header:
//! * [`BARTERPAY_HMAC_HEADER`] on the BarterPay notification routes,
//! * [`PLATFORM_HMAC_HEADER`] on the storefront-facing `/api` routes.
//!
//! BarterPay does not sign its notifications at the moment, so the check is only switched on when a secret has been
//! configured. Without a secret, the middleware passes every request through untouched.

use std::{
    future::{ready, Ready},
    rc::Rc,
};

use actix_http::h1;
use actix_web::{
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    error::{ErrorBadRequest, ErrorForbidden},
    web,
    Error,
};
use bpg_common::Secret;
use futures::future::LocalBoxFuture;
use log::{trace, warn};

use crate::helpers::calculate_hmac;

pub const BARTERPAY_HMAC_HEADER: &str = "X-BarterPay-Hmac-SHA256";
pub const PLATFORM_HMAC_HEADER: &str = "X-BPG-Hmac-SHA256";

pub struct HmacMiddlewareFactory {
    hmac_header: String,
    // If None, then the middleware will not check the HMAC signature and always allow the call
    key: Option<Secret<String>>,
}

impl HmacMiddlewareFactory {
    pub fn new(hmac_header: &str, key: Option<Secret<String>>) -> Self {
        HmacMiddlewareFactory { hmac_header: hmac_header.into(), key }
    }
}

impl<S, B> Transform<S, ServiceRequest> for HmacMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = HmacMiddlewareService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(HmacMiddlewareService {
            hmac_header: self.hmac_header.clone(),
            key: self.key.clone(),
            service: Rc::new(service),
        }))
    }
}

pub struct HmacMiddlewareService<S> {
    hmac_header: String,
    key: Option<Secret<String>>,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for HmacMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;
    type Response = ServiceResponse<B>;

    forward_ready!(service);

    fn call(&self, mut req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let secret = self.key.as_ref().map(|k| k.reveal().clone());
        let hmac_header = self.hmac_header.clone();
        Box::pin(async move {
            let Some(secret) = secret else {
                trace!("🔐️ HMAC checks are disabled. Allowing request.");
                return service.call(req).await;
            };
            trace!("🔐️ Checking HMAC for request to {}", req.path());
            let data = req.extract::<web::Bytes>().await.map_err(|e| {
                warn!("🔐️ Failed to extract request data: {:?}", e);
                ErrorBadRequest("Failed to extract request data.")
            })?;
            let hmac_calc = calculate_hmac(&secret, data.as_ref());
            let hmac = req.headers().get(&hmac_header).ok_or_else(|| {
                warn!("🔐️ No HMAC signature found in request to {}. Denying access.", req.path());
                ErrorForbidden("No HMAC signature found.")
            })?;
            let validated = !hmac_calc.is_empty() && hmac == hmac_calc.as_str();
            if validated {
                trace!("🔐️ HMAC check for request ✅️");
                req.set_payload(bytes_to_payload(data));
                service.call(req).await
            } else {
                warn!("🔐️ Invalid HMAC signature found in request to {}. Denying access.", req.path());
                Err(ErrorForbidden("Invalid HMAC signature."))
            }
        })
    }
}

fn bytes_to_payload(buf: web::Bytes) -> Payload {
    let (_, mut pl) = h1::Payload::create(true);
    pl.unread_data(buf);
    Payload::from(pl)
}
