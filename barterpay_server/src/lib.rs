//! # BarterPay Payment Gateway server
//!
//! The HTTP front end of the gateway. It is responsible for:
//! * Receiving orders from the storefront and starting BarterPay payments for them.
//! * Listening for BarterPay's payment notifications on all of its channels and handing them to the reconciliation
//!   engine.
//! * Answering the storefront's status polls while a buyer waits for confirmation.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/barterpay/webhook`: BarterPay's server-to-server payment notification.
//! * `/barterpay/return`: Where buyers land after paying. Redirects to the storefront's thank-you page.
//! * `/barterpay/callback`: The notification URL used by older integrations (GET or POST).
//! * `/barterpay/status`: Payment status polling (GET or POST).
//! * `/api/orders`: Order sync from the storefront.
//! * `/api/checkout/{order_id}`: Starts a BarterPay payment.
//! * `/api/availability`: Whether BarterPay is offered for a cart.

pub mod api_routes;
pub mod barterpay_routes;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod helpers;
pub mod ingress;
pub mod integrations;
pub mod middleware;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
