//! # BarterPay tools
//!
//! A thin client for the BarterPay merchant API. The only call the gateway needs is the deposit request, which queues
//! a payment on BarterPay's side and returns the URL that the buyer must be redirected to.
//!
//! ```rust,ignore
//! let api = BarterPayApi::new(BarterPayConfig::new_from_env_or_default())?;
//! let response = api.add_deposit(DepositRequest::new("txn_...", "USD", 49.99)).await?;
//! println!("Send the buyer to {}", response.redirect_url);
//! ```
mod api;
mod config;
mod error;

pub mod data_objects;

pub use api::BarterPayApi;
pub use config::{BarterPayConfig, DEFAULT_TIMEOUT, PRODUCTION_ENDPOINT, SANDBOX_ENDPOINT};
pub use data_objects::{DepositRequest, DepositResponse};
pub use error::BarterPayApiError;
