//! # BarterPay gateway engine API
//!
//! The `bpe_api` module exposes the programmatic API of the gateway. As with the storage traits, each API is generic
//! over the backend it needs, so callers pick only the parts they use.
//!
//! * [`checkout_api`] starts a payment: it binds a fresh transaction id to the order, asks BarterPay for a payment
//!   page and puts the order on hold.
//! * [`reconciliation_api`] applies payment notifications (webhook, browser return, legacy callback) to orders,
//!   moving each order to a terminal status at most once.
//! * [`status_api`] answers payment status polls.
//! * [`correlator`] maintains the link between transaction ids and orders.
//! * [`availability`] decides whether the gateway is offered for a cart.
//!
//! ```rust,ignore
//! use barterpay_engine::{ReconciliationApi, SqliteDatabase, events::EventProducers};
//! let db = SqliteDatabase::new_with_url(...).await?;
//! let api = ReconciliationApi::new(db, EventProducers::default());
//! let outcome = api.apply_notification(notification).await?;
//! ```
pub mod availability;
pub mod checkout_api;
pub mod correlator;
pub mod errors;
pub mod notification;
pub mod reconciliation_api;
pub mod status_api;

pub use notification::{InboundNotification, NotificationStatus, ReconciliationOutcome};
