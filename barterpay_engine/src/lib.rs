//! BarterPay Payment Engine
//!
//! The engine holds the core logic of the BarterPay payment gateway: it starts payments, correlates asynchronous
//! payment notifications with the orders they belong to, and settles each order exactly once. It knows nothing about
//! HTTP; the ingress adapters live in the server crate.
//!
//! The library is divided into three main sections:
//! 1. Backend contracts ([`mod@traits`]). The engine reaches order storage and the payment provider only through the
//!    [`OrderStore`] and [`PaymentProvider`] traits. [`SqliteDatabase`] is the bundled order store.
//! 2. The engine's public API ([`mod@bpe_api`]): checkout, reconciliation, status polling and gateway availability.
//! 3. Events ([`mod@events`]). Hooks that are called after an order has been paid for or has failed.
pub mod bpe_api;
pub mod db_types;
pub mod events;
pub mod helpers;
pub mod traits;

#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(test)]
mod test_mocks;

pub use bpe_api::{
    availability::{CartContext, GatewayAvailability},
    checkout_api::{CheckoutApi, CheckoutConfig, PaymentRedirect},
    correlator::TransactionCorrelator,
    errors::{CheckoutError, CorrelationError, ReconciliationError},
    reconciliation_api::ReconciliationApi,
    status_api::{classify_status, PollStatus, StatusApi},
    InboundNotification,
    NotificationStatus,
    ReconciliationOutcome,
};
#[cfg(feature = "sqlite")]
pub use sqlite::{db::db_url, SqliteDatabase};
pub use traits::{OrderStore, OrderStoreError, PaymentInitiated, PaymentProvider, PaymentRequest, ProviderError};
