//! # Backend contracts
//!
//! The reconciliation engine never talks to a database or to BarterPay directly. Instead, it relies on two traits,
//! which are wired up with concrete implementations at start-up:
//!
//! * [`OrderStore`] is the storefront's order storage. It exposes lookups by id and by metadata, metadata writes, audit
//!   notes, and an atomic, conditional status transition. [`crate::SqliteDatabase`] is the bundled implementation.
//! * [`PaymentProvider`] submits the outbound payment request and normalises the provider's synchronous response.
mod order_store;
mod payment_provider;

pub use order_store::{OrderStore, OrderStoreError};
pub use payment_provider::{PaymentInitiated, PaymentProvider, PaymentRequest, ProviderError};
