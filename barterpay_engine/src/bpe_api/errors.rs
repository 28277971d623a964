use bpg_common::Amount;
use thiserror::Error;

use crate::{
    db_types::{OrderId, OrderStatusType},
    traits::OrderStoreError,
};

#[derive(Debug, Clone, Error)]
pub enum CorrelationError {
    #[error("Transaction id {0} is already bound to another order")]
    DuplicateTransactionId(String),
    #[error("Transaction id {id} matches {count} orders")]
    Ambiguous { id: String, count: usize },
    #[error("{0}")]
    Store(#[from] OrderStoreError),
}

#[derive(Debug, Clone, Error)]
pub enum ReconciliationError {
    #[error("The notification does not carry a transaction id")]
    MissingCorrelationId,
    #[error("Could not reconcile the notification. {0}")]
    Store(#[from] OrderStoreError),
}

#[derive(Debug, Clone, Error)]
pub enum CheckoutError {
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("Order {0} cannot be paid for. Its total is {1}")]
    InvalidAmount(OrderId, Amount),
    #[error("Currency {0} is not supported by this gateway")]
    UnsupportedCurrency(String),
    #[error("Order {0} is {1} and cannot be paid for")]
    OrderNotPayable(OrderId, OrderStatusType),
    #[error("Could not find a free transaction id after {0} attempts")]
    TransactionIdExhausted(usize),
    #[error("Could not connect to BarterPay. {0}")]
    Transport(String),
    #[error("BarterPay returned an invalid response")]
    InvalidProviderResponse { body: String },
    #[error("{0}")]
    Store(#[from] OrderStoreError),
}

impl From<CorrelationError> for CheckoutError {
    fn from(e: CorrelationError) -> Self {
        match e {
            CorrelationError::Store(e) => Self::Store(e),
            e => Self::Store(OrderStoreError::DatabaseError(e.to_string())),
        }
    }
}
