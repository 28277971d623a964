use serde::{Deserialize, Serialize};

use crate::{bpe_api::NotificationStatus, db_types::Order};

/// Published after a BarterPay notification has moved an order to a paid status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPaidEvent {
    pub order: Order,
    pub external_transaction_id: String,
}

impl OrderPaidEvent {
    pub fn new(order: Order, external_transaction_id: &str) -> Self {
        Self { order, external_transaction_id: external_transaction_id.to_string() }
    }
}

/// Published after a declined, cancelled or expired payment has moved an order to `failed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderFailedEvent {
    pub order: Order,
    pub external_transaction_id: String,
    pub reason: NotificationStatus,
}

impl OrderFailedEvent {
    pub fn new(order: Order, external_transaction_id: &str, reason: NotificationStatus) -> Self {
        Self { order, external_transaction_id: external_transaction_id.to_string(), reason }
    }
}
