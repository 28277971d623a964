use std::fmt::Display;

use bpg_common::Amount;
use serde::{Deserialize, Serialize};

use crate::db_types::{Order, OrderStatusType};

/// The payment status reported by BarterPay, normalised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationStatus {
    Success,
    Failed,
    Cancelled,
    Expired,
    Unknown,
}

impl NotificationStatus {
    /// Case-insensitive, whitespace-tolerant parsing. Anything unrecognised is [`NotificationStatus::Unknown`].
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "success" => Self::Success,
            "failed" => Self::Failed,
            "cancelled" | "canceled" => Self::Cancelled,
            "expired" => Self::Expired,
            _ => Self::Unknown,
        }
    }

    pub fn is_decline(&self) -> bool {
        matches!(self, Self::Failed | Self::Cancelled | Self::Expired)
    }

    /// Whether an order that is already in `status` has reached the outcome this notification reports.
    pub fn agrees_with(&self, status: OrderStatusType) -> bool {
        match self {
            Self::Success => status.is_paid(),
            Self::Failed | Self::Cancelled | Self::Expired => status.is_failed(),
            Self::Unknown => true,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
            Self::Expired => "expired",
            Self::Unknown => "unknown",
        }
    }
}

impl Display for NotificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A payment notification from any ingress channel (webhook, browser return or legacy callback), normalised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundNotification {
    pub external_transaction_id: String,
    pub provider_transaction_index: Option<String>,
    pub status: NotificationStatus,
    /// Informational only. The amount is recorded in the audit note but is not checked against the order total.
    pub amount: Option<Amount>,
}

impl InboundNotification {
    pub fn new(external_transaction_id: &str, status: NotificationStatus) -> Self {
        Self {
            external_transaction_id: external_transaction_id.trim().to_string(),
            provider_transaction_index: None,
            status,
            amount: None,
        }
    }

    /// Sets the provider index. Blank values are treated as absent.
    pub fn with_provider_index(mut self, index: &str) -> Self {
        let index = index.trim();
        self.provider_transaction_index = (!index.is_empty()).then(|| index.to_string());
        self
    }

    pub fn with_amount(mut self, amount: Amount) -> Self {
        self.amount = Some(amount);
        self
    }
}

/// The result of applying a notification. Every variant is a success from the notifier's point of view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconciliationOutcome {
    /// The order was moved to a paid status.
    Settled(Order),
    /// The order was moved to `failed`.
    Declined { order: Order, status: NotificationStatus },
    /// The order had already reached a terminal status. Nothing was changed.
    AlreadyProcessed(Order),
    /// The notification status was not recognised. Nothing was changed.
    Ignored(Order),
    /// No pending order matches the transaction id.
    Unresolved,
}

impl ReconciliationOutcome {
    pub fn order(&self) -> Option<&Order> {
        match self {
            Self::Settled(order) | Self::AlreadyProcessed(order) | Self::Ignored(order) => Some(order),
            Self::Declined { order, .. } => Some(order),
            Self::Unresolved => None,
        }
    }
}
