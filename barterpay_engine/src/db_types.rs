use std::{fmt::Display, str::FromStr};

use bpg_common::Amount;
use chrono::{DateTime, Utc};
use log::error;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
/// Order statuses as the storefront platform knows them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum OrderStatusType {
    /// The order has been placed, but no payment attempt has been made yet.
    Pending,
    /// A payment has been requested from BarterPay and we are waiting for confirmation.
    OnHold,
    /// Payment received. The merchant still needs to fulfil the order.
    Processing,
    /// Payment received and the order has been fulfilled.
    Completed,
    /// The payment was declined, cancelled or expired.
    Failed,
    /// The order was cancelled by the merchant or buyer.
    Cancelled,
    /// The order was refunded. Never set by the gateway.
    Refunded,
}

/// Orders in these states can still be settled by an incoming notification.
pub const NON_TERMINAL_STATUSES: [OrderStatusType; 2] = [OrderStatusType::Pending, OrderStatusType::OnHold];

impl OrderStatusType {
    pub fn is_paid(&self) -> bool {
        matches!(self, Self::Processing | Self::Completed)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed | Self::Cancelled)
    }

    pub fn is_terminal(&self) -> bool {
        !NON_TERMINAL_STATUSES.contains(self)
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::OnHold => "on-hold",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
            Self::Refunded => "refunded",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid order status: {0}")]
pub struct ConversionError(String);

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Platforms commonly prefix statuses with `wc-`
        match s.trim().trim_start_matches("wc-") {
            "pending" => Ok(Self::Pending),
            "on-hold" => Ok(Self::OnHold),
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            "cancelled" => Ok(Self::Cancelled),
            "refunded" => Ok(Self::Refunded),
            s => Err(ConversionError(s.to_string())),
        }
    }
}

impl From<String> for OrderStatusType {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid order status: {value}. But this conversion cannot fail. Defaulting to Pending");
            OrderStatusType::Pending
        })
    }
}

//--------------------------------------        OrderId        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderId(pub String);

impl OrderId {
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for OrderId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

//--------------------------------------        Order       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub order_id: OrderId,
    /// The storefront's secret order key, used in "order received" page URLs.
    pub order_key: String,
    pub customer_id: String,
    pub total_price: Amount,
    pub currency: String,
    pub status: OrderStatusType,
    /// The reference recorded when the order was paid. Either BarterPay's transaction index or our own transaction id.
    pub payment_reference: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------        NewOrder       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    /// The order id as assigned by the storefront
    pub order_id: OrderId,
    #[serde(default)]
    pub order_key: String,
    #[serde(default)]
    pub customer_id: String,
    pub total_price: Amount,
    pub currency: String,
    #[serde(default = "default_status")]
    pub status: OrderStatusType,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

fn default_status() -> OrderStatusType {
    OrderStatusType::Pending
}

impl NewOrder {
    pub fn new(order_id: OrderId, total_price: Amount, currency: &str) -> Self {
        Self {
            order_id,
            order_key: String::default(),
            customer_id: String::default(),
            total_price,
            currency: currency.to_string(),
            status: OrderStatusType::Pending,
            created_at: Utc::now(),
        }
    }

    pub fn with_order_key(mut self, key: &str) -> Self {
        self.order_key = key.to_string();
        self
    }

    pub fn with_customer_id(mut self, customer_id: &str) -> Self {
        self.customer_id = customer_id.to_string();
        self
    }

    pub fn with_status(mut self, status: OrderStatusType) -> Self {
        self.status = status;
        self
    }
}

impl Display for NewOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Order {} ({} {}, {})", self.order_id, self.total_price, self.currency, self.status)
    }
}

//--------------------------------------      OrderNote       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct OrderNote {
    pub id: i64,
    pub order_id: OrderId,
    pub note: String,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------     StatusUpdate     ---------------------------------------------------------
/// A status change, together with the audit note that explains it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    pub new_status: OrderStatusType,
    pub note: String,
    pub payment_reference: Option<String>,
}

impl StatusUpdate {
    pub fn new(new_status: OrderStatusType, note: &str) -> Self {
        Self { new_status, note: note.to_string(), payment_reference: None }
    }

    pub fn with_payment_reference(mut self, reference: &str) -> Self {
        self.payment_reference = Some(reference.to_string());
        self
    }
}
