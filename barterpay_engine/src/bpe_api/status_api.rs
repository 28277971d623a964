use std::fmt::{Debug, Display};

use serde::{Deserialize, Serialize};

use crate::{
    db_types::{OrderId, OrderStatusType},
    traits::{OrderStore, OrderStoreError},
};

/// The coarse payment state reported to a checkout page that is polling for completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PollStatus {
    Paid,
    Failed,
    Pending,
}

impl Display for PollStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Paid => f.write_str("paid"),
            Self::Failed => f.write_str("failed"),
            Self::Pending => f.write_str("pending"),
        }
    }
}

pub fn classify_status(status: OrderStatusType) -> PollStatus {
    if status.is_paid() {
        PollStatus::Paid
    } else if status.is_failed() {
        PollStatus::Failed
    } else {
        PollStatus::Pending
    }
}

/// Read-only payment status queries.
pub struct StatusApi<B> {
    db: B,
}

impl<B> Debug for StatusApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "StatusApi")
    }
}

impl<B> StatusApi<B>
where B: OrderStore
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// The poll status of the order, or `None` if the order does not exist.
    pub async fn poll_status(&self, order_id: &OrderId) -> Result<Option<PollStatus>, OrderStoreError> {
        let order = self.db.fetch_order(order_id).await?;
        Ok(order.map(|o| classify_status(o.status)))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_mocks::MockOrderStore;

    #[test]
    fn status_classification() {
        use OrderStatusType::*;
        let cases = [
            (Pending, PollStatus::Pending),
            (OnHold, PollStatus::Pending),
            (Processing, PollStatus::Paid),
            (Completed, PollStatus::Paid),
            (Failed, PollStatus::Failed),
            (Cancelled, PollStatus::Failed),
            (Refunded, PollStatus::Pending),
        ];
        for (status, expected) in cases {
            assert_eq!(classify_status(status), expected, "{status}");
        }
        assert_eq!(serde_json::to_string(&PollStatus::Paid).unwrap(), r#""paid""#);
    }

    #[tokio::test]
    async fn unknown_orders_have_no_status() {
        let mut db = MockOrderStore::new();
        db.expect_fetch_order().returning(|_| Ok(None));
        let api = StatusApi::new(db);
        assert_eq!(api.poll_status(&OrderId::new("1")).await.unwrap(), None);
    }
}
