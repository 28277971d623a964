//! Links locally generated transaction ids to orders.
//!
//! Correlation data lives in the order's metadata. Metadata is append-only, so a later checkout attempt "replaces" the
//! current transaction id by appending a new one, while ids from earlier attempts still resolve to the same order.
use log::*;

use crate::{
    bpe_api::errors::CorrelationError,
    db_types::{Order, OrderId, OrderStatusType},
    traits::{OrderStore, OrderStoreError},
};

pub const EXTERNAL_TRANSACTION_ID_KEY: &str = "external_transaction_id";
pub const PROVIDER_TRANSACTION_INDEX_KEY: &str = "provider_transaction_index";
/// Written by earlier versions of the gateway. Read as a fallback only.
pub const LEGACY_TRANSACTION_ID_KEY: &str = "_barterpay_txn_id";
pub const LEGACY_TRANSACTION_INDEX_KEY: &str = "_barterpay_txn_index";

pub struct TransactionCorrelator<'a, B> {
    db: &'a B,
}

impl<'a, B> TransactionCorrelator<'a, B>
where B: OrderStore
{
    pub fn new(db: &'a B) -> Self {
        Self { db }
    }

    /// Makes `external_transaction_id` the order's current transaction id. The write is durable when this call
    /// returns, and an audit note records the assignment.
    ///
    /// Returns [`CorrelationError::DuplicateTransactionId`] if the id already belongs to any order.
    pub async fn bind(&self, order_id: &OrderId, external_transaction_id: &str) -> Result<(), CorrelationError> {
        match self.db.add_meta(order_id, EXTERNAL_TRANSACTION_ID_KEY, external_transaction_id).await {
            Ok(()) => {},
            Err(OrderStoreError::DuplicateValue(_)) => {
                warn!("🔗️ Transaction id {external_transaction_id} is already in use. Not binding it to {order_id}");
                return Err(CorrelationError::DuplicateTransactionId(external_transaction_id.to_string()));
            },
            Err(e) => return Err(e.into()),
        }
        let note = format!("BarterPay transaction id {external_transaction_id} assigned.");
        self.db.add_note(order_id, &note).await?;
        debug!("🔗️ Transaction id {external_transaction_id} bound to order {order_id}");
        Ok(())
    }

    pub async fn attach_provider_index(&self, order_id: &OrderId, index: &str) -> Result<(), CorrelationError> {
        self.db.add_meta(order_id, PROVIDER_TRANSACTION_INDEX_KEY, index).await?;
        debug!("🔗️ BarterPay transaction index {index} attached to order {order_id}");
        Ok(())
    }

    /// The provider index recorded at checkout, if any.
    pub async fn stored_provider_index(&self, order: &Order) -> Result<Option<String>, CorrelationError> {
        self.latest_meta(&order.order_id, PROVIDER_TRANSACTION_INDEX_KEY, LEGACY_TRANSACTION_INDEX_KEY).await
    }

    /// The transaction id bound by the most recent checkout attempt, if any.
    pub async fn current_transaction_id(&self, order_id: &OrderId) -> Result<Option<String>, CorrelationError> {
        self.latest_meta(order_id, EXTERNAL_TRANSACTION_ID_KEY, LEGACY_TRANSACTION_ID_KEY).await
    }

    /// Finds the order bound to `external_transaction_id`, considering only orders whose status is in
    /// `allowed_statuses`. An empty slice means any status.
    ///
    /// Returns [`CorrelationError::Ambiguous`] if more than one order matches.
    pub async fn resolve(
        &self,
        external_transaction_id: &str,
        allowed_statuses: &[OrderStatusType],
    ) -> Result<Option<Order>, CorrelationError> {
        let id = external_transaction_id.trim();
        if id.is_empty() {
            return Ok(None);
        }
        let mut orders = self.db.fetch_orders_by_meta(EXTERNAL_TRANSACTION_ID_KEY, id, allowed_statuses).await?;
        if orders.is_empty() {
            orders = self.db.fetch_orders_by_meta(LEGACY_TRANSACTION_ID_KEY, id, allowed_statuses).await?;
            if !orders.is_empty() {
                trace!("🔗️ Transaction id {id} resolved using the legacy key");
            }
        }
        match orders.len() {
            0 => {
                trace!("🔗️ No order matches transaction id {id}");
                Ok(None)
            },
            1 => Ok(orders.pop()),
            count => Err(CorrelationError::Ambiguous { id: id.to_string(), count }),
        }
    }

    /// Like [`Self::resolve`], but without any status restriction.
    pub async fn lookup(&self, external_transaction_id: &str) -> Result<Option<Order>, CorrelationError> {
        self.resolve(external_transaction_id, &[]).await
    }

    async fn latest_meta(
        &self,
        order_id: &OrderId,
        key: &str,
        legacy_key: &str,
    ) -> Result<Option<String>, CorrelationError> {
        let value = match self.db.fetch_meta(order_id, key).await? {
            Some(v) => Some(v),
            None => self.db.fetch_meta(order_id, legacy_key).await?,
        };
        Ok(value.filter(|v| !v.trim().is_empty()))
    }
}

#[cfg(test)]
mod test {
    use bpg_common::Amount;
    use chrono::Utc;
    use mockall::predicate::eq;

    use super::*;
    use crate::{db_types::NON_TERMINAL_STATUSES, test_mocks::MockOrderStore};

    fn order(id: &str) -> Order {
        Order {
            id: 1,
            order_id: OrderId::new(id),
            order_key: "wc_order_k".into(),
            customer_id: "c1".into(),
            total_price: Amount::from(1000),
            currency: "USD".into(),
            status: OrderStatusType::OnHold,
            payment_reference: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn bind_writes_meta_then_note() {
        let mut db = MockOrderStore::new();
        let mut seq = mockall::Sequence::new();
        db.expect_add_meta()
            .withf(|oid, key, value| oid.as_str() == "7" && key == EXTERNAL_TRANSACTION_ID_KEY && value == "txn_a")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Ok(()));
        db.expect_add_note()
            .withf(|oid, note| oid.as_str() == "7" && note.contains("txn_a"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        TransactionCorrelator::new(&db).bind(&OrderId::new("7"), "txn_a").await.unwrap();
    }

    #[tokio::test]
    async fn bind_reports_collisions() {
        let mut db = MockOrderStore::new();
        db.expect_add_meta().returning(|_, _, _| Err(OrderStoreError::DuplicateValue("txn_a".into())));
        db.expect_add_note().never();
        let err = TransactionCorrelator::new(&db).bind(&OrderId::new("7"), "txn_a").await.unwrap_err();
        assert!(matches!(err, CorrelationError::DuplicateTransactionId(id) if id == "txn_a"));
    }

    #[tokio::test]
    async fn resolve_falls_back_to_legacy_key() {
        let mut db = MockOrderStore::new();
        db.expect_fetch_orders_by_meta()
            .withf(|key, value, statuses| {
                key == EXTERNAL_TRANSACTION_ID_KEY && value == "txn_old" && statuses == NON_TERMINAL_STATUSES
            })
            .returning(|_, _, _| Ok(vec![]));
        db.expect_fetch_orders_by_meta()
            .withf(|key, _, _| key == LEGACY_TRANSACTION_ID_KEY)
            .returning(|_, _, _| Ok(vec![order("12")]));
        let found = TransactionCorrelator::new(&db).resolve("txn_old", &NON_TERMINAL_STATUSES).await.unwrap();
        assert_eq!(found.unwrap().order_id, OrderId::new("12"));
    }

    #[tokio::test]
    async fn resolve_rejects_ambiguous_matches() {
        let mut db = MockOrderStore::new();
        db.expect_fetch_orders_by_meta().returning(|_, _, _| Ok(vec![order("1"), order("2")]));
        let err = TransactionCorrelator::new(&db).lookup("txn_x").await.unwrap_err();
        assert!(matches!(err, CorrelationError::Ambiguous { count: 2, .. }));
    }

    #[tokio::test]
    async fn blank_ids_never_reach_the_store() {
        let db = MockOrderStore::new();
        let found = TransactionCorrelator::new(&db).lookup("   ").await.unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn stored_index_prefers_the_primary_key() {
        let mut db = MockOrderStore::new();
        db.expect_fetch_meta()
            .with(eq(OrderId::new("3")), eq(PROVIDER_TRANSACTION_INDEX_KEY))
            .returning(|_, _| Ok(None));
        db.expect_fetch_meta()
            .with(eq(OrderId::new("3")), eq(LEGACY_TRANSACTION_INDEX_KEY))
            .returning(|_, _| Ok(Some("88".into())));
        let index = TransactionCorrelator::new(&db).stored_provider_index(&order("3")).await.unwrap();
        assert_eq!(index.as_deref(), Some("88"));
    }
}
