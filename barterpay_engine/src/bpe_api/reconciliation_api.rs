use std::fmt::Debug;

use log::*;

use crate::{
    bpe_api::{
        correlator::TransactionCorrelator,
        errors::{CorrelationError, ReconciliationError},
        notification::{InboundNotification, NotificationStatus, ReconciliationOutcome},
    },
    db_types::{Order, OrderStatusType, StatusUpdate, NON_TERMINAL_STATUSES},
    events::{EventProducers, OrderFailedEvent, OrderPaidEvent},
    traits::OrderStore,
};

/// `ReconciliationApi` applies BarterPay payment notifications to orders.
///
/// Notifications may arrive more than once, out of order, and over several channels at the same time. Every order is
/// moved to a terminal status at most once; anything that arrives afterwards is acknowledged without side effects.
pub struct ReconciliationApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for ReconciliationApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ReconciliationApi")
    }
}

impl<B> ReconciliationApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> ReconciliationApi<B>
where B: OrderStore
{
    /// Applies a notification to the order it refers to.
    ///
    /// The only errors are a missing transaction id (the notification is malformed, so there's no point in sending it
    /// again) and store failures (the notifier should retry later). Every other case, including unknown transaction
    /// ids and repeat deliveries, is a successful [`ReconciliationOutcome`].
    pub async fn apply_notification(
        &self,
        notification: InboundNotification,
    ) -> Result<ReconciliationOutcome, ReconciliationError> {
        let txid = notification.external_transaction_id.trim();
        if txid.is_empty() {
            warn!("🔄️ Received a BarterPay notification without a transaction id. Ignoring it.");
            return Err(ReconciliationError::MissingCorrelationId);
        }
        let correlator = TransactionCorrelator::new(&self.db);
        let order = match correlator.resolve(txid, &NON_TERMINAL_STATUSES).await {
            Ok(Some(order)) => order,
            Ok(None) => {
                info!("🔄️ No pending order for transaction {txid} ({}). Nothing to do.", notification.status);
                return Ok(ReconciliationOutcome::Unresolved);
            },
            Err(CorrelationError::Store(e)) => return Err(e.into()),
            Err(e) => {
                error!("🔄️ Cannot reconcile transaction {txid}. {e}. Manual intervention is required.");
                return Ok(ReconciliationOutcome::Unresolved);
            },
        };
        trace!("🔄️ Transaction {txid} resolved to order {}", order.order_id);

        let stored_index = match correlator.stored_provider_index(&order).await {
            Ok(index) => index,
            Err(CorrelationError::Store(e)) => return Err(e.into()),
            Err(e) => {
                warn!("🔄️ Could not read the stored transaction index for order {}. {e}", order.order_id);
                None
            },
        };
        if let (Some(stored), Some(received)) = (&stored_index, &notification.provider_transaction_index) {
            if stored != received {
                warn!(
                    "🔄️ Transaction index mismatch for order {}. Stored: {stored}, received: {received}. Continuing \
                     with the transaction id match.",
                    order.order_id
                );
            }
        }

        if order.status.is_terminal() {
            return Ok(self.already_processed(order, &notification));
        }

        let status = notification.status;
        let update = match status {
            NotificationStatus::Success => {
                let index = notification.provider_transaction_index.clone().or(stored_index);
                let reference = index.clone().unwrap_or_else(|| txid.to_string());
                let amount = notification.amount.map(|a| a.to_string()).unwrap_or_else(|| "n/a".to_string());
                let note = format!(
                    "Payment completed via BarterPay. Amount: {amount}. Transaction index: {}. Transaction id: {txid}.",
                    index.as_deref().unwrap_or("n/a")
                );
                StatusUpdate::new(OrderStatusType::Processing, &note).with_payment_reference(&reference)
            },
            NotificationStatus::Failed | NotificationStatus::Cancelled | NotificationStatus::Expired => {
                let note = format!("Payment {status} via BarterPay. Transaction id: {txid}.");
                StatusUpdate::new(OrderStatusType::Failed, &note)
            },
            NotificationStatus::Unknown => {
                info!(
                    "🔄️ BarterPay reported an unrecognised status for order {} (transaction {txid}). Leaving the \
                     order as {}.",
                    order.order_id, order.status
                );
                return Ok(ReconciliationOutcome::Ignored(order));
            },
        };

        let order_id = order.order_id.clone();
        let updated = self.db.transition_status(&order_id, &NON_TERMINAL_STATUSES, update).await?;
        let Some(updated) = updated else {
            debug!("🔄️ Order {order_id} was settled concurrently. Treating transaction {txid} as a repeat.");
            let current = self.db.fetch_order(&order_id).await?.unwrap_or(order);
            return Ok(self.already_processed(current, &notification));
        };

        if status == NotificationStatus::Success {
            info!("🔄️ Order {order_id} has been paid (transaction {txid})");
            self.producers.publish_order_paid(OrderPaidEvent::new(updated.clone(), txid)).await;
            Ok(ReconciliationOutcome::Settled(updated))
        } else {
            info!("🔄️ Payment for order {order_id} was {status} (transaction {txid})");
            self.producers.publish_order_failed(OrderFailedEvent::new(updated.clone(), txid, status)).await;
            Ok(ReconciliationOutcome::Declined { order: updated, status })
        }
    }

    /// Finds the order a transaction id belongs to, whatever its status. Used to decide where to send a buyer who
    /// returns from BarterPay after the order has already been settled.
    pub async fn find_order_for_transaction(
        &self,
        external_transaction_id: &str,
    ) -> Result<Option<Order>, ReconciliationError> {
        match TransactionCorrelator::new(&self.db).lookup(external_transaction_id).await {
            Ok(order) => Ok(order),
            Err(CorrelationError::Store(e)) => Err(e.into()),
            Err(e) => {
                error!("🔄️ Cannot look up transaction {external_transaction_id}. {e}");
                Ok(None)
            },
        }
    }

    fn already_processed(&self, order: Order, notification: &InboundNotification) -> ReconciliationOutcome {
        if notification.status.agrees_with(order.status) {
            debug!(
                "🔄️ Order {} is already {}. Ignoring repeat notification for transaction {}",
                order.order_id, order.status, notification.external_transaction_id
            );
        } else {
            warn!(
                "🔄️ Order {} is already {}, but BarterPay now reports '{}' for transaction {}. The order will not be \
                 changed.",
                order.order_id, order.status, notification.status, notification.external_transaction_id
            );
        }
        ReconciliationOutcome::AlreadyProcessed(order)
    }
}
