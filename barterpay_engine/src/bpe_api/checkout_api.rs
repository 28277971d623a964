use std::fmt::Debug;

use log::*;
use serde::Serialize;
use url::Url;

use crate::{
    bpe_api::{
        correlator::TransactionCorrelator,
        errors::{CheckoutError, CorrelationError},
    },
    db_types::{OrderId, OrderStatusType, StatusUpdate, NON_TERMINAL_STATUSES},
    helpers::generate_transaction_id,
    traits::{OrderStore, PaymentProvider, PaymentRequest, ProviderError},
};

/// The number of fresh transaction ids tried before giving up on a checkout attempt.
pub const MAX_BIND_ATTEMPTS: usize = 3;
pub const AWAITING_CONFIRMATION_NOTE: &str = "Awaiting BarterPay payment confirmation.";

#[derive(Debug, Clone, Default)]
pub struct CheckoutConfig {
    /// Upper-case ISO currency codes that BarterPay accepts for this merchant.
    pub supported_currencies: Vec<String>,
    /// Where BarterPay should send the buyer once they're done. The transaction id is appended as the
    /// `externalTransactionId` query parameter.
    pub return_url: Option<Url>,
}

impl CheckoutConfig {
    pub fn new(supported_currencies: &[&str]) -> Self {
        let supported_currencies = supported_currencies.iter().map(|c| c.to_ascii_uppercase()).collect();
        Self { supported_currencies, return_url: None }
    }

    pub fn with_return_url(mut self, url: Url) -> Self {
        self.return_url = Some(url);
        self
    }

    pub fn supports_currency(&self, currency: &str) -> bool {
        self.supported_currencies.iter().any(|c| c.eq_ignore_ascii_case(currency.trim()))
    }

    /// The return URL for a specific transaction.
    pub fn return_url_for(&self, external_transaction_id: &str) -> Option<String> {
        self.return_url.as_ref().map(|base| {
            let mut url = base.clone();
            url.query_pairs_mut().append_pair("externalTransactionId", external_transaction_id);
            url.to_string()
        })
    }
}

/// Where to send the buyer after a successful checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentRedirect {
    pub redirect_url: String,
    pub external_transaction_id: String,
    pub provider_transaction_index: Option<String>,
}

/// `CheckoutApi` starts a BarterPay payment for an order.
pub struct CheckoutApi<B, P> {
    db: B,
    provider: P,
    config: CheckoutConfig,
}

impl<B, P> Debug for CheckoutApi<B, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CheckoutApi ({:?})", self.config)
    }
}

impl<B, P> CheckoutApi<B, P> {
    pub fn new(db: B, provider: P, config: CheckoutConfig) -> Self {
        Self { db, provider, config }
    }

    pub fn config(&self) -> &CheckoutConfig {
        &self.config
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }
}

impl<B, P> CheckoutApi<B, P>
where
    B: OrderStore,
    P: PaymentProvider,
{
    /// Requests a payment from BarterPay for the order.
    ///
    /// A fresh transaction id is bound to the order before BarterPay is contacted, so that a notification can always
    /// be matched to its order, even if it arrives before this call returns. If BarterPay cannot be reached, or its
    /// response is unusable, the order status is left untouched and the buyer can simply try again.
    pub async fn initiate_payment(&self, order_id: &OrderId) -> Result<PaymentRedirect, CheckoutError> {
        let order =
            self.db.fetch_order(order_id).await?.ok_or_else(|| CheckoutError::OrderNotFound(order_id.clone()))?;
        if !order.total_price.is_positive() {
            return Err(CheckoutError::InvalidAmount(order.order_id, order.total_price));
        }
        if !self.config.supports_currency(&order.currency) {
            return Err(CheckoutError::UnsupportedCurrency(order.currency));
        }
        if order.status.is_terminal() {
            return Err(CheckoutError::OrderNotPayable(order.order_id, order.status));
        }

        let correlator = TransactionCorrelator::new(&self.db);
        let txid = self.bind_fresh_transaction_id(&correlator, order_id).await?;
        let request = PaymentRequest {
            external_transaction_id: txid.clone(),
            currency: order.currency.trim().to_ascii_uppercase(),
            amount: order.total_price,
            return_url: self.config.return_url_for(&txid),
        };
        info!("🧾️ Requesting payment of {} {} for order {order_id} ({txid})", request.amount, request.currency);
        let initiated = self.provider.initiate_payment(request).await.map_err(|e| {
            warn!("🧾️ Payment request for order {order_id} ({txid}) failed. {e}");
            match e {
                ProviderError::Transport(msg) => CheckoutError::Transport(msg),
                ProviderError::InvalidResponse { body } => {
                    debug!("🧾️ Raw BarterPay response for {txid}: {body}");
                    CheckoutError::InvalidProviderResponse { body }
                },
            }
        })?;

        if let Some(index) = &initiated.provider_transaction_index {
            if let Err(e) = correlator.attach_provider_index(order_id, index).await {
                warn!("🧾️ Could not store BarterPay transaction index {index} for order {order_id}. {e}");
            }
        }

        let update = StatusUpdate::new(OrderStatusType::OnHold, AWAITING_CONFIRMATION_NOTE);
        match self.db.transition_status(order_id, &NON_TERMINAL_STATUSES, update).await? {
            Some(_) => debug!("🧾️ Order {order_id} is on hold, awaiting confirmation of {txid}"),
            // A notification for this very transaction beat us to it. The buyer still gets redirected.
            None => info!("🧾️ Order {order_id} was settled before checkout completed ({txid})"),
        }

        Ok(PaymentRedirect {
            redirect_url: initiated.redirect_url,
            external_transaction_id: txid,
            provider_transaction_index: initiated.provider_transaction_index,
        })
    }

    async fn bind_fresh_transaction_id(
        &self,
        correlator: &TransactionCorrelator<'_, B>,
        order_id: &OrderId,
    ) -> Result<String, CheckoutError> {
        for attempt in 1..=MAX_BIND_ATTEMPTS {
            let txid = generate_transaction_id();
            match correlator.bind(order_id, &txid).await {
                Ok(()) => return Ok(txid),
                Err(CorrelationError::DuplicateTransactionId(_)) => {
                    warn!("🧾️ Transaction id collision on attempt {attempt} for order {order_id}. Trying a new id.");
                },
                Err(e) => return Err(e.into()),
            }
        }
        error!("🧾️ Could not bind a unique transaction id to order {order_id}");
        Err(CheckoutError::TransactionIdExhausted(MAX_BIND_ATTEMPTS))
    }
}
