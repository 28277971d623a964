use barterpay_engine::{
    events::{EventHandlers, EventHooks, OrderFailedEvent, OrderPaidEvent},
    PaymentInitiated,
    PaymentProvider,
    PaymentRequest,
    ProviderError,
};
use barterpay_tools::{BarterPayApi, BarterPayApiError, BarterPayConfig, DepositRequest};
use log::*;

pub const BARTERPAY_EVENT_BUFFER_SIZE: usize = 25;

/// Connects the engine's [`PaymentProvider`] contract to the BarterPay deposit API.
#[derive(Clone)]
pub struct BarterPayProvider {
    api: BarterPayApi,
}

impl BarterPayProvider {
    pub fn new(config: BarterPayConfig) -> Result<Self, BarterPayApiError> {
        let api = BarterPayApi::new(config)?;
        Ok(Self { api })
    }

    pub fn api(&self) -> &BarterPayApi {
        &self.api
    }
}

impl PaymentProvider for BarterPayProvider {
    async fn initiate_payment(&self, request: PaymentRequest) -> Result<PaymentInitiated, ProviderError> {
        let mut deposit =
            DepositRequest::new(&request.external_transaction_id, &request.currency, request.amount.to_decimal());
        if let Some(url) = &request.return_url {
            deposit = deposit.with_return_url(url);
        }
        let response = self.api.add_deposit(deposit).await.map_err(provider_error)?;
        Ok(PaymentInitiated {
            redirect_url: response.redirect_url,
            provider_transaction_index: response.transaction_index,
        })
    }
}

fn provider_error(e: BarterPayApiError) -> ProviderError {
    match e {
        BarterPayApiError::InvalidResponse { body, .. } => ProviderError::InvalidResponse { body },
        e => ProviderError::Transport(e.to_string()),
    }
}

/// The gateway has no downstream systems to notify, so the hooks only leave a trail in the log.
pub fn create_barterpay_event_handlers() -> EventHandlers {
    let mut hooks = EventHooks::default();
    hooks.on_order_paid(|ev: OrderPaidEvent| {
        Box::pin(async move {
            info!(
                "💳️ Order {} has been paid ({} {}). Transaction id: {}. Reference: {}",
                ev.order.order_id,
                ev.order.total_price,
                ev.order.currency,
                ev.external_transaction_id,
                ev.order.payment_reference.as_deref().unwrap_or("n/a")
            );
        })
    });
    hooks.on_order_failed(|ev: OrderFailedEvent| {
        Box::pin(async move {
            info!(
                "💳️ Payment for order {} did not go through. BarterPay reported '{}' for transaction {}. The order is \
                 now {}.",
                ev.order.order_id, ev.reason, ev.external_transaction_id, ev.order.status
            );
        })
    });
    EventHandlers::new(BARTERPAY_EVENT_BUFFER_SIZE, hooks)
}
