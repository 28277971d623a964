use bpg_common::Amount;
use thiserror::Error;

/// An outbound payment request, before it is translated into the provider's wire format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRequest {
    pub external_transaction_id: String,
    pub currency: String,
    pub amount: Amount,
    pub return_url: Option<String>,
}

/// The normalised result of a successful payment request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentInitiated {
    pub redirect_url: String,
    pub provider_transaction_index: Option<String>,
}

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("Could not reach the payment provider. {0}")]
    Transport(String),
    #[error("The payment provider returned an invalid response.")]
    InvalidResponse { body: String },
}

#[allow(async_fn_in_trait)]
pub trait PaymentProvider {
    /// Submits the payment request. Implementations must bound the call with a timeout and report a timeout as
    /// [`ProviderError::Transport`].
    async fn initiate_payment(&self, request: PaymentRequest) -> Result<PaymentInitiated, ProviderError>;
}
