use barterpay_engine::{PaymentRedirect, PollStatus};
use serde::{Deserialize, Serialize};

/// The answer to a successful checkout. The storefront sends the buyer to `redirect`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutResponse {
    pub result: String,
    pub redirect: String,
    pub external_transaction_id: String,
}

impl From<PaymentRedirect> for CheckoutResponse {
    fn from(value: PaymentRedirect) -> Self {
        Self {
            result: "success".to_string(),
            redirect: value.redirect_url,
            external_transaction_id: value.external_transaction_id,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: PollStatus,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AvailabilityResponse {
    pub available: bool,
}
