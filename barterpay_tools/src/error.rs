use thiserror::Error;

#[derive(Debug, Error)]
pub enum BarterPayApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("The request to BarterPay timed out. {0}")]
    Timeout(String),
    #[error("Could not reach BarterPay: {0}")]
    Transport(String),
    #[error("BarterPay returned an invalid response (HTTP {status}).")]
    InvalidResponse { status: u16, body: String },
}

impl BarterPayApiError {
    /// True for failures where no response was received at all.
    pub fn is_transport_error(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::Transport(_))
    }

    /// The raw response body, if BarterPay answered. For diagnostics only; never show this to the buyer.
    pub fn raw_body(&self) -> Option<&str> {
        match self {
            Self::InvalidResponse { body, .. } => Some(body.as_str()),
            _ => None,
        }
    }
}
