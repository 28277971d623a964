use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use barterpay_engine::{CheckoutError, OrderStoreError, ReconciliationError};
use log::error;
use thiserror::Error;

/// Shown to buyers when BarterPay could not be reached.
pub const PAYMENT_TRANSPORT_MESSAGE: &str = "Payment error: Unable to connect to BarterPay.";
/// Shown to buyers when BarterPay's answer was unusable.
pub const PAYMENT_RESPONSE_MESSAGE: &str = "Payment error: Invalid response from BarterPay.";

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("Could not read request path: {0}")]
    InvalidRequestPath(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("The order cannot be paid for with BarterPay. {0}")]
    CheckoutRejected(String),
    #[error("{0}")]
    PaymentProviderError(&'static str),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::InvalidRequestPath(_) => StatusCode::BAD_REQUEST,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::CheckoutRejected(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::PaymentProviderError(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

impl From<OrderStoreError> for ServerError {
    fn from(e: OrderStoreError) -> Self {
        error!("🗃️ Order store failure. {e}");
        Self::BackendError(format!("Database error: {e}"))
    }
}

impl From<ReconciliationError> for ServerError {
    fn from(e: ReconciliationError) -> Self {
        match e {
            ReconciliationError::MissingCorrelationId => Self::InvalidRequestBody(e.to_string()),
            ReconciliationError::Store(e) => e.into(),
        }
    }
}

impl From<CheckoutError> for ServerError {
    fn from(e: CheckoutError) -> Self {
        match e {
            CheckoutError::OrderNotFound(id) => Self::NoRecordFound(format!("Order {id} does not exist.")),
            CheckoutError::InvalidAmount(..) |
            CheckoutError::UnsupportedCurrency(_) |
            CheckoutError::OrderNotPayable(..) => Self::CheckoutRejected(e.to_string()),
            CheckoutError::Transport(_) => Self::PaymentProviderError(PAYMENT_TRANSPORT_MESSAGE),
            CheckoutError::InvalidProviderResponse { .. } => Self::PaymentProviderError(PAYMENT_RESPONSE_MESSAGE),
            CheckoutError::TransactionIdExhausted(_) => Self::BackendError(e.to_string()),
            CheckoutError::Store(e) => e.into(),
        }
    }
}
