use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The body of a deposit request. Field names follow the BarterPay API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DepositRequest {
    pub transaction_id: String,
    pub currency: String,
    /// In major units, e.g. `49.99`. BarterPay does not expect amounts in cents.
    pub amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_url: Option<String>,
}

impl DepositRequest {
    pub fn new(transaction_id: &str, currency: &str, amount: f64) -> Self {
        Self {
            transaction_id: transaction_id.to_string(),
            currency: currency.to_string(),
            amount,
            return_url: None,
        }
    }

    pub fn with_return_url(mut self, url: &str) -> Self {
        self.return_url = Some(url.to_string());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositResponse {
    pub redirect_url: String,
    pub transaction_index: Option<String>,
}

impl DepositResponse {
    /// Extracts the fields we care about from a raw response. Returns `None` unless there is a non-empty
    /// `redirectUrl`. `transactionIndex` has been seen both as a string and as a number.
    pub fn from_json(value: &Value) -> Option<Self> {
        let redirect_url = value.get("redirectUrl")?.as_str()?.trim();
        if redirect_url.is_empty() {
            return None;
        }
        let transaction_index = match value.get("transactionIndex") {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        };
        Some(Self { redirect_url: redirect_url.to_string(), transaction_index })
    }
}
