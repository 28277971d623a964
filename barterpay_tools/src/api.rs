use std::sync::Arc;

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
};
use serde_json::Value;

use crate::{config::BarterPayConfig, BarterPayApiError, DepositRequest, DepositResponse};

#[derive(Clone)]
pub struct BarterPayApi {
    config: BarterPayConfig,
    client: Arc<Client>,
}

impl BarterPayApi {
    pub fn new(config: BarterPayConfig) -> Result<Self, BarterPayApiError> {
        let mut headers = HeaderMap::with_capacity(2);
        let val = HeaderValue::from_str(config.api_key.reveal().as_str())
            .map_err(|e| BarterPayApiError::Initialization(e.to_string()))?;
        headers.insert("X-SAO-Token", val);
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| BarterPayApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn config(&self) -> &BarterPayConfig {
        &self.config
    }

    /// Queues a deposit on BarterPay. On success, the buyer must be sent to the returned redirect URL.
    ///
    /// This call blocks (asynchronously) for at most the configured timeout.
    pub async fn add_deposit(&self, request: DepositRequest) -> Result<DepositResponse, BarterPayApiError> {
        let url = self.config.endpoint();
        debug!("💳️ Sending deposit request for {} to {url}", request.transaction_id);
        let response = self.client.post(url).json(&request).send().await.map_err(|e| {
            warn!("💳️ Deposit request for {} failed. {e}", request.transaction_id);
            if e.is_timeout() {
                BarterPayApiError::Timeout(e.to_string())
            } else {
                BarterPayApiError::Transport(e.to_string())
            }
        })?;
        let status = response.status();
        let body = response.text().await.map_err(|e| BarterPayApiError::Transport(e.to_string()))?;
        trace!("💳️ BarterPay responded with {status}: {body}");
        let parsed = serde_json::from_str::<Value>(&body).ok().and_then(|v| DepositResponse::from_json(&v));
        match parsed {
            Some(result) if status.is_success() => {
                info!(
                    "💳️ Deposit {} accepted by BarterPay. Transaction index: {}",
                    request.transaction_id,
                    result.transaction_index.as_deref().unwrap_or("n/a")
                );
                Ok(result)
            },
            _ => {
                warn!("💳️ BarterPay returned an unexpected response ({status}) for {}", request.transaction_id);
                Err(BarterPayApiError::InvalidResponse { status: status.as_u16(), body })
            },
        }
    }
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use mockito::Matcher;

    use super::*;

    const DEPOSIT_PATH: &str = "/api/pay/m-api/add-in-deposit-queue";

    fn api_for(server: &mockito::ServerGuard) -> BarterPayApi {
        let endpoint = format!("{}{DEPOSIT_PATH}", server.url());
        BarterPayApi::new(BarterPayConfig::new("test-token", true).with_endpoint(&endpoint)).unwrap()
    }

    #[tokio::test]
    async fn successful_deposit() {
        let _ = env_logger::try_init();
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", DEPOSIT_PATH)
            .match_header("X-SAO-Token", "test-token")
            .match_header("content-type", "application/json")
            .match_body(Matcher::Json(serde_json::json!({
                "TransactionId": "txn_abc",
                "Currency": "USD",
                "Amount": 49.99,
                "ReturnUrl": "https://shop.example/barterpay/return?externalTransactionId=txn_abc"
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"redirectUrl":"https://pay.example/checkout/1","transactionIndex":"9001"}"#)
            .expect(1)
            .create_async()
            .await;
        let request = DepositRequest::new("txn_abc", "USD", 49.99)
            .with_return_url("https://shop.example/barterpay/return?externalTransactionId=txn_abc");
        let response = api_for(&server).add_deposit(request).await.expect("deposit failed");
        assert_eq!(response.redirect_url, "https://pay.example/checkout/1");
        assert_eq!(response.transaction_index.as_deref(), Some("9001"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn missing_redirect_is_an_invalid_response() {
        let _ = env_logger::try_init();
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", DEPOSIT_PATH)
            .with_status(200)
            .with_body(r#"{"error":"Currency not enabled"}"#)
            .create_async()
            .await;
        let err = api_for(&server).add_deposit(DepositRequest::new("txn_1", "EUR", 10.0)).await.unwrap_err();
        assert!(!err.is_transport_error());
        assert_eq!(err.raw_body(), Some(r#"{"error":"Currency not enabled"}"#));
    }

    #[tokio::test]
    async fn server_error_is_an_invalid_response() {
        let _ = env_logger::try_init();
        let mut server = mockito::Server::new_async().await;
        let _m = server.mock("POST", DEPOSIT_PATH).with_status(500).with_body("oops").create_async().await;
        let err = api_for(&server).add_deposit(DepositRequest::new("txn_2", "USD", 1.0)).await.unwrap_err();
        match err {
            BarterPayApiError::InvalidResponse { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "oops");
            },
            e => panic!("Unexpected error: {e}"),
        }
    }

    #[tokio::test]
    async fn unreachable_provider_is_a_transport_error() {
        let _ = env_logger::try_init();
        // Nothing listens on port 9 (discard) on the loopback interface in CI environments.
        let config = BarterPayConfig::new("k", true)
            .with_endpoint("http://127.0.0.1:9/deposit")
            .with_timeout(Duration::from_secs(2));
        let api = BarterPayApi::new(config).unwrap();
        let err = api.add_deposit(DepositRequest::new("txn_3", "USD", 1.0)).await.unwrap_err();
        assert!(err.is_transport_error());
        assert!(err.raw_body().is_none());
    }

    #[tokio::test]
    async fn silent_provider_times_out() {
        let _ = env_logger::try_init();
        // Accepts connections but never answers
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });
        let config = BarterPayConfig::new("k", true)
            .with_endpoint(&format!("http://{addr}/deposit"))
            .with_timeout(Duration::from_millis(300));
        let api = BarterPayApi::new(config).unwrap();
        let err = api.add_deposit(DepositRequest::new("txn_4", "USD", 1.0)).await.unwrap_err();
        assert!(matches!(err, BarterPayApiError::Timeout(_)), "{err}");
        assert!(err.raw_body().is_none());
        server.abort();
    }
}
