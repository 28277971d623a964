use std::time::Duration;

use bpg_common::{helpers::parse_boolean_flag, Secret};
use log::*;

pub const PRODUCTION_ENDPOINT: &str = "https://api.getbarterpay.com/api/pay/m-api/add-in-deposit-queue";
pub const SANDBOX_ENDPOINT: &str = "https://test-api.getbarterpay.com/api/pay/m-api/add-in-deposit-queue";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(45);

#[derive(Debug, Clone)]
pub struct BarterPayConfig {
    /// Sent as the `X-SAO-Token` header on every request.
    pub api_key: Secret<String>,
    /// When true, requests go to the BarterPay test environment.
    pub sandbox: bool,
    /// Overrides the sandbox/production endpoint selection entirely. Mostly useful for tests.
    pub endpoint_override: Option<String>,
    pub timeout: Duration,
}

impl Default for BarterPayConfig {
    fn default() -> Self {
        Self { api_key: Secret::default(), sandbox: true, endpoint_override: None, timeout: DEFAULT_TIMEOUT }
    }
}

impl BarterPayConfig {
    pub fn new(api_key: &str, sandbox: bool) -> Self {
        Self { api_key: Secret::new(api_key.to_string()), sandbox, ..Default::default() }
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint_override = Some(endpoint.to_string());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn new_from_env_or_default() -> Self {
        let api_key = Secret::new(std::env::var("BPG_BARTERPAY_API_KEY").unwrap_or_else(|_| {
            warn!("💳️ BPG_BARTERPAY_API_KEY not set. Deposit requests will be rejected by BarterPay.");
            String::default()
        }));
        let sandbox = parse_boolean_flag(std::env::var("BPG_BARTERPAY_SANDBOX").ok(), true);
        if sandbox {
            info!("💳️ BarterPay sandbox mode is enabled. Set BPG_BARTERPAY_SANDBOX=false for production.");
        }
        let endpoint_override = std::env::var("BPG_BARTERPAY_ENDPOINT").ok().filter(|s| !s.trim().is_empty());
        let timeout = std::env::var("BPG_BARTERPAY_TIMEOUT")
            .ok()
            .and_then(|s| {
                s.parse::<u64>()
                    .map_err(|e| warn!("💳️ Invalid value for BPG_BARTERPAY_TIMEOUT ({s}). {e}. Using the default."))
                    .ok()
            })
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TIMEOUT);
        Self { api_key, sandbox, endpoint_override, timeout }
    }

    /// The deposit endpoint for the configured environment.
    pub fn endpoint(&self) -> &str {
        match &self.endpoint_override {
            Some(url) => url.as_str(),
            None if self.sandbox => SANDBOX_ENDPOINT,
            None => PRODUCTION_ENDPOINT,
        }
    }
}
