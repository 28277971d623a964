use std::env;

use barterpay_engine::{db_types::Order, CheckoutConfig, GatewayAvailability};
use barterpay_tools::BarterPayConfig;
use bpg_common::{
    helpers::{parse_boolean_flag, parse_list},
    Secret,
};
use log::*;
use url::Url;

const DEFAULT_BPG_HOST: &str = "127.0.0.1";
const DEFAULT_BPG_PORT: u16 = 8370;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/barterpay.db";
const DEFAULT_CURRENCIES: &str = "USD,EUR";
const DEFAULT_STORE_URL: &str = "http://localhost";

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// If true, the X-Forwarded-For header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_x_forwarded_for: bool,
    /// If true, the Forwarded header will be used to determine the client's IP address.
    pub use_forwarded: bool,
    /// When set, webhook and callback bodies must carry a valid HMAC signature.
    pub webhook_hmac_secret: Option<Secret<String>>,
    /// When set, calls against `/api` must carry a valid HMAC signature.
    pub platform_hmac_secret: Option<Secret<String>>,
    pub gateway: GatewayConfig,
    pub barterpay: BarterPayConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_BPG_HOST.to_string(),
            port: DEFAULT_BPG_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            use_x_forwarded_for: false,
            use_forwarded: false,
            webhook_hmac_secret: None,
            platform_hmac_secret: None,
            gateway: GatewayConfig::default(),
            barterpay: BarterPayConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("BPG_HOST").ok().unwrap_or_else(|| DEFAULT_BPG_HOST.into());
        let port = env::var("BPG_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for BPG_PORT. {e} Using the default, {DEFAULT_BPG_PORT}, instead."
                    );
                    DEFAULT_BPG_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_BPG_PORT);
        let database_url = env::var("BPG_DATABASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ BPG_DATABASE_URL is not set. Using the default, {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.to_string()
        });
        let use_x_forwarded_for = parse_boolean_flag(env::var("BPG_USE_X_FORWARDED_FOR").ok(), false);
        let use_forwarded = parse_boolean_flag(env::var("BPG_USE_FORWARDED").ok(), false);
        let webhook_hmac_secret = optional_secret("BPG_WEBHOOK_HMAC_SECRET");
        if webhook_hmac_secret.is_none() {
            info!("🪛️ BPG_WEBHOOK_HMAC_SECRET is not set. BarterPay notifications will not be signature-checked.");
        }
        let platform_hmac_secret = optional_secret("BPG_PLATFORM_HMAC_SECRET");
        if platform_hmac_secret.is_none() {
            warn!("🪛️ BPG_PLATFORM_HMAC_SECRET is not set. The /api endpoints accept unsigned requests.");
        }
        let gateway = GatewayConfig::from_env_or_default();
        let barterpay = BarterPayConfig::new_from_env_or_default();
        Self {
            host,
            port,
            database_url,
            use_x_forwarded_for,
            use_forwarded,
            webhook_hmac_secret,
            platform_hmac_secret,
            gateway,
            barterpay,
        }
    }
}

fn optional_secret(var: &str) -> Option<Secret<String>> {
    env::var(var).ok().filter(|s| !s.trim().is_empty()).map(Secret::new)
}

//-------------------------------------------------  ServerOptions  ----------------------------------------------------
/// The small, secret-free subset of the server configuration that request handlers need.
#[derive(Clone, Copy, Debug)]
pub struct ServerOptions {
    pub use_x_forwarded_for: bool,
    pub use_forwarded: bool,
}

impl ServerOptions {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self { use_x_forwarded_for: config.use_x_forwarded_for, use_forwarded: config.use_forwarded }
    }
}

//-------------------------------------------------  GatewayConfig  ----------------------------------------------------
/// Storefront-facing settings for the gateway: what it accepts, and where buyers are sent afterwards.
#[derive(Clone, Debug)]
pub struct GatewayConfig {
    pub currencies: Vec<String>,
    /// The browser return URL passed on to BarterPay with every deposit request.
    pub return_url: Option<Url>,
    /// The storefront's base URL, e.g. `https://shop.example.com`.
    pub store_url: String,
    /// A thank-you page URL with `{order_id}` and `{order_key}` placeholders. When absent, buyers are sent to the
    /// storefront's default order-received page.
    pub redirect_template: Option<String>,
    pub enable_for_methods: Vec<String>,
    pub enable_for_virtual: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            currencies: parse_list(DEFAULT_CURRENCIES),
            return_url: None,
            store_url: DEFAULT_STORE_URL.to_string(),
            redirect_template: None,
            enable_for_methods: Vec::new(),
            enable_for_virtual: true,
        }
    }
}

impl GatewayConfig {
    pub fn from_env_or_default() -> Self {
        let currencies = env::var("BPG_CURRENCIES").map(|s| parse_list(&s)).unwrap_or_default();
        let currencies = if currencies.is_empty() {
            info!("🪛️ BPG_CURRENCIES is not set. Accepting the default currencies, {DEFAULT_CURRENCIES}.");
            parse_list(DEFAULT_CURRENCIES)
        } else {
            currencies
        };
        let return_url = env::var("BPG_RETURN_URL").ok().and_then(|s| {
            Url::parse(s.trim())
                .map_err(|e| error!("🪛️ BPG_RETURN_URL ({s}) is not a valid URL. {e}. No return URL will be sent."))
                .ok()
        });
        if return_url.is_none() {
            warn!("🪛️ No return URL is configured. Buyers will not be sent back to the store by BarterPay.");
        }
        let store_url = env::var("BPG_STORE_URL")
            .ok()
            .and_then(|s| {
                Url::parse(s.trim())
                    .map(|_| s.trim().to_string())
                    .map_err(|e| error!("🪛️ BPG_STORE_URL ({s}) is not a valid URL. {e}. Using {DEFAULT_STORE_URL}."))
                    .ok()
            })
            .unwrap_or_else(|| {
                warn!("🪛️ BPG_STORE_URL is not set. Buyers will be redirected to {DEFAULT_STORE_URL}.");
                DEFAULT_STORE_URL.to_string()
            });
        let redirect_template = env::var("BPG_REDIRECT_TEMPLATE").ok().filter(|s| !s.trim().is_empty());
        let enable_for_methods = env::var("BPG_ENABLE_FOR_METHODS").map(|s| parse_list(&s)).unwrap_or_default();
        let enable_for_virtual = parse_boolean_flag(env::var("BPG_ENABLE_FOR_VIRTUAL").ok(), true);
        Self { currencies, return_url, store_url, redirect_template, enable_for_methods, enable_for_virtual }
    }

    pub fn checkout_config(&self) -> CheckoutConfig {
        let currencies = self.currencies.iter().map(String::as_str).collect::<Vec<_>>();
        let config = CheckoutConfig::new(&currencies);
        match &self.return_url {
            Some(url) => config.with_return_url(url.clone()),
            None => config,
        }
    }

    pub fn availability(&self) -> GatewayAvailability {
        GatewayAvailability::new(self.enable_for_methods.clone(), self.enable_for_virtual)
    }

    /// Where to send the buyer once BarterPay hands them back to us. The order id and key are percent-encoded.
    pub fn redirect_for(&self, order: &Order) -> String {
        let order_id = order.order_id.as_str();
        let order_key = order.order_key.as_str();
        match &self.redirect_template {
            Some(template) => template
                .replace("{order_id}", &urlencoding::encode(order_id))
                .replace("{order_key}", &urlencoding::encode(order_key)),
            None => self.order_received_url(order_id, order_key),
        }
    }

    fn order_received_url(&self, order_id: &str, order_key: &str) -> String {
        let mut url = match Url::parse(self.store_url.trim()) {
            Ok(url) if !url.cannot_be_a_base() => url,
            _ => {
                warn!("🪛️ The store URL '{}' is not a valid base URL", self.store_url);
                let base = self.store_url.trim_end_matches('/');
                let mut url = format!("{base}/checkout/order-received/{}/", urlencoding::encode(order_id));
                if !order_key.is_empty() {
                    url.push_str(&format!("?key={}", urlencoding::encode(order_key)));
                }
                return url;
            },
        };
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(["checkout", "order-received", order_id, ""]);
        }
        if !order_key.is_empty() {
            url.query_pairs_mut().append_pair("key", order_key);
        }
        url.to_string()
    }
}
