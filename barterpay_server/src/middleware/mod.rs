mod hmac;

pub use hmac::{HmacMiddlewareFactory, HmacMiddlewareService, BARTERPAY_HMAC_HEADER, PLATFORM_HMAC_HEADER};
