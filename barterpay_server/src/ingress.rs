//! Lenient translation of BarterPay's notification formats into [`InboundNotification`]s.
//!
//! BarterPay reaches us over three channels, and each uses its own field names:
//! * the webhook posts `{ "data": { "ExternalTransactionId", "TransactionIndex", "TransactionStatus",
//!   "TransactionAmount" } }`,
//! * the browser return carries `externalTransactionId`, `transactionId`, `transactionStatus` and `transactionAmount`
//!   as query parameters,
//! * the legacy callback sends either of the above, or the `data` object without its envelope.
//!
//! Nothing in here fails. Missing or oddly-typed fields are treated as absent, which leaves the transaction id empty
//! and lets the engine reject the notification as malformed.
use std::collections::HashMap;

use barterpay_engine::{InboundNotification, NotificationStatus};
use bpg_common::Amount;
use log::*;
use serde_json::{Map, Value};

const TRANSACTION_ID_FIELDS: [&str; 2] = ["ExternalTransactionId", "externalTransactionId"];
const INDEX_FIELDS: [&str; 3] = ["TransactionIndex", "transactionIndex", "transactionId"];
const STATUS_FIELDS: [&str; 2] = ["TransactionStatus", "transactionStatus"];
const AMOUNT_FIELDS: [&str; 2] = ["TransactionAmount", "transactionAmount"];

/// Reads a webhook or legacy callback body. The `data` envelope is optional.
pub fn notification_from_json(body: &Value) -> InboundNotification {
    let fields = match body.get("data") {
        Some(Value::Object(data)) => data,
        _ => match body {
            Value::Object(flat) => flat,
            _ => {
                debug!("📨️ Notification body is not a JSON object: {body}");
                return empty_notification();
            },
        },
    };
    let txid = first_json_field(fields, &TRANSACTION_ID_FIELDS).unwrap_or_default();
    let status = first_json_field(fields, &STATUS_FIELDS).unwrap_or_default();
    let mut notification = InboundNotification::new(&txid, NotificationStatus::parse_lenient(&status));
    if let Some(index) = first_json_field(fields, &INDEX_FIELDS) {
        notification = notification.with_provider_index(&index);
    }
    if let Some(amount) = first_value(fields, &AMOUNT_FIELDS).and_then(json_amount) {
        notification = notification.with_amount(amount);
    }
    notification
}

/// Reads a notification from query (or form) parameters.
pub fn notification_from_params(params: &HashMap<String, String>) -> InboundNotification {
    let txid = first_param(params, &TRANSACTION_ID_FIELDS).unwrap_or_default();
    let status = first_param(params, &STATUS_FIELDS).unwrap_or_default();
    let mut notification = InboundNotification::new(txid, NotificationStatus::parse_lenient(status));
    if let Some(index) = first_param(params, &INDEX_FIELDS) {
        notification = notification.with_provider_index(index);
    }
    if let Some(amount) = first_param(params, &AMOUNT_FIELDS).and_then(string_amount) {
        notification = notification.with_amount(amount);
    }
    notification
}

/// Parses a raw body as JSON, returning `None` for anything that isn't a JSON object.
pub fn json_object(body: &[u8]) -> Option<Value> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return None;
    }
    match serde_json::from_slice::<Value>(body) {
        Ok(v @ Value::Object(_)) => Some(v),
        Ok(v) => {
            debug!("📨️ Ignoring JSON body that is not an object: {v}");
            None
        },
        Err(e) => {
            debug!("📨️ Body is not valid JSON. {e}");
            None
        },
    }
}

/// Finds the `order_id` in a status poll, whichever way it was sent.
pub fn order_id_from_request(query: &HashMap<String, String>, body: &[u8]) -> Option<String> {
    let from_query = query.get("order_id").map(|s| s.trim().to_string());
    let from_json = || {
        json_object(body)
            .and_then(|v| v.get("order_id").and_then(value_as_string))
            .map(|s| s.trim().to_string())
    };
    let from_form = || {
        url::form_urlencoded::parse(body)
            .find(|(k, _)| k == "order_id")
            .map(|(_, v)| v.trim().to_string())
    };
    [from_query, from_json(), from_form()].into_iter().flatten().find(|s| !s.is_empty())
}

fn empty_notification() -> InboundNotification {
    InboundNotification::new("", NotificationStatus::Unknown)
}

fn first_value<'a>(fields: &'a Map<String, Value>, names: &[&str]) -> Option<&'a Value> {
    names.iter().find_map(|name| fields.get(*name)).filter(|v| !v.is_null())
}

fn first_json_field(fields: &Map<String, Value>, names: &[&str]) -> Option<String> {
    first_value(fields, names).and_then(value_as_string)
}

fn first_param<'a>(params: &'a HashMap<String, String>, names: &[&str]) -> Option<&'a str> {
    names.iter().find_map(|name| params.get(*name)).map(String::as_str).filter(|s| !s.trim().is_empty())
}

/// Strings are taken as-is and numbers are printed. Anything else is treated as missing.
fn value_as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn json_amount(value: &Value) -> Option<Amount> {
    match value {
        Value::Number(n) => n.as_f64().and_then(|f| Amount::from_decimal(f).ok()),
        Value::String(s) => string_amount(s),
        _ => None,
    }
}

fn string_amount(s: &str) -> Option<Amount> {
    s.trim()
        .parse::<Amount>()
        .map_err(|e| debug!("📨️ Ignoring unreadable transaction amount '{s}'. {e}"))
        .ok()
}
