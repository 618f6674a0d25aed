//! # Parser Module
//!
//! Turns one JSONL log record into a [`LogEntry`].
//!
//! Log records come in several shapes: token usage may live under
//! `message.usage`, under a root `usage` object, or directly on the root;
//! keys may be snake_case or camelCase; timestamps may be RFC 3339 strings
//! or epoch numbers. Every field is resolved by trying an ordered list of
//! strategies and keeping the first hit.

use chrono::{DateTime, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

use crate::models::LogEntry;

/// Record discriminator for counted lines
pub const ASSISTANT_TYPE: &str = "assistant";
pub const UNKNOWN_MODEL: &str = "unknown";

const INPUT_KEYS: &[&str] = &["input_tokens", "inputTokens", "prompt_tokens"];
const OUTPUT_KEYS: &[&str] = &["output_tokens", "outputTokens", "completion_tokens"];
const CACHE_CREATE_KEYS: &[&str] = &["cache_creation_input_tokens", "cacheCreationInputTokens"];
const CACHE_READ_KEYS: &[&str] = &["cache_read_input_tokens", "cacheReadInputTokens"];
const COST_KEYS: &[&str] = &["costUSD", "cost_usd", "cost"];
const REQUEST_ID_KEYS: &[&str] = &["request_id", "requestId"];

const OFFSET_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f%:z", "%Y-%m-%dT%H:%M:%S%:z"];
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
];

static DATE_SUFFIX_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"-\d{8}$").unwrap());

type UsageStrategy = fn(&Value) -> Option<&Map<String, Value>>;

/// Where token usage may live, highest priority first.
const USAGE_STRATEGIES: &[UsageStrategy] = &[message_usage, root_usage, root_token_fields];

fn message_usage(v: &Value) -> Option<&Map<String, Value>> {
    v.get("message")?.get("usage")?.as_object()
}

fn root_usage(v: &Value) -> Option<&Map<String, Value>> {
    v.get("usage")?.as_object()
}

fn root_token_fields(v: &Value) -> Option<&Map<String, Value>> {
    let root = v.as_object()?;
    let has_tokens = [INPUT_KEYS, OUTPUT_KEYS, CACHE_CREATE_KEYS, CACHE_READ_KEYS]
        .iter()
        .flat_map(|keys| keys.iter())
        .any(|k| root.contains_key(*k));
    has_tokens.then_some(root)
}

/// Parse a raw line. Blank lines, invalid JSON and non-assistant records yield `None`.
pub fn parse_line(line: &str, session_id: &str) -> Option<LogEntry> {
    let t = line.trim();
    if t.is_empty() {
        return None;
    }
    let v: Value = serde_json::from_str(t).ok()?;
    parse_record(&v, session_id)
}

pub fn parse_record(v: &Value, session_id: &str) -> Option<LogEntry> {
    if v.get("type").and_then(Value::as_str) != Some(ASSISTANT_TYPE) {
        return None;
    }
    let ts = parse_timestamp(v.get("timestamp")?)?;

    let usage = USAGE_STRATEGIES.iter().find_map(|strategy| strategy(v));
    let count = |keys: &[&str]| usage.and_then(|u| get_u64_any(u, keys)).unwrap_or(0);

    Some(LogEntry {
        ts,
        session_id: session_id.to_string(),
        model: normalize_model(&extract_model(v)),
        input: count(INPUT_KEYS),
        output: count(OUTPUT_KEYS),
        cache_create: count(CACHE_CREATE_KEYS),
        cache_read: count(CACHE_READ_KEYS),
        cost_usd: extract_cost(v),
        dedup_key: dedup_key(v),
    })
}

/// Accepts RFC 3339 strings (with or without fractional seconds, `Z` or an
/// explicit offset), offset-less ISO strings read as UTC, and Unix epoch
/// seconds as integer or float.
pub fn parse_timestamp(v: &Value) -> Option<DateTime<Utc>> {
    match v {
        Value::String(s) => parse_timestamp_str(s),
        Value::Number(n) => {
            if let Some(secs) = n.as_i64() {
                DateTime::from_timestamp(secs, 0)
            } else {
                epoch_seconds(n.as_f64()?)
            }
        }
        _ => None,
    }
}

fn parse_timestamp_str(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    let normalized = match s.strip_suffix('Z').or_else(|| s.strip_suffix('z')) {
        Some(base) => format!("{base}+00:00"),
        None => s.to_string(),
    };
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(&normalized, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    None
}

fn epoch_seconds(secs: f64) -> Option<DateTime<Utc>> {
    if !secs.is_finite() {
        return None;
    }
    let whole = secs.floor();
    let nanos = (((secs - whole) * 1e9).round() as u32).min(999_999_999);
    DateTime::from_timestamp(whole as i64, nanos)
}

fn extract_model(v: &Value) -> String {
    v.get("model")
        .and_then(Value::as_str)
        .or_else(|| v.get("message").and_then(|m| m.get("model")).and_then(Value::as_str))
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(UNKNOWN_MODEL)
        .to_string()
}

/// Strip a trailing `-YYYYMMDD` snapshot suffix so dated releases collapse
/// into their family name.
pub fn normalize_model(model: &str) -> String {
    DATE_SUFFIX_RE.replace(model, "").into_owned()
}

fn extract_cost(v: &Value) -> Option<f64> {
    COST_KEYS
        .iter()
        .filter_map(|k| v.get(*k).and_then(Value::as_f64))
        .find(|c| c.is_finite() && *c > 0.0)
}

/// `message_id:request_id`. A record without a message id gets a random one,
/// so it never collapses into another record.
fn dedup_key(v: &Value) -> String {
    let message_id = v
        .get("message_id")
        .and_then(Value::as_str)
        .or_else(|| v.get("message").and_then(|m| m.get("id")).and_then(Value::as_str))
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let request_id = REQUEST_ID_KEYS
        .iter()
        .find_map(|k| v.get(*k).and_then(Value::as_str))
        .unwrap_or("");
    format!("{message_id}:{request_id}")
}

fn get_u64_any(obj: &Map<String, Value>, keys: &[&str]) -> Option<u64> {
    for k in keys {
        if let Some(n) = obj.get(*k) {
            if let Some(i) = n.as_u64() {
                return Some(i);
            }
            if let Some(f) = n.as_f64() {
                if f.is_finite() && f >= 0.0 {
                    return Some(f as u64);
                }
            }
            if let Some(s) = n.as_str() {
                if let Ok(i) = s.trim().parse::<u64>() {
                    return Some(i);
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};
    use serde_json::json;

    fn ts(v: Value) -> Option<DateTime<Utc>> {
        parse_timestamp(&v)
    }

    #[test]
    fn timestamps_in_every_supported_shape() {
        let expected = Utc.with_ymd_and_hms(2025, 10, 18, 10, 0, 0).unwrap();
        assert_eq!(ts(json!("2025-10-18T10:00:00.000Z")), Some(expected));
        assert_eq!(ts(json!("2025-10-18T10:00:00Z")), Some(expected));
        assert_eq!(ts(json!("2025-10-18T12:00:00+02:00")), Some(expected));
        assert_eq!(ts(json!("2025-10-18T10:00:00")), Some(expected));
        assert_eq!(ts(json!(expected.timestamp())), Some(expected));

        let fractional = ts(json!(expected.timestamp() as f64 + 0.5)).unwrap();
        assert_eq!(fractional.timestamp(), expected.timestamp());
        assert_eq!(fractional.nanosecond(), 500_000_000);
    }

    #[test]
    fn bad_timestamps_are_rejected() {
        assert_eq!(ts(json!("yesterday")), None);
        assert_eq!(ts(json!(null)), None);
        assert_eq!(ts(json!({"secs": 1})), None);
    }

    #[test]
    fn only_assistant_records_count() {
        let line = r#"{"type":"user","timestamp":"2025-10-18T10:00:00Z","message":{"usage":{"input_tokens":5}}}"#;
        assert!(parse_line(line, "s").is_none());
        assert!(parse_line("   ", "s").is_none());
        assert!(parse_line("{not json", "s").is_none());
    }

    #[test]
    fn assistant_record_without_timestamp_is_skipped() {
        let v = json!({"type": "assistant", "message": {"usage": {"input_tokens": 5}}});
        assert!(parse_record(&v, "s").is_none());
    }

    #[test]
    fn nested_usage_wins_over_root() {
        let v = json!({
            "type": "assistant",
            "timestamp": "2025-10-18T10:00:00Z",
            "usage": {"input_tokens": 999},
            "input_tokens": 777,
            "message": {
                "id": "msg_1",
                "model": "claude-sonnet-4-5-20250929",
                "usage": {
                    "input_tokens": 10,
                    "output_tokens": 20,
                    "cache_creation_input_tokens": 30,
                    "cache_read_input_tokens": 40
                }
            },
            "requestId": "req_1"
        });
        let e = parse_record(&v, "session-a").unwrap();
        assert_eq!((e.input, e.output, e.cache_create, e.cache_read), (10, 20, 30, 40));
        assert_eq!(e.model, "claude-sonnet-4-5");
        assert_eq!(e.dedup_key, "msg_1:req_1");
        assert_eq!(e.session_id, "session-a");
    }

    #[test]
    fn root_usage_then_root_fields() {
        let v = json!({
            "type": "assistant",
            "timestamp": "2025-10-18T10:00:00Z",
            "usage": {"inputTokens": 3, "outputTokens": 4, "cacheReadInputTokens": 5}
        });
        let e = parse_record(&v, "s").unwrap();
        assert_eq!((e.input, e.output, e.cache_create, e.cache_read), (3, 4, 0, 5));

        let v = json!({
            "type": "assistant",
            "timestamp": "2025-10-18T10:00:00Z",
            "prompt_tokens": 7,
            "completion_tokens": 8
        });
        let e = parse_record(&v, "s").unwrap();
        assert_eq!((e.input, e.output), (7, 8));
    }

    #[test]
    fn model_resolution_order() {
        let v = json!({
            "type": "assistant",
            "timestamp": 1_700_000_000,
            "model": "claude-opus-4-6",
            "message": {"model": "claude-haiku-4-5"}
        });
        assert_eq!(parse_record(&v, "s").unwrap().model, "claude-opus-4-6");

        let v = json!({"type": "assistant", "timestamp": 1_700_000_000});
        assert_eq!(parse_record(&v, "s").unwrap().model, UNKNOWN_MODEL);
    }

    #[test]
    fn model_normalization() {
        assert_eq!(normalize_model("claude-sonnet-4-5-20250929"), "claude-sonnet-4-5");
        assert_eq!(normalize_model("claude-opus-4-6"), "claude-opus-4-6");
        // seven digits is not a date suffix
        assert_eq!(normalize_model("model-2025092"), "model-2025092");
    }

    #[test]
    fn cost_takes_first_positive_field() {
        let v = json!({
            "type": "assistant",
            "timestamp": 1_700_000_000,
            "costUSD": 0,
            "cost_usd": 0.42,
            "cost": 9.0
        });
        assert_eq!(parse_record(&v, "s").unwrap().cost_usd, Some(0.42));

        let v = json!({"type": "assistant", "timestamp": 1_700_000_000, "cost": -1.0});
        assert_eq!(parse_record(&v, "s").unwrap().cost_usd, None);
    }

    #[test]
    fn missing_message_id_is_never_shared() {
        let v = json!({"type": "assistant", "timestamp": 1_700_000_000, "request_id": "r"});
        let a = parse_record(&v, "s").unwrap();
        let b = parse_record(&v, "s").unwrap();
        assert_ne!(a.dedup_key, b.dedup_key);
        assert!(a.dedup_key.ends_with(":r"));

        let v = json!({"type": "assistant", "timestamp": 1_700_000_000, "message_id": "m"});
        assert_eq!(parse_record(&v, "s").unwrap().dedup_key, "m:");
    }
}
