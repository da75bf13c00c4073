//! Settings redaction: produce safe-to-log snapshots by masking secret fields.
//!
//! Masks the prediction key, storage connection strings, and any value that
//! looks like an embedded storage credential.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// Keys whose values are always masked.
static SECRET_KEYS: &[&str] = &[
    "custom_vision_key",
    "customVisionKey",
    "prediction_key",
    "storage_connection_string",
    "storageConnectionString",
    "connection_string",
    "account_key",
    "accountKey",
    "sas_token",
];

/// `AccountKey=...` or `SharedAccessSignature=...` inside any string.
static EMBEDDED_CREDENTIAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(AccountKey|SharedAccessSignature|sig)=([^;&\s]+)").unwrap());

/// Redact a settings JSON value, replacing sensitive fields with a short hint.
pub fn redact(value: &Value) -> Value {
    redact_recursive(value, "")
}

fn is_secret_key(key: &str) -> bool {
    SECRET_KEYS.iter().any(|k| k.eq_ignore_ascii_case(key))
}

fn redact_string(s: &str, key: &str) -> Value {
    if is_secret_key(key) && !s.is_empty() {
        // Preserve a short prefix hint
        let hint = if s.chars().count() > 4 {
            format!("{}***", s.chars().take(4).collect::<String>())
        } else {
            "***".to_string()
        };
        return Value::String(hint);
    }

    if EMBEDDED_CREDENTIAL.is_match(s) {
        return Value::String(EMBEDDED_CREDENTIAL.replace_all(s, "$1=***").into_owned());
    }

    Value::String(s.to_string())
}

fn redact_recursive(value: &Value, key: &str) -> Value {
    match value {
        Value::String(s) => redact_string(s, key),
        Value::Array(arr) => Value::Array(arr.iter().map(|v| redact_recursive(v, key)).collect()),
        Value::Object(map) => {
            let mut result = serde_json::Map::new();
            for (k, v) in map {
                result.insert(k.clone(), redact_recursive(v, k));
            }
            Value::Object(result)
        }
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn redacts_prediction_key() {
        let v = json!({ "custom_vision_key": "0123456789abcdef" });
        let redacted = redact(&v);
        assert_eq!(redacted["custom_vision_key"], "0123***");
    }

    #[test]
    fn redacts_connection_string() {
        let v = json!({
            "storage_connection_string":
                "DefaultEndpointsProtocol=https;AccountName=roach;AccountKey=c2VjcmV0;EndpointSuffix=core.windows.net"
        });
        let redacted = redact(&v);
        let s = redacted["storage_connection_string"].as_str().unwrap();
        assert!(s.ends_with("***"));
        assert!(!s.contains("c2VjcmV0"));
    }

    #[test]
    fn redacts_embedded_credentials_under_any_key() {
        let v = json!({ "note": "AccountName=roach;AccountKey=c2VjcmV0;" });
        let redacted = redact(&v);
        assert_eq!(redacted["note"], "AccountName=roach;AccountKey=***;");
    }

    #[test]
    fn passthrough_non_sensitive() {
        let v = json!({ "log_level": "debug", "port": 7071 });
        let redacted = redact(&v);
        assert_eq!(redacted["log_level"], "debug");
        assert_eq!(redacted["port"], 7071);
    }
}
