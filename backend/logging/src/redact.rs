//! Log Redaction Layer
//!
//! Scrubs storage account keys, SAS signatures, request signatures and
//! prediction keys from strings prior to logging.

use regex::Regex;
use std::sync::LazyLock;

static ACCOUNT_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(AccountKey|SharedAccessSignature)=[^;\s]+").unwrap());
static SAS_SIG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"([?&]sig=)[^&\s]+").unwrap());
static SHARED_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"SharedKey(Lite)?\s+([^:\s]+):[A-Za-z0-9+/=]+").unwrap());
static PREDICTION_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(Prediction-Key\s*[:=]\s*)[A-Za-z0-9]+").unwrap());

/// Redacts sensitive patterns in a string.
pub fn redact_sensitive_data(input: &str) -> String {
    let mut redacted = ACCOUNT_KEY_RE.replace_all(input, "$1=[REDACTED]").to_string();
    redacted = SAS_SIG_RE.replace_all(&redacted, "${1}[REDACTED]").to_string();
    redacted = SHARED_KEY_RE
        .replace_all(&redacted, "SharedKey$1 $2:[REDACTED]")
        .to_string();
    redacted = PREDICTION_KEY_RE
        .replace_all(&redacted, "${1}[REDACTED]")
        .to_string();
    redacted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redaction() {
        let raw = "AccountName=roach;AccountKey=c2VjcmV0a2V5;EndpointSuffix=core.windows.net";
        let clean = redact_sensitive_data(raw);
        assert!(!clean.contains("c2VjcmV0a2V5"));
        assert!(clean.contains("AccountName=roach"));
    }

    #[test]
    fn redacts_sas_signature_in_urls() {
        let raw = "PUT https://roach.blob.core.windows.net/c/a.jpg?sv=2022-11-02&sig=abc%2Bdef&se=2030";
        let clean = redact_sensitive_data(raw);
        assert!(!clean.contains("abc%2Bdef"));
        assert!(clean.contains("&se=2030"));
    }

    #[test]
    fn redacts_authorization_and_prediction_key() {
        let raw = "Authorization: SharedKey roach:Zm9vYmFy+/= Prediction-Key: 0123456789abcdef";
        let clean = redact_sensitive_data(raw);
        assert!(!clean.contains("Zm9vYmFy"));
        assert!(!clean.contains("0123456789abcdef"));
        assert!(clean.contains("SharedKey roach:[REDACTED]"));
    }
}
