//! Typed settings for the roachwatch runtime.

use serde::{Deserialize, Serialize};

use crate::defaults;

pub const CUSTOM_VISION_URL: &str = "CUSTOM_VISION_URL";
pub const CUSTOM_VISION_KEY: &str = "CUSTOM_VISION_KEY";
pub const STORAGE_CONNECTION_STRING: &str = "STORAGE_CONNECTION_STRING";

/// Runtime settings.
///
/// The three inference/storage values have no defaults; every other field does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Prediction endpoint of the published Custom Vision iteration
    pub custom_vision_url: Option<String>,
    /// Value sent in the `Prediction-Key` header
    pub custom_vision_key: Option<String>,
    /// Storage account connection string
    pub storage_connection_string: Option<String>,
    pub blob_container: String,
    pub results_table: String,
    /// HTTP server bind address
    pub bind_address: String,
    /// HTTP server port
    pub port: u16,
    /// Externally visible base URL, used for locally stored image links
    pub public_url: Option<String>,
    pub max_upload_bytes: usize,
    pub log_dir: String,
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            custom_vision_url: None,
            custom_vision_key: None,
            storage_connection_string: None,
            blob_container: defaults::BLOB_CONTAINER.to_string(),
            results_table: defaults::RESULTS_TABLE.to_string(),
            bind_address: defaults::BIND_ADDRESS.to_string(),
            port: defaults::PORT,
            public_url: None,
            max_upload_bytes: defaults::MAX_UPLOAD_BYTES,
            log_dir: defaults::LOG_DIR.to_string(),
            log_level: defaults::LOG_LEVEL.to_string(),
        }
    }
}

impl Settings {
    /// Names of required settings that are absent or blank, in a fixed order.
    pub fn missing_required(&self) -> Vec<String> {
        [
            (CUSTOM_VISION_URL, &self.custom_vision_url),
            (CUSTOM_VISION_KEY, &self.custom_vision_key),
            (STORAGE_CONNECTION_STRING, &self.storage_connection_string),
        ]
        .into_iter()
        .filter(|(_, value)| value.as_deref().map_or(true, |v| v.trim().is_empty()))
        .map(|(name, _)| name.to_string())
        .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.missing_required().is_empty()
    }

    /// Base URL clients reach this server on.
    pub fn public_url(&self) -> String {
        match &self.public_url {
            Some(url) if !url.trim().is_empty() => url.trim_end_matches('/').to_string(),
            _ => format!("http://localhost:{}", self.port),
        }
    }

    /// `bind_address:port`
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }

    /// A copy of these settings safe to log or print.
    pub fn redacted(&self) -> serde_json::Value {
        match serde_json::to_value(self) {
            Ok(value) => crate::redact::redact(&value),
            Err(_) => serde_json::Value::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete() -> Settings {
        Settings {
            custom_vision_url: Some("https://cv.example/predict".into()),
            custom_vision_key: Some("key".into()),
            storage_connection_string: Some("UseDevelopmentStorage=true".into()),
            ..Settings::default()
        }
    }

    #[test]
    fn defaults_need_all_three_required_values() {
        assert_eq!(
            Settings::default().missing_required(),
            vec![CUSTOM_VISION_URL, CUSTOM_VISION_KEY, STORAGE_CONNECTION_STRING]
        );
    }

    #[test]
    fn blank_values_count_as_missing() {
        let settings = Settings {
            custom_vision_key: Some("   ".into()),
            ..complete()
        };
        assert_eq!(settings.missing_required(), vec![CUSTOM_VISION_KEY]);
        assert!(complete().is_complete());
    }

    #[test]
    fn public_url_falls_back_to_localhost() {
        let mut settings = Settings::default();
        assert_eq!(settings.public_url(), "http://localhost:7071");
        settings.public_url = Some("https://roach.example.com/".into());
        assert_eq!(settings.public_url(), "https://roach.example.com");
    }

    #[test]
    fn redacted_hides_secrets() {
        let redacted = complete().redacted();
        assert_eq!(redacted["custom_vision_key"], "***");
        assert!(!redacted["storage_connection_string"]
            .as_str()
            .unwrap()
            .contains("Storage=true"));
        assert_eq!(redacted["blob_container"], "uploaded-images");
    }
}
