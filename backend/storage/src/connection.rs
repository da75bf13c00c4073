//! Storage connection string parsing.
//!
//! Accepts the Azure `Key=Value;Key=Value` format. Keys are matched
//! case-insensitively and values may themselves contain `=` (base64 keys).

use std::collections::HashMap;
use std::path::PathBuf;

use base64::{Engine, engine::general_purpose::STANDARD};
use reqwest::Url;
use thiserror::Error;

/// Well-known Azurite account.
const DEV_ACCOUNT_NAME: &str = "devstoreaccount1";
const DEV_ACCOUNT_KEY: &str =
    "Eby8vdM02xNOcqFlqUwJPLlmEtlCDXJ1OUzFT50uSRZ6IFsuFq2UVErCz4I6tq/K1SZFPTOtr/KBHBeksoGMGw==";
const DEV_BLOB_ENDPOINT: &str = "http://127.0.0.1:10000/devstoreaccount1";
const DEV_TABLE_ENDPOINT: &str = "http://127.0.0.1:10002/devstoreaccount1";

#[derive(Debug, Error, PartialEq)]
pub enum ConnectionStringError {
    #[error("malformed segment '{0}' (expected Key=Value)")]
    MalformedSegment(String),
    #[error("connection string is empty")]
    Empty,
    #[error("AccountName is required")]
    MissingAccountName,
    #[error("connection string has neither AccountKey nor SharedAccessSignature")]
    MissingCredential,
    #[error("AccountKey is not valid base64")]
    InvalidAccountKey,
    #[error("invalid {name} endpoint '{value}'")]
    InvalidEndpoint { name: &'static str, value: String },
}

/// How requests to an account are authorised.
#[derive(Debug, Clone, PartialEq)]
pub enum Credential {
    /// Decoded account key, used for SharedKey request signing.
    SharedKey(Vec<u8>),
    /// SAS query string without the leading `?`.
    Sas(String),
}

/// An Azure Storage account reachable over REST.
#[derive(Debug, Clone, PartialEq)]
pub struct AzureAccount {
    pub name: String,
    pub credential: Credential,
    pub blob_endpoint: Url,
    pub table_endpoint: Url,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StorageConnection {
    Azure(AzureAccount),
    /// Images on disk under `root`, rows in SQLite.
    Local { root: PathBuf },
}

impl StorageConnection {
    pub fn parse(raw: &str) -> Result<Self, ConnectionStringError> {
        let pairs = split_pairs(raw)?;
        let get = |key: &str| pairs.get(&key.to_ascii_lowercase()).map(String::as_str);

        if let Some(root) = get("LocalStoragePath") {
            return Ok(Self::Local { root: PathBuf::from(root) });
        }

        if get("UseDevelopmentStorage").is_some_and(|v| v.eq_ignore_ascii_case("true")) {
            return Ok(Self::Azure(AzureAccount {
                name: DEV_ACCOUNT_NAME.to_string(),
                credential: Credential::SharedKey(decode_key(DEV_ACCOUNT_KEY)?),
                blob_endpoint: endpoint("Blob", DEV_BLOB_ENDPOINT)?,
                table_endpoint: endpoint("Table", DEV_TABLE_ENDPOINT)?,
            }));
        }

        let name = get("AccountName").unwrap_or_default().to_string();
        let credential = match (get("AccountKey"), get("SharedAccessSignature")) {
            (Some(key), _) => Credential::SharedKey(decode_key(key)?),
            (None, Some(sas)) => Credential::Sas(sas.trim_start_matches('?').to_string()),
            (None, None) => return Err(ConnectionStringError::MissingCredential),
        };
        if name.is_empty() && matches!(credential, Credential::SharedKey(_)) {
            return Err(ConnectionStringError::MissingAccountName);
        }

        let protocol = get("DefaultEndpointsProtocol").unwrap_or("https");
        let suffix = get("EndpointSuffix").unwrap_or("core.windows.net");
        let service_endpoint = |service: &'static str, explicit: Option<&str>| match explicit {
            Some(url) => endpoint(service, url),
            None if name.is_empty() => Err(ConnectionStringError::MissingAccountName),
            None => endpoint(service, &format!("{protocol}://{name}.{}.{suffix}", service.to_ascii_lowercase())),
        };

        Ok(Self::Azure(AzureAccount {
            blob_endpoint: service_endpoint("Blob", get("BlobEndpoint"))?,
            table_endpoint: service_endpoint("Table", get("TableEndpoint"))?,
            name,
            credential,
        }))
    }
}

fn split_pairs(raw: &str) -> Result<HashMap<String, String>, ConnectionStringError> {
    let mut pairs = HashMap::new();
    for segment in raw.split(';').map(str::trim).filter(|s| !s.is_empty()) {
        let (key, value) = segment
            .split_once('=')
            .ok_or_else(|| ConnectionStringError::MalformedSegment(segment.to_string()))?;
        pairs.insert(key.trim().to_ascii_lowercase(), value.trim().to_string());
    }
    if pairs.is_empty() {
        return Err(ConnectionStringError::Empty);
    }
    Ok(pairs)
}

fn decode_key(key: &str) -> Result<Vec<u8>, ConnectionStringError> {
    STANDARD
        .decode(key)
        .map_err(|_| ConnectionStringError::InvalidAccountKey)
}

fn endpoint(name: &'static str, value: &str) -> Result<Url, ConnectionStringError> {
    let invalid = || ConnectionStringError::InvalidEndpoint { name, value: value.to_string() };
    let url = Url::parse(value.trim_end_matches('/')).map_err(|_| invalid())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid());
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn azure(raw: &str) -> AzureAccount {
        match StorageConnection::parse(raw).unwrap() {
            StorageConnection::Azure(account) => account,
            other => panic!("expected azure, got {other:?}"),
        }
    }

    #[test]
    fn parses_account_key_connection_string() {
        let account = azure(
            "DefaultEndpointsProtocol=https;AccountName=roachstore;AccountKey=c2VjcmV0;EndpointSuffix=core.windows.net",
        );
        assert_eq!(account.name, "roachstore");
        assert_eq!(account.credential, Credential::SharedKey(b"secret".to_vec()));
        assert_eq!(account.blob_endpoint.as_str(), "https://roachstore.blob.core.windows.net/");
        assert_eq!(account.table_endpoint.as_str(), "https://roachstore.table.core.windows.net/");
    }

    #[test]
    fn keys_are_case_insensitive_and_values_keep_equals() {
        let account = azure("accountname=roach;accountkey=c2VjcmV0a2V5MQ==");
        assert_eq!(account.credential, Credential::SharedKey(b"secretkey1".to_vec()));
    }

    #[test]
    fn parses_sas_with_explicit_endpoints() {
        let account = azure(
            "BlobEndpoint=https://roach.blob.core.windows.net/;TableEndpoint=https://roach.table.core.windows.net/;SharedAccessSignature=?sv=2022-11-02&sig=abc",
        );
        assert_eq!(account.credential, Credential::Sas("sv=2022-11-02&sig=abc".into()));
        assert_eq!(account.name, "");
    }

    #[test]
    fn development_storage_uses_azurite() {
        let account = azure("UseDevelopmentStorage=true");
        assert_eq!(account.name, "devstoreaccount1");
        assert_eq!(account.blob_endpoint.as_str(), "http://127.0.0.1:10000/devstoreaccount1");
        assert_eq!(account.table_endpoint.port(), Some(10002));
    }

    #[test]
    fn parses_local_path() {
        assert_eq!(
            StorageConnection::parse("LocalStoragePath=/var/lib/roachwatch").unwrap(),
            StorageConnection::Local { root: PathBuf::from("/var/lib/roachwatch") }
        );
    }

    #[test]
    fn reports_what_is_wrong() {
        assert_eq!(StorageConnection::parse(""), Err(ConnectionStringError::Empty));
        assert_eq!(
            StorageConnection::parse("AccountName=roach"),
            Err(ConnectionStringError::MissingCredential)
        );
        assert_eq!(
            StorageConnection::parse("AccountKey=c2VjcmV0"),
            Err(ConnectionStringError::MissingAccountName)
        );
        assert_eq!(
            StorageConnection::parse("AccountName=roach;AccountKey=***"),
            Err(ConnectionStringError::InvalidAccountKey)
        );
        assert!(matches!(
            StorageConnection::parse("garbage"),
            Err(ConnectionStringError::MalformedSegment(_))
        ));
    }
}
