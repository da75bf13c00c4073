//! Azure Blob Storage adapter (REST `Put Blob` / `Create Container`).

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use reqwest::{Method, RequestBuilder, StatusCode, Url};
use roachwatch_core::{BlobStore, WatchError};
use roachwatch_media::{is_image, sniff_image_type};
use tracing::{debug, info, warn};

use crate::connection::{AzureAccount, Credential};
use crate::shared_key;

const API_VERSION: &str = "2021-08-06";

pub struct AzureBlobStore {
    http: reqwest::Client,
    account: Arc<AzureAccount>,
    container: String,
}

impl AzureBlobStore {
    pub fn new(http: reqwest::Client, account: Arc<AzureAccount>, container: impl Into<String>) -> Self {
        Self {
            http,
            account,
            container: container.into(),
        }
    }

    /// Public URL of a blob in this container (never carries the SAS).
    pub fn blob_url(&self, blob_name: &str) -> Result<Url, WatchError> {
        let raw = format!(
            "{}/{}/{}",
            self.account.blob_endpoint.as_str().trim_end_matches('/'),
            self.container,
            blob_name
        );
        Url::parse(&raw).map_err(|e| WatchError::Blob(format!("invalid blob URL {raw}: {e}")))
    }

    fn container_url(&self) -> Result<Url, WatchError> {
        let raw = format!(
            "{}/{}?restype=container",
            self.account.blob_endpoint.as_str().trim_end_matches('/'),
            self.container
        );
        Url::parse(&raw).map_err(|e| WatchError::Blob(format!("invalid container URL {raw}: {e}")))
    }

    /// Build an authorised request; query parameters already on `url` are signed too.
    fn request(
        &self,
        method: Method,
        mut url: Url,
        content_type: &str,
        body: Bytes,
        extra_ms_headers: &[(&str, &str)],
    ) -> RequestBuilder {
        let date = shared_key::rfc1123(Utc::now());
        let mut ms_headers: Vec<(&str, &str)> = vec![("x-ms-date", date.as_str()), ("x-ms-version", API_VERSION)];
        ms_headers.extend_from_slice(extra_ms_headers);

        let authorization = match &self.account.credential {
            Credential::SharedKey(key) => {
                let resource = shared_key::blob_canonical_resource(&self.account.name, &url);
                let to_sign = shared_key::blob_string_to_sign(
                    method.as_str(),
                    body.len(),
                    content_type,
                    &ms_headers,
                    &resource,
                );
                Some(shared_key::authorization(&self.account.name, &shared_key::sign(key, &to_sign)))
            }
            Credential::Sas(sas) => {
                let query = match url.query() {
                    Some(existing) => format!("{existing}&{sas}"),
                    None => sas.clone(),
                };
                url.set_query(Some(&query));
                None
            }
        };

        let mut req = self.http.request(method, url);
        for (name, value) in &ms_headers {
            req = req.header(*name, *value);
        }
        if !content_type.is_empty() {
            req = req.header(reqwest::header::CONTENT_TYPE, content_type);
        }
        if let Some(auth) = authorization {
            req = req.header(reqwest::header::AUTHORIZATION, auth);
        }
        req.body(body)
    }
}

#[async_trait]
impl BlobStore for AzureBlobStore {
    fn name(&self) -> &str {
        "azure-blob"
    }

    async fn prepare(&self) -> Result<(), WatchError> {
        let url = self.container_url()?;
        let resp = self
            .request(Method::PUT, url, "", Bytes::new(), &[])
            .send()
            .await
            .map_err(|e| WatchError::Blob(format!("Create Container request failed: {e}")))?;

        match resp.status() {
            s if s.is_success() => {
                info!(container = %self.container, "Created blob container");
                Ok(())
            }
            StatusCode::CONFLICT => {
                debug!(container = %self.container, "Blob container already exists");
                Ok(())
            }
            status => {
                let body = resp.text().await.unwrap_or_default();
                Err(WatchError::Blob(format!("Create Container returned {status}: {body}")))
            }
        }
    }

    async fn upload(&self, blob_name: &str, data: Bytes) -> Result<String, WatchError> {
        let url = self.blob_url(blob_name)?;
        let content_type = sniff_image_type(&data);
        if !is_image(content_type) {
            warn!(blob = blob_name, "Upload is not a recognised image format; storing as binary");
        }
        debug!(url = %url, size = data.len(), content_type, "Putting block blob");

        let resp = self
            .request(
                Method::PUT,
                url.clone(),
                content_type,
                data,
                &[("x-ms-blob-type", "BlockBlob")],
            )
            .send()
            .await
            .map_err(|e| WatchError::Blob(format!("Put Blob request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(WatchError::Blob(format!("Put Blob returned {status}: {body}")));
        }
        Ok(url.to_string())
    }
}
