//! Azure Table Storage adapter (REST `Insert Entity` / `Create Table`).

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{RequestBuilder, StatusCode, Url};
use roachwatch_core::{DetectionEvent, ResultStore, WatchError};
use serde_json::json;
use tracing::{debug, info};

use crate::connection::{AzureAccount, Credential};
use crate::shared_key;

const API_VERSION: &str = "2019-02-02";
const JSON: &str = "application/json";

pub struct AzureTableStore {
    http: reqwest::Client,
    account: Arc<AzureAccount>,
    table: String,
}

impl AzureTableStore {
    pub fn new(http: reqwest::Client, account: Arc<AzureAccount>, table: impl Into<String>) -> Self {
        Self {
            http,
            account,
            table: table.into(),
        }
    }

    fn resource_url(&self, resource: &str) -> Result<Url, WatchError> {
        let raw = format!(
            "{}/{}",
            self.account.table_endpoint.as_str().trim_end_matches('/'),
            resource
        );
        Url::parse(&raw).map_err(|e| WatchError::Table(format!("invalid table URL {raw}: {e}")))
    }

    /// Build an authorised JSON POST.
    fn post(&self, mut url: Url, body: &serde_json::Value) -> RequestBuilder {
        let date = shared_key::rfc1123(Utc::now());

        let authorization = match &self.account.credential {
            Credential::SharedKey(key) => {
                let resource = shared_key::canonical_resource(&self.account.name, &url);
                let to_sign = shared_key::table_string_to_sign("POST", JSON, &date, &resource);
                Some(shared_key::authorization(&self.account.name, &shared_key::sign(key, &to_sign)))
            }
            Credential::Sas(sas) => {
                url.set_query(Some(sas.as_str()));
                None
            }
        };

        let mut req = self
            .http
            .post(url)
            .header("x-ms-date", &date)
            .header("x-ms-version", API_VERSION)
            .header("DataServiceVersion", "3.0;NetFx")
            .header("MaxDataServiceVersion", "3.0;NetFx")
            .header(reqwest::header::ACCEPT, "application/json;odata=nometadata")
            .header("Prefer", "return-no-content")
            .json(body);
        if let Some(auth) = authorization {
            req = req.header(reqwest::header::AUTHORIZATION, auth);
        }
        req
    }
}

/// Table entity body for a detection event.
pub fn entity_body(event: &DetectionEvent) -> serde_json::Value {
    json!({
        "PartitionKey": event.partition_key,
        "RowKey": event.row_key.to_string(),
        "imageUrl": event.image_url,
        "timestamp": event.timestamp_iso(),
        "predictions": event.predictions,
    })
}

#[async_trait]
impl ResultStore for AzureTableStore {
    fn name(&self) -> &str {
        "azure-table"
    }

    async fn prepare(&self) -> Result<(), WatchError> {
        let url = self.resource_url("Tables")?;
        let resp = self
            .post(url, &json!({ "TableName": self.table }))
            .send()
            .await
            .map_err(|e| WatchError::Table(format!("Create Table request failed: {e}")))?;

        match resp.status() {
            s if s.is_success() => {
                info!(table = %self.table, "Created results table");
                Ok(())
            }
            StatusCode::CONFLICT => {
                debug!(table = %self.table, "Results table already exists");
                Ok(())
            }
            status => {
                let body = resp.text().await.unwrap_or_default();
                Err(WatchError::Table(format!("Create Table returned {status}: {body}")))
            }
        }
    }

    async fn append(&self, event: &DetectionEvent) -> Result<(), WatchError> {
        let url = self.resource_url(&self.table)?;
        let resp = self
            .post(url, &entity_body(event))
            .send()
            .await
            .map_err(|e| WatchError::Table(format!("Insert Entity request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(WatchError::Table(format!("Insert Entity returned {status}: {body}")));
        }
        debug!(row_key = %event.row_key, "Inserted detection entity");
        Ok(())
    }
}
