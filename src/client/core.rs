// File: src/client/core.rs
use crate::client::encode::{decode_page, decode_schema, encode_filter, encode_properties};
use crate::client::middleware::{ApiHeadersLayer, ApiHeadersService};
use crate::client::retry::{RetryLayer, RetryService};
use crate::config::Config;
use crate::store::{Properties, RecordFilter, RecordStore, Schema, StoreError, TargetRecord};

use async_trait::async_trait;
use http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use hyper_rustls::HttpsConnectorBuilder;
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use serde_json::{Value, json};
use tower::ServiceExt;
use tower_layer::Layer;

const PAGE_SIZE: usize = 100;

type HttpsClient = Client<hyper_rustls::HttpsConnector<HttpConnector>, String>;
pub(crate) type ApiService = RetryService<ApiHeadersService<HttpsClient>>;

fn transport<E: std::fmt::Display>(e: E) -> StoreError {
    StoreError::Transport(e.to_string())
}

/// Notion database as a [`RecordStore`].
#[derive(Clone)]
pub struct NotionClient {
    http: ApiService,
    api_base: String,
    database_id: String,
    max_retries: usize,
}

impl NotionClient {
    pub fn new(
        api_base: &str,
        token: &str,
        api_version: &str,
        database_id: &str,
        max_retries: usize,
    ) -> Result<Self, StoreError> {
        let api_base = api_base.trim_end_matches('/').to_string();

        let mut root_store = rustls::RootCertStore::empty();
        let result = rustls_native_certs::load_native_certs();
        root_store.add_parsable_certificates(result.certs);
        if root_store.is_empty() {
            if api_base.starts_with("https://") {
                return Err(StoreError::Transport(
                    "No valid system certificates found.".to_string(),
                ));
            }
            log::warn!("No system certificates found; only plain HTTP will work");
        }
        let tls_config = rustls::ClientConfig::builder()
            .with_root_certificates(root_store)
            .with_no_client_auth();

        let https_connector = HttpsConnectorBuilder::new()
            .with_tls_config(tls_config)
            .https_or_http()
            .enable_http1()
            .build();

        let http_client: HttpsClient = Client::builder(TokioExecutor::new()).build(https_connector);
        let headers = ApiHeadersLayer::new(token, api_version)
            .map_err(|e| StoreError::Transport(format!("Invalid API header: {}", e)))?;
        let http = RetryLayer::new(max_retries).layer(headers.layer(http_client));

        Ok(Self {
            http,
            api_base,
            database_id: database_id.to_string(),
            max_retries,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, StoreError> {
        Self::new(
            &config.api_base,
            &config.notion_token,
            &config.api_version,
            &config.database_id,
            config.max_retries,
        )
    }

    pub fn database_id(&self) -> &str {
        &self.database_id
    }

    async fn send(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value, StoreError> {
        let uri = format!("{}{}", self.api_base, path);
        let req = Request::builder()
            .method(method.clone())
            .uri(&uri)
            .body(body.map(|b| b.to_string()).unwrap_or_default())
            .map_err(transport)?;

        let response = self.http.clone().oneshot(req).await.map_err(transport)?;
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .map_err(transport)?
            .to_bytes();
        log::debug!("{} {} -> {}", method, path, status);

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(StoreError::RateLimited(self.max_retries));
        }
        if !status.is_success() {
            let detail: Value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
            return Err(StoreError::Api {
                status: status.as_u16(),
                code: detail
                    .get("code")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown")
                    .to_string(),
                message: detail
                    .get("message")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| String::from_utf8_lossy(&bytes).into_owned()),
            });
        }

        serde_json::from_slice(&bytes)
            .map_err(|e| StoreError::Decode(format!("{} {}: {}", method, path, e)))
    }
}

#[async_trait]
impl RecordStore for NotionClient {
    async fn query(&self, filter: &RecordFilter) -> Result<Vec<TargetRecord>, StoreError> {
        let path = format!("/databases/{}/query", self.database_id);
        let encoded_filter = encode_filter(filter);
        let mut records = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut body = json!({ "page_size": PAGE_SIZE });
            if let Some(f) = &encoded_filter {
                body["filter"] = f.clone();
            }
            if let Some(c) = &cursor {
                body["start_cursor"] = json!(c);
            }

            let page = self.send(Method::POST, &path, Some(body)).await?;
            let results = page
                .get("results")
                .and_then(Value::as_array)
                .ok_or_else(|| StoreError::Decode("query response without results".to_string()))?;
            for result in results {
                records.push(decode_page(result)?);
            }

            let has_more = page.get("has_more").and_then(Value::as_bool).unwrap_or(false);
            cursor = page
                .get("next_cursor")
                .and_then(Value::as_str)
                .map(str::to_string);
            if !has_more || cursor.is_none() {
                break;
            }
        }
        Ok(records)
    }

    async fn create(&self, properties: &Properties) -> Result<TargetRecord, StoreError> {
        let body = json!({
            "parent": { "database_id": self.database_id },
            "properties": encode_properties(properties),
        });
        let page = self.send(Method::POST, "/pages", Some(body)).await?;
        decode_page(&page)
    }

    async fn update(&self, id: &str, properties: &Properties) -> Result<TargetRecord, StoreError> {
        let body = json!({ "properties": encode_properties(properties) });
        let page = self
            .send(Method::PATCH, &format!("/pages/{}", id), Some(body))
            .await?;
        decode_page(&page)
    }

    async fn schema(&self) -> Result<Schema, StoreError> {
        let database = self
            .send(Method::GET, &format!("/databases/{}", self.database_id), None)
            .await?;
        decode_schema(&database)
    }
}
