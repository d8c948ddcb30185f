use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use super::{FetchedRecord, VectorRecord};
use crate::error::{Result, ShortstackError};

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// HTTP client for a hosted vector index exposing batched fetch/upsert.
#[derive(Debug)]
pub struct RestVectorIndex {
    base_url: String,
    http_client: reqwest::Client,
}

#[derive(Serialize)]
struct FetchRequest<'a> {
    namespace: &'a str,
    ids: &'a [String],
}

#[derive(Deserialize)]
struct FetchResponse {
    #[serde(default)]
    records: HashMap<String, FetchedRecord>,
}

#[derive(Serialize)]
struct UpsertRequest<'a> {
    namespace: &'a str,
    records: Vec<VectorRecord>,
}

impl RestVectorIndex {
    pub fn new(base_url: String, api_key: Option<String>) -> Self {
        let mut builder = reqwest::Client::builder().timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS));

        if let Some(key) = api_key {
            let mut headers = reqwest::header::HeaderMap::new();
            if let Ok(value) = reqwest::header::HeaderValue::from_str(&key) {
                headers.insert("Api-Key", value);
                builder = builder.default_headers(headers);
            } else {
                tracing::warn!("SHORTSTACK_VECTOR_API_KEY is not a valid header value, ignoring");
            }
        }

        let http_client = builder.build().unwrap_or_else(|_| reqwest::Client::new());

        Self {
            base_url,
            http_client,
        }
    }

    pub async fn fetch(
        &self,
        namespace: &str,
        ids: &[String],
    ) -> Result<HashMap<String, FetchedRecord>> {
        let url = format!("{}/vectors/fetch", self.base_url);

        let response = self
            .http_client
            .post(&url)
            .json(&FetchRequest { namespace, ids })
            .send()
            .await
            .map_err(|e| ShortstackError::VectorIndex(format!("fetch request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(ShortstackError::VectorIndex(format!(
                "fetch returned {} for namespace {}",
                response.status(),
                namespace
            )));
        }

        let body: FetchResponse = response
            .json()
            .await
            .map_err(|e| ShortstackError::VectorIndex(format!("fetch response parse: {}", e)))?;

        Ok(body.records)
    }

    pub async fn upsert(&self, namespace: &str, records: Vec<VectorRecord>) -> Result<()> {
        let url = format!("{}/vectors/upsert", self.base_url);

        let response = self
            .http_client
            .post(&url)
            .json(&UpsertRequest { namespace, records })
            .send()
            .await
            .map_err(|e| ShortstackError::VectorIndex(format!("upsert request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(ShortstackError::VectorIndex(format!(
                "upsert returned {} for namespace {}",
                response.status(),
                namespace
            )));
        }

        Ok(())
    }
}
