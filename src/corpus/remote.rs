use serde::Deserialize;
use std::time::Duration;

use crate::error::{Result, ShortstackError};
use crate::types::{ChunkRow, CorpusTotals};

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// HTTP client for the durable corpus store's read endpoints.
#[derive(Debug)]
pub struct RestCorpusStore {
    base_url: String,
    http_client: reqwest::Client,
}

#[derive(Deserialize)]
struct ChunksResponse {
    #[serde(default)]
    chunks: Vec<ChunkRow>,
}

impl RestCorpusStore {
    pub fn new(base_url: String) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            base_url,
            http_client,
        }
    }

    pub async fn fetch_chunks(&self, tenant_id: &str) -> Result<Vec<ChunkRow>> {
        let url = format!("{}/tenants/{}/chunks", self.base_url, tenant_id);

        let response = self.http_client.get(&url).send().await.map_err(|e| {
            ShortstackError::CorpusStore(format!("chunk listing request failed: {}", e))
        })?;

        if !response.status().is_success() {
            return Err(ShortstackError::CorpusStore(format!(
                "chunk listing returned {} for tenant {}",
                response.status(),
                tenant_id
            )));
        }

        let body: ChunksResponse = response.json().await.map_err(|e| {
            ShortstackError::CorpusStore(format!("chunk listing parse: {}", e))
        })?;

        Ok(body.chunks)
    }

    pub async fn fetch_totals(&self, tenant_id: &str) -> Result<CorpusTotals> {
        let url = format!("{}/tenants/{}/totals", self.base_url, tenant_id);

        let response = self.http_client.get(&url).send().await.map_err(|e| {
            ShortstackError::CorpusStore(format!("totals request failed: {}", e))
        })?;

        if !response.status().is_success() {
            return Err(ShortstackError::CorpusStore(format!(
                "totals returned {} for tenant {}",
                response.status(),
                tenant_id
            )));
        }

        let totals: CorpusTotals = response
            .json()
            .await
            .map_err(|e| ShortstackError::CorpusStore(format!("totals parse: {}", e)))?;

        Ok(totals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn fetch_totals_parses_counts() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tenants/t1/totals"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"chunk_count": 5, "term_length": 500})),
            )
            .mount(&server)
            .await;

        let client = RestCorpusStore::new(server.uri());
        let totals = client.fetch_totals("t1").await.unwrap();
        assert_eq!(totals.chunk_count, 5);
        assert_eq!(totals.term_length, 500);
    }

    #[tokio::test]
    async fn fetch_chunks_parses_rows() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tenants/t1/chunks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "chunks": [{
                    "source_id": "src-1",
                    "chunk_id": "c1",
                    "term_frequency_map": {"invoice": 3},
                    "term_length": 120
                }]
            })))
            .mount(&server)
            .await;

        let client = RestCorpusStore::new(server.uri());
        let chunks = client.fetch_chunks("t1").await.unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].chunk_id, "c1");
        assert_eq!(chunks[0].term_frequency_map["invoice"], 3);
    }

    #[tokio::test]
    async fn server_error_maps_to_corpus_store_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tenants/t1/totals"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = RestCorpusStore::new(server.uri());
        let err = client.fetch_totals("t1").await.unwrap_err();
        assert!(matches!(err, ShortstackError::CorpusStore(_)));
    }
}
