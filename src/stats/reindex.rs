//! Full reindex of a tenant's term-weight vectors.
//!
//! Launched fire-and-forget on every flush with the avgdl that flush
//! produced. Jobs never surface errors to the request path: every failure is
//! logged and the job moves on to the next batch. Jobs for one tenant are
//! serialized — a second launch while one is running queues behind it, so a
//! fast-bursting tenant never has two passes racing each other's upserts.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::corpus::CorpusStore;
use crate::error::Result;
use crate::stats::weights::Bm25Weights;
use crate::types::{ChunkRow, TenantId};
use crate::vector::{SparseVector, VectorIndexClient, VectorRecord};

pub struct Reindexer {
    corpus: Arc<CorpusStore>,
    vectors: Arc<VectorIndexClient>,
    upsert_batch_size: usize,
    /// Per-tenant serialization gates; jobs hold theirs for their lifetime.
    in_flight: DashMap<TenantId, Arc<Mutex<()>>>,
}

impl Reindexer {
    pub fn new(
        corpus: Arc<CorpusStore>,
        vectors: Arc<VectorIndexClient>,
        upsert_batch_size: usize,
    ) -> Self {
        Reindexer {
            corpus,
            vectors,
            upsert_batch_size: upsert_batch_size.max(1),
            in_flight: DashMap::new(),
        }
    }

    /// Launch a reindex pass in the background. Returns immediately; the
    /// job queues behind any pass already running for the tenant.
    pub fn spawn(self: &Arc<Self>, tenant_id: TenantId, average_document_length: f64) {
        let this = Arc::clone(self);
        tokio::spawn(async move {
            let gate = {
                let entry = this
                    .in_flight
                    .entry(tenant_id.clone())
                    .or_insert_with(|| Arc::new(Mutex::new(())));
                Arc::clone(entry.value())
            };
            let _serialized = gate.lock().await;

            if let Err(e) = this.run(&tenant_id, average_document_length).await {
                warn!("[reindex {}] pass abandoned: {}", tenant_id, e);
            }
        });
    }

    /// One full pass: reweigh every chunk with the given avgdl and push the
    /// vectors to the index in batches, preserving whatever metadata and
    /// dense values the existing records carry.
    pub async fn run(&self, tenant_id: &str, average_document_length: f64) -> Result<()> {
        let rows = self.corpus.fetch_chunks(tenant_id).await?;
        if rows.is_empty() {
            debug!("[reindex {}] corpus empty, nothing to do", tenant_id);
            return Ok(());
        }

        let weights = Bm25Weights::new(average_document_length);
        let reweighed: Vec<(ChunkRow, SparseVector)> = rows
            .into_iter()
            .map(|row| {
                let sparse = weights.weigh(&row.term_frequency_map, row.term_length);
                (row, sparse)
            })
            .collect();

        let total = reweighed.len();
        let mut upserted = 0usize;
        let mut failed_batches = 0usize;

        for batch in reweighed.chunks(self.upsert_batch_size) {
            let ids: Vec<String> = batch.iter().map(|(row, _)| row.chunk_id.clone()).collect();

            let existing = match self.vectors.fetch(tenant_id, &ids).await {
                Ok(existing) => existing,
                Err(e) => {
                    warn!(
                        "[reindex {}] fetch of {} records failed, skipping batch: {}",
                        tenant_id,
                        ids.len(),
                        e
                    );
                    failed_batches += 1;
                    continue;
                }
            };

            let records: Vec<VectorRecord> = batch
                .iter()
                .map(|(row, sparse)| {
                    let prior = existing.get(&row.chunk_id);
                    VectorRecord {
                        id: row.chunk_id.clone(),
                        sparse_indices: sparse.indices.clone(),
                        sparse_values: sparse.values.clone(),
                        dense_values: prior.and_then(|p| p.dense_values.clone()),
                        metadata: prior.map(|p| p.metadata.clone()).unwrap_or_default(),
                    }
                })
                .collect();

            match self.vectors.upsert(tenant_id, records).await {
                Ok(()) => upserted += batch.len(),
                Err(e) => {
                    warn!(
                        "[reindex {}] upsert of {} records failed, skipping batch: {}",
                        tenant_id,
                        batch.len(),
                        e
                    );
                    failed_batches += 1;
                }
            }
        }

        info!(
            "[reindex {}] {} chunks reweighed, {} upserted, {} failed batches, avgdl {:.2}",
            tenant_id, total, upserted, failed_batches, average_document_length
        );
        Ok(())
    }
}
