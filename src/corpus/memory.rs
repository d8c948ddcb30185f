use dashmap::DashMap;
use std::sync::Arc;

use crate::types::{ChunkRow, CorpusTotals, TenantId};

/// In-process corpus store keyed by tenant.
///
/// Backs local development when no `SHORTSTACK_CORPUS_URL` is configured,
/// and the test suites. Clones share the same underlying map.
#[derive(Debug, Clone, Default)]
pub struct MemoryCorpusStore {
    rows: Arc<DashMap<TenantId, Vec<ChunkRow>>>,
}

impl MemoryCorpusStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fetch_chunks(&self, tenant_id: &str) -> Vec<ChunkRow> {
        self.rows
            .get(tenant_id)
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    pub fn fetch_totals(&self, tenant_id: &str) -> CorpusTotals {
        self.rows.get(tenant_id).map_or(CorpusTotals::default(), |rows| {
            CorpusTotals {
                chunk_count: rows.len() as u64,
                term_length: rows.iter().map(|r| r.term_length).sum(),
            }
        })
    }

    /// Replace a tenant's rows wholesale. Test/seed hook.
    pub fn set_chunks(&self, tenant_id: &str, chunks: Vec<ChunkRow>) {
        self.rows.insert(tenant_id.to_string(), chunks);
    }

    pub fn push_chunk(&self, tenant_id: &str, chunk: ChunkRow) {
        self.rows
            .entry(tenant_id.to_string())
            .or_default()
            .push(chunk);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn chunk(id: &str, len: u64) -> ChunkRow {
        ChunkRow {
            source_id: "src-1".to_string(),
            chunk_id: id.to_string(),
            term_frequency_map: HashMap::from([("invoice".to_string(), 2)]),
            term_length: len,
        }
    }

    #[test]
    fn totals_derive_from_rows() {
        let store = MemoryCorpusStore::new();
        store.set_chunks("t1", vec![chunk("c1", 100), chunk("c2", 250)]);

        let totals = store.fetch_totals("t1");
        assert_eq!(totals.chunk_count, 2);
        assert_eq!(totals.term_length, 350);
    }

    #[test]
    fn unknown_tenant_reads_empty() {
        let store = MemoryCorpusStore::new();
        assert!(store.fetch_chunks("nobody").is_empty());
        assert_eq!(store.fetch_totals("nobody"), CorpusTotals::default());
    }
}
