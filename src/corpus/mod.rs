//! Read-only client for the durable corpus store.
//!
//! The store is the system of record for indexed chunks; this service reads
//! it at tenant bootstrap (aggregate totals) and during reindex passes (the
//! full chunk listing, archived rows already filtered out server-side).

pub mod memory;
pub mod remote;

pub use memory::MemoryCorpusStore;
pub use remote::RestCorpusStore;

use crate::error::Result;
use crate::types::{ChunkRow, CorpusTotals};

/// Dispatch enum for corpus store backends. Enum dispatch instead of trait
/// objects because async fn in traits is not dyn-safe.
#[derive(Debug)]
pub enum CorpusStore {
    Rest(RestCorpusStore),
    Memory(MemoryCorpusStore),
}

impl CorpusStore {
    /// All non-archived chunk rows for a tenant. An unknown tenant is an
    /// empty corpus, not an error.
    pub async fn fetch_chunks(&self, tenant_id: &str) -> Result<Vec<ChunkRow>> {
        match self {
            CorpusStore::Rest(c) => c.fetch_chunks(tenant_id).await,
            CorpusStore::Memory(c) => Ok(c.fetch_chunks(tenant_id)),
        }
    }

    /// Aggregate chunk count and summed term length for a tenant.
    pub async fn fetch_totals(&self, tenant_id: &str) -> Result<CorpusTotals> {
        match self {
            CorpusStore::Rest(c) => c.fetch_totals(tenant_id).await,
            CorpusStore::Memory(c) => Ok(c.fetch_totals(tenant_id)),
        }
    }
}
