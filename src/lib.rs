//! Shortstack — tenant-scoped corpus statistics for BM25 weighting.
//!
//! Maintains an approximate, eventually-consistent aggregate per tenant
//! (chunk count, summed term length, average document length) under a
//! stream of concurrent mutation events, resolves callers in debounced
//! batches, persists a per-tenant snapshot on every flush, and triggers a
//! serialized background reindex of the tenant's sparse term-weight
//! vectors against an external vector index.
//!
//! The aggregate is a best-effort scoring statistic, not a source of
//! truth: the durable corpus store remains authoritative, and every flush
//! converges the in-memory state back onto what a fresh read of that store
//! would produce.

pub mod config;
pub mod corpus;
pub mod error;
pub mod stats;
pub mod types;
pub mod vector;

pub use config::StatsConfig;
pub use corpus::{CorpusStore, MemoryCorpusStore, RestCorpusStore};
pub use error::{Result, ShortstackError};
pub use stats::{Bm25Weights, HandledEvent, SnapshotStore, StatsRegistry, StatsSnapshot};
pub use types::{AggregateSnapshot, ChunkRow, CorpusTotals, MutationEvent, MutationOp, TenantId};
pub use vector::{
    FetchedRecord, MemoryVectorIndex, RestVectorIndex, SparseVector, VectorIndexClient,
    VectorRecord,
};
