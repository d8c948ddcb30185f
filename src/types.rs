use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Tenant (organization) identifier — a plain string like `"acme"`.
pub type TenantId = String;

/// Direction of a corpus mutation.
///
/// Deltas in a [`MutationEvent`] are always non-negative magnitudes; the
/// operation determines the sign they are applied with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MutationOp {
    Add,
    /// Accepts `"DELETE"` on the wire as an alias (the inbound API's spelling).
    #[serde(alias = "DELETE")]
    Remove,
}

/// One incremental change to a tenant's searchable corpus: chunks were added
/// to or removed from the sources backing that tenant's index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MutationEvent {
    pub tenant_id: TenantId,
    pub source_id: String,
    pub chunk_delta_count: u64,
    pub term_length_delta: u64,
    pub op: MutationOp,
}

/// The aggregate a caller receives once its event has been flushed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateSnapshot {
    pub tenant_id: TenantId,
    pub total_chunk_count: u64,
    pub total_term_length: u64,
    pub average_document_length: f64,
}

impl AggregateSnapshot {
    /// Neutral placeholder returned when a tenant's statistics cannot be
    /// bootstrapped. `average_document_length` of 1 keeps downstream BM25
    /// weighting well-defined.
    pub fn neutral(tenant_id: impl Into<TenantId>) -> Self {
        AggregateSnapshot {
            tenant_id: tenant_id.into(),
            total_chunk_count: 0,
            total_term_length: 0,
            average_document_length: 1.0,
        }
    }
}

/// One indexed chunk as read from the durable corpus store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkRow {
    pub source_id: String,
    pub chunk_id: String,
    pub term_frequency_map: HashMap<String, u32>,
    pub term_length: u64,
}

/// Aggregate counts for a tenant as read from the durable corpus store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusTotals {
    pub chunk_count: u64,
    pub term_length: u64,
}
