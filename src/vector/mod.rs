//! Client for the external vector index.
//!
//! The index stores one record per chunk: a sparse term-weight vector, an
//! optional dense embedding, and arbitrary metadata owned by the ingestion
//! pipeline. This service only ever rewrites the sparse component; whatever
//! else a record carries must survive an upsert untouched.

pub mod memory;
pub mod remote;

pub use memory::MemoryVectorIndex;
pub use remote::RestVectorIndex;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::Result;

/// Sparse term-weight vector in parallel-array form, sorted by index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SparseVector {
    pub indices: Vec<u32>,
    pub values: Vec<f32>,
}

impl SparseVector {
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// A full record as written to the vector index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorRecord {
    pub id: String,
    pub sparse_indices: Vec<u32>,
    pub sparse_values: Vec<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dense_values: Option<Vec<f32>>,
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

/// The slice of an existing record a reindex pass must preserve.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FetchedRecord {
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dense_values: Option<Vec<f32>>,
}

/// Dispatch enum for vector index backends. Enum dispatch instead of trait
/// objects because async fn in traits is not dyn-safe.
#[derive(Debug)]
pub enum VectorIndexClient {
    Rest(RestVectorIndex),
    Memory(MemoryVectorIndex),
}

impl VectorIndexClient {
    /// Fetch existing records by id within a namespace. Unknown ids are
    /// simply absent from the result map.
    pub async fn fetch(
        &self,
        namespace: &str,
        ids: &[String],
    ) -> Result<HashMap<String, FetchedRecord>> {
        match self {
            VectorIndexClient::Rest(c) => c.fetch(namespace, ids).await,
            VectorIndexClient::Memory(c) => Ok(c.fetch(namespace, ids)),
        }
    }

    /// Insert or replace records wholesale within a namespace.
    pub async fn upsert(&self, namespace: &str, records: Vec<VectorRecord>) -> Result<()> {
        match self {
            VectorIndexClient::Rest(c) => c.upsert(namespace, records).await,
            VectorIndexClient::Memory(c) => {
                c.upsert(namespace, records);
                Ok(())
            }
        }
    }
}
