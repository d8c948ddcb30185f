use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;

use super::{FetchedRecord, VectorRecord};

/// In-process vector index: namespace -> record id -> record.
///
/// Backs local development when no `SHORTSTACK_VECTOR_URL` is configured,
/// and the test suites. Clones share the same underlying maps.
#[derive(Debug, Clone, Default)]
pub struct MemoryVectorIndex {
    namespaces: Arc<DashMap<String, DashMap<String, VectorRecord>>>,
}

impl MemoryVectorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fetch(&self, namespace: &str, ids: &[String]) -> HashMap<String, FetchedRecord> {
        let mut out = HashMap::new();
        if let Some(records) = self.namespaces.get(namespace) {
            for id in ids {
                if let Some(rec) = records.get(id) {
                    out.insert(
                        id.clone(),
                        FetchedRecord {
                            metadata: rec.metadata.clone(),
                            dense_values: rec.dense_values.clone(),
                        },
                    );
                }
            }
        }
        out
    }

    pub fn upsert(&self, namespace: &str, records: Vec<VectorRecord>) {
        let ns = self
            .namespaces
            .entry(namespace.to_string())
            .or_insert_with(DashMap::new);
        for record in records {
            ns.insert(record.id.clone(), record);
        }
    }

    /// Current record for an id, if any. Test hook.
    pub fn get(&self, namespace: &str, id: &str) -> Option<VectorRecord> {
        self.namespaces
            .get(namespace)?
            .get(id)
            .map(|r| r.clone())
    }

    pub fn len(&self, namespace: &str) -> usize {
        self.namespaces.get(namespace).map_or(0, |ns| ns.len())
    }

    pub fn is_empty(&self, namespace: &str) -> bool {
        self.len(namespace) == 0
    }
}
