use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, ShortstackError};
use crate::types::AggregateSnapshot;

/// The persisted per-tenant aggregate, written on every flush and on worker
/// termination. Survives restarts so a known tenant bootstraps without a
/// corpus scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub total_chunk_count: u64,
    pub total_term_length: u64,
    pub average_document_length: f64,
}

impl From<&AggregateSnapshot> for StatsSnapshot {
    fn from(snap: &AggregateSnapshot) -> Self {
        StatsSnapshot {
            total_chunk_count: snap.total_chunk_count,
            total_term_length: snap.total_term_length,
            average_document_length: snap.average_document_length,
        }
    }
}

/// Durable key-value area with one record per tenant, stored as
/// `{base_path}/{tenant_id}/stats.json`.
#[derive(Debug)]
pub struct SnapshotStore {
    base_path: PathBuf,
}

impl SnapshotStore {
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        SnapshotStore {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    fn path_for(&self, tenant_id: &str) -> PathBuf {
        self.base_path.join(tenant_id).join("stats.json")
    }

    pub fn save(&self, tenant_id: &str, snapshot: &StatsSnapshot) -> Result<()> {
        let path = self.path_for(tenant_id);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(snapshot)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// `Ok(None)` means no record exists for the tenant. A file that exists
    /// but cannot be read or parsed is an error; callers fall back to the
    /// corpus store in that case.
    pub fn load(&self, tenant_id: &str) -> Result<Option<StatsSnapshot>> {
        let path = self.path_for(tenant_id);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(ShortstackError::Snapshot(format!("read {:?}: {}", path, e))),
        };
        let snapshot: StatsSnapshot = serde_json::from_str(&content)
            .map_err(|e| ShortstackError::Snapshot(format!("parse {:?}: {}", path, e)))?;
        Ok(Some(snapshot))
    }
}
