use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use shortstack::AggregateSnapshot;

/// Body of `POST /tenant-stats/update`.
///
/// `operation` is validated by the handler (not serde) so invalid values
/// produce a structured 400 rather than a deserialization rejection.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateTenantStatsRequest {
    pub tenant_id: String,
    pub source_id: String,
    #[serde(default)]
    pub chunk_delta_count: u64,
    #[serde(default)]
    pub term_length_delta: u64,
    pub operation: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TenantStatsResponse {
    pub tenant_id: String,
    pub total_chunk_count: u64,
    pub total_term_length: u64,
    pub average_document_length: f64,
    pub message: String,
}

impl TenantStatsResponse {
    pub fn from_snapshot(snapshot: AggregateSnapshot, message: impl Into<String>) -> Self {
        TenantStatsResponse {
            tenant_id: snapshot.tenant_id,
            total_chunk_count: snapshot.total_chunk_count,
            total_term_length: snapshot.total_term_length,
            average_document_length: snapshot.average_document_length,
            message: message.into(),
        }
    }
}
