use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use super::AppState;
use crate::dto::{TenantStatsResponse, UpdateTenantStatsRequest};
use shortstack::{MutationEvent, MutationOp, ShortstackError};

fn parse_operation(operation: &str) -> Result<MutationOp, ShortstackError> {
    match operation {
        "ADD" => Ok(MutationOp::Add),
        // The aggregator calls it REMOVE; the ingestion pipeline says DELETE.
        "DELETE" | "REMOVE" => Ok(MutationOp::Remove),
        other => Err(ShortstackError::InvalidOperation(other.to_string())),
    }
}

/// Apply one corpus mutation and wait for the flush covering it.
///
/// Internal reconciliation problems never surface as 5xx: a tenant whose
/// statistics cannot be bootstrapped still gets a 200 with neutral values
/// and an explanatory message. Only malformed input is rejected.
#[utoipa::path(
    post,
    path = "/tenant-stats/update",
    tag = "tenant-stats",
    request_body = UpdateTenantStatsRequest,
    responses(
        (status = 200, description = "Aggregate after the flush covering this event", body = TenantStatsResponse),
        (status = 400, description = "Malformed tenant id or operation")
    )
)]
pub async fn update_tenant_stats(
    State(state): State<Arc<AppState>>,
    Json(req): Json<UpdateTenantStatsRequest>,
) -> Result<Json<TenantStatsResponse>, ShortstackError> {
    if req.tenant_id.trim().is_empty() {
        return Err(ShortstackError::InvalidRequest(
            "tenant_id must not be empty".to_string(),
        ));
    }
    let op = parse_operation(&req.operation)?;

    let event = MutationEvent {
        tenant_id: req.tenant_id,
        source_id: req.source_id,
        chunk_delta_count: req.chunk_delta_count,
        term_length_delta: req.term_length_delta,
        op,
    };

    let handled = state.registry.handle_event(event).await;
    let message = if handled.degraded {
        "corpus statistics unavailable; returning neutral defaults"
    } else {
        "aggregate flushed"
    };

    Ok(Json(TenantStatsResponse::from_snapshot(
        handled.snapshot,
        message,
    )))
}

/// Read-only view of a tenant's current aggregate.
#[utoipa::path(
    get,
    path = "/tenant-stats/{tenant_id}",
    tag = "tenant-stats",
    params(("tenant_id" = String, Path, description = "Tenant identifier")),
    responses(
        (status = 200, description = "Current aggregate", body = TenantStatsResponse),
        (status = 404, description = "Tenant unknown to memory and snapshot store")
    )
)]
pub async fn get_tenant_stats(
    State(state): State<Arc<AppState>>,
    Path(tenant_id): Path<String>,
) -> Result<Json<TenantStatsResponse>, ShortstackError> {
    match state.registry.current(&tenant_id).await {
        Some(snapshot) => Ok(Json(TenantStatsResponse::from_snapshot(snapshot, "ok"))),
        None => Err(ShortstackError::TenantNotFound(tenant_id)),
    }
}
