use utoipa::OpenApi;

use crate::dto::{TenantStatsResponse, UpdateTenantStatsRequest};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Shortstack",
        description = "Tenant-scoped corpus statistics aggregator"
    ),
    paths(
        crate::handlers::health::health,
        crate::handlers::stats::update_tenant_stats,
        crate::handlers::stats::get_tenant_stats,
    ),
    components(schemas(UpdateTenantStatsRequest, TenantStatsResponse)),
    tags(
        (name = "tenant-stats", description = "Corpus statistics per tenant"),
        (name = "health", description = "Service health")
    )
)]
pub struct ApiDoc;
