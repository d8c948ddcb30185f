use shortstack::StatsRegistry;
use std::sync::Arc;

pub mod health;
pub mod stats;

pub struct AppState {
    pub registry: Arc<StatsRegistry>,
    pub start_time: std::time::Instant,
}

pub use health::health;
pub use stats::{get_tenant_stats, update_tenant_stats};
