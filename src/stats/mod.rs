//! Tenant-scoped corpus statistics: the registry that applies mutation
//! events, the per-tenant batch workers that flush them, the snapshot store
//! that persists the aggregate, and the reindex jobs that push refreshed
//! term weights to the vector index.

pub mod registry;
pub mod reindex;
pub mod snapshot;
pub mod weights;
pub(crate) mod worker;

pub use registry::{HandledEvent, StatsRegistry};
pub use reindex::Reindexer;
pub use snapshot::{SnapshotStore, StatsSnapshot};
pub use weights::Bm25Weights;
