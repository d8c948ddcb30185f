use dashmap::DashMap;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{oneshot, Mutex, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::StatsConfig;
use crate::corpus::CorpusStore;
use crate::error::Result;
use crate::stats::reindex::Reindexer;
use crate::stats::snapshot::SnapshotStore;
use crate::stats::worker;
use crate::types::{AggregateSnapshot, MutationEvent, MutationOp, TenantId};
use crate::vector::VectorIndexClient;

/// Result of applying one mutation event: the aggregate handed back to the
/// caller, and whether it is a degraded placeholder (bootstrap failed).
#[derive(Debug, Clone)]
pub struct HandledEvent {
    pub snapshot: AggregateSnapshot,
    pub degraded: bool,
}

/// Per-tenant aggregate plus everything the batch worker coordinates on.
/// Every field is guarded by the owning [`TenantCell`]'s mutex.
pub(crate) struct TenantState {
    pub tenant_id: TenantId,
    pub total_chunk_count: u64,
    pub total_term_length: u64,
    pub average_document_length: f64,
    pub last_activity: Instant,
    pub pending: VecDeque<oneshot::Sender<AggregateSnapshot>>,
    pub worker: Option<JoinHandle<()>>,
    bootstrapped: bool,
}

impl TenantState {
    pub(crate) fn new(tenant_id: TenantId) -> Self {
        TenantState {
            tenant_id,
            total_chunk_count: 0,
            total_term_length: 0,
            average_document_length: 1.0,
            last_activity: Instant::now(),
            pending: VecDeque::new(),
            worker: None,
            bootstrapped: false,
        }
    }

    pub fn snapshot(&self) -> AggregateSnapshot {
        AggregateSnapshot {
            tenant_id: self.tenant_id.clone(),
            total_chunk_count: self.total_chunk_count,
            total_term_length: self.total_term_length,
            average_document_length: self.average_document_length,
        }
    }

    fn recompute_average(&mut self) {
        self.average_document_length = if self.total_chunk_count > 0 {
            self.total_term_length as f64 / self.total_chunk_count as f64
        } else {
            1.0
        };
    }

    fn apply(&mut self, event: &MutationEvent) {
        match event.op {
            MutationOp::Add => {
                self.total_chunk_count += event.chunk_delta_count;
                self.total_term_length += event.term_length_delta;
            }
            MutationOp::Remove => {
                if event.chunk_delta_count > self.total_chunk_count
                    || event.term_length_delta > self.total_term_length
                {
                    warn!(
                        tenant_id = %self.tenant_id,
                        chunk_delta = event.chunk_delta_count,
                        length_delta = event.term_length_delta,
                        "removal underflows aggregate, clamping to zero"
                    );
                }
                self.total_chunk_count =
                    self.total_chunk_count.saturating_sub(event.chunk_delta_count);
                self.total_term_length =
                    self.total_term_length.saturating_sub(event.term_length_delta);
            }
        }
        self.recompute_average();
        self.last_activity = Instant::now();
    }
}

/// The unit the registry hands out per tenant: state under a mutex plus the
/// wakeup the request handler rings after enqueueing a completion.
pub(crate) struct TenantCell {
    pub state: Mutex<TenantState>,
    pub wake: Notify,
}

impl TenantCell {
    fn new(tenant_id: TenantId) -> Self {
        TenantCell {
            state: Mutex::new(TenantState::new(tenant_id)),
            wake: Notify::new(),
        }
    }
}

/// Tenant state table and the synchronous entry point for mutation events.
///
/// One `StatsRegistry` per process. It owns one [`TenantCell`] per tenant
/// (created on first sight, held for the process lifetime), the snapshot
/// store, and the reindexer; batch workers are spawned lazily and live in
/// the tenant state they serve.
///
/// # Examples
///
/// ```rust,no_run
/// use shortstack::{CorpusStore, MemoryCorpusStore, MemoryVectorIndex,
///                  StatsConfig, StatsRegistry, VectorIndexClient};
///
/// # async fn run() {
/// let registry = StatsRegistry::new(
///     CorpusStore::Memory(MemoryCorpusStore::new()),
///     VectorIndexClient::Memory(MemoryVectorIndex::new()),
///     "./data",
///     StatsConfig::default(),
/// );
/// # }
/// ```
pub struct StatsRegistry {
    tenants: DashMap<TenantId, Arc<TenantCell>>,
    corpus: Arc<CorpusStore>,
    snapshots: Arc<SnapshotStore>,
    reindexer: Arc<Reindexer>,
    config: StatsConfig,
}

impl StatsRegistry {
    pub fn new<P: AsRef<Path>>(
        corpus: CorpusStore,
        vectors: VectorIndexClient,
        data_dir: P,
        config: StatsConfig,
    ) -> Arc<Self> {
        let corpus = Arc::new(corpus);
        let reindexer = Arc::new(Reindexer::new(
            Arc::clone(&corpus),
            Arc::new(vectors),
            config.reindex_upsert_batch_size,
        ));
        Arc::new(StatsRegistry {
            tenants: DashMap::new(),
            corpus,
            snapshots: Arc::new(SnapshotStore::new(data_dir)),
            reindexer,
            config,
        })
    }

    /// Apply one mutation event and wait for the flush that covers it.
    ///
    /// Blocks (asynchronously) until the tenant's batch worker resolves the
    /// completion — at most roughly the idle timeout. Never fails: a tenant
    /// whose statistics cannot be bootstrapped gets a neutral snapshot
    /// immediately, flagged via [`HandledEvent::degraded`].
    pub async fn handle_event(&self, event: MutationEvent) -> HandledEvent {
        let tenant_id = event.tenant_id.clone();
        let cell = {
            let entry = self
                .tenants
                .entry(tenant_id.clone())
                .or_insert_with(|| Arc::new(TenantCell::new(tenant_id.clone())));
            Arc::clone(entry.value())
        };

        let rx = {
            let mut state = cell.state.lock().await;

            if !state.bootstrapped {
                match self.bootstrap_baseline(&event).await {
                    Ok((chunk_count, term_length)) => {
                        state.total_chunk_count = chunk_count;
                        state.total_term_length = term_length;
                        state.recompute_average();
                        state.bootstrapped = true;
                        debug!(
                            tenant_id = %tenant_id,
                            chunk_count,
                            term_length,
                            "bootstrapped tenant baseline"
                        );
                    }
                    Err(e) => {
                        // Leave the cell unbootstrapped so the next event
                        // retries; this caller gets the neutral aggregate.
                        warn!(
                            tenant_id = %tenant_id,
                            error = %e,
                            "bootstrap failed, returning neutral snapshot"
                        );
                        return HandledEvent {
                            snapshot: AggregateSnapshot::neutral(tenant_id),
                            degraded: true,
                        };
                    }
                }
            }

            state.apply(&event);

            let (tx, rx) = oneshot::channel();
            state.pending.push_back(tx);

            let worker_alive = state
                .worker
                .as_ref()
                .is_some_and(|handle| !handle.is_finished());
            if !worker_alive {
                state.worker = Some(worker::spawn(
                    tenant_id.clone(),
                    Arc::clone(&cell),
                    Arc::clone(&self.snapshots),
                    Arc::clone(&self.reindexer),
                    self.config.clone(),
                ));
            }

            rx
        };

        cell.wake.notify_one();

        match rx.await {
            Ok(snapshot) => HandledEvent {
                snapshot,
                degraded: false,
            },
            Err(_) => {
                // The worker vanished without resolving us (task aborted or
                // panicked). The mutation itself is already applied; serve
                // the current aggregate rather than failing the caller.
                warn!(tenant_id = %event.tenant_id, "flush completion dropped, serving live state");
                let state = cell.state.lock().await;
                HandledEvent {
                    snapshot: state.snapshot(),
                    degraded: false,
                }
            }
        }
    }

    /// Pre-event baseline for a first-touch tenant.
    ///
    /// The snapshot store wins when it has a record: it reflects the last
    /// flush, which by construction predates the in-flight event. A corpus
    /// read instead already contains the event (callers write the store
    /// before calling this service), so it is reconciled back to the
    /// pre-event baseline: applying the event afterwards then lands exactly
    /// on the store's truth.
    async fn bootstrap_baseline(&self, event: &MutationEvent) -> Result<(u64, u64)> {
        match self.snapshots.load(&event.tenant_id) {
            Ok(Some(snapshot)) => {
                return Ok((snapshot.total_chunk_count, snapshot.total_term_length));
            }
            Ok(None) => {}
            Err(e) => {
                warn!(
                    tenant_id = %event.tenant_id,
                    error = %e,
                    "snapshot unreadable, falling back to corpus store"
                );
            }
        }

        let totals = self.corpus.fetch_totals(&event.tenant_id).await?;
        let baseline = match event.op {
            MutationOp::Add => (
                totals.chunk_count.saturating_sub(event.chunk_delta_count),
                totals.term_length.saturating_sub(event.term_length_delta),
            ),
            MutationOp::Remove => (
                totals.chunk_count + event.chunk_delta_count,
                totals.term_length + event.term_length_delta,
            ),
        };
        Ok(baseline)
    }

    /// Current aggregate for a tenant: live state when resident, otherwise
    /// the persisted snapshot. `None` when the tenant is unknown to both.
    pub async fn current(&self, tenant_id: &str) -> Option<AggregateSnapshot> {
        let cell = self.tenants.get(tenant_id).map(|c| Arc::clone(c.value()));
        if let Some(cell) = cell {
            let state = cell.state.lock().await;
            if state.bootstrapped {
                return Some(state.snapshot());
            }
        }

        match self.snapshots.load(tenant_id) {
            Ok(Some(snapshot)) => Some(AggregateSnapshot {
                tenant_id: tenant_id.to_string(),
                total_chunk_count: snapshot.total_chunk_count,
                total_term_length: snapshot.total_term_length,
                average_document_length: snapshot.average_document_length,
            }),
            _ => None,
        }
    }

    /// Number of tenants with in-memory state.
    pub fn resident_tenants(&self) -> usize {
        self.tenants.len()
    }

    /// Number of tenants whose batch worker is currently running.
    pub async fn active_workers(&self) -> usize {
        let cells: Vec<Arc<TenantCell>> = self
            .tenants
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();

        let mut active = 0;
        for cell in cells {
            let state = cell.state.lock().await;
            if state
                .worker
                .as_ref()
                .is_some_and(|handle| !handle.is_finished())
            {
                active += 1;
            }
        }
        active
    }
}
