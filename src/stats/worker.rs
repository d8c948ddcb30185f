//! Per-tenant batch worker.
//!
//! One worker task runs per tenant at a time. It waits for wakeups from the
//! request handler and flushes pending completions on two triggers:
//!
//! - **batch**: pending count reached `batch_size` — resolve exactly that
//!   many (FIFO), persist the snapshot, launch a reindex, keep running;
//! - **idle**: no mutation for `idle_timeout` — resolve everything left,
//!   persist, launch a reindex, and terminate so idle tenants cost nothing.
//!
//! When both hold at once the idle path wins: it is the superset behavior.
//! The next event for a terminated tenant spawns a fresh worker.

use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::StatsConfig;
use crate::stats::registry::{TenantCell, TenantState};
use crate::stats::reindex::Reindexer;
use crate::stats::snapshot::{SnapshotStore, StatsSnapshot};
use crate::types::TenantId;

pub(crate) fn spawn(
    tenant_id: TenantId,
    cell: Arc<TenantCell>,
    snapshots: Arc<SnapshotStore>,
    reindexer: Arc<Reindexer>,
    config: StatsConfig,
) -> JoinHandle<()> {
    tokio::spawn(run(tenant_id, cell, snapshots, reindexer, config))
}

async fn run(
    tenant_id: TenantId,
    cell: Arc<TenantCell>,
    snapshots: Arc<SnapshotStore>,
    reindexer: Arc<Reindexer>,
    config: StatsConfig,
) {
    debug!("[stats {}] worker started", tenant_id);

    loop {
        let idle_deadline = {
            let state = cell.state.lock().await;
            state.last_activity + config.idle_timeout
        };

        // biased: when a wakeup and the idle deadline race, the idle drain
        // wins (it is the superset behavior and terminates the worker).
        tokio::select! {
            biased;
            _ = tokio::time::sleep_until(tokio::time::Instant::from_std(idle_deadline)) => {
                let mut state = cell.state.lock().await;
                if state.last_activity.elapsed() >= config.idle_timeout {
                    let remaining = state.pending.len();
                    flush(&mut state, remaining, &snapshots, &reindexer);
                    state.worker = None;
                    debug!(
                        "[stats {}] idle after draining {} completions, worker terminated",
                        tenant_id, remaining
                    );
                    return;
                }
                // A mutation landed while we slept; the deadline moved.
            }
            _ = cell.wake.notified() => {
                // Drain every full batch that accumulated; partial batches
                // ride along to the next wakeup or the idle drain.
                loop {
                    let mut state = cell.state.lock().await;
                    if state.pending.len() < config.batch_size {
                        break;
                    }
                    flush(&mut state, config.batch_size, &snapshots, &reindexer);
                }
            }
        }
    }
}

/// Resolve up to `resolve` pending completions (FIFO) with the current
/// aggregate, persist it, and launch a reindex job. A failed snapshot write
/// is logged and never blocks the flush; the next one overwrites it.
fn flush(
    state: &mut TenantState,
    resolve: usize,
    snapshots: &SnapshotStore,
    reindexer: &Arc<Reindexer>,
) {
    let snapshot = state.snapshot();

    let resolve = resolve.min(state.pending.len());
    for completion in state.pending.drain(..resolve) {
        // A caller that gave up waiting is not an error.
        let _ = completion.send(snapshot.clone());
    }

    if let Err(e) = snapshots.save(&state.tenant_id, &StatsSnapshot::from(&snapshot)) {
        warn!("[stats {}] snapshot save failed: {}", state.tenant_id, e);
    }

    reindexer.spawn(state.tenant_id.clone(), snapshot.average_document_length);

    debug!(
        "[stats {}] flushed {} completions, avgdl {:.2}",
        state.tenant_id, resolve, snapshot.average_document_length
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StatsConfig;
    use crate::corpus::{CorpusStore, MemoryCorpusStore};
    use crate::stats::registry::StatsRegistry;
    use crate::types::{MutationEvent, MutationOp};
    use crate::vector::{MemoryVectorIndex, VectorIndexClient};
    use std::time::Duration;
    use tempfile::TempDir;
    use tokio::sync::oneshot;

    fn event(tenant: &str, chunks: u64, length: u64) -> MutationEvent {
        MutationEvent {
            tenant_id: tenant.to_string(),
            source_id: "src-1".to_string(),
            chunk_delta_count: chunks,
            term_length_delta: length,
            op: MutationOp::Add,
        }
    }

    fn registry(tmp: &TempDir, batch_size: usize, idle: Duration) -> Arc<StatsRegistry> {
        StatsRegistry::new(
            CorpusStore::Memory(MemoryCorpusStore::new()),
            VectorIndexClient::Memory(MemoryVectorIndex::new()),
            tmp.path(),
            StatsConfig {
                idle_timeout: idle,
                batch_size,
                reindex_upsert_batch_size: 100,
            },
        )
    }

    #[tokio::test]
    async fn full_batch_flushes_without_waiting_for_idle() {
        let tmp = TempDir::new().unwrap();
        // Idle timeout far beyond the test timeout: only the batch trigger
        // can resolve these.
        let registry = registry(&tmp, 3, Duration::from_secs(60));

        let mut handles = Vec::new();
        for _ in 0..3 {
            let registry = Arc::clone(&registry);
            handles.push(tokio::spawn(async move {
                registry.handle_event(event("t1", 1, 10)).await
            }));
        }

        for handle in handles {
            let result = tokio::time::timeout(Duration::from_secs(5), handle)
                .await
                .expect("batch flush must not wait for the idle timeout")
                .unwrap();
            assert_eq!(result.snapshot.total_chunk_count, 3);
            assert_eq!(result.snapshot.total_term_length, 30);
        }
    }

    #[tokio::test]
    async fn idle_drain_resolves_partial_batch_and_terminates_worker() {
        let tmp = TempDir::new().unwrap();
        let registry = registry(&tmp, 100, Duration::from_millis(150));

        let a = Arc::clone(&registry);
        let b = Arc::clone(&registry);
        let (ra, rb) = tokio::join!(
            a.handle_event(event("t1", 1, 10)),
            b.handle_event(event("t1", 1, 10)),
        );
        assert_eq!(ra.snapshot.total_chunk_count, 2);
        assert_eq!(rb.snapshot.total_chunk_count, 2);

        // The drain terminated the worker.
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(registry.active_workers().await, 0);

        // The next event spawns a fresh worker and is served correctly.
        let rc = registry.handle_event(event("t1", 1, 10)).await;
        assert_eq!(rc.snapshot.total_chunk_count, 3);
        assert_eq!(rc.snapshot.total_term_length, 30);
    }

    #[tokio::test]
    async fn leftover_pending_rides_to_a_later_flush() {
        let tmp = TempDir::new().unwrap();
        let registry = registry(&tmp, 2, Duration::from_millis(200));

        let mut handles = Vec::new();
        for _ in 0..3 {
            let registry = Arc::clone(&registry);
            handles.push(tokio::spawn(async move {
                registry.handle_event(event("t1", 1, 10)).await
            }));
        }

        // All three resolve: two via the batch trigger, the odd one via a
        // later batch or the idle drain.
        for handle in handles {
            let result = tokio::time::timeout(Duration::from_secs(5), handle)
                .await
                .unwrap()
                .unwrap();
            assert!(result.snapshot.total_chunk_count <= 3);
        }

        let current = registry.current("t1").await.unwrap();
        assert_eq!(current.total_chunk_count, 3);
    }

    #[tokio::test]
    async fn flush_resolves_fifo_and_leaves_the_rest_queued() {
        let tmp = TempDir::new().unwrap();
        let reindexer = Arc::new(Reindexer::new(
            Arc::new(CorpusStore::Memory(MemoryCorpusStore::new())),
            Arc::new(VectorIndexClient::Memory(MemoryVectorIndex::new())),
            100,
        ));
        let snapshots = SnapshotStore::new(tmp.path());

        let mut state = TenantState::new("t1".to_string());
        let (tx1, rx1) = oneshot::channel();
        let (tx2, rx2) = oneshot::channel();
        let (tx3, mut rx3) = oneshot::channel();
        state.pending.push_back(tx1);
        state.pending.push_back(tx2);
        state.pending.push_back(tx3);

        flush(&mut state, 2, &snapshots, &reindexer);

        assert!(rx1.await.is_ok());
        assert!(rx2.await.is_ok());
        assert!(rx3.try_recv().is_err(), "third completion must stay queued");
        assert_eq!(state.pending.len(), 1);
    }

    #[tokio::test]
    async fn failed_snapshot_save_does_not_block_the_flush() {
        let tmp = TempDir::new().unwrap();
        // Occupy the tenant's directory slot with a plain file so the
        // snapshot write cannot create it.
        std::fs::write(tmp.path().join("t1"), "not a directory").unwrap();

        let reindexer = Arc::new(Reindexer::new(
            Arc::new(CorpusStore::Memory(MemoryCorpusStore::new())),
            Arc::new(VectorIndexClient::Memory(MemoryVectorIndex::new())),
            100,
        ));
        let snapshots = SnapshotStore::new(tmp.path());

        let mut state = TenantState::new("t1".to_string());
        let (tx, rx) = oneshot::channel();
        state.pending.push_back(tx);

        flush(&mut state, 1, &snapshots, &reindexer);

        assert!(rx.await.is_ok(), "completion resolves despite the failed save");
    }
}
