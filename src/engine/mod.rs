mod conflict;
mod error;
mod mutations;
mod queries;
pub mod store;

pub use conflict::find_conflict;
pub use error::EngineError;

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{OwnedRwLockWriteGuard, mpsc, oneshot};
use tracing::info;

use crate::catalog::Catalog;
use crate::model::*;
use crate::observability;
use crate::wal::Wal;

use store::{BookingStore, SharedBookings};

// ── Group-commit WAL channel ─────────────────────────────

pub(super) enum WalCommand {
    Append {
        event: Event,
        response: oneshot::Sender<io::Result<()>>,
    },
    Compact {
        events: Vec<Event>,
        response: oneshot::Sender<io::Result<()>>,
    },
    AppendsSinceCompact {
        response: oneshot::Sender<u64>,
    },
}

/// Background task that owns the WAL and batches appends for group commit.
/// 1. Block until the first Append arrives.
/// 2. Buffer it (no fsync).
/// 3. Drain all immediately available Appends (the batch window).
/// 4. Single flush_sync for the whole batch.
/// 5. Respond to all senders.
async fn wal_writer_loop(mut wal: Wal, mut rx: mpsc::Receiver<WalCommand>) {
    while let Some(cmd) = rx.recv().await {
        match cmd {
            WalCommand::Append { event, response } => {
                let mut batch = vec![(event, response)];
                let mut deferred = None;

                loop {
                    match rx.try_recv() {
                        Ok(WalCommand::Append { event, response }) => batch.push((event, response)),
                        Ok(other) => {
                            deferred = Some(other);
                            break;
                        }
                        Err(_) => break, // channel empty, flush batch
                    }
                }

                commit_batch(&mut wal, &mut batch);
                // Non-append commands run after the batch they interrupted.
                if let Some(other) = deferred {
                    handle_non_append(&mut wal, other);
                }
            }
            other => handle_non_append(&mut wal, other),
        }
    }
}

fn commit_batch(wal: &mut Wal, batch: &mut Vec<(Event, oneshot::Sender<io::Result<()>>)>) {
    metrics::histogram!(observability::WAL_FLUSH_BATCH_SIZE).record(batch.len() as f64);
    let flush_start = Instant::now();
    let result = flush_batch(wal, batch);
    metrics::histogram!(observability::WAL_FLUSH_DURATION_SECONDS)
        .record(flush_start.elapsed().as_secs_f64());
    if let Err(e) = &result {
        tracing::error!("WAL flush failed for batch of {}: {e}", batch.len());
    }
    for (_, tx) in batch.drain(..) {
        let r = match &result {
            Ok(()) => Ok(()),
            Err(e) => Err(io::Error::new(e.kind(), e.to_string())),
        };
        let _ = tx.send(r);
    }
}

fn flush_batch(wal: &mut Wal, batch: &[(Event, oneshot::Sender<io::Result<()>>)]) -> io::Result<()> {
    let mut append_err: Option<io::Error> = None;
    for (event, _) in batch {
        if let Err(e) = wal.append_buffered(event) {
            append_err = Some(e);
            break;
        }
    }
    // Always flush, even on append error, so partially buffered bytes
    // don't leak into the next batch (callers were told this batch failed).
    let flush_err = wal.flush_sync().err();
    match (append_err, flush_err) {
        (Some(e), _) | (None, Some(e)) => Err(e),
        (None, None) => Ok(()),
    }
}

fn handle_non_append(wal: &mut Wal, cmd: WalCommand) {
    match cmd {
        WalCommand::Compact { events, response } => {
            let result = Wal::write_compact_file(wal.path(), &events)
                .and_then(|()| wal.swap_compact_file());
            let _ = response.send(result);
        }
        WalCommand::AppendsSinceCompact { response } => {
            let _ = response.send(wal.appends_since_compact());
        }
        WalCommand::Append { event, response } => {
            let mut batch = vec![(event, response)];
            commit_batch(wal, &mut batch);
        }
    }
}

/// The reservation engine. One instance per process, shared as `Arc<Engine>`.
pub struct Engine {
    catalog: Catalog,
    pub(super) store: Arc<BookingStore>,
    pub(super) wal_tx: mpsc::Sender<WalCommand>,
}

impl Engine {
    /// Replay the WAL at `wal_path` and start its writer task. Must be called
    /// from within a tokio runtime.
    pub fn new(wal_path: PathBuf, catalog: Catalog) -> io::Result<Self> {
        let events = Wal::replay(&wal_path)?;
        let recovered = store::rebuild(&events);
        for rid in recovered.keys() {
            if !catalog.exists(*rid) {
                tracing::warn!("WAL holds bookings for resource {rid}, which is not in the catalog");
            }
        }

        let wal = Wal::open(&wal_path)?;
        let (wal_tx, wal_rx) = mpsc::channel(4096);
        tokio::spawn(wal_writer_loop(wal, wal_rx));

        let store = BookingStore::from_parts(catalog.ids(), recovered);
        info!(
            "replayed {} WAL events from {}: {} active bookings",
            events.len(),
            wal_path.display(),
            store.booking_count()
        );
        metrics::gauge!(observability::BOOKINGS_ACTIVE).set(store.booking_count() as f64);

        Ok(Self {
            catalog,
            store: Arc::new(store),
            wal_tx,
        })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// WAL-append then apply, on a task that owns the partition guard.
    ///
    /// Dropping the caller's future cannot leave an event durable but
    /// unapplied; the write lock is held until both steps finish. A failed
    /// append leaves the partition untouched.
    pub(super) async fn persist_and_apply(
        &self,
        mut guard: OwnedRwLockWriteGuard<ResourceBookings>,
        event: Event,
    ) -> Result<OwnedRwLockWriteGuard<ResourceBookings>, EngineError> {
        let store = self.store.clone();
        let wal_tx = self.wal_tx.clone();
        tokio::spawn(async move {
            wal_append(&wal_tx, &event).await?;
            store.apply_event(&mut guard, &event);
            metrics::gauge!(observability::BOOKINGS_ACTIVE).set(store.booking_count() as f64);
            Ok::<_, EngineError>(guard)
        })
        .await
        .map_err(|e| EngineError::WalError(format!("WAL apply task failed: {e}")))?
    }

    /// Lookup booking → resource, get partition, acquire write lock.
    pub(super) async fn resolve_booking_write(
        &self,
        id: BookingId,
    ) -> Result<OwnedRwLockWriteGuard<ResourceBookings>, EngineError> {
        let resource_id = self
            .store
            .resource_for_booking(id)
            .ok_or(EngineError::NotFound(id))?;
        let part: SharedBookings = self
            .store
            .partition(resource_id)
            .ok_or(EngineError::NotFound(id))?;
        let guard = part.write_owned().await;
        // Deleted between the index lookup and the lock.
        if guard.get(id).is_none() {
            return Err(EngineError::NotFound(id));
        }
        Ok(guard)
    }
}

/// Write event to WAL via the background group-commit writer.
async fn wal_append(wal_tx: &mpsc::Sender<WalCommand>, event: &Event) -> Result<(), EngineError> {
    let (tx, rx) = oneshot::channel();
    wal_tx
        .send(WalCommand::Append {
            event: event.clone(),
            response: tx,
        })
        .await
        .map_err(|_| EngineError::WalError("WAL writer shut down".into()))?;
    rx.await
        .map_err(|_| EngineError::WalError("WAL writer dropped response".into()))?
        .map_err(|e| EngineError::WalError(e.to_string()))
}

/// Record outcome and latency of one engine operation.
pub(super) fn record_op<T>(op: &'static str, started: Instant, result: &Result<T, EngineError>) {
    let status = match result {
        Ok(_) => "ok",
        Err(e) => e.kind(),
    };
    metrics::counter!(observability::OPERATIONS_TOTAL, "op" => op, "status" => status).increment(1);
    metrics::histogram!(observability::OPERATION_DURATION_SECONDS, "op" => op)
        .record(started.elapsed().as_secs_f64());
}
