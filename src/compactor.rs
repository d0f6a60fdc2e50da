use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info};

use crate::engine::Engine;

const CHECK_INTERVAL: Duration = Duration::from_secs(30);

/// Background task that compacts the WAL once enough appends have piled up.
pub async fn run_compactor(engine: Arc<Engine>, threshold: u64) {
    let mut interval = tokio::time::interval(CHECK_INTERVAL);
    loop {
        interval.tick().await;
        compact_if_needed(&engine, threshold).await;
    }
}

/// Returns true if a compaction ran and succeeded.
pub async fn compact_if_needed(engine: &Engine, threshold: u64) -> bool {
    let appends = engine.wal_appends_since_compact().await;
    if appends < threshold {
        debug!("compactor: {appends} appends since last compaction, below {threshold}");
        return false;
    }
    match engine.compact_wal().await {
        Ok(()) => {
            metrics::counter!(crate::observability::WAL_COMPACTIONS_TOTAL).increment(1);
            info!("compacted WAL after {appends} appends");
            true
        }
        Err(e) => {
            error!("WAL compaction failed: {e}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::model::*;
    use crate::wal::Wal;
    use std::path::PathBuf;

    fn test_wal_path(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join("poolbook_test_compactor");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        let _ = std::fs::remove_file(&path);
        path
    }

    fn new_booking(start: Secs, end: Secs) -> NewBooking {
        NewBooking {
            resource_id: 1,
            name: "Jens".into(),
            phone: None,
            start,
            end,
        }
    }

    #[tokio::test]
    async fn compaction_keeps_only_live_bookings() {
        let path = test_wal_path("compact_live.wal");
        let engine = Engine::new(path.clone(), Catalog::default()).unwrap();

        let keep = engine.create(new_booking(0, 600)).await.unwrap();
        for i in 1..5 {
            let b = engine.create(new_booking(i * 1000, i * 1000 + 600)).await.unwrap();
            engine.delete(b.id).await.unwrap();
        }
        engine.extend(keep.id, Extension::AddSeconds(300)).await.unwrap();

        assert!(!compact_if_needed(&engine, 100).await);
        assert!(compact_if_needed(&engine, 5).await);
        assert_eq!(engine.wal_appends_since_compact().await, 0);

        let replayed = Wal::replay(&path).unwrap();
        assert_eq!(
            replayed,
            vec![Event::BookingCreated {
                booking: Booking {
                    span: Span::try_new(0, 900).unwrap(),
                    ..keep
                }
            }]
        );
    }
}
