use std::time::Instant;

use tokio::sync::oneshot;
use tracing::debug;

use crate::model::*;

use super::conflict::{check_no_conflict, validate_span};
use super::{record_op, Engine, EngineError, WalCommand};

fn normalize_phone(phone: Option<String>) -> Option<String> {
    phone
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
}

impl Engine {
    pub async fn create(&self, req: NewBooking) -> Result<Booking, EngineError> {
        let started = Instant::now();
        let result = self.create_inner(req).await;
        record_op("create", started, &result);
        result
    }

    async fn create_inner(&self, req: NewBooking) -> Result<Booking, EngineError> {
        if !self.catalog().exists(req.resource_id) {
            return Err(EngineError::UnknownResource(req.resource_id));
        }
        let span = validate_span(req.start, req.end)?;
        let name = req.name.trim();
        if name.is_empty() {
            return Err(EngineError::InvalidName);
        }

        let part = self
            .store
            .partition(req.resource_id)
            .ok_or(EngineError::UnknownResource(req.resource_id))?;
        let guard = part.write_owned().await;

        check_no_conflict(&guard, &span, None)?;

        let booking = Booking {
            id: self.store.allocate_id(),
            resource_id: req.resource_id,
            name: name.to_string(),
            phone: normalize_phone(req.phone),
            span,
        };
        let event = Event::BookingCreated {
            booking: booking.clone(),
        };
        self.persist_and_apply(guard, event).await?;
        debug!(
            "booking {} created on resource {} [{}, {})",
            booking.id, booking.resource_id, span.start, span.end
        );
        Ok(booking)
    }

    pub async fn extend(&self, id: BookingId, extension: Extension) -> Result<Booking, EngineError> {
        let started = Instant::now();
        let result = self.extend_inner(id, extension).await;
        record_op("extend", started, &result);
        result
    }

    async fn extend_inner(&self, id: BookingId, extension: Extension) -> Result<Booking, EngineError> {
        let guard = self.resolve_booking_write(id).await?;
        let current = guard.get(id).ok_or(EngineError::NotFound(id))?.span;

        let new_end = match extension {
            Extension::NewEnd(end) => end,
            Extension::AddSeconds(delta) if delta > 0 => current.end.saturating_add(delta),
            Extension::AddSeconds(delta) => {
                return Err(EngineError::InvalidInterval {
                    start: current.start,
                    end: current.end.saturating_add(delta),
                });
            }
        };
        let span = validate_span(current.start, new_end)?;

        check_no_conflict(&guard, &span, Some(id))?;

        let event = Event::BookingExtended {
            id,
            resource_id: guard.resource_id,
            end: new_end,
        };
        let guard = self.persist_and_apply(guard, event).await?;
        debug!("booking {id} end moved {} -> {new_end}", current.end);
        guard.get(id).cloned().ok_or(EngineError::NotFound(id))
    }

    pub async fn delete(&self, id: BookingId) -> Result<Booking, EngineError> {
        let started = Instant::now();
        let result = self.delete_inner(id).await;
        record_op("delete", started, &result);
        result
    }

    async fn delete_inner(&self, id: BookingId) -> Result<Booking, EngineError> {
        let guard = self.resolve_booking_write(id).await?;
        let booking = guard.get(id).cloned().ok_or(EngineError::NotFound(id))?;
        let event = Event::BookingDeleted {
            id,
            resource_id: guard.resource_id,
        };
        self.persist_and_apply(guard, event).await?;
        debug!("booking {id} deleted from resource {}", booking.resource_id);
        Ok(booking)
    }

    /// Rewrite the WAL with one `BookingCreated` per live booking.
    ///
    /// Read locks on every partition are held until the swap completes, so no
    /// append can land in the old file after the snapshot was taken.
    pub async fn compact_wal(&self) -> Result<(), EngineError> {
        let mut guards = Vec::new();
        for part in self.store.partitions_sorted() {
            guards.push(part.read_owned().await);
        }
        let events: Vec<Event> = guards
            .iter()
            .flat_map(|g| g.bookings.iter())
            .map(|b| Event::BookingCreated { booking: b.clone() })
            .collect();
        let count = events.len();

        let (tx, rx) = oneshot::channel();
        self.wal_tx
            .send(WalCommand::Compact { events, response: tx })
            .await
            .map_err(|_| EngineError::WalError("WAL writer shut down".into()))?;
        rx.await
            .map_err(|_| EngineError::WalError("WAL writer dropped response".into()))?
            .map_err(|e| EngineError::WalError(e.to_string()))?;
        drop(guards);
        debug!("WAL compacted to {count} events");
        Ok(())
    }

    pub async fn wal_appends_since_compact(&self) -> u64 {
        let (tx, rx) = oneshot::channel();
        if self
            .wal_tx
            .send(WalCommand::AppendsSinceCompact { response: tx })
            .await
            .is_err()
        {
            return 0;
        }
        rx.await.unwrap_or(0)
    }
}
