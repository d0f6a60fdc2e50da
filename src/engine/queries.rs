use std::time::Instant;

use crate::model::*;

use super::{record_op, Engine, EngineError};

impl Engine {
    pub fn list_resources(&self) -> &[Resource] {
        self.catalog().list()
    }

    pub async fn get(&self, id: BookingId) -> Result<Booking, EngineError> {
        self.store.get(id).await.ok_or(EngineError::NotFound(id))
    }

    /// Bookings matching the optional resource and time-range filters, sorted
    /// by `(start, id)`. Each partition is read under its lock, so no booking
    /// is ever observed half-updated.
    pub async fn list(&self, filter: BookingFilter) -> Vec<Booking> {
        let started = Instant::now();
        let mut out = match filter.resource_id {
            Some(rid) => self
                .store
                .list_by_resource(rid)
                .await
                .into_iter()
                .filter(|b| filter.range.matches(&b.span))
                .collect(),
            None => self.store.list_all(filter.range).await,
        };
        out.sort_by_key(|b| (b.span.start, b.id));
        record_op::<()>("list", started, &Ok(()));
        out
    }
}
