use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use dashmap::DashMap;
use tokio::sync::RwLock;

use crate::model::*;

pub type SharedBookings = Arc<RwLock<ResourceBookings>>;

/// Owns every booking, partitioned per resource. Each partition sits behind its
/// own lock; mutations take `&mut ResourceBookings` so the caller must hold the
/// partition's write guard.
pub struct BookingStore {
    partitions: DashMap<ResourceId, SharedBookings>,
    /// Reverse lookup: booking id → resource id
    booking_to_resource: DashMap<BookingId, ResourceId>,
    next_id: AtomicI64,
}

impl BookingStore {
    /// Build the store from partitions recovered at startup. `resource_ids`
    /// gets an empty partition each so the first booking needs no insert race.
    pub fn from_parts(
        resource_ids: impl IntoIterator<Item = ResourceId>,
        recovered: HashMap<ResourceId, ResourceBookings>,
    ) -> Self {
        let store = Self {
            partitions: DashMap::new(),
            booking_to_resource: DashMap::new(),
            next_id: AtomicI64::new(1),
        };
        for rid in resource_ids {
            store
                .partitions
                .insert(rid, Arc::new(RwLock::new(ResourceBookings::new(rid))));
        }
        for (rid, rb) in recovered {
            for b in &rb.bookings {
                store.booking_to_resource.insert(b.id, rid);
                store.observe_id(b.id);
            }
            store.partitions.insert(rid, Arc::new(RwLock::new(rb)));
        }
        store
    }

    // ── Ids ──────────────────────────────────────────────────

    pub fn allocate_id(&self) -> BookingId {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Make sure future ids are strictly above `id`.
    pub fn observe_id(&self, id: BookingId) {
        self.next_id.fetch_max(id + 1, Ordering::Relaxed);
    }

    // ── Partitions ───────────────────────────────────────────

    pub fn partition(&self, resource_id: ResourceId) -> Option<SharedBookings> {
        self.partitions.get(&resource_id).map(|e| e.value().clone())
    }

    pub fn resource_for_booking(&self, id: BookingId) -> Option<ResourceId> {
        self.booking_to_resource.get(&id).map(|e| *e.value())
    }

    /// Snapshot of all partitions sorted by resource id. Never hold DashMap refs
    /// across an await; clone the Arcs out first.
    pub fn partitions_sorted(&self) -> Vec<SharedBookings> {
        let mut parts: Vec<(ResourceId, SharedBookings)> = self
            .partitions
            .iter()
            .map(|e| (*e.key(), e.value().clone()))
            .collect();
        parts.sort_by_key(|(rid, _)| *rid);
        parts.into_iter().map(|(_, p)| p).collect()
    }

    pub fn booking_count(&self) -> usize {
        self.booking_to_resource.len()
    }

    // ── Mutations (caller holds the partition write lock) ────

    pub fn insert(&self, rb: &mut ResourceBookings, booking: Booking) {
        self.booking_to_resource.insert(booking.id, rb.resource_id);
        self.observe_id(booking.id);
        rb.insert(booking);
    }

    pub fn update_end(&self, rb: &mut ResourceBookings, id: BookingId, end: Secs) -> Option<Booking> {
        rb.set_end(id, end).cloned()
    }

    pub fn delete(&self, rb: &mut ResourceBookings, id: BookingId) -> Option<Booking> {
        let removed = rb.remove(id)?;
        self.booking_to_resource.remove(&id);
        Some(removed)
    }

    pub fn apply_event(&self, rb: &mut ResourceBookings, event: &Event) {
        match event {
            Event::BookingCreated { booking } => self.insert(rb, booking.clone()),
            Event::BookingExtended { id, end, .. } => {
                self.update_end(rb, *id, *end);
            }
            Event::BookingDeleted { id, .. } => {
                self.delete(rb, *id);
            }
        }
    }

    // ── Reads ────────────────────────────────────────────────

    pub async fn get(&self, id: BookingId) -> Option<Booking> {
        let part = self.partition(self.resource_for_booking(id)?)?;
        let guard = part.read().await;
        guard.get(id).cloned()
    }

    pub async fn list_by_resource(&self, resource_id: ResourceId) -> Vec<Booking> {
        let Some(part) = self.partition(resource_id) else {
            return Vec::new();
        };
        let guard = part.read().await;
        guard.bookings.clone()
    }

    pub async fn list_all(&self, range: RangeFilter) -> Vec<Booking> {
        let mut out = Vec::new();
        for part in self.partitions_sorted() {
            let guard = part.read().await;
            out.extend(guard.bookings.iter().filter(|b| range.matches(&b.span)).cloned());
        }
        out
    }
}

/// Fold replayed events into per-resource partitions. Events for bookings that
/// no longer exist are skipped.
pub fn rebuild(events: &[Event]) -> HashMap<ResourceId, ResourceBookings> {
    let mut parts: HashMap<ResourceId, ResourceBookings> = HashMap::new();
    for event in events {
        let rid = event.resource_id();
        let rb = parts.entry(rid).or_insert_with(|| ResourceBookings::new(rid));
        match event {
            Event::BookingCreated { booking } => rb.insert(booking.clone()),
            Event::BookingExtended { id, end, .. } => {
                rb.set_end(*id, *end);
            }
            Event::BookingDeleted { id, .. } => {
                rb.remove(*id);
            }
        }
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn booking(id: BookingId, resource_id: ResourceId, start: Secs, end: Secs) -> Booking {
        Booking {
            id,
            resource_id,
            name: "Bo".into(),
            phone: None,
            span: Span::try_new(start, end).unwrap(),
        }
    }

    #[test]
    fn rebuild_applies_events_in_order() {
        let events = vec![
            Event::BookingCreated { booking: booking(1, 1, 100, 200) },
            Event::BookingCreated { booking: booking(2, 1, 300, 400) },
            Event::BookingExtended { id: 1, resource_id: 1, end: 250 },
            Event::BookingDeleted { id: 2, resource_id: 1 },
            Event::BookingCreated { booking: booking(3, 2, 0, 50) },
        ];
        let parts = rebuild(&events);
        assert_eq!(parts[&1].bookings, vec![booking(1, 1, 100, 250)]);
        assert_eq!(parts[&2].bookings, vec![booking(3, 2, 0, 50)]);
    }

    #[test]
    fn from_parts_restores_index_and_next_id() {
        let parts = rebuild(&[
            Event::BookingCreated { booking: booking(4, 1, 100, 200) },
            Event::BookingCreated { booking: booking(9, 2, 100, 200) },
        ]);
        let store = BookingStore::from_parts([1, 2, 3], parts);
        assert_eq!(store.resource_for_booking(9), Some(2));
        assert_eq!(store.booking_count(), 2);
        assert_eq!(store.allocate_id(), 10);
        assert!(store.partition(3).is_some());
    }

    #[tokio::test]
    async fn mutations_keep_index_in_sync() {
        let store = BookingStore::from_parts([1], HashMap::new());
        let part = store.partition(1).unwrap();
        {
            let mut guard = part.write().await;
            store.insert(&mut guard, booking(1, 1, 100, 200));
            assert_eq!(store.update_end(&mut guard, 1, 300).map(|b| b.end()), Some(300));
        }
        assert_eq!(store.get(1).await.map(|b| b.end()), Some(300));
        {
            let mut guard = part.write().await;
            assert!(store.delete(&mut guard, 1).is_some());
            assert!(store.delete(&mut guard, 1).is_none());
        }
        assert!(store.get(1).await.is_none());
        assert_eq!(store.resource_for_booking(1), None);
    }

    #[tokio::test]
    async fn list_all_filters_by_range() {
        let parts = rebuild(&[
            Event::BookingCreated { booking: booking(1, 1, 100, 200) },
            Event::BookingCreated { booking: booking(2, 2, 200, 300) },
            Event::BookingCreated { booking: booking(3, 1, 300, 400) },
        ]);
        let store = BookingStore::from_parts([1, 2], parts);
        let range = RangeFilter { from: Some(200), to: Some(300) };
        let ids: Vec<_> = store.list_all(range).await.iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![2]);
        assert_eq!(store.list_all(RangeFilter::default()).await.len(), 3);
        assert_eq!(store.list_by_resource(1).await.len(), 2);
        assert!(store.list_by_resource(42).await.is_empty());
    }
}
