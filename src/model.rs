use serde::{Deserialize, Serialize};

/// Unix seconds (UTC), the only time type inside the engine.
pub type Secs = i64;

pub type ResourceId = i64;
pub type BookingId = i64;

/// Half-open interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: Secs,
    pub end: Secs,
}

impl Span {
    /// Returns `None` for empty or inverted ranges.
    pub fn try_new(start: Secs, end: Secs) -> Option<Self> {
        (start < end).then_some(Self { start, end })
    }

    pub fn duration_secs(&self) -> Secs {
        self.end - self.start
    }

    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && self.end > other.start
    }

    pub fn contains_instant(&self, t: Secs) -> bool {
        self.start <= t && t < self.end
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub id: ResourceId,
    pub name: String,
}

/// A stored reservation. Only `span.end` changes after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub resource_id: ResourceId,
    pub name: String,
    pub phone: Option<String>,
    pub span: Span,
}

impl Booking {
    pub fn start(&self) -> Secs {
        self.span.start
    }

    pub fn end(&self) -> Secs {
        self.span.end
    }
}

/// Caller input for a new booking; validated and normalised by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBooking {
    pub resource_id: ResourceId,
    pub name: String,
    pub phone: Option<String>,
    pub start: Secs,
    pub end: Secs,
}

/// How an extend call moves a booking's end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extension {
    /// Absolute new end. May move the end earlier as long as it stays after start.
    NewEnd(Secs),
    /// Relative delta added to the current end. Must be positive.
    AddSeconds(Secs),
}

/// Optional `[from, to)` window. A missing bound is unbounded on that side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RangeFilter {
    pub from: Option<Secs>,
    pub to: Option<Secs>,
}

impl RangeFilter {
    pub fn matches(&self, span: &Span) -> bool {
        self.from.is_none_or(|from| span.end > from) && self.to.is_none_or(|to| span.start < to)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BookingFilter {
    pub resource_id: Option<ResourceId>,
    pub range: RangeFilter,
}

/// All bookings of one resource, sorted by `span.start`.
#[derive(Debug, Clone)]
pub struct ResourceBookings {
    pub resource_id: ResourceId,
    pub bookings: Vec<Booking>,
}

impl ResourceBookings {
    pub fn new(resource_id: ResourceId) -> Self {
        Self {
            resource_id,
            bookings: Vec::new(),
        }
    }

    /// Insert booking maintaining sort order by span.start.
    pub fn insert(&mut self, booking: Booking) {
        let pos = self
            .bookings
            .binary_search_by_key(&booking.span.start, |b| b.span.start)
            .unwrap_or_else(|e| e);
        self.bookings.insert(pos, booking);
    }

    pub fn get(&self, id: BookingId) -> Option<&Booking> {
        self.bookings.iter().find(|b| b.id == id)
    }

    pub fn remove(&mut self, id: BookingId) -> Option<Booking> {
        let pos = self.bookings.iter().position(|b| b.id == id)?;
        Some(self.bookings.remove(pos))
    }

    /// Replace the end of a booking. Start is unchanged, so ordering holds.
    pub fn set_end(&mut self, id: BookingId, end: Secs) -> Option<&Booking> {
        let booking = self.bookings.iter_mut().find(|b| b.id == id)?;
        booking.span.end = end;
        Some(booking)
    }

    /// Return only bookings whose span overlaps the query window.
    /// Uses binary search to skip bookings starting at or after `query.end`.
    pub fn overlapping(&self, query: &Span) -> impl Iterator<Item = &Booking> {
        // Everything at index >= right_bound starts at or after query.end → can't overlap.
        let right_bound = self.bookings.partition_point(|b| b.span.start < query.end);
        self.bookings[..right_bound]
            .iter()
            .filter(move |b| b.span.end > query.start)
    }
}

/// Flat event types. This is the WAL record format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    BookingCreated {
        booking: Booking,
    },
    BookingExtended {
        id: BookingId,
        resource_id: ResourceId,
        end: Secs,
    },
    BookingDeleted {
        id: BookingId,
        resource_id: ResourceId,
    },
}

impl Event {
    pub fn resource_id(&self) -> ResourceId {
        match self {
            Event::BookingCreated { booking } => booking.resource_id,
            Event::BookingExtended { resource_id, .. } | Event::BookingDeleted { resource_id, .. } => {
                *resource_id
            }
        }
    }
}
