use crate::model::*;

use super::EngineError;

pub(crate) fn validate_span(start: Secs, end: Secs) -> Result<Span, EngineError> {
    Span::try_new(start, end).ok_or(EngineError::InvalidInterval { start, end })
}

/// First booking on this resource (in start order) whose span overlaps
/// `candidate`, ignoring `exclude`.
pub fn find_conflict<'a>(
    rb: &'a ResourceBookings,
    candidate: &Span,
    exclude: Option<BookingId>,
) -> Option<&'a Booking> {
    rb.overlapping(candidate)
        .find(|b| Some(b.id) != exclude && b.span.overlaps(candidate))
}

pub(crate) fn check_no_conflict(
    rb: &ResourceBookings,
    candidate: &Span,
    exclude: Option<BookingId>,
) -> Result<(), EngineError> {
    match find_conflict(rb, candidate, exclude) {
        Some(existing) => {
            metrics::counter!(crate::observability::CONFLICTS_TOTAL).increment(1);
            Err(EngineError::Overlap(existing.id))
        }
        None => Ok(()),
    }
}
