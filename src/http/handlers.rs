//! HTTP handlers. Each one converts local-time input to instants, makes one
//! engine call, and re-expresses the result in local time.

use axum::{
    Json,
    extract::{Path, Query, State},
};

use super::dto::*;
use super::error::AppError;
use super::state::AppState;
use super::time::{local_to_epoch, parse_date, parse_instant, parse_time};
use crate::model::{BookingFilter, BookingId, Extension, NewBooking, RangeFilter, Resource};

pub type HandlerResult<T> = Result<Json<T>, AppError>;

/// GET /healthz
pub async fn healthz(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        tz: state.tz.name().to_string(),
    })
}

/// GET /api/resources
pub async fn list_resources(State(state): State<AppState>) -> Json<Vec<Resource>> {
    Json(state.engine.list_resources().to_vec())
}

/// GET /api/bookings?from_=..&to=..
///
/// Both bounds optional; a booking is returned when it intersects the window.
pub async fn list_bookings(
    State(state): State<AppState>,
    Query(query): Query<ListBookingsQuery>,
) -> HandlerResult<Vec<BookingOut>> {
    let parse_bound = |raw: Option<&str>, field: &str| -> Result<Option<i64>, AppError> {
        raw.filter(|s| !s.trim().is_empty())
            .map(|s| {
                parse_instant(state.tz, s)
                    .ok_or_else(|| AppError::BadRequest(format!("'{field}' must be ISO-8601")))
            })
            .transpose()
    };
    let range = RangeFilter {
        from: parse_bound(query.from.as_deref(), "from_")?,
        to: parse_bound(query.to.as_deref(), "to")?,
    };
    let filter = BookingFilter {
        resource_id: query.resource_id,
        range,
    };

    let bookings = state.engine.list(filter).await;
    Ok(Json(
        bookings
            .into_iter()
            .map(|b| BookingOut::from_booking(b, state.tz))
            .collect(),
    ))
}

/// POST /api/bookings
pub async fn create_booking(
    State(state): State<AppState>,
    Json(payload): Json<CreateBookingIn>,
) -> HandlerResult<BookingOut> {
    if !(MIN_DURATION_MINUTES..=MAX_DURATION_MINUTES).contains(&payload.duration_minutes) {
        return Err(AppError::Unprocessable(format!(
            "duration_minutes must be between {MIN_DURATION_MINUTES} and {MAX_DURATION_MINUTES}"
        )));
    }
    let (Some(date), Some(time)) = (parse_date(&payload.date), parse_time(&payload.start_time))
    else {
        return Err(AppError::BadRequest(
            "Provide 'date' (YYYY-MM-DD) and 'start_time' (HH:MM)".into(),
        ));
    };
    let start = local_to_epoch(state.tz, date, time).ok_or_else(|| {
        AppError::BadRequest(format!(
            "{} {} does not exist in {}",
            payload.date,
            payload.start_time,
            state.tz.name()
        ))
    })?;
    // Absolute duration, so a booking across a DST change keeps its length.
    let end = start + payload.duration_minutes * 60;

    let booking = state
        .engine
        .create(NewBooking {
            resource_id: payload.resource_id,
            name: payload.name,
            phone: payload.phone,
            start,
            end,
        })
        .await?;
    Ok(Json(BookingOut::from_booking(booking, state.tz)))
}

/// PUT /api/bookings/{id}
///
/// `add_minutes` takes precedence over `end_iso_local` when both are sent.
pub async fn update_booking(
    State(state): State<AppState>,
    Path(id): Path<BookingId>,
    Json(payload): Json<UpdateBookingIn>,
) -> HandlerResult<BookingOut> {
    if let Some(add) = payload.add_minutes
        && !(MIN_ADD_MINUTES..=MAX_ADD_MINUTES).contains(&add)
    {
        return Err(AppError::Unprocessable(format!(
            "add_minutes must be between {MIN_ADD_MINUTES} and {MAX_ADD_MINUTES}"
        )));
    }

    let extension = match (payload.add_minutes, payload.end_iso_local.as_deref()) {
        (Some(add), _) => Extension::AddSeconds(add * 60),
        (None, Some(raw)) if !raw.trim().is_empty() => {
            // Unknown ids report 404 before input errors.
            state.engine.get(id).await?;
            let end = parse_instant(state.tz, raw).ok_or_else(|| {
                AppError::BadRequest("end_iso_local must be ISO-8601 with timezone".into())
            })?;
            Extension::NewEnd(end)
        }
        _ => {
            state.engine.get(id).await?;
            return Err(AppError::BadRequest(
                "Provide add_minutes or end_iso_local".into(),
            ));
        }
    };

    let booking = state
        .engine
        .extend(id, extension)
        .await
        .map_err(AppError::from_extend)?;
    Ok(Json(BookingOut::from_booking(booking, state.tz)))
}

/// DELETE /api/bookings/{id}
pub async fn delete_booking(
    State(state): State<AppState>,
    Path(id): Path<BookingId>,
) -> HandlerResult<StatusResponse> {
    state.engine.delete(id).await?;
    Ok(Json(StatusResponse {
        status: "ok".into(),
    }))
}
