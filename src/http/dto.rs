//! Request and response bodies. Field names follow the public JSON API.

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use super::time::epoch_to_local_iso;
use crate::model::{Booking, BookingId, ResourceId};

pub const MIN_DURATION_MINUTES: i64 = 15;
pub const MAX_DURATION_MINUTES: i64 = 8 * 60;
pub const MIN_ADD_MINUTES: i64 = 1;
pub const MAX_ADD_MINUTES: i64 = 12 * 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingOut {
    pub id: BookingId,
    pub resource_id: ResourceId,
    pub name: String,
    pub phone: Option<String>,
    pub start_iso_local: String,
    pub end_iso_local: String,
}

impl BookingOut {
    pub fn from_booking(b: Booking, tz: Tz) -> Self {
        Self {
            start_iso_local: epoch_to_local_iso(tz, b.span.start),
            end_iso_local: epoch_to_local_iso(tz, b.span.end),
            id: b.id,
            resource_id: b.resource_id,
            name: b.name,
            phone: b.phone,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateBookingIn {
    pub resource_id: ResourceId,
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    /// `YYYY-MM-DD`
    pub date: String,
    /// `HH:MM`
    pub start_time: String,
    pub duration_minutes: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateBookingIn {
    #[serde(default)]
    pub end_iso_local: Option<String>,
    #[serde(default)]
    pub add_minutes: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListBookingsQuery {
    #[serde(rename = "from_", alias = "from")]
    pub from: Option<String>,
    pub to: Option<String>,
    pub resource_id: Option<ResourceId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub tz: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
}
