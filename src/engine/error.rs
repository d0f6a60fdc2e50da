use crate::model::{BookingId, ResourceId, Secs};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    UnknownResource(ResourceId),
    InvalidInterval { start: Secs, end: Secs },
    InvalidName,
    /// Carries the id of the existing booking the candidate collides with.
    Overlap(BookingId),
    NotFound(BookingId),
    WalError(String),
}

impl EngineError {
    /// Short label used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::UnknownResource(_) => "unknown_resource",
            EngineError::InvalidInterval { .. } => "invalid_interval",
            EngineError::InvalidName => "invalid_name",
            EngineError::Overlap(_) => "overlap",
            EngineError::NotFound(_) => "not_found",
            EngineError::WalError(_) => "wal_error",
        }
    }
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::UnknownResource(id) => write!(f, "unknown resource: {id}"),
            EngineError::InvalidInterval { start, end } => {
                write!(f, "invalid interval [{start}, {end}): end must be after start")
            }
            EngineError::InvalidName => write!(f, "name must not be empty"),
            EngineError::Overlap(id) => write!(f, "overlaps existing booking: {id}"),
            EngineError::NotFound(id) => write!(f, "booking not found: {id}"),
            EngineError::WalError(e) => write!(f, "WAL error: {e}"),
        }
    }
}

impl std::error::Error for EngineError {}
