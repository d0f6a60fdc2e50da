//! JSON-over-HTTP adapter for the reservation engine.
//!
//! Handlers own everything the engine deliberately ignores: parsing request
//! bodies, converting local wall-clock times to instants in the configured
//! zone, and mapping `EngineError` to status codes.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod router;
pub mod state;
pub mod time;

pub use router::{cors_layer, create_router};
pub use state::AppState;
