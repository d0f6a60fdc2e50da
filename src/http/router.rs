//! Router configuration: routes, CORS, request tracing and static files.

use std::path::Path;

use axum::{
    Router,
    http::{HeaderValue, header::InvalidHeaderValue},
    routing::{get, put},
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use super::handlers;
use super::state::AppState;

/// CORS policy: any origin when `allow_origin` is `None`, otherwise exactly one.
/// Credentials are never allowed.
pub fn cors_layer(allow_origin: Option<&str>) -> Result<CorsLayer, InvalidHeaderValue> {
    let origin = match allow_origin {
        None => AllowOrigin::from(Any),
        Some(o) => AllowOrigin::exact(HeaderValue::from_str(o)?),
    };
    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(Any)
        .allow_headers(Any))
}

/// Create the application router. Static files under `static_dir` are served
/// at `/static` when the directory exists.
pub fn create_router(state: AppState, cors: CorsLayer, static_dir: &Path) -> Router {
    let api = Router::new()
        .route("/resources", get(handlers::list_resources))
        .route(
            "/bookings",
            get(handlers::list_bookings).post(handlers::create_booking),
        )
        .route(
            "/bookings/{id}",
            put(handlers::update_booking).delete(handlers::delete_booking),
        );

    let mut app = Router::new()
        .route("/healthz", get(handlers::healthz))
        .nest("/api", api);
    if static_dir.is_dir() {
        app = app.nest_service("/static", ServeDir::new(static_dir));
    } else {
        tracing::debug!("static dir {} missing, not serving /static", static_dir.display());
    }

    app.layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
