use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{routes, state::AppState};

/// Construct the Axum [`Router`] with all routes and middleware attached.
///
/// Middleware is applied in outer-to-inner order (outermost runs first on
/// request, last on response):
///
/// 1. `TraceLayer` — structured request/response logging via `tracing`.
/// 2. `CorsLayer` — the tracking beacon is sent from third-party sites, so
///    browsers need CORS headers on every route.
pub fn build_app(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config.cors_origins);

    Router::new()
        .route("/health", get(routes::health::health))
        .route("/api/event", post(routes::collect::track_event))
        .route("/api/events", post(routes::collect::track_events))
        .route("/api/stats", get(routes::stats::get_stats))
        .route("/api/pages", get(routes::pages::get_pages))
        .route("/api/referrers", get(routes::referrers::get_referrers))
        .route("/api/vitals", get(routes::vitals::get_vitals))
        .route("/api/devices", get(routes::devices::get_devices))
        .route("/api/timeseries", get(routes::timeseries::get_timeseries))
        .route("/api/sites", get(routes::sites::list_sites))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Any origin when `origins` is empty, otherwise exactly the listed ones.
/// Entries that are not valid header values are ignored.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    if origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();
    layer.allow_origin(AllowOrigin::list(allowed))
}
