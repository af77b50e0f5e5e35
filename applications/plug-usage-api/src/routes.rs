use axum::{
    extract::Request,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::Level;

use crate::handlers::{dashboard, health, readings, usage, AppState};

pub fn create_router(state: AppState) -> Router {
    let public_routes = Router::new().route("/health", get(health::health));

    let api_routes = Router::new()
        .route("/api/v1/readings", post(readings::ingest))
        .route("/api/v1/readings/latest", get(readings::get_latest))
        .route("/api/v1/readings/24h", get(readings::get_last_24h))
        .route("/api/v1/usage/daily", get(usage::get_daily))
        .route("/api/v1/devices", get(dashboard::list_devices))
        .route("/api/v1/stats/summary", get(dashboard::get_summary))
        .route("/api/v1/stats/power", get(dashboard::get_power))
        .route("/api/v1/stats/sensors", get(dashboard::get_sensors))
        .route("/api/v1/events", get(dashboard::list_events));

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .fallback(health::not_found)
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(|request: &Request| {
                            tracing::span!(
                                Level::INFO,
                                "http_request",
                                method = %request.method(),
                                uri = %request.uri(),
                            )
                        })
                        .on_request(|_request: &Request, _span: &tracing::Span| {
                            tracing::event!(Level::DEBUG, "received request");
                        })
                        .on_response(
                            |response: &axum::response::Response,
                             latency: std::time::Duration,
                             _span: &tracing::Span| {
                                tracing::event!(
                                    Level::INFO,
                                    status = response.status().as_u16(),
                                    latency = ?latency,
                                    "request completed"
                                );
                            },
                        )
                        .on_failure(
                            |error: tower_http::classify::ServerErrorsFailureClass,
                             _latency: std::time::Duration,
                             _span: &tracing::Span| {
                                tracing::event!(Level::ERROR, error = %error, "request failed");
                            },
                        ),
                )
                .layer(CorsLayer::permissive()),
        )
}
