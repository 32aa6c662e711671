//! API layer
//!
//! HTTP handlers for:
//! - Pages (home feed, signup, login, logout)
//! - User views (index, profiles, follows, likes, profile editing)
//! - Message views (creation, show, deletion)
//! - Metrics (Prometheus)

mod messages;
mod pages;
mod render;
mod users;

pub use messages::messages_router;
pub use pages::pages_router;
pub use users::users_router;

use axum::{
    Router,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use prometheus::{Encoder, TextEncoder};

use crate::metrics::REGISTRY;

/// 302 redirect used by every handler that answers a form POST.
///
/// The stock redirect helper answers 303, which downgrades the next
/// request to GET; the views here rely on the classic found status so
/// clients re-request the target the same way browsers always have.
pub(crate) fn found(location: &str) -> Response {
    (
        StatusCode::FOUND,
        [(header::LOCATION, location.to_string())],
    )
        .into_response()
}

/// Metrics endpoint handler
///
/// Returns all metrics in Prometheus text format.
async fn metrics_handler() -> Response {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();

    match encoder.encode_to_string(&metric_families) {
        Ok(metrics_text) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, encoder.format_type())],
            metrics_text,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to encode metrics",
            )
                .into_response()
        }
    }
}

/// Create metrics router
///
/// Exposes the `/metrics` endpoint.
pub fn metrics_router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route("/metrics", get(metrics_handler))
}
