use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Public Router Module
///
/// Unauthenticated endpoints. The statistics blobs and the search-query terms
/// are fetched by the statistics page's scripts and carry no per-user data.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for the load balancer.
        .route("/health", get(|| async { "ok" }))
        // GET /monitor/stats/{key}
        // Precomputed statistics blob from the shared cache, `{}` when absent.
        .route("/monitor/stats/{key}", get(handlers::cached_stats))
        // GET /monitor/queries-stats
        // Most frequent search queries over the last 14 days, proxied from Graylog.
        .route("/monitor/queries-stats", get(handlers::queries_stats))
}
