use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Authenticated Router Module
///
/// Endpoints any signed-in user may call. Wrapped in `auth_middleware`, which
/// rejects requests without a valid session before they reach a handler.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /monitor/api-usage/{client_id}
        // Daily request histogram of one API client, proxied from Graylog.
        .route(
            "/monitor/api-usage/{client_id}",
            get(handlers::api_usage_stats),
        )
}
