use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Admin Router Module
///
/// Staff-only monitoring surface. Wrapped in `staff_middleware`; the handlers
/// additionally take the `StaffUser` extractor.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /monitor
        // Dashboard: processing/analysis counters and the moderation backlog.
        .route("/monitor", get(handlers::monitor_home))
        // GET /monitor/stats
        // Statistics page whose panels load the public JSON endpoints.
        .route("/monitor/stats", get(handlers::monitor_stats))
        // GET /monitor/queue
        // Outstanding jobs per task in the job queue.
        .route("/monitor/queue", get(handlers::queue_status))
        // GET /monitor/moderators
        // Tickets closed per moderator over the last six months.
        .route("/monitor/moderators", get(handlers::moderators_stats))
        // GET /monitor/moderators/daily?user_id=
        // Per-day closed tickets of one moderator, as JSON.
        .route(
            "/monitor/moderators/daily",
            get(handlers::moderator_daily_stats),
        )
        // GET /monitor/process?prs=&pros=&ans=
        // Sends the selected sounds back to processing or analysis, then
        // redirects to the dashboard.
        .route("/monitor/process", get(handlers::process_sounds))
}
