use axum::{
    Router,
    extract::{FromRef, Request},
    http::HeaderName,
    middleware::{self, Next},
    response::Response,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod auth;
pub mod cache;
pub mod config;
pub mod error;
pub mod handlers;
pub mod log_search;
pub mod models;
pub mod queue;
pub mod reports;
pub mod repository;
pub mod templates;

// Routing segregated by required access (public, authenticated, staff).
pub mod routes;
use auth::{AuthUser, StaffUser};
use routes::{admin, authenticated, public};

// --- Public Re-exports ---

pub use cache::{InMemoryStatsStore, RedisStatsStore, StatsState};
pub use config::AppConfig;
pub use log_search::{GraylogClient, LogSearchState};
pub use queue::{MockJobQueue, PgJobQueue, QueueState};
pub use repository::{PostgresRepository, RepositoryState};

/// ApiDoc
///
/// OpenAPI document of the JSON endpoints, served at `/api-docs/openapi.json`.
/// The HTML pages are left out.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::cached_stats, handlers::queries_stats, handlers::api_usage_stats,
        handlers::moderator_daily_stats, handlers::process_sounds
    ),
    components(
        schemas(models::DailyCount, models::ModeratorTally, models::User, models::TaskStatus)
    ),
    tags(
        (name = "media-monitor", description = "Staff monitoring dashboard API")
    )
)]
struct ApiDoc;

/// AppState
///
/// Single immutable container of every collaborator, shared across requests.
/// Each collaborator is a trait object so tests can swap in fakes.
#[derive(Clone)]
pub struct AppState {
    /// Sounds, tickets and users (Postgres).
    pub repo: RepositoryState,
    /// Precomputed statistics blobs (Redis).
    pub stats: StatsState,
    /// Log-search API (Graylog).
    pub log_search: LogSearchState,
    /// Processing/analysis job queue.
    pub queue: QueueState,
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// Rejects the request with 401 unless `AuthUser` resolves.
async fn auth_middleware(_auth_user: AuthUser, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// staff_middleware
///
/// Rejects the request with 401/403 unless the caller is staff.
async fn staff_middleware(_staff: StaffUser, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// create_router
///
/// Assembles the routing structure, applies scoped and global middleware and
/// registers the application state.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(
            authenticated::authenticated_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth_middleware,
            )),
        )
        .merge(
            admin::admin_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                staff_middleware,
            )),
        )
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Span for `TraceLayer` carrying method, uri and the request id, so every log
/// line of one request can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
