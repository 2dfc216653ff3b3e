use crate::{
    AppState,
    auth::{AuthUser, StaffUser},
    cache::StatsKey,
    error::AppError,
    models::{DailyCount, ModeratorTally, SoundSelection},
    reports,
    repository::RepositoryState,
    templates::{self, ModeratorsTemplate, MonitorTemplate, QueueTemplate, StatsTemplate},
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, Redirect},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

// --- Query Structs ---

/// ReprocessParams
///
/// Query parameters of the bulk reprocessing trigger (GET /monitor/process).
/// Each one is optional and independent; see `SoundSelection` for what they select.
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
pub struct ReprocessParams {
    /// Terminal processing state to retry: `FA` or `PE`.
    pub prs: Option<String>,
    /// In-flight processing state to re-trigger: `QU` or `PR`.
    pub pros: Option<String>,
    /// Analysis state to re-analyze: `QU`, `PE`, `FA` or `SK`.
    pub ans: Option<String>,
}

/// ModeratorStatsQuery
///
/// Query parameters of the per-moderator daily histogram.
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
pub struct ModeratorStatsQuery {
    pub user_id: Option<i64>,
}

// --- Staff Pages ---

/// monitor_home
///
/// [Staff Route] The dashboard: processing and analysis counters plus the
/// moderation backlog as seen by the requesting moderator.
pub async fn monitor_home(
    StaffUser(user): StaffUser,
    State(state): State<AppState>,
) -> Result<Html<String>, AppError> {
    let now = Utc::now();
    let processing = state.repo.processing_counts().await?;
    let analysis = state.repo.analysis_counts().await?;
    let moderation = state
        .repo
        .moderation_backlog(user.id, reports::tardy_cutoff(now))
        .await?;

    templates::render(&MonitorTemplate {
        username: user.username,
        processing,
        analysis,
        moderation,
    })
}

/// monitor_stats
///
/// [Staff Route] Statistics page. Its panels fetch the JSON endpoints client-side.
pub async fn monitor_stats(_staff: StaffUser) -> Result<Html<String>, AppError> {
    templates::render(&StatsTemplate {
        stats_slugs: StatsKey::ALL.iter().map(|key| key.slug()).collect(),
    })
}

/// queue_status
///
/// [Staff Route] Outstanding jobs per task. An unreachable queue renders as
/// an empty table.
pub async fn queue_status(
    _staff: StaffUser,
    State(state): State<AppState>,
) -> Result<Html<String>, AppError> {
    let tasks = state.queue.status().await.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "job queue status unavailable");
        vec![]
    });
    templates::render(&QueueTemplate { tasks })
}

/// moderators_stats
///
/// [Staff Route] Leaderboard of tickets closed per moderator over the trailing window.
pub async fn moderators_stats(
    _staff: StaffUser,
    State(state): State<AppState>,
) -> Result<Html<String>, AppError> {
    let moderators = moderator_leaderboard(&state.repo, Utc::now()).await?;
    templates::render(&ModeratorsTemplate { moderators })
}

/// Leaderboard rows for the window ending at `now`.
pub async fn moderator_leaderboard(
    repo: &RepositoryState,
    now: DateTime<Utc>,
) -> Result<Vec<ModeratorTally>, AppError> {
    let tickets = repo
        .closed_tickets_since(reports::moderator_window_start(now), None)
        .await?;
    let counts = reports::count_by_assignee(&tickets);
    let ids: Vec<i64> = counts.keys().copied().collect();
    let users = repo.get_users(&ids).await?;
    Ok(reports::rank_moderators(&counts, users))
}

/// moderator_daily_stats
///
/// [Staff Route] Per-day closed ticket counts of one moderator over the trailing window.
#[utoipa::path(
    get,
    path = "/monitor/moderators/daily",
    params(ModeratorStatsQuery),
    responses((
        status = 200,
        description = "Closed tickets per day, oldest first, as `[{\"day\", \"count\"}]`. \
                       The per-day total is `count`, formerly `id__count`.",
        body = [DailyCount]
    ))
)]
pub async fn moderator_daily_stats(
    _staff: StaffUser,
    State(state): State<AppState>,
    Query(query): Query<ModeratorStatsQuery>,
) -> Result<Json<Vec<DailyCount>>, AppError> {
    let Some(user_id) = query.user_id else {
        return Ok(Json(vec![]));
    };

    let since = reports::moderator_window_start(Utc::now());
    let tickets = state.repo.closed_tickets_since(since, Some(user_id)).await?;
    Ok(Json(reports::closed_per_day(&tickets)))
}

/// process_sounds
///
/// [Staff Route] Bulk reprocessing trigger. All codes are validated first, so a
/// bad code enqueues nothing. Each selection is then resolved to sound ids and
/// handed to the job queue.
#[utoipa::path(
    get,
    path = "/monitor/process",
    params(ReprocessParams),
    responses(
        (status = 303, description = "Jobs enqueued, redirect to the dashboard"),
        (status = 400, description = "Unrecognized state code")
    )
)]
pub async fn process_sounds(
    _staff: StaffUser,
    State(state): State<AppState>,
    Query(params): Query<ReprocessParams>,
) -> Result<Redirect, AppError> {
    let selections = SoundSelection::from_codes(
        params.prs.as_deref(),
        params.pros.as_deref(),
        params.ans.as_deref(),
    )?;

    for selection in selections {
        let ids = state.repo.select_sounds(selection).await?;
        let enqueued = state.queue.enqueue_many(selection.task(), &ids).await?;
        tracing::info!(?selection, enqueued, "sounds sent to the job queue");
    }

    Ok(Redirect::to("/monitor"))
}

// --- Cached Statistics ---

/// cached_stats
///
/// [Public Route] Returns a precomputed statistics blob, or `{}` if it has not
/// been computed yet. Empty blobs (`null`, `false`, `0`, `""`, `[]`) also
/// come back as `{}`.
#[utoipa::path(
    get,
    path = "/monitor/stats/{key}",
    params((
        "key" = String,
        Path,
        description = "tags, sounds, active-users, users, downloads, donations or totals"
    )),
    responses(
        (status = 200, description = "Cached statistics blob", content_type = "application/json"),
        (status = 400, description = "Unknown statistics key")
    )
)]
pub async fn cached_stats(
    State(state): State<AppState>,
    Path(key): Path<StatsKey>,
) -> Result<Json<Value>, AppError> {
    let value = state.stats.get(key).await?;
    Ok(Json(
        value
            .filter(|v| !is_empty_blob(v))
            .unwrap_or_else(|| Value::Object(Default::default())),
    ))
}

fn is_empty_blob(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.is_empty(),
    }
}

// --- Log Search Proxy ---

/// queries_stats
///
/// [Public Route] Most frequent search queries of the last 14 days.
/// Any upstream failure is an empty 500.
#[utoipa::path(
    get,
    path = "/monitor/queries-stats",
    responses(
        (status = 200, description = "Log search terms result", content_type = "application/json"),
        (status = 500, description = "Log search unavailable")
    )
)]
pub async fn queries_stats(State(state): State<AppState>) -> Result<Json<Value>, StatusCode> {
    state.log_search.search_query_terms().await.map(Json).map_err(|e| {
        tracing::error!(error = %e, "search query terms lookup failed");
        StatusCode::INTERNAL_SERVER_ERROR
    })
}

/// api_usage_stats
///
/// [Authenticated Route] Daily request histogram of one API client over 14 days.
#[utoipa::path(
    get,
    path = "/monitor/api-usage/{client_id}",
    params(("client_id" = String, Path, description = "API client id")),
    responses(
        (status = 200, description = "Log search histogram result", content_type = "application/json"),
        (status = 500, description = "Log search unavailable")
    )
)]
pub async fn api_usage_stats(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(client_id): Path<String>,
) -> Result<Json<Value>, StatusCode> {
    state
        .log_search
        .api_usage_histogram(&client_id)
        .await
        .map(Json)
        .map_err(|e| {
            tracing::error!(error = %e, client_id = %client_id, "api usage lookup failed");
            StatusCode::INTERNAL_SERVER_ERROR
        })
}
