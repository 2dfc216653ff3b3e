use crate::models::{
    AnalysisCounts, ClosedTicket, ModerationBacklog, OngoingState, ProcessingCounts,
    SoundSelection, User,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, query_builder::QueryBuilder};
use std::sync::Arc;

/// Repository Trait
///
/// Read-side contract over the platform's relational store. Handlers only see
/// this trait, so tests substitute hand-written fakes for Postgres.
///
/// Query failures are returned to the caller.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    async fn get_user(&self, id: i64) -> Result<Option<User>, sqlx::Error>;
    async fn get_users(&self, ids: &[i64]) -> Result<Vec<User>, sqlx::Error>;

    // --- Sound pipeline counters ---
    async fn processing_counts(&self) -> Result<ProcessingCounts, sqlx::Error>;
    async fn analysis_counts(&self) -> Result<AnalysisCounts, sqlx::Error>;

    /// Ids of every sound matching `selection`, ascending.
    async fn select_sounds(&self, selection: SoundSelection) -> Result<Vec<i64>, sqlx::Error>;

    // --- Moderation ---
    /// Backlog counters. Tickets untouched since `tardy_before` count as tardy.
    async fn moderation_backlog(
        &self,
        moderator_id: i64,
        tardy_before: DateTime<Utc>,
    ) -> Result<ModerationBacklog, sqlx::Error>;

    /// Closed, assigned tickets created after `since`, optionally for one assignee.
    async fn closed_tickets_since(
        &self,
        since: DateTime<Utc>,
        assignee_id: Option<i64>,
    ) -> Result<Vec<ClosedTicket>, sqlx::Error>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

/// PostgresRepository
///
/// `Repository` backed by the platform's PostgreSQL database.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn get_user(&self, id: i64) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT id, username, email, is_staff FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn get_users(&self, ids: &[i64]) -> Result<Vec<User>, sqlx::Error> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        sqlx::query_as::<_, User>(
            "SELECT id, username, email, is_staff FROM users WHERE id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await
    }

    /// processing_counts
    ///
    /// All five processing counters in one scan. `IS DISTINCT FROM` keeps
    /// sounds with a NULL ongoing state in the pending bucket.
    async fn processing_counts(&self) -> Result<ProcessingCounts, sqlx::Error> {
        sqlx::query_as::<_, ProcessingCounts>(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE processing_ongoing_state = 'QU') AS queued,
                COUNT(*) FILTER (
                    WHERE processing_state = 'PE'
                      AND processing_ongoing_state IS DISTINCT FROM 'PR'
                      AND processing_ongoing_state IS DISTINCT FROM 'QU'
                ) AS pending,
                COUNT(*) FILTER (WHERE processing_ongoing_state = 'PR') AS processing,
                COUNT(*) FILTER (WHERE processing_state = 'FA') AS failed,
                COUNT(*) FILTER (WHERE processing_state = 'OK') AS ok
            FROM sounds
            "#,
        )
        .fetch_one(&self.pool)
        .await
    }

    async fn analysis_counts(&self) -> Result<AnalysisCounts, sqlx::Error> {
        sqlx::query_as::<_, AnalysisCounts>(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE analysis_state = 'PE') AS pending,
                COUNT(*) FILTER (WHERE analysis_state = 'QU') AS queued,
                COUNT(*) FILTER (WHERE analysis_state = 'OK') AS ok,
                COUNT(*) FILTER (WHERE analysis_state = 'FA') AS failed,
                COUNT(*) FILTER (WHERE analysis_state = 'SK') AS skipped
            FROM sounds
            "#,
        )
        .fetch_one(&self.pool)
        .await
    }

    /// select_sounds
    ///
    /// SQL rendition of `SoundSelection::matches`, built with QueryBuilder so
    /// every state code is a bound parameter.
    async fn select_sounds(&self, selection: SoundSelection) -> Result<Vec<i64>, sqlx::Error> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("SELECT id FROM sounds WHERE ");

        match selection {
            SoundSelection::ByProcessingState(sel) => {
                builder
                    .push("processing_state = ")
                    .push_bind(sel.state().code())
                    .push(" AND processing_ongoing_state IS DISTINCT FROM ")
                    .push_bind(OngoingState::Processing.code())
                    .push(" AND processing_ongoing_state IS DISTINCT FROM ")
                    .push_bind(OngoingState::Queued.code());
            }
            SoundSelection::ByOngoingState(sel) => {
                builder
                    .push("processing_ongoing_state = ")
                    .push_bind(sel.state().code());
            }
            SoundSelection::ByAnalysisState(sel) => {
                builder
                    .push("analysis_state = ")
                    .push_bind(sel.state().code());
            }
        }

        builder.push(" ORDER BY id");

        builder
            .build_query_scalar::<i64>()
            .fetch_all(&self.pool)
            .await
    }

    async fn moderation_backlog(
        &self,
        moderator_id: i64,
        tardy_before: DateTime<Utc>,
    ) -> Result<ModerationBacklog, sqlx::Error> {
        sqlx::query_as::<_, ModerationBacklog>(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE status = 'new' AND assignee_id IS NULL) AS new_upload_count,
                COUNT(*) FILTER (WHERE status = 'accepted' AND assignee_id = $1) AS in_my_queue_count,
                COUNT(*) FILTER (
                    WHERE status = 'accepted' AND assignee_id IS NOT NULL AND modified < $2
                ) AS tardy_moderator_count,
                COUNT(*) FILTER (WHERE status = 'deferred' AND modified < $2) AS tardy_user_count
            FROM tickets
            "#,
        )
        .bind(moderator_id)
        .bind(tardy_before)
        .fetch_one(&self.pool)
        .await
    }

    async fn closed_tickets_since(
        &self,
        since: DateTime<Utc>,
        assignee_id: Option<i64>,
    ) -> Result<Vec<ClosedTicket>, sqlx::Error> {
        sqlx::query_as::<_, ClosedTicket>(
            r#"
            SELECT assignee_id, created, modified
            FROM tickets
            WHERE status = 'closed'
              AND assignee_id IS NOT NULL
              AND created > $1
              AND ($2::BIGINT IS NULL OR assignee_id = $2)
            "#,
        )
        .bind(since)
        .bind(assignee_id)
        .fetch_all(&self.pool)
        .await
    }
}
