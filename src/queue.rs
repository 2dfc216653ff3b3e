use crate::models::{Task, TaskStatus};
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, query_builder::QueryBuilder};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// JobQueue
///
/// Hands sounds over to the processing/analysis workers. The workers
/// themselves live elsewhere; this service only enqueues and inspects.
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Enqueues one `task` job per sound id. Returns how many were enqueued.
    async fn enqueue_many(&self, task: Task, sound_ids: &[i64]) -> Result<u64, sqlx::Error>;

    /// Outstanding jobs per task.
    async fn status(&self) -> Result<Vec<TaskStatus>, sqlx::Error>;
}

/// QueueState
///
/// The concrete type used to share the job queue across the application state.
pub type QueueState = Arc<dyn JobQueue>;

/// Sounds per `jobs` INSERT statement.
pub const ENQUEUE_CHUNK_SIZE: usize = 1000;

/// PgJobQueue
///
/// Queue stored in the `jobs` table. Enqueuing also flags the sound as
/// queued, in the same transaction, so the dashboard counters move at once.
pub struct PgJobQueue {
    pool: PgPool,
}

impl PgJobQueue {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobQueue for PgJobQueue {
    async fn enqueue_many(&self, task: Task, sound_ids: &[i64]) -> Result<u64, sqlx::Error> {
        if sound_ids.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;

        let mark_queued = match task {
            Task::Process => "UPDATE sounds SET processing_ongoing_state = 'QU' WHERE id = ANY($1)",
            Task::Analyze => "UPDATE sounds SET analysis_state = 'QU' WHERE id = ANY($1)",
        };
        sqlx::query(mark_queued)
            .bind(sound_ids)
            .execute(&mut *tx)
            .await?;

        // Four binds per row; chunking keeps each INSERT far below the
        // 65535 bind parameter limit of a Postgres statement.
        let mut inserted = 0;
        for chunk in sound_ids.chunks(ENQUEUE_CHUNK_SIZE) {
            let mut builder: QueryBuilder<Postgres> =
                QueryBuilder::new("INSERT INTO jobs (id, task, sound_id, status, created_at) ");
            builder.push_values(chunk, |mut row, sound_id| {
                row.push_bind(Uuid::new_v4())
                    .push_bind(task.as_str())
                    .push_bind(*sound_id)
                    .push_bind("queued")
                    .push("NOW()");
            });
            inserted += builder.build().execute(&mut *tx).await?.rows_affected();
        }

        tx.commit().await?;
        Ok(inserted)
    }

    async fn status(&self) -> Result<Vec<TaskStatus>, sqlx::Error> {
        sqlx::query_as::<_, TaskStatus>(
            r#"
            SELECT
                task,
                COUNT(*) FILTER (WHERE status = 'queued') AS queued,
                COUNT(*) FILTER (WHERE status = 'running') AS running
            FROM jobs
            WHERE status IN ('queued', 'running')
            GROUP BY task
            ORDER BY task
            "#,
        )
        .fetch_all(&self.pool)
        .await
    }
}

/// MockJobQueue
///
/// Records every enqueued job instead of persisting it. Used by handler tests.
#[derive(Default)]
pub struct MockJobQueue {
    enqueued: Mutex<Vec<(Task, i64)>>,
    /// When true, `status` fails as an unreachable queue would.
    pub unavailable: bool,
}

impl MockJobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    /// Snapshot of everything enqueued so far, in call order.
    pub fn enqueued(&self) -> Vec<(Task, i64)> {
        self.enqueued
            .lock()
            .map(|jobs| jobs.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl JobQueue for MockJobQueue {
    async fn enqueue_many(&self, task: Task, sound_ids: &[i64]) -> Result<u64, sqlx::Error> {
        let mut jobs = self
            .enqueued
            .lock()
            .map_err(|_| sqlx::Error::PoolClosed)?;
        jobs.extend(sound_ids.iter().map(|id| (task, *id)));
        Ok(sound_ids.len() as u64)
    }

    async fn status(&self) -> Result<Vec<TaskStatus>, sqlx::Error> {
        if self.unavailable {
            return Err(sqlx::Error::PoolTimedOut);
        }

        let jobs = self.enqueued();
        let count = |task: Task| jobs.iter().filter(|(t, _)| *t == task).count() as i64;
        Ok([Task::Analyze, Task::Process]
            .into_iter()
            .filter(|task| count(*task) > 0)
            .map(|task| TaskStatus {
                task: task.as_str().to_string(),
                queued: count(task),
                running: 0,
            })
            .collect())
    }
}
