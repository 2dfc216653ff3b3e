#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use media_monitor::{
    AppConfig, AppState, InMemoryStatsStore, MockJobQueue,
    auth::{AuthUser, StaffUser},
    log_search::{LogSearch, UpstreamError},
    models::{
        AnalysisCounts, AnalysisState, ClosedTicket, ModerationBacklog, OngoingState,
        ProcessingCounts, ProcessingState, SoundSelection, SoundStatus, User,
    },
    repository::Repository,
};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};

pub const STAFF_ID: i64 = 1;
pub const MEMBER_ID: i64 = 2;

// --- MOCK REPOSITORY ---

/// In-memory stand-in for Postgres. Selection and window filtering follow
/// the same rules as the SQL in `PostgresRepository`.
#[derive(Default)]
pub struct FakeRepo {
    pub users: Vec<User>,
    pub sounds: Vec<SoundStatus>,
    pub closed_tickets: Vec<ClosedTicket>,
    pub processing: ProcessingCounts,
    pub analysis: AnalysisCounts,
    pub backlog: ModerationBacklog,
    // When true, every counter query fails like a dropped connection.
    pub fail_queries: bool,
}

impl FakeRepo {
    pub fn with_default_users() -> Self {
        FakeRepo {
            users: vec![
                user(STAFF_ID, "staffer", true),
                user(MEMBER_ID, "member", false),
            ],
            ..FakeRepo::default()
        }
    }

    fn check(&self) -> Result<(), sqlx::Error> {
        if self.fail_queries {
            Err(sqlx::Error::PoolTimedOut)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Repository for FakeRepo {
    async fn get_user(&self, id: i64) -> Result<Option<User>, sqlx::Error> {
        Ok(self.users.iter().find(|u| u.id == id).cloned())
    }

    async fn get_users(&self, ids: &[i64]) -> Result<Vec<User>, sqlx::Error> {
        Ok(self
            .users
            .iter()
            .filter(|u| ids.contains(&u.id))
            .cloned()
            .collect())
    }

    async fn processing_counts(&self) -> Result<ProcessingCounts, sqlx::Error> {
        self.check()?;
        Ok(self.processing.clone())
    }

    async fn analysis_counts(&self) -> Result<AnalysisCounts, sqlx::Error> {
        self.check()?;
        Ok(self.analysis.clone())
    }

    async fn select_sounds(&self, selection: SoundSelection) -> Result<Vec<i64>, sqlx::Error> {
        self.check()?;
        Ok(self
            .sounds
            .iter()
            .filter(|s| selection.matches(s))
            .map(|s| s.id)
            .collect())
    }

    async fn moderation_backlog(
        &self,
        _moderator_id: i64,
        _tardy_before: DateTime<Utc>,
    ) -> Result<ModerationBacklog, sqlx::Error> {
        self.check()?;
        Ok(self.backlog.clone())
    }

    async fn closed_tickets_since(
        &self,
        since: DateTime<Utc>,
        assignee_id: Option<i64>,
    ) -> Result<Vec<ClosedTicket>, sqlx::Error> {
        self.check()?;
        Ok(self
            .closed_tickets
            .iter()
            .filter(|t| t.created > since)
            .filter(|t| assignee_id.is_none_or(|id| t.assignee_id == id))
            .cloned()
            .collect())
    }
}

// --- MOCK LOG SEARCH ---

pub struct MockLogSearch {
    pub fail: bool,
    pub requested_clients: Mutex<Vec<String>>,
}

impl MockLogSearch {
    pub fn ok() -> Self {
        MockLogSearch {
            fail: false,
            requested_clients: Mutex::new(vec![]),
        }
    }

    pub fn failing() -> Self {
        MockLogSearch {
            fail: true,
            requested_clients: Mutex::new(vec![]),
        }
    }
}

#[async_trait]
impl LogSearch for MockLogSearch {
    async fn search_query_terms(&self) -> Result<Value, UpstreamError> {
        if self.fail {
            return Err(UpstreamError::Status(502));
        }
        Ok(json!({ "terms": { "piano": 12, "rain": 7 }, "total": 19 }))
    }

    async fn api_usage_histogram(&self, client_id: &str) -> Result<Value, UpstreamError> {
        self.requested_clients
            .lock()
            .unwrap()
            .push(client_id.to_string());
        if self.fail {
            return Err(UpstreamError::Status(500));
        }
        Ok(json!({ "interval": "day", "results": { "1700000000": 4 } }))
    }
}

// --- STATE BUILDERS ---

pub fn user(id: i64, username: &str, is_staff: bool) -> User {
    User {
        id,
        username: username.to_string(),
        email: format!("{}@example.org", username),
        is_staff,
    }
}

pub fn sound(
    id: i64,
    processing_state: ProcessingState,
    ongoing_state: OngoingState,
    analysis_state: AnalysisState,
) -> SoundStatus {
    SoundStatus {
        id,
        processing_state,
        ongoing_state,
        analysis_state,
    }
}

pub fn staff() -> StaffUser {
    StaffUser(AuthUser {
        id: STAFF_ID,
        username: "staffer".to_string(),
        is_staff: true,
    })
}

pub fn member() -> AuthUser {
    AuthUser {
        id: MEMBER_ID,
        username: "member".to_string(),
        is_staff: false,
    }
}

pub struct TestState {
    pub state: AppState,
    pub queue: Arc<MockJobQueue>,
    pub log_search: Arc<MockLogSearch>,
}

pub fn test_state(repo: FakeRepo, stats: InMemoryStatsStore, log_search: MockLogSearch) -> TestState {
    test_state_with_queue(repo, stats, log_search, MockJobQueue::new())
}

pub fn test_state_with_queue(
    repo: FakeRepo,
    stats: InMemoryStatsStore,
    log_search: MockLogSearch,
    queue: MockJobQueue,
) -> TestState {
    let queue = Arc::new(queue);
    let log_search = Arc::new(log_search);
    let state = AppState {
        repo: Arc::new(repo),
        stats: Arc::new(stats),
        log_search: log_search.clone(),
        queue: queue.clone(),
        config: AppConfig::default(),
    };
    TestState {
        state,
        queue,
        log_search,
    }
}
