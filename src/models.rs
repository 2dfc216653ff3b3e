use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;

// --- Core Records (Mapped to Database) ---

/// User
///
/// A row of the `users` table. Only the fields needed for authorization and
/// for labelling moderators in reports are loaded.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[ts(export)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    // Gate for every monitoring page.
    pub is_staff: bool,
}

/// ClosedTicket
///
/// A closed, assigned moderation ticket as returned by the repository for
/// productivity reports. `created` decides window membership, `modified` is
/// the day the ticket is attributed to in the daily histogram.
#[derive(Debug, Clone, FromRow, PartialEq)]
pub struct ClosedTicket {
    pub assignee_id: i64,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

// --- Sound Pipeline States ---

/// Terminal status of a sound's transcoding pipeline (`sounds.processing_state`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingState {
    Pending,
    Ok,
    Failed,
}

impl ProcessingState {
    pub fn code(self) -> &'static str {
        match self {
            ProcessingState::Pending => "PE",
            ProcessingState::Ok => "OK",
            ProcessingState::Failed => "FA",
        }
    }
}

/// In-flight status of a sound's transcoding pipeline (`sounds.processing_ongoing_state`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OngoingState {
    None,
    Queued,
    Processing,
    Finished,
}

impl OngoingState {
    pub fn code(self) -> &'static str {
        match self {
            OngoingState::None => "NO",
            OngoingState::Queued => "QU",
            OngoingState::Processing => "PR",
            OngoingState::Finished => "FI",
        }
    }

    /// Queued or currently being processed by a worker.
    pub fn is_in_flight(self) -> bool {
        matches!(self, OngoingState::Queued | OngoingState::Processing)
    }
}

/// Status of a sound's feature-extraction pipeline (`sounds.analysis_state`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisState {
    Pending,
    Queued,
    Ok,
    Failed,
    Skipped,
}

impl AnalysisState {
    pub fn code(self) -> &'static str {
        match self {
            AnalysisState::Pending => "PE",
            AnalysisState::Queued => "QU",
            AnalysisState::Ok => "OK",
            AnalysisState::Failed => "FA",
            AnalysisState::Skipped => "SK",
        }
    }
}

/// SoundStatus
///
/// The pipeline states of a single sound. Used to evaluate a `SoundSelection`
/// in memory; the Postgres repository evaluates the same predicate in SQL.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoundStatus {
    pub id: i64,
    pub processing_state: ProcessingState,
    pub ongoing_state: OngoingState,
    pub analysis_state: AnalysisState,
}

// --- Bulk Reprocessing Selectors ---

/// SelectorError
///
/// A bulk-reprocessing query parameter carried a code outside its accepted set.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("unrecognized code {code:?} for parameter `{param}`")]
pub struct SelectorError {
    pub param: &'static str,
    pub code: String,
}

/// Accepted values of `prs`: terminal processing states worth retrying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingSelector {
    Failed,
    Pending,
}

impl ProcessingSelector {
    pub fn parse(code: &str) -> Result<Self, SelectorError> {
        match code {
            "FA" => Ok(ProcessingSelector::Failed),
            "PE" => Ok(ProcessingSelector::Pending),
            other => Err(SelectorError {
                param: "prs",
                code: other.to_string(),
            }),
        }
    }

    pub fn state(self) -> ProcessingState {
        match self {
            ProcessingSelector::Failed => ProcessingState::Failed,
            ProcessingSelector::Pending => ProcessingState::Pending,
        }
    }
}

/// Accepted values of `pros`: in-flight processing states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OngoingSelector {
    Queued,
    Processing,
}

impl OngoingSelector {
    pub fn parse(code: &str) -> Result<Self, SelectorError> {
        match code {
            "QU" => Ok(OngoingSelector::Queued),
            "PR" => Ok(OngoingSelector::Processing),
            other => Err(SelectorError {
                param: "pros",
                code: other.to_string(),
            }),
        }
    }

    pub fn state(self) -> OngoingState {
        match self {
            OngoingSelector::Queued => OngoingState::Queued,
            OngoingSelector::Processing => OngoingState::Processing,
        }
    }
}

/// Accepted values of `ans`: every analysis state except `OK`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisSelector {
    Queued,
    Pending,
    Failed,
    Skipped,
}

impl AnalysisSelector {
    pub fn parse(code: &str) -> Result<Self, SelectorError> {
        match code {
            "QU" => Ok(AnalysisSelector::Queued),
            "PE" => Ok(AnalysisSelector::Pending),
            "FA" => Ok(AnalysisSelector::Failed),
            "SK" => Ok(AnalysisSelector::Skipped),
            other => Err(SelectorError {
                param: "ans",
                code: other.to_string(),
            }),
        }
    }

    pub fn state(self) -> AnalysisState {
        match self {
            AnalysisSelector::Queued => AnalysisState::Queued,
            AnalysisSelector::Pending => AnalysisState::Pending,
            AnalysisSelector::Failed => AnalysisState::Failed,
            AnalysisSelector::Skipped => AnalysisState::Skipped,
        }
    }
}

/// Which kind of job a sound is handed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Task {
    Process,
    Analyze,
}

impl Task {
    pub fn as_str(self) -> &'static str {
        match self {
            Task::Process => "process",
            Task::Analyze => "analyze",
        }
    }
}

/// SoundSelection
///
/// One bulk-reprocessing criterion. Selection by terminal processing state
/// skips sounds already in flight; selection by ongoing state does not, so
/// sounds mid-processing can be re-triggered on purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundSelection {
    ByProcessingState(ProcessingSelector),
    ByOngoingState(OngoingSelector),
    ByAnalysisState(AnalysisSelector),
}

impl SoundSelection {
    /// Parses the three optional query codes. Empty strings count as absent.
    /// Every present code is validated before anything is returned.
    pub fn from_codes(
        prs: Option<&str>,
        pros: Option<&str>,
        ans: Option<&str>,
    ) -> Result<Vec<SoundSelection>, SelectorError> {
        fn present(code: Option<&str>) -> Option<&str> {
            code.filter(|c| !c.is_empty())
        }

        let mut selections = Vec::new();
        if let Some(code) = present(prs) {
            selections.push(SoundSelection::ByProcessingState(ProcessingSelector::parse(code)?));
        }
        if let Some(code) = present(pros) {
            selections.push(SoundSelection::ByOngoingState(OngoingSelector::parse(code)?));
        }
        if let Some(code) = present(ans) {
            selections.push(SoundSelection::ByAnalysisState(AnalysisSelector::parse(code)?));
        }
        Ok(selections)
    }

    pub fn task(self) -> Task {
        match self {
            SoundSelection::ByProcessingState(_) | SoundSelection::ByOngoingState(_) => {
                Task::Process
            }
            SoundSelection::ByAnalysisState(_) => Task::Analyze,
        }
    }

    pub fn matches(self, sound: &SoundStatus) -> bool {
        match self {
            SoundSelection::ByProcessingState(sel) => {
                sound.processing_state == sel.state() && !sound.ongoing_state.is_in_flight()
            }
            SoundSelection::ByOngoingState(sel) => sound.ongoing_state == sel.state(),
            SoundSelection::ByAnalysisState(sel) => sound.analysis_state == sel.state(),
        }
    }
}

// --- Dashboard Schemas (Output) ---

/// Processing pipeline counters shown on the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, Default, PartialEq)]
pub struct ProcessingCounts {
    pub queued: i64,
    /// Pending sounds that are neither queued nor being processed.
    pub pending: i64,
    pub processing: i64,
    pub failed: i64,
    pub ok: i64,
}

/// Analysis pipeline counters shown on the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, Default, PartialEq)]
pub struct AnalysisCounts {
    pub pending: i64,
    pub queued: i64,
    pub ok: i64,
    pub failed: i64,
    pub skipped: i64,
}

/// Moderation queue backlog, partly relative to the requesting moderator.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, Default, PartialEq)]
pub struct ModerationBacklog {
    pub new_upload_count: i64,
    pub in_my_queue_count: i64,
    pub tardy_moderator_count: i64,
    pub tardy_user_count: i64,
}

/// One row of the moderator leaderboard.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq)]
#[ts(export)]
pub struct ModeratorTally {
    pub user: User,
    pub closed_count: i64,
}

/// DailyCount
///
/// Closed tickets attributed to one calendar day.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq)]
#[ts(export)]
pub struct DailyCount {
    /// UTC date, `YYYY-MM-DD`.
    #[ts(type = "string")]
    pub day: NaiveDate,
    /// Tickets closed that day. Older dashboards read this as `id__count`.
    #[schema(example = 3)]
    pub count: i64,
}

/// Per-task job counts from the job queue.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[ts(export)]
pub struct TaskStatus {
    pub task: String,
    pub queued: i64,
    pub running: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sound(
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

    #[test]
    fn processing_selection_skips_in_flight_sounds() {
        let sel = SoundSelection::ByProcessingState(ProcessingSelector::Failed);
        let idle = sound(1, ProcessingState::Failed, OngoingState::Finished, AnalysisState::Ok);
        let queued = sound(2, ProcessingState::Failed, OngoingState::Queued, AnalysisState::Ok);
        let running = sound(3, ProcessingState::Failed, OngoingState::Processing, AnalysisState::Ok);
        let ok = sound(4, ProcessingState::Ok, OngoingState::None, AnalysisState::Ok);

        assert!(sel.matches(&idle));
        assert!(!sel.matches(&queued));
        assert!(!sel.matches(&running));
        assert!(!sel.matches(&ok));
        assert_eq!(sel.task(), Task::Process);
    }

    #[test]
    fn ongoing_selection_includes_everything_in_that_state() {
        let sel = SoundSelection::ByOngoingState(OngoingSelector::Processing);
        let running = sound(1, ProcessingState::Pending, OngoingState::Processing, AnalysisState::Ok);
        let queued = sound(2, ProcessingState::Pending, OngoingState::Queued, AnalysisState::Ok);

        assert!(sel.matches(&running));
        assert!(!sel.matches(&queued));
        assert_eq!(sel.task(), Task::Process);
    }

    #[test]
    fn analysis_selection_uses_analysis_task() {
        let sel = SoundSelection::ByAnalysisState(AnalysisSelector::Skipped);
        let skipped = sound(1, ProcessingState::Ok, OngoingState::Finished, AnalysisState::Skipped);

        assert!(sel.matches(&skipped));
        assert_eq!(sel.task(), Task::Analyze);
    }

    #[test]
    fn from_codes_treats_empty_as_absent() {
        let selections = SoundSelection::from_codes(Some(""), None, Some("")).unwrap();
        assert!(selections.is_empty());
    }

    #[test]
    fn from_codes_rejects_unknown_codes() {
        let err = SoundSelection::from_codes(Some("OK"), None, None).unwrap_err();
        assert_eq!(err.param, "prs");
        assert_eq!(err.code, "OK");

        // Analysis accepts OK nowhere either, and `pros` only takes in-flight codes.
        assert!(SoundSelection::from_codes(None, Some("FI"), None).is_err());
        assert!(SoundSelection::from_codes(None, None, Some("OK")).is_err());
    }

    #[test]
    fn from_codes_keeps_parameter_order() {
        let selections = SoundSelection::from_codes(Some("PE"), Some("QU"), Some("FA")).unwrap();
        assert_eq!(
            selections,
            vec![
                SoundSelection::ByProcessingState(ProcessingSelector::Pending),
                SoundSelection::ByOngoingState(OngoingSelector::Queued),
                SoundSelection::ByAnalysisState(AnalysisSelector::Failed),
            ]
        );
    }
}
