//! Counting behind the moderator reports.
//!
//! The repository only filters rows; grouping, joining and ordering happen
//! here so they can be checked without a database.

use crate::models::{ClosedTicket, DailyCount, ModeratorTally, User};
use chrono::{DateTime, TimeDelta, Utc};
use std::collections::{BTreeMap, HashMap};

/// Trailing window of the productivity reports: six months of 365/12 days.
pub fn moderator_window_start(now: DateTime<Utc>) -> DateTime<Utc> {
    now - TimeDelta::hours(6 * 365 * 24 / 12)
}

/// Open tickets untouched for this long are tardy.
pub const TARDY_AFTER_DAYS: i64 = 2;

pub fn tardy_cutoff(now: DateTime<Utc>) -> DateTime<Utc> {
    now - TimeDelta::days(TARDY_AFTER_DAYS)
}

/// Closed tickets per assignee.
pub fn count_by_assignee(tickets: &[ClosedTicket]) -> HashMap<i64, i64> {
    let mut counts = HashMap::new();
    for ticket in tickets {
        *counts.entry(ticket.assignee_id).or_insert(0) += 1;
    }
    counts
}

/// rank_moderators
///
/// Joins per-assignee counts with their user records, most closed tickets
/// first. Ties fall back to username so the page is stable between loads.
/// Assignees without a user record are dropped.
pub fn rank_moderators(counts: &HashMap<i64, i64>, users: Vec<User>) -> Vec<ModeratorTally> {
    let mut ranked: Vec<ModeratorTally> = users
        .into_iter()
        .filter_map(|user| {
            counts.get(&user.id).map(|&closed_count| ModeratorTally {
                user,
                closed_count,
            })
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.closed_count
            .cmp(&a.closed_count)
            .then_with(|| a.user.username.cmp(&b.user.username))
    });
    ranked
}

/// Closed tickets grouped by the UTC date they were last modified, oldest day first.
pub fn closed_per_day(tickets: &[ClosedTicket]) -> Vec<DailyCount> {
    let mut days = BTreeMap::new();
    for ticket in tickets {
        *days.entry(ticket.modified.date_naive()).or_insert(0) += 1;
    }
    days.into_iter()
        .map(|(day, count)| DailyCount { day, count })
        .collect()
}
