//! Append-only session log.
//!
//! One row per finished phase interval: `completed = true` when the deadline
//! was reached, `false` when the user stopped early. Rows are never updated
//! or deleted, and the durations are always derived from timestamps the store
//! wrote itself.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::{Phase, TimerRun};

pub const DEFAULT_SESSION_LIMIT: usize = 50;

/// A stored session row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: i64,
    pub user_id: String,
    #[serde(default)]
    pub task_id: Option<String>,
    pub phase: Phase,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub duration_sec: i64,
    pub completed: bool,
}

/// A session about to be appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSession {
    pub user_id: String,
    pub task_id: Option<String>,
    pub phase: Phase,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub duration_sec: i64,
    pub completed: bool,
}

impl NewSession {
    /// The interval of `run` ran to its deadline.
    ///
    /// Duration is `ends_at - started_at`, not "now", so a late transition
    /// still records the exact planned length.
    pub fn completed(run: &TimerRun, user_id: &str, ends_at: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.to_string(),
            task_id: run.task_id.clone(),
            phase: run.phase,
            started_at: run.started_at,
            ended_at: ends_at,
            duration_sec: whole_seconds(run.started_at, ends_at),
            completed: true,
        }
    }

    /// The interval of `run` was cut short at `now`.
    pub fn aborted(run: &TimerRun, user_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.to_string(),
            task_id: run.task_id.clone(),
            phase: run.phase,
            started_at: run.started_at,
            ended_at: now,
            duration_sec: whole_seconds(run.started_at, now),
            completed: false,
        }
    }
}

/// Floor of the elapsed seconds, never less than one.
fn whole_seconds(from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
    ((to - from).num_milliseconds() / 1000).max(1)
}
