//! The persisted run record and its countdown math.
//!
//! A run is authoritative on the server side. Clients never keep a local
//! counter: the time left is recomputed from the record and a sampled `now`.
//!
//! ```text
//! running -> ends_at is authoritative, time left = max(0, ends_at - now)
//! paused  -> remaining_ms is authoritative, frozen
//! stopped -> no countdown
//! ```

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Focus,
    Break,
}

impl Phase {
    /// The phase that follows this one.
    pub fn next(self) -> Self {
        match self {
            Phase::Focus => Phase::Break,
            Phase::Break => Phase::Focus,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Focus => "focus",
            Phase::Break => "break",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "focus" => Ok(Phase::Focus),
            "break" => Ok(Phase::Break),
            other => Err(format!("unknown phase '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Running,
    Paused,
    Stopped,
}

impl RunStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RunStatus::Running => "running",
            RunStatus::Paused => "paused",
            RunStatus::Stopped => "stopped",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RunStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "running" => Ok(RunStatus::Running),
            "paused" => Ok(RunStatus::Paused),
            "stopped" => Ok(RunStatus::Stopped),
            other => Err(format!("unknown run status '{other}'")),
        }
    }
}

/// One row per user. `status == Stopped` means "no active run".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerRun {
    pub id: String,
    pub user_id: String,
    #[serde(default)]
    pub task_id: Option<String>,
    pub phase: Phase,
    pub status: RunStatus,
    /// When the current phase interval began.
    pub started_at: DateTime<Utc>,
    /// Wall-clock deadline. Only meaningful while running.
    #[serde(default)]
    pub ends_at: Option<DateTime<Utc>>,
    /// Frozen countdown. Only meaningful while paused.
    #[serde(default)]
    pub remaining_ms: Option<i64>,
    pub updated_at: DateTime<Utc>,
    /// Bumped by every guarded write. A writer must present the version it
    /// observed, so a stale copy can never overwrite a row that moved on.
    #[serde(default)]
    pub version: i64,
}

impl TimerRun {
    pub fn is_running(&self) -> bool {
        self.status == RunStatus::Running
    }

    pub fn is_paused(&self) -> bool {
        self.status == RunStatus::Paused
    }

    pub fn is_active(&self) -> bool {
        self.status != RunStatus::Stopped
    }

    /// Milliseconds left at `now`, or `None` when there is no live countdown.
    pub fn time_left_ms(&self, now: DateTime<Utc>) -> Option<i64> {
        match self.status {
            RunStatus::Running => self
                .ends_at
                .map(|ends_at| (ends_at - now).num_milliseconds().max(0)),
            RunStatus::Paused => Some(self.remaining_ms.unwrap_or(0).max(0)),
            RunStatus::Stopped => None,
        }
    }

    /// Whole seconds left, rounded up so a display never shows 0 early.
    pub fn time_left_secs(&self, now: DateTime<Utc>) -> Option<i64> {
        self.time_left_ms(now).map(|ms| (ms + 999) / 1000)
    }

    /// True once a running run has reached its deadline.
    pub fn deadline_reached(&self, now: DateTime<Utc>) -> bool {
        self.is_running() && self.time_left_ms(now) == Some(0)
    }

    /// Identity of the deadline this run is counting towards.
    pub fn transition_key(&self) -> Option<TransitionKey> {
        if !self.is_running() {
            return None;
        }
        self.ends_at.map(|ends_at| TransitionKey {
            run_id: self.id.clone(),
            phase: self.phase,
            ends_at,
        })
    }
}

/// `run id + phase + deadline`: the same crossing observed twice has the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransitionKey {
    pub run_id: String,
    pub phase: Phase,
    pub ends_at: DateTime<Utc>,
}
