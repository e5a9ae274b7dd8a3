use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::{Phase, RunStatus, TimerRun};

/// Every state change driven through the controller produces an Event.
/// Front ends print or render them; nothing in the core subscribes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    RunStarted {
        run_id: String,
        task_id: Option<String>,
        duration_secs: i64,
        ends_at: DateTime<Utc>,
        at: DateTime<Utc>,
    },
    RunPaused {
        run_id: String,
        phase: Phase,
        remaining_ms: i64,
        at: DateTime<Utc>,
    },
    RunResumed {
        run_id: String,
        phase: Phase,
        remaining_ms: i64,
        ends_at: DateTime<Utc>,
        at: DateTime<Utc>,
    },
    RunStopped {
        run_id: String,
        phase: Phase,
        duration_sec: i64,
        at: DateTime<Utc>,
    },
    /// The current phase was rewound to its full length and paused.
    RunReset {
        run_id: String,
        phase: Phase,
        remaining_ms: i64,
        at: DateTime<Utc>,
    },
    /// A break was abandoned; the run waits at the start of a focus phase.
    BreakSkipped {
        run_id: String,
        remaining_ms: i64,
        at: DateTime<Utc>,
    },
    /// A phase reached its deadline and the run switched to the next one.
    PhaseCompleted {
        run_id: String,
        completed_phase: Phase,
        next_phase: Phase,
        next_status: RunStatus,
        duration_sec: i64,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        run: Option<TimerRun>,
        time_left_ms: Option<i64>,
        at: DateTime<Utc>,
    },
}

impl Event {
    pub fn snapshot(run: Option<&TimerRun>, at: DateTime<Utc>) -> Self {
        Event::StateSnapshot {
            run: run.cloned(),
            time_left_ms: run.and_then(|r| r.time_left_ms(at)),
            at,
        }
    }
}
