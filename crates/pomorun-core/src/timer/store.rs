//! Server-authoritative run transitions.
//!
//! Every transition validates the observed run first (rejecting with
//! `InvalidTransition` before touching the backend), then issues a conditional
//! write keyed on the expected prior state. A write that matches nothing is a
//! `Conflict`: someone else moved the run first. Nothing here retries.
//!
//! ## State Transitions
//!
//! ```text
//! stopped -> running (start) -> { paused (pause) -> running (resume) }* -> stopped (stop)
//! running --deadline--> running | paused, phase flipped (complete_phase_and_switch)
//! running | paused -> paused, full length of the same phase (reset)
//! break running | paused -> focus paused, full length (skip_break)
//! ```
//!
//! The conditional write also carries the version of the observed row, so a
//! transition computed from a stale copy is a `Conflict` even when the status
//! happens to match.

use chrono::{DateTime, Duration, SubsecRound, Utc};
use uuid::Uuid;

use super::run::{Phase, RunStatus, TimerRun};
use crate::clock::Clock;
use crate::error::{CoreError, Result, ValidationError};
use crate::session::{NewSession, Session};
use crate::settings::{Settings, FOCUS_MINUTES_RANGE};
use crate::storage::RunBackend;

/// A transition that also appended to the session log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggedTransition {
    pub run: TimerRun,
    pub session: NewSession,
}

pub struct TimerRunStore<B, C> {
    backend: B,
    clock: C,
}

impl<B: RunBackend, C: Clock> TimerRunStore<B, C> {
    pub fn new(backend: B, clock: C) -> Self {
        Self { backend, clock }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Current instant at storage precision (milliseconds).
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now().trunc_subsecs(3)
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// The user's run that is not stopped, if any.
    pub fn current_run(&self, user_id: &str) -> Result<Option<TimerRun>> {
        self.backend.fetch_current_run(user_id)
    }

    /// Stored settings, or the defaults for a user who never saved any.
    pub fn settings(&self, user_id: &str) -> Result<Settings> {
        Ok(self.backend.fetch_settings(user_id)?.unwrap_or_default())
    }

    pub fn update_settings(&self, user_id: &str, settings: &Settings) -> Result<Settings> {
        settings.validate()?;
        let saved = self.backend.upsert_settings(user_id, settings)?;
        tracing::info!(user_id, "settings updated");
        Ok(saved)
    }

    pub fn sessions(&self, user_id: &str, limit: usize) -> Result<Vec<Session>> {
        self.backend.sessions(user_id, limit)
    }

    pub fn sessions_since(&self, user_id: &str, since: DateTime<Utc>) -> Result<Vec<Session>> {
        self.backend.sessions_since(user_id, since)
    }

    // ── Transitions ──────────────────────────────────────────────────

    /// Begin a fresh focus interval, replacing whatever row the user had.
    pub fn start_run(
        &self,
        user_id: &str,
        focus_minutes: u32,
        task_id: Option<&str>,
    ) -> Result<TimerRun> {
        let (min, max) = FOCUS_MINUTES_RANGE;
        if focus_minutes < min || focus_minutes > max {
            return Err(ValidationError::OutOfRange {
                field: "focus_minutes".into(),
                min: f64::from(min),
                max: f64::from(max),
                value: f64::from(focus_minutes),
            }
            .into());
        }

        let now = self.now();
        let run = TimerRun {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            task_id: task_id.map(str::to_string),
            phase: Phase::Focus,
            status: RunStatus::Running,
            started_at: now,
            ends_at: Some(now + Duration::minutes(i64::from(focus_minutes))),
            remaining_ms: None,
            updated_at: now,
            version: 0,
        };
        let run = self.backend.upsert_run(&run)?;
        tracing::info!(user_id, run_id = %run.id, focus_minutes, "run started");
        Ok(run)
    }

    /// Freeze the countdown of a running run.
    ///
    /// The remaining time is floored to whole seconds.
    pub fn pause_run(&self, run: &TimerRun) -> Result<TimerRun> {
        if run.status != RunStatus::Running {
            return Err(reject(run, "Run is not running"));
        }
        let ends_at = run
            .ends_at
            .ok_or_else(|| reject(run, "Running run has no deadline"))?;

        let now = self.now();
        let remaining_ms = (ends_at - now).num_milliseconds().max(0) / 1000 * 1000;
        let next = TimerRun {
            status: RunStatus::Paused,
            ends_at: None,
            remaining_ms: Some(remaining_ms),
            updated_at: now,
            ..run.clone()
        };

        let paused = self
            .backend
            .update_run_if(&next, RunStatus::Running)?
            .ok_or_else(|| conflict(run, RunStatus::Running))?;
        tracing::info!(run_id = %run.id, remaining_ms, "run paused");
        Ok(paused)
    }

    /// Restart the countdown of a paused run from its frozen remainder.
    pub fn resume_run(&self, run: &TimerRun) -> Result<TimerRun> {
        if run.status != RunStatus::Paused {
            return Err(reject(run, "Run is not paused"));
        }
        let remaining_ms = match run.remaining_ms {
            Some(ms) if ms > 0 => ms,
            _ => return Err(reject(run, "No remaining time to resume")),
        };

        let now = self.now();
        let next = TimerRun {
            status: RunStatus::Running,
            started_at: now,
            ends_at: Some(now + Duration::milliseconds(remaining_ms)),
            remaining_ms: None,
            updated_at: now,
            ..run.clone()
        };

        let resumed = self
            .backend
            .update_run_if(&next, RunStatus::Paused)?
            .ok_or_else(|| conflict(run, RunStatus::Paused))?;
        tracing::info!(run_id = %run.id, remaining_ms, "run resumed");
        Ok(resumed)
    }

    /// Rewind the current phase to its full length, paused. Nothing is logged.
    pub fn reset_run(&self, run: &TimerRun, settings: &Settings) -> Result<TimerRun> {
        if !run.is_active() {
            return Err(reject(run, "No active run to reset"));
        }
        let reset = self.park_at_start(run, run.phase, settings)?;
        tracing::info!(run_id = %run.id, phase = %run.phase, "run reset");
        Ok(reset)
    }

    /// Abandon a break and park at the start of the next focus. Nothing is
    /// logged.
    pub fn skip_break_run(&self, run: &TimerRun, settings: &Settings) -> Result<TimerRun> {
        if !run.is_active() || run.phase != Phase::Break {
            return Err(reject(run, "Only an active break can be skipped"));
        }
        let skipped = self.park_at_start(run, Phase::Focus, settings)?;
        tracing::info!(run_id = %run.id, "break skipped");
        Ok(skipped)
    }

    /// Paused at the full length of `phase`, guarded on the observed status.
    fn park_at_start(&self, run: &TimerRun, phase: Phase, settings: &Settings) -> Result<TimerRun> {
        let now = self.now();
        let next = TimerRun {
            phase,
            status: RunStatus::Paused,
            started_at: now,
            ends_at: None,
            remaining_ms: Some(settings.phase_duration_ms(phase)),
            updated_at: now,
            ..run.clone()
        };
        self.backend
            .update_run_if(&next, run.status)?
            .ok_or_else(|| conflict(run, run.status))
    }

    /// End the run early, logging the interaction as an aborted session.
    pub fn stop_run(&self, run: Option<&TimerRun>, user_id: &str) -> Result<LoggedTransition> {
        let run = run.ok_or_else(|| {
            tracing::warn!(user_id, "stop rejected: no active run");
            CoreError::InvalidTransition("No active run to stop".into())
        })?;
        if run.status == RunStatus::Stopped {
            return Err(reject(run, "Run is already stopped"));
        }
        check_owner(run, user_id)?;

        let now = self.now();
        let session = NewSession::aborted(run, user_id, now);
        let next = TimerRun {
            status: RunStatus::Stopped,
            ends_at: None,
            remaining_ms: None,
            updated_at: now,
            ..run.clone()
        };

        let stopped = self
            .backend
            .stop_with_session(&session, &next, run.status)?
            .ok_or_else(|| conflict(run, run.status))?;
        tracing::info!(
            run_id = %run.id,
            phase = %run.phase,
            duration_sec = session.duration_sec,
            "run stopped"
        );
        Ok(LoggedTransition {
            run: stopped,
            session,
        })
    }

    /// Log the finished interval and flip to the next phase.
    ///
    /// Durations and auto-start come from `settings` as they are now. The
    /// write only lands if the stored run is still counting towards the same
    /// deadline, so a deadline is logged at most once no matter how many
    /// observers race on it.
    pub fn complete_phase_and_switch(
        &self,
        run: &TimerRun,
        settings: &Settings,
        user_id: &str,
    ) -> Result<LoggedTransition> {
        if run.status != RunStatus::Running {
            return Err(reject(run, "Only a running phase can complete"));
        }
        let ends_at = run
            .ends_at
            .ok_or_else(|| reject(run, "Running run has no deadline"))?;
        check_owner(run, user_id)?;

        let now = self.now();
        if now < ends_at {
            return Err(reject(run, "Phase has not reached its deadline"));
        }

        let session = NewSession::completed(run, user_id, ends_at);
        let next_phase = run.phase.next();
        let next_duration_ms = settings.phase_duration_ms(next_phase);
        let next = if settings.auto_starts(next_phase) {
            TimerRun {
                phase: next_phase,
                status: RunStatus::Running,
                started_at: now,
                ends_at: Some(now + Duration::milliseconds(next_duration_ms)),
                remaining_ms: None,
                updated_at: now,
                ..run.clone()
            }
        } else {
            TimerRun {
                phase: next_phase,
                status: RunStatus::Paused,
                started_at: now,
                ends_at: None,
                remaining_ms: Some(next_duration_ms),
                updated_at: now,
                ..run.clone()
            }
        };

        let switched = self
            .backend
            .complete_phase(&session, &next, ends_at)?
            .ok_or_else(|| conflict(run, RunStatus::Running))?;
        tracing::info!(
            run_id = %run.id,
            completed = %run.phase,
            next = %switched.phase,
            status = %switched.status,
            late_ms = (now - ends_at).num_milliseconds(),
            "phase completed"
        );
        Ok(LoggedTransition {
            run: switched,
            session,
        })
    }
}

fn reject(run: &TimerRun, reason: &str) -> CoreError {
    tracing::warn!(run_id = %run.id, status = %run.status, reason, "transition rejected");
    CoreError::InvalidTransition(reason.to_string())
}

fn conflict(run: &TimerRun, expected: RunStatus) -> CoreError {
    tracing::warn!(run_id = %run.id, %expected, "run was modified concurrently");
    CoreError::Conflict {
        run_id: run.id.clone(),
        expected,
    }
}

fn check_owner(run: &TimerRun, user_id: &str) -> Result<()> {
    if run.user_id != user_id {
        return Err(reject(run, "Run belongs to another user"));
    }
    Ok(())
}
