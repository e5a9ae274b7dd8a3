//! Client-side timer controller.
//!
//! The controller keeps a cached view of the user's run and recomputes the
//! time left from it on every tick; it never counts down on its own, so a
//! missed tick is corrected by the next one. The caller drives it:
//!
//! ```ignore
//! let mut controller = TimerController::new(store, "user-1");
//! controller.refresh()?;
//! controller.start(None)?;
//! // Once per second:
//! let tick = controller.tick();
//! // Every poll interval:
//! controller.refresh()?;
//! ```
//!
//! A crossed deadline fires `complete_phase_and_switch` at most once per
//! [`TransitionKey`]. Failed commands become [`Notice`]s and are followed by a
//! refetch; nothing is retried.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::run::{TimerRun, TransitionKey};
use super::store::{LoggedTransition, TimerRunStore};
use crate::clock::Clock;
use crate::error::{CoreError, Result};
use crate::events::Event;
use crate::storage::RunBackend;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    Start,
    Pause,
    Resume,
    Stop,
    Reset,
    SkipBreak,
    CompletePhase,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    /// Someone else changed the run first. Refetched; retry if still wanted.
    Conflict,
    /// The command made no sense for the run as it was.
    InvalidTransition,
    /// The backend failed. The command did not land.
    Persistence,
    Other,
}

/// A one-shot, user-visible notification about a failed command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub command: Command,
    pub kind: NoticeKind,
    pub message: String,
    pub at: DateTime<Utc>,
}

impl Notice {
    fn from_error(command: Command, err: &CoreError, at: DateTime<Utc>) -> Self {
        let kind = if err.is_conflict() {
            NoticeKind::Conflict
        } else if err.is_invalid_transition() {
            NoticeKind::InvalidTransition
        } else if err.is_persistence() {
            NoticeKind::Persistence
        } else {
            NoticeKind::Other
        };
        Self {
            command,
            kind,
            message: err.to_string(),
            at,
        }
    }
}

/// Result of one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    pub run: Option<TimerRun>,
    pub time_left_ms: Option<i64>,
    /// Set when this tick fired a phase completion.
    pub completed: Option<Event>,
    pub at: DateTime<Utc>,
}

impl Tick {
    pub fn time_left_secs(&self) -> Option<i64> {
        self.time_left_ms.map(|ms| (ms + 999) / 1000)
    }
}

pub struct TimerController<B, C> {
    store: TimerRunStore<B, C>,
    user_id: String,
    run: Option<TimerRun>,
    last_fired: Option<TransitionKey>,
    notices: Vec<Notice>,
}

impl<B: RunBackend, C: Clock> TimerController<B, C> {
    /// The cached view starts empty; call [`refresh`](Self::refresh) first.
    pub fn new(store: TimerRunStore<B, C>, user_id: impl Into<String>) -> Self {
        Self {
            store,
            user_id: user_id.into(),
            run: None,
            last_fired: None,
            notices: Vec::new(),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn store(&self) -> &TimerRunStore<B, C> {
        &self.store
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// The cached run, as of the last refresh or mutation.
    pub fn run(&self) -> Option<&TimerRun> {
        self.run.as_ref()
    }

    pub fn time_left_ms(&self) -> Option<i64> {
        let now = self.store.now();
        self.run.as_ref().and_then(|r| r.time_left_ms(now))
    }

    pub fn last_fired(&self) -> Option<&TransitionKey> {
        self.last_fired.as_ref()
    }

    pub fn snapshot(&self) -> Event {
        Event::snapshot(self.run.as_ref(), self.store.now())
    }

    /// Drain pending notices. Each notice is returned exactly once.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    // ── Sync ─────────────────────────────────────────────────────────

    /// Refetch the run from the store. On failure the cached view is kept.
    pub fn refresh(&mut self) -> Result<Option<&TimerRun>> {
        self.refetch()?;
        Ok(self.run.as_ref())
    }

    fn refetch(&mut self) -> Result<()> {
        let run = self.store.current_run(&self.user_id)?;
        tracing::debug!(user_id = %self.user_id, status = ?run.as_ref().map(|r| r.status), "run refreshed");
        self.run = run;
        Ok(())
    }

    /// Recompute the countdown and fire a due phase completion.
    pub fn tick(&mut self) -> Tick {
        let now = self.store.now();
        let completed = self.fire_due_completion(now);
        let run = self.run.clone();
        let time_left_ms = run.as_ref().and_then(|r| r.time_left_ms(now));
        Tick {
            run,
            time_left_ms,
            completed,
            at: now,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start a fresh focus run. A deadline already crossed by the cached run
    /// is completed (and logged) first; if that completion fails for any
    /// reason other than a conflict, the start is refused so the interval is
    /// not overwritten unlogged.
    pub fn start(&mut self, task_id: Option<&str>) -> Result<Event> {
        let now = self.store.now();
        // Reissued even if a tick already tried this deadline: a failed
        // completion leaves the cached run at the crossed deadline.
        if let Some(current) = self.run.clone().filter(|r| r.deadline_reached(now)) {
            self.last_fired = current.transition_key();
            match self.complete(&current) {
                Err(err) if !err.is_conflict() => return Err(err),
                _ => {}
            }
        }

        let user_id = self.user_id.clone();
        let run = self.execute(Command::Start, |store| {
            let settings = store.settings(&user_id)?;
            store.start_run(&user_id, settings.focus_minutes, task_id)
        })?;
        let ends_at = run.ends_at.unwrap_or(run.started_at);
        let event = Event::RunStarted {
            run_id: run.id.clone(),
            task_id: run.task_id.clone(),
            duration_secs: (ends_at - run.started_at).num_seconds(),
            ends_at,
            at: run.updated_at,
        };
        self.converge(run);
        Ok(event)
    }

    /// No-op without a cached run.
    pub fn pause(&mut self) -> Result<Option<Event>> {
        let Some(current) = self.run.clone() else {
            return Ok(None);
        };
        let run = self.execute(Command::Pause, |store| store.pause_run(&current))?;
        let event = Event::RunPaused {
            run_id: run.id.clone(),
            phase: run.phase,
            remaining_ms: run.remaining_ms.unwrap_or(0),
            at: run.updated_at,
        };
        self.converge(run);
        Ok(Some(event))
    }

    /// No-op without a cached run.
    pub fn resume(&mut self) -> Result<Option<Event>> {
        let Some(current) = self.run.clone() else {
            return Ok(None);
        };
        let run = self.execute(Command::Resume, |store| store.resume_run(&current))?;
        let ends_at = run.ends_at.unwrap_or(run.updated_at);
        let event = Event::RunResumed {
            run_id: run.id.clone(),
            phase: run.phase,
            remaining_ms: (ends_at - run.updated_at).num_milliseconds(),
            ends_at,
            at: run.updated_at,
        };
        self.converge(run);
        Ok(Some(event))
    }

    /// No-op without a cached run.
    pub fn stop(&mut self) -> Result<Option<Event>> {
        let Some(current) = self.run.clone() else {
            return Ok(None);
        };
        let user_id = self.user_id.clone();
        let done = self.execute(Command::Stop, |store| {
            store.stop_run(Some(&current), &user_id)
        })?;
        let event = Event::RunStopped {
            run_id: done.run.id.clone(),
            phase: done.session.phase,
            duration_sec: done.session.duration_sec,
            at: done.session.ended_at,
        };
        self.converge(done.run);
        Ok(Some(event))
    }

    /// Rewind the current phase to its full length. No-op without a cached run.
    pub fn reset(&mut self) -> Result<Option<Event>> {
        let Some(current) = self.run.clone() else {
            return Ok(None);
        };
        let user_id = self.user_id.clone();
        let run = self.execute(Command::Reset, |store| {
            let settings = store.settings(&user_id)?;
            store.reset_run(&current, &settings)
        })?;
        let event = Event::RunReset {
            run_id: run.id.clone(),
            phase: run.phase,
            remaining_ms: run.remaining_ms.unwrap_or(0),
            at: run.updated_at,
        };
        self.converge(run);
        Ok(Some(event))
    }

    /// No-op without a cached run.
    pub fn skip_break(&mut self) -> Result<Option<Event>> {
        let Some(current) = self.run.clone() else {
            return Ok(None);
        };
        let user_id = self.user_id.clone();
        let run = self.execute(Command::SkipBreak, |store| {
            let settings = store.settings(&user_id)?;
            store.skip_break_run(&current, &settings)
        })?;
        let event = Event::BreakSkipped {
            run_id: run.id.clone(),
            remaining_ms: run.remaining_ms.unwrap_or(0),
            at: run.updated_at,
        };
        self.converge(run);
        Ok(Some(event))
    }

    /// Manually complete the cached run's crossed deadline.
    ///
    /// Used to reissue a completion whose automatic attempt failed; the
    /// one-shot guard never fires the same deadline twice on its own.
    pub fn complete_phase(&mut self) -> Result<Option<Event>> {
        let Some(current) = self.run.clone() else {
            return Ok(None);
        };
        let key = current.transition_key();
        let done = self.complete(&current)?;
        self.last_fired = key;
        Ok(Some(done))
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// Fire the completion for the cached run if its deadline is crossed and
    /// that deadline has not fired before.
    fn fire_due_completion(&mut self, now: DateTime<Utc>) -> Option<Event> {
        let current = self.run.as_ref().filter(|r| r.deadline_reached(now))?.clone();
        let key = current.transition_key()?;
        if self.last_fired.as_ref() == Some(&key) {
            return None;
        }
        // Remember the key before the write: a slow or failing write must not
        // be fired again by the next tick.
        self.last_fired = Some(key);
        self.complete(&current).ok()
    }

    fn complete(&mut self, current: &TimerRun) -> Result<Event> {
        let user_id = self.user_id.clone();
        let done: LoggedTransition = self.execute(Command::CompletePhase, |store| {
            let settings = store.settings(&user_id)?;
            store.complete_phase_and_switch(current, &settings, &user_id)
        })?;
        let event = Event::PhaseCompleted {
            run_id: done.run.id.clone(),
            completed_phase: done.session.phase,
            next_phase: done.run.phase,
            next_status: done.run.status,
            duration_sec: done.session.duration_sec,
            at: done.run.updated_at,
        };
        self.converge(done.run);
        Ok(event)
    }

    /// Run one store call. Failures are recorded as a notice and followed by
    /// a refetch so the view reflects reality before any retry.
    fn execute<T>(
        &mut self,
        command: Command,
        f: impl FnOnce(&TimerRunStore<B, C>) -> Result<T>,
    ) -> Result<T> {
        match f(&self.store) {
            Ok(value) => Ok(value),
            Err(err) => {
                tracing::warn!(user_id = %self.user_id, ?command, error = %err, "command failed");
                self.notices
                    .push(Notice::from_error(command, &err, self.store.now()));
                if let Err(refresh_err) = self.refetch() {
                    tracing::warn!(error = %refresh_err, "refetch after failure failed; keeping cached run");
                }
                Err(err)
            }
        }
    }

    /// After a successful mutation, refetch so every reader converges. If
    /// the refetch fails, the mutation's own result stands in.
    fn converge(&mut self, written: TimerRun) {
        if let Err(err) = self.refetch() {
            tracing::warn!(error = %err, "refetch after mutation failed");
            self.run = written.is_active().then_some(written);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::settings::Settings;
    use crate::storage::Database;
    use crate::timer::{Phase, RunStatus};
    use chrono::Duration;

    fn t0() -> DateTime<Utc> {
        "2024-03-01T09:00:00Z".parse().unwrap()
    }

    fn controller<'a>(db: &'a Database, clock: &ManualClock) -> TimerController<&'a Database, ManualClock> {
        let mut c = TimerController::new(TimerRunStore::new(db, clock.clone()), "u1");
        c.refresh().unwrap();
        c
    }

    fn session_count(db: &Database) -> i64 {
        db.conn()
            .query_row("SELECT COUNT(*) FROM pomodoro_sessions", [], |r| r.get(0))
            .unwrap()
    }

    #[test]
    fn commands_are_noops_without_a_run() {
        let db = Database::open_memory().unwrap();
        let clock = ManualClock::new(t0());
        let mut c = controller(&db, &clock);
        assert_eq!(c.pause().unwrap(), None);
        assert_eq!(c.resume().unwrap(), None);
        assert_eq!(c.stop().unwrap(), None);
        assert_eq!(c.reset().unwrap(), None);
        assert_eq!(c.skip_break().unwrap(), None);
        assert_eq!(c.complete_phase().unwrap(), None);
        assert!(c.take_notices().is_empty());
    }

    #[test]
    fn tick_recomputes_from_the_record() {
        let db = Database::open_memory().unwrap();
        let clock = ManualClock::new(t0());
        let mut c = controller(&db, &clock);
        c.start(None).unwrap();

        clock.advance(Duration::seconds(1));
        assert_eq!(c.tick().time_left_ms, Some(25 * 60 * 1000 - 1000));

        // A backgrounded tab skips ticks; the next one is still exact.
        clock.advance(Duration::minutes(10));
        let tick = c.tick();
        assert_eq!(tick.time_left_secs(), Some(14 * 60 + 59));
        assert!(tick.completed.is_none());
    }

    #[test]
    fn deadline_fires_exactly_once() {
        let db = Database::open_memory().unwrap();
        let clock = ManualClock::new(t0());
        let mut c = controller(&db, &clock);
        c.start(None).unwrap();
        clock.advance(Duration::minutes(25));

        let first = c.tick();
        assert!(matches!(
            first.completed,
            Some(Event::PhaseCompleted {
                completed_phase: Phase::Focus,
                next_phase: Phase::Break,
                next_status: RunStatus::Paused,
                duration_sec: 1500,
                ..
            })
        ));
        for _ in 0..5 {
            assert!(c.tick().completed.is_none());
        }
        assert_eq!(session_count(&db), 1);
        assert_eq!(c.run().unwrap().phase, Phase::Break);
    }

    #[test]
    fn stale_view_completion_conflicts_and_converges() {
        let db = Database::open_memory().unwrap();
        let clock = ManualClock::new(t0());
        let mut a = controller(&db, &clock);
        a.start(None).unwrap();
        let mut b = controller(&db, &clock);

        clock.advance(Duration::minutes(25));
        assert!(a.tick().completed.is_some());

        // `b` still holds the pre-completion run and tries the same deadline.
        let tick = b.tick();
        assert!(tick.completed.is_none());
        let notices = b.take_notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].kind, NoticeKind::Conflict);
        assert_eq!(notices[0].command, Command::CompletePhase);

        // Refetched after the conflict, and no retry on later ticks.
        assert_eq!(b.run().unwrap().phase, Phase::Break);
        assert!(b.tick().completed.is_none());
        assert!(b.take_notices().is_empty());
        assert_eq!(session_count(&db), 1);
    }

    #[test]
    fn auto_start_chain_fires_each_deadline_once() {
        let db = Database::open_memory().unwrap();
        let store = TimerRunStore::new(&db, ManualClock::new(t0()));
        store
            .update_settings(
                "u1",
                &Settings {
                    auto_start_break: true,
                    auto_start_focus: true,
                    ..Settings::default()
                },
            )
            .unwrap();
        let clock = ManualClock::new(t0());
        let mut c = controller(&db, &clock);
        c.start(None).unwrap();

        clock.advance(Duration::minutes(25));
        assert!(c.tick().completed.is_some());
        assert_eq!(c.run().unwrap().status, RunStatus::Running);
        assert_eq!(c.run().unwrap().phase, Phase::Break);

        clock.advance(Duration::minutes(5));
        assert!(c.tick().completed.is_some());
        assert_eq!(c.run().unwrap().phase, Phase::Focus);
        assert_eq!(session_count(&db), 2);
    }

    #[test]
    fn failed_pause_becomes_a_notice_and_refetches() {
        let db = Database::open_memory().unwrap();
        let clock = ManualClock::new(t0());
        let mut a = controller(&db, &clock);
        a.start(None).unwrap();
        let mut b = controller(&db, &clock);

        a.pause().unwrap();
        let err = b.pause().unwrap_err();
        assert!(err.is_conflict());
        let notices = b.take_notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].kind, NoticeKind::Conflict);
        assert!(b.take_notices().is_empty());
        assert_eq!(b.run().unwrap().status, RunStatus::Paused);
    }

    #[test]
    fn pausing_a_paused_run_is_an_invalid_transition_notice() {
        let db = Database::open_memory().unwrap();
        let clock = ManualClock::new(t0());
        let mut c = controller(&db, &clock);
        c.start(None).unwrap();
        c.pause().unwrap();

        assert!(c.pause().unwrap_err().is_invalid_transition());
        assert_eq!(c.take_notices()[0].kind, NoticeKind::InvalidTransition);
        assert_eq!(session_count(&db), 0);
    }

    #[test]
    fn start_completes_a_crossed_deadline_first() {
        let db = Database::open_memory().unwrap();
        let clock = ManualClock::new(t0());
        let mut c = controller(&db, &clock);
        c.start(None).unwrap();
        clock.advance(Duration::minutes(26));

        // No tick ran since the deadline; starting over must still log it.
        c.start(Some("next-task")).unwrap();
        let sessions = c.store().sessions("u1", 10).unwrap();
        assert_eq!(sessions.len(), 1);
        assert!(sessions[0].completed);
        assert_eq!(c.run().unwrap().phase, Phase::Focus);
        assert_eq!(c.run().unwrap().task_id.as_deref(), Some("next-task"));
    }

    #[test]
    fn stop_logs_and_clears_the_view() {
        let db = Database::open_memory().unwrap();
        let clock = ManualClock::new(t0());
        let mut c = controller(&db, &clock);
        c.start(None).unwrap();
        clock.advance(Duration::seconds(90));

        let event = c.stop().unwrap().unwrap();
        assert!(matches!(event, Event::RunStopped { duration_sec: 90, .. }));
        assert!(c.run().is_none());
        assert_eq!(c.tick().time_left_ms, None);
    }

    #[test]
    fn pause_resume_preserves_remaining_time() {
        let db = Database::open_memory().unwrap();
        let clock = ManualClock::new(t0());
        let mut c = controller(&db, &clock);
        c.start(None).unwrap();
        clock.advance(Duration::milliseconds(123_456));
        let before = c.time_left_ms().unwrap();

        c.pause().unwrap();
        clock.advance(Duration::minutes(40));
        c.resume().unwrap();
        let after = c.time_left_ms().unwrap();

        assert!((before - after).abs() < 1000, "{before} vs {after}");
    }

    /// Delegates to SQLite but can fail completions on demand.
    struct FlakyCompletion<'a> {
        db: &'a Database,
        fail: std::cell::Cell<bool>,
        attempts: std::cell::Cell<u32>,
    }

    impl RunBackend for FlakyCompletion<'_> {
        fn fetch_current_run(&self, user_id: &str) -> Result<Option<TimerRun>> {
            self.db.fetch_current_run(user_id)
        }
        fn upsert_run(&self, run: &TimerRun) -> Result<TimerRun> {
            self.db.upsert_run(run)
        }
        fn update_run_if(&self, run: &TimerRun, expected: RunStatus) -> Result<Option<TimerRun>> {
            self.db.update_run_if(run, expected)
        }
        fn complete_phase(
            &self,
            session: &crate::session::NewSession,
            run: &TimerRun,
            expected_ends_at: DateTime<Utc>,
        ) -> Result<Option<TimerRun>> {
            self.attempts.set(self.attempts.get() + 1);
            if self.fail.get() {
                return Err(crate::error::DatabaseError::Locked.into());
            }
            self.db.complete_phase(session, run, expected_ends_at)
        }
        fn stop_with_session(
            &self,
            session: &crate::session::NewSession,
            run: &TimerRun,
            expected: RunStatus,
        ) -> Result<Option<TimerRun>> {
            self.db.stop_with_session(session, run, expected)
        }
        fn sessions(&self, user_id: &str, limit: usize) -> Result<Vec<crate::session::Session>> {
            self.db.sessions(user_id, limit)
        }
        fn sessions_since(
            &self,
            user_id: &str,
            since: DateTime<Utc>,
        ) -> Result<Vec<crate::session::Session>> {
            self.db.sessions_since(user_id, since)
        }
        fn fetch_settings(&self, user_id: &str) -> Result<Option<Settings>> {
            self.db.fetch_settings(user_id)
        }
        fn upsert_settings(&self, user_id: &str, settings: &Settings) -> Result<Settings> {
            self.db.upsert_settings(user_id, settings)
        }
    }

    #[test]
    fn failed_completion_is_not_retried_until_reissued() {
        let db = Database::open_memory().unwrap();
        let flaky = FlakyCompletion {
            db: &db,
            fail: std::cell::Cell::new(true),
            attempts: std::cell::Cell::new(0),
        };
        let clock = ManualClock::new(t0());
        let mut c = TimerController::new(TimerRunStore::new(&flaky, clock.clone()), "u1");
        c.start(None).unwrap();
        clock.advance(Duration::minutes(25));

        assert!(c.tick().completed.is_none());
        let notices = c.take_notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].kind, NoticeKind::Persistence);

        // The visible countdown stays where it was.
        let tick = c.tick();
        assert_eq!(tick.time_left_ms, Some(0));
        assert_eq!(tick.run.unwrap().phase, Phase::Focus);

        flaky.fail.set(false);
        assert!(c.tick().completed.is_none());
        assert_eq!(flaky.attempts.get(), 1);

        let event = c.complete_phase().unwrap();
        assert!(matches!(event, Some(Event::PhaseCompleted { .. })));
        assert_eq!(flaky.attempts.get(), 2);
        assert_eq!(session_count(&db), 1);
    }

    #[test]
    fn start_is_refused_while_the_crossed_deadline_is_unlogged() {
        let db = Database::open_memory().unwrap();
        let flaky = FlakyCompletion {
            db: &db,
            fail: std::cell::Cell::new(true),
            attempts: std::cell::Cell::new(0),
        };
        let clock = ManualClock::new(t0());
        let mut c = TimerController::new(TimerRunStore::new(&flaky, clock.clone()), "u1");
        let first = c.start(None).unwrap();
        let Event::RunStarted { run_id, .. } = first else {
            panic!("expected run_started");
        };
        clock.advance(Duration::minutes(25));
        c.tick();
        c.take_notices();

        let err = c.start(Some("next")).unwrap_err();
        assert!(err.is_persistence());
        assert_eq!(c.take_notices()[0].kind, NoticeKind::Persistence);
        assert_eq!(c.run().unwrap().id, run_id);
        assert_eq!(session_count(&db), 0);

        flaky.fail.set(false);
        c.start(Some("next")).unwrap();
        assert_eq!(session_count(&db), 1);
        let run = c.run().unwrap();
        assert_ne!(run.id, run_id);
        assert_eq!(run.task_id.as_deref(), Some("next"));
        assert_eq!(flaky.attempts.get(), 3);
    }

    #[test]
    fn reset_and_skip_break_park_the_run() {
        let db = Database::open_memory().unwrap();
        let clock = ManualClock::new(t0());
        let mut c = controller(&db, &clock);
        c.start(None).unwrap();
        clock.advance(Duration::minutes(5));

        let event = c.reset().unwrap().unwrap();
        assert!(matches!(event, Event::RunReset { remaining_ms: 1_500_000, .. }));
        assert_eq!(c.run().unwrap().status, RunStatus::Paused);

        // Skipping a focus phase makes no sense.
        assert!(c.skip_break().unwrap_err().is_invalid_transition());
        assert_eq!(c.take_notices()[0].kind, NoticeKind::InvalidTransition);

        c.resume().unwrap();
        clock.advance(Duration::minutes(25));
        assert!(c.tick().completed.is_some());
        assert_eq!(c.run().unwrap().phase, Phase::Break);

        let event = c.skip_break().unwrap().unwrap();
        assert!(matches!(event, Event::BreakSkipped { remaining_ms: 1_500_000, .. }));
        let run = c.run().unwrap();
        assert_eq!(run.phase, Phase::Focus);
        assert_eq!(run.status, RunStatus::Paused);
        assert_eq!(session_count(&db), 1);
    }
}
