use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::session::{NewSession, Session};
use crate::settings::Settings;
use crate::timer::{RunStatus, TimerRun};

/// The persistence collaborator behind the run store.
///
/// Every call is scoped to one user. Conditional writes are check-and-set on
/// the observed row: besides their guard they require the stored `version`
/// to equal `run.version`, and bump it when they land. They return `Ok(None)`
/// when the stored row is not in the expected prior state, and leave nothing
/// behind in that case.
pub trait RunBackend {
    /// The user's run whose status is not `stopped`, if any.
    fn fetch_current_run(&self, user_id: &str) -> Result<Option<TimerRun>>;

    /// Insert or replace the user's run row (unique on `user_id`).
    fn upsert_run(&self, run: &TimerRun) -> Result<TimerRun>;

    /// Write `run` only if the stored row with the same id has status `expected`
    /// and is still at `run.version`.
    fn update_run_if(&self, run: &TimerRun, expected: RunStatus) -> Result<Option<TimerRun>>;

    /// Atomically append `session` and write `run`, only if the stored row is
    /// still running towards `expected_ends_at`.
    fn complete_phase(
        &self,
        session: &NewSession,
        run: &TimerRun,
        expected_ends_at: DateTime<Utc>,
    ) -> Result<Option<TimerRun>>;

    /// Atomically append `session` and write `run`, only if the stored row
    /// still has status `expected`.
    fn stop_with_session(
        &self,
        session: &NewSession,
        run: &TimerRun,
        expected: RunStatus,
    ) -> Result<Option<TimerRun>>;

    /// Most recent first.
    fn sessions(&self, user_id: &str, limit: usize) -> Result<Vec<Session>>;

    /// Sessions started at or after `since`, oldest first.
    fn sessions_since(&self, user_id: &str, since: DateTime<Utc>) -> Result<Vec<Session>>;

    fn fetch_settings(&self, user_id: &str) -> Result<Option<Settings>>;

    fn upsert_settings(&self, user_id: &str, settings: &Settings) -> Result<Settings>;
}

impl<T: RunBackend + ?Sized> RunBackend for &T {
    fn fetch_current_run(&self, user_id: &str) -> Result<Option<TimerRun>> {
        (**self).fetch_current_run(user_id)
    }

    fn upsert_run(&self, run: &TimerRun) -> Result<TimerRun> {
        (**self).upsert_run(run)
    }

    fn update_run_if(&self, run: &TimerRun, expected: RunStatus) -> Result<Option<TimerRun>> {
        (**self).update_run_if(run, expected)
    }

    fn complete_phase(
        &self,
        session: &NewSession,
        run: &TimerRun,
        expected_ends_at: DateTime<Utc>,
    ) -> Result<Option<TimerRun>> {
        (**self).complete_phase(session, run, expected_ends_at)
    }

    fn stop_with_session(
        &self,
        session: &NewSession,
        run: &TimerRun,
        expected: RunStatus,
    ) -> Result<Option<TimerRun>> {
        (**self).stop_with_session(session, run, expected)
    }

    fn sessions(&self, user_id: &str, limit: usize) -> Result<Vec<Session>> {
        (**self).sessions(user_id, limit)
    }

    fn sessions_since(&self, user_id: &str, since: DateTime<Utc>) -> Result<Vec<Session>> {
        (**self).sessions_since(user_id, since)
    }

    fn fetch_settings(&self, user_id: &str) -> Result<Option<Settings>> {
        (**self).fetch_settings(user_id)
    }

    fn upsert_settings(&self, user_id: &str, settings: &Settings) -> Result<Settings> {
        (**self).upsert_settings(user_id, settings)
    }
}
