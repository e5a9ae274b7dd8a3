//! SQLite-backed run store, session log and settings.
//!
//! Several processes (terminals, watchers) may open the same file. Every
//! conditional write is a single `UPDATE ... WHERE id = ? AND <guard> = ? AND
//! version = ?` checked through the affected row count. The version is bumped
//! on each write, so exactly one writer wins a race and a stale copy of the
//! row never lands.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration as StdDuration;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::backend::RunBackend;
use super::{data_dir, migrations};
use crate::error::{DatabaseError, Result};
use crate::session::{NewSession, Session};
use crate::settings::{AmbientSound, Settings};
use crate::timer::{RunStatus, TimerRun};

const BUSY_TIMEOUT: StdDuration = StdDuration::from_secs(5);

const RUN_COLUMNS: &str =
    "id, user_id, task_id, phase, status, started_at, ends_at, remaining_ms, updated_at, version";
const SESSION_COLUMNS: &str =
    "id, user_id, task_id, phase, started_at, ended_at, duration_sec, completed";

/// SQLite database holding one user's (or many users') timer state.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database at `~/.config/pomorun/pomorun.db`.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        Self::open_at(data_dir()?.join("pomorun.db"))
    }

    /// Open (or create) the database file at `path`.
    pub fn open_at(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: PathBuf::from(path),
            source,
        })?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Self::with_connection(conn)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        migrations::migrate(&conn)
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(Self { conn })
    }

    fn fetch_run_by_id(&self, id: &str) -> Result<Option<TimerRun>> {
        let sql = format!("SELECT {RUN_COLUMNS} FROM pomodoro_runs WHERE id = ?1");
        Ok(self
            .conn
            .query_row(&sql, params![id], row_to_run)
            .optional()?)
    }

    fn insert_session(conn: &Connection, session: &NewSession) -> rusqlite::Result<i64> {
        conn.execute(
            "INSERT INTO pomodoro_sessions
                (user_id, task_id, phase, started_at, ended_at, duration_sec, completed)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                session.user_id,
                session.task_id,
                session.phase.as_str(),
                format_ts(session.started_at),
                format_ts(session.ended_at),
                session.duration_sec,
                session.completed,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Seed the session log directly, bypassing run transitions.
    #[cfg(test)]
    fn append_session(&self, session: &NewSession) -> Result<i64> {
        Ok(Self::insert_session(&self.conn, session)?)
    }

    /// Write the mutable columns of `run` where `guard` holds and the stored
    /// version is still `run.version`.
    fn write_run_where(
        conn: &Connection,
        run: &TimerRun,
        guard: &str,
        guard_value: &str,
    ) -> rusqlite::Result<usize> {
        let sql = format!(
            "UPDATE pomodoro_runs
             SET task_id = ?1, phase = ?2, status = ?3, started_at = ?4,
                 ends_at = ?5, remaining_ms = ?6, updated_at = ?7,
                 version = version + 1
             WHERE id = ?8 AND {guard} = ?9 AND version = ?10"
        );
        conn.execute(
            &sql,
            params![
                run.task_id,
                run.phase.as_str(),
                run.status.as_str(),
                format_ts(run.started_at),
                run.ends_at.map(format_ts),
                run.remaining_ms,
                format_ts(run.updated_at),
                run.id,
                guard_value,
                run.version,
            ],
        )
    }

    /// Run `write` and append `session` in one transaction; roll back if
    /// `write` matched no row.
    fn write_with_session(
        &self,
        session: &NewSession,
        run: &TimerRun,
        guard: &str,
        guard_value: &str,
    ) -> Result<Option<TimerRun>> {
        let tx = self.conn.unchecked_transaction()?;
        let changed = Self::write_run_where(&tx, run, guard, guard_value)?;
        if changed == 0 {
            // Dropping the transaction rolls it back.
            return Ok(None);
        }
        Self::insert_session(&tx, session)?;
        tx.commit()?;
        self.fetch_run_by_id(&run.id)
    }
}

impl RunBackend for Database {
    fn fetch_current_run(&self, user_id: &str) -> Result<Option<TimerRun>> {
        let sql = format!(
            "SELECT {RUN_COLUMNS} FROM pomodoro_runs WHERE user_id = ?1 AND status != 'stopped'"
        );
        Ok(self
            .conn
            .query_row(&sql, params![user_id], row_to_run)
            .optional()?)
    }

    fn upsert_run(&self, run: &TimerRun) -> Result<TimerRun> {
        self.conn.execute(
            "INSERT INTO pomodoro_runs
                (id, user_id, task_id, phase, status, started_at, ends_at, remaining_ms, updated_at, version)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
             ON CONFLICT(user_id) DO UPDATE SET
                id = excluded.id,
                task_id = excluded.task_id,
                phase = excluded.phase,
                status = excluded.status,
                started_at = excluded.started_at,
                ends_at = excluded.ends_at,
                remaining_ms = excluded.remaining_ms,
                updated_at = excluded.updated_at,
                version = excluded.version",
            params![
                run.id,
                run.user_id,
                run.task_id,
                run.phase.as_str(),
                run.status.as_str(),
                format_ts(run.started_at),
                run.ends_at.map(format_ts),
                run.remaining_ms,
                format_ts(run.updated_at),
                run.version,
            ],
        )?;
        self.fetch_run_by_id(&run.id)?.ok_or_else(|| {
            DatabaseError::QueryFailed(format!("run {} vanished after upsert", run.id)).into()
        })
    }

    fn update_run_if(&self, run: &TimerRun, expected: RunStatus) -> Result<Option<TimerRun>> {
        let changed = Self::write_run_where(&self.conn, run, "status", expected.as_str())?;
        if changed == 0 {
            return Ok(None);
        }
        self.fetch_run_by_id(&run.id)
    }

    fn complete_phase(
        &self,
        session: &NewSession,
        run: &TimerRun,
        expected_ends_at: DateTime<Utc>,
    ) -> Result<Option<TimerRun>> {
        // The stored deadline only exists while running, so matching it also
        // proves the row is still running.
        self.write_with_session(session, run, "ends_at", &format_ts(expected_ends_at))
    }

    fn stop_with_session(
        &self,
        session: &NewSession,
        run: &TimerRun,
        expected: RunStatus,
    ) -> Result<Option<TimerRun>> {
        self.write_with_session(session, run, "status", expected.as_str())
    }

    fn sessions(&self, user_id: &str, limit: usize) -> Result<Vec<Session>> {
        let sql = format!(
            "SELECT {SESSION_COLUMNS} FROM pomodoro_sessions
             WHERE user_id = ?1
             ORDER BY started_at DESC, id DESC
             LIMIT ?2"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = stmt.query_map(params![user_id, limit], row_to_session)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn sessions_since(&self, user_id: &str, since: DateTime<Utc>) -> Result<Vec<Session>> {
        let sql = format!(
            "SELECT {SESSION_COLUMNS} FROM pomodoro_sessions
             WHERE user_id = ?1 AND started_at >= ?2
             ORDER BY started_at ASC, id ASC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![user_id, format_ts(since)], row_to_session)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn fetch_settings(&self, user_id: &str) -> Result<Option<Settings>> {
        Ok(self
            .conn
            .query_row(
                "SELECT focus_minutes, break_minutes, auto_start_focus, auto_start_break,
                        sound_enabled, sound_volume, ambient_sound
                 FROM pomodoro_settings WHERE user_id = ?1",
                params![user_id],
                |row| {
                    Ok(Settings {
                        focus_minutes: row.get(0)?,
                        break_minutes: row.get(1)?,
                        auto_start_focus: row.get(2)?,
                        auto_start_break: row.get(3)?,
                        sound_enabled: row.get(4)?,
                        sound_volume: row.get(5)?,
                        ambient_sound: parse_col::<AmbientSound>(row, 6)?,
                    })
                },
            )
            .optional()?)
    }

    fn upsert_settings(&self, user_id: &str, settings: &Settings) -> Result<Settings> {
        self.conn.execute(
            "INSERT INTO pomodoro_settings
                (user_id, focus_minutes, break_minutes, auto_start_focus, auto_start_break,
                 sound_enabled, sound_volume, ambient_sound, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT(user_id) DO UPDATE SET
                focus_minutes = excluded.focus_minutes,
                break_minutes = excluded.break_minutes,
                auto_start_focus = excluded.auto_start_focus,
                auto_start_break = excluded.auto_start_break,
                sound_enabled = excluded.sound_enabled,
                sound_volume = excluded.sound_volume,
                ambient_sound = excluded.ambient_sound,
                updated_at = excluded.updated_at",
            params![
                user_id,
                settings.focus_minutes,
                settings.break_minutes,
                settings.auto_start_focus,
                settings.auto_start_break,
                settings.sound_enabled,
                settings.sound_volume,
                settings.ambient_sound.as_str(),
                format_ts(Utc::now()),
            ],
        )?;
        Ok(settings.clone())
    }
}

// === Row helpers ===

/// Timestamps are stored as fixed-width RFC 3339 in UTC with millisecond
/// precision, so string comparison matches chronological order.
fn format_ts(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn conversion_error(idx: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, message.into())
}

fn parse_ts(row: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, format!("bad timestamp '{raw}': {e}")))
}

fn parse_opt_ts(row: &Row, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    match row.get::<_, Option<String>>(idx)? {
        None => Ok(None),
        Some(_) => parse_ts(row, idx).map(Some),
    }
}

fn parse_col<T>(row: &Row, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw: String = row.get(idx)?;
    raw.parse::<T>()
        .map_err(|e| conversion_error(idx, e.to_string()))
}

fn row_to_run(row: &Row) -> rusqlite::Result<TimerRun> {
    Ok(TimerRun {
        id: row.get(0)?,
        user_id: row.get(1)?,
        task_id: row.get(2)?,
        phase: parse_col(row, 3)?,
        status: parse_col(row, 4)?,
        started_at: parse_ts(row, 5)?,
        ends_at: parse_opt_ts(row, 6)?,
        remaining_ms: row.get(7)?,
        updated_at: parse_ts(row, 8)?,
        version: row.get(9)?,
    })
}

fn row_to_session(row: &Row) -> rusqlite::Result<Session> {
    Ok(Session {
        id: row.get(0)?,
        user_id: row.get(1)?,
        task_id: row.get(2)?,
        phase: parse_col(row, 3)?,
        started_at: parse_ts(row, 4)?,
        ended_at: parse_ts(row, 5)?,
        duration_sec: row.get(6)?,
        completed: row.get(7)?,
    })
}
