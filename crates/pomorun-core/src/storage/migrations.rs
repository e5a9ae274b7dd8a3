//! Database schema migrations for pomorun.
//!
//! Migrations are versioned and applied automatically when opening the database.
//! The `schema_version` table tracks the current migration version.

use rusqlite::{Connection, Result as SqliteResult};

/// Current schema version.
///
/// Increment this when adding new migrations.
pub const SCHEMA_VERSION: i32 = 3;

/// Apply all pending migrations to bring the database to the current schema version.
///
/// # Errors
/// Returns an error if migration fails.
pub fn migrate(conn: &Connection) -> SqliteResult<()> {
    create_schema_version_table(conn)?;

    let current_version = get_schema_version(conn);

    if current_version < 1 {
        migrate_v1(conn)?;
    }
    if current_version < 2 {
        migrate_v2(conn)?;
    }
    if current_version < 3 {
        migrate_v3(conn)?;
    }

    Ok(())
}

fn create_schema_version_table(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        );",
    )
}

/// Returns 0 if no version is set (initial database).
pub fn get_schema_version(conn: &Connection) -> i32 {
    conn.query_row("SELECT version FROM schema_version", [], |row| {
        row.get::<_, i32>(0)
    })
    .unwrap_or_else(|e| {
        if !matches!(e, rusqlite::Error::QueryReturnedNoRows) {
            tracing::warn!(error = %e, "failed to read schema_version");
        }
        0
    })
}

fn set_schema_version(conn: &Connection, version: i32) -> SqliteResult<()> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute(
        "INSERT INTO schema_version (version) VALUES (?1)",
        [version],
    )?;
    Ok(())
}

/// Migration v1: settings, runs and the session log.
///
/// `pomodoro_runs.user_id` is UNIQUE: one run row per user, whatever its status.
fn migrate_v1(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;

    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS pomodoro_settings (
            user_id          TEXT PRIMARY KEY,
            focus_minutes    INTEGER NOT NULL DEFAULT 25,
            break_minutes    INTEGER NOT NULL DEFAULT 5,
            auto_start_focus INTEGER NOT NULL DEFAULT 0,
            auto_start_break INTEGER NOT NULL DEFAULT 0,
            sound_enabled    INTEGER NOT NULL DEFAULT 1,
            sound_volume     REAL NOT NULL DEFAULT 0.7,
            updated_at       TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS pomodoro_runs (
            id           TEXT PRIMARY KEY,
            user_id      TEXT NOT NULL UNIQUE,
            task_id      TEXT,
            phase        TEXT NOT NULL CHECK (phase IN ('focus', 'break')),
            status       TEXT NOT NULL CHECK (status IN ('running', 'paused', 'stopped')),
            started_at   TEXT NOT NULL,
            ends_at      TEXT,
            remaining_ms INTEGER,
            updated_at   TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS pomodoro_sessions (
            id           INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id      TEXT NOT NULL,
            task_id      TEXT,
            phase        TEXT NOT NULL CHECK (phase IN ('focus', 'break')),
            started_at   TEXT NOT NULL,
            ended_at     TEXT NOT NULL,
            duration_sec INTEGER NOT NULL,
            completed    INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_sessions_user_started
            ON pomodoro_sessions(user_id, started_at);",
    )?;

    set_schema_version(&tx, 1)?;
    tx.commit()
}

/// Migration v2: ambient sound preference.
fn migrate_v2(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;

    let has_ambient: bool = tx
        .query_row(
            "SELECT COUNT(*) FROM pragma_table_info('pomodoro_settings') WHERE name = 'ambient_sound'",
            [],
            |row| row.get::<_, i32>(0),
        )
        .unwrap_or(0)
        > 0;

    if !has_ambient {
        tx.execute_batch(
            "ALTER TABLE pomodoro_settings ADD COLUMN ambient_sound TEXT NOT NULL DEFAULT 'none';",
        )?;
    }

    set_schema_version(&tx, 2)?;
    tx.commit()
}

/// Migration v3: write version on runs, checked by every conditional update.
fn migrate_v3(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;

    let has_version: bool = tx
        .query_row(
            "SELECT COUNT(*) FROM pragma_table_info('pomodoro_runs') WHERE name = 'version'",
            [],
            |row| row.get::<_, i32>(0),
        )
        .unwrap_or(0)
        > 0;

    if !has_version {
        tx.execute_batch(
            "ALTER TABLE pomodoro_runs ADD COLUMN version INTEGER NOT NULL DEFAULT 0;",
        )?;
    }

    set_schema_version(&tx, 3)?;
    tx.commit()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrate_from_scratch() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        assert_eq!(get_schema_version(&conn), SCHEMA_VERSION);

        let stmt = conn
            .prepare("SELECT user_id, ambient_sound FROM pomodoro_settings")
            .unwrap();
        drop(stmt);
    }

    #[test]
    fn test_migrate_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        migrate(&conn).unwrap();
        assert_eq!(get_schema_version(&conn), SCHEMA_VERSION);
    }

    #[test]
    fn test_incremental_migration_backfills_ambient_sound() {
        let conn = Connection::open_in_memory().unwrap();
        create_schema_version_table(&conn).unwrap();
        migrate_v1(&conn).unwrap();
        conn.execute(
            "INSERT INTO pomodoro_settings (user_id, updated_at) VALUES ('u1', '2024-01-01T00:00:00Z')",
            [],
        )
        .unwrap();

        migrate(&conn).unwrap();

        let ambient: String = conn
            .query_row(
                "SELECT ambient_sound FROM pomodoro_settings WHERE user_id = 'u1'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(ambient, "none");
    }

    #[test]
    fn test_v3_adds_run_version() {
        let conn = Connection::open_in_memory().unwrap();
        create_schema_version_table(&conn).unwrap();
        migrate_v1(&conn).unwrap();
        migrate_v2(&conn).unwrap();
        conn.execute(
            "INSERT INTO pomodoro_runs (id, user_id, phase, status, started_at, updated_at)
             VALUES ('a', 'u1', 'focus', 'running', 'now', 'now')",
            [],
        )
        .unwrap();

        migrate(&conn).unwrap();

        let version: i64 = conn
            .query_row("SELECT version FROM pomodoro_runs WHERE id = 'a'", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(version, 0);
        assert_eq!(get_schema_version(&conn), 3);
    }

    #[test]
    fn test_one_run_row_per_user() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        let insert = "INSERT INTO pomodoro_runs (id, user_id, phase, status, started_at, updated_at)
                      VALUES (?1, 'u1', 'focus', 'running', 'now', 'now')";
        conn.execute(insert, ["a"]).unwrap();
        assert!(conn.execute(insert, ["b"]).is_err());
    }
}
