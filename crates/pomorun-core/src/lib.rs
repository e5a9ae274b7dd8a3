//! # Pomorun Core Library
//!
//! Business logic for Pomorun, a pomodoro timer whose state lives in one
//! persisted record per user. Every client (the `pomorun` CLI, or any other
//! front end over this crate) reads the same record and derives its
//! countdown from wall-clock timestamps, so all of them agree without
//! talking to each other.
//!
//! ## Architecture
//!
//! - **Run store**: Server-authoritative state transitions on the user's
//!   current run (start, pause, resume, stop, phase completion), written with
//!   check-and-set so racing clients cannot double-apply a transition
//! - **Controller**: A client-side cached view that recomputes the countdown
//!   on every `tick()` and fires each crossed deadline at most once
//! - **Storage**: SQLite for runs, sessions and settings; TOML for local
//!   configuration
//! - **Stats**: Focus summaries over the session log
//!
//! ## Key Components
//!
//! - [`TimerRunStore`]: Transitions on the persisted run
//! - [`TimerController`]: Tick-driven client view with one-shot completion
//! - [`Database`]: The SQLite [`RunBackend`]
//! - [`Config`]: Application configuration management

pub mod clock;
pub mod error;
pub mod events;
pub mod session;
pub mod settings;
pub mod stats;
pub mod storage;
pub mod timer;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{ConfigError, CoreError, DatabaseError, Result, ValidationError};
pub use events::Event;
pub use session::{NewSession, Session, DEFAULT_SESSION_LIMIT};
pub use settings::{AmbientSound, Settings};
pub use stats::{DailyFocus, SessionStats, DEFAULT_STATS_DAYS};
pub use storage::{Config, Database, RunBackend};
pub use timer::{
    Command, LoggedTransition, Notice, NoticeKind, Phase, RunStatus, Tick, TimerController,
    TimerRun, TimerRunStore, TransitionKey,
};
