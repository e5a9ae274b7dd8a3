//! Statistics over the session log.

mod focus_summary;

pub use focus_summary::{DailyFocus, SessionStats, DEFAULT_STATS_DAYS};
