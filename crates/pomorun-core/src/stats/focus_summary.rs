//! Focus summary for the last N days.
//!
//! Only focus sessions count. Minutes are rounded per session for the daily
//! buckets and once over the total, so the daily values need not add up to
//! `total_focus_minutes` exactly.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::session::Session;
use crate::timer::Phase;

pub const DEFAULT_STATS_DAYS: u32 = 7;

/// One calendar day (UTC) of focus time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyFocus {
    pub date: NaiveDate,
    pub focus_minutes: i64,
    pub sessions: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    pub days: u32,
    pub total_sessions: u32,
    pub completed_sessions: u32,
    pub total_focus_minutes: i64,
    pub avg_session_minutes: i64,
    /// Percent of focus sessions that ran to their deadline, 0..=100.
    pub completion_rate: i64,
    /// Oldest first, one entry per day including empty ones.
    pub daily: Vec<DailyFocus>,
}

impl SessionStats {
    /// Lower bound for the sessions to feed into [`compute`](Self::compute).
    pub fn window_start(days: u32, now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::days(i64::from(days))
    }

    pub fn compute(sessions: &[Session], days: u32, today: NaiveDate) -> Self {
        let mut daily: Vec<DailyFocus> = (0..days)
            .rev()
            .map(|offset| DailyFocus {
                date: today - Duration::days(i64::from(offset)),
                focus_minutes: 0,
                sessions: 0,
            })
            .collect();

        let focus: Vec<&Session> = sessions.iter().filter(|s| s.phase == Phase::Focus).collect();
        let completed = focus.iter().filter(|s| s.completed).count();
        let total_sec: i64 = focus.iter().map(|s| s.duration_sec).sum();

        for session in &focus {
            let date = session.started_at.date_naive();
            if let Some(day) = daily.iter_mut().find(|d| d.date == date) {
                day.focus_minutes += round_minutes(session.duration_sec as f64);
                day.sessions += 1;
            }
        }

        let total = focus.len();
        let (avg_session_minutes, completion_rate) = if total == 0 {
            (0, 0)
        } else {
            (
                round_minutes(total_sec as f64 / total as f64),
                (completed as f64 / total as f64 * 100.0).round() as i64,
            )
        };

        Self {
            days,
            total_sessions: total as u32,
            completed_sessions: completed as u32,
            total_focus_minutes: round_minutes(total_sec as f64),
            avg_session_minutes,
            completion_rate,
            daily,
        }
    }
}

fn round_minutes(seconds: f64) -> i64 {
    (seconds / 60.0).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(phase: Phase, started_at: &str, duration_sec: i64, completed: bool) -> Session {
        let started_at: DateTime<Utc> = started_at.parse().unwrap();
        Session {
            id: 0,
            user_id: "u1".into(),
            task_id: None,
            phase,
            started_at,
            ended_at: started_at + Duration::seconds(duration_sec),
            duration_sec,
            completed,
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 7).unwrap()
    }

    #[test]
    fn empty_log_yields_zero_filled_days() {
        let stats = SessionStats::compute(&[], 7, today());
        assert_eq!(stats.total_sessions, 0);
        assert_eq!(stats.completion_rate, 0);
        assert_eq!(stats.avg_session_minutes, 0);
        assert_eq!(stats.daily.len(), 7);
        assert_eq!(stats.daily[0].date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(stats.daily[6].date, today());
        assert!(stats.daily.iter().all(|d| d.sessions == 0));
    }

    #[test]
    fn only_focus_sessions_count() {
        let sessions = vec![
            session(Phase::Focus, "2024-03-06T09:00:00Z", 1500, true),
            session(Phase::Break, "2024-03-06T09:25:00Z", 300, true),
            session(Phase::Focus, "2024-03-07T10:00:00Z", 600, false),
        ];
        let stats = SessionStats::compute(&sessions, 7, today());
        assert_eq!(stats.total_sessions, 2);
        assert_eq!(stats.completed_sessions, 1);
        assert_eq!(stats.total_focus_minutes, 35);
        assert_eq!(stats.avg_session_minutes, 18);
        assert_eq!(stats.completion_rate, 50);

        let yesterday = &stats.daily[5];
        assert_eq!(yesterday.focus_minutes, 25);
        assert_eq!(yesterday.sessions, 1);
        assert_eq!(stats.daily[6].focus_minutes, 10);
    }

    #[test]
    fn sessions_outside_the_buckets_only_affect_totals() {
        let sessions = vec![session(Phase::Focus, "2024-02-01T09:00:00Z", 1500, true)];
        let stats = SessionStats::compute(&sessions, 3, today());
        assert_eq!(stats.total_sessions, 1);
        assert!(stats.daily.iter().all(|d| d.sessions == 0));
    }

    #[test]
    fn daily_minutes_are_rounded_per_session() {
        let sessions = vec![
            session(Phase::Focus, "2024-03-07T08:00:00Z", 90, false),
            session(Phase::Focus, "2024-03-07T09:00:00Z", 90, false),
        ];
        let stats = SessionStats::compute(&sessions, 1, today());
        assert_eq!(stats.daily[0].focus_minutes, 4);
        assert_eq!(stats.total_focus_minutes, 3);
    }

    #[test]
    fn window_start_goes_back_whole_days() {
        let now: DateTime<Utc> = "2024-03-07T12:00:00Z".parse().unwrap();
        let start = SessionStats::window_start(7, now);
        assert_eq!(start, "2024-02-29T12:00:00Z".parse::<DateTime<Utc>>().unwrap());
    }
}
