//! Roll-ups over finished timer sessions.

use std::collections::BTreeMap;

use chrono::{DateTime, Local, NaiveDate, NaiveTime, Utc};

use crate::db::models::{ContextTime, DailyStats, GoalProgress, TimerSession, WeeklyEntry};

/// Start of `date` in local time, as UTC.
pub fn local_day_start(date: NaiveDate) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::MIN);
    midnight
        .and_local_timezone(Local)
        .earliest()
        .map(|start| start.with_timezone(&Utc))
        .unwrap_or_else(|| midnight.and_utc())
}

pub fn daily_stats(date: NaiveDate, sessions: Vec<TimerSession>) -> DailyStats {
    let mut breakdown: BTreeMap<String, u64> = BTreeMap::new();
    for session in &sessions {
        *breakdown.entry(session.context_id.clone()).or_insert(0) += session.duration_secs;
    }
    DailyStats {
        date,
        total_secs: sessions.iter().map(|s| s.duration_secs).sum(),
        sessions,
        context_breakdown: breakdown,
    }
}

/// Context with the most tracked time; ties go to the context tracked first.
pub fn most_productive(sessions: &[TimerSession]) -> Option<ContextTime> {
    let mut totals: Vec<ContextTime> = Vec::new();
    for session in sessions {
        match totals.iter_mut().find(|t| t.context_id == session.context_id) {
            Some(total) => total.total_secs += session.duration_secs,
            None => totals.push(ContextTime {
                context_id: session.context_id.clone(),
                total_secs: session.duration_secs,
            }),
        }
    }

    let mut best: Option<ContextTime> = None;
    for total in totals.into_iter().filter(|t| t.total_secs > 0) {
        if best.as_ref().map_or(true, |b| total.total_secs > b.total_secs) {
            best = Some(total);
        }
    }
    best
}

pub fn weekly_entry(date: NaiveDate, total_secs: u64) -> WeeklyEntry {
    WeeklyEntry {
        day: date.format("%a").to_string(),
        hours: (total_secs as f64 / 3600.0 * 10.0).round() / 10.0,
    }
}

pub fn goal_progress(total_secs: u64, goal_minutes: u64) -> GoalProgress {
    let current = total_secs as f64 / 60.0;
    let percentage = if goal_minutes == 0 {
        100
    } else {
        (current / goal_minutes as f64 * 100.0).round().min(100.0) as u8
    };
    GoalProgress {
        current_minutes: current.round() as u64,
        goal_minutes,
        percentage,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(context: &str, secs: u64) -> TimerSession {
        TimerSession {
            id: format!("{context}-{secs}"),
            context_id: context.into(),
            started_at: Utc::now(),
            ended_at: Some(Utc::now()),
            duration_secs: secs,
            interrupted: false,
        }
    }

    #[test]
    fn breakdown_sums_per_context() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
        let stats = daily_stats(date, vec![session("a", 60), session("b", 30), session("a", 90)]);
        assert_eq!(stats.total_secs, 180);
        assert_eq!(stats.context_breakdown["a"], 150);
        assert_eq!(stats.sessions.len(), 3);
    }

    #[test]
    fn most_productive_prefers_larger_total() {
        let sessions = vec![session("a", 60), session("b", 100), session("a", 30)];
        let best = most_productive(&sessions).unwrap();
        assert_eq!(best.context_id, "b");
        assert!(most_productive(&[]).is_none());
    }

    #[test]
    fn goal_progress_caps_at_one_hundred() {
        let progress = goal_progress(3 * 3600, 120);
        assert_eq!(progress.current_minutes, 180);
        assert_eq!(progress.percentage, 100);
        assert_eq!(goal_progress(30 * 60, 120).percentage, 25);
    }

    #[test]
    fn weekly_hours_round_to_a_tenth() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
        let entry = weekly_entry(date, 5400 + 200);
        assert_eq!(entry.day, "Mon");
        assert!((entry.hours - 1.6).abs() < 1e-9);
    }
}
