use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Instant;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum TimerStatus {
    #[default]
    Idle,
    Running,
    Paused,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TimerState {
    pub status: TimerStatus,
    pub session_id: Option<String>,
    pub context_id: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub elapsed_ms: u64,
    /// Time accumulated from earlier running windows; combines with `running_anchor`
    /// to compute the true elapsed duration.
    #[serde(skip)]
    pub elapsed_ms_baseline: u64,
    #[serde(skip)]
    pub running_anchor: Option<Instant>,
}

impl TimerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.status != TimerStatus::Idle
    }

    pub fn current_elapsed_ms(&self) -> u64 {
        if let (TimerStatus::Running, Some(anchor)) = (self.status, self.running_anchor) {
            self.elapsed_ms_baseline
                .saturating_add(anchor.elapsed().as_millis() as u64)
        } else {
            self.elapsed_ms
        }
    }

    pub fn sync_elapsed_from_anchor(&mut self) {
        self.elapsed_ms = self.current_elapsed_ms();
    }

    pub fn begin_session(
        &mut self,
        session_id: String,
        context_id: String,
        start_at: DateTime<Utc>,
        now: Instant,
    ) {
        *self = Self {
            status: TimerStatus::Running,
            session_id: Some(session_id),
            context_id: Some(context_id),
            started_at: Some(start_at),
            elapsed_ms: 0,
            elapsed_ms_baseline: 0,
            running_anchor: Some(now),
        };
    }

    /// Returns false when not running.
    pub fn pause(&mut self) -> bool {
        if self.status != TimerStatus::Running {
            return false;
        }
        self.sync_elapsed_from_anchor();
        self.status = TimerStatus::Paused;
        self.running_anchor = None;
        self.elapsed_ms_baseline = self.elapsed_ms;
        true
    }

    /// Returns false when not paused.
    pub fn resume(&mut self, now: Instant) -> bool {
        if self.status != TimerStatus::Paused {
            return false;
        }
        self.status = TimerStatus::Running;
        self.running_anchor = Some(now);
        true
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn paused_time_does_not_count() {
        let mut state = TimerState::new();
        let start = Instant::now() - Duration::from_secs(10);
        state.begin_session("s".into(), "c".into(), Utc::now(), start);

        assert!(state.pause());
        let paused_at = state.current_elapsed_ms();
        assert!(paused_at >= 10_000);
        assert!(!state.pause());
        assert_eq!(state.current_elapsed_ms(), paused_at);

        assert!(state.resume(Instant::now()));
        assert!(state.current_elapsed_ms() >= paused_at);
        assert!(state.current_elapsed_ms() < paused_at + 5_000);
    }
}
