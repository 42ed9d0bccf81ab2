use std::time::{Duration, Instant};

use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SnapReason {
    TimeBased,
    ProjectChange,
}

impl SnapReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SnapReason::TimeBased => "time_based",
            SnapReason::ProjectChange => "project_change",
        }
    }

    pub fn context_name(&self) -> String {
        format!("Auto: {}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoSnapConfig {
    /// Time between periodic snapshots.
    pub interval: Duration,
    /// No two auto-snaps closer than this, whatever the reason.
    pub min_interval: Duration,
    pub poll_interval: Duration,
    pub max_retained: usize,
}

impl AutoSnapConfig {
    pub fn with_interval_minutes(minutes: u64, max_retained: usize) -> Self {
        Self {
            interval: Duration::from_secs(minutes.max(1).saturating_mul(60)),
            max_retained,
            ..Self::default()
        }
    }
}

impl Default for AutoSnapConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30 * 60),
            min_interval: Duration::from_secs(5 * 60),
            poll_interval: Duration::from_secs(10),
            max_retained: 50,
        }
    }
}

/// Remembers when the last auto-snap happened and which project was seen.
#[derive(Debug, Clone)]
pub struct SnapTrigger {
    started: Instant,
    last_snap: Option<Instant>,
    last_project: Option<String>,
    seen_first_poll: bool,
}

impl SnapTrigger {
    pub fn new(started: Instant) -> Self {
        Self {
            started,
            last_snap: None,
            last_project: None,
            seen_first_poll: false,
        }
    }

    /// Decides whether a poll at `now` seeing `project` should snap. The first
    /// poll only records the project.
    pub fn evaluate(
        &mut self,
        now: Instant,
        project: Option<&str>,
        config: &AutoSnapConfig,
    ) -> Option<SnapReason> {
        if !self.seen_first_poll {
            self.seen_first_poll = true;
            self.last_project = project.map(str::to_string);
        }

        let since_last = now.saturating_duration_since(self.last_snap.unwrap_or(self.started));
        if self.last_snap.is_some() && since_last < config.min_interval {
            return None;
        }

        let changed = matches!(project, Some(current) if self.last_project.as_deref() != Some(current));
        let reason = if changed {
            Some(SnapReason::ProjectChange)
        } else if since_last >= config.interval {
            Some(SnapReason::TimeBased)
        } else {
            None
        };

        if reason.is_some() {
            self.last_snap = Some(now);
            if let Some(current) = project {
                self.last_project = Some(current.to_string());
            }
        }
        reason
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AutoSnapConfig {
        AutoSnapConfig {
            interval: Duration::from_secs(1800),
            min_interval: Duration::from_secs(300),
            poll_interval: Duration::from_secs(10),
            max_retained: 50,
        }
    }

    #[test]
    fn interval_minutes_saturate() {
        let config = AutoSnapConfig::with_interval_minutes(u64::MAX, 50);
        assert_eq!(config.interval, Duration::from_secs(u64::MAX));
        let config = AutoSnapConfig::with_interval_minutes(0, 50);
        assert_eq!(config.interval, Duration::from_secs(60));
    }

    #[test]
    fn first_poll_records_the_project_without_snapping() {
        let start = Instant::now();
        let mut trigger = SnapTrigger::new(start);
        assert_eq!(trigger.evaluate(start, Some("demo"), &config()), None);
        assert_eq!(
            trigger.evaluate(start + Duration::from_secs(10), Some("demo"), &config()),
            None
        );
    }

    #[test]
    fn project_change_snaps_and_respects_min_interval() {
        let start = Instant::now();
        let mut trigger = SnapTrigger::new(start);
        trigger.evaluate(start, Some("a"), &config());

        let t1 = start + Duration::from_secs(20);
        assert_eq!(trigger.evaluate(t1, Some("b"), &config()), Some(SnapReason::ProjectChange));

        // Too soon for another snapshot; the change is picked up later.
        let t2 = t1 + Duration::from_secs(60);
        assert_eq!(trigger.evaluate(t2, Some("c"), &config()), None);
        let t3 = t1 + Duration::from_secs(301);
        assert_eq!(trigger.evaluate(t3, Some("c"), &config()), Some(SnapReason::ProjectChange));
    }

    #[test]
    fn time_based_after_the_interval() {
        let start = Instant::now();
        let mut trigger = SnapTrigger::new(start);
        assert_eq!(trigger.evaluate(start, None, &config()), None);
        assert_eq!(
            trigger.evaluate(start + Duration::from_secs(1799), None, &config()),
            None
        );
        assert_eq!(
            trigger.evaluate(start + Duration::from_secs(1800), None, &config()),
            Some(SnapReason::TimeBased)
        );
        assert_eq!(SnapReason::TimeBased.context_name(), "Auto: time_based");
    }
}
