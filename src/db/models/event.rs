//! User activity log entries.

use anyhow::{anyhow, Result};
use chrono::{DateTime, Datelike, Local, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Snap,
    AutoSnap,
    Restore,
    Switch,
    Delete,
    Rename,
    Duplicate,
    Import,
    AppLaunch,
    AppClose,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Snap => "snap",
            EventType::AutoSnap => "auto_snap",
            EventType::Restore => "restore",
            EventType::Switch => "switch",
            EventType::Delete => "delete",
            EventType::Rename => "rename",
            EventType::Duplicate => "duplicate",
            EventType::Import => "import",
            EventType::AppLaunch => "app_launch",
            EventType::AppClose => "app_close",
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "snap" => Ok(EventType::Snap),
            "auto_snap" => Ok(EventType::AutoSnap),
            "restore" => Ok(EventType::Restore),
            "switch" => Ok(EventType::Switch),
            "delete" => Ok(EventType::Delete),
            "rename" => Ok(EventType::Rename),
            "duplicate" => Ok(EventType::Duplicate),
            "import" => Ok(EventType::Import),
            "app_launch" => Ok(EventType::AppLaunch),
            "app_close" => Ok(EventType::AppClose),
            other => Err(anyhow!("unknown event type {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TimeBucket {
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl TimeBucket {
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            5..=11 => TimeBucket::Morning,
            12..=17 => TimeBucket::Afternoon,
            18..=21 => TimeBucket::Evening,
            _ => TimeBucket::Night,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeBucket::Morning => "morning",
            TimeBucket::Afternoon => "afternoon",
            TimeBucket::Evening => "evening",
            TimeBucket::Night => "night",
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "morning" => Ok(TimeBucket::Morning),
            "afternoon" => Ok(TimeBucket::Afternoon),
            "evening" => Ok(TimeBucket::Evening),
            "night" => Ok(TimeBucket::Night),
            other => Err(anyhow!("unknown time bucket {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserEvent {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub event_type: EventType,
    pub context_id: Option<String>,
    #[serde(default)]
    pub active_apps: Vec<String>,
    pub time_bucket: TimeBucket,
    /// 0 = Sunday.
    pub day_of_week: u8,
    pub project: Option<String>,
}

impl UserEvent {
    pub fn new(event_type: EventType, context_id: Option<String>) -> Self {
        Self::at(event_type, context_id, Local::now())
    }

    /// Builds an event stamped at `when`; bucket and weekday follow the
    /// wall clock of `when`'s zone.
    pub fn at<Tz: TimeZone>(
        event_type: EventType,
        context_id: Option<String>,
        when: DateTime<Tz>,
    ) -> Self {
        let naive = when.naive_local();
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: when.with_timezone(&Utc),
            event_type,
            context_id,
            active_apps: Vec::new(),
            time_bucket: TimeBucket::from_hour(naive.hour()),
            day_of_week: naive.weekday().num_days_from_sunday() as u8,
            project: None,
        }
    }

    pub fn with_apps(mut self, apps: Vec<String>) -> Self {
        self.active_apps = apps;
        self
    }

    pub fn with_project(mut self, project: Option<String>) -> Self {
        self.project = project;
        self
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSummary {
    pub total_events: u64,
    pub unique_contexts: u64,
    pub most_active_hour: Option<u32>,
    pub most_used_context: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    #[test]
    fn bucket_boundaries() {
        assert_eq!(TimeBucket::from_hour(4), TimeBucket::Night);
        assert_eq!(TimeBucket::from_hour(5), TimeBucket::Morning);
        assert_eq!(TimeBucket::from_hour(12), TimeBucket::Afternoon);
        assert_eq!(TimeBucket::from_hour(18), TimeBucket::Evening);
        assert_eq!(TimeBucket::from_hour(22), TimeBucket::Night);
    }

    #[test]
    fn event_uses_local_wall_clock() {
        let zone = FixedOffset::east_opt(2 * 3600).unwrap();
        // Sunday 2024-06-02 09:30 at +02:00
        let when = zone.with_ymd_and_hms(2024, 6, 2, 9, 30, 0).unwrap();
        let event = UserEvent::at(EventType::Restore, Some("ctx".into()), when);
        assert_eq!(event.time_bucket, TimeBucket::Morning);
        assert_eq!(event.day_of_week, 0);
        assert_eq!(event.timestamp.to_rfc3339(), "2024-06-02T07:30:00+00:00");
    }
}
