use std::collections::HashMap;

use anyhow::{Context, Result};
use chrono::{Local, Timelike, Utc};
use rusqlite::{params, Connection, Row};

use crate::db::{
    connection::Database,
    helpers::{days_before, from_json, parse_datetime, to_i64, to_json},
    models::{AnalyticsSummary, EventType, TimeBucket, UserEvent},
};

/// Rows kept after each insert.
pub const MAX_EVENTS: usize = 1000;

const EVENT_COLUMNS: &str =
    "id, timestamp, event_type, context_id, active_apps_json, time_bucket, day_of_week, project";

fn row_to_event(row: &Row) -> Result<UserEvent> {
    let timestamp: String = row.get("timestamp")?;
    let event_type: String = row.get("event_type")?;
    let active_apps_json: String = row.get("active_apps_json")?;
    let time_bucket: String = row.get("time_bucket")?;
    let day_of_week: i64 = row.get("day_of_week")?;

    Ok(UserEvent {
        id: row.get("id")?,
        timestamp: parse_datetime(&timestamp, "timestamp")?,
        event_type: EventType::parse(&event_type)?,
        context_id: row.get("context_id")?,
        active_apps: from_json(&active_apps_json, "active_apps_json")?,
        time_bucket: TimeBucket::parse(&time_bucket)?,
        day_of_week: day_of_week.clamp(0, 6) as u8,
        project: row.get("project")?,
    })
}

fn query_events(conn: &Connection, sql: &str, args: impl rusqlite::Params) -> Result<Vec<UserEvent>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(args)?;
    let mut events = Vec::new();
    while let Some(row) = rows.next()? {
        events.push(row_to_event(row)?);
    }
    Ok(events)
}

impl Database {
    pub async fn insert_event(&self, event: &UserEvent) -> Result<()> {
        let record = event.clone();
        self.execute(move |conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO events (id, timestamp, event_type, context_id, active_apps_json, time_bucket, day_of_week, project)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    record.id,
                    record.timestamp.to_rfc3339(),
                    record.event_type.as_str(),
                    record.context_id,
                    to_json(&record.active_apps, "active_apps")?,
                    record.time_bucket.as_str(),
                    record.day_of_week,
                    record.project,
                ],
            )
            .context("failed to insert event")?;
            tx.execute(
                "DELETE FROM events
                 WHERE seq NOT IN (SELECT seq FROM events ORDER BY seq DESC LIMIT ?1)",
                params![to_i64(MAX_EVENTS as u64)?],
            )?;
            tx.commit()?;
            Ok(())
        })
        .await
    }

    /// Newest first.
    pub async fn recent_events(&self, limit: usize) -> Result<Vec<UserEvent>> {
        let limit = to_i64(limit as u64)?;
        self.execute(move |conn| {
            query_events(
                conn,
                &format!("SELECT {EVENT_COLUMNS} FROM events ORDER BY seq DESC LIMIT ?1"),
                params![limit],
            )
        })
        .await
    }

    pub async fn events_for_context(&self, context_id: &str) -> Result<Vec<UserEvent>> {
        let context_id = context_id.to_string();
        self.execute(move |conn| {
            query_events(
                conn,
                &format!(
                    "SELECT {EVENT_COLUMNS} FROM events WHERE context_id = ?1 ORDER BY seq DESC"
                ),
                params![context_id],
            )
        })
        .await
    }

    pub async fn events_by_time_bucket(
        &self,
        bucket: TimeBucket,
        day_of_week: Option<u8>,
    ) -> Result<Vec<UserEvent>> {
        self.execute(move |conn| match day_of_week {
            Some(day) => query_events(
                conn,
                &format!(
                    "SELECT {EVENT_COLUMNS} FROM events
                     WHERE time_bucket = ?1 AND day_of_week = ?2
                     ORDER BY seq DESC"
                ),
                params![bucket.as_str(), day],
            ),
            None => query_events(
                conn,
                &format!(
                    "SELECT {EVENT_COLUMNS} FROM events WHERE time_bucket = ?1 ORDER BY seq DESC"
                ),
                params![bucket.as_str()],
            ),
        })
        .await
    }

    pub async fn analytics_summary(&self) -> Result<AnalyticsSummary> {
        let events = self.recent_events(MAX_EVENTS).await?;

        let mut context_counts: HashMap<&str, u64> = HashMap::new();
        let mut hour_counts = [0u64; 24];
        for event in &events {
            if let Some(id) = event.context_id.as_deref() {
                *context_counts.entry(id).or_default() += 1;
            }
            let hour = event.timestamp.with_timezone(&Local).hour() as usize;
            hour_counts[hour] += 1;
        }

        // Ties go to the id that sorts first so the summary is stable.
        let most_used_context = context_counts
            .iter()
            .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
            .map(|(id, _)| id.to_string());

        let most_active_hour = hour_counts
            .iter()
            .enumerate()
            .filter(|(_, count)| **count > 0)
            .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(&a.0)))
            .map(|(hour, _)| hour as u32);

        Ok(AnalyticsSummary {
            total_events: events.len() as u64,
            unique_contexts: context_counts.len() as u64,
            most_active_hour,
            most_used_context,
        })
    }

    /// Returns the number of rows deleted.
    pub async fn cleanup_events_older_than(&self, days: u32) -> Result<usize> {
        let cutoff = days_before(Utc::now(), days);
        self.execute(move |conn| {
            let stale = {
                let mut stmt = conn.prepare("SELECT id, timestamp FROM events")?;
                let mut rows = stmt.query([])?;
                let mut stale = Vec::new();
                while let Some(row) = rows.next()? {
                    let id: String = row.get(0)?;
                    let timestamp = parse_datetime(&row.get::<_, String>(1)?, "timestamp")?;
                    if timestamp < cutoff {
                        stale.push(id);
                    }
                }
                stale
            };

            let tx = conn.transaction()?;
            for id in &stale {
                tx.execute("DELETE FROM events WHERE id = ?1", params![id])?;
            }
            tx.commit()?;
            Ok(stale.len())
        })
        .await
    }
}
