use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Row};

use crate::db::{
    connection::Database,
    helpers::{parse_datetime, parse_optional_datetime, to_i64, to_u64},
    models::TimerSession,
};

fn row_to_timer_session(row: &Row) -> Result<TimerSession> {
    let started_at: String = row.get("started_at")?;
    let ended_at: Option<String> = row.get("ended_at")?;
    let duration_secs: i64 = row.get("duration_secs")?;
    let interrupted: i64 = row.get("interrupted")?;

    Ok(TimerSession {
        id: row.get("id")?,
        context_id: row.get("context_id")?,
        started_at: parse_datetime(&started_at, "started_at")?,
        ended_at: parse_optional_datetime(ended_at, "ended_at")?,
        duration_secs: to_u64(duration_secs, "duration_secs")?,
        interrupted: interrupted != 0,
    })
}

impl Database {
    pub async fn insert_timer_session(&self, session: &TimerSession) -> Result<()> {
        let record = session.clone();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO timer_sessions (id, context_id, started_at, ended_at, duration_secs, interrupted)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    record.id,
                    record.context_id,
                    record.started_at.to_rfc3339(),
                    record.ended_at.map(|dt| dt.to_rfc3339()),
                    to_i64(record.duration_secs)?,
                    record.interrupted,
                ],
            )
            .with_context(|| "failed to insert timer session")?;
            Ok(())
        })
        .await
    }

    pub async fn finish_timer_session(
        &self,
        session_id: &str,
        ended_at: DateTime<Utc>,
        duration_secs: u64,
        interrupted: bool,
    ) -> Result<()> {
        let session_id = session_id.to_string();
        self.execute(move |conn| {
            conn.execute(
                "UPDATE timer_sessions
                 SET ended_at = ?1,
                     duration_secs = ?2,
                     interrupted = ?3
                 WHERE id = ?4",
                params![
                    ended_at.to_rfc3339(),
                    to_i64(duration_secs)?,
                    interrupted,
                    session_id,
                ],
            )
            .with_context(|| "failed to finish timer session")?;
            Ok(())
        })
        .await
    }

    pub async fn unfinished_timer_sessions(&self) -> Result<Vec<TimerSession>> {
        self.execute(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, context_id, started_at, ended_at, duration_secs, interrupted
                 FROM timer_sessions
                 WHERE ended_at IS NULL
                 ORDER BY started_at DESC",
            )?;
            let mut rows = stmt.query([])?;
            let mut sessions = Vec::new();
            while let Some(row) = rows.next()? {
                sessions.push(row_to_timer_session(row)?);
            }
            Ok(sessions)
        })
        .await
    }

    /// Finished sessions that started in `[from, to)`, oldest first.
    pub async fn timer_sessions_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<TimerSession>> {
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, context_id, started_at, ended_at, duration_secs, interrupted
                 FROM timer_sessions
                 WHERE ended_at IS NOT NULL",
            )?;
            let mut rows = stmt.query([])?;
            let mut sessions = Vec::new();
            while let Some(row) = rows.next()? {
                let session = row_to_timer_session(row)?;
                if session.started_at >= from && session.started_at < to {
                    sessions.push(session);
                }
            }
            sessions.sort_by_key(|session| session.started_at);
            Ok(sessions)
        })
        .await
    }
}
