use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use anyhow::{anyhow, bail, Result};
use chrono::{Duration as ChronoDuration, Local, NaiveDate, Utc};
use log::{error, info, warn};
use serde::Serialize;
use tokio::{sync::Mutex, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::db::{
    helpers::days_before,
    models::{ContextTime, DailyStats, GoalProgress, WeeklyEntry},
    Database, TimerSession,
};

use super::{analytics, TimerState, TimerStatus};

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TimerSnapshot {
    pub state: TimerState,
    pub elapsed_secs: u64,
}

struct PomodoroTask {
    cancel_token: CancellationToken,
    handle: JoinHandle<()>,
}

/// One tracked session at a time. Sessions are written when they start and
/// finalised when they end.
#[derive(Clone)]
pub struct TimerController {
    state: Arc<Mutex<TimerState>>,
    db: Database,
    pomodoro: Arc<Mutex<Option<PomodoroTask>>>,
}

impl TimerController {
    pub fn new(db: Database) -> Self {
        Self {
            state: Arc::new(Mutex::new(TimerState::new())),
            db,
            pomodoro: Arc::new(Mutex::new(None)),
        }
    }

    /// Marks sessions left open by a previous run as interrupted.
    pub async fn recover_interrupted(&self) -> Result<usize> {
        let open = self.db.unfinished_timer_sessions().await?;
        let now = Utc::now();
        for session in &open {
            self.db
                .finish_timer_session(&session.id, now, session.duration_secs, true)
                .await?;
        }
        if !open.is_empty() {
            warn!("Marked {} unfinished timer session(s) as interrupted", open.len());
        }
        Ok(open.len())
    }

    pub async fn snapshot(&self) -> TimerSnapshot {
        let mut guard = self.state.lock().await;
        guard.sync_elapsed_from_anchor();
        TimerSnapshot {
            elapsed_secs: guard.elapsed_ms / 1000,
            state: guard.clone(),
        }
    }

    /// Ends any running session (not interrupted) before starting.
    pub async fn start_session(&self, context_id: &str) -> Result<TimerSnapshot> {
        if context_id.trim().is_empty() {
            bail!("context id must not be empty");
        }
        self.end_session(false).await?;

        let session = TimerSession {
            id: Uuid::new_v4().to_string(),
            context_id: context_id.to_string(),
            started_at: Utc::now(),
            ended_at: None,
            duration_secs: 0,
            interrupted: false,
        };
        self.db.insert_timer_session(&session).await?;

        {
            let mut state = self.state.lock().await;
            state.begin_session(
                session.id.clone(),
                session.context_id.clone(),
                session.started_at,
                Instant::now(),
            );
        }

        info!("Started timer session for {context_id}");
        Ok(self.snapshot().await)
    }

    pub async fn pause(&self) -> Result<TimerSnapshot> {
        {
            let mut state = self.state.lock().await;
            if !state.pause() {
                return Err(anyhow!("no running session to pause"));
            }
        }
        Ok(self.snapshot().await)
    }

    pub async fn resume(&self) -> Result<TimerSnapshot> {
        {
            let mut state = self.state.lock().await;
            if !state.resume(Instant::now()) {
                return Err(anyhow!("no paused session to resume"));
            }
        }
        Ok(self.snapshot().await)
    }

    /// Cancels a pending pomodoro and finalises the current session.
    /// `Ok(None)` when nothing was running.
    pub async fn end_session(&self, interrupted: bool) -> Result<Option<TimerSession>> {
        if let Some(task) = self.pomodoro.lock().await.take() {
            task.cancel_token.cancel();
        }
        finish_session(&self.state, &self.db, interrupted).await
    }

    pub async fn start_pomodoro(&self, context_id: &str, minutes: u64) -> Result<TimerSnapshot> {
        if minutes == 0 {
            bail!("pomodoro length must be at least one minute");
        }
        self.start_pomodoro_for(context_id, Duration::from_secs(minutes.saturating_mul(60)))
            .await
    }

    /// Starts a session that ends by itself after `period` unless ended or
    /// restarted first.
    pub async fn start_pomodoro_for(
        &self,
        context_id: &str,
        period: Duration,
    ) -> Result<TimerSnapshot> {
        let snapshot = self.start_session(context_id).await?;
        let session_id = snapshot.state.session_id.clone();

        let cancel_token = CancellationToken::new();
        let token = cancel_token.clone();
        let state = self.state.clone();
        let db = self.db.clone();

        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(period) => {
                    // Only end the session this pomodoro started.
                    let current = state.lock().await.session_id.clone();
                    if current != session_id {
                        return;
                    }
                    match finish_session(&state, &db, false).await {
                        Ok(Some(_)) => info!("Pomodoro complete, take a break"),
                        Ok(None) => {}
                        Err(err) => error!("Failed to end pomodoro session: {err:?}"),
                    }
                }
                _ = token.cancelled() => {}
            }
        });

        let mut slot = self.pomodoro.lock().await;
        if let Some(previous) = slot.replace(PomodoroTask {
            cancel_token,
            handle,
        }) {
            previous.cancel_token.cancel();
        }
        Ok(snapshot)
    }

    /// Stops the pomodoro task and ends any running session as interrupted.
    pub async fn shutdown(&self) -> Result<()> {
        let task = self.pomodoro.lock().await.take();
        if let Some(task) = task {
            task.cancel_token.cancel();
            if let Err(err) = task.handle.await {
                error!("Pomodoro task failed to join: {err}");
            }
        }
        self.end_session(true).await.map(|_| ())
    }

    pub async fn total_time_for_context(&self, context_id: &str, days: u32) -> Result<u64> {
        let now = Utc::now();
        let sessions = self
            .db
            .timer_sessions_between(days_before(now, days), now)
            .await?;
        Ok(sessions
            .iter()
            .filter(|session| session.context_id == context_id)
            .map(|session| session.duration_secs)
            .sum())
    }

    /// Sessions that started on `date` in local time.
    pub async fn daily_stats(&self, date: NaiveDate) -> Result<DailyStats> {
        let from = analytics::local_day_start(date);
        let to = date
            .succ_opt()
            .map(analytics::local_day_start)
            .unwrap_or_else(|| from + ChronoDuration::days(1));
        let sessions = self.db.timer_sessions_between(from, to).await?;
        Ok(analytics::daily_stats(date, sessions))
    }

    pub async fn most_productive_context(&self, days: u32) -> Result<Option<ContextTime>> {
        let now = Utc::now();
        let sessions = self
            .db
            .timer_sessions_between(days_before(now, days), now)
            .await?;
        Ok(analytics::most_productive(&sessions))
    }

    /// Tracked hours for each of the last seven days, oldest first.
    pub async fn weekly_report(&self) -> Result<Vec<WeeklyEntry>> {
        let today = Local::now().date_naive();
        let mut report = Vec::with_capacity(7);
        for offset in (0..7).rev() {
            let date = today - ChronoDuration::days(offset);
            let stats = self.daily_stats(date).await?;
            report.push(analytics::weekly_entry(date, stats.total_secs));
        }
        Ok(report)
    }

    pub async fn daily_goal_progress(&self, goal_minutes: u64) -> Result<GoalProgress> {
        let today = self.daily_stats(Local::now().date_naive()).await?;
        Ok(analytics::goal_progress(today.total_secs, goal_minutes))
    }
}

async fn finish_session(
    state: &Mutex<TimerState>,
    db: &Database,
    interrupted: bool,
) -> Result<Option<TimerSession>> {
    let session = {
        let mut state = state.lock().await;
        if state.status == TimerStatus::Idle {
            return Ok(None);
        }
        state.sync_elapsed_from_anchor();

        let session = TimerSession {
            id: state
                .session_id
                .clone()
                .ok_or_else(|| anyhow!("missing session id"))?,
            context_id: state.context_id.clone().unwrap_or_default(),
            started_at: state.started_at.unwrap_or_else(Utc::now),
            ended_at: Some(Utc::now()),
            duration_secs: state.elapsed_ms / 1000,
            interrupted,
        };
        state.reset();
        session
    };

    if let Some(ended_at) = session.ended_at {
        db.finish_timer_session(&session.id, ended_at, session.duration_secs, interrupted)
            .await?;
    }
    info!(
        "Ended timer session for {} after {}s{}",
        session.context_id,
        session.duration_secs,
        if interrupted { " (interrupted)" } else { "" }
    );
    Ok(Some(session))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::temp_database;

    #[tokio::test]
    async fn starting_again_ends_the_previous_session() {
        let (_dir, db) = temp_database();
        let timer = TimerController::new(db.clone());

        let first = timer.start_session("a").await.unwrap();
        timer.start_session("b").await.unwrap();

        let snapshot = timer.snapshot().await;
        assert_eq!(snapshot.state.context_id.as_deref(), Some("b"));
        let open = db.unfinished_timer_sessions().await.unwrap();
        assert_eq!(open.len(), 1);
        assert_ne!(Some(open[0].id.clone()), first.state.session_id);
    }

    #[tokio::test]
    async fn pause_and_resume_require_the_right_state() {
        let (_dir, db) = temp_database();
        let timer = TimerController::new(db);

        assert!(timer.pause().await.is_err());
        timer.start_session("a").await.unwrap();
        assert!(timer.resume().await.is_err());
        assert_eq!(timer.pause().await.unwrap().state.status, TimerStatus::Paused);
        assert_eq!(timer.resume().await.unwrap().state.status, TimerStatus::Running);

        let ended = timer.end_session(false).await.unwrap().unwrap();
        assert!(!ended.interrupted);
        assert!(timer.end_session(false).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn pomodoro_ends_the_session_when_the_period_elapses() {
        let (_dir, db) = temp_database();
        let timer = TimerController::new(db.clone());

        timer
            .start_pomodoro_for("a", Duration::from_millis(50))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(300)).await;

        assert_eq!(timer.snapshot().await.state.status, TimerStatus::Idle);
        assert!(db.unfinished_timer_sessions().await.unwrap().is_empty());
        assert!(timer.start_pomodoro("a", 0).await.is_err());
    }

    #[tokio::test]
    async fn oversized_lengths_and_windows_saturate() {
        let (_dir, db) = temp_database();
        let timer = TimerController::new(db);

        timer.start_pomodoro("a", u64::MAX).await.unwrap();
        timer.end_session(false).await.unwrap();

        assert!(timer.total_time_for_context("a", u32::MAX).await.is_ok());
        assert!(timer.most_productive_context(u32::MAX).await.is_ok());
        timer.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn shutdown_marks_the_running_session_interrupted() {
        let (_dir, db) = temp_database();
        let timer = TimerController::new(db.clone());
        timer
            .start_pomodoro_for("a", Duration::from_secs(600))
            .await
            .unwrap();

        timer.shutdown().await.unwrap();

        assert_eq!(timer.snapshot().await.state.status, TimerStatus::Idle);
        let sessions = db
            .timer_sessions_between(Utc::now() - ChronoDuration::hours(1), Utc::now())
            .await
            .unwrap();
        assert_eq!(sessions.len(), 1);
        assert!(sessions[0].interrupted);
    }

    #[tokio::test]
    async fn recovery_closes_sessions_left_open() {
        let (_dir, db) = temp_database();
        db.insert_timer_session(&TimerSession {
            id: "stale".into(),
            context_id: "a".into(),
            started_at: Utc::now() - ChronoDuration::hours(2),
            ended_at: None,
            duration_secs: 0,
            interrupted: false,
        })
        .await
        .unwrap();

        let timer = TimerController::new(db.clone());
        assert_eq!(timer.recover_interrupted().await.unwrap(), 1);
        assert!(db.unfinished_timer_sessions().await.unwrap().is_empty());
    }
}
