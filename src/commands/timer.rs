use chrono::{Local, NaiveDate};

use crate::db::models::{ContextTime, DailyStats, GoalProgress, WeeklyEntry};
use crate::db::TimerSession;
use crate::timer::TimerSnapshot;

use super::{not_found, AppContext};

async fn ensure_context(ctx: &AppContext, context_id: &str) -> Result<(), String> {
    let exists = ctx
        .db
        .context_exists(context_id)
        .await
        .map_err(|e| e.to_string())?;
    if !exists {
        return Err(not_found("context", context_id));
    }
    Ok(())
}

pub async fn get_timer_state(ctx: &AppContext) -> Result<TimerSnapshot, String> {
    Ok(ctx.timer.snapshot().await)
}

pub async fn start_timer(ctx: &AppContext, context_id: &str) -> Result<TimerSnapshot, String> {
    ensure_context(ctx, context_id).await?;
    ctx.timer
        .start_session(context_id)
        .await
        .map_err(|e| e.to_string())
}

pub async fn pause_timer(ctx: &AppContext) -> Result<TimerSnapshot, String> {
    ctx.timer.pause().await.map_err(|e| e.to_string())
}

pub async fn resume_timer(ctx: &AppContext) -> Result<TimerSnapshot, String> {
    ctx.timer.resume().await.map_err(|e| e.to_string())
}

pub async fn end_timer(ctx: &AppContext) -> Result<Option<TimerSession>, String> {
    ctx.timer.end_session(false).await.map_err(|e| e.to_string())
}

pub async fn start_pomodoro(
    ctx: &AppContext,
    context_id: &str,
    minutes: u64,
) -> Result<TimerSnapshot, String> {
    ensure_context(ctx, context_id).await?;
    ctx.timer
        .start_pomodoro(context_id, minutes)
        .await
        .map_err(|e| e.to_string())
}

pub async fn get_context_time(
    ctx: &AppContext,
    context_id: &str,
    days: u32,
) -> Result<u64, String> {
    ctx.timer
        .total_time_for_context(context_id, days)
        .await
        .map_err(|e| e.to_string())
}

/// Today in local time when `date` is omitted.
pub async fn get_daily_stats(
    ctx: &AppContext,
    date: Option<NaiveDate>,
) -> Result<DailyStats, String> {
    let date = date.unwrap_or_else(|| Local::now().date_naive());
    ctx.timer.daily_stats(date).await.map_err(|e| e.to_string())
}

pub async fn get_most_productive_context(
    ctx: &AppContext,
    days: u32,
) -> Result<Option<ContextTime>, String> {
    ctx.timer
        .most_productive_context(days)
        .await
        .map_err(|e| e.to_string())
}

pub async fn get_weekly_report(ctx: &AppContext) -> Result<Vec<WeeklyEntry>, String> {
    ctx.timer.weekly_report().await.map_err(|e| e.to_string())
}

pub async fn get_daily_goal_progress(ctx: &AppContext) -> Result<GoalProgress, String> {
    let goal = ctx.settings.get().daily_goal_minutes;
    ctx.timer
        .daily_goal_progress(goal)
        .await
        .map_err(|e| e.to_string())
}
