//! Suggestions, diffing, import/export, focus mode, settings and analytics.

use chrono::Local;
use log::info;

use crate::adapters::AdapterInfo;
use crate::ai::{generate_suggestions, ContextSuggestion};
use crate::db::{AnalyticsSummary, EventType};
use crate::features::{self, import_export, ContextDiff, ExportBundle, FocusStatus, ImportResult};
use crate::settings::UserSettings;

use super::{autosnap_config, AppContext};

/// Events considered when ranking suggestions.
const SUGGESTION_EVENT_WINDOW: usize = 100;

/// Empty when suggestions are turned off. Auto-execution is only ever flagged
/// when the user allows it.
pub async fn get_suggestions(ctx: &AppContext) -> Result<Vec<ContextSuggestion>, String> {
    let settings = ctx.settings.get();
    if !settings.ai_suggestions {
        return Ok(Vec::new());
    }

    let contexts = ctx.db.load_all_contexts().await.map_err(|e| e.to_string())?;
    let events = ctx
        .db
        .recent_events(SUGGESTION_EVENT_WINDOW)
        .await
        .map_err(|e| e.to_string())?;

    let mut suggestions = generate_suggestions(
        &contexts,
        &events,
        Local::now(),
        settings.auto_execute_threshold,
    );
    if !settings.auto_execute {
        for suggestion in &mut suggestions {
            suggestion.auto_execute = false;
        }
    }
    Ok(suggestions)
}

pub async fn diff_contexts(
    ctx: &AppContext,
    context_a: &str,
    context_b: &str,
) -> Result<ContextDiff, String> {
    let a = ctx.load_context(context_a).await?;
    let b = ctx.load_context(context_b).await?;
    Ok(features::compare(&a, &b))
}

pub async fn diff_report(
    ctx: &AppContext,
    context_a: &str,
    context_b: &str,
) -> Result<String, String> {
    let diff = diff_contexts(ctx, context_a, context_b).await?;
    Ok(features::format_diff(&diff))
}

pub async fn export_contexts(ctx: &AppContext) -> Result<ExportBundle, String> {
    import_export::export_all(&ctx.db)
        .await
        .map_err(|e| e.to_string())
}

pub async fn export_json(ctx: &AppContext) -> Result<String, String> {
    import_export::export_json(&ctx.db)
        .await
        .map_err(|e| e.to_string())
}

/// A rejected bundle is still a successful command; the outcome is in the
/// returned [`ImportResult`].
pub async fn import_json(ctx: &AppContext, text: &str) -> Result<ImportResult, String> {
    let result = import_export::import_json(&ctx.db, text, ctx.settings.get().max_contexts).await;
    if result.imported > 0 {
        ctx.record_event(EventType::Import, None).await;
    }
    Ok(result)
}

pub async fn export_shell_script(ctx: &AppContext, context_id: &str) -> Result<String, String> {
    let context = ctx.load_context(context_id).await?;
    Ok(import_export::shell_script(&context))
}

pub async fn export_applescript(ctx: &AppContext, context_id: &str) -> Result<String, String> {
    let context = ctx.load_context(context_id).await?;
    Ok(import_export::applescript(&context))
}

pub async fn toggle_focus_mode(ctx: &AppContext) -> Result<FocusStatus, String> {
    ctx.focus.toggle().await.map_err(|e| e.to_string())
}

pub async fn get_focus_status(ctx: &AppContext) -> Result<FocusStatus, String> {
    Ok(ctx.focus.status().await)
}

pub fn get_settings(ctx: &AppContext) -> Result<UserSettings, String> {
    Ok(ctx.settings.get())
}

/// Persists `settings` and applies what can change at runtime: focus mode's
/// blocked apps and the auto-snap loop. Adapter selection applies on the next
/// start.
pub async fn update_settings(
    ctx: &AppContext,
    settings: UserSettings,
) -> Result<UserSettings, String> {
    let previous = ctx.settings.get();
    let saved = ctx.settings.update(settings).map_err(|e| e.to_string())?;

    ctx.focus
        .set_blocked_apps(saved.focus_blocked_apps.clone())
        .await;

    let autosnap_changed = previous.auto_snap != saved.auto_snap
        || previous.auto_snap_interval_minutes != saved.auto_snap_interval_minutes
        || previous.max_contexts != saved.max_contexts;
    if autosnap_changed {
        ctx.autosnap.stop().await.map_err(|e| e.to_string())?;
        if saved.auto_snap {
            ctx.autosnap
                .start(autosnap_config(&saved))
                .await
                .map_err(|e| e.to_string())?;
        }
    }

    info!("Settings updated");
    Ok(saved)
}

/// (Re)starts auto-snap for this run without touching saved settings.
pub async fn start_autosnap(
    ctx: &AppContext,
    interval_minutes: Option<u64>,
) -> Result<(), String> {
    let mut settings = ctx.settings.get();
    if let Some(minutes) = interval_minutes {
        settings.auto_snap_interval_minutes = minutes;
    }
    ctx.autosnap.stop().await.map_err(|e| e.to_string())?;
    ctx.autosnap
        .start(autosnap_config(&settings))
        .await
        .map_err(|e| e.to_string())
}

pub async fn stop_autosnap(ctx: &AppContext) -> Result<(), String> {
    ctx.autosnap.stop().await.map_err(|e| e.to_string())
}

pub async fn get_analytics_summary(ctx: &AppContext) -> Result<AnalyticsSummary, String> {
    ctx.db.analytics_summary().await.map_err(|e| e.to_string())
}

pub async fn cleanup_events(ctx: &AppContext, days: u32) -> Result<usize, String> {
    ctx.db
        .cleanup_events_older_than(days)
        .await
        .map_err(|e| e.to_string())
}

pub async fn list_adapters(ctx: &AppContext) -> Result<Vec<AdapterInfo>, String> {
    Ok(ctx.registry.describe().await)
}
