use chrono::Utc;
use uuid::Uuid;

use crate::db::{ContextSnapshot, ContextSummary, EventType};
use crate::engine::RestoreResult;

use super::{not_found, AppContext};

pub async fn capture_context(
    ctx: &AppContext,
    name: Option<String>,
) -> Result<ContextSnapshot, String> {
    let snapshot = ctx.capture.capture_context(name.as_deref()).await;
    ctx.db
        .upsert_context(&snapshot, ctx.settings.get().max_contexts)
        .await
        .map_err(|e| e.to_string())?;
    ctx.record_event(EventType::Snap, Some(&snapshot)).await;
    Ok(snapshot)
}

pub async fn restore_context(ctx: &AppContext, context_id: &str) -> Result<RestoreResult, String> {
    let mut snapshot = ctx.load_context(context_id).await?;
    let settings = ctx.settings.get();

    let result = ctx
        .restore_engine()
        .restore_context(&mut snapshot, settings.close_others_on_restore)
        .await;

    ctx.db
        .upsert_context(&snapshot, settings.max_contexts)
        .await
        .map_err(|e| e.to_string())?;
    ctx.record_event(EventType::Restore, Some(&snapshot)).await;
    Ok(result)
}

/// Restores the most recently restored context, or the newest one when
/// nothing has been restored yet.
pub async fn quick_restore(ctx: &AppContext) -> Result<RestoreResult, String> {
    let contexts = ctx.db.load_all_contexts().await.map_err(|e| e.to_string())?;
    let target = contexts
        .iter()
        .filter(|context| context.last_restored.is_some())
        .max_by_key(|context| context.last_restored)
        .or_else(|| contexts.first())
        .map(|context| context.id.clone())
        .ok_or_else(|| "no saved contexts".to_string())?;
    restore_context(ctx, &target).await
}

pub async fn get_all_contexts(ctx: &AppContext) -> Result<Vec<ContextSummary>, String> {
    let contexts = ctx.db.load_all_contexts().await.map_err(|e| e.to_string())?;
    Ok(contexts.iter().map(ContextSnapshot::summary).collect())
}

pub async fn get_context(ctx: &AppContext, context_id: &str) -> Result<ContextSnapshot, String> {
    ctx.load_context(context_id).await
}

pub async fn search_contexts(ctx: &AppContext, query: &str) -> Result<Vec<ContextSummary>, String> {
    let contexts = ctx
        .db
        .search_contexts(query)
        .await
        .map_err(|e| e.to_string())?;
    Ok(contexts.iter().map(ContextSnapshot::summary).collect())
}

pub async fn delete_context(ctx: &AppContext, context_id: &str) -> Result<(), String> {
    let snapshot = ctx.load_context(context_id).await?;
    let removed = ctx
        .db
        .remove_context(context_id)
        .await
        .map_err(|e| e.to_string())?;
    if !removed {
        return Err(not_found("context", context_id));
    }
    ctx.record_event(EventType::Delete, Some(&snapshot)).await;
    Ok(())
}

pub async fn rename_context(
    ctx: &AppContext,
    context_id: &str,
    name: &str,
) -> Result<ContextSummary, String> {
    let name = name.trim();
    if name.is_empty() {
        return Err("context name must not be empty".into());
    }
    let renamed = ctx
        .db
        .rename_context(context_id, name)
        .await
        .map_err(|e| e.to_string())?;
    if !renamed {
        return Err(not_found("context", context_id));
    }
    let snapshot = ctx.load_context(context_id).await?;
    ctx.record_event(EventType::Rename, Some(&snapshot)).await;
    Ok(snapshot.summary())
}

/// Copies a context under a fresh id. Everything but the id, the name and the
/// modification time carries over; the original is left untouched.
pub async fn duplicate_context(
    ctx: &AppContext,
    context_id: &str,
) -> Result<ContextSnapshot, String> {
    let original = ctx.load_context(context_id).await?;
    let copy = ContextSnapshot {
        id: Uuid::new_v4().to_string(),
        name: format!("{} (Copy)", original.name),
        updated_at: Utc::now(),
        ..original
    };
    ctx.db
        .upsert_context(&copy, ctx.settings.get().max_contexts)
        .await
        .map_err(|e| e.to_string())?;
    ctx.record_event(EventType::Duplicate, Some(&copy)).await;
    Ok(copy)
}
