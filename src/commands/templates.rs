use crate::db::{ContextSnapshot, ContextTemplate, EventType, TemplateCategory};
use crate::features::templates::{self, CategoryInfo, TemplateApplication};

use super::{not_found, AppContext};

async fn load_template(ctx: &AppContext, template_id: &str) -> Result<ContextTemplate, String> {
    templates::get_template(&ctx.db, template_id)
        .await
        .map_err(|e| e.to_string())?
        .ok_or_else(|| not_found("template", template_id))
}

pub async fn list_templates(ctx: &AppContext) -> Result<Vec<ContextTemplate>, String> {
    templates::list_templates(&ctx.db)
        .await
        .map_err(|e| e.to_string())
}

pub async fn get_templates_by_category(
    ctx: &AppContext,
    category: &str,
) -> Result<Vec<ContextTemplate>, String> {
    let category = TemplateCategory::parse(category).map_err(|e| e.to_string())?;
    templates::templates_by_category(&ctx.db, category)
        .await
        .map_err(|e| e.to_string())
}

pub async fn get_template(ctx: &AppContext, template_id: &str) -> Result<ContextTemplate, String> {
    load_template(ctx, template_id).await
}

pub fn get_template_categories() -> Result<Vec<CategoryInfo>, String> {
    Ok(templates::categories())
}

pub async fn create_custom_template(
    ctx: &AppContext,
    name: &str,
    emoji: &str,
    target_apps: Vec<String>,
    category: &str,
) -> Result<ContextTemplate, String> {
    let category = TemplateCategory::parse(category).map_err(|e| e.to_string())?;
    templates::create_custom_template(&ctx.db, name, emoji, target_apps, category)
        .await
        .map_err(|e| e.to_string())
}

pub async fn delete_custom_template(ctx: &AppContext, template_id: &str) -> Result<(), String> {
    let deleted = templates::delete_custom_template(&ctx.db, template_id)
        .await
        .map_err(|e| e.to_string())?;
    if !deleted {
        return Err(format!("template {template_id} cannot be deleted"));
    }
    Ok(())
}

pub async fn apply_template(
    ctx: &AppContext,
    template_id: &str,
) -> Result<TemplateApplication, String> {
    let template = load_template(ctx, template_id).await?;
    let timing = ctx.settings.get().restore_timing();
    Ok(templates::apply_template(ctx.source.as_ref(), &template, timing).await)
}

/// Applies the template and saves what ends up on screen as a new context,
/// named after the template unless `name` is given.
pub async fn create_context_from_template(
    ctx: &AppContext,
    template_id: &str,
    name: Option<String>,
) -> Result<ContextSnapshot, String> {
    let template = load_template(ctx, template_id).await?;
    let settings = ctx.settings.get();
    templates::apply_template(ctx.source.as_ref(), &template, settings.restore_timing()).await;

    let name = name.unwrap_or_else(|| template.name.clone());
    let mut snapshot = ctx.capture.capture_context(Some(&name)).await;
    snapshot.emoji = template.emoji.clone();

    ctx.db
        .upsert_context(&snapshot, settings.max_contexts)
        .await
        .map_err(|e| e.to_string())?;
    ctx.record_event(EventType::Snap, Some(&snapshot)).await;
    Ok(snapshot)
}
