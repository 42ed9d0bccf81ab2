//! Built-in and user-defined workspace templates.

use anyhow::{bail, Result};
use serde::Serialize;
use uuid::Uuid;

use crate::db::{ContextTemplate, Database, Layout, TemplateCategory};
use crate::models::Bounds;
use crate::settings::RestoreTiming;
use crate::window_source::WindowSource;

const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

pub const WORK_AREA_WIDTH: i32 = 1440;
pub const WORK_AREA_HEIGHT: i32 = 900;

fn template(
    id: &str,
    name: &str,
    emoji: &str,
    description: &str,
    category: TemplateCategory,
    target_apps: &[&str],
    suggested_layout: Layout,
) -> ContextTemplate {
    ContextTemplate {
        id: id.into(),
        name: name.into(),
        emoji: emoji.into(),
        description: description.into(),
        category,
        target_apps: target_apps.iter().map(|app| app.to_string()).collect(),
        suggested_layout,
    }
}

pub fn builtin_templates() -> Vec<ContextTemplate> {
    use Layout::*;
    use TemplateCategory::*;

    vec![
        template(
            "web-dev",
            "Web Development",
            "💻",
            "VSCode + Chrome + Terminal setup",
            Development,
            &["Visual Studio Code", "Google Chrome", "Terminal"],
            Triple,
        ),
        template(
            "mobile-dev",
            "Mobile Development",
            "📱",
            "Xcode/Android Studio + Simulator",
            Development,
            &["Xcode", "Simulator", "Terminal"],
            Split,
        ),
        template(
            "ui-design",
            "UI Design",
            "🎨",
            "Figma + Reference images",
            Design,
            &["Figma", "Google Chrome", "Preview"],
            Split,
        ),
        template(
            "video-edit",
            "Video Editing",
            "🎬",
            "Premiere/Final Cut + Assets",
            Design,
            &["Final Cut Pro", "Finder"],
            Single,
        ),
        template(
            "zoom-meeting",
            "Video Meeting",
            "📹",
            "Zoom/Teams + Notes",
            Meeting,
            &["zoom.us", "Notion", "Calendar"],
            Split,
        ),
        template(
            "deep-focus",
            "Deep Focus",
            "🧠",
            "Single app, no distractions",
            Personal,
            &[],
            Single,
        ),
        template(
            "morning-routine",
            "Morning Routine",
            "🌅",
            "Email + Calendar + News",
            Communication,
            &["Mail", "Calendar", "Safari"],
            Triple,
        ),
        template(
            "code-review",
            "Code Review",
            "👀",
            "GitHub + VSCode side by side",
            Development,
            &["Google Chrome", "Visual Studio Code"],
            Split,
        ),
    ]
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CategoryInfo {
    pub id: TemplateCategory,
    pub name: &'static str,
    pub emoji: &'static str,
}

pub fn categories() -> Vec<CategoryInfo> {
    TemplateCategory::ALL
        .into_iter()
        .map(|id| {
            let (name, emoji) = match id {
                TemplateCategory::Development => ("Development", "💻"),
                TemplateCategory::Design => ("Design", "🎨"),
                TemplateCategory::Meeting => ("Meetings", "📹"),
                TemplateCategory::Communication => ("Communication", "💬"),
                TemplateCategory::Personal => ("Personal", "🏠"),
            };
            CategoryInfo { id, name, emoji }
        })
        .collect()
}

/// Built-ins first, then custom templates in creation order.
pub async fn list_templates(db: &Database) -> Result<Vec<ContextTemplate>> {
    let mut templates = builtin_templates();
    templates.extend(db.list_custom_templates().await?);
    Ok(templates)
}

pub async fn templates_by_category(
    db: &Database,
    category: TemplateCategory,
) -> Result<Vec<ContextTemplate>> {
    Ok(list_templates(db)
        .await?
        .into_iter()
        .filter(|template| template.category == category)
        .collect())
}

pub async fn get_template(db: &Database, template_id: &str) -> Result<Option<ContextTemplate>> {
    Ok(list_templates(db)
        .await?
        .into_iter()
        .find(|template| template.id == template_id))
}

pub async fn create_custom_template(
    db: &Database,
    name: &str,
    emoji: &str,
    target_apps: Vec<String>,
    category: TemplateCategory,
) -> Result<ContextTemplate> {
    if name.trim().is_empty() {
        bail!("template name must not be empty");
    }
    let template = ContextTemplate {
        id: format!("custom_{}", Uuid::new_v4()),
        name: name.trim().to_string(),
        emoji: emoji.to_string(),
        description: "Custom template".into(),
        category,
        target_apps,
        suggested_layout: Layout::Split,
    };
    db.insert_template(&template).await?;
    Ok(template)
}

/// Built-in templates cannot be deleted; asking reports `false`.
pub async fn delete_custom_template(db: &Database, template_id: &str) -> Result<bool> {
    if !template_id.starts_with("custom_") {
        return Ok(false);
    }
    db.delete_template(template_id).await
}

/// Frames for `count` windows tiled by `layout` over the work area. Windows
/// beyond the layout's slots reuse them from the start.
pub fn layout_frames(layout: Layout, count: usize) -> Vec<Bounds> {
    let (w, h) = (WORK_AREA_WIDTH, WORK_AREA_HEIGHT);
    let slots = match layout {
        Layout::Single => vec![Bounds::new(0, 0, w, h)],
        Layout::Split => vec![Bounds::new(0, 0, w / 2, h), Bounds::new(w / 2, 0, w / 2, h)],
        Layout::Triple => (0..3).map(|i| Bounds::new(i * w / 3, 0, w / 3, h)).collect(),
        Layout::Grid => vec![
            Bounds::new(0, 0, w / 2, h / 2),
            Bounds::new(w / 2, 0, w / 2, h / 2),
            Bounds::new(0, h / 2, w / 2, h / 2),
            Bounds::new(w / 2, h / 2, w / 2, h / 2),
        ],
    };
    (0..count).map(|i| slots[i % slots.len()]).collect()
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TemplateApplication {
    pub template_id: String,
    pub launched: Vec<String>,
    pub failed: Vec<String>,
    pub arranged: usize,
}

/// Launches every target app (best effort), waits for them to settle, then
/// tiles the first window of each app.
pub async fn apply_template(
    source: &dyn WindowSource,
    template: &ContextTemplate,
    timing: RestoreTiming,
) -> TemplateApplication {
    log_info!("applying template {}", template.name);
    let mut report = TemplateApplication {
        template_id: template.id.clone(),
        ..TemplateApplication::default()
    };

    for app in &template.target_apps {
        match source.launch_application(app).await {
            Ok(()) => report.launched.push(app.clone()),
            Err(err) => {
                log_warn!("template {} could not launch {app}: {err:?}", template.id);
                report.failed.push(app.clone());
            }
        }
    }

    if !report.launched.is_empty() && !timing.launch_settle.is_zero() {
        tokio::time::sleep(timing.launch_settle).await;
    }

    let windows = match source.list_visible_windows().await {
        Ok(windows) => windows,
        Err(err) => {
            log_warn!("cannot arrange template {}: {err:?}", template.id);
            return report;
        }
    };

    let frames = layout_frames(template.suggested_layout, template.target_apps.len());
    for (app, frame) in template.target_apps.iter().zip(frames) {
        let Some(window) = windows.iter().find(|w| w.app.eq_ignore_ascii_case(app)) else {
            continue;
        };
        match source.set_bounds(window, frame).await {
            Ok(()) => report.arranged += 1,
            Err(err) => log_warn!("failed to tile {app}: {err:?}"),
        }
    }

    report
}
