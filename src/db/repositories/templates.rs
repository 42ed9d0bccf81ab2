use anyhow::Result;
use chrono::Utc;
use rusqlite::{params, Row};

use crate::db::{
    connection::Database,
    helpers::{from_json, to_json},
    models::{ContextTemplate, Layout, TemplateCategory},
};

fn row_to_template(row: &Row) -> Result<ContextTemplate> {
    let category: String = row.get("category")?;
    let target_apps_json: String = row.get("target_apps_json")?;
    let suggested_layout: String = row.get("suggested_layout")?;

    Ok(ContextTemplate {
        id: row.get("id")?,
        name: row.get("name")?,
        emoji: row.get("emoji")?,
        description: row.get("description")?,
        category: TemplateCategory::parse(&category)?,
        target_apps: from_json(&target_apps_json, "target_apps_json")?,
        suggested_layout: Layout::parse(&suggested_layout)?,
    })
}

impl Database {
    pub async fn insert_template(&self, template: &ContextTemplate) -> Result<()> {
        let record = template.clone();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO templates (id, name, emoji, description, category, target_apps_json, suggested_layout, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    record.id,
                    record.name,
                    record.emoji,
                    record.description,
                    record.category.as_str(),
                    to_json(&record.target_apps, "target_apps")?,
                    record.suggested_layout.as_str(),
                    Utc::now().to_rfc3339(),
                ],
            )?;
            Ok(())
        })
        .await
    }

    /// Custom templates in creation order.
    pub async fn list_custom_templates(&self) -> Result<Vec<ContextTemplate>> {
        self.execute(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, emoji, description, category, target_apps_json, suggested_layout
                 FROM templates
                 ORDER BY created_at ASC, rowid ASC",
            )?;
            let mut rows = stmt.query([])?;
            let mut templates = Vec::new();
            while let Some(row) = rows.next()? {
                templates.push(row_to_template(row)?);
            }
            Ok(templates)
        })
        .await
    }

    pub async fn delete_template(&self, template_id: &str) -> Result<bool> {
        let template_id = template_id.to_string();
        self.execute(move |conn| {
            let removed = conn.execute("DELETE FROM templates WHERE id = ?1", params![template_id])?;
            Ok(removed > 0)
        })
        .await
    }
}
