use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::{ContextSnapshot, Database};
use crate::os_bridge::{escape_applescript, shell_quote};

const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

pub const EXPORT_VERSION: &str = "1.0.0";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExportBundle {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub contexts: Vec<ContextSnapshot>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ImportResult {
    pub success: bool,
    pub imported: usize,
    pub failed: usize,
    pub errors: Vec<String>,
}

pub async fn export_all(db: &Database) -> Result<ExportBundle> {
    Ok(ExportBundle {
        version: EXPORT_VERSION.to_string(),
        exported_at: Utc::now(),
        contexts: db.load_all_contexts().await?,
    })
}

pub async fn export_json(db: &Database) -> Result<String> {
    let bundle = export_all(db).await?;
    serde_json::to_string_pretty(&bundle).context("failed to serialize export bundle")
}

/// Imports every snapshot of an export bundle under a fresh id. The bundle
/// is imported oldest first so relative order survives the round trip.
pub async fn import_json(db: &Database, text: &str, max_retained: usize) -> ImportResult {
    let bundle: ExportBundle = match serde_json::from_str(text) {
        Ok(bundle) => bundle,
        Err(err) => {
            log_warn!("rejected import: {err}");
            return ImportResult {
                success: false,
                errors: vec![format!("Parse error: {err}")],
                ..ImportResult::default()
            };
        }
    };

    let mut result = ImportResult {
        success: true,
        ..ImportResult::default()
    };
    let now = Utc::now();
    for mut context in bundle.contexts.into_iter().rev() {
        context.id = format!("imported_{}", Uuid::new_v4());
        context.name = format!("{} (Imported)", context.name);
        context.created_at = now;

        match db.upsert_context(&context, max_retained).await {
            Ok(_) => result.imported += 1,
            Err(err) => {
                result.failed += 1;
                result
                    .errors
                    .push(format!("Failed to import \"{}\": {err:#}", context.name));
            }
        }
    }

    log_info!("imported {} contexts ({} failed)", result.imported, result.failed);
    result
}

/// Shell script that relaunches every application of the snapshot.
pub fn shell_script(context: &ContextSnapshot) -> String {
    let mut lines = vec![
        "#!/bin/bash".to_string(),
        "# Context Flow - Restore Script".to_string(),
        format!("# Context: {}", context.name),
        format!("# Generated: {}", Utc::now().to_rfc3339()),
        String::new(),
    ];
    for app in context.app_names() {
        lines.push(format!("# Launch {app}"));
        lines.push(format!("open -a {}", shell_quote(&app)));
        lines.push(String::new());
    }
    lines.join("\n")
}

pub fn applescript(context: &ContextSnapshot) -> String {
    let mut lines = vec![
        "-- Context Flow - AppleScript".to_string(),
        format!("-- Context: {}", context.name),
        String::new(),
    ];
    for app in context.app_names() {
        lines.push(format!("tell application \"{}\" to activate", escape_applescript(&app)));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{sample_snapshot, temp_database};

    #[tokio::test]
    async fn import_reidentifies_and_renames() {
        let (_dir, source_db) = temp_database();
        source_db.upsert_context(&sample_snapshot("a"), 50).await.unwrap();
        source_db.upsert_context(&sample_snapshot("b"), 50).await.unwrap();
        let json = export_json(&source_db).await.unwrap();

        let (_dir2, target) = temp_database();
        let result = import_json(&target, &json, 50).await;

        assert!(result.success);
        assert_eq!(result.imported, 2);
        let contexts = target.load_all_contexts().await.unwrap();
        assert!(contexts.iter().all(|c| c.id.starts_with("imported_")));
        let names: Vec<&str> = contexts.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["b Morning (Imported)", "a Morning (Imported)"]);
    }

    #[tokio::test]
    async fn malformed_json_reports_failure() {
        let (_dir, db) = temp_database();
        let result = import_json(&db, "{ nope", 50).await;
        assert!(!result.success);
        assert_eq!(result.imported, 0);
        assert_eq!(result.errors.len(), 1);
    }

    #[test]
    fn scripts_launch_each_app_once() {
        let mut context = sample_snapshot("a");
        context.windows.push(context.windows[0].clone());

        let script = shell_script(&context);
        assert!(script.starts_with("#!/bin/bash"));
        assert_eq!(script.matches("open -a").count(), 2);
        assert!(script.contains("open -a 'Visual Studio Code'"));

        let apple = applescript(&context);
        assert!(apple.contains("tell application \"Terminal\" to activate"));
    }
}
