//! Command surface. Every command returns `Result<T, String>`; wrap it in
//! [`CommandResponse`] for the `{success, data | error}` wire shape.

pub mod contexts;
pub mod folders;
pub mod insights;
pub mod templates;
pub mod timer;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use log::{info, warn};
use serde::Serialize;

use crate::adapters::AdapterRegistry;
use crate::autosnap::{AutoSnapConfig, AutoSnapController};
use crate::db::{ContextSnapshot, Database, EventType, UserEvent};
use crate::engine::{CaptureEngine, RestoreEngine};
use crate::features::FocusMode;
use crate::settings::{SettingsStore, UserSettings, SETTINGS_FILE};
use crate::timer::TimerController;
use crate::window_source::WindowSource;

pub const DATABASE_FILE: &str = "context-flow.sqlite3";

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CommandResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> From<Result<T, String>> for CommandResponse<T> {
    fn from(result: Result<T, String>) -> Self {
        match result {
            Ok(data) => Self {
                success: true,
                data: Some(data),
                error: None,
            },
            Err(error) => Self {
                success: false,
                data: None,
                error: Some(error),
            },
        }
    }
}

pub(crate) fn not_found(kind: &str, id: &str) -> String {
    format!("{kind} {id} not found")
}

/// Everything the commands operate on. Built once by [`AppContext::initialize`]
/// and torn down with [`AppContext::shutdown`].
pub struct AppContext {
    pub(crate) db: Database,
    pub(crate) settings: SettingsStore,
    pub(crate) source: Arc<dyn WindowSource>,
    pub(crate) registry: Arc<AdapterRegistry>,
    pub(crate) capture: CaptureEngine,
    pub(crate) timer: TimerController,
    pub(crate) autosnap: AutoSnapController,
    pub(crate) focus: FocusMode,
    data_dir: PathBuf,
}

impl AppContext {
    /// Opens (or creates) the data directory with the default adapters that
    /// settings enable.
    pub async fn initialize(data_dir: &Path, source: Arc<dyn WindowSource>) -> Result<Self> {
        let settings = SettingsStore::new(data_dir.join(SETTINGS_FILE))?;
        let registry = AdapterRegistry::with_enabled(&settings.get().adapter_kinds());
        Self::initialize_with(data_dir, source, registry).await
    }

    pub async fn initialize_with(
        data_dir: &Path,
        source: Arc<dyn WindowSource>,
        registry: AdapterRegistry,
    ) -> Result<Self> {
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;

        let settings = SettingsStore::new(data_dir.join(SETTINGS_FILE))?;
        let db = Database::new(data_dir.join(DATABASE_FILE))?;
        let registry = Arc::new(registry);
        let capture = CaptureEngine::new(source.clone(), registry.clone());

        let timer = TimerController::new(db.clone());
        timer.recover_interrupted().await?;

        let current = settings.get();
        let focus = FocusMode::new(source.clone(), current.focus_blocked_apps.clone());
        let autosnap = AutoSnapController::new(capture.clone(), db.clone());

        let ctx = Self {
            db,
            settings,
            source,
            registry,
            capture,
            timer,
            autosnap,
            focus,
            data_dir: data_dir.to_path_buf(),
        };

        if current.auto_snap {
            ctx.autosnap.start(autosnap_config(&current)).await?;
        }

        info!("Context Flow ready at {}", ctx.data_dir.display());
        Ok(ctx)
    }

    /// Stops background work: the auto-snap loop, the timer (its running
    /// session ends as interrupted) and focus mode.
    pub async fn shutdown(&self) -> Result<()> {
        self.autosnap.stop().await?;
        self.timer.shutdown().await?;
        self.focus.deactivate().await;
        info!("Context Flow shut down");
        Ok(())
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn settings(&self) -> &SettingsStore {
        &self.settings
    }

    pub fn timer(&self) -> &TimerController {
        &self.timer
    }

    pub fn focus(&self) -> &FocusMode {
        &self.focus
    }

    pub fn registry(&self) -> &AdapterRegistry {
        &self.registry
    }

    pub(crate) fn restore_engine(&self) -> RestoreEngine {
        RestoreEngine::new(
            self.source.clone(),
            self.registry.clone(),
            self.settings.get().restore_timing(),
        )
    }

    /// Event logging never fails a command.
    pub(crate) async fn record_event(
        &self,
        event_type: EventType,
        context: Option<&ContextSnapshot>,
    ) {
        let event = match context {
            Some(context) => UserEvent::new(event_type, Some(context.id.clone()))
                .with_apps(context.app_names())
                .with_project(context.metadata.project.clone()),
            None => UserEvent::new(event_type, None),
        };
        if let Err(err) = self.db.insert_event(&event).await {
            warn!("Failed to record {} event: {err:?}", event_type.as_str());
        }
    }

    pub(crate) async fn load_context(&self, context_id: &str) -> Result<ContextSnapshot, String> {
        self.db
            .get_context(context_id)
            .await
            .map_err(|e| e.to_string())?
            .ok_or_else(|| not_found("context", context_id))
    }
}

pub(crate) fn autosnap_config(settings: &UserSettings) -> AutoSnapConfig {
    AutoSnapConfig::with_interval_minutes(settings.auto_snap_interval_minutes, settings.max_contexts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn responses_serialize_to_success_or_error_shape() {
        let ok: CommandResponse<u32> = Ok(3).into();
        assert_eq!(
            serde_json::to_value(&ok).unwrap(),
            serde_json::json!({"success": true, "data": 3})
        );

        let err: CommandResponse<u32> = Err(not_found("context", "x")).into();
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            serde_json::json!({"success": false, "error": "context x not found"})
        );
    }
}
