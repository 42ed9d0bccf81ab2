use std::sync::Arc;

use chrono::{Local, Utc};
use uuid::Uuid;

use crate::adapters::{AdapterRegistry, CaptureOutcome};
use crate::ai::naming;
use crate::db::{ContextMetadata, ContextSnapshot};
use crate::models::{AppStates, WindowDescriptor};
use crate::os_bridge;
use crate::window_source::WindowSource;

const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

/// Applications never captured: this tool itself and OS chrome.
pub const CAPTURE_DENYLIST: &[&str] = &[
    "Context Flow",
    "context-flow",
    "Electron",
    "Dock",
    "SystemUIServer",
    "ControlCenter",
    "Notification Center",
    "Window Server",
    "loginwindow",
    "Spotlight",
];

fn is_denied(app: &str) -> bool {
    CAPTURE_DENYLIST
        .iter()
        .any(|denied| denied.eq_ignore_ascii_case(app))
}

/// Windows worth storing: on screen, titled, and not on the denylist.
pub fn filter_capturable(windows: Vec<WindowDescriptor>) -> Vec<WindowDescriptor> {
    windows
        .into_iter()
        .filter(|window| window.is_capturable())
        .filter(|window| !window.title.trim().is_empty())
        .filter(|window| !is_denied(&window.app))
        .collect()
}

#[derive(Clone)]
pub struct CaptureEngine {
    source: Arc<dyn WindowSource>,
    registry: Arc<AdapterRegistry>,
    user: String,
}

impl CaptureEngine {
    pub fn new(source: Arc<dyn WindowSource>, registry: Arc<AdapterRegistry>) -> Self {
        Self {
            source,
            registry,
            user: os_bridge::user_name(),
        }
    }

    /// Overrides the user name the naming heuristics skip in paths.
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    /// Current capturable windows; a failing source yields none.
    pub async fn current_windows(&self) -> Vec<WindowDescriptor> {
        match self.source.list_visible_windows().await {
            Ok(windows) => filter_capturable(windows),
            Err(err) => {
                log_warn!("window source unavailable, capturing nothing: {err:?}");
                Vec::new()
            }
        }
    }

    /// Snapshot of what is on screen now. Never fails: a missing source or a
    /// broken adapter only makes the snapshot poorer.
    pub async fn capture_context(&self, custom_name: Option<&str>) -> ContextSnapshot {
        let windows = self.current_windows().await;
        let (app_states, failures) = self.capture_states(&windows).await;
        if failures > 0 {
            log_warn!("{failures} adapter capture(s) failed");
        }

        let now_local = Local::now().naive_local();
        let name = match custom_name.map(str::trim).filter(|name| !name.is_empty()) {
            Some(name) => name.to_string(),
            None => naming::generate_name(&app_states, &windows, now_local, &self.user),
        };
        let project = naming::detect_project(&app_states, &self.user);
        let tags = naming::extract_tags(&app_states, now_local);
        let emoji = naming::pick_emoji(&app_states, &windows);

        let now = Utc::now();
        let snapshot = ContextSnapshot {
            id: Uuid::new_v4().to_string(),
            name,
            emoji,
            created_at: now,
            updated_at: now,
            last_restored: None,
            restore_count: 0,
            metadata: ContextMetadata {
                project,
                tags,
                duration_secs: 0,
                app_count: windows.len(),
            },
            windows: windows.iter().map(WindowDescriptor::detached).collect(),
            app_states,
        };

        log_info!(
            "captured context '{}' ({} windows, {} app states)",
            snapshot.name,
            snapshot.windows.len(),
            snapshot.app_states.len()
        );
        snapshot
    }

    async fn capture_states(&self, windows: &[WindowDescriptor]) -> (AppStates, usize) {
        let mut states = AppStates::new();
        let mut failures = 0;

        for window in windows {
            let adapter = self.registry.resolve(&window.app);
            match adapter.capture(window).await {
                CaptureOutcome::Captured(state) => states.insert(state),
                CaptureOutcome::Empty => {}
                CaptureOutcome::Failed(reason) => {
                    failures += 1;
                    log_warn!(
                        "{} adapter failed to capture '{}': {reason}",
                        adapter.name(),
                        window.app
                    );
                }
            }
        }

        (states, failures)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AdapterKind, Bounds};
    use crate::window_source::StaticWindowSource;

    fn engine(windows: Vec<WindowDescriptor>) -> CaptureEngine {
        let source = Arc::new(StaticWindowSource::new(windows));
        CaptureEngine::new(source, Arc::new(AdapterRegistry::with_defaults())).with_user("u")
    }

    #[test]
    fn filter_drops_minimized_untitled_and_denied_windows() {
        let kept = filter_capturable(vec![
            WindowDescriptor::new("Safari", "Docs", Bounds::default()),
            WindowDescriptor::new("Safari", "Hidden", Bounds::default()).minimized(),
            WindowDescriptor::new("Notes", "  ", Bounds::default()),
            WindowDescriptor::new("dock", "Dock", Bounds::default()),
            WindowDescriptor::new("Context Flow", "Main", Bounds::default()),
        ]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].title, "Docs");
    }

    #[tokio::test]
    async fn captures_states_and_counts_windows() {
        let engine = engine(vec![
            WindowDescriptor::new(
                "Visual Studio Code",
                "main.rs - demo - Visual Studio Code",
                Bounds::new(0, 0, 1200, 800),
            ),
            WindowDescriptor::new("Terminal", "zsh - ~/demo", Bounds::new(0, 0, 800, 400)),
            WindowDescriptor::new("Preview", "scan.pdf", Bounds::default()),
        ]);

        let snapshot = engine.capture_context(None).await;
        assert_eq!(snapshot.metadata.app_count, 3);
        assert_eq!(snapshot.windows.len(), 3);
        assert!(snapshot.windows.iter().all(|w| w.id == 0));
        assert!(snapshot.app_states.contains(AdapterKind::Editor));
        assert!(snapshot.app_states.contains(AdapterKind::Terminal));
        assert_eq!(snapshot.restore_count, 0);
        assert_eq!(snapshot.emoji, "💻");
        assert!(snapshot.name.starts_with("demo "), "{}", snapshot.name);
        assert_eq!(snapshot.created_at, snapshot.updated_at);
    }

    #[tokio::test]
    async fn custom_name_wins_unless_blank() {
        let engine = engine(vec![WindowDescriptor::new("Safari", "Docs", Bounds::default())]);
        assert_eq!(engine.capture_context(Some("Release")).await.name, "Release");
        assert_ne!(engine.capture_context(Some("   ")).await.name, "   ");
    }

    #[tokio::test]
    async fn failing_source_yields_an_empty_snapshot() {
        let engine = CaptureEngine::new(
            Arc::new(StaticWindowSource::failing()),
            Arc::new(AdapterRegistry::with_defaults()),
        );
        let snapshot = engine.capture_context(None).await;
        assert!(snapshot.windows.is_empty());
        assert_eq!(snapshot.metadata.app_count, 0);
        assert!(snapshot.name.starts_with("Workspace "));
    }
}
