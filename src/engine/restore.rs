use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use chrono::Utc;
use futures::future::join_all;
use serde::Serialize;

use crate::adapters::{AdapterRegistry, AppAdapter, RestoreOutcome};
use crate::db::ContextSnapshot;
use crate::models::{AdapterKind, AppState, AppStates, WindowDescriptor};
use crate::settings::RestoreTiming;
use crate::window_source::WindowSource;

const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info, log_warn};

/// Launch names for application names that differ from what `open -a`
/// expects.
const LAUNCH_ALIASES: &[(&str, &str)] = &[
    ("Code", "Visual Studio Code"),
    ("chrome", "Google Chrome"),
    ("terminal", "Terminal"),
];

pub fn launch_name(app: &str) -> &str {
    LAUNCH_ALIASES
        .iter()
        .find(|(alias, _)| *alias == app)
        .map(|(_, target)| *target)
        .unwrap_or(app)
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RestoreResult {
    pub context_id: String,
    pub restored: usize,
    pub failed: usize,
    /// Applications with at least one restored window, in snapshot order.
    pub apps: Vec<String>,
    pub adapter_failures: usize,
    pub duration_ms: u64,
}

#[derive(Clone)]
pub struct RestoreEngine {
    source: Arc<dyn WindowSource>,
    registry: Arc<AdapterRegistry>,
    timing: RestoreTiming,
}

impl RestoreEngine {
    pub fn new(
        source: Arc<dyn WindowSource>,
        registry: Arc<AdapterRegistry>,
        timing: RestoreTiming,
    ) -> Self {
        Self {
            source,
            registry,
            timing,
        }
    }

    /// Brings the snapshot's windows back, then replays each stored adapter
    /// state once. Per-window problems are logged and counted; the
    /// snapshot's restore bookkeeping is updated exactly once.
    pub async fn restore_context(
        &self,
        snapshot: &mut ContextSnapshot,
        close_others: bool,
    ) -> RestoreResult {
        let started = Instant::now();
        log_info!("restoring context '{}' ({} windows)", snapshot.name, snapshot.windows.len());

        if close_others {
            self.minimize_all().await;
        }

        let live = self.list_windows().await;
        let placed = join_all(
            snapshot
                .windows
                .iter()
                .map(|saved| self.restore_window(saved, &live)),
        )
        .await;

        let mut result = RestoreResult {
            context_id: snapshot.id.clone(),
            restored: 0,
            failed: 0,
            apps: Vec::new(),
            adapter_failures: 0,
            duration_ms: 0,
        };
        for (saved, restored) in snapshot.windows.iter().zip(&placed) {
            if *restored {
                result.restored += 1;
                if !result.apps.contains(&saved.app) {
                    result.apps.push(saved.app.clone());
                }
            } else {
                result.failed += 1;
            }
        }

        let restored_windows = snapshot
            .windows
            .iter()
            .zip(&placed)
            .filter(|(_, restored)| **restored)
            .map(|(saved, _)| saved);
        result.adapter_failures = self
            .replay_states(restored_windows, &snapshot.app_states)
            .await;

        snapshot.mark_restored(Utc::now());
        result.duration_ms = started.elapsed().as_millis() as u64;

        log_info!(
            "restored context '{}' in {}ms: {} restored, {} missing, {} adapter failures",
            snapshot.name,
            result.duration_ms,
            result.restored,
            result.failed,
            result.adapter_failures
        );
        result
    }

    async fn list_windows(&self) -> Vec<WindowDescriptor> {
        match self.source.list_visible_windows().await {
            Ok(windows) => windows,
            Err(err) => {
                log_warn!("window source unavailable during restore: {err:?}");
                Vec::new()
            }
        }
    }

    async fn minimize_all(&self) {
        for window in self.list_windows().await {
            if !window.visible || window.minimized {
                continue;
            }
            if let Err(err) = self.source.set_minimized(&window, true).await {
                log_warn!("failed to minimize {} '{}': {err:?}", window.app, window.title);
            }
        }
    }

    /// Finds or launches the window and puts it back where it was. Returns
    /// whether a window was placed.
    async fn restore_window(&self, saved: &WindowDescriptor, live: &[WindowDescriptor]) -> bool {
        let existing = live.iter().find(|window| window.matches(saved)).cloned();
        let window = match existing {
            Some(window) => Some(window),
            None => self.launch_and_find(saved, live).await,
        };
        let Some(window) = window else {
            log_warn!("could not find or launch {} for '{}'", saved.app, saved.title);
            return false;
        };

        if let Err(err) = self.apply_geometry(&window, saved).await {
            log_error!("failed to place {} '{}': {err:?}", saved.app, saved.title);
        }
        true
    }

    /// Stored state is merged per adapter kind, so each kind is replayed once,
    /// against the first restored window it resolves for. Returns the number
    /// of failed replays.
    async fn replay_states<'a>(
        &self,
        restored: impl Iterator<Item = &'a WindowDescriptor>,
        states: &'a AppStates,
    ) -> usize {
        let mut seen: HashSet<AdapterKind> = HashSet::new();
        let mut replays: Vec<(Arc<dyn AppAdapter>, &WindowDescriptor, &AppState)> = Vec::new();
        for saved in restored {
            let adapter = self.registry.resolve(&saved.app);
            let kind = adapter.kind();
            if seen.contains(&kind) {
                continue;
            }
            if let Some(state) = states.get(kind) {
                seen.insert(kind);
                replays.push((adapter, saved, state));
            }
        }
        if replays.is_empty() {
            return 0;
        }

        if !self.timing.adapter_settle.is_zero() {
            tokio::time::sleep(self.timing.adapter_settle).await;
        }

        let outcomes = join_all(
            replays
                .iter()
                .map(|(adapter, saved, state)| adapter.restore(saved, state)),
        )
        .await;

        let mut failures = 0;
        for ((adapter, saved, _), outcome) in replays.iter().zip(outcomes) {
            match outcome {
                RestoreOutcome::Applied => {
                    log_info!("{} state restored for {}", adapter.name(), saved.app);
                }
                RestoreOutcome::Skipped(reason) => {
                    log_info!("{} state skipped for {}: {reason}", adapter.name(), saved.app);
                }
                RestoreOutcome::Failed(reason) => {
                    failures += 1;
                    log_warn!("{} state restore failed for {}: {reason}", adapter.name(), saved.app);
                }
            }
        }
        failures
    }

    /// Launches the application, waits for it to settle, then looks again.
    /// A window of the launched application that was not there before counts
    /// as a match when no title matches. Listing ids are positional, so
    /// "not there before" is judged by app and title.
    async fn launch_and_find(
        &self,
        saved: &WindowDescriptor,
        before: &[WindowDescriptor],
    ) -> Option<WindowDescriptor> {
        let app = launch_name(&saved.app);
        log_info!("launching {app}");
        if let Err(err) = self.source.launch_application(app).await {
            log_warn!("failed to launch {app}: {err:?}");
            return None;
        }

        if !self.timing.launch_settle.is_zero() {
            tokio::time::sleep(self.timing.launch_settle).await;
        }

        let known: HashSet<(String, &str)> = before
            .iter()
            .map(|window| (window.app.to_lowercase(), window.title.as_str()))
            .collect();
        let after = self.list_windows().await;
        after
            .iter()
            .find(|window| window.matches(saved))
            .or_else(|| {
                after.iter().find(|window| {
                    (window.app.eq_ignore_ascii_case(&saved.app)
                        || window.app.eq_ignore_ascii_case(app))
                        && !known.contains(&(window.app.to_lowercase(), window.title.as_str()))
                })
            })
            .cloned()
    }

    async fn apply_geometry(&self, window: &WindowDescriptor, saved: &WindowDescriptor) -> Result<()> {
        if window.minimized != saved.minimized && !saved.minimized {
            self.source.set_minimized(window, false).await?;
        }
        if window.bounds != saved.bounds {
            self.source.set_bounds(window, saved.bounds).await?;
        }
        if saved.minimized && !window.minimized {
            self.source.set_minimized(window, true).await?;
        }
        if saved.focused && !saved.minimized {
            self.source.focus(window).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::adapters::CaptureOutcome;
    use crate::db::ContextMetadata;
    use crate::models::{BrowserState, BrowserTab, Bounds, EditorState};
    use crate::window_source::applescript::parse_window_listing;
    use crate::window_source::StaticWindowSource;

    /// Counts replays and answers every one with the same outcome.
    struct RecordingAdapter {
        kind: AdapterKind,
        aliases: &'static [&'static str],
        fails: bool,
        calls: AtomicUsize,
    }

    impl RecordingAdapter {
        fn new(kind: AdapterKind, aliases: &'static [&'static str], fails: bool) -> Arc<Self> {
            Arc::new(Self {
                kind,
                aliases,
                fails,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AppAdapter for RecordingAdapter {
        fn kind(&self) -> AdapterKind {
            self.kind
        }

        fn aliases(&self) -> &[&'static str] {
            self.aliases
        }

        async fn capture(&self, _window: &WindowDescriptor) -> CaptureOutcome {
            CaptureOutcome::Failed("not used".into())
        }

        async fn restore(&self, _window: &WindowDescriptor, _state: &AppState) -> RestoreOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fails {
                RestoreOutcome::Failed("automation denied".into())
            } else {
                RestoreOutcome::Applied
            }
        }

        async fn is_available(&self) -> bool {
            true
        }
    }

    /// Serves one `osascript` listing before a launch and another after it.
    struct ListingSource {
        before: &'static str,
        after: &'static str,
        launched: AtomicBool,
    }

    #[async_trait]
    impl WindowSource for ListingSource {
        async fn list_visible_windows(&self) -> Result<Vec<WindowDescriptor>> {
            let listing = if self.launched.load(Ordering::SeqCst) {
                self.after
            } else {
                self.before
            };
            Ok(parse_window_listing(listing))
        }

        async fn launch_application(&self, _app_name: &str) -> Result<()> {
            self.launched.store(true, Ordering::SeqCst);
            Ok(())
        }

        async fn set_bounds(&self, _window: &WindowDescriptor, _bounds: Bounds) -> Result<()> {
            Ok(())
        }

        async fn set_minimized(&self, _window: &WindowDescriptor, _minimized: bool) -> Result<()> {
            Ok(())
        }

        async fn focus(&self, _window: &WindowDescriptor) -> Result<()> {
            Ok(())
        }
    }

    fn browser_state(url: &str) -> AppState {
        AppState::Browser(BrowserState {
            tabs: vec![BrowserTab {
                url: url.into(),
                title: url.into(),
                active: true,
            }],
        })
    }

    fn snapshot(windows: Vec<WindowDescriptor>) -> ContextSnapshot {
        let now = Utc::now();
        ContextSnapshot {
            id: "ctx".into(),
            name: "Test".into(),
            emoji: "📁".into(),
            created_at: now,
            updated_at: now,
            last_restored: None,
            restore_count: 0,
            metadata: ContextMetadata {
                app_count: windows.len(),
                ..ContextMetadata::default()
            },
            windows,
            app_states: AppStates::new(),
        }
    }

    fn engine(source: Arc<StaticWindowSource>) -> RestoreEngine {
        RestoreEngine::new(
            source,
            Arc::new(AdapterRegistry::new()),
            RestoreTiming::immediate(),
        )
    }

    #[test]
    fn launch_names_are_normalised() {
        assert_eq!(launch_name("Code"), "Visual Studio Code");
        assert_eq!(launch_name("chrome"), "Google Chrome");
        assert_eq!(launch_name("Safari"), "Safari");
    }

    #[tokio::test]
    async fn moves_existing_windows_and_focuses() {
        let source = Arc::new(StaticWindowSource::new(vec![
            WindowDescriptor::new("Safari", "Docs - docs.rs", Bounds::new(0, 0, 500, 500)),
            WindowDescriptor::new("Notes", "Todo", Bounds::default()).focused(),
        ]));
        let mut context = snapshot(vec![
            WindowDescriptor::new("Safari", "Docs", Bounds::new(10, 20, 900, 700)).focused(),
        ]);

        let result = engine(source.clone()).restore_context(&mut context, false).await;

        assert_eq!(result.restored, 1);
        assert_eq!(result.failed, 0);
        assert_eq!(result.apps, vec!["Safari".to_string()]);
        let windows = source.windows();
        assert_eq!(windows[0].bounds, Bounds::new(10, 20, 900, 700));
        assert!(windows[0].focused && !windows[1].focused);
        assert_eq!(context.restore_count, 1);
        assert!(context.last_restored.is_some());
    }

    #[tokio::test]
    async fn launches_missing_apps_through_the_alias_table() {
        let source = Arc::new(StaticWindowSource::new(Vec::new()).with_launchable(["Visual Studio Code"]));
        let mut context = snapshot(vec![WindowDescriptor::new(
            "Code",
            "main.rs - demo",
            Bounds::new(0, 0, 1000, 800),
        )]);

        let result = engine(source.clone()).restore_context(&mut context, false).await;

        assert_eq!(source.launched(), vec!["Visual Studio Code".to_string()]);
        assert_eq!(result.restored, 1);
        assert_eq!(source.windows()[0].bounds, Bounds::new(0, 0, 1000, 800));
    }

    #[tokio::test]
    async fn unlaunchable_apps_count_as_failed_without_error() {
        let source = Arc::new(StaticWindowSource::new(Vec::new()));
        let mut context = snapshot(vec![WindowDescriptor::new("Photoshop", "art.psd", Bounds::default())]);

        let result = engine(source).restore_context(&mut context, false).await;

        assert_eq!(result.restored, 0);
        assert_eq!(result.failed, 1);
        assert_eq!(context.restore_count, 1);
    }

    #[tokio::test]
    async fn close_others_minimizes_unrelated_windows() {
        let source = Arc::new(StaticWindowSource::new(vec![
            WindowDescriptor::new("Slack", "general", Bounds::default()),
            WindowDescriptor::new("Safari", "Docs", Bounds::default()),
        ]));
        let mut context = snapshot(vec![WindowDescriptor::new("Safari", "Docs", Bounds::default())]);

        engine(source.clone()).restore_context(&mut context, true).await;

        let windows = source.windows();
        assert!(windows[0].minimized);
        assert!(!windows[1].minimized);
    }

    #[tokio::test]
    async fn launched_window_is_found_when_listed_ahead_of_known_ones() {
        let source = Arc::new(ListingSource {
            before: "Terminal\tzsh\t0\t25\t800\t600\tfalse\ttrue\n\
                     Safari\tDocs\t800\t25\t900\t700\tfalse\tfalse\n",
            after: "Visual Studio Code\tWelcome\t0\t25\t1000\t800\tfalse\ttrue\n\
                    Terminal\tzsh\t0\t25\t800\t600\tfalse\tfalse\n\
                    Safari\tDocs\t800\t25\t900\t700\tfalse\tfalse\n",
            launched: AtomicBool::new(false),
        });
        let engine = RestoreEngine::new(
            source.clone(),
            Arc::new(AdapterRegistry::new()),
            RestoreTiming::immediate(),
        );
        let mut context = snapshot(vec![WindowDescriptor::new(
            "Visual Studio Code",
            "main.rs - demo - Visual Studio Code",
            Bounds::new(0, 25, 1200, 800),
        )]);

        let result = engine.restore_context(&mut context, false).await;

        assert!(source.launched.load(Ordering::SeqCst));
        assert_eq!(result.restored, 1);
        assert_eq!(result.failed, 0);
    }

    #[tokio::test]
    async fn stored_states_are_replayed_and_failures_counted() {
        let editor = RecordingAdapter::new(AdapterKind::Editor, &["Visual Studio Code"], true);
        let browser = RecordingAdapter::new(AdapterKind::Browser, &["Safari"], false);
        let mut registry = AdapterRegistry::new();
        registry.register(editor.clone());
        registry.register(browser.clone());

        let windows = vec![
            WindowDescriptor::new("Visual Studio Code", "main.rs - demo", Bounds::default()),
            WindowDescriptor::new("Safari", "Docs", Bounds::default()),
        ];
        let source = Arc::new(StaticWindowSource::new(windows.clone()));
        let engine = RestoreEngine::new(source, Arc::new(registry), RestoreTiming::immediate());
        let mut context = snapshot(windows);
        context.app_states.insert(AppState::Editor(EditorState {
            workspace: Some("demo".into()),
            ..EditorState::default()
        }));

        let result = engine.restore_context(&mut context, false).await;

        assert_eq!(result.restored, 2);
        assert_eq!(result.adapter_failures, 1);
        assert_eq!(editor.calls(), 1);
        assert_eq!(browser.calls(), 0);
        assert_eq!(context.restore_count, 1);
    }

    #[tokio::test]
    async fn merged_state_is_replayed_once_per_kind() {
        let browser = RecordingAdapter::new(AdapterKind::Browser, &["Safari", "Google Chrome"], false);
        let mut registry = AdapterRegistry::new();
        registry.register(browser.clone());

        let windows = vec![
            WindowDescriptor::new("Google Chrome", "Issues", Bounds::default()),
            WindowDescriptor::new("Safari", "Docs", Bounds::default()),
        ];
        let source = Arc::new(StaticWindowSource::new(windows.clone()));
        let engine = RestoreEngine::new(source, Arc::new(registry), RestoreTiming::immediate());
        let mut context = snapshot(windows);
        context.app_states.insert(browser_state("https://github.com"));
        context.app_states.insert(browser_state("https://docs.rs"));

        let result = engine.restore_context(&mut context, false).await;

        assert_eq!(result.restored, 2);
        assert_eq!(result.adapter_failures, 0);
        assert_eq!(browser.calls(), 1);
    }
}
