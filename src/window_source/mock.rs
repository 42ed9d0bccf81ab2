use std::collections::HashSet;
use std::sync::Mutex;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use chrono::{Local, Timelike};

use super::WindowSource;
use crate::db::TimeBucket;
use crate::models::{Bounds, WindowDescriptor};

#[derive(Default)]
struct MockState {
    windows: Vec<WindowDescriptor>,
    launched: Vec<String>,
    next_id: u32,
}

/// In-memory window list. Only applications marked launchable can be
/// launched; a launch adds one window titled after the app.
pub struct StaticWindowSource {
    state: Mutex<MockState>,
    launchable: HashSet<String>,
    fail_listing: bool,
}

impl StaticWindowSource {
    pub fn new(windows: Vec<WindowDescriptor>) -> Self {
        let mut state = MockState::default();
        for window in windows {
            state.next_id += 1;
            let id = if window.id == 0 { state.next_id } else { window.id };
            state.windows.push(WindowDescriptor { id, ..window });
        }
        Self {
            state: Mutex::new(state),
            launchable: HashSet::new(),
            fail_listing: false,
        }
    }

    pub fn with_launchable<I, S>(mut self, apps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.launchable
            .extend(apps.into_iter().map(|app| app.as_ref().to_lowercase()));
        self
    }

    /// Listing always fails; for exercising degraded paths.
    pub fn failing() -> Self {
        Self {
            fail_listing: true,
            ..Self::new(Vec::new())
        }
    }

    pub fn windows(&self) -> Vec<WindowDescriptor> {
        self.lock().windows.clone()
    }

    pub fn launched(&self) -> Vec<String> {
        self.lock().launched.clone()
    }

    pub fn replace_windows(&self, windows: Vec<WindowDescriptor>) {
        let mut state = self.lock();
        state.windows.clear();
        for window in windows {
            state.next_id += 1;
            let id = state.next_id;
            state.windows.push(WindowDescriptor { id, ..window });
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn with_window<F>(&self, target: &WindowDescriptor, apply: F) -> Result<()>
    where
        F: FnOnce(&mut WindowDescriptor),
    {
        let mut state = self.lock();
        let window = state
            .windows
            .iter_mut()
            .find(|w| (target.id != 0 && w.id == target.id) || (target.id == 0 && w.matches(target)))
            .ok_or_else(|| anyhow!("window {} / {} not found", target.app, target.title))?;
        apply(window);
        Ok(())
    }
}

#[async_trait]
impl WindowSource for StaticWindowSource {
    async fn list_visible_windows(&self) -> Result<Vec<WindowDescriptor>> {
        if self.fail_listing {
            bail!("window listing unavailable");
        }
        Ok(self.lock().windows.iter().filter(|w| w.visible).cloned().collect())
    }

    async fn launch_application(&self, app_name: &str) -> Result<()> {
        if !self.launchable.contains(&app_name.to_lowercase()) {
            bail!("application {app_name} cannot be launched");
        }
        let mut state = self.lock();
        state.next_id += 1;
        let id = state.next_id;
        state.launched.push(app_name.to_string());
        state.windows.push(
            WindowDescriptor::new(app_name, app_name, Bounds::new(100, 100, 800, 600)).with_id(id),
        );
        Ok(())
    }

    async fn set_bounds(&self, window: &WindowDescriptor, bounds: Bounds) -> Result<()> {
        self.with_window(window, |w| w.bounds = bounds)
    }

    async fn set_minimized(&self, window: &WindowDescriptor, minimized: bool) -> Result<()> {
        self.with_window(window, |w| w.minimized = minimized)
    }

    async fn focus(&self, window: &WindowDescriptor) -> Result<()> {
        let id = {
            let state = self.lock();
            state
                .windows
                .iter()
                .find(|w| (window.id != 0 && w.id == window.id) || (window.id == 0 && w.matches(window)))
                .map(|w| w.id)
                .ok_or_else(|| anyhow!("window {} / {} not found", window.app, window.title))?
        };
        let mut state = self.lock();
        for w in state.windows.iter_mut() {
            w.focused = w.id == id;
        }
        Ok(())
    }
}

/// Demo source whose window set follows the local time of day.
pub struct TimeBucketWindowSource {
    inner: StaticWindowSource,
    current: Mutex<Option<TimeBucket>>,
    hour: Box<dyn Fn() -> u32 + Send + Sync>,
}

impl TimeBucketWindowSource {
    pub fn new() -> Self {
        Self::with_clock(|| Local::now().hour())
    }

    pub fn with_clock<F>(hour: F) -> Self
    where
        F: Fn() -> u32 + Send + Sync + 'static,
    {
        Self {
            inner: StaticWindowSource::new(Vec::new()).with_launchable(
                preset_apps().iter().copied(),
            ),
            current: Mutex::new(None),
            hour: Box::new(hour),
        }
    }

    fn refresh(&self) {
        let bucket = TimeBucket::from_hour((self.hour)());
        let mut current = match self.current.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if *current != Some(bucket) {
            self.inner.replace_windows(preset(bucket));
            *current = Some(bucket);
        }
    }
}

impl Default for TimeBucketWindowSource {
    fn default() -> Self {
        Self::new()
    }
}

fn preset_apps() -> &'static [&'static str] {
    &[
        "Mail",
        "Calendar",
        "Safari",
        "Visual Studio Code",
        "Google Chrome",
        "Terminal",
        "Slack",
        "Spotify",
    ]
}

fn preset(bucket: TimeBucket) -> Vec<WindowDescriptor> {
    match bucket {
        TimeBucket::Morning => vec![
            WindowDescriptor::new("Mail", "Inbox", Bounds::new(0, 25, 720, 875)).focused(),
            WindowDescriptor::new("Calendar", "Calendar", Bounds::new(720, 25, 720, 875)),
            WindowDescriptor::new("Safari", "Morning Brew - morningbrew.com", Bounds::new(200, 100, 1000, 700)),
        ],
        TimeBucket::Afternoon => vec![
            WindowDescriptor::new(
                "Visual Studio Code",
                "index.ts - context-flow - Visual Studio Code",
                Bounds::new(100, 100, 1200, 800),
            )
            .focused(),
            WindowDescriptor::new("Terminal", "zsh - ~/Projects/context-flow", Bounds::new(50, 50, 800, 400)),
            WindowDescriptor::new(
                "Google Chrome",
                "Pull requests - github.com - Google Chrome",
                Bounds::new(200, 150, 1000, 700),
            ),
        ],
        TimeBucket::Evening => vec![
            WindowDescriptor::new("Slack", "general - Team", Bounds::new(0, 25, 900, 700)).focused(),
            WindowDescriptor::new("Safari", "Docs - docs.rs", Bounds::new(300, 100, 1100, 750)),
        ],
        TimeBucket::Night => vec![
            WindowDescriptor::new("Spotify", "Spotify", Bounds::new(0, 25, 800, 600)),
            WindowDescriptor::new("Terminal", "zsh - ~", Bounds::new(400, 200, 800, 500)).focused(),
        ],
    }
}

#[async_trait]
impl WindowSource for TimeBucketWindowSource {
    async fn list_visible_windows(&self) -> Result<Vec<WindowDescriptor>> {
        self.refresh();
        self.inner.list_visible_windows().await
    }

    async fn launch_application(&self, app_name: &str) -> Result<()> {
        self.refresh();
        self.inner.launch_application(app_name).await
    }

    async fn set_bounds(&self, window: &WindowDescriptor, bounds: Bounds) -> Result<()> {
        self.inner.set_bounds(window, bounds).await
    }

    async fn set_minimized(&self, window: &WindowDescriptor, minimized: bool) -> Result<()> {
        self.inner.set_minimized(window, minimized).await
    }

    async fn focus(&self, window: &WindowDescriptor) -> Result<()> {
        self.inner.focus(window).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn launch_adds_a_window_only_for_launchable_apps() {
        let source = StaticWindowSource::new(Vec::new()).with_launchable(["Safari"]);
        assert!(source.launch_application("Photoshop").await.is_err());
        source.launch_application("safari").await.unwrap();

        let windows = source.list_visible_windows().await.unwrap();
        assert_eq!(windows.len(), 1);
        assert_eq!(source.launched(), vec!["safari".to_string()]);
    }

    #[tokio::test]
    async fn mutations_apply_to_the_addressed_window() {
        let source = StaticWindowSource::new(vec![
            WindowDescriptor::new("Terminal", "zsh", Bounds::default()),
            WindowDescriptor::new("Safari", "Docs", Bounds::default()),
        ]);
        let windows = source.list_visible_windows().await.unwrap();

        source.set_bounds(&windows[1], Bounds::new(1, 2, 3, 4)).await.unwrap();
        source.set_minimized(&windows[0], true).await.unwrap();
        source.focus(&windows[1]).await.unwrap();

        let after = source.windows();
        assert!(after[0].minimized);
        assert_eq!(after[1].bounds, Bounds::new(1, 2, 3, 4));
        assert!(after[1].focused && !after[0].focused);
    }

    #[tokio::test]
    async fn time_bucket_source_follows_the_clock() {
        let source = TimeBucketWindowSource::with_clock(|| 9);
        let windows = source.list_visible_windows().await.unwrap();
        assert!(windows.iter().any(|w| w.app == "Mail"));

        let night = TimeBucketWindowSource::with_clock(|| 23);
        let windows = night.list_visible_windows().await.unwrap();
        assert!(windows.iter().any(|w| w.app == "Spotify"));
    }
}
