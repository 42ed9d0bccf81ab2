use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::models::WindowDescriptor;
use crate::window_source::WindowSource;

const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FocusStatus {
    pub active: bool,
    pub hidden_windows: usize,
    pub elapsed_secs: u64,
}

#[derive(Default)]
struct FocusState {
    started: Option<Instant>,
    hidden: Vec<WindowDescriptor>,
    blocked_apps: Vec<String>,
}

/// Hides distracting applications while active and puts back exactly the
/// windows it hid.
#[derive(Clone)]
pub struct FocusMode {
    source: Arc<dyn WindowSource>,
    state: Arc<Mutex<FocusState>>,
}

impl FocusMode {
    pub fn new(source: Arc<dyn WindowSource>, blocked_apps: Vec<String>) -> Self {
        Self {
            source,
            state: Arc::new(Mutex::new(FocusState {
                blocked_apps,
                ..FocusState::default()
            })),
        }
    }

    pub async fn is_active(&self) -> bool {
        self.state.lock().await.started.is_some()
    }

    pub async fn elapsed(&self) -> Duration {
        self.state
            .lock()
            .await
            .started
            .map(|started| started.elapsed())
            .unwrap_or_default()
    }

    pub async fn set_blocked_apps(&self, apps: Vec<String>) {
        self.state.lock().await.blocked_apps = apps;
    }

    pub async fn status(&self) -> FocusStatus {
        let state = self.state.lock().await;
        FocusStatus {
            active: state.started.is_some(),
            hidden_windows: state.hidden.len(),
            elapsed_secs: state.started.map(|s| s.elapsed().as_secs()).unwrap_or(0),
        }
    }

    /// Minimizes every visible window of a blocked app. No-op when already
    /// active.
    pub async fn activate(&self) -> Result<FocusStatus> {
        let mut state = self.state.lock().await;
        if state.started.is_some() {
            drop(state);
            return Ok(self.status().await);
        }

        let windows = self.source.list_visible_windows().await?;
        let targets: Vec<WindowDescriptor> = windows
            .into_iter()
            .filter(|window| window.visible && !window.minimized)
            .filter(|window| {
                state
                    .blocked_apps
                    .iter()
                    .any(|blocked| blocked.eq_ignore_ascii_case(&window.app))
            })
            .collect();

        let mut hidden = Vec::with_capacity(targets.len());
        for window in targets {
            match self.source.set_minimized(&window, true).await {
                Ok(()) => hidden.push(window),
                Err(err) => log_warn!("focus mode could not hide {}: {err:?}", window.app),
            }
        }

        log_info!("focus mode on, {} windows hidden", hidden.len());
        state.hidden = hidden;
        state.started = Some(Instant::now());

        Ok(FocusStatus {
            active: true,
            hidden_windows: state.hidden.len(),
            elapsed_secs: 0,
        })
    }

    /// Un-minimizes the windows hidden by [`activate`](Self::activate) and
    /// returns how long focus lasted. `None` when focus mode was off.
    pub async fn deactivate(&self) -> Option<Duration> {
        let mut state = self.state.lock().await;
        let started = state.started.take()?;

        for window in std::mem::take(&mut state.hidden) {
            if let Err(err) = self.source.set_minimized(&window, false).await {
                log_warn!("focus mode could not restore {}: {err:?}", window.app);
            }
        }

        let elapsed = started.elapsed();
        log_info!("focus mode off after {:.1} minutes", elapsed.as_secs_f64() / 60.0);
        Some(elapsed)
    }

    pub async fn toggle(&self) -> Result<FocusStatus> {
        if self.is_active().await {
            self.deactivate().await;
            Ok(self.status().await)
        } else {
            self.activate().await
        }
    }
}
