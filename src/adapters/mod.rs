//! Per-application capture and restore of app-specific state.

pub mod browser;
pub mod editor;
pub mod generic;
pub mod registry;
pub mod terminal;

use std::fmt;

use async_trait::async_trait;
use serde::Serialize;

use crate::models::{AdapterKind, AppState, WindowDescriptor};

pub use browser::BrowserAdapter;
pub use editor::EditorAdapter;
pub use generic::GenericAdapter;
pub use registry::AdapterRegistry;
pub use terminal::TerminalAdapter;

#[derive(Debug, Clone, PartialEq)]
pub enum CaptureOutcome {
    Captured(AppState),
    Empty,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreOutcome {
    Applied,
    Skipped(String),
    Failed(String),
}

impl RestoreOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, RestoreOutcome::Failed(_))
    }
}

impl fmt::Display for RestoreOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RestoreOutcome::Applied => f.write_str("applied"),
            RestoreOutcome::Skipped(reason) => write!(f, "skipped: {reason}"),
            RestoreOutcome::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

/// Adapters never return errors across this boundary; failures come back as
/// `Failed` outcomes.
#[async_trait]
pub trait AppAdapter: Send + Sync {
    fn kind(&self) -> AdapterKind;

    fn name(&self) -> &'static str {
        self.kind().as_str()
    }

    /// Application names this adapter handles.
    fn aliases(&self) -> &[&'static str];

    async fn capture(&self, window: &WindowDescriptor) -> CaptureOutcome;

    async fn restore(&self, window: &WindowDescriptor, state: &AppState) -> RestoreOutcome;

    async fn is_available(&self) -> bool;
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdapterInfo {
    pub name: String,
    pub aliases: Vec<String>,
    pub available: bool,
}
