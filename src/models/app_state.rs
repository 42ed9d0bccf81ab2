//! Per-application state captured by adapters.
//!
//! Each adapter family owns one payload variant; snapshots key them by
//! [`AdapterKind`].

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "camelCase")]
pub enum AdapterKind {
    Editor,
    Browser,
    Terminal,
    Generic,
}

impl AdapterKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdapterKind::Editor => "editor",
            AdapterKind::Browser => "browser",
            AdapterKind::Terminal => "terminal",
            AdapterKind::Generic => "generic",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "editor" => Some(AdapterKind::Editor),
            "browser" => Some(AdapterKind::Browser),
            "terminal" => Some(AdapterKind::Terminal),
            "generic" => Some(AdapterKind::Generic),
            _ => None,
        }
    }
}

impl fmt::Display for AdapterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OpenFile {
    pub path: String,
    #[serde(default)]
    pub active: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EditorState {
    pub workspace: Option<String>,
    pub workspace_path: Option<String>,
    #[serde(default)]
    pub open_files: Vec<OpenFile>,
    pub active_file: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BrowserTab {
    pub url: String,
    pub title: String,
    #[serde(default)]
    pub active: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BrowserState {
    #[serde(default)]
    pub tabs: Vec<BrowserTab>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TerminalState {
    pub cwd: String,
    pub shell: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum AppState {
    Editor(EditorState),
    Browser(BrowserState),
    Terminal(TerminalState),
}

impl AppState {
    pub fn kind(&self) -> AdapterKind {
        match self {
            AppState::Editor(_) => AdapterKind::Editor,
            AppState::Browser(_) => AdapterKind::Browser,
            AppState::Terminal(_) => AdapterKind::Terminal,
        }
    }

    /// Folds a second capture of the same family into this one.
    pub fn merge(&mut self, other: AppState) {
        match (self, other) {
            (AppState::Editor(current), AppState::Editor(next)) => {
                if current.workspace.is_none() {
                    current.workspace = next.workspace;
                    current.workspace_path = next.workspace_path;
                }
                for file in next.open_files {
                    if !current.open_files.iter().any(|f| f.path == file.path) {
                        current.open_files.push(file);
                    }
                }
                if current.active_file.is_none() {
                    current.active_file = next.active_file;
                }
            }
            (AppState::Browser(current), AppState::Browser(next)) => {
                current.tabs.extend(next.tabs);
            }
            // Terminal: first capture wins. Mismatched kinds never share a key.
            _ => {}
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct AppStates(BTreeMap<AdapterKind, AppState>);

impl AppStates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, state: AppState) {
        let kind = state.kind();
        match self.0.get_mut(&kind) {
            Some(existing) => existing.merge(state),
            None => {
                self.0.insert(kind, state);
            }
        }
    }

    pub fn get(&self, kind: AdapterKind) -> Option<&AppState> {
        self.0.get(&kind)
    }

    pub fn contains(&self, kind: AdapterKind) -> bool {
        self.0.contains_key(&kind)
    }

    pub fn kinds(&self) -> impl Iterator<Item = AdapterKind> + '_ {
        self.0.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AdapterKind, &AppState)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn editor(&self) -> Option<&EditorState> {
        match self.0.get(&AdapterKind::Editor) {
            Some(AppState::Editor(state)) => Some(state),
            _ => None,
        }
    }

    pub fn browser(&self) -> Option<&BrowserState> {
        match self.0.get(&AdapterKind::Browser) {
            Some(AppState::Browser(state)) => Some(state),
            _ => None,
        }
    }

    pub fn terminal(&self) -> Option<&TerminalState> {
        match self.0.get(&AdapterKind::Terminal) {
            Some(AppState::Terminal(state)) => Some(state),
            _ => None,
        }
    }
}

impl FromIterator<AppState> for AppStates {
    fn from_iter<I: IntoIterator<Item = AppState>>(iter: I) -> Self {
        let mut states = AppStates::new();
        for state in iter {
            states.insert(state);
        }
        states
    }
}
