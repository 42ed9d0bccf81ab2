use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};

use super::{AppAdapter, CaptureOutcome, RestoreOutcome};
use crate::models::{AdapterKind, AppState, EditorState, OpenFile, WindowDescriptor};
use crate::os_bridge;

const ALIASES: &[&str] = &["Code", "Visual Studio Code", "Code - Insiders", "VSCodium"];
const WORKSPACE_OPEN_DELAY: Duration = Duration::from_millis(1500);
const FILE_OPEN_DELAY: Duration = Duration::from_millis(200);

/// VS Code family. Titles look like `<file> - <workspace> - Visual Studio Code`.
pub struct EditorAdapter {
    search_roots: Vec<PathBuf>,
}

impl EditorAdapter {
    pub fn new(home: &Path) -> Self {
        Self {
            search_roots: vec![
                home.join("Projects"),
                home.join("Documents"),
                home.join("Workspace"),
                home.to_path_buf(),
            ],
        }
    }

    fn find_workspace_path(&self, workspace: &str) -> Option<PathBuf> {
        self.search_roots
            .iter()
            .map(|root| root.join(workspace))
            .find(|candidate| candidate.is_dir())
    }

    pub fn parse_title(&self, title: &str) -> EditorState {
        let segments: Vec<&str> = title
            .split(" - ")
            .map(|segment| segment.trim_start_matches('●').trim())
            .collect();

        let workspace = if segments.len() >= 2 {
            Some(segments[segments.len() - 2].to_string()).filter(|ws| !ws.is_empty())
        } else {
            None
        };
        let active_file = if segments.len() >= 3 {
            Some(segments[0].to_string()).filter(|file| !file.is_empty())
        } else {
            None
        };

        let workspace_path = workspace
            .as_deref()
            .and_then(|ws| self.find_workspace_path(ws))
            .map(|path| path.to_string_lossy().into_owned());

        let open_files = active_file
            .iter()
            .map(|file| {
                let path = match workspace_path.as_deref() {
                    Some(root) if Path::new(root).join(file).exists() => {
                        Path::new(root).join(file).to_string_lossy().into_owned()
                    }
                    _ => file.clone(),
                };
                OpenFile { path, active: true }
            })
            .collect();

        EditorState {
            workspace,
            workspace_path,
            open_files,
            active_file,
        }
    }
}

impl Default for EditorAdapter {
    fn default() -> Self {
        Self::new(&os_bridge::home_dir())
    }
}

#[async_trait]
impl AppAdapter for EditorAdapter {
    fn kind(&self) -> AdapterKind {
        AdapterKind::Editor
    }

    fn aliases(&self) -> &[&'static str] {
        ALIASES
    }

    async fn capture(&self, window: &WindowDescriptor) -> CaptureOutcome {
        let state = self.parse_title(&window.title);
        if state.workspace.is_none() && state.active_file.is_none() {
            return CaptureOutcome::Empty;
        }
        CaptureOutcome::Captured(AppState::Editor(state))
    }

    async fn restore(&self, _window: &WindowDescriptor, state: &AppState) -> RestoreOutcome {
        let AppState::Editor(state) = state else {
            return RestoreOutcome::Skipped("not an editor state".into());
        };

        let workspace_path = state
            .workspace_path
            .clone()
            .filter(|path| Path::new(path).is_dir())
            .or_else(|| {
                state
                    .workspace
                    .as_deref()
                    .and_then(|ws| self.find_workspace_path(ws))
                    .map(|path| path.to_string_lossy().into_owned())
            });

        let mut opened = 0usize;
        if let Some(path) = workspace_path {
            if let Err(err) = os_bridge::run_command("code", &[path.as_str()]).await {
                warn!("Editor workspace restore failed for {path}: {err:#}");
                return RestoreOutcome::Failed(err.to_string());
            }
            opened += 1;
            tokio::time::sleep(WORKSPACE_OPEN_DELAY).await;
        }

        for file in &state.open_files {
            if !Path::new(&file.path).exists() {
                debug!("Skipping missing editor file {}", file.path);
                continue;
            }
            match os_bridge::run_command("code", &[file.path.as_str()]).await {
                Ok(_) => opened += 1,
                Err(err) => warn!("Failed to reopen {}: {err:#}", file.path),
            }
            tokio::time::sleep(FILE_OPEN_DELAY).await;
        }

        if opened == 0 {
            RestoreOutcome::Skipped("nothing to reopen".into())
        } else {
            RestoreOutcome::Applied
        }
    }

    async fn is_available(&self) -> bool {
        os_bridge::run_command("code", &["--version"]).await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Bounds;
    use tempfile::tempdir;

    #[test]
    fn parses_file_and_workspace_from_title() {
        let home = tempdir().unwrap();
        std::fs::create_dir_all(home.path().join("Projects/demo")).unwrap();
        std::fs::write(home.path().join("Projects/demo/main.rs"), "").unwrap();
        let adapter = EditorAdapter::new(home.path());

        let state = adapter.parse_title("● main.rs - demo - Visual Studio Code");
        assert_eq!(state.workspace.as_deref(), Some("demo"));
        assert_eq!(state.active_file.as_deref(), Some("main.rs"));
        let expected_root = home.path().join("Projects/demo");
        assert_eq!(
            state.workspace_path.as_deref(),
            Some(expected_root.to_string_lossy().as_ref())
        );
        assert!(state.open_files[0].path.ends_with("main.rs"));
        assert!(state.open_files[0].active);
    }

    #[test]
    fn two_segment_title_has_workspace_only() {
        let adapter = EditorAdapter::new(Path::new("/nonexistent-home"));
        let state = adapter.parse_title("demo - Visual Studio Code");
        assert_eq!(state.workspace.as_deref(), Some("demo"));
        assert!(state.active_file.is_none());
        assert!(state.workspace_path.is_none());
    }

    #[tokio::test]
    async fn bare_title_captures_nothing() {
        let adapter = EditorAdapter::new(Path::new("/nonexistent-home"));
        let window = WindowDescriptor::new("Code", "Visual Studio Code", Bounds::default());
        assert_eq!(adapter.capture(&window).await, CaptureOutcome::Empty);
    }
}
