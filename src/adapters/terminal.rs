use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;

use super::{AppAdapter, CaptureOutcome, RestoreOutcome};
use crate::models::{AdapterKind, AppState, TerminalState, WindowDescriptor};
use crate::os_bridge;

const ALIASES: &[&str] = &["Terminal", "iTerm2", "Hyper", "Warp", "Alacritty", "kitty"];

// user@host:path, path up to the first whitespace or quote
static PROMPT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[\w.-]+@[\w.-]+:\s*(~[^\s"]*|/[^\s"]*)"#).unwrap());

pub struct TerminalAdapter {
    home: PathBuf,
}

impl TerminalAdapter {
    pub fn new(home: &Path) -> Self {
        Self {
            home: home.to_path_buf(),
        }
    }

    fn expand_home(&self, raw: &str) -> String {
        match raw.strip_prefix('~') {
            Some(rest) => {
                let rest = rest.trim_start_matches('/');
                if rest.is_empty() {
                    self.home.to_string_lossy().into_owned()
                } else {
                    self.home.join(rest).to_string_lossy().into_owned()
                }
            }
            None => raw.to_string(),
        }
    }

    fn extract_cwd(&self, title: &str) -> Option<String> {
        if let Some(path) = PROMPT_RE.captures(title).and_then(|caps| caps.get(1)) {
            return Some(self.expand_home(path.as_str()));
        }

        title
            .split(" - ")
            .map(str::trim)
            .find(|segment| segment.starts_with('/') || segment.starts_with('~'))
            .map(|segment| self.expand_home(segment))
    }

    pub fn parse_title(&self, title: &str) -> TerminalState {
        TerminalState {
            cwd: self
                .extract_cwd(title)
                .unwrap_or_else(|| self.home.to_string_lossy().into_owned()),
            shell: detect_shell(title).to_string(),
        }
    }
}

impl Default for TerminalAdapter {
    fn default() -> Self {
        Self::new(&os_bridge::home_dir())
    }
}

fn detect_shell(title: &str) -> &'static str {
    let lower = title.to_lowercase();
    ["zsh", "bash", "fish"]
        .into_iter()
        .find(|shell| lower.contains(shell))
        .unwrap_or("unknown")
}

#[async_trait]
impl AppAdapter for TerminalAdapter {
    fn kind(&self) -> AdapterKind {
        AdapterKind::Terminal
    }

    fn aliases(&self) -> &[&'static str] {
        ALIASES
    }

    async fn capture(&self, window: &WindowDescriptor) -> CaptureOutcome {
        CaptureOutcome::Captured(AppState::Terminal(self.parse_title(&window.title)))
    }

    async fn restore(&self, _window: &WindowDescriptor, state: &AppState) -> RestoreOutcome {
        let AppState::Terminal(state) = state else {
            return RestoreOutcome::Skipped("not a terminal state".into());
        };

        #[cfg(target_os = "macos")]
        {
            let command = format!("cd {}", os_bridge::shell_quote(&state.cwd));
            let script = format!(
                "tell application \"Terminal\" to do script \"{}\"",
                os_bridge::escape_applescript(&command)
            );
            match os_bridge::run_osascript(&script).await {
                Ok(_) => RestoreOutcome::Applied,
                Err(err) => {
                    log::warn!("Terminal restore failed for {}: {err:#}", state.cwd);
                    RestoreOutcome::Failed(err.to_string())
                }
            }
        }

        #[cfg(not(target_os = "macos"))]
        {
            RestoreOutcome::Skipped(format!(
                "cannot open a terminal at {} on this platform",
                state.cwd
            ))
        }
    }

    async fn is_available(&self) -> bool {
        os_bridge::process_running(ALIASES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter() -> TerminalAdapter {
        TerminalAdapter::new(Path::new("/home/u"))
    }

    #[test]
    fn reads_cwd_from_prompt_style_title() {
        let state = adapter().parse_title("u@box:~/demo — zsh");
        assert_eq!(state.cwd, "/home/u/demo");
        assert_eq!(state.shell, "zsh");
    }

    #[test]
    fn reads_cwd_from_dash_segment() {
        let state = adapter().parse_title("bash - /var/log - 80x24");
        assert_eq!(state.cwd, "/var/log");
        assert_eq!(state.shell, "bash");
    }

    #[test]
    fn defaults_to_home_and_unknown_shell() {
        let state = adapter().parse_title("htop");
        assert_eq!(state.cwd, "/home/u");
        assert_eq!(state.shell, "unknown");
    }
}
