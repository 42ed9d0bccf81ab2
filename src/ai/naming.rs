//! Name, project and tag guesses for a freshly captured context.
//!
//! Everything here is a pure function of the captured state and the local
//! wall-clock time, so callers pass `now` in.

use std::sync::LazyLock;

use chrono::{NaiveDateTime, Timelike};
use regex::Regex;

use crate::adapters::browser::BLANK_URL;
use crate::db::TimeBucket;
use crate::models::{AppStates, WindowDescriptor};

const STRIPPED_EXTENSIONS: &[&str] = &["js", "ts", "jsx", "tsx", "py", "html", "css", "rs", "go"];

static APP_SUFFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r" - (Google Chrome|Chromium|Visual Studio Code|Terminal|Safari|Spotify|Slack)$")
        .unwrap()
});
static SSH_SUFFIX_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r" - \w+@\w+$").unwrap());
static LEADING_NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+\s+").unwrap());

pub fn time_label(hour: u32) -> &'static str {
    match hour {
        5..=11 => "Morning",
        12..=13 => "Lunch",
        14..=17 => "Afternoon",
        18..=21 => "Evening",
        _ => "Night",
    }
}

/// Host of an `scheme://host/...` url without a leading `www.`.
pub fn url_domain(url: &str) -> Option<String> {
    if url == BLANK_URL {
        return None;
    }
    let (_, rest) = url.split_once("://")?;
    let host = rest
        .split(|c| matches!(c, '/' | '?' | '#' | ':'))
        .next()
        .unwrap_or_default();
    let host = host.strip_prefix("www.").unwrap_or(host);
    if host.is_empty() {
        None
    } else {
        Some(host.to_string())
    }
}

fn file_stem(path: &str) -> Option<String> {
    let file = path.rsplit('/').next().filter(|name| !name.is_empty())?;
    let stem = match file.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && STRIPPED_EXTENSIONS.contains(&ext) => stem,
        _ => file,
    };
    Some(stem.to_string())
}

fn clean_window_title(title: &str, app: &str) -> Option<String> {
    let cleaned = APP_SUFFIX_RE.replace(title, "");
    let cleaned = SSH_SUFFIX_RE.replace(&cleaned, "");
    let cleaned = LEADING_NUMBER_RE.replace(&cleaned, "");
    let cleaned = cleaned.trim();

    if cleaned.chars().count() <= 2 || cleaned == app {
        None
    } else {
        Some(cleaned.to_string())
    }
}

fn name_candidate(states: &AppStates, windows: &[WindowDescriptor], user: &str) -> Option<String> {
    if let Some(editor) = states.editor() {
        if let Some(workspace) = editor.workspace.as_ref().filter(|ws| !ws.is_empty()) {
            return Some(workspace.clone());
        }
        if let Some(stem) = editor.active_file.as_deref().and_then(file_stem) {
            return Some(stem);
        }
    }

    if let Some(domain) = states
        .browser()
        .and_then(|browser| browser.tabs.first())
        .and_then(|tab| url_domain(&tab.url))
    {
        return Some(domain);
    }

    if let Some(terminal) = states.terminal() {
        let leaf = terminal.cwd.trim_end_matches('/').rsplit('/').next().unwrap_or_default();
        if !leaf.is_empty() && leaf != user && leaf != "~" {
            return Some(leaf.to_string());
        }
    }

    windows
        .iter()
        .find_map(|window| clean_window_title(&window.title, &window.app))
}

pub fn generate_name(
    states: &AppStates,
    windows: &[WindowDescriptor],
    now: NaiveDateTime,
    user: &str,
) -> String {
    match name_candidate(states, windows, user) {
        Some(candidate) => format!("{candidate} {}", time_label(now.hour())),
        None => format!("Workspace {}", now.format("%-I:%M %p")),
    }
}

/// Editor workspace, else the deepest terminal directory that is not a home
/// root.
pub fn detect_project(states: &AppStates, user: &str) -> Option<String> {
    if let Some(workspace) = states
        .editor()
        .and_then(|editor| editor.workspace.clone())
        .filter(|ws| !ws.is_empty())
    {
        return Some(workspace);
    }

    let terminal = states.terminal()?;
    terminal
        .cwd
        .rsplit('/')
        .find(|part| !part.is_empty() && *part != user && *part != "Users" && *part != "home")
        .map(str::to_string)
}

pub fn extract_tags(states: &AppStates, now: NaiveDateTime) -> Vec<String> {
    let mut tags: Vec<&str> = Vec::new();

    if states.editor().is_some() {
        tags.push("coding");
    }
    if states.browser().is_some() {
        tags.push("web");
    }
    if states.terminal().is_some() {
        tags.push("terminal");
    }

    if let Some(editor) = states.editor() {
        for file in &editor.open_files {
            let Some((_, ext)) = file.path.rsplit_once('.') else {
                continue;
            };
            let tag = match ext.to_lowercase().as_str() {
                "js" | "ts" | "jsx" | "tsx" => "javascript",
                "rs" => "rust",
                "py" => "python",
                "html" | "css" => "markup",
                "md" => "docs",
                "json" | "toml" | "yaml" | "yml" => "config",
                _ => continue,
            };
            tags.push(tag);
        }
    }

    tags.push(TimeBucket::from_hour(now.hour()).as_str());

    let mut unique: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        if !unique.iter().any(|existing| existing == tag) {
            unique.push(tag.to_string());
        }
    }
    unique
}

pub fn pick_emoji(states: &AppStates, windows: &[WindowDescriptor]) -> String {
    if states.editor().is_some() {
        return "💻".into();
    }
    if states.browser().is_some() {
        return "🌐".into();
    }
    if states.terminal().is_some() {
        return "⌨️".into();
    }

    const BY_APP: &[(&str, &str)] = &[
        ("figma", "🎨"),
        ("photoshop", "🎨"),
        ("blender", "🎭"),
        ("xcode", "🛠️"),
        ("slack", "💬"),
        ("spotify", "🎵"),
        ("zoom", "📹"),
    ];
    for window in windows {
        let app = window.app.to_lowercase();
        if let Some((_, emoji)) = BY_APP.iter().find(|(needle, _)| app.contains(needle)) {
            return (*emoji).to_string();
        }
    }
    "📁".into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        AppState, Bounds, BrowserState, BrowserTab, EditorState, OpenFile, TerminalState,
    };
    use chrono::NaiveDate;

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 3)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn full_states() -> AppStates {
        vec![
            AppState::Editor(EditorState {
                workspace: Some("demo".into()),
                workspace_path: None,
                open_files: vec![
                    OpenFile { path: "/home/u/demo/src/main.rs".into(), active: true },
                    OpenFile { path: "/home/u/demo/README.md".into(), active: false },
                ],
                active_file: Some("main.rs".into()),
            }),
            AppState::Browser(BrowserState {
                tabs: vec![BrowserTab {
                    url: "https://x.example".into(),
                    title: "X".into(),
                    active: true,
                }],
            }),
            AppState::Terminal(TerminalState {
                cwd: "/home/u/demo".into(),
                shell: "zsh".into(),
            }),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn full_workspace_scenario() {
        let states = full_states();
        let now = at(9, 15);

        let name = generate_name(&states, &[], now, "u");
        assert!(name.starts_with("demo"), "{name}");
        assert_eq!(name, "demo Morning");
        assert_eq!(detect_project(&states, "u").as_deref(), Some("demo"));

        let tags = extract_tags(&states, now);
        assert!(tags.contains(&"coding".to_string()));
        assert!(tags.contains(&"terminal".to_string()));
        let time_tags = tags
            .iter()
            .filter(|tag| ["morning", "afternoon", "evening", "night"].contains(&tag.as_str()))
            .count();
        assert_eq!(time_tags, 1);
        assert_eq!(tags, vec!["coding", "web", "terminal", "rust", "docs", "morning"]);
    }

    #[test]
    fn editor_workspace_beats_terminal_cwd() {
        let states = full_states();
        let name = generate_name(&states, &[], at(12, 30), "u");
        assert_eq!(name, "demo Lunch");
    }

    #[test]
    fn terminal_leaf_skips_user_folder() {
        let states: AppStates = vec![AppState::Terminal(TerminalState {
            cwd: "/home/u".into(),
            shell: "zsh".into(),
        })]
        .into_iter()
        .collect();

        assert_eq!(detect_project(&states, "u"), None);
        assert_eq!(generate_name(&states, &[], at(23, 5), "u"), "Workspace 11:05 PM");
    }

    #[test]
    fn falls_back_to_cleaned_window_title() {
        let windows = vec![
            WindowDescriptor::new("Slack", "Slack", Bounds::default()),
            WindowDescriptor::new("Preview", "2 Quarterly Report - Preview", Bounds::default()),
        ];
        let name = generate_name(&AppStates::new(), &windows, at(15, 0), "u");
        assert_eq!(name, "Quarterly Report - Preview Afternoon");
    }

    #[test]
    fn domain_strips_www_and_rejects_blank() {
        assert_eq!(url_domain("https://www.rust-lang.org/learn").as_deref(), Some("rust-lang.org"));
        assert_eq!(url_domain("about:blank"), None);
    }

    #[test]
    fn emoji_prefers_adapter_state_then_app_name() {
        assert_eq!(pick_emoji(&full_states(), &[]), "💻");
        let windows = vec![WindowDescriptor::new("Figma", "Design", Bounds::default())];
        assert_eq!(pick_emoji(&AppStates::new(), &windows), "🎨");
        assert_eq!(pick_emoji(&AppStates::new(), &[]), "📁");
    }
}
