//! Side-by-side comparison of two snapshots.

use serde::Serialize;

use crate::db::ContextSnapshot;
use crate::models::{AdapterKind, AppState, AppStates, WindowDescriptor};

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WindowChange {
    Added,
    Removed,
    Modified,
}

impl WindowChange {
    fn marker(&self) -> char {
        match self {
            WindowChange::Added => '+',
            WindowChange::Removed => '-',
            WindowChange::Modified => '~',
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WindowDiff {
    pub change: WindowChange,
    pub app: String,
    pub title: String,
    pub details: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FieldChange {
    pub field: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AppStateDiff {
    pub adapter: AdapterKind,
    pub changes: Vec<FieldChange>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DiffSummary {
    pub apps_added: usize,
    pub apps_removed: usize,
    pub apps_modified: usize,
    pub total_changes: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ContextDiff {
    pub context_a: String,
    pub context_b: String,
    pub window_diffs: Vec<WindowDiff>,
    pub app_state_diffs: Vec<AppStateDiff>,
    pub summary: DiffSummary,
}

fn same_window(a: &WindowDescriptor, b: &WindowDescriptor) -> bool {
    a.app == b.app && a.title == b.title
}

fn change(field: &str, old: Option<String>, new: Option<String>) -> FieldChange {
    FieldChange {
        field: field.into(),
        old_value: old,
        new_value: new,
    }
}

fn compare_windows(a: &[WindowDescriptor], b: &[WindowDescriptor]) -> Vec<WindowDiff> {
    let diff = |change: WindowChange, window: &WindowDescriptor, details: String| WindowDiff {
        change,
        app: window.app.clone(),
        title: window.title.clone(),
        details,
    };

    let mut diffs = Vec::new();
    for window in a.iter().filter(|wa| !b.iter().any(|wb| same_window(wa, wb))) {
        diffs.push(diff(WindowChange::Removed, window, "Window was closed".into()));
    }
    for window in b.iter().filter(|wb| !a.iter().any(|wa| same_window(wa, wb))) {
        diffs.push(diff(WindowChange::Added, window, "New window opened".into()));
    }

    for window_a in a {
        let Some(window_b) = b.iter().find(|wb| same_window(window_a, wb)) else {
            continue;
        };
        let mut changes: Vec<&str> = Vec::new();
        if !window_a.bounds.same_position(&window_b.bounds) {
            changes.push("Position changed");
        }
        if !window_a.bounds.same_size(&window_b.bounds) {
            changes.push("Size changed");
        }
        if window_a.minimized != window_b.minimized {
            changes.push(if window_b.minimized { "Minimized" } else { "Restored" });
        }
        if !changes.is_empty() {
            diffs.push(diff(WindowChange::Modified, window_a, changes.join(", ")));
        }
    }

    diffs
}

fn compare_state(old: &AppState, new: &AppState) -> Vec<FieldChange> {
    let mut changes = Vec::new();
    match (old, new) {
        (AppState::Editor(old), AppState::Editor(new)) => {
            if old.workspace != new.workspace {
                changes.push(change("workspace", old.workspace.clone(), new.workspace.clone()));
            }
            let paths = |files: &[crate::models::OpenFile]| {
                files.iter().map(|f| f.path.clone()).collect::<Vec<_>>()
            };
            if paths(&old.open_files) != paths(&new.open_files) {
                changes.push(change(
                    "openFiles",
                    Some(format!("{} files", old.open_files.len())),
                    Some(format!("{} files", new.open_files.len())),
                ));
            }
        }
        (AppState::Browser(old), AppState::Browser(new)) => {
            if old.tabs.len() != new.tabs.len() {
                changes.push(change(
                    "tabs",
                    Some(format!("{} tabs", old.tabs.len())),
                    Some(format!("{} tabs", new.tabs.len())),
                ));
            }
        }
        (AppState::Terminal(old), AppState::Terminal(new)) => {
            if old.cwd != new.cwd {
                changes.push(change("cwd", Some(old.cwd.clone()), Some(new.cwd.clone())));
            }
        }
        _ => {}
    }
    changes
}

fn compare_app_states(a: &AppStates, b: &AppStates) -> Vec<AppStateDiff> {
    b.iter()
        .filter_map(|(kind, state_b)| {
            let changes = match a.get(*kind) {
                None => vec![change("state", None, Some("initialized".into()))],
                Some(state_a) => compare_state(state_a, state_b),
            };
            (!changes.is_empty()).then(|| AppStateDiff {
                adapter: *kind,
                changes,
            })
        })
        .collect()
}

/// Changes going from `a` to `b`.
pub fn compare(a: &ContextSnapshot, b: &ContextSnapshot) -> ContextDiff {
    let window_diffs = compare_windows(&a.windows, &b.windows);
    let app_state_diffs = compare_app_states(&a.app_states, &b.app_states);

    let count = |kind: WindowChange| window_diffs.iter().filter(|d| d.change == kind).count();
    let summary = DiffSummary {
        apps_added: count(WindowChange::Added),
        apps_removed: count(WindowChange::Removed),
        apps_modified: count(WindowChange::Modified) + app_state_diffs.len(),
        total_changes: window_diffs.len()
            + app_state_diffs.iter().map(|d| d.changes.len()).sum::<usize>(),
    };

    ContextDiff {
        context_a: a.name.clone(),
        context_b: b.name.clone(),
        window_diffs,
        app_state_diffs,
        summary,
    }
}

pub fn format_diff(diff: &ContextDiff) -> String {
    let mut lines = vec![
        format!("Comparing: {} vs {}", diff.context_a, diff.context_b),
        String::new(),
        "Summary:".to_string(),
        format!("  {} apps added", diff.summary.apps_added),
        format!("  {} apps removed", diff.summary.apps_removed),
        format!("  {} apps modified", diff.summary.apps_modified),
        format!("  {} total changes", diff.summary.total_changes),
        String::new(),
        "Changes:".to_string(),
    ];

    for window in &diff.window_diffs {
        lines.push(format!("  {} [{}] {}", window.change.marker(), window.app, window.title));
        lines.push(format!("     {}", window.details));
    }
    for state in &diff.app_state_diffs {
        for field in &state.changes {
            lines.push(format!(
                "  ~ [{}] {}: {} -> {}",
                state.adapter,
                field.field,
                field.old_value.as_deref().unwrap_or("none"),
                field.new_value.as_deref().unwrap_or("none")
            ));
        }
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AppState, Bounds, TerminalState};
    use crate::test_support::sample_snapshot;

    #[test]
    fn classifies_added_removed_and_modified_windows() {
        let a = sample_snapshot("a");
        let mut b = sample_snapshot("b");
        b.windows[0].bounds = Bounds::new(50, 25, 1000, 800);
        b.windows[1] = WindowDescriptor::new("Safari", "Docs", Bounds::default());

        let diff = compare(&a, &b);

        assert_eq!(diff.summary.apps_added, 1);
        assert_eq!(diff.summary.apps_removed, 1);
        assert_eq!(diff.summary.apps_modified, 1);
        let modified = diff
            .window_diffs
            .iter()
            .find(|d| d.change == WindowChange::Modified)
            .unwrap();
        assert_eq!(modified.details, "Position changed, Size changed");
    }

    #[test]
    fn state_only_in_b_is_initialized_and_cwd_changes_are_reported() {
        let mut a = sample_snapshot("a");
        let mut b = sample_snapshot("b");
        a.app_states.insert(AppState::Terminal(TerminalState {
            cwd: "/home/u/one".into(),
            shell: "zsh".into(),
        }));
        b.app_states.insert(AppState::Terminal(TerminalState {
            cwd: "/home/u/two".into(),
            shell: "zsh".into(),
        }));

        let diff = compare(&a, &b);
        assert_eq!(diff.app_state_diffs.len(), 1);
        assert_eq!(diff.app_state_diffs[0].adapter, AdapterKind::Terminal);
        assert_eq!(diff.app_state_diffs[0].changes[0].field, "cwd");

        let reverse = compare(&sample_snapshot("plain"), &a);
        assert_eq!(reverse.app_state_diffs[0].changes[0].new_value.as_deref(), Some("initialized"));
    }

    #[test]
    fn identical_snapshots_have_no_changes() {
        let diff = compare(&sample_snapshot("a"), &sample_snapshot("a"));
        assert_eq!(diff.summary, DiffSummary::default());
        assert!(format_diff(&diff).starts_with("Comparing: a Morning vs a Morning"));
    }
}
