//! Fixtures shared by unit tests.

use chrono::Utc;
use tempfile::{tempdir, TempDir};

use crate::db::{ContextMetadata, ContextSnapshot, Database};
use crate::models::{AppState, AppStates, Bounds, EditorState, WindowDescriptor};

/// Fresh database in a temporary directory. Keep the directory alive for as
/// long as the database is used.
pub fn temp_database() -> (TempDir, Database) {
    let dir = tempdir().unwrap();
    let db = Database::new(dir.path().join("context-flow.db")).unwrap();
    (dir, db)
}

pub fn sample_snapshot(id: &str) -> ContextSnapshot {
    let now = Utc::now();
    let states: AppStates = vec![AppState::Editor(EditorState {
        workspace: Some("demo".into()),
        workspace_path: None,
        open_files: Vec::new(),
        active_file: Some("main.rs".into()),
    })]
    .into_iter()
    .collect();

    ContextSnapshot {
        id: id.to_string(),
        name: format!("{id} Morning"),
        emoji: "💻".into(),
        created_at: now,
        updated_at: now,
        last_restored: None,
        restore_count: 0,
        windows: vec![
            WindowDescriptor::new(
                "Visual Studio Code",
                "main.rs - demo - Visual Studio Code",
                Bounds::new(0, 25, 1200, 800),
            )
            .focused(),
            WindowDescriptor::new("Terminal", "zsh - ~/demo", Bounds::new(1200, 25, 600, 400)),
        ],
        app_states: states,
        metadata: ContextMetadata {
            project: Some("demo".into()),
            tags: vec!["coding".into(), "morning".into()],
            duration_secs: 0,
            app_count: 2,
        },
    }
}
