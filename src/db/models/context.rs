//! Snapshot records and their read-only projection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{AppStates, WindowDescriptor};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ContextMetadata {
    pub project: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub duration_secs: u64,
    pub app_count: usize,
}

/// A persisted workspace context.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContextSnapshot {
    pub id: String,
    pub name: String,
    pub emoji: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_restored: Option<DateTime<Utc>>,
    #[serde(default)]
    pub restore_count: u32,
    #[serde(default)]
    pub windows: Vec<WindowDescriptor>,
    #[serde(default)]
    pub app_states: AppStates,
    #[serde(default)]
    pub metadata: ContextMetadata,
}

impl ContextSnapshot {
    pub fn summary(&self) -> ContextSummary {
        ContextSummary::from(self)
    }

    /// Distinct application names in window order.
    pub fn app_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for window in &self.windows {
            if !names.iter().any(|name| name == &window.app) {
                names.push(window.app.clone());
            }
        }
        names
    }

    pub fn mark_restored(&mut self, at: DateTime<Utc>) {
        self.restore_count = self.restore_count.saturating_add(1);
        self.last_restored = Some(at);
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ContextSummary {
    pub id: String,
    pub name: String,
    pub emoji: String,
    pub created_at: DateTime<Utc>,
    pub last_restored: Option<DateTime<Utc>>,
    pub restore_count: u32,
    pub app_count: usize,
    pub project: Option<String>,
}

impl From<&ContextSnapshot> for ContextSummary {
    fn from(snapshot: &ContextSnapshot) -> Self {
        Self {
            id: snapshot.id.clone(),
            name: snapshot.name.clone(),
            emoji: snapshot.emoji.clone(),
            created_at: snapshot.created_at,
            last_restored: snapshot.last_restored,
            restore_count: snapshot.restore_count,
            app_count: snapshot.metadata.app_count,
            project: snapshot.metadata.project.clone(),
        }
    }
}
