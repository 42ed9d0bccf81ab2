use serde::{Deserialize, Serialize};

use super::ContextSummary;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    pub id: String,
    pub name: String,
    pub emoji: String,
    pub color: String,
    #[serde(default)]
    pub context_ids: Vec<String>,
    pub order: u32,
}

/// One group in the organized listing; uncategorized contexts have no folder.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderGroup {
    pub folder_id: Option<String>,
    pub name: String,
    pub emoji: String,
    pub contexts: Vec<ContextSummary>,
}

pub const DEFAULT_FOLDER_EMOJI: &str = "📁";
pub const DEFAULT_FOLDER_COLOR: &str = "#6366f1";
